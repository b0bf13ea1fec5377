//! Routes, the presence gate and role dispatch.

use std::fmt;

use crate::credential::CredentialStore;
use crate::models::User;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Home,
    OrgDetail(String),
    VectorStore,
}

impl Route {
    /// Parses a console path. Unknown paths land on `Home`.
    pub fn from_path(path: &str) -> Self {
        let trimmed = path.trim().trim_end_matches('/');
        let segments: Vec<&str> = trimmed
            .trim_start_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        match segments.as_slice() {
            ["login"] => Route::Login,
            ["org", id] => Route::OrgDetail(id.to_string()),
            ["admin", "vector"] => Route::VectorStore,
            _ => Route::Home,
        }
    }

    pub fn is_protected(&self) -> bool {
        !matches!(self, Route::Login)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Login => f.write_str("/login"),
            Route::Home => f.write_str("/"),
            Route::OrgDetail(id) => write!(f, "/org/{}", id),
            Route::VectorStore => f.write_str("/admin/vector"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    Redirect(Route),
}

/// Synchronous presence check run before any session resolution. Validity is
/// left to the session resolver.
pub fn gate(route: &Route, credentials: &dyn CredentialStore) -> GateDecision {
    let present = credentials.is_present();
    match route {
        Route::Login if present => GateDecision::Redirect(Route::Home),
        route if route.is_protected() && !present => GateDecision::Redirect(Route::Login),
        _ => GateDecision::Proceed,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleKind {
    Admin,
    Tenant,
}

/// Picks the console for a freshly resolved user.
pub fn dispatch(user: &User) -> ConsoleKind {
    if user.is_admin() {
        ConsoleKind::Admin
    } else {
        ConsoleKind::Tenant
    }
}
