//! Navigation: runs the gate, the session resolver and role dispatch for a
//! route, then mounts the matching console.
//!
//! Route → gate (presence) → resolver (validity) → dispatch (role) → console.
//! Failures come back up the same chain and end either in a redirect or in an
//! inline [`Screen::Failed`].

use std::fmt;
use std::sync::Mutex;

use tracing::{debug, info};

use crate::client::ResourceClient;
use crate::console::{
    AdminConsole, Mount, OrgDetailConsole, Outcome, TenantConsole, VectorStoreView,
};
use crate::routing::{dispatch, gate, ConsoleKind, GateDecision, Route};
use crate::session::{self, SessionState};

/// Upper bound on redirects followed for one navigation.
const MAX_REDIRECTS: usize = 4;

#[derive(Debug)]
pub enum Screen {
    Login,
    Tenant(TenantConsole),
    Admin(AdminConsole),
    OrgDetail(OrgDetailConsole),
    VectorStore(VectorStoreView),
    /// Inline failure rendered at `route`, with the credential left intact.
    Failed { route: Route, message: String },
}

impl Screen {
    fn mount(&self) -> Option<Mount> {
        match self {
            Screen::Tenant(c) => Some(c.mount().clone()),
            Screen::Admin(c) => Some(c.mount().clone()),
            Screen::OrgDetail(c) => Some(c.mount().clone()),
            _ => None,
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Screen::Login => writeln!(f, "Not signed in. Run `rag-console login` to sign in."),
            Screen::Tenant(c) => fmt::Display::fmt(c, f),
            Screen::Admin(c) => fmt::Display::fmt(c, f),
            Screen::OrgDetail(c) => fmt::Display::fmt(c, f),
            Screen::VectorStore(v) => fmt::Display::fmt(v, f),
            Screen::Failed { route, message } => writeln!(f, "{} failed: {}", route, message),
        }
    }
}

#[derive(Debug)]
pub struct App {
    client: ResourceClient,
    mounted: Mutex<Option<Mount>>,
}

impl App {
    pub fn new(client: ResourceClient) -> Self {
        Self {
            client,
            mounted: Mutex::new(None),
        }
    }

    pub fn client(&self) -> &ResourceClient {
        &self.client
    }

    /// Navigates to `route`, following redirects, and mounts the resulting screen.
    /// The previously mounted console is unmounted first.
    pub async fn open(&self, route: Route) -> Screen {
        self.swap_mount(None);
        let mut route = route;
        for _ in 0..MAX_REDIRECTS {
            match self.render(&route).await {
                Outcome::Ready(screen) => {
                    self.swap_mount(screen.mount());
                    return screen;
                }
                Outcome::Redirect(next) => {
                    info!(from = %route, to = %next, "redirect");
                    route = next;
                }
                Outcome::Failed(message) => return Screen::Failed { route, message },
            }
        }
        Screen::Failed {
            route,
            message: "Too many redirects".to_string(),
        }
    }

    async fn render(&self, route: &Route) -> Outcome<Screen> {
        if let GateDecision::Redirect(to) = gate(route, self.client.credentials()) {
            return Outcome::Redirect(to);
        }
        if *route == Route::Login {
            return Outcome::Ready(Screen::Login);
        }

        // Resolved fresh on every navigation; the role is never cached.
        let user = match session::resolve(&self.client).await {
            SessionState::Authenticated(user) => user,
            SessionState::Unauthenticated => return Outcome::Redirect(Route::Login),
        };

        match route {
            Route::Login => Outcome::Ready(Screen::Login),
            Route::Home => match dispatch(&user) {
                ConsoleKind::Admin => {
                    debug!(user = %user.email, "admin console");
                    AdminConsole::load(self.client.clone(), user)
                        .await
                        .map(Screen::Admin)
                }
                ConsoleKind::Tenant => {
                    debug!(user = %user.email, "tenant console");
                    TenantConsole::load(self.client.clone(), user)
                        .await
                        .map(Screen::Tenant)
                }
            },
            Route::OrgDetail(org_id) => OrgDetailConsole::load(self.client.clone(), org_id)
                .await
                .map(Screen::OrgDetail),
            Route::VectorStore => VectorStoreView::load(&self.client, &user)
                .await
                .map(Screen::VectorStore),
        }
    }

    fn swap_mount(&self, next: Option<Mount>) {
        let mut slot = match self.mounted.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(previous) = slot.take() {
            previous.unmount();
        }
        *slot = next;
    }
}
