//! Per-role consoles: each one loads its batch of resource calls on mount
//! and exposes the form actions of its view.
//!
//! A load batch succeeds only if every call in it succeeds. Failures go
//! through [`crate::policy`]; consoles never touch session logic themselves.

pub mod admin;
pub mod org_detail;
pub mod tenant;
pub mod vector;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::credential::CredentialStore;
use crate::error::{ApiError, ErrorKind, FALLBACK_MESSAGE};
use crate::policy::{self, Recovery};
use crate::routing::Route;

pub use admin::AdminConsole;
pub use org_detail::OrgDetailConsole;
pub use tenant::TenantConsole;
pub use vector::VectorStoreView;

/// Result of mounting a view.
#[derive(Debug)]
pub enum Outcome<V> {
    Ready(V),
    Redirect(Route),
    /// Inline failure; the credential is untouched.
    Failed(String),
}

impl<V> Outcome<V> {
    pub fn map<U>(self, f: impl FnOnce(V) -> U) -> Outcome<U> {
        match self {
            Outcome::Ready(v) => Outcome::Ready(f(v)),
            Outcome::Redirect(route) => Outcome::Redirect(route),
            Outcome::Failed(message) => Outcome::Failed(message),
        }
    }
}

/// Maps a failed load batch at route `here` to where the caller ends up.
/// A redirect home from home itself would loop, so it is shown inline.
pub(crate) fn load_failed<V>(
    err: &ApiError,
    credentials: &dyn CredentialStore,
    here: &Route,
) -> Outcome<V> {
    match policy::on_load_failure(err, credentials) {
        Recovery::SignOut => Outcome::Redirect(Route::Login),
        Recovery::RedirectHome if *here == Route::Home => Outcome::Failed(err.message.clone()),
        Recovery::RedirectHome => Outcome::Redirect(Route::Home),
        Recovery::Inline(message) => Outcome::Failed(message),
    }
}

/// The failure that decides recovery for a whole load batch. Every call in
/// the batch has already completed, so a fast 5xx cannot hide a slower 401.
/// Authentication beats authorization beats everything else; ties keep the
/// first.
pub(crate) fn batch_failure<I>(errors: I) -> ApiError
where
    I: IntoIterator<Item = Option<ApiError>>,
{
    errors
        .into_iter()
        .flatten()
        .min_by_key(|e| precedence(e.kind))
        .unwrap_or_else(|| ApiError::transport(FALLBACK_MESSAGE))
}

fn precedence(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::Unauthenticated => 0,
        ErrorKind::Unauthorized => 1,
        ErrorKind::Validation | ErrorKind::Transport => 2,
    }
}

/// Result of a user-initiated action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Done(String),
    Inline(String),
    /// The credential was rejected and has been cleared.
    SignedOut,
}

impl ActionOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, ActionOutcome::Done(_))
    }
}

pub(crate) fn action_failed(err: &ApiError, credentials: &dyn CredentialStore) -> ActionOutcome {
    match policy::on_action_failure(err, credentials) {
        Recovery::SignOut => ActionOutcome::SignedOut,
        Recovery::RedirectHome => ActionOutcome::Inline(err.message.clone()),
        Recovery::Inline(message) => ActionOutcome::Inline(message),
    }
}

/// Liveness of a mounted view. In-flight calls are never cancelled; once a
/// view is unmounted their results are simply not applied to it.
#[derive(Debug, Clone)]
pub struct Mount(Arc<AtomicBool>);

impl Mount {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn unmount(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_mounted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl Default for Mount {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders a server timestamp in UTC, or `-` when absent.
pub fn format_timestamp(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return "-".to_string();
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Utc).format("%Y-%m-%d %H:%M UTC").to_string();
    }
    // Naive timestamps are taken as UTC.
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return naive.format("%Y-%m-%d %H:%M UTC").to_string();
    }
    raw.to_string()
}
