//! Failure recovery policy.
//!
//! | Kind            | On console load              | On a form action   |
//! |-----------------|------------------------------|--------------------|
//! | Unauthenticated | clear credential, `/login`   | same               |
//! | Unauthorized    | redirect to `/`, keep cred   | inline             |
//! | Validation      | inline                       | inline             |
//! | Transport       | inline                       | inline             |

use tracing::warn;

use crate::credential::CredentialStore;
use crate::error::{ApiError, ErrorKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recovery {
    /// Credential already cleared; go to the login surface.
    SignOut,
    /// Go to the caller's own home surface; credential kept.
    RedirectHome,
    /// Show the message where the failure happened.
    Inline(String),
}

/// Recovery for a failed console load batch.
pub fn on_load_failure(err: &ApiError, credentials: &dyn CredentialStore) -> Recovery {
    match err.kind {
        ErrorKind::Unauthenticated => sign_out(err, credentials),
        ErrorKind::Unauthorized => {
            warn!(error = %err, "not permitted here, redirecting home");
            Recovery::RedirectHome
        }
        ErrorKind::Validation | ErrorKind::Transport => Recovery::Inline(err.message.clone()),
    }
}

/// Recovery for a failed user-initiated action.
pub fn on_action_failure(err: &ApiError, credentials: &dyn CredentialStore) -> Recovery {
    match err.kind {
        ErrorKind::Unauthenticated => sign_out(err, credentials),
        _ => Recovery::Inline(err.message.clone()),
    }
}

fn sign_out(err: &ApiError, credentials: &dyn CredentialStore) -> Recovery {
    warn!(error = %err, "credential rejected, signing out");
    credentials.clear();
    Recovery::SignOut
}
