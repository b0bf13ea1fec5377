//! Session resolver.
//!
//! Evaluated once per protected page load:
//! - no stored credential: `Unauthenticated`, no network call;
//! - identity call succeeds: `Authenticated(user)`;
//! - identity call fails for any reason: credential cleared, `Unauthenticated`.
//!
//! Transport failures are not retried and sign the caller out like a 401
//! would. The resolved user is never cached between loads.

use tracing::{debug, info, warn};

use crate::client::ResourceClient;
use crate::error::ErrorKind;
use crate::models::User;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Authenticated(User),
    Unauthenticated,
}

pub async fn resolve(client: &ResourceClient) -> SessionState {
    if !client.credentials().is_present() {
        debug!("no stored credential");
        return SessionState::Unauthenticated;
    }

    match client.me().await {
        Ok(user) => {
            debug!(user = %user.email, role = %user.role, "session resolved");
            SessionState::Authenticated(user)
        }
        Err(e) => {
            // Fail closed: an unconfirmed session is a signed-out session.
            if e.kind == ErrorKind::Transport {
                warn!(error = %e, "identity check unreachable, signing out");
            } else {
                info!(error = %e, kind = ?e.kind, "identity check rejected, signing out");
            }
            client.credentials().clear();
            SessionState::Unauthenticated
        }
    }
}
