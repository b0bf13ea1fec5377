//! Error types for the console.
//!
//! Every failure coming back from the backend is normalized once, at the
//! request gateway, into an [`ApiError`] carrying an [`ErrorKind`]. Callers
//! branch on the kind, never on the message text.

use reqwest::StatusCode;
use thiserror::Error;

/// Convenience alias for resource client calls.
pub type ApiResult<T> = core::result::Result<T, ApiError>;

/// Fallback message when neither the body, the status nor the transport say anything.
pub const FALLBACK_MESSAGE: &str = "Request failed";

/// Recovery-relevant classification of a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing, invalid or expired credential.
    Unauthenticated,
    /// Valid credential, insufficient role or scope.
    Unauthorized,
    /// Input rejected by the server.
    Validation,
    /// No response, unexpected server error or undecodable body.
    Transport,
}

impl ErrorKind {
    /// Maps an HTTP status to a kind. `None` means no response was received.
    pub fn from_status(status: Option<StatusCode>) -> Self {
        match status {
            Some(StatusCode::UNAUTHORIZED) => ErrorKind::Unauthenticated,
            Some(StatusCode::FORBIDDEN) => ErrorKind::Unauthorized,
            Some(s) if s.is_client_error() => ErrorKind::Validation,
            _ => ErrorKind::Transport,
        }
    }
}

/// The single normalized failure shape of the request gateway.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ErrorKind,
    pub status: Option<u16>,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ErrorKind, status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            kind,
            status,
            message: message.into(),
        }
    }

    /// A failure raised locally, before any call was issued.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, None, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, None, message)
    }

    pub fn is_unauthenticated(&self) -> bool {
        self.kind == ErrorKind::Unauthenticated
    }
}

/// Failures writing the persisted credential.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("credential store {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Top-level error of the command-line binary.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration: {0}")]
    Config(String),

    #[error("logging: {0}")]
    Logging(String),
}

pub type Result<T> = core::result::Result<T, Error>;
