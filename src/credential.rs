//! Credential store: holds the single active bearer credential.
//!
//! The durable store keeps it in one file named by [`TOKEN_KEY`]. There is no
//! validation and no expiry tracking; whether a stored credential is still
//! good is only decided by the backend's answer to the next call.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::error::CredentialError;

/// Fixed key under which the credential is persisted.
pub const TOKEN_KEY: &str = "rag_token";

/// Opaque bearer token. Never parsed, never logged.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Zero or one credential per profile. Last write wins.
pub trait CredentialStore: Send + Sync {
    fn get(&self) -> Option<Credential>;
    fn set(&self, credential: Option<&Credential>) -> Result<(), CredentialError>;

    /// Sign-out path: clearing failures are logged, never raised.
    fn clear(&self) {
        if let Err(e) = self.set(None) {
            warn!(error = %e, "failed to clear stored credential");
        }
    }

    fn is_present(&self) -> bool {
        self.get().is_some()
    }
}

/// Shared handle threaded through the gateway, session resolver and consoles.
pub type SharedCredentials = Arc<dyn CredentialStore>;

/// File-backed store, one file per profile directory.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Store rooted at `dir`; the credential lives in `dir/rag_token`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(TOKEN_KEY),
        }
    }

    /// Store at an explicit file path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> CredentialError {
        CredentialError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn write(&self, token: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path)?;
        // `mode` only applies on create; an older file may be wider.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))?;
        }
        file.write_all(token.as_bytes())
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Option<Credential> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => {
                // Tolerate the newline an editor appends; the token is otherwise verbatim.
                let token = raw
                    .strip_suffix('\n')
                    .map(|t| t.strip_suffix('\r').unwrap_or(t))
                    .unwrap_or(raw.as_str());
                (!token.is_empty()).then(|| Credential::new(token))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                // Unreadable is treated as signed out.
                warn!(path = %self.path.display(), error = %e, "credential unreadable");
                None
            }
        }
    }

    fn set(&self, credential: Option<&Credential>) -> Result<(), CredentialError> {
        match credential {
            Some(c) => {
                self.write(c.expose()).map_err(|e| self.io_error(e))?;
                debug!(path = %self.path.display(), "credential stored");
            }
            None => match fs::remove_file(&self.path) {
                Ok(()) => debug!(path = %self.path.display(), "credential removed"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(self.io_error(e)),
            },
        }
        Ok(())
    }
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    slot: Mutex<Option<Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(credential: Credential) -> Self {
        Self {
            slot: Mutex::new(Some(credential)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Option<Credential> {
        match self.slot.lock() {
            Ok(slot) => slot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn set(&self, credential: Option<&Credential>) -> Result<(), CredentialError> {
        let mut slot = match self.slot.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        *slot = credential.cloned();
        Ok(())
    }
}
