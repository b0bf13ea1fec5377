//! rag_console: administrative console client for a multi-tenant document
//! question-answering service.
//!
//! The crate carries, validates and reacts to an externally issued bearer
//! credential. It does not authenticate anyone itself; the server stays
//! authoritative for every privileged operation.
//!
//! Layers, leaves first: credential store → request gateway → resource client
//! → session resolver / route gate / role dispatch → consoles.

pub mod credential;
pub mod error;
// Request gateway: bearer attachment + the single normalized error shape
pub mod gateway;
pub mod models;
// Typed catalogue of backend operations (auth, tenant, admin, keys, vector)
pub mod client;
pub mod session;
pub mod routing;
pub mod policy;
pub mod console;
pub mod app;
pub mod config;
pub mod logging;

pub use app::{App, Screen};
pub use client::ResourceClient;
pub use credential::{Credential, CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use error::{ApiError, ErrorKind};
pub use gateway::Gateway;
