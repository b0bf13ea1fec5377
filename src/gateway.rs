//! Request gateway: the one place outbound calls are built and failures normalized.
//!
//! - Attaches `Authorization: Bearer <credential>` iff a credential is stored
//!   at the moment the request is built.
//! - Passes successful bodies through, decoded.
//! - Turns every failure into an [`ApiError`] whose message is, in order: the
//!   body's `detail`, the status reason phrase, the transport error text, or
//!   [`FALLBACK_MESSAGE`].

use std::fmt;
use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use reqwest::{multipart, Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::credential::{CredentialStore, SharedCredentials};
use crate::error::{ApiError, ApiResult, ErrorKind, FALLBACK_MESSAGE};

/// Cheap to clone; the underlying connection pool is shared.
#[derive(Clone)]
pub struct Gateway {
    http: Client,
    base: String,
    credentials: SharedCredentials,
}

impl fmt::Debug for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gateway")
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

impl Gateway {
    pub fn new(
        base: impl Into<String>,
        timeout: Duration,
        credentials: SharedCredentials,
    ) -> ApiResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::transport(e.to_string()))?;
        Ok(Self {
            http,
            base: base.into().trim_end_matches('/').to_string(),
            credentials,
        })
    }

    pub fn credentials(&self) -> &dyn CredentialStore {
        self.credentials.as_ref()
    }

    /// Builds a request, capturing the credential as it is right now.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base, path);
        let builder = self.http.request(method, url);
        match self.credentials.get() {
            Some(credential) => {
                builder.header(AUTHORIZATION, format!("Bearer {}", credential.expose()))
            }
            None => builder,
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.send(self.request(Method::GET, path)).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    /// POST with no body.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.send(self.request(Method::POST, path)).await
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        self.send(self.request(Method::PUT, path).json(body)).await
    }

    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: multipart::Form,
    ) -> ApiResult<T> {
        self.send(self.request(Method::POST, path).multipart(form)).await
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ApiResult<T> {
        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                let err = normalize(e.status(), None, Some(&e.to_string()));
                warn!(error = %err.message, "request failed without response");
                return Err(err);
            }
        };

        let status = response.status();
        let url = response.url().path().to_string();
        if status.is_success() {
            debug!(%status, path = %url, "request ok");
            return response.json::<T>().await.map_err(|e| {
                warn!(path = %url, error = %e, "undecodable response body");
                ApiError::new(ErrorKind::Transport, Some(status.as_u16()), e.to_string())
            });
        }

        let body = response.bytes().await.ok();
        let err = normalize(Some(status), body.as_deref(), None);
        debug!(%status, path = %url, kind = ?err.kind, "request rejected");
        Err(err)
    }
}

/// Folds whatever is known about a failure into the single error shape.
pub fn normalize(
    status: Option<StatusCode>,
    body: Option<&[u8]>,
    transport: Option<&str>,
) -> ApiError {
    let message = body
        .and_then(detail_message)
        .or_else(|| status.and_then(|s| s.canonical_reason()).map(str::to_string))
        .or_else(|| transport.filter(|t| !t.is_empty()).map(str::to_string))
        .unwrap_or_else(|| FALLBACK_MESSAGE.to_string());
    ApiError::new(
        ErrorKind::from_status(status),
        status.map(|s| s.as_u16()),
        message,
    )
}

/// Reads `detail` from an error body: either a string, or a list of
/// `{msg}` entries as produced by request validation.
fn detail_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    match value.get("detail")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Array(items) => {
            let msgs: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            (!msgs.is_empty()).then(|| msgs.join("; "))
        }
        _ => None,
    }
}
