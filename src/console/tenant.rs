//! Tenant console: the caller's own org, its uploads, questions and API keys.

use std::fmt;

use tracing::{debug, info};

use super::{action_failed, batch_failure, format_timestamp, load_failed, ActionOutcome, Mount, Outcome};
use crate::client::ResourceClient;
use crate::models::{ApiKeyInfo, Org, Upload, User};
use crate::routing::Route;

/// Self-service API keys per org.
pub const MAX_SELF_SERVICE_KEYS: usize = 3;

#[derive(Debug)]
pub struct TenantConsole {
    client: ResourceClient,
    mount: Mount,
    user: User,
    org: Org,
    uploads: Vec<Upload>,
    api_keys: Vec<ApiKeyInfo>,
    revealed_key: Option<String>,
}

impl TenantConsole {
    /// Loads dashboard and key list concurrently; both must succeed.
    pub async fn load(client: ResourceClient, user: User) -> Outcome<Self> {
        let batch = tokio::join!(client.org_dashboard(), client.list_own_api_keys());
        match batch {
            (Ok(dashboard), Ok(keys)) => {
                debug!(org = %dashboard.org.id, uploads = dashboard.uploads.len(), "tenant console loaded");
                Outcome::Ready(Self {
                    client,
                    mount: Mount::new(),
                    user,
                    org: dashboard.org,
                    uploads: dashboard.uploads,
                    api_keys: keys.api_keys,
                    revealed_key: None,
                })
            }
            (dashboard, keys) => {
                let err = batch_failure([dashboard.err(), keys.err()]);
                load_failed(&err, client.credentials(), &Route::Home)
            }
        }
    }

    pub fn mount(&self) -> &Mount {
        &self.mount
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn org(&self) -> &Org {
        &self.org
    }

    pub fn uploads(&self) -> &[Upload] {
        &self.uploads
    }

    pub fn api_keys(&self) -> &[ApiKeyInfo] {
        &self.api_keys
    }

    pub fn can_create_api_key(&self) -> bool {
        self.api_keys.len() < MAX_SELF_SERVICE_KEYS
    }

    /// Hands out the secret of the last created key, once.
    pub fn take_revealed_key(&mut self) -> Option<String> {
        self.revealed_key.take()
    }

    /// Uploads a document, then re-fetches the dashboard for the new list.
    /// Uploads disabled for the org are rejected by the server and reported inline.
    pub async fn upload(&mut self, filename: &str, bytes: Vec<u8>) -> ActionOutcome {
        let res = match self
            .client
            .upload_document(&self.org.id, filename, bytes)
            .await
        {
            Ok(res) => res,
            Err(e) => return action_failed(&e, self.client.credentials()),
        };
        info!(org = %self.org.id, file = %filename, chunks = res.chunks_stored, "document uploaded");

        let dashboard = match self.client.org_dashboard().await {
            Ok(dashboard) => dashboard,
            Err(e) => return action_failed(&e, self.client.credentials()),
        };
        if self.mount.is_mounted() {
            self.uploads = dashboard.uploads;
        }
        ActionOutcome::Done(format!("{} ({} chunks)", res.message, res.chunks_stored))
    }

    pub async fn ask(&self, question: &str) -> ActionOutcome {
        let question = question.trim();
        if question.is_empty() {
            return ActionOutcome::Inline("Question is empty".to_string());
        }
        match self.client.query(&self.org.id, question).await {
            Ok(res) => ActionOutcome::Done(res.answer),
            Err(e) => action_failed(&e, self.client.credentials()),
        }
    }

    /// Creates a key unless the org already lists the maximum; at the cap no call is made.
    pub async fn create_api_key(&mut self) -> ActionOutcome {
        if !self.can_create_api_key() {
            return ActionOutcome::Inline(format!("Max {} keys", MAX_SELF_SERVICE_KEYS));
        }
        self.revealed_key = None;
        match self.client.create_own_api_key().await {
            Ok(res) => {
                info!(org = %self.org.id, prefix = %res.key_prefix, "api key created");
                if self.mount.is_mounted() {
                    self.api_keys.insert(0, res.info());
                    self.revealed_key = Some(res.api_key);
                }
                ActionOutcome::Done("API key created".to_string())
            }
            Err(e) => action_failed(&e, self.client.credentials()),
        }
    }
}

impl fmt::Display for TenantConsole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "RAG Dashboard | {} | signed in as {}", self.org.name, self.user.email)?;
        writeln!(f)?;
        writeln!(f, "Organization: {} ({})", self.org.name, self.org.id)?;
        writeln!(f, "Documents uploaded: {}", self.uploads.len())?;
        if self.org.upload_enabled == Some(false) {
            writeln!(f, "Uploads are disabled for this organization")?;
        }

        writeln!(f)?;
        writeln!(
            f,
            "API keys ({}/{}){}",
            self.api_keys.len(),
            MAX_SELF_SERVICE_KEYS,
            if self.can_create_api_key() { "" } else { " - max reached" }
        )?;
        for key in &self.api_keys {
            writeln!(f, "  {}  {}", key.key_prefix, format_timestamp(key.created_at.as_deref()))?;
        }

        writeln!(f)?;
        writeln!(f, "Documents")?;
        if self.uploads.is_empty() {
            writeln!(f, "  No documents yet. Upload a PDF.")?;
        }
        for upload in &self.uploads {
            writeln!(
                f,
                "  {}  {}",
                upload.filename,
                format_timestamp(upload.created_at.as_deref())
            )?;
        }
        Ok(())
    }
}
