//! Org detail console (admin): prompts, upload limits and the org's API key.

use std::fmt;

use tracing::info;

use super::{action_failed, batch_failure, format_timestamp, load_failed, ActionOutcome, Mount, Outcome};
use crate::client::ResourceClient;
use crate::models::{ApiKeyInfo, OrgDetailResponse, OrgLimits};
use crate::routing::Route;

#[derive(Debug)]
pub struct OrgDetailConsole {
    client: ResourceClient,
    mount: Mount,
    org_id: String,
    detail: OrgDetailResponse,
    default_prompt: String,
    api_keys: Vec<ApiKeyInfo>,
    revealed_key: Option<String>,
}

impl OrgDetailConsole {
    /// Loads detail, default prompt and key list concurrently; all must succeed.
    pub async fn load(client: ResourceClient, org_id: &str) -> Outcome<Self> {
        let here = Route::OrgDetail(org_id.to_string());
        let batch = tokio::join!(
            client.admin_get_org(org_id),
            client.default_prompt(),
            client.list_org_api_keys(org_id),
        );
        match batch {
            (Ok(detail), Ok(prompt), Ok(keys)) => Outcome::Ready(Self {
                client,
                mount: Mount::new(),
                org_id: org_id.to_string(),
                detail,
                default_prompt: prompt.content,
                api_keys: keys.api_keys,
                revealed_key: None,
            }),
            (detail, prompt, keys) => {
                let err = batch_failure([detail.err(), prompt.err(), keys.err()]);
                load_failed(&err, client.credentials(), &here)
            }
        }
    }

    pub fn mount(&self) -> &Mount {
        &self.mount
    }

    pub fn detail(&self) -> &OrgDetailResponse {
        &self.detail
    }

    pub fn default_prompt(&self) -> &str {
        &self.default_prompt
    }

    pub fn api_keys(&self) -> &[ApiKeyInfo] {
        &self.api_keys
    }

    pub fn custom_prompt(&self) -> Option<&str> {
        self.detail.custom_prompt.as_deref()
    }

    /// Whether the "Important" custom prompt block renders.
    pub fn has_custom_prompt(&self) -> bool {
        self.custom_prompt().is_some_and(|p| !p.trim().is_empty())
    }

    /// Current limits; upload is enabled unless the server says otherwise.
    pub fn limits(&self) -> OrgLimits {
        OrgLimits {
            max_pdfs: self.detail.org.max_pdfs,
            max_chars: self.detail.org.max_chars,
            upload_enabled: Some(self.detail.org.upload_enabled.unwrap_or(true)),
        }
    }

    pub fn take_revealed_key(&mut self) -> Option<String> {
        self.revealed_key.take()
    }

    /// Saves the custom prompt. Blank input is sent as `null` and deletes it.
    pub async fn set_prompt(&mut self, input: &str) -> ActionOutcome {
        let content = Some(input.trim()).filter(|c| !c.is_empty());
        if let Err(e) = self.client.set_org_prompt(&self.org_id, content).await {
            return action_failed(&e, self.client.credentials());
        }
        if self.mount.is_mounted() {
            self.detail.custom_prompt = content.map(str::to_string);
        }
        ActionOutcome::Done("Org prompt saved.".to_string())
    }

    pub async fn delete_prompt(&mut self) -> ActionOutcome {
        if let Err(e) = self.client.set_org_prompt(&self.org_id, None).await {
            return action_failed(&e, self.client.credentials());
        }
        if self.mount.is_mounted() {
            self.detail.custom_prompt = None;
        }
        ActionOutcome::Done("Custom org prompt deleted.".to_string())
    }

    /// Saves limits, then re-fetches the detail so the view shows what the server kept.
    pub async fn set_limits(&mut self, limits: &OrgLimits) -> ActionOutcome {
        if let Err(e) = self.client.set_org_limits(&self.org_id, limits).await {
            return action_failed(&e, self.client.credentials());
        }
        info!(org = %self.org_id, ?limits, "org limits saved");
        match self.client.admin_get_org(&self.org_id).await {
            Ok(detail) => {
                if self.mount.is_mounted() {
                    self.detail = detail;
                }
                ActionOutcome::Done("Limits saved.".to_string())
            }
            Err(e) => action_failed(&e, self.client.credentials()),
        }
    }

    /// Issues a new key. The server revokes the previous one, so it replaces the list.
    pub async fn create_api_key(&mut self) -> ActionOutcome {
        self.revealed_key = None;
        match self.client.create_org_api_key(&self.org_id).await {
            Ok(res) => {
                info!(org = %self.org_id, prefix = %res.key_prefix, "org api key replaced");
                if self.mount.is_mounted() {
                    self.api_keys = vec![res.info()];
                    self.revealed_key = Some(res.api_key);
                }
                ActionOutcome::Done("API key created. The previous key was revoked.".to_string())
            }
            Err(e) => action_failed(&e, self.client.credentials()),
        }
    }
}

impl fmt::Display for OrgDetailConsole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let org = &self.detail.org;
        writeln!(f, "Org: {}", org.name)?;
        writeln!(
            f,
            "ID: {} | Created: {} | Documents uploaded: {}",
            org.id,
            format_timestamp(org.created_at.as_deref()),
            self.detail.upload_count
        )?;

        writeln!(f)?;
        writeln!(f, "Default prompt (always)")?;
        let default_prompt = if self.default_prompt.is_empty() { "-" } else { self.default_prompt.as_str() };
        writeln!(f, "{}", default_prompt)?;

        writeln!(f)?;
        match self.custom_prompt() {
            Some(prompt) if self.has_custom_prompt() => {
                writeln!(f, "Custom org prompt [Important]")?;
                writeln!(f, "{}", prompt)?;
            }
            _ => writeln!(f, "Custom org prompt: none")?,
        }

        let limits = self.limits();
        let show = |v: Option<String>| v.unwrap_or_else(|| "server default".to_string());
        writeln!(f)?;
        writeln!(f, "Upload limits")?;
        writeln!(f, "  Max PDFs: {}", show(limits.max_pdfs.map(|n| n.to_string())))?;
        writeln!(f, "  Max characters per PDF: {}", show(limits.max_chars.map(|n| n.to_string())))?;
        writeln!(
            f,
            "  Upload enabled: {}",
            if limits.upload_enabled.unwrap_or(true) { "yes" } else { "no" }
        )?;

        writeln!(f)?;
        writeln!(f, "API keys (one active; a new key revokes the old)")?;
        for key in &self.api_keys {
            writeln!(f, "  {}  {}", key.key_prefix, format_timestamp(key.created_at.as_deref()))?;
        }

        writeln!(f)?;
        writeln!(f, "Documents")?;
        if self.detail.uploads.is_empty() {
            writeln!(f, "  No documents yet.")?;
        }
        for upload in &self.detail.uploads {
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
