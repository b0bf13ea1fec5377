//! Admin console: every org with its upload count, plus tenant onboarding.

use std::fmt;

use tracing::info;

use super::{action_failed, format_timestamp, load_failed, ActionOutcome, Mount, Outcome};
use crate::client::ResourceClient;
use crate::models::{OrgWithUploadCount, User};
use crate::routing::Route;

#[derive(Debug)]
pub struct AdminConsole {
    client: ResourceClient,
    mount: Mount,
    user: User,
    orgs: Vec<OrgWithUploadCount>,
}

impl AdminConsole {
    pub async fn load(client: ResourceClient, user: User) -> Outcome<Self> {
        match client.admin_dashboard().await {
            Ok(dashboard) => Outcome::Ready(Self {
                client,
                mount: Mount::new(),
                user,
                orgs: dashboard.orgs,
            }),
            Err(e) => load_failed(&e, client.credentials(), &Route::Home),
        }
    }

    pub fn mount(&self) -> &Mount {
        &self.mount
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn orgs(&self) -> &[OrgWithUploadCount] {
        &self.orgs
    }

    /// Creates a tenant with its first user, then re-fetches the org list.
    pub async fn register_org_user(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
    ) -> ActionOutcome {
        let (name, email) = (name.trim(), email.trim());
        if name.is_empty() || email.is_empty() || password.is_empty() {
            return ActionOutcome::Inline(
                "Organization name, email and password are required".to_string(),
            );
        }
        if let Err(e) = self.client.register_org_user(name, email, password).await {
            return action_failed(&e, self.client.credentials());
        }
        info!(org = %name, user = %email, "org and first user registered");
        if let Err(e) = self.refresh().await {
            return e;
        }
        ActionOutcome::Done(
            "Org and user created. They can log in with that email and password.".to_string(),
        )
    }

    pub async fn create_org(&mut self, name: &str) -> ActionOutcome {
        let name = name.trim();
        if name.is_empty() {
            return ActionOutcome::Inline("Organization name is required".to_string());
        }
        let org = match self.client.create_org(name).await {
            Ok(org) => org,
            Err(e) => return action_failed(&e, self.client.credentials()),
        };
        if let Err(e) = self.refresh().await {
            return e;
        }
        ActionOutcome::Done(format!("Created org {} ({})", org.name, org.id))
    }

    async fn refresh(&mut self) -> Result<(), ActionOutcome> {
        let dashboard = self
            .client
            .admin_dashboard()
            .await
            .map_err(|e| action_failed(&e, self.client.credentials()))?;
        if self.mount.is_mounted() {
            self.orgs = dashboard.orgs;
        }
        Ok(())
    }
}

impl fmt::Display for AdminConsole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Admin Dashboard | signed in as {}", self.user.email)?;
        writeln!(f)?;
        writeln!(f, "Organizations")?;
        if self.orgs.is_empty() {
            writeln!(f, "  No organizations yet.")?;
        }
        for entry in &self.orgs {
            writeln!(
                f,
                "  {}  [{}]  {} uploads, created {}",
                entry.org.name,
                entry.org.id,
                entry.upload_count,
                format_timestamp(entry.org.created_at.as_deref())
            )?;
        }
        Ok(())
    }
}
