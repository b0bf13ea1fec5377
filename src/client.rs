//! Resource client: the fixed catalogue of backend operations.
//!
//! Tenant-scoped calls act on the caller's own org as resolved server-side
//! from the credential. Administrator calls take an explicit org id and are
//! rejected by the server for non-admin credentials; nothing here checks the
//! role locally.

use reqwest::multipart::{Form, Part};
use tracing::info;

use crate::credential::{Credential, CredentialStore};
use crate::error::{ApiError, ApiResult, CredentialError};
use crate::gateway::Gateway;
use crate::models::*;

/// Minimum password length enforced before the first administrator registers.
pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone)]
pub struct ResourceClient {
    gateway: Gateway,
}

impl ResourceClient {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub fn credentials(&self) -> &dyn CredentialStore {
        self.gateway.credentials()
    }

    // --- Auth ---

    /// Registers the first administrator and stores the returned credential.
    pub async fn register(&self, email: &str, password: &str) -> ApiResult<LoginResponse> {
        check_password(password)?;
        let body = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        let res: LoginResponse = self.gateway.post("/auth/register", &body).await?;
        self.store_credential(&res)?;
        Ok(res)
    }

    /// Logs in and stores the returned credential, replacing any previous one.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<LoginResponse> {
        let body = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        let res: LoginResponse = self.gateway.post("/auth/login", &body).await?;
        self.store_credential(&res)?;
        Ok(res)
    }

    fn store_credential(&self, res: &LoginResponse) -> ApiResult<()> {
        self.credentials()
            .set(Some(&Credential::new(res.access_token.clone())))
            .map_err(|e| ApiError::transport(e.to_string()))?;
        info!(user = %res.user.email, role = %res.user.role, "signed in");
        Ok(())
    }

    /// Clears the stored credential.
    pub fn logout(&self) -> Result<(), CredentialError> {
        self.credentials().set(None)?;
        info!("signed out");
        Ok(())
    }

    pub async fn me(&self) -> ApiResult<User> {
        self.gateway.get("/auth/me").await
    }

    /// Creates a tenant and its first user. The caller's own credential is untouched.
    pub async fn register_org_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> ApiResult<LoginResponse> {
        let body = RegisterOrgRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        self.gateway.post("/auth/register-org", &body).await
    }

    // --- Tenant ---

    pub async fn org_dashboard(&self) -> ApiResult<OrgDashboardResponse> {
        self.gateway.get("/org/dashboard").await
    }

    pub async fn upload_document(
        &self,
        org_id: &str,
        filename: &str,
        bytes: Vec<u8>,
    ) -> ApiResult<UploadResponse> {
        let part = Part::bytes(bytes).file_name(filename.to_string());
        let form = Form::new().part("file", part);
        self.gateway
            .post_multipart(&format!("/orgs/{}/rag/upload", org_id), form)
            .await
    }

    pub async fn query(&self, org_id: &str, question: &str) -> ApiResult<QueryResponse> {
        let body = QueryRequest {
            question: question.to_string(),
        };
        self.gateway
            .post(&format!("/orgs/{}/rag/query", org_id), &body)
            .await
    }

    /// Self-service key creation; the server caps these at three per org.
    pub async fn create_own_api_key(&self) -> ApiResult<CreateApiKeyResponse> {
        self.gateway.post_empty("/org/api-keys").await
    }

    pub async fn list_own_api_keys(&self) -> ApiResult<ListApiKeysResponse> {
        self.gateway.get("/org/api-keys").await
    }

    // --- Administration ---

    pub async fn create_org(&self, name: &str) -> ApiResult<Org> {
        let body = CreateOrgRequest {
            name: name.to_string(),
        };
        self.gateway.post("/orgs", &body).await
    }

    pub async fn get_org(&self, org_id: &str) -> ApiResult<Org> {
        self.gateway.get(&format!("/orgs/{}", org_id)).await
    }

    pub async fn admin_dashboard(&self) -> ApiResult<AdminDashboardResponse> {
        self.gateway.get("/admin/dashboard").await
    }

    pub async fn admin_list_orgs(&self) -> ApiResult<OrgListResponse> {
        self.gateway.get("/admin/orgs").await
    }

    pub async fn admin_get_org(&self, org_id: &str) -> ApiResult<OrgDetailResponse> {
        self.gateway.get(&format!("/admin/orgs/{}", org_id)).await
    }

    /// `None` clears the org's custom prompt.
    pub async fn set_org_prompt(
        &self,
        org_id: &str,
        content: Option<&str>,
    ) -> ApiResult<OkResponse> {
        let body = SetPromptRequest {
            content: content.map(str::to_string),
        };
        self.gateway
            .put(&format!("/admin/orgs/{}/prompt", org_id), &body)
            .await
    }

    pub async fn set_org_limits(&self, org_id: &str, limits: &OrgLimits) -> ApiResult<OkResponse> {
        self.gateway
            .put(&format!("/admin/orgs/{}/limits", org_id), limits)
            .await
    }

    pub async fn default_prompt(&self) -> ApiResult<PromptResponse> {
        self.gateway.get("/admin/prompt").await
    }

    /// Admin-path key creation; the server revokes the org's previous key.
    pub async fn create_org_api_key(&self, org_id: &str) -> ApiResult<CreateApiKeyResponse> {
        self.gateway
            .post_empty(&format!("/admin/orgs/{}/api-keys", org_id))
            .await
    }

    pub async fn list_org_api_keys(&self, org_id: &str) -> ApiResult<ListApiKeysResponse> {
        self.gateway
            .get(&format!("/admin/orgs/{}/api-keys", org_id))
            .await
    }

    pub async fn vector_store(&self) -> ApiResult<VectorStoreResponse> {
        self.gateway.get("/admin/vector").await
    }
}

fn check_password(password: &str) -> ApiResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}
