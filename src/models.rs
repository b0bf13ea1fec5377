use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Role claim that unlocks the administrator console.
pub const ADMIN_ROLE: &str = "admin";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub role: String, // "admin" or any tenant role
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}

/// A tenant and its upload quota configuration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Org {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pdfs: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_chars: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_enabled: Option<bool>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub id: i64,
    pub org_id: String,
    pub filename: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Redacted view of an issued API key. The secret itself is never listed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ApiKeyInfo {
    #[serde(default)]
    pub id: String,
    pub key_prefix: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

// --- Auth ---

#[derive(Serialize, Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct RegisterOrgRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    pub user: User,
}

// --- Tenant ---

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OrgDashboardResponse {
    pub org: Org,
    #[serde(default)]
    pub uploads: Vec<Upload>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UploadResponse {
    pub message: String,
    pub chunks_stored: u64,
}

#[derive(Serialize, Debug, Clone)]
pub struct QueryRequest {
    pub question: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct QueryResponse {
    pub answer: String,
}

// --- Administration ---

#[derive(Serialize, Debug, Clone)]
pub struct CreateOrgRequest {
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OrgWithUploadCount {
    #[serde(flatten)]
    pub org: Org,
    pub upload_count: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AdminDashboardResponse {
    pub orgs: Vec<OrgWithUploadCount>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OrgListResponse {
    pub orgs: Vec<Org>,
}

/// Everything the org detail view shows: the org, its uploads, custom prompt and limits.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OrgDetailResponse {
    #[serde(flatten)]
    pub org: Org,
    #[serde(default)]
    pub uploads: Vec<Upload>,
    #[serde(default)]
    pub upload_count: u64,
    #[serde(default)]
    pub custom_prompt: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PromptResponse {
    pub content: String,
}

/// `content: None` serializes as `null`, which clears the org prompt.
#[derive(Serialize, Debug, Clone)]
pub struct SetPromptRequest {
    pub content: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct OrgLimits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pdfs: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_chars: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_enabled: Option<bool>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OkResponse {
    #[serde(default)]
    pub ok: bool,
}

// --- API keys ---

/// Returned exactly once, at creation. `api_key` cannot be fetched again.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateApiKeyResponse {
    pub api_key: String,
    pub key_prefix: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl CreateApiKeyResponse {
    /// The listable half of a freshly issued key.
    pub fn info(&self) -> ApiKeyInfo {
        ApiKeyInfo {
            id: String::new(),
            key_prefix: self.key_prefix.clone(),
            created_at: self.created_at.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ListApiKeysResponse {
    #[serde(default)]
    pub api_keys: Vec<ApiKeyInfo>,
}

// --- Vector inspection ---

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct VectorStoreEmbedding {
    pub id: String,
    #[serde(default)]
    pub document_preview: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct VectorStoreResponse {
    pub collection_name: String,
    pub total_embeddings: u64,
    #[serde(default)]
    pub recent: Vec<VectorStoreEmbedding>,
}
