//! In-process fake of the RAG backend (axum on an ephemeral port).
//!
//! Mirrors the REST surface the console talks to, with just enough state to
//! check session, authorization and quota behavior end to end. Every request
//! is recorded with the Authorization header it carried.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Multipart, Path, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use rag_console::credential::{Credential, CredentialStore, MemoryCredentialStore, SharedCredentials};
use rag_console::{App, Gateway, ResourceClient};

pub const DEFAULT_PROMPT: &str = "Answer only from the provided documents.";
pub const CREATED_AT: &str = "2024-03-01T12:00:00Z";

pub type Shared = Arc<Mutex<BackendState>>;
type Reply = Result<Json<Value>, (StatusCode, Json<Value>)>;

#[derive(Debug, Clone)]
pub struct FakeUser {
    pub id: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub org_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FakeOrg {
    pub id: String,
    pub name: String,
    pub max_pdfs: Option<u64>,
    pub max_chars: Option<u64>,
    pub upload_enabled: Option<bool>,
    pub custom_prompt: Option<String>,
    pub uploads: Vec<Value>,
    pub self_keys: Vec<Value>,
    pub admin_keys: Vec<Value>,
}

#[derive(Debug, Clone)]
pub struct Call {
    pub method: String,
    pub path: String,
    pub auth: Option<String>,
}

/// Canned failure for one path, answered after `delay`.
#[derive(Debug, Clone)]
pub struct Fault {
    pub status: StatusCode,
    pub detail: String,
    pub delay: Duration,
}

#[derive(Debug, Default)]
pub struct BackendState {
    pub users: Vec<FakeUser>,
    pub tokens: HashMap<String, String>,
    pub orgs: Vec<FakeOrg>,
    pub calls: Vec<Call>,
    pub faults: HashMap<String, Fault>,
    next_id: u64,
}

impl BackendState {
    fn next(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    pub fn add_user(&mut self, email: &str, password: &str, role: &str, org_id: Option<String>) -> FakeUser {
        let user = FakeUser {
            id: self.next("user"),
            email: email.to_string(),
            password: password.to_string(),
            role: role.to_string(),
            org_id,
        };
        self.users.push(user.clone());
        user
    }

    pub fn add_org(&mut self, name: &str) -> String {
        let id = self.next("org");
        self.orgs.push(FakeOrg {
            id: id.clone(),
            name: name.to_string(),
            max_pdfs: None,
            max_chars: None,
            upload_enabled: None,
            custom_prompt: None,
            uploads: Vec::new(),
            self_keys: Vec::new(),
            admin_keys: Vec::new(),
        });
        id
    }

    fn login_response(&mut self, user: &FakeUser) -> Value {
        let token = self.next("tok");
        self.tokens.insert(token.clone(), user.id.clone());
        json!({ "access_token": token, "token_type": "bearer", "user": user_json(user) })
    }

    fn new_key(&mut self) -> (String, Value) {
        let id = self.next("key");
        let secret = format!("rk_{}_secretpart", id);
        let info = json!({ "id": id, "key_prefix": format!("rk_{}", id), "created_at": CREATED_AT });
        (secret, info)
    }

    pub fn org(&self, id: &str) -> Option<&FakeOrg> {
        self.orgs.iter().find(|o| o.id == id)
    }

    fn org_mut(&mut self, id: &str) -> Result<&mut FakeOrg, (StatusCode, Json<Value>)> {
        self.orgs
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| reject(StatusCode::NOT_FOUND, "Org not found"))
    }
}

fn user_json(user: &FakeUser) -> Value {
    json!({ "id": user.id, "email": user.email, "role": user.role, "org_id": user.org_id })
}

fn org_json(org: &FakeOrg) -> Value {
    json!({
        "id": org.id,
        "name": org.name,
        "created_at": CREATED_AT,
        "max_pdfs": org.max_pdfs,
        "max_chars": org.max_chars,
        "upload_enabled": org.upload_enabled,
    })
}

fn reject(status: StatusCode, detail: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "detail": detail })))
}

fn caller(state: &BackendState, headers: &HeaderMap) -> Result<FakeUser, (StatusCode, Json<Value>)> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Not authenticated"))?;
    let user_id = state
        .tokens
        .get(token)
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Invalid or expired token"))?;
    state
        .users
        .iter()
        .find(|u| &u.id == user_id)
        .cloned()
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "User no longer exists"))
}

fn require_admin(state: &BackendState, headers: &HeaderMap) -> Result<FakeUser, (StatusCode, Json<Value>)> {
    let user = caller(state, headers)?;
    if user.role != "admin" {
        return Err(reject(StatusCode::FORBIDDEN, "Admin only"));
    }
    Ok(user)
}

fn require_member(state: &BackendState, headers: &HeaderMap) -> Result<String, (StatusCode, Json<Value>)> {
    caller(state, headers)?
        .org_id
        .ok_or_else(|| reject(StatusCode::FORBIDDEN, "No organization for this user"))
}

fn field(body: &Value, name: &str) -> String {
    body.get(name).and_then(Value::as_str).unwrap_or_default().to_string()
}

async fn record(State(state): State<Shared>, req: Request<Body>, next: Next) -> Response {
    let call = Call {
        method: req.method().to_string(),
        path: req.uri().path().to_string(),
        auth: req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };
    let fault = {
        let mut st = state.lock().unwrap();
        let fault = st.faults.get(&call.path).cloned();
        st.calls.push(call);
        fault
    };
    match fault {
        Some(fault) => {
            tokio::time::sleep(fault.delay).await;
            reject(fault.status, &fault.detail).into_response()
        }
        None => next.run(req).await,
    }
}

// --- Auth ---

async fn register(State(state): State<Shared>, Json(body): Json<Value>) -> Reply {
    let mut st = state.lock().unwrap();
    if st.users.iter().any(|u| u.role == "admin") {
        return Err(reject(StatusCode::BAD_REQUEST, "Admin already registered"));
    }
    let user = st.add_user(&field(&body, "email"), &field(&body, "password"), "admin", None);
    Ok(Json(st.login_response(&user)))
}

async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> Reply {
    let mut st = state.lock().unwrap();
    let (email, password) = (field(&body, "email"), field(&body, "password"));
    let user = st
        .users
        .iter()
        .find(|u| u.email == email && u.password == password)
        .cloned()
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Invalid email or password"))?;
    Ok(Json(st.login_response(&user)))
}

async fn me(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    let st = state.lock().unwrap();
    Ok(Json(user_json(&caller(&st, &headers)?)))
}

async fn register_org(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    let mut st = state.lock().unwrap();
    require_admin(&st, &headers)?;
    let email = field(&body, "email");
    if st.users.iter().any(|u| u.email == email) {
        return Err(reject(StatusCode::BAD_REQUEST, "Email already registered"));
    }
    let org_id = st.add_org(&field(&body, "name"));
    let user = st.add_user(&email, &field(&body, "password"), "member", Some(org_id));
    Ok(Json(st.login_response(&user)))
}

// --- Tenant ---

async fn org_dashboard(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    let mut st = state.lock().unwrap();
    let org_id = require_member(&st, &headers)?;
    let org = st.org_mut(&org_id)?;
    Ok(Json(json!({ "org": org_json(org), "uploads": org.uploads })))
}

async fn own_keys(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    let mut st = state.lock().unwrap();
    let org_id = require_member(&st, &headers)?;
    let org = st.org_mut(&org_id)?;
    Ok(Json(json!({ "api_keys": org.self_keys })))
}

async fn create_own_key(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    let mut st = state.lock().unwrap();
    let org_id = require_member(&st, &headers)?;
    if st.org_mut(&org_id)?.self_keys.len() >= 3 {
        return Err(reject(StatusCode::BAD_REQUEST, "Max 3 API keys per org"));
    }
    let (secret, info) = st.new_key();
    st.org_mut(&org_id)?.self_keys.insert(0, info.clone());
    Ok(Json(json!({ "api_key": secret, "key_prefix": info["key_prefix"], "created_at": CREATED_AT })))
}

async fn upload(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Reply {
    let mut filename = None;
    while let Ok(Some(part)) = multipart.next_field().await {
        if part.name() == Some("file") {
            filename = part.file_name().map(str::to_string);
            let _ = part.bytes().await;
        }
    }
    let filename = filename.unwrap_or_else(|| "upload.pdf".to_string());

    let mut st = state.lock().unwrap();
    let org_id = require_member(&st, &headers)?;
    if org_id != id {
        return Err(reject(StatusCode::FORBIDDEN, "Not your organization"));
    }
    let org = st.org_mut(&org_id)?;
    if org.upload_enabled == Some(false) {
        return Err(reject(StatusCode::FORBIDDEN, "Uploads are disabled for this organization"));
    }
    let upload_id = org.uploads.len() + 1;
    org.uploads.push(json!({
        "id": upload_id,
        "org_id": org_id,
        "filename": filename,
        "created_at": CREATED_AT,
    }));
    Ok(Json(json!({ "message": format!("Uploaded {}", filename), "chunks_stored": 3 })))
}

async fn query(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let st = state.lock().unwrap();
    let org_id = require_member(&st, &headers)?;
    if org_id != id {
        return Err(reject(StatusCode::FORBIDDEN, "Not your organization"));
    }
    Ok(Json(json!({ "answer": format!("Answer to: {}", field(&body, "question")) })))
}

// --- Administration ---

async fn create_org(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    let mut st = state.lock().unwrap();
    require_admin(&st, &headers)?;
    let id = st.add_org(&field(&body, "name"));
    Ok(Json(org_json(st.org_mut(&id)?)))
}

async fn get_org(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> Reply {
    let mut st = state.lock().unwrap();
    require_admin(&st, &headers)?;
    Ok(Json(org_json(st.org_mut(&id)?)))
}

async fn admin_dashboard(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    let st = state.lock().unwrap();
    require_admin(&st, &headers)?;
    let orgs: Vec<Value> = st
        .orgs
        .iter()
        .map(|o| {
            let mut v = org_json(o);
            v["upload_count"] = json!(o.uploads.len());
            v
        })
        .collect();
    Ok(Json(json!({ "orgs": orgs })))
}

async fn admin_orgs(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    let st = state.lock().unwrap();
    require_admin(&st, &headers)?;
    let orgs: Vec<Value> = st.orgs.iter().map(org_json).collect();
    Ok(Json(json!({ "orgs": orgs })))
}

async fn admin_org_detail(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> Reply {
    let mut st = state.lock().unwrap();
    require_admin(&st, &headers)?;
    let org = st.org_mut(&id)?;
    let mut v = org_json(org);
    v["uploads"] = json!(org.uploads);
    v["upload_count"] = json!(org.uploads.len());
    v["custom_prompt"] = json!(org.custom_prompt);
    Ok(Json(v))
}

async fn set_prompt(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    let mut st = state.lock().unwrap();
    require_admin(&st, &headers)?;
    let content = body
        .get("content")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string);
    st.org_mut(&id)?.custom_prompt = content;
    Ok(Json(json!({ "ok": true })))
}

async fn set_limits(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    let mut st = state.lock().unwrap();
    require_admin(&st, &headers)?;
    let org = st.org_mut(&id)?;
    if let Some(n) = body.get("max_pdfs").and_then(Value::as_u64) {
        org.max_pdfs = Some(n);
    }
    if let Some(n) = body.get("max_chars").and_then(Value::as_u64) {
        org.max_chars = Some(n);
    }
    if let Some(enabled) = body.get("upload_enabled").and_then(Value::as_bool) {
        org.upload_enabled = Some(enabled);
    }
    Ok(Json(json!({ "ok": true })))
}

async fn default_prompt(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    let st = state.lock().unwrap();
    require_admin(&st, &headers)?;
    Ok(Json(json!({ "content": DEFAULT_PROMPT })))
}

async fn create_admin_key(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> Reply {
    let mut st = state.lock().unwrap();
    require_admin(&st, &headers)?;
    st.org_mut(&id)?;
    let (secret, info) = st.new_key();
    // One active key per org on this path: the new one revokes the rest.
    st.org_mut(&id)?.admin_keys = vec![info.clone()];
    Ok(Json(json!({ "api_key": secret, "key_prefix": info["key_prefix"], "created_at": CREATED_AT })))
}

async fn list_admin_keys(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> Reply {
    let mut st = state.lock().unwrap();
    require_admin(&st, &headers)?;
    Ok(Json(json!({ "api_keys": st.org_mut(&id)?.admin_keys })))
}

async fn vector(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    let st = state.lock().unwrap();
    require_admin(&st, &headers)?;
    Ok(Json(json!({
        "collection_name": "rag_chunks",
        "total_embeddings": 2,
        "recent": [
            { "id": "chunk-1", "document_preview": "Quarterly revenue grew", "metadata": { "source": "q3.pdf" } },
            { "id": "chunk-2", "document_preview": "", "metadata": {} },
        ],
    })))
}

pub fn router(state: Shared) -> Router {
    let api = Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .route("/auth/register-org", post(register_org))
        .route("/org/dashboard", get(org_dashboard))
        .route("/org/api-keys", get(own_keys).post(create_own_key))
        .route("/orgs", post(create_org))
        .route("/orgs/:id", get(get_org))
        .route("/orgs/:id/rag/upload", post(upload))
        .route("/orgs/:id/rag/query", post(query))
        .route("/admin/dashboard", get(admin_dashboard))
        .route("/admin/orgs", get(admin_orgs))
        .route("/admin/orgs/:id", get(admin_org_detail))
        .route("/admin/orgs/:id/prompt", put(set_prompt))
        .route("/admin/orgs/:id/limits", put(set_limits))
        .route("/admin/orgs/:id/api-keys", get(list_admin_keys).post(create_admin_key))
        .route("/admin/prompt", get(default_prompt))
        .route("/admin/vector", get(vector))
        .layer(middleware::from_fn_with_state(state.clone(), record))
        .with_state(state);
    Router::new().nest("/api", api)
}

pub struct FakeBackend {
    pub base: String,
    pub state: Shared,
}

impl FakeBackend {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(BackendState::default()));
        let app = router(state.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app.into_make_service()).await.unwrap();
        });
        Self {
            base: format!("http://{}/api", addr),
            state,
        }
    }

    pub fn seed_admin(&self, email: &str, password: &str) {
        self.state.lock().unwrap().add_user(email, password, "admin", None);
    }

    /// Creates an org with one member user; returns the org id.
    pub fn seed_tenant(&self, org_name: &str, email: &str, password: &str) -> String {
        let mut st = self.state.lock().unwrap();
        let org_id = st.add_org(org_name);
        st.add_user(email, password, "member", Some(org_id.clone()));
        org_id
    }

    /// Makes every call to `path` (below `/api`) fail with `status` after `delay`.
    pub fn fail(&self, path: &str, status: StatusCode, detail: &str, delay: Duration) {
        let fault = Fault {
            status,
            detail: detail.to_string(),
            delay,
        };
        self.state.lock().unwrap().faults.insert(path.to_string(), fault);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, method: &str, path: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.method == method && c.path == path)
            .count()
    }

    pub fn org(&self, id: &str) -> FakeOrg {
        self.state.lock().unwrap().org(id).cloned().unwrap()
    }

    pub fn app(&self, credentials: SharedCredentials) -> App {
        App::new(client_for(&self.base, credentials))
    }
}

pub fn client_for(base: &str, credentials: SharedCredentials) -> ResourceClient {
    let gateway = Gateway::new(base, Duration::from_secs(5), credentials).unwrap();
    ResourceClient::new(gateway)
}

pub fn empty_store() -> Arc<MemoryCredentialStore> {
    Arc::new(MemoryCredentialStore::new())
}

pub fn store_with(token: &str) -> Arc<MemoryCredentialStore> {
    Arc::new(MemoryCredentialStore::with(Credential::new(token)))
}

/// Logs in through the console and returns the app plus its credential store.
pub async fn signed_in(backend: &FakeBackend, email: &str, password: &str) -> (App, Arc<MemoryCredentialStore>) {
    let store = empty_store();
    let app = backend.app(store.clone());
    app.client().login(email, password).await.unwrap();
    assert!(store.is_present());
    (app, store)
}
