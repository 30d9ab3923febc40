//! Shared test harness: in-memory store implementations and request helpers
//! for driving the router in-process.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use assetdesk_api::auth::{self, Claims};
use assetdesk_api::routes::app;
use assetdesk_api::state::AppState;
use assetdesk_api::store::{
    Asset, AssetStore, AssetUpdate, CurrentUser, NewAsset, Principal, PrincipalStore, Role,
    StoreError,
};
use assetdesk_api::types::RecordId;
use assetdesk_api::validation::exists::{ExistenceChecker, ModelToken};

pub fn sha256_hex(input: &str) -> String {
    assetdesk_api::handlers::public::auth::sha256_hex(input)
}

#[derive(Default)]
pub struct MemoryPrincipalStore {
    principals: Mutex<HashMap<RecordId, Principal>>,
}

impl MemoryPrincipalStore {
    pub fn insert(&self, principal: Principal) {
        self.principals
            .lock()
            .unwrap()
            .insert(principal.id.clone(), principal);
    }

    pub fn remove(&self, id: &RecordId) {
        self.principals.lock().unwrap().remove(id);
    }
}

#[async_trait]
impl PrincipalStore for MemoryPrincipalStore {
    async fn find_current(&self, id: &RecordId) -> Result<Option<CurrentUser>, StoreError> {
        Ok(self
            .principals
            .lock()
            .unwrap()
            .get(id)
            .filter(|p| p.is_active)
            .map(CurrentUser::from))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Principal>, StoreError> {
        Ok(self
            .principals
            .lock()
            .unwrap()
            .values()
            .find(|p| p.email == email)
            .cloned())
    }
}

#[derive(Default)]
pub struct MemoryAssetStore {
    assets: Mutex<Vec<Asset>>,
}

impl MemoryAssetStore {
    pub fn count(&self) -> usize {
        self.assets.lock().unwrap().len()
    }

    pub fn get(&self, id: &RecordId) -> Option<Asset> {
        self.assets.lock().unwrap().iter().find(|a| &a.id == id).cloned()
    }
}

#[async_trait]
impl AssetStore for MemoryAssetStore {
    async fn list(&self) -> Result<Vec<Asset>, StoreError> {
        Ok(self.assets.lock().unwrap().clone())
    }

    async fn find(&self, id: &RecordId) -> Result<Option<Asset>, StoreError> {
        Ok(self.get(id))
    }

    async fn create(&self, new: NewAsset) -> Result<Asset, StoreError> {
        let now = Utc::now();
        let asset = Asset {
            id: RecordId::generate(),
            name: new.name,
            serial_number: new.serial_number,
            department_id: new.department_id,
            status: new.status,
            attachments: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.assets.lock().unwrap().push(asset.clone());
        Ok(asset)
    }

    async fn update(
        &self,
        id: &RecordId,
        update: AssetUpdate,
    ) -> Result<Option<Asset>, StoreError> {
        let mut assets = self.assets.lock().unwrap();
        let Some(asset) = assets.iter_mut().find(|a| &a.id == id) else {
            return Ok(None);
        };
        if let Some(name) = update.name {
            asset.name = name;
        }
        if let Some(serial_number) = update.serial_number {
            asset.serial_number = serial_number;
        }
        if let Some(department_id) = update.department_id {
            asset.department_id = department_id;
        }
        if let Some(status) = update.status {
            asset.status = status;
        }
        asset.updated_at = Utc::now();
        Ok(Some(asset.clone()))
    }

    async fn delete(&self, id: &RecordId) -> Result<bool, StoreError> {
        let mut assets = self.assets.lock().unwrap();
        let before = assets.len();
        assets.retain(|a| &a.id != id);
        Ok(assets.len() < before)
    }

    async fn append_attachments(
        &self,
        id: &RecordId,
        paths: &[String],
    ) -> Result<Option<Asset>, StoreError> {
        let mut assets = self.assets.lock().unwrap();
        let Some(asset) = assets.iter_mut().find(|a| &a.id == id) else {
            return Ok(None);
        };
        asset.attachments.extend(paths.iter().cloned());
        asset.updated_at = Utc::now();
        Ok(Some(asset.clone()))
    }
}

/// Existence checker over a seeded set, counting lookups so tests can assert
/// the 24-hex fast-fail skipped the store entirely.
#[derive(Default)]
pub struct MemoryExistence {
    present: Mutex<HashSet<(ModelToken, RecordId)>>,
    lookups: AtomicUsize,
}

impl MemoryExistence {
    pub fn seed(&self, model: ModelToken, id: RecordId) {
        self.present.lock().unwrap().insert((model, id));
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExistenceChecker for MemoryExistence {
    async fn exists(&self, model: ModelToken, id: &RecordId) -> Result<bool, anyhow::Error> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.present.lock().unwrap().contains(&(model, id.clone())))
    }
}

pub struct TestApp {
    pub router: Router,
    pub principals: Arc<MemoryPrincipalStore>,
    pub assets: Arc<MemoryAssetStore>,
    pub existence: Arc<MemoryExistence>,
    // Held so the upload root outlives the test.
    pub upload_root: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        let principals = Arc::new(MemoryPrincipalStore::default());
        let assets = Arc::new(MemoryAssetStore::default());
        let existence = Arc::new(MemoryExistence::default());
        let upload_root = TempDir::new().expect("tempdir");

        let state = AppState {
            principals: principals.clone(),
            assets: assets.clone(),
            existence: existence.clone(),
            upload_root: upload_root.path().to_path_buf(),
        };

        Self {
            router: app(state),
            principals,
            assets,
            existence,
            upload_root,
        }
    }

    /// Seed a principal with the given role; password is `changeme123`.
    pub fn seed_user(&self, role: Role) -> Principal {
        let id = RecordId::generate();
        let principal = Principal {
            id: id.clone(),
            email: format!("{}-{}@assetdesk.test", role.as_str(), id),
            name: format!("Test {}", role.as_str()),
            role,
            is_active: true,
            password_hash: sha256_hex("changeme123"),
        };
        self.principals.insert(principal.clone());
        principal
    }

    pub fn access_token(&self, principal: &Principal) -> String {
        auth::generate_token(&Claims::access(principal.id.clone())).expect("token")
    }

    pub fn refresh_token(&self, principal: &Principal) -> String {
        auth::generate_token(&Claims::refresh(principal.id.clone())).expect("token")
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }
}

pub fn json_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub struct FilePart {
    pub field: &'static str,
    pub filename: &'static str,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

const BOUNDARY: &str = "assetdesk-test-boundary";

pub fn multipart_request(uri: &str, token: &str, parts: &[FilePart]) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                part.field, part.filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", part.content_type).as_bytes());
        body.extend_from_slice(&part.bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}
