use axum::extract::{Extension, Multipart, Path, Query, State};
use axum::Json;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::store::{Asset, AssetStatus, AssetUpdate, CurrentUser, NewAsset};
use crate::types::RecordId;
use crate::upload::{self, StoredFile, UploadPolicy, UploadRule};
use crate::validation::exists::{run_reference_checks, ModelToken};
use crate::validation::{FieldKind, FieldRule, Schema};

const STATUS_VALUES: &[&str] = &["active", "maintenance", "retired"];

static ATTACHMENT_POLICY: Lazy<UploadPolicy> = Lazy::new(|| {
    UploadPolicy::new(vec![
        (
            "photo",
            UploadRule {
                allowed_mime_types: &["image/jpeg", "image/png", "image/webp"],
                max_size: 5 * 1024 * 1024,
            },
        ),
        (
            "invoice",
            UploadRule {
                allowed_mime_types: &["application/pdf"],
                max_size: 10 * 1024 * 1024,
            },
        ),
    ])
});

pub fn attachment_policy() -> &'static UploadPolicy {
    &ATTACHMENT_POLICY
}

fn create_schema() -> Schema {
    Schema::body(vec![
        FieldRule::required("name", FieldKind::Text { min: 1, max: 120 }),
        FieldRule::required("serial_number", FieldKind::Text { min: 1, max: 64 }),
        FieldRule::required(
            "department_id",
            FieldKind::Reference(ModelToken::Department),
        ),
        FieldRule::optional("status", FieldKind::Enumeration(STATUS_VALUES)),
    ])
}

fn update_schema() -> Schema {
    Schema::body(vec![
        FieldRule::optional("name", FieldKind::Text { min: 1, max: 120 }),
        FieldRule::optional("serial_number", FieldKind::Text { min: 1, max: 64 }),
        FieldRule::optional(
            "department_id",
            FieldKind::Reference(ModelToken::Department),
        ),
        FieldRule::optional("status", FieldKind::Enumeration(STATUS_VALUES)),
    ])
}

fn list_schema() -> Schema {
    Schema::query(vec![
        FieldRule::optional("limit", FieldKind::Integer { min: 1, max: 500 }),
        FieldRule::optional("offset", FieldKind::Integer { min: 0, max: i64::MAX }),
    ])
}

fn parse_asset_id(raw: &str) -> Result<RecordId, ApiError> {
    RecordId::parse(raw).map_err(|_| ApiError::validation("id must be a valid record id"))
}

#[derive(Debug, Deserialize)]
struct CreateAssetRequest {
    name: String,
    serial_number: String,
    department_id: RecordId,
    status: Option<AssetStatus>,
}

#[derive(Debug, Deserialize)]
struct UpdateAssetRequest {
    name: Option<String>,
    serial_number: Option<String>,
    department_id: Option<RecordId>,
    status: Option<AssetStatus>,
}

#[derive(Debug, Serialize)]
pub struct AttachmentResponse {
    pub asset: Asset,
    pub files: Vec<StoredFile>,
}

/// GET /api/assets - list assets, newest first.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<std::collections::HashMap<String, String>>,
) -> ApiResult<Vec<Asset>> {
    let query = Value::Object(
        params
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect(),
    );
    let sanitized = list_schema().check(&Value::Null, &query)?;
    let limit = sanitized.query_i64("limit").unwrap_or(100) as usize;
    let offset = sanitized.query_i64("offset").unwrap_or(0) as usize;

    let assets = state.assets.list().await?;
    let page = assets.into_iter().skip(offset).take(limit).collect();
    Ok(ApiResponse::success(page))
}

/// POST /api/assets - create an asset after shape validation and the
/// department existence check.
pub async fn create(
    State(state): State<AppState>,
    Extension(_current): Extension<CurrentUser>,
    Json(payload): Json<Value>,
) -> ApiResult<Asset> {
    let sanitized = create_schema().check(&payload, &Value::Null)?;
    run_reference_checks(&sanitized, state.existence.as_ref()).await?;
    let req: CreateAssetRequest = sanitized.into_body()?;

    let asset = state
        .assets
        .create(NewAsset {
            name: req.name,
            serial_number: req.serial_number,
            department_id: req.department_id,
            status: req.status.unwrap_or(AssetStatus::Active),
        })
        .await?;

    Ok(ApiResponse::created(asset))
}

/// GET /api/assets/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Asset> {
    let id = parse_asset_id(&id)?;
    let asset = state
        .assets
        .find(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("asset '{}' not found", id)))?;
    Ok(ApiResponse::success(asset))
}

/// PUT /api/assets/:id - partial update.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<Value>,
) -> ApiResult<Asset> {
    let id = parse_asset_id(&id)?;
    let sanitized = update_schema().check(&payload, &Value::Null)?;
    run_reference_checks(&sanitized, state.existence.as_ref()).await?;
    let req: UpdateAssetRequest = sanitized.into_body()?;

    let asset = state
        .assets
        .update(
            &id,
            AssetUpdate {
                name: req.name,
                serial_number: req.serial_number,
                department_id: req.department_id,
                status: req.status,
            },
        )
        .await?
        .ok_or_else(|| ApiError::not_found(format!("asset '{}' not found", id)))?;

    Ok(ApiResponse::success(asset))
}

/// DELETE /api/assets/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let id = parse_asset_id(&id)?;
    if !state.assets.delete(&id).await? {
        return Err(ApiError::not_found(format!("asset '{}' not found", id)));
    }
    Ok(ApiResponse::<()>::no_content())
}

/// POST /api/assets/:id/attachments - multipart upload of a photo and/or
/// invoice, stored under the uploading principal's directory and recorded
/// on the asset.
pub async fn upload_attachments(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> ApiResult<AttachmentResponse> {
    let id = parse_asset_id(&id)?;
    state
        .assets
        .find(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("asset '{}' not found", id)))?;

    let files = upload::save_multipart(
        attachment_policy(),
        &current.id,
        &state.upload_root,
        multipart,
    )
    .await?;

    let paths: Vec<String> = files.iter().map(|f| f.relative_path.clone()).collect();
    let asset = state
        .assets
        .append_attachments(&id, &paths)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("asset '{}' not found", id)))?;

    Ok(ApiResponse::success(AttachmentResponse { asset, files }))
}
