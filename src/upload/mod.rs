//! Multipart upload handling with per-field rules and principal-scoped
//! storage.
//!
//! Each route supplies an [`UploadPolicy`] at startup: a map from expected
//! field name to allowed MIME types and a size figure. The transport exposes
//! a single body limit, so the per-field sizes share one global ceiling equal
//! to the largest configured figure ([`UploadPolicy::global_size_limit`]);
//! narrower per-field limits are not enforced. Accepted files land under
//! `<root>/<principalId>/` with collision-resistant generated names, and the
//! principal-prefixed relative path is recorded on each [`StoredFile`].

use std::collections::HashMap;
use std::path::Path;

use axum::extract::Multipart;
use chrono::Utc;
use rand::Rng;

use crate::error::ApiError;
use crate::types::RecordId;

/// Per-field validation rule, supplied by route configuration.
#[derive(Debug, Clone)]
pub struct UploadRule {
    pub allowed_mime_types: &'static [&'static str],
    pub max_size: usize,
}

/// Immutable per-route upload configuration.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    fields: HashMap<&'static str, UploadRule>,
}

impl UploadPolicy {
    pub fn new(fields: Vec<(&'static str, UploadRule)>) -> Self {
        Self {
            fields: fields.into_iter().collect(),
        }
    }

    /// Single size ceiling applied to every field: the maximum across all
    /// configured per-field sizes.
    pub fn global_size_limit(&self) -> usize {
        self.fields.values().map(|r| r.max_size).max().unwrap_or(0)
    }

    fn rule(&self, field: &str) -> Option<&UploadRule> {
        self.fields.get(field)
    }
}

/// A file persisted under the owning principal's directory.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StoredFile {
    pub field: String,
    pub original_name: String,
    pub content_type: String,
    pub size: usize,
    /// Always begins with the owning principal's id segment.
    pub relative_path: String,
}

/// Validate and persist every field of a multipart request.
///
/// Unexpected fields and disallowed MIME types are rejected before anything
/// is written to disk. The per-principal destination directory is created
/// with `create_dir_all`, which is idempotent under concurrent first use.
pub async fn save_multipart(
    policy: &UploadPolicy,
    principal_id: &RecordId,
    upload_root: &Path,
    mut multipart: Multipart,
) -> Result<Vec<StoredFile>, ApiError> {
    let mut stored = Vec::new();
    let ceiling = policy.global_size_limit();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(ApiError::validation(format!("malformed multipart body: {}", e))),
        };

        let name = match field.name() {
            Some(name) => name.to_string(),
            None => return Err(ApiError::validation("unnamed multipart field")),
        };

        let rule = policy
            .rule(&name)
            .ok_or_else(|| ApiError::upload(&name, "unexpected upload field"))?;

        let content_type = field
            .content_type()
            .map(|ct| ct.to_string())
            .ok_or_else(|| ApiError::upload(&name, "missing content type"))?;

        // Reject on declared type before reading any bytes.
        if !rule.allowed_mime_types.contains(&content_type.as_str()) {
            return Err(ApiError::upload(
                &name,
                format!(
                    "content type '{}' is not allowed (expected one of: {})",
                    content_type,
                    rule.allowed_mime_types.join(", ")
                ),
            ));
        }

        let original_name = field.file_name().unwrap_or("upload").to_string();

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::upload(&name, format!("failed to read upload: {}", e)))?;

        if bytes.len() > ceiling {
            return Err(ApiError::upload(
                &name,
                format!("file exceeds the {} byte size limit", ceiling),
            ));
        }

        let dir = upload_root.join(principal_id.as_str());
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| ApiError::internal(anyhow::anyhow!("creating upload dir: {}", e)))?;

        let filename = generate_filename(&name, &original_name);
        tokio::fs::write(dir.join(&filename), &bytes)
            .await
            .map_err(|e| ApiError::internal(anyhow::anyhow!("writing upload: {}", e)))?;

        stored.push(StoredFile {
            field: name,
            original_name,
            content_type,
            size: bytes.len(),
            relative_path: format!("{}/{}", principal_id, filename),
        });
    }

    Ok(stored)
}

/// `<field>-<epochMillis>-<randomInt><originalExtension>`: collision-resistant
/// under concurrent uploads without a central sequence.
fn generate_filename(field: &str, original_name: &str) -> String {
    let extension = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default();
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    format!(
        "{}-{}-{}{}",
        field,
        Utc::now().timestamp_millis(),
        suffix,
        extension
    )
}
