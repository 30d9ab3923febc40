use axum::extract::{Extension, Multipart, State};
use once_cell::sync::Lazy;

use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::store::CurrentUser;
use crate::upload::{self, StoredFile, UploadPolicy, UploadRule};

static AVATAR_POLICY: Lazy<UploadPolicy> = Lazy::new(|| {
    UploadPolicy::new(vec![(
        "avatar",
        UploadRule {
            allowed_mime_types: &["image/jpeg", "image/png", "image/webp"],
            max_size: 2 * 1024 * 1024,
        },
    )])
});

pub fn avatar_policy() -> &'static UploadPolicy {
    &AVATAR_POLICY
}

/// GET /api/auth/whoami - current principal projection.
pub async fn whoami(Extension(current): Extension<CurrentUser>) -> ApiResult<CurrentUser> {
    Ok(ApiResponse::success(current))
}

/// POST /api/auth/avatar - upload the caller's avatar image. Gated on
/// authentication only; files land under the caller's own directory.
pub async fn upload_avatar(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    multipart: Multipart,
) -> ApiResult<Vec<StoredFile>> {
    let stored =
        upload::save_multipart(avatar_policy(), &current.id, &state.upload_root, multipart).await?;
    Ok(ApiResponse::success(stored))
}
