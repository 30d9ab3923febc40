//! sqlx-backed store implementations used by the server binary.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use crate::database::models::{AssetRow, PrincipalRow};
use crate::types::RecordId;
use crate::validation::exists::{ExistenceChecker, ModelToken};

use super::{
    Asset, AssetStore, AssetUpdate, CurrentUser, NewAsset, Principal, PrincipalStore, StoreError,
};

pub struct PgPrincipalStore {
    pool: PgPool,
}

impl PgPrincipalStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Minimal projection row for the token verifier.
#[derive(sqlx::FromRow)]
struct CurrentUserRow {
    id: RecordId,
    email: String,
    name: String,
    role: String,
}

#[async_trait]
impl PrincipalStore for PgPrincipalStore {
    async fn find_current(&self, id: &RecordId) -> Result<Option<CurrentUser>, StoreError> {
        let row = sqlx::query_as::<_, CurrentUserRow>(
            r#"
            SELECT id, email, name, role
            FROM users
            WHERE id = $1 AND is_active = TRUE
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let role = row
                    .role
                    .parse()
                    .map_err(|e: String| StoreError::Unexpected(anyhow::anyhow!(e)))?;
                Ok(Some(CurrentUser {
                    id: row.id,
                    email: row.email,
                    name: row.name,
                    role,
                }))
            }
            None => Ok(None),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Principal>, StoreError> {
        let row = sqlx::query_as::<_, PrincipalRow>(
            r#"
            SELECT id, email, name, role, is_active, password_hash
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Principal::try_from).transpose()
    }
}

pub struct PgAssetStore {
    pool: PgPool,
}

impl PgAssetStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const ASSET_COLUMNS: &str =
    "id, name, serial_number, department_id, status, attachments, created_at, updated_at";

#[async_trait]
impl AssetStore for PgAssetStore {
    async fn list(&self) -> Result<Vec<Asset>, StoreError> {
        let rows = sqlx::query_as::<_, AssetRow>(&format!(
            "SELECT {} FROM assets ORDER BY created_at DESC",
            ASSET_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Asset::try_from).collect()
    }

    async fn find(&self, id: &RecordId) -> Result<Option<Asset>, StoreError> {
        let row = sqlx::query_as::<_, AssetRow>(&format!(
            "SELECT {} FROM assets WHERE id = $1",
            ASSET_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Asset::try_from).transpose()
    }

    async fn create(&self, new: NewAsset) -> Result<Asset, StoreError> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, AssetRow>(&format!(
            r#"
            INSERT INTO assets (id, name, serial_number, department_id, status, attachments, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, '{{}}', $6, $6)
            RETURNING {}
            "#,
            ASSET_COLUMNS
        ))
        .bind(RecordId::generate())
        .bind(&new.name)
        .bind(&new.serial_number)
        .bind(&new.department_id)
        .bind(new.status.as_str())
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn update(
        &self,
        id: &RecordId,
        update: AssetUpdate,
    ) -> Result<Option<Asset>, StoreError> {
        let row = sqlx::query_as::<_, AssetRow>(&format!(
            r#"
            UPDATE assets SET
                name = COALESCE($2, name),
                serial_number = COALESCE($3, serial_number),
                department_id = COALESCE($4, department_id),
                status = COALESCE($5, status),
                updated_at = $6
            WHERE id = $1
            RETURNING {}
            "#,
            ASSET_COLUMNS
        ))
        .bind(id)
        .bind(update.name)
        .bind(update.serial_number)
        .bind(update.department_id)
        .bind(update.status.map(|s| s.as_str().to_string()))
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Asset::try_from).transpose()
    }

    async fn delete(&self, id: &RecordId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM assets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn append_attachments(
        &self,
        id: &RecordId,
        paths: &[String],
    ) -> Result<Option<Asset>, StoreError> {
        let row = sqlx::query_as::<_, AssetRow>(&format!(
            r#"
            UPDATE assets SET
                attachments = attachments || $2,
                updated_at = $3
            WHERE id = $1
            RETURNING {}
            "#,
            ASSET_COLUMNS
        ))
        .bind(id)
        .bind(paths)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Asset::try_from).transpose()
    }
}

pub struct PgExistenceChecker {
    pool: PgPool,
}

impl PgExistenceChecker {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Table names come from the closed ModelToken enum, never from request
    // input.
    fn table(model: ModelToken) -> &'static str {
        model.collection()
    }
}

#[async_trait]
impl ExistenceChecker for PgExistenceChecker {
    async fn exists(&self, model: ModelToken, id: &RecordId) -> Result<bool, anyhow::Error> {
        let query = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)",
            Self::table(model)
        );
        let found: bool = sqlx::query_scalar(&query)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(found)
    }
}
