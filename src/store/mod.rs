//! Store seams between the request pipeline and the data layer.
//!
//! The middleware and handlers only see these traits; `postgres.rs` provides
//! the production implementations and the integration tests substitute
//! in-memory ones.

pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::types::RecordId;

/// Role tags, fixed at compile time. `Admin` is the distinguished super role
/// that bypasses all permission checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Technician,
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Technician => "technician",
            Role::Viewer => "viewer",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "technician" => Ok(Role::Technician),
            "viewer" => Ok(Role::Viewer),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// Full principal record, read at login time.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: RecordId,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub is_active: bool,
    pub password_hash: String,
}

/// Minimal projection attached to the request by the auth middleware.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub id: RecordId,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl From<&Principal> for CurrentUser {
    fn from(p: &Principal) -> Self {
        Self {
            id: p.id.clone(),
            email: p.email.clone(),
            name: p.name.clone(),
            role: p.role,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetStatus {
    Active,
    Maintenance,
    Retired,
}

impl AssetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetStatus::Active => "active",
            AssetStatus::Maintenance => "maintenance",
            AssetStatus::Retired => "retired",
        }
    }
}

impl FromStr for AssetStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AssetStatus::Active),
            "maintenance" => Ok(AssetStatus::Maintenance),
            "retired" => Ok(AssetStatus::Retired),
            other => Err(format!("unknown asset status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Asset {
    pub id: RecordId,
    pub name: String,
    pub serial_number: String,
    pub department_id: RecordId,
    pub status: AssetStatus,
    pub attachments: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAsset {
    pub name: String,
    pub serial_number: String,
    pub department_id: RecordId,
    pub status: AssetStatus,
}

#[derive(Debug, Clone, Default)]
pub struct AssetUpdate {
    pub name: Option<String>,
    pub serial_number: Option<String>,
    pub department_id: Option<RecordId>,
    pub status: Option<AssetStatus>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound("record"),
            other => StoreError::Unexpected(other.into()),
        }
    }
}

#[async_trait]
pub trait PrincipalStore: Send + Sync {
    /// Resolve the minimal projection used by the token verifier. Inactive
    /// principals resolve to `None` just like missing ones.
    async fn find_current(&self, id: &RecordId) -> Result<Option<CurrentUser>, StoreError>;

    /// Full credential record, used only at login.
    async fn find_by_email(&self, email: &str) -> Result<Option<Principal>, StoreError>;
}

#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Asset>, StoreError>;

    async fn find(&self, id: &RecordId) -> Result<Option<Asset>, StoreError>;

    async fn create(&self, new: NewAsset) -> Result<Asset, StoreError>;

    async fn update(&self, id: &RecordId, update: AssetUpdate)
        -> Result<Option<Asset>, StoreError>;

    async fn delete(&self, id: &RecordId) -> Result<bool, StoreError>;

    /// Record stored upload paths on the asset. Paths are appended, never
    /// rewritten.
    async fn append_attachments(
        &self,
        id: &RecordId,
        paths: &[String],
    ) -> Result<Option<Asset>, StoreError>;
}
