use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::store::{Asset, AssetStatus, StoreError};
use crate::types::RecordId;

#[derive(Debug, Clone, FromRow)]
pub struct AssetRow {
    pub id: RecordId,
    pub name: String,
    pub serial_number: String,
    pub department_id: RecordId,
    pub status: String,
    pub attachments: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<AssetRow> for Asset {
    type Error = StoreError;

    fn try_from(row: AssetRow) -> Result<Self, Self::Error> {
        let status: AssetStatus = row
            .status
            .parse()
            .map_err(|e: String| StoreError::Unexpected(anyhow::anyhow!(e)))?;
        Ok(Asset {
            id: row.id,
            name: row.name,
            serial_number: row.serial_number,
            department_id: row.department_id,
            status,
            attachments: row.attachments,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
