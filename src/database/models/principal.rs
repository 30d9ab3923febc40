use sqlx::FromRow;

use crate::store::{Principal, Role, StoreError};
use crate::types::RecordId;

#[derive(Debug, Clone, FromRow)]
pub struct PrincipalRow {
    pub id: RecordId,
    pub email: String,
    pub name: String,
    pub role: String,
    pub is_active: bool,
    pub password_hash: String,
}

impl TryFrom<PrincipalRow> for Principal {
    type Error = StoreError;

    fn try_from(row: PrincipalRow) -> Result<Self, Self::Error> {
        let role: Role = row
            .role
            .parse()
            .map_err(|e: String| StoreError::Unexpected(anyhow::anyhow!(e)))?;
        Ok(Principal {
            id: row.id,
            email: row.email,
            name: row.name,
            role,
            is_active: row.is_active,
            password_hash: row.password_hash,
        })
    }
}
