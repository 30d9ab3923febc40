//! Referential existence checks for validated reference fields.
//!
//! The model registry is a closed enum: every collection an existence check
//! can target is enumerated here, so an unknown model token is
//! unrepresentable rather than a runtime lookup failure.

use async_trait::async_trait;

use crate::error::ApiError;
use crate::types::RecordId;

use super::Sanitized;

/// Collections that reference fields may point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelToken {
    Organization,
    Branch,
    Department,
    User,
    Asset,
}

impl ModelToken {
    /// Collection name used in error messages and table lookups.
    pub fn collection(&self) -> &'static str {
        match self {
            ModelToken::Organization => "organizations",
            ModelToken::Branch => "branches",
            ModelToken::Department => "departments",
            ModelToken::User => "users",
            ModelToken::Asset => "assets",
        }
    }
}

/// Store-side half of reference validation. The sync pass only collects
/// `(model, field, id)` triples; this trait answers whether each id exists.
#[async_trait]
pub trait ExistenceChecker: Send + Sync {
    async fn exists(&self, model: ModelToken, id: &RecordId) -> Result<bool, anyhow::Error>;
}

/// Async validation pass: confirm every collected reference points at a
/// live record. Missing records produce field-level errors naming the
/// referenced collection; store failures surface as internal errors.
pub async fn run_reference_checks(
    sanitized: &Sanitized,
    checker: &dyn ExistenceChecker,
) -> Result<(), ApiError> {
    let mut errors = Vec::new();
    for reference in sanitized.references() {
        let found = checker
            .exists(reference.model, &reference.id)
            .await
            .map_err(ApiError::internal)?;
        if !found {
            errors.push(format!(
                "{} '{}' does not exist in {}",
                reference.field,
                reference.id,
                reference.model.collection()
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::validation(errors.join(", ")))
    }
}
