/// Shared types used across the codebase
use std::fmt;
use std::str::FromStr;

use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Record identifier: exactly 24 lowercase hexadecimal characters.
///
/// Parsing is the first line of defense for every reference field: a value
/// that is not 24 hex characters is rejected before any store lookup happens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(try_from = "String", into = "String")]
#[sqlx(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Generate a fresh identifier from 12 random bytes.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 12];
        rand::thread_rng().fill_bytes(&mut bytes);
        let mut out = String::with_capacity(24);
        for b in bytes {
            out.push_str(&format!("{:02x}", b));
        }
        Self(out)
    }

    /// Parse a candidate identifier, rejecting anything that is not exactly
    /// 24 lowercase hex characters.
    pub fn parse(value: &str) -> Result<Self, RecordIdError> {
        let ok = value.len() == 24
            && value
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if ok {
            Ok(Self(value.to_string()))
        } else {
            Err(RecordIdError(value.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid record id '{0}' (expected 24 hex characters)")]
pub struct RecordIdError(String);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RecordId {
    type Err = RecordIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RecordId {
    type Error = RecordIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}
