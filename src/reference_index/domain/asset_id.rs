use crate::shared::error::IndexError;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Maximum length for asset ids (security limit)
const MAX_ASSET_ID_LENGTH: usize = 4096;

/// NewType wrapper for an asset identifier
///
/// Ids are opaque, path-like strings (`Assets/Prefabs/Door.prefab`).
/// Equality is exact string equality; no normalisation is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssetId(String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Result<Self, IndexError> {
        let id = id.into();
        if id.is_empty() {
            return Err(IndexError::InvalidAssetId {
                reason: "asset id cannot be empty".to_string(),
            });
        }

        if id.len() > MAX_ASSET_ID_LENGTH {
            return Err(IndexError::InvalidAssetId {
                reason: format!(
                    "asset id is too long ({} bytes). Maximum allowed: {} bytes",
                    id.len(),
                    MAX_ASSET_ID_LENGTH
                ),
            });
        }

        if id.contains('\0') {
            return Err(IndexError::InvalidAssetId {
                reason: "asset id contains a NUL byte".to_string(),
            });
        }

        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment, used as the display name of the asset
    pub fn file_name(&self) -> &str {
        let trimmed = self.0.trim_end_matches('/');
        match trimmed.rsplit_once('/') {
            Some((_, name)) if !name.is_empty() => name,
            _ => trimmed,
        }
    }
}

impl TryFrom<String> for AssetId {
    type Error = IndexError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AssetId> for String {
    fn from(id: AssetId) -> Self {
        id.0
    }
}

impl Borrow<str> for AssetId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
