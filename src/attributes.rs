use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

/// Text attributes of one App Store version localization.
///
/// Used both as the shape of a local `<locale>.json` file and as the
/// `attributes` member of an update request. `None` fields are left out of
/// the request so App Store Connect keeps its current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AttributeSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotional_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whats_new: Option<String>,
}

impl AttributeSet {
    /// Read and decode a localization file
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|source| SyncError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_slice(&data).map_err(|source| SyncError::Decode {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.keywords.is_none()
            && self.promotional_text.is_none()
            && self.whats_new.is_none()
    }
}
