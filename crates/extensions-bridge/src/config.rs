//! Extensions bridge policy configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::BridgeError;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BridgePolicyFile {
    pub version: u32,
    #[serde(default)]
    pub extensions: Vec<BridgePolicyEntry>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BridgePolicyEntry {
    pub id: String,
    #[serde(default = "default_allow")]
    pub allow: bool,
    /// Overrides the bridge-wide reply deadline for this extension.
    #[serde(default)]
    pub deadline_ms: Option<u64>,
}

fn default_allow() -> bool {
    true
}

impl BridgePolicyFile {
    /// Parses YAML (which also accepts JSON documents).
    pub fn from_yaml(raw: &str) -> Result<Self, BridgeError> {
        serde_yaml::from_str(raw)
            .map_err(|err| BridgeError::Internal(format!("invalid bridge policy: {err}")))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, BridgeError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| {
            BridgeError::Internal(format!("failed to read {}: {err}", path.display()))
        })?;
        Self::from_yaml(&raw)
    }

    pub fn entry(&self, id: &str) -> Option<&BridgePolicyEntry> {
        self.extensions.iter().find(|entry| entry.id == id)
    }
}
