//! Pairing configuration

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PairingConfig {
    /// Two players who met within this many preceding rounds are not re-paired
    pub rematch_window: u32,
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self { rematch_window: 2 }
    }
}
