//! Bot registry DTOs

use serde::{Deserialize, Serialize};

use crate::domain::bot::Bot;

/// Response of the bot collection listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotList {
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub results: Vec<Bot>,
}

/// Request to start an integration run on a bot
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationRequest {
    /// Whether the server wipes the workspace before building
    pub should_clean: bool,
}

impl IntegrationRequest {
    /// Reuses the existing checkout; cloning from scratch is far slower
    pub fn incremental() -> Self {
        Self {
            should_clean: false,
        }
    }
}
