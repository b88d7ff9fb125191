//! Commit build status DTOs

use serde::{Deserialize, Serialize};

use crate::domain::status::{BuildOutcome, BuildState};

/// Build status posted against a commit on the source-control server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStatus {
    pub state: BuildState,

    /// Identifies the build across updates; one status line per key
    pub key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl BuildStatus {
    /// Builds the status for one integration of a bot
    pub fn for_integration(
        bot: &str,
        integration: &str,
        outcome: BuildOutcome,
        url: impl Into<String>,
    ) -> Self {
        Self {
            state: outcome.state,
            key: bot.to_string(),
            name: Some(format!("{}:{}", bot, integration)),
            url: url.into(),
            description: outcome.description,
        }
    }
}
