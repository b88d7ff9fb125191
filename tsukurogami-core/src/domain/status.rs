//! Build status vocabulary
//!
//! Translates the CI server's integration result tokens into the
//! three-valued state the source-control server understands.

use serde::{Deserialize, Serialize};

/// Commit build state as the source-control server names it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BuildState {
    InProgress,
    Successful,
    Failed,
}

impl std::fmt::Display for BuildState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildState::InProgress => write!(f, "INPROGRESS"),
            BuildState::Successful => write!(f, "SUCCESSFUL"),
            BuildState::Failed => write!(f, "FAILED"),
        }
    }
}

/// Result of classifying an integration status token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    pub state: BuildState,

    /// Set for tokens this service does not know, so they reach the commit page verbatim
    pub description: Option<String>,
}

impl BuildOutcome {
    /// Classifies a status token reported by a status-poke script
    pub fn from_token(token: &str) -> Self {
        let state = match token.to_lowercase().as_str() {
            "inprogress" => BuildState::InProgress,
            "succeeded" | "warnings" => BuildState::Successful,
            "trigger-error" | "internal-build-error" | "build-errors" | "test-failures" => {
                BuildState::Failed
            }
            _ => {
                return Self {
                    state: BuildState::Failed,
                    description: Some(format!("xcode returned: {}", token)),
                };
            }
        };

        Self {
            state,
            description: None,
        }
    }
}
