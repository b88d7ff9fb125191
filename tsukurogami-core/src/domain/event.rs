//! Pull-request event vocabulary
//!
//! Maps the status strings the source-control server reports for a pull
//! request onto the actions taken on its bots.

use std::str::FromStr;

use thiserror::Error;

/// Status value that does not correspond to any bot action
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown status: {0}")]
pub struct UnrecognizedEvent(pub String);

/// What a pull-request status change means for its bots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullRequestAction {
    /// Provision instance bots and run a first integration
    Open,
    /// Tear the instance bots down
    Close,
    /// Re-run the existing instance bots
    Rescope,
}

impl PullRequestAction {
    /// Parses a status string, case-insensitively
    pub fn parse(status: &str) -> Result<Self, UnrecognizedEvent> {
        match status.to_lowercase().as_str() {
            "opened" | "reopened" => Ok(PullRequestAction::Open),
            "closed" | "declined" => Ok(PullRequestAction::Close),
            "rescoped_from" => Ok(PullRequestAction::Rescope),
            _ => Err(UnrecognizedEvent(status.to_string())),
        }
    }
}

impl FromStr for PullRequestAction {
    type Err = UnrecognizedEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for PullRequestAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PullRequestAction::Open => write!(f, "open"),
            PullRequestAction::Close => write!(f, "close"),
            PullRequestAction::Rescope => write!(f, "rescope"),
        }
    }
}
