//! Integration Relay
//!
//! Forwards integration progress reported by the status-poke scripts to the
//! source-control server as commit build statuses.

use std::sync::Arc;

use thiserror::Error;
use tsukurogami_client::{ClientError, StatusNotifier};
use tsukurogami_core::domain::status::BuildOutcome;
use tsukurogami_core::dto::status::BuildStatus;

/// Relay error type
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("no \"{0}\" parameter")]
    MissingParameter(&'static str),

    #[error("posting build status for commit {commit}: {source}")]
    Notify { commit: String, source: ClientError },
}

pub type Result<T> = std::result::Result<T, RelayError>;

/// Query string sent by a status-poke script
#[derive(Debug, Default)]
pub struct IntegrationQuery {
    pub commit: Option<String>,
    pub status: Option<String>,
    pub bot: Option<String>,
    pub integration: Option<String>,
}

impl IntegrationQuery {
    /// Builds a query from raw pairs; the first value of a repeated key wins
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "commit" => &mut query.commit,
                "status" => &mut query.status,
                "bot" => &mut query.bot,
                "integration" => &mut query.integration,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }
}

/// A complete integration report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrationUpdate {
    pub commit: String,
    pub status: String,
    pub bot: String,
    pub integration: String,
}

fn required(value: Option<String>, name: &'static str) -> Result<String> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(RelayError::MissingParameter(name))
}

impl TryFrom<IntegrationQuery> for IntegrationUpdate {
    type Error = RelayError;

    fn try_from(query: IntegrationQuery) -> Result<Self> {
        Ok(Self {
            commit: required(query.commit, "commit")?,
            status: required(query.status, "status")?,
            bot: required(query.bot, "bot")?,
            integration: required(query.integration, "integration")?,
        })
    }
}

/// Posts integration results to the source-control server
pub struct IntegrationRelay {
    notifier: Arc<dyn StatusNotifier>,
    /// Link attached to every status
    build_url: String,
}

impl IntegrationRelay {
    pub fn new(notifier: Arc<dyn StatusNotifier>, build_url: impl Into<String>) -> Self {
        Self {
            notifier,
            build_url: build_url.into(),
        }
    }

    /// Translates `update` into a build status and posts it against its commit
    pub async fn relay(&self, update: &IntegrationUpdate) -> Result<BuildStatus> {
        let outcome = BuildOutcome::from_token(&update.status);
        let status = BuildStatus::for_integration(
            &update.bot,
            &update.integration,
            outcome,
            self.build_url.clone(),
        );

        self.notifier
            .post_build_status(&update.commit, &status)
            .await
            .map_err(|source| RelayError::Notify {
                commit: update.commit.clone(),
                source,
            })?;

        tracing::info!(
            "Relayed {} for {} on commit {}",
            status.state,
            update.bot,
            update.commit
        );

        Ok(status)
    }
}
