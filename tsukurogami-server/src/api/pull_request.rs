//! Pull-request webhook handler
//!
//! Receives pull-request status changes from the source-control server and
//! drives the reconciler accordingly.

use axum::{
    extract::{Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tsukurogami_core::domain::event::PullRequestAction;

use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};
use crate::service::reconciler::ReconcileError;

#[derive(Debug, Default, Deserialize)]
pub struct PullRequestQuery {
    pub repo: Option<String>,
    pub branch: Option<String>,
    pub status: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// GET /pullRequestUpdated?repo=&branch=&status=
///
/// Answers 201 once the event has been handled, including statuses that
/// need no action; 400 when a parameter is missing; 500 when a bot
/// operation failed.
pub async fn pull_request_updated(
    State(state): State<AppState>,
    Query(query): Query<PullRequestQuery>,
) -> ApiResult<StatusCode> {
    let (repo, branch, status) = match (
        present(&query.repo),
        present(&query.branch),
        present(&query.status),
    ) {
        (Some(repo), Some(branch), Some(status)) => (repo, branch, status),
        _ => {
            let missing: Vec<&str> = [
                ("repo", &query.repo),
                ("branch", &query.branch),
                ("status", &query.status),
            ]
            .into_iter()
            .filter(|(_, value)| present(value).is_none())
            .map(|(name, _)| name)
            .collect();

            return Err(ApiError::BadRequest(format!(
                "missing parameter(s): {}",
                missing.join(", ")
            )));
        }
    };

    let action = match PullRequestAction::parse(status) {
        Ok(action) => action,
        Err(unrecognized) => {
            tracing::warn!("{} {}: {}, ignoring", repo, branch, unrecognized);
            return Ok(StatusCode::CREATED);
        }
    };

    tracing::info!("Pull request {} {} {}", repo, branch, status);

    apply(&state, action, repo, branch)
        .await
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(StatusCode::CREATED)
}

async fn apply(
    state: &AppState,
    action: PullRequestAction,
    repo: &str,
    branch: &str,
) -> Result<(), ReconcileError> {
    let reconciler = &state.reconciler;

    match action {
        PullRequestAction::Open => {
            tracing::info!("Creating bots for {} {}", repo, branch);
            reconciler.create_bots(repo, branch).await?;
            tracing::info!("Integrating bots for {} {}", repo, branch);
            reconciler.integrate_bots(repo, branch).await?;
        }
        PullRequestAction::Close => {
            tracing::info!("Deleting bots for {} {}", repo, branch);
            reconciler.delete_bots(repo, branch).await?;
        }
        PullRequestAction::Rescope => {
            tracing::info!("Integrating bots for {} {}", repo, branch);
            reconciler.integrate_bots(repo, branch).await?;
        }
    }

    tracing::info!("Finished {} for {} {}", action, repo, branch);
    Ok(())
}
