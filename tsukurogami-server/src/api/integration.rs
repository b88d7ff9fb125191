//! Integration status handler
//!
//! Called by the status-poke scripts running inside CI builds.

use axum::{
    extract::{Query, State},
    http::StatusCode,
};

use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};
use crate::service::relay::{IntegrationQuery, IntegrationUpdate};

/// GET /integrationUpdated?commit=&status=&bot=&integration=
///
/// Any failure, including a missing parameter, is a 500 so the script's log
/// on the CI server shows it. Repeated keys keep their first value.
pub async fn integration_updated(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> ApiResult<StatusCode> {
    let update = IntegrationUpdate::try_from(IntegrationQuery::from_pairs(pairs))
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    tracing::debug!(
        "Integration {} of {} reported {} for commit {}",
        update.integration,
        update.bot,
        update.status,
        update.commit
    );

    state
        .relay
        .relay(&update)
        .await
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(StatusCode::OK)
}
