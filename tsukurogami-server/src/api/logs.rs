//! Log API Handler

use axum::extract::State;

use crate::api::AppState;

/// GET /logs
/// Dumps the buffered log lines, oldest first
pub async fn get_logs(State(state): State<AppState>) -> String {
    state.logs.render()
}
