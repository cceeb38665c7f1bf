//! Database connectivity check.

use crate::AppState;
use crate::api::models::db::DbTimeResponse;
use crate::errors::{ErrorResponse, Result};
use axum::{Json, extract::State};
use tracing::instrument;

#[utoipa::path(
    get,
    path = "/db",
    tag = "database",
    summary = "Database time",
    description = "Opens a fresh connection to the database, reads its current time and closes the connection.",
    responses(
        (status = 200, description = "Database reachable", body = DbTimeResponse),
        (status = 500, description = "Connection or query failed", body = ErrorResponse),
    )
)]
#[instrument(skip_all)]
pub async fn db_time(State(state): State<AppState>) -> Result<Json<DbTimeResponse>> {
    let now = state.clock.now().await?;
    Ok(Json(DbTimeResponse::from(now)))
}
