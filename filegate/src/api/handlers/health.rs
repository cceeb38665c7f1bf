//! Liveness endpoint.

/// Fixed response; does not touch storage or the database.
#[utoipa::path(
    get,
    path = "/up",
    tag = "health",
    summary = "Liveness check",
    responses(
        (status = 200, description = "The gateway is running", body = String, content_type = "text/plain"),
    )
)]
pub async fn up() -> &'static str {
    "App is running"
}
