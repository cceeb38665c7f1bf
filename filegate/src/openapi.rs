//! OpenAPI documentation for the gateway, served at `/docs`.

use utoipa::OpenApi;

use crate::api::handlers;
use crate::api::models::{db::DbTimeResponse, files::UploadResponse};
use crate::errors::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "filegate",
        description = "Upload, list and download files kept in object storage, and check database connectivity."
    ),
    paths(
        handlers::health::up,
        handlers::files::list_files,
        handlers::files::upload_file,
        handlers::files::download_file,
        handlers::db::db_time,
    ),
    components(schemas(UploadResponse, DbTimeResponse, ErrorResponse)),
    tags(
        (name = "health", description = "Liveness"),
        (name = "files", description = "File storage"),
        (name = "database", description = "Database connectivity"),
    )
)]
pub struct ApiDoc;
