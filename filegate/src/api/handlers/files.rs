use crate::AppState;
use crate::api::models::files::UploadResponse;
use crate::errors::{Error, ErrorResponse, Result};
use crate::pages::encode_path_segment;
use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, State, multipart::MultipartRejection},
    http::{HeaderValue, header},
    response::{Html, Response},
};
use bytes::Bytes;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, instrument, warn};

#[utoipa::path(
    get,
    path = "/upload",
    tag = "files",
    summary = "List files",
    description = "HTML page with an upload form and a download link for every file in the bucket. \
        If the bucket cannot be listed the page is rendered without files.",
    responses(
        (status = 200, description = "File listing page", body = String, content_type = "text/html"),
    )
)]
#[instrument(skip_all)]
pub async fn list_files(State(state): State<AppState>) -> Result<Html<String>> {
    let files = match state.storage.list_keys().await {
        Ok(files) => files,
        Err(e) => {
            warn!("Failed to list stored files, rendering empty listing: {:#}", e);
            Vec::new()
        }
    };

    let page = state.pages.file_listing(&files).map_err(|e| Error::Other(e.into()))?;
    Ok(Html(page))
}

#[utoipa::path(
    post,
    path = "/upload",
    tag = "files",
    summary = "Upload file",
    description = "Stores the `file` part of a multipart form under its original filename. \
        An existing file with the same name is overwritten.",
    request_body(
        content_type = "multipart/form-data",
        description = "Form with a single `file` part"
    ),
    responses(
        (status = 200, description = "File stored", body = UploadResponse),
        (status = 400, description = "No file part in the request", body = ErrorResponse),
        (status = 500, description = "Object storage rejected the upload", body = ErrorResponse),
    )
)]
#[instrument(skip_all)]
pub async fn upload_file(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>> {
    // A body that is not multipart at all carries no file either
    let Ok(mut multipart) = multipart else {
        return Err(no_file_provided());
    };

    let mut upload: Option<(String, Bytes)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| Error::BadRequest {
        message: format!("Failed to parse multipart data: {}", e),
    })? {
        if field.name() != Some("file") {
            // Ignore unknown fields
            continue;
        }

        // A part without a filename is a plain form value, not a file
        let Some(filename) = field.file_name().filter(|name| !name.is_empty()).map(str::to_string) else {
            continue;
        };

        let data = field.bytes().await.map_err(|e| Error::BadRequest {
            message: format!("Failed to read file: {}", e),
        })?;

        upload = Some((filename, data));
        break;
    }

    let (filename, data) = upload.ok_or_else(no_file_provided)?;
    let size = data.len();

    state.storage.put_object(&filename, data).await?;

    info!(filename = %filename, size, "File uploaded");
    Ok(Json(UploadResponse::uploaded(filename)))
}

fn no_file_provided() -> Error {
    Error::BadRequest {
        message: "No file provided".to_string(),
    }
}

#[utoipa::path(
    get,
    path = "/file/{name}",
    tag = "files",
    summary = "Download file",
    description = "Fetches the file from object storage and returns it as an attachment.",
    params(
        ("name" = String, Path, description = "Name the file was uploaded under")
    ),
    responses(
        (status = 200, description = "File contents, sent as an attachment"),
        (status = 500, description = "The file does not exist or could not be fetched", body = ErrorResponse),
    )
)]
#[instrument(skip(state))]
pub async fn download_file(State(state): State<AppState>, Path(name): Path<String>) -> Result<Response> {
    let data = state
        .storage
        .get_object(&name)
        .await
        .map_err(|e| download_error(&name, format!("{e:#}")))?;

    let staged = state
        .scratch
        .stage(&name, &data)
        .await
        .map_err(|e| download_error(&name, e.to_string()))?;
    debug!(path = %staged.path.display(), size = data.len(), "Staged download");

    let mime = mime_guess::from_path(&name).first_or_octet_stream();

    Response::builder()
        .header(header::CONTENT_TYPE, mime.as_ref())
        .header(header::CONTENT_LENGTH, data.len())
        .header(header::CONTENT_DISPOSITION, attachment_disposition(&name))
        .body(Body::from_stream(ReaderStream::new(staged.file)))
        .map_err(|e| download_error(&name, e.to_string()))
}

fn download_error(name: &str, message: String) -> Error {
    Error::Download {
        name: name.to_string(),
        message,
    }
}

/// `attachment` disposition with an ASCII `filename` for old clients and an RFC 5987
/// `filename*` carrying the exact name.
fn attachment_disposition(name: &str) -> HeaderValue {
    let fallback: String = name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();

    let value = if fallback == name {
        format!("attachment; filename=\"{fallback}\"")
    } else {
        format!(
            "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
            encode_path_segment(name)
        )
    };

    // Only printable ASCII remains after the substitutions above
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}
