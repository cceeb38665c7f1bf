use crate::db::DbError;
use crate::storage::StorageError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;
use utoipa::ToSchema;

/// External system a request depended on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    Storage,
    Database,
}

impl std::fmt::Display for Upstream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Upstream::Storage => write!(f, "object storage"),
            Upstream::Database => write!(f, "database"),
        }
    }
}

#[derive(ThisError, Debug)]
pub enum Error {
    /// Invalid request data
    #[error("{message}")]
    BadRequest { message: String },

    /// Requested resource not found
    #[error("{resource} {id} not found")]
    NotFound { resource: String, id: String },

    /// Storage or database call failed
    #[error("{upstream} request failed: {message}")]
    UpstreamUnavailable { upstream: Upstream, message: String },

    /// Any failure while fetching a file for download
    #[error("Failed to download file: {message}")]
    Download { name: String, message: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// JSON body of every error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::UpstreamUnavailable { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Download { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message returned to the client. Upstream failures pass the upstream reason through, as
    /// the gateway has no other way of telling callers what went wrong.
    pub fn user_message(&self) -> String {
        match self {
            Error::BadRequest { message } => message.clone(),
            Error::NotFound { resource, id } => format!("{resource} {id} not found"),
            Error::UpstreamUnavailable { message, .. } => message.clone(),
            Error::Download { message, .. } => format!("Failed to download file: {message}"),
            Error::Internal { .. } | Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        Error::UpstreamUnavailable {
            upstream: Upstream::Storage,
            message: format!("{err:#}"),
        }
    }
}

impl From<DbError> for Error {
    fn from(err: DbError) -> Self {
        Error::UpstreamUnavailable {
            upstream: Upstream::Database,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self {
            Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::UpstreamUnavailable { .. } => {
                tracing::error!("Upstream error: {}", self);
            }
            Error::Download { name, .. } => {
                tracing::warn!(name = %name, "Download error: {}", self);
            }
            Error::BadRequest { .. } | Error::NotFound { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let body = ErrorResponse { error: self.user_message() };
        (self.status_code(), Json(body)).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
