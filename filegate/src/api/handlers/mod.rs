//! HTTP request handlers for all endpoints.
//!
//! Each handler pulls its collaborators (object store, database clock, scratch directory,
//! templates) out of [`crate::AppState`] and does a single round trip to one of them.
//!
//! # Handler Modules
//!
//! - [`health`]: liveness endpoint
//! - [`files`]: file listing page, upload and download
//! - [`db`]: database connectivity check
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`], which converts to the matching status code and a
//! JSON `{"error": ...}` body.

pub mod db;
pub mod files;
pub mod health;

use crate::errors::Error;
use axum::http::Uri;

/// Fallback for unmatched routes
pub async fn not_found(uri: Uri) -> Error {
    Error::NotFound {
        resource: "Route".to_string(),
        id: uri.path().to_string(),
    }
}
