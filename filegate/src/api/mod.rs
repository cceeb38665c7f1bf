//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers for all endpoints
//! - **[`models`]**: Request/response data structures
//!
//! # API Structure
//!
//! - **Liveness** (`/up`): fixed response, never touches external systems
//! - **Files** (`/upload`, `/file/{name}`): listing page, multipart upload and download
//! - **Database** (`/db`): connectivity check reporting the database clock
//!
//! The JSON endpoints are documented with `utoipa`; the rendered documentation is served at
//! `/docs`.

pub mod handlers;
pub mod models;
