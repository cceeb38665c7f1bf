//! Request/response data structures for the HTTP API.

pub mod db;
pub mod files;
