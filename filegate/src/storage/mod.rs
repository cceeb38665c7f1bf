//! Object storage access.
//!
//! Handlers talk to storage only through the [`ObjectStore`] trait so the S3 backend can be
//! swapped for the in-process [`MemoryStore`] in development and tests. Keys are used exactly as
//! given: the key of an uploaded object is its original filename.
//!
//! - [`s3`]: AWS S3 (or any S3-compatible service) via `aws-sdk-s3`
//! - [`memory`]: process-local store backed by a `DashMap`
//! - [`scratch`]: local directory that downloads are written to before being served

pub mod memory;
pub mod s3;
pub mod scratch;

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

pub use memory::MemoryStore;
pub use s3::S3Store;
pub use scratch::{ScratchDir, StagedFile};

use crate::config::{StorageBackend, StorageConfig};

/// Errors surfaced by an [`ObjectStore`] implementation.
#[derive(Error, Debug)]
pub enum StorageError {
    /// No object exists under the requested key
    #[error("object '{key}' does not exist")]
    NotFound { key: String },

    /// Anything else the backend reported (network, credentials, throttling, ...)
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Minimal key/value blob interface over a single bucket.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Every key currently stored in the bucket.
    async fn list_keys(&self) -> Result<Vec<String>>;

    /// Store `data` under `key`, replacing any existing object.
    async fn put_object(&self, key: &str, data: Bytes) -> Result<()>;

    /// Fetch the full contents of the object stored under `key`.
    async fn get_object(&self, key: &str) -> Result<Bytes>;
}

/// Build the storage backend selected in configuration.
pub async fn from_config(config: &StorageConfig) -> anyhow::Result<Arc<dyn ObjectStore>> {
    match config.backend {
        StorageBackend::S3 => {
            info!(bucket = %config.bucket, region = %config.region, "Using S3 object storage");
            Ok(Arc::new(S3Store::from_config(config).await))
        }
        StorageBackend::Memory => {
            info!("Using in-memory object storage: uploaded files are lost on shutdown");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
