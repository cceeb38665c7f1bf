//! Test utilities: configuration, stand-ins for the external systems, and test servers.

use crate::config::{Config, StorageBackend, StorageConfig};
use crate::db::{DatabaseClock, DbError, errors};
use crate::pages::Pages;
use crate::storage::{self, ObjectStore, ScratchDir, StorageError};
use crate::{AppState, Application};
use async_trait::async_trait;
use axum_test::TestServer;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

pub fn create_test_config(scratch_dir: &Path) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        storage: StorageConfig {
            backend: StorageBackend::Memory,
            scratch_dir: scratch_dir.to_path_buf(),
            ..Default::default()
        },
        enable_metrics: false,
        enable_otel_export: false,
        ..Default::default()
    }
}

/// Database clock that always reports the same instant.
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    pub fn epoch() -> Self {
        Self(DateTime::<Utc>::UNIX_EPOCH)
    }
}

#[async_trait]
impl DatabaseClock for FixedClock {
    async fn now(&self) -> errors::Result<DateTime<Utc>> {
        Ok(self.0)
    }
}

/// Database clock whose database can never be reached.
pub struct UnreachableClock;

#[async_trait]
impl DatabaseClock for UnreachableClock {
    async fn now(&self) -> errors::Result<DateTime<Utc>> {
        Err(DbError::Connect(sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        ))))
    }
}

/// Object store where every call fails.
pub struct FailingStore;

#[async_trait]
impl ObjectStore for FailingStore {
    async fn list_keys(&self) -> storage::Result<Vec<String>> {
        Err(unavailable())
    }

    async fn put_object(&self, _key: &str, _data: Bytes) -> storage::Result<()> {
        Err(unavailable())
    }

    async fn get_object(&self, _key: &str) -> storage::Result<Bytes> {
        Err(unavailable())
    }
}

fn unavailable() -> StorageError {
    StorageError::Backend(anyhow::anyhow!("storage is unavailable"))
}

pub fn create_test_state(storage: Arc<dyn ObjectStore>, clock: Arc<dyn DatabaseClock>, scratch_dir: &Path) -> AppState {
    AppState::builder()
        .config(create_test_config(scratch_dir))
        .storage(storage)
        .clock(clock)
        .scratch(ScratchDir::new(scratch_dir))
        .pages(Arc::new(Pages::new().expect("Failed to build page templates")))
        .build()
}

/// Test server over the given collaborators. The returned directory holds the scratch files and
/// must outlive the server.
pub fn create_test_server_with(storage: Arc<dyn ObjectStore>, clock: Arc<dyn DatabaseClock>) -> (TestServer, TempDir) {
    let scratch = tempfile::tempdir().expect("Failed to create scratch directory");
    let state = create_test_state(storage, clock, scratch.path());

    (Application::from_state(state).into_test_server(), scratch)
}
