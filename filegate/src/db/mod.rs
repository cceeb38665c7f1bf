//! Database connectivity check.
//!
//! The gateway keeps no data in PostgreSQL; it only asks the server for its clock. Each call opens
//! a dedicated connection, runs a single query and closes the connection again, so a broken
//! database never leaves anything behind in the process.

pub mod errors;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Connection, PgConnection, postgres::PgConnectOptions};
use tracing::{instrument, warn};

use crate::config::{DATABASE_NAME, DATABASE_USER, DatabaseConfig};
pub use errors::DbError;

/// Source of the database server's current time.
#[async_trait]
pub trait DatabaseClock: Send + Sync {
    async fn now(&self) -> errors::Result<DateTime<Utc>>;
}

/// [`DatabaseClock`] backed by a short-lived PostgreSQL connection per call.
#[derive(Debug, Clone)]
pub struct PostgresClock {
    config: DatabaseConfig,
}

impl PostgresClock {
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }

    fn connect_options(&self) -> PgConnectOptions {
        let options = PgConnectOptions::new()
            .host(&self.config.host)
            .port(self.config.port)
            .username(DATABASE_USER)
            .database(DATABASE_NAME);

        match &self.config.password {
            Some(password) => options.password(password),
            None => options,
        }
    }
}

#[async_trait]
impl DatabaseClock for PostgresClock {
    #[instrument(skip(self), fields(host = %self.config.host, port = self.config.port), err)]
    async fn now(&self) -> errors::Result<DateTime<Utc>> {
        let mut conn = PgConnection::connect_with(&self.connect_options()).await.map_err(DbError::Connect)?;

        let result = sqlx::query_scalar::<_, DateTime<Utc>>("SELECT NOW()").fetch_one(&mut conn).await;

        if let Err(e) = conn.close().await {
            warn!("Failed to close database connection cleanly: {}", e);
        }

        result.map_err(DbError::Query)
    }
}
