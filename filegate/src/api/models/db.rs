use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Result of the database connectivity check
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DbTimeResponse {
    /// Current time according to the database server, e.g. `2025-03-01 12:30:45.123456+00:00`
    pub db_time: String,
}

impl From<DateTime<Utc>> for DbTimeResponse {
    fn from(time: DateTime<Utc>) -> Self {
        Self {
            db_time: time.format("%Y-%m-%d %H:%M:%S%.6f%:z").to_string(),
        }
    }
}
