//! Application configuration management.
//!
//! Configuration is loaded from an optional YAML file with environment variable overrides. The
//! file path defaults to `config.yaml` but can be specified via `-f` flag or the
//! `FILEGATE_CONFIG` environment variable. A missing file is not an error: every field has a
//! default, and a container deployment typically configures everything through the environment.
//!
//! ## Loading Priority
//!
//! Sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Prefixed environment variables** - `FILEGATE_` variables, `__` separating nested keys
//!    (e.g. `FILEGATE_STORAGE__BACKEND=memory`)
//! 3. **Deployment variables** - the plain variables the gateway has always been configured
//!    with: `S3_BUCKET`, `AWS_REGION`, `POSTGRES_HOST` and `POSTGRES_PASSWORD`
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! S3_BUCKET=my-uploads
//! AWS_REGION=eu-west-1
//! POSTGRES_HOST=db.internal
//! POSTGRES_PASSWORD=hunter2
//!
//! # Talk to a local MinIO instead of AWS
//! FILEGATE_STORAGE__ENDPOINT_URL=http://localhost:9000
//! FILEGATE_STORAGE__FORCE_PATH_STYLE=true
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::errors::Error;

/// Database user the gateway connects as. Not configurable.
pub const DATABASE_USER: &str = "flaskuser";
/// Database the gateway connects to. Not configurable.
pub const DATABASE_NAME: &str = "flaskdb";

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "FILEGATE_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Object storage settings
    pub storage: StorageConfig,
    /// Database used by the connectivity check
    pub database: DatabaseConfig,
    /// Expose Prometheus metrics at `/internal/metrics`
    pub enable_metrics: bool,
    /// Enable OpenTelemetry OTLP export for distributed tracing
    pub enable_otel_export: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// AWS S3 or an S3-compatible service
    S3,
    /// Process-local storage, contents are lost on restart
    Memory,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Bucket holding uploaded files (`S3_BUCKET`)
    #[serde(deserialize_with = "lenient_string")]
    pub bucket: String,
    /// AWS region of the bucket (`AWS_REGION`)
    pub region: String,
    /// Custom endpoint for S3-compatible services
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
    /// Use path-style addressing (`http://host/bucket/key`), required by most S3-compatible services
    pub force_path_style: bool,
    /// Directory downloaded files are written to before being served
    pub scratch_dir: PathBuf,
}

#[derive(Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// PostgreSQL host (`POSTGRES_HOST`)
    pub host: String,
    pub port: u16,
    /// PostgreSQL password (`POSTGRES_PASSWORD`)
    #[serde(skip_serializing, deserialize_with = "lenient_optional_string")]
    pub password: Option<String>,
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Scalar that may have been parsed as a number or bool by the environment provider
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    String(String),
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Bool(bool),
}

impl From<Scalar> for String {
    fn from(value: Scalar) -> Self {
        match value {
            Scalar::String(s) => s,
            Scalar::Unsigned(n) => n.to_string(),
            Scalar::Signed(n) => n.to_string(),
            Scalar::Float(n) => n.to_string(),
            Scalar::Bool(b) => b.to_string(),
        }
    }
}

// Env values such as `POSTGRES_PASSWORD=123456` arrive as numbers
fn lenient_string<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Scalar::deserialize(deserializer).map(String::from)
}

fn lenient_optional_string<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(String::from))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            storage: StorageConfig::default(),
            database: DatabaseConfig::default(),
            enable_metrics: false,
            enable_otel_export: false,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::S3,
            bucket: String::new(),
            region: "us-east-1".to_string(),
            endpoint_url: None,
            force_path_style: false,
            scratch_dir: std::env::temp_dir(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            password: None,
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.storage.backend == StorageBackend::S3 && self.storage.bucket.trim().is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: the S3 storage backend requires a bucket. \
                     Set S3_BUCKET or storage.bucket in the config file."
                    .to_string(),
            });
        }

        if self.storage.region.trim().is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: storage.region cannot be empty".to_string(),
            });
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Prefixed environment variables override file values
            .merge(Env::prefixed("FILEGATE_").ignore(&["CONFIG"]).split("__"))
            // Plain deployment variables
            .merge(Env::raw().only(&["S3_BUCKET"]).map(|_| "storage.bucket".into()))
            .merge(Env::raw().only(&["AWS_REGION"]).map(|_| "storage.region".into()))
            .merge(Env::raw().only(&["POSTGRES_HOST"]).map(|_| "database.host".into()))
            .merge(Env::raw().only(&["POSTGRES_PASSWORD"]).map(|_| "database.password".into()))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
