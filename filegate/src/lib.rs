//! # filegate: HTTP gateway for files kept in object storage
//!
//! `filegate` is a small web service that lets users upload files into an S3 bucket, browse what
//! is stored there and download files again, plus a connectivity check against PostgreSQL.
//!
//! ## Endpoints
//!
//! | Method | Path           | Purpose                                   |
//! |--------|----------------|-------------------------------------------|
//! | GET    | `/up`          | liveness, always `200 App is running`     |
//! | GET    | `/upload`      | HTML page listing every stored file       |
//! | POST   | `/upload`      | multipart upload of the `file` part       |
//! | GET    | `/file/{name}` | download a stored file as an attachment   |
//! | GET    | `/db`          | current time reported by the database     |
//! | GET    | `/docs`        | OpenAPI documentation                     |
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum). Every external system
//! sits behind a trait so handlers never reach for globals:
//!
//! - [`storage::ObjectStore`]: the bucket (S3 in production, [`storage::MemoryStore`] for local
//!   runs and tests)
//! - [`db::DatabaseClock`]: the database, queried over a fresh connection per request
//!
//! Both are constructed once in [`Application::new`] and handed to handlers through [`AppState`].
//! Uploaded files are stored under their original filename; there is no metadata of our own.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use filegate::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = filegate::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     filegate::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     }).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod pages;
pub mod storage;
pub mod telemetry;

#[cfg(test)]
mod test;
#[cfg(test)]
pub mod test_utils;

use axum::{Router, extract::DefaultBodyLimit, routing::get};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
pub use config::Config;
use db::{DatabaseClock, PostgresClock};
use openapi::ApiDoc;
use pages::Pages;
use std::sync::Arc;
use storage::{ObjectStore, ScratchDir};
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

/// Application state shared across all request handlers.
///
/// - `config`: configuration the application was started with
/// - `storage`: object store holding the uploaded files
/// - `clock`: database connectivity check
/// - `scratch`: local directory downloads are written to
/// - `pages`: compiled HTML templates
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .config(config)
///     .storage(Arc::new(MemoryStore::new()))
///     .clock(Arc::new(PostgresClock::new(database_config)))
///     .scratch(ScratchDir::new("/tmp"))
///     .pages(Arc::new(Pages::new()?))
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub storage: Arc<dyn ObjectStore>,
    pub clock: Arc<dyn DatabaseClock>,
    pub scratch: ScratchDir,
    pub pages: Arc<Pages>,
}

/// Build the application router with all endpoints and middleware.
///
/// Besides the API routes this adds the OpenAPI docs at `/docs`, Prometheus metrics at
/// `/internal/metrics` when `enable_metrics` is set, a JSON 404 for unknown routes and request
/// tracing. The default request body limit is disabled so uploads of any size are accepted.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> Router {
    use api::handlers;

    let mut router = Router::new()
        .route("/up", get(handlers::health::up))
        .route("/upload", get(handlers::files::list_files).post(handlers::files::upload_file))
        .route("/file/{name}", get(handlers::files::download_file))
        .route("/db", get(handlers::db::db_time))
        .fallback(handlers::not_found)
        .with_state(state.clone())
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::disable());

    if state.config.enable_metrics {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
        router = router
            .route("/internal/metrics", get(|| async move { metric_handle.render() }))
            .layer(prometheus_layer);
    }

    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
}

/// Main application.
///
/// 1. **Create**: [`Application::new`] builds the storage backend and database clock from
///    configuration and assembles the router
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and handles requests until the
///    shutdown future resolves
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Create a new application instance from configuration
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting filegate with configuration: {:#?}", config);

        let storage = storage::from_config(&config.storage).await?;
        let clock: Arc<dyn DatabaseClock> = Arc::new(PostgresClock::new(config.database.clone()));
        let scratch = ScratchDir::new(config.storage.scratch_dir.clone());
        info!("Downloads are staged in {}", scratch.root().display());

        let state = AppState::builder()
            .config(config)
            .storage(storage)
            .clock(clock)
            .scratch(scratch)
            .pages(Arc::new(Pages::new()?))
            .build();

        Ok(Self::from_state(state))
    }

    /// Create an application around already constructed collaborators
    pub fn from_state(state: AppState) -> Self {
        let router = build_router(&state);
        Self {
            router,
            config: state.config,
        }
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "filegate listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
