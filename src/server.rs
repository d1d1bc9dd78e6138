//!
//! vertocraft HTTP server
//! -----------------------
//! This module defines the Axum-based HTTP API for the agency site backend.
//!
//! Responsibilities:
//! - Admin login (`/api/auth/login`) issuing the Basic token used by admin routes.
//! - Public contact form submission and portfolio reads.
//! - Admin-only contact listing and portfolio create (multipart) / delete.
//! - Serving uploaded images under `/uploads`.
//! - Access logging for every `/api` request.
//!
//! The store, credential validator and uploads directory are built once at startup
//! and injected through `AppState`; handlers hold no other state.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use axum::extract::{DefaultBodyLimit, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::security::CredentialValidator;
use crate::storage::{open_store, SharedStore};
use crate::uploads::UploadDir;

pub mod assets;
pub mod auth;
pub mod contacts;
pub mod portfolio;

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub validator: Arc<CredentialValidator>,
    pub uploads: UploadDir,
}

impl AppState {
    pub fn new(store: SharedStore, validator: CredentialValidator, uploads: UploadDir) -> Self {
        Self { store, validator: Arc::new(validator), uploads }
    }

    /// Build every collaborator from configuration: storage backend, admin
    /// credentials and uploads directory.
    pub async fn from_config(config: &ServerConfig) -> anyhow::Result<Self> {
        let store = open_store(config.database_url.as_deref())
            .await
            .context("While opening the resource store")?;
        let validator = config.admin.validator().context("While preparing admin credentials")?;
        let uploads = UploadDir::open(&config.uploads_dir)
            .await
            .with_context(|| format!("Failed to create or access uploads dir: {}", config.uploads_dir.display()))?;
        Ok(Self::new(store, validator, uploads))
    }
}

/// All routes, with body limit and access logging applied.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(|| async { "vertocraft ok" }))
        .route("/api/auth/login", post(auth::login))
        .route("/api/contact", post(contacts::submit_contact))
        .route("/api/contacts", get(contacts::list_contacts))
        .route(
            "/api/portfolio",
            get(portfolio::list_portfolio_items).post(portfolio::create_portfolio_item),
        )
        .route(
            "/api/portfolio/{id}",
            get(portfolio::get_portfolio_item).delete(portfolio::delete_portfolio_item),
        )
        .route("/uploads/{file}", get(assets::serve_upload))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(middleware::from_fn(log_api_requests))
        .with_state(state)
}

async fn log_api_requests(req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    if !path.starts_with("/api") {
        return next.run(req).await;
    }
    let method = req.method().clone();
    let start = Instant::now();
    let resp = next.run(req).await;
    info!(
        target: "vertocraft::api",
        "{} {} {} in {}ms",
        method,
        path,
        resp.status().as_u16(),
        start.elapsed().as_millis()
    );
    resp
}

/// A server whose listener is bound but not yet accepting.
pub struct BoundServer {
    listener: tokio::net::TcpListener,
    app: Router,
    addr: SocketAddr,
}

impl BoundServer {
    pub fn local_addr(&self) -> SocketAddr { self.addr }

    pub async fn serve(self) -> anyhow::Result<()> {
        info!("Serving on {}", self.addr);
        axum::serve(self.listener, self.app).await?;
        Ok(())
    }
}

/// Build state from `config` and bind the listener. Port 0 picks a free port.
pub async fn bind(config: &ServerConfig) -> anyhow::Result<BoundServer> {
    let state = AppState::from_config(config).await?;
    info!(
        target: "startup",
        "store backend={}, uploads_dir={:?}, max_upload_bytes={}",
        state.store.backend_name(),
        config.uploads_dir,
        config.max_upload_bytes
    );
    if config.admin.is_dev_default {
        warn!(target: "startup", "No admin credentials configured; using development defaults. Do not run like this in production.");
    }
    let app = router(state, config.max_upload_bytes);
    let addr: SocketAddr = format!("{}:{}", config.bind, config.http_port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.bind, config.http_port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    let addr = listener.local_addr()?;
    Ok(BoundServer { listener, app, addr })
}

/// Start the HTTP server and run until it fails.
pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    bind(&config).await?.serve().await
}
