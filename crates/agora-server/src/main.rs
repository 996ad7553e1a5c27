//! # agora-server
//!
//! HTTP backend for the Agora community forum.
//!
//! This binary provides:
//! - **REST API** (axum) for posts, categories, comments, and user
//!   administration
//! - **Moderation lifecycle** for posts, with visibility rules enforced
//!   per caller
//! - **Login-failure lockout** state shared across request workers
//!   (credential checks themselves happen upstream)
//!
//! Identity is taken from the `x-user-id` header installed by the
//! authenticating reverse proxy in front of this process.

mod api;
mod config;
mod error;
mod identity;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use agora_core::PostStatus;
use agora_service::categories::CategoryService;
use agora_service::comments::CommentService;
use agora_service::posts::PostService;
use agora_service::users::UserService;
use agora_service::LoginLimiter;
use agora_store::Database;

use crate::api::AppState;
use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,agora_server=debug")),
        )
        .init();

    info!("Starting Agora server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------

    // Store (runs migrations on open).
    let database = match &config.db_path {
        Some(path) => Database::open_at(path)?,
        None => Database::new()?,
    };
    let db = agora_service::shared(database);

    // New posts enter the moderation queue unless the knob says otherwise.
    let initial_status = if config.moderation_required {
        PostStatus::PendingReview
    } else {
        PostStatus::Published
    };
    info!(initial_status = %initial_status, "post creation policy");

    let app_state = AppState {
        db: db.clone(),
        posts: PostService::new(db.clone(), initial_status),
        categories: CategoryService::new(db.clone()),
        comments: CommentService::new(db.clone()),
        users: UserService::new(db.clone()),
        config: Arc::new(config.clone()),
    };

    // Login lockout counters, consumed by the upstream auth callback.
    let login_limiter = LoginLimiter::default();

    // -----------------------------------------------------------------------
    // 4. Spawn background tasks
    // -----------------------------------------------------------------------

    // Periodic lockout cleanup (every 5 minutes; expiry itself is checked
    // on read, this only bounds the map).
    let limiter = login_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            limiter.purge_expired().await;
        }
    });

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    // tokio::select! ensures that if either the HTTP server or a shutdown
    // signal arrives, we exit cleanly.
    tokio::select! {
        result = api::serve(app_state, config.http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
