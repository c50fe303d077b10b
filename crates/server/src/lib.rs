//! # Server - HTTP front end of the speed-camera store
//!
//! ```text
//! PUT|POST /receive          ingest one reading, echo it back
//! GET      /query?date=...   [min, max] of the date, or readings above
//!          [&speed_kmph=..]  speed_kmph (newest first); gated by the
//!                            configured access window
//! GET      /-/healthy        liveness check
//! ```

pub mod cli;
pub mod error;
pub mod handlers;
pub mod logging;

use axum::routing::{get, put};
use axum::Router;
use tokio::signal;

pub use error::ApiError;
pub use handlers::{AppState, Clock};
pub use logging::{init_logging, Verbosity};

/// Builds the router over `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/receive",
            put(handlers::handle_receive).post(handlers::handle_receive),
        )
        .route("/query", get(handlers::handle_query))
        .route("/-/healthy", get(handlers::handle_healthy))
        .with_state(state)
}

/// Resolves on SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received SIGINT, starting graceful shutdown"),
        _ = terminate => tracing::info!("received SIGTERM, starting graceful shutdown"),
    }
}
