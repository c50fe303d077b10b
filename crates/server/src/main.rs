//! `speedcam` - speed-camera reading store.
//!
//! Loads the configuration file, applies command-line and environment
//! overrides, recovers the engine and serves HTTP until SIGINT/SIGTERM. The
//! date index is saved once the server has drained.

use anyhow::{Context, Result};
use clap::Parser;
use config::Config;
use engine::Engine;
use server::cli::Args;
use server::{init_logging, router, shutdown_signal, AppState};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbosity());

    let mut cfg = Config::load(&args.config)
        .with_context(|| format!("failed to load config {}", args.config.display()))?;
    args.apply(&mut cfg);

    let mut engine = Engine::open(&cfg.data_dir)?;
    engine.set_snapshot_every(cfg.snapshot_every);

    let state = AppState::new(engine, cfg.access);
    let engine = state.engine.clone();

    let listener = TcpListener::bind(cfg.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", cfg.listen_addr))?;
    tracing::info!(
        addr = %cfg.listen_addr,
        data_dir = %cfg.data_dir.display(),
        access = %cfg.access,
        snapshot_every = cfg.snapshot_every,
        "speedcam listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    tracing::info!("saving date index before shutdown");
    let saved = tokio::task::spawn_blocking(move || {
        let mut guard = engine
            .write()
            .map_err(|_| anyhow::anyhow!("engine lock poisoned"))?;
        guard.save_snapshot()?;
        Ok::<_, anyhow::Error>(())
    })
    .await
    .context("snapshot task failed")?;

    if let Err(e) = saved {
        tracing::error!(error = %format!("{e:#}"), "failed to save date index on shutdown");
    }

    tracing::info!("server shut down gracefully");
    Ok(())
}
