//! Argus daemon entry point: wires the broadcaster, the metrics exporters,
//! and the HTTP/WebSocket surface into one process and runs them until a
//! shutdown signal arrives (`spec.md` §5/§6).
//!
//! Ingestion is deliberately not wired here: `spec.md` §1 puts the host
//! event source itself out of scope, so `argus-ingest::IngestionEngine`
//! needs a concrete `HostEventSource` this crate does not provide. An
//! embedder that has one constructs an `IngestionEngine` against the same
//! `BroadcastState` this binary builds and owns its lifecycle the same way
//! `System` owns the broadcaster and HTTP server below.

use std::sync::Arc;

use argus_broadcast::{BroadcastState, Broadcaster};
use argus_config::{limits, Config};
use tokio_util::sync::CancellationToken;

/// Owns every long-lived worker for one Argus process and mediates their
/// shutdown through a shared `CancellationToken`, following the teacher's
/// controller pattern of a single owner joining worker handles in reverse
/// startup order (`SPEC_FULL.md` §5).
struct System {
    broadcaster: Broadcaster,
    http_cancel: CancellationToken,
    otlp_cancel: CancellationToken,
    http_task: tokio::task::JoinHandle<Result<(), argus_server::Error>>,
    otlp_task: Option<tokio::task::JoinHandle<()>>,
}

impl System {
    async fn start(config: &Config, state: Arc<BroadcastState>) -> anyhow::Result<Self> {
        let broadcaster = Broadcaster::start(
            Arc::clone(&state),
            limits::EVENT_TICK_INTERVAL,
            limits::STATE_TICK_INTERVAL,
            limits::THREAD_STATE_VISIBILITY_WINDOW,
        )?;

        let otlp_cancel = CancellationToken::new();
        let otlp_task = config.metrics.otlp.enabled.then(|| {
            tokio::spawn(argus_metrics::run_otlp_exporter(
                Arc::clone(&state),
                config.metrics.otlp.clone(),
                limits::EXPORT_HTTP_TIMEOUT,
                otlp_cancel.clone(),
            ))
        });

        let http_cancel = CancellationToken::new();
        let http_task = tokio::spawn(argus_server::run(
            config.server.port,
            Arc::clone(&state),
            config.families.clone(),
            static_dir(),
            http_cancel.clone(),
        ));

        Ok(System {
            broadcaster,
            http_cancel,
            otlp_cancel,
            http_task,
            otlp_task,
        })
    }

    /// Cancels and joins every worker, HTTP server first (outermost),
    /// broadcaster last (innermost) — the reverse of startup order.
    async fn stop(mut self) {
        self.http_cancel.cancel();
        match self.http_task.await {
            Ok(Ok(())) => {}
            Ok(Err(error)) => tracing::warn!(%error, "HTTP server exited with an error"),
            Err(error) => tracing::warn!(%error, "HTTP server task panicked"),
        }

        self.otlp_cancel.cancel();
        if let Some(task) = self.otlp_task.take() {
            if let Err(error) = task.await {
                tracing::warn!(%error, "OTLP exporter task panicked");
            }
        }

        self.broadcaster.stop(limits::SHUTDOWN_JOIN_TIMEOUT);
    }
}

fn static_dir() -> std::path::PathBuf {
    std::env::var("ARGUS_STATIC_DIR")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| std::path::PathBuf::from("demos/static"))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env();
    tracing::info!(port = config.server.port, buffer_size = config.buffer_size, "starting argus");

    let state = Arc::new(BroadcastState::new(&config));

    let system = match System::start(&config, Arc::clone(&state)).await {
        Ok(system) => system,
        Err(error) => {
            tracing::error!(%error, "argus failed to start");
            return Err(error);
        }
    };

    shutdown_signal().await;
    tracing::info!("shutdown signal received, stopping argus");
    system.stop().await;

    Ok(())
}
