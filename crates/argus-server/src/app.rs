//! Wires every route module into one `axum::Router` and serves it, following
//! the teacher's `otap-df-admin::run` composition
//! (`Router::new().merge(...).with_state(AppState)`, bind, `axum::serve`
//! with graceful shutdown on a `CancellationToken`).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use argus_broadcast::BroadcastState;
use argus_config::FamiliesConfig;
use axum::Router;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::error::Error;
use crate::{analyzers, assets, events, export, health, metrics, threads};

/// Shared state every route handler reads from. Cheap to clone: everything
/// behind an `Arc` or a small value type.
#[derive(Clone)]
pub struct AppState {
    pub broadcast: Arc<BroadcastState>,
    pub families: FamiliesConfig,
}

/// Builds the full route table over `state`. Exposed (beyond `run`) so
/// integration tests can drive it directly with `tower::ServiceExt::oneshot`
/// instead of binding a real socket.
#[must_use]
pub fn router(state: AppState, static_dir: PathBuf) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(threads::routes())
        .merge(analyzers::routes())
        .merge(metrics::routes())
        .merge(events::routes())
        .merge(export::routes())
        .merge(assets::routes(static_dir))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Binds `port` and serves the full route table until `cancel` fires.
pub async fn run(
    port: u16,
    broadcast: Arc<BroadcastState>,
    families: FamiliesConfig,
    static_dir: PathBuf,
    cancel: CancellationToken,
) -> Result<(), Error> {
    let state = AppState { broadcast, families };
    let app = router(state, static_dir);

    let bind_addr = format!("0.0.0.0:{port}");
    let addr: SocketAddr = bind_addr
        .parse()
        .map_err(|e| Error::InvalidBindAddress { addr: bind_addr.clone(), details: format!("{e}") })?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::BindFailed { addr: addr.to_string(), details: format!("{e}") })?;

    tracing::info!(endpoint = %addr, "argus HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancel.cancelled().await;
        })
        .await
        .map_err(|e| Error::ServerError { addr: addr.to_string(), details: format!("{e}") })
}
