//! One GET endpoint per analyzer, returning its `get_analysis()` output as
//! JSON (`spec.md` §4.7).

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};

use argus_analyzers::Analyzer;

use crate::app::AppState;

pub(crate) fn routes() -> Router<AppState> {
    Router::new()
        .route("/pinning-analysis", get(pinning_analysis))
        .route("/carrier-threads", get(carrier_threads))
        .route("/gc-analysis", get(gc_analysis))
        .route("/cpu-metrics", get(cpu_metrics))
        .route("/allocation-analysis", get(allocation_analysis))
        .route("/metaspace-metrics", get(metaspace_metrics))
        .route("/method-profiling", get(method_profiling))
        .route("/contention-analysis", get(contention_analysis))
        .route("/correlations", get(correlations))
        .route("/flamegraph.json", get(flamegraph_json))
        .route("/flamegraph.collapsed", get(flamegraph_collapsed))
}

async fn pinning_analysis(State(state): State<AppState>) -> Response {
    Json(state.broadcast.analyzers.pinning.get_analysis()).into_response()
}

async fn carrier_threads(State(state): State<AppState>) -> Response {
    Json(state.broadcast.analyzers.carrier.get_analysis()).into_response()
}

async fn gc_analysis(State(state): State<AppState>) -> Response {
    Json(state.broadcast.analyzers.gc.get_analysis()).into_response()
}

async fn cpu_metrics(State(state): State<AppState>) -> Response {
    Json(state.broadcast.analyzers.cpu.get_analysis()).into_response()
}

async fn allocation_analysis(State(state): State<AppState>) -> Response {
    Json(state.broadcast.analyzers.allocation.get_analysis()).into_response()
}

async fn metaspace_metrics(State(state): State<AppState>) -> Response {
    Json(state.broadcast.analyzers.metaspace.get_analysis()).into_response()
}

async fn method_profiling(State(state): State<AppState>) -> Response {
    Json(state.broadcast.analyzers.profiling.get_analysis()).into_response()
}

async fn contention_analysis(State(state): State<AppState>) -> Response {
    Json(state.broadcast.analyzers.contention.get_analysis()).into_response()
}

async fn correlations(State(state): State<AppState>) -> Response {
    Json(state.broadcast.analyzers.correlation.get_analysis()).into_response()
}

async fn flamegraph_json(State(state): State<AppState>) -> Response {
    Json(state.broadcast.analyzers.flamegraph.get_analysis()).into_response()
}

/// Folded-stack text format (one `frame;frame;...;frame count` line per leaf
/// path), the shape `flamegraph.pl`-style tooling consumes.
async fn flamegraph_collapsed(State(state): State<AppState>) -> Response {
    let analysis = state.broadcast.analyzers.flamegraph.get_analysis();
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        analysis.collapsed,
    )
        .into_response()
}
