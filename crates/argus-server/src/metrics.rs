//! `/metrics` (aggregate JSON totals) and `/prometheus` (text exposition),
//! per `spec.md` §4.6/§4.7.

use std::sync::atomic::Ordering;

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::app::AppState;

pub(crate) fn routes() -> Router<AppState> {
    Router::new()
        .route("/metrics", get(metrics_json))
        .route("/prometheus", get(prometheus_text))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EventsProcessed {
    virtual_thread: u64,
    gc: u64,
    cpu: u64,
    allocation: u64,
    metaspace: u64,
    execution_sample: u64,
    contention: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MetricsResponse {
    threads: argus_state::StateCounts,
    events_processed: EventsProcessed,
    subscribers: usize,
}

async fn metrics_json(State(state): State<AppState>) -> Json<MetricsResponse> {
    let counters = &state.broadcast.counters;
    Json(MetricsResponse {
        threads: state.broadcast.state_manager.snapshot().counts,
        events_processed: EventsProcessed {
            virtual_thread: counters.virtual_thread.load(Ordering::Relaxed),
            gc: counters.gc.load(Ordering::Relaxed),
            cpu: counters.cpu.load(Ordering::Relaxed),
            allocation: counters.allocation.load(Ordering::Relaxed),
            metaspace: counters.metaspace.load(Ordering::Relaxed),
            execution_sample: counters.execution_sample.load(Ordering::Relaxed),
            contention: counters.contention.load(Ordering::Relaxed),
        },
        subscribers: state.broadcast.subscribers.len(),
    })
}

async fn prometheus_text(State(state): State<AppState>) -> Response {
    let body = argus_metrics::render_prometheus(&state.broadcast, &state.families);
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
        .into_response()
}
