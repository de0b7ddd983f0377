//! Thread-lifecycle endpoints: `/active-threads`, `/threads/{id}/events`,
//! `/threads/{id}/dump`, `/thread-dump` (`spec.md` §4.7).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use argus_events::ThreadId;
use argus_state::{ThreadState, ThreadStateWire};

use crate::app::AppState;

pub(crate) fn routes() -> Router<AppState> {
    Router::new()
        .route("/active-threads", get(active_threads))
        .route("/thread-dump", get(thread_dump))
        .route("/threads/:id/events", get(thread_events))
        .route("/threads/:id/dump", get(thread_stack_dump))
}

/// Currently `RUNNING` or `PINNED` threads (`ENDED` entries are excluded
/// even while still inside their visibility window).
async fn active_threads(State(state): State<AppState>) -> Json<Vec<ThreadStateWire>> {
    let snapshot = state.broadcast.state_manager.snapshot();
    Json(
        snapshot
            .threads
            .into_iter()
            .filter(|t| t.state != ThreadState::Ended)
            .collect(),
    )
}

/// Every tracked thread, including recently `ENDED` ones still inside their
/// visibility window — the full thread-dump view, as opposed to
/// `/active-threads`'s narrower live set.
async fn thread_dump(State(state): State<AppState>) -> Json<Vec<ThreadStateWire>> {
    Json(state.broadcast.state_manager.snapshot().threads)
}

/// Last retained events for one thread, served as a raw JSON array of the
/// already-serialized per-event wire objects.
async fn thread_events(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    let entries = argus_broadcast::per_thread_history(&state.broadcast, ThreadId(id));
    json_array_response(entries)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StackDumpResponse {
    thread_id: u64,
    stack_trace: String,
}

/// The most recent stack trace retained for this thread, taken from its
/// last pinning or execution-sample event (`spec.md` §4.7: "host-provided").
async fn thread_stack_dump(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    let entries = argus_broadcast::per_thread_history(&state.broadcast, ThreadId(id));

    let found = entries.iter().rev().find_map(|json| {
        let value: serde_json::Value = serde_json::from_str(json).ok()?;
        value
            .get("stackTrace")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    });

    match found {
        Some(stack_trace) => Json(StackDumpResponse { thread_id: id, stack_trace }).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Joins already-serialized JSON object strings into a single JSON array
/// response without re-parsing each one.
fn json_array_response(entries: Vec<String>) -> Response {
    let body = format!("[{}]", entries.join(","));
    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response()
}
