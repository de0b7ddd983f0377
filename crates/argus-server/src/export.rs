//! `GET /export?format=&types=&from=&to=` — a filtered download of the
//! bounded export history (`spec.md` §4.7).

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::app::AppState;

pub(crate) fn routes() -> Router<AppState> {
    Router::new().route("/export", get(export))
}

#[derive(Deserialize)]
struct ExportQuery {
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    types: Option<String>,
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    to: Option<String>,
}

/// Maps a wire `"type"` tag to the family token `types=` filters on.
fn family_of(type_tag: &str) -> &'static str {
    match type_tag {
        "START" | "END" | "PINNED" | "SUBMIT_FAILED" => "virtual_thread",
        "GC_EVENT" => "gc",
        "CPU_EVENT" => "cpu",
        "ALLOCATION_EVENT" => "allocation",
        "METASPACE_EVENT" => "metaspace",
        "EXECUTION_SAMPLE" => "execution_sample",
        "CONTENTION_EVENT" => "contention",
        _ => "unknown",
    }
}

async fn export(State(state): State<AppState>, Query(query): Query<ExportQuery>) -> Response {
    if let Some(format) = &query.format {
        if !format.eq_ignore_ascii_case("json") {
            return (StatusCode::BAD_REQUEST, format!("unsupported export format '{format}'"))
                .into_response();
        }
    }

    let wanted_types: Option<Vec<String>> = query
        .types
        .as_ref()
        .map(|raw| raw.split(',').map(|s| s.trim().to_ascii_lowercase()).collect());
    let from: Option<DateTime<Utc>> = query.from.as_deref().and_then(parse_bound);
    let to: Option<DateTime<Utc>> = query.to.as_deref().and_then(parse_bound);

    let filtered: Vec<String> = state
        .broadcast
        .exportable_events
        .snapshot()
        .into_iter()
        .filter(|json| matches_filters(json, &wanted_types, from, to))
        .collect();

    let body = format!("[{}]", filtered.join(","));
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response()
}

fn parse_bound(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.with_timezone(&Utc))
}

fn matches_filters(
    json: &str,
    wanted_types: &Option<Vec<String>>,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> bool {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(json) else {
        return false;
    };

    if let Some(wanted) = wanted_types {
        let type_tag = value.get("type").and_then(|v| v.as_str()).unwrap_or("");
        let family = family_of(type_tag);
        if !wanted.iter().any(|t| t == family) {
            return false;
        }
    }

    if from.is_some() || to.is_some() {
        let Some(timestamp) = value
            .get("timestamp")
            .and_then(|v| v.as_str())
            .and_then(parse_bound)
        else {
            return false;
        };
        if let Some(from) = from {
            if timestamp < from {
                return false;
            }
        }
        if let Some(to) = to {
            if timestamp > to {
                return false;
            }
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_of_maps_virtual_thread_tags() {
        assert_eq!(family_of("START"), "virtual_thread");
        assert_eq!(family_of("CONTENTION_EVENT"), "contention");
        assert_eq!(family_of("NOT_A_REAL_TAG"), "unknown");
    }
}
