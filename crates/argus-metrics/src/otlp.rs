//! Periodic OTLP-shaped JSON push exporter (`spec.md` §4.6/§6).
//!
//! The payload is hand-assembled rather than built from an OTLP SDK: the
//! source only ever emits this one fixed shape, so pulling in a full OTLP
//! client for one POST body would be more machinery than the task needs.

use std::time::Duration;

use argus_analyzers::Analyzer;
use argus_broadcast::BroadcastState;
use argus_config::OtlpConfig;
use reqwest::Client;
use serde::Serialize;

#[derive(Serialize)]
struct NumberDataPoint {
    #[serde(rename = "timeUnixNano")]
    time_unix_nano: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "asInt")]
    as_int: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "asDouble")]
    as_double: Option<f64>,
}

#[derive(Serialize)]
struct Gauge {
    #[serde(rename = "dataPoints")]
    data_points: Vec<NumberDataPoint>,
}

#[derive(Serialize)]
struct Sum {
    #[serde(rename = "dataPoints")]
    data_points: Vec<NumberDataPoint>,
    #[serde(rename = "aggregationTemporality")]
    aggregation_temporality: u8,
    #[serde(rename = "isMonotonic")]
    is_monotonic: bool,
}

#[derive(Serialize)]
struct Metric {
    name: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    gauge: Option<Gauge>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sum: Option<Sum>,
}

#[derive(Serialize)]
struct ScopeMetrics {
    scope: ScopeInfo,
    metrics: Vec<Metric>,
}

#[derive(Serialize)]
struct ScopeInfo {
    name: &'static str,
}

#[derive(Serialize)]
struct Resource {
    attributes: Vec<Attribute>,
}

#[derive(Serialize)]
struct Attribute {
    key: &'static str,
    value: AttributeValue,
}

#[derive(Serialize)]
struct AttributeValue {
    #[serde(rename = "stringValue")]
    string_value: String,
}

#[derive(Serialize)]
struct ResourceMetrics {
    resource: Resource,
    #[serde(rename = "scopeMetrics")]
    scope_metrics: Vec<ScopeMetrics>,
}

#[derive(Serialize)]
struct ExportPayload {
    #[serde(rename = "resourceMetrics")]
    resource_metrics: Vec<ResourceMetrics>,
}

fn gauge_point(time_unix_nano: u64, value: f64) -> NumberDataPoint {
    NumberDataPoint {
        time_unix_nano: time_unix_nano.to_string(),
        as_int: None,
        as_double: Some(value),
    }
}

fn sum_point(time_unix_nano: u64, value: u64) -> NumberDataPoint {
    NumberDataPoint {
        time_unix_nano: time_unix_nano.to_string(),
        as_int: Some(value.to_string()),
        as_double: None,
    }
}

/// Builds the export payload from the current broadcaster state.
fn build_payload(state: &BroadcastState, service_name: &str) -> ExportPayload {
    let now_nanos = argus_events::Timestamp::now().raw_nanos();
    let counts = state.state_manager.snapshot().counts;
    let gc = state.analyzers.gc.get_analysis();
    let cpu = state.analyzers.cpu.get_analysis();

    let mut metrics = vec![
        Metric {
            name: "argus.virtual_threads.active",
            description: "Currently running virtual threads",
            gauge: Some(Gauge {
                data_points: vec![gauge_point(now_nanos, counts.running as f64)],
            }),
            sum: None,
        },
        Metric {
            name: "argus.gc.pause_time",
            description: "Cumulative GC pause time in nanoseconds",
            gauge: None,
            sum: Some(Sum {
                data_points: vec![sum_point(now_nanos, gc.total_pause_nanos)],
                aggregation_temporality: 2,
                is_monotonic: true,
            }),
        },
    ];

    if let Some(latest) = cpu.latest {
        metrics.push(Metric {
            name: "argus.cpu.machine_total",
            description: "Most recent machine-wide CPU load",
            gauge: Some(Gauge {
                data_points: vec![gauge_point(now_nanos, latest.machine_total)],
            }),
            sum: None,
        });
    }

    ExportPayload {
        resource_metrics: vec![ResourceMetrics {
            resource: Resource {
                attributes: vec![Attribute {
                    key: "service.name",
                    value: AttributeValue {
                        string_value: service_name.to_string(),
                    },
                }],
            },
            scope_metrics: vec![ScopeMetrics {
                scope: ScopeInfo { name: "argus" },
                metrics,
            }],
        }],
    }
}

/// Runs the periodic push loop until `cancel` is observed. Each tick builds
/// a fresh payload and POSTs it; failures are logged and the next interval
/// retries — there is no queue (`spec.md` §4.6).
pub async fn run(
    state: std::sync::Arc<BroadcastState>,
    config: OtlpConfig,
    http_timeout: Duration,
    cancel: tokio_util::sync::CancellationToken,
) {
    let client = match Client::builder().timeout(http_timeout).build() {
        Ok(client) => client,
        Err(error) => {
            tracing::error!(%error, "failed to build OTLP exporter HTTP client; exporter disabled");
            return;
        }
    };

    let mut interval = tokio::time::interval(config.interval());
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                let payload = build_payload(&state, &config.service_name);
                let mut request = client.post(&config.endpoint).json(&payload);
                for (key, value) in &config.headers {
                    request = request.header(key, value);
                }
                match request.send().await {
                    Ok(response) if !response.status().is_success() => {
                        tracing::warn!(status = %response.status(), "OTLP export rejected");
                    }
                    Ok(_) => {}
                    Err(error) => {
                        tracing::warn!(%error, "OTLP export failed; retrying next interval");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argus_config::Config;

    #[test]
    fn payload_carries_sum_and_gauge_shapes() {
        let config = Config::default();
        let state = BroadcastState::new(&config);
        let payload = build_payload(&state, "argus-test");

        let json = serde_json::to_value(&payload).unwrap();
        let scope_metrics = &json["resourceMetrics"][0]["scopeMetrics"][0]["metrics"];
        let gc_metric = scope_metrics
            .as_array()
            .unwrap()
            .iter()
            .find(|m| m["name"] == "argus.gc.pause_time")
            .unwrap();
        assert_eq!(gc_metric["sum"]["isMonotonic"], true);
        assert_eq!(gc_metric["sum"]["aggregationTemporality"], 2);
        assert!(gc_metric["sum"]["dataPoints"][0]["asInt"].is_string());

        let resource_attrs = &json["resourceMetrics"][0]["resource"]["attributes"][0];
        assert_eq!(resource_attrs["key"], "service.name");
        assert_eq!(resource_attrs["value"]["stringValue"], "argus-test");
    }
}
