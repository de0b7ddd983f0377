//! Environment-sourced configuration, per the key contract in `spec.md` §6.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Top-level server exposition settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            enabled: true,
            port: 9202,
        }
    }
}

/// Per-family enable flags and family-specific tunables.
#[derive(Debug, Clone, PartialEq)]
pub struct FamiliesConfig {
    pub gc_enabled: bool,
    pub cpu_enabled: bool,
    pub cpu_interval_ms: u64,
    pub allocation_enabled: bool,
    pub allocation_threshold_bytes: u64,
    pub metaspace_enabled: bool,
    pub profiling_enabled: bool,
    pub profiling_interval_ms: u64,
    pub contention_enabled: bool,
    pub contention_threshold_ms: u64,
    pub correlation_enabled: bool,
}

impl FamiliesConfig {
    #[must_use]
    pub fn cpu_interval(&self) -> Duration {
        Duration::from_millis(self.cpu_interval_ms)
    }

    #[must_use]
    pub fn profiling_interval(&self) -> Duration {
        Duration::from_millis(self.profiling_interval_ms)
    }

    #[must_use]
    pub fn contention_threshold(&self) -> Duration {
        Duration::from_millis(self.contention_threshold_ms)
    }
}

impl Default for FamiliesConfig {
    fn default() -> Self {
        FamiliesConfig {
            gc_enabled: true,
            cpu_enabled: true,
            cpu_interval_ms: 1_000,
            allocation_enabled: false,
            allocation_threshold_bytes: 1024 * 1024,
            metaspace_enabled: true,
            profiling_enabled: false,
            profiling_interval_ms: 20,
            contention_enabled: false,
            contention_threshold_ms: 50,
            correlation_enabled: true,
        }
    }
}

/// OTLP periodic push-exporter settings.
#[derive(Debug, Clone, PartialEq)]
pub struct OtlpConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub interval_ms: u64,
    pub headers: Vec<(String, String)>,
    pub service_name: String,
}

impl OtlpConfig {
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for OtlpConfig {
    fn default() -> Self {
        OtlpConfig {
            enabled: false,
            endpoint: "http://localhost:4318/v1/metrics".to_string(),
            interval_ms: 15_000,
            headers: Vec::new(),
            service_name: "argus".to_string(),
        }
    }
}

/// Metrics-exposition settings (pull + push).
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsConfig {
    pub prometheus_enabled: bool,
    pub otlp: OtlpConfig,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        MetricsConfig {
            prometheus_enabled: true,
            otlp: OtlpConfig::default(),
        }
    }
}

/// The complete, resolved Argus configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub buffer_size: usize,
    pub server: ServerConfig,
    pub families: FamiliesConfig,
    pub metrics: MetricsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            buffer_size: 65_536,
            server: ServerConfig::default(),
            families: FamiliesConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

/// Reads `key` from the environment; on a parse failure (value present but
/// malformed) logs a warning and returns `default`, per `spec.md` §7's
/// "Config parse failure" policy. An unset variable is not a failure and is
/// not logged.
fn env_value<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(key, raw, "failed to parse config value; using default");
            default
        }),
        Err(_) => default,
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => {
                tracing::warn!(key, raw, "failed to parse boolean config value; using default");
                default
            }
        },
        Err(_) => default,
    }
}

fn parse_headers(raw: &str) -> Vec<(String, String)> {
    let mut headers = Vec::new();
    for pair in raw.split(',') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        match pair.split_once('=') {
            Some((k, v)) => headers.push((k.trim().to_string(), v.trim().to_string())),
            None => tracing::warn!(pair, "ignoring malformed otlp header entry"),
        }
    }
    headers
}

impl Config {
    /// Loads configuration from environment variables, falling back to
    /// `spec.md` §6's defaults for anything unset or unparsable.
    #[must_use]
    pub fn from_env() -> Self {
        let default = Config::default();
        Config {
            buffer_size: env_value("ARGUS_BUFFER_SIZE", default.buffer_size),
            server: ServerConfig {
                enabled: env_bool("ARGUS_SERVER_ENABLED", default.server.enabled),
                port: env_value("ARGUS_SERVER_PORT", default.server.port),
            },
            families: FamiliesConfig {
                gc_enabled: env_bool("ARGUS_GC_ENABLED", default.families.gc_enabled),
                cpu_enabled: env_bool("ARGUS_CPU_ENABLED", default.families.cpu_enabled),
                cpu_interval_ms: env_value("ARGUS_CPU_INTERVAL", default.families.cpu_interval_ms),
                allocation_enabled: env_bool(
                    "ARGUS_ALLOCATION_ENABLED",
                    default.families.allocation_enabled,
                ),
                allocation_threshold_bytes: env_value(
                    "ARGUS_ALLOCATION_THRESHOLD",
                    default.families.allocation_threshold_bytes,
                ),
                metaspace_enabled: env_bool(
                    "ARGUS_METASPACE_ENABLED",
                    default.families.metaspace_enabled,
                ),
                profiling_enabled: env_bool(
                    "ARGUS_PROFILING_ENABLED",
                    default.families.profiling_enabled,
                ),
                profiling_interval_ms: env_value(
                    "ARGUS_PROFILING_INTERVAL",
                    default.families.profiling_interval_ms,
                ),
                contention_enabled: env_bool(
                    "ARGUS_CONTENTION_ENABLED",
                    default.families.contention_enabled,
                ),
                contention_threshold_ms: env_value(
                    "ARGUS_CONTENTION_THRESHOLD",
                    default.families.contention_threshold_ms,
                ),
                correlation_enabled: env_bool(
                    "ARGUS_CORRELATION_ENABLED",
                    default.families.correlation_enabled,
                ),
            },
            metrics: MetricsConfig {
                prometheus_enabled: env_bool(
                    "ARGUS_METRICS_PROMETHEUS_ENABLED",
                    default.metrics.prometheus_enabled,
                ),
                otlp: OtlpConfig {
                    enabled: env_bool("ARGUS_OTLP_ENABLED", default.metrics.otlp.enabled),
                    endpoint: env::var("ARGUS_OTLP_ENDPOINT")
                        .unwrap_or(default.metrics.otlp.endpoint),
                    interval_ms: env_value(
                        "ARGUS_OTLP_INTERVAL",
                        default.metrics.otlp.interval_ms,
                    ),
                    headers: env::var("ARGUS_OTLP_HEADERS")
                        .map(|raw| parse_headers(&raw))
                        .unwrap_or(default.metrics.otlp.headers),
                    service_name: env::var("ARGUS_OTLP_SERVICE_NAME")
                        .unwrap_or(default.metrics.otlp.service_name),
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = Config::default();
        assert_eq!(cfg.buffer_size, 65_536);
        assert_eq!(cfg.server.port, 9202);
        assert!(!cfg.families.allocation_enabled);
        assert_eq!(cfg.families.allocation_threshold_bytes, 1024 * 1024);
        assert!(!cfg.metrics.otlp.enabled);
        assert_eq!(cfg.metrics.otlp.service_name, "argus");
    }

    #[test]
    fn header_parsing_skips_malformed_pairs() {
        let headers = parse_headers("a=1,b=2, bad ,c=3");
        assert_eq!(
            headers,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string()),
                ("c".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn env_bool_falls_back_on_garbage() {
        assert!(env_bool("ARGUS_TEST_NONEXISTENT_BOOL_KEY", true));
    }
}
