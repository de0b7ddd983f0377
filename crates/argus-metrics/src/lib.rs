//! Metrics exposition: a pull-based Prometheus text endpoint and a periodic
//! OTLP-shaped JSON push exporter (`spec.md` §4.6).

mod otlp;
mod prometheus;

pub use otlp::run as run_otlp_exporter;
pub use prometheus::render as render_prometheus;
