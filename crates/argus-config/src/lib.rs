//! Configuration types, environment loading, and fixed operating constants.

mod config;
pub mod limits;

pub use config::{Config, FamiliesConfig, MetricsConfig, OtlpConfig, ServerConfig};
