//! CPU-load samples.

use crate::timestamp::Timestamp;

#[derive(Debug, Clone, Copy)]
pub struct CpuEvent {
    pub timestamp: Timestamp,
    /// Fraction of a core consumed by the JVM in user mode. Not clamped —
    /// `jvm_user + jvm_system` may exceed 1.0 on multi-core machines.
    pub jvm_user: f64,
    pub jvm_system: f64,
    pub machine_total: f64,
}
