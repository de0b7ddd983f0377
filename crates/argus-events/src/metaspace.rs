//! Metaspace / class-loader usage events.

use crate::timestamp::Timestamp;

#[derive(Debug, Clone, Copy)]
pub struct MetaspaceEvent {
    pub timestamp: Timestamp,
    pub used: u64,
    pub committed: u64,
    pub reserved: u64,
    pub class_count: u64,
}
