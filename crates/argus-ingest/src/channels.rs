//! Canonical host event channel names (`spec.md` §4.2).
//!
//! These mirror the event names a JFR-style recording stream would expose
//! for a virtual-thread-capable runtime. The ingestion engine subscribes to
//! one `HostEventSource` channel per enabled family; the exact transport and
//! on-the-wire record shape live behind [`crate::host::RawRecord`].

/// One canonical channel name the ingestion engine knows how to consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelName {
    VirtualThreadStart,
    VirtualThreadEnd,
    VirtualThreadPinned,
    VirtualThreadSubmitFailed,
    GarbageCollection,
    GcHeapSummary,
    CpuLoad,
    ObjectAllocationInNewTlab,
    ObjectAllocationOutsideTlab,
    MetaspaceSummary,
    ExecutionSample,
    JavaMonitorEnter,
    ThreadPark,
}

impl ChannelName {
    /// The channel name as the host event stream identifies it.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ChannelName::VirtualThreadStart => "jdk.VirtualThreadStart",
            ChannelName::VirtualThreadEnd => "jdk.VirtualThreadEnd",
            ChannelName::VirtualThreadPinned => "jdk.VirtualThreadPinned",
            ChannelName::VirtualThreadSubmitFailed => "jdk.VirtualThreadSubmitFailed",
            ChannelName::GarbageCollection => "jdk.GarbageCollection",
            ChannelName::GcHeapSummary => "jdk.GCHeapSummary",
            ChannelName::CpuLoad => "jdk.CPULoad",
            ChannelName::ObjectAllocationInNewTlab => "jdk.ObjectAllocationInNewTLAB",
            ChannelName::ObjectAllocationOutsideTlab => "jdk.ObjectAllocationOutsideTLAB",
            ChannelName::MetaspaceSummary => "jdk.MetaspaceSummary",
            ChannelName::ExecutionSample => "jdk.ExecutionSample",
            ChannelName::JavaMonitorEnter => "jdk.JavaMonitorEnter",
            ChannelName::ThreadPark => "jdk.ThreadPark",
        }
    }

    /// The channels the ingestion engine subscribes to for a given set of
    /// enabled families (`spec.md` §4.2: families the operator disables are
    /// never subscribed, not merely filtered after the fact).
    #[must_use]
    pub fn for_families(families: &argus_config::FamiliesConfig) -> Vec<ChannelName> {
        let mut channels = vec![
            ChannelName::VirtualThreadStart,
            ChannelName::VirtualThreadEnd,
            ChannelName::VirtualThreadPinned,
            ChannelName::VirtualThreadSubmitFailed,
        ];
        if families.gc_enabled {
            channels.push(ChannelName::GarbageCollection);
            channels.push(ChannelName::GcHeapSummary);
        }
        if families.cpu_enabled {
            channels.push(ChannelName::CpuLoad);
        }
        if families.allocation_enabled {
            channels.push(ChannelName::ObjectAllocationInNewTlab);
            channels.push(ChannelName::ObjectAllocationOutsideTlab);
        }
        if families.metaspace_enabled {
            channels.push(ChannelName::MetaspaceSummary);
        }
        if families.profiling_enabled {
            channels.push(ChannelName::ExecutionSample);
        }
        if families.contention_enabled {
            channels.push(ChannelName::JavaMonitorEnter);
            channels.push(ChannelName::ThreadPark);
        }
        channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_families_are_not_subscribed() {
        let mut families = argus_config::FamiliesConfig::default();
        families.gc_enabled = false;
        families.allocation_enabled = false;
        families.metaspace_enabled = false;
        families.contention_enabled = false;
        families.profiling_enabled = false;

        let channels = ChannelName::for_families(&families);
        assert!(!channels.contains(&ChannelName::GarbageCollection));
        assert!(!channels.contains(&ChannelName::ObjectAllocationInNewTlab));
        assert!(channels.contains(&ChannelName::VirtualThreadStart));
    }
}
