//! Pull-based Prometheus text exposition (`spec.md` §4.6).

use std::fmt::Write as _;
use std::sync::atomic::Ordering;

use argus_analyzers::Analyzer;
use argus_broadcast::BroadcastState;
use argus_config::FamiliesConfig;

/// Escapes a label value per the text exposition format: backslash,
/// double-quote, and newline each get backslash-escaped.
fn escape_label(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out
}

fn emit_help_type(out: &mut String, name: &str, help: &str, kind: &str) {
    let _ = writeln!(out, "# HELP {name} {help}");
    let _ = writeln!(out, "# TYPE {name} {kind}");
}

/// Renders the full text-exposition document. Only families enabled in
/// `families` contribute their metrics; event-processed counters (ambient,
/// not a scoped feature) are always emitted.
#[must_use]
pub fn render(state: &BroadcastState, families: &FamiliesConfig) -> String {
    let mut out = String::new();

    let counts = state.state_manager.snapshot().counts;
    emit_help_type(
        &mut out,
        "argus_virtual_threads_active",
        "Currently running virtual threads",
        "gauge",
    );
    let _ = writeln!(out, "argus_virtual_threads_active {}", counts.running);
    emit_help_type(
        &mut out,
        "argus_virtual_threads_pinned",
        "Currently pinned virtual threads",
        "gauge",
    );
    let _ = writeln!(out, "argus_virtual_threads_pinned {}", counts.pinned);
    emit_help_type(
        &mut out,
        "argus_virtual_threads_ended",
        "Recently ended virtual threads still in the visibility window",
        "gauge",
    );
    let _ = writeln!(out, "argus_virtual_threads_ended {}", counts.ended);

    if families.gc_enabled {
        let gc = state.analyzers.gc.get_analysis();
        emit_help_type(
            &mut out,
            "argus_gc_pause_time_seconds_total",
            "Cumulative GC pause time",
            "counter",
        );
        let _ = writeln!(
            out,
            "argus_gc_pause_time_seconds_total {}",
            gc.total_pause_nanos as f64 / 1e9
        );
        emit_help_type(
            &mut out,
            "argus_gc_pause_count_total",
            "Total number of GC pauses observed",
            "counter",
        );
        let _ = writeln!(out, "argus_gc_pause_count_total {}", gc.total_pauses);
    }

    if families.cpu_enabled {
        let cpu = state.analyzers.cpu.get_analysis();
        if let Some(latest) = cpu.latest {
            emit_help_type(
                &mut out,
                "argus_cpu_jvm_total",
                "Most recent JVM CPU load (user + system)",
                "gauge",
            );
            let _ = writeln!(out, "argus_cpu_jvm_total {}", latest.jvm_user + latest.jvm_system);
            emit_help_type(
                &mut out,
                "argus_cpu_machine_total",
                "Most recent machine-wide CPU load",
                "gauge",
            );
            let _ = writeln!(out, "argus_cpu_machine_total {}", latest.machine_total);
        }
    }

    if families.allocation_enabled {
        let allocation = state.analyzers.allocation.get_analysis();
        emit_help_type(
            &mut out,
            "argus_allocation_bytes_total",
            "Cumulative bytes allocated above the configured threshold",
            "counter",
        );
        let _ = writeln!(out, "argus_allocation_bytes_total {}", allocation.total_bytes);
        for class in &allocation.top_classes {
            let _ = writeln!(
                out,
                "argus_allocation_bytes_by_class_total{{class_name=\"{}\"}} {}",
                escape_label(&class.class_name),
                class.total_bytes
            );
        }
    }

    if families.metaspace_enabled {
        let metaspace = state.analyzers.metaspace.get_analysis();
        if let Some(latest) = metaspace.latest {
            emit_help_type(
                &mut out,
                "argus_metaspace_used_bytes",
                "Most recent metaspace usage",
                "gauge",
            );
            let _ = writeln!(out, "argus_metaspace_used_bytes {}", latest.used);
        }
    }

    if families.contention_enabled {
        let contention = state.analyzers.contention.get_analysis();
        emit_help_type(
            &mut out,
            "argus_contention_events_total",
            "Total observed lock-contention events above threshold",
            "counter",
        );
        let _ = writeln!(out, "argus_contention_events_total {}", contention.total_events);
    }

    emit_help_type(
        &mut out,
        "argus_events_processed_total",
        "Total events processed by the broadcaster, by family",
        "counter",
    );
    for (family, count) in [
        ("virtual_thread", state.counters.virtual_thread.load(Ordering::Relaxed)),
        ("gc", state.counters.gc.load(Ordering::Relaxed)),
        ("cpu", state.counters.cpu.load(Ordering::Relaxed)),
        ("allocation", state.counters.allocation.load(Ordering::Relaxed)),
        ("metaspace", state.counters.metaspace.load(Ordering::Relaxed)),
        (
            "execution_sample",
            state.counters.execution_sample.load(Ordering::Relaxed),
        ),
        ("contention", state.counters.contention.load(Ordering::Relaxed)),
    ] {
        let _ = writeln!(
            out,
            "argus_events_processed_total{{family=\"{family}\"}} {count}"
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use argus_config::Config;

    #[test]
    fn escapes_backslash_quote_and_newline() {
        assert_eq!(escape_label("a\\b\"c\nd"), "a\\\\b\\\"c\\nd");
    }

    #[test]
    fn disabled_family_is_omitted() {
        let mut config = Config::default();
        config.families.allocation_enabled = false;
        let state = BroadcastState::new(&config);
        let text = render(&state, &config.families);
        assert!(!text.contains("argus_allocation_bytes_total"));
    }

    #[test]
    fn enabled_family_contributes_metrics() {
        let config = Config::default();
        let state = BroadcastState::new(&config);
        let text = render(&state, &config.families);
        assert!(text.contains("argus_gc_pause_time_seconds_total"));
        assert!(text.contains("# HELP argus_virtual_threads_active"));
    }
}
