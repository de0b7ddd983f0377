//! Flame-graph analyzer: builds a root-first call tree over a rolling
//! 60-second window, rendered as both JSON and collapsed-stack text.

use std::collections::BTreeMap;
use std::time::Duration;

use argus_events::ExecutionSampleEvent;
use parking_lot::Mutex;
use serde::Serialize;

use crate::analyzer::Analyzer;
use crate::util::parse_frames;

#[derive(Serialize, Clone, Default)]
pub struct FrameNode {
    pub name: String,
    pub value: u64,
    pub children: Vec<FrameNode>,
}

#[derive(Default)]
struct TreeNode {
    value: u64,
    children: BTreeMap<String, TreeNode>,
}

impl TreeNode {
    fn insert(&mut self, frames: &[String]) {
        self.value += 1;
        if let Some((head, rest)) = frames.split_first() {
            self.children.entry(head.clone()).or_default().insert(rest);
        }
    }

    fn to_frame_node(&self, name: &str) -> FrameNode {
        FrameNode {
            name: name.to_string(),
            value: self.value,
            children: self
                .children
                .iter()
                .map(|(child_name, child)| child.to_frame_node(child_name))
                .collect(),
        }
    }

    /// Depth-first, root-to-leaf collapsed-stack lines (`"a;b;c count"`),
    /// folded-stacks format as consumed by flame-graph renderers.
    fn collapsed_lines(&self, prefix: &str, out: &mut Vec<String>) {
        if self.children.is_empty() && !prefix.is_empty() {
            out.push(format!("{prefix} {}", self.value));
            return;
        }
        for (name, child) in &self.children {
            let next_prefix = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix};{name}")
            };
            child.collapsed_lines(&next_prefix, out);
        }
    }
}

#[derive(Serialize)]
pub struct FlamegraphAnalysis {
    pub window_started_at: String,
    pub sample_count: u64,
    pub tree: FrameNode,
    pub collapsed: String,
}

struct Window {
    started_at_nanos: u64,
    root: TreeNode,
}

/// Accumulates stack samples into a call tree that resets every
/// [`Self::window`] (default 60s), so the flame graph always reflects recent
/// behavior rather than growing unbounded.
pub struct FlamegraphAnalyzer {
    window: Mutex<Window>,
    window_duration: Duration,
}

impl FlamegraphAnalyzer {
    #[must_use]
    pub fn new(window_duration: Duration) -> Self {
        FlamegraphAnalyzer {
            window: Mutex::new(Window {
                started_at_nanos: 0,
                root: TreeNode::default(),
            }),
            window_duration,
        }
    }
}

impl Analyzer for FlamegraphAnalyzer {
    type Event = ExecutionSampleEvent;
    type Analysis = FlamegraphAnalysis;

    fn record(&self, event: &ExecutionSampleEvent) {
        let now = event.timestamp.raw_nanos();
        let mut window = self.window.lock();
        if window.started_at_nanos == 0 {
            window.started_at_nanos = now;
        } else if now.saturating_sub(window.started_at_nanos) >= self.window_duration.as_nanos() as u64 {
            window.started_at_nanos = now;
            window.root = TreeNode::default();
        }

        // Stack traces are leaf-first (top frame first); a root-first call
        // tree needs them reversed before insertion.
        let mut frames = parse_frames(&event.stack_trace);
        frames.reverse();
        window.root.insert(&frames);
    }

    fn get_analysis(&self) -> FlamegraphAnalysis {
        let window = self.window.lock();
        let tree = window.root.to_frame_node("root");
        let mut collapsed = Vec::new();
        window.root.collapsed_lines("", &mut collapsed);

        FlamegraphAnalysis {
            window_started_at: argus_events::Timestamp::from_nanos_since_origin(
                window.started_at_nanos,
            )
            .to_iso8601_nanos(),
            sample_count: window.root.value,
            tree,
            collapsed: collapsed.join("\n"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argus_events::{ThreadId, Timestamp};

    fn sample(stack: &str, nanos: u64) -> ExecutionSampleEvent {
        ExecutionSampleEvent {
            timestamp: Timestamp::from_nanos_since_origin(nanos),
            thread_id: ThreadId(1),
            thread_name: "worker-1".to_string(),
            top_method: "m".to_string(),
            top_class: "a.X".to_string(),
            top_line: 1,
            stack_trace: stack.to_string(),
        }
    }

    #[test]
    fn shared_prefixes_merge_into_one_branch() {
        let analyzer = FlamegraphAnalyzer::new(Duration::from_secs(60));
        analyzer.record(&sample("at a.X.m(1)\nat a.Main.run(2)", 0));
        analyzer.record(&sample("at a.Y.n(1)\nat a.Main.run(2)", 1));

        let analysis = analyzer.get_analysis();
        assert_eq!(analysis.sample_count, 2);
        assert_eq!(analysis.tree.children.len(), 1);
        let main = &analysis.tree.children[0];
        assert_eq!(main.name, "a.Main.run");
        assert_eq!(main.value, 2);
        assert_eq!(main.children.len(), 2);
        assert!(analysis.collapsed.contains("a.Main.run;a.X.m 1"));
    }

    #[test]
    fn window_rotates_after_duration_elapses() {
        let analyzer = FlamegraphAnalyzer::new(Duration::from_secs(1));
        analyzer.record(&sample("at a.X.m(1)", 0));
        analyzer.record(&sample("at a.Y.n(1)", 2_000_000_000));

        let analysis = analyzer.get_analysis();
        assert_eq!(analysis.sample_count, 1);
        assert_eq!(analysis.tree.children[0].name, "a.Y.n");
    }
}
