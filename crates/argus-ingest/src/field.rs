//! Declarative field extraction: each logical attribute is read from an
//! ordered list of candidate field paths, falling back to the next path (and
//! ultimately to a sentinel) so that a field renamed or dropped across host
//! runtime versions degrades to a known-missing value instead of aborting
//! ingestion of the whole record (`spec.md` §9 "declarative field
//! extraction").

use crate::host::{FieldValue, RawRecord};

/// Sentinel for a missing thread/carrier id.
pub const UNKNOWN_ID: i64 = -1;
/// Sentinel for a missing string field.
pub const UNKNOWN_STR: &str = "Unknown";

/// Reads the first of `paths` present on `record` as an `i64`, widening
/// `UInt` values; falls back to `sentinel`.
#[must_use]
pub fn extract_i64(record: &dyn RawRecord, paths: &[&str], sentinel: i64) -> i64 {
    for path in paths {
        match record.get(path) {
            Some(FieldValue::Int(v)) => return v,
            Some(FieldValue::UInt(v)) => return v as i64,
            _ => continue,
        }
    }
    sentinel
}

/// Reads the first of `paths` present on `record` as a `u64`, clamping a
/// negative `Int` to `0`; falls back to `sentinel`.
#[must_use]
pub fn extract_u64(record: &dyn RawRecord, paths: &[&str], sentinel: u64) -> u64 {
    for path in paths {
        match record.get(path) {
            Some(FieldValue::UInt(v)) => return v,
            Some(FieldValue::Int(v)) if v >= 0 => return v as u64,
            _ => continue,
        }
    }
    sentinel
}

/// Reads the first of `paths` present on `record` as an `f64`, widening
/// integer kinds; falls back to `sentinel`.
#[must_use]
pub fn extract_f64(record: &dyn RawRecord, paths: &[&str], sentinel: f64) -> f64 {
    for path in paths {
        match record.get(path) {
            Some(FieldValue::Float(v)) => return v,
            Some(FieldValue::Int(v)) => return v as f64,
            Some(FieldValue::UInt(v)) => return v as f64,
            _ => continue,
        }
    }
    sentinel
}

/// Reads the first of `paths` present on `record` as a `String`; falls back
/// to `sentinel`.
#[must_use]
pub fn extract_string(record: &dyn RawRecord, paths: &[&str], sentinel: &str) -> String {
    for path in paths {
        if let Some(FieldValue::Str(v)) = record.get(path) {
            if !v.is_empty() {
                return v;
            }
        }
    }
    sentinel.to_string()
}

/// Reads the first of `paths` present on `record` as an optional `String`,
/// returning `None` rather than a sentinel when nothing matches.
#[must_use]
pub fn extract_optional_string(record: &dyn RawRecord, paths: &[&str]) -> Option<String> {
    for path in paths {
        if let Some(FieldValue::Str(v)) = record.get(path) {
            if !v.is_empty() {
                return Some(v);
            }
        }
    }
    None
}

/// Reads the first of `paths` present on `record` as a stack trace: the
/// host is expected to expose it pre-rendered as one string per frame under
/// a single list-shaped field; absent that, falls back to `None`.
#[must_use]
pub fn extract_stack_trace(record: &dyn RawRecord, paths: &[&str]) -> Option<Vec<String>> {
    for path in paths {
        if let Some(FieldValue::Str(v)) = record.get(path) {
            if v.is_empty() {
                continue;
            }
            let frames: Vec<String> = v.lines().map(str::to_string).collect();
            if !frames.is_empty() {
                return Some(frames);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct TestRecord(HashMap<&'static str, FieldValue>);

    impl RawRecord for TestRecord {
        fn channel(&self) -> &str {
            "test"
        }
        fn get(&self, field_path: &str) -> Option<FieldValue> {
            self.0.get(field_path).cloned()
        }
    }

    #[test]
    fn falls_through_to_second_path_then_sentinel() {
        let mut fields = HashMap::new();
        fields.insert("thread.osThreadId", FieldValue::UInt(42));
        let record = TestRecord(fields);

        assert_eq!(
            extract_i64(&record, &["eventThread.javaThreadId", "thread.osThreadId"], UNKNOWN_ID),
            42
        );
        assert_eq!(extract_i64(&record, &["nonexistent.path"], UNKNOWN_ID), UNKNOWN_ID);
    }

    #[test]
    fn string_extraction_skips_empty_values() {
        let mut fields = HashMap::new();
        fields.insert("name", FieldValue::Str(String::new()));
        fields.insert("fallbackName", FieldValue::Str("worker-7".to_string()));
        let record = TestRecord(fields);

        assert_eq!(
            extract_string(&record, &["name", "fallbackName"], UNKNOWN_STR),
            "worker-7"
        );
    }

    #[test]
    fn stack_trace_splits_on_lines() {
        let mut fields = HashMap::new();
        fields.insert(
            "stackTrace",
            FieldValue::Str("com.example.Foo.run\ncom.example.Bar.call".to_string()),
        );
        let record = TestRecord(fields);

        let frames = extract_stack_trace(&record, &["stackTrace"]).unwrap();
        assert_eq!(frames, vec!["com.example.Foo.run", "com.example.Bar.call"]);
    }
}
