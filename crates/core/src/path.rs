//! Dot-path access into JSON result records.
//!
//! A path like `metrics.cost` walks nested objects key by key. Array
//! elements can be addressed by numeric segments (`blocks.0.cost`).

use serde_json::Value;

/// Resolve `path` inside `value`. An empty path returns `value` itself.
pub fn value_at<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    segments(path).try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Mutable counterpart of [`value_at`].
pub fn value_at_mut<'a>(value: &'a mut Value, path: &str) -> Option<&'a mut Value> {
    segments(path).try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get_mut(segment),
        Value::Array(items) => segment
            .parse::<usize>()
            .ok()
            .and_then(move |i| items.get_mut(i)),
        _ => None,
    })
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('.').filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn walks_nested_objects() {
        let record = json!({"metrics": {"cost": 412.5}});
        assert_eq!(value_at(&record, "metrics.cost"), Some(&json!(412.5)));
    }

    #[test]
    fn walks_array_indices() {
        let record = json!({"blocks": [{"id": 1}, {"id": 2}]});
        assert_eq!(value_at(&record, "blocks.1.id"), Some(&json!(2)));
    }

    #[test]
    fn missing_segment_is_none() {
        let record = json!({"metrics": {"cost": 1}});
        assert_eq!(value_at(&record, "metrics.basicity"), None);
        assert_eq!(value_at(&record, "metrics.cost.deeper"), None);
    }

    #[test]
    fn empty_path_is_the_record() {
        let record = json!({"a": 1});
        assert_eq!(value_at(&record, ""), Some(&record));
    }

    #[test]
    fn mutable_access_edits_in_place() {
        let mut record = json!({"slag": {"sources": {"3": 0.4}}});
        if let Some(v) = value_at_mut(&mut record, "slag.sources") {
            *v = json!({});
        }
        assert_eq!(record, json!({"slag": {"sources": {}}}));
    }
}
