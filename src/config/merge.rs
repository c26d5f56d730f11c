//! Field-by-field merging of configuration tiers.
//!
//! Maps merge key by key; everything else (scalars, sequences) is replaced by
//! the higher tier. A `null` in a higher tier means "not set here".

use serde_json::Value;

/// Merge `overlay` onto `base`; `overlay` wins on conflicts.
///
/// ```
/// use serde_json::json;
/// use task_deps::config::deep_merge;
///
/// let merged = deep_merge(
///     json!({"server": {"host": "127.0.0.1", "port": 31995}}),
///     json!({"server": {"port": 8080}}),
/// );
/// assert_eq!(merged, json!({"server": {"host": "127.0.0.1", "port": 8080}}));
/// ```
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut merged), Value::Object(upper)) => {
            for (key, value) in upper {
                let lower = merged.remove(&key).unwrap_or(Value::Null);
                merged.insert(key, deep_merge(lower, value));
            }
            Value::Object(merged)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Fold tiers lowest first.
pub fn deep_merge_all(tiers: impl IntoIterator<Item = Value>) -> Value {
    tiers.into_iter().fold(Value::Null, deep_merge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_sections_merge_per_key() {
        let merged = deep_merge(
            json!({"server": {"host": "127.0.0.1", "port": 31995}, "gantt": {"external_edges": "redact"}}),
            json!({"server": {"port": 4000}}),
        );
        assert_eq!(
            merged,
            json!({"server": {"host": "127.0.0.1", "port": 4000}, "gantt": {"external_edges": "redact"}})
        );
    }

    #[test]
    fn null_leaves_lower_tier_alone() {
        let merged = deep_merge(
            json!({"dependencies": {"max_lag_days": 365}}),
            json!({"dependencies": {"max_lag_days": null}}),
        );
        assert_eq!(merged, json!({"dependencies": {"max_lag_days": 365}}));
    }

    #[test]
    fn sequences_and_scalars_are_replaced() {
        assert_eq!(
            deep_merge(json!({"a": [1, 2, 3]}), json!({"a": [4]})),
            json!({"a": [4]})
        );
        assert_eq!(
            deep_merge(json!({"a": {"b": 1}}), json!({"a": 7})),
            json!({"a": 7})
        );
        assert_eq!(
            deep_merge(json!({"a": 7}), json!({"a": {"b": 1}})),
            json!({"a": {"b": 1}})
        );
    }

    #[test]
    fn later_tiers_win() {
        let merged = deep_merge_all([
            json!({"server": {"port": 1, "host": "a"}}),
            json!({"server": {"port": 2}}),
            json!({"server": {"port": 3}, "gantt": {"external_edges": "omit"}}),
        ]);
        assert_eq!(
            merged,
            json!({"server": {"port": 3, "host": "a"}, "gantt": {"external_edges": "omit"}})
        );
    }

    #[test]
    fn merging_nothing_is_null() {
        assert_eq!(deep_merge_all(Vec::new()), Value::Null);
    }
}
