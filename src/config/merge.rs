//! Field-by-field merge of configuration tiers.
//!
//! Tiers are parsed into `serde_json::Value` trees and folded together so a
//! higher tier only has to name the keys it changes.

use serde_json::Value;

/// Merge `overlay` onto `base`.
///
/// Objects merge key by key; every other value in `overlay` replaces the one
/// in `base`, arrays included. A null in `overlay` means "not set" and leaves
/// `base` alone.
///
/// ```
/// use serde_json::json;
/// use project_tracker::config::deep_merge;
///
/// let defaults = json!({"server": {"port": 3001, "host": "127.0.0.1"}});
/// let user = json!({"server": {"port": 8080}});
/// assert_eq!(
///     deep_merge(defaults, user),
///     json!({"server": {"port": 8080, "host": "127.0.0.1"}})
/// );
/// ```
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut merged), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                let next = match merged.remove(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value,
                };
                merged.insert(key, next);
            }
            Value::Object(merged)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Fold tiers lowest-priority first.
pub fn deep_merge_all(tiers: impl IntoIterator<Item = Value>) -> Value {
    tiers.into_iter().fold(Value::Null, deep_merge)
}
