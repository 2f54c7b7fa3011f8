//! response post-processing
//!
//! the same pruning the generated `remove_empty` helper applies to a raw
//! response before decoding it.

use serde_json::Value;

/// drop empty objects and arrays at every level
///
/// children are pruned first, so a container that only held empty
/// containers is dropped too. `null` is kept and the root is never removed.
///
/// ```
/// use pygql_codegen::prune_empty;
/// use serde_json::json;
///
/// let pruned = prune_empty(json!({"a": {}, "b": [1, {}, 2], "c": null}));
/// assert_eq!(pruned, json!({"b": [1, 2], "c": null}));
/// ```
pub fn prune_empty(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, prune_empty(value)))
                .filter(|(_, value)| !is_empty_container(value))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(prune_empty)
                .filter(|value| !is_empty_container(value))
                .collect(),
        ),
        other => other,
    }
}

fn is_empty_container(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prune_example() {
        let pruned = prune_empty(json!({"a": {}, "b": [1, {}, 2], "c": null}));
        assert_eq!(pruned, json!({"b": [1, 2], "c": null}));
    }

    #[test]
    fn test_prune_is_post_order() {
        let pruned = prune_empty(json!({"a": {"b": [{}, []]}, "keep": [[], [null]]}));
        assert_eq!(pruned, json!({"keep": [[null]]}));
    }

    #[test]
    fn test_root_is_kept() {
        assert_eq!(prune_empty(json!({"a": {}})), json!({}));
        assert_eq!(prune_empty(json!([])), json!([]));
        assert_eq!(prune_empty(json!(null)), json!(null));
        assert_eq!(prune_empty(json!("text")), json!("text"));
    }

    #[test]
    fn test_key_order_preserved() {
        let pruned = prune_empty(json!({"z": 1, "a": {}, "m": {"x": 2}}));
        let keys: Vec<_> = pruned.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["z", "m"]);
    }
}
