//! JSON merge patch (RFC 7386) for the mock store

use serde_json::Value;

/// Apply `patch` onto `target` in place.
///
/// Objects merge key by key, `null` deletes a key, anything else replaces.
pub fn merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch_map) = patch else {
        *target = patch.clone();
        return;
    };

    if !target.is_object() {
        *target = Value::Object(serde_json::Map::new());
    }

    if let Value::Object(target_map) = target {
        for (key, value) in patch_map {
            if value.is_null() {
                target_map.remove(key);
            } else {
                merge_patch(target_map.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_nested_keeps_siblings() {
        let mut target = json!({"spec": {"version": "4.16", "replicas": 3}});
        merge_patch(&mut target, &json!({"spec": {"replicas": 5}}));
        assert_eq!(target, json!({"spec": {"version": "4.16", "replicas": 5}}));
    }

    #[test]
    fn test_merge_null_removes_key() {
        let mut target = json!({"a": 1, "b": 2});
        merge_patch(&mut target, &json!({"a": null}));
        assert_eq!(target, json!({"b": 2}));
    }

    #[test]
    fn test_merge_creates_missing_objects() {
        let mut target = json!({});
        merge_patch(&mut target, &json!({"metadata": {"annotations": {"k": "v"}}}));
        assert_eq!(target["metadata"]["annotations"]["k"], "v");
    }
}
