// ── Deep-merge for JSON configuration maps ──
//
// Merge semantics: when both sides hold objects, recurse; on any other
// conflict the source wins and replaces atomically. Arrays are values,
// not containers -- they never merge element-wise.

use serde_json::Value;

/// Deep-merge `src` over `dest` in place.
pub fn deep_merge(dest: &mut Value, src: &Value) {
    match (dest, src) {
        (Value::Object(dest_map), Value::Object(src_map)) => {
            for (key, src_val) in src_map {
                match dest_map.get_mut(key) {
                    Some(dest_val) if dest_val.is_object() && src_val.is_object() => {
                        deep_merge(dest_val, src_val);
                    }
                    _ => {
                        dest_map.insert(key.clone(), src_val.clone());
                    }
                }
            }
        }
        (dest_slot, src_val) => {
            *dest_slot = src_val.clone();
        }
    }
}

/// Deep-merge returning a fresh value, leaving both inputs untouched.
pub fn merged(base: &Value, overlay: &Value) -> Value {
    let mut result = base.clone();
    deep_merge(&mut result, overlay);
    result
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn source_wins_on_leaf_conflict() {
        let mut dest = json!({ "power": 15, "channel": 36 });
        deep_merge(&mut dest, &json!({ "power": 20 }));
        assert_eq!(dest, json!({ "power": 20, "channel": 36 }));
    }

    #[test]
    fn nested_objects_recurse() {
        let mut dest = json!({ "band_5": { "power": 15, "bandwidth": 40 } });
        deep_merge(&mut dest, &json!({ "band_5": { "power": 20 } }));
        assert_eq!(dest, json!({ "band_5": { "power": 20, "bandwidth": 40 } }));
    }

    #[test]
    fn arrays_replace_atomically() {
        let mut dest = json!({ "dns": ["1.1.1.1", "8.8.8.8"] });
        deep_merge(&mut dest, &json!({ "dns": ["9.9.9.9"] }));
        assert_eq!(dest, json!({ "dns": ["9.9.9.9"] }));
    }

    #[test]
    fn object_replaces_scalar() {
        let mut dest = json!({ "x": 1 });
        deep_merge(&mut dest, &json!({ "x": { "y": 2 } }));
        assert_eq!(dest, json!({ "x": { "y": 2 } }));
    }

    #[test]
    fn associative_on_disjoint_domains() {
        let c = json!({ "base": true });
        let a = json!({ "alpha": { "x": 1 } });
        let b = json!({ "beta": 2 });

        let left = merged(&merged(&c, &a), &b);
        let right = merged(&c, &merged(&a, &b));
        assert_eq!(left, right);
    }
}
