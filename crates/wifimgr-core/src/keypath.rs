// ── Dot-notation key paths with wildcards ──
//
// Used by managed-keys filtering: a configured list of dot-paths
// designates which leaves of a device's configuration this tool is
// authoritative for. `*` matches exactly one segment; a wildcard as the
// last segment is invalid (it would designate nothing concrete), and
// empty segments are invalid.

use serde_json::{Map, Value};

use crate::error::CoreError;

/// One parsed path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Wildcard,
}

/// Parse a dot-notation path. Rejects empty segments and a trailing
/// wildcard. A leading wildcard (`*.foo`) is accepted and expands
/// against every top-level key.
pub fn parse_path(path: &str) -> Result<Vec<Segment>, CoreError> {
    if path.is_empty() {
        return Err(CoreError::validation("key path must not be empty"));
    }
    let segments: Vec<Segment> = path
        .split('.')
        .map(|s| match s {
            "" => Err(CoreError::validation(format!(
                "key path '{path}' contains an empty segment"
            ))),
            "*" => Ok(Segment::Wildcard),
            key => Ok(Segment::Key(key.to_owned())),
        })
        .collect::<Result<_, _>>()?;

    if matches!(segments.last(), Some(Segment::Wildcard)) {
        return Err(CoreError::validation(format!(
            "key path '{path}' must not end with a wildcard"
        )));
    }
    Ok(segments)
}

/// Fetch the value at a concrete (wildcard-free) path.
pub fn get_path<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = data;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Set the value at a concrete path, creating intermediate objects.
///
/// Fails if an intermediate position is occupied by a non-object value.
pub fn set_path(data: &mut Value, path: &str, value: Value) -> Result<(), CoreError> {
    let segments = parse_path(path)?;
    if segments.iter().any(|s| *s == Segment::Wildcard) {
        return Err(CoreError::validation(format!(
            "cannot set through wildcard path '{path}'"
        )));
    }

    let mut current = data;
    for (i, segment) in segments.iter().enumerate() {
        let Segment::Key(key) = segment else {
            unreachable!("wildcards rejected above");
        };
        if i == segments.len() - 1 {
            let Some(obj) = current.as_object_mut() else {
                return Err(CoreError::validation(format!(
                    "cannot set '{path}': parent is not an object"
                )));
            };
            obj.insert(key.clone(), value);
            return Ok(());
        }
        let Some(obj) = current.as_object_mut() else {
            return Err(CoreError::validation(format!(
                "cannot set '{path}': '{key}' sits under a non-object"
            )));
        };
        current = obj
            .entry(key.clone())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    Ok(())
}

/// Expand a wildcard path against actual data, yielding every concrete
/// dotted path that exists.
///
/// A path without wildcards yields itself iff it exists, otherwise
/// nothing.
pub fn expand_wildcard_path(data: &Value, path: &str) -> Result<Vec<String>, CoreError> {
    let segments = parse_path(path)?;
    let mut matches = Vec::new();
    expand_into(data, &segments, &mut Vec::new(), &mut matches);
    Ok(matches)
}

fn expand_into(
    data: &Value,
    remaining: &[Segment],
    prefix: &mut Vec<String>,
    out: &mut Vec<String>,
) {
    let Some((head, tail)) = remaining.split_first() else {
        out.push(prefix.join("."));
        return;
    };
    let Some(obj) = data.as_object() else {
        return;
    };

    match head {
        Segment::Key(key) => {
            if let Some(child) = obj.get(key) {
                prefix.push(key.clone());
                expand_into(child, tail, prefix, out);
                prefix.pop();
            }
        }
        Segment::Wildcard => {
            for (key, child) in obj {
                prefix.push(key.clone());
                expand_into(child, tail, prefix, out);
                prefix.pop();
            }
        }
    }
}

/// Whether `key` is designated by the managed-keys list: directly
/// listed, a descendant of a listed key, or matched by a listed
/// wildcard pattern (descendants of a wildcard match included).
pub fn is_key_managed(key: &str, managed_keys: &[String]) -> bool {
    let key_segments: Vec<&str> = key.split('.').collect();

    managed_keys.iter().any(|pattern| {
        let pattern_segments: Vec<&str> = pattern.split('.').collect();
        if pattern_segments.len() > key_segments.len() {
            return false;
        }
        pattern_segments
            .iter()
            .zip(&key_segments)
            .all(|(p, k)| *p == "*" || p == k)
    })
}

/// Reduce a config map to only the leaves designated by the managed-keys
/// list. Unmanaged leaves are dropped; empty objects left behind by the
/// filtering are dropped too.
pub fn filter_managed(data: &Value, managed_keys: &[String]) -> Value {
    fn walk(value: &Value, path: &mut Vec<String>, managed: &[String]) -> Option<Value> {
        match value {
            Value::Object(obj) => {
                let mut kept = Map::new();
                for (key, child) in obj {
                    path.push(key.clone());
                    if let Some(v) = walk(child, path, managed) {
                        kept.insert(key.clone(), v);
                    }
                    path.pop();
                }
                (!kept.is_empty()).then_some(Value::Object(kept))
            }
            leaf => {
                let joined = path.join(".");
                is_key_managed(&joined, managed).then(|| leaf.clone())
            }
        }
    }

    walk(data, &mut Vec::new(), managed_keys).unwrap_or_else(|| Value::Object(Map::new()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parse_rejects_bad_paths() {
        assert!(parse_path("").is_err());
        assert!(parse_path("a..b").is_err());
        assert!(parse_path("a.b.*").is_err());
        assert!(parse_path("a.*.c").is_ok());
        assert!(parse_path("*.c").is_ok());
    }

    #[test]
    fn get_set_round_trip() {
        let mut data = json!({});
        set_path(&mut data, "radio_config.band_5.power", json!(17)).unwrap();
        assert_eq!(
            get_path(&data, "radio_config.band_5.power"),
            Some(&json!(17))
        );
    }

    #[test]
    fn set_through_scalar_fails() {
        let mut data = json!({ "a": 1 });
        assert!(set_path(&mut data, "a.b", json!(2)).is_err());
    }

    #[test]
    fn expand_without_wildcard_checks_existence() {
        let data = json!({ "a": { "b": 1 } });
        assert_eq!(
            expand_wildcard_path(&data, "a.b").unwrap(),
            vec!["a.b".to_owned()]
        );
        assert!(expand_wildcard_path(&data, "a.c").unwrap().is_empty());
    }

    #[test]
    fn expand_wildcard_in_middle() {
        let data = json!({
            "radio_config": {
                "band_24": { "power": 10 },
                "band_5": { "power": 17 },
                "band_6": { "channel": 37 },
            }
        });
        let mut found = expand_wildcard_path(&data, "radio_config.*.power").unwrap();
        found.sort();
        assert_eq!(found, vec!["radio_config.band_24.power", "radio_config.band_5.power"]);
    }

    #[test]
    fn expand_wildcard_at_position_zero() {
        let data = json!({
            "ap1": { "name": "a" },
            "ap2": { "name": "b" },
            "meta": 3,
        });
        let mut found = expand_wildcard_path(&data, "*.name").unwrap();
        found.sort();
        assert_eq!(found, vec!["ap1.name", "ap2.name"]);
    }

    #[test]
    fn managed_key_rules() {
        let managed = vec![
            "name".to_owned(),
            "radio_config".to_owned(),
            "port_config.*.vlan_id".to_owned(),
        ];

        // Directly listed.
        assert!(is_key_managed("name", &managed));
        // Prefix-descendant of a listed key.
        assert!(is_key_managed("radio_config.band_5.power", &managed));
        // Wildcard pattern.
        assert!(is_key_managed("port_config.eth0.vlan_id", &managed));
        // Not designated.
        assert!(!is_key_managed("notes", &managed));
        assert!(!is_key_managed("port_config.eth0.usage", &managed));
    }

    #[test]
    fn filter_keeps_only_managed_leaves() {
        let managed = vec!["radio_config".to_owned(), "name".to_owned()];
        let data = json!({
            "name": "lobby-ap",
            "notes": "do not touch",
            "radio_config": { "band_5": { "power": 17 } },
        });

        let filtered = filter_managed(&data, &managed);
        assert_eq!(
            filtered,
            json!({
                "name": "lobby-ap",
                "radio_config": { "band_5": { "power": 17 } },
            })
        );
    }
}
