// ── Schema-directed field decoding ──
//
// Vendor responses are heterogeneous JSON. Adapters read fields through
// this module instead of silently defaulting: a missing or wrong-typed
// optional field produces a warning and a zero value, an essential
// field produces a `FieldMapping` error. Either way the observation
// lands in the schema tracker through the adapter's `record` call, so
// drift is visible rather than swallowed.

use serde_json::Value;
use tracing::warn;

use crate::error::CoreError;
use crate::model::MacAddress;

/// A typed view over one vendor response object.
pub struct FieldReader<'a> {
    value: &'a Value,
    context: &'a str,
}

impl<'a> FieldReader<'a> {
    pub fn new(value: &'a Value, context: &'a str) -> Self {
        Self { value, context }
    }

    /// Essential string field: absent or mistyped is a hard error.
    pub fn require_str(&self, field: &str) -> Result<String, CoreError> {
        match self.value.get(field) {
            Some(Value::String(s)) => Ok(s.clone()),
            _ => Err(CoreError::FieldMapping {
                field: field.to_owned(),
                expected: "string",
                context: self.context.to_owned(),
            }),
        }
    }

    /// Optional string: empty on absence, warn on type mismatch.
    pub fn str(&self, field: &str) -> String {
        match self.value.get(field) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => {
                self.type_warning(field, "string", other);
                String::new()
            }
        }
    }

    pub fn opt_str(&self, field: &str) -> Option<String> {
        match self.value.get(field) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Null) | None => None,
            Some(other) => {
                self.type_warning(field, "string", other);
                None
            }
        }
    }

    pub fn bool(&self, field: &str) -> bool {
        match self.value.get(field) {
            Some(Value::Bool(b)) => *b,
            None | Some(Value::Null) => false,
            Some(other) => {
                self.type_warning(field, "boolean", other);
                false
            }
        }
    }

    pub fn u64(&self, field: &str) -> u64 {
        match self.value.get(field) {
            Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
            None | Some(Value::Null) => 0,
            Some(other) => {
                self.type_warning(field, "number", other);
                0
            }
        }
    }

    pub fn f64(&self, field: &str) -> f64 {
        match self.value.get(field) {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            None | Some(Value::Null) => 0.0,
            Some(other) => {
                self.type_warning(field, "number", other);
                0.0
            }
        }
    }

    pub fn opt_u16(&self, field: &str) -> Option<u16> {
        match self.value.get(field) {
            Some(Value::Number(n)) => n.as_u64().and_then(|v| u16::try_from(v).ok()),
            Some(Value::Null) | None => None,
            Some(other) => {
                self.type_warning(field, "number", other);
                None
            }
        }
    }

    /// Normalized MAC from any of the given field names.
    pub fn mac(&self, fields: &[&str]) -> MacAddress {
        for field in fields {
            let raw = self.str(field);
            if !raw.is_empty() {
                return MacAddress::normalize(&raw);
            }
        }
        MacAddress::default()
    }

    /// The raw sub-object at `field`, if present.
    pub fn object(&self, field: &str) -> Option<&'a Value> {
        self.value.get(field).filter(|v| v.is_object())
    }

    fn type_warning(&self, field: &str, expected: &str, got: &Value) {
        warn!(
            context = self.context,
            field,
            expected,
            got = json_type(got),
            "unexpected field type in API response"
        );
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn require_str_fails_on_wrong_type() {
        let value = json!({ "id": 42 });
        let reader = FieldReader::new(&value, "test");
        assert!(reader.require_str("id").is_err());
    }

    #[test]
    fn optional_fields_tolerate_mismatch() {
        let value = json!({ "name": 42, "count": "three" });
        let reader = FieldReader::new(&value, "test");
        assert_eq!(reader.str("name"), "");
        assert_eq!(reader.u64("count"), 0);
        assert_eq!(reader.opt_str("name"), None);
    }

    #[test]
    fn mac_tries_fields_in_order() {
        let value = json!({ "macAddress": "AA:BB:CC:DD:EE:FF" });
        let reader = FieldReader::new(&value, "test");
        let mac = reader.mac(&["mac", "macAddress"]);
        assert_eq!(mac.as_str(), "aabbccddeeff");
    }

    #[test]
    fn object_rejects_non_objects() {
        let value = json!({ "auth": { "type": "psk" }, "band": "5" });
        let reader = FieldReader::new(&value, "test");
        assert!(reader.object("auth").is_some());
        assert!(reader.object("band").is_none());
        assert!(reader.object("missing").is_none());
    }
}
