// ── API response schema tracker ──
//
// Observes every decoded API response map and accumulates, per
// `(vendor, device_type)`, which fields appear, with what JSON type,
// and how often. Consumers compare snapshots across runs to detect
// vendor-side schema drift; the tracker itself implements no policy.
//
// Frequency update is incremental: with n prior samples and frequency
// f, observing a field gives f' = (n·f + 1)/(n+1), missing it gives
// f' = n·f/(n+1). Fields below 1.0 are optional.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::model::Vendor;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldInfo {
    /// JSON type name; "mixed" once conflicting types were seen.
    pub field_type: String,
    /// Fraction of samples in which the field appeared.
    pub frequency: f64,
}

impl FieldInfo {
    pub fn is_optional(&self) -> bool {
        self.frequency < 1.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SchemaSnapshot {
    pub sample_count: u64,
    /// Dotted field paths, recursively walked through nested objects.
    pub fields: BTreeMap<String, FieldInfo>,
}

/// Thread-safe accumulator of schema snapshots.
#[derive(Debug, Default)]
pub struct SchemaTracker {
    snapshots: RwLock<BTreeMap<String, SchemaSnapshot>>,
}

impl SchemaTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one response map for `(vendor, device_type)`.
    pub fn record(&self, vendor: Vendor, device_type: &str, response: &Value) {
        let Some(obj) = response.as_object() else {
            return;
        };

        let mut observed = BTreeMap::new();
        collect_fields(obj, &mut String::new(), &mut observed);

        let key = snapshot_key(vendor, device_type);
        let mut snapshots = match self.snapshots.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let snapshot = snapshots.entry(key).or_default();
        let n = snapshot.sample_count as f64;

        // Decay fields absent from this sample.
        for (path, info) in &mut snapshot.fields {
            if !observed.contains_key(path) {
                info.frequency = (n * info.frequency) / (n + 1.0);
            }
        }

        for (path, observed_type) in observed {
            match snapshot.fields.get_mut(&path) {
                Some(info) => {
                    info.frequency = (n * info.frequency + 1.0) / (n + 1.0);
                    if info.field_type != observed_type && info.field_type != "mixed" {
                        warn!(
                            vendor = %vendor,
                            device_type,
                            field = %path,
                            was = %info.field_type,
                            now = %observed_type,
                            "field type drift observed"
                        );
                        info.field_type = "mixed".into();
                    }
                }
                None => {
                    snapshot.fields.insert(
                        path,
                        FieldInfo {
                            field_type: observed_type,
                            frequency: 1.0 / (n + 1.0),
                        },
                    );
                }
            }
        }

        snapshot.sample_count += 1;
    }

    pub fn snapshot(&self, vendor: Vendor, device_type: &str) -> Option<SchemaSnapshot> {
        let snapshots = match self.snapshots.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        snapshots.get(&snapshot_key(vendor, device_type)).cloned()
    }

    /// Serialize all snapshots to a single JSON file.
    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        let snapshots = match self.snapshots.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let json = serde_json::to_string_pretty(&*snapshots)?;
        std::fs::write(path, json)?;
        debug!(path = %path.display(), keys = snapshots.len(), "schema snapshots saved");
        Ok(())
    }

    /// Load snapshots, replacing the in-memory state.
    pub fn load(&self, path: &Path) -> Result<(), CoreError> {
        let raw = std::fs::read_to_string(path)?;
        let loaded: BTreeMap<String, SchemaSnapshot> = serde_json::from_str(&raw)?;
        let mut snapshots = match self.snapshots.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *snapshots = loaded;
        Ok(())
    }
}

fn snapshot_key(vendor: Vendor, device_type: &str) -> String {
    format!("{}:{device_type}", vendor.as_tag())
}

fn collect_fields(
    obj: &serde_json::Map<String, Value>,
    prefix: &mut String,
    out: &mut BTreeMap<String, String>,
) {
    for (key, value) in obj {
        let saved_len = prefix.len();
        if !prefix.is_empty() {
            prefix.push('.');
        }
        prefix.push_str(key);

        if let Value::Object(nested) = value {
            collect_fields(nested, prefix, out);
        } else {
            out.insert(prefix.clone(), json_type_name(value).to_owned());
        }

        prefix.truncate(saved_len);
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
