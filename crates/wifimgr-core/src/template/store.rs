// ── Local template store ──
//
// Operator-authored template files: radio profiles, WLAN definitions,
// and device templates, each a named raw config object. Loaded once at
// startup; read-only afterward, so no locking. Reads hand out deep
// copies -- expansion must never mutate the store.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::CoreError;

/// Template file format version this build understands.
pub const TEMPLATE_FILE_VERSION: u32 = 1;

#[derive(Debug, Deserialize)]
struct TemplateFile {
    version: u32,
    #[serde(default)]
    radio_templates: BTreeMap<String, Value>,
    #[serde(default)]
    wlan_templates: BTreeMap<String, Value>,
    #[serde(default)]
    device_templates: BTreeMap<String, Value>,
}

/// In-memory template collections keyed by name.
#[derive(Debug, Default)]
pub struct TemplateStore {
    radio: BTreeMap<String, Value>,
    wlan: BTreeMap<String, Value>,
    device: BTreeMap<String, Value>,
}

impl TemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load one or more template files, in order. A name defined in two
    /// files takes the later definition (last writer wins, with a
    /// warning).
    pub fn load_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self, CoreError> {
        let mut store = Self::new();
        for path in paths {
            store.load_file(path.as_ref())?;
        }
        Ok(store)
    }

    pub fn load_file(&mut self, path: &Path) -> Result<(), CoreError> {
        let raw = std::fs::read_to_string(path)?;
        let file: TemplateFile = serde_json::from_str(&raw)?;

        if file.version != TEMPLATE_FILE_VERSION {
            return Err(CoreError::validation(format!(
                "template file {} has unsupported version {} (expected {TEMPLATE_FILE_VERSION})",
                path.display(),
                file.version
            )));
        }

        let file_name = path.display().to_string();
        merge_named(&mut self.radio, file.radio_templates, "radio", &file_name);
        merge_named(&mut self.wlan, file.wlan_templates, "wlan", &file_name);
        merge_named(&mut self.device, file.device_templates, "device", &file_name);

        debug!(
            file = %file_name,
            radio = self.radio.len(),
            wlan = self.wlan.len(),
            device = self.device.len(),
            "template file loaded"
        );
        Ok(())
    }

    // Reads return clones: the store is the single source and callers
    // merge into their copies freely.

    pub fn radio(&self, name: &str) -> Option<Value> {
        self.radio.get(name).cloned()
    }

    pub fn wlan(&self, name: &str) -> Option<Value> {
        self.wlan.get(name).cloned()
    }

    pub fn device(&self, name: &str) -> Option<Value> {
        self.device.get(name).cloned()
    }

    pub fn radio_names(&self) -> Vec<String> {
        self.radio.keys().cloned().collect()
    }

    pub fn wlan_names(&self) -> Vec<String> {
        self.wlan.keys().cloned().collect()
    }

    pub fn device_names(&self) -> Vec<String> {
        self.device.keys().cloned().collect()
    }
}

fn merge_named(
    dest: &mut BTreeMap<String, Value>,
    src: BTreeMap<String, Value>,
    kind: &str,
    file: &str,
) {
    for (name, value) in src {
        if dest.contains_key(&name) {
            warn!(template = %name, kind, file, "duplicate template name, later file wins");
        }
        dest.insert(name, value);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &Value) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, serde_json::to_string_pretty(content).unwrap()).unwrap();
        path
    }

    #[test]
    fn loads_and_reads_templates() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "templates.json",
            &json!({
                "version": 1,
                "radio_templates": {
                    "high-density": { "band_5": { "power": 15, "bandwidth": 40 } }
                },
                "wlan_templates": { "corp": { "ssid": "corp", "vlan_id": 20 } },
            }),
        );

        let store = TemplateStore::load_files(&[path]).unwrap();
        assert!(store.radio("high-density").is_some());
        assert!(store.wlan("corp").is_some());
        assert!(store.device("nope").is_none());
    }

    #[test]
    fn later_file_wins_on_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_file(
            &dir,
            "a.json",
            &json!({
                "version": 1,
                "radio_templates": { "hd": { "band_5": { "power": 10 } } },
            }),
        );
        let second = write_file(
            &dir,
            "b.json",
            &json!({
                "version": 1,
                "radio_templates": { "hd": { "band_5": { "power": 20 } } },
            }),
        );

        let store = TemplateStore::load_files(&[first, second]).unwrap();
        assert_eq!(store.radio("hd").unwrap()["band_5"]["power"], 20);
    }

    #[test]
    fn wrong_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "bad.json", &json!({ "version": 2 }));
        assert!(TemplateStore::load_files(&[path]).is_err());
    }

    #[test]
    fn reads_are_copies() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "t.json",
            &json!({
                "version": 1,
                "radio_templates": { "hd": { "band_5": { "power": 10 } } },
            }),
        );
        let store = TemplateStore::load_files(&[path]).unwrap();

        let mut copy = store.radio("hd").unwrap();
        copy["band_5"]["power"] = json!(99);
        assert_eq!(store.radio("hd").unwrap()["band_5"]["power"], 10);
    }
}
