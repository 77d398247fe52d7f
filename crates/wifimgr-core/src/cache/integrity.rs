// ── Cache integrity sidecar ──
//
// Each cache file gets a hidden companion (`.{label}.json.meta`)
// holding its SHA-256, size, and timestamps. Verified on load to detect
// out-of-band modification; a mismatch is a warning, not a refusal --
// the caller decides whether to keep or discard the cache.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::CoreError;

/// Sidecar format version, independent of the cache document version.
pub const SIDECAR_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegritySidecar {
    pub file_name: String,
    pub file_type: String,
    pub size_bytes: u64,
    pub sha256: String,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub version: u32,
}

/// Outcome of checking cache contents against the sidecar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SidecarCheck {
    /// No sidecar next to the cache file.
    Missing,
    /// Hash and size match.
    Valid,
    /// Contents differ from what the sidecar recorded.
    Mismatch { expected: String, actual: String },
}

/// `apis/<label>.json` → `apis/.<label>.json.meta`.
pub fn sidecar_path(cache_path: &Path) -> PathBuf {
    let file_name = cache_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    cache_path.with_file_name(format!(".{file_name}.meta"))
}

fn hash_hex(contents: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(contents);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Compute and write the sidecar for freshly-written cache contents.
///
/// `created_at` is preserved from an existing sidecar if one is present.
pub fn write_sidecar(cache_path: &Path, contents: &[u8]) -> Result<(), CoreError> {
    let path = sidecar_path(cache_path);
    let now = Utc::now();

    let created_at = std::fs::read_to_string(&path)
        .ok()
        .and_then(|raw| serde_json::from_str::<IntegritySidecar>(&raw).ok())
        .map_or(now, |existing| existing.created_at);

    let sidecar = IntegritySidecar {
        file_name: cache_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        file_type: "api_cache".into(),
        size_bytes: contents.len() as u64,
        sha256: hash_hex(contents),
        created_at,
        last_modified: now,
        version: SIDECAR_VERSION,
    };

    std::fs::write(&path, serde_json::to_string_pretty(&sidecar)?)?;
    Ok(())
}

/// Verify cache contents against the sidecar, if one exists.
pub fn verify_sidecar(cache_path: &Path, contents: &[u8]) -> SidecarCheck {
    let path = sidecar_path(cache_path);
    let Ok(raw) = std::fs::read_to_string(&path) else {
        return SidecarCheck::Missing;
    };
    let Ok(sidecar) = serde_json::from_str::<IntegritySidecar>(&raw) else {
        return SidecarCheck::Mismatch {
            expected: "<unreadable sidecar>".into(),
            actual: hash_hex(contents),
        };
    };

    let actual = hash_hex(contents);
    if sidecar.sha256 == actual && sidecar.size_bytes == contents.len() as u64 {
        SidecarCheck::Valid
    } else {
        SidecarCheck::Mismatch {
            expected: sidecar.sha256,
            actual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sidecar_path_is_hidden_sibling() {
        let path = sidecar_path(Path::new("/tmp/cache/apis/mist-lab.json"));
        assert_eq!(path, Path::new("/tmp/cache/apis/.mist-lab.json.meta"));
    }

    #[test]
    fn round_trip_verifies() {
        let dir = tempfile::tempdir().unwrap();
        let cache_path = dir.path().join("mist-lab.json");
        let contents = br#"{"version":1}"#;

        std::fs::write(&cache_path, contents).unwrap();
        write_sidecar(&cache_path, contents).unwrap();

        assert_eq!(verify_sidecar(&cache_path, contents), SidecarCheck::Valid);
    }

    #[test]
    fn modified_contents_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let cache_path = dir.path().join("mist-lab.json");
        let contents = br#"{"version":1}"#;

        std::fs::write(&cache_path, contents).unwrap();
        write_sidecar(&cache_path, contents).unwrap();

        let tampered = br#"{"version":1,"x":2}"#;
        assert!(matches!(
            verify_sidecar(&cache_path, tampered),
            SidecarCheck::Mismatch { .. }
        ));
    }

    #[test]
    fn absent_sidecar_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let cache_path = dir.path().join("mist-lab.json");
        assert_eq!(verify_sidecar(&cache_path, b"{}"), SidecarCheck::Missing);
    }

    #[test]
    fn created_at_survives_rewrites() {
        let dir = tempfile::tempdir().unwrap();
        let cache_path = dir.path().join("mist-lab.json");

        write_sidecar(&cache_path, b"one").unwrap();
        let first: IntegritySidecar = serde_json::from_str(
            &std::fs::read_to_string(sidecar_path(&cache_path)).unwrap(),
        )
        .unwrap();

        write_sidecar(&cache_path, b"two").unwrap();
        let second: IntegritySidecar = serde_json::from_str(
            &std::fs::read_to_string(sidecar_path(&cache_path)).unwrap(),
        )
        .unwrap();

        assert_eq!(first.created_at, second.created_at);
        assert_ne!(first.sha256, second.sha256);
    }
}
