// ── Normalized MAC address ──
//
// Every MAC-keyed map in the cache and accessor uses this form:
// lowercase, separator-free. Inputs with colons, dashes, or dots all
// normalize to the same key, so lookups never miss on formatting.

use serde::{Deserialize, Serialize};

/// A MAC address in normalized form: lowercase hex, no separators.
///
/// Normalization is idempotent -- normalizing an already-normalized MAC
/// is a no-op, and the empty string stays empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct MacAddress(String);

impl MacAddress {
    /// Normalize any textual MAC form: strip `:`, `-`, `.` and
    /// whitespace, lowercase the rest.
    pub fn normalize(input: &str) -> Self {
        let cleaned: String = input
            .chars()
            .filter(|c| !matches!(c, ':' | '-' | '.') && !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect();
        Self(cleaned)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Render with colon separators for display (`aa:bb:cc:dd:ee:ff`).
    /// Falls back to the raw form when the length isn't 12 hex digits.
    pub fn display(&self) -> String {
        if self.0.len() != 12 {
            return self.0.clone();
        }
        self.0
            .as_bytes()
            .chunks(2)
            .map(|pair| std::str::from_utf8(pair).unwrap_or_default())
            .collect::<Vec<_>>()
            .join(":")
    }
}

impl std::fmt::Display for MacAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MacAddress {
    fn from(s: &str) -> Self {
        Self::normalize(s)
    }
}
