use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::shared::scan_config::ConfigError;

static RE_OVERLAY_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"ID-\w+").unwrap());
static RE_ID_PARAM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[?&]id=([^&#\s]+)").unwrap());

/// Displayable content for one identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayEntry {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Renderer hint, e.g. `molecule` or `solar`.
    #[serde(default)]
    pub kind: String,
}

impl OverlayEntry {
    fn preset(title: &str, description: &str, kind: &str) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            kind: kind.into(),
        }
    }
}

/// Resolves decoded payloads to overlay content.
#[derive(Debug, Clone)]
pub struct OverlayCatalog {
    entries: BTreeMap<String, OverlayEntry>,
}

impl Default for OverlayCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl OverlayCatalog {
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// The four presets shipped with the scanner.
    pub fn builtin() -> Self {
        let mut catalog = Self::empty();
        catalog.insert(
            "ID-1",
            OverlayEntry::preset(
                "Water Molecule (H\u{2082}O)",
                "Atomic structure: 2\u{d7}H bound to O (~104.5\u{b0} angle).",
                "molecule",
            ),
        );
        catalog.insert(
            "ID-2",
            OverlayEntry::preset(
                "Mini Solar System",
                "Sun and planets with orbital motion.",
                "solar",
            ),
        );
        catalog.insert(
            "ID-3",
            OverlayEntry::preset(
                "Pulsing Heart",
                "Simplified anatomy with heartbeat animation.",
                "heart",
            ),
        );
        catalog.insert(
            "ID-4",
            OverlayEntry::preset(
                "Truss Bridge",
                "Basic truss showing its members.",
                "bridge",
            ),
        );
        catalog
    }

    pub fn insert(&mut self, id: impl Into<String>, entry: OverlayEntry) {
        self.entries.insert(id.into(), entry);
    }

    /// Adds (or replaces) entries from a JSON object keyed by identifier.
    pub fn extend_from_json(&mut self, path: &Path) -> Result<usize, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let extra: BTreeMap<String, OverlayEntry> =
            serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let count = extra.len();
        self.entries.extend(extra);
        log::info!("Loaded {count} overlay entries from {}", path.display());
        Ok(count)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Known identifiers in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn get(&self, id: &str) -> Option<&OverlayEntry> {
        self.entries.get(id)
    }

    /// Normalises `payload` and looks the result up.
    pub fn resolve(&self, payload: &str) -> Option<(String, &OverlayEntry)> {
        let id = normalize_payload(payload);
        let entry = self.entries.get(&id)?;
        Some((id, entry))
    }
}

/// Extracts the overlay identifier from a raw payload.
///
/// Payloads are often URLs, so the first `ID-<word>` token wins anywhere in
/// the text; failing that an `id=` query parameter; failing that the
/// trimmed payload itself.
pub fn normalize_payload(payload: &str) -> String {
    if let Some(m) = RE_OVERLAY_ID.find(payload) {
        return m.as_str().to_string();
    }
    if let Some(caps) = RE_ID_PARAM.captures(payload) {
        return caps[1].to_string();
    }
    payload.trim().to_string()
}
