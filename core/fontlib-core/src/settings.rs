//! Library settings persisted as one flat JSON object (made by fontlib)

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::parse::effective_subsets;
use crate::store::write_json_atomic;

static TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("space regex"));

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// The user has consented to loading previews from Google's servers.
    #[serde(default)]
    pub google_gdpr: bool,
    #[serde(default)]
    pub preferred_subset: Vec<String>,
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

impl Settings {
    /// Build settings from untrusted input, coercing every known key.
    pub fn sanitize(raw: &Map<String, Value>) -> Self {
        let mut settings = Settings::default();

        for (key, value) in raw {
            match key.as_str() {
                "google_gdpr" => settings.google_gdpr = truthy(value),
                "preferred_subset" => {
                    settings.preferred_subset = match value {
                        Value::Array(items) => items
                            .iter()
                            .map(|v| sanitize_text(&value_text(v)))
                            .filter(|s| !s.is_empty())
                            .collect(),
                        other => vec![sanitize_text(&value_text(other))],
                    };
                }
                _ => {
                    settings
                        .other
                        .insert(key.clone(), Value::String(sanitize_text(&value_text(value))));
                }
            }
        }

        settings
    }

    /// Subsets kept by the stylesheet parser.
    pub fn allowed_subsets(&self) -> Vec<String> {
        effective_subsets(&self.preferred_subset)
    }
}

/// Settings file with whole-object load and save.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings; a missing file means defaults.
    pub fn load(&self) -> Result<Settings> {
        match fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| Error::Settings {
                path: self.path.clone(),
                source,
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Settings::default()),
            Err(err) => Err(Error::read(&self.path, err)),
        }
    }

    /// Persist `settings`; returns `false` when they equal what is stored.
    pub fn save(&self, settings: &Settings) -> Result<bool> {
        if self.path.exists() && self.load()? == *settings {
            return Ok(false);
        }

        write_json_atomic(&self.path, settings)?;
        Ok(true)
    }
}

/// Strip markup and collapse whitespace, like a single-line form field.
pub fn sanitize_text(raw: &str) -> String {
    let stripped = TAGS.replace_all(raw, "");
    WHITESPACE.replace_all(&stripped, " ").trim().to_string()
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => String::new(),
        other => other.to_string(),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn sanitizes_known_and_free_form_keys() {
        let raw = object(json!({
            "google_gdpr": "1",
            "preferred_subset": " latin-ext ",
            "note": "<b>hello</b>\n  world"
        }));
        let settings = Settings::sanitize(&raw);

        assert!(settings.google_gdpr);
        assert_eq!(settings.preferred_subset, vec!["latin-ext"]);
        assert_eq!(settings.other["note"], json!("hello world"));
    }

    #[test]
    fn subset_lists_are_accepted() {
        let raw = object(json!({"preferred_subset": ["latin", "greek", ""]}));
        let settings = Settings::sanitize(&raw);
        assert_eq!(settings.preferred_subset, vec!["latin", "greek"]);
        assert!(!settings.google_gdpr);
    }

    #[test]
    fn allowed_subsets_default_to_latin() {
        assert_eq!(Settings::default().allowed_subsets(), vec!["latin"]);
    }

    #[test]
    fn save_reports_unchanged_settings() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = SettingsStore::new(tmp.path().join("settings.json"));
        assert_eq!(store.load().expect("load"), Settings::default());

        let settings = Settings::sanitize(&object(json!({"google_gdpr": true, "theme": "dark"})));
        assert!(store.save(&settings).expect("first save"));
        assert!(!store.save(&settings).expect("second save"));
        assert_eq!(store.load().expect("reload"), settings);
    }
}
