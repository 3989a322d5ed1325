//! Translation lookup.
//!
//! Translation documents are JSON objects stored as `<tag>.json` in a
//! language directory. Nested objects flatten into dotted keys
//! (`{"a": {"b": "x"}}` → `a.b`). The default locale is always loaded first
//! and the requested locale is layered on top, so keys missing from a
//! partial translation fall back to the default text.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;

/// Locale used when nothing else is configured.
pub const DEFAULT_LOCALE: &str = "en_US";

/// Whether `tag` looks like `ll_CC` (language, underscore, country).
pub fn is_locale_tag(tag: &str) -> bool {
    let bytes = tag.as_bytes();
    bytes.len() == 5
        && bytes[0].is_ascii_lowercase()
        && bytes[1].is_ascii_lowercase()
        && bytes[2] == b'_'
        && bytes[3].is_ascii_uppercase()
        && bytes[4].is_ascii_uppercase()
}

/// Errors raised while loading translations.
#[derive(Debug, Error)]
pub enum LocaleError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid translation document for {locale}: {source}")]
    Parse {
        locale: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("translation document for {0} is not a JSON object")]
    NotAnObject(String),
}

/// Raw translation document for one locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalePair {
    pub locale: String,
    pub content: String,
}

/// Flat key → text lookup.
#[derive(Debug, Clone, Default)]
pub struct LocaleStore {
    loaded_locale: Option<String>,
    translations: HashMap<String, String>,
}

impl LocaleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the default locale plus the closest match for `locale` from `dir`.
    pub fn load_from_dir(dir: &Path, locale: &str) -> Result<Self, LocaleError> {
        let mut store = Self::new();
        for pair in fetch_locales(dir, locale)? {
            store.load(&pair)?;
        }
        Ok(store)
    }

    /// Layer one document over the current translations.
    pub fn load(&mut self, pair: &LocalePair) -> Result<(), LocaleError> {
        let document: Value =
            serde_json::from_str(&pair.content).map_err(|source| LocaleError::Parse {
                locale: pair.locale.clone(),
                source,
            })?;
        let Value::Object(object) = document else {
            return Err(LocaleError::NotAnObject(pair.locale.clone()));
        };

        flatten(&object, "", &mut self.translations);
        self.loaded_locale = Some(pair.locale.clone());
        tracing::debug!(locale = %pair.locale, keys = self.translations.len(), "Translations loaded");
        Ok(())
    }

    /// The most recently layered locale.
    pub fn loaded_locale(&self) -> Option<&str> {
        self.loaded_locale.as_deref()
    }

    pub fn len(&self) -> usize {
        self.translations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.translations.is_empty()
    }

    /// Text for `key`, or the key itself when untranslated.
    pub fn get<'a>(&'a self, key: &'a str) -> &'a str {
        match self.translations.get(key) {
            Some(text) => text.as_str(),
            None => {
                tracing::debug!(key, "Missing translation");
                key
            }
        }
    }

    /// Text for `key` with every `{name}` placeholder replaced.
    pub fn format(&self, key: &str, args: &[(&str, &str)]) -> String {
        args.iter()
            .fold(self.get(key).to_string(), |text, (name, value)| {
                text.replace(&format!("{{{}}}", name), value)
            })
    }

    /// Sub-store holding the keys under `prefix.`, with the prefix removed.
    pub fn category(&self, prefix: &str) -> LocaleStore {
        let head = format!("{}.", prefix);
        LocaleStore {
            loaded_locale: self.loaded_locale.clone(),
            translations: self
                .translations
                .iter()
                .filter_map(|(k, v)| k.strip_prefix(&head).map(|rest| (rest.to_string(), v.clone())))
                .collect(),
        }
    }
}

/// Documents to load for `locale`: the default first, then the closest match.
pub fn fetch_locales(dir: &Path, locale: &str) -> Result<Vec<LocalePair>, LocaleError> {
    let mut pairs = vec![read_pair(dir, DEFAULT_LOCALE)?];
    if locale == DEFAULT_LOCALE {
        return Ok(pairs);
    }

    let compatible = available_locales(dir)?
        .into_iter()
        .find(|tag| tag.starts_with(locale) || locale.starts_with(tag.as_str()));

    match compatible {
        Some(tag) if tag != DEFAULT_LOCALE => pairs.push(read_pair(dir, &tag)?),
        Some(_) => {}
        None => tracing::warn!(locale, "No translation available, using default locale"),
    }
    Ok(pairs)
}

/// Locale tags of the `*.json` documents in `dir`, sorted.
pub fn available_locales(dir: &Path) -> Result<Vec<String>, LocaleError> {
    let entries = fs::read_dir(dir).map_err(|source| LocaleError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut tags: Vec<String> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .filter_map(|path| {
            let stem = path.file_stem()?.to_str()?;
            stem.get(..5).filter(|tag| is_locale_tag(tag)).map(str::to_string)
        })
        .collect();
    tags.sort();
    tags.dedup();
    Ok(tags)
}

fn read_pair(dir: &Path, locale: &str) -> Result<LocalePair, LocaleError> {
    let path = dir.join(format!("{}.json", locale));
    let content = fs::read_to_string(&path).map_err(|source| LocaleError::Io { path, source })?;
    Ok(LocalePair {
        locale: locale.to_string(),
        content,
    })
}

fn flatten(object: &Map<String, Value>, prefix: &str, out: &mut HashMap<String, String>) {
    for (key, value) in object {
        let full = format!("{}{}", prefix, key);
        match value {
            Value::String(text) => {
                out.insert(full, text.clone());
            }
            Value::Number(n) => {
                out.insert(full, n.to_string());
            }
            Value::Bool(b) => {
                out.insert(full, b.to_string());
            }
            Value::Object(child) => flatten(child, &format!("{}.", full), out),
            Value::Null | Value::Array(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, tag: &str, content: &str) {
        fs::write(dir.join(format!("{}.json", tag)), content).unwrap();
    }

    fn lang_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "en_US",
            r#"{"greeting": "Hello {name}", "menu": {"open": "Open", "count": 3}, "only_default": "Default"}"#,
        );
        write(dir.path(), "fr_FR", r#"{"greeting": "Bonjour {name}", "menu": {"open": "Ouvrir"}}"#);
        dir
    }

    #[test]
    fn test_locale_tag() {
        assert!(is_locale_tag("en_US"));
        assert!(!is_locale_tag("en-US"));
        assert!(!is_locale_tag("EN_us"));
        assert!(!is_locale_tag("en_USA"));
    }

    #[test]
    fn test_layered_lookup() {
        let dir = lang_dir();
        let store = LocaleStore::load_from_dir(dir.path(), "fr").unwrap();

        assert_eq!(store.loaded_locale(), Some("fr_FR"));
        assert_eq!(store.get("menu.open"), "Ouvrir");
        assert_eq!(store.get("menu.count"), "3");
        assert_eq!(store.get("only_default"), "Default");
        assert_eq!(store.get("missing.key"), "missing.key");
    }

    #[test]
    fn test_unknown_locale_uses_default() {
        let dir = lang_dir();
        let store = LocaleStore::load_from_dir(dir.path(), "de_DE").unwrap();
        assert_eq!(store.loaded_locale(), Some("en_US"));
        assert_eq!(store.get("menu.open"), "Open");
    }

    #[test]
    fn test_format_replaces_all_occurrences() {
        let mut store = LocaleStore::new();
        store
            .load(&LocalePair {
                locale: "en_US".into(),
                content: r#"{"twice": "{x} and {x}, not {y}"}"#.into(),
            })
            .unwrap();
        assert_eq!(store.format("twice", &[("x", "1")]), "1 and 1, not {y}");
    }

    #[test]
    fn test_category() {
        let dir = lang_dir();
        let menu = LocaleStore::load_from_dir(dir.path(), DEFAULT_LOCALE)
            .unwrap()
            .category("menu");
        assert_eq!(menu.len(), 2);
        assert_eq!(menu.get("open"), "Open");
    }

    #[test]
    fn test_available_locales() {
        let dir = lang_dir();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        assert_eq!(available_locales(dir.path()).unwrap(), vec!["en_US", "fr_FR"]);
    }

    #[test]
    fn test_invalid_document() {
        let mut store = LocaleStore::new();
        let err = store
            .load(&LocalePair {
                locale: "en_US".into(),
                content: "[]".into(),
            })
            .unwrap_err();
        assert!(matches!(err, LocaleError::NotAnObject(_)));
    }
}
