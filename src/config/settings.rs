//! Settings of the `config-store` binary itself.
//!
//! These describe where the store lives and how the process logs; they are
//! read from a TOML file and never diffed.

use serde::{Deserialize, Serialize};

use crate::locale::DEFAULT_LOCALE;

/// Root settings for the binary.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StoreSettings {
    /// Persisted configuration file.
    pub storage: StorageSettings,

    /// Translation lookup.
    pub locale: LocaleSettings,

    /// Log output.
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Path of the persisted JSON file.
    pub path: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            path: "config.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LocaleSettings {
    /// Directory holding `<tag>.json` translation documents.
    pub lang_dir: String,

    /// Locale used when the persisted file carries none.
    pub fallback: String,
}

impl Default for LocaleSettings {
    fn default() -> Self {
        Self {
            lang_dir: "lang".to_string(),
            fallback: DEFAULT_LOCALE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
