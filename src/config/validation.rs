//! Semantic validation of [`StoreSettings`].
//!
//! Serde handles syntax; this pass checks value ranges and formats and
//! reports every problem found, not just the first.

use std::fmt;

use crate::config::settings::StoreSettings;
use crate::locale::is_locale_tag;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in the settings file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate settings, collecting all errors.
pub fn validate_settings(settings: &StoreSettings) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if settings.storage.path.trim().is_empty() {
        errors.push(ValidationError {
            field: "storage.path",
            message: "must not be empty".to_string(),
        });
    }

    if !is_locale_tag(&settings.locale.fallback) {
        errors.push(ValidationError {
            field: "locale.fallback",
            message: format!("{:?} is not a locale tag like en_US", settings.locale.fallback),
        });
    }

    if !LOG_LEVELS.contains(&settings.logging.level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError {
            field: "logging.level",
            message: format!("unknown level {:?}", settings.logging.level),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_settings(&StoreSettings::default()).is_ok());
    }

    #[test]
    fn test_reports_all_errors() {
        let mut settings = StoreSettings::default();
        settings.storage.path = " ".to_string();
        settings.locale.fallback = "english".to_string();
        settings.logging.level = "loud".to_string();

        let errors = validate_settings(&settings).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["storage.path", "locale.fallback", "logging.level"]);
    }
}
