//! Settings loading from disk.

use std::fs;
use std::path::Path;

use crate::config::settings::StoreSettings;
use crate::config::validation::{validate_settings, ValidationError};

/// Error type for loading the binary's TOML settings file.
///
/// The persisted configuration tree reports through [`crate::config::ConfigError`]
/// and [`crate::store::StoreError`] instead.
#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::Io(e) => write!(f, "IO error: {}", e),
            SettingsError::Parse(e) => write!(f, "Parse error: {}", e),
            SettingsError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for SettingsError {}

/// Load and validate settings from a TOML file.
pub fn load_settings(path: &Path) -> Result<StoreSettings, SettingsError> {
    let content = fs::read_to_string(path).map_err(SettingsError::Io)?;
    parse_settings(&content)
}

/// Parse and validate settings from TOML text.
pub fn parse_settings(content: &str) -> Result<StoreSettings, SettingsError> {
    let settings: StoreSettings = toml::from_str(content).map_err(SettingsError::Parse)?;

    validate_settings(&settings).map_err(SettingsError::Validation)?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error() {
        let err = parse_settings("storage = [").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn test_validation_error_display() {
        let err = parse_settings("[logging]\nlevel = \"chatty\"").unwrap_err();
        assert!(err.to_string().starts_with("Validation failed: logging.level"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_settings(Path::new("does/not/exist.toml")).unwrap_err();
        assert!(matches!(err, SettingsError::Io(_)));
    }
}
