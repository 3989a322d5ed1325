//! Errors raised when mutating the configuration tree.

use thiserror::Error;

use crate::config::value::ValueKind;

/// Errors that can occur when addressing or assigning tree slots.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// No property with this name (or dotted path) exists.
    #[error("Unknown property: {0}")]
    UnknownProperty(String),

    /// The assigned value does not match the slot's declared kind.
    #[error("Type mismatch for {path}: expected {expected}, got {actual}")]
    TypeMismatch {
        path: String,
        expected: ValueKind,
        actual: ValueKind,
    },

    /// A textual value could not be parsed into the slot's kind.
    #[error("Invalid {kind} value: {input:?}")]
    InvalidValue { kind: ValueKind, input: String },

    /// Containers are structural and cannot be assigned or traversed as scalars.
    #[error("{0} is a container")]
    IsContainer(String),

    /// The path goes through a property that is not a container.
    #[error("{0} is not a container")]
    NotAContainer(String),

    /// The container does not declare a global state toggle.
    #[error("{0} has no global state")]
    NoGlobalState(String),
}

/// Result type for tree operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
