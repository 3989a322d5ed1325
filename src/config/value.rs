//! Typed, nullable setting slots.

use std::fmt;

use serde_json::Value;

use crate::config::container::ConfigContainer;
use crate::config::error::{ConfigError, ConfigResult};

/// The declared kind of a slot. Fixed for the lifetime of the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    Text,
    Container,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Text => "text",
            ValueKind::Container => "container",
        };
        f.write_str(name)
    }
}

/// A single settable slot. Primitive slots may hold `None` (null).
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Bool(Option<bool>),
    Int(Option<i64>),
    Float(Option<f64>),
    Text(Option<String>),
    Container(Box<ConfigContainer>),
}

impl ConfigValue {
    pub fn text(value: impl Into<String>) -> Self {
        ConfigValue::Text(Some(value.into()))
    }

    /// A null slot of the given primitive kind.
    ///
    /// Containers have no null form; asking for one yields an empty container.
    pub fn null(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Bool => ConfigValue::Bool(None),
            ValueKind::Int => ConfigValue::Int(None),
            ValueKind::Float => ConfigValue::Float(None),
            ValueKind::Text => ConfigValue::Text(None),
            ValueKind::Container => ConfigValue::Container(Box::default()),
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            ConfigValue::Bool(_) => ValueKind::Bool,
            ConfigValue::Int(_) => ValueKind::Int,
            ConfigValue::Float(_) => ValueKind::Float,
            ConfigValue::Text(_) => ValueKind::Text,
            ConfigValue::Container(_) => ValueKind::Container,
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            ConfigValue::Bool(v) => v.is_none(),
            ConfigValue::Int(v) => v.is_none(),
            ConfigValue::Float(v) => v.is_none(),
            ConfigValue::Text(v) => v.is_none(),
            ConfigValue::Container(_) => false,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(v) => *v,
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ConfigValue::Int(v) => *v,
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            ConfigValue::Float(v) => *v,
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ConfigValue::Text(v) => v.as_deref(),
            _ => None,
        }
    }

    pub fn as_container(&self) -> Option<&ConfigContainer> {
        match self {
            ConfigValue::Container(c) => Some(c.as_ref()),
            _ => None,
        }
    }

    pub fn as_container_mut(&mut self) -> Option<&mut ConfigContainer> {
        match self {
            ConfigValue::Container(c) => Some(c.as_mut()),
            _ => None,
        }
    }

    /// Parse user input into a slot of the given kind.
    ///
    /// `null` (any case) yields a null slot.
    pub fn parse(kind: ValueKind, input: &str) -> ConfigResult<Self> {
        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case("null") {
            return match kind {
                ValueKind::Container => Err(ConfigError::InvalidValue {
                    kind,
                    input: input.to_string(),
                }),
                _ => Ok(ConfigValue::null(kind)),
            };
        }

        let invalid = || ConfigError::InvalidValue {
            kind,
            input: input.to_string(),
        };

        match kind {
            ValueKind::Bool => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "on" | "yes" | "1" => Ok(ConfigValue::Bool(Some(true))),
                "false" | "off" | "no" | "0" => Ok(ConfigValue::Bool(Some(false))),
                _ => Err(invalid()),
            },
            ValueKind::Int => trimmed
                .parse()
                .map(|v| ConfigValue::Int(Some(v)))
                .map_err(|_| invalid()),
            ValueKind::Float => trimmed
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(|v| ConfigValue::Float(Some(v)))
                .ok_or_else(invalid),
            ValueKind::Text => Ok(ConfigValue::text(input)),
            ValueKind::Container => Err(invalid()),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            ConfigValue::Bool(v) => v.map(Value::Bool).unwrap_or(Value::Null),
            ConfigValue::Int(v) => v.map(Value::from).unwrap_or(Value::Null),
            ConfigValue::Float(v) => v
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            ConfigValue::Text(v) => v.clone().map(Value::String).unwrap_or(Value::Null),
            ConfigValue::Container(c) => Value::Object(c.to_json()),
        }
    }

    /// Apply a JSON node onto this slot without changing its kind.
    ///
    /// Returns `false` (leaving the slot untouched) when the node's type does
    /// not fit the slot. JSON `null` clears primitive slots.
    pub fn apply_json(&mut self, node: &Value) -> bool {
        match (self, node) {
            (ConfigValue::Container(c), Value::Object(map)) => {
                c.from_json(map);
                true
            }
            (ConfigValue::Container(_), _) => false,
            (slot, Value::Null) => {
                *slot = ConfigValue::null(slot.kind());
                true
            }
            (ConfigValue::Bool(v), Value::Bool(b)) => {
                *v = Some(*b);
                true
            }
            (ConfigValue::Int(v), Value::Number(n)) => match n.as_i64() {
                Some(i) => {
                    *v = Some(i);
                    true
                }
                None => false,
            },
            (ConfigValue::Float(v), Value::Number(n)) => match n.as_f64() {
                Some(f) => {
                    *v = Some(f);
                    true
                }
                None => false,
            },
            (ConfigValue::Text(v), Value::String(s)) => {
                *v = Some(s.clone());
                true
            }
            _ => false,
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(Some(value))
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Int(Some(value))
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        ConfigValue::Float(Some(value))
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::text(value)
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::Text(Some(value))
    }
}

impl From<ConfigContainer> for ConfigValue {
    fn from(value: ConfigContainer) -> Self {
        ConfigValue::Container(Box::new(value))
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Text(Some(s)) => f.write_str(s),
            ConfigValue::Container(c) => write!(f, "{}", Value::Object(c.to_json())),
            other => write!(f, "{}", other.to_json()),
        }
    }
}
