//! Ordered property containers forming the configuration tree.
//!
//! # Serialization
//! A container maps to a JSON object whose keys are property names. Nested
//! containers become nested objects; null slots are written as JSON `null`.
//! A container that declares a global state writes it under
//! [`GLOBAL_STATE_KEY`].
//!
//! Reading is tolerant: missing keys keep their current value, nodes whose
//! type does not fit the declared slot are skipped, unknown keys are ignored.
//! Persisted files may predate the in-memory schema.

use serde_json::{Map, Value};

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::flags::ConfigFlags;
use crate::config::value::{ConfigValue, ValueKind};

/// Reserved key holding a container's global state in its JSON object.
pub const GLOBAL_STATE_KEY: &str = "_global_state";

/// Name and flags of a property. Names are declared by the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyKey {
    pub name: &'static str,
    pub flags: ConfigFlags,
}

impl PropertyKey {
    pub const fn new(name: &'static str, flags: ConfigFlags) -> Self {
        Self { name, flags }
    }
}

/// A named, flag-annotated slot.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigProperty {
    pub key: PropertyKey,
    pub value: ConfigValue,
}

impl ConfigProperty {
    pub fn name(&self) -> &'static str {
        self.key.name
    }
}

/// An ordered group of properties, possibly mounted inside a parent.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigContainer {
    properties: Vec<ConfigProperty>,
    /// Flags of the key this container is mounted under in its parent.
    mount_flags: ConfigFlags,
    has_global_state: bool,
    global_state: Option<bool>,
}

impl ConfigContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a container-wide toggle with the given default.
    pub fn with_global_state(mut self, default: Option<bool>) -> Self {
        self.has_global_state = true;
        self.global_state = default;
        self
    }

    /// Builder form of [`ConfigContainer::insert`].
    pub fn property(
        mut self,
        name: &'static str,
        flags: ConfigFlags,
        value: impl Into<ConfigValue>,
    ) -> Self {
        self.insert(PropertyKey::new(name, flags), value.into());
        self
    }

    /// Mount `child` under `name`; `flags` become the child's mount flags.
    pub fn container(self, name: &'static str, flags: ConfigFlags, child: ConfigContainer) -> Self {
        self.property(name, flags, child)
    }

    /// Insert a property, replacing any existing one of the same name in place.
    ///
    /// A non-finite float default has no JSON form and is declared as null.
    pub fn insert(&mut self, key: PropertyKey, mut value: ConfigValue) {
        match &mut value {
            ConfigValue::Container(child) => child.mount_flags = key.flags,
            ConfigValue::Float(slot) if slot.is_some_and(|v| !v.is_finite()) => {
                tracing::warn!(property = key.name, "Non-finite float default declared as null");
                *slot = None;
            }
            _ => {}
        }

        match self.properties.iter_mut().find(|p| p.key.name == key.name) {
            Some(existing) => {
                existing.key = key;
                existing.value = value;
            }
            None => self.properties.push(ConfigProperty { key, value }),
        }
    }

    pub fn properties(&self) -> impl Iterator<Item = &ConfigProperty> {
        self.properties.iter()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn mount_flags(&self) -> ConfigFlags {
        self.mount_flags
    }

    pub fn has_global_state(&self) -> bool {
        self.has_global_state
    }

    pub fn global_state(&self) -> Option<bool> {
        self.global_state
    }

    pub fn set_global_state(&mut self, state: Option<bool>) -> ConfigResult<()> {
        if !self.has_global_state {
            return Err(ConfigError::NoGlobalState("container".to_string()));
        }
        self.global_state = state;
        Ok(())
    }

    pub fn property_named(&self, name: &str) -> Option<&ConfigProperty> {
        self.properties.iter().find(|p| p.key.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&ConfigValue> {
        self.property_named(name).map(|p| &p.value)
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut ConfigValue> {
        self.properties
            .iter_mut()
            .find(|p| p.key.name == name)
            .map(|p| &mut p.value)
    }

    pub fn child(&self, name: &str) -> Option<&ConfigContainer> {
        self.get(name).and_then(ConfigValue::as_container)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut ConfigContainer> {
        self.get_mut(name).and_then(ConfigValue::as_container_mut)
    }

    /// Assign a primitive property. The value must match the declared kind.
    pub fn set(&mut self, name: &str, value: impl Into<ConfigValue>) -> ConfigResult<()> {
        let value = value.into();
        let slot = self
            .get_mut(name)
            .ok_or_else(|| ConfigError::UnknownProperty(name.to_string()))?;
        assign(slot, value, name)
    }

    /// Resolve a dotted path (`"downloader.save_folder"`) to a property.
    pub fn lookup(&self, path: &str) -> ConfigResult<&ConfigProperty> {
        let (parent, leaf) = self.resolve_parent(path)?;
        parent
            .property_named(leaf)
            .ok_or_else(|| ConfigError::UnknownProperty(path.to_string()))
    }

    /// Assign a primitive property addressed by a dotted path.
    ///
    /// A final segment of [`GLOBAL_STATE_KEY`] addresses the global state of
    /// the container named by the rest of the path.
    pub fn set_path(&mut self, path: &str, value: impl Into<ConfigValue>) -> ConfigResult<()> {
        let value = value.into();
        let (parent, leaf) = self.resolve_parent_mut(path)?;

        if leaf == GLOBAL_STATE_KEY {
            return match value {
                ConfigValue::Bool(state) => parent
                    .set_global_state(state)
                    .map_err(|_| ConfigError::NoGlobalState(path.to_string())),
                other => Err(ConfigError::TypeMismatch {
                    path: path.to_string(),
                    expected: ValueKind::Bool,
                    actual: other.kind(),
                }),
            };
        }

        let slot = parent
            .get_mut(leaf)
            .ok_or_else(|| ConfigError::UnknownProperty(path.to_string()))?;
        assign(slot, value, path)
    }

    /// Parse `input` according to the kind of the addressed slot, then assign it.
    pub fn set_path_str(&mut self, path: &str, input: &str) -> ConfigResult<()> {
        let kind = if path.rsplit('.').next() == Some(GLOBAL_STATE_KEY) {
            ValueKind::Bool
        } else {
            self.lookup(path)?.value.kind()
        };
        let value = ConfigValue::parse(kind, input)?;
        self.set_path(path, value)
    }

    fn resolve_parent<'a, 'p>(&'a self, path: &'p str) -> ConfigResult<(&'a ConfigContainer, &'p str)> {
        let (dirs, leaf) = split_path(path);
        let mut current = self;
        for segment in dirs {
            current = match current.get(segment) {
                Some(ConfigValue::Container(c)) => c.as_ref(),
                Some(_) => return Err(ConfigError::NotAContainer(segment.to_string())),
                None => return Err(ConfigError::UnknownProperty(path.to_string())),
            };
        }
        Ok((current, leaf))
    }

    fn resolve_parent_mut<'a, 'p>(
        &'a mut self,
        path: &'p str,
    ) -> ConfigResult<(&'a mut ConfigContainer, &'p str)> {
        let (dirs, leaf) = split_path(path);
        let mut current = self;
        for segment in dirs {
            current = match current.get_mut(segment) {
                Some(ConfigValue::Container(c)) => c.as_mut(),
                Some(_) => return Err(ConfigError::NotAContainer(segment.to_string())),
                None => return Err(ConfigError::UnknownProperty(path.to_string())),
            };
        }
        Ok((current, leaf))
    }

    pub fn to_json(&self) -> Map<String, Value> {
        let mut object = Map::new();
        if self.has_global_state {
            object.insert(
                GLOBAL_STATE_KEY.to_string(),
                self.global_state.map(Value::Bool).unwrap_or(Value::Null),
            );
        }
        for property in &self.properties {
            object.insert(property.key.name.to_string(), property.value.to_json());
        }
        object
    }

    /// Overlay `object` onto this container in place.
    pub fn from_json(&mut self, object: &Map<String, Value>) {
        if self.has_global_state {
            match object.get(GLOBAL_STATE_KEY) {
                Some(Value::Bool(state)) => self.global_state = Some(*state),
                Some(Value::Null) => self.global_state = None,
                Some(other) => {
                    tracing::debug!(node = %other, "Ignoring non-boolean global state");
                }
                None => {}
            }
        }

        for property in &mut self.properties {
            let Some(node) = object.get(property.key.name) else {
                continue;
            };
            if !property.value.apply_json(node) {
                tracing::debug!(
                    property = property.key.name,
                    expected = %property.value.kind(),
                    "Persisted value does not fit the declared type, keeping default"
                );
            }
        }
    }
}

fn split_path(path: &str) -> (impl Iterator<Item = &str>, &str) {
    let (dirs, leaf) = match path.rsplit_once('.') {
        Some((dirs, leaf)) => (dirs, leaf),
        None => ("", path),
    };
    (dirs.split('.').filter(|s| !s.is_empty()), leaf)
}

fn assign(slot: &mut ConfigValue, value: ConfigValue, path: &str) -> ConfigResult<()> {
    if slot.kind() == ValueKind::Container {
        return Err(ConfigError::IsContainer(path.to_string()));
    }
    if slot.kind() != value.kind() {
        return Err(ConfigError::TypeMismatch {
            path: path.to_string(),
            expected: slot.kind(),
            actual: value.kind(),
        });
    }
    if let ConfigValue::Float(Some(v)) = value {
        if !v.is_finite() {
            return Err(ConfigError::InvalidValue {
                kind: ValueKind::Float,
                input: v.to_string(),
            });
        }
    }
    *slot = value;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ConfigContainer {
        ConfigContainer::new()
            .property("enabled", ConfigFlags::NONE, false)
            .property("name", ConfigFlags::NONE, ConfigValue::Text(None))
            .container(
                "nested",
                ConfigFlags::RESTART,
                ConfigContainer::new()
                    .with_global_state(Some(true))
                    .property("level", ConfigFlags::CLEAN_CACHE, 0i64)
                    .property("ratio", ConfigFlags::NONE, 0.5f64),
            )
    }

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_round_trip() {
        let mut tree = sample();
        tree.set("enabled", true).unwrap();
        tree.set_path("nested.level", 3i64).unwrap();
        tree.set_path("nested._global_state", ConfigValue::Bool(None)).unwrap();

        let mut restored = sample();
        restored.from_json(&tree.to_json());
        assert_eq!(restored, tree);
    }

    #[test]
    fn test_null_round_trips_as_null() {
        let mut tree = sample();
        tree.set("name", "alice").unwrap();
        let mut json = tree.to_json();
        json.insert("name".into(), Value::Null);

        tree.from_json(&json);
        assert_eq!(tree.get("name"), Some(&ConfigValue::Text(None)));
    }

    #[test]
    fn test_tolerant_read() {
        let mut tree = sample();
        tree.from_json(&object(json!({
            "enabled": "yes",
            "unknown": 12,
            "nested": { "level": 9, "extra": true }
        })));

        assert_eq!(tree.get("enabled").and_then(ConfigValue::as_bool), Some(false));
        assert!(tree.get("unknown").is_none());
        assert_eq!(tree.len(), 3);
        let nested = tree.child("nested").unwrap();
        assert_eq!(nested.get("level").and_then(ConfigValue::as_int), Some(9));
        assert_eq!(nested.get("ratio").and_then(ConfigValue::as_float), Some(0.5));
        assert_eq!(nested.global_state(), Some(true));
    }

    #[test]
    fn test_container_node_mismatch_keeps_child() {
        let mut tree = sample();
        tree.from_json(&object(json!({ "nested": 5 })));
        assert_eq!(tree, sample());
    }

    #[test]
    fn test_mount_flags_recorded() {
        let tree = sample();
        assert_eq!(tree.child("nested").unwrap().mount_flags(), ConfigFlags::RESTART);
        assert_eq!(tree.mount_flags(), ConfigFlags::NONE);
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut tree = sample();
        tree.insert(PropertyKey::new("enabled", ConfigFlags::RESTART), true.into());
        let names: Vec<_> = tree.properties().map(ConfigProperty::name).collect();
        assert_eq!(names, vec!["enabled", "name", "nested"]);
        assert_eq!(tree.property_named("enabled").unwrap().key.flags, ConfigFlags::RESTART);
    }

    #[test]
    fn test_set_rejects_bad_assignments() {
        let mut tree = sample();
        assert_eq!(
            tree.set("enabled", 1i64),
            Err(ConfigError::TypeMismatch {
                path: "enabled".into(),
                expected: ValueKind::Bool,
                actual: ValueKind::Int,
            })
        );
        assert!(matches!(tree.set("nested", true), Err(ConfigError::IsContainer(_))));
        assert!(matches!(tree.set("missing", true), Err(ConfigError::UnknownProperty(_))));
        assert!(matches!(
            tree.set_path("enabled.x", true),
            Err(ConfigError::NotAContainer(_))
        ));
        assert!(matches!(
            tree.set_path("_global_state", true),
            Err(ConfigError::NoGlobalState(_))
        ));
    }

    #[test]
    fn test_set_path_str_parses_by_slot_kind() {
        let mut tree = sample();
        tree.set_path_str("nested.ratio", "1.25").unwrap();
        tree.set_path_str("nested._global_state", "off").unwrap();
        tree.set_path_str("name", "bob").unwrap();

        let nested = tree.child("nested").unwrap();
        assert_eq!(nested.get("ratio").and_then(ConfigValue::as_float), Some(1.25));
        assert_eq!(nested.global_state(), Some(false));
        assert_eq!(tree.lookup("name").unwrap().value.as_text(), Some("bob"));
    }

    #[test]
    fn test_non_finite_floats_are_rejected() {
        let mut tree = sample();
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                tree.set_path("nested.ratio", bad),
                Err(ConfigError::InvalidValue { kind: ValueKind::Float, .. })
            ));
        }
        assert_eq!(
            tree.lookup("nested.ratio").unwrap().value.as_float(),
            Some(0.5)
        );

        let declared = ConfigContainer::new().property("ratio", ConfigFlags::NONE, f64::NAN);
        assert_eq!(declared.get("ratio"), Some(&ConfigValue::Float(None)));
    }

    #[test]
    fn test_edge_primitives_round_trip_through_bytes() {
        let cases: Vec<(&str, ConfigValue)> = vec![
            ("int_min", i64::MIN.into()),
            ("int_max", i64::MAX.into()),
            ("int_zero", 0i64.into()),
            ("float_hard", 1.0715660391465826e-75f64.into()),
            ("float_max", f64::MAX.into()),
            ("float_min_positive", f64::MIN_POSITIVE.into()),
            ("float_subnormal", 5e-324f64.into()),
            ("float_negative_zero", (-0.0f64).into()),
            ("float_tenth", 0.1f64.into()),
            ("float_null", ConfigValue::Float(None)),
            ("text_empty", "".into()),
            ("text_unicode", "h\u{e9}llo \"q\" \n".into()),
            ("text_null", ConfigValue::Text(None)),
            ("bool_null", ConfigValue::Bool(None)),
        ];

        for (name, value) in cases {
            let kind = value.kind();
            let written = ConfigContainer::new().property("slot", ConfigFlags::NONE, value.clone());
            let bytes = serde_json::to_vec(&Value::Object(written.to_json())).unwrap();
            let parsed: Map<String, Value> = serde_json::from_slice(&bytes).unwrap();

            let mut read = ConfigContainer::new().property("slot", ConfigFlags::NONE, ConfigValue::null(kind));
            read.from_json(&parsed);
            assert_eq!(read.get("slot"), Some(&value), "{} did not survive", name);
        }
    }
}
