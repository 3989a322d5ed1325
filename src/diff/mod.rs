//! Tree diff and side-effect derivation.
//!
//! # Algorithm
//! ```text
//! compare_diff(original, modified):
//!     if modified declares global state:
//!         compare global states under the mount flags
//!     for each property of modified (authoritative):
//!         find same-named property in original
//!         both containers → recurse
//!         otherwise       → value equality;
//!                           on change, flags = property flags ∪ mount flags
//! ```
//!
//! # Design Decisions
//! - Flags are inherited one level: a container's own mount flags apply to
//!   its properties and global state, not to grandchildren
//! - The walk never stops early; outcome flags only ever go from false to true
//! - Clean-cache wins over restart when both are required

use crate::config::{ConfigContainer, ConfigFlag, ConfigFlags, ConfigValue, GLOBAL_STATE_KEY};

/// Result of comparing two trees.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffOutcome {
    pub config_changed: bool,
    pub should_restart: bool,
    pub should_clean_cache: bool,
    /// Dotted paths of every changed slot, in walk order.
    pub changed_paths: Vec<String>,
}

/// The single notification a write delivers to the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    None,
    ConfigChanged,
    /// Config changed and a cache must be invalidated.
    CleanCacheRequired,
    /// Config changed and the consuming process must restart.
    RestartRequired,
}

impl Notification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Notification::None => "none",
            Notification::ConfigChanged => "config_changed",
            Notification::CleanCacheRequired => "clean_cache_required",
            Notification::RestartRequired => "restart_required",
        }
    }
}

impl DiffOutcome {
    fn mark(&mut self, path: String, flags: ConfigFlags) {
        self.config_changed = true;
        if flags.contains(ConfigFlag::RequireRestart) {
            self.should_restart = true;
        }
        if flags.contains(ConfigFlag::RequireCleanCache) {
            self.should_clean_cache = true;
        }
        self.changed_paths.push(path);
    }

    pub fn notification(&self) -> Notification {
        if !self.config_changed {
            Notification::None
        } else if self.should_clean_cache {
            Notification::CleanCacheRequired
        } else if self.should_restart {
            Notification::RestartRequired
        } else {
            Notification::ConfigChanged
        }
    }
}

/// Compare `modified` against `original`.
pub fn compare_diff(original: &ConfigContainer, modified: &ConfigContainer) -> DiffOutcome {
    let mut outcome = DiffOutcome::default();
    walk(original, modified, "", &mut outcome);
    outcome
}

fn walk(original: &ConfigContainer, modified: &ConfigContainer, prefix: &str, out: &mut DiffOutcome) {
    let parent_flags = modified.mount_flags();

    if modified.has_global_state() && modified.global_state() != original.global_state() {
        out.mark(join(prefix, GLOBAL_STATE_KEY), parent_flags);
    }

    for property in modified.properties() {
        let path = join(prefix, property.name());
        let original_value = original.get(property.name());

        match (original_value, &property.value) {
            (Some(ConfigValue::Container(before)), ConfigValue::Container(after)) => {
                walk(before, after, &path, out);
            }
            (Some(before), after) if before == after => {}
            // No prior slot: only a non-null value counts as a change.
            (None, after) if after.is_null() => {}
            _ => out.mark(path, property.key.flags | parent_flags),
        }
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PropertyKey;

    /// `P` (no flags) = false, `C` mounted with RESTART holding `Q` = 0.
    fn scenario() -> ConfigContainer {
        ConfigContainer::new().property("P", ConfigFlags::NONE, false).container(
            "C",
            ConfigFlags::RESTART,
            ConfigContainer::new().property("Q", ConfigFlags::NONE, 0i64),
        )
    }

    #[test]
    fn test_identical_trees() {
        let outcome = compare_diff(&scenario(), &scenario());
        assert_eq!(outcome, DiffOutcome::default());
        assert_eq!(outcome.notification(), Notification::None);
    }

    #[test]
    fn test_unflagged_change() {
        let mut modified = scenario();
        modified.set("P", true).unwrap();

        let outcome = compare_diff(&scenario(), &modified);
        assert!(outcome.config_changed);
        assert!(!outcome.should_restart);
        assert!(!outcome.should_clean_cache);
        assert_eq!(outcome.changed_paths, vec!["P"]);
        assert_eq!(outcome.notification(), Notification::ConfigChanged);
    }

    #[test]
    fn test_mount_flags_apply_to_children() {
        let mut modified = scenario();
        modified.set_path("C.Q", 1i64).unwrap();

        let outcome = compare_diff(&scenario(), &modified);
        assert!(outcome.config_changed);
        assert!(outcome.should_restart);
        assert_eq!(outcome.changed_paths, vec!["C.Q"]);
    }

    #[test]
    fn test_mount_flags_do_not_reach_grandchildren() {
        let tree = || {
            ConfigContainer::new().container(
                "outer",
                ConfigFlags::RESTART,
                ConfigContainer::new().container(
                    "inner",
                    ConfigFlags::NONE,
                    ConfigContainer::new().property("x", ConfigFlags::NONE, 0i64),
                ),
            )
        };
        let mut modified = tree();
        modified.set_path("outer.inner.x", 5i64).unwrap();

        let outcome = compare_diff(&tree(), &modified);
        assert!(outcome.config_changed);
        assert!(!outcome.should_restart);
    }

    #[test]
    fn test_flags_are_monotonic_across_siblings() {
        let tree = || {
            ConfigContainer::new()
                .property("a", ConfigFlags::RESTART, 0i64)
                .property("b", ConfigFlags::CLEAN_CACHE, 0i64)
                .property("c", ConfigFlags::NONE, 0i64)
        };
        let mut modified = tree();
        modified.set("a", 1i64).unwrap();
        modified.set("b", 1i64).unwrap();

        let outcome = compare_diff(&tree(), &modified);
        assert!(outcome.should_restart);
        assert!(outcome.should_clean_cache);
        assert_eq!(outcome.changed_paths, vec!["a", "b"]);
        assert_eq!(outcome.notification(), Notification::CleanCacheRequired);
    }

    #[test]
    fn test_global_state_uses_mount_flags() {
        let tree = || {
            ConfigContainer::new().container(
                "feature",
                ConfigFlags::CLEAN_CACHE,
                ConfigContainer::new().with_global_state(Some(false)),
            )
        };
        let mut modified = tree();
        modified.set_path("feature._global_state", true).unwrap();

        let outcome = compare_diff(&tree(), &modified);
        assert!(outcome.should_clean_cache);
        assert_eq!(outcome.changed_paths, vec!["feature._global_state"]);
    }

    #[test]
    fn test_missing_original_property() {
        let original = ConfigContainer::new();
        let mut modified = ConfigContainer::new()
            .property("absent_null", ConfigFlags::RESTART, ConfigValue::Text(None))
            .property("absent_set", ConfigFlags::NONE, "x");

        let outcome = compare_diff(&original, &modified);
        assert!(outcome.config_changed);
        assert!(!outcome.should_restart);
        assert_eq!(outcome.changed_paths, vec!["absent_set"]);

        modified.insert(
            PropertyKey::new("absent_set", ConfigFlags::NONE),
            ConfigValue::Text(None),
        );
        assert!(!compare_diff(&original, &modified).config_changed);
    }

    #[test]
    fn test_original_extra_properties_ignored() {
        let original = scenario().property("legacy", ConfigFlags::RESTART, true);
        let outcome = compare_diff(&original, &scenario());
        assert!(!outcome.config_changed);
    }
}
