//! Side-effect flags attached to properties and container mount points.

use std::fmt;

/// A side effect that must follow a change of the flagged setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigFlag {
    /// The consuming process must restart to pick up the change.
    RequireRestart,
    /// Cached data derived from the setting must be invalidated.
    RequireCleanCache,
}

impl ConfigFlag {
    const fn bit(self) -> u8 {
        match self {
            ConfigFlag::RequireRestart => 0b01,
            ConfigFlag::RequireCleanCache => 0b10,
        }
    }
}

impl fmt::Display for ConfigFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigFlag::RequireRestart => write!(f, "REQUIRE_RESTART"),
            ConfigFlag::RequireCleanCache => write!(f, "REQUIRE_CLEAN_CACHE"),
        }
    }
}

/// A small set of [`ConfigFlag`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ConfigFlags(u8);

impl ConfigFlags {
    /// The empty set.
    pub const NONE: ConfigFlags = ConfigFlags(0);
    pub const RESTART: ConfigFlags = ConfigFlags(ConfigFlag::RequireRestart.bit());
    pub const CLEAN_CACHE: ConfigFlags = ConfigFlags(ConfigFlag::RequireCleanCache.bit());

    pub fn contains(self, flag: ConfigFlag) -> bool {
        self.0 & flag.bit() != 0
    }

    pub fn with(self, flag: ConfigFlag) -> Self {
        Self(self.0 | flag.bit())
    }

    pub fn union(self, other: ConfigFlags) -> Self {
        Self(self.0 | other.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterate the flags present in this set.
    pub fn iter(self) -> impl Iterator<Item = ConfigFlag> {
        [ConfigFlag::RequireRestart, ConfigFlag::RequireCleanCache]
            .into_iter()
            .filter(move |flag| self.contains(*flag))
    }
}

impl From<ConfigFlag> for ConfigFlags {
    fn from(flag: ConfigFlag) -> Self {
        ConfigFlags::NONE.with(flag)
    }
}

impl FromIterator<ConfigFlag> for ConfigFlags {
    fn from_iter<I: IntoIterator<Item = ConfigFlag>>(iter: I) -> Self {
        iter.into_iter().fold(ConfigFlags::NONE, ConfigFlags::with)
    }
}

impl std::ops::BitOr for ConfigFlags {
    type Output = ConfigFlags;

    fn bitor(self, rhs: ConfigFlags) -> ConfigFlags {
        self.union(rhs)
    }
}

impl fmt::Display for ConfigFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, flag) in self.iter().enumerate() {
            if i > 0 {
                write!(f, "|")?;
            }
            write!(f, "{}", flag)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_keeps_both_sides() {
        let flags = ConfigFlags::RESTART | ConfigFlags::CLEAN_CACHE;
        assert!(flags.contains(ConfigFlag::RequireRestart));
        assert!(flags.contains(ConfigFlag::RequireCleanCache));
        assert!(!ConfigFlags::NONE.contains(ConfigFlag::RequireRestart));
    }

    #[test]
    fn test_collect_and_display() {
        let flags: ConfigFlags = [ConfigFlag::RequireCleanCache].into_iter().collect();
        assert_eq!(flags, ConfigFlags::CLEAN_CACHE);
        assert_eq!(
            (ConfigFlags::RESTART | flags).to_string(),
            "REQUIRE_RESTART|REQUIRE_CLEAN_CACHE"
        );
        assert_eq!(ConfigFlags::NONE.to_string(), "");
    }
}
