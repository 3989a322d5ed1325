//! The application's default configuration tree.

use crate::config::container::ConfigContainer;
use crate::config::flags::ConfigFlags;
use crate::config::value::ConfigValue;

/// Factory producing a fresh default tree. Called on load and reset.
pub type DefaultTree = fn() -> ConfigContainer;

/// Build the default root container.
pub fn default_root() -> ConfigContainer {
    ConfigContainer::new()
        .property("debug_mode", ConfigFlags::NONE, false)
        .container("global", ConfigFlags::RESTART, global())
        .container("downloader", ConfigFlags::NONE, downloader())
        .container("user_interface", ConfigFlags::NONE, user_interface())
        .container("scripting", ConfigFlags::NONE, scripting())
        .container("experimental", ConfigFlags::RESTART, experimental())
}

fn global() -> ConfigContainer {
    ConfigContainer::new()
        .property("disable_metrics", ConfigFlags::NONE, false)
        .property("block_ads", ConfigFlags::NONE, true)
        .property("spoof_location", ConfigFlags::NONE, ConfigValue::Text(None))
}

fn downloader() -> ConfigContainer {
    ConfigContainer::new()
        .with_global_state(Some(false))
        .property("save_folder", ConfigFlags::NONE, ConfigValue::Text(None))
        .property("auto_download_limit", ConfigFlags::NONE, 0i64)
        .property("log_downloads", ConfigFlags::NONE, true)
}

fn user_interface() -> ConfigContainer {
    ConfigContainer::new()
        .property("theme", ConfigFlags::NONE, "system")
        .property("scale", ConfigFlags::CLEAN_CACHE, 1.0f64)
        .property("hide_story_sections", ConfigFlags::RESTART, false)
}

fn scripting() -> ConfigContainer {
    ConfigContainer::new()
        .property("module_folder", ConfigFlags::RESTART, ConfigValue::Text(None))
        .property("developer_mode", ConfigFlags::NONE, false)
}

fn experimental() -> ConfigContainer {
    ConfigContainer::new()
        .with_global_state(None)
        .property("native_hooks", ConfigFlags::NONE, false)
        .container(
            "media_cache",
            ConfigFlags::CLEAN_CACHE,
            ConfigContainer::new().property("max_size_mb", ConfigFlags::NONE, 256i64),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_root_shape() {
        let root = default_root();
        assert_eq!(root.len(), 6);
        assert_eq!(root.child("global").unwrap().mount_flags(), ConfigFlags::RESTART);
        assert!(root.child("downloader").unwrap().has_global_state());
        assert_eq!(
            root.lookup("experimental.media_cache.max_size_mb").unwrap().value.as_int(),
            Some(256)
        );
    }
}
