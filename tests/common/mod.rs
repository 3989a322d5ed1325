//! Shared fixtures for integration tests.

use config_store::config::{ConfigContainer, ConfigFlags};
use config_store::store::{ChangeListener, ConfigEvent, ListenerResult};
use tokio::sync::mpsc;

/// `P` (no flags) = false, `C` mounted with REQUIRE_RESTART holding `Q` = 0
/// and `ratio` = 0.5, plus a clean-cache leaf and a container with a global state toggle.
pub fn scenario_tree() -> ConfigContainer {
    ConfigContainer::new()
        .property("P", ConfigFlags::NONE, false)
        .container(
            "C",
            ConfigFlags::RESTART,
            ConfigContainer::new()
                .property("Q", ConfigFlags::NONE, 0i64)
                .property("ratio", ConfigFlags::NONE, 0.5f64),
        )
        .property("cache_size", ConfigFlags::CLEAN_CACHE, 64i64)
        .container(
            "feature",
            ConfigFlags::NONE,
            ConfigContainer::new()
                .with_global_state(Some(false))
                .property("label", ConfigFlags::NONE, "default"),
        )
}

/// Collect every event delivered so far.
pub fn drain(events: &mut mpsc::UnboundedReceiver<ConfigEvent>) -> Vec<ConfigEvent> {
    let mut delivered = Vec::new();
    while let Ok(event) = events.try_recv() {
        delivered.push(event);
    }
    delivered
}

/// A listener whose every callback fails.
#[allow(dead_code)]
pub struct BrokenListener;

impl ChangeListener for BrokenListener {
    fn on_config_changed(&self) -> ListenerResult {
        Err("listener unavailable".into())
    }

    fn on_clean_cache_required(&self) -> ListenerResult {
        Err("listener unavailable".into())
    }

    fn on_restart_required(&self) -> ListenerResult {
        panic!("listener crashed")
    }
}
