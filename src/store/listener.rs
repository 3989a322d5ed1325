//! Change listeners and best-effort dispatch.

use std::panic::{catch_unwind, AssertUnwindSafe};

use tokio::sync::mpsc;

use crate::diff::Notification;
use crate::observability::metrics;

/// Error a listener may report. It is logged and otherwise ignored.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

/// Result of a single listener callback.
pub type ListenerResult = Result<(), ListenerError>;

/// Receives notifications after a write changed the configuration.
///
/// Callbacks are fire-and-forget: failures and panics are caught and logged
/// by the store, and never prevent the configuration from being persisted.
/// They run while the store is borrowed (or locked, for a
/// [`SharedConfigStore`](crate::store::SharedConfigStore)); forward work to a
/// channel as [`ChannelListener`] does rather than re-entering the store.
pub trait ChangeListener: Send {
    fn on_config_changed(&self) -> ListenerResult;

    fn on_clean_cache_required(&self) -> ListenerResult;

    fn on_restart_required(&self) -> ListenerResult;
}

/// A single delivered callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigEvent {
    ConfigChanged,
    CleanCacheRequired,
    RestartRequired,
}

impl ConfigEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigEvent::ConfigChanged => "config_changed",
            ConfigEvent::CleanCacheRequired => "clean_cache_required",
            ConfigEvent::RestartRequired => "restart_required",
        }
    }
}

/// Forwards callbacks as [`ConfigEvent`]s to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelListener {
    tx: mpsc::UnboundedSender<ConfigEvent>,
}

impl ChannelListener {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ConfigEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn forward(&self, event: ConfigEvent) -> ListenerResult {
        self.tx
            .send(event)
            .map_err(|_| "event receiver dropped".into())
    }
}

impl ChangeListener for ChannelListener {
    fn on_config_changed(&self) -> ListenerResult {
        self.forward(ConfigEvent::ConfigChanged)
    }

    fn on_clean_cache_required(&self) -> ListenerResult {
        self.forward(ConfigEvent::CleanCacheRequired)
    }

    fn on_restart_required(&self) -> ListenerResult {
        self.forward(ConfigEvent::RestartRequired)
    }
}

/// Deliver `notification` to `listener`.
///
/// `on_config_changed` comes first; the follow-up callback is only attempted
/// when it succeeded. Returns whether every attempted callback succeeded.
pub(crate) fn dispatch(listener: &dyn ChangeListener, notification: Notification) -> bool {
    let follow_up = match notification {
        Notification::None => return true,
        Notification::ConfigChanged => None,
        Notification::CleanCacheRequired => Some(ConfigEvent::CleanCacheRequired),
        Notification::RestartRequired => Some(ConfigEvent::RestartRequired),
    };

    if !invoke(listener, ConfigEvent::ConfigChanged) {
        return false;
    }

    match follow_up {
        Some(event) => invoke(listener, event),
        None => true,
    }
}

fn invoke(listener: &dyn ChangeListener, event: ConfigEvent) -> bool {
    let result = catch_unwind(AssertUnwindSafe(|| match event {
        ConfigEvent::ConfigChanged => listener.on_config_changed(),
        ConfigEvent::CleanCacheRequired => listener.on_clean_cache_required(),
        ConfigEvent::RestartRequired => listener.on_restart_required(),
    }));

    match result {
        Ok(Ok(())) => {
            tracing::debug!(event = event.as_str(), "Listener notified");
            true
        }
        Ok(Err(e)) => {
            tracing::error!(event = event.as_str(), error = %e, "Error while calling config state listener");
            metrics::record_listener_failure(event.as_str());
            false
        }
        Err(_) => {
            tracing::error!(event = event.as_str(), "Config state listener panicked");
            metrics::record_listener_failure(event.as_str());
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingListener;

    impl ChangeListener for FailingListener {
        fn on_config_changed(&self) -> ListenerResult {
            Err("boom".into())
        }

        fn on_clean_cache_required(&self) -> ListenerResult {
            panic!("must not be called after a failed config_changed")
        }

        fn on_restart_required(&self) -> ListenerResult {
            panic!("must not be called after a failed config_changed")
        }
    }

    struct PanickingListener;

    impl ChangeListener for PanickingListener {
        fn on_config_changed(&self) -> ListenerResult {
            panic!("listener bug")
        }

        fn on_clean_cache_required(&self) -> ListenerResult {
            Ok(())
        }

        fn on_restart_required(&self) -> ListenerResult {
            Ok(())
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ConfigEvent>) -> Vec<ConfigEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_dispatch_sequences() {
        let (listener, mut rx) = ChannelListener::new();

        assert!(dispatch(&listener, Notification::None));
        assert!(drain(&mut rx).is_empty());

        assert!(dispatch(&listener, Notification::ConfigChanged));
        assert_eq!(drain(&mut rx), vec![ConfigEvent::ConfigChanged]);

        assert!(dispatch(&listener, Notification::CleanCacheRequired));
        assert_eq!(
            drain(&mut rx),
            vec![ConfigEvent::ConfigChanged, ConfigEvent::CleanCacheRequired]
        );

        assert!(dispatch(&listener, Notification::RestartRequired));
        assert_eq!(
            drain(&mut rx),
            vec![ConfigEvent::ConfigChanged, ConfigEvent::RestartRequired]
        );
    }

    #[test]
    fn test_failures_are_contained() {
        assert!(!dispatch(&FailingListener, Notification::CleanCacheRequired));
        assert!(!dispatch(&PanickingListener, Notification::RestartRequired));
    }

    #[test]
    fn test_dropped_receiver_reports_failure() {
        let (listener, rx) = ChannelListener::new();
        drop(rx);
        assert!(!dispatch(&listener, Notification::ConfigChanged));
    }
}
