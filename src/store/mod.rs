//! Configuration store: lifecycle, persistence and change dispatch.
//!
//! # Data Flow
//! ```text
//! load():
//!     fresh default tree → read persisted baseline
//!         NotFound → persist defaults
//!         Corrupt  → persist defaults (overwrites the unreadable file)
//!         Loaded   → overlay onto defaults
//!
//! write_config():
//!     read persisted baseline → overlay onto a throwaway default tree
//!     → compare_diff(baseline, live) → notify listener
//!     → persist live tree (always)
//! ```
//!
//! # Design Decisions
//! - A store only exists in the loaded state; there is no unset root
//! - Notification is best-effort and never blocks persistence
//! - Missing or corrupt baselines skip notification; only the write happens

pub mod listener;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::{ConfigContainer, DefaultTree};
use crate::diff::{compare_diff, DiffOutcome, Notification};
use crate::locale::{is_locale_tag, DEFAULT_LOCALE};
use crate::observability::metrics;
use crate::persistence::{
    parse_object, read_baseline, Baseline, BridgeClient, ChannelError, FileChannel,
    PersistenceChannel,
};

pub use listener::{ChangeListener, ChannelListener, ConfigEvent, ListenerResult};

/// Reserved top-level key holding the active locale tag.
pub const LOCALE_KEY: &str = "_locale";

/// Errors surfaced by the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Writing the persisted file failed.
    #[error("failed to persist configuration: {0}")]
    Persistence(#[from] ChannelError),

    /// Imported text is not a JSON object.
    #[error("invalid configuration document: {0}")]
    InvalidDocument(String),

    #[error("invalid locale tag: {0:?}")]
    InvalidLocale(String),

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// What the diff baseline looked like during a write or reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaselineState {
    Loaded,
    NotFound,
    Corrupt,
}

impl BaselineState {
    fn label(&self) -> &'static str {
        match self {
            BaselineState::Loaded => "loaded",
            BaselineState::NotFound => "not_found",
            BaselineState::Corrupt => "corrupt",
        }
    }
}

/// Summary of a write or reload.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteReport {
    pub baseline: BaselineState,
    /// `None` when the diff was skipped.
    pub outcome: Option<DiffOutcome>,
    pub notification: Notification,
}

impl WriteReport {
    fn skipped(baseline: BaselineState) -> Self {
        Self {
            baseline,
            outcome: None,
            notification: Notification::None,
        }
    }

    pub fn config_changed(&self) -> bool {
        self.outcome.as_ref().is_some_and(|o| o.config_changed)
    }
}

/// Options applied before the store loads.
pub struct ConfigStoreBuilder {
    defaults: DefaultTree,
    fallback_locale: String,
    listener: Option<Box<dyn ChangeListener>>,
}

impl ConfigStoreBuilder {
    /// Locale used when the persisted file carries none.
    pub fn fallback_locale(mut self, locale: impl Into<String>) -> Self {
        self.fallback_locale = locale.into();
        self
    }

    pub fn listener(mut self, listener: impl ChangeListener + 'static) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    /// Load through an arbitrary channel.
    pub fn load(self, channel: impl PersistenceChannel + 'static) -> StoreResult<ConfigStore> {
        let mut store = ConfigStore {
            root: (self.defaults)(),
            channel: Box::new(channel),
            defaults: self.defaults,
            locale: self.fallback_locale.clone(),
            fallback_locale: self.fallback_locale,
            was_present: false,
            listener: self.listener,
        };
        store.load()?;
        Ok(store)
    }

    /// Load from a local file.
    pub fn load_from_path(self, path: impl Into<PathBuf>) -> StoreResult<ConfigStore> {
        self.load(FileChannel::new(path))
    }

    /// Load through a bridge to the process owning the storage.
    pub fn load_from_bridge(self, client: BridgeClient) -> StoreResult<ConfigStore> {
        self.load(client)
    }
}

/// Owns the live configuration tree and its persisted copy.
pub struct ConfigStore {
    root: ConfigContainer,
    channel: Box<dyn PersistenceChannel>,
    defaults: DefaultTree,
    locale: String,
    fallback_locale: String,
    was_present: bool,
    listener: Option<Box<dyn ChangeListener>>,
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("locale", &self.locale)
            .field("was_present", &self.was_present)
            .field("has_listener", &self.listener.is_some())
            .finish()
    }
}

impl ConfigStore {
    pub fn builder(defaults: DefaultTree) -> ConfigStoreBuilder {
        ConfigStoreBuilder {
            defaults,
            fallback_locale: DEFAULT_LOCALE.to_string(),
            listener: None,
        }
    }

    /// Load with default options.
    pub fn load_with(
        channel: impl PersistenceChannel + 'static,
        defaults: DefaultTree,
    ) -> StoreResult<Self> {
        Self::builder(defaults).load(channel)
    }

    fn load(&mut self) -> StoreResult<()> {
        self.root = (self.defaults)();

        match read_baseline(self.channel.as_ref()) {
            Baseline::Loaded(document) => {
                self.was_present = true;
                self.apply_document(&document);
                tracing::info!(locale = %self.locale, "Configuration loaded");
                Ok(())
            }
            Baseline::NotFound => {
                self.was_present = false;
                tracing::info!("No persisted configuration, writing defaults");
                metrics::record_recovery("missing");
                self.persist()
            }
            Baseline::Corrupt(reason) => {
                self.was_present = true;
                tracing::warn!(%reason, "Persisted configuration is unreadable, overwriting with defaults");
                metrics::record_recovery("corrupt");
                self.persist()
            }
        }
    }

    pub fn root(&self) -> &ConfigContainer {
        &self.root
    }

    /// Mutable access to the live tree. Changes are persisted by [`ConfigStore::write_config`].
    pub fn root_mut(&mut self) -> &mut ConfigContainer {
        &mut self.root
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Change the active locale. Persisted on the next write.
    pub fn set_locale(&mut self, locale: &str) -> StoreResult<()> {
        if !is_locale_tag(locale) {
            return Err(StoreError::InvalidLocale(locale.to_string()));
        }
        self.locale = locale.to_string();
        Ok(())
    }

    /// Whether a persisted file existed when the store was loaded.
    pub fn was_present(&self) -> bool {
        self.was_present
    }

    pub fn set_listener(&mut self, listener: Option<Box<dyn ChangeListener>>) {
        self.listener = listener;
    }

    /// Mutate the live tree, then write it.
    pub fn update<F>(&mut self, mutate: F) -> StoreResult<WriteReport>
    where
        F: FnOnce(&mut ConfigContainer),
    {
        mutate(&mut self.root);
        self.write_config()
    }

    /// Diff the live tree against the persisted one, notify, then persist.
    pub fn write_config(&mut self) -> StoreResult<WriteReport> {
        let report = match read_baseline(self.channel.as_ref()) {
            Baseline::Loaded(document) => {
                let mut original = (self.defaults)();
                original.from_json(&document);
                let outcome = compare_diff(&original, &self.root);
                let notification = outcome.notification();
                WriteReport {
                    baseline: BaselineState::Loaded,
                    outcome: Some(outcome),
                    notification,
                }
            }
            Baseline::NotFound => {
                tracing::debug!("No persisted baseline, skipping diff");
                WriteReport::skipped(BaselineState::NotFound)
            }
            Baseline::Corrupt(reason) => {
                tracing::warn!(%reason, "Persisted baseline is corrupt, skipping change notification");
                WriteReport::skipped(BaselineState::Corrupt)
            }
        };

        metrics::record_write(report.baseline.label());
        self.notify(&report);
        self.persist()?;
        Ok(report)
    }

    /// Replace the live tree with defaults and persist it without notifying.
    pub fn reset(&mut self) -> StoreResult<()> {
        self.root = (self.defaults)();
        tracing::info!("Configuration reset to defaults");
        self.persist()
    }

    /// Overlay an exported document onto the live tree, then write it.
    ///
    /// Keys absent from `text` keep their current values. The diff runs
    /// against whatever was persisted before the import.
    pub fn load_from_string(&mut self, text: &str) -> StoreResult<WriteReport> {
        let document = parse_object(text.as_bytes()).map_err(StoreError::InvalidDocument)?;
        self.apply_document(&document);
        self.write_config()
    }

    /// Serialize the live tree plus the active locale. No side effects.
    pub fn export_to_string(&self) -> String {
        Value::Object(self.document()).to_string()
    }

    /// Adopt a persisted file written by another process.
    ///
    /// The live tree is the diff baseline and the persisted tree the
    /// modified side. A missing or corrupt file leaves the live tree alone.
    pub fn reload(&mut self) -> StoreResult<WriteReport> {
        let document = match read_baseline(self.channel.as_ref()) {
            Baseline::Loaded(document) => document,
            Baseline::NotFound => {
                tracing::warn!("Persisted configuration disappeared, keeping live tree");
                return Ok(WriteReport::skipped(BaselineState::NotFound));
            }
            Baseline::Corrupt(reason) => {
                tracing::warn!(%reason, "Persisted configuration is corrupt, keeping live tree");
                return Ok(WriteReport::skipped(BaselineState::Corrupt));
            }
        };

        let mut incoming = (self.defaults)();
        incoming.from_json(&document);
        let outcome = compare_diff(&self.root, &incoming);
        let notification = outcome.notification();

        self.root = incoming;
        self.locale = document_locale(&document).unwrap_or_else(|| self.fallback_locale.clone());

        let report = WriteReport {
            baseline: BaselineState::Loaded,
            outcome: Some(outcome),
            notification,
        };
        self.notify(&report);
        Ok(report)
    }

    fn notify(&self, report: &WriteReport) {
        let Some(outcome) = report.outcome.as_ref().filter(|o| o.config_changed) else {
            return;
        };

        tracing::info!(
            changed = ?outcome.changed_paths,
            restart = outcome.should_restart,
            clean_cache = outcome.should_clean_cache,
            "Configuration changed"
        );
        metrics::record_notification(report.notification.as_str());

        if let Some(listener) = self.listener.as_deref() {
            listener::dispatch(listener, report.notification);
        }
    }

    fn apply_document(&mut self, document: &Map<String, Value>) {
        self.locale = document_locale(document).unwrap_or_else(|| self.fallback_locale.clone());
        self.root.from_json(document);
    }

    fn document(&self) -> Map<String, Value> {
        let mut document = self.root.to_json();
        document.insert(LOCALE_KEY.to_string(), Value::String(self.locale.clone()));
        document
    }

    fn persist(&self) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(&Value::Object(self.document()))?;
        self.channel.write(&bytes)?;
        Ok(())
    }
}

fn document_locale(document: &Map<String, Value>) -> Option<String> {
    document
        .get(LOCALE_KEY)
        .and_then(Value::as_str)
        .filter(|tag| is_locale_tag(tag))
        .map(str::to_string)
}

/// A store behind a single mutex, for callers on several threads.
///
/// Mutation, diff and persistence all happen under the same lock. Listener
/// callbacks also run under it, so a listener must not call back into the
/// same `SharedConfigStore`; doing so deadlocks.
#[derive(Debug, Clone)]
pub struct SharedConfigStore {
    inner: Arc<Mutex<ConfigStore>>,
}

impl SharedConfigStore {
    pub fn new(store: ConfigStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, ConfigStore> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Mutate the live tree and write it under one lock.
    pub fn update<F>(&self, mutate: F) -> StoreResult<WriteReport>
    where
        F: FnOnce(&mut ConfigContainer),
    {
        self.lock().update(mutate)
    }

    pub fn export_to_string(&self) -> String {
        self.lock().export_to_string()
    }
}
