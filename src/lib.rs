//! Hierarchical configuration store with diff-driven change notification.
//!
//! A tree of typed, flag-annotated settings is mutated in memory, persisted
//! as JSON, and on every write compared against the previously persisted
//! copy to decide whether listeners hear "nothing changed", "settings
//! changed", "a cache must be cleared" or "the process must restart".

pub mod config;
pub mod diff;
pub mod locale;
pub mod observability;
pub mod persistence;
pub mod store;

pub use config::{ConfigContainer, ConfigFlag, ConfigFlags, ConfigValue};
pub use diff::{compare_diff, DiffOutcome, Notification};
pub use persistence::PersistenceChannel;
pub use store::{ChangeListener, ConfigStore, SharedConfigStore};
