//! Configuration tree and binary settings.
//!
//! # Data Flow
//! ```text
//! default_root() (root.rs)
//!     → ConfigContainer tree (container.rs, value.rs, flags.rs)
//!     → mutated in place by callers
//!     → to_json / from_json for persistence
//!
//! settings file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → StoreSettings (storage path, locale, logging)
//! ```
//!
//! # Design Decisions
//! - Property names are static strings declared by the schema
//! - Slots are typed and nullable; the kind never changes after declaration
//! - Side-effect flags live on the tree itself, per property and per mount

pub mod container;
pub mod error;
pub mod flags;
pub mod loader;
pub mod root;
pub mod settings;
pub mod validation;
pub mod value;

pub use container::{ConfigContainer, ConfigProperty, PropertyKey, GLOBAL_STATE_KEY};
pub use error::{ConfigError, ConfigResult};
pub use flags::{ConfigFlag, ConfigFlags};
pub use root::{default_root, DefaultTree};
pub use settings::StoreSettings;
pub use value::{ConfigValue, ValueKind};
