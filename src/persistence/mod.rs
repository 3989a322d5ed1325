//! Durable storage for the persisted configuration.
//!
//! # Data Flow
//! ```text
//! ConfigStore
//!     → PersistenceChannel (exists / read / write)
//!         → file.rs    local file, atomic replace
//!         → memory.rs  shared in-process bytes
//!         → bridge.rs  relayed to a BridgeServer owning the real channel
//!
//! watcher.rs: persisted file modified by another process → change event
//! ```
//!
//! # Design Decisions
//! - The store only sees bytes; JSON handling stays in the store
//! - Reading a baseline never fails: it classifies as Loaded, NotFound or Corrupt

pub mod bridge;
pub mod file;
pub mod memory;
pub mod watcher;

use serde_json::{Map, Value};
use thiserror::Error;

pub use bridge::{BridgeClient, BridgeServer};
pub use file::FileChannel;
pub use memory::MemoryChannel;

/// Logical file a channel stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Config,
}

impl FileKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            FileKind::Config => "config.json",
        }
    }
}

/// Errors raised by a persistence channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Nothing has been persisted yet.
    #[error("persisted file not found")]
    NotFound,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The bridge peer went away or refused the request.
    #[error("bridge error: {0}")]
    Bridge(String),
}

/// Byte-oriented store for one logical file.
pub trait PersistenceChannel: Send {
    fn exists(&self) -> Result<bool, ChannelError>;

    fn read(&self) -> Result<Vec<u8>, ChannelError>;

    fn write(&self, bytes: &[u8]) -> Result<(), ChannelError>;
}

/// Classification of the persisted content.
#[derive(Debug, Clone, PartialEq)]
pub enum Baseline {
    /// A JSON object was read.
    Loaded(Map<String, Value>),
    /// Nothing persisted.
    NotFound,
    /// Present but unusable: unreadable, not JSON, or not an object.
    Corrupt(String),
}

/// Parse persisted bytes into a JSON object.
pub fn parse_object(bytes: &[u8]) -> Result<Map<String, Value>, String> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(format!("expected a JSON object, found {}", json_type(&other))),
        Err(e) => Err(e.to_string()),
    }
}

/// Read and classify whatever the channel currently holds.
pub fn read_baseline(channel: &dyn PersistenceChannel) -> Baseline {
    match channel.exists() {
        Ok(false) => return Baseline::NotFound,
        Ok(true) => {}
        Err(e) => return Baseline::Corrupt(e.to_string()),
    }

    match channel.read() {
        Ok(bytes) => match parse_object(&bytes) {
            Ok(map) => Baseline::Loaded(map),
            Err(reason) => Baseline::Corrupt(reason),
        },
        Err(ChannelError::NotFound) => Baseline::NotFound,
        Err(e) => Baseline::Corrupt(e.to_string()),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
