//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! store / persistence / locale produce:
//!     → tracing events with structured fields (logging.rs installs the subscriber)
//!     → counters (metrics.rs)
//! ```
//!
//! # Design Decisions
//! - Human-readable logs by default, JSON lines on request
//! - Logs go to stderr so exported configuration on stdout stays clean
//! - Metrics are cheap counters behind the `metrics` facade

pub mod logging;
pub mod metrics;
