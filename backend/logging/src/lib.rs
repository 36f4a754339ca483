//! Structured logging for flatframe.
//!
//! Console output for humans, rolling NDJSON files for later inspection.

pub mod logger;

pub use logger::{init_console_logger, init_logger};
