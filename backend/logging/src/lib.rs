//! Structured logging setup for docforge.
//!
//! Console output for operators plus a daily-rotated NDJSON file for the server.

pub mod logger;

pub use logger::{init_console_logger, init_logger, LogGuard};
