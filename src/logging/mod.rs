//! Structured JSON logging.

pub mod format;

pub use format::{LogEvent, StructuredLogger};
