//! Logging utilities.
//!
//! This module centralizes logger initialization. Library code only uses the
//! `log` facade; binaries pick the backend through `init_logging`.

mod init;

pub use init::{init_logging, LoggingConfig};
