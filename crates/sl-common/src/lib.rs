//! SubLedger Common
//!
//! Ambient infrastructure shared by the registry crates and binaries.

pub mod logging;

pub use logging::{init_logging, init_logging_with, LogFormat, LogOptions};
