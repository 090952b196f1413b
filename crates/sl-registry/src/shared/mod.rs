//! Shared infrastructure

pub mod error;
pub mod hex_bytes;
pub mod tsid;
