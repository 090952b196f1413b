//! Audit Log
//!
//! One entry per committed command, naming who did what.

pub mod entity;

pub use entity::AuditLog;
