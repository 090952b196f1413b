//! Event Log
//!
//! The append-only record of committed domain events.

pub mod entity;

pub use entity::Event;
