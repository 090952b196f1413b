//! Subscription Aggregate
//!
//! Producer/consumer agreements and their lifecycle.

pub mod entity;
pub mod repository;
pub mod operations;

// Re-export main types
pub use entity::{Party, Subscription, SubscriptionStatus, SubscriptionTerms, Transition};
pub use repository::SubscriptionRepository;
