//! SubLedger Subscription Registry
//!
//! Core registry providing:
//! - Producer/consumer subscription agreements
//! - Lifecycle state machine (offer, sign, pause, resume, cancel, expire)
//! - Party-based access control against the calling principal
//! - Append-only event log and audit log, committed with each change
//! - Use Case pattern with guaranteed audit logging
//!
//! ## Module Organization (Aggregate-based)
//!
//! Each aggregate contains:
//! - `entity` - Domain entities
//! - `repository` - Data access
//! - `operations` - Use case operations (where applicable)

// Aggregates
pub mod subscription;
pub mod event;
pub mod audit;

// Storage
pub mod ledger;

// Shared infrastructure
pub mod shared;

// Cross-cutting concerns
pub mod usecase;

pub mod registry;

// Re-export common types from shared
pub use shared::error::{RegistryError, Result};
pub use shared::tsid::TsidGenerator;

// Re-export use case infrastructure
pub use usecase::{
    UseCaseResult, UseCaseError, DomainEvent, ExecutionContext,
    UnitOfWork, LedgerUnitOfWork,
};
// Note: impl_domain_event! and details! are exported at crate root via #[macro_export]

// Re-export main entity types for convenience
pub use subscription::entity::{Party, Subscription, SubscriptionStatus, SubscriptionTerms, Transition};
pub use subscription::repository::SubscriptionRepository;
pub use subscription::operations::{
    ContractCreated, ContractLimits, CreateSubscriptionContractCommand, StatusChanged,
};
pub use event::Event;
pub use audit::AuditLog;
pub use ledger::InMemoryLedger;
pub use registry::{RegistrySettings, SubscriptionRegistry};
