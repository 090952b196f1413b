//! Execution Context
//!
//! Carries the authenticated calling principal and tracing ids through one
//! use case execution.

use chrono::{DateTime, Utc};

use super::domain_event::DomainEvent;
use crate::shared::tsid::TsidGenerator;

/// Context for a use case execution.
///
/// `principal_id` is the authenticated identity of the caller. Every
/// authorization decision in the registry is made against it; the registry
/// never authenticates, it trusts whoever built the context.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Unique ID for this execution (generated)
    pub execution_id: String,
    /// ID for distributed tracing (usually from the original request)
    pub correlation_id: String,
    /// ID of the event that caused this execution (if any)
    pub causation_id: Option<String>,
    /// Authenticated principal performing the action
    pub principal_id: String,
    pub initiated_at: DateTime<Utc>,
}

impl ExecutionContext {
    /// Fresh context: correlation starts as the execution id.
    pub fn create(principal_id: impl Into<String>) -> Self {
        let exec_id = format!("exec-{}", TsidGenerator::generate());
        Self {
            execution_id: exec_id.clone(),
            correlation_id: exec_id,
            causation_id: None,
            principal_id: principal_id.into(),
            initiated_at: Utc::now(),
        }
    }

    /// Context continuing an upstream correlation id.
    pub fn with_correlation(
        principal_id: impl Into<String>,
        correlation_id: impl Into<String>,
    ) -> Self {
        Self {
            execution_id: format!("exec-{}", TsidGenerator::generate()),
            correlation_id: correlation_id.into(),
            causation_id: None,
            principal_id: principal_id.into(),
            initiated_at: Utc::now(),
        }
    }

    /// Context for an execution triggered by a previous event, e.g. a
    /// consumer signing in reaction to `ContractCreated`.
    pub fn from_parent_event<E: DomainEvent>(parent: &E, principal_id: impl Into<String>) -> Self {
        Self {
            execution_id: format!("exec-{}", TsidGenerator::generate()),
            correlation_id: parent.correlation_id().to_string(),
            causation_id: Some(parent.event_id().to_string()),
            principal_id: principal_id.into(),
            initiated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_context() {
        let ctx = ExecutionContext::create("0xconsumer");

        assert!(ctx.execution_id.starts_with("exec-"));
        assert_eq!(ctx.principal_id, "0xconsumer");
        assert_eq!(ctx.correlation_id, ctx.execution_id);
        assert!(ctx.causation_id.is_none());
    }

    #[test]
    fn test_with_correlation() {
        let ctx = ExecutionContext::with_correlation("0xconsumer", "corr-456");

        assert_eq!(ctx.correlation_id, "corr-456");
        assert_ne!(ctx.execution_id, "corr-456");
    }
}
