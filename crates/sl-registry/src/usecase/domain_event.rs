//! Domain Event Trait
//!
//! Base trait for all domain events. Events carry CloudEvents-style metadata
//! plus the tracing fields of the execution that produced them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::execution_context::ExecutionContext;
use crate::shared::tsid::TsidGenerator;

/// Base trait for all domain events.
///
/// Events are facts, named in the past tense (`ContractCreated`,
/// `StatusChanged`).
///
/// - Event type: `{app}:{aggregate}:{action}`, e.g. `subledger:subscription:status-changed`
/// - Subject: `{app}.{aggregate}.{id}`, e.g. `subledger.subscription.42`
/// - Message group: `{app}:{aggregate}:{id}`; events in one group are ordered
pub trait DomainEvent: Send + Sync {
    fn event_id(&self) -> &str;

    fn event_type(&self) -> &str;

    fn spec_version(&self) -> &str;

    fn source(&self) -> &str;

    fn subject(&self) -> &str;

    fn time(&self) -> DateTime<Utc>;

    fn execution_id(&self) -> &str;

    fn correlation_id(&self) -> &str;

    fn causation_id(&self) -> Option<&str>;

    /// Principal whose call produced this event.
    fn principal_id(&self) -> &str;

    fn message_group(&self) -> &str;

    /// Serialize the event-specific data payload to JSON.
    fn to_data_json(&self) -> serde_json::Value;
}

/// Common metadata for domain events.
///
/// Event structs embed this as a flattened `metadata` field and implement
/// [`DomainEvent`] with [`impl_domain_event!`](crate::impl_domain_event).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMetadata {
    pub event_id: String,
    pub event_type: String,
    pub spec_version: String,
    pub source: String,
    pub subject: String,
    pub time: DateTime<Utc>,
    pub execution_id: String,
    pub correlation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub causation_id: Option<String>,
    pub principal_id: String,
    pub message_group: String,
}

impl EventMetadata {
    /// Build metadata for an event about `aggregate` with the given id,
    /// copying the tracing fields from the execution context.
    pub fn from_context(
        ctx: &ExecutionContext,
        event_type: &str,
        spec_version: &str,
        source: &str,
        aggregate: &str,
        aggregate_id: impl std::fmt::Display,
    ) -> Self {
        Self {
            event_id: TsidGenerator::generate(),
            event_type: event_type.to_string(),
            spec_version: spec_version.to_string(),
            source: source.to_string(),
            subject: format!("subledger.{}.{}", aggregate, aggregate_id),
            time: Utc::now(),
            execution_id: ctx.execution_id.clone(),
            correlation_id: ctx.correlation_id.clone(),
            causation_id: ctx.causation_id.clone(),
            principal_id: ctx.principal_id.clone(),
            message_group: format!("subledger:{}:{}", aggregate, aggregate_id),
        }
    }
}

/// Implements [`DomainEvent`] by delegating to a field named `metadata`.
#[macro_export]
macro_rules! impl_domain_event {
    ($event_type:ty) => {
        impl $crate::usecase::DomainEvent for $event_type {
            fn event_id(&self) -> &str {
                &self.metadata.event_id
            }

            fn event_type(&self) -> &str {
                &self.metadata.event_type
            }

            fn spec_version(&self) -> &str {
                &self.metadata.spec_version
            }

            fn source(&self) -> &str {
                &self.metadata.source
            }

            fn subject(&self) -> &str {
                &self.metadata.subject
            }

            fn time(&self) -> chrono::DateTime<chrono::Utc> {
                self.metadata.time
            }

            fn execution_id(&self) -> &str {
                &self.metadata.execution_id
            }

            fn correlation_id(&self) -> &str {
                &self.metadata.correlation_id
            }

            fn causation_id(&self) -> Option<&str> {
                self.metadata.causation_id.as_deref()
            }

            fn principal_id(&self) -> &str {
                &self.metadata.principal_id
            }

            fn message_group(&self) -> &str {
                &self.metadata.message_group
            }

            fn to_data_json(&self) -> serde_json::Value {
                let mut value = serde_json::to_value(self)
                    .unwrap_or_else(|_| serde_json::Value::Object(Default::default()));
                // Metadata lives on the log record itself
                if let serde_json::Value::Object(map) = &mut value {
                    for key in [
                        "eventId", "eventType", "specVersion", "source", "subject", "time",
                        "executionId", "correlationId", "causationId", "principalId",
                        "messageGroup",
                    ] {
                        map.remove(key);
                    }
                }
                value
            }
        }
    };
}
