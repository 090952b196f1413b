//! Event Entity
//!
//! Immutable log record of a committed domain event. `sequence` is assigned
//! by the ledger at commit time and gives the single global order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::usecase::DomainEvent;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// TSID of the domain event
    pub id: String,

    /// Position in the ledger's event log, starting at 1
    pub sequence: u64,

    #[serde(rename = "type")]
    pub event_type: String,

    pub source: String,
    pub subject: String,
    pub spec_version: String,
    pub time: DateTime<Utc>,

    /// Event-specific payload
    pub data: serde_json::Value,

    pub subscription_id: u64,
    pub message_group: String,
    pub execution_id: String,
    pub correlation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub causation_id: Option<String>,
    pub principal_id: String,
}

impl Event {
    /// Log record for `event` about `subscription_id` at position `sequence`.
    pub fn record<E: DomainEvent>(event: &E, subscription_id: u64, sequence: u64) -> Self {
        Self {
            id: event.event_id().to_string(),
            sequence,
            event_type: event.event_type().to_string(),
            source: event.source().to_string(),
            subject: event.subject().to_string(),
            spec_version: event.spec_version().to_string(),
            time: event.time(),
            data: event.to_data_json(),
            subscription_id,
            message_group: event.message_group().to_string(),
            execution_id: event.execution_id().to_string(),
            correlation_id: event.correlation_id().to_string(),
            causation_id: event.causation_id().map(String::from),
            principal_id: event.principal_id().to_string(),
        }
    }

    pub fn is_type(&self, event_type: &str) -> bool {
        self.event_type == event_type
    }
}
