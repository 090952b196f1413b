//! Audit Log Entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::tsid::TsidGenerator;
use crate::usecase::DomainEvent;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    pub id: String,

    /// Entity type affected, always "Subscription" today
    pub entity_type: String,

    pub entity_id: u64,

    /// Command type name, e.g. "PauseSubscriptionCommand"
    pub operation: String,

    /// Full command as JSON
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_json: Option<String>,

    pub principal_id: String,

    /// Domain event produced by the command
    pub event_id: String,

    pub performed_at: DateTime<Utc>,
}

impl AuditLog {
    /// Audit entry for `command` as committed together with `event`.
    pub fn for_command<E: DomainEvent, C: Serialize>(
        entity_type: &str,
        entity_id: u64,
        event: &E,
        command: &C,
    ) -> Self {
        Self {
            id: TsidGenerator::generate(),
            entity_type: entity_type.to_string(),
            entity_id,
            operation: command_name::<C>(),
            operation_json: serde_json::to_string(command).ok(),
            principal_id: event.principal_id().to_string(),
            event_id: event.event_id().to_string(),
            performed_at: event.time(),
        }
    }
}

/// Simple type name of a command.
fn command_name<C>() -> String {
    std::any::type_name::<C>()
        .rsplit("::")
        .next()
        .unwrap_or("Unknown")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct PokeCommand {
        target: u64,
    }

    #[test]
    fn test_command_name() {
        assert_eq!(command_name::<PokeCommand>(), "PokeCommand");
    }
}
