//! Unit of Work
//!
//! Atomic commit of subscription state, the domain event and the audit log
//! entry as a single ledger entry.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, error};

use super::domain_event::DomainEvent;
use super::error::UseCaseError;
use super::result::UseCaseResult;
use crate::audit::AuditLog;
use crate::event::Event;
use crate::ledger::{InMemoryLedger, LedgerEntry, LedgerState};
use crate::subscription::entity::Subscription;
use crate::subscription::operations::codes;

const ENTITY_TYPE: &str = "Subscription";

/// Unit of Work for atomic subscription operations.
///
/// **This is the ONLY way to create a successful `UseCaseResult`.**
/// `UseCaseResult::success()` is crate-private, so use cases must go
/// through here to return success. Every committed state change therefore
/// has exactly one event and one audit entry, written together.
///
/// # Usage in a use case:
///
/// ```ignore
/// pub async fn execute(&self, cmd: PauseSubscriptionCommand, ctx: ExecutionContext)
///     -> UseCaseResult<StatusChanged>
/// {
///     let mut subscription = /* load, authorize */;
///     let previous = subscription.apply(Transition::Pause)?;
///     let event = StatusChanged::new(&ctx, &subscription, Transition::Pause, previous);
///
///     // Atomic commit - only way to return success
///     self.unit_of_work.commit(&subscription, event, &cmd).await
/// }
/// ```
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Commit a new subscription with its creation event.
    ///
    /// Fails with `SUBSCRIPTION_ID_EXISTS` if the id is already stored.
    async fn commit_create<E, C>(
        &self,
        subscription: &Subscription,
        event: E,
        command: &C,
    ) -> UseCaseResult<E>
    where
        E: DomainEvent + Serialize + Send + 'static,
        C: Serialize + Send + Sync;

    /// Commit a changed subscription with its domain event.
    ///
    /// The stored record must exist at `subscription.version - 1` and share
    /// every immutable field with `subscription`.
    async fn commit<E, C>(
        &self,
        subscription: &Subscription,
        event: E,
        command: &C,
    ) -> UseCaseResult<E>
    where
        E: DomainEvent + Serialize + Send + 'static,
        C: Serialize + Send + Sync;
}

/// [`UnitOfWork`] writing to an [`InMemoryLedger`].
#[derive(Clone)]
pub struct LedgerUnitOfWork {
    ledger: Arc<InMemoryLedger>,
}

impl LedgerUnitOfWork {
    pub fn new(ledger: Arc<InMemoryLedger>) -> Self {
        Self { ledger }
    }

    fn finish<E: DomainEvent>(
        &self,
        result: Result<(), UseCaseError>,
        subscription: &Subscription,
        event: E,
    ) -> UseCaseResult<E> {
        match result {
            Ok(()) => {
                debug!(
                    subscription_id = subscription.id,
                    event_id = %event.event_id(),
                    event_type = %event.event_type(),
                    version = subscription.version,
                    "Committed subscription change"
                );
                UseCaseResult::success(event)
            }
            Err(e) => {
                error!(
                    subscription_id = subscription.id,
                    event_type = %event.event_type(),
                    error = %e,
                    "Commit rejected"
                );
                UseCaseResult::failure(e)
            }
        }
    }
}

fn entry<E: DomainEvent, C: Serialize>(
    state: &LedgerState,
    subscription: &Subscription,
    event: &E,
    command: &C,
) -> LedgerEntry {
    LedgerEntry {
        subscription: subscription.clone(),
        event: Event::record(event, subscription.id, state.next_sequence()),
        audit_log: AuditLog::for_command(ENTITY_TYPE, subscription.id, event, command),
    }
}

#[async_trait]
impl UnitOfWork for LedgerUnitOfWork {
    async fn commit_create<E, C>(
        &self,
        subscription: &Subscription,
        event: E,
        command: &C,
    ) -> UseCaseResult<E>
    where
        E: DomainEvent + Serialize + Send + 'static,
        C: Serialize + Send + Sync,
    {
        let result = self
            .ledger
            .append::<UseCaseError>(|state| {
                if state.subscriptions.contains_key(&subscription.id) {
                    return Err(UseCaseError::business_rule_with_details(
                        codes::SUBSCRIPTION_ID_EXISTS,
                        format!("Subscription with ID '{}' already exists", subscription.id),
                        crate::details! { "subscriptionId" => subscription.id },
                    ));
                }
                Ok(entry(state, subscription, &event, command))
            })
            .await;

        self.finish(result, subscription, event)
    }

    async fn commit<E, C>(
        &self,
        subscription: &Subscription,
        event: E,
        command: &C,
    ) -> UseCaseResult<E>
    where
        E: DomainEvent + Serialize + Send + 'static,
        C: Serialize + Send + Sync,
    {
        let result = self
            .ledger
            .append::<UseCaseError>(|state| {
                let stored = state.subscriptions.get(&subscription.id).ok_or_else(|| {
                    UseCaseError::not_found_with_details(
                        codes::SUBSCRIPTION_NOT_FOUND,
                        format!("Subscription with ID '{}' not found", subscription.id),
                        crate::details! { "subscriptionId" => subscription.id },
                    )
                })?;

                if stored.version + 1 != subscription.version {
                    return Err(UseCaseError::concurrency(
                        codes::VERSION_CONFLICT,
                        format!(
                            "Subscription '{}' is at version {}, cannot commit version {}",
                            subscription.id, stored.version, subscription.version
                        ),
                    ));
                }

                // The staged record no longer matches what was loaded
                if !stored.same_agreement(subscription) {
                    return Err(UseCaseError::concurrency(
                        codes::IMMUTABLE_FIELD_CHANGED,
                        format!(
                            "Subscription '{}' changed a field fixed at creation",
                            subscription.id
                        ),
                    ));
                }

                Ok(entry(state, subscription, &event, command))
            })
            .await;

        self.finish(result, subscription, event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::entity::{SubscriptionTerms, Transition};
    use crate::subscription::operations::events::{ContractCreated, StatusChanged};
    use crate::usecase::ExecutionContext;

    #[derive(Serialize)]
    struct TestCommand {
        subscription_id: u64,
    }

    fn offer() -> Subscription {
        Subscription::offer(
            1,
            "0xproducer",
            "0xconsumer",
            "https://hello.world",
            SubscriptionTerms::new(1, 1, 1),
            vec![1, 2, 3, 4],
        )
    }

    async fn created() -> (LedgerUnitOfWork, Arc<InMemoryLedger>, Subscription) {
        let ledger = Arc::new(InMemoryLedger::new());
        let uow = LedgerUnitOfWork::new(ledger.clone());
        let sub = offer();
        let ctx = ExecutionContext::create("0xproducer");
        let result = uow
            .commit_create(&sub, ContractCreated::new(&ctx, &sub), &TestCommand { subscription_id: 1 })
            .await;
        assert!(result.is_success());
        (uow, ledger, sub)
    }

    #[tokio::test]
    async fn test_commit_create_writes_record_event_and_audit() {
        let (_, ledger, _) = created().await;

        ledger.read(|state| {
            assert_eq!(state.subscriptions.len(), 1);
            assert_eq!(state.events.len(), 1);
            assert_eq!(state.events[0].sequence, 1);
            assert_eq!(state.audit_logs.len(), 1);
            assert_eq!(state.audit_logs[0].operation, "TestCommand");
            assert_eq!(state.audit_logs[0].event_id, state.events[0].id);
        });
    }

    #[tokio::test]
    async fn test_commit_create_rejects_existing_id() {
        let (uow, ledger, sub) = created().await;
        let ctx = ExecutionContext::create("0xproducer");

        let err = uow
            .commit_create(&sub, ContractCreated::new(&ctx, &sub), &TestCommand { subscription_id: 1 })
            .await
            .unwrap_err();

        assert_eq!(err.code(), codes::SUBSCRIPTION_ID_EXISTS);
        assert_eq!(ledger.read(|s| s.events.len()), 1);
    }

    #[tokio::test]
    async fn test_commit_rejects_stale_version() {
        let (uow, ledger, sub) = created().await;
        let ctx = ExecutionContext::create("0xconsumer");

        let mut first = sub.clone();
        let previous = first.apply(Transition::Sign).unwrap();
        let event = StatusChanged::new(&ctx, &first, Transition::Sign, previous);
        assert!(uow.commit(&first, event, &TestCommand { subscription_id: 1 }).await.is_success());

        // Second writer started from the same version
        let mut second = sub.clone();
        let previous = second.apply(Transition::Cancel).unwrap();
        let event = StatusChanged::new(&ctx, &second, Transition::Cancel, previous);
        let err = uow
            .commit(&second, event, &TestCommand { subscription_id: 1 })
            .await
            .unwrap_err();

        assert_eq!(err.code(), codes::VERSION_CONFLICT);
        assert_eq!(ledger.read(|s| s.events.len()), 2);
    }

    #[tokio::test]
    async fn test_commit_rejects_changed_immutable_field() {
        let (uow, ledger, sub) = created().await;
        let ctx = ExecutionContext::create("0xconsumer");

        let mut tampered = sub.clone();
        let previous = tampered.apply(Transition::Sign).unwrap();
        tampered.consumer = "0xintruder".to_string();
        let event = StatusChanged::new(&ctx, &tampered, Transition::Sign, previous);

        let err = uow
            .commit(&tampered, event, &TestCommand { subscription_id: 1 })
            .await
            .unwrap_err();

        assert_eq!(err.code(), codes::IMMUTABLE_FIELD_CHANGED);
        assert!(matches!(err, UseCaseError::ConcurrencyError { .. }));
        assert!(matches!(
            crate::RegistryError::from(err),
            crate::RegistryError::Concurrency { .. }
        ));
        assert_eq!(ledger.read(|s| s.subscriptions[&1].consumer.clone()), "0xconsumer");
        assert_eq!(ledger.read(|s| s.events.len()), 1);
    }
}
