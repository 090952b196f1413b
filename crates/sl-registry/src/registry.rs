//! Subscription Registry
//!
//! The entry point callers use. Wires the use cases to one ledger and runs
//! every mutating operation under a single sequencer, so the ledger sees
//! operations one at a time in arrival order.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use crate::audit::AuditLog;
use crate::event::Event;
use crate::ledger::InMemoryLedger;
use crate::shared::error::{RegistryError, Result};
use crate::subscription::entity::Subscription;
use crate::subscription::operations::{
    CancelSubscriptionCommand, CancelSubscriptionUseCase, ContractCreated, ContractLimits,
    CreateSubscriptionContractCommand, CreateSubscriptionContractUseCase,
    ExpireSubscriptionCommand, ExpireSubscriptionUseCase, PauseSubscriptionCommand,
    PauseSubscriptionUseCase, ResumeSubscriptionCommand, ResumeSubscriptionUseCase,
    SignSubscriptionContractCommand, SignSubscriptionContractUseCase, StatusChanged,
};
use crate::subscription::SubscriptionRepository;
use crate::usecase::{ExecutionContext, LedgerUnitOfWork};

/// How to open a registry.
#[derive(Debug, Clone, Default)]
pub struct RegistrySettings {
    /// Snapshot file, journaled at `<path>.journal`; `None` keeps the
    /// ledger in memory only
    pub snapshot_path: Option<PathBuf>,
    pub limits: ContractLimits,
}

pub struct SubscriptionRegistry {
    ledger: Arc<InMemoryLedger>,
    repository: Arc<SubscriptionRepository>,
    sequencer: Mutex<()>,

    create: CreateSubscriptionContractUseCase<LedgerUnitOfWork>,
    sign: SignSubscriptionContractUseCase<LedgerUnitOfWork>,
    pause: PauseSubscriptionUseCase<LedgerUnitOfWork>,
    resume: ResumeSubscriptionUseCase<LedgerUnitOfWork>,
    cancel: CancelSubscriptionUseCase<LedgerUnitOfWork>,
    expire: ExpireSubscriptionUseCase<LedgerUnitOfWork>,
}

impl SubscriptionRegistry {
    /// Volatile registry with default limits.
    pub fn in_memory() -> Self {
        Self::with_ledger(Arc::new(InMemoryLedger::new()), ContractLimits::default())
    }

    /// Open a registry, restoring its snapshot and journal when one is
    /// configured.
    pub async fn open(settings: RegistrySettings) -> Result<Self> {
        let ledger = match &settings.snapshot_path {
            Some(path) => InMemoryLedger::open(path.clone()).await?,
            None => InMemoryLedger::new(),
        };
        info!(
            persistent = settings.snapshot_path.is_some(),
            max_endpoint_uri_length = settings.limits.max_endpoint_uri_length,
            max_payload_bytes = settings.limits.max_payload_bytes,
            "Subscription registry opened"
        );
        Ok(Self::with_ledger(Arc::new(ledger), settings.limits))
    }

    fn with_ledger(ledger: Arc<InMemoryLedger>, limits: ContractLimits) -> Self {
        let repository = Arc::new(SubscriptionRepository::new(ledger.clone()));
        let uow = Arc::new(LedgerUnitOfWork::new(ledger.clone()));

        Self {
            create: CreateSubscriptionContractUseCase::new(repository.clone(), uow.clone(), limits),
            sign: SignSubscriptionContractUseCase::new(repository.clone(), uow.clone()),
            pause: PauseSubscriptionUseCase::new(repository.clone(), uow.clone()),
            resume: ResumeSubscriptionUseCase::new(repository.clone(), uow.clone()),
            cancel: CancelSubscriptionUseCase::new(repository.clone(), uow.clone()),
            expire: ExpireSubscriptionUseCase::new(repository.clone(), uow),
            ledger,
            repository,
            sequencer: Mutex::new(()),
        }
    }

    /// Offer a subscription; the caller becomes its producer.
    pub async fn create_subscription_contract(
        &self,
        ctx: ExecutionContext,
        command: CreateSubscriptionContractCommand,
    ) -> Result<ContractCreated> {
        let _turn = self.sequencer.lock().await;
        Ok(self.create.execute(command, ctx).await.into_result()?)
    }

    pub async fn sign_subscription_contract(
        &self,
        ctx: ExecutionContext,
        subscription_id: u64,
    ) -> Result<StatusChanged> {
        let _turn = self.sequencer.lock().await;
        let command = SignSubscriptionContractCommand { subscription_id };
        Ok(self.sign.execute(command, ctx).await.into_result()?)
    }

    pub async fn pause_subscription(
        &self,
        ctx: ExecutionContext,
        subscription_id: u64,
    ) -> Result<StatusChanged> {
        let _turn = self.sequencer.lock().await;
        let command = PauseSubscriptionCommand { subscription_id };
        Ok(self.pause.execute(command, ctx).await.into_result()?)
    }

    pub async fn resume_subscription(
        &self,
        ctx: ExecutionContext,
        subscription_id: u64,
    ) -> Result<StatusChanged> {
        let _turn = self.sequencer.lock().await;
        let command = ResumeSubscriptionCommand { subscription_id };
        Ok(self.resume.execute(command, ctx).await.into_result()?)
    }

    pub async fn cancel_subscription(
        &self,
        ctx: ExecutionContext,
        subscription_id: u64,
    ) -> Result<StatusChanged> {
        let _turn = self.sequencer.lock().await;
        let command = CancelSubscriptionCommand { subscription_id };
        Ok(self.cancel.execute(command, ctx).await.into_result()?)
    }

    pub async fn expire_subscription(
        &self,
        ctx: ExecutionContext,
        subscription_id: u64,
    ) -> Result<StatusChanged> {
        let _turn = self.sequencer.lock().await;
        let command = ExpireSubscriptionCommand { subscription_id };
        Ok(self.expire.execute(command, ctx).await.into_result()?)
    }

    /// Status ordinal: 0 Offered, 1 Signed, 2 Paused, 3 Cancelled, 4 Expired.
    pub async fn get_subscription_status(&self, subscription_id: u64) -> Result<u8> {
        Ok(self.get_subscription(subscription_id).await?.status.ordinal())
    }

    pub async fn get_subscription(&self, subscription_id: u64) -> Result<Subscription> {
        self.repository
            .find_by_id(subscription_id)
            .await?
            .ok_or_else(|| {
                RegistryError::not_found(format!("Subscription with ID '{}' not found", subscription_id))
            })
    }

    /// Fold the journal into the snapshot. No-op for a volatile registry.
    pub async fn compact(&self) -> Result<()> {
        self.ledger.compact().await
    }

    pub fn repository(&self) -> &SubscriptionRepository {
        &self.repository
    }

    /// The full event log in commit order.
    pub fn events(&self) -> Vec<Event> {
        self.ledger.read(|state| state.events.clone())
    }

    pub fn events_for(&self, subscription_id: u64) -> Vec<Event> {
        self.ledger.read(|state| {
            state
                .events
                .iter()
                .filter(|e| e.subscription_id == subscription_id)
                .cloned()
                .collect()
        })
    }

    pub fn audit_logs(&self) -> Vec<AuditLog> {
        self.ledger.read(|state| state.audit_logs.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_status_of_unknown_subscription() {
        let registry = SubscriptionRegistry::in_memory();
        assert!(matches!(
            registry.get_subscription_status(1).await,
            Err(RegistryError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_open_without_snapshot_is_volatile() {
        let registry = assert_ok!(SubscriptionRegistry::open(RegistrySettings::default()).await);
        assert!(registry.events().is_empty());
        assert!(registry.audit_logs().is_empty());
    }

    #[tokio::test]
    async fn test_limits_reach_create() {
        let registry = assert_ok!(SubscriptionRegistry::open(RegistrySettings {
            snapshot_path: None,
            limits: ContractLimits {
                max_endpoint_uri_length: 8,
                max_payload_bytes: 16,
            },
        })
        .await);

        let err = assert_err!(
            registry
                .create_subscription_contract(
                    ExecutionContext::create("0xproducer"),
                    CreateSubscriptionContractCommand {
                        consumer: "0xconsumer".to_string(),
                        subscription_id: 1,
                        endpoint_uri: "https://hello.world".to_string(),
                        term1: 0,
                        term2: 0,
                        term3: 0,
                        payload: Vec::new(),
                    },
                )
                .await
        );
        assert!(matches!(err, RegistryError::Validation { .. }));
    }
}
