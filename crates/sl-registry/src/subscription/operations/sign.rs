//! Sign Subscription Contract Use Case

use std::sync::Arc;
use serde::{Deserialize, Serialize};

use crate::subscription::entity::Transition;
use crate::SubscriptionRepository;
use crate::usecase::{ExecutionContext, UnitOfWork, UseCaseResult};
use super::events::StatusChanged;
use super::transition::execute_transition;

/// Command for accepting an offered subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignSubscriptionContractCommand {
    /// Subscription ID to sign
    pub subscription_id: u64,
}

/// Use case for signing a subscription. Consumer only, from `Offered`.
pub struct SignSubscriptionContractUseCase<U: UnitOfWork> {
    subscription_repo: Arc<SubscriptionRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> SignSubscriptionContractUseCase<U> {
    pub fn new(subscription_repo: Arc<SubscriptionRepository>, unit_of_work: Arc<U>) -> Self {
        Self {
            subscription_repo,
            unit_of_work,
        }
    }

    pub async fn execute(
        &self,
        command: SignSubscriptionContractCommand,
        ctx: ExecutionContext,
    ) -> UseCaseResult<StatusChanged> {
        execute_transition(
            &self.subscription_repo,
            self.unit_of_work.as_ref(),
            Transition::Sign,
            command.subscription_id,
            &command,
            &ctx,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::entity::SubscriptionStatus;
    use crate::subscription::operations::codes;
    use crate::subscription::operations::testing::{offered, CONSUMER, PRODUCER, STRANGER};
    use crate::usecase::DomainEvent;

    fn sign(id: u64) -> SignSubscriptionContractCommand {
        SignSubscriptionContractCommand { subscription_id: id }
    }

    #[tokio::test]
    async fn test_consumer_signs_offer() {
        let f = offered().await;
        let uc = SignSubscriptionContractUseCase::new(f.repo.clone(), f.uow.clone());

        let event = uc.execute(sign(1), ExecutionContext::create(CONSUMER)).await.unwrap();

        assert_eq!(event.previous_status, SubscriptionStatus::Offered);
        assert_eq!(event.new_status, SubscriptionStatus::Signed);
        assert_eq!(event.principal_id(), CONSUMER);
        let stored = f.repo.find_by_id(1).await.unwrap().unwrap();
        assert_eq!(stored.status, SubscriptionStatus::Signed);
        assert_eq!(stored.version, 2);
    }

    #[tokio::test]
    async fn test_only_consumer_may_sign() {
        let f = offered().await;
        let uc = SignSubscriptionContractUseCase::new(f.repo.clone(), f.uow.clone());

        for principal in [PRODUCER, STRANGER] {
            let err = uc
                .execute(sign(1), ExecutionContext::create(principal))
                .await
                .unwrap_err();
            assert_eq!(err.code(), codes::NOT_SUBSCRIPTION_CONSUMER);
        }

        let stored = f.repo.find_by_id(1).await.unwrap().unwrap();
        assert_eq!(stored.status, SubscriptionStatus::Offered);
    }

    #[tokio::test]
    async fn test_sign_twice_is_invalid() {
        let f = offered().await;
        let uc = SignSubscriptionContractUseCase::new(f.repo.clone(), f.uow.clone());

        uc.execute(sign(1), ExecutionContext::create(CONSUMER)).await.unwrap();
        let err = uc
            .execute(sign(1), ExecutionContext::create(CONSUMER))
            .await
            .unwrap_err();

        assert_eq!(err.code(), codes::INVALID_TRANSITION);
        assert_eq!(f.ledger.read(|s| s.events.len()), 2);
    }

    #[tokio::test]
    async fn test_unknown_id_checked_before_caller() {
        let f = offered().await;
        let uc = SignSubscriptionContractUseCase::new(f.repo.clone(), f.uow.clone());

        let err = uc
            .execute(sign(42), ExecutionContext::create(STRANGER))
            .await
            .unwrap_err();
        assert_eq!(err.code(), codes::SUBSCRIPTION_NOT_FOUND);
    }
}
