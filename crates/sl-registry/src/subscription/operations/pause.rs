//! Pause Subscription Use Case

use std::sync::Arc;
use serde::{Deserialize, Serialize};

use crate::subscription::entity::Transition;
use crate::SubscriptionRepository;
use crate::usecase::{ExecutionContext, UnitOfWork, UseCaseResult};
use super::events::StatusChanged;
use super::transition::execute_transition;

/// Command for pausing a subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PauseSubscriptionCommand {
    /// Subscription ID to pause
    pub subscription_id: u64,
}

/// Use case for pausing a signed subscription.
pub struct PauseSubscriptionUseCase<U: UnitOfWork> {
    subscription_repo: Arc<SubscriptionRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> PauseSubscriptionUseCase<U> {
    pub fn new(subscription_repo: Arc<SubscriptionRepository>, unit_of_work: Arc<U>) -> Self {
        Self {
            subscription_repo,
            unit_of_work,
        }
    }

    pub async fn execute(
        &self,
        command: PauseSubscriptionCommand,
        ctx: ExecutionContext,
    ) -> UseCaseResult<StatusChanged> {
        execute_transition(
            &self.subscription_repo,
            self.unit_of_work.as_ref(),
            Transition::Pause,
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
    use crate::subscription::operations::sign::{SignSubscriptionContractCommand, SignSubscriptionContractUseCase};
    use crate::subscription::operations::testing::{offered, CONSUMER, PRODUCER};

    #[test]
    fn test_command_serialization() {
        let json = serde_json::to_string(&PauseSubscriptionCommand { subscription_id: 9 }).unwrap();
        assert_eq!(json, r#"{"subscriptionId":9}"#);
    }

    #[tokio::test]
    async fn test_cannot_pause_offer() {
        let f = offered().await;
        let uc = PauseSubscriptionUseCase::new(f.repo.clone(), f.uow.clone());

        let err = uc
            .execute(PauseSubscriptionCommand { subscription_id: 1 }, ExecutionContext::create(CONSUMER))
            .await
            .unwrap_err();

        assert_eq!(err.code(), codes::INVALID_TRANSITION);
        assert_eq!(err.details()["status"], "OFFERED");
    }

    #[tokio::test]
    async fn test_pause_signed() {
        let f = offered().await;
        SignSubscriptionContractUseCase::new(f.repo.clone(), f.uow.clone())
            .execute(SignSubscriptionContractCommand { subscription_id: 1 }, ExecutionContext::create(CONSUMER))
            .await
            .unwrap();
        let uc = PauseSubscriptionUseCase::new(f.repo.clone(), f.uow.clone());

        // Authorization is checked before state
        let err = uc
            .execute(PauseSubscriptionCommand { subscription_id: 1 }, ExecutionContext::create(PRODUCER))
            .await
            .unwrap_err();
        assert_eq!(err.code(), codes::NOT_SUBSCRIPTION_CONSUMER);

        let event = uc
            .execute(PauseSubscriptionCommand { subscription_id: 1 }, ExecutionContext::create(CONSUMER))
            .await
            .unwrap();
        assert_eq!(event.new_status, SubscriptionStatus::Paused);
        assert_eq!(event.status_code, 2);
    }
}
