//! Resume Subscription Use Case

use std::sync::Arc;
use serde::{Deserialize, Serialize};

use crate::subscription::entity::Transition;
use crate::SubscriptionRepository;
use crate::usecase::{ExecutionContext, UnitOfWork, UseCaseResult};
use super::events::StatusChanged;
use super::transition::execute_transition;

/// Command for resuming a paused subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeSubscriptionCommand {
    pub subscription_id: u64,
}

/// Use case for resuming a subscription back to `Signed`.
pub struct ResumeSubscriptionUseCase<U: UnitOfWork> {
    subscription_repo: Arc<SubscriptionRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> ResumeSubscriptionUseCase<U> {
    pub fn new(subscription_repo: Arc<SubscriptionRepository>, unit_of_work: Arc<U>) -> Self {
        Self {
            subscription_repo,
            unit_of_work,
        }
    }

    pub async fn execute(
        &self,
        command: ResumeSubscriptionCommand,
        ctx: ExecutionContext,
    ) -> UseCaseResult<StatusChanged> {
        execute_transition(
            &self.subscription_repo,
            self.unit_of_work.as_ref(),
            Transition::Resume,
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
    use crate::subscription::operations::codes;
    use crate::subscription::operations::testing::{offered, CONSUMER};

    #[tokio::test]
    async fn test_resume_requires_paused() {
        let f = offered().await;
        let uc = ResumeSubscriptionUseCase::new(f.repo.clone(), f.uow.clone());

        let err = uc
            .execute(ResumeSubscriptionCommand { subscription_id: 1 }, ExecutionContext::create(CONSUMER))
            .await
            .unwrap_err();
        assert_eq!(err.code(), codes::INVALID_TRANSITION);
    }
}
