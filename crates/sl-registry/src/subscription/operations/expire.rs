//! Expire Subscription Use Case
//!
//! The producer ends a subscription that was signed. Offers that were never
//! signed cannot expire; the consumer cancels those instead.

use std::sync::Arc;
use serde::{Deserialize, Serialize};

use crate::subscription::entity::Transition;
use crate::SubscriptionRepository;
use crate::usecase::{ExecutionContext, UnitOfWork, UseCaseResult};
use super::events::StatusChanged;
use super::transition::execute_transition;

/// Command for expiring a subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpireSubscriptionCommand {
    pub subscription_id: u64,
}

pub struct ExpireSubscriptionUseCase<U: UnitOfWork> {
    subscription_repo: Arc<SubscriptionRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> ExpireSubscriptionUseCase<U> {
    pub fn new(subscription_repo: Arc<SubscriptionRepository>, unit_of_work: Arc<U>) -> Self {
        Self {
            subscription_repo,
            unit_of_work,
        }
    }

    pub async fn execute(
        &self,
        command: ExpireSubscriptionCommand,
        ctx: ExecutionContext,
    ) -> UseCaseResult<StatusChanged> {
        execute_transition(
            &self.subscription_repo,
            self.unit_of_work.as_ref(),
            Transition::Expire,
            command.subscription_id,
            &command,
            &ctx,
        )
        .await
    }
}
