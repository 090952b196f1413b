//! Cancel Subscription Use Case
//!
//! The consumer walks away from an offer or a running subscription.
//! `Cancelled` is terminal; the record stays in the ledger.

use std::sync::Arc;
use serde::{Deserialize, Serialize};

use crate::subscription::entity::Transition;
use crate::SubscriptionRepository;
use crate::usecase::{ExecutionContext, UnitOfWork, UseCaseResult};
use super::events::StatusChanged;
use super::transition::execute_transition;

/// Command for cancelling a subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelSubscriptionCommand {
    pub subscription_id: u64,
}

pub struct CancelSubscriptionUseCase<U: UnitOfWork> {
    subscription_repo: Arc<SubscriptionRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> CancelSubscriptionUseCase<U> {
    pub fn new(subscription_repo: Arc<SubscriptionRepository>, unit_of_work: Arc<U>) -> Self {
        Self {
            subscription_repo,
            unit_of_work,
        }
    }

    pub async fn execute(
        &self,
        command: CancelSubscriptionCommand,
        ctx: ExecutionContext,
    ) -> UseCaseResult<StatusChanged> {
        execute_transition(
            &self.subscription_repo,
            self.unit_of_work.as_ref(),
            Transition::Cancel,
            command.subscription_id,
            &command,
            &ctx,
        )
        .await
    }
}
