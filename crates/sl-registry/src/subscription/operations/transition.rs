//! Shared flow for lifecycle transitions.
//!
//! Checks run in a fixed order: the record must exist, the caller must be
//! the party the transition belongs to, and only then is the source state
//! checked. The first failing check decides the error.

use serde::Serialize;
use tracing::{info, warn};

use crate::details;
use crate::subscription::entity::{Party, Transition};
use crate::SubscriptionRepository;
use crate::usecase::{ExecutionContext, UnitOfWork, UseCaseError, UseCaseResult};
use super::codes;
use super::events::StatusChanged;

pub(super) async fn execute_transition<U, C>(
    subscription_repo: &SubscriptionRepository,
    unit_of_work: &U,
    transition: Transition,
    subscription_id: u64,
    command: &C,
    ctx: &ExecutionContext,
) -> UseCaseResult<StatusChanged>
where
    U: UnitOfWork,
    C: Serialize + Send + Sync,
{
    let mut subscription = match subscription_repo.find_by_id(subscription_id).await {
        Ok(Some(s)) => s,
        Ok(None) => {
            warn!(subscription_id, %transition, "Subscription not found");
            return UseCaseResult::failure(UseCaseError::not_found_with_details(
                codes::SUBSCRIPTION_NOT_FOUND,
                format!("Subscription with ID '{}' not found", subscription_id),
                details! { "subscriptionId" => subscription_id },
            ));
        }
        Err(e) => {
            return UseCaseResult::failure(UseCaseError::commit(format!(
                "Failed to fetch subscription: {}",
                e
            )));
        }
    };

    if !subscription.authorizes(transition, &ctx.principal_id) {
        let party = transition.authorized_party();
        warn!(
            subscription_id,
            %transition,
            principal_id = %ctx.principal_id,
            "Caller is not the {} of the subscription",
            party
        );
        let code = match party {
            Party::Producer => codes::NOT_SUBSCRIPTION_PRODUCER,
            Party::Consumer => codes::NOT_SUBSCRIPTION_CONSUMER,
        };
        return UseCaseResult::failure(UseCaseError::authorization_with_details(
            code,
            format!("Only the {} may {} subscription '{}'", party, transition, subscription_id),
            details! {
                "subscriptionId" => subscription_id,
                "principalId" => ctx.principal_id.as_str(),
            },
        ));
    }

    let previous = match subscription.apply(transition) {
        Ok(previous) => previous,
        Err(rejected) => {
            warn!(subscription_id, %transition, status = %rejected.from, "Invalid transition");
            return UseCaseResult::failure(UseCaseError::business_rule_with_details(
                codes::INVALID_TRANSITION,
                format!("Subscription '{}': {}", subscription_id, rejected),
                details! {
                    "subscriptionId" => subscription_id,
                    "transition" => transition.as_str(),
                    "status" => rejected.from.as_str(),
                },
            ));
        }
    };

    let event = StatusChanged::new(ctx, &subscription, transition, previous);

    let result = unit_of_work.commit(&subscription, event, command).await;
    if result.is_success() {
        info!(
            subscription_id,
            %transition,
            from = %previous,
            to = %subscription.status,
            principal_id = %ctx.principal_id,
            "Subscription status changed"
        );
    }
    result
}
