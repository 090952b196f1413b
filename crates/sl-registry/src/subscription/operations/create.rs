//! Create Subscription Contract Use Case

use std::sync::Arc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::details;
use crate::subscription::entity::{Subscription, SubscriptionTerms};
use crate::SubscriptionRepository;
use crate::usecase::{
    ExecutionContext, UnitOfWork, UseCaseError, UseCaseResult,
};
use super::codes;
use super::events::ContractCreated;

/// Default upper bound on `endpoint_uri`, in characters.
pub const DEFAULT_MAX_ENDPOINT_URI_LENGTH: usize = 2048;

/// Default upper bound on `payload`, in bytes.
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 64 * 1024;

/// Size limits applied to new contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractLimits {
    pub max_endpoint_uri_length: usize,
    pub max_payload_bytes: usize,
}

impl Default for ContractLimits {
    fn default() -> Self {
        Self {
            max_endpoint_uri_length: DEFAULT_MAX_ENDPOINT_URI_LENGTH,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }
}

/// Command for offering a new subscription. The caller becomes the producer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionContractCommand {
    /// Principal that may sign the offer
    pub consumer: String,

    /// Caller-chosen id, must be unused
    pub subscription_id: u64,

    /// Descriptor of the subscribed service
    pub endpoint_uri: String,

    pub term1: u64,
    pub term2: u64,
    pub term3: u64,

    #[serde(with = "crate::shared::hex_bytes")]
    pub payload: Vec<u8>,
}

/// Use case for offering a subscription.
pub struct CreateSubscriptionContractUseCase<U: UnitOfWork> {
    subscription_repo: Arc<SubscriptionRepository>,
    unit_of_work: Arc<U>,
    limits: ContractLimits,
}

impl<U: UnitOfWork> CreateSubscriptionContractUseCase<U> {
    pub fn new(
        subscription_repo: Arc<SubscriptionRepository>,
        unit_of_work: Arc<U>,
        limits: ContractLimits,
    ) -> Self {
        Self {
            subscription_repo,
            unit_of_work,
            limits,
        }
    }

    pub async fn execute(
        &self,
        command: CreateSubscriptionContractCommand,
        ctx: ExecutionContext,
    ) -> UseCaseResult<ContractCreated> {
        if let Err(e) = self.validate(&command, &ctx) {
            warn!(
                subscription_id = command.subscription_id,
                principal_id = %ctx.principal_id,
                code = %e.code(),
                "Rejected subscription contract"
            );
            return UseCaseResult::failure(e);
        }

        // Business rule: ids are never reused, terminal records included
        match self.subscription_repo.exists(command.subscription_id).await {
            Ok(false) => {}
            Ok(true) => {
                warn!(
                    subscription_id = command.subscription_id,
                    principal_id = %ctx.principal_id,
                    "Subscription id already in use"
                );
                return UseCaseResult::failure(UseCaseError::business_rule_with_details(
                    codes::SUBSCRIPTION_ID_EXISTS,
                    format!("Subscription with ID '{}' already exists", command.subscription_id),
                    details! { "subscriptionId" => command.subscription_id },
                ));
            }
            Err(e) => {
                return UseCaseResult::failure(UseCaseError::commit(format!(
                    "Failed to check subscription: {}",
                    e
                )));
            }
        }

        let subscription = Subscription::offer(
            command.subscription_id,
            ctx.principal_id.clone(),
            command.consumer.clone(),
            command.endpoint_uri.clone(),
            SubscriptionTerms::new(command.term1, command.term2, command.term3),
            command.payload.clone(),
        );

        let event = ContractCreated::new(&ctx, &subscription);

        let result = self.unit_of_work.commit_create(&subscription, event, &command).await;
        if result.is_success() {
            info!(
                subscription_id = subscription.id,
                producer = %subscription.producer,
                consumer = %subscription.consumer,
                "Subscription offered"
            );
        }
        result
    }

    fn validate(
        &self,
        command: &CreateSubscriptionContractCommand,
        ctx: &ExecutionContext,
    ) -> Result<(), UseCaseError> {
        if ctx.principal_id.trim().is_empty() {
            return Err(UseCaseError::validation(
                codes::PRINCIPAL_REQUIRED,
                "Calling principal is required",
            ));
        }

        if command.consumer.trim().is_empty() {
            return Err(UseCaseError::validation(
                codes::CONSUMER_REQUIRED,
                "Consumer is required",
            ));
        }

        if command.endpoint_uri.trim().is_empty() {
            return Err(UseCaseError::validation(
                codes::ENDPOINT_URI_REQUIRED,
                "Endpoint URI is required",
            ));
        }

        let uri_length = command.endpoint_uri.chars().count();
        if uri_length > self.limits.max_endpoint_uri_length {
            return Err(UseCaseError::validation_with_details(
                codes::ENDPOINT_URI_TOO_LONG,
                format!(
                    "Endpoint URI must be at most {} characters",
                    self.limits.max_endpoint_uri_length
                ),
                details! { "length" => uri_length, "max" => self.limits.max_endpoint_uri_length },
            ));
        }

        if command.payload.len() > self.limits.max_payload_bytes {
            return Err(UseCaseError::validation_with_details(
                codes::PAYLOAD_TOO_LARGE,
                format!("Payload must be at most {} bytes", self.limits.max_payload_bytes),
                details! { "size" => command.payload.len(), "max" => self.limits.max_payload_bytes },
            ));
        }

        Ok(())
    }
}
