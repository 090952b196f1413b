//! Subscription Domain Events

use serde::{Deserialize, Serialize};

use crate::impl_domain_event;
use crate::subscription::entity::{Subscription, SubscriptionStatus, SubscriptionTerms, Transition};
use crate::usecase::domain_event::EventMetadata;
use crate::usecase::ExecutionContext;

const SPEC_VERSION: &str = "1.0";
const SOURCE: &str = "subledger:subscription";
const AGGREGATE: &str = "subscription";

/// Emitted when a producer offers a new subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractCreated {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub subscription_id: u64,
    pub producer: String,
    pub consumer: String,
    pub endpoint_uri: String,
    pub terms: SubscriptionTerms,
    #[serde(with = "crate::shared::hex_bytes")]
    pub payload: Vec<u8>,
    pub status: SubscriptionStatus,
}

impl_domain_event!(ContractCreated);

impl ContractCreated {
    pub const EVENT_TYPE: &'static str = "subledger:subscription:contract-created";

    pub fn new(ctx: &ExecutionContext, subscription: &Subscription) -> Self {
        Self {
            metadata: EventMetadata::from_context(
                ctx,
                Self::EVENT_TYPE,
                SPEC_VERSION,
                SOURCE,
                AGGREGATE,
                subscription.id,
            ),
            subscription_id: subscription.id,
            producer: subscription.producer.clone(),
            consumer: subscription.consumer.clone(),
            endpoint_uri: subscription.endpoint_uri.clone(),
            terms: subscription.terms,
            payload: subscription.payload.clone(),
            status: subscription.status,
        }
    }
}

/// Emitted on every committed lifecycle transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChanged {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub subscription_id: u64,
    pub transition: Transition,
    pub previous_status: SubscriptionStatus,
    pub new_status: SubscriptionStatus,
    /// Ordinal of `new_status`
    pub status_code: u8,
}

impl_domain_event!(StatusChanged);

impl StatusChanged {
    pub const EVENT_TYPE: &'static str = "subledger:subscription:status-changed";

    pub fn new(
        ctx: &ExecutionContext,
        subscription: &Subscription,
        transition: Transition,
        previous_status: SubscriptionStatus,
    ) -> Self {
        Self {
            metadata: EventMetadata::from_context(
                ctx,
                Self::EVENT_TYPE,
                SPEC_VERSION,
                SOURCE,
                AGGREGATE,
                subscription.id,
            ),
            subscription_id: subscription.id,
            transition,
            previous_status,
            new_status: subscription.status,
            status_code: subscription.status.ordinal(),
        }
    }
}
