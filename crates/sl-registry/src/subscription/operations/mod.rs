//! Subscription Operations
//!
//! Use cases for the subscription lifecycle.

pub mod events;
pub mod create;
mod transition;
pub mod sign;
pub mod pause;
pub mod resume;
pub mod cancel;
pub mod expire;

pub use events::*;
pub use create::{ContractLimits, CreateSubscriptionContractCommand, CreateSubscriptionContractUseCase};
pub use sign::{SignSubscriptionContractCommand, SignSubscriptionContractUseCase};
pub use pause::{PauseSubscriptionCommand, PauseSubscriptionUseCase};
pub use resume::{ResumeSubscriptionCommand, ResumeSubscriptionUseCase};
pub use cancel::{CancelSubscriptionCommand, CancelSubscriptionUseCase};
pub use expire::{ExpireSubscriptionCommand, ExpireSubscriptionUseCase};

/// Machine codes carried by subscription use case errors.
pub mod codes {
    pub const PRINCIPAL_REQUIRED: &str = "PRINCIPAL_REQUIRED";
    pub const CONSUMER_REQUIRED: &str = "CONSUMER_REQUIRED";
    pub const ENDPOINT_URI_REQUIRED: &str = "ENDPOINT_URI_REQUIRED";
    pub const ENDPOINT_URI_TOO_LONG: &str = "ENDPOINT_URI_TOO_LONG";
    pub const PAYLOAD_TOO_LARGE: &str = "PAYLOAD_TOO_LARGE";
    pub const SUBSCRIPTION_ID_EXISTS: &str = "SUBSCRIPTION_ID_EXISTS";
    pub const SUBSCRIPTION_NOT_FOUND: &str = "SUBSCRIPTION_NOT_FOUND";
    pub const NOT_SUBSCRIPTION_CONSUMER: &str = "NOT_SUBSCRIPTION_CONSUMER";
    pub const NOT_SUBSCRIPTION_PRODUCER: &str = "NOT_SUBSCRIPTION_PRODUCER";
    pub const INVALID_TRANSITION: &str = "INVALID_TRANSITION";
    pub const VERSION_CONFLICT: &str = "VERSION_CONFLICT";
    pub const IMMUTABLE_FIELD_CHANGED: &str = "IMMUTABLE_FIELD_CHANGED";
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use super::create::{ContractLimits, CreateSubscriptionContractCommand, CreateSubscriptionContractUseCase};
    use crate::ledger::InMemoryLedger;
    use crate::usecase::{ExecutionContext, LedgerUnitOfWork};
    use crate::SubscriptionRepository;

    pub const PRODUCER: &str = "0xproducer";
    pub const CONSUMER: &str = "0xconsumer";
    pub const STRANGER: &str = "0xstranger";

    pub struct Fixture {
        pub ledger: Arc<InMemoryLedger>,
        pub repo: Arc<SubscriptionRepository>,
        pub uow: Arc<LedgerUnitOfWork>,
    }

    /// Empty ledger with subscription 1 offered from PRODUCER to CONSUMER.
    pub async fn offered() -> Fixture {
        let ledger = Arc::new(InMemoryLedger::new());
        let repo = Arc::new(SubscriptionRepository::new(ledger.clone()));
        let uow = Arc::new(LedgerUnitOfWork::new(ledger.clone()));

        CreateSubscriptionContractUseCase::new(repo.clone(), uow.clone(), ContractLimits::default())
            .execute(
                CreateSubscriptionContractCommand {
                    consumer: CONSUMER.to_string(),
                    subscription_id: 1,
                    endpoint_uri: "https://hello.world".to_string(),
                    term1: 1,
                    term2: 1,
                    term3: 1,
                    payload: vec![1, 2, 3, 4],
                },
                ExecutionContext::create(PRODUCER),
            )
            .await
            .unwrap();

        Fixture { ledger, repo, uow }
    }
}
