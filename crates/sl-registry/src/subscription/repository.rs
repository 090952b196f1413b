//! Subscription Repository
//!
//! Read side of the ledger. Writes go through the unit of work only.

use std::sync::Arc;

use crate::ledger::InMemoryLedger;
use crate::shared::error::Result;
use crate::subscription::entity::{Subscription, SubscriptionStatus};

pub struct SubscriptionRepository {
    ledger: Arc<InMemoryLedger>,
}

impl SubscriptionRepository {
    pub fn new(ledger: Arc<InMemoryLedger>) -> Self {
        Self { ledger }
    }

    pub async fn find_by_id(&self, id: u64) -> Result<Option<Subscription>> {
        Ok(self.ledger.read(|state| state.subscriptions.get(&id).cloned()))
    }

    pub async fn exists(&self, id: u64) -> Result<bool> {
        Ok(self.ledger.read(|state| state.subscriptions.contains_key(&id)))
    }

    pub async fn find_by_producer(&self, producer: &str) -> Result<Vec<Subscription>> {
        Ok(self.filter(|s| s.producer == producer))
    }

    pub async fn find_by_consumer(&self, consumer: &str) -> Result<Vec<Subscription>> {
        Ok(self.filter(|s| s.consumer == consumer))
    }

    pub async fn find_by_status(&self, status: SubscriptionStatus) -> Result<Vec<Subscription>> {
        Ok(self.filter(|s| s.status == status))
    }

    /// All subscriptions in id order.
    pub async fn find_all(&self) -> Result<Vec<Subscription>> {
        Ok(self.filter(|_| true))
    }

    fn filter(&self, predicate: impl Fn(&Subscription) -> bool) -> Vec<Subscription> {
        self.ledger.read(|state| {
            state
                .subscriptions
                .values()
                .filter(|s| predicate(s))
                .cloned()
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::testing;
    use crate::shared::error::RegistryError;
    use crate::subscription::entity::{SubscriptionTerms, Transition};
    use tokio_test::assert_ok;

    async fn seeded() -> SubscriptionRepository {
        let ledger = Arc::new(InMemoryLedger::new());
        for (id, producer, consumer) in [(3, "0xa", "0xb"), (1, "0xa", "0xc"), (2, "0xd", "0xb")] {
            let mut sub = Subscription::offer(
                id,
                producer,
                consumer,
                "https://hello.world",
                SubscriptionTerms::default(),
                Vec::new(),
            );
            if id == 2 {
                sub.apply(Transition::Sign).unwrap();
            }
            ledger
                .append(|state| Ok::<_, RegistryError>(testing::entry(sub, state.next_sequence())))
                .await
                .unwrap();
        }
        SubscriptionRepository::new(ledger)
    }

    fn ids(subs: Vec<Subscription>) -> Vec<u64> {
        subs.into_iter().map(|s| s.id).collect()
    }

    #[tokio::test]
    async fn test_find_by_id_and_exists() {
        let repo = seeded().await;
        let found = assert_ok!(repo.find_by_id(2).await);
        assert_eq!(found.map(|s| s.consumer), Some("0xb".to_string()));
        assert!(assert_ok!(repo.find_by_id(9).await).is_none());
        assert!(assert_ok!(repo.exists(1).await));
        assert!(!assert_ok!(repo.exists(9).await));
    }

    #[tokio::test]
    async fn test_queries_return_id_order() {
        let repo = seeded().await;
        assert_eq!(ids(repo.find_all().await.unwrap()), vec![1, 2, 3]);
        assert_eq!(ids(repo.find_by_producer("0xa").await.unwrap()), vec![1, 3]);
        assert_eq!(ids(repo.find_by_consumer("0xb").await.unwrap()), vec![2, 3]);
        assert_eq!(
            ids(repo.find_by_status(SubscriptionStatus::Signed).await.unwrap()),
            vec![2]
        );
    }
}
