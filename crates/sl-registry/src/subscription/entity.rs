//! Subscription Entity
//!
//! A producer/consumer agreement and the lifecycle it moves through:
//!
//! ```text
//! Offered ──sign──► Signed ──pause──► Paused
//!                   Signed ◄─resume── Paused
//! Offered | Signed | Paused ──cancel──► Cancelled   (consumer)
//!           Signed | Paused ──expire──► Expired     (producer)
//! ```
//!
//! `Cancelled` and `Expired` are terminal. Records are never deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Subscription status.
///
/// The ordinal encoding (`0=Offered, 1=Signed, 2=Paused, 3=Cancelled,
/// 4=Expired`) is part of the read interface and must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    Offered,
    Signed,
    Paused,
    Cancelled,
    Expired,
}

impl SubscriptionStatus {
    pub const ALL: [SubscriptionStatus; 5] = [
        SubscriptionStatus::Offered,
        SubscriptionStatus::Signed,
        SubscriptionStatus::Paused,
        SubscriptionStatus::Cancelled,
        SubscriptionStatus::Expired,
    ];

    pub fn ordinal(self) -> u8 {
        match self {
            SubscriptionStatus::Offered => 0,
            SubscriptionStatus::Signed => 1,
            SubscriptionStatus::Paused => 2,
            SubscriptionStatus::Cancelled => 3,
            SubscriptionStatus::Expired => 4,
        }
    }

    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        Self::ALL.get(ordinal as usize).copied()
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SubscriptionStatus::Cancelled | SubscriptionStatus::Expired)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SubscriptionStatus::Offered => "OFFERED",
            SubscriptionStatus::Signed => "SIGNED",
            SubscriptionStatus::Paused => "PAUSED",
            SubscriptionStatus::Cancelled => "CANCELLED",
            SubscriptionStatus::Expired => "EXPIRED",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two parties of an agreement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Party {
    Producer,
    Consumer,
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Party::Producer => f.write_str("producer"),
            Party::Consumer => f.write_str("consumer"),
        }
    }
}

/// A lifecycle edge after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Transition {
    Sign,
    Pause,
    Resume,
    Cancel,
    Expire,
}

impl Transition {
    /// States this transition may start from.
    pub fn source_states(self) -> &'static [SubscriptionStatus] {
        use SubscriptionStatus::*;
        match self {
            Transition::Sign => &[Offered],
            Transition::Pause => &[Signed],
            Transition::Resume => &[Paused],
            Transition::Cancel => &[Offered, Signed, Paused],
            Transition::Expire => &[Signed, Paused],
        }
    }

    pub fn target(self) -> SubscriptionStatus {
        match self {
            Transition::Sign | Transition::Resume => SubscriptionStatus::Signed,
            Transition::Pause => SubscriptionStatus::Paused,
            Transition::Cancel => SubscriptionStatus::Cancelled,
            Transition::Expire => SubscriptionStatus::Expired,
        }
    }

    /// The only party allowed to trigger this transition.
    pub fn authorized_party(self) -> Party {
        match self {
            Transition::Expire => Party::Producer,
            _ => Party::Consumer,
        }
    }

    pub fn allowed_from(self, status: SubscriptionStatus) -> bool {
        self.source_states().contains(&status)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Transition::Sign => "sign",
            Transition::Pause => "pause",
            Transition::Resume => "resume",
            Transition::Cancel => "cancel",
            Transition::Expire => "expire",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transition attempted from a state it does not start from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot {transition} a subscription that is {from}")]
pub struct TransitionRejected {
    pub transition: Transition,
    pub from: SubscriptionStatus,
}

/// The three numeric terms of an agreement. Opaque to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionTerms {
    pub term1: u64,
    pub term2: u64,
    pub term3: u64,
}

impl SubscriptionTerms {
    pub fn new(term1: u64, term2: u64, term3: u64) -> Self {
        Self { term1, term2, term3 }
    }
}

/// Subscription entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    /// Caller-supplied, globally unique
    pub id: u64,

    /// Principal that offered the subscription
    pub producer: String,

    /// Principal that may sign and control it
    pub consumer: String,

    /// Opaque descriptor of the subscribed service
    pub endpoint_uri: String,

    pub terms: SubscriptionTerms,

    /// Opaque blob attached at creation
    #[serde(with = "crate::shared::hex_bytes")]
    pub payload: Vec<u8>,

    pub status: SubscriptionStatus,

    /// 1 at creation, +1 per committed transition
    pub version: u64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// A new offer from `producer` to `consumer`.
    pub fn offer(
        id: u64,
        producer: impl Into<String>,
        consumer: impl Into<String>,
        endpoint_uri: impl Into<String>,
        terms: SubscriptionTerms,
        payload: Vec<u8>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            producer: producer.into(),
            consumer: consumer.into(),
            endpoint_uri: endpoint_uri.into(),
            terms,
            payload,
            status: SubscriptionStatus::Offered,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn party(&self, party: Party) -> &str {
        match party {
            Party::Producer => &self.producer,
            Party::Consumer => &self.consumer,
        }
    }

    /// Whether `principal_id` may trigger `transition` on this record.
    pub fn authorizes(&self, transition: Transition, principal_id: &str) -> bool {
        self.party(transition.authorized_party()) == principal_id
    }

    /// Move along `transition`, returning the previous status.
    ///
    /// Only the state precondition is checked here; callers authorize first.
    /// On rejection the record is left untouched.
    pub fn apply(&mut self, transition: Transition) -> Result<SubscriptionStatus, TransitionRejected> {
        if !transition.allowed_from(self.status) {
            return Err(TransitionRejected {
                transition,
                from: self.status,
            });
        }

        let previous = self.status;
        self.status = transition.target();
        self.version += 1;
        self.updated_at = Utc::now();
        Ok(previous)
    }

    /// True when every field fixed at creation matches `other`.
    pub fn same_agreement(&self, other: &Subscription) -> bool {
        self.id == other.id
            && self.producer == other.producer
            && self.consumer == other.consumer
            && self.endpoint_uri == other.endpoint_uri
            && self.terms == other.terms
            && self.payload == other.payload
            && self.created_at == other.created_at
    }

    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Signed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offer() -> Subscription {
        Subscription::offer(
            1,
            "0xproducer",
            "0xconsumer",
            "https://hello.world",
            SubscriptionTerms::new(1, 1, 1),
            vec![1, 2, 3, 4],
        )
    }

    #[test]
    fn test_ordinals_are_stable() {
        for (i, status) in SubscriptionStatus::ALL.iter().enumerate() {
            assert_eq!(status.ordinal() as usize, i);
            assert_eq!(SubscriptionStatus::from_ordinal(i as u8), Some(*status));
        }
        assert_eq!(SubscriptionStatus::from_ordinal(5), None);
    }

    #[test]
    fn test_new_offer() {
        let sub = offer();
        assert_eq!(sub.status, SubscriptionStatus::Offered);
        assert_eq!(sub.version, 1);
        assert!(!sub.is_active());
    }

    #[test]
    fn test_every_transition_has_a_legal_source() {
        let all = [
            Transition::Sign,
            Transition::Pause,
            Transition::Resume,
            Transition::Cancel,
            Transition::Expire,
        ];
        for transition in all {
            assert!(!transition.source_states().is_empty());
            // Nothing leaves a terminal state
            assert!(!transition.allowed_from(SubscriptionStatus::Cancelled));
            assert!(!transition.allowed_from(SubscriptionStatus::Expired));
        }
    }

    #[test]
    fn test_pause_resume_roundtrip() {
        let mut sub = offer();
        sub.apply(Transition::Sign).unwrap();
        let signed = sub.clone();

        assert_eq!(sub.apply(Transition::Pause).unwrap(), SubscriptionStatus::Signed);
        assert_eq!(sub.apply(Transition::Resume).unwrap(), SubscriptionStatus::Paused);

        assert_eq!(sub.status, signed.status);
        assert!(sub.same_agreement(&signed));
        assert_eq!(sub.version, 4);
    }

    #[test]
    fn test_rejected_transition_leaves_record_untouched() {
        let mut sub = offer();
        let before = sub.clone();

        let err = sub.apply(Transition::Pause).unwrap_err();
        assert_eq!(err.from, SubscriptionStatus::Offered);
        assert_eq!(err.to_string(), "cannot pause a subscription that is OFFERED");
        assert_eq!(sub, before);
    }

    #[test]
    fn test_sign_twice_rejected() {
        let mut sub = offer();
        sub.apply(Transition::Sign).unwrap();
        assert!(sub.apply(Transition::Sign).is_err());
    }

    #[test]
    fn test_authorization_by_party() {
        let sub = offer();
        assert!(sub.authorizes(Transition::Sign, "0xconsumer"));
        assert!(!sub.authorizes(Transition::Sign, "0xproducer"));
        assert!(sub.authorizes(Transition::Expire, "0xproducer"));
        assert!(!sub.authorizes(Transition::Expire, "0xconsumer"));
        assert!(!sub.authorizes(Transition::Cancel, "0xstranger"));
    }

    #[test]
    fn test_payload_serialized_as_hex() {
        let json = serde_json::to_value(offer()).unwrap();
        assert_eq!(json["payload"], "01020304");
        assert_eq!(json["status"], "OFFERED");
        assert_eq!(json["endpointUri"], "https://hello.world");
    }
}
