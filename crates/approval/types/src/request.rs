//! Requests: what staff submit and what the skip rules look at
//!
//! A `RequestSnapshot` is the immutable view of a request at a point in
//! time. Skip rules are evaluated against it at instance creation, and
//! again only through an explicit attribute-change re-evaluation.

use crate::StageId;
use org_types::{ActorId, DepartmentId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ── Request Identifier ───────────────────────────────────────────────

/// Unique identifier for a request and its workflow instance (1:1)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn short(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Request Type ─────────────────────────────────────────────────────

/// The closed set of request kinds the platform routes through approval.
///
/// Each variant maps to exactly one compiled-in stage graph; there is no
/// runtime dispatch on type strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestType {
    /// Payment request
    Bid,
    /// Hiring request
    WorkerBid,
    /// Technical incident request
    TechnicalRequest,
    /// Cleaning incident request
    CleaningRequest,
    /// IT incident request
    ItBid,
}

impl RequestType {
    /// All request types, for catalog construction and validation
    pub const ALL: [RequestType; 5] = [
        RequestType::Bid,
        RequestType::WorkerBid,
        RequestType::TechnicalRequest,
        RequestType::CleaningRequest,
        RequestType::ItBid,
    ];
}

impl std::fmt::Display for RequestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RequestType::Bid => "bid",
            RequestType::WorkerBid => "worker_bid",
            RequestType::TechnicalRequest => "technical_request",
            RequestType::CleaningRequest => "cleaning_request",
            RequestType::ItBid => "it_bid",
        };
        write!(f, "{}", name)
    }
}

/// How a payment request is settled
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentType {
    Cash,
    Card,
}

// ── Request Snapshot ─────────────────────────────────────────────────

/// The attributes of a request that stage seeding and skip rules read
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RequestSnapshot {
    /// Which workflow this request routes through
    pub request_type: RequestType,
    /// The department the request originates from
    pub department_id: DepartmentId,
    /// Who submitted the request
    pub requester: ActorId,
    /// Payment amount, for payment requests
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    /// Settlement kind, for payment requests
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_type: Option<PaymentType>,
    /// Whether the payment needs electronic document management review
    pub needs_edm: bool,
    /// Whether a hire is officially employed (drives financial sign-off)
    pub official_employment: bool,
    /// Reviewers pinned to specific stages at creation time
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub pinned: HashMap<StageId, ActorId>,
}

impl RequestSnapshot {
    pub fn new(request_type: RequestType, department_id: DepartmentId, requester: ActorId) -> Self {
        Self {
            request_type,
            department_id,
            requester,
            amount: None,
            payment_type: None,
            needs_edm: false,
            official_employment: false,
            pinned: HashMap::new(),
        }
    }

    pub fn with_amount(mut self, amount: i64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_payment_type(mut self, payment_type: PaymentType) -> Self {
        self.payment_type = Some(payment_type);
        self
    }

    pub fn with_edm(mut self, needs_edm: bool) -> Self {
        self.needs_edm = needs_edm;
        self
    }

    pub fn with_official_employment(mut self, official: bool) -> Self {
        self.official_employment = official;
        self
    }

    /// Pin a reviewer to a stage for the lifetime of the instance
    pub fn with_pinned(mut self, stage: StageId, reviewer: ActorId) -> Self {
        self.pinned.insert(stage, reviewer);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id() {
        let id = RequestId::generate();
        assert!(!id.0.is_empty());
        assert!(id.short().len() <= 8);

        let named = RequestId::new("req-1");
        assert_eq!(format!("{}", named), "req-1");
    }

    #[test]
    fn test_all_request_types_distinct() {
        let mut seen = std::collections::HashSet::new();
        for rt in RequestType::ALL {
            assert!(seen.insert(rt));
        }
        assert_eq!(seen.len(), 5);
    }

    #[test]
    fn test_snapshot_builders() {
        let snapshot = RequestSnapshot::new(
            RequestType::Bid,
            DepartmentId::new("d-1"),
            ActorId::new("w-1"),
        )
        .with_amount(45_000)
        .with_payment_type(PaymentType::Card)
        .with_edm(true)
        .with_pinned(StageId::new("fac"), ActorId::new("w-7"));

        assert_eq!(snapshot.amount, Some(45_000));
        assert_eq!(snapshot.payment_type, Some(PaymentType::Card));
        assert!(snapshot.needs_edm);
        assert_eq!(snapshot.pinned.len(), 1);
    }

    #[test]
    fn test_snapshot_serde_round_trip() {
        let snapshot = RequestSnapshot::new(
            RequestType::WorkerBid,
            DepartmentId::new("d-1"),
            ActorId::new("w-1"),
        )
        .with_official_employment(true);

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: RequestSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.request_type, RequestType::WorkerBid);
        assert!(back.official_employment);
        // Empty pinned map is elided from the wire form
        assert!(!json.contains("pinned"));
    }
}
