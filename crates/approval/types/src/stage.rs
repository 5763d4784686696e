//! Stage states: the per-checkpoint record a workflow instance carries
//!
//! One `StageState` exists per stage definition of the instance's request
//! type. `Pending` and `PendingApproval` are the only non-terminal
//! statuses; everything else is final for that stage (until a rework).
//!
//! `Skipped` and `NotRelevant` are deliberately distinct: the former
//! means "never applicable, decided at creation", the latter "became
//! moot because a terminal-on-deny sibling was denied". The source data
//! for this platform used to conflate the two under one value.

use chrono::{DateTime, Utc};
use org_types::ActorId;
use serde::{Deserialize, Serialize};

/// Identifier of a stage within a stage graph
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StageId(pub String);

impl StageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for StageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A reviewer's verdict on a stage
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Approve,
    Deny,
}

/// Status of a single approval stage
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum StageStatus {
    /// Not yet reached in stage order
    #[default]
    Pending,
    /// Waiting for the resolved coordinator's decision
    PendingApproval,
    /// Approved by a coordinator
    Approved,
    /// Denied by a coordinator
    Denied,
    /// Never applicable — decided at creation or explicit re-evaluation
    Skipped,
    /// Became moot after a terminal-on-deny sibling was denied
    NotRelevant,
}

impl StageStatus {
    /// Check if this status is final for the stage
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StageStatus::Pending | StageStatus::PendingApproval)
    }

    /// Check if a coordinator actually ruled on the stage
    pub fn is_decided(&self) -> bool {
        matches!(self, StageStatus::Approved | StageStatus::Denied)
    }
}

/// Runtime state of one approval stage within an instance
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StageState {
    /// Which stage definition this state belongs to
    pub stage_id: StageId,
    /// Position in the graph (stages sharing an order form a parallel group)
    pub order: u32,
    /// Whether a denial here ends the whole workflow
    pub terminal_on_deny: bool,
    /// Current status
    pub status: StageStatus,
    /// The coordinator who decided, once decided
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decided_by: Option<ActorId>,
    /// Free-text comment attached to the decision
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// When the stage last became pending approval
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activated_at: Option<DateTime<Utc>>,
    /// When the decision was recorded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<DateTime<Utc>>,
}

impl StageState {
    /// Create a stage state in its initial `Pending` status
    pub fn new(stage_id: StageId, order: u32, terminal_on_deny: bool) -> Self {
        Self {
            stage_id,
            order,
            terminal_on_deny,
            status: StageStatus::Pending,
            decided_by: None,
            comment: None,
            activated_at: None,
            decided_at: None,
        }
    }

    /// Check if the stage is waiting for a coordinator
    pub fn is_actionable(&self) -> bool {
        self.status == StageStatus::PendingApproval
    }

    /// How long the stage has been waiting for a decision
    pub fn pending_duration(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        match self.status {
            StageStatus::PendingApproval => self.activated_at.map(|at| now - at),
            _ => None,
        }
    }

    /// Reset the stage to `Pending`, clearing any prior decision.
    ///
    /// Used by rework; creation-time skips are never routed through here.
    pub fn reset(&mut self) {
        self.status = StageStatus::Pending;
        self.decided_by = None;
        self.comment = None;
        self.activated_at = None;
        self.decided_at = None;
    }
}
