//! Stage graphs: the immutable blueprint each request type routes through
//!
//! A `StageGraph` is an ordered collection of stage definitions. Stages
//! sharing an `order` value form a parallel group and become actionable
//! together; groups are visited in ascending order. Graphs are fixed at
//! build time — only skip evaluation and reviewer resolution vary per
//! instance.

use crate::{ApprovalError, ApprovalResult, PaymentType, RequestSnapshot, RequestType, StageId};
use org_types::Scope;
use serde::{Deserialize, Serialize};

// ── Skip rules ───────────────────────────────────────────────────────

/// A pure predicate deciding whether a stage applies to a request.
///
/// Evaluated once at creation against the request snapshot, and again
/// only through an explicit attribute-change re-evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipRule {
    /// The stage always applies
    Never,
    /// Applies only to card-settled payments
    UnlessCardPayment,
    /// Applies only to cash-settled payments
    UnlessCashPayment,
    /// Applies only when the request needs document-management review
    UnlessEdmRequired,
    /// Skipped when the amount does not exceed the threshold
    AmountAtMost(i64),
    /// Applies only to officially employed hires
    UnlessOfficialEmployment,
}

impl SkipRule {
    /// Evaluate the rule against a request snapshot. `true` means skip.
    pub fn should_skip(&self, snapshot: &RequestSnapshot) -> bool {
        match self {
            SkipRule::Never => false,
            SkipRule::UnlessCardPayment => snapshot.payment_type != Some(PaymentType::Card),
            SkipRule::UnlessCashPayment => snapshot.payment_type != Some(PaymentType::Cash),
            SkipRule::UnlessEdmRequired => !snapshot.needs_edm,
            SkipRule::AmountAtMost(limit) => snapshot.amount.is_some_and(|a| a <= *limit),
            SkipRule::UnlessOfficialEmployment => !snapshot.official_employment,
        }
    }
}

// ── Assignee rules ───────────────────────────────────────────────────

/// How the responsible coordinator for a stage is found at decision time
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssigneeRule {
    /// Upward walk of the department forest for the first chief
    DepartmentChief,
    /// Upward walk of the department forest for the first territorial manager
    TerritorialManager,
    /// Every directory actor currently holding the scope
    HoldersOfScope(Scope),
    /// The reviewer pinned to this stage at instance creation
    Pinned,
}

// ── Stage definition ─────────────────────────────────────────────────

/// One approval checkpoint in a stage graph
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StageDefinition {
    /// Stable identifier, unique within the graph
    pub id: StageId,
    /// The scope a reviewer must hold to decide this stage
    pub scope: Scope,
    /// Position; equal orders form a parallel group
    pub order: u32,
    /// Applicability predicate
    pub skip: SkipRule,
    /// Coordinator resolution strategy
    pub assignee: AssigneeRule,
    /// Whether a denial here ends the whole workflow
    pub terminal_on_deny: bool,
}

impl StageDefinition {
    /// Create a stage that always applies, resolved by scope, terminal on deny
    pub fn new(id: impl Into<String>, scope: Scope, order: u32) -> Self {
        Self {
            id: StageId::new(id),
            scope,
            order,
            skip: SkipRule::Never,
            assignee: AssigneeRule::HoldersOfScope(scope),
            terminal_on_deny: true,
        }
    }

    pub fn with_skip(mut self, skip: SkipRule) -> Self {
        self.skip = skip;
        self
    }

    pub fn with_assignee(mut self, assignee: AssigneeRule) -> Self {
        self.assignee = assignee;
        self
    }

    /// Mark a denial here as informational rather than workflow-ending
    pub fn non_terminal_deny(mut self) -> Self {
        self.terminal_on_deny = false;
        self
    }
}

// ── Stage graph ──────────────────────────────────────────────────────

/// The immutable, ordered stage list for one request type
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StageGraph {
    /// The request type this graph belongs to
    pub request_type: RequestType,
    /// Stage definitions in ascending order
    stages: Vec<StageDefinition>,
}

impl StageGraph {
    pub fn new(request_type: RequestType) -> Self {
        Self {
            request_type,
            stages: Vec::new(),
        }
    }

    /// Append a stage definition
    pub fn add_stage(&mut self, stage: StageDefinition) -> ApprovalResult<()> {
        if self.stages.iter().any(|s| s.id == stage.id) {
            return Err(ApprovalError::Configuration(format!(
                "duplicate stage id '{}' in {} graph",
                stage.id, self.request_type
            )));
        }
        self.stages.push(stage);
        self.stages.sort_by_key(|s| s.order);
        Ok(())
    }

    /// Builder form of [`add_stage`](Self::add_stage) for catalog construction
    pub fn with_stage(mut self, stage: StageDefinition) -> ApprovalResult<Self> {
        self.add_stage(stage)?;
        Ok(self)
    }

    /// All stages in ascending order
    pub fn stages(&self) -> &[StageDefinition] {
        &self.stages
    }

    /// Look up a stage definition by id
    pub fn stage(&self, id: &StageId) -> Option<&StageDefinition> {
        self.stages.iter().find(|s| &s.id == id)
    }

    /// Number of stages
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Evaluate every skip rule once against a request snapshot.
    ///
    /// Returns each stage paired with its applicability (`false` = skip).
    pub fn resolve_applicable_stages<'a>(
        &'a self,
        snapshot: &RequestSnapshot,
    ) -> Vec<(&'a StageDefinition, bool)> {
        self.stages
            .iter()
            .map(|s| (s, !s.skip.should_skip(snapshot)))
            .collect()
    }

    /// Validate the graph before it enters the catalog.
    ///
    /// A failure here is fatal configuration, not a per-request error.
    pub fn validate(&self) -> ApprovalResult<()> {
        if self.stages.is_empty() {
            return Err(ApprovalError::Configuration(format!(
                "{} graph has no stages",
                self.request_type
            )));
        }
        Ok(())
    }
}
