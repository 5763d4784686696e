//! Workflow instances: the persisted approval state of one request
//!
//! A `WorkflowInstance` carries exactly one `StageState` per stage
//! definition of its request type, plus the derived overall status.
//! It is created from a stage graph and a request snapshot, and mutated
//! exclusively through the transition engine (decisions), rework, and
//! explicit applicability re-evaluation.

use crate::{
    ApprovalError, ApprovalResult, AssigneeRule, RequestId, RequestSnapshot, RequestType,
    StageDefinition, StageGraph, StageId, StageState, StageStatus,
};
use chrono::{DateTime, Utc};
use org_types::{ActorId, DepartmentId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ── Overall status ───────────────────────────────────────────────────

/// Aggregate verdict for a request, derived from its stage statuses
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OverallStatus {
    /// At least one stage still awaits a decision
    #[default]
    Pending,
    /// Every applicable stage was approved
    Approved,
    /// A terminal-on-deny stage was denied
    Denied,
}

impl OverallStatus {
    /// Check if the workflow is closed
    pub fn is_terminal(&self) -> bool {
        matches!(self, OverallStatus::Approved | OverallStatus::Denied)
    }
}

/// Derive the overall status from the current stage states.
///
/// Pure and idempotent: denial of any terminal-on-deny stage dominates;
/// otherwise the request is approved once every non-skipped,
/// non-[`NotRelevant`](StageStatus::NotRelevant) stage is approved.
pub fn recompute_overall_status(stages: &[StageState]) -> OverallStatus {
    if stages
        .iter()
        .any(|s| s.terminal_on_deny && s.status == StageStatus::Denied)
    {
        return OverallStatus::Denied;
    }

    let all_approved = stages
        .iter()
        .filter(|s| !matches!(s.status, StageStatus::Skipped | StageStatus::NotRelevant))
        .all(|s| s.status == StageStatus::Approved);

    if all_approved {
        OverallStatus::Approved
    } else {
        OverallStatus::Pending
    }
}

/// Evaluate stage applicability for a request: the graph's skip rules
/// plus the one-review-per-person rule for pinned stages (a reviewer
/// never reviews their own request, and never the same request twice
/// across retained pinned stages).
fn applicable_stages<'a>(
    graph: &'a StageGraph,
    snapshot: &RequestSnapshot,
    requester: &ActorId,
    pinned: &HashMap<StageId, ActorId>,
) -> Vec<(&'a StageDefinition, bool)> {
    let mut seen = vec![requester.clone()];
    graph
        .resolve_applicable_stages(snapshot)
        .into_iter()
        .map(|(def, mut applicable)| {
            if applicable && def.assignee == AssigneeRule::Pinned {
                if let Some(reviewer) = pinned.get(&def.id) {
                    if seen.contains(reviewer) {
                        applicable = false;
                    } else {
                        seen.push(reviewer.clone());
                    }
                }
            }
            (def, applicable)
        })
        .collect()
}

// ── Workflow instance ────────────────────────────────────────────────

/// The approval workflow state persisted 1:1 with a request
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkflowInstance {
    /// Identifier shared with the request
    pub id: RequestId,
    /// Which stage graph this instance follows
    pub request_type: RequestType,
    /// The department the request originates from
    pub department_id: DepartmentId,
    /// Who submitted the request
    pub requester: ActorId,
    /// Reviewers pinned to stages at creation time
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub pinned: HashMap<StageId, ActorId>,
    /// One state per stage definition, in graph order
    pub stages: Vec<StageState>,
    /// Derived aggregate verdict
    pub overall: OverallStatus,
    /// Why the request was denied, when it was
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denial_reason: Option<String>,
    /// When the instance was created
    pub created_at: DateTime<Utc>,
    /// When the instance was last mutated
    pub updated_at: DateTime<Utc>,
    /// When the overall status became terminal (cleared on rework)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl WorkflowInstance {
    /// Seed a new instance from a stage graph and a request snapshot.
    ///
    /// Stages whose skip rule fires are seeded `Skipped`, as is any
    /// pinned stage whose reviewer is the requester or already covers an
    /// earlier pinned stage. The earliest order group with at least one
    /// applicable stage becomes `PendingApproval`; everything later
    /// stays `Pending`.
    pub fn create(graph: &StageGraph, snapshot: &RequestSnapshot) -> ApprovalResult<Self> {
        if snapshot.request_type != graph.request_type {
            return Err(ApprovalError::Validation(format!(
                "snapshot is {} but graph is {}",
                snapshot.request_type, graph.request_type
            )));
        }

        let now = Utc::now();
        let stages = applicable_stages(graph, snapshot, &snapshot.requester, &snapshot.pinned)
            .into_iter()
            .map(|(def, applicable)| {
                let mut state = StageState::new(def.id.clone(), def.order, def.terminal_on_deny);
                if !applicable {
                    state.status = StageStatus::Skipped;
                }
                state
            })
            .collect();

        let mut instance = Self {
            id: RequestId::generate(),
            request_type: snapshot.request_type,
            department_id: snapshot.department_id.clone(),
            requester: snapshot.requester.clone(),
            pinned: snapshot.pinned.clone(),
            stages,
            overall: OverallStatus::Pending,
            denial_reason: None,
            created_at: now,
            updated_at: now,
            closed_at: None,
        };

        instance.activate_ready_stages();
        instance.refresh_overall();
        Ok(instance)
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Get a stage state by id
    pub fn stage(&self, id: &StageId) -> Option<&StageState> {
        self.stages.iter().find(|s| &s.stage_id == id)
    }

    /// Get a mutable stage state by id
    pub fn stage_mut(&mut self, id: &StageId) -> Option<&mut StageState> {
        self.stages.iter_mut().find(|s| &s.stage_id == id)
    }

    /// All stages currently waiting for a coordinator
    pub fn actionable_stages(&self) -> Vec<&StageState> {
        self.stages.iter().filter(|s| s.is_actionable()).collect()
    }

    /// Check if the overall status is terminal
    pub fn is_closed(&self) -> bool {
        self.overall.is_terminal()
    }

    // ── Mutation ─────────────────────────────────────────────────────

    /// Promote the next reachable order group to `PendingApproval`.
    ///
    /// Scans groups in ascending order: a group with a stage still
    /// waiting blocks everything behind it; the first group with
    /// untouched `Pending` stages is promoted. Returns the activated
    /// stage ids (empty when a group is already mid-decision).
    pub fn activate_ready_stages(&mut self) -> Vec<StageId> {
        let mut orders: Vec<u32> = self.stages.iter().map(|s| s.order).collect();
        orders.sort_unstable();
        orders.dedup();

        for order in orders {
            let group: Vec<usize> = self
                .stages
                .iter()
                .enumerate()
                .filter(|(_, s)| s.order == order)
                .map(|(i, _)| i)
                .collect();

            if group
                .iter()
                .any(|&i| self.stages[i].status == StageStatus::PendingApproval)
            {
                return Vec::new();
            }

            let waiting: Vec<usize> = group
                .into_iter()
                .filter(|&i| self.stages[i].status == StageStatus::Pending)
                .collect();

            if !waiting.is_empty() {
                let now = Utc::now();
                let mut activated = Vec::new();
                for i in waiting {
                    self.stages[i].status = StageStatus::PendingApproval;
                    self.stages[i].activated_at = Some(now);
                    activated.push(self.stages[i].stage_id.clone());
                }
                self.updated_at = now;
                return activated;
            }
        }

        Vec::new()
    }

    /// Mark every stage still waiting as `NotRelevant`.
    ///
    /// Invoked only as the consequence of a terminal-on-deny denial.
    pub fn short_circuit_remaining(&mut self) -> Vec<StageId> {
        let now = Utc::now();
        let mut shed = Vec::new();
        for stage in &mut self.stages {
            if matches!(
                stage.status,
                StageStatus::Pending | StageStatus::PendingApproval
            ) {
                stage.status = StageStatus::NotRelevant;
                stage.decided_at = Some(now);
                shed.push(stage.stage_id.clone());
            }
        }
        if !shed.is_empty() {
            self.updated_at = now;
        }
        shed
    }

    /// Re-derive the overall status and maintain the close timestamp
    pub fn refresh_overall(&mut self) -> OverallStatus {
        self.overall = recompute_overall_status(&self.stages);
        self.updated_at = Utc::now();
        if self.overall.is_terminal() {
            if self.closed_at.is_none() {
                self.closed_at = Some(self.updated_at);
            }
        } else {
            self.closed_at = None;
        }
        self.overall
    }

    /// Reopen a closed or stalled workflow from a stage onward.
    ///
    /// A workflow is stalled when every stage has reached a terminal
    /// per-stage status but a non-terminal denial keeps the overall
    /// status `Pending`; rework is the only way forward from there.
    /// Resets the target stage and every later stage (by order) to
    /// `Pending`, clearing prior decisions, then re-activates from the
    /// target group. Earlier stages and creation-time `Skipped` stages
    /// are untouched.
    pub fn rework(&mut self, stage_id: &StageId) -> ApprovalResult<Vec<StageId>> {
        let stalled = self.stages.iter().all(|s| s.status.is_terminal());
        if !self.overall.is_terminal() && !stalled {
            return Err(ApprovalError::Validation(
                "only a closed or stalled workflow can be reworked".into(),
            ));
        }

        let target_order = self
            .stage(stage_id)
            .ok_or_else(|| ApprovalError::StageNotFound(stage_id.clone()))?
            .order;

        let earliest_decided = self
            .stages
            .iter()
            .filter(|s| s.status.is_decided())
            .map(|s| s.order)
            .min()
            .ok_or_else(|| {
                ApprovalError::Validation("workflow has no decided stage to rework".into())
            })?;

        if target_order < earliest_decided {
            return Err(ApprovalError::StageNotActionable(stage_id.clone()));
        }

        for stage in &mut self.stages {
            if stage.order >= target_order && stage.status != StageStatus::Skipped {
                stage.reset();
            }
        }
        self.denial_reason = None;

        let activated = self.activate_ready_stages();
        self.refresh_overall();
        Ok(activated)
    }

    /// Re-evaluate skip rules after a request attribute change.
    ///
    /// Only future stages move: a `Pending` stage whose rule now fires
    /// becomes `Skipped`, and a `Skipped` stage at or past the current
    /// frontier whose rule no longer fires returns to `Pending`.
    /// Decided and mid-decision stages are never touched.
    pub fn refresh_applicability(
        &mut self,
        graph: &StageGraph,
        snapshot: &RequestSnapshot,
    ) -> ApprovalResult<Vec<StageId>> {
        if snapshot.request_type != self.request_type || graph.request_type != self.request_type {
            return Err(ApprovalError::Validation(
                "snapshot and graph must match the instance request type".into(),
            ));
        }
        if self.overall.is_terminal() {
            return Err(ApprovalError::Validation(
                "cannot re-evaluate a closed workflow".into(),
            ));
        }

        let frontier = self
            .stages
            .iter()
            .filter(|s| !s.status.is_terminal())
            .map(|s| s.order)
            .min();

        let applicability = applicable_stages(graph, snapshot, &self.requester, &self.pinned);
        for (def, applicable) in applicability {
            let Some(stage) = self.stage_mut(&def.id) else {
                continue;
            };
            match (stage.status, applicable) {
                (StageStatus::Pending, false) => stage.status = StageStatus::Skipped,
                (StageStatus::Skipped, true) => {
                    if frontier.is_some_and(|f| stage.order >= f) {
                        stage.status = StageStatus::Pending;
                    }
                }
                _ => {}
            }
        }

        let activated = self.activate_ready_stages();
        self.refresh_overall();
        Ok(activated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PaymentType, SkipRule, StageDefinition};
    use org_types::Scope;

    fn make_linear_graph() -> StageGraph {
        StageGraph::new(RequestType::Bid)
            .with_stage(StageDefinition::new("kru", Scope::BidKru, 1))
            .unwrap()
            .with_stage(
                StageDefinition::new("owner", Scope::BidOwner, 2)
                    .with_skip(SkipRule::AmountAtMost(30_000)),
            )
            .unwrap()
            .with_stage(StageDefinition::new("teller", Scope::BidTeller, 3))
            .unwrap()
    }

    fn make_parallel_graph() -> StageGraph {
        StageGraph::new(RequestType::WorkerBid)
            .with_stage(StageDefinition::new("security", Scope::HiringSecurity, 1))
            .unwrap()
            .with_stage(StageDefinition::new("accounting", Scope::HiringAccounting, 1))
            .unwrap()
    }

    fn make_snapshot(amount: i64) -> RequestSnapshot {
        RequestSnapshot::new(
            RequestType::Bid,
            DepartmentId::new("d-1"),
            ActorId::new("w-1"),
        )
        .with_amount(amount)
        .with_payment_type(PaymentType::Cash)
    }

    fn approve(instance: &mut WorkflowInstance, id: &str) {
        let stage = instance.stage_mut(&StageId::new(id)).unwrap();
        assert_eq!(stage.status, StageStatus::PendingApproval);
        stage.status = StageStatus::Approved;
        stage.decided_at = Some(Utc::now());
        instance.activate_ready_stages();
        instance.refresh_overall();
    }

    #[test]
    fn test_create_seeds_first_stage() {
        let graph = make_linear_graph();
        let instance = WorkflowInstance::create(&graph, &make_snapshot(50_000)).unwrap();

        assert_eq!(instance.overall, OverallStatus::Pending);
        assert_eq!(
            instance.stage(&StageId::new("kru")).unwrap().status,
            StageStatus::PendingApproval
        );
        assert_eq!(
            instance.stage(&StageId::new("owner")).unwrap().status,
            StageStatus::Pending
        );
        assert_eq!(
            instance.stage(&StageId::new("teller")).unwrap().status,
            StageStatus::Pending
        );
    }

    #[test]
    fn test_create_applies_skip_rules() {
        let graph = make_linear_graph();
        let instance = WorkflowInstance::create(&graph, &make_snapshot(10_000)).unwrap();

        assert_eq!(
            instance.stage(&StageId::new("owner")).unwrap().status,
            StageStatus::Skipped
        );
    }

    #[test]
    fn test_create_rejects_type_mismatch() {
        let graph = make_parallel_graph();
        let result = WorkflowInstance::create(&graph, &make_snapshot(10_000));
        assert!(matches!(result, Err(ApprovalError::Validation(_))));
    }

    #[test]
    fn test_linear_progression_to_approved() {
        let graph = make_linear_graph();
        let mut instance = WorkflowInstance::create(&graph, &make_snapshot(10_000)).unwrap();

        approve(&mut instance, "kru");
        // owner is skipped, so teller activates next
        assert_eq!(
            instance.stage(&StageId::new("teller")).unwrap().status,
            StageStatus::PendingApproval
        );
        assert_eq!(instance.overall, OverallStatus::Pending);

        approve(&mut instance, "teller");
        assert_eq!(instance.overall, OverallStatus::Approved);
        assert!(instance.closed_at.is_some());
    }

    #[test]
    fn test_parallel_group_activates_together() {
        let graph = make_parallel_graph();
        let snapshot = RequestSnapshot::new(
            RequestType::WorkerBid,
            DepartmentId::new("d-1"),
            ActorId::new("w-1"),
        );
        let mut instance = WorkflowInstance::create(&graph, &snapshot).unwrap();

        assert_eq!(instance.actionable_stages().len(), 2);

        approve(&mut instance, "security");
        // Sibling still mid-decision — overall stays pending
        assert_eq!(instance.overall, OverallStatus::Pending);

        approve(&mut instance, "accounting");
        assert_eq!(instance.overall, OverallStatus::Approved);
    }

    #[test]
    fn test_short_circuit_marks_not_relevant() {
        let graph = make_linear_graph();
        let mut instance = WorkflowInstance::create(&graph, &make_snapshot(50_000)).unwrap();

        let stage = instance.stage_mut(&StageId::new("kru")).unwrap();
        stage.status = StageStatus::Denied;
        let shed = instance.short_circuit_remaining();
        instance.refresh_overall();

        assert_eq!(shed.len(), 2);
        assert_eq!(instance.overall, OverallStatus::Denied);
        assert_eq!(
            instance.stage(&StageId::new("owner")).unwrap().status,
            StageStatus::NotRelevant
        );
        assert_eq!(
            instance.stage(&StageId::new("teller")).unwrap().status,
            StageStatus::NotRelevant
        );
    }

    #[test]
    fn test_rework_resets_suffix_only() {
        let graph = make_linear_graph();
        let mut instance = WorkflowInstance::create(&graph, &make_snapshot(10_000)).unwrap();

        approve(&mut instance, "kru");
        // teller denies and closes the workflow
        let stage = instance.stage_mut(&StageId::new("teller")).unwrap();
        stage.status = StageStatus::Denied;
        instance.refresh_overall();
        assert!(instance.is_closed());

        let activated = instance.rework(&StageId::new("teller")).unwrap();
        assert_eq!(activated, vec![StageId::new("teller")]);

        // kru (before the target) keeps its approval
        assert_eq!(
            instance.stage(&StageId::new("kru")).unwrap().status,
            StageStatus::Approved
        );
        // creation-time skip is untouched
        assert_eq!(
            instance.stage(&StageId::new("owner")).unwrap().status,
            StageStatus::Skipped
        );
        assert_eq!(instance.overall, OverallStatus::Pending);
        assert!(instance.closed_at.is_none());
    }

    #[test]
    fn test_rework_resets_not_relevant_stages() {
        let graph = make_linear_graph();
        let mut instance = WorkflowInstance::create(&graph, &make_snapshot(50_000)).unwrap();

        let stage = instance.stage_mut(&StageId::new("kru")).unwrap();
        stage.status = StageStatus::Denied;
        instance.short_circuit_remaining();
        instance.refresh_overall();

        let activated = instance.rework(&StageId::new("kru")).unwrap();
        assert_eq!(activated, vec![StageId::new("kru")]);
        assert_eq!(
            instance.stage(&StageId::new("owner")).unwrap().status,
            StageStatus::Pending
        );
        assert!(instance.denial_reason.is_none());
    }

    #[test]
    fn test_rework_reopens_stalled_non_terminal_denial() {
        let graph = StageGraph::new(RequestType::TechnicalRequest)
            .with_stage(StageDefinition::new("repairman", Scope::TechRepairman, 1))
            .unwrap()
            .with_stage(
                StageDefinition::new("appraiser", Scope::TechAppraiser, 2).non_terminal_deny(),
            )
            .unwrap();
        let snapshot = RequestSnapshot::new(
            RequestType::TechnicalRequest,
            DepartmentId::new("d-1"),
            ActorId::new("w-1"),
        );
        let mut instance = WorkflowInstance::create(&graph, &snapshot).unwrap();

        approve(&mut instance, "repairman");
        let stage = instance.stage_mut(&StageId::new("appraiser")).unwrap();
        stage.status = StageStatus::Denied;
        stage.decided_at = Some(Utc::now());
        instance.activate_ready_stages();
        instance.refresh_overall();

        // Everything is decided, yet the denial keeps the verdict open
        assert_eq!(instance.overall, OverallStatus::Pending);
        assert!(instance.actionable_stages().is_empty());

        let activated = instance.rework(&StageId::new("appraiser")).unwrap();
        assert_eq!(activated, vec![StageId::new("appraiser")]);
        approve(&mut instance, "appraiser");
        assert_eq!(instance.overall, OverallStatus::Approved);
    }

    #[test]
    fn test_rework_rejects_open_workflow() {
        let graph = make_linear_graph();
        let mut instance = WorkflowInstance::create(&graph, &make_snapshot(50_000)).unwrap();
        let result = instance.rework(&StageId::new("kru"));
        assert!(matches!(result, Err(ApprovalError::Validation(_))));
    }

    #[test]
    fn test_rework_rejects_stage_before_earliest_decision() {
        let graph = StageGraph::new(RequestType::Bid)
            .with_stage(
                StageDefinition::new("owner", Scope::BidOwner, 1)
                    .with_skip(SkipRule::AmountAtMost(30_000)),
            )
            .unwrap()
            .with_stage(StageDefinition::new("kru", Scope::BidKru, 2))
            .unwrap();
        let mut instance = WorkflowInstance::create(&graph, &make_snapshot(10_000)).unwrap();
        approve(&mut instance, "kru");
        assert!(instance.is_closed());

        // owner was never decided, only skipped; it lies before kru
        let result = instance.rework(&StageId::new("owner"));
        assert!(matches!(result, Err(ApprovalError::StageNotActionable(_))));

        let result = instance.rework(&StageId::new("missing"));
        assert!(matches!(result, Err(ApprovalError::StageNotFound(_))));
    }

    fn make_pinned_graph() -> StageGraph {
        StageGraph::new(RequestType::Bid)
            .with_stage(
                StageDefinition::new("fac", Scope::BidFac, 1)
                    .with_assignee(AssigneeRule::Pinned),
            )
            .unwrap()
            .with_stage(
                StageDefinition::new("cc", Scope::BidCostCenter, 2)
                    .with_assignee(AssigneeRule::Pinned),
            )
            .unwrap()
            .with_stage(
                StageDefinition::new("paralegal", Scope::BidParalegal, 3)
                    .with_assignee(AssigneeRule::Pinned),
            )
            .unwrap()
    }

    #[test]
    fn test_requester_pinned_stage_seeded_skipped() {
        let snapshot = RequestSnapshot::new(
            RequestType::Bid,
            DepartmentId::new("d-1"),
            ActorId::new("w-1"),
        )
        .with_pinned(StageId::new("fac"), ActorId::new("w-1"))
        .with_pinned(StageId::new("cc"), ActorId::new("r-2"))
        .with_pinned(StageId::new("paralegal"), ActorId::new("r-3"));
        let instance = WorkflowInstance::create(&make_pinned_graph(), &snapshot).unwrap();

        // The requester never reviews their own request
        assert_eq!(
            instance.stage(&StageId::new("fac")).unwrap().status,
            StageStatus::Skipped
        );
        assert_eq!(
            instance.stage(&StageId::new("cc")).unwrap().status,
            StageStatus::PendingApproval
        );
    }

    #[test]
    fn test_repeated_pinned_reviewer_seeded_skipped() {
        let snapshot = RequestSnapshot::new(
            RequestType::Bid,
            DepartmentId::new("d-1"),
            ActorId::new("w-1"),
        )
        .with_pinned(StageId::new("fac"), ActorId::new("r-1"))
        .with_pinned(StageId::new("cc"), ActorId::new("r-1"))
        .with_pinned(StageId::new("paralegal"), ActorId::new("r-2"));
        let instance = WorkflowInstance::create(&make_pinned_graph(), &snapshot).unwrap();

        // One review per person: cc collapses into fac
        assert_eq!(
            instance.stage(&StageId::new("fac")).unwrap().status,
            StageStatus::PendingApproval
        );
        assert_eq!(
            instance.stage(&StageId::new("cc")).unwrap().status,
            StageStatus::Skipped
        );
        assert_eq!(
            instance.stage(&StageId::new("paralegal")).unwrap().status,
            StageStatus::Pending
        );
    }

    #[test]
    fn test_refresh_keeps_repeated_reviewer_skip() {
        let snapshot = RequestSnapshot::new(
            RequestType::Bid,
            DepartmentId::new("d-1"),
            ActorId::new("w-1"),
        )
        .with_pinned(StageId::new("fac"), ActorId::new("r-1"))
        .with_pinned(StageId::new("cc"), ActorId::new("r-1"))
        .with_pinned(StageId::new("paralegal"), ActorId::new("r-2"));
        let graph = make_pinned_graph();
        let mut instance = WorkflowInstance::create(&graph, &snapshot).unwrap();

        instance.refresh_applicability(&graph, &snapshot).unwrap();
        assert_eq!(
            instance.stage(&StageId::new("cc")).unwrap().status,
            StageStatus::Skipped
        );
    }

    #[test]
    fn test_skipped_stage_stays_put_without_reevaluation() {
        let graph = make_linear_graph();
        let mut instance = WorkflowInstance::create(&graph, &make_snapshot(10_000)).unwrap();

        approve(&mut instance, "kru");
        approve(&mut instance, "teller");
        assert_eq!(
            instance.stage(&StageId::new("owner")).unwrap().status,
            StageStatus::Skipped
        );
    }

    #[test]
    fn test_refresh_applicability_revives_future_stage() {
        let graph = make_linear_graph();
        let mut instance = WorkflowInstance::create(&graph, &make_snapshot(10_000)).unwrap();

        // Amount raised above the threshold — owner applies again
        let raised = make_snapshot(90_000);
        instance.refresh_applicability(&graph, &raised).unwrap();
        assert_eq!(
            instance.stage(&StageId::new("owner")).unwrap().status,
            StageStatus::Pending
        );
    }

    #[test]
    fn test_refresh_applicability_skips_pending_stage() {
        let graph = make_linear_graph();
        let mut instance = WorkflowInstance::create(&graph, &make_snapshot(90_000)).unwrap();

        let lowered = make_snapshot(5_000);
        instance.refresh_applicability(&graph, &lowered).unwrap();
        assert_eq!(
            instance.stage(&StageId::new("owner")).unwrap().status,
            StageStatus::Skipped
        );
        // The stage mid-decision is untouched
        assert_eq!(
            instance.stage(&StageId::new("kru")).unwrap().status,
            StageStatus::PendingApproval
        );
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let graph = make_linear_graph();
        let mut instance = WorkflowInstance::create(&graph, &make_snapshot(50_000)).unwrap();
        approve(&mut instance, "kru");

        let first = recompute_overall_status(&instance.stages);
        let second = recompute_overall_status(&instance.stages);
        assert_eq!(first, second);
        assert_eq!(first, instance.overall);
    }

    #[test]
    fn test_non_terminal_denial_does_not_close() {
        let mut stages = vec![
            StageState::new(StageId::new("repairman"), 1, true),
            StageState::new(StageId::new("appraiser"), 2, false),
        ];
        stages[0].status = StageStatus::Approved;
        stages[1].status = StageStatus::Denied;

        // Informational denial: not denied overall, not approved either
        assert_eq!(recompute_overall_status(&stages), OverallStatus::Pending);
    }

    // ── Property tests ───────────────────────────────────────────────

    mod props {
        use super::*;
        use proptest::prelude::*;

        fn arb_status() -> impl Strategy<Value = StageStatus> {
            prop_oneof![
                Just(StageStatus::Pending),
                Just(StageStatus::PendingApproval),
                Just(StageStatus::Approved),
                Just(StageStatus::Denied),
                Just(StageStatus::Skipped),
                Just(StageStatus::NotRelevant),
            ]
        }

        fn arb_stages() -> impl Strategy<Value = Vec<StageState>> {
            prop::collection::vec((arb_status(), any::<bool>()), 1..12).prop_map(|entries| {
                entries
                    .into_iter()
                    .enumerate()
                    .map(|(i, (status, terminal))| {
                        let mut s =
                            StageState::new(StageId::new(format!("s{i}")), i as u32, terminal);
                        s.status = status;
                        s
                    })
                    .collect()
            })
        }

        proptest! {
            #[test]
            fn recompute_is_pure_and_idempotent(stages in arb_stages()) {
                let first = recompute_overall_status(&stages);
                let second = recompute_overall_status(&stages);
                prop_assert_eq!(first, second);
            }

            #[test]
            fn terminal_denial_dominates(stages in arb_stages()) {
                let denied = stages
                    .iter()
                    .any(|s| s.terminal_on_deny && s.status == StageStatus::Denied);
                if denied {
                    prop_assert_eq!(recompute_overall_status(&stages), OverallStatus::Denied);
                }
            }

            #[test]
            fn approved_requires_every_applicable_stage(stages in arb_stages()) {
                if recompute_overall_status(&stages) == OverallStatus::Approved {
                    for s in &stages {
                        if !matches!(s.status, StageStatus::Skipped | StageStatus::NotRelevant) {
                            prop_assert_eq!(s.status, StageStatus::Approved);
                        }
                    }
                }
            }
        }
    }
}
