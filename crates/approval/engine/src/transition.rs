//! Stage decision transitions
//!
//! All state mutation for a decision happens here, under the caller's
//! per-instance lock. Actionability is re-validated at the point of
//! mutation, so of two racing reviewers exactly one decision lands and
//! the loser gets a clean error.

use approval_types::{
    ApprovalError, ApprovalResult, Decision, OverallStatus, StageId, StageStatus, WorkflowInstance,
};
use chrono::Utc;
use org_types::ActorId;
use tracing::info;

/// What a decision changed on the instance
#[derive(Clone, Debug)]
pub struct TransitionOutcome {
    /// Stages promoted to `PendingApproval` by this decision
    pub activated: Vec<StageId>,
    /// Stages marked `NotRelevant` by a terminal denial
    pub shed: Vec<StageId>,
    /// Overall status after the transition
    pub overall: OverallStatus,
}

pub struct TransitionEngine;

impl TransitionEngine {
    /// Record one reviewer decision and advance the workflow.
    ///
    /// The stage must still be `PendingApproval` when this runs; a
    /// stage already decided by a concurrent reviewer yields
    /// [`ApprovalError::StageNotActionable`].
    pub fn apply_decision(
        instance: &mut WorkflowInstance,
        stage_id: &StageId,
        actor: &ActorId,
        decision: Decision,
        comment: Option<String>,
    ) -> ApprovalResult<TransitionOutcome> {
        let now = Utc::now();
        let stage = instance
            .stage_mut(stage_id)
            .ok_or_else(|| ApprovalError::StageNotFound(stage_id.clone()))?;
        if !stage.is_actionable() {
            return Err(ApprovalError::StageNotActionable(stage_id.clone()));
        }

        stage.status = match decision {
            Decision::Approve => StageStatus::Approved,
            Decision::Deny => StageStatus::Denied,
        };
        stage.decided_by = Some(actor.clone());
        stage.decided_at = Some(now);
        stage.comment = comment.clone();
        let terminal_denial = decision == Decision::Deny && stage.terminal_on_deny;

        let mut shed = Vec::new();
        if terminal_denial {
            instance.denial_reason = comment;
            shed = instance.short_circuit_remaining();
        }

        let activated = if terminal_denial {
            Vec::new()
        } else {
            instance.activate_ready_stages()
        };
        let overall = instance.refresh_overall();

        info!(
            instance = %instance.id.short(),
            stage = %stage_id,
            actor = %actor,
            decision = ?decision,
            overall = ?overall,
            "stage decision applied"
        );

        Ok(TransitionOutcome {
            activated,
            shed,
            overall,
        })
    }
}
