//! Coordinator resolution: mapping a stage to concrete reviewers
//!
//! Resolution consults the request's pinned reviewers, the actor
//! directory, or the department hierarchy depending on the stage's
//! assignee rule. An empty result is a normal outcome, reported as
//! [`Resolution::Unresolved`] rather than an error, so callers can
//! surface it to operators without tearing the workflow down.

use approval_types::{ApprovalResult, AssigneeRule, StageDefinition, StageId};
use org_types::{ActorDirectory, ActorId, Department, DepartmentHierarchy, DepartmentId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::warn;

/// Upper bound on hierarchy walks, in case validation was bypassed
const MAX_WALK_DEPTH: usize = 32;

/// Outcome of resolving a stage to reviewers
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// At least one reviewer may decide this stage
    Resolved(Vec<ActorId>),
    /// Nobody is currently eligible
    Unresolved,
}

impl Resolution {
    /// Check whether an actor is among the resolved reviewers
    pub fn contains(&self, actor: &ActorId) -> bool {
        match self {
            Resolution::Resolved(actors) => actors.contains(actor),
            Resolution::Unresolved => false,
        }
    }
}

enum WalkTarget {
    Chief,
    TerritorialManager,
}

/// Resolves stages to reviewers against a directory and hierarchy
pub struct CoordinatorResolver {
    directory: Arc<dyn ActorDirectory>,
    hierarchy: Arc<dyn DepartmentHierarchy>,
}

impl CoordinatorResolver {
    pub fn new(
        directory: Arc<dyn ActorDirectory>,
        hierarchy: Arc<dyn DepartmentHierarchy>,
    ) -> Self {
        Self {
            directory,
            hierarchy,
        }
    }

    /// Resolve the reviewers for one stage of a request
    pub async fn resolve(
        &self,
        definition: &StageDefinition,
        department_id: &DepartmentId,
        pinned: &HashMap<StageId, ActorId>,
    ) -> ApprovalResult<Resolution> {
        match &definition.assignee {
            AssigneeRule::Pinned => Ok(match pinned.get(&definition.id) {
                Some(actor) => Resolution::Resolved(vec![actor.clone()]),
                None => {
                    warn!(stage = %definition.id, "no pinned reviewer for stage");
                    Resolution::Unresolved
                }
            }),
            AssigneeRule::HoldersOfScope(scope) => {
                let actors = self.directory.actors_with_scope(*scope).await;
                Ok(if actors.is_empty() {
                    Resolution::Unresolved
                } else {
                    Resolution::Resolved(actors)
                })
            }
            AssigneeRule::DepartmentChief => {
                self.walk_hierarchy(department_id, WalkTarget::Chief).await
            }
            AssigneeRule::TerritorialManager => {
                self.walk_hierarchy(department_id, WalkTarget::TerritorialManager)
                    .await
            }
        }
    }

    /// Climb the department chain until the target role is filled
    async fn walk_hierarchy(
        &self,
        start: &DepartmentId,
        target: WalkTarget,
    ) -> ApprovalResult<Resolution> {
        let pick = |department: &Department| match target {
            WalkTarget::Chief => department.chief_id.clone(),
            WalkTarget::TerritorialManager => department.territorial_manager_id.clone(),
        };

        let mut visited: HashSet<DepartmentId> = HashSet::new();
        let mut current = start.clone();
        for _ in 0..MAX_WALK_DEPTH {
            if !visited.insert(current.clone()) {
                return Err(approval_types::ApprovalError::Configuration(format!(
                    "department hierarchy cycle at {current}"
                )));
            }
            let department = self.hierarchy.get(&current).await?;
            if let Some(actor) = pick(&department) {
                return Ok(Resolution::Resolved(vec![actor]));
            }
            match department.parent_id {
                Some(parent) => current = parent,
                None => return Ok(Resolution::Unresolved),
            }
        }
        Err(approval_types::ApprovalError::Configuration(format!(
            "department chain above {start} exceeds {MAX_WALK_DEPTH} levels"
        )))
    }
}
