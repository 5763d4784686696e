//! Approval service facade
//!
//! Ties the catalog, resolver, authorization gate, and dispatcher
//! together behind one async API. Instances live in a map behind an
//! `RwLock`; each instance carries its own `tokio::sync::Mutex` so
//! decisions on one request never block another. Resolution and
//! authorization run before the per-instance lock, notification
//! delivery after it; only validate-and-mutate holds the lock.

use crate::authorization::AuthorizationGate;
use crate::catalog::StageGraphCatalog;
use crate::dispatcher::NotificationDispatcher;
use crate::resolver::{CoordinatorResolver, Resolution};
use crate::transition::TransitionEngine;
use approval_types::{
    ApprovalError, ApprovalResult, Decision, OverallStatus, RequestId, RequestSnapshot, StageId,
    WorkflowInstance,
};
use chrono::Utc;
use org_types::{ActorDirectory, ActorId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

/// A stage an actor can currently decide
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PendingStage {
    pub instance_id: RequestId,
    pub stage_id: StageId,
}

pub struct ApprovalService {
    catalog: StageGraphCatalog,
    resolver: CoordinatorResolver,
    directory: Arc<dyn ActorDirectory>,
    gate: Arc<dyn AuthorizationGate>,
    dispatcher: NotificationDispatcher,
    instances: RwLock<HashMap<RequestId, Arc<Mutex<WorkflowInstance>>>>,
}

impl ApprovalService {
    pub fn new(
        catalog: StageGraphCatalog,
        resolver: CoordinatorResolver,
        directory: Arc<dyn ActorDirectory>,
        gate: Arc<dyn AuthorizationGate>,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        Self {
            catalog,
            resolver,
            directory,
            gate,
            dispatcher,
            instances: RwLock::new(HashMap::new()),
        }
    }

    /// Create a workflow instance for a request and notify the first
    /// group of reviewers
    pub async fn create_instance(&self, snapshot: &RequestSnapshot) -> ApprovalResult<RequestId> {
        let graph = self.catalog.get(snapshot.request_type)?;
        let instance = WorkflowInstance::create(graph, snapshot)?;
        let id = instance.id.clone();

        let active: Vec<StageId> = instance
            .actionable_stages()
            .iter()
            .map(|s| s.stage_id.clone())
            .collect();
        self.notify_activated(&instance, &active).await;
        if instance.is_closed() {
            self.notify_terminal(&instance);
        }

        info!(
            instance = %id.short(),
            request_type = %snapshot.request_type,
            department = %snapshot.department_id,
            "workflow instance created"
        );
        self.instances
            .write()
            .await
            .insert(id.clone(), Arc::new(Mutex::new(instance)));
        Ok(id)
    }

    /// Snapshot read of an instance
    pub async fn get_instance(&self, id: &RequestId) -> ApprovalResult<WorkflowInstance> {
        let arc = self.instance_arc(id).await?;
        let instance = arc.lock().await;
        Ok(instance.clone())
    }

    /// Record a reviewer decision on a stage.
    ///
    /// Checks run in a fixed order: the stage must exist and be awaiting
    /// a decision, the actor must hold the stage scope (or admin), and
    /// the stage must resolve to reviewers including the actor (admins
    /// may stand in for resolved reviewers, but an unresolvable stage
    /// rejects everyone, admins included).
    pub async fn submit_decision(
        &self,
        id: &RequestId,
        stage_id: &StageId,
        actor_id: &ActorId,
        decision: Decision,
        comment: Option<String>,
    ) -> ApprovalResult<OverallStatus> {
        let arc = self.instance_arc(id).await?;

        let (request_type, department_id, pinned) = {
            let instance = arc.lock().await;
            let stage = instance
                .stage(stage_id)
                .ok_or_else(|| ApprovalError::StageNotFound(stage_id.clone()))?;
            if !stage.is_actionable() {
                return Err(ApprovalError::StageNotActionable(stage_id.clone()));
            }
            (
                instance.request_type,
                instance.department_id.clone(),
                instance.pinned.clone(),
            )
        };

        let graph = self.catalog.get(request_type)?;
        let definition = graph
            .stage(stage_id)
            .ok_or_else(|| ApprovalError::StageNotFound(stage_id.clone()))?;
        let actor = self.directory.get(actor_id).await?;

        if !self.gate.can_act(&actor, definition.scope).await {
            return Err(ApprovalError::Unauthorized);
        }
        let resolution = self
            .resolver
            .resolve(definition, &department_id, &pinned)
            .await?;
        if resolution == Resolution::Unresolved {
            return Err(ApprovalError::ResolverUnresolved(stage_id.clone()));
        }
        if !resolution.contains(actor_id) && !actor.is_admin() {
            return Err(ApprovalError::ResolverUnresolved(stage_id.clone()));
        }

        let (outcome, after) = {
            let mut instance = arc.lock().await;
            let outcome =
                TransitionEngine::apply_decision(&mut instance, stage_id, actor_id, decision, comment)?;
            (outcome, instance.clone())
        };

        self.notify_activated(&after, &outcome.activated).await;
        if outcome.overall.is_terminal() {
            self.notify_terminal(&after);
        }
        Ok(outcome.overall)
    }

    /// Reopen a closed workflow, or one stalled by a non-terminal
    /// denial, from a stage onward
    pub async fn rework(
        &self,
        id: &RequestId,
        stage_id: &StageId,
    ) -> ApprovalResult<OverallStatus> {
        let arc = self.instance_arc(id).await?;
        let (activated, after) = {
            let mut instance = arc.lock().await;
            let activated = instance.rework(stage_id)?;
            (activated, instance.clone())
        };

        info!(
            instance = %id.short(),
            stage = %stage_id,
            "workflow reopened for rework"
        );
        self.notify_activated(&after, &activated).await;
        Ok(after.overall)
    }

    /// Re-evaluate skip rules after a request attribute change
    pub async fn refresh_applicability(
        &self,
        id: &RequestId,
        snapshot: &RequestSnapshot,
    ) -> ApprovalResult<OverallStatus> {
        let arc = self.instance_arc(id).await?;
        let graph = self.catalog.get(snapshot.request_type)?;
        let (activated, after) = {
            let mut instance = arc.lock().await;
            let activated = instance.refresh_applicability(graph, snapshot)?;
            (activated, instance.clone())
        };

        self.notify_activated(&after, &activated).await;
        if after.overall.is_terminal() {
            self.notify_terminal(&after);
        }
        Ok(after.overall)
    }

    /// Stages the actor is currently a resolved reviewer for
    pub async fn list_pending_for_actor(&self, actor_id: &ActorId) -> Vec<PendingStage> {
        let arcs: Vec<Arc<Mutex<WorkflowInstance>>> =
            self.instances.read().await.values().cloned().collect();

        let mut pending = Vec::new();
        for arc in arcs {
            let snapshot = { arc.lock().await.clone() };
            let Ok(graph) = self.catalog.get(snapshot.request_type) else {
                continue;
            };
            for stage in snapshot.actionable_stages() {
                let Some(definition) = graph.stage(&stage.stage_id) else {
                    continue;
                };
                match self
                    .resolver
                    .resolve(definition, &snapshot.department_id, &snapshot.pinned)
                    .await
                {
                    Ok(resolution) if resolution.contains(actor_id) => {
                        pending.push(PendingStage {
                            instance_id: snapshot.id.clone(),
                            stage_id: stage.stage_id.clone(),
                        });
                    }
                    Ok(_) => {}
                    Err(err) => {
                        warn!(
                            instance = %snapshot.id.short(),
                            stage = %stage.stage_id,
                            error = %err,
                            "resolution failed while listing pending stages"
                        );
                    }
                }
            }
        }
        pending
    }

    /// Re-notify reviewers of stages stuck in `PendingApproval` longer
    /// than `max_age`. Read-only with respect to workflow state.
    pub(crate) async fn renotify_stale(&self, max_age: chrono::Duration) -> usize {
        let arcs: Vec<Arc<Mutex<WorkflowInstance>>> =
            self.instances.read().await.values().cloned().collect();

        let now = Utc::now();
        let mut renotified = 0;
        for arc in arcs {
            let snapshot = { arc.lock().await.clone() };
            let stale: Vec<StageId> = snapshot
                .actionable_stages()
                .iter()
                .filter(|s| s.pending_duration(now).is_some_and(|d| d > max_age))
                .map(|s| s.stage_id.clone())
                .collect();
            if stale.is_empty() {
                continue;
            }
            warn!(
                instance = %snapshot.id.short(),
                stages = stale.len(),
                "re-notifying reviewers of stale stages"
            );
            renotified += stale.len();
            self.notify_activated(&snapshot, &stale).await;
        }
        renotified
    }

    async fn instance_arc(&self, id: &RequestId) -> ApprovalResult<Arc<Mutex<WorkflowInstance>>> {
        self.instances
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| ApprovalError::InstanceNotFound(id.clone()))
    }

    /// Queue review notifications for newly activated stages.
    ///
    /// Never fails: an unresolved stage or a resolution error is logged
    /// and skipped so a committed transition always stands.
    async fn notify_activated(&self, instance: &WorkflowInstance, stage_ids: &[StageId]) {
        if stage_ids.is_empty() {
            return;
        }
        let Ok(graph) = self.catalog.get(instance.request_type) else {
            return;
        };
        for stage_id in stage_ids {
            let Some(definition) = graph.stage(stage_id) else {
                continue;
            };
            match self
                .resolver
                .resolve(definition, &instance.department_id, &instance.pinned)
                .await
            {
                Ok(Resolution::Resolved(actors)) => {
                    let message = format!(
                        "{} {}: stage {} awaits your review",
                        instance.request_type,
                        instance.id.short(),
                        stage_id
                    );
                    self.dispatcher.enqueue_all(&actors, &message);
                }
                Ok(Resolution::Unresolved) => {
                    warn!(
                        instance = %instance.id.short(),
                        stage = %stage_id,
                        "no reviewer resolves for activated stage"
                    );
                }
                Err(err) => {
                    warn!(
                        instance = %instance.id.short(),
                        stage = %stage_id,
                        error = %err,
                        "reviewer resolution failed for activated stage"
                    );
                }
            }
        }
    }

    /// Tell the requester and every prior decider the final verdict
    fn notify_terminal(&self, instance: &WorkflowInstance) {
        let message = match instance.overall {
            OverallStatus::Approved => {
                format!("{} {} approved", instance.request_type, instance.id.short())
            }
            OverallStatus::Denied => match &instance.denial_reason {
                Some(reason) => format!(
                    "{} {} denied: {reason}",
                    instance.request_type,
                    instance.id.short()
                ),
                None => format!("{} {} denied", instance.request_type, instance.id.short()),
            },
            OverallStatus::Pending => return,
        };

        let mut recipients = vec![instance.requester.clone()];
        for stage in &instance.stages {
            if let Some(decider) = &stage.decided_by {
                if !recipients.contains(decider) {
                    recipients.push(decider.clone());
                }
            }
        }
        self.dispatcher.enqueue_all(&recipients, &message);
    }
}
