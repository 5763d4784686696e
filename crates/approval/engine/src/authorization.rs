//! Scope-based authorization for stage decisions

use async_trait::async_trait;
use org_types::{Actor, Scope};

/// Decides whether an actor may act under a given scope
#[async_trait]
pub trait AuthorizationGate: Send + Sync {
    async fn can_act(&self, actor: &Actor, scope: Scope) -> bool;
}

/// Default gate: the actor holds the scope, or holds `Admin`
pub struct ScopeGate;

#[async_trait]
impl AuthorizationGate for ScopeGate {
    async fn can_act(&self, actor: &Actor, scope: Scope) -> bool {
        actor.has_scope(scope) || actor.is_admin()
    }
}
