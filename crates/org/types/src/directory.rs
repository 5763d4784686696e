//! Directory seams: how the engine reads actors and the department forest
//!
//! Both lookups may be remote in production (an HR service, an LDAP
//! mirror), so the traits are async. The in-memory implementation backs
//! tests and single-process deployments, and enforces the acyclicity
//! invariant the resolver depends on at load time.

use crate::{Actor, ActorId, Department, DepartmentId, OrgError, OrgResult, Scope};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

/// Read access to the actor directory
#[async_trait]
pub trait ActorDirectory: Send + Sync {
    /// Look up an actor by id
    async fn get(&self, id: &ActorId) -> OrgResult<Actor>;

    /// All actors currently holding a scope
    async fn actors_with_scope(&self, scope: Scope) -> Vec<ActorId>;
}

/// Read access to the department forest
#[async_trait]
pub trait DepartmentHierarchy: Send + Sync {
    /// Look up a department by id
    async fn get(&self, id: &DepartmentId) -> OrgResult<Department>;
}

// ── In-memory implementation ─────────────────────────────────────────

/// In-memory directory for tests and single-process deployments
#[derive(Clone, Debug, Default)]
pub struct InMemoryDirectory {
    actors: HashMap<ActorId, Actor>,
    departments: HashMap<DepartmentId, Department>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an actor
    pub fn add_actor(&mut self, actor: Actor) {
        self.actors.insert(actor.id.clone(), actor);
    }

    /// Add or replace a department
    pub fn add_department(&mut self, department: Department) {
        self.departments.insert(department.id.clone(), department);
    }

    /// Verify the department forest is acyclic.
    ///
    /// Must be called after loading and before handing the directory to
    /// the engine; a cycle here would otherwise surface as a resolution
    /// failure on every request touching the affected subtree.
    pub fn validate(&self) -> OrgResult<()> {
        for start in self.departments.keys() {
            let mut visited = HashSet::new();
            let mut current = Some(start.clone());

            while let Some(id) = current {
                if !visited.insert(id.clone()) {
                    return Err(OrgError::HierarchyCycle(id));
                }
                current = self
                    .departments
                    .get(&id)
                    .and_then(|d| d.parent_id.clone());
            }
        }
        Ok(())
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    pub fn department_count(&self) -> usize {
        self.departments.len()
    }
}

#[async_trait]
impl ActorDirectory for InMemoryDirectory {
    async fn get(&self, id: &ActorId) -> OrgResult<Actor> {
        self.actors
            .get(id)
            .cloned()
            .ok_or_else(|| OrgError::ActorNotFound(id.clone()))
    }

    async fn actors_with_scope(&self, scope: Scope) -> Vec<ActorId> {
        self.actors
            .values()
            .filter(|a| a.has_scope(scope))
            .map(|a| a.id.clone())
            .collect()
    }
}

#[async_trait]
impl DepartmentHierarchy for InMemoryDirectory {
    async fn get(&self, id: &DepartmentId) -> OrgResult<Department> {
        self.departments
            .get(id)
            .cloned()
            .ok_or_else(|| OrgError::DepartmentNotFound(id.clone()))
    }
}
