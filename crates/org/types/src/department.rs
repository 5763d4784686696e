//! Departments: the organizational tree coordinators are resolved from
//!
//! Departments form a forest — each node may have a parent, a chief, and
//! a territorial manager. The workflow engine walks this structure upward
//! to find the first node exposing the role a stage requires.

use crate::ActorId;
use serde::{Deserialize, Serialize};

/// Unique identifier for a department
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DepartmentId(pub String);

impl DepartmentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for DepartmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A node in the department forest
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Department {
    /// Unique identifier
    pub id: DepartmentId,
    /// Human-readable name
    pub name: String,
    /// Parent department, if any (roots have none)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<DepartmentId>,
    /// The chief responsible for this department, if assigned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chief_id: Option<ActorId>,
    /// The territorial manager covering this department, if assigned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub territorial_manager_id: Option<ActorId>,
}

impl Department {
    /// Create a new root department with no roles assigned
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: DepartmentId::new(id),
            name: name.into(),
            parent_id: None,
            chief_id: None,
            territorial_manager_id: None,
        }
    }

    pub fn with_parent(mut self, parent: DepartmentId) -> Self {
        self.parent_id = Some(parent);
        self
    }

    pub fn with_chief(mut self, chief: ActorId) -> Self {
        self.chief_id = Some(chief);
        self
    }

    pub fn with_territorial_manager(mut self, manager: ActorId) -> Self {
        self.territorial_manager_id = Some(manager);
        self
    }
}
