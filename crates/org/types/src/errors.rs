//! Error types for the organizational layer

use crate::{ActorId, DepartmentId};

/// Errors that can occur in directory and hierarchy operations
#[derive(Debug, thiserror::Error)]
pub enum OrgError {
    #[error("Actor not found: {0}")]
    ActorNotFound(ActorId),

    #[error("Department not found: {0}")]
    DepartmentNotFound(DepartmentId),

    #[error("Department hierarchy cycle through: {0}")]
    HierarchyCycle(DepartmentId),
}

/// Result type alias for organizational operations
pub type OrgResult<T> = Result<T, OrgError>;
