//! Error types for the approval workflow layer

use crate::{RequestId, StageId};
use org_types::OrgError;

/// Errors that can occur in approval workflow operations
#[derive(Debug, thiserror::Error)]
pub enum ApprovalError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Workflow instance not found: {0}")]
    InstanceNotFound(RequestId),

    #[error("Stage not found: {0}")]
    StageNotFound(StageId),

    #[error("Stage not actionable: {0}")]
    StageNotActionable(StageId),

    #[error("Actor is not authorized for this stage")]
    Unauthorized,

    #[error("No resolved coordinator may act on stage: {0}")]
    ResolverUnresolved(StageId),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Org(#[from] OrgError),
}

/// Result type alias for approval workflow operations
pub type ApprovalResult<T> = Result<T, ApprovalError>;
