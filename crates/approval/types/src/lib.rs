//! Core types for the multi-stage approval workflow
//!
//! This crate defines the data model shared by the approval engine and
//! its callers: request snapshots, stage graphs with skip and assignee
//! rules, per-stage states, and the workflow instance with its derived
//! overall status. All types are serde-serializable; none perform I/O.

#![deny(unsafe_code)]

pub mod errors;
pub mod graph;
pub mod instance;
pub mod request;
pub mod stage;

pub use errors::{ApprovalError, ApprovalResult};
pub use graph::{AssigneeRule, SkipRule, StageDefinition, StageGraph};
pub use instance::{recompute_overall_status, OverallStatus, WorkflowInstance};
pub use request::{PaymentType, RequestId, RequestSnapshot, RequestType};
pub use stage::{Decision, StageId, StageState, StageStatus};
