//! Multi-stage approval workflow engine
//!
//! Routes requests through ordered review stages, resolves each stage
//! to concrete reviewers from the organization directory, records
//! decisions under per-instance locks, and fans notifications out
//! through a background dispatcher. The [`service::ApprovalService`]
//! facade is the single entry point; everything else supports it.

#![deny(unsafe_code)]

pub mod authorization;
pub mod catalog;
pub mod dispatcher;
pub mod resolver;
pub mod service;
pub mod sweep;
pub mod transition;

pub use authorization::{AuthorizationGate, ScopeGate};
pub use catalog::StageGraphCatalog;
pub use dispatcher::{ChannelError, Notification, NotificationChannel, NotificationDispatcher};
pub use resolver::{CoordinatorResolver, Resolution};
pub use service::{ApprovalService, PendingStage};
pub use sweep::StaleSweeper;
pub use transition::{TransitionEngine, TransitionOutcome};
