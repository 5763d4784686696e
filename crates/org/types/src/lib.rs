//! Organizational domain types for the staff request platform
//!
//! This crate is the foundation the approval engine builds on: actors
//! (employees with scopes and a contact address), departments (a forest
//! with per-node chiefs and territorial managers), and the async seams
//! through which both are read.
//!
//! The engine never owns this data — it belongs to the HR directory —
//! so everything here is a read model plus an in-memory implementation
//! for tests and single-process deployments.

#![deny(unsafe_code)]

pub mod actor;
pub mod department;
pub mod directory;
pub mod errors;

pub use actor::{Actor, ActorId, ContactAddress, Scope};
pub use department::{Department, DepartmentId};
pub use directory::{ActorDirectory, DepartmentHierarchy, InMemoryDirectory};
pub use errors::{OrgError, OrgResult};
