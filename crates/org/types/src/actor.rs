//! Actors: the people who submit requests and decide approval stages
//!
//! Actors are owned by an external HR directory; this crate only models
//! the slice the workflow engine needs — identity, department membership,
//! granted scopes, and a contact address for notifications.

use crate::DepartmentId;
use serde::{Deserialize, Serialize};

// ── Actor Identifier ─────────────────────────────────────────────────

/// Unique identifier for an actor (employee)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Delivery address for notifications (messenger chat id, e-mail, ...)
///
/// Opaque to the engine; only the notification channel interprets it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactAddress(pub String);

impl ContactAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }
}

impl std::fmt::Display for ContactAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Scopes ───────────────────────────────────────────────────────────

/// Permission scopes granted to actors through their post.
///
/// A closed set: every approval stage names the scope its reviewer must
/// hold, and `Admin` overrides all of them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    /// Administrative override — grants every other scope
    Admin,

    // Payment requests
    BidCreate,
    BidFac,
    BidCostCenter,
    BidParalegal,
    BidEdm,
    BidKru,
    BidOwner,
    BidAccountantCard,
    BidAccountantCash,
    BidTeller,

    // Hiring requests
    HiringManager,
    HiringSecurity,
    HiringAccounting,
    HiringOnboarding,
    HiringFinancialDirector,

    // Technical requests
    TechRepairman,
    TechChiefTechnician,
    TechAppraiser,

    // Cleaning requests
    CleaningExecutor,
    CleaningAppraiser,

    // IT requests
    ItRepairman,
    ItTerritorialManager,
}

// ── Actor ────────────────────────────────────────────────────────────

/// An employee as seen by the workflow engine
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Actor {
    /// Unique identifier
    pub id: ActorId,
    /// Display name (for log lines and notification text)
    pub display_name: String,
    /// The department this actor works in
    pub department_id: DepartmentId,
    /// Scopes granted through the actor's post
    pub scopes: Vec<Scope>,
    /// Where notifications for this actor are delivered, if anywhere
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<ContactAddress>,
}

impl Actor {
    /// Create a new actor with no scopes and no contact address
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        department_id: DepartmentId,
    ) -> Self {
        Self {
            id: ActorId::new(id),
            display_name: display_name.into(),
            department_id,
            scopes: Vec::new(),
            contact: None,
        }
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scopes.push(scope);
        self
    }

    pub fn with_contact(mut self, address: impl Into<String>) -> Self {
        self.contact = Some(ContactAddress::new(address));
        self
    }

    /// Check whether this actor holds a scope directly
    pub fn has_scope(&self, scope: Scope) -> bool {
        self.scopes.contains(&scope)
    }

    /// Check whether this actor holds the administrative override
    pub fn is_admin(&self) -> bool {
        self.has_scope(Scope::Admin)
    }
}
