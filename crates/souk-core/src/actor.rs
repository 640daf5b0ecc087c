//! # Actors
//!
//! The authenticated party behind every state-changing call. Callers thread
//! an explicit [`Actor`] into each operation; there is no ambient request
//! or session context anywhere in the core, and transition functions
//! validate the role against a fixed permission table.

use serde::{Deserialize, Serialize};

/// The role an actor holds in the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    /// The buyer who placed the order.
    Customer,
    /// The vendor who sold the order line.
    Vendor,
    /// Marketplace back-office staff.
    Admin,
    /// The pickup/courier operator handling physical movement.
    Logistics,
    /// Automated platform processes (settlement runs, sweeps).
    System,
}

impl ActorRole {
    /// The canonical string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Vendor => "vendor",
            Self::Admin => "admin",
            Self::Logistics => "logistics",
            Self::System => "system",
        }
    }
}

impl std::fmt::Display for ActorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authenticated actor: an opaque principal identifier plus its role.
///
/// Authentication itself is an external collaborator; the core trusts the
/// supplied identity and enforces only role-based permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Opaque principal identifier (account id, service name).
    pub id: String,
    /// The role this principal acts in.
    pub role: ActorRole,
}

impl Actor {
    /// Create an actor from an identifier and role.
    pub fn new(id: impl Into<String>, role: ActorRole) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }

    /// Convenience constructor for the platform's automated processes.
    pub fn system(process: impl Into<String>) -> Self {
        Self::new(process, ActorRole::System)
    }
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.role, self.id)
    }
}
