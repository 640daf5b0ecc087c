//! # Return Error Types
//!
//! Structured error hierarchy for the return subsystem. Business-rule
//! failures are typed and named — never coerced into a generic error — so
//! callers and tests can assert on the exact failure kind.
//!
//! The taxonomy follows four families: validation errors (malformed input,
//! rejected before any storage access), policy rejections (window expired,
//! duplicate return, invalid transition, unauthorized actor), conflicts
//! (a concurrent mutation lost the race — retry the whole operation), and
//! integrity failures (a violated invariant; a bug, never auto-retried).

use thiserror::Error;

use souk_core::{ActorRole, ValidationError};
use souk_ledger::{LedgerError, ReturnState};

/// Errors arising from return operations.
#[derive(Error, Debug)]
pub enum ReturnError {
    /// Malformed or out-of-range input, rejected before storage access.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The order line does not belong to the requesting customer.
    #[error("order line {order_line_id} does not belong to customer {customer_id}")]
    Unauthorized {
        /// The order line.
        order_line_id: String,
        /// The requesting customer.
        customer_id: String,
    },

    /// The actor's role may not drive a return to the target state.
    #[error("role {role} is not permitted to move a return to {target}")]
    RoleNotPermitted {
        /// The actor's role.
        role: ActorRole,
        /// The attempted target state.
        target: ReturnState,
    },

    /// The order has not been delivered yet.
    #[error("order {order_id} has not been delivered")]
    NotDelivered {
        /// The order.
        order_id: String,
    },

    /// The return window has closed.
    #[error("return window of {window_days} days expired (delivered at {delivered_at})")]
    WindowExpired {
        /// When the order was delivered (ISO 8601).
        delivered_at: String,
        /// The window length in days.
        window_days: i64,
    },

    /// A blocking return already exists for the order line.
    #[error("order line {order_line_id} already has an active return {existing}")]
    DuplicateReturn {
        /// The order line.
        order_line_id: String,
        /// The return that blocks a new one.
        existing: String,
    },

    /// Requested quantity is outside `1..=line quantity`.
    #[error("requested quantity {requested} is outside 1..={available}")]
    InvalidQuantity {
        /// The requested quantity.
        requested: u32,
        /// The line quantity.
        available: u32,
    },

    /// The return is past the point of customer cancellation.
    #[error("return in state {state} can no longer be cancelled")]
    NotCancellable {
        /// The current state.
        state: ReturnState,
    },

    /// The attempted transition is not in the transition table.
    #[error("invalid return transition from {from} to {to}")]
    InvalidTransition {
        /// The current state.
        from: ReturnState,
        /// The attempted target state.
        to: ReturnState,
    },

    /// The return is in a terminal state and accepts no transitions.
    #[error("return is in terminal state {state}")]
    TerminalState {
        /// The terminal state.
        state: ReturnState,
    },

    /// The referenced record does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// The entity kind.
        entity: String,
        /// The identifier.
        id: String,
    },

    /// A concurrent mutation lost the race; retry the whole operation.
    #[error("concurrent mutation conflict: {reason}")]
    Conflict {
        /// What conflicted.
        reason: String,
    },

    /// An invariant was found violated. A bug; not retried automatically.
    #[error("integrity violation: {reason}")]
    Integrity {
        /// What was violated.
        reason: String,
    },
}

impl From<LedgerError> for ReturnError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound { entity, id } => Self::NotFound { entity, id },
            LedgerError::DuplicateReturn {
                order_line_id,
                existing,
            } => Self::DuplicateReturn {
                order_line_id,
                existing,
            },
            LedgerError::ConcurrentSettlement { order_line_id } => Self::Conflict {
                reason: format!("order line {order_line_id} is being settled concurrently"),
            },
            LedgerError::NotReleasable { payout_id, status } => Self::Conflict {
                reason: format!("payout {payout_id} not releasable in status {status}"),
            },
            LedgerError::InvalidStatus {
                entity,
                id,
                status,
                operation,
            } => Self::Conflict {
                reason: format!("{entity} {id} cannot perform {operation} in status {status}"),
            },
            LedgerError::Integrity { reason } => Self::Integrity { reason },
        }
    }
}
