//! # Settlement Error Types
//!
//! Structured errors for payout computation and the payout status machine.
//! Conflicts (a concurrent settlement won the race) are distinguishable
//! from integrity failures (a violated invariant, i.e. a bug) so callers
//! know which to retry.

use thiserror::Error;

use souk_core::ValidationError;
use souk_ledger::{LedgerError, PayoutStatus};

/// Errors arising from settlement operations.
#[derive(Error, Debug)]
pub enum SettlementError {
    /// Malformed configuration or arithmetic overflow.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// No eligible order lines exist for the vendor and period. Callers
    /// may treat this as a zero payout rather than a failure.
    #[error("no eligible order lines for vendor {vendor_id} in period {period}")]
    InsufficientData {
        /// The vendor.
        vendor_id: String,
        /// The settlement period.
        period: String,
    },

    /// Another payout computation claimed overlapping lines first. Retry
    /// the whole computation.
    #[error("order line {order_line_id} is already settled under another payout")]
    ConcurrentSettlement {
        /// The line that lost the race.
        order_line_id: String,
    },

    /// The attempted payout status transition is not valid.
    #[error("invalid payout transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: PayoutStatus,
        /// The attempted target status.
        to: PayoutStatus,
    },

    /// The payout is in a terminal status and accepts no transitions.
    #[error("payout {payout_id} is in terminal status {status}")]
    TerminalStatus {
        /// The payout.
        payout_id: String,
        /// The terminal status.
        status: PayoutStatus,
    },

    /// The payout's claims cannot be released in its current status.
    #[error("payout {payout_id} cannot be released in status {status}")]
    NotReleasable {
        /// The payout.
        payout_id: String,
        /// The current status name.
        status: String,
    },

    /// The referenced record does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// The entity kind.
        entity: String,
        /// The identifier.
        id: String,
    },

    /// An invariant was found violated. A bug; not retried automatically.
    #[error("integrity violation: {reason}")]
    Integrity {
        /// What was violated.
        reason: String,
    },
}

impl From<LedgerError> for SettlementError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound { entity, id } => Self::NotFound { entity, id },
            LedgerError::ConcurrentSettlement { order_line_id } => {
                Self::ConcurrentSettlement { order_line_id }
            }
            LedgerError::NotReleasable { payout_id, status } => {
                Self::NotReleasable { payout_id, status }
            }
            LedgerError::DuplicateReturn {
                order_line_id,
                existing,
            } => Self::Integrity {
                reason: format!(
                    "unexpected duplicate return {existing} for line {order_line_id} during settlement"
                ),
            },
            LedgerError::InvalidStatus {
                entity,
                id,
                status,
                operation,
            } => Self::Integrity {
                reason: format!("{entity} {id} cannot perform {operation} in status {status}"),
            },
            LedgerError::Integrity { reason } => Self::Integrity { reason },
        }
    }
}
