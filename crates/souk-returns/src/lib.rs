//! # souk-returns — Return/Refund Lifecycle
//!
//! Everything between "the customer wants to send it back" and "the money
//! went back":
//!
//! - **Eligibility** ([`eligibility`]): the pure rule chain deciding
//!   whether an order line may be returned now, and in what quantity.
//!
//! - **State machine** ([`state`]): the authoritative transition table a
//!   return progresses through, and the fixed role→transition permission
//!   table every actor is validated against.
//!
//! - **Refund** ([`refund`]): the refund-amount arithmetic, computed once
//!   at creation and stored immutably on the return.
//!
//! - **Manager** ([`request`]): the orchestrator — creation, cancellation,
//!   state advancement, timelines, and per-customer statistics, each as a
//!   single atomic ledger operation with events emitted after commit.

pub mod eligibility;
pub mod error;
pub mod refund;
pub mod request;
pub mod state;

// Re-export primary types.
pub use eligibility::check_eligibility;
pub use error::ReturnError;
pub use refund::{compute_refund, RefundPolicy};
pub use request::{CreateReturn, ReturnManager, ReturnStatistics};
pub use state::{authorize_transition, permitted_roles, successors};
