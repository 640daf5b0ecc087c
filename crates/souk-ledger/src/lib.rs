//! # souk-ledger — Ledger Store
//!
//! Durable-state modelling for the back office. This crate exclusively owns
//! persisted state: orders, order lines, return requests, payouts, and the
//! append-only tracking history. Every other crate holds only identifiers
//! and re-fetches snapshots rather than caching authoritative values across
//! a transaction boundary.
//!
//! - **Orders** ([`order`]): immutable-once-placed order aggregates and
//!   per-vendor order lines with their fulfillment status.
//!
//! - **Returns** ([`return_request`]): the persisted return request record
//!   and its lifecycle state. Transition *rules* live in `souk-returns`;
//!   this crate stores the record and enforces the at-most-one-active-return
//!   uniqueness constraint at the storage layer.
//!
//! - **Payouts** ([`payout`]): vendor settlement records with
//!   double-settlement prevention via atomic line claims.
//!
//! - **Tracking** ([`tracking`]): write-once audit entries attached to an
//!   order, return, or payout.
//!
//! - **Store** ([`store`]): the [`Ledger`] itself — a single
//!   `parking_lot::RwLock` over all tables, so every read-validate-write
//!   operation commits atomically or not at all.
//!
//! - **Events** ([`events`]): fire-and-forget domain event emission for
//!   external collaborators, dispatched strictly after commit.

pub mod events;
pub mod order;
pub mod payout;
pub mod return_request;
pub mod store;
pub mod tracking;

// Re-export primary types.
pub use events::{DomainEvent, EventSink, TracingSink};
pub use order::{LineStatus, Order, OrderLine, OrderStatus};
pub use payout::{Payout, PayoutAmounts, PayoutStatus};
pub use return_request::{ReturnReason, ReturnRequest, ReturnState, ReturnType};
pub use store::{Ledger, LedgerError};
pub use tracking::{TrackingEntry, TrackingSubject};
