#![deny(missing_docs)]

//! # souk-core — Foundational Types for the Souk Back Office
//!
//! This crate defines the foundational types every other crate in the
//! workspace depends on. It has no internal crate dependencies — only
//! `serde`, `thiserror`, `chrono`, and `uuid` from the external ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** Every identifier is a
//!    distinct type. You cannot pass a [`CustomerId`] where a [`VendorId`]
//!    is expected.
//!
//! 2. **Integer money.** All monetary amounts are `i64` in the smallest
//!    currency unit. Rates are basis points. Percent strings are parsed at
//!    the configuration boundary, never carried through arithmetic.
//!
//! 3. **UTC-only time.** All timestamps are [`Timestamp`] (UTC, canonical
//!    second-precision string form). Local time is a presentation concern.
//!
//! 4. **Explicit actors.** Every state-changing operation takes an
//!    [`Actor`] parameter — there is no ambient request context.

pub mod actor;
pub mod error;
pub mod identity;
pub mod money;
pub mod temporal;

// Re-export primary types at crate root for ergonomic imports.
pub use actor::{Actor, ActorRole};
pub use error::ValidationError;
pub use identity::{
    CertificateNumber, CustomerId, OrderId, OrderLineId, PayoutId, ReturnId, ReturnNumber,
    VendorId,
};
pub use money::{checked_sum, format_amount, parse_amount, Rate};
pub use temporal::{FinancialYear, SettlementPeriod, Timestamp, RETURN_WINDOW_DAYS};
