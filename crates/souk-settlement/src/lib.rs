//! # souk-settlement — Vendor Settlement Engine
//!
//! Periodically (or on demand) turns a vendor's settled sales into money:
//!
//! - **Config** ([`config`]): commission and statutory-withholding
//!   configuration, parsed once from external settings storage.
//!
//! - **Withholding** ([`withholding`]): the statutory rate + minimum
//!   threshold computation, deterministic and reproducible for audit.
//!
//! - **Engine** ([`payout`]): aggregates eligible order lines, subtracts
//!   commission and return deductions, withholds tax, and persists the
//!   payout with atomic double-settlement prevention; drives the payout
//!   status machine.
//!
//! - **Tax year** ([`tax_year`]): folds a vendor's payouts into the
//!   financial-year summary behind withholding certificates.

pub mod config;
pub mod error;
pub mod payout;
pub mod tax_year;
pub mod withholding;

// Re-export primary types.
pub use config::SettlementConfig;
pub use error::SettlementError;
pub use payout::PayoutEngine;
pub use tax_year::{issue_certificate, summarize_year, CertificateData, VendorTaxYearSummary};
pub use withholding::WithholdingRule;
