//! # Statutory Withholding
//!
//! The platform withholds a statutory percentage of each vendor's payable
//! amount and remits it to the tax authority on the vendor's behalf. The
//! rate and its minimum-threshold rule are external configuration; the
//! computation here must be deterministic and reproducible so that a
//! financial year of payouts can be re-derived identically for
//! certificates.

use serde::{Deserialize, Serialize};

use souk_core::Rate;

use crate::error::SettlementError;

/// One statutory withholding rule: a rate, the minimum payable amount it
/// applies from, and the statutory section it is levied under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithholdingRule {
    /// The statutory rate.
    pub rate: Rate,
    /// Minimum payable amount (minor units, inclusive) for withholding to
    /// apply. Below it the withheld amount is zero.
    pub minimum_payable: i64,
    /// Statutory section reference printed on certificates.
    pub statutory_section: String,
}

impl WithholdingRule {
    /// Create a withholding rule.
    pub fn new(rate: Rate, minimum_payable: i64, statutory_section: impl Into<String>) -> Self {
        Self {
            rate,
            minimum_payable,
            statutory_section: statutory_section.into(),
        }
    }

    /// Compute the withheld amount for a payable amount.
    ///
    /// Zero below the minimum threshold; `rate` applied with half-up
    /// rounding at or above it.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::Validation`] on arithmetic overflow.
    pub fn compute(&self, payable: i64) -> Result<i64, SettlementError> {
        if payable < self.minimum_payable {
            return Ok(0);
        }
        Ok(self.rate.apply(payable)?)
    }
}
