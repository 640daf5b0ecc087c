//! # Settlement Configuration
//!
//! Commission rates and the statutory withholding rule, treated as inputs
//! from external settings storage. Percent and amount strings are parsed
//! once here, at the boundary; everything downstream works in basis points
//! and minor units.

use std::collections::HashMap;

use souk_core::{parse_amount, Rate, VendorId};

use crate::error::SettlementError;
use crate::withholding::WithholdingRule;

/// Commission and withholding configuration for the payout engine.
#[derive(Debug, Clone)]
pub struct SettlementConfig {
    default_commission: Rate,
    commission_overrides: HashMap<VendorId, Rate>,
    /// The statutory withholding rule applied to every payout.
    pub withholding: WithholdingRule,
}

impl SettlementConfig {
    /// Create a configuration with a platform-wide commission rate.
    pub fn new(default_commission: Rate, withholding: WithholdingRule) -> Self {
        Self {
            default_commission,
            commission_overrides: HashMap::new(),
            withholding,
        }
    }

    /// Parse a configuration from external settings values.
    ///
    /// `commission_percent` and `statutory_percent` are percent strings
    /// (`"10"`, `"4.5"`); `withholding_threshold` is an amount string in
    /// whole currency units.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::Validation`] for malformed settings.
    pub fn from_settings(
        commission_percent: &str,
        statutory_percent: &str,
        withholding_threshold: &str,
        statutory_section: &str,
    ) -> Result<Self, SettlementError> {
        let commission = Rate::from_percent_str(commission_percent)?;
        let statutory = Rate::from_percent_str(statutory_percent)?;
        let threshold = parse_amount(withholding_threshold)?;
        Ok(Self::new(
            commission,
            WithholdingRule::new(statutory, threshold, statutory_section),
        ))
    }

    /// Set a vendor-specific commission rate.
    pub fn with_vendor_commission(mut self, vendor_id: VendorId, rate: Rate) -> Self {
        self.commission_overrides.insert(vendor_id, rate);
        self
    }

    /// The commission rate for a vendor: its override, or the platform
    /// default.
    pub fn commission_for(&self, vendor_id: &VendorId) -> Rate {
        self.commission_overrides
            .get(vendor_id)
            .copied()
            .unwrap_or(self.default_commission)
    }
}
