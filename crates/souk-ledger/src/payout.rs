//! # Payout Records
//!
//! A payout settles one vendor for one settlement period: gross eligible
//! sales net of platform commission, return deductions, and statutory
//! withholding. Computed by the payout engine in `souk-settlement`,
//! advanced through its status machine by operator action, and immutable
//! once completed.

use serde::{Deserialize, Serialize};

use souk_core::{OrderLineId, PayoutId, ReturnId, SettlementPeriod, Timestamp, VendorId};

// ── Payout Status ──────────────────────────────────────────────────────

/// The status of a payout.
///
/// Status machine: `Computed → Processing → [Completed | Failed]`.
/// Terminal states: `Completed`, `Failed`. A failed payout keeps its
/// settled lines claimed until an explicit release, since money may
/// already be in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    /// Amounts computed and persisted; nothing disbursed yet.
    Computed,
    /// Disbursement in progress with the payment collaborator.
    Processing,
    /// Funds confirmed transferred. Terminal state.
    Completed,
    /// Disbursement failed. Terminal state.
    Failed,
}

impl PayoutStatus {
    /// Whether this status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// The canonical string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Computed => "computed",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Payout ─────────────────────────────────────────────────────────────

/// The monetary breakdown of a payout. All values are minor units.
///
/// Groups the computed amounts into one struct so the payout constructor
/// stays legible (and so tests can state expectations in one literal).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutAmounts {
    /// Sum of settled line totals.
    pub gross_sales: i64,
    /// Platform commission on gross sales.
    pub commission: i64,
    /// Net already settled to this vendor under prior completed payouts.
    pub prior_settled: i64,
    /// Refund amounts deducted for returns in refund states.
    pub return_deduction: i64,
    /// Statutory withholding on the payable amount.
    pub withholding_tax: i64,
    /// Amount payable to the vendor after all deductions.
    pub net_payable: i64,
}

/// A vendor settlement record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payout {
    /// Unique payout identifier.
    pub id: PayoutId,
    /// The vendor being settled.
    pub vendor_id: VendorId,
    /// The settlement period covered.
    pub period: SettlementPeriod,
    /// The monetary breakdown.
    pub amounts: PayoutAmounts,
    /// Statutory section the withholding was computed under.
    pub statutory_section: String,
    /// Current status.
    pub status: PayoutStatus,
    /// Order lines settled under this payout.
    pub settled_line_ids: Vec<OrderLineId>,
    /// Returns whose refunds were deducted under this payout.
    pub deducted_return_ids: Vec<ReturnId>,
    /// When the payout was computed.
    pub created_at: Timestamp,
    /// When processing began, once it has.
    pub processing_at: Option<Timestamp>,
    /// When the payout completed or failed, once it has.
    pub completed_at: Option<Timestamp>,
    /// When a failed payout's claims were released, once they were.
    pub released_at: Option<Timestamp>,
}

impl Payout {
    /// Create a payout in the `Computed` status.
    pub fn new(
        vendor_id: VendorId,
        period: SettlementPeriod,
        amounts: PayoutAmounts,
        statutory_section: impl Into<String>,
        settled_line_ids: Vec<OrderLineId>,
        deducted_return_ids: Vec<ReturnId>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id: PayoutId::new(),
            vendor_id,
            period,
            amounts,
            statutory_section: statutory_section.into(),
            status: PayoutStatus::Computed,
            settled_line_ids,
            deducted_return_ids,
            created_at,
            processing_at: None,
            completed_at: None,
            released_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn ts(s: &str) -> Timestamp {
        Timestamp::from_datetime(DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc))
    }

    fn sample_payout() -> Payout {
        Payout::new(
            VendorId::new(),
            SettlementPeriod::new(ts("2026-01-01T00:00:00Z"), ts("2026-01-31T23:59:59Z"))
                .unwrap(),
            PayoutAmounts {
                gross_sales: 100_000,
                commission: 10_000,
                prior_settled: 0,
                return_deduction: 5_000,
                withholding_tax: 850,
                net_payable: 84_150,
            },
            "ITO 2001 Section 153(1)(a)",
            vec![OrderLineId::new()],
            Vec::new(),
            ts("2026-02-01T06:00:00Z"),
        )
    }

    #[test]
    fn payout_starts_computed() {
        let p = sample_payout();
        assert_eq!(p.status, PayoutStatus::Computed);
        assert!(p.processing_at.is_none());
        assert!(p.completed_at.is_none());
        assert!(p.released_at.is_none());
    }

    #[test]
    fn terminal_statuses() {
        assert!(PayoutStatus::Completed.is_terminal());
        assert!(PayoutStatus::Failed.is_terminal());
        assert!(!PayoutStatus::Computed.is_terminal());
        assert!(!PayoutStatus::Processing.is_terminal());
    }

    #[test]
    fn status_display() {
        assert_eq!(PayoutStatus::Computed.to_string(), "computed");
        assert_eq!(PayoutStatus::Processing.to_string(), "processing");
        assert_eq!(PayoutStatus::Completed.to_string(), "completed");
        assert_eq!(PayoutStatus::Failed.to_string(), "failed");
    }

    #[test]
    fn payout_serde_roundtrip() {
        let p = sample_payout();
        let json = serde_json::to_string(&p).unwrap();
        let back: Payout = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, p.id);
        assert_eq!(back.amounts, p.amounts);
        assert_eq!(back.status, p.status);
    }
}
