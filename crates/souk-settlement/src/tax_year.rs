//! # Financial-Year Withholding Aggregation
//!
//! Folds a vendor's payouts into the financial-year summary behind
//! statutory withholding certificates. The summary is derived, never
//! cached: it must be recomputable at any later time from the same payout
//! set with byte-identical results, so certificate data can be regenerated
//! for audit.

use serde::{Deserialize, Serialize};

use souk_core::{
    checked_sum, format_amount, CertificateNumber, FinancialYear, PayoutId, Timestamp, VendorId,
};
use souk_ledger::{Ledger, PayoutStatus};

use crate::error::SettlementError;
use crate::withholding::WithholdingRule;

/// A vendor's financial-year withholding totals.
///
/// Equals the sum of its constituent payouts' values for the year; failed
/// payouts contribute nothing. `payout_refs` is ordered by period start
/// then payout id, so two computations over the same payout set are
/// identical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorTaxYearSummary {
    /// The vendor.
    pub vendor_id: VendorId,
    /// The financial year covered.
    pub financial_year: FinancialYear,
    /// Total gross sales across included payouts.
    pub gross_sales: i64,
    /// Total withholding across included payouts.
    pub total_withheld: i64,
    /// The payouts included, in deterministic order.
    pub payout_refs: Vec<PayoutId>,
}

/// Fold a vendor's payouts for a financial year into a summary.
///
/// A payout belongs to the financial year containing its period start.
/// Every status except `failed` contributes.
///
/// # Errors
///
/// Returns [`SettlementError::Validation`] if the totals overflow.
pub fn summarize_year(
    ledger: &Ledger,
    vendor_id: &VendorId,
    financial_year: FinancialYear,
) -> Result<VendorTaxYearSummary, SettlementError> {
    let included: Vec<_> = ledger
        .payouts_for_vendor(vendor_id)
        .into_iter()
        .filter(|p| p.status != PayoutStatus::Failed && financial_year.contains(&p.period.start))
        .collect();

    let gross_sales = checked_sum(included.iter().map(|p| p.amounts.gross_sales))?;
    let total_withheld = checked_sum(included.iter().map(|p| p.amounts.withholding_tax))?;

    Ok(VendorTaxYearSummary {
        vendor_id: vendor_id.clone(),
        financial_year,
        gross_sales,
        total_withheld,
        payout_refs: included.into_iter().map(|p| p.id).collect(),
    })
}

/// Structured certificate data handed to the external document renderer.
///
/// Every field is computed and validated here; rendering is not this
/// core's concern. Amounts are formatted strings with two decimal places,
/// the rate is a percent string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateData {
    /// Certificate number (`WHC-YYYY-NNNNNN`).
    pub certificate_number: CertificateNumber,
    /// The financial year label (`"2025-2026"`).
    pub financial_year: String,
    /// The withholding party (the platform).
    pub deductor: String,
    /// The party tax was withheld from (the vendor).
    pub deductee: String,
    /// Statutory section the tax was withheld under.
    pub section: String,
    /// First instant of the certificate period.
    pub period_start: Timestamp,
    /// Last instant of the certificate period.
    pub period_end: Timestamp,
    /// When the certificate's deduction is dated.
    pub deduction_date: Timestamp,
    /// Gross amount, formatted.
    pub gross_amount: String,
    /// Withholding rate, percent string.
    pub rate: String,
    /// Withheld tax amount, formatted.
    pub tax_amount: String,
    /// Net amount after withholding, formatted.
    pub net_amount: String,
}

/// Produce certificate data from a financial-year summary.
///
/// # Errors
///
/// Returns [`SettlementError::Integrity`] for negative totals or withheld
/// tax exceeding gross (the summary no longer reconciles with the payout
/// ledger), and [`SettlementError::Validation`] for an invalid serial.
pub fn issue_certificate(
    summary: &VendorTaxYearSummary,
    deductor: &str,
    deductee: &str,
    rule: &WithholdingRule,
    serial: u32,
    deduction_date: Timestamp,
) -> Result<CertificateData, SettlementError> {
    if summary.gross_sales < 0 || summary.total_withheld < 0 {
        return Err(SettlementError::Integrity {
            reason: format!(
                "tax year summary for vendor {} has negative totals (gross {}, withheld {})",
                summary.vendor_id, summary.gross_sales, summary.total_withheld
            ),
        });
    }
    if summary.total_withheld > summary.gross_sales {
        return Err(SettlementError::Integrity {
            reason: format!(
                "tax year summary for vendor {} withholds {} against gross {}",
                summary.vendor_id, summary.total_withheld, summary.gross_sales
            ),
        });
    }

    let certificate_number =
        CertificateNumber::compose(summary.financial_year.start_year(), serial)?;
    let net = summary.gross_sales - summary.total_withheld;

    Ok(CertificateData {
        certificate_number,
        financial_year: summary.financial_year.label(),
        deductor: deductor.to_string(),
        deductee: deductee.to_string(),
        section: rule.statutory_section.clone(),
        period_start: summary.financial_year.start(),
        period_end: summary.financial_year.end(),
        deduction_date,
        gross_amount: format_amount(summary.gross_sales),
        rate: rule.rate.percent_string(),
        tax_amount: format_amount(summary.total_withheld),
        net_amount: format_amount(net),
    })
}
