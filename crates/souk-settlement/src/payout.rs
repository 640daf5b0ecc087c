//! # Payout Engine
//!
//! Computes what a vendor is owed for a settlement period and drives the
//! payout status machine.
//!
//! ## Algorithm
//!
//! 1. Select the vendor's settleable, unsettled lines whose settleable
//!    instant falls in the period.
//! 2. `gross_sales = Σ line_total`.
//! 3. `commission = commission_rate × gross_sales`.
//! 4. `return_deduction = Σ refund_amount` over undeducted returns in
//!    refund states.
//! 5. `payable_before_tax = gross_sales − commission − return_deduction`.
//! 6. `withholding_tax` per the statutory rule (zero below threshold).
//! 7. `net_payable = payable_before_tax − withholding_tax`.
//! 8. Persist in `computed`; the ledger claims every line and deduction
//!    atomically, so racing computations over overlapping lines get
//!    exactly one winner.
//!
//! Vendor balances move only when an operator advances the payout to
//! `processing` and then `completed`/`failed` — each a discrete transition
//! with its own timestamp and tracking entry. A failed payout keeps its
//! claims until an explicit release.

use std::sync::Arc;

use souk_core::{
    checked_sum, Actor, PayoutId, SettlementPeriod, Timestamp, ValidationError, VendorId,
};
use souk_ledger::{
    DomainEvent, EventSink, Ledger, Payout, PayoutAmounts, PayoutStatus, TrackingEntry,
    TrackingSubject,
};

use crate::config::SettlementConfig;
use crate::error::SettlementError;

/// The vendor settlement engine.
#[derive(Clone)]
pub struct PayoutEngine {
    ledger: Arc<Ledger>,
    config: SettlementConfig,
    sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for PayoutEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayoutEngine")
            .field("config", &self.config)
            .finish()
    }
}

impl PayoutEngine {
    /// Create an engine over the shared ledger.
    pub fn new(ledger: Arc<Ledger>, config: SettlementConfig, sink: Arc<dyn EventSink>) -> Self {
        Self {
            ledger,
            config,
            sink,
        }
    }

    /// Compute and persist a payout for the vendor and period.
    ///
    /// # Errors
    ///
    /// [`SettlementError::InsufficientData`] when no eligible lines exist
    /// (see [`PayoutEngine::calculate_payout_or_zero`] for the zero-payout
    /// policy), [`SettlementError::ConcurrentSettlement`] when a racing
    /// computation claimed overlapping lines first.
    pub fn calculate_payout(
        &self,
        vendor_id: &VendorId,
        period: &SettlementPeriod,
    ) -> Result<Payout, SettlementError> {
        self.compute_and_persist(vendor_id, period, false)
    }

    /// Like [`PayoutEngine::calculate_payout`], but an empty period yields
    /// a persisted zero-amount payout (claiming nothing) instead of
    /// [`SettlementError::InsufficientData`].
    pub fn calculate_payout_or_zero(
        &self,
        vendor_id: &VendorId,
        period: &SettlementPeriod,
    ) -> Result<Payout, SettlementError> {
        self.compute_and_persist(vendor_id, period, true)
    }

    fn compute_and_persist(
        &self,
        vendor_id: &VendorId,
        period: &SettlementPeriod,
        allow_empty: bool,
    ) -> Result<Payout, SettlementError> {
        // Wall-clock read once per invocation.
        let now = Timestamp::now();

        let lines = self.ledger.settleable_lines(vendor_id, period);
        if lines.is_empty() && !allow_empty {
            return Err(SettlementError::InsufficientData {
                vendor_id: vendor_id.to_string(),
                period: period.to_string(),
            });
        }
        // An empty zero-payout claims nothing; pending deductions wait for
        // the next line-bearing payout.
        let deductible = if lines.is_empty() {
            Vec::new()
        } else {
            self.ledger.deductible_returns(vendor_id)
        };

        let gross_sales = checked_sum(lines.iter().map(|l| l.line_total))?;
        let commission = self.config.commission_for(vendor_id).apply(gross_sales)?;
        let return_deduction = checked_sum(deductible.iter().map(|r| r.refund_amount))?;
        let payable_before_tax = gross_sales
            .checked_sub(commission)
            .and_then(|v| v.checked_sub(return_deduction))
            .ok_or(ValidationError::AmountOverflow)?;
        let withholding_tax = self.config.withholding.compute(payable_before_tax)?;
        let net_payable = payable_before_tax
            .checked_sub(withholding_tax)
            .ok_or(ValidationError::AmountOverflow)?;
        let prior_settled = self.ledger.completed_net_for_vendor(vendor_id);

        tracing::debug!(
            vendor_id = %vendor_id,
            gross_sales,
            commission,
            return_deduction,
            withholding_tax,
            net_payable,
            "payout computed"
        );

        let payout = Payout::new(
            vendor_id.clone(),
            period.clone(),
            PayoutAmounts {
                gross_sales,
                commission,
                prior_settled,
                return_deduction,
                withholding_tax,
                net_payable,
            },
            self.config.withholding.statutory_section.clone(),
            lines.iter().map(|l| l.id.clone()).collect(),
            deductible.iter().map(|r| r.id.clone()).collect(),
            now.clone(),
        );
        let actor = Actor::system("settlement-run");
        let entry = TrackingEntry::new(
            TrackingSubject::Payout(payout.id.clone()),
            PayoutStatus::Computed.as_str(),
            format!("payout computed for period {period}"),
            &actor,
        )
        .with_event_at(now);

        let persisted = self.ledger.insert_payout(payout, entry)?;

        self.sink.emit(&DomainEvent::PayoutComputed {
            payout_id: persisted.id.clone(),
            vendor_id: persisted.vendor_id.clone(),
            net_payable: persisted.amounts.net_payable,
        });
        Ok(persisted)
    }

    /// Advance a payout to `target`.
    ///
    /// Allowed transitions: `computed → processing`,
    /// `processing → completed`, `processing → failed`. Each is a single
    /// atomic read-validate-write-append with its own timestamp.
    ///
    /// # Errors
    ///
    /// [`SettlementError::TerminalStatus`] or
    /// [`SettlementError::InvalidTransition`].
    pub fn advance_payout(
        &self,
        payout_id: &PayoutId,
        target: PayoutStatus,
        actor: &Actor,
    ) -> Result<Payout, SettlementError> {
        let now = Timestamp::now();

        let (updated, from) =
            self.ledger
                .update_payout::<_, SettlementError, _>(payout_id, |payout| {
                    let from = payout.status;
                    if from.is_terminal() {
                        return Err(SettlementError::TerminalStatus {
                            payout_id: payout.id.to_string(),
                            status: from,
                        });
                    }
                    let allowed = matches!(
                        (from, target),
                        (PayoutStatus::Computed, PayoutStatus::Processing)
                            | (PayoutStatus::Processing, PayoutStatus::Completed)
                            | (PayoutStatus::Processing, PayoutStatus::Failed)
                    );
                    if !allowed {
                        return Err(SettlementError::InvalidTransition { from, to: target });
                    }
                    payout.status = target;
                    match target {
                        PayoutStatus::Processing => payout.processing_at = Some(now.clone()),
                        PayoutStatus::Completed | PayoutStatus::Failed => {
                            payout.completed_at = Some(now.clone())
                        }
                        PayoutStatus::Computed => {}
                    }
                    let entry = TrackingEntry::new(
                        TrackingSubject::Payout(payout.id.clone()),
                        target.as_str(),
                        format!("payout {target}"),
                        actor,
                    )
                    .with_event_at(now.clone());
                    Ok(((payout.clone(), from), entry))
                })?;

        self.sink.emit(&DomainEvent::PayoutStateChanged {
            payout_id: updated.id.clone(),
            from,
            to: target,
        });
        Ok(updated)
    }

    /// Release a failed payout's settlement claims so its lines and
    /// deductions become available to a future computation. Requires an
    /// explicit operator action — money may already be in flight.
    ///
    /// # Errors
    ///
    /// [`SettlementError::NotReleasable`] unless the payout is `failed`
    /// and unreleased.
    pub fn release_failed_payout(
        &self,
        payout_id: &PayoutId,
        actor: &Actor,
    ) -> Result<Payout, SettlementError> {
        let entry = TrackingEntry::new(
            TrackingSubject::Payout(payout_id.clone()),
            "released",
            "settlement claims released after failure",
            actor,
        );
        let released = self.ledger.release_settlement(payout_id, entry)?;
        tracing::info!(payout_id = %payout_id, "failed payout claims released");
        Ok(released)
    }
}
