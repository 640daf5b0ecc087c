//! # The Ledger
//!
//! A single, thread-safe store over every persisted table: orders, order
//! lines, returns, payouts, and tracking history.
//!
//! ## Transaction Model
//!
//! All operations are synchronous (the lock is `parking_lot`, not an async
//! lock) because no operation performs I/O while holding it. Every
//! read-validate-write operation runs under one write lock: it either
//! commits in full or leaves the ledger untouched. Update closures run
//! against a working copy of the record, so a closure returning an error
//! rolls the whole operation back.
//!
//! ## Storage-Level Invariants
//!
//! Two invariants are enforced here, inside the lock, rather than by
//! check-then-insert in application code:
//!
//! 1. **At most one blocking return per order line.** [`Ledger::insert_return`]
//!    consults the active-return index and rejects the loser of a race with
//!    [`LedgerError::DuplicateReturn`].
//! 2. **No order line settles under two payouts.** [`Ledger::insert_payout`]
//!    re-validates every claimed line and deducted return; any line already
//!    claimed fails the whole insertion with
//!    [`LedgerError::ConcurrentSettlement`] and no partial marking.

use std::collections::HashMap;

use parking_lot::RwLock;
use thiserror::Error;

use souk_core::{
    Actor, CustomerId, OrderId, OrderLineId, PayoutId, ReturnId, ReturnNumber, SettlementPeriod,
    Timestamp, VendorId, RETURN_WINDOW_DAYS,
};

use crate::order::{LineStatus, Order, OrderLine, OrderStatus};
use crate::payout::{Payout, PayoutStatus};
use crate::return_request::ReturnRequest;
use crate::tracking::{sort_timeline, TrackingEntry, TrackingSubject};

// ── Errors ─────────────────────────────────────────────────────────────

/// Errors arising from ledger operations.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The referenced record does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// The entity kind ("order", "order line", "return", "payout").
        entity: String,
        /// The identifier that failed to resolve.
        id: String,
    },

    /// A blocking return already exists for the order line.
    #[error("order line {order_line_id} already has an active return {existing}")]
    DuplicateReturn {
        /// The order line.
        order_line_id: String,
        /// The return that blocks a new one.
        existing: String,
    },

    /// A concurrent settlement already claimed the line or return.
    #[error("order line {order_line_id} is already settled under another payout")]
    ConcurrentSettlement {
        /// The line (or the deducted return's line) that lost the race.
        order_line_id: String,
    },

    /// The payout's claims cannot be released in its current status.
    #[error("payout {payout_id} cannot be released in status {status}")]
    NotReleasable {
        /// The payout identifier.
        payout_id: String,
        /// The current status name.
        status: String,
    },

    /// The record's status forbids the attempted operation.
    #[error("{entity} {id} cannot perform {operation} in status {status}")]
    InvalidStatus {
        /// The entity kind.
        entity: String,
        /// The record identifier.
        id: String,
        /// The current status name.
        status: String,
        /// The attempted operation.
        operation: String,
    },

    /// An invariant the ledger assumes was found violated. Indicates a bug;
    /// the operation is aborted and must not be retried automatically.
    #[error("ledger integrity violation: {reason}")]
    Integrity {
        /// What was violated.
        reason: String,
    },
}

fn not_found(entity: &str, id: impl std::fmt::Display) -> LedgerError {
    LedgerError::NotFound {
        entity: entity.to_string(),
        id: id.to_string(),
    }
}

// ── Ledger ─────────────────────────────────────────────────────────────

#[derive(Default)]
struct LedgerInner {
    orders: HashMap<OrderId, Order>,
    lines: HashMap<OrderLineId, OrderLine>,
    returns: HashMap<ReturnId, ReturnRequest>,
    /// Unique index: the blocking return per order line, if any.
    active_returns: HashMap<OrderLineId, ReturnId>,
    payouts: HashMap<PayoutId, Payout>,
    tracking: Vec<TrackingEntry>,
    tracking_seq: u64,
    return_serial: u64,
}

impl LedgerInner {
    fn push_tracking(&mut self, mut entry: TrackingEntry) -> u64 {
        self.tracking_seq += 1;
        entry.seq = self.tracking_seq;
        self.tracking.push(entry);
        self.tracking_seq
    }
}

/// The back-office ledger store.
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
#[derive(Default)]
pub struct Ledger {
    inner: RwLock<LedgerInner>,
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("Ledger")
            .field("orders", &inner.orders.len())
            .field("lines", &inner.lines.len())
            .field("returns", &inner.returns.len())
            .field("payouts", &inner.payouts.len())
            .field("tracking_entries", &inner.tracking.len())
            .finish()
    }
}

impl Ledger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    // ── Orders ─────────────────────────────────────────────────────────

    /// Insert an order together with its lines.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Integrity`] if the order or any line already
    /// exists, or if a line references a different order.
    pub fn insert_order(&self, order: Order, lines: Vec<OrderLine>) -> Result<(), LedgerError> {
        let mut inner = self.inner.write();
        if inner.orders.contains_key(&order.id) {
            return Err(LedgerError::Integrity {
                reason: format!("order {} already exists", order.id),
            });
        }
        for line in &lines {
            if line.order_id != order.id {
                return Err(LedgerError::Integrity {
                    reason: format!(
                        "line {} references order {} while being inserted under {}",
                        line.id, line.order_id, order.id
                    ),
                });
            }
            if inner.lines.contains_key(&line.id) {
                return Err(LedgerError::Integrity {
                    reason: format!("order line {} already exists", line.id),
                });
            }
        }
        for line in lines {
            inner.lines.insert(line.id.clone(), line);
        }
        inner.orders.insert(order.id.clone(), order);
        Ok(())
    }

    /// Fetch an order snapshot.
    pub fn order(&self, id: &OrderId) -> Option<Order> {
        self.inner.read().orders.get(id).cloned()
    }

    /// Fetch an order line snapshot.
    pub fn line(&self, id: &OrderLineId) -> Option<OrderLine> {
        self.inner.read().lines.get(id).cloned()
    }

    /// Mark an order delivered and advance its pending/shipped lines.
    ///
    /// Appends a delivery tracking entry to the order's history.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] for an unknown order and
    /// [`LedgerError::InvalidStatus`] if the order cannot be delivered.
    pub fn mark_delivered(
        &self,
        order_id: &OrderId,
        at: Timestamp,
        actor: &Actor,
    ) -> Result<Order, LedgerError> {
        let mut inner = self.inner.write();
        let snapshot = {
            let order = inner
                .orders
                .get_mut(order_id)
                .ok_or_else(|| not_found("order", order_id))?;
            order.mark_delivered(at.clone())?;
            order.clone()
        };
        for line in inner.lines.values_mut() {
            if line.order_id == *order_id
                && matches!(line.status, LineStatus::Pending | LineStatus::Shipped)
            {
                line.status = LineStatus::Delivered;
            }
        }
        let entry = TrackingEntry::new(
            TrackingSubject::Order(order_id.clone()),
            OrderStatus::Delivered.as_str(),
            "order delivered to customer",
            actor,
        )
        .with_event_at(at);
        inner.push_tracking(entry);
        Ok(snapshot)
    }

    // ── Returns ────────────────────────────────────────────────────────

    /// Allocate the next human-readable return number.
    pub fn allocate_return_number(&self, now: &Timestamp) -> Result<ReturnNumber, LedgerError> {
        let mut inner = self.inner.write();
        inner.return_serial += 1;
        ReturnNumber::compose(&now.date_stamp(), inner.return_serial).map_err(|e| {
            LedgerError::Integrity {
                reason: format!("return number composition failed: {e}"),
            }
        })
    }

    /// The blocking return for an order line, if one exists.
    pub fn active_return_for_line(&self, line_id: &OrderLineId) -> Option<ReturnRequest> {
        let inner = self.inner.read();
        let rid = inner.active_returns.get(line_id)?;
        inner.returns.get(rid).cloned()
    }

    /// Fetch a return snapshot.
    pub fn return_request(&self, id: &ReturnId) -> Option<ReturnRequest> {
        self.inner.read().returns.get(id).cloned()
    }

    /// All returns filed by a customer, ordered by return number.
    pub fn returns_for_customer(&self, customer_id: &CustomerId) -> Vec<ReturnRequest> {
        let inner = self.inner.read();
        let mut out: Vec<ReturnRequest> = inner
            .returns
            .values()
            .filter(|r| r.customer_id == *customer_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.return_number.as_str().cmp(b.return_number.as_str()));
        out
    }

    /// Persist a new return request and its first tracking entry.
    ///
    /// The active-return uniqueness constraint is enforced here, inside the
    /// write lock: two requests racing to create a return for the same line
    /// are serialized with exactly one winner.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::DuplicateReturn`] if a blocking return
    /// already exists for the line, [`LedgerError::NotFound`] for an
    /// unknown line.
    pub fn insert_return(
        &self,
        request: ReturnRequest,
        entry: TrackingEntry,
    ) -> Result<ReturnRequest, LedgerError> {
        let mut inner = self.inner.write();
        if !inner.lines.contains_key(&request.order_line_id) {
            return Err(not_found("order line", &request.order_line_id));
        }
        if let Some(existing) = inner.active_returns.get(&request.order_line_id) {
            return Err(LedgerError::DuplicateReturn {
                order_line_id: request.order_line_id.to_string(),
                existing: existing.to_string(),
            });
        }
        if inner.returns.contains_key(&request.id) {
            return Err(LedgerError::Integrity {
                reason: format!("return {} already exists", request.id),
            });
        }
        inner
            .active_returns
            .insert(request.order_line_id.clone(), request.id.clone());
        let snapshot = request.clone();
        inner.returns.insert(request.id.clone(), request);
        inner.push_tracking(entry);
        Ok(snapshot)
    }

    /// Atomically read-validate-update a return.
    ///
    /// The closure receives a working copy. It may validate the current
    /// state, mutate the copy, and return a value plus the tracking entry
    /// recording the change. On `Err` nothing is written. On `Ok` the copy
    /// replaces the stored record, the active-return index is maintained
    /// (rejected/cancelled returns free their line), and the entry is
    /// appended — all before the lock is released.
    pub fn update_return<R, E, F>(&self, id: &ReturnId, f: F) -> Result<R, E>
    where
        E: From<LedgerError>,
        F: FnOnce(&mut ReturnRequest) -> Result<(R, TrackingEntry), E>,
    {
        let mut inner = self.inner.write();
        let mut working = inner
            .returns
            .get(id)
            .cloned()
            .ok_or_else(|| E::from(not_found("return", id)))?;
        let (value, entry) = f(&mut working)?;
        if !working.state.blocks_new_returns() {
            inner.active_returns.remove(&working.order_line_id);
        }
        inner.returns.insert(id.clone(), working);
        inner.push_tracking(entry);
        Ok(value)
    }

    // ── Settlement support ─────────────────────────────────────────────

    /// Sweep delivered lines whose return window has closed into the
    /// settleable status. The settleable instant is the window expiry, not
    /// the sweep time, so repeated sweeps are reproducible.
    ///
    /// Returns the number of lines transitioned.
    pub fn mark_settleable_after_window(&self, now: &Timestamp) -> usize {
        let mut inner = self.inner.write();
        let window = chrono::Duration::days(RETURN_WINDOW_DAYS);
        let delivered: HashMap<OrderId, Timestamp> = inner
            .orders
            .iter()
            .filter_map(|(id, o)| o.delivered_at.clone().map(|t| (id.clone(), t)))
            .collect();
        let mut count = 0;
        for line in inner.lines.values_mut() {
            if line.status != LineStatus::Delivered {
                continue;
            }
            let Some(delivered_at) = delivered.get(&line.order_id) else {
                continue;
            };
            let expiry = *delivered_at.as_datetime() + window;
            if *now.as_datetime() > expiry {
                line.status = LineStatus::Settleable;
                line.settleable_at = Some(Timestamp::from_datetime(expiry));
                count += 1;
            }
        }
        count
    }

    /// Explicitly mark a delivered line settleable before its window closes
    /// (vendor waived the window, or the line class has no returns).
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidStatus`] unless the line is delivered.
    pub fn force_settleable(
        &self,
        line_id: &OrderLineId,
        at: &Timestamp,
    ) -> Result<OrderLine, LedgerError> {
        let mut inner = self.inner.write();
        let line = inner
            .lines
            .get_mut(line_id)
            .ok_or_else(|| not_found("order line", line_id))?;
        if line.status != LineStatus::Delivered {
            return Err(LedgerError::InvalidStatus {
                entity: "order line".to_string(),
                id: line_id.to_string(),
                status: line.status.as_str().to_string(),
                operation: "force settleable".to_string(),
            });
        }
        line.status = LineStatus::Settleable;
        line.settleable_at = Some(at.clone());
        Ok(line.clone())
    }

    /// Unsettled settleable lines for a vendor whose settleable instant
    /// falls inside the period. Sorted by line id for deterministic payout
    /// contents.
    pub fn settleable_lines(
        &self,
        vendor_id: &VendorId,
        period: &SettlementPeriod,
    ) -> Vec<OrderLine> {
        let inner = self.inner.read();
        let mut out: Vec<OrderLine> = inner
            .lines
            .values()
            .filter(|l| {
                l.vendor_id == *vendor_id
                    && l.status == LineStatus::Settleable
                    && l.settled_under.is_none()
                    && l.settleable_at
                        .as_ref()
                        .is_some_and(|at| period.contains(at))
            })
            .cloned()
            .collect();
        out.sort_by(|a, b| a.id.to_string().cmp(&b.id.to_string()));
        out
    }

    /// Returns in a refund state for a vendor's lines, not yet deducted in
    /// any payout. Sorted by return number.
    pub fn deductible_returns(&self, vendor_id: &VendorId) -> Vec<ReturnRequest> {
        use crate::return_request::ReturnState;
        let inner = self.inner.read();
        let mut out: Vec<ReturnRequest> = inner
            .returns
            .values()
            .filter(|r| {
                r.vendor_id == *vendor_id
                    && r.deducted_in.is_none()
                    && matches!(
                        r.state,
                        ReturnState::RefundInitiated | ReturnState::RefundCompleted
                    )
            })
            .cloned()
            .collect();
        out.sort_by(|a, b| a.return_number.as_str().cmp(b.return_number.as_str()));
        out
    }

    /// Net amount already settled to a vendor under completed payouts.
    pub fn completed_net_for_vendor(&self, vendor_id: &VendorId) -> i64 {
        self.inner
            .read()
            .payouts
            .values()
            .filter(|p| p.vendor_id == *vendor_id && p.status == PayoutStatus::Completed)
            .fold(0i64, |acc, p| acc.saturating_add(p.amounts.net_payable))
    }

    // ── Payouts ────────────────────────────────────────────────────────

    /// Fetch a payout snapshot.
    pub fn payout(&self, id: &PayoutId) -> Option<Payout> {
        self.inner.read().payouts.get(id).cloned()
    }

    /// All payouts for a vendor, ordered by period start then id.
    pub fn payouts_for_vendor(&self, vendor_id: &VendorId) -> Vec<Payout> {
        let inner = self.inner.read();
        let mut out: Vec<Payout> = inner
            .payouts
            .values()
            .filter(|p| p.vendor_id == *vendor_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| {
            a.period
                .start
                .cmp(&b.period.start)
                .then_with(|| a.id.to_string().cmp(&b.id.to_string()))
        });
        out
    }

    /// Persist a computed payout and atomically claim its lines and
    /// deductions.
    ///
    /// Every claimed line and deducted return is re-validated under the
    /// write lock; any conflict fails the whole insertion with no partial
    /// marking, so two payout computations racing over overlapping lines
    /// are serialized with exactly one winner.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::ConcurrentSettlement`] if a claimed line (or
    /// deducted return) was already taken by another payout, and
    /// [`LedgerError::Integrity`] if a claim references foreign or
    /// non-settleable records.
    pub fn insert_payout(
        &self,
        payout: Payout,
        entry: TrackingEntry,
    ) -> Result<Payout, LedgerError> {
        use crate::return_request::ReturnState;
        let mut inner = self.inner.write();
        if inner.payouts.contains_key(&payout.id) {
            return Err(LedgerError::Integrity {
                reason: format!("payout {} already exists", payout.id),
            });
        }
        for line_id in &payout.settled_line_ids {
            let line = inner
                .lines
                .get(line_id)
                .ok_or_else(|| not_found("order line", line_id))?;
            if line.vendor_id != payout.vendor_id {
                return Err(LedgerError::Integrity {
                    reason: format!(
                        "payout for vendor {} claims line {} of vendor {}",
                        payout.vendor_id, line_id, line.vendor_id
                    ),
                });
            }
            if line.settled_under.is_some() {
                return Err(LedgerError::ConcurrentSettlement {
                    order_line_id: line_id.to_string(),
                });
            }
            if line.status != LineStatus::Settleable {
                return Err(LedgerError::Integrity {
                    reason: format!(
                        "payout claims line {line_id} in status {}",
                        line.status.as_str()
                    ),
                });
            }
        }
        for rid in &payout.deducted_return_ids {
            let ret = inner
                .returns
                .get(rid)
                .ok_or_else(|| not_found("return", rid))?;
            if ret.vendor_id != payout.vendor_id {
                return Err(LedgerError::Integrity {
                    reason: format!(
                        "payout for vendor {} deducts return {} of vendor {}",
                        payout.vendor_id, rid, ret.vendor_id
                    ),
                });
            }
            if ret.deducted_in.is_some() {
                return Err(LedgerError::ConcurrentSettlement {
                    order_line_id: ret.order_line_id.to_string(),
                });
            }
            if !matches!(
                ret.state,
                ReturnState::RefundInitiated | ReturnState::RefundCompleted
            ) {
                return Err(LedgerError::Integrity {
                    reason: format!("payout deducts return {rid} in state {}", ret.state),
                });
            }
        }

        // All claims validated; apply them.
        for line_id in &payout.settled_line_ids {
            if let Some(line) = inner.lines.get_mut(line_id) {
                line.status = LineStatus::Settled;
                line.settled_under = Some(payout.id.clone());
            }
        }
        for rid in &payout.deducted_return_ids {
            if let Some(ret) = inner.returns.get_mut(rid) {
                ret.deducted_in = Some(payout.id.clone());
            }
        }
        let snapshot = payout.clone();
        inner.payouts.insert(payout.id.clone(), payout);
        inner.push_tracking(entry);
        Ok(snapshot)
    }

    /// Atomically read-validate-update a payout. Same contract as
    /// [`Ledger::update_return`].
    pub fn update_payout<R, E, F>(&self, id: &PayoutId, f: F) -> Result<R, E>
    where
        E: From<LedgerError>,
        F: FnOnce(&mut Payout) -> Result<(R, TrackingEntry), E>,
    {
        let mut inner = self.inner.write();
        let mut working = inner
            .payouts
            .get(id)
            .cloned()
            .ok_or_else(|| E::from(not_found("payout", id)))?;
        let (value, entry) = f(&mut working)?;
        inner.payouts.insert(id.clone(), working);
        inner.push_tracking(entry);
        Ok(value)
    }

    /// Release a failed payout's settlement claims: its lines return to
    /// settleable and its deductions become available to the next payout.
    /// Never happens automatically — money may already be in flight.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotReleasable`] unless the payout is in the
    /// `Failed` status and has not already been released.
    pub fn release_settlement(
        &self,
        payout_id: &PayoutId,
        entry: TrackingEntry,
    ) -> Result<Payout, LedgerError> {
        let mut inner = self.inner.write();
        let (status, already_released, line_ids, return_ids) = {
            let p = inner
                .payouts
                .get(payout_id)
                .ok_or_else(|| not_found("payout", payout_id))?;
            (
                p.status,
                p.released_at.is_some(),
                p.settled_line_ids.clone(),
                p.deducted_return_ids.clone(),
            )
        };
        if status != PayoutStatus::Failed || already_released {
            return Err(LedgerError::NotReleasable {
                payout_id: payout_id.to_string(),
                status: if already_released {
                    "released".to_string()
                } else {
                    status.as_str().to_string()
                },
            });
        }
        for line_id in &line_ids {
            if let Some(line) = inner.lines.get_mut(line_id) {
                if line.settled_under.as_ref() == Some(payout_id) {
                    line.settled_under = None;
                    line.status = LineStatus::Settleable;
                }
            }
        }
        for rid in &return_ids {
            if let Some(ret) = inner.returns.get_mut(rid) {
                if ret.deducted_in.as_ref() == Some(payout_id) {
                    ret.deducted_in = None;
                }
            }
        }
        let released_at = entry.recorded_at.clone();
        let snapshot = {
            // Present, or the first read above would have failed.
            let p = inner
                .payouts
                .get_mut(payout_id)
                .ok_or_else(|| not_found("payout", payout_id))?;
            p.released_at = Some(released_at);
            p.clone()
        };
        inner.push_tracking(entry);
        Ok(snapshot)
    }

    // ── Tracking ───────────────────────────────────────────────────────

    /// Append a standalone tracking entry, returning its sequence number.
    pub fn append_tracking(&self, entry: TrackingEntry) -> u64 {
        self.inner.write().push_tracking(entry)
    }

    /// The ordered timeline for a subject: entries sorted by normalized
    /// timestamp ascending, ties broken by insertion order.
    pub fn timeline(&self, subject: &TrackingSubject) -> Vec<TrackingEntry> {
        let inner = self.inner.read();
        let mut entries: Vec<TrackingEntry> = inner
            .tracking
            .iter()
            .filter(|e| e.subject == *subject)
            .cloned()
            .collect();
        sort_timeline(&mut entries);
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::return_request::{ReturnReason, ReturnState, ReturnType};
    use souk_core::ActorRole;

    fn actor() -> Actor {
        Actor::new("ops-1", ActorRole::Admin)
    }

    fn seed_order(ledger: &Ledger, unit_price: i64, qty: u32) -> (OrderId, OrderLineId, CustomerId, VendorId) {
        let order_id = OrderId::new();
        let line_id = OrderLineId::new();
        let customer_id = CustomerId::new();
        let vendor_id = VendorId::new();
        let line_total = unit_price * i64::from(qty);
        let order = Order::new(
            order_id.clone(),
            customer_id.clone(),
            line_total,
            0,
            0,
            0,
            line_total,
            Timestamp::now(),
        )
        .unwrap();
        let line = OrderLine::new(
            line_id.clone(),
            order_id.clone(),
            vendor_id.clone(),
            "sku-1",
            unit_price,
            qty,
            0,
            0,
            line_total,
        )
        .unwrap();
        ledger.insert_order(order, vec![line]).unwrap();
        (order_id, line_id, customer_id, vendor_id)
    }

    fn seed_return(ledger: &Ledger, line_id: &OrderLineId, customer_id: &CustomerId, vendor_id: &VendorId) -> ReturnRequest {
        let now = Timestamp::now();
        let number = ledger.allocate_return_number(&now).unwrap();
        let request = ReturnRequest::new(
            number,
            line_id.clone(),
            customer_id.clone(),
            vendor_id.clone(),
            ReturnType::Refund,
            ReturnReason::Damaged,
            None,
            1,
            1_000,
            Vec::new(),
            now,
        );
        let entry = TrackingEntry::new(
            TrackingSubject::Return(request.id.clone()),
            "requested",
            "return requested",
            &actor(),
        );
        ledger.insert_return(request, entry).unwrap()
    }

    #[test]
    fn duplicate_return_rejected_by_the_store() {
        let ledger = Ledger::new();
        let (order_id, line_id, customer_id, vendor_id) = seed_order(&ledger, 1_000, 2);
        ledger
            .mark_delivered(&order_id, Timestamp::now(), &actor())
            .unwrap();
        let first = seed_return(&ledger, &line_id, &customer_id, &vendor_id);

        let now = Timestamp::now();
        let number = ledger.allocate_return_number(&now).unwrap();
        let second = ReturnRequest::new(
            number,
            line_id.clone(),
            customer_id.clone(),
            vendor_id.clone(),
            ReturnType::Refund,
            ReturnReason::Other,
            None,
            1,
            1_000,
            Vec::new(),
            now,
        );
        let entry = TrackingEntry::new(
            TrackingSubject::Return(second.id.clone()),
            "requested",
            "return requested",
            &actor(),
        );
        let err = ledger.insert_return(second, entry).unwrap_err();
        match err {
            LedgerError::DuplicateReturn { existing, .. } => {
                assert_eq!(existing, first.id.to_string());
            }
            other => panic!("expected DuplicateReturn, got {other:?}"),
        }
    }

    #[test]
    fn cancelled_return_frees_the_line() {
        let ledger = Ledger::new();
        let (order_id, line_id, customer_id, vendor_id) = seed_order(&ledger, 1_000, 2);
        ledger
            .mark_delivered(&order_id, Timestamp::now(), &actor())
            .unwrap();
        let first = seed_return(&ledger, &line_id, &customer_id, &vendor_id);

        ledger
            .update_return::<_, LedgerError, _>(&first.id, |ret| {
                ret.state = ReturnState::Cancelled;
                let entry = TrackingEntry::new(
                    TrackingSubject::Return(ret.id.clone()),
                    "cancelled",
                    "customer cancelled",
                    &actor(),
                );
                Ok(((), entry))
            })
            .unwrap();

        assert!(ledger.active_return_for_line(&line_id).is_none());
        // A new return is accepted now.
        seed_return(&ledger, &line_id, &customer_id, &vendor_id);
    }

    #[test]
    fn update_return_rolls_back_on_closure_error() {
        let ledger = Ledger::new();
        let (order_id, line_id, customer_id, vendor_id) = seed_order(&ledger, 1_000, 2);
        ledger
            .mark_delivered(&order_id, Timestamp::now(), &actor())
            .unwrap();
        let req = seed_return(&ledger, &line_id, &customer_id, &vendor_id);

        let result: Result<(), LedgerError> = ledger.update_return(&req.id, |ret| {
            // Mutate, then fail: the mutation must not be visible.
            ret.state = ReturnState::Approved;
            Err(LedgerError::Integrity {
                reason: "forced failure".to_string(),
            })
        });
        assert!(result.is_err());
        assert_eq!(
            ledger.return_request(&req.id).unwrap().state,
            ReturnState::Requested
        );
    }

    #[test]
    fn sweep_marks_lines_settleable_at_window_expiry() {
        let ledger = Ledger::new();
        let (order_id, line_id, _, _) = seed_order(&ledger, 1_000, 1);
        let delivered = Timestamp::from_datetime(
            chrono::Utc::now() - chrono::Duration::days(RETURN_WINDOW_DAYS + 2),
        );
        ledger
            .mark_delivered(&order_id, delivered.clone(), &actor())
            .unwrap();

        let swept = ledger.mark_settleable_after_window(&Timestamp::now());
        assert_eq!(swept, 1);
        let line = ledger.line(&line_id).unwrap();
        assert_eq!(line.status, LineStatus::Settleable);
        let expected_expiry = *delivered.as_datetime() + chrono::Duration::days(RETURN_WINDOW_DAYS);
        assert_eq!(
            line.settleable_at.unwrap().as_datetime(),
            &expected_expiry
        );
    }

    #[test]
    fn sweep_leaves_lines_inside_the_window() {
        let ledger = Ledger::new();
        let (order_id, line_id, _, _) = seed_order(&ledger, 1_000, 1);
        let delivered =
            Timestamp::from_datetime(chrono::Utc::now() - chrono::Duration::days(10));
        ledger.mark_delivered(&order_id, delivered, &actor()).unwrap();

        assert_eq!(ledger.mark_settleable_after_window(&Timestamp::now()), 0);
        assert_eq!(ledger.line(&line_id).unwrap().status, LineStatus::Delivered);
    }

    #[test]
    fn force_settleable_requires_delivery() {
        let ledger = Ledger::new();
        let (_, line_id, _, _) = seed_order(&ledger, 1_000, 1);
        let err = ledger
            .force_settleable(&line_id, &Timestamp::now())
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidStatus { .. }));
    }

    #[test]
    fn payout_claim_is_all_or_nothing() {
        use crate::payout::{Payout, PayoutAmounts};

        let ledger = Ledger::new();
        let (order_id, line_id, _, vendor_id) = seed_order(&ledger, 1_000, 1);
        let delivered = Timestamp::from_datetime(
            chrono::Utc::now() - chrono::Duration::days(RETURN_WINDOW_DAYS + 5),
        );
        ledger.mark_delivered(&order_id, delivered, &actor()).unwrap();
        ledger.mark_settleable_after_window(&Timestamp::now());

        let period = SettlementPeriod::new(
            Timestamp::from_datetime(chrono::Utc::now() - chrono::Duration::days(60)),
            Timestamp::now(),
        )
        .unwrap();
        let amounts = PayoutAmounts {
            gross_sales: 1_000,
            commission: 100,
            prior_settled: 0,
            return_deduction: 0,
            withholding_tax: 9,
            net_payable: 891,
        };
        let first = Payout::new(
            vendor_id.clone(),
            period.clone(),
            amounts.clone(),
            "S-153",
            vec![line_id.clone()],
            Vec::new(),
            Timestamp::now(),
        );
        let entry = TrackingEntry::new(
            TrackingSubject::Payout(first.id.clone()),
            "computed",
            "payout computed",
            &actor(),
        );
        ledger.insert_payout(first, entry).unwrap();

        // A second payout claiming the same line loses.
        let second = Payout::new(
            vendor_id.clone(),
            period,
            amounts,
            "S-153",
            vec![line_id.clone()],
            Vec::new(),
            Timestamp::now(),
        );
        let entry = TrackingEntry::new(
            TrackingSubject::Payout(second.id.clone()),
            "computed",
            "payout computed",
            &actor(),
        );
        let err = ledger.insert_payout(second, entry).unwrap_err();
        assert!(matches!(err, LedgerError::ConcurrentSettlement { .. }));
        assert_eq!(ledger.line(&line_id).unwrap().status, LineStatus::Settled);
    }

    #[test]
    fn release_requires_failed_status() {
        use crate::payout::{Payout, PayoutAmounts, PayoutStatus};

        let ledger = Ledger::new();
        let (order_id, line_id, _, vendor_id) = seed_order(&ledger, 1_000, 1);
        let delivered = Timestamp::from_datetime(
            chrono::Utc::now() - chrono::Duration::days(RETURN_WINDOW_DAYS + 5),
        );
        ledger.mark_delivered(&order_id, delivered, &actor()).unwrap();
        ledger.mark_settleable_after_window(&Timestamp::now());

        let period = SettlementPeriod::new(
            Timestamp::from_datetime(chrono::Utc::now() - chrono::Duration::days(60)),
            Timestamp::now(),
        )
        .unwrap();
        let payout = Payout::new(
            vendor_id,
            period,
            PayoutAmounts {
                gross_sales: 1_000,
                commission: 0,
                prior_settled: 0,
                return_deduction: 0,
                withholding_tax: 0,
                net_payable: 1_000,
            },
            "S-153",
            vec![line_id.clone()],
            Vec::new(),
            Timestamp::now(),
        );
        let pid = payout.id.clone();
        let entry = TrackingEntry::new(
            TrackingSubject::Payout(pid.clone()),
            "computed",
            "payout computed",
            &actor(),
        );
        ledger.insert_payout(payout, entry).unwrap();

        // Not failed yet: release refused.
        let entry = TrackingEntry::new(
            TrackingSubject::Payout(pid.clone()),
            "released",
            "claims released",
            &actor(),
        );
        assert!(matches!(
            ledger.release_settlement(&pid, entry),
            Err(LedgerError::NotReleasable { .. })
        ));

        // Fail it, then release.
        ledger
            .update_payout::<_, LedgerError, _>(&pid, |p| {
                p.status = PayoutStatus::Failed;
                let entry = TrackingEntry::new(
                    TrackingSubject::Payout(p.id.clone()),
                    "failed",
                    "disbursement failed",
                    &actor(),
                );
                Ok(((), entry))
            })
            .unwrap();
        let entry = TrackingEntry::new(
            TrackingSubject::Payout(pid.clone()),
            "released",
            "claims released",
            &actor(),
        );
        let released = ledger.release_settlement(&pid, entry).unwrap();
        assert!(released.released_at.is_some());
        let line = ledger.line(&line_id).unwrap();
        assert_eq!(line.status, LineStatus::Settleable);
        assert!(line.settled_under.is_none());

        // Second release refused.
        let entry = TrackingEntry::new(
            TrackingSubject::Payout(pid.clone()),
            "released",
            "claims released",
            &actor(),
        );
        assert!(matches!(
            ledger.release_settlement(&pid, entry),
            Err(LedgerError::NotReleasable { .. })
        ));
    }

    #[test]
    fn timeline_orders_by_effective_time_then_insertion() {
        let ledger = Ledger::new();
        let rid = ReturnId::new();
        let subject = TrackingSubject::Return(rid.clone());
        let base = chrono::Utc::now();

        let e1 = TrackingEntry::new(subject.clone(), "requested", "first", &actor())
            .with_recorded_at(Timestamp::from_datetime(base));
        let e2 = TrackingEntry::new(subject.clone(), "approved", "second", &actor())
            .with_recorded_at(Timestamp::from_datetime(base + chrono::Duration::seconds(5)))
            .with_event_at(Timestamp::from_datetime(base));
        let e3 = TrackingEntry::new(subject.clone(), "pickup_scheduled", "third", &actor())
            .with_recorded_at(Timestamp::from_datetime(base + chrono::Duration::seconds(2)));
        ledger.append_tracking(e1);
        ledger.append_tracking(e2);
        ledger.append_tracking(e3);

        let timeline = ledger.timeline(&subject);
        let statuses: Vec<&str> = timeline.iter().map(|e| e.status.as_str()).collect();
        // e2's explicit event time ties with e1; insertion order breaks the tie.
        assert_eq!(statuses, vec!["requested", "approved", "pickup_scheduled"]);
    }
}
