//! # Return Request Manager
//!
//! Orchestrates the return lifecycle against the ledger: creation,
//! cancellation, state advancement, timelines, and per-customer
//! statistics. Every mutation is a single atomic ledger operation; domain
//! events are emitted strictly after commit and never affect the outcome.

use std::sync::Arc;

use souk_core::{Actor, ActorRole, CustomerId, OrderLineId, ReturnId, Timestamp};
use souk_ledger::{
    DomainEvent, EventSink, Ledger, ReturnReason, ReturnRequest, ReturnState, ReturnType,
    TrackingEntry, TrackingSubject,
};

use crate::eligibility::check_eligibility;
use crate::error::ReturnError;
use crate::refund::{compute_refund, RefundPolicy};
use crate::state::authorize_transition;

/// Input contract for creating a return.
#[derive(Debug, Clone)]
pub struct CreateReturn {
    /// The order line being returned.
    pub order_line_id: OrderLineId,
    /// The customer filing the return.
    pub customer_id: CustomerId,
    /// What the customer wants.
    pub return_type: ReturnType,
    /// The reason code.
    pub reason: ReturnReason,
    /// Optional free-text elaboration.
    pub reason_text: Option<String>,
    /// Quantity being returned.
    pub quantity: u32,
    /// Opaque evidence references (external file storage URIs).
    pub evidence_refs: Vec<String>,
}

/// Per-customer return counts, bucketed by lifecycle stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReturnStatistics {
    /// Awaiting vendor review (`requested`).
    pub pending: usize,
    /// Approved and physically moving (`approved` through `inspecting`).
    pub in_flight: usize,
    /// Past inspection, refund underway.
    pub processing: usize,
    /// Refund completed.
    pub completed: usize,
    /// Rejected, cancelled, or failed inspection.
    pub closed: usize,
}

/// The return request manager.
///
/// Holds the shared ledger, the event sink, and the configured refund
/// policy. Cheap to clone.
#[derive(Clone)]
pub struct ReturnManager {
    ledger: Arc<Ledger>,
    sink: Arc<dyn EventSink>,
    refund_policy: RefundPolicy,
}

impl std::fmt::Debug for ReturnManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReturnManager")
            .field("refund_policy", &self.refund_policy)
            .finish()
    }
}

impl ReturnManager {
    /// Create a manager with the default refund policy.
    pub fn new(ledger: Arc<Ledger>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            ledger,
            sink,
            refund_policy: RefundPolicy::default(),
        }
    }

    /// Override the refund policy.
    pub fn with_refund_policy(mut self, policy: RefundPolicy) -> Self {
        self.refund_policy = policy;
        self
    }

    /// Create a return request.
    ///
    /// Verifies line ownership, runs the eligibility rules, computes the
    /// refund amount, and persists the request in the `requested` state
    /// with its first tracking entry. The decisive one-active-return check
    /// happens inside the ledger's write lock, so concurrent requests for
    /// the same line are serialized with exactly one winner.
    ///
    /// # Errors
    ///
    /// Any of the eligibility rejections from
    /// [`check_eligibility`], [`ReturnError::Unauthorized`] for a foreign
    /// line, or [`ReturnError::DuplicateReturn`] when losing the race.
    pub fn create_return(&self, input: CreateReturn) -> Result<ReturnRequest, ReturnError> {
        // Wall-clock read once per invocation.
        let now = Timestamp::now();

        let line = self
            .ledger
            .line(&input.order_line_id)
            .ok_or_else(|| ReturnError::NotFound {
                entity: "order line".to_string(),
                id: input.order_line_id.to_string(),
            })?;
        let order = self
            .ledger
            .order(&line.order_id)
            .ok_or_else(|| ReturnError::Integrity {
                reason: format!("order line {} references missing order {}", line.id, line.order_id),
            })?;

        if order.customer_id != input.customer_id {
            return Err(ReturnError::Unauthorized {
                order_line_id: line.id.to_string(),
                customer_id: input.customer_id.to_string(),
            });
        }

        let active = self.ledger.active_return_for_line(&line.id);
        check_eligibility(&order, &line, active.as_ref(), input.quantity, &now)?;

        let refund_amount = compute_refund(&line, input.quantity, self.refund_policy)?;
        let return_number = self.ledger.allocate_return_number(&now)?;

        let actor = Actor::new(input.customer_id.to_string(), ActorRole::Customer);
        let request = ReturnRequest::new(
            return_number,
            line.id.clone(),
            input.customer_id,
            line.vendor_id.clone(),
            input.return_type,
            input.reason,
            input.reason_text,
            input.quantity,
            refund_amount,
            input.evidence_refs,
            now.clone(),
        );
        let entry = TrackingEntry::new(
            TrackingSubject::Return(request.id.clone()),
            ReturnState::Requested.as_str(),
            format!("return requested ({})", request.reason),
            &actor,
        )
        .with_event_at(now);

        let created = self.ledger.insert_return(request, entry)?;

        self.sink.emit(&DomainEvent::ReturnCreated {
            return_id: created.id.clone(),
            order_line_id: created.order_line_id.clone(),
            customer_id: created.customer_id.clone(),
        });
        Ok(created)
    }

    /// Cancel a return, allowed only while it is still `requested`.
    ///
    /// # Errors
    ///
    /// [`ReturnError::NotCancellable`] once the vendor has acted,
    /// [`ReturnError::Unauthorized`] for a foreign return.
    pub fn cancel_return(
        &self,
        return_id: &ReturnId,
        customer_id: &CustomerId,
    ) -> Result<ReturnRequest, ReturnError> {
        let now = Timestamp::now();
        let actor = Actor::new(customer_id.to_string(), ActorRole::Customer);

        let (updated, from) = self.ledger.update_return::<_, ReturnError, _>(return_id, |ret| {
            if ret.customer_id != *customer_id {
                return Err(ReturnError::Unauthorized {
                    order_line_id: ret.order_line_id.to_string(),
                    customer_id: customer_id.to_string(),
                });
            }
            let from = ret.state;
            if from != ReturnState::Requested {
                return Err(ReturnError::NotCancellable { state: from });
            }
            ret.state = ReturnState::Cancelled;
            ret.resolved_at = Some(now.clone());
            let entry = TrackingEntry::new(
                TrackingSubject::Return(ret.id.clone()),
                ReturnState::Cancelled.as_str(),
                "cancelled by customer",
                &actor,
            )
            .with_event_at(now.clone());
            Ok(((ret.clone(), from), entry))
        })?;

        self.sink.emit(&DomainEvent::ReturnStateChanged {
            return_id: updated.id.clone(),
            from,
            to: ReturnState::Cancelled,
        });
        Ok(updated)
    }

    /// Advance a return to `target` on behalf of `actor`.
    ///
    /// A single atomic read-validate-write-append: the current state is
    /// validated against the transition table and the actor's role against
    /// the permission table; illegal transitions are never partially
    /// applied.
    ///
    /// # Errors
    ///
    /// [`ReturnError::InvalidTransition`], [`ReturnError::TerminalState`],
    /// or [`ReturnError::RoleNotPermitted`].
    pub fn advance_state(
        &self,
        return_id: &ReturnId,
        target: ReturnState,
        actor: &Actor,
        note: Option<String>,
    ) -> Result<ReturnRequest, ReturnError> {
        let now = Timestamp::now();

        let (updated, from) = self.ledger.update_return::<_, ReturnError, _>(return_id, |ret| {
            let from = ret.state;
            authorize_transition(actor.role, from, target)?;
            ret.state = target;
            if target.is_terminal() {
                ret.resolved_at = Some(now.clone());
            }
            let description = note
                .clone()
                .unwrap_or_else(|| format!("return moved to {target}"));
            let entry = TrackingEntry::new(
                TrackingSubject::Return(ret.id.clone()),
                target.as_str(),
                description,
                actor,
            )
            .with_event_at(now.clone());
            Ok(((ret.clone(), from), entry))
        })?;

        self.sink.emit(&DomainEvent::ReturnStateChanged {
            return_id: updated.id.clone(),
            from,
            to: target,
        });
        Ok(updated)
    }

    /// The ordered tracking timeline for a customer's return.
    ///
    /// # Errors
    ///
    /// [`ReturnError::NotFound`] for an unknown return,
    /// [`ReturnError::Unauthorized`] for a foreign one.
    pub fn timeline(
        &self,
        return_id: &ReturnId,
        customer_id: &CustomerId,
    ) -> Result<Vec<TrackingEntry>, ReturnError> {
        let ret = self
            .ledger
            .return_request(return_id)
            .ok_or_else(|| ReturnError::NotFound {
                entity: "return".to_string(),
                id: return_id.to_string(),
            })?;
        if ret.customer_id != *customer_id {
            return Err(ReturnError::Unauthorized {
                order_line_id: ret.order_line_id.to_string(),
                customer_id: customer_id.to_string(),
            });
        }
        Ok(self
            .ledger
            .timeline(&TrackingSubject::Return(return_id.clone())))
    }

    /// Per-customer return counts by lifecycle bucket. Read-only.
    pub fn statistics(&self, customer_id: &CustomerId) -> ReturnStatistics {
        let mut stats = ReturnStatistics::default();
        for ret in self.ledger.returns_for_customer(customer_id) {
            match ret.state {
                ReturnState::Requested => stats.pending += 1,
                ReturnState::Approved
                | ReturnState::PickupScheduled
                | ReturnState::InTransit
                | ReturnState::PickedUp
                | ReturnState::Received
                | ReturnState::Inspecting => stats.in_flight += 1,
                ReturnState::InspectionPassed | ReturnState::RefundInitiated => {
                    stats.processing += 1
                }
                ReturnState::RefundCompleted => stats.completed += 1,
                ReturnState::Rejected | ReturnState::Cancelled | ReturnState::InspectionFailed => {
                    stats.closed += 1
                }
            }
        }
        stats
    }
}
