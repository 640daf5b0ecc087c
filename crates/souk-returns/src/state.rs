//! # Return State Machine
//!
//! The authoritative transition table for return requests, and the fixed
//! role→transition permission table. Any pair not in the table is rejected;
//! terminal states accept nothing.
//!
//! Authorization is external: callers supply an authenticated actor, and
//! [`authorize_transition`] validates the actor's *role* against the
//! permission table. Ownership checks (this customer, this vendor) are the
//! return manager's concern.

use souk_core::ActorRole;
use souk_ledger::ReturnState;

use crate::error::ReturnError;

/// The states a return may move to from `from`. Empty for terminal states.
pub fn successors(from: ReturnState) -> &'static [ReturnState] {
    use ReturnState::*;
    match from {
        Requested => &[Approved, Rejected, Cancelled],
        Approved => &[PickupScheduled, Rejected],
        PickupScheduled => &[InTransit],
        InTransit => &[PickedUp],
        PickedUp => &[Received],
        Received => &[Inspecting],
        Inspecting => &[InspectionPassed, InspectionFailed],
        InspectionPassed => &[RefundInitiated],
        RefundInitiated => &[RefundCompleted],
        RefundCompleted | InspectionFailed | Rejected | Cancelled => &[],
    }
}

/// The roles permitted to drive a return *into* the given state.
///
/// Customers may only request and cancel; vendors and admins approve,
/// reject, inspect, and run the refund; the logistics actor owns physical
/// movement updates.
pub fn permitted_roles(target: ReturnState) -> &'static [ActorRole] {
    use ReturnState::*;
    match target {
        Requested | Cancelled => &[ActorRole::Customer],
        Approved | Rejected => &[ActorRole::Vendor, ActorRole::Admin],
        PickupScheduled | InTransit | PickedUp | Received => &[ActorRole::Logistics],
        Inspecting | InspectionPassed | InspectionFailed => {
            &[ActorRole::Vendor, ActorRole::Admin]
        }
        RefundInitiated | RefundCompleted => &[ActorRole::Vendor, ActorRole::Admin],
    }
}

/// Validate a transition: terminal check, transition table, then the role
/// permission table, in that order.
///
/// # Errors
///
/// - [`ReturnError::TerminalState`] when `from` accepts no transitions.
/// - [`ReturnError::InvalidTransition`] when `from → to` is not in the table.
/// - [`ReturnError::RoleNotPermitted`] when the role may not drive `to`.
pub fn authorize_transition(
    role: ActorRole,
    from: ReturnState,
    to: ReturnState,
) -> Result<(), ReturnError> {
    if from.is_terminal() {
        return Err(ReturnError::TerminalState { state: from });
    }
    if !successors(from).contains(&to) {
        return Err(ReturnError::InvalidTransition { from, to });
    }
    if !permitted_roles(to).contains(&role) {
        return Err(ReturnError::RoleNotPermitted { role, target: to });
    }
    Ok(())
}
