//! # Return Request Records
//!
//! The persisted return request and its lifecycle state. A return is
//! created by a customer against exactly one order line, owned jointly by
//! the customer (initiator) and the vendor (responder), mutated only
//! through the state machine in `souk-returns`, and never physically
//! deleted — it only terminates into a closed state.

use serde::{Deserialize, Serialize};

use souk_core::{
    CustomerId, OrderLineId, PayoutId, ReturnId, ReturnNumber, Timestamp, VendorId,
};

// ── Return State ───────────────────────────────────────────────────────

/// The lifecycle state of a return request.
///
/// ```text
/// requested ─▶ approved ─▶ pickup_scheduled ─▶ in_transit ─▶ picked_up
///     │            │                                             │
///     │            └──▶ rejected (terminal)                      ▼
///     ├──▶ cancelled (terminal)                              received
///     └──▶ rejected (terminal)                                   │
///                                                                ▼
///   refund_completed ◀─ refund_initiated ◀─ inspection_passed ◀─ inspecting
///       (terminal)                                                │
///                                            inspection_failed ◀──┘
///                                                (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnState {
    /// Customer filed the return.
    Requested,
    /// Vendor or admin approved it.
    Approved,
    /// Logistics scheduled the pickup.
    PickupScheduled,
    /// Parcel in transit back to the vendor.
    InTransit,
    /// Parcel collected from the customer.
    PickedUp,
    /// Parcel received at the vendor's facility.
    Received,
    /// Vendor inspecting the returned goods.
    Inspecting,
    /// Inspection passed; refund may begin.
    InspectionPassed,
    /// Inspection failed. Terminal state.
    InspectionFailed,
    /// Refund handed to the payment gateway.
    RefundInitiated,
    /// Refund confirmed complete. Terminal state.
    RefundCompleted,
    /// Rejected by the vendor or admin. Terminal state.
    Rejected,
    /// Cancelled by the customer before approval. Terminal state.
    Cancelled,
}

impl ReturnState {
    /// Whether this state is terminal (no further transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::RefundCompleted | Self::InspectionFailed | Self::Rejected | Self::Cancelled
        )
    }

    /// Whether a return in this state blocks a new return for the same
    /// order line. Only rejected and cancelled returns free the line.
    pub fn blocks_new_returns(&self) -> bool {
        !matches!(self, Self::Rejected | Self::Cancelled)
    }

    /// The canonical string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Approved => "approved",
            Self::PickupScheduled => "pickup_scheduled",
            Self::InTransit => "in_transit",
            Self::PickedUp => "picked_up",
            Self::Received => "received",
            Self::Inspecting => "inspecting",
            Self::InspectionPassed => "inspection_passed",
            Self::InspectionFailed => "inspection_failed",
            Self::RefundInitiated => "refund_initiated",
            Self::RefundCompleted => "refund_completed",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }

    /// All states, in lifecycle order.
    pub fn all() -> &'static [ReturnState] {
        &[
            Self::Requested,
            Self::Approved,
            Self::PickupScheduled,
            Self::InTransit,
            Self::PickedUp,
            Self::Received,
            Self::Inspecting,
            Self::InspectionPassed,
            Self::InspectionFailed,
            Self::RefundInitiated,
            Self::RefundCompleted,
            Self::Rejected,
            Self::Cancelled,
        ]
    }
}

impl std::fmt::Display for ReturnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Return Type and Reason ─────────────────────────────────────────────

/// What the customer wants out of the return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnType {
    /// Money back.
    Refund,
    /// Same product again.
    Replacement,
    /// A different product.
    Exchange,
}

impl ReturnType {
    /// The canonical string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Refund => "refund",
            Self::Replacement => "replacement",
            Self::Exchange => "exchange",
        }
    }
}

impl std::fmt::Display for ReturnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed reason codes a customer may file a return under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnReason {
    /// Arrived damaged.
    Damaged,
    /// Product defect.
    Defective,
    /// Wrong item shipped.
    WrongItem,
    /// Does not match the listing.
    NotAsDescribed,
    /// Customer changed their mind.
    NoLongerNeeded,
    /// Anything else; see the free-text reason.
    Other,
}

impl ReturnReason {
    /// The canonical string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Damaged => "damaged",
            Self::Defective => "defective",
            Self::WrongItem => "wrong_item",
            Self::NotAsDescribed => "not_as_described",
            Self::NoLongerNeeded => "no_longer_needed",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for ReturnReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Return Request ─────────────────────────────────────────────────────

/// A customer-initiated return against one order line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnRequest {
    /// Unique return identifier.
    pub id: ReturnId,
    /// Human-readable return number.
    pub return_number: ReturnNumber,
    /// The order line being returned.
    pub order_line_id: OrderLineId,
    /// The customer who filed the return.
    pub customer_id: CustomerId,
    /// The vendor responsible for the line.
    pub vendor_id: VendorId,
    /// What the customer wants.
    pub return_type: ReturnType,
    /// The reason code.
    pub reason: ReturnReason,
    /// Optional free-text elaboration.
    pub reason_text: Option<String>,
    /// Quantity being returned (at most the line quantity).
    pub quantity: u32,
    /// Refund amount in minor units, computed once at creation and never
    /// recomputed — later price changes must not alter it.
    pub refund_amount: i64,
    /// Current lifecycle state.
    pub state: ReturnState,
    /// Opaque evidence references (photo/video URIs in external storage).
    pub evidence_refs: Vec<String>,
    /// When the return was filed.
    pub created_at: Timestamp,
    /// When the return reached a terminal state, once it has.
    pub resolved_at: Option<Timestamp>,
    /// The payout this return's refund was deducted under, once deducted.
    pub deducted_in: Option<PayoutId>,
}

impl ReturnRequest {
    /// Create a return request in the `requested` state.
    ///
    /// Eligibility and refund computation are the caller's concern (the
    /// return manager); this constructor only assembles the record.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        return_number: ReturnNumber,
        order_line_id: OrderLineId,
        customer_id: CustomerId,
        vendor_id: VendorId,
        return_type: ReturnType,
        reason: ReturnReason,
        reason_text: Option<String>,
        quantity: u32,
        refund_amount: i64,
        evidence_refs: Vec<String>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id: ReturnId::new(),
            return_number,
            order_line_id,
            customer_id,
            vendor_id,
            return_type,
            reason,
            reason_text,
            quantity,
            refund_amount,
            state: ReturnState::Requested,
            evidence_refs,
            created_at,
            resolved_at: None,
            deducted_in: None,
        }
    }
}
