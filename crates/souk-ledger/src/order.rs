//! # Order Aggregates
//!
//! Orders and their per-vendor order lines. Orders are created at checkout
//! by an external subsystem and are immutable once placed, except for
//! status-advancing events. One order may span multiple vendors; each
//! [`OrderLine`] carries its own fulfillment status.

use serde::{Deserialize, Serialize};

use souk_core::{CustomerId, OrderId, OrderLineId, PayoutId, Timestamp, VendorId};

use crate::store::LedgerError;

// ── Order Status ───────────────────────────────────────────────────────

/// The overall status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order placed at checkout.
    Placed,
    /// Payment confirmed by the gateway.
    Paid,
    /// Handed to logistics.
    Shipped,
    /// Delivered to the customer.
    Delivered,
    /// Cancelled before fulfillment. Terminal state.
    Cancelled,
}

impl OrderStatus {
    /// The canonical string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Placed => "placed",
            Self::Paid => "paid",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Order ──────────────────────────────────────────────────────────────

/// A customer order. All amounts are minor units.
///
/// Immutable once placed; only status-advancing events mutate it, and it is
/// never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier.
    pub id: OrderId,
    /// The customer who placed the order.
    pub customer_id: CustomerId,
    /// Sum of line totals before order-level charges.
    pub subtotal: i64,
    /// Total tax across the order.
    pub tax_total: i64,
    /// Shipping fee.
    pub shipping_fee: i64,
    /// Order-level discount.
    pub discount_total: i64,
    /// Grand total charged to the customer.
    pub grand_total: i64,
    /// Current order status.
    pub status: OrderStatus,
    /// When the order was placed.
    pub placed_at: Timestamp,
    /// When the order was delivered, once it has been.
    pub delivered_at: Option<Timestamp>,
}

impl Order {
    /// Create a newly placed order, checking the total reconciles.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Integrity`] if
    /// `grand_total != subtotal + tax_total + shipping_fee - discount_total`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: OrderId,
        customer_id: CustomerId,
        subtotal: i64,
        tax_total: i64,
        shipping_fee: i64,
        discount_total: i64,
        grand_total: i64,
        placed_at: Timestamp,
    ) -> Result<Self, LedgerError> {
        let expected = subtotal
            .checked_add(tax_total)
            .and_then(|v| v.checked_add(shipping_fee))
            .and_then(|v| v.checked_sub(discount_total))
            .ok_or_else(|| LedgerError::Integrity {
                reason: format!("order {id} total overflows i64"),
            })?;
        if expected != grand_total {
            return Err(LedgerError::Integrity {
                reason: format!(
                    "order {id} grand_total {grand_total} does not reconcile (expected {expected})"
                ),
            });
        }
        Ok(Self {
            id,
            customer_id,
            subtotal,
            tax_total,
            shipping_fee,
            discount_total,
            grand_total,
            status: OrderStatus::Placed,
            placed_at,
            delivered_at: None,
        })
    }

    /// Advance the order to a pre-delivery status.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidStatus`] if the order is cancelled or
    /// already delivered.
    pub fn advance_status(&mut self, to: OrderStatus) -> Result<(), LedgerError> {
        if matches!(self.status, OrderStatus::Cancelled | OrderStatus::Delivered) {
            return Err(LedgerError::InvalidStatus {
                entity: "order".to_string(),
                id: self.id.to_string(),
                status: self.status.as_str().to_string(),
                operation: format!("advance to {to}"),
            });
        }
        self.status = to;
        Ok(())
    }

    /// Mark the order delivered at the given instant.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidStatus`] if the order is cancelled or
    /// already delivered.
    pub fn mark_delivered(&mut self, at: Timestamp) -> Result<(), LedgerError> {
        self.advance_status(OrderStatus::Delivered)?;
        self.delivered_at = Some(at);
        Ok(())
    }
}

// ── Line Status ────────────────────────────────────────────────────────

/// The fulfillment status of a single order line, independent per vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStatus {
    /// Awaiting vendor fulfillment.
    Pending,
    /// Shipped by the vendor.
    Shipped,
    /// Delivered to the customer.
    Delivered,
    /// Eligible for settlement (delivered and past the return window, or
    /// explicitly marked).
    Settleable,
    /// Included in a payout; `settled_under` names it.
    Settled,
}

impl LineStatus {
    /// The canonical string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Settleable => "settleable",
            Self::Settled => "settled",
        }
    }
}

impl std::fmt::Display for LineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Order Line ─────────────────────────────────────────────────────────

/// One vendor's product/quantity/price entry within a multi-vendor order.
///
/// Immutable after the order is placed, except for the status fields the
/// ledger advances. `line_total` is tax-inclusive and discount-net:
/// `unit_price * quantity + tax_amount - discount_amount`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    /// Unique line identifier.
    pub id: OrderLineId,
    /// The order this line belongs to.
    pub order_id: OrderId,
    /// The vendor fulfilling this line.
    pub vendor_id: VendorId,
    /// Opaque product reference.
    pub product_ref: String,
    /// Tax-inclusive unit price in minor units.
    pub unit_price: i64,
    /// Quantity ordered.
    pub quantity: u32,
    /// Line-level tax amount.
    pub tax_amount: i64,
    /// Line-level discount amount.
    pub discount_amount: i64,
    /// Line total: `unit_price * quantity + tax_amount - discount_amount`.
    pub line_total: i64,
    /// Current fulfillment status.
    pub status: LineStatus,
    /// The instant the line became settleable, once it has.
    pub settleable_at: Option<Timestamp>,
    /// The payout this line was settled under, once claimed.
    pub settled_under: Option<PayoutId>,
}

impl OrderLine {
    /// Create an order line, checking the line total reconciles.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Integrity`] if the stated `line_total` does
    /// not equal `unit_price * quantity + tax_amount - discount_amount`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: OrderLineId,
        order_id: OrderId,
        vendor_id: VendorId,
        product_ref: impl Into<String>,
        unit_price: i64,
        quantity: u32,
        tax_amount: i64,
        discount_amount: i64,
        line_total: i64,
    ) -> Result<Self, LedgerError> {
        let expected = unit_price
            .checked_mul(i64::from(quantity))
            .and_then(|v| v.checked_add(tax_amount))
            .and_then(|v| v.checked_sub(discount_amount))
            .ok_or_else(|| LedgerError::Integrity {
                reason: format!("order line {id} total overflows i64"),
            })?;
        if expected != line_total {
            return Err(LedgerError::Integrity {
                reason: format!(
                    "order line {id} line_total {line_total} does not reconcile (expected {expected})"
                ),
            });
        }
        Ok(Self {
            id,
            order_id,
            vendor_id,
            product_ref: product_ref.into(),
            unit_price,
            quantity,
            tax_amount,
            discount_amount,
            line_total,
            status: LineStatus::Pending,
            settleable_at: None,
            settled_under: None,
        })
    }
}
