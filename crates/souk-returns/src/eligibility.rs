//! # Return Eligibility
//!
//! The pure decision function behind "can this line be returned right
//! now?". Rules run in a fixed order and the first failure wins. No side
//! effects; the return manager queries it with ledger snapshots, and the
//! decisive duplicate check is re-enforced by the ledger's uniqueness
//! constraint at insert time.

use chrono::Duration;

use souk_core::{Timestamp, RETURN_WINDOW_DAYS};
use souk_ledger::{Order, OrderLine, OrderStatus, ReturnRequest};

use crate::error::ReturnError;

/// Decide whether `requested_qty` of the line may be returned at `now`.
///
/// Rules, in order, first failure wins:
///
/// 1. The order must be delivered — else [`ReturnError::NotDelivered`].
/// 2. `now` must be within [`RETURN_WINDOW_DAYS`] of delivery, boundary
///    inclusive: exactly the window's last instant is still eligible —
///    else [`ReturnError::WindowExpired`].
/// 3. No blocking return may exist for the line — else
///    [`ReturnError::DuplicateReturn`].
/// 4. `1 <= requested_qty <= line.quantity` — else
///    [`ReturnError::InvalidQuantity`].
///
/// `now` is read once per operation invocation by the caller, so the
/// window boundary cannot shift mid-operation.
pub fn check_eligibility(
    order: &Order,
    line: &OrderLine,
    active_return: Option<&ReturnRequest>,
    requested_qty: u32,
    now: &Timestamp,
) -> Result<(), ReturnError> {
    let delivered_at = match (&order.status, &order.delivered_at) {
        (OrderStatus::Delivered, Some(at)) => at,
        _ => {
            return Err(ReturnError::NotDelivered {
                order_id: order.id.to_string(),
            })
        }
    };

    let elapsed = *now.as_datetime() - *delivered_at.as_datetime();
    if elapsed > Duration::days(RETURN_WINDOW_DAYS) {
        return Err(ReturnError::WindowExpired {
            delivered_at: delivered_at.to_canonical_string(),
            window_days: RETURN_WINDOW_DAYS,
        });
    }

    if let Some(existing) = active_return {
        return Err(ReturnError::DuplicateReturn {
            order_line_id: line.id.to_string(),
            existing: existing.id.to_string(),
        });
    }

    if requested_qty < 1 || requested_qty > line.quantity {
        return Err(ReturnError::InvalidQuantity {
            requested: requested_qty,
            available: line.quantity,
        });
    }

    Ok(())
}
