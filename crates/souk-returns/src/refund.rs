//! # Refund Computation
//!
//! The refund owed to the customer for a return, computed once at creation
//! time and stored immutably on the return request — later changes to
//! product pricing never retroactively alter an already-created return.
//!
//! ## Determinism
//!
//! Pure integer arithmetic over the order line snapshot. Identical inputs
//! always produce identical output.

use souk_core::ValidationError;
use souk_ledger::OrderLine;

use crate::error::ReturnError;

/// Which price the refund is computed from.
///
/// The marketplace policy is the tax-inclusive unit price. The
/// quantity-proportional share of the discount-net line total exists as a
/// configuration option for deployments whose business rule refunds the
/// net amount instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefundPolicy {
    /// `unit_price * quantity` — the tax-inclusive unit price, in full.
    #[default]
    InclusiveUnitPrice,
    /// The returned quantity's proportional share of `line_total`
    /// (tax-inclusive, discount-net), rounded half-up to the minor unit.
    ProportionalNet,
}

/// Compute the refund for returning `return_qty` units of the line.
///
/// Callers validate `return_qty` against the line quantity beforehand (the
/// eligibility rules); this function only does arithmetic.
///
/// # Errors
///
/// Returns [`ReturnError::Validation`] on arithmetic overflow and
/// [`ReturnError::Integrity`] if the line carries a zero quantity.
pub fn compute_refund(
    line: &OrderLine,
    return_qty: u32,
    policy: RefundPolicy,
) -> Result<i64, ReturnError> {
    match policy {
        RefundPolicy::InclusiveUnitPrice => line
            .unit_price
            .checked_mul(i64::from(return_qty))
            .ok_or_else(|| ReturnError::Validation(ValidationError::AmountOverflow)),
        RefundPolicy::ProportionalNet => {
            if line.quantity == 0 {
                return Err(ReturnError::Integrity {
                    reason: format!("order line {} has zero quantity", line.id),
                });
            }
            let numerator = line
                .line_total
                .checked_mul(i64::from(return_qty))
                .ok_or_else(|| ReturnError::Validation(ValidationError::AmountOverflow))?;
            Ok(div_half_up(numerator, i64::from(line.quantity)))
        }
    }
}

/// Integer division rounding half-up (half away from zero).
fn div_half_up(numerator: i64, denominator: i64) -> i64 {
    let quotient = numerator / denominator;
    let remainder = numerator % denominator;
    if remainder.abs() * 2 >= denominator.abs() {
        quotient + numerator.signum() * denominator.signum()
    } else {
        quotient
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use souk_core::{OrderId, OrderLineId, VendorId};

    fn line(unit_price: i64, quantity: u32, tax: i64, discount: i64) -> OrderLine {
        let total = unit_price * i64::from(quantity) + tax - discount;
        OrderLine::new(
            OrderLineId::new(),
            OrderId::new(),
            VendorId::new(),
            "sku-1",
            unit_price,
            quantity,
            tax,
            discount,
            total,
        )
        .unwrap()
    }

    #[test]
    fn inclusive_unit_price_is_price_times_quantity() {
        let l = line(1_000, 2, 0, 0);
        assert_eq!(
            compute_refund(&l, 1, RefundPolicy::InclusiveUnitPrice).unwrap(),
            1_000
        );
        assert_eq!(
            compute_refund(&l, 2, RefundPolicy::InclusiveUnitPrice).unwrap(),
            2_000
        );
    }

    #[test]
    fn refund_never_exceeds_full_line_price() {
        let l = line(1_000, 3, 0, 0);
        for qty in 1..=3u32 {
            let refund = compute_refund(&l, qty, RefundPolicy::InclusiveUnitPrice).unwrap();
            assert!(refund <= l.unit_price * i64::from(l.quantity));
        }
    }

    #[test]
    fn refund_is_deterministic() {
        let l = line(999, 3, 120, 50);
        for policy in [RefundPolicy::InclusiveUnitPrice, RefundPolicy::ProportionalNet] {
            assert_eq!(
                compute_refund(&l, 2, policy).unwrap(),
                compute_refund(&l, 2, policy).unwrap()
            );
        }
    }

    #[test]
    fn proportional_net_rounds_half_up() {
        // line_total = 100*3 + 5 - 0 = 305; one of three units → 101.67 → 102.
        let l = line(100, 3, 5, 0);
        assert_eq!(
            compute_refund(&l, 1, RefundPolicy::ProportionalNet).unwrap(),
            102
        );
        // Two of three → 203.33 → 203.
        assert_eq!(
            compute_refund(&l, 2, RefundPolicy::ProportionalNet).unwrap(),
            203
        );
        // The whole line refunds the exact total.
        assert_eq!(
            compute_refund(&l, 3, RefundPolicy::ProportionalNet).unwrap(),
            305
        );
    }

    #[test]
    fn proportional_net_accounts_for_discount() {
        // line_total = 1000*2 + 0 - 500 = 1500; one unit → 750.
        let l = line(1_000, 2, 0, 500);
        assert_eq!(
            compute_refund(&l, 1, RefundPolicy::ProportionalNet).unwrap(),
            750
        );
        // The inclusive policy ignores the discount split.
        assert_eq!(
            compute_refund(&l, 1, RefundPolicy::InclusiveUnitPrice).unwrap(),
            1_000
        );
    }

    #[test]
    fn overflow_is_a_typed_error() {
        let l = line(i64::MAX / 2, 1, 0, 0);
        assert!(matches!(
            compute_refund(&l, 3, RefundPolicy::InclusiveUnitPrice),
            Err(ReturnError::Validation(ValidationError::AmountOverflow))
        ));
    }

    #[test]
    fn div_half_up_midpoint() {
        assert_eq!(div_half_up(5, 2), 3);
        assert_eq!(div_half_up(-5, 2), -3);
        assert_eq!(div_half_up(4, 2), 2);
        assert_eq!(div_half_up(1, 3), 0);
        assert_eq!(div_half_up(2, 3), 1);
    }
}
