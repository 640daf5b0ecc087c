//! # Money Arithmetic
//!
//! Minor-unit integer amounts and basis-point rates.
//!
//! ## Design
//!
//! All monetary amounts in the back office are `i64` values in the smallest
//! currency unit. Percentages (commission rates, statutory withholding
//! rates) are parsed once at the configuration boundary into [`Rate`]
//! values in basis points and applied with checked integer arithmetic.
//!
//! ## Rounding
//!
//! [`Rate::apply`] rounds half-up at minor-unit precision (half away from
//! zero for negative amounts). The same primitive is used for commission,
//! withholding, and proportional refunds so that aggregate arithmetic
//! reconciles exactly across records.
//!
//! ## Determinism
//!
//! Given identical inputs, every function in this module produces identical
//! outputs. There is no floating point anywhere in the computation path.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Basis points in one whole (100%).
const BPS_SCALE: i64 = 10_000;

/// Parse a string amount into minor units (two decimal places).
///
/// Handles:
/// - `"10000"` → `1_000_000` (whole units, converted to minor units)
/// - `"10000.00"` → `1_000_000`
/// - `"1234.56"` → `123_456`
/// - `"1234.5"` → `123_450`
///
/// # Errors
///
/// Returns [`ValidationError::InvalidAmount`] for unparseable strings and
/// [`ValidationError::AmountOverflow`] for values outside the `i64` range.
/// Invalid strings are rejected rather than silently defaulting to zero,
/// which could mask data corruption in settlement inputs.
pub fn parse_amount(s: &str) -> Result<i64, ValidationError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::InvalidAmount(s.to_string()));
    }

    if let Some(dot_pos) = trimmed.find('.') {
        let integer_part = trimmed[..dot_pos]
            .parse::<i64>()
            .map_err(|_| ValidationError::InvalidAmount(s.to_string()))?;
        let frac_str = &trimmed[dot_pos + 1..];

        // Exactly one or two fractional digits; anything else is malformed.
        let frac_minor = match frac_str.len() {
            1 => {
                frac_str
                    .parse::<i64>()
                    .map_err(|_| ValidationError::InvalidAmount(s.to_string()))?
                    * 10
            }
            2 => frac_str
                .parse::<i64>()
                .map_err(|_| ValidationError::InvalidAmount(s.to_string()))?,
            _ => return Err(ValidationError::InvalidAmount(s.to_string())),
        };
        if frac_minor < 0 {
            return Err(ValidationError::InvalidAmount(s.to_string()));
        }

        let sign: i64 = if trimmed.starts_with('-') { -1 } else { 1 };
        integer_part
            .abs()
            .checked_mul(100)
            .and_then(|v| v.checked_add(frac_minor))
            .map(|v| sign * v)
            .ok_or(ValidationError::AmountOverflow)
    } else {
        trimmed
            .parse::<i64>()
            .map_err(|_| ValidationError::InvalidAmount(s.to_string()))?
            .checked_mul(100)
            .ok_or(ValidationError::AmountOverflow)
    }
}

/// Format minor units back into a string with two decimal places.
///
/// `1_000_000` → `"10000.00"`, `450` → `"4.50"`, `-75` → `"-0.75"`.
pub fn format_amount(minor: i64) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let abs = minor.abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Sum an iterator of minor-unit amounts with overflow detection.
///
/// # Errors
///
/// Returns [`ValidationError::AmountOverflow`] if the running total leaves
/// the `i64` range. Settlement totals must never silently wrap.
pub fn checked_sum<I: IntoIterator<Item = i64>>(amounts: I) -> Result<i64, ValidationError> {
    amounts
        .into_iter()
        .try_fold(0i64, |acc, v| acc.checked_add(v))
        .ok_or(ValidationError::AmountOverflow)
}

/// A percentage expressed in basis points (1% = 100 bps).
///
/// Constructed from percent strings at the configuration boundary
/// (`"4.5"` → 450 bps) or directly from basis points. Rates are
/// non-negative; the zero rate is valid and applies to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rate(i64);

impl Rate {
    /// The zero rate.
    pub const ZERO: Rate = Rate(0);

    /// Create a rate from basis points.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidRate`] for negative basis points.
    pub fn from_bps(bps: i64) -> Result<Self, ValidationError> {
        if bps < 0 {
            return Err(ValidationError::InvalidRate(bps.to_string()));
        }
        Ok(Self(bps))
    }

    /// Parse a percent string into a rate.
    ///
    /// `"4.5"` → 450 bps, `"18.0"` → 1800 bps, `"15"` → 1500 bps.
    /// At most two fractional digits are meaningful; more is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidRate`] for malformed or negative
    /// percentages.
    pub fn from_percent_str(rate_str: &str) -> Result<Self, ValidationError> {
        let trimmed = rate_str.trim();
        let invalid = || ValidationError::InvalidRate(rate_str.to_string());

        let bps = if let Some(dot_pos) = trimmed.find('.') {
            let integer_part = trimmed[..dot_pos].parse::<i64>().map_err(|_| invalid())?;
            let frac_str = &trimmed[dot_pos + 1..];
            let frac = match frac_str.len() {
                1 => frac_str.parse::<i64>().map_err(|_| invalid())? * 10,
                2 => frac_str.parse::<i64>().map_err(|_| invalid())?,
                _ => return Err(invalid()),
            };
            if frac < 0 {
                return Err(invalid());
            }
            integer_part
                .checked_mul(100)
                .and_then(|v| v.checked_add(frac))
                .ok_or_else(invalid)?
        } else {
            trimmed
                .parse::<i64>()
                .map_err(|_| invalid())?
                .checked_mul(100)
                .ok_or_else(invalid)?
        };

        Self::from_bps(bps).map_err(|_| invalid())
    }

    /// The rate in basis points.
    pub fn as_bps(&self) -> i64 {
        self.0
    }

    /// The rate as a percent string with two decimal places (`"4.50"`).
    pub fn percent_string(&self) -> String {
        format!("{}.{:02}", self.0 / 100, self.0 % 100)
    }

    /// Whether this is the zero rate.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Apply the rate to a minor-unit amount, rounding half-up.
    ///
    /// A remainder of exactly half a minor unit rounds away from zero.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::AmountOverflow`] if the intermediate
    /// product leaves the `i64` range.
    pub fn apply(&self, amount: i64) -> Result<i64, ValidationError> {
        let numerator = amount
            .checked_mul(self.0)
            .ok_or(ValidationError::AmountOverflow)?;
        let quotient = numerator / BPS_SCALE;
        let remainder = numerator % BPS_SCALE;
        let adjust = if remainder.abs() * 2 >= BPS_SCALE {
            numerator.signum()
        } else {
            0
        };
        Ok(quotient + adjust)
    }
}

impl std::fmt::Display for Rate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.percent_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // -- parse_amount --

    #[test]
    fn parse_amount_whole_number() {
        assert_eq!(parse_amount("10000").unwrap(), 1_000_000);
        assert_eq!(parse_amount("0").unwrap(), 0);
    }

    #[test]
    fn parse_amount_decimal() {
        assert_eq!(parse_amount("1234.56").unwrap(), 123_456);
        assert_eq!(parse_amount("1234.5").unwrap(), 123_450);
        assert_eq!(parse_amount("0.75").unwrap(), 75);
    }

    #[test]
    fn parse_amount_negative() {
        assert_eq!(parse_amount("-100").unwrap(), -10_000);
        assert_eq!(parse_amount("-0.75").unwrap(), -75);
    }

    #[test]
    fn parse_amount_rejects_invalid() {
        assert!(parse_amount("").is_err());
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("1.234").is_err()); // three fractional digits
        assert!(parse_amount("1.").is_err());
        assert!(parse_amount("1.-5").is_err());
    }

    #[test]
    fn parse_amount_overflow_rejected() {
        assert!(matches!(
            parse_amount("92233720368547758079"),
            Err(ValidationError::InvalidAmount(_)) | Err(ValidationError::AmountOverflow)
        ));
    }

    #[test]
    fn format_amount_examples() {
        assert_eq!(format_amount(1_000_000), "10000.00");
        assert_eq!(format_amount(450), "4.50");
        assert_eq!(format_amount(0), "0.00");
        assert_eq!(format_amount(-75), "-0.75");
    }

    // -- checked_sum --

    #[test]
    fn checked_sum_totals() {
        assert_eq!(checked_sum([100, 200, 300]).unwrap(), 600);
        assert_eq!(checked_sum(std::iter::empty()).unwrap(), 0);
    }

    #[test]
    fn checked_sum_overflow() {
        assert!(matches!(
            checked_sum([i64::MAX, 1]),
            Err(ValidationError::AmountOverflow)
        ));
    }

    // -- Rate --

    #[test]
    fn rate_from_percent_str() {
        assert_eq!(Rate::from_percent_str("4.5").unwrap().as_bps(), 450);
        assert_eq!(Rate::from_percent_str("18.0").unwrap().as_bps(), 1800);
        assert_eq!(Rate::from_percent_str("15").unwrap().as_bps(), 1500);
        assert_eq!(Rate::from_percent_str("0.05").unwrap().as_bps(), 5);
        assert_eq!(Rate::from_percent_str("1").unwrap().as_bps(), 100);
    }

    #[test]
    fn rate_rejects_invalid() {
        assert!(Rate::from_percent_str("").is_err());
        assert!(Rate::from_percent_str("-4.5").is_err());
        assert!(Rate::from_percent_str("4.555").is_err());
        assert!(Rate::from_percent_str("abc").is_err());
        assert!(Rate::from_bps(-1).is_err());
    }

    #[test]
    fn rate_apply_exact() {
        let ten_percent = Rate::from_percent_str("10").unwrap();
        assert_eq!(ten_percent.apply(100_000).unwrap(), 10_000);

        let one_percent = Rate::from_percent_str("1").unwrap();
        assert_eq!(one_percent.apply(85_000).unwrap(), 850);
    }

    #[test]
    fn rate_apply_rounds_half_up() {
        // 4.5% of 10 minor units = 0.45 → rounds to 0.
        let rate = Rate::from_percent_str("4.5").unwrap();
        assert_eq!(rate.apply(10).unwrap(), 0);
        // 5% of 10 = 0.5 → rounds up to 1.
        let five = Rate::from_percent_str("5").unwrap();
        assert_eq!(five.apply(10).unwrap(), 1);
        // 5% of -10 = -0.5 → rounds away from zero to -1.
        assert_eq!(five.apply(-10).unwrap(), -1);
    }

    #[test]
    fn rate_apply_overflow() {
        let rate = Rate::from_percent_str("50").unwrap();
        assert!(matches!(
            rate.apply(i64::MAX),
            Err(ValidationError::AmountOverflow)
        ));
    }

    #[test]
    fn rate_display() {
        assert_eq!(Rate::from_percent_str("4.5").unwrap().to_string(), "4.50%");
        assert_eq!(Rate::ZERO.to_string(), "0.00%");
    }

    #[test]
    fn rate_zero_applies_to_nothing() {
        assert!(Rate::ZERO.is_zero());
        assert_eq!(Rate::ZERO.apply(1_000_000).unwrap(), 0);
    }

    proptest! {
        /// A rate of at most 100% never produces more than the input.
        #[test]
        fn sub_unit_rate_is_bounded(amount in 0i64..=1_000_000_000_000, bps in 0i64..=10_000) {
            let rate = Rate::from_bps(bps).unwrap();
            let applied = rate.apply(amount).unwrap();
            prop_assert!(applied <= amount);
            prop_assert!(applied >= 0);
        }

        /// Applying a rate twice to the same input yields identical output.
        #[test]
        fn rate_apply_is_deterministic(amount in -1_000_000_000i64..=1_000_000_000, bps in 0i64..=50_000) {
            let rate = Rate::from_bps(bps).unwrap();
            prop_assert_eq!(rate.apply(amount).unwrap(), rate.apply(amount).unwrap());
        }

        /// format/parse round-trips for non-negative minor-unit amounts.
        #[test]
        fn format_parse_roundtrip(minor in -1_000_000_000_000i64..=1_000_000_000_000) {
            let s = format_amount(minor);
            prop_assert_eq!(parse_amount(&s).unwrap(), minor);
        }
    }
}
