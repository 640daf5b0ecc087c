//! # Temporal Types
//!
//! UTC-only timestamp type plus the two period types settlement runs over:
//! the [`SettlementPeriod`] a payout aggregates and the [`FinancialYear`]
//! withholding certificates are issued for.
//!
//! ## Design Decision
//!
//! The back office serves customers and vendors across time zones. To
//! prevent ambiguity in return windows, tracking entries, and settlement
//! boundaries, all timestamps are UTC. Local time conversion is a
//! presentation concern handled outside this core.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The customer return window, in days after delivery. The boundary is
/// inclusive: a return exactly this many days after delivery is still
/// eligible.
pub const RETURN_WINDOW_DAYS: i64 = 30;

/// A UTC timestamp.
///
/// Serializes through `chrono` and displays as ISO 8601 with a `Z` suffix,
/// truncated to seconds (`2026-01-15T12:00:00Z`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a timestamp representing the current UTC time.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Create a timestamp from a `chrono::DateTime<Utc>`.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Access the underlying `chrono::DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// The timestamp as an ISO 8601 string with Z suffix, truncated to
    /// seconds.
    pub fn to_canonical_string(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }

    /// The timestamp's date as a compact `YYYYMMDD` stamp, used when
    /// composing return numbers.
    pub fn date_stamp(&self) -> String {
        self.0.format("%Y%m%d").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

/// The date range over which a vendor's eligible sales are aggregated into
/// one payout. Both bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SettlementPeriod {
    /// Period start (inclusive).
    pub start: Timestamp,
    /// Period end (inclusive).
    pub end: Timestamp,
}

impl SettlementPeriod {
    /// Create a settlement period, validating that start does not follow end.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidPeriod`] if `start > end`.
    pub fn new(start: Timestamp, end: Timestamp) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvalidPeriod {
                start: start.to_canonical_string(),
                end: end.to_canonical_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Whether the period contains the given instant (inclusive bounds).
    pub fn contains(&self, ts: &Timestamp) -> bool {
        *ts >= self.start && *ts <= self.end
    }

    /// Whether two periods share at least one instant.
    pub fn overlaps(&self, other: &SettlementPeriod) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

impl std::fmt::Display for SettlementPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A July–June financial year, labelled by its two calendar years
/// (`"2025-2026"` runs 2025-07-01 through 2026-06-30).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FinancialYear {
    start_year: i32,
}

impl FinancialYear {
    /// The financial year starting July 1 of the given calendar year.
    pub fn starting(start_year: i32) -> Self {
        Self { start_year }
    }

    /// Parse a `"YYYY-YYYY"` label into a financial year.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidFinancialYear`] unless the label
    /// names two consecutive four-digit years.
    pub fn parse(label: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidFinancialYear(label.to_string());
        let (first, second) = label.split_once('-').ok_or_else(invalid)?;
        if first.len() != 4 || second.len() != 4 {
            return Err(invalid());
        }
        let start: i32 = first.parse().map_err(|_| invalid())?;
        let end: i32 = second.parse().map_err(|_| invalid())?;
        if end != start + 1 {
            return Err(invalid());
        }
        Ok(Self { start_year: start })
    }

    /// The financial year containing the given instant.
    pub fn of(ts: &Timestamp) -> Self {
        let dt = ts.as_datetime();
        let start_year = if dt.month() >= 7 {
            dt.year()
        } else {
            dt.year() - 1
        };
        Self { start_year }
    }

    /// The calendar year the financial year starts in.
    pub fn start_year(&self) -> i32 {
        self.start_year
    }

    /// First instant of the financial year (July 1, 00:00:00 UTC).
    pub fn start(&self) -> Timestamp {
        Timestamp::from_datetime(
            Utc.with_ymd_and_hms(self.start_year, 7, 1, 0, 0, 0)
                .single()
                .expect("July 1 is a valid UTC date"),
        )
    }

    /// Last instant of the financial year (June 30, 23:59:59 UTC).
    pub fn end(&self) -> Timestamp {
        Timestamp::from_datetime(
            Utc.with_ymd_and_hms(self.start_year + 1, 6, 30, 23, 59, 59)
                .single()
                .expect("June 30 is a valid UTC date"),
        )
    }

    /// Whether the financial year contains the given instant.
    pub fn contains(&self, ts: &Timestamp) -> bool {
        *ts >= self.start() && *ts <= self.end()
    }

    /// The `"YYYY-YYYY"` label.
    pub fn label(&self) -> String {
        format!("{}-{}", self.start_year, self.start_year + 1)
    }
}

impl std::fmt::Display for FinancialYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
