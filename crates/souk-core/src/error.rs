//! # Validation Errors
//!
//! Construction-time failures for the domain primitives in this crate.
//! Each variant carries the rejected input and the expected shape so that
//! operators can diagnose misconfiguration without guesswork.

use thiserror::Error;

/// Validation errors for domain primitive newtypes and money arithmetic.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Return number does not conform to the `RET-YYYYMMDD-NNNN` format.
    #[error("invalid return number: \"{0}\" (expected RET-YYYYMMDD-NNNN)")]
    InvalidReturnNumber(String),

    /// Certificate number does not conform to the `WHC-YYYY-NNNNNN` format.
    #[error("invalid certificate number: \"{0}\" (expected WHC-YYYY-NNNNNN)")]
    InvalidCertificateNumber(String),

    /// Financial year string is not two consecutive years.
    #[error("invalid financial year: \"{0}\" (expected YYYY-YYYY, consecutive)")]
    InvalidFinancialYear(String),

    /// Rate string is not a non-negative percentage.
    #[error("invalid rate: \"{0}\" (expected a non-negative percentage such as \"4.5\")")]
    InvalidRate(String),

    /// Amount string could not be parsed into minor units.
    #[error("invalid monetary amount: \"{0}\"")]
    InvalidAmount(String),

    /// Arithmetic overflow while computing a monetary amount.
    #[error("arithmetic overflow computing a monetary amount — value exceeds i64 range")]
    AmountOverflow,

    /// A settlement period whose end precedes its start.
    #[error("invalid settlement period: start {start} is after end {end}")]
    InvalidPeriod {
        /// The period start.
        start: String,
        /// The period end.
        end: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_return_number_display() {
        let err = ValidationError::InvalidReturnNumber("RX-1".to_string());
        let msg = format!("{err}");
        assert!(msg.contains("RX-1"));
        assert!(msg.contains("RET-YYYYMMDD-NNNN"));
    }

    #[test]
    fn invalid_rate_display() {
        let err = ValidationError::InvalidRate("-3".to_string());
        assert!(format!("{err}").contains("-3"));
    }

    #[test]
    fn invalid_period_display() {
        let err = ValidationError::InvalidPeriod {
            start: "2026-02-01T00:00:00Z".to_string(),
            end: "2026-01-01T00:00:00Z".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("2026-02-01"));
        assert!(msg.contains("2026-01-01"));
    }

    #[test]
    fn all_variants_are_debug() {
        let err = ValidationError::AmountOverflow;
        assert!(!format!("{err:?}").is_empty());
    }
}
