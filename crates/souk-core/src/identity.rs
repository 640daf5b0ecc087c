//! # Identity Newtypes
//!
//! Domain-primitive newtypes for identifiers throughout the back office.
//! Each identifier is a distinct type — you cannot pass an [`OrderId`]
//! where a [`ReturnId`] is expected.
//!
//! ## Validation
//!
//! String-based identifiers ([`ReturnNumber`], [`CertificateNumber`])
//! validate format at construction time. UUID-based identifiers are always
//! valid by construction.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

// ---------------------------------------------------------------------------
// UUID-based identifiers (always valid by construction)
// ---------------------------------------------------------------------------

/// A unique identifier for a customer order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Create a new random order identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an order identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unique identifier for a single vendor's line within an order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderLineId(Uuid);

impl OrderLineId {
    /// Create a new random order line identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an order line identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OrderLineId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OrderLineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unique identifier for a customer account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerId(Uuid);

impl CustomerId {
    /// Create a new random customer identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a customer identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CustomerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unique identifier for a vendor account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VendorId(Uuid);

impl VendorId {
    /// Create a new random vendor identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a vendor identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for VendorId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for VendorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unique identifier for a return request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReturnId(Uuid);

impl ReturnId {
    /// Create a new random return identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a return identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ReturnId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ReturnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unique identifier for a vendor payout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PayoutId(Uuid);

impl PayoutId {
    /// Create a new random payout identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a payout identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PayoutId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PayoutId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// String-based identifiers (validated at construction)
// ---------------------------------------------------------------------------

/// Human-readable return number shown to customers and support staff.
///
/// Canonical format: `RET-YYYYMMDD-NNNN` where `YYYYMMDD` is the creation
/// date and `NNNN` is a zero-padded serial of at least 4 digits. Serial
/// allocation is owned by the ledger; this type only enforces shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReturnNumber(String);

impl ReturnNumber {
    /// Create a return number from a string, validating format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidReturnNumber`] if the string does
    /// not match `RET-YYYYMMDD-NNNN`.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        Self::validate(&s)?;
        Ok(Self(s))
    }

    /// Compose a return number from a date stamp and a serial.
    pub fn compose(date_stamp: &str, serial: u64) -> Result<Self, ValidationError> {
        Self::new(format!("RET-{date_stamp}-{serial:04}"))
    }

    fn validate(s: &str) -> Result<(), ValidationError> {
        let rest = match s.strip_prefix("RET-") {
            Some(rest) => rest,
            None => return Err(ValidationError::InvalidReturnNumber(s.to_string())),
        };
        let (date, serial) = match rest.split_once('-') {
            Some(parts) => parts,
            None => return Err(ValidationError::InvalidReturnNumber(s.to_string())),
        };
        if date.len() != 8 || !date.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::InvalidReturnNumber(s.to_string()));
        }
        if serial.len() < 4 || !serial.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::InvalidReturnNumber(s.to_string()));
        }
        Ok(())
    }

    /// Access the return number string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ReturnNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Withholding certificate number.
///
/// Canonical format: `WHC-YYYY-NNNNNN` where `YYYY` is the starting year of
/// the financial year the certificate covers and `NNNNNN` is a zero-padded
/// issue serial.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CertificateNumber(String);

impl CertificateNumber {
    /// Create a certificate number from a string, validating format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidCertificateNumber`] if the string
    /// does not match `WHC-YYYY-NNNNNN`.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        Self::validate(&s)?;
        Ok(Self(s))
    }

    /// Compose a certificate number from a fiscal start year and a serial.
    pub fn compose(fiscal_start_year: i32, serial: u32) -> Result<Self, ValidationError> {
        Self::new(format!("WHC-{fiscal_start_year}-{serial:06}"))
    }

    fn validate(s: &str) -> Result<(), ValidationError> {
        let rest = match s.strip_prefix("WHC-") {
            Some(rest) => rest,
            None => return Err(ValidationError::InvalidCertificateNumber(s.to_string())),
        };
        let (year, serial) = match rest.split_once('-') {
            Some(parts) => parts,
            None => return Err(ValidationError::InvalidCertificateNumber(s.to_string())),
        };
        if year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::InvalidCertificateNumber(s.to_string()));
        }
        if serial.len() != 6 || !serial.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::InvalidCertificateNumber(s.to_string()));
        }
        Ok(())
    }

    /// Access the certificate number string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CertificateNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
