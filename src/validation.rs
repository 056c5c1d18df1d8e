//! Structural validation for raw records.
//!
//! Pure checks only: no network or store access. A record that fails here
//! is classified `Invalid` without ever reaching the lookup client.

use crate::error::ValidationError;
use crate::models::BatchRecord;

/// Validate a raw record's structural fields.
///
/// A record is invalid iff the identity is empty or not exactly 11
/// characters, or the benefit number is empty or shorter than 10.
pub fn validate_record(record: &BatchRecord) -> Result<(), ValidationError> {
    if record.identity.is_empty() {
        return Err(ValidationError::EmptyIdentity);
    }
    if record.identity.len() != 11 {
        return Err(ValidationError::IdentityLength(record.identity.len()));
    }
    if record.benefit.is_empty() {
        return Err(ValidationError::EmptyBenefit);
    }
    if record.benefit.len() < 10 {
        return Err(ValidationError::BenefitLength(record.benefit.len()));
    }
    Ok(())
}
