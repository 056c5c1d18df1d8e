//! Raw identity/benefit record pairs.

use serde::{Deserialize, Serialize};

/// One (identity, benefit) pair to be validated and looked up.
///
/// Immutable once parsed from an upload; column order in the source file is
/// normalized away by the upload parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRecord {
    /// Document number (CPF), expected to be exactly 11 characters.
    pub identity: String,
    /// Benefit number (NB), expected to be at least 10 characters.
    pub benefit: String,
}

impl BatchRecord {
    pub fn new(identity: impl Into<String>, benefit: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            benefit: benefit.into(),
        }
    }
}
