//! Structured error handling for the batch cleansing core.
//!
//! Setup-time failures (auth, capacity, malformed uploads) surface
//! synchronously to the caller. Per-record failures (validation, lookup,
//! save) are absorbed into the batch's `failed` counter by the engine and
//! never abort a running loop.

use uuid::Uuid;

/// Top-level error type for all batch operations.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// A record failed structural validation. Absorbed per-record.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Sign-in against the external service failed. The batch never starts
    /// and any previously held token is left untouched.
    #[error("authentication error: {0}")]
    Auth(String),

    /// The balance-lookup call failed (transport error, non-200, or a 200
    /// without a usable payload). Absorbed per-record.
    #[error("lookup error: {0}")]
    Lookup(String),

    /// Result sink failure. Logged and absorbed for save; surfaced for
    /// delete and select since those are direct user actions.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// The registry is at its batch limit.
    #[error("registry at capacity: {limit} batches already registered")]
    Capacity { limit: usize },

    /// start/resume issued against a batch that cannot accept it. Surfaced
    /// as a no-op notification, not a hard failure.
    #[error("invalid state for batch {batch_id}: {reason}")]
    State { batch_id: Uuid, reason: String },

    /// Uploaded text could not be parsed into records.
    #[error("upload error: {0}")]
    Upload(String),

    /// No batch registered under the given id.
    #[error("batch not found: {0}")]
    NotFound(Uuid),

    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Structural validation failures for a raw record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("identity is empty")]
    EmptyIdentity,

    #[error("identity must be exactly 11 characters, got {0}")]
    IdentityLength(usize),

    #[error("benefit number is empty")]
    EmptyBenefit,

    #[error("benefit number must be at least 10 characters, got {0}")]
    BenefitLength(usize),
}

impl From<sqlx::Error> for BatchError {
    fn from(err: sqlx::Error) -> Self {
        BatchError::Persistence(err.to_string())
    }
}

impl From<reqwest::Error> for BatchError {
    fn from(err: reqwest::Error) -> Self {
        BatchError::Lookup(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BatchError>;
