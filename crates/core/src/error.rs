//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (bad input, unknown
/// references, invariants, conflicts). Storage failures belong to the infra layer.
///
/// There is deliberately no variant for degenerate arithmetic: every division in the
/// engine resolves through [`crate::money::ratio_or`] with a documented fallback.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A record failed validation (e.g. a reading with `final <= initial`, a purchase
    /// with zero quantity). Batch operations skip such records and report them.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A record points at a reference that does not exist (fuel grade, attendant).
    /// Fatal for that record only.
    #[error("unknown {kind}: {id}")]
    MissingReference { kind: &'static str, id: String },

    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A conflict occurred (stale version, purchase applied twice).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn missing(kind: &'static str, id: impl ToString) -> Self {
        Self::MissingReference {
            kind,
            id: id.to_string(),
        }
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Whether batch processing should count this as a skipped record rather than a
    /// failed one.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}
