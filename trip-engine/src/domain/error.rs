//! Domain error types.
//!
//! These errors represent validation failures in the domain layer.
//! They are distinct from provider/network errors.

/// Domain-level errors for validation and data consistency.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DomainError {
    /// Trip has no legs
    #[error("trip must have at least one leg")]
    EmptyTrip,

    /// Missing required time data for an operation
    #[error("missing required time data: {0}")]
    MissingTime(&'static str),
}
