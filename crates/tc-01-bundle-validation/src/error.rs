//! Error types for bundle validation.

use shared_types::StoreError;
use thiserror::Error;

/// Bundle validation errors. Invalid or incomplete bundles are not errors;
/// see [`crate::domain::BundleOutcome`].
#[derive(Debug, Error)]
pub enum BundleError {
    /// Storage backend failure
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for bundle validation operations
pub type BundleResult<T> = Result<T, BundleError>;
