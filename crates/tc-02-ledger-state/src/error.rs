//! Error types for the ledger state machine.

use shared_types::StoreError;
use tc_01_bundle_validation::BundleError;
use thiserror::Error;

/// Ledger subsystem errors. Invalid milestones and unsolid cones are
/// expected outcomes carried by typed results, not errors.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Storage backend failure
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Bundle validation could not complete
    #[error("bundle validation error: {0}")]
    Bundle(#[from] BundleError),

    /// The configured genesis state does not hold the full supply
    #[error("genesis state sums to {actual}, expected the full supply {expected}")]
    BadGenesis { expected: i64, actual: i64 },
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
