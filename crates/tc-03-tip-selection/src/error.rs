//! Error types for tip selection.

use shared_types::StoreError;
use thiserror::Error;

/// Tip selection errors
#[derive(Debug, Error)]
pub enum TipSelError {
    /// No solid milestone exists to anchor the walk
    #[error("no solid milestone available to anchor tip selection")]
    NotSolid,

    /// Storage backend failure
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for tip selection operations
pub type TipSelResult<T> = Result<T, TipSelError>;
