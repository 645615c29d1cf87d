//! Domain types for bundle validation.

use shared_types::Transaction;

/// The verdict on one bundle, anchored at its tail transaction.
#[derive(Clone, Debug, PartialEq)]
pub enum BundleOutcome {
    /// The full chain is structurally sound, balanced and correctly signed.
    /// Carries the transactions in index order, tail first.
    Valid(Vec<Transaction>),
    /// Permanently rejected; the verdict is memoized on the tail.
    Invalid,
    /// A referenced transaction is not locally known yet. Transient; nothing
    /// is memoized.
    Incomplete,
}

impl BundleOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, BundleOutcome::Valid(_))
    }
}
