//! The persistence port consumed by every subsystem.
//!
//! The Tangle is held by an external key-value collaborator; this trait is
//! the complete surface the consensus core needs from it. Approver lookups
//! are served from a reverse index the store derives from trunk/branch
//! references at insertion time.

use crate::entities::{Hash, Milestone, StateDiff, Transaction, Validity};
use async_trait::async_trait;
use thiserror::Error;

/// Storage-layer failures. Expected outcomes (absent rows) are `Option`s,
/// not errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing engine failed; unrecoverable from this core's view.
    #[error("storage backend failure: {reason}")]
    Backend { reason: String },
}

/// Search direction for [`TangleStore::closest_milestone`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// The smallest milestone index strictly greater than the anchor.
    Forward,
    /// The largest milestone index less than or equal to the anchor.
    Backward,
}

/// Key-value persistence for transactions, milestones and state diffs.
#[async_trait]
pub trait TangleStore: Send + Sync {
    /// Loads a transaction together with its mutable confirmation state.
    async fn transaction(&self, hash: &Hash) -> Result<Option<Transaction>, StoreError>;

    /// Stores a transaction and maintains the approver/address reverse
    /// indexes. Idempotent for an already-known hash.
    async fn put_transaction(&self, tx: Transaction) -> Result<(), StoreError>;

    /// All transactions referencing `hash` via trunk or branch.
    async fn approvers(&self, hash: &Hash) -> Result<Vec<Hash>, StoreError>;

    /// All transaction hashes carrying `address`.
    async fn transactions_for_address(&self, address: &Hash) -> Result<Vec<Hash>, StoreError>;

    /// Compare-and-set of the memoized bundle validity on a tail. The write
    /// is applied only when the stored value is `Unknown` or already equals
    /// `validity`; returns whether the stored value now matches `validity`.
    async fn update_validity(&self, tail: &Hash, validity: Validity) -> Result<bool, StoreError>;

    /// Marks a transaction as confirmed by the given milestone index.
    async fn set_snapshot_index(&self, hash: &Hash, index: u32) -> Result<(), StoreError>;

    /// Reverts a transaction to unconfirmed.
    async fn clear_snapshot_index(&self, hash: &Hash) -> Result<(), StoreError>;

    async fn milestone(&self, index: u32) -> Result<Option<Milestone>, StoreError>;

    async fn put_milestone(&self, milestone: Milestone) -> Result<(), StoreError>;

    /// The validated milestone closest to `index` in the given direction.
    async fn closest_milestone(
        &self,
        index: u32,
        direction: Direction,
    ) -> Result<Option<Milestone>, StoreError>;

    async fn state_diff(&self, index: u32) -> Result<Option<StateDiff>, StoreError>;

    async fn put_state_diff(&self, index: u32, diff: &StateDiff) -> Result<(), StoreError>;

    async fn delete_state_diff(&self, index: u32) -> Result<(), StoreError>;
}
