//! In-memory implementation of [`TangleStore`] for testing and simulation.

use crate::entities::{Hash, Milestone, StateDiff, Transaction, Validity};
use crate::store::{Direction, StoreError, TangleStore};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

#[derive(Default)]
struct Inner {
    transactions: HashMap<Hash, Transaction>,
    approvers: HashMap<Hash, Vec<Hash>>,
    address_index: HashMap<Hash, Vec<Hash>>,
    milestones: BTreeMap<u32, Hash>,
    state_diffs: HashMap<u32, StateDiff>,
}

/// In-memory Tangle keyed by content hash, with derived reverse indexes for
/// approvers and addresses.
#[derive(Default)]
pub struct MemoryTangle {
    inner: RwLock<Inner>,
}

impl MemoryTangle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored transactions.
    pub fn len(&self) -> usize {
        self.inner.read().transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().transactions.is_empty()
    }
}

#[async_trait]
impl TangleStore for MemoryTangle {
    async fn transaction(&self, hash: &Hash) -> Result<Option<Transaction>, StoreError> {
        Ok(self.inner.read().transactions.get(hash).cloned())
    }

    async fn put_transaction(&self, tx: Transaction) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        if inner.transactions.contains_key(&tx.hash) {
            return Ok(());
        }
        inner.approvers.entry(tx.trunk).or_default().push(tx.hash);
        if tx.branch != tx.trunk {
            inner.approvers.entry(tx.branch).or_default().push(tx.hash);
        }
        inner.address_index.entry(tx.address).or_default().push(tx.hash);
        inner.transactions.insert(tx.hash, tx);
        Ok(())
    }

    async fn approvers(&self, hash: &Hash) -> Result<Vec<Hash>, StoreError> {
        Ok(self
            .inner
            .read()
            .approvers
            .get(hash)
            .cloned()
            .unwrap_or_default())
    }

    async fn transactions_for_address(&self, address: &Hash) -> Result<Vec<Hash>, StoreError> {
        Ok(self
            .inner
            .read()
            .address_index
            .get(address)
            .cloned()
            .unwrap_or_default())
    }

    async fn update_validity(&self, tail: &Hash, validity: Validity) -> Result<bool, StoreError> {
        let mut inner = self.inner.write();
        match inner.transactions.get_mut(tail) {
            Some(tx) if tx.validity == Validity::Unknown => {
                tx.validity = validity;
                Ok(true)
            }
            Some(tx) => Ok(tx.validity == validity),
            None => Ok(false),
        }
    }

    async fn set_snapshot_index(&self, hash: &Hash, index: u32) -> Result<(), StoreError> {
        if let Some(tx) = self.inner.write().transactions.get_mut(hash) {
            tx.snapshot_index = index;
        }
        Ok(())
    }

    async fn clear_snapshot_index(&self, hash: &Hash) -> Result<(), StoreError> {
        if let Some(tx) = self.inner.write().transactions.get_mut(hash) {
            tx.snapshot_index = 0;
        }
        Ok(())
    }

    async fn milestone(&self, index: u32) -> Result<Option<Milestone>, StoreError> {
        Ok(self
            .inner
            .read()
            .milestones
            .get(&index)
            .map(|hash| Milestone::new(index, *hash)))
    }

    async fn put_milestone(&self, milestone: Milestone) -> Result<(), StoreError> {
        self.inner
            .write()
            .milestones
            .insert(milestone.index, milestone.hash);
        Ok(())
    }

    async fn closest_milestone(
        &self,
        index: u32,
        direction: Direction,
    ) -> Result<Option<Milestone>, StoreError> {
        let inner = self.inner.read();
        let found = match direction {
            Direction::Forward => inner.milestones.range(index.saturating_add(1)..).next(),
            Direction::Backward => inner.milestones.range(..=index).next_back(),
        };
        Ok(found.map(|(index, hash)| Milestone::new(*index, *hash)))
    }

    async fn state_diff(&self, index: u32) -> Result<Option<StateDiff>, StoreError> {
        Ok(self.inner.read().state_diffs.get(&index).cloned())
    }

    async fn put_state_diff(&self, index: u32, diff: &StateDiff) -> Result<(), StoreError> {
        self.inner.write().state_diffs.insert(index, diff.clone());
        Ok(())
    }

    async fn delete_state_diff(&self, index: u32) -> Result<(), StoreError> {
        self.inner.write().state_diffs.remove(&index);
        Ok(())
    }
}
