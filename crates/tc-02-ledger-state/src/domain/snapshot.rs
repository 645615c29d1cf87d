//! The ledger snapshot: confirmed balances as of one milestone index.

use shared_types::{Hash, StateDiff, SUPPLY};
use std::collections::HashMap;

/// Address balances confirmed up to `index`. Mutated only by applying one
/// milestone's diff at a time, in strictly increasing index order.
///
/// Invariant after every apply: all balances are non-negative and sum to
/// the full supply.
#[derive(Clone, Debug, PartialEq)]
pub struct LedgerSnapshot {
    index: u32,
    state: HashMap<Hash, i64>,
}

impl LedgerSnapshot {
    /// The pre-milestone state; `state` must hold the full supply.
    pub fn genesis(state: StateDiff) -> Self {
        Self { index: 0, state }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    /// Balance of one address; unknown addresses hold zero.
    pub fn balance(&self, address: &Hash) -> i64 {
        self.state.get(address).copied().unwrap_or(0)
    }

    /// Sum of all tracked balances.
    pub fn total(&self) -> i64 {
        self.state.values().sum()
    }

    /// Whether every balance is non-negative and the total equals the
    /// supply.
    pub fn is_supply_intact(&self) -> bool {
        self.state.values().all(|&balance| balance >= 0) && self.total() == SUPPLY
    }

    /// The balances the touched addresses would hold after merging `diff`,
    /// without mutating the snapshot. Overflowed additions saturate so the
    /// consistency check below rejects them.
    pub fn patched(&self, diff: &StateDiff) -> StateDiff {
        diff.iter()
            .map(|(address, delta)| {
                (
                    *address,
                    self.balance(address).saturating_add(*delta),
                )
            })
            .collect()
    }

    /// A diff is consistent when no touched address would go negative.
    pub fn is_consistent(&self, diff: &StateDiff) -> bool {
        self.patched(diff).values().all(|&balance| balance >= 0)
    }

    /// Commits a consistent diff and advances to `index`. Zeroed addresses
    /// are dropped from the map.
    pub fn apply(&mut self, diff: &StateDiff, index: u32) {
        for (address, delta) in diff {
            let balance = self.state.entry(*address).or_insert(0);
            *balance += delta;
            if *balance == 0 {
                self.state.remove(address);
            }
        }
        self.index = index;
    }
}
