//! Per-step walk validation.

use crate::ports::outbound::LedgerGateway;
use shared_types::{Hash, StoreError, TangleStore};
use std::collections::HashMap;
use tracing::debug;

/// Decides whether the walk may step onto a transaction. One instance
/// lives for one walk; verdicts are memoized so revisits after a
/// backtrack are free.
pub struct WalkValidator<'a, S, G> {
    store: &'a S,
    gateway: &'a G,
    /// Oldest confirmation index a step may still sit on.
    lowest_allowed: u32,
    cache: HashMap<Hash, bool>,
}

impl<'a, S: TangleStore, G: LedgerGateway> WalkValidator<'a, S, G> {
    pub fn new(store: &'a S, gateway: &'a G, lowest_allowed: u32) -> Self {
        Self {
            store,
            gateway,
            lowest_allowed,
            cache: HashMap::new(),
        }
    }

    /// A step is valid when the transaction is locally known, not confirmed
    /// below the depth horizon, and its unconfirmed cone merges into the
    /// current snapshot without driving any balance negative.
    pub async fn is_valid_step(&mut self, hash: &Hash) -> Result<bool, StoreError> {
        if let Some(&verdict) = self.cache.get(hash) {
            return Ok(verdict);
        }
        let verdict = self.check(hash).await?;
        self.cache.insert(*hash, verdict);
        Ok(verdict)
    }

    async fn check(&self, hash: &Hash) -> Result<bool, StoreError> {
        let Some(tx) = self.store.transaction(hash).await? else {
            debug!(%hash, "walk step onto unknown transaction");
            return Ok(false);
        };
        if tx.snapshot_index != 0 && tx.snapshot_index < self.lowest_allowed {
            debug!(%hash, confirmed_at = tx.snapshot_index, "walk step below max depth");
            return Ok(false);
        }
        let Some(diff) = self.gateway.cone_diff(std::slice::from_ref(hash)).await? else {
            debug!(%hash, "walk step onto underivable cone");
            return Ok(false);
        };
        let consistent = self.gateway.is_consistent(&diff).await?;
        if !consistent {
            debug!(%hash, "walk step onto inconsistent cone");
        }
        Ok(consistent)
    }
}
