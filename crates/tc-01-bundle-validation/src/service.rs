//! Bundle validator service - core business logic.

use crate::domain::BundleOutcome;
use crate::error::BundleResult;
use shared_crypto::curl::{Curl, SpongeMode};
use shared_crypto::iss;
use shared_types::{Hash, TangleStore, Transaction, Validity, HASH_LENGTH, SUPPLY};
use std::sync::Arc;
use tracing::debug;

/// Bundle validation configuration
#[derive(Clone, Copy, Debug)]
pub struct BundleValidatorConfig {
    /// Sponge variant used for bundle hashing and signature recovery
    pub sponge_mode: SpongeMode,
}

impl Default for BundleValidatorConfig {
    fn default() -> Self {
        Self {
            sponge_mode: SpongeMode::CurlP81,
        }
    }
}

/// Validates bundles against the Tangle held by the persistence collaborator.
///
/// Stateless apart from the verdict memoized on tail transactions, so
/// concurrent validations of the same bundle only duplicate work.
pub struct BundleValidator<S> {
    store: Arc<S>,
    config: BundleValidatorConfig,
}

impl<S: TangleStore> BundleValidator<S> {
    pub fn new(store: Arc<S>, config: BundleValidatorConfig) -> Self {
        Self { store, config }
    }

    /// Validates the bundle anchored at `tail`.
    ///
    /// A memoized `Valid` verdict short-circuits all cryptography; only the
    /// transaction chain is reloaded. A non-tail reference is rejected
    /// without being memoized, since the verdict slot belongs to the tail.
    pub async fn validate(&self, tail: &Hash) -> BundleResult<BundleOutcome> {
        let Some(tail_tx) = self.store.transaction(tail).await? else {
            return Ok(BundleOutcome::Incomplete);
        };
        if !tail_tx.is_tail() {
            debug!(hash = %tail_tx.hash, index = tail_tx.current_index, "not a tail");
            return Ok(BundleOutcome::Invalid);
        }
        match tail_tx.validity {
            Validity::Invalid => return Ok(BundleOutcome::Invalid),
            Validity::Valid => {
                return Ok(match self.load_chain(&tail_tx).await? {
                    Some(transactions) => BundleOutcome::Valid(transactions),
                    None => BundleOutcome::Incomplete,
                });
            }
            Validity::Unknown => {}
        }

        let Some(transactions) = self.load_chain(&tail_tx).await? else {
            return Ok(BundleOutcome::Incomplete);
        };
        if !self.chain_is_sound(&transactions) {
            return self.memoize(tail, Validity::Invalid).await;
        }
        if self.bundle_hash(&transactions) != tail_tx.bundle {
            debug!(tail = %tail_tx.hash, "bundle hash mismatch");
            return self.memoize(tail, Validity::Invalid).await;
        }
        if !self.signatures_are_sound(&transactions) {
            debug!(tail = %tail_tx.hash, "signature verification failed");
            return self.memoize(tail, Validity::Invalid).await;
        }

        match self.memoize(tail, Validity::Valid).await? {
            BundleOutcome::Invalid => Ok(BundleOutcome::Invalid),
            _ => Ok(BundleOutcome::Valid(transactions)),
        }
    }

    /// Follows `trunk` from the tail for `last_index + 1` transactions.
    /// `None` when the chain runs into a locally unknown transaction.
    async fn load_chain(&self, tail: &Transaction) -> BundleResult<Option<Vec<Transaction>>> {
        let mut transactions = Vec::with_capacity(tail.last_index as usize + 1);
        let mut current = tail.clone();
        for index in 0..=tail.last_index {
            transactions.push(current.clone());
            if index == tail.last_index {
                break;
            }
            match self.store.transaction(&current.trunk).await? {
                Some(next) => current = next,
                None => {
                    debug!(tail = %tail.hash, missing = %current.trunk, "bundle incomplete");
                    return Ok(None);
                }
            }
        }
        Ok(Some(transactions))
    }

    /// Structural and balance checks over the loaded chain: sequential
    /// indices, a shared `last_index` and bundle hash, supply-bounded
    /// overflow-checked value accumulation summing to zero, and a zero last
    /// address trit on every value-carrying transaction.
    fn chain_is_sound(&self, transactions: &[Transaction]) -> bool {
        let tail = &transactions[0];
        let mut sum = 0i64;
        for (index, tx) in transactions.iter().enumerate() {
            if tx.current_index != index as u64
                || tx.last_index != tail.last_index
                || tx.bundle != tail.bundle
            {
                debug!(tail = %tail.hash, at = %tx.hash, "bundle sequencing mismatch");
                return false;
            }
            if tx.value.abs() > SUPPLY {
                debug!(tail = %tail.hash, value = tx.value, "value exceeds supply");
                return false;
            }
            sum = match sum.checked_add(tx.value) {
                Some(sum) if sum.abs() <= SUPPLY => sum,
                _ => {
                    debug!(tail = %tail.hash, "partial sum exceeds supply");
                    return false;
                }
            };
            if tx.value != 0 && tx.address.last_trit() != 0 {
                debug!(tail = %tail.hash, address = %tx.address, "bad value address");
                return false;
            }
        }
        if sum != 0 {
            debug!(tail = %tail.hash, sum, "bundle does not balance");
        }
        sum == 0
    }

    /// Recomputes the bundle hash by absorbing every essence in index order.
    fn bundle_hash(&self, transactions: &[Transaction]) -> Hash {
        let mut sponge = Curl::new(self.config.sponge_mode);
        for tx in transactions {
            sponge.absorb(&tx.essence());
        }
        let mut out = [0i8; HASH_LENGTH];
        sponge.squeeze(&mut out);
        Hash(out)
    }

    /// Verifies every spending group's one-time signature.
    ///
    /// A group is a spending transaction (`value < 0`) plus the immediately
    /// following zero-value transactions sharing its address; each carries
    /// one signature fragment, consumed against rotating thirds of the
    /// normalized bundle hash. The address recovered from the fragment
    /// digests must equal the stored one.
    fn signatures_are_sound(&self, transactions: &[Transaction]) -> bool {
        let mode = self.config.sponge_mode;
        let normalized = iss::normalized_bundle(&transactions[0].bundle);
        let mut i = 0;
        while i < transactions.len() {
            if transactions[i].value >= 0 {
                i += 1;
                continue;
            }
            let address = transactions[i].address;
            let mut digests = Vec::new();
            let mut fragment_index = 0usize;
            let mut j = i;
            loop {
                let fragment = &transactions[j].signature_or_message;
                if fragment.len() != iss::FRAGMENT_LENGTH {
                    return false;
                }
                let offset = (fragment_index % iss::NUMBER_OF_SECURITY_LEVELS)
                    * iss::NORMALIZED_FRAGMENT_LENGTH;
                digests.extend_from_slice(&iss::digest(
                    mode,
                    &normalized[offset..offset + iss::NORMALIZED_FRAGMENT_LENGTH],
                    fragment,
                ));
                fragment_index += 1;
                j += 1;
                if j >= transactions.len()
                    || transactions[j].address != address
                    || transactions[j].value != 0
                {
                    break;
                }
            }
            if iss::address(mode, &digests) != address {
                return false;
            }
            i = j;
        }
        true
    }

    /// Compare-and-set of the verdict on the tail. When a concurrent
    /// validation already memoized the opposite verdict, the stored one
    /// wins; duplicate identical writes are benign.
    async fn memoize(&self, tail: &Hash, validity: Validity) -> BundleResult<BundleOutcome> {
        let stored_matches = self.store.update_validity(tail, validity).await?;
        let effective = if stored_matches {
            validity
        } else {
            self.store
                .transaction(tail)
                .await?
                .map(|tx| tx.validity)
                .unwrap_or(Validity::Unknown)
        };
        Ok(match effective {
            Validity::Invalid => BundleOutcome::Invalid,
            // Valid chains are returned by the caller, which already holds
            // the transactions; this placeholder is replaced there.
            Validity::Valid => BundleOutcome::Valid(Vec::new()),
            Validity::Unknown => BundleOutcome::Incomplete,
        })
    }
}
