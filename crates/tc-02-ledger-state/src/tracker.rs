//! Milestone tracker - candidate recognition and coordinator verification.

use crate::domain::MilestoneValidity;
use crate::error::LedgerResult;
use crate::service::LedgerService;
use parking_lot::RwLock;
use shared_crypto::iss;
use shared_types::{Hash, Milestone, TangleStore, Transaction, HASH_LENGTH, MAX_MILESTONE_INDEX};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tc_01_bundle_validation::BundleOutcome;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Recognizes coordinator milestone bundles and drives the ledger forward.
///
/// The advisory latest-known pointer tracked here is lock-free and only
/// informational; the consensus-relevant pointer is the ledger's solid one.
pub struct MilestoneTracker<S> {
    store: Arc<S>,
    ledger: Arc<LedgerService<S>>,
    latest_known_index: AtomicU32,
    latest_known_hash: RwLock<Hash>,
    /// Candidates with a definitive verdict; incomplete ones stay out so
    /// they are rescanned once their bundles fill in.
    analyzed: RwLock<HashSet<Hash>>,
}

impl<S: TangleStore> MilestoneTracker<S> {
    pub fn new(store: Arc<S>, ledger: Arc<LedgerService<S>>) -> Self {
        Self {
            store,
            ledger,
            latest_known_index: AtomicU32::new(0),
            latest_known_hash: RwLock::new(Hash::NULL),
            analyzed: RwLock::new(HashSet::new()),
        }
    }

    /// Highest validated milestone index seen so far. Advisory.
    pub fn latest_known_milestone_index(&self) -> u32 {
        self.latest_known_index.load(Ordering::Acquire)
    }

    pub fn latest_known_milestone_hash(&self) -> Hash {
        *self.latest_known_hash.read()
    }

    /// Sweeps all transactions on the coordinator address through candidate
    /// analysis; returns how many new milestones were validated.
    pub async fn scan(&self) -> LedgerResult<usize> {
        let coordinator = self.ledger.config().coordinator_address;
        let candidates = self.store.transactions_for_address(&coordinator).await?;
        let mut validated = 0;
        for hash in candidates {
            if self.analyzed.read().contains(&hash) {
                continue;
            }
            match self.analyze_candidate(&hash).await? {
                MilestoneValidity::Valid => {
                    self.analyzed.write().insert(hash);
                    validated += 1;
                }
                MilestoneValidity::Invalid => {
                    self.analyzed.write().insert(hash);
                }
                MilestoneValidity::Incomplete => {}
            }
        }
        Ok(validated)
    }

    /// Full verification of one milestone candidate: tail on the
    /// coordinator address, claimed index in range, valid bundle, sibling
    /// linkage, and a signature folding up to the coordinator merkle root.
    pub async fn analyze_candidate(&self, hash: &Hash) -> LedgerResult<MilestoneValidity> {
        let config = self.ledger.config();
        let Some(tail) = self.store.transaction(hash).await? else {
            return Ok(MilestoneValidity::Incomplete);
        };
        if !tail.is_tail() || tail.address != config.coordinator_address {
            return Ok(MilestoneValidity::Invalid);
        }
        let index = tail.milestone_index();
        if index < config.milestone_start_index || index >= MAX_MILESTONE_INDEX {
            debug!(%hash, index, "milestone index out of range");
            return Ok(MilestoneValidity::Invalid);
        }
        if let Some(existing) = self.store.milestone(index).await? {
            // The first validated milestone owns its index.
            if existing.hash != *hash {
                return Ok(MilestoneValidity::Invalid);
            }
            self.advance_known_pointer(existing);
            return Ok(MilestoneValidity::Valid);
        }

        let chain = match self.ledger.bundle_validator().validate(hash).await? {
            BundleOutcome::Valid(chain) => chain,
            BundleOutcome::Incomplete => return Ok(MilestoneValidity::Incomplete),
            BundleOutcome::Invalid => return Ok(MilestoneValidity::Invalid),
        };

        if !config.accept_unsigned_milestones
            && !self.signature_resolves_to_coordinator(&tail, &chain, index)
        {
            warn!(%hash, index, "milestone signature rejected");
            return Ok(MilestoneValidity::Invalid);
        }

        self.record(Milestone::new(index, *hash)).await?;
        Ok(MilestoneValidity::Valid)
    }

    /// Recovers the one-time leaf address from the tail's signature over
    /// its trunk hash, then folds it up the sibling path carried by the
    /// trunk transaction; the result must equal the coordinator address.
    fn signature_resolves_to_coordinator(
        &self,
        tail: &Transaction,
        chain: &[Transaction],
        index: u32,
    ) -> bool {
        let config = self.ledger.config();
        let Some(trunk_tx) = chain.get(1) else {
            return false;
        };
        if trunk_tx.trunk != tail.branch || trunk_tx.bundle != tail.bundle {
            return false;
        }
        if tail.signature_or_message.len() != iss::FRAGMENT_LENGTH
            || trunk_tx.signature_or_message.len() < config.merkle_tree_depth * HASH_LENGTH
        {
            return false;
        }
        let mode = config.sponge_mode;
        let normalized = iss::normalized_bundle(&tail.trunk);
        let digest = iss::digest(
            mode,
            &normalized[..iss::NUMBER_OF_FRAGMENT_CHUNKS],
            &tail.signature_or_message,
        );
        let leaf = iss::address(mode, &digest);
        let root = iss::merkle_root(
            mode,
            &leaf.0,
            &trunk_tx.signature_or_message,
            0,
            index,
            config.merkle_tree_depth,
        );
        root == config.coordinator_address
    }

    /// Persists a validated milestone and maintains both pointers. A
    /// milestone discovered below the solid pointer means confirmations
    /// past it are stale, so the ledger is hard reset to re-derive them.
    async fn record(&self, milestone: Milestone) -> LedgerResult<()> {
        self.store.put_milestone(milestone).await?;
        info!(index = milestone.index, hash = %milestone.hash, "milestone validated");

        let solid = self.ledger.latest_solid_milestone_index().await;
        if milestone.index < solid {
            self.ledger
                .hard_reset(milestone.index, "milestone discovered below the solid pointer")
                .await?;
        }

        self.advance_known_pointer(milestone);
        Ok(())
    }

    fn advance_known_pointer(&self, milestone: Milestone) {
        // The write lock on the hash also serializes the index check and
        // store, so concurrent callers can never pair one milestone's hash
        // with another's index.
        let mut hash = self.latest_known_hash.write();
        if milestone.index > self.latest_known_index.load(Ordering::Acquire) {
            *hash = milestone.hash;
            self.latest_known_index
                .store(milestone.index, Ordering::Release);
        }
    }
}

impl<S: TangleStore + 'static> MilestoneTracker<S> {
    /// Starts the two background activities: the candidate scanner and the
    /// solid-milestone advancer. Both stop when `shutdown` fires; a
    /// traversal in flight finishes first so partial state is never left
    /// behind.
    pub fn spawn(self: &Arc<Self>, shutdown: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        let scanner = {
            let tracker = Arc::clone(self);
            let mut shutdown = shutdown.clone();
            tokio::spawn(async move {
                let interval = tracker.ledger.config().poll_interval;
                loop {
                    tokio::select! {
                        _ = shutdown.changed() => break,
                        _ = tokio::time::sleep(interval) => {
                            if let Err(error) = tracker.scan().await {
                                warn!(%error, "milestone scan failed");
                            }
                        }
                    }
                }
            })
        };
        let advancer = {
            let tracker = Arc::clone(self);
            let mut shutdown = shutdown;
            tokio::spawn(async move {
                let interval = tracker.ledger.config().poll_interval;
                loop {
                    tokio::select! {
                        _ = shutdown.changed() => break,
                        _ = tokio::time::sleep(interval) => {
                            if let Err(error) = tracker.ledger.solidify().await {
                                warn!(%error, "solid milestone advancement failed");
                            }
                        }
                    }
                }
            })
        };
        vec![scanner, advancer]
    }
}
