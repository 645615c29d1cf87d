//! Ledger service - snapshot advancement, resets and balance queries.

use crate::domain::LedgerSnapshot;
use crate::error::{LedgerError, LedgerResult};
use shared_crypto::curl::SpongeMode;
use shared_types::{
    Direction, Hash, Milestone, StateDiff, TangleStore, Validity, SUPPLY,
};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tc_01_bundle_validation::{BundleOutcome, BundleValidator, BundleValidatorConfig};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Ledger configuration
#[derive(Clone, Debug)]
pub struct LedgerConfig {
    /// Coordinator merkle root; milestone signatures must resolve to it
    pub coordinator_address: Hash,
    /// Depth of the coordinator key tree
    pub merkle_tree_depth: usize,
    /// Lowest milestone index this node accepts
    pub milestone_start_index: u32,
    /// Sponge variant for bundle hashing and signatures
    pub sponge_mode: SpongeMode,
    /// Skip coordinator signature verification (test networks only)
    pub accept_unsigned_milestones: bool,
    /// Background scan/solidification retry interval
    pub poll_interval: Duration,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            coordinator_address: Hash::NULL,
            merkle_tree_depth: 20,
            milestone_start_index: 1,
            sponge_mode: SpongeMode::CurlP81,
            accept_unsigned_milestones: false,
            poll_interval: Duration::from_secs(5),
        }
    }
}

/// Result of one attempt to advance the solid milestone pointer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The milestone's diff applied; the pointer now sits at this index.
    Applied(u32),
    /// The milestone's cone is not fully local yet; retried later.
    NotSolid(u32),
    /// The diff would drive a balance negative; the snapshot was soft
    /// reset and the pointer did not move.
    Inconsistent(u32),
    /// No validated milestone beyond the current pointer.
    Exhausted,
}

/// Snapshot plus the solid pointer, guarded together by one lock.
struct LedgerState {
    snapshot: LedgerSnapshot,
    latest_solid: Option<Milestone>,
}

impl LedgerState {
    fn solid_index(&self) -> u32 {
        self.latest_solid.map(|m| m.index).unwrap_or(0)
    }
}

/// Outcome of deriving the diff implied by one cone.
enum ConeDiff {
    /// Delta map plus every unconfirmed transaction visited on the way.
    Derived {
        diff: StateDiff,
        visited: HashSet<Hash>,
    },
    /// The cone references a transaction that is not locally known.
    Missing(Hash),
    /// The cone contains an invalid bundle or an unaccounted value move.
    Rejected(Hash),
}

/// The ledger state machine. All snapshot mutation funnels through the
/// single write lock; balance reads and tip-selection consistency checks
/// take the read side.
pub struct LedgerService<S> {
    store: Arc<S>,
    validator: BundleValidator<S>,
    config: LedgerConfig,
    genesis: LedgerSnapshot,
    state: RwLock<LedgerState>,
}

impl<S: TangleStore> LedgerService<S> {
    /// Builds the service over a genesis balance distribution, which must
    /// hold exactly the full supply.
    pub fn new(store: Arc<S>, config: LedgerConfig, genesis_state: StateDiff) -> LedgerResult<Self> {
        let genesis = LedgerSnapshot::genesis(genesis_state);
        if !genesis.is_supply_intact() {
            return Err(LedgerError::BadGenesis {
                expected: SUPPLY,
                actual: genesis.total(),
            });
        }
        let validator = BundleValidator::new(
            Arc::clone(&store),
            BundleValidatorConfig {
                sponge_mode: config.sponge_mode,
            },
        );
        Ok(Self {
            store,
            validator,
            config,
            genesis: genesis.clone(),
            state: RwLock::new(LedgerState {
                snapshot: genesis,
                latest_solid: None,
            }),
        })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn bundle_validator(&self) -> &BundleValidator<S> {
        &self.validator
    }

    /// Confirmed balance of one address. Never negative.
    pub async fn balance(&self, address: &Hash) -> u64 {
        self.state.read().await.snapshot.balance(address).max(0) as u64
    }

    pub async fn latest_solid_milestone(&self) -> Option<Milestone> {
        self.state.read().await.latest_solid
    }

    pub async fn latest_solid_milestone_index(&self) -> u32 {
        self.state.read().await.solid_index()
    }

    /// Replays persisted diffs on startup so the snapshot reflects what
    /// earlier runs already confirmed.
    pub async fn restore(&self) -> LedgerResult<u32> {
        let mut state = self.state.write().await;
        self.replay_into(&mut state, u32::MAX).await?;
        let index = state.solid_index();
        if index > 0 {
            info!(index, "restored ledger from persisted diffs");
        }
        Ok(index)
    }

    /// Tries to apply the next validated milestone past the solid pointer.
    pub async fn advance_once(&self) -> LedgerResult<AdvanceOutcome> {
        let mut state = self.state.write().await;
        let next = self
            .store
            .closest_milestone(state.solid_index(), Direction::Forward)
            .await?;
        match next {
            Some(milestone) => self.apply_milestone(&mut state, milestone).await,
            None => Ok(AdvanceOutcome::Exhausted),
        }
    }

    /// Applies validated milestones until the next one is missing, unsolid
    /// or inconsistent; returns the outcome that stopped the run.
    pub async fn solidify(&self) -> LedgerResult<AdvanceOutcome> {
        loop {
            match self.advance_once().await? {
                AdvanceOutcome::Applied(index) => {
                    debug!(index, "solid milestone advanced");
                }
                outcome => return Ok(outcome),
            }
        }
    }

    /// The balance delta the unconfirmed cone under the given anchors
    /// would add on top of confirmed state, or `None` when the cone is
    /// incomplete or contains an invalid bundle. Shared ancestors are
    /// counted once. Pure store reads; takes no ledger lock.
    pub async fn diff_for(&self, anchors: &[Hash]) -> LedgerResult<Option<StateDiff>> {
        match self.derive_cone_diff(anchors).await? {
            ConeDiff::Derived { diff, .. } => Ok(Some(diff)),
            ConeDiff::Missing(_) | ConeDiff::Rejected(_) => Ok(None),
        }
    }

    /// Whether merging `diff` into the current snapshot keeps every
    /// balance non-negative. Read lock only.
    pub async fn is_consistent_with(&self, diff: &StateDiff) -> bool {
        self.state.read().await.snapshot.is_consistent(diff)
    }

    /// Reverts the working snapshot to the last committed state by
    /// replaying persisted diffs from genesis.
    pub async fn soft_reset(&self) -> LedgerResult<()> {
        let mut state = self.state.write().await;
        self.replay_into(&mut state, u32::MAX).await
    }

    /// Repairs the ledger after out-of-order milestone discovery: every
    /// milestone from `target` forward has its confirmations cleared and
    /// its persisted diff deleted, then the snapshot is rebuilt from
    /// genesis up to `target - 1`. Safe to call repeatedly; fully
    /// serialized against solid-milestone advancement.
    pub async fn hard_reset(&self, target: u32, reason: &str) -> LedgerResult<()> {
        let mut state = self.state.write().await;
        warn!(target, reason, "hard ledger reset");

        let mut cursor = target.saturating_sub(1);
        while let Some(milestone) = self
            .store
            .closest_milestone(cursor, Direction::Forward)
            .await?
        {
            if milestone.index >= target {
                self.clear_confirmations(&milestone.hash, target).await?;
                self.store.delete_state_diff(milestone.index).await?;
            }
            cursor = milestone.index;
        }

        self.replay_into(&mut state, target.saturating_sub(1)).await
    }

    /// Rebuilds the snapshot from genesis by applying persisted diffs in
    /// index order, up to and including `up_to`. The solid pointer lands
    /// on the last milestone whose diff was applied.
    async fn replay_into(&self, state: &mut LedgerState, up_to: u32) -> LedgerResult<()> {
        let mut snapshot = self.genesis.clone();
        let mut latest_solid = None;
        let mut cursor = 0u32;
        while let Some(milestone) = self
            .store
            .closest_milestone(cursor, Direction::Forward)
            .await?
        {
            if milestone.index > up_to {
                break;
            }
            if let Some(diff) = self.store.state_diff(milestone.index).await? {
                snapshot.apply(&diff, milestone.index);
                latest_solid = Some(milestone);
            }
            cursor = milestone.index;
        }
        debug_assert!(snapshot.is_supply_intact());
        state.snapshot = snapshot;
        state.latest_solid = latest_solid;
        Ok(())
    }

    /// Derives, checks and commits one milestone's diff under the write
    /// lock already held by the caller.
    async fn apply_milestone(
        &self,
        state: &mut LedgerState,
        milestone: Milestone,
    ) -> LedgerResult<AdvanceOutcome> {
        let Some(tail) = self.store.transaction(&milestone.hash).await? else {
            return Ok(AdvanceOutcome::NotSolid(milestone.index));
        };
        if tail.is_confirmed() {
            // Confirmed by an earlier run; the pointer just moves up.
            state.latest_solid = Some(milestone);
            return Ok(AdvanceOutcome::Applied(milestone.index));
        }

        let (diff, visited) = match self
            .derive_cone_diff(std::slice::from_ref(&milestone.hash))
            .await?
        {
            ConeDiff::Derived { diff, visited } => (diff, visited),
            ConeDiff::Missing(hash) => {
                debug!(index = milestone.index, missing = %hash, "milestone cone not solid");
                return Ok(AdvanceOutcome::NotSolid(milestone.index));
            }
            ConeDiff::Rejected(hash) => {
                warn!(index = milestone.index, at = %hash, "milestone cone rejected");
                return Ok(AdvanceOutcome::NotSolid(milestone.index));
            }
        };

        if !state.snapshot.is_consistent(&diff) {
            warn!(
                index = milestone.index,
                "inconsistent milestone diff, reverting to committed state"
            );
            self.replay_into(state, u32::MAX).await?;
            return Ok(AdvanceOutcome::Inconsistent(milestone.index));
        }

        for hash in &visited {
            self.store.set_snapshot_index(hash, milestone.index).await?;
        }
        self.store.put_state_diff(milestone.index, &diff).await?;
        state.snapshot.apply(&diff, milestone.index);
        state.latest_solid = Some(milestone);
        debug_assert!(state.snapshot.is_supply_intact());
        info!(index = milestone.index, "milestone applied");
        Ok(AdvanceOutcome::Applied(milestone.index))
    }

    /// Reverse traversal from the anchors over trunk and branch,
    /// accumulating the values of every valid bundle met before confirmed
    /// territory.
    ///
    /// Values are counted once per bundle, at its tail. A value move whose
    /// tail never turns up in the cone, or any invalid bundle, rejects the
    /// whole derivation.
    async fn derive_cone_diff(&self, anchors: &[Hash]) -> LedgerResult<ConeDiff> {
        let mut diff = StateDiff::new();
        let mut visited: HashSet<Hash> = HashSet::new();
        let mut counted: HashSet<Hash> = HashSet::new();
        let mut value_carriers: Vec<Hash> = Vec::new();
        let mut queue: VecDeque<Hash> = VecDeque::from(anchors.to_vec());

        while let Some(hash) = queue.pop_front() {
            if hash.is_null() || !visited.insert(hash) {
                continue;
            }
            let Some(tx) = self.store.transaction(&hash).await? else {
                return Ok(ConeDiff::Missing(hash));
            };
            if tx.is_confirmed() {
                // Already accounted for by an earlier milestone.
                visited.remove(&hash);
                continue;
            }
            if tx.validity == Validity::Invalid {
                return Ok(ConeDiff::Rejected(hash));
            }
            if tx.is_tail() && !counted.contains(&hash) {
                match self.validator.validate(&hash).await? {
                    BundleOutcome::Valid(chain) => {
                        for member in &chain {
                            counted.insert(member.hash);
                            if member.value != 0 {
                                let slot = diff.entry(member.address).or_insert(0);
                                *slot = match slot.checked_add(member.value) {
                                    Some(value) => value,
                                    None => return Ok(ConeDiff::Rejected(hash)),
                                };
                            }
                        }
                    }
                    BundleOutcome::Incomplete => return Ok(ConeDiff::Missing(hash)),
                    BundleOutcome::Invalid => return Ok(ConeDiff::Rejected(hash)),
                }
            }
            if tx.value != 0 {
                value_carriers.push(hash);
            }
            queue.push_back(tx.trunk);
            queue.push_back(tx.branch);
        }

        // Every value move must have been swept up by a valid bundle.
        for hash in value_carriers {
            if !counted.contains(&hash) {
                return Ok(ConeDiff::Rejected(hash));
            }
        }
        diff.retain(|_, delta| *delta != 0);
        Ok(ConeDiff::Derived { diff, visited })
    }

    /// Clears `snapshot_index` on every transaction the given milestone
    /// confirmed at or past `target`, stopping at older confirmations.
    async fn clear_confirmations(&self, from: &Hash, target: u32) -> LedgerResult<()> {
        let mut visited: HashSet<Hash> = HashSet::new();
        let mut queue: VecDeque<Hash> = VecDeque::new();
        queue.push_back(*from);
        while let Some(hash) = queue.pop_front() {
            if hash.is_null() || !visited.insert(hash) {
                continue;
            }
            let Some(tx) = self.store.transaction(&hash).await? else {
                continue;
            };
            if tx.snapshot_index == 0 || tx.snapshot_index < target {
                continue;
            }
            self.store.clear_snapshot_index(&hash).await?;
            queue.push_back(tx.trunk);
            queue.push_back(tx.branch);
        }
        Ok(())
    }
}
