//! Tip selector service - entry point, rating and walk orchestration.

use crate::domain::rating::{self, Ratings};
use crate::domain::validator::WalkValidator;
use crate::domain::walker;
use crate::error::{TipSelError, TipSelResult};
use crate::ports::outbound::LedgerGateway;
use shared_types::{Direction, Hash, Milestone, TangleStore};
use std::sync::Arc;
use tracing::debug;

/// Tip selection configuration
#[derive(Clone, Copy, Debug)]
pub struct TipSelectorConfig {
    /// Exponential bias of the walk; zero walks uniformly
    pub alpha: f64,
    /// Per-transaction cap on the counted future set
    pub max_future_set: usize,
}

impl Default for TipSelectorConfig {
    fn default() -> Self {
        Self {
            alpha: 0.001,
            max_future_set: 5000,
        }
    }
}

/// One frame of the walk stack: a position and the approvers not yet
/// tried from it.
struct Frame {
    candidates: Vec<Hash>,
}

/// Answers tip selection requests over the DAG and the ledger gateway.
/// Stateless across requests.
pub struct TipSelector<S, G> {
    store: Arc<S>,
    gateway: Arc<G>,
    config: TipSelectorConfig,
}

impl<S: TangleStore, G: LedgerGateway> TipSelector<S, G> {
    pub fn new(store: Arc<S>, gateway: Arc<G>, config: TipSelectorConfig) -> Self {
        Self {
            store,
            gateway,
            config,
        }
    }

    /// Selects one consistent tip.
    ///
    /// Without a reference the walk starts at the latest solid milestone;
    /// with one it starts `depth` milestones further back, trading recency
    /// for room to route around the reference's surroundings. When every
    /// branch fails the entry point itself is returned; `NotSolid` only
    /// means there is no solid milestone to stand on.
    pub async fn select_tip(&self, depth: u32, reference: Option<Hash>) -> TipSelResult<Hash> {
        let entry = self.entry_point(depth, reference.is_some()).await?;
        let ratings = rating::rate_future_cone(
            self.store.as_ref(),
            &entry.hash,
            self.config.max_future_set,
        )
        .await?;
        let lowest_allowed = entry.index.saturating_sub(depth);
        let mut validator =
            WalkValidator::new(self.store.as_ref(), self.gateway.as_ref(), lowest_allowed);
        self.walk(entry.hash, &ratings, &mut validator).await
    }

    /// The two references for a new transaction: a tip, then a second tip
    /// chosen with the first as context. If the pair's combined cone does
    /// not merge consistently, the second reference degrades to the solid
    /// milestone.
    pub async fn transactions_to_approve(&self, depth: u32) -> TipSelResult<(Hash, Hash)> {
        let trunk = self.select_tip(depth, None).await?;
        let mut branch = self.select_tip(depth, Some(trunk)).await?;
        if branch != trunk && !self.pair_is_consistent(trunk, branch).await? {
            let solid = self
                .gateway
                .latest_solid_milestone()
                .await?
                .ok_or(TipSelError::NotSolid)?;
            debug!(%trunk, %branch, "conflicting pair, degrading branch to solid milestone");
            branch = solid.hash;
        }
        Ok((trunk, branch))
    }

    async fn pair_is_consistent(&self, trunk: Hash, branch: Hash) -> TipSelResult<bool> {
        match self.gateway.cone_diff(&[trunk, branch]).await? {
            Some(diff) => Ok(self.gateway.is_consistent(&diff).await?),
            None => Ok(false),
        }
    }

    /// The milestone the walk starts from. Anchored requests step back
    /// `depth` milestones from the solid pointer, taking the closest older
    /// milestone still on record.
    async fn entry_point(&self, depth: u32, anchored: bool) -> TipSelResult<Milestone> {
        let solid = self
            .gateway
            .latest_solid_milestone()
            .await?
            .ok_or(TipSelError::NotSolid)?;
        if !anchored || depth == 0 {
            return Ok(solid);
        }
        let target = solid.index.saturating_sub(depth);
        let anchor = self
            .store
            .closest_milestone(target, Direction::Backward)
            .await?;
        Ok(anchor.unwrap_or(solid))
    }

    /// The biased walk with backtracking. Each step draws from the current
    /// position's untried approvers; a failed validation removes the
    /// branch, an exhausted frame pops back to its parent, and an
    /// exhausted stack falls back to the entry point.
    async fn walk(
        &self,
        entry: Hash,
        ratings: &Ratings,
        validator: &mut WalkValidator<'_, S, G>,
    ) -> TipSelResult<Hash> {
        let entry_candidates = self.rated_approvers(&entry, ratings).await?;
        if entry_candidates.is_empty() {
            return Ok(entry);
        }
        let mut stack = vec![Frame {
            candidates: entry_candidates,
        }];
        loop {
            let Some(frame) = stack.last_mut() else {
                break;
            };
            if frame.candidates.is_empty() {
                stack.pop();
                continue;
            }
            let choice = {
                let mut rng = rand::thread_rng();
                walker::choose_step(&mut rng, ratings, &frame.candidates, self.config.alpha)
            };
            let Some(choice) = choice else {
                stack.pop();
                continue;
            };
            let next = frame.candidates.swap_remove(choice);
            if !validator.is_valid_step(&next).await? {
                continue;
            }
            let next_candidates = self.rated_approvers(&next, ratings).await?;
            if next_candidates.is_empty() {
                return Ok(next);
            }
            stack.push(Frame {
                candidates: next_candidates,
            });
        }
        debug!(%entry, "every branch from the entry point failed, returning it");
        Ok(entry)
    }

    /// Approvers of `hash` inside the rated cone.
    async fn rated_approvers(&self, hash: &Hash, ratings: &Ratings) -> TipSelResult<Vec<Hash>> {
        Ok(self
            .store
            .approvers(hash)
            .await?
            .into_iter()
            .filter(|approver| ratings.contains_key(approver))
            .collect())
    }
}
