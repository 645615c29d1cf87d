//! Outbound port: the ledger questions the walk needs answered.

use async_trait::async_trait;
use shared_types::{Hash, Milestone, StateDiff, StoreError};

/// The ledger surface tip selection depends on. Implemented by the ledger
/// state machine; mocked in tests.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// The milestone the solid pointer currently sits on, if any.
    async fn latest_solid_milestone(&self) -> Result<Option<Milestone>, StoreError>;

    /// The combined balance delta of the unconfirmed cone under the given
    /// anchors, with shared ancestors counted once. `None` when the cone
    /// is incomplete or contains an invalid bundle.
    async fn cone_diff(&self, anchors: &[Hash]) -> Result<Option<StateDiff>, StoreError>;

    /// Whether merging `diff` into the confirmed snapshot keeps every
    /// balance non-negative.
    async fn is_consistent(&self, diff: &StateDiff) -> Result<bool, StoreError>;
}
