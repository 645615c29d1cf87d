//! Domain types for the ledger state machine.

pub mod snapshot;

pub use snapshot::LedgerSnapshot;

/// The verdict on one milestone candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MilestoneValidity {
    /// Coordinator signature and structure check out; recorded permanently.
    Valid,
    /// Bad index, structure or signature; never retried.
    Invalid,
    /// Part of the candidate's bundle is not locally known yet; retried.
    Incomplete,
}
