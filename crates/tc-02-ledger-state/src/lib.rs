//! # Ledger State
//!
//! The ledger is a milestone-driven state machine. Coordinator-issued
//! milestone bundles checkpoint the DAG; each validated milestone implies a
//! balance diff over the cone of transactions it references, and the
//! snapshot advances by applying those diffs strictly in index order.
//!
//! Two pointers track progress: the advisory *latest known* milestone
//! (highest validated index, lock-free) and the authoritative *latest
//! solid* milestone (highest index whose full cone is local and whose diff
//! applied consistently, guarded by the ledger lock).
//!
//! ## Design Principles
//!
//! 1. **Single writer**: diff derivation, application and both reset paths
//!    run under one exclusive lock; readers (balance queries, tip-selection
//!    consistency checks) share it.
//! 2. **All-or-nothing diffs**: a cone containing one invalid bundle yields
//!    no diff at all; partial results are never committed.
//! 3. **Resets over failures**: an inconsistent ledger is repaired (soft or
//!    hard reset) rather than surfaced as a fatal error.

pub mod domain;
pub mod error;
pub mod service;
pub mod tracker;

#[cfg(test)]
pub(crate) mod fixtures;

pub use domain::{LedgerSnapshot, MilestoneValidity};
pub use error::{LedgerError, LedgerResult};
pub use service::{AdvanceOutcome, LedgerConfig, LedgerService};
pub use tracker::MilestoneTracker;
