//! # Tip Selection
//!
//! Produces the references a new transaction should approve. One request
//! runs three phases over a fixed view of the DAG:
//!
//! 1. entry point selection (a still-solid milestone `depth` back),
//! 2. cumulative-weight rating of the entry point's future cone,
//! 3. an alpha-biased random walk towards the tips, stepping only onto
//!    transactions whose cones keep the ledger consistent, backtracking
//!    out of branches that fail.
//!
//! No state survives a request; ratings are recomputed per call, which
//! makes this the most compute-heavy subsystem of the core.
//!
//! ## Design Principles
//!
//! 1. **Explicit work stack**: the walk and both traversals use explicit
//!    queues and visited sets; DAG depth is unbounded.
//! 2. **Degraded over failed**: when every branch from the entry point
//!    fails, the entry point itself is returned as a safe reference;
//!    `NotSolid` only means no solid milestone exists at all.
//! 3. **Ledger behind a port**: consistency is asked of the
//!    [`ports::outbound::LedgerGateway`], never computed here.

pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use error::{TipSelError, TipSelResult};
pub use service::{TipSelector, TipSelectorConfig};
