//! # Shared Types Crate
//!
//! This crate contains the domain entities shared by every Tangle-Core
//! subsystem, the `TangleStore` persistence port they all consume, and an
//! in-memory reference adapter used by the test suites.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: all cross-subsystem types are defined here.
//! - **Content addressing**: transactions are keyed by their content-derived
//!   243-trit hash; approver relationships are a derived reverse index owned
//!   by the store, never in-object back-pointers.
//! - **Typed outcomes**: expected validation results are values
//!   ([`Validity`]), not errors; only storage failures surface as
//!   [`StoreError`].

pub mod entities;
pub mod memory;
pub mod store;
pub mod trits;

pub use entities::*;
pub use memory::MemoryTangle;
pub use store::{Direction, StoreError, TangleStore};
pub use trits::Trit;
