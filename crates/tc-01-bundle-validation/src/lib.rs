//! # Bundle Validation
//!
//! A bundle is the ordered transaction chain reached by following `trunk`
//! from a tail (`current_index == 0`) exactly `last_index + 1` hops. This
//! crate decides whether such a chain is a well-formed, balanced, correctly
//! signed transfer, and memoizes the verdict on the tail.
//!
//! ## Design Principles
//!
//! 1. **Typed outcomes, not exceptions**: invalid and incomplete bundles are
//!    expected results, returned as [`BundleOutcome`]; only storage failures
//!    surface as errors.
//! 2. **Atomic verdicts**: one bad transaction invalidates the whole bundle;
//!    a partially valid bundle is never accepted.
//! 3. **Memoize permanence only**: `Invalid` and `Valid` are written back
//!    through a compare-and-set; `Incomplete` never is, so the caller can
//!    retry once the missing transactions arrive.

pub mod domain;
pub mod error;
pub mod service;

pub use domain::BundleOutcome;
pub use error::{BundleError, BundleResult};
pub use service::{BundleValidator, BundleValidatorConfig};
