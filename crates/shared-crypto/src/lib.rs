//! # Shared Crypto
//!
//! Ternary cryptography for the consensus core:
//!
//! - [`curl`]: the Curl-P sponge (27 and 81 round variants) used for
//!   transaction hashing, bundle hashing and key derivation.
//! - [`iss`]: the hash-based one-time signature scheme authorizing spends
//!   and coordinator milestones.
//! - [`merkle`]: merkle trees over one-time public keys, letting a single
//!   root authenticate a whole family of coordinator keys.
//!
//! ## Design Principles
//!
//! 1. **Closed sponge family**: the sponge variant is a two-member enum
//!    chosen at construction time, never a dynamically registered plugin.
//! 2. **Plain trit slices**: primitives operate on `&[Trit]` and fixed
//!    arrays; domain typing lives in `shared-types`.

pub mod curl;
pub mod iss;
pub mod merkle;

pub use curl::{Curl, SpongeMode};
pub use merkle::MerkleTree;

use shared_types::{Hash, Transaction, HASH_LENGTH};

/// Hashes an arbitrary trit sequence down to 243 trits.
pub fn hash_trits(mode: SpongeMode, trits: &[i8]) -> [i8; HASH_LENGTH] {
    let mut sponge = Curl::new(mode);
    sponge.absorb(trits);
    let mut out = [0i8; HASH_LENGTH];
    sponge.squeeze(&mut out);
    out
}

/// Derives a transaction's content hash from its full serialized layout.
///
/// Always uses the 81-round variant; the faster 27-round sponge is reserved
/// for signing material in test networks.
pub fn transaction_hash(tx: &Transaction) -> Hash {
    Hash(hash_trits(SpongeMode::CurlP81, &tx.trits()))
}
