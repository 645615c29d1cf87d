//! Merkle trees over one-time public keys.
//!
//! A coordinator commits to `2^depth` one-time addresses through a single
//! root; each milestone reveals one leaf's signature plus the sibling path
//! authenticating that leaf against the root.

use crate::curl::{Curl, SpongeMode};
use crate::iss;
use shared_types::{Hash, Trit, HASH_LENGTH};

/// A fully materialized merkle tree; layer 0 holds the leaf addresses.
pub struct MerkleTree {
    mode: SpongeMode,
    layers: Vec<Vec<[Trit; HASH_LENGTH]>>,
}

impl MerkleTree {
    /// Builds the tree over the `2^depth` one-time addresses derived from
    /// `seed` at key indices `0..2^depth`, one fragment per key.
    pub fn from_seed(mode: SpongeMode, seed: &[Trit; HASH_LENGTH], depth: usize) -> Self {
        let leaves: Vec<[Trit; HASH_LENGTH]> = (0..1u64 << depth)
            .map(|index| {
                let subseed = iss::subseed(mode, seed, index);
                let key = iss::key(mode, &subseed, 1);
                iss::address(mode, &iss::digests(mode, &key)).0
            })
            .collect();

        let mut layers = vec![leaves];
        let mut sponge = Curl::new(mode);
        while layers[layers.len() - 1].len() > 1 {
            let last = &layers[layers.len() - 1];
            let mut parents = Vec::with_capacity(last.len() / 2);
            for pair in last.chunks(2) {
                sponge.reset();
                sponge.absorb(&pair[0]);
                sponge.absorb(&pair[1]);
                let mut parent = [0i8; HASH_LENGTH];
                sponge.squeeze(&mut parent);
                parents.push(parent);
            }
            layers.push(parents);
        }
        Self { mode, layers }
    }

    pub fn depth(&self) -> usize {
        self.layers.len() - 1
    }

    pub fn root(&self) -> Hash {
        Hash(self.layers[self.layers.len() - 1][0])
    }

    /// The leaf address at `index`.
    pub fn leaf(&self, index: usize) -> Hash {
        Hash(self.layers[0][index])
    }

    /// The authentication path for leaf `index`, packed bottom-up as
    /// `depth` consecutive 243-trit nodes.
    pub fn siblings(&self, index: usize) -> Vec<Trit> {
        let mut out = Vec::with_capacity(self.depth() * HASH_LENGTH);
        let mut index = index;
        for layer in &self.layers[..self.depth()] {
            out.extend_from_slice(&layer[index ^ 1]);
            index >>= 1;
        }
        out
    }

    /// Recomputes the one-time private key for leaf `index` from the seed
    /// the tree was built over.
    pub fn leaf_key(&self, seed: &[Trit; HASH_LENGTH], index: usize) -> Vec<Trit> {
        let subseed = iss::subseed(self.mode, seed, index as u64);
        iss::key(self.mode, &subseed, 1)
    }
}
