//! Hash-based one-time signatures.
//!
//! A private key is a run of 6561-trit fragments squeezed from a subseed.
//! Signing reveals each 243-trit chunk hashed a number of times determined
//! by the normalized message tryte; verification finishes the remaining
//! hash applications and recovers the signer's digest, hence address.
//! Each key must sign at most once.

use crate::curl::{Curl, SpongeMode};
use shared_types::trits;
use shared_types::{Hash, Trit, HASH_LENGTH};

/// 243-trit chunks per key fragment; one chunk signs one message tryte.
pub const NUMBER_OF_FRAGMENT_CHUNKS: usize = 27;

/// Trits per key/signature fragment.
pub const FRAGMENT_LENGTH: usize = HASH_LENGTH * NUMBER_OF_FRAGMENT_CHUNKS;

/// Supported security levels; one fragment signed per level.
pub const NUMBER_OF_SECURITY_LEVELS: usize = 3;

/// Trytes of the normalized message covered by one security level.
pub const NORMALIZED_FRAGMENT_LENGTH: usize =
    HASH_LENGTH / trits::TRYTE_WIDTH / NUMBER_OF_SECURITY_LEVELS;

const MIN_TRYTE_VALUE: i8 = -13;
const MAX_TRYTE_VALUE: i8 = 13;

fn hash_chunk_in_place(sponge: &mut Curl, chunk: &mut [Trit]) {
    sponge.reset();
    sponge.absorb(chunk);
    sponge.squeeze(chunk);
}

/// Derives the subseed for key `index` from a 243-trit seed.
pub fn subseed(mode: SpongeMode, seed: &[Trit; HASH_LENGTH], index: u64) -> [Trit; HASH_LENGTH] {
    let mut preimage = *seed;
    for _ in 0..index {
        trits::increment(&mut preimage);
    }
    let mut sponge = Curl::new(mode);
    sponge.absorb(&preimage);
    let mut out = [0i8; HASH_LENGTH];
    sponge.squeeze(&mut out);
    out
}

/// Expands a subseed into `number_of_fragments` private key fragments.
pub fn key(
    mode: SpongeMode,
    subseed: &[Trit; HASH_LENGTH],
    number_of_fragments: usize,
) -> Vec<Trit> {
    let mut sponge = Curl::new(mode);
    sponge.absorb(subseed);
    let mut out = vec![0i8; number_of_fragments * FRAGMENT_LENGTH];
    sponge.squeeze(&mut out);
    out
}

/// Collapses a private key into one 243-trit digest per fragment by hashing
/// every chunk through the full tryte range.
pub fn digests(mode: SpongeMode, key: &[Trit]) -> Vec<Trit> {
    debug_assert_eq!(key.len() % FRAGMENT_LENGTH, 0);
    let mut sponge = Curl::new(mode);
    let mut out = vec![0i8; (key.len() / FRAGMENT_LENGTH) * HASH_LENGTH];
    for (i, fragment) in key.chunks(FRAGMENT_LENGTH).enumerate() {
        let mut buffer = fragment.to_vec();
        for chunk in buffer.chunks_mut(HASH_LENGTH) {
            for _ in 0..(MAX_TRYTE_VALUE - MIN_TRYTE_VALUE) {
                hash_chunk_in_place(&mut sponge, chunk);
            }
        }
        sponge.reset();
        sponge.absorb(&buffer);
        sponge.squeeze(&mut out[i * HASH_LENGTH..(i + 1) * HASH_LENGTH]);
    }
    out
}

/// The public address: the hash of all fragment digests.
pub fn address(mode: SpongeMode, digests: &[Trit]) -> Hash {
    let mut sponge = Curl::new(mode);
    sponge.absorb(digests);
    let mut out = [0i8; HASH_LENGTH];
    sponge.squeeze(&mut out);
    Hash(out)
}

/// Normalizes a bundle hash into 81 tryte values in `-13..=13`, rebalancing
/// each 27-tryte security block so its values sum to zero. This guarantees
/// that forging any tryte upward forces another downward, which the
/// one-way chunk hashing makes infeasible.
pub fn normalized_bundle(bundle: &Hash) -> [i8; HASH_LENGTH / trits::TRYTE_WIDTH] {
    let mut out = [0i8; HASH_LENGTH / trits::TRYTE_WIDTH];
    for block in 0..NUMBER_OF_SECURITY_LEVELS {
        let start = block * NORMALIZED_FRAGMENT_LENGTH;
        let end = start + NORMALIZED_FRAGMENT_LENGTH;
        let mut sum = 0i32;
        for (j, slot) in out[start..end].iter_mut().enumerate() {
            let offset = (start + j) * trits::TRYTE_WIDTH;
            *slot = trits::trits_to_value(&bundle.0[offset..offset + trits::TRYTE_WIDTH]) as i8;
            sum += i32::from(*slot);
        }
        while sum > 0 {
            for slot in out[start..end].iter_mut() {
                if *slot > MIN_TRYTE_VALUE {
                    *slot -= 1;
                    sum -= 1;
                    break;
                }
            }
        }
        while sum < 0 {
            for slot in out[start..end].iter_mut() {
                if *slot < MAX_TRYTE_VALUE {
                    *slot += 1;
                    sum += 1;
                    break;
                }
            }
        }
    }
    out
}

/// Signs one fragment: each key chunk is hashed `13 - tryte` times.
pub fn signature_fragment(
    mode: SpongeMode,
    normalized_fragment: &[i8],
    key_fragment: &[Trit],
) -> Vec<Trit> {
    debug_assert_eq!(normalized_fragment.len(), NUMBER_OF_FRAGMENT_CHUNKS);
    debug_assert_eq!(key_fragment.len(), FRAGMENT_LENGTH);
    let mut sponge = Curl::new(mode);
    let mut out = key_fragment.to_vec();
    for (j, chunk) in out.chunks_mut(HASH_LENGTH).enumerate() {
        for _ in 0..(MAX_TRYTE_VALUE - normalized_fragment[j]) {
            hash_chunk_in_place(&mut sponge, chunk);
        }
    }
    out
}

/// Recovers the fragment digest from a signature: each chunk is hashed the
/// complementary `tryte + 13` times, then the whole fragment is hashed.
pub fn digest(
    mode: SpongeMode,
    normalized_fragment: &[i8],
    signature_fragment: &[Trit],
) -> [Trit; HASH_LENGTH] {
    debug_assert_eq!(normalized_fragment.len(), NUMBER_OF_FRAGMENT_CHUNKS);
    debug_assert_eq!(signature_fragment.len(), FRAGMENT_LENGTH);
    let mut sponge = Curl::new(mode);
    let mut buffer = signature_fragment.to_vec();
    for (j, chunk) in buffer.chunks_mut(HASH_LENGTH).enumerate() {
        for _ in 0..(normalized_fragment[j] - MIN_TRYTE_VALUE) {
            hash_chunk_in_place(&mut sponge, chunk);
        }
    }
    sponge.reset();
    sponge.absorb(&buffer);
    let mut out = [0i8; HASH_LENGTH];
    sponge.squeeze(&mut out);
    out
}

/// Folds a leaf hash up a merkle authentication path. `siblings` carries
/// `depth` packed 243-trit nodes starting at `offset`; the bit parity of
/// `index` at each level decides absorption order.
pub fn merkle_root(
    mode: SpongeMode,
    leaf: &[Trit; HASH_LENGTH],
    siblings: &[Trit],
    offset: usize,
    index: u32,
    depth: usize,
) -> Hash {
    let mut sponge = Curl::new(mode);
    let mut hash = *leaf;
    let mut index = index;
    for level in 0..depth {
        let sibling = &siblings[offset + level * HASH_LENGTH..offset + (level + 1) * HASH_LENGTH];
        sponge.reset();
        if index & 1 == 0 {
            sponge.absorb(&hash);
            sponge.absorb(sibling);
        } else {
            sponge.absorb(sibling);
            sponge.absorb(&hash);
        }
        sponge.squeeze(&mut hash);
        index >>= 1;
    }
    Hash(hash)
}
