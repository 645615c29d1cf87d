//! Test fixtures: really-signed transfers and coordinator milestones.

use shared_crypto::curl::{Curl, SpongeMode};
use shared_crypto::{iss, MerkleTree};
use shared_types::{Hash, StateDiff, Tag, Transaction, HASH_LENGTH, SUPPLY};

pub const MODE: SpongeMode = SpongeMode::CurlP27;

/// Deterministic synthetic transaction identity. Writes base-3 digits into
/// the leading trits followed by a sentinel trit, so distinct inputs give
/// distinct non-null hashes and the last trit is always zero.
pub fn test_hash(n: u32) -> Hash {
    let mut trits = [0i8; HASH_LENGTH];
    let mut n = n;
    let mut i = 0;
    loop {
        trits[i] = (n % 3) as i8 - 1;
        n /= 3;
        i += 1;
        if n == 0 {
            break;
        }
    }
    trits[i] = 1;
    Hash(trits)
}

pub fn test_seed(salt: usize) -> [i8; HASH_LENGTH] {
    let mut seed = [0i8; HASH_LENGTH];
    for (i, trit) in seed.iter_mut().enumerate() {
        *trit = ((i * 13 + salt * 7 + 5) % 3) as i8 - 1;
    }
    seed
}

/// A one-time key whose address is usable for holding value (zero last
/// trit).
pub struct Signer {
    pub key: Vec<i8>,
    pub address: Hash,
}

pub fn signer(salt: usize) -> Signer {
    let seed = test_seed(salt);
    for index in 0.. {
        let subseed = iss::subseed(MODE, &seed, index);
        let key = iss::key(MODE, &subseed, 1);
        let address = iss::address(MODE, &iss::digests(MODE, &key));
        if address.last_trit() == 0 {
            return Signer { key, address };
        }
    }
    unreachable!()
}

/// Computes the bundle hash over the chain's essences and stamps it on
/// every member.
pub fn seal_bundle(transactions: &mut [Transaction]) {
    let mut sponge = Curl::new(MODE);
    for tx in transactions.iter() {
        sponge.absorb(&tx.essence());
    }
    let mut bundle = [0i8; HASH_LENGTH];
    sponge.squeeze(&mut bundle);
    for tx in transactions.iter_mut() {
        tx.bundle = Hash(bundle);
    }
}

/// A signed two-transaction transfer moving `amount` from the signer to
/// `to`. Returned tail first; both transactions anchor on the given
/// references.
pub fn signed_transfer(
    signer: &Signer,
    to: Hash,
    amount: i64,
    ids: (u32, u32),
    trunk_anchor: Hash,
    branch_anchor: Hash,
) -> Vec<Transaction> {
    let receive = Transaction {
        hash: test_hash(ids.1),
        address: to,
        value: amount,
        current_index: 1,
        last_index: 1,
        trunk: trunk_anchor,
        branch: branch_anchor,
        ..Transaction::default()
    };
    let spend = Transaction {
        hash: test_hash(ids.0),
        address: signer.address,
        value: -amount,
        current_index: 0,
        last_index: 1,
        trunk: receive.hash,
        branch: branch_anchor,
        ..Transaction::default()
    };
    let mut chain = vec![spend, receive];
    seal_bundle(&mut chain);
    let normalized = iss::normalized_bundle(&chain[0].bundle);
    chain[0].signature_or_message = iss::signature_fragment(
        MODE,
        &normalized[..iss::NUMBER_OF_FRAGMENT_CHUNKS],
        &signer.key,
    );
    chain
}

/// A single-transaction zero-value tail carrying a milestone index in its
/// obsolete tag. Structurally a valid bundle; no coordinator signature.
pub fn checkpoint_tail(id: u32, index: u32, address: Hash, trunk: Hash, branch: Hash) -> Transaction {
    let mut tail = Transaction {
        hash: test_hash(id),
        address,
        obsolete_tag: Tag::from_index(index),
        trunk,
        branch,
        ..Transaction::default()
    };
    let mut chain = [tail.clone()];
    seal_bundle(&mut chain);
    tail.bundle = chain[0].bundle;
    tail
}

/// A fully signed coordinator milestone bundle for `index`, whose
/// signature folds up to `tree.root()`. Tail first: the tail carries the
/// one-time signature over its trunk hash, the second transaction carries
/// the sibling path.
pub fn coordinator_milestone(
    tree: &MerkleTree,
    seed: &[i8; HASH_LENGTH],
    index: u32,
    ids: (u32, u32),
    trunk_anchor: Hash,
    branch_anchor: Hash,
) -> Vec<Transaction> {
    let mut siblings = tree.siblings(index as usize);
    siblings.resize(iss::FRAGMENT_LENGTH, 0);
    let carrier = Transaction {
        hash: test_hash(ids.1),
        signature_or_message: siblings,
        current_index: 1,
        last_index: 1,
        trunk: trunk_anchor,
        branch: branch_anchor,
        ..Transaction::default()
    };
    let tail = Transaction {
        hash: test_hash(ids.0),
        address: tree.root(),
        obsolete_tag: Tag::from_index(index),
        current_index: 0,
        last_index: 1,
        trunk: carrier.hash,
        branch: trunk_anchor,
        ..Transaction::default()
    };
    let mut chain = vec![tail, carrier];
    seal_bundle(&mut chain);

    let key = tree.leaf_key(seed, index as usize);
    let normalized = iss::normalized_bundle(&chain[0].trunk);
    chain[0].signature_or_message = iss::signature_fragment(
        MODE,
        &normalized[..iss::NUMBER_OF_FRAGMENT_CHUNKS],
        &key,
    );
    chain
}

/// Genesis distribution holding the full supply on one address.
pub fn genesis_funding(address: Hash) -> StateDiff {
    let mut state = StateDiff::new();
    state.insert(address, SUPPLY);
    state
}
