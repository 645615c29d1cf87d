//! Shared fixtures: signed transfers, coordinator milestones and the
//! adapter plugging the ledger service into the tip selector's port.
//!
//! Every transaction built here carries a genuine content-derived hash
//! over its full serialized layout, computed once signature material is
//! in place.

use async_trait::async_trait;
use shared_crypto::curl::{Curl, SpongeMode};
use shared_crypto::{iss, transaction_hash, MerkleTree};
use shared_types::{
    Hash, Milestone, StateDiff, StoreError, Tag, TangleStore, Transaction, HASH_LENGTH, SUPPLY,
};
use std::sync::Arc;
use tc_02_ledger_state::LedgerService;
use tc_03_tip_selection::ports::outbound::LedgerGateway;

/// The fast sponge variant; every fixture and service in these tests uses
/// it so signing stays cheap.
pub const MODE: SpongeMode = SpongeMode::CurlP27;

/// Deterministic synthetic address or anchor. Writes base-3 digits into
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

/// A one-time key whose address can hold value (zero last trit).
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
/// `to`. Returned tail first, trunk-chained through content hashes.
pub fn signed_transfer(
    signer: &Signer,
    to: Hash,
    amount: i64,
    trunk_anchor: Hash,
    branch_anchor: Hash,
) -> Vec<Transaction> {
    let receive = Transaction {
        address: to,
        value: amount,
        current_index: 1,
        last_index: 1,
        trunk: trunk_anchor,
        branch: branch_anchor,
        ..Transaction::default()
    };
    let spend = Transaction {
        address: signer.address,
        value: -amount,
        current_index: 0,
        last_index: 1,
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
    chain[1].hash = transaction_hash(&chain[1]);
    chain[0].trunk = chain[1].hash;
    chain[0].hash = transaction_hash(&chain[0]);
    chain
}

/// A zero-value tail without coordinator material, useful as a plain tip.
pub fn plain_tip(trunk: Hash, branch: Hash) -> Transaction {
    let mut chain = [Transaction {
        trunk,
        branch,
        ..Transaction::default()
    }];
    seal_bundle(&mut chain);
    let [mut tip] = chain;
    tip.hash = transaction_hash(&tip);
    tip
}

/// A fully signed coordinator milestone bundle for `index`, folding up to
/// `tree.root()`. Tail first.
pub fn coordinator_milestone(
    tree: &MerkleTree,
    seed: &[i8; HASH_LENGTH],
    index: u32,
    trunk_anchor: Hash,
    branch_anchor: Hash,
) -> Vec<Transaction> {
    let mut siblings = tree.siblings(index as usize);
    siblings.resize(iss::FRAGMENT_LENGTH, 0);
    let carrier = Transaction {
        signature_or_message: siblings,
        current_index: 1,
        last_index: 1,
        trunk: trunk_anchor,
        branch: branch_anchor,
        ..Transaction::default()
    };
    let tail = Transaction {
        address: tree.root(),
        obsolete_tag: Tag::from_index(index),
        current_index: 0,
        last_index: 1,
        branch: trunk_anchor,
        ..Transaction::default()
    };
    let mut chain = vec![tail, carrier];
    seal_bundle(&mut chain);

    chain[1].hash = transaction_hash(&chain[1]);
    chain[0].trunk = chain[1].hash;
    // The tail signs its trunk hash, so the signature comes after linking.
    let key = tree.leaf_key(seed, index as usize);
    let normalized = iss::normalized_bundle(&chain[0].trunk);
    chain[0].signature_or_message =
        iss::signature_fragment(MODE, &normalized[..iss::NUMBER_OF_FRAGMENT_CHUNKS], &key);
    chain[0].hash = transaction_hash(&chain[0]);
    chain
}

/// Genesis distribution holding the full supply on one address.
pub fn genesis_funding(address: Hash) -> StateDiff {
    let mut state = StateDiff::new();
    state.insert(address, SUPPLY);
    state
}

pub async fn store_all<S: TangleStore>(store: &S, transactions: &[Transaction]) {
    for tx in transactions {
        store.put_transaction(tx.clone()).await.unwrap();
    }
}

/// Adapter exposing the ledger service through the tip selector's
/// outbound port.
pub struct LedgerAdapter<S> {
    ledger: Arc<LedgerService<S>>,
}

impl<S> LedgerAdapter<S> {
    pub fn new(ledger: Arc<LedgerService<S>>) -> Self {
        Self { ledger }
    }
}

#[async_trait]
impl<S: TangleStore> LedgerGateway for LedgerAdapter<S> {
    async fn latest_solid_milestone(&self) -> Result<Option<Milestone>, StoreError> {
        Ok(self.ledger.latest_solid_milestone().await)
    }

    async fn cone_diff(&self, anchors: &[Hash]) -> Result<Option<StateDiff>, StoreError> {
        self.ledger
            .diff_for(anchors)
            .await
            .map_err(|error| StoreError::Backend {
                reason: error.to_string(),
            })
    }

    async fn is_consistent(&self, diff: &StateDiff) -> Result<bool, StoreError> {
        Ok(self.ledger.is_consistent_with(diff).await)
    }
}
