//! # Core Domain Entities
//!
//! The transaction DAG ("the Tangle") is made of fixed-layout transactions
//! referencing two predecessors each (trunk and branch). Groups of
//! transactions sharing a bundle hash form atomic transfers; coordinator
//! bundles are milestones.

use crate::trits::{self, Trit};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::collections::HashMap;
use std::fmt;

/// Trits per hash.
pub const HASH_LENGTH: usize = 243;

/// Trits per tag field.
pub const TAG_LENGTH: usize = 81;

/// Trits per signature/message fragment.
pub const SIGNATURE_FRAGMENT_LENGTH: usize = 6561;

/// Trits of the signed "essence" region of a transaction:
/// address + value + obsolete tag + timestamp + current index + last index.
pub const ESSENCE_LENGTH: usize = 486;

/// Total trits in the serialized transaction layout.
pub const TRANSACTION_LENGTH: usize = 8019;

/// Total token supply: (3^33 - 1) / 2.
pub const SUPPLY: i64 = 2_779_530_283_277_761;

/// Trits of the obsolete tag carrying a milestone candidate's claimed index.
pub const MILESTONE_INDEX_TRITS: usize = 15;

/// Exclusive upper bound on milestone indices.
pub const MAX_MILESTONE_INDEX: u32 = 0x20_0000;

/// A 243-trit content-derived identifier (transaction hash, address or
/// bundle hash). Displayed as 81 trytes.
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hash(#[serde_as(as = "[_; 243]")] pub [Trit; HASH_LENGTH]);

impl Hash {
    /// The all-zero hash, used as the genesis reference.
    pub const NULL: Hash = Hash([0; HASH_LENGTH]);

    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }

    pub fn trits(&self) -> &[Trit; HASH_LENGTH] {
        &self.0
    }

    /// The final trit; zero for every valid value-holding address.
    pub fn last_trit(&self) -> Trit {
        self.0[HASH_LENGTH - 1]
    }

    pub fn to_trytes(&self) -> String {
        trits::trits_to_trytes(&self.0)
    }

    /// Parses an 81-tryte string; `None` on bad length or alphabet.
    pub fn from_trytes(trytes: &str) -> Option<Self> {
        if trytes.len() != HASH_LENGTH / trits::TRYTE_WIDTH {
            return None;
        }
        let trits = trits::trytes_to_trits(trytes)?;
        let mut out = [0i8; HASH_LENGTH];
        out.copy_from_slice(&trits);
        Some(Hash(out))
    }
}

impl Default for Hash {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", &self.to_trytes()[..9])
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_trytes())
    }
}

/// An 81-trit tag field (tag, obsolete tag, nonce).
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag(#[serde_as(as = "[_; 81]")] pub [Trit; TAG_LENGTH]);

impl Tag {
    pub const NULL: Tag = Tag([0; TAG_LENGTH]);

    pub fn trits(&self) -> &[Trit; TAG_LENGTH] {
        &self.0
    }

    /// Encodes a small integer into the leading trits of an otherwise zero
    /// tag; used to stamp milestone candidate indices.
    pub fn from_index(index: u32) -> Self {
        let mut out = [0i8; TAG_LENGTH];
        let trits = trits::value_to_trits(i64::from(index), MILESTONE_INDEX_TRITS);
        out[..MILESTONE_INDEX_TRITS].copy_from_slice(&trits);
        Tag(out)
    }
}

impl Default for Tag {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({})", trits::trits_to_trytes(&self.0))
    }
}

/// Memoized bundle validation outcome, stored on tail transactions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Validity {
    #[default]
    Unknown,
    Valid,
    Invalid,
}

/// A transaction vertex of the DAG.
///
/// Immutable once stored except for `validity` (memoized bundle outcome,
/// meaningful on tails) and `snapshot_index` (the milestone index that
/// confirmed it; 0 while unconfirmed). Both are owned by the store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub hash: Hash,
    /// One-time signature fragment for spending transactions (`value < 0`);
    /// message payload or merkle sibling data otherwise.
    pub signature_or_message: Vec<Trit>,
    pub address: Hash,
    pub value: i64,
    pub obsolete_tag: Tag,
    pub timestamp: u64,
    pub current_index: u64,
    pub last_index: u64,
    pub bundle: Hash,
    pub trunk: Hash,
    pub branch: Hash,
    pub tag: Tag,
    pub attachment_timestamp: i64,
    pub attachment_timestamp_lower: i64,
    pub attachment_timestamp_upper: i64,
    pub nonce: Tag,
    pub validity: Validity,
    pub snapshot_index: u32,
}

impl Default for Transaction {
    fn default() -> Self {
        Self {
            hash: Hash::NULL,
            signature_or_message: vec![0; SIGNATURE_FRAGMENT_LENGTH],
            address: Hash::NULL,
            value: 0,
            obsolete_tag: Tag::NULL,
            timestamp: 0,
            current_index: 0,
            last_index: 0,
            bundle: Hash::NULL,
            trunk: Hash::NULL,
            branch: Hash::NULL,
            tag: Tag::NULL,
            attachment_timestamp: 0,
            attachment_timestamp_lower: 0,
            attachment_timestamp_upper: 0,
            nonce: Tag::NULL,
            validity: Validity::Unknown,
            snapshot_index: 0,
        }
    }
}

impl Transaction {
    /// A tail is the entry transaction of its bundle.
    pub fn is_tail(&self) -> bool {
        self.current_index == 0
    }

    /// The signed essence region, absorbed in index order to derive the
    /// bundle hash.
    pub fn essence(&self) -> Vec<Trit> {
        let mut out = Vec::with_capacity(ESSENCE_LENGTH);
        out.extend_from_slice(&self.address.0);
        out.extend(trits::value_to_trits(self.value, TAG_LENGTH));
        out.extend_from_slice(&self.obsolete_tag.0);
        out.extend(trits::value_to_trits(self.timestamp as i64, 27));
        out.extend(trits::value_to_trits(self.current_index as i64, 27));
        out.extend(trits::value_to_trits(self.last_index as i64, 27));
        debug_assert_eq!(out.len(), ESSENCE_LENGTH);
        out
    }

    /// The full serialized trit layout of the transaction.
    pub fn trits(&self) -> Vec<Trit> {
        let mut out = Vec::with_capacity(TRANSACTION_LENGTH);
        out.extend_from_slice(&self.signature_or_message);
        out.extend(self.essence());
        out.extend_from_slice(&self.bundle.0);
        out.extend_from_slice(&self.trunk.0);
        out.extend_from_slice(&self.branch.0);
        out.extend_from_slice(&self.tag.0);
        out.extend(trits::value_to_trits(self.attachment_timestamp, 27));
        out.extend(trits::value_to_trits(self.attachment_timestamp_lower, 27));
        out.extend(trits::value_to_trits(self.attachment_timestamp_upper, 27));
        out.extend_from_slice(&self.nonce.0);
        debug_assert_eq!(out.len(), TRANSACTION_LENGTH);
        out
    }

    /// The milestone index a coordinator candidate claims, decoded from the
    /// leading trits of its obsolete tag.
    pub fn milestone_index(&self) -> u32 {
        let value = trits::trits_to_value(&self.obsolete_tag.0[..MILESTONE_INDEX_TRITS]);
        value.clamp(0, i64::from(u32::MAX)) as u32
    }

    /// Unconfirmed means no milestone has referenced this transaction yet.
    pub fn is_confirmed(&self) -> bool {
        self.snapshot_index != 0
    }
}

/// A validated coordinator checkpoint: `index -> tail transaction hash`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub index: u32,
    pub hash: Hash,
}

impl Milestone {
    pub fn new(index: u32, hash: Hash) -> Self {
        Self { index, hash }
    }
}

/// Per-address balance changes implied by one milestone's referenced cone.
pub type StateDiff = HashMap<Hash, i64>;
