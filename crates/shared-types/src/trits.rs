//! Balanced-ternary primitives.
//!
//! Everything on the wire and in hashes is a sequence of trits in
//! `{-1, 0, 1}`; trytes are the human-readable base-27 grouping of three
//! trits.

/// A single balanced trit: -1, 0 or 1.
pub type Trit = i8;

/// Trits per tryte.
pub const TRYTE_WIDTH: usize = 3;

/// The tryte alphabet; index 0 is `9`, indices 1..27 are `A`..`Z`.
pub const TRYTE_ALPHABET: &str = "9ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Encodes a signed integer as `length` balanced trits, little-endian.
pub fn value_to_trits(value: i64, length: usize) -> Vec<Trit> {
    let mut out = vec![0i8; length];
    let mut value = value;
    for trit in out.iter_mut().take(length) {
        let mut rem = value % 3;
        value /= 3;
        if rem > 1 {
            rem -= 3;
            value += 1;
        }
        if rem < -1 {
            rem += 3;
            value -= 1;
        }
        *trit = rem as Trit;
    }
    out
}

/// Decodes little-endian balanced trits into a signed integer.
pub fn trits_to_value(trits: &[Trit]) -> i64 {
    let mut value = 0i64;
    for &trit in trits.iter().rev() {
        value = value * 3 + i64::from(trit);
    }
    value
}

/// Increments a trit sequence in place (little-endian, wrapping per trit).
pub fn increment(trits: &mut [Trit]) {
    for trit in trits.iter_mut() {
        *trit += 1;
        if *trit > 1 {
            *trit = -1;
        } else {
            break;
        }
    }
}

/// Renders trits as trytes; the length must be a multiple of [`TRYTE_WIDTH`].
pub fn trits_to_trytes(trits: &[Trit]) -> String {
    debug_assert_eq!(trits.len() % TRYTE_WIDTH, 0);
    let alphabet = TRYTE_ALPHABET.as_bytes();
    trits
        .chunks(TRYTE_WIDTH)
        .map(|chunk| {
            let value =
                i32::from(chunk[0]) + i32::from(chunk[1]) * 3 + i32::from(chunk[2]) * 9;
            alphabet[value.rem_euclid(27) as usize] as char
        })
        .collect()
}

/// Parses trytes back into trits; `None` on characters outside the alphabet.
pub fn trytes_to_trits(trytes: &str) -> Option<Vec<Trit>> {
    let mut out = Vec::with_capacity(trytes.len() * TRYTE_WIDTH);
    for ch in trytes.chars() {
        let index = TRYTE_ALPHABET.find(ch)? as i64;
        let value = if index > 13 { index - 27 } else { index };
        out.extend(value_to_trits(value, TRYTE_WIDTH));
    }
    Some(out)
}
