//! Time-ordered record identifiers.
//!
//! # Responsibility
//! - Generate the 18-character primary identifiers used by every table.
//! - Validate identifier shape at the persistence boundary.
//!
//! # Invariants
//! - Output length is always `ID_LEN`.
//! - Output only contains `ID_ALPHABET` symbols.
//! - The leading symbols encode Unix milliseconds, most significant first,
//!   so ids of equal time-prefix width sort by creation time.
//!
//! # Known limitation
//! - A millisecond value whose encoding exceeds `ID_LEN` symbols keeps only
//!   its first `ID_LEN` symbols. Ordering between such ids is lost.

use rand::Rng;
use std::time::{SystemTime, UNIX_EPOCH};

/// Fixed identifier width stored in `CHAR(18)` columns.
pub const ID_LEN: usize = 18;

/// Base-32 symbols without the ambiguous `I`, `L`, `O` and `U`.
pub const ID_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Stable primary identifier shared by all entities.
pub type RecordId = String;

/// Generates a new identifier from the system clock and thread-local RNG.
///
/// Uniqueness is not checked here; duplicate ids surface as primary-key
/// violations when persisted.
pub fn generate_id() -> RecordId {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or(0);
    generate_id_at(millis, &mut rand::thread_rng())
}

/// Builds an identifier for a given millisecond timestamp.
pub fn generate_id_at<R: Rng + ?Sized>(millis: u128, rng: &mut R) -> RecordId {
    let mut id = encode_base32(millis);
    id.truncate(ID_LEN);
    while id.len() < ID_LEN {
        let index = rng.gen_range(0..ID_ALPHABET.len());
        id.push(char::from(ID_ALPHABET[index]));
    }
    id
}

/// Encodes a value in base 32, most significant symbol first, no padding.
pub fn encode_base32(mut value: u128) -> String {
    if value == 0 {
        return "0".to_string();
    }

    let mut symbols = Vec::new();
    while value > 0 {
        symbols.push(ID_ALPHABET[(value % 32) as usize]);
        value /= 32;
    }
    symbols.reverse();
    symbols.into_iter().map(char::from).collect()
}

/// Returns whether `value` has identifier shape.
pub fn is_valid_id(value: &str) -> bool {
    value.len() == ID_LEN && value.bytes().all(|byte| ID_ALPHABET.contains(&byte))
}
