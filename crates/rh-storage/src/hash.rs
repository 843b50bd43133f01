//! State fingerprints for logs and tests

use sha1::{Digest, Sha1};

/// SHA-1 of a state blob as lowercase hex
pub fn state_hash(data: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
