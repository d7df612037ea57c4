//! Digests shared by the data owner and the verifier
//!
//! Positions are encoded little-endian. Cipher encodings are fixed width per
//! scheme, so plain concatenation is unambiguous.

use crate::genome::Base;
use crate::zk::Commitment;
use sha2::{Digest, Sha256};

pub type Digest32 = [u8; 32];

/// `Hash(position ‖ base)`: the plaintext every base is encrypted under
pub fn position_base_digest(position: u32, base: &Base) -> Digest32 {
    let mut hasher = Sha256::new();
    hasher.update(position.to_le_bytes());
    hasher.update(base.to_bytes());
    hasher.finalize().into()
}

/// `Hash(position ‖ cipher)`: signed per entry in whole mode
pub fn position_cipher_digest(position: u32, cipher_bytes: &[u8]) -> Digest32 {
    let mut hasher = Sha256::new();
    hasher.update(position.to_le_bytes());
    hasher.update(cipher_bytes);
    hasher.finalize().into()
}

/// `Hash(com_i ‖ cipher_i ‖ com_i+1 ‖ cipher_i+1)`: signed per adjacent pair in range mode
pub fn tuple_digest(
    commitment: &Commitment,
    cipher_bytes: &[u8],
    next_commitment: &Commitment,
    next_cipher_bytes: &[u8],
) -> Digest32 {
    let mut hasher = Sha256::new();
    hasher.update(commitment.to_bytes());
    hasher.update(cipher_bytes);
    hasher.update(next_commitment.to_bytes());
    hasher.update(next_cipher_bytes);
    hasher.finalize().into()
}
