//! Secure randomness
//!
//! Every random value in the crate comes from a ChaCha generator seeded by the
//! operating system. A seeding failure is reported as
//! [`ProtocolError::Randomness`]; there is no fallback source.

use crate::error::{ProtocolError, Result};
use ark_ff::PrimeField;
use num_bigint::BigUint;
use rand::rngs::{OsRng, StdRng};
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};

/// Fresh generator seeded from the OS entropy source
pub fn secure_rng() -> Result<StdRng> {
    let mut seed = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut seed)
        .map_err(|e| ProtocolError::Randomness(e.to_string()))?;
    Ok(StdRng::from_seed(seed))
}

pub fn random_scalar<F: PrimeField, R: RngCore>(rng: &mut R) -> F {
    F::rand(rng)
}

pub fn random_nonzero_scalar<F: PrimeField, R: RngCore>(rng: &mut R) -> F {
    loop {
        let candidate = F::rand(rng);
        if !candidate.is_zero() {
            return candidate;
        }
    }
}

/// Uniform value in `[0, bound)`, reduced from 128 extra bits so the bias is negligible
pub fn random_below<R: RngCore>(bound: &BigUint, rng: &mut R) -> BigUint {
    let len = (bound.bits() as usize + 7) / 8 + 16;
    let mut bytes = vec![0u8; len];
    rng.fill_bytes(&mut bytes);
    BigUint::from_bytes_le(&bytes) % bound
}

/// Uniform value in `[1, bound)`
pub fn random_nonzero_below<R: RngCore>(bound: &BigUint, rng: &mut R) -> BigUint {
    loop {
        let candidate = random_below(bound, rng);
        if candidate > BigUint::from(0u8) {
            return candidate;
        }
    }
}

/// Uniformly random permutation of `0..n`
pub fn random_permutation<R: RngCore>(n: usize, rng: &mut R) -> Vec<usize> {
    let mut perm: Vec<usize> = (0..n).collect();
    perm.shuffle(rng);
    perm
}
