//! Pedersen commitments to chain positions
//!
//! `commit(pos, salt) = pos·G + salt·H` on BN254 G1. `H` is derived from a
//! public tag by hashing to a curve x-coordinate, so nobody knows `log_G(H)`.

use ark_bn254::{Fq, Fr, G1Affine, G1Projective};
use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::PrimeField;
use ark_serialize::CanonicalSerialize;
use sha2::{Digest, Sha256};

/// Blinding factor of a commitment
pub type Salt = Fr;

const GENERATOR_TAG: &[u8] = b"sphpsm/pedersen/h";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Commitment(G1Affine);

impl Commitment {
    pub fn from_point(point: G1Projective) -> Self {
        Commitment(point.into_affine())
    }

    pub fn point(&self) -> G1Affine {
        self.0
    }

    /// Compressed point encoding, 32 bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(32);
        self.0
            .serialize_compressed(&mut out)
            .expect("serializing into a Vec cannot fail");
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PedersenParams {
    g: G1Affine,
    h: G1Affine,
}

impl PedersenParams {
    pub fn new() -> Self {
        Self {
            g: G1Affine::generator(),
            h: derive_generator(GENERATOR_TAG),
        }
    }

    pub fn g(&self) -> G1Affine {
        self.g
    }

    pub fn h(&self) -> G1Affine {
        self.h
    }

    pub fn commit(&self, value: u64, salt: &Salt) -> Commitment {
        self.commit_scalar(&Fr::from(value), salt)
    }

    pub fn commit_scalar(&self, value: &Fr, salt: &Salt) -> Commitment {
        Commitment::from_point(self.g * value + self.h * salt)
    }

    /// Check that `commitment` opens to `value` under `salt`
    pub fn open(&self, commitment: &Commitment, value: u64, salt: &Salt) -> bool {
        self.commit(value, salt) == *commitment
    }
}

impl Default for PedersenParams {
    fn default() -> Self {
        Self::new()
    }
}

/// Try-and-increment: hash `tag ‖ counter` to x until it lands on the curve
fn derive_generator(tag: &[u8]) -> G1Affine {
    let mut counter: u32 = 0;
    loop {
        let mut hasher = Sha256::new();
        hasher.update(tag);
        hasher.update(counter.to_le_bytes());
        let x = Fq::from_be_bytes_mod_order(&hasher.finalize());
        if let Some(point) = G1Affine::get_point_from_x_unchecked(x, false) {
            let point = point.clear_cofactor();
            if !point.is_zero() {
                return point;
            }
        }
        counter += 1;
    }
}
