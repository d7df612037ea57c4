//! Fiat-Shamir transcript

use ark_bn254::Fr;
use ark_ff::PrimeField;
use ark_serialize::CanonicalSerialize;
use sha2::{Digest, Sha256};

#[derive(Clone)]
pub struct Transcript {
    hasher: Sha256,
}

impl Transcript {
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update((domain.len() as u64).to_le_bytes());
        hasher.update(domain);
        Self { hasher }
    }

    pub fn append<T: CanonicalSerialize>(&mut self, item: &T) {
        let mut bytes = Vec::new();
        item.serialize_compressed(&mut bytes)
            .expect("serializing into a Vec cannot fail");
        self.hasher.update(bytes);
    }

    pub fn append_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    pub fn challenge(&self) -> Fr {
        Fr::from_be_bytes_mod_order(&self.hasher.clone().finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::G1Affine;
    use ark_ec::AffineRepr;

    #[test]
    fn test_challenge_depends_on_everything() {
        let mut a = Transcript::new(b"t");
        a.append_u64(1);
        a.append(&G1Affine::generator());
        let mut b = Transcript::new(b"t");
        b.append_u64(2);
        b.append(&G1Affine::generator());
        assert_ne!(a.challenge(), b.challenge());
        assert_eq!(a.challenge(), a.clone().challenge());
        assert_ne!(Transcript::new(b"t").challenge(), Transcript::new(b"u").challenge());
    }
}
