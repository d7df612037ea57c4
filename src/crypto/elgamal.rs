//! Exponential ElGamal over a prime-order elliptic curve group
//!
//! `E(m) = (g^k, y^k * g^m)`. Decryption would need a discrete log, but the
//! protocol only asks whether `m = 0`, which is `c2 == c1^x`.

use super::random::{random_nonzero_scalar, secure_rng};
use super::scheme::{HomomorphicScheme, SecretScheme};
use crate::error::Result;
use ark_ec::CurveGroup;
use ark_ff::{BigInteger, PrimeField};
use ark_serialize::CanonicalSerialize;
use num_bigint::BigUint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurveCipher<G: CurveGroup> {
    pub c1: G,
    pub c2: G,
}

pub struct CurveElGamal<G: CurveGroup> {
    generator: G,
    public_key: G,
    secret_key: G::ScalarField,
}

/// ElGamal on the BN254 G1 group
pub type Bn254ElGamal = CurveElGamal<ark_bn254::G1Projective>;

/// ElGamal on the BLS12-381 G1 group
pub type Bls12ElGamal = CurveElGamal<ark_bls12_381::G1Projective>;

impl<G: CurveGroup> CurveElGamal<G> {
    pub fn public_key(&self) -> G {
        self.public_key
    }

    fn to_scalar(value: &BigUint) -> G::ScalarField {
        G::ScalarField::from_le_bytes_mod_order(&value.to_bytes_le())
    }

    fn encrypt_scalar(&self, m: G::ScalarField) -> Result<CurveCipher<G>> {
        let mut rng = secure_rng()?;
        let k: G::ScalarField = random_nonzero_scalar(&mut rng);
        Ok(CurveCipher {
            c1: self.generator * k,
            c2: self.public_key * k + self.generator * m,
        })
    }
}

impl<G: CurveGroup> HomomorphicScheme for CurveElGamal<G> {
    type Cipher = CurveCipher<G>;

    fn name(&self) -> &'static str {
        "ec-elgamal"
    }

    fn encrypt(&self, plaintext: &BigUint) -> Result<Self::Cipher> {
        self.encrypt_scalar(Self::to_scalar(plaintext))
    }

    fn encrypt_inverse(&self, plaintext: &BigUint) -> Result<Self::Cipher> {
        self.encrypt_scalar(-Self::to_scalar(plaintext))
    }

    fn mult_ciphers(&self, a: &Self::Cipher, b: &Self::Cipher) -> Self::Cipher {
        CurveCipher {
            c1: a.c1 + b.c1,
            c2: a.c2 + b.c2,
        }
    }

    fn hide_cipher_with_r(&self, cipher: &Self::Cipher, r: &BigUint) -> Self::Cipher {
        let r = Self::to_scalar(r);
        CurveCipher {
            c1: cipher.c1 * r,
            c2: cipher.c2 * r,
        }
    }

    fn invert_cipher(&self, cipher: &Self::Cipher) -> Self::Cipher {
        CurveCipher {
            c1: -cipher.c1,
            c2: -cipher.c2,
        }
    }

    fn group_order(&self) -> BigUint {
        BigUint::from_bytes_le(&G::ScalarField::MODULUS.to_bytes_le())
    }

    fn cipher_bytes(&self, cipher: &Self::Cipher) -> Vec<u8> {
        let points = G::normalize_batch(&[cipher.c1, cipher.c2]);
        let mut out = Vec::with_capacity(2 * points[0].compressed_size());
        for point in &points {
            point
                .serialize_compressed(&mut out)
                .expect("serializing into a Vec cannot fail");
        }
        out
    }
}

impl<G: CurveGroup> SecretScheme for CurveElGamal<G> {
    fn setup() -> Result<Self> {
        let mut rng = secure_rng()?;
        let secret_key: G::ScalarField = random_nonzero_scalar(&mut rng);
        let generator = G::generator();
        Ok(Self {
            generator,
            public_key: generator * secret_key,
            secret_key,
        })
    }

    fn is_zero(&self, cipher: &Self::Cipher) -> bool {
        cipher.c1 * self.secret_key == cipher.c2
    }
}
