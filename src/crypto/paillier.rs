//! Paillier encryption over `Z*_{n^2}`
//!
//! `E(m) = g^m * r^n mod n^2` with `g = n + 1`. Unlike the ElGamal schemes the
//! key holder can decrypt in full; the zero test is a real decryption compared
//! against zero. Operations that act on ciphers work modulo `n^2`, which is
//! also the order exponents are drawn below.

use super::random::{random_nonzero_below, secure_rng};
use super::scheme::{HomomorphicScheme, SecretScheme};
use crate::error::{ProtocolError, Result};
use num_bigint::BigUint;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaillierCipher {
    pub c: BigUint,
}

pub struct Paillier {
    n: BigUint,
    n_squared: BigUint,
    g: BigUint,
    phi: BigUint,
    mu: BigUint,
    width: usize,
}

impl Paillier {
    pub const DEFAULT_KEY_BITS: usize = 2048;

    /// Fresh key with an RSA modulus of `key_bits` bits
    pub fn generate(key_bits: usize) -> Result<Self> {
        if key_bits < 256 || key_bits % 2 != 0 {
            return Err(ProtocolError::Config(format!(
                "paillier key size {} must be even and at least 256 bits",
                key_bits
            )));
        }
        let mut rng = secure_rng()?;
        let one = BigUint::from(1u8);
        loop {
            let p = glass_pumpkin::prime::from_rng(key_bits / 2, &mut rng)
                .map_err(|e| ProtocolError::Randomness(e.to_string()))?;
            let q = glass_pumpkin::prime::from_rng(key_bits / 2, &mut rng)
                .map_err(|e| ProtocolError::Randomness(e.to_string()))?;
            if p == q {
                continue;
            }
            let n = &p * &q;
            let phi = (&p - &one) * (&q - &one);
            // With g = n + 1, L(g^phi mod n^2) = phi mod n
            let Some(mu) = phi.modinv(&n) else {
                continue;
            };
            let n_squared = &n * &n;
            let width = (n_squared.bits() as usize + 7) / 8;
            return Ok(Self {
                g: &n + &one,
                n,
                n_squared,
                phi,
                mu,
                width,
            });
        }
    }

    pub fn modulus(&self) -> &BigUint {
        &self.n
    }

    /// `r^n mod n^2` for a fresh `r` in `[1, n)`
    fn blinding(&self) -> Result<BigUint> {
        let mut rng = secure_rng()?;
        let r = random_nonzero_below(&self.n, &mut rng);
        Ok(r.modpow(&self.n, &self.n_squared))
    }

    /// `None` for values outside `Z*_{n^2}`
    fn decrypt(&self, cipher: &PaillierCipher) -> Option<BigUint> {
        let one = BigUint::from(1u8);
        let u = cipher.c.modpow(&self.phi, &self.n_squared);
        if u < one {
            return None;
        }
        let l = (u - one) / &self.n;
        Some(l * &self.mu % &self.n)
    }
}

impl HomomorphicScheme for Paillier {
    type Cipher = PaillierCipher;

    fn name(&self) -> &'static str {
        "paillier"
    }

    fn encrypt(&self, plaintext: &BigUint) -> Result<PaillierCipher> {
        let gm = self.g.modpow(&(plaintext % &self.n), &self.n_squared);
        Ok(PaillierCipher {
            c: gm * self.blinding()? % &self.n_squared,
        })
    }

    /// `g^-m * r^n mod n^2`
    fn encrypt_inverse(&self, plaintext: &BigUint) -> Result<PaillierCipher> {
        let gm = self.g.modpow(&(plaintext % &self.n), &self.n_squared);
        let inverse = gm
            .modinv(&self.n_squared)
            .ok_or_else(|| ProtocolError::Config("g is not invertible modulo n^2".to_string()))?;
        Ok(PaillierCipher {
            c: inverse * self.blinding()? % &self.n_squared,
        })
    }

    fn mult_ciphers(&self, a: &PaillierCipher, b: &PaillierCipher) -> PaillierCipher {
        PaillierCipher {
            c: &a.c * &b.c % &self.n_squared,
        }
    }

    fn hide_cipher_with_r(&self, cipher: &PaillierCipher, r: &BigUint) -> PaillierCipher {
        PaillierCipher {
            c: cipher.c.modpow(r, &self.n_squared),
        }
    }

    fn invert_cipher(&self, cipher: &PaillierCipher) -> PaillierCipher {
        // A cipher sharing a factor with n would already expose the key; map it to itself
        let c = cipher
            .c
            .modinv(&self.n_squared)
            .unwrap_or_else(|| cipher.c.clone());
        PaillierCipher { c }
    }

    fn group_order(&self) -> BigUint {
        self.n_squared.clone()
    }

    fn cipher_bytes(&self, cipher: &PaillierCipher) -> Vec<u8> {
        let bytes = cipher.c.to_bytes_be();
        let mut out = Vec::with_capacity(self.width);
        out.extend(std::iter::repeat(0u8).take(self.width.saturating_sub(bytes.len())));
        out.extend_from_slice(&bytes);
        out
    }
}

impl SecretScheme for Paillier {
    fn setup() -> Result<Self> {
        Self::generate(Self::DEFAULT_KEY_BITS)
    }

    fn is_zero(&self, cipher: &PaillierCipher) -> bool {
        self.decrypt(cipher) == Some(BigUint::from(0u8))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY_BITS: usize = 512;

    #[test]
    fn test_paillier_key_shape() {
        let scheme = Paillier::generate(TEST_KEY_BITS).unwrap();
        assert!(scheme.modulus().bits() >= TEST_KEY_BITS as u64 - 1);
        assert_eq!(scheme.group_order(), scheme.modulus() * scheme.modulus());
        assert!(Paillier::generate(128).is_err());
        assert!(Paillier::generate(513).is_err());
    }

    #[test]
    fn test_paillier_decrypts() {
        let scheme = Paillier::generate(TEST_KEY_BITS).unwrap();
        let c = scheme.encrypt_u64(1234).unwrap();
        assert_eq!(scheme.decrypt(&c), Some(BigUint::from(1234u32)));

        let sum = scheme.mult_ciphers(&c, &scheme.encrypt_u64(66).unwrap());
        assert_eq!(scheme.decrypt(&sum), Some(BigUint::from(1300u32)));
        let scaled = scheme.hide_cipher_with_r(&c, &BigUint::from(3u8));
        assert_eq!(scheme.decrypt(&scaled), Some(BigUint::from(3702u32)));

        let minus = scheme.encrypt_inverse(&BigUint::from(34u8)).unwrap();
        assert_eq!(
            scheme.decrypt(&scheme.mult_ciphers(&c, &minus)),
            Some(BigUint::from(1200u32))
        );
        assert!(!scheme.is_zero(&PaillierCipher { c: BigUint::from(0u8) }));
    }

    #[test]
    fn test_paillier_homomorphism() {
        let scheme = Paillier::generate(TEST_KEY_BITS).unwrap();
        let digest = [0x5a; 32];

        let zero = scheme.encrypt_u64(0).unwrap();
        assert!(scheme.is_zero(&zero));

        let a = scheme.encrypt_digest(&digest).unwrap();
        assert!(!scheme.is_zero(&a));
        let minus_a = scheme.encrypt_inverse_digest(&digest).unwrap();
        let sum = scheme.mult_ciphers(&a, &minus_a);
        assert!(scheme.is_zero(&sum));
        assert!(scheme.is_zero(&scheme.hide_cipher_with_r(&sum, &BigUint::from(99u8))));
        assert!(scheme.is_zero(&scheme.rerandomize(&sum).unwrap()));
        assert!(!scheme.is_zero(&scheme.rerandomize(&a).unwrap()));

        let inverted = scheme.invert_cipher(&a);
        assert!(scheme.is_zero(&scheme.mult_ciphers(&a, &inverted)));
        assert!(!scheme.is_zero(&scheme.mult_ciphers(&a, &a)));
    }

    #[test]
    fn test_paillier_encryption_is_randomized() {
        let scheme = Paillier::generate(TEST_KEY_BITS).unwrap();
        let a = scheme.encrypt_u64(7).unwrap();
        let b = scheme.encrypt_u64(7).unwrap();
        assert_ne!(a, b);
        assert_eq!(scheme.cipher_bytes(&a).len(), scheme.cipher_bytes(&b).len());
        assert_eq!(scheme.cipher_bytes(&a).len(), (scheme.group_order().bits() as usize + 7) / 8);
    }
}
