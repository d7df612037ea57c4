//! HomomorphicScheme: the pluggable additively homomorphic encryption contract
//!
//! The protocol is written once against these traits. Implementations decide
//! how a cipher looks inside; the protocol only combines ciphers through these
//! operations and hashes their canonical encoding.
//!
//! [`HomomorphicScheme`] carries everything a party may do with the public key.
//! [`SecretScheme`] adds key generation and the zero test, which only the key
//! holder runs. The tester is handed a [`PublicScheme`], which exposes the
//! first and not the second.

use super::random::{random_nonzero_below, secure_rng};
use crate::error::Result;
use num_bigint::BigUint;
use std::fmt;
use std::sync::Arc;

pub trait HomomorphicScheme: Send + Sync {
    type Cipher: Clone + PartialEq + fmt::Debug + Send + Sync;

    fn name(&self) -> &'static str;

    /// `E(m)`
    fn encrypt(&self, plaintext: &BigUint) -> Result<Self::Cipher>;

    /// `E(-m)`
    fn encrypt_inverse(&self, plaintext: &BigUint) -> Result<Self::Cipher>;

    /// `E(m1) * E(m2) = E(m1 + m2)`
    fn mult_ciphers(&self, a: &Self::Cipher, b: &Self::Cipher) -> Self::Cipher;

    /// `E(m)^r = E(m * r)`
    fn hide_cipher_with_r(&self, cipher: &Self::Cipher, r: &BigUint) -> Self::Cipher;

    /// `E(m)^-1 = E(-m)`
    fn invert_cipher(&self, cipher: &Self::Cipher) -> Self::Cipher;

    fn group_order(&self) -> BigUint;

    /// Fixed-width canonical encoding used inside signed digests
    fn cipher_bytes(&self, cipher: &Self::Cipher) -> Vec<u8>;

    fn encrypt_u64(&self, value: u64) -> Result<Self::Cipher> {
        self.encrypt(&BigUint::from(value))
    }

    /// Encrypt a big-endian digest
    fn encrypt_digest(&self, digest: &[u8]) -> Result<Self::Cipher> {
        self.encrypt(&BigUint::from_bytes_be(digest))
    }

    fn encrypt_inverse_digest(&self, digest: &[u8]) -> Result<Self::Cipher> {
        self.encrypt_inverse(&BigUint::from_bytes_be(digest))
    }

    /// Scale by a fresh exponent drawn uniformly from `[1, order)`
    fn rerandomize(&self, cipher: &Self::Cipher) -> Result<Self::Cipher> {
        let mut rng = secure_rng()?;
        let r = random_nonzero_below(&self.group_order(), &mut rng);
        Ok(self.hide_cipher_with_r(cipher, &r))
    }
}

/// Key holder's side of a scheme
pub trait SecretScheme: HomomorphicScheme {
    /// Generate keys and any public parameters
    fn setup() -> Result<Self>
    where
        Self: Sized;

    /// Whether the cipher encrypts zero; the only decryption-like oracle
    fn is_zero(&self, cipher: &Self::Cipher) -> bool;
}

/// Encryption-only handle on a key holder's scheme
pub struct PublicScheme<S> {
    inner: Arc<S>,
}

impl<S: SecretScheme> PublicScheme<S> {
    pub fn new(inner: Arc<S>) -> Self {
        Self { inner }
    }
}

impl<S> Clone for PublicScheme<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: SecretScheme> HomomorphicScheme for PublicScheme<S> {
    type Cipher = S::Cipher;

    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn encrypt(&self, plaintext: &BigUint) -> Result<S::Cipher> {
        self.inner.encrypt(plaintext)
    }

    fn encrypt_inverse(&self, plaintext: &BigUint) -> Result<S::Cipher> {
        self.inner.encrypt_inverse(plaintext)
    }

    fn mult_ciphers(&self, a: &S::Cipher, b: &S::Cipher) -> S::Cipher {
        self.inner.mult_ciphers(a, b)
    }

    fn hide_cipher_with_r(&self, cipher: &S::Cipher, r: &BigUint) -> S::Cipher {
        self.inner.hide_cipher_with_r(cipher, r)
    }

    fn invert_cipher(&self, cipher: &S::Cipher) -> S::Cipher {
        self.inner.invert_cipher(cipher)
    }

    fn group_order(&self) -> BigUint {
        self.inner.group_order()
    }

    fn cipher_bytes(&self, cipher: &S::Cipher) -> Vec<u8> {
        self.inner.cipher_bytes(cipher)
    }

    fn rerandomize(&self, cipher: &S::Cipher) -> Result<S::Cipher> {
        self.inner.rerandomize(cipher)
    }
}
