//! Owner signatures over chain entries
//!
//! ECDSA over secp256k1. The owner signs 32-byte digests directly as prehashes;
//! every digest in the crate is already SHA-256 output.

use super::digest::Digest32;
use super::random::secure_rng;
use crate::error::{ProtocolError, Result};
use k256::ecdsa::signature::hazmat::{PrehashVerifier, RandomizedPrehashSigner};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};

/// Signature attached to one chain entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainSignature(Signature);

impl ChainSignature {
    pub fn r_bytes(&self) -> [u8; 32] {
        let (r, _) = self.0.split_bytes();
        r.into()
    }

    pub fn s_bytes(&self) -> [u8; 32] {
        let (_, s) = self.0.split_bytes();
        s.into()
    }
}

/// Signing half of the owner's key pair, never leaves the owner
pub struct OwnerKey {
    signing: SigningKey,
}

impl OwnerKey {
    pub fn generate() -> Result<Self> {
        let mut rng = secure_rng()?;
        Ok(Self {
            signing: SigningKey::random(&mut rng),
        })
    }

    pub fn verifying_key(&self) -> OwnerVerifyingKey {
        OwnerVerifyingKey(self.signing.verifying_key().clone())
    }

    pub fn sign(&self, digest: &Digest32) -> Result<ChainSignature> {
        let mut rng = secure_rng()?;
        let signature: Signature = self
            .signing
            .sign_prehash_with_rng(&mut rng, digest)
            .map_err(|e| ProtocolError::Signing(e.to_string()))?;
        Ok(ChainSignature(signature))
    }
}

/// Public verification key published to testers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerVerifyingKey(VerifyingKey);

impl OwnerVerifyingKey {
    pub fn verify(&self, digest: &Digest32, signature: &ChainSignature) -> bool {
        self.0.verify_prehash(digest, &signature.0).is_ok()
    }

    pub fn to_sec1_hex(&self) -> String {
        hex::encode(self.0.to_encoded_point(true).as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let key = OwnerKey::generate().unwrap();
        let public = key.verifying_key();
        let digest = [7u8; 32];
        let sig = key.sign(&digest).unwrap();
        assert!(public.verify(&digest, &sig));

        let mut other = digest;
        other[0] ^= 1;
        assert!(!public.verify(&other, &sig));
    }

    #[test]
    fn test_foreign_key_rejected() {
        let key = OwnerKey::generate().unwrap();
        let stranger = OwnerKey::generate().unwrap().verifying_key();
        let digest = [1u8; 32];
        let sig = key.sign(&digest).unwrap();
        assert!(!stranger.verify(&digest, &sig));
        assert_eq!(key.verifying_key().to_sec1_hex().len(), 66);
    }

    #[test]
    fn test_signature_components_nonzero() {
        let key = OwnerKey::generate().unwrap();
        let sig = key.sign(&[9u8; 32]).unwrap();
        assert_ne!(sig.r_bytes(), [0u8; 32]);
        assert_ne!(sig.s_bytes(), [0u8; 32]);
    }
}
