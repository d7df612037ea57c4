//! Cryptographic capabilities consumed by the protocol
//!
//! - **scheme**: the pluggable additively homomorphic encryption contract
//! - **elgamal** / **modp**: exponential ElGamal over curves and over a MODP group
//! - **paillier**: Paillier encryption, the one scheme with full decryption
//! - **signing**: ECDSA signatures authenticating chain entries
//! - **digest**: the SHA-256 digests every party must agree on
//! - **random**: OS-seeded randomness that fails loudly

pub mod digest;
pub mod elgamal;
pub mod modp;
pub mod paillier;
pub mod random;
pub mod scheme;
pub mod signing;

pub use elgamal::{Bls12ElGamal, Bn254ElGamal, CurveCipher, CurveElGamal};
pub use modp::{ModpCipher, ModpElGamal};
pub use paillier::{Paillier, PaillierCipher};
pub use scheme::{HomomorphicScheme, PublicScheme, SecretScheme};
pub use signing::{ChainSignature, OwnerKey, OwnerVerifyingKey};
