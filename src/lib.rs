//! SPH-PSM: size- and position-hiding private substring matching
//!
//! A data owner publishes its genome as an authenticated chain of additively
//! homomorphic ciphers. A tester holding a private query checks the chain,
//! slides its encrypted marker along the candidates and hands back one cipher
//! per alignment, padded and shuffled so the owner learns only whether some
//! alignment matched.

pub mod config;
pub mod crypto;
pub mod error;
pub mod genome;
pub mod protocol;
pub mod zk;

pub use config::{ProtocolConfig, RangeProofKind, Universe};
pub use crypto::{
    Bls12ElGamal, Bn254ElGamal, HomomorphicScheme, ModpElGamal, Paillier, PublicScheme, SecretScheme,
};
pub use error::{ProtocolError, Result, VerificationFailure};
pub use genome::Base;
pub use protocol::{ProtocolMode, Session, SessionReport};
