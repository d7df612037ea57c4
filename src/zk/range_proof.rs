//! Range proofs over committed positions
//!
//! A system is set up for a half-open interval `[lower, upper)`. The prover
//! knows the opening of a Pedersen commitment and shows the committed value
//! falls inside the interval; the commitment travels inside the proof so the
//! verifier can bind it to a chain boundary.

use super::commitment::{Commitment, PedersenParams, Salt};
use crate::config::ProtocolConfig;
use crate::error::Result;
use std::fmt;

pub trait RangeProofSystem: Send + Sync + Sized {
    type Proof: Clone + fmt::Debug + Send + Sync;

    fn setup(params: &PedersenParams, lower: u64, upper: u64, config: &ProtocolConfig)
        -> Result<Self>;

    fn name(&self) -> &'static str;

    fn lower(&self) -> u64;

    fn upper(&self) -> u64;

    /// Fails with `Proving` when `secret` lies outside `[lower, upper)`
    fn prove(&self, secret: u64, blinding: &Salt) -> Result<Self::Proof>;

    fn verify(&self, proof: &Self::Proof) -> bool;

    /// The commitment the proof speaks about
    fn commitment(proof: &Self::Proof) -> Commitment;
}
