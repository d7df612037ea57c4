//! Commitments and zero-knowledge range proofs
//!
//! - Pedersen commitments bind range-mode chain entries to hidden positions
//! - Range proofs show a boundary position lies outside the queried range
//!   without opening it

mod bits;
mod ccs08;
mod commitment;
mod range_proof;
mod transcript;

pub use bits::{BitProof, BitRangeProof};
pub use ccs08::{Ccs08, Ccs08Proof};
pub use commitment::{Commitment, PedersenParams, Salt};
pub use range_proof::RangeProofSystem;
pub use transcript::Transcript;
