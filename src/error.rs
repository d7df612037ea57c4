//! Protocol errors
//!
//! Every failure is fail-stop: an operation either returns its full result or
//! one of these errors. Nothing in the crate retries a failed verification.

use std::fmt;
use thiserror::Error;

/// Which end of a range-mode window a piece of boundary evidence refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Lower,
    Upper,
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Boundary::Lower => write!(f, "lower"),
            Boundary::Upper => write!(f, "upper"),
        }
    }
}

/// Cryptographic evidence that did not check out
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationFailure {
    #[error("signature over entry {index} does not verify")]
    Signature { index: usize },

    #[error("{0} boundary commitment does not open to the claimed position")]
    BoundaryCommitment(Boundary),

    #[error("{0} boundary range proof rejected")]
    RangeProof(Boundary),

    #[error("{0} boundary range proof is not bound to the window commitment")]
    UnboundProof(Boundary),

    #[error("window shape mismatch: {0}")]
    WindowShape(String),
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Verification failed, aborting: {0}")]
    Verification(#[from] VerificationFailure),

    #[error("Range violation: {0}")]
    RangeViolation(String),

    #[error("Secure randomness unavailable: {0}")]
    Randomness(String),

    #[error("Marker of {marker} bases is longer than the candidate window of {window}")]
    AlignmentUnderflow { marker: usize, window: usize },

    #[error("Queried range [{start}, {end}] holds no chain entries")]
    NoOverlap { start: u32, end: u32 },

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Range proof generation failed: {0}")]
    Proving(String),

    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ProtocolError>;

impl ProtocolError {
    /// True for failures caused by evidence supplied by the other party
    pub fn is_verification_failure(&self) -> bool {
        matches!(self, ProtocolError::Verification(_))
    }
}
