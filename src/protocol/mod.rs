//! Matching protocol: chain construction, verification and the sliding-window engine

mod chain;
mod locator;
mod marker;
mod matching;
mod session;
mod verifier;

pub use chain::{
    ChainBuilder, EncryptedGenome, OpenedBoundaries, RangeChain, RangeWindow, WholeChain,
};
pub use locator::{IndexRange, RangeLocator};
pub use marker::{Marker, MarkerBuilder, QueryRange};
pub use matching::{MatchingEngine, MatchingMode};
pub use session::{
    DataOwner, OwnerPublic, PhaseTiming, ProtocolMode, Session, SessionReport, Tester,
};
pub use verifier::ChainVerifier;
