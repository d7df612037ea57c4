//! Protocol configuration
//!
//! The universe bound is a plain value handed to the chain builder, the range
//! locator and the marker builder when they are constructed.

use crate::error::{ProtocolError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest genome position considered by default (human genome, rounded up)
pub const DEFAULT_UNIVERSE_SIZE: u32 = 3_200_000_000;

/// Slack added to the upper range-proof bound above the upper sentinel
pub const UPPER_PROOF_SLACK: u64 = 10;

/// The declared universe of genome positions `[1, max_position]`
///
/// Serialized as the bare `max_position`; deserialization goes through
/// [`Universe::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Universe {
    max_position: u32,
}

impl Universe {
    pub fn new(max_position: u32) -> Result<Self> {
        if max_position == 0 || max_position == u32::MAX {
            return Err(ProtocolError::Config(format!(
                "universe size {} leaves no room for the sentinels",
                max_position
            )));
        }
        Ok(Self { max_position })
    }

    pub fn max_position(&self) -> u32 {
        self.max_position
    }

    /// Position of the lower sentinel entry
    pub fn lower_sentinel(&self) -> u32 {
        0
    }

    /// Position of the upper sentinel entry, always beyond every real position
    pub fn upper_sentinel(&self) -> u32 {
        self.max_position + 1
    }

    pub fn contains(&self, position: u32) -> bool {
        position >= 1 && position <= self.max_position
    }

    /// `[min - pad, max + pad]` clipped to `[1, max_position]`
    pub fn padded_range(&self, min: u32, max: u32, pad: u32) -> (u32, u32) {
        let start = min.saturating_sub(pad).max(1);
        let end = max.saturating_add(pad).min(self.max_position);
        (start, end)
    }
}

impl TryFrom<u32> for Universe {
    type Error = ProtocolError;

    fn try_from(max_position: u32) -> Result<Self> {
        Universe::new(max_position)
    }
}

impl From<Universe> for u32 {
    fn from(universe: Universe) -> u32 {
        universe.max_position
    }
}

impl Default for Universe {
    fn default() -> Self {
        Self {
            max_position: DEFAULT_UNIVERSE_SIZE,
        }
    }
}

/// Which range-proof system backs the boundary proofs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeProofKind {
    /// Bit decomposition with per-bit OR proofs
    BitDecomposition,
    /// Camenisch-Chaabouni-shelat signature-based u-ary proofs
    Ccs08,
}

impl RangeProofKind {
    pub fn name(&self) -> &str {
        match self {
            RangeProofKind::BitDecomposition => "bit-decomposition",
            RangeProofKind::Ccs08 => "ccs08",
        }
    }
}

impl std::str::FromStr for RangeProofKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "bits" | "bit-decomposition" => Ok(RangeProofKind::BitDecomposition),
            "ccs08" => Ok(RangeProofKind::Ccs08),
            other => Err(ProtocolError::Config(format!(
                "unknown range proof system '{}'",
                other
            ))),
        }
    }
}

/// Tunables shared by both parties of a matching session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Largest valid genome position
    pub universe_size: u32,
    /// Padding applied around the verifier's query range
    pub security_param: u32,
    /// Use the incremental sliding-window engine
    pub optimized: bool,
    /// Boundary proof system for range-proved sessions
    pub range_proof: RangeProofKind,
    /// Digit base for CCS08 proofs
    pub ccs08_base: u64,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            universe_size: DEFAULT_UNIVERSE_SIZE,
            security_param: 0,
            optimized: true,
            range_proof: RangeProofKind::BitDecomposition,
            ccs08_base: 16,
        }
    }
}

impl ProtocolConfig {
    pub fn validate(&self) -> Result<()> {
        Universe::new(self.universe_size)?;
        if self.ccs08_base < 2 {
            return Err(ProtocolError::Config(format!(
                "ccs08 digit base must be at least 2, got {}",
                self.ccs08_base
            )));
        }
        Ok(())
    }

    pub fn universe(&self) -> Result<Universe> {
        Universe::new(self.universe_size)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .map_err(|e| ProtocolError::Config(format!("{}: {}", path.display(), e)))?;
        let config: ProtocolConfig = serde_json::from_str(&data)
            .map_err(|e| ProtocolError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = self.to_json()?;
        std::fs::write(path.as_ref(), json)
            .map_err(|e| ProtocolError::Config(format!("{}: {}", path.as_ref().display(), e)))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| ProtocolError::Config(e.to_string()))
    }
}
