//! Base: one genome position and its symbol

use crate::error::{ProtocolError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Symbol carried by the synthetic boundary entries of a range-mode chain
pub const SENTINEL_SYMBOL: u8 = b'Z';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Base {
    pub position: u32,
    pub symbol: u8,
}

impl Base {
    pub fn new(position: u32, symbol: u8) -> Self {
        Self { position, symbol }
    }

    /// Boundary entry used at both ends of a range-mode chain
    pub fn sentinel(position: u32) -> Self {
        Self::new(position, SENTINEL_SYMBOL)
    }

    /// Little-endian position followed by the symbol byte
    pub fn to_bytes(&self) -> [u8; 5] {
        let p = self.position.to_le_bytes();
        [p[0], p[1], p[2], p[3], self.symbol]
    }
}

impl fmt::Display for Base {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.position, self.symbol as char)
    }
}

/// Reject datasets whose positions are not strictly increasing
pub fn ensure_strictly_increasing(bases: &[Base]) -> Result<()> {
    for (i, pair) in bases.windows(2).enumerate() {
        if pair[1].position <= pair[0].position {
            return Err(ProtocolError::InvalidDataset(format!(
                "position {} at index {} does not follow {}",
                pair[1].position,
                i + 1,
                pair[0].position
            )));
        }
    }
    Ok(())
}
