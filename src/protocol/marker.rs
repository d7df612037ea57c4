//! Marker construction (verifier side)

use crate::config::Universe;
use crate::crypto::digest::position_base_digest;
use crate::crypto::HomomorphicScheme;
use crate::error::{ProtocolError, Result};
use crate::genome::{ensure_strictly_increasing, Base};
use rayon::prelude::*;

/// Inclusive position range the verifier asks the owner to cover
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryRange {
    pub start: u32,
    pub end: u32,
}

/// The verifier's query, each base encrypted as `E(-Hash(position ‖ base))`
#[derive(Debug, Clone)]
pub struct Marker<C> {
    ciphers: Vec<C>,
    positions: Vec<u32>,
    range: QueryRange,
}

impl<C> Marker<C> {
    pub fn len(&self) -> usize {
        self.ciphers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ciphers.is_empty()
    }

    pub fn ciphers(&self) -> &[C] {
        &self.ciphers
    }

    pub fn positions(&self) -> &[u32] {
        &self.positions
    }

    /// Query span widened by the security parameter
    pub fn range(&self) -> QueryRange {
        self.range
    }
}

pub struct MarkerBuilder<'a, S: HomomorphicScheme> {
    scheme: &'a S,
    universe: Universe,
    security_param: u32,
}

impl<'a, S: HomomorphicScheme> MarkerBuilder<'a, S> {
    pub fn new(scheme: &'a S, universe: Universe, security_param: u32) -> Self {
        Self {
            scheme,
            universe,
            security_param,
        }
    }

    pub fn build(&self, query: &[Base]) -> Result<Marker<S::Cipher>> {
        let (first, last) = match (query.first(), query.last()) {
            (Some(first), Some(last)) => (first.position, last.position),
            _ => return Err(ProtocolError::InvalidDataset("empty query".into())),
        };
        ensure_strictly_increasing(query)?;
        if !self.universe.contains(first) || !self.universe.contains(last) {
            return Err(ProtocolError::InvalidDataset(format!(
                "query [{}, {}] outside [1, {}]",
                first,
                last,
                self.universe.max_position()
            )));
        }

        let ciphers = query
            .par_iter()
            .map(|base| {
                self.scheme
                    .encrypt_inverse_digest(&position_base_digest(base.position, base))
            })
            .collect::<Result<Vec<_>>>()?;
        let (start, end) = self.universe.padded_range(first, last, self.security_param);

        Ok(Marker {
            ciphers,
            positions: query.iter().map(|b| b.position).collect(),
            range: QueryRange { start, end },
        })
    }
}
