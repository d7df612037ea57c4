//! Sliding-window matching engine
//!
//! A window holds `n` candidates between two boundary entries. For every
//! offset `i` in `[0, n - m]` the engine folds the `m` candidates starting at
//! window index `i + 1` together with the marker; an alignment matches exactly
//! when its aggregate encrypts zero. The output is padded with `m - 1`
//! encryptions of one and shuffled, so it always has `n` entries and the
//! position of a match reveals nothing.

use crate::crypto::random::{random_permutation, secure_rng};
use crate::crypto::HomomorphicScheme;
use crate::error::{ProtocolError, Result, VerificationFailure};
use log::debug;
use rayon::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchingMode {
    /// Every alignment folded from scratch, in parallel
    Unoptimized,
    /// Each alignment derived from the previous one in two operations
    Incremental,
}

impl MatchingMode {
    pub fn from_optimized(optimized: bool) -> Self {
        if optimized {
            MatchingMode::Incremental
        } else {
            MatchingMode::Unoptimized
        }
    }
}

pub struct MatchingEngine<'a, S: HomomorphicScheme> {
    scheme: &'a S,
}

impl<'a, S: HomomorphicScheme> MatchingEngine<'a, S> {
    pub fn new(scheme: &'a S) -> Self {
        Self { scheme }
    }

    /// `Encrypt(0) ⊕ Σ terms`, rerandomized; the sum is a parallel reduction tree
    pub fn aggregate(&self, terms: &[&S::Cipher]) -> Result<S::Cipher> {
        let zero = self.scheme.encrypt_u64(0)?;
        let sum = terms
            .par_iter()
            .map(|c| (*c).clone())
            .reduce_with(|a, b| self.scheme.mult_ciphers(&a, &b));
        let total = match sum {
            Some(sum) => self.scheme.mult_ciphers(&zero, &sum),
            None => zero,
        };
        self.scheme.rerandomize(&total)
    }

    /// Rerandomized aggregates for every offset, in offset order
    pub fn alignments(
        &self,
        window: &[S::Cipher],
        marker: &[S::Cipher],
        mode: MatchingMode,
    ) -> Result<Vec<S::Cipher>> {
        if window.len() < 2 {
            return Err(VerificationFailure::WindowShape(format!(
                "window of {} entries has no boundaries",
                window.len()
            ))
            .into());
        }
        let n = window.len() - 2;
        let m = marker.len();
        if m == 0 {
            return Err(ProtocolError::InvalidDataset("empty marker".into()));
        }
        if m > n {
            return Err(ProtocolError::AlignmentUnderflow { marker: m, window: n });
        }
        let count = n - m + 1;
        debug!("Matching {} alignments ({:?}, m={}, n={})", count, mode, m, n);

        match mode {
            MatchingMode::Unoptimized => (0..count)
                .into_par_iter()
                .map(|i| {
                    let aggregate = self.fold_alignment(window, marker, i)?;
                    self.scheme.rerandomize(&aggregate)
                })
                .collect(),
            MatchingMode::Incremental => {
                let mut raw = Vec::with_capacity(count);
                raw.push(self.fold_alignment(window, marker, 0)?);
                for i in 1..count {
                    let leaving = self.scheme.invert_cipher(&window[i]);
                    let step = self.scheme.mult_ciphers(&raw[i - 1], &leaving);
                    raw.push(self.scheme.mult_ciphers(&step, &window[i + m]));
                }
                raw.par_iter()
                    .map(|aggregate| {
                        let fresh = self.scheme.mult_ciphers(aggregate, &self.scheme.encrypt_u64(0)?);
                        self.scheme.rerandomize(&fresh)
                    })
                    .collect()
            }
        }
    }

    fn fold_alignment(&self, window: &[S::Cipher], marker: &[S::Cipher], offset: usize) -> Result<S::Cipher> {
        let mut acc = self.scheme.encrypt_u64(0)?;
        for (j, probe) in marker.iter().enumerate() {
            acc = self.scheme.mult_ciphers(&acc, &window[offset + 1 + j]);
            acc = self.scheme.mult_ciphers(&acc, probe);
        }
        Ok(acc)
    }

    /// Alignments plus `m - 1` encryptions of one, uniformly shuffled; always `n` long
    pub fn match_window(
        &self,
        window: &[S::Cipher],
        marker: &[S::Cipher],
        mode: MatchingMode,
    ) -> Result<Vec<S::Cipher>> {
        let mut results = self.alignments(window, marker, mode)?;
        let padding = (1..marker.len())
            .into_par_iter()
            .map(|_| self.scheme.encrypt_u64(1))
            .collect::<Result<Vec<_>>>()?;
        results.extend(padding);

        let mut rng = secure_rng()?;
        let slots = random_permutation(results.len(), &mut rng);
        let mut placed: Vec<(usize, S::Cipher)> = slots.into_iter().zip(results).collect();
        placed.sort_unstable_by_key(|(slot, _)| *slot);
        Ok(placed.into_iter().map(|(_, c)| c).collect())
    }
}
