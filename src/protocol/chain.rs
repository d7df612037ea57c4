//! Authentication chain construction (data owner side)
//!
//! Whole mode signs every `(position, cipher)` pair on its own. Range mode
//! brackets the data with two sentinel entries, commits to every position and
//! signs each adjacent pair of `(commitment, cipher)` tuples, so any contiguous
//! window can later be shown to the verifier and checked on its own.

use crate::config::Universe;
use crate::crypto::digest::{position_base_digest, position_cipher_digest, tuple_digest};
use crate::crypto::random::{random_scalar, secure_rng};
use crate::crypto::{ChainSignature, HomomorphicScheme, OwnerKey};
use crate::error::{ProtocolError, Result};
use crate::genome::{ensure_strictly_increasing, Base};
use crate::zk::{Commitment, PedersenParams, Salt};
use log::info;
use rayon::prelude::*;

/// Encrypted bases without any authentication
#[derive(Debug, Clone)]
pub struct EncryptedGenome<C> {
    pub(crate) positions: Vec<u32>,
    pub(crate) ciphers: Vec<C>,
}

impl<C> EncryptedGenome<C> {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[u32] {
        &self.positions
    }

    pub fn ciphers(&self) -> &[C] {
        &self.ciphers
    }

    pub fn index_of(&self, position: u32) -> Option<usize> {
        self.positions.binary_search(&position).ok()
    }
}

#[derive(Debug, Clone)]
pub struct WholeChain<C> {
    pub(crate) genome: EncryptedGenome<C>,
    pub(crate) signatures: Vec<ChainSignature>,
}

impl<C> WholeChain<C> {
    pub fn genome(&self) -> &EncryptedGenome<C> {
        &self.genome
    }

    pub fn signatures(&self) -> &[ChainSignature] {
        &self.signatures
    }
}

/// Opening of the two sentinel commitments
#[derive(Debug, Clone, PartialEq)]
pub struct OpenedBoundaries {
    pub lower_position: u32,
    pub lower_salt: Salt,
    pub upper_position: u32,
    pub upper_salt: Salt,
}

/// Range-mode chain: `n + 2` entries (sentinels included) and `n + 1` tuple signatures
#[derive(Debug, Clone)]
pub struct RangeChain<C> {
    pub(crate) positions: Vec<u32>,
    pub(crate) ciphers: Vec<C>,
    pub(crate) commitments: Vec<Commitment>,
    pub(crate) salts: Vec<Salt>,
    pub(crate) signatures: Vec<ChainSignature>,
}

/// A contiguous slice of a range chain as shown to the verifier
///
/// Entry `0` and the last entry are boundaries; everything in between is a
/// candidate for matching. `signatures[i]` links entries `i` and `i + 1`.
#[derive(Debug, Clone)]
pub struct RangeWindow<C> {
    pub commitments: Vec<Commitment>,
    pub ciphers: Vec<C>,
    pub signatures: Vec<ChainSignature>,
}

impl<C> RangeWindow<C> {
    /// Number of candidate entries between the two boundaries
    pub fn candidate_count(&self) -> usize {
        self.ciphers.len().saturating_sub(2)
    }
}

impl<C: Clone> RangeChain<C> {
    /// Entry count, sentinels included
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Number of real bases
    pub fn base_count(&self) -> usize {
        self.len().saturating_sub(2)
    }

    pub fn positions(&self) -> &[u32] {
        &self.positions
    }

    pub fn commitments(&self) -> &[Commitment] {
        &self.commitments
    }

    pub fn salt(&self, index: usize) -> Option<&Salt> {
        self.salts.get(index)
    }

    /// Entries `first..=last` with the signatures linking them
    pub fn window(&self, first: usize, last: usize) -> Result<RangeWindow<C>> {
        if first >= last || last >= self.len() {
            return Err(ProtocolError::RangeViolation(format!(
                "window [{}, {}] does not fit a chain of {} entries",
                first,
                last,
                self.len()
            )));
        }
        Ok(RangeWindow {
            commitments: self.commitments[first..=last].to_vec(),
            ciphers: self.ciphers[first..=last].to_vec(),
            signatures: self.signatures[first..last].to_vec(),
        })
    }

    pub fn full_window(&self) -> Result<RangeWindow<C>> {
        self.window(0, self.len().saturating_sub(1))
    }

    pub fn opened_boundaries(&self) -> OpenedBoundaries {
        let last = self.len() - 1;
        OpenedBoundaries {
            lower_position: self.positions[0],
            lower_salt: self.salts[0],
            upper_position: self.positions[last],
            upper_salt: self.salts[last],
        }
    }
}

pub struct ChainBuilder<'a, S: HomomorphicScheme> {
    scheme: &'a S,
    key: &'a OwnerKey,
    pedersen: &'a PedersenParams,
    universe: Universe,
}

impl<'a, S: HomomorphicScheme> ChainBuilder<'a, S> {
    pub fn new(
        scheme: &'a S,
        key: &'a OwnerKey,
        pedersen: &'a PedersenParams,
        universe: Universe,
    ) -> Self {
        Self {
            scheme,
            key,
            pedersen,
            universe,
        }
    }

    fn validate(&self, bases: &[Base]) -> Result<()> {
        if bases.is_empty() {
            return Err(ProtocolError::InvalidDataset("no bases to encrypt".into()));
        }
        ensure_strictly_increasing(bases)?;
        if let Some(outside) = bases.iter().find(|b| !self.universe.contains(b.position)) {
            return Err(ProtocolError::InvalidDataset(format!(
                "position {} outside [1, {}]",
                outside.position,
                self.universe.max_position()
            )));
        }
        Ok(())
    }

    fn encrypt_base(&self, base: &Base) -> Result<S::Cipher> {
        self.scheme
            .encrypt_digest(&position_base_digest(base.position, base))
    }

    /// Encryption without signatures, used by the unauthenticated baseline
    pub fn encrypt_only(&self, bases: &[Base]) -> Result<EncryptedGenome<S::Cipher>> {
        self.validate(bases)?;
        let ciphers = bases
            .par_iter()
            .map(|base| self.encrypt_base(base))
            .collect::<Result<Vec<_>>>()?;
        Ok(EncryptedGenome {
            positions: bases.iter().map(|b| b.position).collect(),
            ciphers,
        })
    }

    pub fn build_whole(&self, bases: &[Base]) -> Result<WholeChain<S::Cipher>> {
        self.validate(bases)?;
        let entries = bases
            .par_iter()
            .map(|base| {
                let cipher = self.encrypt_base(base)?;
                let digest = position_cipher_digest(base.position, &self.scheme.cipher_bytes(&cipher));
                let signature = self.key.sign(&digest)?;
                Ok((cipher, signature))
            })
            .collect::<Result<Vec<_>>>()?;
        let (ciphers, signatures): (Vec<_>, Vec<_>) = entries.into_iter().unzip();

        info!("Built whole chain over {} bases ({})", bases.len(), self.scheme.name());
        Ok(WholeChain {
            genome: EncryptedGenome {
                positions: bases.iter().map(|b| b.position).collect(),
                ciphers,
            },
            signatures,
        })
    }

    pub fn build_range(&self, bases: &[Base]) -> Result<RangeChain<S::Cipher>> {
        self.validate(bases)?;
        let mut entries = Vec::with_capacity(bases.len() + 2);
        entries.push(Base::sentinel(self.universe.lower_sentinel()));
        entries.extend_from_slice(bases);
        entries.push(Base::sentinel(self.universe.upper_sentinel()));

        let salts = (0..entries.len())
            .into_par_iter()
            .map(|_| {
                let mut rng = secure_rng()?;
                Ok(random_scalar::<Salt, _>(&mut rng))
            })
            .collect::<Result<Vec<_>>>()?;

        let sealed = entries
            .par_iter()
            .zip(salts.par_iter())
            .map(|(base, salt)| {
                let cipher = self.encrypt_base(base)?;
                let bytes = self.scheme.cipher_bytes(&cipher);
                let commitment = self.pedersen.commit(base.position as u64, salt);
                Ok((cipher, bytes, commitment))
            })
            .collect::<Result<Vec<_>>>()?;

        let signatures = (0..entries.len() - 1)
            .into_par_iter()
            .map(|i| {
                let (_, bytes, commitment) = &sealed[i];
                let (_, next_bytes, next_commitment) = &sealed[i + 1];
                self.key
                    .sign(&tuple_digest(commitment, bytes, next_commitment, next_bytes))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut ciphers = Vec::with_capacity(sealed.len());
        let mut commitments = Vec::with_capacity(sealed.len());
        for (cipher, _, commitment) in sealed {
            ciphers.push(cipher);
            commitments.push(commitment);
        }

        info!(
            "Built range chain: {} entries, {} tuple signatures ({})",
            entries.len(),
            signatures.len(),
            self.scheme.name()
        );
        Ok(RangeChain {
            positions: entries.iter().map(|b| b.position).collect(),
            ciphers,
            commitments,
            salts,
            signatures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::scheme::clear::ClearScheme;

    fn bases() -> Vec<Base> {
        vec![Base::new(10, b'T'), Base::new(20, b'A'), Base::new(30, b'T')]
    }

    #[test]
    fn test_range_chain_shape() {
        let scheme = ClearScheme;
        let key = OwnerKey::generate().unwrap();
        let pedersen = PedersenParams::new();
        let universe = Universe::new(1000).unwrap();
        let builder = ChainBuilder::new(&scheme, &key, &pedersen, universe);

        let chain = builder.build_range(&bases()).unwrap();
        assert_eq!(chain.len(), 5);
        assert_eq!(chain.base_count(), 3);
        assert_eq!(chain.signatures.len(), 4);
        assert_eq!(chain.positions(), &[0, 10, 20, 30, 1001]);
        for i in 0..chain.len() {
            assert!(pedersen.open(
                &chain.commitments()[i],
                chain.positions()[i] as u64,
                chain.salt(i).unwrap()
            ));
        }
        assert_ne!(chain.salts[0], chain.salts[1]);

        let public = key.verifying_key();
        for (i, sig) in chain.signatures.iter().enumerate() {
            let digest = tuple_digest(
                &chain.commitments[i],
                &scheme.cipher_bytes(&chain.ciphers[i]),
                &chain.commitments[i + 1],
                &scheme.cipher_bytes(&chain.ciphers[i + 1]),
            );
            assert!(public.verify(&digest, sig));
        }

        let opened = chain.opened_boundaries();
        assert_eq!(opened.lower_position, 0);
        assert_eq!(opened.upper_position, 1001);
    }

    #[test]
    fn test_window_slicing() {
        let scheme = ClearScheme;
        let key = OwnerKey::generate().unwrap();
        let pedersen = PedersenParams::new();
        let builder = ChainBuilder::new(&scheme, &key, &pedersen, Universe::new(1000).unwrap());
        let chain = builder.build_range(&bases()).unwrap();

        let window = chain.window(1, 3).unwrap();
        assert_eq!(window.ciphers.len(), 3);
        assert_eq!(window.signatures.len(), 2);
        assert_eq!(window.candidate_count(), 1);
        assert_eq!(window.commitments[0], chain.commitments()[1]);

        assert_eq!(chain.full_window().unwrap().candidate_count(), 3);
        assert!(chain.window(2, 2).is_err());
        assert!(chain.window(0, 5).is_err());
    }

    #[test]
    fn test_whole_chain_signatures() {
        let scheme = ClearScheme;
        let key = OwnerKey::generate().unwrap();
        let pedersen = PedersenParams::new();
        let builder = ChainBuilder::new(&scheme, &key, &pedersen, Universe::default());
        let chain = builder.build_whole(&bases()).unwrap();

        assert_eq!(chain.genome().len(), 3);
        assert_eq!(chain.genome().index_of(20), Some(1));
        assert_eq!(chain.genome().index_of(25), None);
        let public = key.verifying_key();
        for i in 0..3 {
            let digest = position_cipher_digest(
                chain.genome().positions()[i],
                &scheme.cipher_bytes(&chain.genome().ciphers()[i]),
            );
            assert!(public.verify(&digest, &chain.signatures()[i]));
        }
    }

    #[test]
    fn test_invalid_datasets_rejected() {
        let scheme = ClearScheme;
        let key = OwnerKey::generate().unwrap();
        let pedersen = PedersenParams::new();
        let builder = ChainBuilder::new(&scheme, &key, &pedersen, Universe::new(100).unwrap());

        let unordered = vec![Base::new(20, b'A'), Base::new(10, b'T')];
        assert!(matches!(builder.build_range(&unordered), Err(ProtocolError::InvalidDataset(_))));
        let duplicate = vec![Base::new(10, b'A'), Base::new(10, b'T')];
        assert!(builder.build_whole(&duplicate).is_err());
        assert!(builder.encrypt_only(&[Base::new(101, b'A')]).is_err());
        assert!(builder.encrypt_only(&[Base::new(0, b'A')]).is_err());
        assert!(builder.encrypt_only(&[]).is_err());
    }
}
