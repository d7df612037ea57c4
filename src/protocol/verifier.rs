//! Chain verification (verifier side)
//!
//! Every check is fail-stop: the first bad signature, commitment or proof
//! aborts with a [`VerificationFailure`] and nothing is matched.

use super::chain::{OpenedBoundaries, RangeWindow, WholeChain};
use crate::config::Universe;
use crate::crypto::digest::{position_cipher_digest, tuple_digest};
use crate::crypto::{HomomorphicScheme, OwnerVerifyingKey};
use crate::error::{Boundary, ProtocolError, Result, VerificationFailure};
use crate::zk::{PedersenParams, RangeProofSystem};
use log::warn;
use rayon::prelude::*;

pub struct ChainVerifier<'a, S: HomomorphicScheme> {
    scheme: &'a S,
    key: &'a OwnerVerifyingKey,
    pedersen: &'a PedersenParams,
    universe: Universe,
}

fn logged<T>(result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        warn!("{}", e);
    }
    result
}

impl<'a, S: HomomorphicScheme> ChainVerifier<'a, S> {
    pub fn new(
        scheme: &'a S,
        key: &'a OwnerVerifyingKey,
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

    /// Check the signatures covering `positions`, returning their chain indices
    pub fn verify_whole(&self, chain: &WholeChain<S::Cipher>, positions: &[u32]) -> Result<Vec<usize>> {
        let genome = chain.genome();
        if chain.signatures().len() != genome.len() {
            return logged(Err(VerificationFailure::WindowShape(format!(
                "{} entries carry {} signatures",
                genome.len(),
                chain.signatures().len()
            ))
            .into()));
        }
        let indices = positions
            .iter()
            .map(|&p| {
                genome.index_of(p).ok_or_else(|| {
                    ProtocolError::RangeViolation(format!("position {} is not in the chain", p))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        logged(indices.par_iter().try_for_each(|&index| {
            let cipher = &genome.ciphers()[index];
            let digest =
                position_cipher_digest(genome.positions()[index], &self.scheme.cipher_bytes(cipher));
            if self.key.verify(&digest, &chain.signatures()[index]) {
                Ok(())
            } else {
                Err(VerificationFailure::Signature { index }.into())
            }
        }))?;
        Ok(indices)
    }

    fn check_shape(window: &RangeWindow<S::Cipher>) -> Result<()> {
        let entries = window.ciphers.len();
        if entries < 2
            || window.commitments.len() != entries
            || window.signatures.len() != entries - 1
        {
            return Err(VerificationFailure::WindowShape(format!(
                "{} ciphers, {} commitments, {} signatures",
                entries,
                window.commitments.len(),
                window.signatures.len()
            ))
            .into());
        }
        Ok(())
    }

    /// Every adjacent tuple in the window must carry the owner's signature
    pub fn verify_tuple_signatures(&self, window: &RangeWindow<S::Cipher>) -> Result<()> {
        Self::check_shape(window)?;
        let bytes: Vec<Vec<u8>> = window
            .ciphers
            .par_iter()
            .map(|c| self.scheme.cipher_bytes(c))
            .collect();
        (0..window.signatures.len())
            .into_par_iter()
            .try_for_each(|index| {
                let digest = tuple_digest(
                    &window.commitments[index],
                    &bytes[index],
                    &window.commitments[index + 1],
                    &bytes[index + 1],
                );
                if self.key.verify(&digest, &window.signatures[index]) {
                    Ok(())
                } else {
                    Err(VerificationFailure::Signature { index }.into())
                }
            })
    }

    /// Window whose boundaries are the sentinels, opened by their salts
    pub fn verify_opened(&self, window: &RangeWindow<S::Cipher>, opened: &OpenedBoundaries) -> Result<()> {
        logged(self.check_opened(window, opened))
    }

    fn check_opened(&self, window: &RangeWindow<S::Cipher>, opened: &OpenedBoundaries) -> Result<()> {
        Self::check_shape(window)?;
        if opened.lower_position != self.universe.lower_sentinel() {
            return Err(ProtocolError::RangeViolation(format!(
                "lower boundary claims position {}",
                opened.lower_position
            )));
        }
        if opened.upper_position <= self.universe.max_position() {
            return Err(ProtocolError::RangeViolation(format!(
                "upper boundary claims position {} inside the universe",
                opened.upper_position
            )));
        }

        let last = window.commitments.len() - 1;
        let lower = self
            .pedersen
            .open(&window.commitments[0], opened.lower_position as u64, &opened.lower_salt);
        if !lower {
            return Err(VerificationFailure::BoundaryCommitment(Boundary::Lower).into());
        }
        let upper = self
            .pedersen
            .open(&window.commitments[last], opened.upper_position as u64, &opened.upper_salt);
        if !upper {
            return Err(VerificationFailure::BoundaryCommitment(Boundary::Upper).into());
        }

        self.verify_tuple_signatures(window)
    }

    /// Window bounded by range proofs instead of opened sentinels
    pub fn verify_proved<P: RangeProofSystem>(
        &self,
        window: &RangeWindow<S::Cipher>,
        lower_system: &P,
        upper_system: &P,
        lower_proof: &P::Proof,
        upper_proof: &P::Proof,
    ) -> Result<()> {
        logged(self.check_proved(window, lower_system, upper_system, lower_proof, upper_proof))
    }

    fn check_proved<P: RangeProofSystem>(
        &self,
        window: &RangeWindow<S::Cipher>,
        lower_system: &P,
        upper_system: &P,
        lower_proof: &P::Proof,
        upper_proof: &P::Proof,
    ) -> Result<()> {
        Self::check_shape(window)?;
        if !lower_system.verify(lower_proof) {
            return Err(VerificationFailure::RangeProof(Boundary::Lower).into());
        }
        if !upper_system.verify(upper_proof) {
            return Err(VerificationFailure::RangeProof(Boundary::Upper).into());
        }
        let last = window.commitments.len() - 1;
        if P::commitment(lower_proof) != window.commitments[0] {
            return Err(VerificationFailure::UnboundProof(Boundary::Lower).into());
        }
        if P::commitment(upper_proof) != window.commitments[last] {
            return Err(VerificationFailure::UnboundProof(Boundary::Upper).into());
        }

        self.verify_tuple_signatures(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProtocolConfig;
    use crate::crypto::scheme::clear::{ClearCipher, ClearScheme};
    use crate::crypto::OwnerKey;
    use crate::genome::Base;
    use crate::protocol::chain::{ChainBuilder, RangeChain};
    use crate::zk::BitRangeProof;
    use ark_bn254::Fr;

    struct Fixture {
        scheme: ClearScheme,
        key: OwnerKey,
        pedersen: PedersenParams,
        universe: Universe,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                scheme: ClearScheme,
                key: OwnerKey::generate().unwrap(),
                pedersen: PedersenParams::new(),
                universe: Universe::new(1000).unwrap(),
            }
        }

        fn range_chain(&self) -> RangeChain<ClearCipher> {
            ChainBuilder::new(&self.scheme, &self.key, &self.pedersen, self.universe)
                .build_range(&[Base::new(10, b'T'), Base::new(20, b'A'), Base::new(30, b'T')])
                .unwrap()
        }
    }

    fn failure(result: Result<()>) -> VerificationFailure {
        match result {
            Err(ProtocolError::Verification(f)) => f,
            other => panic!("expected verification failure, got {:?}", other),
        }
    }

    #[test]
    fn test_opened_window_accepts_honest_chain() {
        let fx = Fixture::new();
        let public = fx.key.verifying_key();
        let verifier = ChainVerifier::new(&fx.scheme, &public, &fx.pedersen, fx.universe);
        let chain = fx.range_chain();
        let window = chain.full_window().unwrap();
        assert!(verifier.verify_opened(&window, &chain.opened_boundaries()).is_ok());
    }

    #[test]
    fn test_tampered_cipher_and_commitment() {
        let fx = Fixture::new();
        let public = fx.key.verifying_key();
        let verifier = ChainVerifier::new(&fx.scheme, &public, &fx.pedersen, fx.universe);
        let chain = fx.range_chain();
        let opened = chain.opened_boundaries();

        let mut window = chain.full_window().unwrap();
        window.ciphers[2] = ClearCipher(window.ciphers[2].0 + 1);
        assert!(matches!(
            failure(verifier.verify_opened(&window, &opened)),
            VerificationFailure::Signature { index: 1 } | VerificationFailure::Signature { index: 2 }
        ));

        let mut window = chain.full_window().unwrap();
        window.commitments[3] = fx.pedersen.commit(31, chain.salt(3).unwrap());
        assert!(matches!(
            failure(verifier.verify_opened(&window, &opened)),
            VerificationFailure::Signature { .. }
        ));

        let mut window = chain.full_window().unwrap();
        window.signatures.swap(0, 1);
        assert!(matches!(
            failure(verifier.verify_tuple_signatures(&window)),
            VerificationFailure::Signature { .. }
        ));
    }

    #[test]
    fn test_opened_boundary_claims() {
        let fx = Fixture::new();
        let public = fx.key.verifying_key();
        let verifier = ChainVerifier::new(&fx.scheme, &public, &fx.pedersen, fx.universe);
        let chain = fx.range_chain();
        let window = chain.full_window().unwrap();

        let mut moved = chain.opened_boundaries();
        moved.lower_position = 5;
        assert!(matches!(
            verifier.verify_opened(&window, &moved),
            Err(ProtocolError::RangeViolation(_))
        ));

        let mut wrong_salt = chain.opened_boundaries();
        wrong_salt.upper_salt += Fr::from(1u64);
        assert_eq!(
            failure(verifier.verify_opened(&window, &wrong_salt)),
            VerificationFailure::BoundaryCommitment(Boundary::Upper)
        );

        let inner = chain.window(1, 3).unwrap();
        assert_eq!(
            failure(verifier.verify_opened(&inner, &chain.opened_boundaries())),
            VerificationFailure::BoundaryCommitment(Boundary::Lower)
        );

        let mut short = chain.full_window().unwrap();
        short.signatures.pop();
        assert!(matches!(
            failure(verifier.verify_opened(&short, &chain.opened_boundaries())),
            VerificationFailure::WindowShape(_)
        ));
    }

    #[test]
    fn test_proved_window() {
        let fx = Fixture::new();
        let public = fx.key.verifying_key();
        let verifier = ChainVerifier::new(&fx.scheme, &public, &fx.pedersen, fx.universe);
        let chain = fx.range_chain();
        let config = ProtocolConfig::default();

        // query range [15, 25] covers index 2; boundaries are entries 1 and 3
        let lower = BitRangeProof::setup(&fx.pedersen, 0, 15, &config).unwrap();
        let upper = BitRangeProof::setup(&fx.pedersen, 26, 1010, &config).unwrap();
        let window = chain.window(1, 3).unwrap();
        let lower_proof = lower.prove(10, chain.salt(1).unwrap()).unwrap();
        let upper_proof = upper.prove(30, chain.salt(3).unwrap()).unwrap();
        assert!(verifier
            .verify_proved(&window, &lower, &upper, &lower_proof, &upper_proof)
            .is_ok());

        // a valid proof about some other commitment is not evidence for this window
        let foreign = lower.prove(10, &Fr::from(99u64)).unwrap();
        assert_eq!(
            failure(verifier.verify_proved(&window, &lower, &upper, &foreign, &upper_proof)),
            VerificationFailure::UnboundProof(Boundary::Lower)
        );

        assert_eq!(
            failure(verifier.verify_proved(&window, &lower, &upper, &upper_proof, &upper_proof)),
            VerificationFailure::RangeProof(Boundary::Lower)
        );
    }

    #[test]
    fn test_whole_chain_tamper() {
        let fx = Fixture::new();
        let public = fx.key.verifying_key();
        let verifier = ChainVerifier::new(&fx.scheme, &public, &fx.pedersen, fx.universe);
        let bases = [Base::new(10, b'T'), Base::new(20, b'A'), Base::new(30, b'T')];
        let chain = ChainBuilder::new(&fx.scheme, &fx.key, &fx.pedersen, fx.universe)
            .build_whole(&bases)
            .unwrap();

        assert_eq!(verifier.verify_whole(&chain, &[20, 30]).unwrap(), vec![1, 2]);
        assert!(matches!(
            verifier.verify_whole(&chain, &[25]),
            Err(ProtocolError::RangeViolation(_))
        ));

        let mut moved = chain.clone();
        moved.genome.positions[1] = 21;
        assert_eq!(
            failure(verifier.verify_whole(&moved, &[21]).map(|_| ())),
            VerificationFailure::Signature { index: 1 }
        );

        let mut recoded = chain;
        recoded.genome.ciphers[2] = ClearCipher(7);
        assert_eq!(
            failure(verifier.verify_whole(&recoded, &[10, 30]).map(|_| ())),
            VerificationFailure::Signature { index: 2 }
        );
    }
}
