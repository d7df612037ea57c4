//! Bit-decomposition range proofs
//!
//! To show `v ∈ [lower, upper)` with `2^k ≥ upper - lower`, the prover
//! decomposes both `v - lower` and `v - upper + 2^k` into `k` committed bits
//! and proves each bit commitment opens to 0 or 1 with a Cramer-Damgård-
//! Schoenmakers OR proof. The weighted bit commitments must sum back to the
//! shifted value commitment, which ties the bits to the original position.

use super::commitment::{Commitment, PedersenParams, Salt};
use super::range_proof::RangeProofSystem;
use super::transcript::Transcript;
use crate::config::ProtocolConfig;
use crate::crypto::random::{random_scalar, secure_rng};
use crate::error::{ProtocolError, Result};
use ark_bn254::{Fr, G1Affine, G1Projective};
use ark_ec::CurveGroup;
use ark_ff::Field;
use ark_std::Zero;
use rand::RngCore;

const DOMAIN: &[u8] = b"sphpsm/range/bits/v1";

/// Proof that one committed bit is 0 or 1
#[derive(Debug, Clone)]
pub struct BitOrProof {
    pub a0: G1Affine,
    pub a1: G1Affine,
    pub c0: Fr,
    pub c1: Fr,
    pub z0: Fr,
    pub z1: Fr,
}

#[derive(Debug, Clone)]
pub struct Decomposition {
    pub bits: Vec<G1Affine>,
    pub ors: Vec<BitOrProof>,
}

#[derive(Debug, Clone)]
pub struct BitProof {
    pub commitment: Commitment,
    pub low: Decomposition,
    pub high: Decomposition,
}

/// Prover state for one bit between the commit and response rounds
struct PendingBit {
    bit: bool,
    blinding: Fr,
    nonce: Fr,
    sim_c: Fr,
    sim_z: Fr,
    commitment: G1Affine,
    a0: G1Affine,
    a1: G1Affine,
}

pub struct BitRangeProof {
    params: PedersenParams,
    lower: u64,
    upper: u64,
    bits: u32,
}

fn pow2(i: u32) -> Fr {
    Fr::from(1u128 << i)
}

impl BitRangeProof {
    pub fn bit_length(&self) -> u32 {
        self.bits
    }

    /// `2^k - upper`, added to the commitment for the upper-side decomposition
    fn high_offset(&self) -> Fr {
        pow2(self.bits) - Fr::from(self.upper)
    }

    fn targets(&self, commitment: &Commitment) -> (G1Projective, G1Projective) {
        let c: G1Projective = commitment.point().into();
        let g = self.params.g();
        (c - g * Fr::from(self.lower), c + g * self.high_offset())
    }

    fn commit_bits<R: RngCore>(
        &self,
        value: u128,
        blinding: &Salt,
        rng: &mut R,
    ) -> Result<Vec<PendingBit>> {
        let k = self.bits;
        let g = self.params.g();
        let h = self.params.h();

        let mut blindings: Vec<Fr> = (0..k - 1).map(|_| random_scalar(rng)).collect();
        let weighted = blindings
            .iter()
            .enumerate()
            .fold(Fr::zero(), |acc, (i, r)| acc + pow2(i as u32) * r);
        let top_inv = pow2(k - 1)
            .inverse()
            .ok_or_else(|| ProtocolError::Proving("degenerate bit weight".into()))?;
        blindings.push((*blinding - weighted) * top_inv);

        let mut pending = Vec::with_capacity(k as usize);
        for (i, r) in blindings.into_iter().enumerate() {
            let bit = (value >> i) & 1 == 1;
            let commitment = if bit { g + h * r } else { h * r };
            let nonce: Fr = random_scalar(rng);
            let sim_c: Fr = random_scalar(rng);
            let sim_z: Fr = random_scalar(rng);
            let real_a = h * nonce;
            // the branch being simulated: C for bit 0, C - G for bit 1
            let sim_base = if bit { commitment } else { commitment - g };
            let sim_a = h * sim_z - sim_base * sim_c;
            let (a0, a1) = if bit { (sim_a, real_a) } else { (real_a, sim_a) };
            let points = G1Projective::normalize_batch(&[commitment, a0, a1]);
            pending.push(PendingBit {
                bit,
                blinding: r,
                nonce,
                sim_c,
                sim_z,
                commitment: points[0],
                a0: points[1],
                a1: points[2],
            });
        }
        Ok(pending)
    }

    fn respond(pending: Vec<PendingBit>, challenge: Fr) -> Decomposition {
        let mut bits = Vec::with_capacity(pending.len());
        let mut ors = Vec::with_capacity(pending.len());
        for p in pending {
            let real_c = challenge - p.sim_c;
            let real_z = p.nonce + real_c * p.blinding;
            let (c0, z0, c1, z1) = if p.bit {
                (p.sim_c, p.sim_z, real_c, real_z)
            } else {
                (real_c, real_z, p.sim_c, p.sim_z)
            };
            bits.push(p.commitment);
            ors.push(BitOrProof { a0: p.a0, a1: p.a1, c0, c1, z0, z1 });
        }
        Decomposition { bits, ors }
    }

    fn transcript<'a>(
        &self,
        commitment: &Commitment,
        rounds: impl Iterator<Item = (&'a G1Affine, &'a G1Affine, &'a G1Affine)>,
    ) -> Fr {
        let mut transcript = Transcript::new(DOMAIN);
        transcript.append_u64(self.lower);
        transcript.append_u64(self.upper);
        transcript.append(&self.params.g());
        transcript.append(&self.params.h());
        transcript.append(&commitment.point());
        for (c, a0, a1) in rounds {
            transcript.append(c);
            transcript.append(a0);
            transcript.append(a1);
        }
        transcript.challenge()
    }

    fn verify_decomposition(&self, target: G1Projective, d: &Decomposition, challenge: Fr) -> bool {
        if d.bits.len() != self.bits as usize || d.ors.len() != self.bits as usize {
            return false;
        }
        let g = self.params.g();
        let h = self.params.h();

        let recombined = d
            .bits
            .iter()
            .enumerate()
            .fold(G1Projective::zero(), |acc, (i, c)| acc + *c * pow2(i as u32));
        if recombined != target {
            return false;
        }

        d.bits.iter().zip(&d.ors).all(|(c, or)| {
            let c: G1Projective = (*c).into();
            or.c0 + or.c1 == challenge
                && h * or.z0 == c * or.c0 + or.a0
                && h * or.z1 == (c - g) * or.c1 + or.a1
        })
    }
}

impl RangeProofSystem for BitRangeProof {
    type Proof = BitProof;

    fn setup(params: &PedersenParams, lower: u64, upper: u64, _config: &ProtocolConfig) -> Result<Self> {
        if lower >= upper {
            return Err(ProtocolError::Config(format!(
                "empty proof interval [{}, {})",
                lower, upper
            )));
        }
        let span = upper - lower;
        let bits = (64 - (span - 1).leading_zeros()).max(1);
        Ok(Self {
            params: params.clone(),
            lower,
            upper,
            bits,
        })
    }

    fn name(&self) -> &'static str {
        "bit-decomposition"
    }

    fn lower(&self) -> u64 {
        self.lower
    }

    fn upper(&self) -> u64 {
        self.upper
    }

    fn prove(&self, secret: u64, blinding: &Salt) -> Result<BitProof> {
        if secret < self.lower || secret >= self.upper {
            return Err(ProtocolError::Proving(format!(
                "{} is outside [{}, {})",
                secret, self.lower, self.upper
            )));
        }
        let commitment = self.params.commit(secret, blinding);
        let low_value = (secret - self.lower) as u128;
        let high_value = secret as u128 + (1u128 << self.bits) - self.upper as u128;

        let mut rng = secure_rng()?;
        let low = self.commit_bits(low_value, blinding, &mut rng)?;
        let high = self.commit_bits(high_value, blinding, &mut rng)?;

        let challenge = self.transcript(
            &commitment,
            low.iter().chain(&high).map(|p| (&p.commitment, &p.a0, &p.a1)),
        );

        Ok(BitProof {
            commitment,
            low: Self::respond(low, challenge),
            high: Self::respond(high, challenge),
        })
    }

    fn verify(&self, proof: &BitProof) -> bool {
        let challenge = self.transcript(
            &proof.commitment,
            proof
                .low
                .bits
                .iter()
                .zip(&proof.low.ors)
                .chain(proof.high.bits.iter().zip(&proof.high.ors))
                .map(|(c, or)| (c, &or.a0, &or.a1)),
        );
        let (low_target, high_target) = self.targets(&proof.commitment);
        self.verify_decomposition(low_target, &proof.low, challenge)
            && self.verify_decomposition(high_target, &proof.high, challenge)
    }

    fn commitment(proof: &BitProof) -> Commitment {
        proof.commitment
    }
}
