//! Signature-based u-ary range proofs (Camenisch, Chaabouni, shelat 2008)
//!
//! The verifier signs every digit `0..u` with a Boneh-Boyen key at setup. To
//! show `w ∈ [0, u^ℓ)` the prover blinds the signature on each digit of `w`
//! and proves knowledge of it in zero knowledge, while a Schnorr-style
//! equation ties the digits to the Pedersen commitment. Two such proofs on
//! shifted commitments give an arbitrary interval `[lower, upper)`.

use super::commitment::{Commitment, PedersenParams, Salt};
use super::range_proof::RangeProofSystem;
use super::transcript::Transcript;
use crate::config::ProtocolConfig;
use crate::crypto::random::{random_nonzero_scalar, random_scalar, secure_rng};
use crate::error::{ProtocolError, Result};
use ark_bn254::{Bn254, Fr, G1Affine, G1Projective, G2Affine};
use ark_ec::pairing::{Pairing, PairingOutput};
use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::Field;
use ark_std::Zero;
use rand::RngCore;
use rayon::prelude::*;

const DOMAIN: &[u8] = b"sphpsm/range/ccs08/v1";

/// Largest digit base accepted; setup signs every digit
const MAX_BASE: u64 = 1 << 12;

#[derive(Debug, Clone)]
pub struct DigitProof {
    /// Blinded signature on the digit
    pub v: G1Affine,
    pub a: PairingOutput<Bn254>,
    pub z_digit: Fr,
    pub z_blind: Fr,
}

#[derive(Debug, Clone)]
pub struct Membership {
    pub digits: Vec<DigitProof>,
    pub d: G1Affine,
    pub z_salt: Fr,
}

#[derive(Debug, Clone)]
pub struct Ccs08Proof {
    pub commitment: Commitment,
    pub low: Membership,
    pub high: Membership,
}

struct PendingDigit {
    digit: u64,
    v_blind: Fr,
    s: Fr,
    t: Fr,
    v: G1Affine,
    a: PairingOutput<Bn254>,
}

struct PendingMembership {
    digits: Vec<PendingDigit>,
    m: Fr,
    d: G1Affine,
}

pub struct Ccs08 {
    params: PedersenParams,
    lower: u64,
    upper: u64,
    base: u64,
    digits: usize,
    /// `u^ℓ`
    capacity: u128,
    g2: G2Affine,
    public_key: G2Affine,
    signatures: Vec<G1Affine>,
    gt: PairingOutput<Bn254>,
}

impl Ccs08 {
    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn digit_count(&self) -> usize {
        self.digits
    }

    fn digit_weights(&self) -> Vec<Fr> {
        let base = Fr::from(self.base);
        let mut weight = Fr::from(1u64);
        (0..self.digits)
            .map(|_| {
                let w = weight;
                weight *= base;
                w
            })
            .collect()
    }

    fn targets(&self, commitment: &Commitment) -> (G1Projective, G1Projective) {
        let c: G1Projective = commitment.point().into();
        let g = self.params.g();
        let offset = Fr::from(self.capacity) - Fr::from(self.upper);
        (c - g * Fr::from(self.lower), c + g * offset)
    }

    fn commit_digits<R: RngCore>(&self, mut value: u128, rng: &mut R) -> PendingMembership {
        let weights = self.digit_weights();
        let mut digits = Vec::with_capacity(self.digits);
        let mut weighted_s = Fr::zero();
        for weight in &weights {
            let digit = (value % self.base as u128) as u64;
            value /= self.base as u128;

            let v_blind: Fr = random_nonzero_scalar(rng);
            let s: Fr = random_scalar(rng);
            let t: Fr = random_scalar(rng);
            let v = (self.signatures[digit as usize] * v_blind).into_affine();
            let a = Bn254::pairing((v * (-s)).into_affine(), self.g2) + self.gt * t;
            weighted_s += *weight * s;
            digits.push(PendingDigit { digit, v_blind, s, t, v, a });
        }
        let m: Fr = random_scalar(rng);
        let d = (self.params.g() * weighted_s + self.params.h() * m).into_affine();
        PendingMembership { digits, m, d }
    }

    fn respond(pending: PendingMembership, challenge: Fr, blinding: &Salt) -> Membership {
        let digits = pending
            .digits
            .into_iter()
            .map(|p| DigitProof {
                v: p.v,
                a: p.a,
                z_digit: p.s - challenge * Fr::from(p.digit),
                z_blind: p.t - challenge * p.v_blind,
            })
            .collect();
        Membership {
            digits,
            d: pending.d,
            z_salt: pending.m - challenge * blinding,
        }
    }

    fn challenge<'a>(
        &self,
        commitment: &Commitment,
        rounds: impl Iterator<Item = (&'a G1Affine, &'a PairingOutput<Bn254>)>,
        ds: [&G1Affine; 2],
    ) -> Fr {
        let mut transcript = Transcript::new(DOMAIN);
        transcript.append_u64(self.lower);
        transcript.append_u64(self.upper);
        transcript.append_u64(self.base);
        transcript.append(&self.public_key);
        transcript.append(&commitment.point());
        for (v, a) in rounds {
            transcript.append(v);
            transcript.append(a);
        }
        for d in ds {
            transcript.append(d);
        }
        transcript.challenge()
    }

    fn verify_membership(&self, target: G1Projective, proof: &Membership, challenge: Fr) -> bool {
        if proof.digits.len() != self.digits {
            return false;
        }
        let weights = self.digit_weights();
        let weighted_z = proof
            .digits
            .iter()
            .zip(&weights)
            .fold(Fr::zero(), |acc, (digit, w)| acc + *w * digit.z_digit);
        let expected = target * challenge
            + self.params.h() * proof.z_salt
            + self.params.g() * weighted_z;
        if expected.into_affine() != proof.d {
            return false;
        }

        proof.digits.par_iter().all(|digit| {
            if digit.v.is_zero() {
                return false;
            }
            let lhs = Bn254::multi_pairing(
                [
                    (digit.v * challenge).into_affine(),
                    (digit.v * (-digit.z_digit)).into_affine(),
                ],
                [self.public_key, self.g2],
            ) + self.gt * digit.z_blind;
            lhs == digit.a
        })
    }
}

impl RangeProofSystem for Ccs08 {
    type Proof = Ccs08Proof;

    fn setup(params: &PedersenParams, lower: u64, upper: u64, config: &ProtocolConfig) -> Result<Self> {
        if lower >= upper {
            return Err(ProtocolError::Config(format!(
                "empty proof interval [{}, {})",
                lower, upper
            )));
        }
        let base = config.ccs08_base;
        if !(2..=MAX_BASE).contains(&base) {
            return Err(ProtocolError::Config(format!(
                "ccs08 digit base {} outside [2, {}]",
                base, MAX_BASE
            )));
        }
        let span = (upper - lower) as u128;
        let mut capacity: u128 = 1;
        let mut digits = 0usize;
        while capacity < span {
            capacity *= base as u128;
            digits += 1;
        }
        let digits = digits.max(1);
        let capacity = capacity.max(base as u128);

        let mut rng = secure_rng()?;
        let secret: Fr = random_nonzero_scalar(&mut rng);
        let g1 = params.g();
        let g2 = G2Affine::generator();
        let public_key = (g2 * secret).into_affine();
        let signatures = (0..base)
            .map(|i| {
                (secret + Fr::from(i))
                    .inverse()
                    .map(|inv| (g1 * inv).into_affine())
                    .ok_or_else(|| ProtocolError::Config("degenerate signing key".into()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            params: params.clone(),
            lower,
            upper,
            base,
            digits,
            capacity,
            g2,
            public_key,
            signatures,
            gt: Bn254::pairing(g1, g2),
        })
    }

    fn name(&self) -> &'static str {
        "ccs08"
    }

    fn lower(&self) -> u64 {
        self.lower
    }

    fn upper(&self) -> u64 {
        self.upper
    }

    fn prove(&self, secret: u64, blinding: &Salt) -> Result<Ccs08Proof> {
        if secret < self.lower || secret >= self.upper {
            return Err(ProtocolError::Proving(format!(
                "{} is outside [{}, {})",
                secret, self.lower, self.upper
            )));
        }
        let commitment = self.params.commit(secret, blinding);
        let low_value = (secret - self.lower) as u128;
        let high_value = secret as u128 + self.capacity - self.upper as u128;

        let mut rng = secure_rng()?;
        let low = self.commit_digits(low_value, &mut rng);
        let high = self.commit_digits(high_value, &mut rng);

        let challenge = self.challenge(
            &commitment,
            low.digits.iter().chain(&high.digits).map(|p| (&p.v, &p.a)),
            [&low.d, &high.d],
        );

        Ok(Ccs08Proof {
            commitment,
            low: Self::respond(low, challenge, blinding),
            high: Self::respond(high, challenge, blinding),
        })
    }

    fn verify(&self, proof: &Ccs08Proof) -> bool {
        let challenge = self.challenge(
            &proof.commitment,
            proof
                .low
                .digits
                .iter()
                .chain(&proof.high.digits)
                .map(|d| (&d.v, &d.a)),
            [&proof.low.d, &proof.high.d],
        );
        let (low_target, high_target) = self.targets(&proof.commitment);
        self.verify_membership(low_target, &proof.low, challenge)
            && self.verify_membership(high_target, &proof.high, challenge)
    }

    fn commitment(proof: &Ccs08Proof) -> Commitment {
        proof.commitment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system(lower: u64, upper: u64, base: u64) -> Ccs08 {
        let config = ProtocolConfig {
            ccs08_base: base,
            ..ProtocolConfig::default()
        };
        Ccs08::setup(&PedersenParams::new(), lower, upper, &config).unwrap()
    }

    #[test]
    fn test_digit_count() {
        assert_eq!(system(0, 16, 16).digit_count(), 1);
        assert_eq!(system(0, 17, 16).digit_count(), 2);
        assert_eq!(system(10, 11, 4).digit_count(), 1);
        assert_eq!(system(0, 100, 10).digit_count(), 2);
    }

    #[test]
    fn test_prove_verify() {
        let sys = system(200, 300, 4);
        let salt = Fr::from(4242u64);
        for secret in [200, 255, 299] {
            let proof = sys.prove(secret, &salt).unwrap();
            assert!(sys.verify(&proof), "secret {}", secret);
            assert_eq!(Ccs08::commitment(&proof), PedersenParams::new().commit(secret, &salt));
        }
        assert!(sys.prove(300, &salt).is_err());
        assert!(sys.prove(199, &salt).is_err());
    }

    #[test]
    fn test_tampering_rejected() {
        let sys = system(0, 64, 8);
        let proof = sys.prove(33, &Fr::from(5u64)).unwrap();

        let mut other_commitment = proof.clone();
        other_commitment.commitment = PedersenParams::new().commit(34, &Fr::from(5u64));
        assert!(!sys.verify(&other_commitment));

        let mut zeroed = proof.clone();
        zeroed.low.digits[0].v = G1Affine::zero();
        assert!(!sys.verify(&zeroed));

        let mut shifted = proof;
        shifted.high.z_salt += Fr::from(1u64);
        assert!(!sys.verify(&shifted));
    }

    #[test]
    fn test_rejects_bad_base() {
        let config = ProtocolConfig {
            ccs08_base: MAX_BASE + 1,
            ..ProtocolConfig::default()
        };
        assert!(Ccs08::setup(&PedersenParams::new(), 0, 10, &config).is_err());
    }
}
