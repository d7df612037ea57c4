//! Protocol orchestration
//!
//! [`DataOwner`] and [`Tester`] hold each party's private state; a
//! [`Session`] drives one run of a protocol mode between them and reports the
//! verdict with per-phase timings. Both parties work under one key: the owner
//! holds the scheme and its zero test, the tester only a [`PublicScheme`]
//! handle on it.

use super::chain::{ChainBuilder, EncryptedGenome, OpenedBoundaries, RangeChain, RangeWindow, WholeChain};
use super::locator::{IndexRange, RangeLocator};
use super::marker::{Marker, MarkerBuilder, QueryRange};
use super::matching::{MatchingEngine, MatchingMode};
use super::verifier::ChainVerifier;
use crate::config::{ProtocolConfig, RangeProofKind, Universe, UPPER_PROOF_SLACK};
use crate::crypto::{HomomorphicScheme, OwnerKey, OwnerVerifyingKey, PublicScheme, SecretScheme};
use crate::error::{ProtocolError, Result};
use crate::genome::Base;
use crate::zk::{BitRangeProof, Ccs08, PedersenParams, RangeProofSystem, Salt};
use chrono::{DateTime, Utc};
use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// What the owner publishes once its key is generated
#[derive(Debug, Clone)]
pub struct OwnerPublic {
    pub verifying_key: OwnerVerifyingKey,
    pub pedersen: PedersenParams,
}

pub struct DataOwner<S: SecretScheme> {
    scheme: Arc<S>,
    key: OwnerKey,
    pedersen: PedersenParams,
    universe: Universe,
    bases: Vec<Base>,
}

impl<S: SecretScheme> DataOwner<S> {
    pub fn new(scheme: Arc<S>, universe: Universe, bases: Vec<Base>) -> Result<Self> {
        Ok(Self {
            scheme,
            key: OwnerKey::generate()?,
            pedersen: PedersenParams::new(),
            universe,
            bases,
        })
    }

    pub fn public(&self) -> OwnerPublic {
        OwnerPublic {
            verifying_key: self.key.verifying_key(),
            pedersen: self.pedersen.clone(),
        }
    }

    fn builder(&self) -> ChainBuilder<'_, S> {
        ChainBuilder::new(self.scheme.as_ref(), &self.key, &self.pedersen, self.universe)
    }

    pub fn encrypt_only(&self) -> Result<EncryptedGenome<S::Cipher>> {
        self.builder().encrypt_only(&self.bases)
    }

    pub fn build_whole(&self) -> Result<WholeChain<S::Cipher>> {
        self.builder().build_whole(&self.bases)
    }

    pub fn build_range(&self) -> Result<RangeChain<S::Cipher>> {
        self.builder().build_range(&self.bases)
    }

    /// True when any of the results encrypts zero
    pub fn zero_test(&self, results: &[S::Cipher]) -> bool {
        results.par_iter().any(|c| self.scheme.is_zero(c))
    }

    /// Window covering `[query.start, query.end]` plus one boundary entry on each side
    pub fn locate_window(&self, chain: &RangeChain<S::Cipher>, query: QueryRange) -> Result<IndexRange> {
        let found = RangeLocator::new(self.universe)
            .locate(chain.positions(), query.start, query.end)?
            .ok_or(ProtocolError::NoOverlap {
                start: query.start,
                end: query.end,
            })?;
        found
            .widened()
            .filter(|window| window.end() < chain.len())
            .ok_or_else(|| {
                ProtocolError::RangeViolation(format!(
                    "located entries {}..={} touch a sentinel",
                    found.start(),
                    found.end()
                ))
            })
    }

    /// Range proofs for the first and last entries of `window`
    pub fn prove_boundaries<P: RangeProofSystem>(
        &self,
        chain: &RangeChain<S::Cipher>,
        window: IndexRange,
        lower_system: &P,
        upper_system: &P,
    ) -> Result<(P::Proof, P::Proof)> {
        let entry = |index: usize| -> Result<(u64, Salt)> {
            let salt = chain.salt(index).ok_or_else(|| {
                ProtocolError::RangeViolation(format!("no chain entry at index {}", index))
            })?;
            Ok((chain.positions()[index] as u64, *salt))
        };
        let (lower, upper) = rayon::join(
            || {
                let (position, salt) = entry(window.start())?;
                lower_system.prove(position, &salt)
            },
            || {
                let (position, salt) = entry(window.end())?;
                upper_system.prove(position, &salt)
            },
        );
        Ok((lower?, upper?))
    }
}

/// Tester side; `S` is a public handle such as [`PublicScheme`]
pub struct Tester<S: HomomorphicScheme> {
    scheme: S,
    owner: OwnerPublic,
    universe: Universe,
    mode: MatchingMode,
    marker: Marker<S::Cipher>,
}

impl<S: HomomorphicScheme> Tester<S> {
    pub fn new(
        scheme: S,
        owner: OwnerPublic,
        config: &ProtocolConfig,
        security_param: u32,
        query: &[Base],
    ) -> Result<Self> {
        let universe = config.universe()?;
        let marker = MarkerBuilder::new(&scheme, universe, security_param).build(query)?;
        Ok(Self {
            scheme,
            owner,
            universe,
            mode: MatchingMode::from_optimized(config.optimized),
            marker,
        })
    }

    pub fn marker(&self) -> &Marker<S::Cipher> {
        &self.marker
    }

    pub fn query_range(&self) -> QueryRange {
        self.marker.range()
    }

    /// Lower boundary in `[0, start)`, upper boundary in `[end + 1, universe + slack)`
    pub fn boundary_systems<P: RangeProofSystem>(&self, config: &ProtocolConfig) -> Result<(P, P)> {
        let range = self.query_range();
        let lower = P::setup(&self.owner.pedersen, 0, range.start as u64, config)?;
        let upper = P::setup(
            &self.owner.pedersen,
            range.end as u64 + 1,
            self.universe.max_position() as u64 + UPPER_PROOF_SLACK,
            config,
        )?;
        Ok((lower, upper))
    }

    fn verifier(&self) -> ChainVerifier<'_, S> {
        ChainVerifier::new(
            &self.scheme,
            &self.owner.verifying_key,
            &self.owner.pedersen,
            self.universe,
        )
    }

    fn aggregate_marked(&self, ciphers: &[S::Cipher], indices: &[usize]) -> Result<S::Cipher> {
        let terms: Vec<&S::Cipher> = indices
            .iter()
            .map(|&i| &ciphers[i])
            .chain(self.marker.ciphers().iter())
            .collect();
        MatchingEngine::new(&self.scheme).aggregate(&terms)
    }

    /// Unauthenticated: trust the owner's positions and aggregate
    pub fn test_baseline(&self, genome: &EncryptedGenome<S::Cipher>) -> Result<S::Cipher> {
        let indices = self
            .marker
            .positions()
            .iter()
            .map(|&p| {
                genome.index_of(p).ok_or_else(|| {
                    ProtocolError::RangeViolation(format!("position {} is not in the genome", p))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        self.aggregate_marked(genome.ciphers(), &indices)
    }

    pub fn test_whole(&self, chain: &WholeChain<S::Cipher>) -> Result<S::Cipher> {
        let indices = self.verifier().verify_whole(chain, self.marker.positions())?;
        self.aggregate_marked(chain.genome().ciphers(), &indices)
    }

    pub fn test_range_opened(
        &self,
        window: &RangeWindow<S::Cipher>,
        opened: &OpenedBoundaries,
    ) -> Result<Vec<S::Cipher>> {
        self.verifier().verify_opened(window, opened)?;
        MatchingEngine::new(&self.scheme).match_window(&window.ciphers, self.marker.ciphers(), self.mode)
    }

    pub fn test_range_proved<P: RangeProofSystem>(
        &self,
        window: &RangeWindow<S::Cipher>,
        lower_system: &P,
        upper_system: &P,
        lower_proof: &P::Proof,
        upper_proof: &P::Proof,
    ) -> Result<Vec<S::Cipher>> {
        self.verifier()
            .verify_proved(window, lower_system, upper_system, lower_proof, upper_proof)?;
        MatchingEngine::new(&self.scheme).match_window(&window.ciphers, self.marker.ciphers(), self.mode)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolMode {
    /// Unauthenticated whole-genome exact match
    Baseline,
    /// Signed whole-genome exact match
    WholeAuthenticated,
    /// Range chain, sentinels opened
    RangeOpened,
    /// Range chain, boundaries shown by range proofs
    RangeProved,
}

impl ProtocolMode {
    pub fn all() -> [ProtocolMode; 4] {
        [
            ProtocolMode::Baseline,
            ProtocolMode::WholeAuthenticated,
            ProtocolMode::RangeOpened,
            ProtocolMode::RangeProved,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProtocolMode::Baseline => "baseline",
            ProtocolMode::WholeAuthenticated => "whole",
            ProtocolMode::RangeOpened => "opened",
            ProtocolMode::RangeProved => "proved",
        }
    }
}

impl fmt::Display for ProtocolMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ProtocolMode {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "baseline" | "wpes13" => Ok(ProtocolMode::Baseline),
            "whole" | "s-sph" => Ok(ProtocolMode::WholeAuthenticated),
            "opened" | "es" => Ok(ProtocolMode::RangeOpened),
            "proved" | "fes" => Ok(ProtocolMode::RangeProved),
            other => Err(ProtocolError::Config(format!("unknown protocol mode '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseTiming {
    pub phase: String,
    pub micros: u128,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub mode: ProtocolMode,
    pub scheme: String,
    pub matched: bool,
    /// Ciphers the tester returned to the owner
    pub result_count: usize,
    pub timings: Vec<PhaseTiming>,
}

impl SessionReport {
    pub fn total_micros(&self) -> u128 {
        self.timings.iter().map(|t| t.micros).sum()
    }
}

/// Collects phase timings for one run
struct Stopwatch {
    mode: ProtocolMode,
    timings: Vec<PhaseTiming>,
}

impl Stopwatch {
    fn new(mode: ProtocolMode) -> Self {
        Self {
            mode,
            timings: Vec::new(),
        }
    }

    fn time<T>(&mut self, phase: &str, work: impl FnOnce() -> Result<T>) -> Result<T> {
        let started = Instant::now();
        let out = work()?;
        let micros = started.elapsed().as_micros();
        info!("[{}] {}: {} us", self.mode, phase, micros);
        self.timings.push(PhaseTiming {
            phase: phase.to_string(),
            micros,
        });
        Ok(out)
    }
}

const OWNER_OFFLINE: &str = "owner offline";
const VERIFIER_OFFLINE: &str = "verifier offline";
const VERIFIER_ONLINE: &str = "verifier online";
const OWNER_ONLINE: &str = "owner online";

pub struct Session<S: SecretScheme> {
    scheme: Arc<S>,
    config: ProtocolConfig,
}

impl<S: SecretScheme> Session<S> {
    pub fn new(scheme: Arc<S>, config: ProtocolConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { scheme, config })
    }

    /// Generate fresh scheme keys and wrap them in a session
    pub fn setup(config: ProtocolConfig) -> Result<Self> {
        Self::new(Arc::new(S::setup()?), config)
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    pub fn scheme(&self) -> &S {
        &self.scheme
    }

    pub fn run(&self, mode: ProtocolMode, owner_bases: &[Base], query: &[Base]) -> Result<SessionReport> {
        let started_at = Utc::now();
        let universe = self.config.universe()?;
        let owner = DataOwner::new(self.scheme.clone(), universe, owner_bases.to_vec())?;
        let mut clock = Stopwatch::new(mode);

        let (matched, result_count) = match mode {
            ProtocolMode::Baseline => {
                let genome = clock.time(OWNER_OFFLINE, || owner.encrypt_only())?;
                let tester = clock.time(VERIFIER_OFFLINE, || self.tester(&owner, 0, query))?;
                let result = clock.time(VERIFIER_ONLINE, || tester.test_baseline(&genome))?;
                let matched = clock.time(OWNER_ONLINE, || Ok(owner.zero_test(std::slice::from_ref(&result))))?;
                (matched, 1)
            }
            ProtocolMode::WholeAuthenticated => {
                let chain = clock.time(OWNER_OFFLINE, || owner.build_whole())?;
                let tester = clock.time(VERIFIER_OFFLINE, || self.tester(&owner, 0, query))?;
                let result = clock.time(VERIFIER_ONLINE, || tester.test_whole(&chain))?;
                let matched = clock.time(OWNER_ONLINE, || Ok(owner.zero_test(std::slice::from_ref(&result))))?;
                (matched, 1)
            }
            ProtocolMode::RangeOpened => {
                let chain = clock.time(OWNER_OFFLINE, || owner.build_range())?;
                let tester = clock.time(VERIFIER_OFFLINE, || self.tester(&owner, 0, query))?;
                let window = chain.full_window()?;
                let opened = chain.opened_boundaries();
                let results = clock.time(VERIFIER_ONLINE, || tester.test_range_opened(&window, &opened))?;
                let matched = clock.time(OWNER_ONLINE, || Ok(owner.zero_test(&results)))?;
                (matched, results.len())
            }
            ProtocolMode::RangeProved => match self.config.range_proof {
                RangeProofKind::BitDecomposition => {
                    self.run_range_proved::<BitRangeProof>(&owner, query, &mut clock)?
                }
                RangeProofKind::Ccs08 => self.run_range_proved::<Ccs08>(&owner, query, &mut clock)?,
            },
        };

        let report = SessionReport {
            id: Uuid::new_v4().to_string(),
            started_at,
            mode,
            scheme: self.scheme.name().to_string(),
            matched,
            result_count,
            timings: clock.timings,
        };
        info!(
            "[{}] {} over {} bases: matched={} results={} total={} us",
            mode,
            report.scheme,
            owner_bases.len(),
            report.matched,
            report.result_count,
            report.total_micros()
        );
        Ok(report)
    }

    fn tester(
        &self,
        owner: &DataOwner<S>,
        security_param: u32,
        query: &[Base],
    ) -> Result<Tester<PublicScheme<S>>> {
        let scheme = PublicScheme::new(self.scheme.clone());
        Tester::new(scheme, owner.public(), &self.config, security_param, query)
    }

    fn run_range_proved<P: RangeProofSystem>(
        &self,
        owner: &DataOwner<S>,
        query: &[Base],
        clock: &mut Stopwatch,
    ) -> Result<(bool, usize)> {
        let chain = clock.time(OWNER_OFFLINE, || owner.build_range())?;
        let (tester, systems) = clock.time(VERIFIER_OFFLINE, || {
            let tester = self.tester(owner, self.config.security_param, query)?;
            let systems = tester.boundary_systems::<P>(&self.config)?;
            Ok((tester, systems))
        })?;
        let (lower_system, upper_system) = systems;

        let (window, lower_proof, upper_proof) = clock.time("owner boundary proofs", || {
            let span = owner.locate_window(&chain, tester.query_range())?;
            let (lower, upper) = owner.prove_boundaries(&chain, span, &lower_system, &upper_system)?;
            Ok((chain.window(span.start(), span.end())?, lower, upper))
        })?;

        let results = clock.time(VERIFIER_ONLINE, || {
            tester.test_range_proved(&window, &lower_system, &upper_system, &lower_proof, &upper_proof)
        })?;
        let matched = clock.time(OWNER_ONLINE, || Ok(owner.zero_test(&results)))?;
        Ok((matched, results.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::scheme::clear::ClearScheme;
    use crate::crypto::{Bn254ElGamal, ModpElGamal, Paillier};
    use crate::genome::synthetic::{owner_genome, query_genome};

    fn small_config() -> ProtocolConfig {
        ProtocolConfig {
            universe_size: 1000,
            ..ProtocolConfig::default()
        }
    }

    fn sample() -> Vec<Base> {
        vec![Base::new(10, b'T'), Base::new(20, b'A'), Base::new(30, b'T')]
    }

    #[test]
    fn test_exact_match_every_mode() {
        let session = Session::<Bn254ElGamal>::setup(small_config()).unwrap();
        for mode in ProtocolMode::all() {
            let report = session.run(mode, &sample(), &sample()).unwrap();
            assert!(report.matched, "{}", mode);
            assert_eq!(report.mode, mode);
            assert_eq!(report.scheme, "ec-elgamal");
            assert_eq!(report.id.len(), 36);
            assert!(report.started_at <= Utc::now());
        }
    }

    #[test]
    fn test_single_symbol_change_every_mode() {
        let session = Session::<Bn254ElGamal>::setup(small_config()).unwrap();
        let mut query = sample();
        query[1].symbol = b'G';
        for mode in ProtocolMode::all() {
            let report = session.run(mode, &sample(), &query).unwrap();
            assert!(!report.matched, "{}", mode);
        }
    }

    #[test]
    fn test_result_counts() {
        let session = Session::<ClearScheme>::setup(small_config()).unwrap();
        let owner = owner_genome(60, 20, 30, false);
        let query = query_genome(20, 30, false);

        let whole = session.run(ProtocolMode::WholeAuthenticated, &owner, &query).unwrap();
        assert_eq!(whole.result_count, 1);
        assert_eq!(whole.timings.len(), 4);

        let opened = session.run(ProtocolMode::RangeOpened, &owner, &query).unwrap();
        assert!(opened.matched);
        assert_eq!(opened.result_count, 60);

        // query [20, 30] covers exactly 11 entries
        let proved = session.run(ProtocolMode::RangeProved, &owner, &query).unwrap();
        assert!(proved.matched);
        assert_eq!(proved.result_count, 11);
    }

    #[test]
    fn test_security_param_widens_window() {
        let config = ProtocolConfig {
            security_param: 5,
            ..small_config()
        };
        let session = Session::<ClearScheme>::setup(config).unwrap();
        let owner = owner_genome(60, 20, 30, false);
        let report = session
            .run(ProtocolMode::RangeProved, &owner, &query_genome(20, 30, false))
            .unwrap();
        assert!(report.matched);
        assert_eq!(report.result_count, 21);
    }

    #[test]
    fn test_ccs08_boundaries() {
        let config = ProtocolConfig {
            range_proof: RangeProofKind::Ccs08,
            ..small_config()
        };
        let session = Session::<ClearScheme>::setup(config).unwrap();
        let owner = owner_genome(40, 10, 15, false);
        let report = session
            .run(ProtocolMode::RangeProved, &owner, &query_genome(10, 15, false))
            .unwrap();
        assert!(report.matched);
        assert_eq!(report.result_count, 6);
    }

    #[test]
    fn test_range_proved_failures() {
        let session = Session::<ClearScheme>::setup(small_config()).unwrap();
        let owner = vec![Base::new(100, b'A'), Base::new(200, b'T'), Base::new(300, b'A')];

        let gap = session.run(ProtocolMode::RangeProved, &owner, &[Base::new(150, b'T')]);
        assert!(matches!(gap, Err(ProtocolError::NoOverlap { start: 150, end: 150 })));

        let long = session.run(
            ProtocolMode::RangeProved,
            &owner,
            &[Base::new(200, b'T'), Base::new(250, b'T')],
        );
        assert!(matches!(
            long,
            Err(ProtocolError::AlignmentUnderflow { marker: 2, window: 1 })
        ));
    }

    #[test]
    fn test_whole_mode_missing_position() {
        let session = Session::<ClearScheme>::setup(small_config()).unwrap();
        let result = session.run(ProtocolMode::WholeAuthenticated, &sample(), &[Base::new(15, b'T')]);
        assert!(matches!(result, Err(ProtocolError::RangeViolation(_))));
    }

    #[test]
    fn test_modp_whole_mode() {
        let session = Session::<ModpElGamal>::setup(small_config()).unwrap();
        let report = session
            .run(ProtocolMode::WholeAuthenticated, &sample(), &sample()[..2])
            .unwrap();
        assert!(report.matched);
        assert_eq!(report.scheme, "modp-elgamal");
    }

    #[test]
    fn test_paillier_sessions() {
        let scheme = Arc::new(Paillier::generate(512).unwrap());
        let session = Session::new(scheme, small_config()).unwrap();
        let whole = session
            .run(ProtocolMode::WholeAuthenticated, &sample(), &sample()[1..])
            .unwrap();
        assert!(whole.matched);
        assert_eq!(whole.scheme, "paillier");

        let mut query = sample();
        query[2].symbol = b'C';
        let opened = session.run(ProtocolMode::RangeOpened, &sample(), &query).unwrap();
        assert!(!opened.matched);
        assert_eq!(opened.result_count, 3);
    }

    #[test]
    fn test_locate_window_adds_boundaries() {
        let owner = DataOwner::new(Arc::new(ClearScheme), Universe::new(1000).unwrap(), sample()).unwrap();
        let chain = owner.build_range().unwrap();
        let window = owner.locate_window(&chain, QueryRange { start: 15, end: 25 }).unwrap();
        assert_eq!((window.start(), window.end(), window.len()), (1, 3, 3));

        let full = owner.locate_window(&chain, QueryRange { start: 10, end: 30 }).unwrap();
        assert_eq!((full.start(), full.end()), (0, 4));
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("fes".parse::<ProtocolMode>().unwrap(), ProtocolMode::RangeProved);
        assert_eq!("whole".parse::<ProtocolMode>().unwrap(), ProtocolMode::WholeAuthenticated);
        assert!("partial".parse::<ProtocolMode>().is_err());
    }
}
