//! Offline verification of decomposition bounds.
//!
//! The size of the GLV decomposition output is a property of the curve
//! constants, not an algebraic identity; before the constants are trusted
//! (and whenever they change), bound claims such as "`k1` is never
//! negative" or "`k2` never exceeds `X`" must be checked over the whole
//! `[0, n)` range. This module answers such queries with one of three
//! verdicts:
//!
//!  - `Verdict::Witness`: a concrete scalar `k` violates the claim (the
//!    query predicate holds for `decompose(k)`);
//!  - `Verdict::NoWitness`: no scalar in `[0, n)` satisfies the query
//!    predicate; this is a proof, not a sampling result;
//!  - `Verdict::Indeterminate`: the search budget was exhausted. This is
//!    NOT a proof and must never be treated as a passing check.
//!
//! A query is a single comparison between one component and a constant,
//! e.g. `k2 < -160042871798160843020181221280528662475`. The verifier
//! first probes scalars near both ends of the range and a number of
//! pseudo-random scalars (from a seeded SHAKE256 stream, so that runs are
//! reproducible). It then runs a branch-and-bound search over `[0, n)`:
//!
//!  - On an interval `[lo, hi]`, the rounding coefficients `c1` and `c2`
//!    are non-decreasing in `k`, so their ranges are given by their values
//!    at `lo` and `hi`.
//!  - If both coefficients are constant over the interval (a _cell_), then
//!    `k2` is constant and `k1 = k - r` for a fixed `r`; the query is
//!    decided exactly on the cell.
//!  - Otherwise, `k2` is linear in `(c1, c2)` and its range follows from
//!    the coefficient ranges, while `k1` is known to lie in
//!    `[lo - (n-1), hi]`. If the query predicate cannot hold over that
//!    range, the interval is discarded; otherwise it is split in two
//!    halves, the lower half being explored first.
//!
//! The number of visited intervals is bounded by `SearchConfig::max_cells`.

use core::fmt;
use core::str::FromStr;

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::Zero;
use rand_core::{CryptoRng, Error as RngError, RngCore};
use sha3::digest::{ExtendableOutput, Update, XofReader};
use sha3::{Shake256, Shake256Reader};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::glv::{decompose, lambda_offset, rounding_coefficients, second_component, Decomposition};
use crate::params::{parse_int, CurveParams};

/// Decomposition component targeted by a query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Component {
    K1,
    K2,
}

/// Comparison operator of a query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Relation {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Relation {

    fn symbol(self) -> &'static str {
        match self {
            Relation::Eq => "==",
            Relation::Ne => "!=",
            Relation::Lt => "<",
            Relation::Le => "<=",
            Relation::Gt => ">",
            Relation::Ge => ">=",
        }
    }

    /// Evaluates `v <rel> c`.
    pub fn eval(self, v: &BigInt, c: &BigInt) -> bool {
        match self {
            Relation::Eq => v == c,
            Relation::Ne => v != c,
            Relation::Lt => v < c,
            Relation::Le => v <= c,
            Relation::Gt => v > c,
            Relation::Ge => v >= c,
        }
    }

    // Returns a value v in [lo, hi] such that v <rel> c, if there is one.
    fn pick(self, lo: &BigInt, hi: &BigInt, c: &BigInt) -> Option<BigInt> {
        if lo > hi {
            return None;
        }
        let v = match self {
            Relation::Eq => c,
            Relation::Ne => if lo != c { lo } else { hi },
            Relation::Lt | Relation::Le => lo,
            Relation::Gt | Relation::Ge => hi,
        };
        if v >= lo && v <= hi && self.eval(v, c) {
            Some(v.clone())
        } else {
            None
        }
    }
}

/// A bound query: "is there a scalar `k` such that `component <rel> bound`?".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Query {
    pub component: Component,
    pub relation: Relation,
    pub bound: BigInt,
}

impl Query {

    pub fn new(component: Component, relation: Relation, bound: BigInt) -> Self {
        Self { component, relation, bound }
    }

    /// Evaluates the query predicate on a decomposition.
    pub fn matches(&self, d: &Decomposition) -> bool {
        let v = match self.component {
            Component::K1 => &d.k1,
            Component::K2 => &d.k2,
        };
        self.relation.eval(v, &self.bound)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self.component {
            Component::K1 => "k1",
            Component::K2 => "k2",
        };
        write!(f, "{} {} {}", c, self.relation.symbol(), self.bound)
    }
}

impl FromStr for Query {
    type Err = Error;

    /// Parses `k1|k2 <op> <integer>`, with `op` one of `==`, `!=`, `<`,
    /// `<=`, `>`, `>=`; the integer is decimal or `0x`-prefixed
    /// hexadecimal, with an optional minus sign.
    fn from_str(s: &str) -> Result<Self> {
        let t = s.trim();
        let (component, rest) = if let Some(r) = t.strip_prefix("k1") {
            (Component::K1, r)
        } else if let Some(r) = t.strip_prefix("k2") {
            (Component::K2, r)
        } else {
            return Err(Error::Parse(format!("unknown component in query {:?}", s)));
        };
        let rest = rest.trim_start();
        const OPS: [(&str, Relation); 6] = [
            ("==", Relation::Eq),
            ("!=", Relation::Ne),
            ("<=", Relation::Le),
            (">=", Relation::Ge),
            ("<", Relation::Lt),
            (">", Relation::Gt),
        ];
        for (sym, relation) in OPS.iter() {
            if let Some(r) = rest.strip_prefix(*sym) {
                let bound = parse_int(r)?;
                return Ok(Self::new(component, *relation, bound));
            }
        }
        Err(Error::Parse(format!("unknown relation in query {:?}", s)))
    }
}

/// A scalar and its decomposition, satisfying a query predicate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Witness {
    pub k: BigUint,
    pub decomposition: Decomposition,
}

/// Outcome of a query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// The predicate holds for this scalar.
    Witness(Witness),
    /// The predicate holds for no scalar in `[0, n)`.
    NoWitness,
    /// The search budget was exhausted after visiting that many intervals.
    Indeterminate { cells: u64 },
}

impl Verdict {

    /// Returns `true` only when it was proven that no witness exists.
    pub fn holds(&self) -> bool {
        matches!(self, Verdict::NoWitness)
    }

    pub fn witness(&self) -> Option<&Witness> {
        match self {
            Verdict::Witness(w) => Some(w),
            _ => None,
        }
    }

    pub fn is_indeterminate(&self) -> bool {
        matches!(self, Verdict::Indeterminate { .. })
    }
}

/// Search parameters.
#[derive(Clone, Debug)]
pub struct SearchConfig {
    /// Number of scalars probed at each end of the range.
    pub edge_probes: u64,
    /// Number of pseudo-random scalars probed.
    pub random_probes: u64,
    /// Maximum number of intervals visited by the exhaustive search.
    pub max_cells: u64,
    /// Seed for the pseudo-random probes.
    pub seed: Vec<u8>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            edge_probes: 256,
            random_probes: 1024,
            max_cells: 65536,
            seed: b"bnglv".to_vec(),
        }
    }
}

impl SearchConfig {

    /// A configuration with no probing, only the exhaustive search.
    pub fn search_only(max_cells: u64) -> Self {
        Self {
            edge_probes: 0,
            random_probes: 0,
            max_cells,
            seed: Vec::new(),
        }
    }
}

/// Deterministic random generator over a SHAKE256 output stream.
pub struct XofRng(Shake256Reader);

impl XofRng {

    pub fn new(seed: &[u8]) -> Self {
        let mut sh = Shake256::default();
        sh.update(seed);
        Self(sh.finalize_xof())
    }
}

impl RngCore for XofRng {
    fn next_u32(&mut self) -> u32 {
        let mut buf = [0u8; 4];
        self.0.read(&mut buf);
        u32::from_le_bytes(buf)
    }

    fn next_u64(&mut self) -> u64 {
        let mut buf = [0u8; 8];
        self.0.read(&mut buf);
        u64::from_le_bytes(buf)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.0.read(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> core::result::Result<(), RngError> {
        self.0.read(dest);
        Ok(())
    }
}

impl CryptoRng for XofRng {}

/// Returns a random integer in `[0, n)`.
///
/// 64 extra bits are drawn before reduction, which makes the bias
/// negligible.
pub fn random_below<T: RngCore>(rng: &mut T, n: &BigUint) -> BigUint {
    let len = ((n.bits() + 64 + 7) >> 3) as usize;
    let mut buf = vec![0u8; len];
    rng.fill_bytes(&mut buf);
    BigUint::from_bytes_le(&buf) % n
}

fn int(x: &BigUint) -> BigInt {
    BigInt::from_biguint(Sign::Plus, x.clone())
}

// Range of m*c for c in [clo, chi].
fn scaled_range(clo: &BigInt, chi: &BigInt, m: &BigInt) -> (BigInt, BigInt) {
    let x = clo * m;
    let y = chi * m;
    if x <= y {
        (x, y)
    } else {
        (y, x)
    }
}

/// Bound verifier for one set of curve constants.
pub struct Verifier<'a> {
    params: &'a CurveParams,
    config: SearchConfig,
}

impl<'a> Verifier<'a> {

    pub fn new(params: &'a CurveParams, config: SearchConfig) -> Self {
        Self { params, config }
    }

    /// Answers a single query.
    pub fn check(&self, query: &Query) -> Verdict {
        debug!(query = %query, "probing");
        if let Some(w) = self.probe(query) {
            info!(query = %query, k = %w.k, "witness found by probing");
            return Verdict::Witness(w);
        }
        let v = self.search(query);
        match &v {
            Verdict::Witness(w) => info!(query = %query, k = %w.k, "witness found by search"),
            Verdict::NoWitness => info!(query = %query, "no witness exists"),
            Verdict::Indeterminate { cells } => {
                warn!(query = %query, cells, "search budget exhausted, result is indeterminate")
            }
        }
        v
    }

    /// Answers a batch of queries, in order.
    pub fn check_all(&self, queries: &[Query]) -> Vec<Verdict> {
        queries.iter().map(|q| self.check(q)).collect()
    }

    /// Queries the four violations of the designed bounds of the curve
    /// (`k1 < k1_min`, `k1 > k1_max`, `k2 < k2_min`, `k2 > k2_max`).
    pub fn check_bounds(&self) -> Vec<(Query, Verdict)> {
        let b = self.params.bounds();
        let queries = [
            Query::new(Component::K1, Relation::Lt, b.k1_min.clone()),
            Query::new(Component::K1, Relation::Gt, b.k1_max.clone()),
            Query::new(Component::K2, Relation::Lt, b.k2_min.clone()),
            Query::new(Component::K2, Relation::Gt, b.k2_max.clone()),
        ];
        queries
            .iter()
            .map(|q| (q.clone(), self.check(q)))
            .collect()
    }

    // Decomposes k and returns it as a witness if it satisfies the query.
    fn try_scalar(&self, query: &Query, k: BigUint) -> Option<Witness> {
        let decomposition = decompose(self.params, &k).ok()?;
        if query.matches(&decomposition) {
            Some(Witness { k, decomposition })
        } else {
            None
        }
    }

    fn probe(&self, query: &Query) -> Option<Witness> {
        let n = self.params.n();
        let edge = BigUint::from(self.config.edge_probes).min(n.clone());
        let mut i = BigUint::zero();
        while i < edge {
            if let Some(w) = self.try_scalar(query, i.clone()) {
                return Some(w);
            }
            if let Some(w) = self.try_scalar(query, n - 1u32 - &i) {
                return Some(w);
            }
            i += 1u32;
        }

        let mut rng = XofRng::new(&self.config.seed);
        for _ in 0..self.config.random_probes {
            if let Some(w) = self.try_scalar(query, random_below(&mut rng, n)) {
                return Some(w);
            }
        }
        None
    }

    fn search(&self, query: &Query) -> Verdict {
        let p = self.params;
        let nm1 = int(p.n()) - 1;
        let (_, b1) = p.v1();
        let (_, b2) = p.v2();
        let (m1, m2) = (-b1, -b2);

        let mut stack = vec![(BigUint::zero(), p.n() - 1u32)];
        let mut cells = 0u64;
        while let Some((lo, hi)) = stack.pop() {
            if cells >= self.config.max_cells {
                return Verdict::Indeterminate { cells };
            }
            cells += 1;

            let (c1lo, c2lo) = rounding_coefficients(p, &lo);
            let (c1hi, c2hi) = rounding_coefficients(p, &hi);
            let (c1lo, c2lo, c1hi, c2hi) = (int(&c1lo), int(&c2lo), int(&c1hi), int(&c2hi));
            let ilo = int(&lo);
            let ihi = int(&hi);

            if c1lo == c1hi && c2lo == c2hi {
                // Exact cell.
                let k2 = second_component(p, &c1lo, &c2lo);
                let k = match query.component {
                    Component::K2 => {
                        if query.relation.eval(&k2, &query.bound) {
                            Some(lo)
                        } else {
                            None
                        }
                    }
                    Component::K1 => {
                        let r = lambda_offset(p, &k2);
                        query.relation
                            .pick(&(&ilo - &r), &(&ihi - &r), &query.bound)
                            .and_then(|v| (v + &r).to_biguint())
                    }
                };
                if let Some(k) = k {
                    if let Some(w) = self.try_scalar(query, k) {
                        debug!(cells, "witness cell found");
                        return Verdict::Witness(w);
                    }
                }
                continue;
            }

            let (vlo, vhi) = match query.component {
                Component::K1 => (&ilo - &nm1, ihi),
                Component::K2 => {
                    let (x1, y1) = scaled_range(&c1lo, &c1hi, &m1);
                    let (x2, y2) = scaled_range(&c2lo, &c2hi, &m2);
                    (x1 + x2, y1 + y2)
                }
            };
            if query.relation.pick(&vlo, &vhi, &query.bound).is_none() {
                continue;
            }

            let mid = (&lo + &hi) >> 1;
            stack.push((&mid + 1u32, hi));
            stack.push((lo, mid));
        }
        debug!(cells, "search tree exhausted");
        Verdict::NoWitness
    }
}

// ========================================================================

#[cfg(test)]
mod tests {

    use super::*;
    use crate::params::{bn254, Bounds};
    use num_traits::One;

    fn init_logs() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn q(s: &str) -> Query {
        s.parse().unwrap()
    }

    #[test]
    fn parse_queries() {
        let x = q("k1 > 123");
        assert_eq!(x, Query::new(Component::K1, Relation::Gt, BigInt::from(123)));
        let x = q("  k2<=-0x10 ");
        assert_eq!(x, Query::new(Component::K2, Relation::Le, BigInt::from(-16)));
        assert_eq!(x.to_string(), "k2 <= -16");
        assert_eq!(q(&x.to_string()), x);
        assert_eq!(q("k2 != 5").relation, Relation::Ne);
        assert_eq!(q("k1 >= 0").relation, Relation::Ge);
        assert_eq!(q("k1 == 0").relation, Relation::Eq);
        assert_eq!(q("k1 < 0").relation, Relation::Lt);

        assert!(matches!("k3 > 1".parse::<Query>(), Err(Error::Parse(_))));
        assert!(matches!("k1 => 1".parse::<Query>(), Err(Error::Parse(_))));
        assert!(matches!("k1 > abc".parse::<Query>(), Err(Error::Parse(_))));
    }

    #[test]
    fn impossible_bounds() {
        init_logs();
        let p = bn254();
        let v = Verifier::new(p, SearchConfig::default());
        let n = p.n();
        let queries = [
            q(&format!("k1 >= {}", n)),
            q(&format!("k1 < -{}", n)),
            q(&format!("k2 > {}", BigInt::one() << 200)),
            q(&format!("k2 < -{}", BigInt::one() << 200)),
        ];
        for (query, verdict) in queries.iter().zip(v.check_all(&queries)) {
            assert_eq!(verdict, Verdict::NoWitness, "{}", query);
            assert!(verdict.holds());
        }
    }

    #[test]
    fn false_bounds() {
        init_logs();
        let p = bn254();
        let v = Verifier::new(p, SearchConfig::default());

        // Edge probing.
        let w = v.check(&q("k1 == 3")).witness().cloned().unwrap();
        assert_eq!(w.k, BigUint::from(3u32));

        // Found at the top end of the range.
        let verdict = v.check(&q("k2 < 0"));
        let w = verdict.witness().unwrap();
        assert!(!verdict.holds());
        assert!(w.decomposition.k2 < BigInt::zero());
        assert_eq!(decompose(p, &w.k).unwrap(), w.decomposition);
        assert_eq!(w.decomposition.recombine(p), w.k);
    }

    #[test]
    fn search_finds_witnesses() {
        init_logs();
        let p = bn254();
        let v = Verifier::new(p, SearchConfig::search_only(4096));

        let w = v.check(&q("k1 == 5")).witness().cloned().unwrap();
        assert_eq!(w.k, BigUint::from(5u32));
        assert_eq!(w.decomposition.k2, BigInt::zero());

        // Largest positive k2; it is reached only in narrow cells right
        // after a step of c1.
        let w = v.check(&q("k2 == 4965661367192848883")).witness().cloned().unwrap();
        assert_eq!(w.decomposition.k2, p.bounds().k2_max);
        assert_eq!(decompose(p, &w.k).unwrap(), w.decomposition);

        let w = v.check(&q("k2 > 0")).witness().cloned().unwrap();
        assert!(w.decomposition.k2 > BigInt::zero());
    }

    #[test]
    fn tight_bounds_are_indeterminate() {
        init_logs();
        let p = bn254();
        let config = SearchConfig {
            edge_probes: 16,
            random_probes: 64,
            max_cells: 512,
            seed: b"tight".to_vec(),
        };
        let v = Verifier::new(p, config);
        let verdict = v.check(&q("k1 > 166069116403752002167832803607207952478"));
        assert_eq!(verdict, Verdict::Indeterminate { cells: 512 });
        assert!(!verdict.holds());

        for (query, verdict) in v.check_bounds() {
            assert!(verdict.is_indeterminate(), "{}: {:?}", query, verdict);
        }
    }

    // BN curve with seed u = 1 (n = 97), with the exact bounds of its
    // decomposition.
    fn toy_curve() -> CurveParams {
        CurveParams::from_bn_seed(1).unwrap().with_bounds(Bounds {
            k1_min: BigInt::zero(),
            k1_max: BigInt::from(13),
            k2_min: BigInt::from(-7),
            k2_max: BigInt::from(2),
        }).unwrap()
    }

    #[test]
    fn toy_bounds_proven() {
        init_logs();
        let p = toy_curve();
        for config in [SearchConfig::search_only(256), SearchConfig::default()].iter() {
            let v = Verifier::new(&p, config.clone());
            for (query, verdict) in v.check_bounds() {
                assert_eq!(verdict, Verdict::NoWitness, "{}", query);
            }
        }

        // One step tighter, each bound is refuted by the search.
        let v = Verifier::new(&p, SearchConfig::search_only(256));
        for s in ["k1 > 12", "k2 < -6", "k2 > 1"].iter() {
            let w = v.check(&q(s)).witness().cloned().unwrap();
            assert!(q(s).matches(&w.decomposition), "{}", s);
        }
    }

    #[test]
    fn toy_exhaustive_queries() {
        let p = toy_curve();
        let all: Vec<Decomposition> = (0..97u32)
            .map(|k| decompose(&p, &BigUint::from(k)).unwrap())
            .collect();
        let v = Verifier::new(&p, SearchConfig::search_only(256));
        let relations = [
            Relation::Eq, Relation::Ne, Relation::Lt,
            Relation::Le, Relation::Gt, Relation::Ge,
        ];
        for &component in [Component::K1, Component::K2].iter() {
            for &relation in relations.iter() {
                for c in -20..=20 {
                    let query = Query::new(component, relation, BigInt::from(c));
                    let expected = all.iter().any(|d| query.matches(d));
                    match v.check(&query) {
                        Verdict::Witness(w) => {
                            assert!(expected, "{}", query);
                            assert!(query.matches(&w.decomposition), "{}", query);
                            assert_eq!(decompose(&p, &w.k).unwrap(), w.decomposition);
                        }
                        Verdict::NoWitness => assert!(!expected, "{}", query),
                        r => panic!("{}: {:?}", query, r),
                    }
                }
            }
        }
    }

    #[test]
    fn xof_rng() {
        let n = bn254().n();
        let mut r1 = XofRng::new(b"seed");
        let mut r2 = XofRng::new(b"seed");
        let mut r3 = XofRng::new(b"other");
        for _ in 0..16 {
            let x = random_below(&mut r1, n);
            assert!(x < *n);
            assert_eq!(x, random_below(&mut r2, n));
        }
        assert_ne!(r1.next_u64(), r3.next_u64());
    }
}
