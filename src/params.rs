//! Curve constants for GLV decomposition and NAF tables.
//!
//! A `CurveParams` instance gathers everything the decomposer and the
//! digit-table checks need: the prime group order `n`, the eigenvalue
//! `lambda` of the curve endomorphism (a non-trivial cube root of unity
//! modulo `n`), a reduced basis `(a1,b1)`, `(a2,b2)` of the lattice of
//! vectors `(x,y)` such that `x + y*lambda = 0 mod n`, the two rounding
//! multipliers `g1` and `g2`, the curve seed `u`, and the designed bounds
//! on the decomposition output.
//!
//! Instances are only obtained through `CurveParams::new()` (or the
//! helpers that call it), which validates the constants once; decoding
//! and decomposition code afterwards assumes consistency and performs no
//! further checks. The BN254 constants are available as a process-wide
//! value through `bn254()`.
//!
//! The rounding multipliers are fixed-point approximations, with a
//! 256-bit fractional part, of the rational lattice coordinates of the
//! target vector `(k,0)`:
//!
//! ```text
//!   g1 = floor(2^256 * |b1| / n)
//!   g2 = floor(2^256 * |b2| / n)
//! ```
//!
//! For a BN curve with seed `u`, all constants are polynomials in `u`
//! (see `CurveParams::from_bn_seed()`).

use core::convert::TryFrom;
use core::str::FromStr;
use std::sync::OnceLock;

use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer;
use num_traits::{Num, One, Signed, Zero};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::naf;

/// Number of fractional bits in the fixed-point rounding multipliers.
pub const ROUNDING_SHIFT: usize = 256;

/// Inclusive bounds on the two decomposition components.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bounds {
    pub k1_min: BigInt,
    pub k1_max: BigInt,
    pub k2_min: BigInt,
    pub k2_max: BigInt,
}

impl Bounds {

    /// Symmetric bounds `|k1|, |k2| < 2^128`.
    pub fn half_width() -> Self {
        let m: BigInt = (BigInt::one() << 128usize) - 1u32;
        Self {
            k1_min: -m.clone(),
            k1_max: m.clone(),
            k2_min: -m.clone(),
            k2_max: m,
        }
    }

    fn is_ordered(&self) -> bool {
        let z = BigInt::zero();
        self.k1_min <= z && z <= self.k1_max && self.k2_min <= z && z <= self.k2_max
    }
}

/// Curve constants, as provided by the caller (not validated yet).
#[derive(Clone, Debug)]
pub struct RawParams {
    pub u: i64,
    pub n: BigUint,
    pub lambda: BigUint,
    pub a1: BigInt,
    pub b1: BigInt,
    pub a2: BigInt,
    pub b2: BigInt,
    pub g1: BigUint,
    pub g2: BigUint,
    pub bounds: Bounds,
}

/// Validated curve constants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurveParams {
    u: i64,
    n: BigUint,
    n_signed: BigInt,
    lambda: BigUint,
    lambda_signed: BigInt,
    a1: BigInt,
    b1: BigInt,
    a2: BigInt,
    b2: BigInt,
    g1: BigUint,
    g2: BigUint,
    bounds: Bounds,
}

// Builds an integer from 64-bit limbs, most significant first.
fn w64be(limbs: &[u64]) -> BigUint {
    let mut x = BigUint::zero();
    for &w in limbs {
        x = (x << 64) | BigUint::from(w);
    }
    x
}

fn signed(x: &BigUint) -> BigInt {
    BigInt::from_biguint(Sign::Plus, x.clone())
}

// Deterministic Miller-Rabin with the first twelve primes as bases.
// This is exact below 3.3*10^24 and a probable-prime test beyond.
fn is_probable_prime(n: &BigUint) -> bool {
    const BASES: [u32; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

    if *n < BigUint::from(2u32) {
        return false;
    }
    for &b in BASES.iter() {
        let b = BigUint::from(b);
        if *n == b {
            return true;
        }
        if (n % &b).is_zero() {
            return false;
        }
    }

    let nm1 = n - 1u32;
    let s = nm1.trailing_zeros().unwrap_or(0);
    let d = &nm1 >> s;
    'bases: for &b in BASES.iter() {
        let mut x = BigUint::from(b).modpow(&d, n);
        if x.is_one() || x == nm1 {
            continue;
        }
        for _ in 1..s {
            x = (&x * &x) % n;
            if x == nm1 {
                continue 'bases;
            }
        }
        return false;
    }
    true
}

/// Parses a decimal or `0x`-prefixed hexadecimal integer, with an
/// optional leading minus sign.
pub fn parse_int(s: &str) -> Result<BigInt> {
    let t = s.trim();
    let (neg, t) = match t.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, t),
    };
    let v = if let Some(h) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        BigInt::from_str_radix(h, 16)
    } else {
        BigInt::from_str(t)
    };
    let v = v.map_err(|_| Error::Parse(format!("not an integer: {:?}", s)))?;
    if neg {
        Ok(-v)
    } else {
        Ok(v)
    }
}

fn parse_uint(s: &str) -> Result<BigUint> {
    parse_int(s)?
        .to_biguint()
        .ok_or_else(|| Error::Parse(format!("expected a non-negative integer: {:?}", s)))
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct BoundsFile {
    k1_min: String,
    k1_max: String,
    k2_min: String,
    k2_max: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ParamsFile {
    u: i64,
    n: String,
    lambda: String,
    a1: String,
    b1: String,
    a2: String,
    b2: String,
    g1: String,
    g2: String,
    #[serde(default)]
    bounds: Option<BoundsFile>,
}

impl CurveParams {

    /// Validates the provided constants.
    ///
    /// The following conditions are checked, in that order:
    ///
    ///  - `n` is an odd probable prime, greater than 3;
    ///  - `1 < lambda < n` and `lambda^2 + lambda + 1 = 0 mod n`;
    ///  - `a1 + b1*lambda = 0 mod n` and `a2 + b2*lambda = 0 mod n`;
    ///  - `b1 < 0 < b2` and `a1*b2 - a2*b1 = n` (the orientation assumed
    ///    by the rounding in `glv::decompose()`);
    ///  - `g1` and `g2` are the 256-bit fixed-point quotients of `|b1|`
    ///    and `|b2|` by `n` (rounded low);
    ///  - the bounds enclose zero.
    pub fn new(raw: RawParams) -> Result<Self> {
        let RawParams { u, n, lambda, a1, b1, a2, b2, g1, g2, bounds } = raw;

        if n <= BigUint::from(3u32) || n.is_even() || !is_probable_prime(&n) {
            return Err(Error::InvalidParams("group order is not an odd prime"));
        }
        if lambda <= BigUint::one() || lambda >= n {
            return Err(Error::InvalidParams("eigenvalue is not in the 2..n-1 range"));
        }
        if !((&lambda * &lambda + &lambda + 1u32) % &n).is_zero() {
            return Err(Error::InvalidParams("eigenvalue is not a cube root of unity"));
        }

        let n_signed = signed(&n);
        let lambda_signed = signed(&lambda);
        let in_kernel = |a: &BigInt, b: &BigInt| (a + b * &lambda_signed).mod_floor(&n_signed).is_zero();
        if !in_kernel(&a1, &b1) || !in_kernel(&a2, &b2) {
            return Err(Error::InvalidParams("basis vector is not in the kernel lattice"));
        }
        if !b1.is_negative() || !b2.is_positive() {
            return Err(Error::InvalidParams("basis is not oriented with b1 < 0 < b2"));
        }
        if &a1 * &b2 - &a2 * &b1 != n_signed {
            return Err(Error::InvalidParams("basis determinant is not the group order"));
        }

        if g1 != (b1.magnitude() << ROUNDING_SHIFT) / &n
            || g2 != (b2.magnitude() << ROUNDING_SHIFT) / &n
        {
            return Err(Error::InvalidParams("rounding multipliers do not match the basis"));
        }

        if !bounds.is_ordered() {
            return Err(Error::InvalidParams("bounds do not enclose zero"));
        }

        debug!(u, order_bits = n.bits(), "validated curve parameters");
        Ok(Self {
            u,
            n,
            n_signed,
            lambda,
            lambda_signed,
            a1,
            b1,
            a2,
            b2,
            g1,
            g2,
            bounds,
        })
    }

    /// Returns the BN254 constants (validated).
    pub fn bn254() -> Result<Self> {
        let basis_short = BigInt::from(0x89D3256894D213E3u64);
        Self::new(RawParams {
            u: 4965661367192848881,
            n: w64be(&[
                0x30644E72E131A029, 0xB85045B68181585D,
                0x2833E84879B97091, 0x43E1F593F0000001,
            ]),
            lambda: w64be(&[
                0xB3C4D79D41A91758, 0x5BFC41088D8DAAA7, 0x8B17EA66B99C90DD,
            ]),
            a1: basis_short.clone(),
            b1: -signed(&w64be(&[0x6F4D8248EEB859FC, 0x8211BBEB7D4F1128])),
            a2: signed(&w64be(&[0x6F4D8248EEB859FD, 0x0BE4E1541221250B])),
            b2: basis_short,
            g1: w64be(&[0x0000000000000002, 0x4CCEF014A773D2CF, 0x7A7BD9D4391EB18D]),
            g2: w64be(&[0x0000000000000002, 0xD91D232EC7E0B3D7]),
            bounds: Bounds {
                k1_min: BigInt::zero(),
                k1_max: signed(&w64be(&[0x7CEFBF97EDA3A337, 0x458F9756FEC7405E])),
                k2_min: -signed(&w64be(&[0x786722CB88AC5D26, 0xDB32F86C2056FFCB])),
                k2_max: BigInt::from(0x44E992B44A6909F3u64),
            },
        })
    }

    /// Derives the constants of the BN curve with seed `u`.
    ///
    /// The group order and eigenvalue are `n = 36u^4 + 36u^3 + 18u^2 + 6u + 1`
    /// and `lambda = 36u^3 + 18u^2 + 6u + 1`; the lattice basis is
    /// `(2u+1, -(6u^2+2u))`, `(6u^2+4u+1, 2u+1)` for `u > 0`. For `u < 0`
    /// the same two vectors are reordered and one is negated, to get
    /// `(6u^2+4u+1, 2u+1)`, `(-(2u+1), 6u^2+2u)`. Bounds are set to the
    /// generic `Bounds::half_width()`.
    pub fn from_bn_seed(u: i64) -> Result<Self> {
        let x = BigInt::from(u);
        let x2: BigInt = &x * &x;
        let x3: BigInt = &x2 * &x;
        let x4: BigInt = &x3 * &x;
        let n: BigInt = &x4 * 36u32 + &x3 * 36u32 + &x2 * 18u32 + &x * 6u32 + 1u32;
        let lambda: BigInt = &x3 * 36u32 + &x2 * 18u32 + &x * 6u32 + 1u32;
        let lambda = lambda.mod_floor(&n);
        let n = n
            .to_biguint()
            .ok_or(Error::InvalidParams("seed yields a non-positive group order"))?;
        let lambda = lambda
            .to_biguint()
            .ok_or(Error::InvalidParams("seed yields a negative eigenvalue"))?;

        let s: BigInt = &x * 2u32 + 1u32;
        let t: BigInt = &x2 * 6u32 + &x * 2u32;
        let w: BigInt = &x2 * 6u32 + &x * 4u32 + 1u32;
        let (a1, b1, a2, b2) = if u > 0 {
            (s.clone(), -t, w, s)
        } else {
            (w, s.clone(), -s, t)
        };
        let g1 = (b1.magnitude() << ROUNDING_SHIFT) / &n;
        let g2 = (b2.magnitude() << ROUNDING_SHIFT) / &n;
        Self::new(RawParams {
            u, n, lambda, a1, b1, a2, b2, g1, g2,
            bounds: Bounds::half_width(),
        })
    }

    /// Loads constants from a JSON document and validates them.
    ///
    /// Integers are given as strings, in decimal or with a `0x` prefix;
    /// the `bounds` object is optional (defaults to
    /// `Bounds::half_width()`).
    pub fn from_json(doc: &str) -> Result<Self> {
        let f: ParamsFile = serde_json::from_str(doc)?;
        let bounds = match f.bounds {
            Some(b) => Bounds {
                k1_min: parse_int(&b.k1_min)?,
                k1_max: parse_int(&b.k1_max)?,
                k2_min: parse_int(&b.k2_min)?,
                k2_max: parse_int(&b.k2_max)?,
            },
            None => Bounds::half_width(),
        };
        Self::new(RawParams {
            u: f.u,
            n: parse_uint(&f.n)?,
            lambda: parse_uint(&f.lambda)?,
            a1: parse_int(&f.a1)?,
            b1: parse_int(&f.b1)?,
            a2: parse_int(&f.a2)?,
            b2: parse_int(&f.b2)?,
            g1: parse_uint(&f.g1)?,
            g2: parse_uint(&f.g2)?,
            bounds,
        })
    }

    /// Curve seed `u`.
    pub fn u(&self) -> i64 {
        self.u
    }

    /// Returns `6u+2`, the Miller loop length of the optimal ate pairing.
    pub fn six_u_plus_2(&self) -> BigInt {
        BigInt::from(self.u) * 6 + 2
    }

    /// Group order `n`.
    pub fn n(&self) -> &BigUint {
        &self.n
    }

    pub(crate) fn n_signed(&self) -> &BigInt {
        &self.n_signed
    }

    /// Endomorphism eigenvalue.
    pub fn lambda(&self) -> &BigUint {
        &self.lambda
    }

    pub(crate) fn lambda_signed(&self) -> &BigInt {
        &self.lambda_signed
    }

    /// First basis vector `(a1, b1)`.
    pub fn v1(&self) -> (&BigInt, &BigInt) {
        (&self.a1, &self.b1)
    }

    /// Second basis vector `(a2, b2)`.
    pub fn v2(&self) -> (&BigInt, &BigInt) {
        (&self.a2, &self.b2)
    }

    /// Rounding multipliers `(g1, g2)`.
    pub fn g(&self) -> (&BigUint, &BigUint) {
        (&self.g1, &self.g2)
    }

    /// Designed bounds on the decomposition components.
    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Returns a copy of these constants with other bounds.
    pub fn with_bounds(&self, bounds: Bounds) -> Result<Self> {
        if !bounds.is_ordered() {
            return Err(Error::InvalidParams("bounds do not enclose zero"));
        }
        let mut p = self.clone();
        p.bounds = bounds;
        Ok(p)
    }
}

impl TryFrom<RawParams> for CurveParams {
    type Error = Error;

    fn try_from(raw: RawParams) -> Result<Self> {
        Self::new(raw)
    }
}

static BN254: OnceLock<CurveParams> = OnceLock::new();

/// Process-wide BN254 constants.
///
/// On first call, the constants are validated and the committed Miller
/// loop digit tables are checked against a fresh encoding of `6u+2`.
/// A failure in either step means that the constants and the code that
/// consumes them are out of sync; this is a fatal configuration error,
/// and this function panics.
pub fn bn254() -> &'static CurveParams {
    BN254.get_or_init(|| {
        let p = match CurveParams::bn254() {
            Ok(p) => p,
            Err(e) => panic!("BN254 constants are inconsistent: {}", e),
        };
        if let Err(e) = naf::check_tables(&p) {
            panic!("BN254 Miller loop tables are out of sync: {}", e);
        }
        info!(u = p.u, "BN254 constants initialised");
        p
    })
}

// ========================================================================
