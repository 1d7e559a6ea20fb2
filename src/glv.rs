//! GLV scalar decomposition.
//!
//! Given a scalar `k` in the `[0, n)` range, `decompose()` returns two
//! signed integers `k1` and `k2` such that `k = k1 + k2*lambda mod n`,
//! with `k1` and `k2` about half the size of `n`. A scalar
//! multiplication `k*P` can then be computed as `k1*P + k2*phi(P)`,
//! where `phi` is the curve endomorphism (`phi(P) = lambda*P`), with
//! half as many doublings.
//!
//! The decomposition is closed-form; no search is involved. The lattice
//! `L` of vectors `(x,y)` with `x + y*lambda = 0 mod n` has a reduced
//! basis `v1 = (a1,b1)`, `v2 = (a2,b2)` with determinant `n`. We write:
//!
//! ```text
//!   (k,0) = (k*b2/n)*v1 + (k*|b1|/n)*v2
//! ```
//!
//! (which holds because `a1*b2 - a2*b1 = n`), and approximate the two
//! rational coordinates with the fixed-point multipliers `g2` and `g1`:
//!
//! ```text
//!   c1 = floor(g2*k / 2^256)
//!   c2 = floor(g1*k / 2^256)
//! ```
//!
//! The lattice vector `c1*v1 + c2*v2` is then close to `(k,0)`, and the
//! difference `(k,0) - c1*v1 - c2*v2` is a short vector which is
//! congruent to `(k,0)` modulo `L`. Its second coordinate is
//! `k2 = -(c1*b1 + c2*b2)`; instead of computing the first coordinate
//! from the basis, we set `k1 = k - (k2*lambda mod n)`, so that the
//! congruence holds by construction regardless of rounding.
//!
//! The congruence is an algebraic identity. The _size_ of `k1` and `k2`
//! is not: it depends on the specific basis and multipliers, and is
//! checked against the designed bounds of the curve (see
//! `Decomposition::within_bounds()` and the `verify` module). For BN254,
//! `k1` is in `[0, 166069116403752002167832803607207952478]` and `k2` in
//! `[-160042871798160843020181221280528662475, 4965661367192848883]`,
//! so both fit in 128 bits in absolute value.
//!
//! This code is not constant-time.

use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer;
use num_traits::{Signed, ToPrimitive};

use crate::error::{Error, Result};
use crate::params::{CurveParams, ROUNDING_SHIFT};

/// Output of a GLV decomposition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decomposition {
    pub k1: BigInt,
    pub k2: BigInt,
}

impl Decomposition {

    /// Returns `(k1 + k2*lambda) mod n`, in the `[0, n)` range.
    pub fn recombine(&self, params: &CurveParams) -> BigUint {
        let t = (&self.k1 + &self.k2 * params.lambda_signed()).mod_floor(params.n_signed());
        t.magnitude().clone()
    }

    /// Returns `true` if both components are within the designed bounds
    /// of the curve (inclusive).
    pub fn within_bounds(&self, params: &CurveParams) -> bool {
        let b = params.bounds();
        b.k1_min <= self.k1 && self.k1 <= b.k1_max
            && b.k2_min <= self.k2 && self.k2 <= b.k2_max
    }

    /// Returns `|k1|`, `k1 < 0`, `|k2|` and `k2 < 0`.
    ///
    /// Scalar multiplication routines work with unsigned half-width
    /// multipliers and negate the base point when the sign flag is set.
    /// An error is returned if a magnitude does not fit on 128 bits.
    pub fn to_signed_u128(&self) -> Result<(u128, bool, u128, bool)> {
        let m1 = self.k1.magnitude().to_u128().ok_or(Error::ComponentTooLarge)?;
        let m2 = self.k2.magnitude().to_u128().ok_or(Error::ComponentTooLarge)?;
        Ok((m1, self.k1.is_negative(), m2, self.k2.is_negative()))
    }
}

/// Computes the rounding coefficients `(c1, c2)` for scalar `k`.
///
/// Both are non-decreasing functions of `k`.
pub(crate) fn rounding_coefficients(params: &CurveParams, k: &BigUint) -> (BigUint, BigUint) {
    let (g1, g2) = params.g();
    let c1 = (g2 * k) >> ROUNDING_SHIFT;
    let c2 = (g1 * k) >> ROUNDING_SHIFT;
    (c1, c2)
}

/// Computes `k2 = q2 - q1`, with `q1 = c1*b1` and `q2 = -(c2*b2)`.
pub(crate) fn second_component(params: &CurveParams, c1: &BigInt, c2: &BigInt) -> BigInt {
    let (_, b1) = params.v1();
    let (_, b2) = params.v2();
    let q1 = c1 * b1;
    let q2 = -(c2 * b2);
    q2 - q1
}

/// Computes `k2*lambda mod n` (in `[0, n)`); the first component is
/// `k1 = k - r` for that value `r`.
pub(crate) fn lambda_offset(params: &CurveParams, k2: &BigInt) -> BigInt {
    (k2 * params.lambda_signed()).mod_floor(params.n_signed())
}

/// Splits scalar `k` into `(k1, k2)` with `k = k1 + k2*lambda mod n`.
///
/// The scalar MUST be lower than the group order; otherwise,
/// `Error::ScalarOutOfRange` is returned (the scalar is not reduced
/// implicitly).
pub fn decompose(params: &CurveParams, k: &BigUint) -> Result<Decomposition> {
    if k >= params.n() {
        return Err(Error::ScalarOutOfRange);
    }
    let (c1, c2) = rounding_coefficients(params, k);
    let c1 = BigInt::from_biguint(Sign::Plus, c1);
    let c2 = BigInt::from_biguint(Sign::Plus, c2);
    let k2 = second_component(params, &c1, &c2);
    let k1 = BigInt::from_biguint(Sign::Plus, k.clone()) - lambda_offset(params, &k2);
    Ok(Decomposition { k1, k2 })
}

// ========================================================================
