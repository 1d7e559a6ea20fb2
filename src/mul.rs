//! Consumers of the decomposition and of the signed-digit encodings.
//!
//! Curve arithmetic is not implemented here; it is abstracted by the
//! `Group` and `EndoGroup` traits, so that the scalar multiplication
//! drivers can be exercised on any additive group (the tests use the
//! integers modulo the BN254 group order, on which the endomorphism is
//! a plain multiplication by `lambda`).
//!
//! `mul_glv()` is the interleaved double-and-add that consumes a GLV
//! decomposition: `k*P = k1*P + k2*phi(P)`, with both half-width
//! multipliers recoded in NAF and processed in a single pass of doublings.
//!
//! `miller_loop_schedule()` turns a loop digit table (such as the BN254
//! `6u+2` tables in `naf`) into the sequence of doubling and addition
//! steps performed by a Miller loop. The top digit is `+1` and is
//! consumed by the initialization `T = Q`; each remaining digit, from
//! the most significant down, yields one doubling step, followed by an
//! addition of `Q` (digit `+1`) or `-Q` (digit `-1`).
//!
//! Nothing here is constant-time.

use core::ops::{Add, Neg, Sub};

use num_bigint::BigUint;

use crate::error::{Error, Result};
use crate::glv::decompose;
use crate::naf::{naf, wnaf};
use crate::params::CurveParams;

/// An additive group.
pub trait Group: Clone + Add<Output = Self> + Sub<Output = Self> + Neg<Output = Self> {

    /// The neutral element.
    fn neutral() -> Self;

    /// Returns `2*self`.
    fn double(&self) -> Self;
}

/// An additive group of prime order `n` with an efficient endomorphism
/// `phi` such that `phi(P) = lambda*P` for all `P`.
pub trait EndoGroup: Group {

    /// Returns `phi(self)`.
    fn endo(&self) -> Self;
}

// acc + d*P, for a digit d in {-1, 0, +1}.
fn add_digit<G: Group>(acc: G, d: i8, p: &G) -> G {
    match d {
        1 => acc + p.clone(),
        -1 => acc - p.clone(),
        _ => acc,
    }
}

/// Computes `k*P` using the GLV decomposition of `k`.
///
/// The scalar `k` MUST be lower than the group order.
pub fn mul_glv<G: EndoGroup>(params: &CurveParams, p: &G, k: &BigUint) -> Result<G> {
    let (m1, s1, m2, s2) = decompose(params, k)?.to_signed_u128()?;
    let p1 = if s1 { -p.clone() } else { p.clone() };
    let p2 = if s2 { -p.endo() } else { p.endo() };
    let sd1 = naf(&BigUint::from(m1));
    let sd2 = naf(&BigUint::from(m2));

    let mut acc = G::neutral();
    for i in (0..sd1.len().max(sd2.len())).rev() {
        acc = acc.double();
        acc = add_digit(acc, sd1.digits().get(i).copied().unwrap_or(0), &p1);
        acc = add_digit(acc, sd2.digits().get(i).copied().unwrap_or(0), &p2);
    }
    Ok(acc)
}

/// Computes `k*P` with a width-`w` wNAF recoding of `k` (no
/// endomorphism).
///
/// A window of the odd multiples `P, 3P, ..., (2^(w-1)-1)P` is
/// precomputed.
pub fn mul_wnaf<G: Group>(p: &G, k: &BigUint, width: u32) -> Result<G> {
    let sd = wnaf(k, width)?;
    let p2 = p.double();
    let mut win = Vec::with_capacity(1 << (width - 2));
    win.push(p.clone());
    for i in 1..(1usize << (width - 2)) {
        let q = win[i - 1].clone() + p2.clone();
        win.push(q);
    }

    let mut acc = G::neutral();
    for &d in sd.digits().iter().rev() {
        acc = acc.double();
        if d > 0 {
            acc = acc + win[(d as usize) >> 1].clone();
        } else if d < 0 {
            acc = acc - win[((-d) as usize) >> 1].clone();
        }
    }
    Ok(acc)
}

/// One iteration of a Miller loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopStep {
    /// `f <- f^2 * l_{T,T}(P)`, `T <- 2T`.
    Double,
    /// Doubling, then `f <- f * l_{T,Q}(P)`, `T <- T + Q`.
    DoubleAdd,
    /// Doubling, then `f <- f * l_{T,-Q}(P)`, `T <- T - Q`.
    DoubleSub,
}

/// Converts loop digits (least significant first) into Miller loop
/// steps, in execution order.
///
/// Digits must be in `{-1, 0, +1}` and the most significant digit must
/// be `+1`; otherwise, `Error::InvalidDigits` is returned.
pub fn miller_loop_schedule(digits: &[i8]) -> Result<Vec<LoopStep>> {
    match digits.last() {
        Some(&1) => {}
        _ => return Err(Error::InvalidDigits),
    }
    let mut steps = Vec::with_capacity(digits.len() - 1);
    for &d in digits[..digits.len() - 1].iter().rev() {
        steps.push(match d {
            0 => LoopStep::Double,
            1 => LoopStep::DoubleAdd,
            -1 => LoopStep::DoubleSub,
            _ => return Err(Error::InvalidDigits),
        });
    }
    Ok(steps)
}

// ========================================================================
