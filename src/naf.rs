//! Signed-digit recoding of non-negative integers (NAF and wNAF).
//!
//! The non-adjacent form (NAF) of an integer `x` is the unique sequence
//! of digits `d_i` in `{-1, 0, +1}` such that `x = sum_i d_i*2^i` and no
//! two consecutive digits are both non-zero. It has minimal Hamming
//! weight among all signed binary representations of `x`, and is at most
//! one digit longer than the binary representation. Its width-`w`
//! generalization (wNAF) uses odd digits in `-(2^(w-1)-1)..+(2^(w-1)-1)`,
//! with any `w` consecutive digits containing at most one non-zero
//! digit; width 2 is the plain NAF.
//!
//! Digits are produced from the least significant upward: while `x` is
//! non-zero, if `x` is odd, the next digit `d` is the low `w` bits of `x`,
//! interpreted in the signed range (for `w = 2`, this is `d = 2 - (x mod 4)`),
//! and `d` is subtracted from `x`. Then `x` is halved. Since `x - d` is a
//! multiple of `2^w`, the `w-1` next digits are zero.
//!
//! This module also holds the committed digit tables for the Miller loop
//! of the optimal ate pairing on BN254, which is driven by `6u+2` (with
//! `u` the curve seed), and `check_tables()`, which regenerates the
//! encoding and compares it with the committed constants.
//!
//! This code is not constant-time.

use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_traits::{Signed, Zero};
use tracing::debug;

use crate::error::{Error, Result};
use crate::params::CurveParams;

/// NAF of `6u+2` for the BN254 seed `u = 4965661367192848881`
/// (least significant digit first).
pub const SIX_U_PLUS_TWO_NAF: [i8; 66] = [
     0,  0,  0,  1,  0,  1,  0, -1,  0,  0, -1,  0,  0,  0,  1,  0,
     0, -1,  0, -1,  0,  0,  0,  1,  0, -1,  0,  0,  0,  0, -1,  0,
     0,  1,  0, -1,  0,  0,  1,  0,  0,  0,  0,  0, -1,  0,  0, -1,
     0,  1,  0, -1,  0,  0,  0, -1,  0, -1,  0,  0,  0,  1,  0, -1,
     0,  1,
];

/// Signed-digit loop table of `6u+2` used by existing BN254 Miller loop
/// circuits (least significant digit first).
///
/// It encodes the same value as `SIX_U_PLUS_TWO_NAF`, one digit shorter,
/// but it is not in non-adjacent form (it has 26 non-zero digits, against
/// 22 for the NAF). Only its value is checked.
pub const SIX_U_PLUS_TWO_ATE: [i8; 65] = [
     0,  0,  0,  1,  0,  1,  0, -1,  0,  0,  1, -1,  0,  0,  1,  0,
     0,  1,  1,  0, -1,  0,  0,  1,  0, -1,  0,  0,  0,  0,  1,  1,
     1,  0,  0, -1,  0,  0,  1,  0,  0,  0,  0,  0, -1,  0,  0,  1,
     1,  0,  0, -1,  0,  0,  0,  1,  1,  0, -1,  0,  0,  1,  0,  1,
     1,
];

/// A sequence of signed digits, least significant first.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SignedDigits(Vec<i8>);

impl SignedDigits {

    /// Wraps an existing digit sequence (no check is performed).
    pub fn from_slice(digits: &[i8]) -> Self {
        Self(digits.to_vec())
    }

    /// Digits, least significant first.
    pub fn digits(&self) -> &[i8] {
        &self.0
    }

    /// Unwraps the digit vector.
    pub fn into_vec(self) -> Vec<i8> {
        self.0
    }

    /// Number of digits (trailing zeros excluded for encoder outputs).
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` for the empty sequence (the encoding of zero).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of non-zero digits.
    pub fn weight(&self) -> usize {
        self.0.iter().filter(|&&d| d != 0).count()
    }

    /// Returns `sum_i d_i*2^i`.
    pub fn value(&self) -> BigInt {
        let mut x = BigInt::zero();
        for &d in self.0.iter().rev() {
            x <<= 1;
            x += d;
        }
        x
    }

    /// Returns `true` if no two consecutive digits are both non-zero and
    /// all digits are in `{-1, 0, +1}`.
    pub fn is_non_adjacent(&self) -> bool {
        self.is_wnaf(2)
    }

    /// Returns `true` if this is a valid width-`w` wNAF: every non-zero
    /// digit is odd with absolute value lower than `2^(w-1)`, and is
    /// followed by at least `w-1` zeros (within the sequence).
    pub fn is_wnaf(&self, width: u32) -> bool {
        if !(2..=8).contains(&width) {
            return false;
        }
        let lim = 1i32 << (width - 1);
        let mut gap = 0usize;
        for &d in self.0.iter() {
            if d == 0 {
                gap = gap.saturating_sub(1);
                continue;
            }
            let d = d as i32;
            if gap > 0 || d.abs() >= lim || (d & 1) == 0 {
                return false;
            }
            gap = (width - 1) as usize;
        }
        true
    }
}

impl AsRef<[i8]> for SignedDigits {
    fn as_ref(&self) -> &[i8] {
        &self.0
    }
}

// Core recoding loop; width MUST be in 2..=8.
fn recode(value: &BigUint, width: u32) -> SignedDigits {
    let mask = (1u32 << width) - 1;
    let half = 1u32 << (width - 1);
    let mut x = value.clone();
    let mut sd = Vec::with_capacity(value.bits() as usize + 1);
    while !x.is_zero() {
        let mut d = 0i32;
        if x.is_odd() {
            let v = x.iter_u32_digits().next().unwrap_or(0) & mask;
            if v >= half {
                // Negative digit: x - d = x + (2^w - v).
                d = v as i32 - (1i32 << width);
                x += (-d) as u32;
            } else {
                d = v as i32;
                x -= v;
            }
        }
        sd.push(d as i8);
        x >>= 1;
    }
    SignedDigits(sd)
}

/// Computes the NAF of a non-negative integer.
///
/// Zero yields an empty sequence.
pub fn naf(value: &BigUint) -> SignedDigits {
    recode(value, 2)
}

/// Computes the NAF of an integer, which MUST be non-negative
/// (`Error::NegativeValue` otherwise).
pub fn naf_signed(value: &BigInt) -> Result<SignedDigits> {
    if value.is_negative() {
        return Err(Error::NegativeValue);
    }
    Ok(naf(value.magnitude()))
}

/// Computes the width-`w` wNAF of a non-negative integer.
///
/// Supported widths are 2 to 8 (inclusive); with width 2, this is the
/// same as `naf()`.
pub fn wnaf(value: &BigUint, width: u32) -> Result<SignedDigits> {
    if !(2..=8).contains(&width) {
        return Err(Error::InvalidWidth(width));
    }
    Ok(recode(value, width))
}

/// Checks the committed BN254 Miller loop tables against `params`.
///
/// The NAF of `6u+2` is regenerated and compared, digit by digit, with
/// `SIX_U_PLUS_TWO_NAF`; the value of `SIX_U_PLUS_TWO_ATE` is compared
/// with `6u+2`. Any difference means that the curve constants and the
/// tables consumed by the Miller loop have drifted apart. Curves with a
/// negative seed (and `6u+2 < 0`) yield `Error::NegativeLoopParameter`.
pub fn check_tables(params: &CurveParams) -> Result<()> {
    compare_tables(&params.six_u_plus_2(), &SIX_U_PLUS_TWO_NAF, &SIX_U_PLUS_TWO_ATE)
}

fn compare_tables(target: &BigInt, committed: &[i8], ate: &[i8]) -> Result<()> {
    let fresh = naf_signed(target).map_err(|_| Error::NegativeLoopParameter)?;
    let len = fresh.len().max(committed.len());
    for i in 0..len {
        let expected = fresh.digits().get(i).copied().unwrap_or(0);
        let found = committed.get(i).copied().unwrap_or(0);
        if expected != found {
            return Err(Error::TableMismatch { index: i, expected, found });
        }
    }

    if SignedDigits::from_slice(ate).value() != *target {
        return Err(Error::TableValue);
    }

    debug!(
        naf_len = fresh.len(),
        naf_weight = fresh.weight(),
        "Miller loop tables match 6u+2"
    );
    Ok(())
}

// ========================================================================
