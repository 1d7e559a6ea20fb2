//! Bnglv is a Rust library for GLV scalar decomposition and signed-digit
//! scalar encodings on the BN254 pairing-friendly curve.
//!
//! BN254 (also known as "alt_bn128") is the Barreto-Naehrig curve with
//! seed `u = 4965661367192848881`. Its G1 group has prime order
//! `n = 36*u^4 + 36*u^3 + 18*u^2 + 6*u + 1`, and admits an efficient
//! endomorphism `phi` that acts as multiplication by a cube root of
//! unity `lambda` modulo `n`. This library provides the scalar-side
//! machinery that a curve implementation needs in order to exploit it:
//!
//!  - `params`: the curve constants (group order, `lambda`, reduced
//!    lattice basis, rounding multipliers, designed output bounds), with
//!    validation, derivation from a BN seed, and loading from JSON.
//!
//!  - `glv`: the decomposition of a scalar `k` into two half-width signed
//!    integers `k1` and `k2` with `k = k1 + k2*lambda mod n`.
//!
//!  - `naf`: non-adjacent form (NAF) and windowed NAF encoders, and the
//!    committed digit tables of the Miller loop parameter `6u+2`, which
//!    are checked against a fresh encoding on first use.
//!
//!  - `mul`: generic consumers of the above: GLV and wNAF scalar
//!    multiplication over any group implementing the `Group` and
//!    `EndoGroup` traits, and Miller loop schedules derived from loop
//!    digit tables.
//!
//!  - `verify`: an offline verifier that checks bound claims about the
//!    decomposition over the whole scalar range, returning either a
//!    counterexample scalar, a proof that none exists, or an explicit
//!    "indeterminate" outcome when its search budget is exhausted.
//!
//! # Conventions
//!
//! Scalars are arbitrary-precision integers (`num_bigint::BigUint`) and
//! decomposition outputs are signed (`num_bigint::BigInt`). Scalars given
//! to `decompose()` MUST be in the `[0, n)` range; they are not reduced
//! implicitly. Nothing in this library is constant-time: it is meant for
//! public scalars (e.g. signature verification), for precomputations, and
//! for checking curve constants.
//!
//! Fallible operations return `bnglv::Result`; errors are described by
//! `bnglv::Error`. Diagnostics are emitted through the `tracing` crate;
//! no subscriber is installed by the library.
//!
//! # Usage
//!
//! ```
//! use bnglv::{bn254, decompose};
//! use num_bigint::BigUint;
//!
//! let params = bn254();
//! let k = BigUint::from(123456789u64);
//! let d = decompose(params, &k).unwrap();
//! assert_eq!(d.recombine(params), k);
//! assert!(d.within_bounds(params));
//! ```

pub use rand_core::{CryptoRng, RngCore, Error as RngError};

pub mod error;
pub mod params;
pub mod glv;
pub mod naf;
pub mod mul;
pub mod verify;

pub use error::{Error, Result};
pub use glv::{decompose, Decomposition};
pub use naf::{naf, wnaf, SignedDigits};
pub use params::{bn254, Bounds, CurveParams, RawParams};
pub use verify::{Query, SearchConfig, Verdict, Verifier};
