//! Error type shared by all modules.

use thiserror::Error;

/// Result type for decomposition, encoding and verification operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors reported by this crate.
///
/// Decomposition and encoding never fail on valid input; every variant
/// here is either a violated precondition or an inconsistent set of
/// curve constants.
#[derive(Debug, Error)]
pub enum Error {
    /// Scalar is not in the `[0, n)` range.
    #[error("scalar is not lower than the group order")]
    ScalarOutOfRange,

    /// Encoders only accept non-negative integers.
    #[error("cannot encode a negative integer")]
    NegativeValue,

    /// Window width outside of the supported `2..=8` range.
    #[error("unsupported wNAF width: {0}")]
    InvalidWidth(u32),

    /// Curve constants failed validation.
    #[error("invalid curve parameters: {0}")]
    InvalidParams(&'static str),

    /// A committed digit table differs from its regenerated encoding.
    #[error("digit table mismatch at index {index}: expected {expected}, found {found}")]
    TableMismatch {
        index: usize,
        expected: i8,
        found: i8,
    },

    /// The Miller loop parameter `6u+2` of the curve is negative; the
    /// committed tables only encode positive loop parameters.
    #[error("Miller loop parameter 6u+2 is negative")]
    NegativeLoopParameter,

    /// A committed digit table does not encode the expected value.
    #[error("digit table does not encode 6u+2")]
    TableValue,

    /// Loop digits must be in `{-1, 0, +1}` with a leading `+1`.
    #[error("invalid Miller loop digits")]
    InvalidDigits,

    /// A decomposition component does not fit on 128 bits.
    #[error("decomposition component does not fit on 128 bits")]
    ComponentTooLarge,

    /// Malformed integer or verification query.
    #[error("parse error: {0}")]
    Parse(String),

    /// Malformed JSON parameter document.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
