//! Result and Error types for egstools-interp

/// Type alias for Result<T, interp::Error>
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for the `egstools-interp` crate
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("attempt to initialise an interpolator with {0} bins (minimum 2)")]
    TooFewBins(usize),

    #[error("interval lower bound must be below the upper bound (xmin={xmin}, xmax={xmax})")]
    InvalidInterval { xmin: f64, xmax: f64 },

    #[error("too few values for the interpolation table (expected {expected}, found {found})")]
    InsufficientValues { expected: usize, found: usize },

    #[error("adaptive construction did not finish within {0} iterations")]
    LoopLimitReached(usize),
}
