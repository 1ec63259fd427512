//! Uniform-grid piecewise-linear interpolation
#![doc = include_str!("../readme.md")]

mod error;
mod interpolator;

#[doc(inline)]
pub use interpolator::{Interpolator, DEFAULT_ACCURACY, DEFAULT_MAX_BINS};

#[doc(inline)]
pub use error::{Error, Result};
