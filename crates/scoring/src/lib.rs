//! History-by-history scoring
#![doc = include_str!("../readme.md")]

mod array;
mod error;
mod state;

#[doc(inline)]
pub use array::ScoringArray;

#[doc(inline)]
pub use state::{write_float, StateReader};

#[doc(inline)]
pub use error::{Error, Result};
