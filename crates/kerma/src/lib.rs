//! Track-length and forced-detection kerma scoring
#![doc = include_str!("../readme.md")]

mod config;
mod emuen;
mod error;
mod forced;
mod geometry;
mod kerma;
mod report;

#[doc(inline)]
pub use kerma::{KermaScoring, PhotonFluence};

#[doc(inline)]
pub use forced::Attenuation;

#[doc(inline)]
pub use geometry::{CalculationGeometry, Geometries};

#[doc(inline)]
pub use emuen::EmuenTable;

#[doc(inline)]
pub use config::{CalculationInput, FluenceScoringInput, KermaInput};

#[doc(inline)]
pub use report::MEV_TO_J;

#[doc(inline)]
pub use error::{Error, Result};
