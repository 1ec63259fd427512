//! Planar and volumetric fluence scoring
#![doc = include_str!("../readme.md")]

mod classify;
mod config;
mod error;
mod field;
mod grid;
mod planar;
mod regions;
mod report;
mod stopping;
mod tally;
mod volumetric;

#[doc(inline)]
pub use volumetric::{Diagnostics, VolumetricFluence};

#[doc(inline)]
pub use planar::PlanarFluence;

#[doc(inline)]
pub use field::{FieldShape, ScoringField};

#[doc(inline)]
pub use grid::{Coverage, EnergyGrid};

#[doc(inline)]
pub use stopping::StoppingPowers;

#[doc(inline)]
pub use classify::Classifier;

#[doc(inline)]
pub use regions::{describe_regions, RegionList, RegionSelection};

#[doc(inline)]
pub use tally::Tally;

#[doc(inline)]
pub use report::{source_normalization, spectrum_points, write_grace_series, GraceHeader};

#[doc(inline)]
pub use config::{
    EnergyGridInput, FluenceInput, FluenceOptions, InverseStoppingPower, Method, PlanarInput,
    PlanarOptions, Scale, VolumetricInput, VolumetricOptions,
};

#[doc(inline)]
pub use error::{Error, Result};
