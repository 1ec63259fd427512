//! Engine seams for fluence and kerma scoring objects
#![doc = include_str!("../readme.md")]

mod application;
mod call;
mod error;
mod geometry;
mod object;
mod particle;
mod stack;

#[doc(inline)]
pub use call::AusgabCall;

#[doc(inline)]
pub use particle::{Charge, LineageStatus, Particle, StepInfo, Visit, ELECTRON_REST_MASS};

#[doc(inline)]
pub use stack::{ParticleStack, Stack};

#[doc(inline)]
pub use geometry::{Boundary, Geometry};

#[doc(inline)]
pub use application::Application;

#[doc(inline)]
pub use object::{AusgabList, AusgabObject, Event};

#[doc(inline)]
pub use error::{Error, Result};
