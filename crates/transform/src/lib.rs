//! Rotation matrices and affine transforms
#![doc = include_str!("../readme.md")]

mod affine;
mod error;
mod input;
mod rotation;

/// Three-vector used for positions and directions throughout
pub type Vector = nalgebra::Vector3<f64>;

#[doc(inline)]
pub use affine::AffineTransform;

#[doc(inline)]
pub use rotation::RotationMatrix;

#[doc(inline)]
pub use input::TransformInput;

#[doc(inline)]
pub use error::{Error, Result};
