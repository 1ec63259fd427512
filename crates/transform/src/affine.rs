//! Affine transforms

// standard library
use std::ops::Mul;

// crate modules
use crate::rotation::RotationMatrix;
use crate::Vector;

/// Rotation followed by a translation, `v -> R*v + t`
///
/// The flags `has_r`/`has_t` are fixed at construction, and skip the
/// corresponding work in every transform call.
///
/// ## Composition
///
/// `a * b` follows matrix order and applies `b` first, giving
/// `(Ra*Rb, Ra*tb + ta)`. For the transform equal to applying `a` and then
/// `b`, use [AffineTransform::then()].
///
/// ```rust
/// # use egstools_transform::{AffineTransform, RotationMatrix, Vector};
/// # use approx::assert_relative_eq;
/// let a = AffineTransform::from_rotation(RotationMatrix::rot_z(0.5));
/// let b = AffineTransform::from_translation(Vector::new(1.0, 0.0, 0.0));
/// let v = Vector::new(0.0, 2.0, 0.0);
///
/// let ab = a.then(&b);
/// assert_relative_eq!(ab.transform(&v), b.transform(&a.transform(&v)), epsilon = 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    rotation: RotationMatrix,
    translation: Vector,
    has_r: bool,
    has_t: bool,
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl AffineTransform {
    /// New transform from a rotation and translation
    pub fn new(rotation: RotationMatrix, translation: Vector) -> Self {
        Self {
            has_r: !rotation.is_identity(),
            has_t: translation.norm_squared() > 0.0,
            rotation,
            translation,
        }
    }

    /// The transform that does nothing
    pub fn identity() -> Self {
        Self::new(RotationMatrix::identity(), Vector::zeros())
    }

    /// Pure rotation
    pub fn from_rotation(rotation: RotationMatrix) -> Self {
        Self::new(rotation, Vector::zeros())
    }

    /// Pure translation
    pub fn from_translation(translation: Vector) -> Self {
        Self::new(RotationMatrix::identity(), translation)
    }

    /// `R*v + t`
    #[inline]
    pub fn transform(&self, v: &Vector) -> Vector {
        let mut result = *v;
        if self.has_r {
            result = self.rotation.rotate(&result);
        }
        if self.has_t {
            result += self.translation;
        }
        result
    }

    /// `(v - t)*R`, undoing [AffineTransform::transform()]
    #[inline]
    pub fn inverse_transform(&self, v: &Vector) -> Vector {
        let mut result = *v;
        if self.has_t {
            result -= self.translation;
        }
        if self.has_r {
            result = self.rotation.rotate_inverse(&result);
        }
        result
    }

    /// Rotation part only, for directions
    #[inline]
    pub fn rotate(&self, v: &Vector) -> Vector {
        if self.has_r {
            self.rotation.rotate(v)
        } else {
            *v
        }
    }

    /// Inverse rotation part only, for directions
    #[inline]
    pub fn rotate_inverse(&self, v: &Vector) -> Vector {
        if self.has_r {
            self.rotation.rotate_inverse(v)
        } else {
            *v
        }
    }

    /// The inverse transform, `(R^T, -(t*R))`
    pub fn inverse(&self) -> Self {
        Self::new(
            self.rotation.inverse(),
            -self.rotation.rotate_inverse(&self.translation),
        )
    }

    /// The transform equal to applying `self` and then `next`
    pub fn then(&self, next: &AffineTransform) -> Self {
        *next * *self
    }

    /// True if the transform neither rotates nor translates
    pub fn is_identity(&self) -> bool {
        !self.has_r && !self.has_t
    }

    /// True if there is a rotation
    pub fn has_rotation(&self) -> bool {
        self.has_r
    }

    /// True if there is a translation
    pub fn has_translation(&self) -> bool {
        self.has_t
    }

    /// Rotation matrix
    pub fn rotation(&self) -> &RotationMatrix {
        &self.rotation
    }

    /// Translation vector
    pub fn translation(&self) -> &Vector {
        &self.translation
    }
}

impl Mul for AffineTransform {
    type Output = AffineTransform;

    fn mul(self, rhs: AffineTransform) -> AffineTransform {
        AffineTransform::new(
            self.rotation * rhs.rotation,
            self.rotation.rotate(&rhs.translation) + self.translation,
        )
    }
}

impl std::fmt::Display for AffineTransform {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.is_identity() {
            return write!(fmt, "identity");
        }
        let t = &self.translation;
        writeln!(fmt, "translation = ({}, {}, {})", t.x, t.y, t.z)?;
        write!(fmt, "rotation =\n{}", self.rotation)
    }
}
