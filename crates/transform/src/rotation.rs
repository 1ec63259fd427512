//! 3x3 rotation matrices

// standard library
use std::ops::Mul;

// crate modules
use crate::error::{Error, Result};
use crate::Vector;

// external crates
use nalgebra::Matrix3;

// egstools modules
use egstools_utils::{f, ValueExt};

/// Tolerance on the determinant and orthogonality of a rotation
const ROTATION_TOLERANCE: f64 = 1e-4;

/// Squared length below which a vector counts as zero
const ZERO_LENGTH2: f64 = 1e-15;

/// A 3x3 rotation matrix
///
/// The elementary rotations use the egs++ sign convention, where `Rz(phi)`
/// applied to `(cos phi, sin phi, 0)` gives `(1, 0, 0)`.
///
/// ```rust
/// # use egstools_transform::{RotationMatrix, Vector};
/// # use approx::assert_relative_eq;
/// let phi = 0.3_f64;
/// let r = RotationMatrix::rot_z(phi);
/// let v = r * Vector::new(phi.cos(), phi.sin(), 0.0);
/// assert_relative_eq!(v, Vector::x(), epsilon = 1e-15);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationMatrix(Matrix3<f64>);

impl Default for RotationMatrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl RotationMatrix {
    /// The unit matrix
    pub fn identity() -> Self {
        Self(Matrix3::identity())
    }

    /// From nine elements in row order (`xx xy xz yx yy yz zx zy zz`)
    ///
    /// No check is made that this is a rotation, see
    /// [RotationMatrix::is_rotation()].
    pub fn from_elements(e: [f64; 9]) -> Self {
        Self(Matrix3::new(
            e[0], e[1], e[2], e[3], e[4], e[5], e[6], e[7], e[8],
        ))
    }

    /// Rotation about x from the cosine and sine of the angle
    pub fn rot_x_cs(c: f64, s: f64) -> Self {
        Self(Matrix3::new(1.0, 0.0, 0.0, 0.0, c, s, 0.0, -s, c))
    }

    /// Rotation about y from the cosine and sine of the angle
    pub fn rot_y_cs(c: f64, s: f64) -> Self {
        Self(Matrix3::new(c, 0.0, s, 0.0, 1.0, 0.0, -s, 0.0, c))
    }

    /// Rotation about z from the cosine and sine of the angle
    pub fn rot_z_cs(c: f64, s: f64) -> Self {
        Self(Matrix3::new(c, s, 0.0, -s, c, 0.0, 0.0, 0.0, 1.0))
    }

    /// Rotation about x by `angle` radians
    pub fn rot_x(angle: f64) -> Self {
        Self::rot_x_cs(angle.cos(), angle.sin())
    }

    /// Rotation about y by `angle` radians
    pub fn rot_y(angle: f64) -> Self {
        Self::rot_y_cs(angle.cos(), angle.sin())
    }

    /// Rotation about z by `angle` radians
    pub fn rot_z(angle: f64) -> Self {
        Self::rot_z_cs(angle.cos(), angle.sin())
    }

    /// `Rx(alpha) * Ry(beta) * Rz(gamma)`
    pub fn from_angles(alpha: f64, beta: f64, gamma: f64) -> Self {
        Self::rot_x(alpha) * Self::rot_y(beta) * Self::rot_z(gamma)
    }

    /// `Rz(phi) * Rx(theta)` from azimuthal and polar angles
    pub fn from_polar(phi: f64, theta: f64) -> Self {
        Self::rot_z(phi) * Self::rot_x(theta)
    }

    /// Rotation that takes `v` onto the +z axis
    ///
    /// Vectors already along z give the unit matrix. Fails for a zero vector.
    ///
    /// ```rust
    /// # use egstools_transform::{RotationMatrix, Vector};
    /// # use approx::assert_relative_eq;
    /// let v = Vector::new(1.0, -2.0, 2.0);
    /// let r = RotationMatrix::from_vector(&v).unwrap();
    /// assert_relative_eq!(r * v, Vector::new(0.0, 0.0, 3.0), epsilon = 1e-12);
    ///
    /// assert!(RotationMatrix::from_vector(&Vector::zeros()).is_err());
    /// ```
    pub fn from_vector(v: &Vector) -> Result<Self> {
        let sinz2 = v.x * v.x + v.y * v.y;
        let norm2 = sinz2 + v.z * v.z;
        if norm2 < ZERO_LENGTH2 {
            return Err(Error::ZeroVector);
        }

        if sinz2 > ZERO_LENGTH2 {
            let norm = norm2.sqrt();
            let sinz = sinz2.sqrt();
            let (cphi, sphi) = (v.x / sinz, v.y / sinz);
            let (cost, sint) = (v.z / norm, -sinz / norm);
            Ok(Self::rot_y_cs(cost, sint) * Self::rot_z_cs(cphi, sphi))
        } else {
            Ok(Self::identity())
        }
    }

    /// Rotation by `phi` radians about the axis `v`
    pub fn about_axis(phi: f64, v: &Vector) -> Result<Self> {
        let m = Self::from_vector(v)?;
        Ok(m.inverse() * Self::rot_z(phi) * m)
    }

    /// Determinant
    pub fn det(&self) -> f64 {
        self.0.determinant()
    }

    /// Inverse, which for a rotation is the transpose
    pub fn inverse(&self) -> Self {
        Self(self.0.transpose())
    }

    /// True only for the exact unit matrix
    pub fn is_identity(&self) -> bool {
        self.0 == Matrix3::identity()
    }

    /// True if the determinant is 1 and `R*R^T` is the unit matrix
    ///
    /// Both within a tolerance of 1e-4.
    ///
    /// ```rust
    /// # use egstools_transform::RotationMatrix;
    /// assert!(RotationMatrix::from_angles(0.1, 0.2, 0.3).is_rotation());
    /// assert!(!RotationMatrix::from_elements([2.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.5]).is_rotation());
    /// ```
    pub fn is_rotation(&self) -> bool {
        let orthogonal = (self.0 * self.0.transpose() - Matrix3::identity())
            .iter()
            .all(|e| e.abs() <= ROTATION_TOLERANCE);
        (self.det() - 1.0).abs() <= ROTATION_TOLERANCE && orthogonal
    }

    /// `R * v`
    #[inline]
    pub fn rotate(&self, v: &Vector) -> Vector {
        self.0 * v
    }

    /// `v * R`, the inverse rotation for an orthogonal matrix
    #[inline]
    pub fn rotate_inverse(&self, v: &Vector) -> Vector {
        self.0.tr_mul(v)
    }

    /// Underlying matrix
    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.0
    }
}

impl Mul for RotationMatrix {
    type Output = RotationMatrix;

    fn mul(self, rhs: RotationMatrix) -> RotationMatrix {
        RotationMatrix(self.0 * rhs.0)
    }
}

impl Mul<Vector> for RotationMatrix {
    type Output = Vector;

    fn mul(self, rhs: Vector) -> Vector {
        self.0 * rhs
    }
}

impl std::fmt::Display for RotationMatrix {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        let rows = self
            .0
            .row_iter()
            .map(|row| {
                row.iter()
                    .map(|e| f!("{:>13}", e.sci(5, 2)))
                    .collect::<String>()
            })
            .collect::<Vec<String>>();
        write!(fmt, "{}", rows.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;
    use std::f64::consts::FRAC_PI_2;

    #[rstest]
    #[case(RotationMatrix::rot_x(FRAC_PI_2), Vector::y(), Vector::new(0.0, 0.0, -1.0))]
    #[case(RotationMatrix::rot_y(FRAC_PI_2), Vector::z(), Vector::x())]
    #[case(RotationMatrix::rot_z(FRAC_PI_2), Vector::x(), Vector::new(0.0, -1.0, 0.0))]
    fn elementary_sign_conventions(
        #[case] r: RotationMatrix,
        #[case] v: Vector,
        #[case] expected: Vector,
    ) {
        assert_relative_eq!(r * v, expected, epsilon = 1e-15);
    }

    #[rstest]
    #[case(Vector::new(0.0, 0.0, 2.0))]
    #[case(Vector::new(0.0, 0.0, -1.0))]
    fn along_z_is_identity(#[case] v: Vector) {
        assert!(RotationMatrix::from_vector(&v).unwrap().is_identity());
    }

    #[rstest]
    #[case(Vector::new(1.0, 0.0, 0.0))]
    #[case(Vector::new(-0.3, 0.4, -2.0))]
    #[case(Vector::new(5.0, 5.0, 5.0))]
    fn vector_onto_z(#[case] v: Vector) {
        let r = RotationMatrix::from_vector(&v).unwrap();
        assert!(r.is_rotation());
        assert_relative_eq!(r * v, Vector::new(0.0, 0.0, v.norm()), epsilon = 1e-12);
    }

    #[test]
    fn rotation_about_an_axis_keeps_the_axis() {
        let axis = Vector::new(1.0, 1.0, 0.0);
        let r = RotationMatrix::about_axis(1.2, &axis).unwrap();
        assert!(r.is_rotation());
        assert_relative_eq!(r * axis, axis, epsilon = 1e-12);
    }

    #[test]
    fn inverse_rotation() {
        let r = RotationMatrix::from_angles(0.4, -1.1, 2.5);
        let v = Vector::new(0.1, 2.0, -3.0);
        assert_relative_eq!(r.rotate_inverse(&r.rotate(&v)), v, epsilon = 1e-12);
        assert_relative_eq!((r.inverse() * r).0, Matrix3::identity(), epsilon = 1e-12);
    }

    #[test]
    fn polar_angles() {
        let (phi, theta) = (0.7, 0.2);
        let expected = RotationMatrix::rot_z(phi) * RotationMatrix::rot_x(theta);
        assert_eq!(RotationMatrix::from_polar(phi, theta), expected);
    }
}
