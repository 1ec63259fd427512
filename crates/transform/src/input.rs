//! Transform definitions as they appear in configuration

// crate modules
use crate::affine::AffineTransform;
use crate::error::Result;
use crate::rotation::RotationMatrix;
use crate::Vector;

// external crates
use log::warn;
use serde::{Deserialize, Serialize};

/// User definition of an affine transform
///
/// All fields are optional. The rotation is taken from `rotation vector` if
/// it has 3 values, otherwise from `rotation`:
///
/// | values | meaning                                            |
/// | ------ | -------------------------------------------------- |
/// | 2      | polar `(phi, theta)`, `Rz(phi)*Rx(theta)`          |
/// | 3      | angles `(alpha, beta, gamma)`, `Rx*Ry*Rz`          |
/// | 4      | axis `(x, y, z)` and an angle about it             |
/// | 9      | matrix elements in row order                       |
///
/// Anything else gives no rotation.
///
/// ```rust
/// # use egstools_transform::{TransformInput, Vector};
/// let input: TransformInput = serde_json::from_str(
///     r#"{ "translation": [0, 0, 10], "rotation": [0, 0, 0] }"#,
/// ).unwrap();
///
/// let transform = input.build().unwrap();
/// assert!(!transform.has_rotation());
/// assert_eq!(transform.transform(&Vector::zeros()), Vector::new(0.0, 0.0, 10.0));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformInput {
    /// Translation vector
    pub translation: Option<Vec<f64>>,

    /// Direction to be rotated onto the z axis
    #[serde(rename = "rotation vector", alias = "rotation_vector")]
    pub rotation_vector: Option<Vec<f64>>,

    /// Angles, axis and angle, or a full matrix
    pub rotation: Option<Vec<f64>>,
}

impl TransformInput {
    /// Build the transform
    ///
    /// Fails only for a zero rotation vector or rotation axis.
    pub fn build(&self) -> Result<AffineTransform> {
        let translation = match self.translation.as_deref() {
            Some([x, y, z]) => Vector::new(*x, *y, *z),
            Some(values) => {
                warn!(
                    "Translation needs 3 values, found {}. No translation applied.",
                    values.len()
                );
                Vector::zeros()
            }
            None => Vector::zeros(),
        };

        if let Some([x, y, z]) = self.rotation_vector.as_deref() {
            let rotation = RotationMatrix::from_vector(&Vector::new(*x, *y, *z))?;
            return Ok(AffineTransform::new(rotation, translation));
        }

        let rotation = match self.rotation.as_deref() {
            Some([phi, theta]) => RotationMatrix::from_polar(*phi, *theta),
            Some([alpha, beta, gamma]) => RotationMatrix::from_angles(*alpha, *beta, *gamma),
            Some([x, y, z, angle]) => {
                RotationMatrix::about_axis(*angle, &Vector::new(*x, *y, *z))?
            }
            Some(values) if values.len() == 9 => {
                let mut e = [0.0; 9];
                e.copy_from_slice(values);
                let r = RotationMatrix::from_elements(e);
                if !r.is_rotation() {
                    warn!("The rotation specified by\n{r}\nis not a rotation");
                }
                r
            }
            Some(values) => {
                warn!(
                    "Rotation needs 2, 3, 4 or 9 values, found {}. No rotation applied.",
                    values.len()
                );
                RotationMatrix::identity()
            }
            None => RotationMatrix::identity(),
        };

        Ok(AffineTransform::new(rotation, translation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn rotation_only(values: Vec<f64>) -> TransformInput {
        TransformInput {
            rotation: Some(values),
            ..Default::default()
        }
    }

    #[test]
    fn empty_is_identity() {
        let t = TransformInput::default().build().unwrap();
        assert!(t.is_identity());
    }

    #[test]
    fn rotation_vector_takes_precedence() {
        let input = TransformInput {
            rotation_vector: Some(vec![1.0, 0.0, 0.0]),
            rotation: Some(vec![0.1, 0.2, 0.3]),
            ..Default::default()
        };
        let t = input.build().unwrap();
        assert_relative_eq!(t.rotate(&Vector::x()), Vector::z(), epsilon = 1e-12);
    }

    #[test]
    fn zero_rotation_vector_fails() {
        let input = TransformInput {
            rotation_vector: Some(vec![0.0, 0.0, 0.0]),
            ..Default::default()
        };
        assert!(input.build().is_err());
    }

    #[rstest]
    #[case(vec![0.3, 1.1], RotationMatrix::from_polar(0.3, 1.1))]
    #[case(vec![0.3, 1.1, -0.2], RotationMatrix::from_angles(0.3, 1.1, -0.2))]
    #[case(vec![0.0, 0.0, 1.0, 0.5], RotationMatrix::rot_z(0.5))]
    #[case(vec![1.0, 2.0], RotationMatrix::from_polar(1.0, 2.0))]
    #[case(vec![1.0; 5], RotationMatrix::identity())]
    fn rotation_forms(#[case] values: Vec<f64>, #[case] expected: RotationMatrix) {
        let t = rotation_only(values).build().unwrap();
        assert_relative_eq!(
            t.rotation().matrix(),
            expected.matrix(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn matrix_form_is_kept_even_if_invalid() {
        let values = vec![2.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
        let t = rotation_only(values).build().unwrap();
        assert_eq!(t.rotation().matrix()[(0, 0)], 2.0);
    }

    #[test]
    fn keys_with_spaces() {
        let input: TransformInput =
            serde_json::from_str(r#"{ "rotation vector": [0, 1, 0] }"#).unwrap();
        assert_eq!(input.rotation_vector, Some(vec![0.0, 1.0, 0.0]));
    }
}
