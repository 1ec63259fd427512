//! Planar scoring fields

// standard library
use std::f64::consts::PI;

// crate modules
use crate::config::PlanarInput;
use crate::error::Result;

// external crates
use log::warn;

// egstools modules
use egstools_transform::{AffineTransform, Vector};
use egstools_utils::f;

/// Shape of a scoring field within its plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldShape {
    /// Disc of radius `radius` around the midpoint
    Circle { radius: f64 },
    /// `nx` by `ny` pixels over `ax` by `ay` centred on the midpoint, with
    /// the in-plane directions `ux` and `uy`
    Rectangle {
        ax: f64,
        ay: f64,
        nx: usize,
        ny: usize,
        ux: Vector,
        uy: Vector,
    },
}

/// A flat field that particles cross
///
/// ```rust
/// # use egstools_fluence::ScoringField;
/// # use egstools_transform::Vector;
/// let field = ScoringField::circle(Vector::new(0.0, 0.0, 5.0), 2.0, Vector::z());
///
/// // crossing 4 cm ahead
/// let hit = field.hit(&Vector::new(1.0, 0.0, 1.0), &Vector::z());
/// assert_eq!(hit, Some((0, 4.0)));
///
/// // moving away from the plane
/// assert!(field.hit(&Vector::new(1.0, 0.0, 1.0), &-Vector::z()).is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringField {
    shape: FieldShape,
    normal: Vector,
    midpoint: Vector,
    /// Distance of the plane from the origin along the normal
    distance: f64,
}

impl ScoringField {
    /// Disc with the given centre, radius and plane normal
    ///
    /// The normal is normalised here.
    pub fn circle(midpoint: Vector, radius: f64, normal: Vector) -> Self {
        let normal = normal.normalize();
        Self {
            shape: FieldShape::Circle { radius },
            normal,
            midpoint,
            distance: normal.dot(&midpoint),
        }
    }

    /// Pixelated rectangle, placed in the z=0 plane and then transformed
    pub fn rectangle(
        (xmin, xmax, ymin, ymax): (f64, f64, f64, f64),
        (nx, ny): (usize, usize),
        transform: &AffineTransform,
    ) -> Self {
        let midpoint = Vector::new(0.5 * (xmax + xmin), 0.5 * (ymax + ymin), 0.0);
        let midpoint = transform.transform(&midpoint);
        let normal = transform.rotate(&Vector::z());
        Self {
            shape: FieldShape::Rectangle {
                ax: xmax - xmin,
                ay: ymax - ymin,
                nx,
                ny,
                ux: transform.rotate(&Vector::x()),
                uy: transform.rotate(&Vector::y()),
            },
            normal,
            midpoint,
            distance: normal.dot(&midpoint),
        }
    }

    /// Field from user input
    ///
    /// A circle takes precedence over a rectangle. Bad input is replaced by
    /// a 10 cm diameter circle or a 10x10 cm rectangle at the origin, and a
    /// bad resolution by a single pixel. Only a degenerate transform fails.
    pub fn from_input(input: &PlanarInput) -> Result<Self> {
        if let Some(circle) = &input.circle {
            return Ok(Self::circle_from_input(circle, input.normal.as_deref()));
        }

        let Some(&[xmin, xmax, ymin, ymax]) = input.rectangle.as_deref() else {
            if input.rectangle.is_some() {
                warn!("Wrong 'scoring rectangle' input, using a 10 cm X 10 cm field at the origin");
            } else {
                warn!("No 'scoring circle' or 'scoring rectangle', using a 10 cm X 10 cm field at the origin");
            }
            return Ok(Self::rectangle(
                (-5.0, 5.0, -5.0, 5.0),
                (1, 1),
                &AffineTransform::identity(),
            ));
        };

        let transform = input.transform.build()?;
        let resolution = Self::resolution_from_input(input.resolution.as_deref());
        Ok(Self::rectangle(
            (xmin, xmax, ymin, ymax),
            resolution,
            &transform,
        ))
    }

    fn circle_from_input(circle: &[f64], normal: Option<&[f64]>) -> Self {
        let &[x, y, z, radius] = circle else {
            warn!("Wrong 'scoring circle' input, using a 10 cm diameter field at the origin");
            return Self::circle(Vector::zeros(), 5.0, Vector::z());
        };

        let normal = match normal {
            Some(&[nx, ny, nz]) if nx * nx + ny * ny + nz * nz > 0.0 => Vector::new(nx, ny, nz),
            _ => {
                warn!("Wrong or missing 'scoring plane normal', using the +z axis");
                Vector::z()
            }
        };
        Self::circle(Vector::new(x, y, z), radius, normal)
    }

    fn resolution_from_input(resolution: Option<&[i64]>) -> (usize, usize) {
        let (nx, ny) = match resolution {
            Some(&[n]) => (n, n),
            Some(&[nx, ny]) => (nx, ny),
            Some(&[nx, ny, ..]) => {
                warn!("Too many 'resolution' values, using the first two");
                (nx, ny)
            }
            _ => {
                warn!("Wrong or missing 'resolution', scoring in the whole field");
                (1, 1)
            }
        };

        let to_pixels = |n: i64| match usize::try_from(n) {
            Ok(n) if n > 0 => n,
            _ => {
                warn!("Resolution of {n} pixels is not allowed, using 1");
                1
            }
        };
        (to_pixels(nx), to_pixels(ny))
    }

    /// Shape of the field
    pub fn shape(&self) -> &FieldShape {
        &self.shape
    }

    /// Unit normal of the field plane
    pub fn normal(&self) -> &Vector {
        &self.normal
    }

    /// Centre of the field
    pub fn midpoint(&self) -> &Vector {
        &self.midpoint
    }

    /// Distance of the field plane from the origin
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Pixels along the in-plane directions, `(1, 1)` for circles
    pub fn resolution(&self) -> (usize, usize) {
        match self.shape {
            FieldShape::Circle { .. } => (1, 1),
            FieldShape::Rectangle { nx, ny, .. } => (nx, ny),
        }
    }

    /// Number of pixels
    pub fn pixels(&self) -> usize {
        let (nx, ny) = self.resolution();
        nx * ny
    }

    /// Area of one pixel, or of the whole disc (cm2)
    pub fn area(&self) -> f64 {
        match self.shape {
            FieldShape::Circle { radius } => PI * radius * radius,
            FieldShape::Rectangle { ax, ay, nx, ny, .. } => (ax / nx as f64) * (ay / ny as f64),
        }
    }

    /// Pixel crossed by a particle at `x` moving along `u`, and the distance
    /// to the crossing
    ///
    /// Only crossings ahead of the particle count.
    #[inline]
    pub fn hit(&self, x: &Vector, u: &Vector) -> Option<(usize, f64)> {
        let xp = x.dot(&self.normal);
        let up = u.dot(&self.normal);
        if !((up > 0.0 && self.distance > xp) || (up < 0.0 && self.distance < xp)) {
            return None;
        }

        let t = (self.distance - xp) / up;
        let x1 = x + u * t - self.midpoint;

        match self.shape {
            FieldShape::Circle { radius } => (x1.norm_squared() < radius * radius).then_some((0, t)),
            FieldShape::Rectangle {
                ax,
                ay,
                nx,
                ny,
                ux,
                uy,
            } => {
                let xc = 2.0 * x1.dot(&ux) + ax;
                let yc = 2.0 * x1.dot(&uy) + ay;
                if xc > 0.0 && xc < 2.0 * ax && yc > 0.0 && yc < 2.0 * ay {
                    let i = ((xc * nx as f64 / (2.0 * ax)) as usize).min(nx - 1);
                    let j = ((yc * ny as f64 / (2.0 * ay)) as usize).min(ny - 1);
                    Some((i + j * nx, t))
                } else {
                    None
                }
            }
        }
    }

    /// Field settings as text
    pub fn describe(&self) -> String {
        let (n, m) = (&self.normal, &self.midpoint);
        let mut text = f!(" - scoring field normal      = ({} {} {})\n", n.x, n.y, n.z);
        text += &f!(" - scoring field center      = ({} {} {})\n", m.x, m.y, m.z);
        match self.shape {
            FieldShape::Circle { radius } => {
                text += &f!(" - scoring field radius      = {radius} cm\n");
            }
            FieldShape::Rectangle { ax, ay, nx, ny, .. } => {
                text += &f!(" - scoring field             = {ax} cm X {ay} cm\n");
                text += &f!(" - scoring field resolution  = {nx} X {ny}\n");
            }
        }
        text += &f!(
            " - scoring field distance from origin = {} cm\n",
            self.distance
        );
        text
    }
}
