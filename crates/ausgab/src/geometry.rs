//! Geometry queries needed for ray tracing

// egstools modules
use egstools_transform::Vector;

/// Step length used to look for any boundary along a ray
pub(crate) const FAR: f64 = 1e35;

/// Result of a distance-to-boundary query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Boundary {
    /// Distance travelled, at most the requested maximum step
    pub distance: f64,
    /// Region after the step, `None` if leaving the geometry
    pub next: Option<usize>,
    /// Medium of the next region, `None` for vacuum or outside
    pub medium: Option<usize>,
}

/// A geometry the engine transports particles through
///
/// Regions are numbered from 0. A position outside the geometry has no
/// region.
pub trait Geometry {
    /// Number of regions
    fn regions(&self) -> usize;

    /// Medium of `region`, `None` for vacuum
    fn medium(&self, region: usize) -> Option<usize>;

    /// Region containing `x`
    fn is_where(&self, x: &Vector) -> Option<usize>;

    /// Distance along `u` from `x` to the next region boundary
    ///
    /// Starting in `region`, or from outside when `None`. If no boundary is
    /// closer than `tmax` the step is `tmax` and the region is unchanged.
    fn howfar(&self, region: Option<usize>, x: &Vector, u: &Vector, tmax: f64) -> Boundary;

    /// True if `x` is inside the geometry
    fn is_inside(&self, x: &Vector) -> bool {
        self.is_where(x).is_some()
    }

    /// True if a particle at `x` moving along `u` is in or will enter
    fn is_reachable(&self, x: &Vector, u: &Vector) -> bool {
        self.is_inside(x) || self.howfar(None, x, u, FAR).next.is_some()
    }
}
