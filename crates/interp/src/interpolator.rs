//! Piecewise-linear interpolation table

// standard library
use std::borrow::Cow;

// crate modules
use crate::error::{Error, Result};

// external crates
use log::{debug, trace};

/// Default cap on the number of samples for adaptive construction
pub const DEFAULT_MAX_BINS: usize = 1024;

/// Default relative accuracy for adaptive construction
pub const DEFAULT_ACCURACY: f64 = 1e-4;

/// Iteration guard for adaptive construction
const LOOP_LIMIT: usize = 100_000;

/// Linear interpolation of a function on a uniform grid
///
/// The interval `[xmin, xmax]` is split into `n = nbin - 1` equal
/// sub-intervals, and in each sub-interval `i` the function is represented as
/// `a[i] + b[i]*x`. There is one more coefficient pair than there are
/// sub-intervals: the top pair duplicates the last real one so that round-off
/// in the index calculation at `x` just below `xmax` stays in bounds.
///
/// Queries outside of the interval are clamped to the function values at the
/// boundaries.
///
/// ```rust
/// # use egstools_interp::Interpolator;
/// let table = Interpolator::from_values(3, 0.0, 2.0, &[1.0, 3.0, 4.0]).unwrap();
///
/// assert_eq!(table.interpolate(0.5), 2.0);
/// assert_eq!(table.interpolate(1.5), 3.5);
/// assert_eq!(table.interpolate(10.0), 4.0);
/// ```
///
/// Coefficients are either owned by the table or borrowed from elsewhere,
/// see [Interpolator::from_coefficients()].
#[derive(Debug, Clone, PartialEq)]
pub struct Interpolator<'a> {
    /// Number of sub-intervals
    n: usize,
    /// Maps `x` to an index as `ax + bx*x`
    ax: f64,
    bx: f64,
    /// Per-bin intercepts
    a: Cow<'a, [f64]>,
    /// Per-bin slopes
    b: Cow<'a, [f64]>,
    xmin: f64,
    xmax: f64,
    fmin: f64,
    fmax: f64,
}

impl<'a> Interpolator<'a> {
    /// Build from `nbin` values sampled at uniformly spaced points
    ///
    /// The values correspond to `xmin + j*(xmax-xmin)/(nbin-1)` for
    /// `j = 0..nbin`, so the first and last values are the function at the
    /// interval bounds.
    ///
    /// Fails for fewer than 2 bins, an empty interval, or too few values.
    pub fn from_values(nbin: usize, xmin: f64, xmax: f64, values: &[f64]) -> Result<Self> {
        Self::check(nbin, xmin, xmax)?;
        if values.len() < nbin {
            return Err(Error::InsufficientValues {
                expected: nbin,
                found: values.len(),
            });
        }

        let n = nbin - 1;
        let dx = (xmax - xmin) / n as f64;
        let bx = 1.0 / dx;
        let ax = -xmin * bx;

        let mut a = Vec::with_capacity(nbin);
        let mut b = Vec::with_capacity(nbin);
        for (j, pair) in values[..nbin].windows(2).enumerate() {
            let slope = (pair[1] - pair[0]) * bx;
            b.push(slope);
            a.push(pair[0] - slope * (xmin + dx * j as f64));
        }

        // extra sub-interval at the top for round-off
        a.push(a[n - 1]);
        b.push(b[n - 1]);

        Ok(Self {
            n,
            ax,
            bx,
            a: Cow::Owned(a),
            b: Cow::Owned(b),
            xmin,
            xmax,
            fmin: values[0],
            fmax: values[n],
        })
    }

    /// Build by sampling a function at `nbin` uniformly spaced points
    ///
    /// ```rust
    /// # use egstools_interp::Interpolator;
    /// let table = Interpolator::from_fn(5, 1.0, 2.0, |x| x * x).unwrap();
    /// assert_eq!(table.interpolate(1.0), 1.0);
    /// assert_eq!(table.interpolate(2.0), 4.0);
    /// ```
    pub fn from_fn<F>(nbin: usize, xmin: f64, xmax: f64, f: F) -> Result<Self>
    where
        F: Fn(f64) -> f64,
    {
        Self::check(nbin, xmin, xmax)?;
        let dx = (xmax - xmin) / (nbin - 1) as f64;
        let values = (0..nbin)
            .map(|j| f(xmin + dx * j as f64))
            .collect::<Vec<f64>>();
        Self::from_values(nbin, xmin, xmax, &values)
    }

    /// Adaptive construction with the default bin cap and accuracy
    ///
    /// See [Interpolator::adaptive_with()] for details.
    pub fn adaptive<F>(xmin: f64, xmax: f64, f: F) -> Result<Self>
    where
        F: Fn(f64) -> f64,
    {
        Self::adaptive_with(xmin, xmax, f, DEFAULT_MAX_BINS, DEFAULT_ACCURACY)
    }

    /// Adaptive construction from a function
    ///
    /// Starts from 9 samples and checks the linear estimate at every midpoint
    /// against the function. The table is accepted once every midpoint agrees
    /// within the relative accuracy `accu`. Otherwise the midpoints are merged
    /// in, giving `2n-1` samples, for as long as that does not exceed `nmax`.
    /// When it would, the table is simply sampled with `nmax` points.
    ///
    /// ```rust
    /// # use egstools_interp::Interpolator;
    /// let table = Interpolator::adaptive_with(0.0, 1.0, |x| 3.0 * x + 2.0, 1024, 1e-4).unwrap();
    ///
    /// // a linear function is accepted straight away
    /// assert_eq!(table.bins(), 9);
    /// ```
    pub fn adaptive_with<F>(xmin: f64, xmax: f64, f: F, nmax: usize, accu: f64) -> Result<Self>
    where
        F: Fn(f64) -> f64,
    {
        Self::check(nmax, xmin, xmax)?;
        if nmax <= 9 {
            return Self::from_fn(nmax, xmin, xmax, f);
        }

        let mut nnow = 9;
        let mut ddx = (xmax - xmin) / (nnow - 1) as f64;
        let mut samples = (0..nnow)
            .map(|j| f(xmin + ddx * j as f64))
            .collect::<Vec<f64>>();

        for _ in 0..LOOP_LIMIT {
            let midpoints = (0..nnow - 1)
                .map(|j| f(xmin + ddx * (0.5 + j as f64)))
                .collect::<Vec<f64>>();

            let converged = samples
                .windows(2)
                .zip(midpoints.iter())
                .all(|(pair, mid)| (0.5 * (pair[0] + pair[1]) / mid - 1.0).abs() <= accu);

            if converged {
                debug!("Adaptive interpolation converged with {nnow} samples");
                return Self::from_values(nnow, xmin, xmax, &samples);
            }

            if 2 * nnow - 1 > nmax {
                debug!("Adaptive interpolation capped at {nmax} samples");
                return Self::from_fn(nmax, xmin, xmax, f);
            }

            // interleave the midpoints between the existing samples
            let mut merged = Vec::with_capacity(2 * nnow - 1);
            merged.push(samples[0]);
            for (value, mid) in samples[1..].iter().zip(midpoints.iter()) {
                merged.push(*mid);
                merged.push(*value);
            }

            samples = merged;
            nnow = 2 * nnow - 1;
            ddx = (xmax - xmin) / (nnow - 1) as f64;
            trace!("Adaptive interpolation refined to {nnow} samples");
        }

        Err(Error::LoopLimitReached(LOOP_LIMIT))
    }

    /// View over coefficient arrays owned elsewhere
    ///
    /// Both slices need at least `nbin` entries. Nothing is copied, and the
    /// table borrows the coefficients for its lifetime. Use
    /// [Interpolator::into_owned()] to detach it.
    ///
    /// ```rust
    /// # use egstools_interp::Interpolator;
    /// let a = [1.0, 1.0, 1.0];
    /// let b = [2.0, 2.0, 2.0];
    /// let table = Interpolator::from_coefficients(3, 0.0, 1.0, &a, &b).unwrap();
    /// assert_eq!(table.interpolate(0.5), 2.0);
    /// assert_eq!(table.interpolate(1.0), 3.0);
    /// ```
    pub fn from_coefficients(
        nbin: usize,
        xmin: f64,
        xmax: f64,
        a: &'a [f64],
        b: &'a [f64],
    ) -> Result<Self> {
        Self::check(nbin, xmin, xmax)?;
        let found = a.len().min(b.len());
        if found < nbin {
            return Err(Error::InsufficientValues {
                expected: nbin,
                found,
            });
        }

        let n = nbin - 1;
        let bx = 1.0 / ((xmax - xmin) / n as f64);
        Ok(Self {
            n,
            ax: -xmin * bx,
            bx,
            fmin: a[0] + b[0] * xmin,
            fmax: a[n - 1] + b[n - 1] * xmax,
            a: Cow::Borrowed(a),
            b: Cow::Borrowed(b),
            xmin,
            xmax,
        })
    }

    /// Detach from any borrowed coefficients
    pub fn into_owned(self) -> Interpolator<'static> {
        Interpolator {
            n: self.n,
            ax: self.ax,
            bx: self.bx,
            a: Cow::Owned(self.a.into_owned()),
            b: Cow::Owned(self.b.into_owned()),
            xmin: self.xmin,
            xmax: self.xmax,
            fmin: self.fmin,
            fmax: self.fmax,
        }
    }

    /// Interpolated function value at `x`
    ///
    /// Clamped to the boundary values outside of `(xmin, xmax)`.
    #[inline]
    pub fn interpolate(&self, x: f64) -> f64 {
        if x > self.xmin && x < self.xmax {
            let i = self.index_fast(x);
            self.a[i] + self.b[i] * x
        } else if x <= self.xmin {
            self.fmin
        } else {
            self.fmax
        }
    }

    /// Interpolated function value with no range checks
    ///
    /// Only for `x` known to be within the interval. Panics if `x` is far
    /// enough above `xmax` to index past the table.
    #[inline]
    pub fn interpolate_fast(&self, x: f64) -> f64 {
        let i = self.index_fast(x);
        self.a[i] + self.b[i] * x
    }

    /// Interpolated function value at `x` using sub-interval `i`
    ///
    /// Several tables built on the same grid can share one index lookup.
    #[inline]
    pub fn interpolate_at(&self, i: usize, x: f64) -> f64 {
        self.a[i] + self.b[i] * x
    }

    /// Sub-interval index of `x`, clamped to `0..n-1`
    #[inline]
    pub fn index(&self, x: f64) -> usize {
        if x > self.xmin && x < self.xmax {
            self.index_fast(x)
        } else if x <= self.xmin {
            0
        } else {
            self.n - 1
        }
    }

    /// Sub-interval index of `x` with no range checks
    ///
    /// Values below `xmin` saturate to 0.
    #[inline]
    pub fn index_fast(&self, x: f64) -> usize {
        (self.ax + self.bx * x) as usize
    }

    /// Slope of sub-interval `i`
    #[inline]
    pub fn slope(&self, i: usize) -> f64 {
        self.b[i]
    }

    /// Lower bound of the interpolation interval
    pub fn xmin(&self) -> f64 {
        self.xmin
    }

    /// Upper bound of the interpolation interval
    pub fn xmax(&self) -> f64 {
        self.xmax
    }

    /// Number of sample points (one more than the number of sub-intervals)
    pub fn bins(&self) -> usize {
        self.n + 1
    }

    /// True if the coefficients are borrowed rather than owned
    pub fn is_borrowed(&self) -> bool {
        matches!(self.a, Cow::Borrowed(_))
    }

    fn check(nbin: usize, xmin: f64, xmax: f64) -> Result<()> {
        if nbin < 2 {
            return Err(Error::TooFewBins(nbin));
        }
        if xmin >= xmax || xmin.is_nan() || xmax.is_nan() {
            return Err(Error::InvalidInterval { xmin, xmax });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case(1)]
    #[case(0)]
    fn too_few_bins(#[case] nbin: usize) {
        assert_eq!(
            Interpolator::from_fn(nbin, 0.0, 1.0, |x| x),
            Err(Error::TooFewBins(nbin))
        );
    }

    #[rstest]
    #[case(1.0, 1.0)]
    #[case(2.0, 1.0)]
    fn empty_interval(#[case] xmin: f64, #[case] xmax: f64) {
        assert_eq!(
            Interpolator::from_fn(10, xmin, xmax, |x| x),
            Err(Error::InvalidInterval { xmin, xmax })
        );
    }

    #[test]
    fn short_value_table() {
        assert_eq!(
            Interpolator::from_values(4, 0.0, 1.0, &[1.0, 2.0]),
            Err(Error::InsufficientValues {
                expected: 4,
                found: 2
            })
        );
    }

    #[test]
    fn duplicated_top_coefficients() {
        let table = Interpolator::from_values(4, 0.0, 3.0, &[0.0, 1.0, 4.0, 9.0]).unwrap();
        assert_eq!(table.a.len(), 4);
        assert_eq!(table.a[3], table.a[2]);
        assert_eq!(table.slope(3), table.slope(2));
        assert_eq!(table.slope(0), 1.0);
        assert_eq!(table.slope(2), 5.0);
    }

    #[rstest]
    #[case(-1.0, 0)]
    #[case(0.0, 0)]
    #[case(0.5, 0)]
    #[case(1.5, 1)]
    #[case(2.99, 2)]
    #[case(3.0, 2)]
    #[case(10.0, 2)]
    fn clamped_index(#[case] x: f64, #[case] expected: usize) {
        let table = Interpolator::from_values(4, 0.0, 3.0, &[0.0, 1.0, 4.0, 9.0]).unwrap();
        assert_eq!(table.index(x), expected);
    }

    #[test]
    fn shared_index_lookup() {
        let f = Interpolator::from_fn(21, 0.0, 2.0, |x| x * x).unwrap();
        let g = Interpolator::from_fn(21, 0.0, 2.0, |x| 3.0 - x).unwrap();

        let x = 1.234;
        let i = f.index_fast(x);
        assert_eq!(f.interpolate_at(i, x), f.interpolate(x));
        assert_eq!(g.interpolate_at(i, x), g.interpolate(x));
        assert_eq!(f.interpolate_fast(x), f.interpolate(x));
    }

    #[test]
    fn borrowed_coefficients() {
        let owned = Interpolator::from_fn(6, -1.0, 4.0, |x| 0.5 * x * x).unwrap();
        let view = Interpolator::from_coefficients(6, -1.0, 4.0, &owned.a, &owned.b).unwrap();

        assert!(view.is_borrowed());
        assert!(!owned.is_borrowed());

        for x in [-2.0, -1.0, 0.3, 2.2, 3.999, 4.0, 5.0] {
            assert_relative_eq!(view.interpolate(x), owned.interpolate(x), epsilon = 1e-12);
        }

        let detached = view.into_owned();
        assert!(!detached.is_borrowed());
        assert_relative_eq!(detached.interpolate(1.7), owned.interpolate(1.7));
    }

    #[test]
    fn small_adaptive_cap_samples_directly() {
        let table = Interpolator::adaptive_with(1.0, 2.0, |x| 1.0 / x, 5, 1e-6).unwrap();
        assert_eq!(table.bins(), 5);
    }

    #[test]
    fn adaptive_cap_is_respected() {
        let table = Interpolator::adaptive_with(0.0, 10.0, |x| x.exp(), 100, 1e-10).unwrap();
        assert_eq!(table.bins(), 100);
    }
}
