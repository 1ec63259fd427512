//! Energy bins and track-length apportionment

// crate modules
use crate::config::{EnergyGridInput, Scale};

// external crates
use log::{info, warn};

// egstools modules
use egstools_utils::f;

/// Lower sentinel for the log of a non-positive end-of-step energy
const LOG_ZERO: f64 = -15.0;

/// Uniform bins in kinetic energy or in its log
///
/// Bin `j` covers `[xmin + j*bw, xmin + (j+1)*bw)` in `x`, where `x` is the
/// energy or its natural log. The top bin also takes `x == xmax`.
///
/// On log grids the energy width of every bin differs, so the widths and
/// the constants needed to place an energy within its bin are tabulated.
///
/// ```rust
/// # use egstools_fluence::{EnergyGrid, EnergyGridInput, Scale};
/// let grid = EnergyGrid::new(&EnergyGridInput {
///     bins: 4,
///     emin: 0.0,
///     emax: 2.0,
///     scale: Scale::Linear,
/// });
///
/// assert_eq!(grid.bin_of(0.6), Some(1));
/// assert_eq!(grid.bin_of(2.0), Some(3));
/// assert_eq!(grid.bin_of(0.0), None);
/// assert_eq!(grid.bin_mid(1), 0.75);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyGrid {
    nbin: usize,
    scale: Scale,
    emin: f64,
    emax: f64,
    xmin: f64,
    xmax: f64,
    /// Maps `x` to a bin as `a*x + b`
    a: f64,
    b: f64,
    /// Bin width in `x`
    bw: f64,
    /// `1/(exp(bw) - 1)`
    r_const: f64,
    /// Energy width of each bin on log grids
    de: Vec<f64>,
    /// `exp(-j*bw)/emin`, the inverse lower edge of each bin on log grids
    a_const: Vec<f64>,
}

impl EnergyGrid {
    /// Grid as given, validated for bad values first
    pub fn new(input: &EnergyGridInput) -> Self {
        let input = input.validate();
        let log_scale = input.scale == Scale::Logarithmic;
        let (xmin, xmax) = if log_scale {
            (input.emin.ln(), input.emax.ln())
        } else {
            (input.emin, input.emax)
        };
        let bw = (xmax - xmin) / input.bins as f64;
        Self::with_width(input.bins, input.scale, input.emin, input.emax, bw)
    }

    /// Grid for charged particles with an electron cutoff
    ///
    /// Bins entirely below the kinetic energy cutoff `ecut_kinetic` are
    /// dropped. The bin width and upper energy are kept, so the lower energy
    /// moves up to a bin edge at or below the cutoff.
    pub fn with_cutoff(input: &EnergyGridInput, ecut_kinetic: f64) -> Self {
        let grid = Self::new(input);
        if grid.emin >= ecut_kinetic {
            return grid;
        }

        if ecut_kinetic >= grid.emax {
            warn!(
                "Electron cutoff ({ecut_kinetic} MeV kinetic) above the energy grid, keeping all bins"
            );
            return grid;
        }

        let span = match grid.scale {
            Scale::Logarithmic => grid.xmax - ecut_kinetic.ln(),
            Scale::Linear => grid.xmax - ecut_kinetic,
        };
        let nbin = ((span / grid.bw).ceil() as usize).clamp(1, grid.nbin);

        let emin = match grid.scale {
            Scale::Logarithmic => grid.emax * (-(nbin as f64) * grid.bw).exp(),
            Scale::Linear => grid.emax - nbin as f64 * grid.bw,
        };

        info!(
            "Dropped {} energy bins below the electron cutoff, now {} bins from {} MeV",
            grid.nbin - nbin,
            nbin,
            emin
        );
        Self::with_width(nbin, grid.scale, emin, grid.emax, grid.bw)
    }

    fn with_width(nbin: usize, scale: Scale, emin: f64, emax: f64, bw: f64) -> Self {
        let log_scale = scale == Scale::Logarithmic;
        let (xmin, xmax) = if log_scale {
            (emin.ln(), emax.ln())
        } else {
            (emin, emax)
        };
        let a = 1.0 / bw;
        let b = -xmin * a;

        let (r_const, de, a_const) = if log_scale {
            let expbw = bw.exp();
            let de = (0..nbin)
                .map(|i| emin * expbw.powi(i as i32) * (expbw - 1.0))
                .collect();
            let a_const = (0..nbin)
                .map(|i| 1.0 / (emin * expbw.powi(i as i32)))
                .collect();
            (1.0 / (expbw - 1.0), de, a_const)
        } else {
            (0.0, Vec::new(), Vec::new())
        };

        Self {
            nbin,
            scale,
            emin,
            emax,
            xmin,
            xmax,
            a,
            b,
            bw,
            r_const,
            de,
            a_const,
        }
    }

    /// Number of bins
    pub fn bins(&self) -> usize {
        self.nbin
    }

    /// Bin spacing
    pub fn scale(&self) -> Scale {
        self.scale
    }

    /// True for bins uniform in the log of energy
    #[inline]
    pub fn is_log(&self) -> bool {
        self.scale == Scale::Logarithmic
    }

    /// Lowest energy (MeV)
    pub fn emin(&self) -> f64 {
        self.emin
    }

    /// Highest energy (MeV)
    pub fn emax(&self) -> f64 {
        self.emax
    }

    /// Lower bound in `x`
    pub fn xmin(&self) -> f64 {
        self.xmin
    }

    /// Upper bound in `x`
    pub fn xmax(&self) -> f64 {
        self.xmax
    }

    /// Bin width in `x`
    pub fn bw(&self) -> f64 {
        self.bw
    }

    /// Bins per unit `x`, the inverse of [EnergyGrid::bw()]
    pub fn a(&self) -> f64 {
        self.a
    }

    /// `x` of an energy, its log on log grids
    #[inline]
    pub fn to_x(&self, e: f64) -> f64 {
        if self.is_log() {
            e.ln()
        } else {
            e
        }
    }

    /// Lower edge of bin `j` in `x`
    #[inline]
    pub fn lower_edge(&self, j: usize) -> f64 {
        self.xmin + j as f64 * self.bw
    }

    /// Bin containing energy `e`, if in `(emin, emax]`
    #[inline]
    pub fn bin_of(&self, e: f64) -> Option<usize> {
        let x = self.to_x(e);
        if x > self.xmin && x <= self.xmax {
            Some(((self.a * x + self.b) as usize).min(self.nbin - 1))
        } else {
            None
        }
    }

    /// Energy width of bin `j` (MeV)
    #[inline]
    pub fn bin_width(&self, j: usize) -> f64 {
        if self.is_log() {
            self.de[j]
        } else {
            self.bw
        }
    }

    /// Energy at the middle of bin `j` in `x` (MeV)
    pub fn bin_mid(&self, j: usize) -> f64 {
        let x = (j as f64 + 0.5 - self.b) / self.a;
        if self.is_log() {
            x.exp()
        } else {
            x
        }
    }

    /// How a step from kinetic energy `eb` down to `ee` covers the bins
    ///
    /// `None` if the step misses the grid. Energies above the grid start in
    /// the top bin, and energies below it end in the bottom bin.
    ///
    /// ```rust
    /// # use egstools_fluence::{EnergyGrid, EnergyGridInput, Scale};
    /// let grid = EnergyGrid::new(&EnergyGridInput {
    ///     bins: 10,
    ///     emin: 0.0,
    ///     emax: 1.0,
    ///     scale: Scale::Linear,
    /// });
    ///
    /// let c = grid.apportion(0.55, 0.25).unwrap();
    /// assert_eq!((c.jb, c.je), (5, 2));
    /// assert!((c.ab - 0.5).abs() < 1e-12 && (c.ae - 0.5).abs() < 1e-12);
    ///
    /// assert!(grid.apportion(1.5, 1.2).is_none());
    /// ```
    pub fn apportion(&self, eb: f64, ee: f64) -> Option<Coverage> {
        let log_scale = self.is_log();
        let xb = self.to_x(eb);
        let xe = match (log_scale, ee > 0.0) {
            (true, true) => ee.ln(),
            (true, false) => LOG_ZERO,
            (false, _) => ee,
        };

        if !(xb > self.xmin && xe < self.xmax) {
            return None;
        }

        let (xb, jb, ab) = if xb < self.xmax {
            let t = self.a * xb + self.b;
            let jb = (t as usize).min(self.nbin - 1);
            (xb, jb, self.fraction(jb, t, eb))
        } else {
            (self.xmax, self.nbin - 1, 1.0)
        };

        let (xe, je, ae) = if xe > self.xmin && (ee > 0.0 || !log_scale) {
            let t = self.a * xe + self.b;
            let je = (t as usize).min(self.nbin - 1);
            (xe, je, self.fraction(je, t, ee))
        } else {
            (self.xmin, 0, 0.0)
        };

        Some(Coverage {
            xb,
            xe,
            jb,
            ab,
            je,
            ae,
        })
    }

    /// Fraction of bin `j` below energy `e`, where `t = a*x + b`
    #[inline]
    fn fraction(&self, j: usize, t: f64, e: f64) -> f64 {
        if self.is_log() {
            (e * self.a_const[j] - 1.0) * self.r_const
        } else {
            t - j as f64
        }
    }

    /// One line summary for setup descriptions
    pub fn describe(&self) -> String {
        f!(
            "scoring in the {} MeV and {} MeV energy range on a {} scale",
            self.emin,
            self.emax,
            self.scale
        )
    }
}

/// Bins covered by one charged particle step
///
/// The step runs from `xb` in bin `jb` down to `xe` in bin `je`, and `ab`,
/// `ae` are the fractions of those bins in energy lying below `xb` and `xe`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coverage {
    pub xb: f64,
    pub xe: f64,
    pub jb: usize,
    pub ab: f64,
    pub je: usize,
    pub ae: f64,
}

impl Coverage {
    /// True if the step starts and ends in the same bin
    #[inline]
    pub fn is_single_bin(&self) -> bool {
        self.jb == self.je
    }
}
