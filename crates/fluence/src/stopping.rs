//! Stopping power tables for charged particle fluence

// crate modules
use crate::config::{InverseStoppingPower, Method};
use crate::error::{Error, Result};
use crate::grid::EnergyGrid;

// external crates
use log::debug;

// egstools modules
use egstools_ausgab::{Application, Charge};
use egstools_interp::Interpolator;

/// Stopping powers and inverse stopping powers of every medium
///
/// All tables are functions of the log of the kinetic energy.
#[derive(Debug, Clone, PartialEq)]
pub struct StoppingPowers {
    method: Method,
    inverse: InverseStoppingPower,
    log_scale: bool,
    /// Stopping power per medium
    i_dedx: Vec<Interpolator<'static>>,
    /// Inverse stopping power per medium, on the same grid
    dedx_i: Vec<Interpolator<'static>>,
    /// Inverse stopping power at the middle of every bin, by medium
    lmid_i: Vec<f64>,
    nbin: usize,
}

impl StoppingPowers {
    /// Tables for `charge` in every medium of the application
    ///
    /// Fails if the application has no stopping power for a medium.
    pub fn new(
        app: &dyn Application,
        charge: Charge,
        grid: &EnergyGrid,
        method: Method,
        inverse: InverseStoppingPower,
    ) -> Result<Self> {
        let nbin = grid.bins();
        let mut i_dedx = Vec::with_capacity(app.media());
        let mut dedx_i = Vec::with_capacity(app.media());
        let mut lmid_i = Vec::with_capacity(app.media() * nbin);

        for medium in 0..app.media() {
            let table = app
                .stopping_power(medium, charge)
                .ok_or(Error::MissingStoppingPower { medium, charge })?
                .into_owned();

            let (xmin, xmax) = (table.xmin(), table.xmax());
            let inverse_table =
                Interpolator::from_fn(table.bins(), xmin, xmax, |x| 1.0 / table.interpolate(x))?;
            debug!(
                "Inverse {charge} stopping power for medium {medium}, {} points in [{xmin:.4}, {xmax:.4}]",
                table.bins()
            );

            lmid_i.extend((0..nbin).map(|i| 1.0 / table.interpolate(Self::ln_emid(grid, i))));
            i_dedx.push(table);
            dedx_i.push(inverse_table);
        }

        Ok(Self {
            method,
            inverse,
            log_scale: grid.is_log(),
            i_dedx,
            dedx_i,
            lmid_i,
            nbin,
        })
    }

    /// Log of the mid energy of bin `i`
    fn ln_emid(grid: &EnergyGrid, i: usize) -> f64 {
        if grid.is_log() {
            let expbw = grid.bw().exp();
            (0.5 * grid.emin() * (expbw + 1.0)).ln() + i as f64 * grid.bw()
        } else {
            (grid.emin() + grid.bw() * (i as f64 + 0.5)).ln()
        }
    }

    /// Number of media
    pub fn media(&self) -> usize {
        self.i_dedx.len()
    }

    /// Inverse stopping power at the middle of `bin` in `medium`
    #[inline]
    pub fn lmid(&self, medium: usize, bin: usize) -> f64 {
        self.lmid_i[bin + medium * self.nbin]
    }

    /// Inverse stopping power at the log of the kinetic energy
    #[inline]
    pub fn inverse_at(&self, medium: usize, ln_e: f64) -> f64 {
        match self.inverse {
            InverseStoppingPower::Reciprocal => 1.0 / self.i_dedx[medium].interpolate(ln_e),
            InverseStoppingPower::Tabulated => self.dedx_i[medium].interpolate(ln_e),
        }
    }

    /// Path length per unit energy lost between `xb` and `xe`
    ///
    /// Here `xb > xe` are grid coordinates: kinetic energies on a linear
    /// grid and their logs on a log grid. With `eps` the fractional energy
    /// loss, the inverse stopping power is taken at the mean energy, plus a
    /// correction for the change in stopping power along the step with
    /// [Method::StpwrO5].
    pub fn step_per_fraction(&self, medium: usize, xb: f64, xe: f64) -> f64 {
        let (eps, ln_emid) = if self.log_scale {
            let eps = 1.0 - (xe - xb).exp();
            let ln_emid = 0.5 * (xb + xe + 0.25 * eps * eps * (1.0 + eps * (1.0 + 0.875 * eps)));
            (eps, ln_emid)
        } else {
            let eps = if self.method == Method::StpwrO5 {
                1.0 - xe / xb
            } else {
                0.0
            };
            (eps, (0.5 * (xb + xe)).ln())
        };

        let dedxmid_i = self.inverse_at(medium, ln_emid);
        if self.method != Method::StpwrO5 {
            return dedxmid_i;
        }

        let table = &self.i_dedx[medium];
        let b = table.slope(table.index(ln_emid));
        let mut aux = b * dedxmid_i;
        let ratio = eps / (2.0 - eps);
        aux = aux * (1.0 + 2.0 * aux) * ratio * ratio / 6.0;
        dedxmid_i * (1.0 + aux)
    }
}
