//! Forced detection of photons in the scoring regions
//!
//! Every photon aimed at (or inside) the FD geometry is ray-traced through
//! the calculation geometry along its current direction. The kerma it would
//! deposit in each scoring region is scored with the probability of getting
//! there without interacting, `exp(-Lambda)`, where `Lambda` is the sum of
//! `sigma*t` over the regions crossed on the way.
//!
//! In a scoring region of attenuation `mu` crossed over a length `t`, the
//! attenuated path length is `(1 - exp(-mu*t))/mu`. Scoring volumes that
//! can be crossed more than once (shells, hollow shapes) are handled by
//! carrying on the trace after each exit for as long as the FD geometry is
//! still ahead of the photon.

// crate modules
use crate::geometry::CalculationGeometry;
use crate::kerma::KermaScoring;

// external crates
use log::trace;

// egstools modules
use egstools_ausgab::{Charge, Particle, Visit};

/// Step length used to find the next boundary along a ray
const TSTEP_MAX: f64 = 1e35;

/// Photon attenuation data supplied by the transport engine
pub trait Attenuation {
    /// Photon mean free path in `medium` at `gle = ln(E)` (cm)
    fn gmfp(&self, medium: usize, gle: f64) -> f64;

    /// Factor applied to the mean free path for Rayleigh scattering
    ///
    /// `None` when Rayleigh scattering is off.
    fn rayleigh_factor(&self, _medium: usize, _gle: f64) -> Option<f64> {
        None
    }

    /// Photons below this energy are not transported (MeV)
    fn photon_cutoff(&self) -> f64;
}

/// One pass of a ray through the scoring volume
#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct Pass {
    /// Survival probability of every earlier pass
    pub weight: f64,
    /// Optical depth from the start of the pass to the scoring volume
    pub lambda_to_cv: f64,
    /// Attenuation coefficient of the scoring medium (cm-1)
    pub mu_cv: f64,
    /// Region and path length of each scoring region crossed
    pub segments: Vec<(usize, f64)>,
    /// Path length through the scoring volume on this pass
    pub length: f64,
}

impl Pass {
    fn new(weight: f64) -> Self {
        Self {
            weight,
            ..Default::default()
        }
    }

    /// `exp(-Lambda)` at the end of the pass
    fn survival(&self) -> f64 {
        self.segments.iter().fold((-self.lambda_to_cv).exp(), |acc, (_, t)| {
            acc * (-self.mu_cv * t).exp()
        })
    }
}

/// `(1 - exp(-mu*t))/mu`, the attenuated length of a path `t`
#[inline]
pub(crate) fn attenuated_length(mu: f64, t: f64) -> f64 {
    if mu > 0.0 {
        -(-mu * t).exp_m1() / mu
    } else {
        t
    }
}

/// Follow a photon through `g` and collect its passes through the scoring
/// volume
///
/// The trace stops at an excluded region, on leaving the geometry, or on
/// leaving the scoring volume when the FD geometry is no longer ahead.
pub(crate) fn trace(
    g: &CalculationGeometry<'_>,
    p: &Particle,
    att: &dyn Attenuation,
) -> Vec<Pass> {
    let mut passes = Vec::new();
    let Some(mut region) = p.region else {
        return passes;
    };
    let geometry = g.geometry();
    let gle = p.energy.ln();
    let u = p.direction;
    let mut x = p.position;

    let mut new_medium = geometry.medium(region);
    let mut medium = None;
    let mut sigma = 0.0;
    let mut weight = 1.0;

    loop {
        let mut pass = Pass::new(weight);
        let mut lambda = 0.0;
        let mut inside = false;
        let mut re_enters = false;

        loop {
            if g.is_excluded(region) {
                break;
            }
            if medium != new_medium {
                medium = new_medium;
                sigma = match medium {
                    Some(m) => {
                        let cohfac = att.rayleigh_factor(m, gle).unwrap_or(1.0);
                        1.0 / (att.gmfp(m, gle) * cohfac)
                    }
                    None => 0.0,
                };
            }

            let boundary = geometry.howfar(Some(region), &x, &u, TSTEP_MAX);
            let tstep = boundary.distance;
            new_medium = boundary.medium;
            lambda += tstep * sigma;

            if g.is_sensitive(region) {
                pass.segments.push((region, tstep));
                pass.length += tstep;
                lambda -= tstep * sigma;
                if !inside {
                    pass.lambda_to_cv = lambda;
                    pass.mu_cv = sigma;
                    inside = true;
                }
            }

            let Some(next) = boundary.next else {
                break;
            };
            region = next;
            x += u * tstep;

            if inside && !g.is_sensitive(region) {
                re_enters = g.fd_geometry().is_some_and(|fd| fd.is_reachable(&x, &u));
                break;
            }
        }

        if !inside {
            break;
        }
        weight *= pass.survival();
        passes.push(pass);
        if !re_enters {
            break;
        }
        trace!("Photon re-enters the scoring volume of \"{}\"", g.name());
    }
    passes
}

impl KermaScoring<'_> {
    /// Decide whether the top photon is forced towards the scoring regions
    ///
    /// Photons are traced when the current geometry has an FD geometry, the
    /// photon has not been in an excluded region, and it is either in a
    /// scoring region or in or aimed at the FD geometry. Returns true if
    /// the photon was traced and scored.
    ///
    /// Sampling the distance to the next interaction is left to the engine.
    pub fn select_photon_mfp(&mut self, p: &Particle, att: &dyn Attenuation) -> bool {
        let g = self.current_geometry();
        let Some(fd) = g.fd_geometry() else {
            return false;
        };
        if p.charge != Charge::Photon || p.visit == Visit::Excluded {
            return false;
        }
        let Some(region) = p.region else {
            return false;
        };

        if g.is_sensitive(region) || fd.is_reachable(&p.position, &p.direction) {
            self.score_forced(p, att);
            true
        } else {
            false
        }
    }

    /// Ray-trace a photon and score its attenuated kerma and fluence
    ///
    /// Photons below the photon cutoff are not scored.
    pub fn score_forced(&mut self, p: &Particle, att: &dyn Attenuation) {
        if p.energy < att.photon_cutoff() {
            return;
        }
        let ig = self.current_index();
        let g = self.current_geometry();
        let passes = trace(g, p, att);
        let emuen = self.emuen().at(p.energy.ln()) * g.density();

        for pass in &passes {
            let wt = p.weight * pass.weight;
            let mut survival = (-pass.lambda_to_cv).exp();

            for &(region, t) in &pass.segments {
                let length = survival * attenuated_length(pass.mu_cv, t);
                if let Some(kerma_r) = &mut self.kerma_r[ig] {
                    kerma_r.score(region, wt * emuen * length);
                }
                if let Some(fluence) = &mut self.fluence {
                    fluence.score_spectrum(ig, p.energy, wt * length);
                }
                survival *= (-pass.mu_cv * t).exp();
            }

            let length = (-pass.lambda_to_cv).exp() * attenuated_length(pass.mu_cv, pass.length);
            self.kerma.score(ig, wt * emuen * length);
            if let Some(fluence) = &mut self.fluence {
                fluence.score_total(ig, wt * length);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, 2.0, 2.0)]
    #[case(1.0, 0.0, 0.0)]
    #[case(0.5, 2.0, 2.0 * (1.0 - (-1.0_f64).exp()))]
    #[case(1e-12, 3.0, 3.0)]
    fn attenuated_lengths(#[case] mu: f64, #[case] t: f64, #[case] expected: f64) {
        assert_relative_eq!(attenuated_length(mu, t), expected, max_relative = 1e-9);
    }

    #[test]
    fn survival_over_a_pass() {
        let pass = Pass {
            weight: 1.0,
            lambda_to_cv: 0.5,
            mu_cv: 0.2,
            segments: vec![(1, 1.0), (2, 1.5)],
            length: 2.5,
        };
        assert_relative_eq!(pass.survival(), (-1.0_f64).exp(), max_relative = 1e-12);
    }
}
