//! Simulation-wide data a scoring object may ask the engine for

// crate modules
use crate::particle::{Charge, ELECTRON_REST_MASS};

// egstools modules
use egstools_interp::Interpolator;

/// The application running the simulation
///
/// Scoring objects query this once at setup and again when reporting.
/// Nothing here is used in the per-step hot path.
pub trait Application {
    /// Number of regions in the simulation geometry
    fn regions(&self) -> usize;

    /// Number of media
    fn media(&self) -> usize;

    /// Medium of `region`, `None` for vacuum
    fn medium(&self, region: usize) -> Option<usize>;

    /// Name of `medium`
    fn medium_name(&self, medium: usize) -> Option<&str>;

    /// Mass density of `medium` (g/cm3)
    fn medium_density(&self, medium: usize) -> f64;

    /// Charge of the source particles, `None` for mixed sources
    fn source_charge(&self) -> Option<Charge>;

    /// Global electron transport cutoff, total energy (MeV)
    fn ecut(&self) -> f64;

    /// Restricted stopping power of `charge` in `medium` as a function of
    /// the log of the kinetic energy (MeV/cm)
    ///
    /// Usually a view over the engine's own tables.
    fn stopping_power(&self, medium: usize, charge: Charge) -> Option<Interpolator<'_>>;

    /// Source fluence, or number of source particles, run so far
    ///
    /// `None` when the source does not define one, in which case results
    /// are per history.
    fn source_fluence(&self) -> Option<f64>;

    /// Rest mass energy of charged particles (MeV)
    fn rest_mass(&self) -> f64 {
        ELECTRON_REST_MASS
    }

    /// True if electron range rejection is switched on
    fn range_rejection(&self) -> bool {
        false
    }
}
