//! Shared engine stand-ins for the kerma tests
#![allow(dead_code)]

use egstools_ausgab::*;
use egstools_interp::Interpolator;
use egstools_kerma::{Attenuation, EmuenTable};
use egstools_transform::Vector;

/// Slabs stacked along z, unbounded in x and y
///
/// Region `i` lies between `planes[i]` and `planes[i + 1]`.
#[derive(Debug, Clone)]
pub struct Slabs {
    pub planes: Vec<f64>,
    pub media: Vec<Option<usize>>,
}

impl Slabs {
    pub fn new(planes: &[f64], media: &[Option<usize>]) -> Self {
        assert_eq!(planes.len(), media.len() + 1);
        Self {
            planes: planes.to_vec(),
            media: media.to_vec(),
        }
    }

    /// One region of medium 0 between `zmin` and `zmax`
    pub fn single(zmin: f64, zmax: f64) -> Self {
        Self::new(&[zmin, zmax], &[Some(0)])
    }

    fn boundary(&self, distance: f64, next: Option<usize>) -> Boundary {
        Boundary {
            distance,
            next,
            medium: next.and_then(|r| self.media[r]),
        }
    }
}

impl Geometry for Slabs {
    fn regions(&self) -> usize {
        self.media.len()
    }

    fn medium(&self, region: usize) -> Option<usize> {
        self.media.get(region).copied().flatten()
    }

    fn is_where(&self, x: &Vector) -> Option<usize> {
        self.planes.windows(2).position(|p| x.z >= p[0] && x.z < p[1])
    }

    fn howfar(&self, region: Option<usize>, x: &Vector, u: &Vector, tmax: f64) -> Boundary {
        let nreg = self.regions();
        let (t, next) = match region {
            Some(r) if u.z > 0.0 => ((self.planes[r + 1] - x.z) / u.z, (r + 1 < nreg).then_some(r + 1)),
            Some(r) if u.z < 0.0 => ((self.planes[r] - x.z) / u.z, r.checked_sub(1)),
            Some(r) => return self.boundary(tmax, Some(r)),
            None if u.z > 0.0 && x.z < self.planes[0] => ((self.planes[0] - x.z) / u.z, Some(0)),
            None if u.z < 0.0 && x.z >= self.planes[nreg] => {
                ((self.planes[nreg] - x.z) / u.z, Some(nreg - 1))
            }
            None => return self.boundary(tmax, None),
        };
        if t > tmax {
            self.boundary(tmax, region)
        } else {
            self.boundary(t, next)
        }
    }
}

/// Media densities and the source fluence
#[derive(Debug, Clone)]
pub struct Media {
    pub densities: Vec<f64>,
    pub fluence: Option<f64>,
}

impl Default for Media {
    fn default() -> Self {
        Self {
            densities: vec![1.0, 2.0],
            fluence: None,
        }
    }
}

impl Application for Media {
    fn regions(&self) -> usize {
        0
    }
    fn media(&self) -> usize {
        self.densities.len()
    }
    fn medium(&self, _region: usize) -> Option<usize> {
        None
    }
    fn medium_name(&self, medium: usize) -> Option<&str> {
        ["AIR", "WATER"].get(medium).copied()
    }
    fn medium_density(&self, medium: usize) -> f64 {
        self.densities[medium]
    }
    fn source_charge(&self) -> Option<Charge> {
        Some(Charge::Photon)
    }
    fn ecut(&self) -> f64 {
        0.7
    }
    fn stopping_power(&self, _medium: usize, _charge: Charge) -> Option<Interpolator<'_>> {
        None
    }
    fn source_fluence(&self) -> Option<f64> {
        self.fluence
    }
}

/// Energy independent mean free paths per medium
#[derive(Debug, Clone)]
pub struct MeanFreePaths {
    pub gmfp: Vec<f64>,
    pub rayleigh: Option<f64>,
    pub pcut: f64,
}

impl MeanFreePaths {
    pub fn new(gmfp: &[f64]) -> Self {
        Self {
            gmfp: gmfp.to_vec(),
            rayleigh: None,
            pcut: 0.001,
        }
    }
}

impl Attenuation for MeanFreePaths {
    fn gmfp(&self, medium: usize, _gle: f64) -> f64 {
        self.gmfp[medium]
    }
    fn rayleigh_factor(&self, _medium: usize, _gle: f64) -> Option<f64> {
        self.rayleigh
    }
    fn photon_cutoff(&self) -> f64 {
        self.pcut
    }
}

/// Constant `E*muen/rho` of 5 MeV cm2/g
pub fn flat_emuen() -> EmuenTable {
    EmuenTable::parse("2\n 0.001 5.0\n 10.0 5.0\n").unwrap()
}

/// Pass one event to `object` if it asked for it
pub fn send<O: AusgabObject>(object: &mut O, stack: &mut Stack, call: AusgabCall, step: StepInfo) {
    if object.needs_call(call) {
        let mut event = Event::new(stack, step, None);
        object.process_event(call, &mut event);
    }
}

/// Checkpoint text of an object
pub fn checkpoint<O: AusgabObject>(object: &O) -> String {
    let mut buffer = Vec::new();
    object.store_state(&mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}
