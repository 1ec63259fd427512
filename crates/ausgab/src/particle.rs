//! Particle records as seen by scoring objects

// crate modules
use crate::error::Error;

// external crates
use serde::{Deserialize, Serialize};

// egstools modules
use egstools_transform::Vector;
use egstools_utils::f;

/// Electron rest mass energy in MeV
pub const ELECTRON_REST_MASS: f64 = 0.5109989461;

/// Particle type identified by its charge
///
/// ```rust
/// # use egstools_ausgab::Charge;
/// assert_eq!(Charge::try_from(-1).unwrap(), Charge::Electron);
/// assert_eq!(Charge::try_from("positron").unwrap(), Charge::Positron);
/// assert!(Charge::Photon.id() == 0 && !Charge::Photon.is_charged());
/// ```
#[repr(i32)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Charge {
    Electron = -1,
    #[default]
    Photon = 0,
    Positron = 1,
}

impl Charge {
    /// Charge in units of the elementary charge
    #[inline]
    pub fn id(&self) -> i32 {
        *self as i32
    }

    /// True for electrons and positrons
    #[inline]
    pub fn is_charged(&self) -> bool {
        *self != Self::Photon
    }

    /// Lowercase particle name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Electron => "electron",
            Self::Photon => "photon",
            Self::Positron => "positron",
        }
    }
}

impl TryFrom<i32> for Charge {
    type Error = Error;

    fn try_from(v: i32) -> Result<Self, Self::Error> {
        match v {
            -1 => Ok(Self::Electron),
            0 => Ok(Self::Photon),
            1 => Ok(Self::Positron),
            _ => Err(Error::UnknownCharge(f!("{v}"))),
        }
    }
}

impl TryFrom<&str> for Charge {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "-1" | "e-" | "electron" => Ok(Self::Electron),
            "0" | "p" | "photon" => Ok(Self::Photon),
            "1" | "e+" | "positron" => Ok(Self::Positron),
            _ => Err(Error::UnknownCharge(s)),
        }
    }
}

impl std::fmt::Display for Charge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Whether a particle still counts as a primary
///
/// Classification only ever moves a particle from [LineageStatus::Primary]
/// to [LineageStatus::Secondary], and the engine copies the status to the
/// products of every interaction.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LineageStatus {
    #[default]
    Primary,
    Secondary,
}

/// Where a photon has been, for kerma scoring
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Visit {
    /// Not yet inside a scoring volume
    #[default]
    Outside,
    /// Has been inside a scoring volume
    Inside,
    /// Has entered an excluded region, and never scores again
    Excluded,
}

/// State of one particle on the stack
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Position (cm)
    pub position: Vector,
    /// Unit direction
    pub direction: Vector,
    /// Total energy including rest mass for charged particles (MeV)
    pub energy: f64,
    /// Particle type
    pub charge: Charge,
    /// Statistical weight
    pub weight: f64,
    /// Current region, `None` outside of the geometry
    pub region: Option<usize>,
    /// Primary/secondary classification
    pub lineage: LineageStatus,
    /// Scoring volume bookkeeping for kerma estimators
    pub visit: Visit,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            position: Vector::zeros(),
            direction: Vector::z(),
            energy: 0.0,
            charge: Charge::Photon,
            weight: 1.0,
            region: None,
            lineage: LineageStatus::Primary,
            visit: Visit::Outside,
        }
    }
}

impl Particle {
    /// New primary at the origin moving along +z with unit weight
    pub fn new(charge: Charge, energy: f64) -> Self {
        Self {
            charge,
            energy,
            ..Default::default()
        }
    }

    /// Set the position
    pub fn at(mut self, position: Vector) -> Self {
        self.position = position;
        self
    }

    /// Set the direction
    pub fn towards(mut self, direction: Vector) -> Self {
        self.direction = direction;
        self
    }

    /// Set the statistical weight
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Set the region
    pub fn in_region(mut self, region: usize) -> Self {
        self.region = Some(region);
        self
    }

    /// Kinetic energy given the rest mass `rm` of charged particles
    #[inline]
    pub fn kinetic_energy(&self, rm: f64) -> f64 {
        if self.charge.is_charged() {
            self.energy - rm
        } else {
            self.energy
        }
    }

    /// True unless classified as a secondary
    #[inline]
    pub fn is_primary(&self) -> bool {
        self.lineage == LineageStatus::Primary
    }

    /// Classify as secondary
    #[inline]
    pub fn mark_secondary(&mut self) {
        self.lineage = LineageStatus::Secondary;
    }
}

/// Details of the step that is about to be taken, or was just taken
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct StepInfo {
    /// Energy deposited along the step (MeV)
    pub edep: f64,
    /// Total curved path length of the step (cm)
    pub tvstep: f64,
}

impl StepInfo {
    /// New step record
    pub fn new(edep: f64, tvstep: f64) -> Self {
        Self { edep, tvstep }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("electron", Charge::Electron)]
    #[case(" Photon ", Charge::Photon)]
    #[case("1", Charge::Positron)]
    #[case("e-", Charge::Electron)]
    fn charge_from_str(#[case] s: &str, #[case] expected: Charge) {
        assert_eq!(Charge::try_from(s).unwrap(), expected);
    }

    #[test]
    fn charge_failures() {
        assert!(Charge::try_from(2).is_err());
        assert!(Charge::try_from("neutron").is_err());
    }

    #[test]
    fn charge_serde() {
        let c: Charge = serde_json::from_str("\"positron\"").unwrap();
        assert_eq!(c, Charge::Positron);
        assert_eq!(serde_json::to_string(&Charge::Photon).unwrap(), "\"photon\"");
    }

    #[test]
    fn kinetic_energy() {
        let rm = ELECTRON_REST_MASS;
        let e = Particle::new(Charge::Electron, 1.0 + rm);
        assert_eq!(e.kinetic_energy(rm), 1.0 + rm - rm);
        let p = Particle::new(Charge::Photon, 1.0);
        assert_eq!(p.kinetic_energy(rm), 1.0);
    }

    #[test]
    fn lineage_is_one_way() {
        let mut p = Particle::new(Charge::Photon, 1.0);
        assert!(p.is_primary());
        p.mark_secondary();
        p.mark_secondary();
        assert!(!p.is_primary());
    }
}
