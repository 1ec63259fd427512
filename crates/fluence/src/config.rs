//! User settings for the fluence scoring objects
//!
//! Everything deserialises with defaults for missing keys, and the key names
//! follow the egs++ input conventions (`"scoring particle"`,
//! `"minimum kinetic energy"`, ...). Each input is checked by a `validate()`
//! step that replaces recoverable mistakes with defaults and a warning, and
//! returns an error for the rest.

// crate modules
use crate::error::{Error, Result};
use crate::regions::{RegionList, RegionSelection};

// external crates
use log::warn;
use serde::{Deserialize, Serialize};

// egstools modules
use egstools_ausgab::Charge;
use egstools_transform::TransformInput;

/// Spacing of the energy bins
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    /// Uniform in kinetic energy
    #[default]
    Linear,
    /// Uniform in the log of kinetic energy
    #[serde(alias = "log")]
    Logarithmic,
}

impl std::fmt::Display for Scale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Linear => write!(f, "linear"),
            Self::Logarithmic => write!(f, "logarithmic"),
        }
    }
}

/// Charged particle fluence estimator
///
/// | method    | path length per bin                                   |
/// | --------- | ----------------------------------------------------- |
/// | `flurz`   | average `tvstep/edep` spread over the energy lost      |
/// | `stpwr`   | inverse stopping power at the mid energy, `O(eps^3)`  |
/// | `stpwrO5` | as `stpwr` with a slope correction, `O(eps^5)`         |
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Method {
    #[serde(rename = "flurz")]
    Flurz,
    #[default]
    #[serde(rename = "stpwr")]
    Stpwr,
    #[serde(rename = "stpwrO5", alias = "stpwro5")]
    StpwrO5,
}

impl Method {
    /// True for the methods that need stopping power tables
    pub fn uses_stopping_power(&self) -> bool {
        *self != Self::Flurz
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Flurz => write!(f, "flurz"),
            Self::Stpwr => write!(f, "stpwr"),
            Self::StpwrO5 => write!(f, "stpwrO5"),
        }
    }
}

/// Where the inverse stopping power at a step's mid energy comes from
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InverseStoppingPower {
    /// Reciprocal of the interpolated stopping power
    #[default]
    Reciprocal,
    /// Interpolated from a table of inverse stopping powers
    Tabulated,
}

/// Energy binning of differential fluence
///
/// Energies are kinetic energies in MeV.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyGridInput {
    #[serde(rename = "number of bins", alias = "bins")]
    pub bins: usize,
    #[serde(rename = "minimum kinetic energy", alias = "emin")]
    pub emin: f64,
    #[serde(rename = "maximum kinetic energy", alias = "emax")]
    pub emax: f64,
    pub scale: Scale,
}

impl Default for EnergyGridInput {
    fn default() -> Self {
        Self {
            bins: 128,
            emin: 0.001,
            emax: 1.0,
            scale: Scale::Linear,
        }
    }
}

impl EnergyGridInput {
    /// Copy with bad values replaced by the defaults
    ///
    /// A zero bin count gives the default count, and an empty or negative
    /// energy range gives the default range. Log scales also need a positive
    /// minimum energy.
    pub fn validate(&self) -> Self {
        let default = Self::default();
        let mut grid = *self;

        if grid.bins == 0 {
            warn!("Energy grid with no bins, using {}", default.bins);
            grid.bins = default.bins;
        }

        let bad_range = !(grid.emin < grid.emax)
            || grid.emin < 0.0
            || !grid.emax.is_finite()
            || (grid.scale == Scale::Logarithmic && grid.emin <= 0.0);

        if bad_range {
            warn!(
                "Invalid energy range {} - {} MeV on a {} scale, using {} - {} MeV",
                grid.emin, grid.emax, grid.scale, default.emin, default.emax
            );
            grid.emin = default.emin;
            grid.emax = default.emax;
        }
        grid
    }
}

/// Settings shared by planar and volumetric fluence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FluenceInput {
    #[serde(rename = "scoring particle")]
    pub scoring_particle: Option<Charge>,

    /// Particle type emitted by the source, for primary classification
    #[serde(rename = "source particle")]
    pub source_particle: Option<Charge>,

    pub verbose: bool,

    #[serde(rename = "score primaries")]
    pub score_primaries: bool,

    #[serde(rename = "score spectrum")]
    pub score_spectrum: bool,

    /// User factor applied to every result
    pub normalization: f64,

    #[serde(rename = "energy grid")]
    pub energy_grid: Option<EnergyGridInput>,

    #[serde(rename = "source regions")]
    pub source_regions: Option<RegionList>,

    #[serde(rename = "start source region")]
    pub source_start: Vec<i64>,

    #[serde(rename = "stop source region")]
    pub source_stop: Vec<i64>,
}

impl Default for FluenceInput {
    fn default() -> Self {
        Self {
            scoring_particle: None,
            source_particle: None,
            verbose: false,
            score_primaries: false,
            score_spectrum: false,
            normalization: 1.0,
            energy_grid: None,
            source_regions: None,
            source_start: Vec::new(),
            source_stop: Vec::new(),
        }
    }
}

/// Validated common settings
#[derive(Debug, Clone, PartialEq)]
pub struct FluenceOptions {
    pub scoring_charge: Charge,
    pub source_charge: Option<Charge>,
    pub verbose: bool,
    pub score_primaries: bool,
    pub score_spectrum: bool,
    pub normalization: f64,
    pub grid: EnergyGridInput,
    pub source_regions: RegionSelection,
}

impl FluenceInput {
    /// Check the common settings
    ///
    /// Fails without a scoring particle or with bad source region groups.
    pub fn validate(&self) -> Result<FluenceOptions> {
        let scoring_charge = self
            .scoring_particle
            .ok_or(Error::UndefinedScoringParticle)?;

        let grid = match &self.energy_grid {
            Some(grid) => grid.validate(),
            None => {
                if self.score_spectrum {
                    warn!("No energy grid for the {scoring_charge} spectrum, using defaults");
                }
                EnergyGridInput::default()
            }
        };

        let normalization = if self.normalization.is_finite() && self.normalization != 0.0 {
            self.normalization
        } else {
            warn!(
                "Invalid normalization {}, using 1",
                self.normalization
            );
            1.0
        };

        let source_regions = RegionSelection::from_input(
            "source regions",
            self.source_regions.as_ref(),
            &self.source_start,
            &self.source_stop,
            RegionSelection::Empty,
        )?;

        Ok(FluenceOptions {
            scoring_charge,
            source_charge: self.source_particle,
            verbose: self.verbose,
            score_primaries: self.score_primaries,
            score_spectrum: self.score_spectrum,
            normalization,
            grid,
            source_regions,
        })
    }
}

/// Volumetric fluence settings
///
/// ```rust
/// # use egstools_fluence::{Method, VolumetricInput};
/// let input: VolumetricInput = serde_json::from_str(
///     r#"{
///         "scoring particle": "electron",
///         "scoring regions": [1, 2],
///         "volumes": [0.5],
///         "method": "stpwrO5"
///     }"#,
/// )
/// .unwrap();
///
/// let options = input.validate().unwrap();
/// assert_eq!(options.method, Method::StpwrO5);
/// assert_eq!(options.volumes, vec![0.5]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumetricInput {
    #[serde(flatten)]
    pub common: FluenceInput,

    #[serde(rename = "scoring regions")]
    pub regions: Option<RegionList>,

    #[serde(rename = "start region")]
    pub start: Vec<i64>,

    #[serde(rename = "stop region")]
    pub stop: Vec<i64>,

    /// One volume per region group, per region, or a single value (cm3)
    pub volumes: Vec<f64>,

    pub method: Method,

    #[serde(rename = "inverse stopping power")]
    pub inverse_stopping_power: InverseStoppingPower,
}

/// Validated volumetric settings
#[derive(Debug, Clone, PartialEq)]
pub struct VolumetricOptions {
    pub common: FluenceOptions,
    pub regions: RegionSelection,
    /// Volumes in the order of the expanded scoring regions
    pub volumes: Vec<f64>,
    pub method: Method,
    pub inverse_stopping_power: InverseStoppingPower,
}

impl VolumetricInput {
    /// Check the volumetric settings
    ///
    /// Scoring regions default to none. A volume per region group is
    /// expanded to every region of that group.
    pub fn validate(&self) -> Result<VolumetricOptions> {
        let common = self.common.validate()?;
        let regions = RegionSelection::from_input(
            "scoring regions",
            self.regions.as_ref(),
            &self.start,
            &self.stop,
            RegionSelection::Empty,
        )?;

        let volumes = match &regions {
            RegionSelection::Groups(groups) if groups.len() == self.volumes.len() => groups
                .iter()
                .zip(self.volumes.iter())
                .flat_map(|((start, stop), v)| (*start..=*stop).map(move |_| *v))
                .collect(),
            _ if !self.volumes.is_empty() => self.volumes.clone(),
            _ => vec![1.0],
        };

        Ok(VolumetricOptions {
            common,
            regions,
            volumes,
            method: self.method,
            inverse_stopping_power: self.inverse_stopping_power,
        })
    }
}

/// Planar fluence settings
///
/// A field is either a circle, `[x, y, z, R]` with a plane normal, or a
/// rectangle `[xmin, xmax, ymin, ymax]` in the z=0 plane moved into place by
/// an optional transform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanarInput {
    #[serde(flatten)]
    pub common: FluenceInput,

    #[serde(rename = "contributing regions")]
    pub regions: Option<RegionList>,

    #[serde(rename = "start contributing region")]
    pub start: Vec<i64>,

    #[serde(rename = "stop contributing region")]
    pub stop: Vec<i64>,

    #[serde(rename = "scoring circle")]
    pub circle: Option<Vec<f64>>,

    #[serde(rename = "scoring plane normal")]
    pub normal: Option<Vec<f64>>,

    #[serde(rename = "scoring rectangle")]
    pub rectangle: Option<Vec<f64>>,

    /// Pixels along x and y of a rectangular field
    pub resolution: Option<Vec<i64>>,

    #[serde(flatten)]
    pub transform: TransformInput,
}

/// Validated planar settings, the field itself is checked on construction
#[derive(Debug, Clone, PartialEq)]
pub struct PlanarOptions {
    pub common: FluenceOptions,
    pub regions: RegionSelection,
}

impl PlanarInput {
    /// Check the planar settings
    ///
    /// Particles from every region contribute unless told otherwise.
    pub fn validate(&self) -> Result<PlanarOptions> {
        Ok(PlanarOptions {
            common: self.common.validate()?,
            regions: RegionSelection::from_input(
                "contributing regions",
                self.regions.as_ref(),
                &self.start,
                &self.stop,
                RegionSelection::All,
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn missing_scoring_particle() {
        let input = FluenceInput::default();
        assert!(matches!(
            input.validate(),
            Err(Error::UndefinedScoringParticle)
        ));
    }

    #[rstest]
    #[case(EnergyGridInput { bins: 0, ..Default::default() })]
    #[case(EnergyGridInput { emin: 2.0, emax: 1.0, ..Default::default() })]
    #[case(EnergyGridInput { emin: 0.0, scale: Scale::Logarithmic, ..Default::default() })]
    fn bad_grids_fall_back(#[case] input: EnergyGridInput) {
        let grid = input.validate();
        assert!(grid.bins > 0);
        assert!(grid.emin < grid.emax);
        assert!(grid.scale == Scale::Linear || grid.emin > 0.0);
    }

    #[test]
    fn zero_minimum_on_a_linear_grid() {
        let input = EnergyGridInput {
            bins: 10,
            emin: 0.0,
            emax: 1.0,
            scale: Scale::Linear,
        };
        assert_eq!(input.validate(), input);
    }

    #[test]
    fn grid_keys() {
        let grid: EnergyGridInput = serde_json::from_str(
            r#"{"number of bins": 4, "minimum kinetic energy": 0.01, "scale": "log"}"#,
        )
        .unwrap();
        assert_eq!(grid.bins, 4);
        assert_eq!(grid.emin, 0.01);
        assert_eq!(grid.emax, 1.0);
        assert_eq!(grid.scale, Scale::Logarithmic);
    }

    #[test]
    fn volumes_per_group() {
        let input = VolumetricInput {
            common: FluenceInput {
                scoring_particle: Some(Charge::Photon),
                ..Default::default()
            },
            start: vec![0, 5],
            stop: vec![2, 6],
            volumes: vec![1.0, 2.0],
            ..Default::default()
        };
        let options = input.validate().unwrap();
        assert_eq!(options.volumes, vec![1.0, 1.0, 1.0, 2.0, 2.0]);
    }

    #[test]
    fn default_volume() {
        let input: VolumetricInput =
            serde_json::from_str(r#"{"scoring particle": "photon"}"#).unwrap();
        let options = input.validate().unwrap();
        assert_eq!(options.volumes, vec![1.0]);
        assert_eq!(options.method, Method::Stpwr);
        assert_eq!(options.regions, RegionSelection::Empty);
    }

    #[test]
    fn planar_regions_default_to_all() {
        let input: PlanarInput = serde_json::from_str(
            r#"{"scoring particle": "photon", "scoring circle": [0, 0, 10, 2]}"#,
        )
        .unwrap();
        assert_eq!(input.validate().unwrap().regions, RegionSelection::All);
        assert_eq!(input.circle, Some(vec![0.0, 0.0, 10.0, 2.0]));
    }

    #[test]
    fn planar_transform_keys() {
        let input: PlanarInput = serde_json::from_str(
            r#"{"scoring particle": "photon", "translation": [0, 0, 3]}"#,
        )
        .unwrap();
        assert_eq!(input.transform.translation, Some(vec![0.0, 0.0, 3.0]));
    }
}
