//! User settings for kerma scoring
//!
//! Key names follow the egs++ `scoring options` block of a kerma
//! calculation. Missing keys fall back to defaults, and the checks that turn
//! input into geometries happen in [CalculationGeometry::new()].
//!
//! [CalculationGeometry::new()]: crate::CalculationGeometry::new

// standard library
use std::path::PathBuf;

// crate modules
use crate::emuen::EmuenTable;
use crate::error::{Error, Result};

// external crates
use log::{info, warn};
use serde::{Deserialize, Serialize};

// egstools modules
use egstools_fluence::{EnergyGridInput, Scale};
use egstools_transform::TransformInput;

/// Everything needed to set up [KermaScoring](crate::KermaScoring)
///
/// ```rust
/// # use egstools_kerma::KermaInput;
/// let input: KermaInput = serde_json::from_str(
///     r#"{
///         "calculation geometry": [
///             { "geometry name": "chamber", "scoring regions": [2], "scoring volume mass": 0.5 }
///         ],
///         "muen file": "air.muendat"
///     }"#,
/// )
/// .unwrap();
///
/// assert_eq!(input.geometries[0].geometry_name.as_deref(), Some("chamber"));
/// assert!(input.emuen_file.is_some());
/// assert!(input.fluence.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KermaInput {
    #[serde(rename = "calculation geometry", alias = "calculation geometries")]
    pub geometries: Vec<CalculationInput>,

    /// Pairs of geometry names scored with a correlated ratio
    #[serde(rename = "correlated geometries")]
    pub correlated: Vec<Vec<String>>,

    #[serde(rename = "fluence scoring")]
    pub fluence: Option<FluenceScoringInput>,

    /// Path to the `E*muen/rho` table of the scoring medium
    #[serde(rename = "emuen file", alias = "muen file")]
    pub emuen_file: Option<PathBuf>,

    /// Forced detection geometry for calculation geometries without one
    #[serde(rename = "Default FD geometry")]
    pub default_fd_geometry: Option<String>,
}

impl KermaInput {
    /// Load the `E*muen/rho` table from the configured file
    pub fn emuen_table(&self) -> Result<EmuenTable> {
        let path = self.emuen_file.as_ref().ok_or(Error::MissingEmuenFile)?;
        let table = EmuenTable::from_file(path)?;
        info!("E*muen/rho file: {}", path.display());
        Ok(table)
    }

    /// Energy grid of the photon fluence, if requested
    ///
    /// Every one of the energy range and bin count must be given, otherwise
    /// fluence is not scored.
    pub fn fluence_grid(&self) -> Option<EnergyGridInput> {
        let input = self.fluence.as_ref()?;
        match (input.emin, input.emax, input.bins) {
            (Some(emin), Some(emax), Some(bins)) => Some(EnergyGridInput {
                bins,
                emin,
                emax,
                scale: input.scale,
            }),
            _ => {
                warn!("Fluence scoring needs an energy range and number of bins, no fluence scoring");
                None
            }
        }
    }
}

/// One geometry kerma is calculated in
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculationInput {
    #[serde(rename = "geometry name")]
    pub geometry_name: Option<String>,

    /// Geometry photons are forced towards, no forced detection if missing
    #[serde(rename = "FD geometry")]
    pub fd_geometry: Option<String>,

    #[serde(rename = "scoring regions")]
    pub scoring_regions: Option<Vec<i64>>,

    /// Photons that touch these regions are not scored any more
    #[serde(rename = "excluded regions")]
    pub excluded_regions: Vec<i64>,

    /// One mass per scoring region (g)
    #[serde(rename = "scoring region masses")]
    pub region_masses: Option<Vec<f64>>,

    /// Total mass of every scoring region (g)
    #[serde(rename = "scoring volume mass")]
    pub volume_mass: Option<f64>,

    /// Applied to source particles before they enter the geometry
    #[serde(flatten)]
    pub transform: TransformInput,
}

/// Photon fluence binning
///
/// Energies here are photon energies, in MeV.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FluenceScoringInput {
    #[serde(rename = "minimum energy")]
    pub emin: Option<f64>,

    #[serde(rename = "maximum energy")]
    pub emax: Option<f64>,

    #[serde(rename = "number of bins")]
    pub bins: Option<usize>,

    pub scale: Scale,
}
