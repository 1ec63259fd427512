//! Calculation geometries and their scoring regions

// crate modules
use crate::config::CalculationInput;
use crate::error::{Error, Result};

// external crates
use log::{debug, warn};

// egstools modules
use egstools_ausgab::{Application, Geometry};
use egstools_fluence::describe_regions;
use egstools_transform::{AffineTransform, Vector};
use egstools_utils::{f, StringExt};

/// Step length used to find where a source particle enters a geometry
const ENTRY_SEARCH: f64 = 1e30;

/// Named geometries the engine makes available to scoring objects
///
/// ```rust
/// # use egstools_kerma::Geometries;
/// let geometries = Geometries::new();
/// assert!(geometries.get("chamber").is_none());
/// assert!(geometries.is_empty());
/// ```
#[derive(Default)]
pub struct Geometries<'g> {
    named: Vec<(String, &'g dyn Geometry)>,
}

impl<'g> Geometries<'g> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `geometry` under `name`, replacing any with the same name
    pub fn add(&mut self, name: &str, geometry: &'g dyn Geometry) {
        match self.named.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = geometry,
            None => self.named.push((name.to_string(), geometry)),
        }
    }

    /// Geometry registered under `name`
    pub fn get(&self, name: &str) -> Option<&'g dyn Geometry> {
        self.named
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, g)| *g)
    }

    pub fn len(&self) -> usize {
        self.named.len()
    }

    pub fn is_empty(&self) -> bool {
        self.named.is_empty()
    }
}

impl std::fmt::Debug for Geometries<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.named.iter().map(|(n, _)| n))
            .finish()
    }
}

/// A geometry kerma is scored in
///
/// Holds the scoring and excluded regions, the masses used to turn energy
/// into kerma, and the density of the scoring medium. An optional forced
/// detection (FD) geometry switches scoring from photons crossing the
/// scoring regions to photons ray-traced towards them.
pub struct CalculationGeometry<'g> {
    name: String,
    geometry: &'g dyn Geometry,
    fd_name: Option<String>,
    fd: Option<&'g dyn Geometry>,
    transform: Option<AffineTransform>,
    sensitive: Vec<bool>,
    excluded: Vec<bool>,
    scoring_regions: Vec<usize>,
    /// Mass of each region when scored individually (g)
    region_masses: Option<Vec<f64>>,
    /// Total mass of every scoring region (g)
    mass: f64,
    medium: Option<usize>,
    density: f64,
}

impl<'g> CalculationGeometry<'g> {
    /// Set up a geometry from user input
    ///
    /// Returns `Ok(None)` with a warning for input that is ignored: a
    /// missing geometry name, missing scoring regions, an unknown geometry,
    /// or no scoring region inside the geometry. Scoring regions out of
    /// range are skipped with a warning.
    ///
    /// Masses must be either one per listed scoring region or a single
    /// total mass. An excluded region out of range is an error.
    pub fn new(
        input: &CalculationInput,
        geometries: &Geometries<'g>,
        default_fd: Option<&str>,
        app: &dyn Application,
    ) -> Result<Option<Self>> {
        let label = input.geometry_name.clone().unwrap_or_default();
        let requested = input.scoring_regions.as_deref().unwrap_or_default();
        let masses = Self::masses(input, &label, requested.len())?;

        let (Some(name), Some(requested)) = (&input.geometry_name, &input.scoring_regions) else {
            warn!("Missing \"geometry name\" or \"scoring regions\", calculation geometry ignored");
            return Ok(None);
        };

        let Some(geometry) = geometries.get(name) else {
            warn!("No geometry named \"{name}\", calculation geometry ignored");
            return Ok(None);
        };
        let nreg = geometry.regions();

        // keep the position of each region in the list to match its mass
        let mut scoring = Vec::with_capacity(requested.len());
        for (j, &region) in requested.iter().enumerate() {
            match usize::try_from(region).ok().filter(|r| *r < nreg) {
                Some(r) => scoring.push((j, r)),
                None => warn!(
                    "Region {region} is not within the allowed range 0...{} of \"{name}\", region ignored",
                    nreg.saturating_sub(1)
                ),
            }
        }
        if scoring.is_empty() {
            warn!("No scoring regions in \"{name}\", calculation geometry ignored");
            return Ok(None);
        }

        let mut excluded = vec![false; nreg];
        for &region in &input.excluded_regions {
            match usize::try_from(region).ok().filter(|r| *r < nreg) {
                Some(r) => excluded[r] = true,
                None => {
                    return Err(Error::ExcludedRegionOutOfRange {
                        geometry: name.clone(),
                        region,
                        max: nreg.saturating_sub(1),
                    })
                }
            }
        }

        let mut sensitive = vec![false; nreg];
        let mut scoring_regions = Vec::with_capacity(scoring.len());
        for &(_, r) in &scoring {
            sensitive[r] = true;
            scoring_regions.push(r);
        }

        let (region_masses, mass) = if masses.len() > 1 {
            let mut per_region = vec![0.0; nreg];
            for &(j, r) in &scoring {
                per_region[r] = masses[j];
            }
            let total = scoring.iter().map(|(j, _)| masses[*j]).sum();
            (Some(per_region), total)
        } else {
            (None, masses[0])
        };

        let (medium, density) = Self::scoring_medium(geometry, &scoring_regions, name, app);

        let fd_name = input.fd_geometry.as_deref().or(default_fd);
        let fd = fd_name.and_then(|fd_name| {
            let fd = geometries.get(fd_name);
            if fd.is_none() {
                warn!("No FD geometry named \"{fd_name}\", scoring photons entering \"{name}\"");
            }
            fd
        });

        let transform = input.transform.build()?;

        debug!("Calculation geometry \"{name}\" with {} scoring regions", scoring_regions.len());
        Ok(Some(Self {
            name: name.clone(),
            geometry,
            fd_name: fd.and(fd_name.map(str::to_string)),
            fd,
            transform: (!transform.is_identity()).then_some(transform),
            sensitive,
            excluded,
            scoring_regions,
            region_masses,
            mass,
            medium,
            density,
        }))
    }

    /// Masses as given, one per listed region or a single total
    fn masses(input: &CalculationInput, name: &str, nscoring: usize) -> Result<Vec<f64>> {
        match (&input.region_masses, input.volume_mass) {
            (Some(masses), _) if !masses.is_empty() => {
                if masses.len() != nscoring {
                    if masses.len() != 1 {
                        return Err(Error::MassMismatch {
                            geometry: name.to_string(),
                            masses: masses.len(),
                            regions: nscoring,
                        });
                    }
                    warn!("Only one mass defined for \"{name}\", assuming it is the total mass");
                }
                Ok(masses.clone())
            }
            (_, Some(mass)) => Ok(vec![mass]),
            _ => Err(Error::MissingMass(name.to_string())),
        }
    }

    /// Medium of the first scoring region and its density
    fn scoring_medium(
        geometry: &dyn Geometry,
        regions: &[usize],
        name: &str,
        app: &dyn Application,
    ) -> (Option<usize>, f64) {
        let first = regions[0];
        let medium = geometry.medium(first);
        for &r in &regions[1..] {
            let other = geometry.medium(r);
            if other != medium {
                warn!(
                    "Medium {} in region {r} of \"{name}\" differs from medium {} in region {first}",
                    display_medium(other),
                    display_medium(medium)
                );
            }
        }

        match medium {
            Some(m) => (medium, app.medium_density(m)),
            None => {
                warn!("Scoring region {first} of \"{name}\" is vacuum, kerma will be zero");
                (None, 0.0)
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Geometry particles are transported through
    pub fn geometry(&self) -> &'g dyn Geometry {
        self.geometry
    }

    /// Forced detection target, if any
    pub fn fd_geometry(&self) -> Option<&'g dyn Geometry> {
        self.fd
    }

    pub fn fd_name(&self) -> Option<&str> {
        self.fd_name.as_deref()
    }

    pub fn transform(&self) -> Option<&AffineTransform> {
        self.transform.as_ref()
    }

    /// Number of regions in the geometry
    pub fn regions(&self) -> usize {
        self.sensitive.len()
    }

    #[inline]
    pub fn is_sensitive(&self, region: usize) -> bool {
        self.sensitive.get(region).copied().unwrap_or(false)
    }

    #[inline]
    pub fn is_excluded(&self, region: usize) -> bool {
        self.excluded.get(region).copied().unwrap_or(false)
    }

    /// Scoring regions in input order
    pub fn scoring_regions(&self) -> &[usize] {
        &self.scoring_regions
    }

    /// True if kerma is also scored per region
    pub fn scores_regions(&self) -> bool {
        self.region_masses.is_some()
    }

    /// Mass of a scoring region when scored individually (g)
    pub fn region_mass(&self, region: usize) -> Option<f64> {
        self.region_masses
            .as_ref()
            .filter(|_| self.is_sensitive(region))
            .map(|m| m[region])
    }

    /// Total scoring mass (g)
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Medium of the scoring regions
    pub fn medium(&self) -> Option<usize> {
        self.medium
    }

    /// Density of the scoring medium (g/cm3)
    pub fn density(&self) -> f64 {
        self.density
    }

    /// Where a source particle starts in this geometry
    ///
    /// Applies the geometry transform, then moves a particle starting
    /// outside to the point it enters. Returns the position, direction and
    /// region, or `None` if the particle never enters.
    pub fn enter(&self, x: &Vector, u: &Vector) -> Option<(Vector, Vector, usize)> {
        let (x, u) = match &self.transform {
            Some(t) => (t.transform(x), t.rotate(u)),
            None => (*x, *u),
        };

        match self.geometry.is_where(&x) {
            Some(region) => Some((x, u, region)),
            None => {
                let boundary = self.geometry.howfar(None, &x, &u, ENTRY_SEARCH);
                boundary
                    .next
                    .map(|region| (x + u * boundary.distance, u, region))
            }
        }
    }

    /// Summary of the scoring setup
    pub fn describe(&self, app: &dyn Application) -> String {
        let mut text = f!("Calculation geometry: {}\n", self.name);
        match &self.fd_name {
            Some(fd) => {
                text += "---> Scoring using forced detection (FD)\n";
                text += &f!("     for photons aimed at or inside geometry {fd}\n");
            }
            None => text += "---> Scoring only when photon enters volume\n",
        }

        let medium = self
            .medium
            .and_then(|m| app.medium_name(m))
            .unwrap_or("vacuum");
        text += &f!("     Sensitive regions in {medium}:");
        text += &describe_regions(&self.sensitive);
        text += "\n";
        if self.scores_regions() {
            text += "     Scoring in individual regions\n";
        }
        if self.excluded.iter().any(|e| *e) {
            text += "     Excluded regions:";
            text += &describe_regions(&self.excluded);
            text += "\n";
        }
        if let Some(t) = &self.transform {
            text += "     Source transformation\n";
            text += &t.to_string().indent(7);
            text += "\n";
        }
        text += &f!("     Scoring volume mass = {} g\n", self.mass);
        text
    }
}

impl std::fmt::Debug for CalculationGeometry<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalculationGeometry")
            .field("name", &self.name)
            .field("fd_name", &self.fd_name)
            .field("scoring_regions", &self.scoring_regions)
            .field("mass", &self.mass)
            .field("density", &self.density)
            .finish()
    }
}

fn display_medium(medium: Option<usize>) -> String {
    medium.map_or_else(|| "vacuum".to_string(), |m| m.to_string())
}
