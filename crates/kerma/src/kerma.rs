//! Track-length kerma in one or more calculation geometries

// standard library
use std::io::Write;

// crate modules
use crate::config::KermaInput;
use crate::emuen::EmuenTable;
use crate::error::{Error, Result};
use crate::geometry::{CalculationGeometry, Geometries};

// external crates
use log::{info, warn};

// egstools modules
use egstools_ausgab::{Application, AusgabCall, AusgabObject, Charge, Event, Visit};
use egstools_fluence::EnergyGrid;
use egstools_scoring::{write_float, ScoringArray, StateReader};
use egstools_transform::Vector;
use egstools_utils::f;

/// Photon fluence in the scoring volume of every geometry
#[derive(Debug, Clone, PartialEq)]
pub struct PhotonFluence {
    grid: EnergyGrid,
    spectra: Vec<ScoringArray>,
    totals: ScoringArray,
}

impl PhotonFluence {
    fn new(grid: EnergyGrid, ngeom: usize) -> Result<Self> {
        let spectra = (0..ngeom)
            .map(|_| ScoringArray::new(grid.bins()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self {
            grid,
            spectra,
            totals: ScoringArray::new(ngeom)?,
        })
    }

    pub fn grid(&self) -> &EnergyGrid {
        &self.grid
    }

    /// Differential fluence of geometry `ig`, per history and not normalised
    pub fn spectrum(&self, ig: usize) -> &ScoringArray {
        &self.spectra[ig]
    }

    /// Total fluence of every geometry
    pub fn totals(&self) -> &ScoringArray {
        &self.totals
    }

    /// Score into the bin of `e`, returns false if outside the grid
    #[inline]
    pub(crate) fn score_spectrum(&mut self, ig: usize, e: f64, f: f64) -> bool {
        match self.grid.bin_of(e) {
            Some(bin) => {
                self.spectra[ig].score(bin, f);
                true
            }
            None => false,
        }
    }

    #[inline]
    pub(crate) fn score_total(&mut self, ig: usize, f: f64) {
        self.totals.score(ig, f);
    }

    fn set_history(&mut self, ncase: u64) {
        self.spectra.iter_mut().for_each(|s| s.set_history(ncase));
        self.totals.set_history(ncase);
    }

    fn reset(&mut self) {
        self.spectra.iter_mut().for_each(|s| s.reset());
        self.totals.reset();
    }
}

/// Kerma scoring object
///
/// Photons are scored in the current calculation geometry, chosen with
/// [KermaScoring::begin_geometry()] before each geometry is transported.
///
/// Without an FD geometry every photon step in a scoring region adds
/// `wt*tvstep*(E*muen/rho)(E)*rho` to the kerma of the geometry, unless the
/// photon has been through an excluded region. With an FD geometry, photons
/// are instead ray-traced to the scoring regions through
/// [KermaScoring::select_photon_mfp()].
///
/// Scores are energies, per history. Reports divide by the scoring mass.
pub struct KermaScoring<'g> {
    geometries: Vec<CalculationGeometry<'g>>,
    emuen: EmuenTable,
    /// Geometry index pairs with correlated ratios
    correlated: Vec<(usize, usize)>,
    /// Sum over histories of the product of each pair's kerma
    scg: Vec<f64>,
    pub(crate) kerma: ScoringArray,
    pub(crate) kerma_r: Vec<Option<ScoringArray>>,
    pub(crate) fluence: Option<PhotonFluence>,
    /// Sum of sampled source energies
    eave: f64,
    current_ncase: u64,
    current: usize,
}

impl<'g> KermaScoring<'g> {
    /// Set up scoring, reading `E*muen/rho` from the configured file
    pub fn new(
        input: &KermaInput,
        geometries: &Geometries<'g>,
        app: &dyn Application,
    ) -> Result<Self> {
        let emuen = input.emuen_table()?;
        Self::with_table(input, emuen, geometries, app)
    }

    /// Set up scoring with an `E*muen/rho` table already loaded
    pub fn with_table(
        input: &KermaInput,
        emuen: EmuenTable,
        geometries: &Geometries<'g>,
        app: &dyn Application,
    ) -> Result<Self> {
        let default_fd = input.default_fd_geometry.as_deref();

        let mut calculation = Vec::with_capacity(input.geometries.len());
        for g in &input.geometries {
            if let Some(g) = CalculationGeometry::new(g, geometries, default_fd, app)? {
                calculation.push(g);
            }
        }
        if calculation.is_empty() {
            return Err(Error::NoCalculationGeometry);
        }
        let ngeom = calculation.len();

        let correlated = Self::correlated_pairs(&input.correlated, &calculation);

        let kerma_r = calculation
            .iter()
            .map(|g| {
                g.scores_regions()
                    .then(|| ScoringArray::new(g.regions()))
                    .transpose()
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let fluence = match input.fluence_grid() {
            Some(grid) => Some(PhotonFluence::new(EnergyGrid::new(&grid), ngeom)?),
            None => None,
        };

        let scoring = Self {
            geometries: calculation,
            emuen,
            scg: vec![0.0; correlated.len()],
            correlated,
            kerma: ScoringArray::new(ngeom)?,
            kerma_r,
            fluence,
            eave: 0.0,
            current_ncase: 0,
            current: 0,
        };
        info!("{}", scoring.describe_with(app));
        Ok(scoring)
    }

    /// Index pairs of named geometries, unknown names are left out
    fn correlated_pairs(
        names: &[Vec<String>],
        geometries: &[CalculationGeometry<'_>],
    ) -> Vec<(usize, usize)> {
        let index = |name: &String| geometries.iter().position(|g| g.name() == name);
        names
            .iter()
            .filter_map(|pair| match pair.as_slice() {
                [a, b] => match (index(a), index(b)) {
                    (Some(i), Some(j)) => Some((i, j)),
                    _ => {
                        warn!("Unknown correlated geometries \"{a}\" and \"{b}\", pair ignored");
                        None
                    }
                },
                _ => {
                    warn!("Correlated geometries need 2 names, found {}", pair.len());
                    None
                }
            })
            .collect()
    }

    /// Calculation geometries in input order
    pub fn geometries(&self) -> &[CalculationGeometry<'g>] {
        &self.geometries
    }

    /// Geometry currently being transported
    pub fn current_geometry(&self) -> &CalculationGeometry<'g> {
        &self.geometries[self.current]
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn emuen(&self) -> &EmuenTable {
        &self.emuen
    }

    /// Correlated geometry index pairs
    pub fn correlated(&self) -> &[(usize, usize)] {
        &self.correlated
    }

    /// Last history seen
    pub fn current_case(&self) -> u64 {
        self.current_ncase
    }

    /// Total kerma of every geometry, energy per history
    pub fn kerma(&self) -> &ScoringArray {
        &self.kerma
    }

    /// Kerma of each region of geometry `ig`, if scored individually
    pub fn region_kerma(&self, ig: usize) -> Option<&ScoringArray> {
        self.kerma_r.get(ig).and_then(|k| k.as_ref())
    }

    pub fn fluence(&self) -> Option<&PhotonFluence> {
        self.fluence.as_ref()
    }

    /// Mean sampled source energy
    pub fn average_energy(&self) -> f64 {
        if self.current_ncase > 0 {
            self.eave / self.current_ncase as f64
        } else {
            0.0
        }
    }

    /// Sums of kerma products of each correlated pair, open history included
    pub(crate) fn correlation_sums(&self) -> Vec<f64> {
        self.scg
            .iter()
            .zip(&self.correlated)
            .map(|(sum, (i, j))| {
                sum + self.kerma.this_history_score(*i) * self.kerma.this_history_score(*j)
            })
            .collect()
    }

    /// Add the energy of a sampled source particle
    pub fn record_source_energy(&mut self, e: f64) {
        self.eave += e;
    }

    /// Make geometry `ig` current and find where a source particle enters it
    ///
    /// Returns the position, direction and region to start transport from,
    /// or `None` if the particle misses the geometry. Source particles are
    /// given in the frame before the geometry transform.
    pub fn begin_geometry(
        &mut self,
        ig: usize,
        x: &Vector,
        u: &Vector,
    ) -> Option<(Vector, Vector, usize)> {
        let g = self.geometries.get(ig)?;
        self.current = ig;
        g.enter(x, u)
    }

    /// Score a photon step inside the current geometry
    fn score_step(&mut self, region: usize, e: f64, wtstep: f64) {
        let ig = self.current;
        let g = &self.geometries[ig];
        let kerma = wtstep * self.emuen.at(e.ln()) * g.density();

        self.kerma.score(ig, kerma);
        if let Some(kerma_r) = &mut self.kerma_r[ig] {
            kerma_r.score(region, kerma);
        }
        if let Some(fluence) = &mut self.fluence {
            if fluence.score_spectrum(ig, e, wtstep) {
                fluence.score_total(ig, wtstep);
            }
        }
    }

    /// Summary of the scoring setup with medium names
    pub fn describe_with(&self, app: &dyn Application) -> String {
        let mut text = self.describe();
        for g in &self.geometries {
            text += &g.describe(app);
        }
        text
    }
}

impl AusgabObject for KermaScoring<'_> {
    fn needs_call(&self, call: AusgabCall) -> bool {
        call == AusgabCall::BeforeTransport
    }

    fn process_event(&mut self, call: AusgabCall, event: &mut Event<'_>) {
        if call != AusgabCall::BeforeTransport {
            return;
        }
        let tvstep = event.step.tvstep;
        let Some(p) = event.top().copied() else {
            return;
        };
        let Some(region) = p.region else {
            return;
        };
        if p.charge != Charge::Photon || region >= self.current_geometry().regions() {
            return;
        }

        let g = self.current_geometry();
        let visit = if g.is_sensitive(region) {
            if g.fd_geometry().is_none() && p.visit != Visit::Excluded {
                self.score_step(region, p.energy, p.weight * tvstep);
            }
            Visit::Inside
        } else if g.is_excluded(region) {
            Visit::Excluded
        } else if p.visit != Visit::Excluded {
            Visit::Outside
        } else {
            Visit::Excluded
        };

        if let Some(top) = event.stack.top_mut() {
            top.visit = visit;
        }
    }

    fn set_current_case(&mut self, ncase: u64) {
        if ncase == self.current_ncase {
            return;
        }
        for (sum, (i, j)) in self.scg.iter_mut().zip(&self.correlated) {
            *sum += self.kerma.this_history_score(*i) * self.kerma.this_history_score(*j);
        }
        self.current_ncase = ncase;
        self.kerma.set_history(ncase);
        for kerma_r in self.kerma_r.iter_mut().flatten() {
            kerma_r.set_history(ncase);
        }
        if let Some(fluence) = &mut self.fluence {
            fluence.set_history(ncase);
        }
    }

    fn reset_counter(&mut self) {
        self.current_ncase = 0;
        self.kerma.reset();
        for kerma_r in self.kerma_r.iter_mut().flatten() {
            kerma_r.reset();
        }
        self.scg.fill(0.0);
        if let Some(fluence) = &mut self.fluence {
            fluence.reset();
        }
        self.eave = 0.0;
    }

    fn store_state(&self, writer: &mut dyn Write) -> egstools_ausgab::Result<()> {
        writeln!(writer, "{}", self.current_ncase)?;
        self.kerma.store_state(writer)?;
        for kerma_r in self.kerma_r.iter().flatten() {
            kerma_r.store_state(writer)?;
        }
        if !self.scg.is_empty() {
            for (n, sum) in self.correlation_sums().into_iter().enumerate() {
                if n > 0 {
                    write!(writer, " ")?;
                }
                write_float(writer, sum)?;
            }
            writeln!(writer)?;
        }
        if let Some(fluence) = &self.fluence {
            for spectrum in &fluence.spectra {
                spectrum.store_state(writer)?;
            }
            fluence.totals.store_state(writer)?;
        }
        write_float(writer, self.eave)?;
        writeln!(writer)?;
        Ok(())
    }

    fn set_state(&mut self, reader: &mut StateReader) -> egstools_ausgab::Result<()> {
        self.current_ncase = reader.read_u64()?;
        self.kerma.set_state(reader)?;
        for kerma_r in self.kerma_r.iter_mut().flatten() {
            kerma_r.set_state(reader)?;
        }
        for sum in self.scg.iter_mut() {
            *sum = reader.read_f64()?;
        }
        if let Some(fluence) = &mut self.fluence {
            for spectrum in fluence.spectra.iter_mut() {
                spectrum.set_state(reader)?;
            }
            fluence.totals.set_state(reader)?;
        }
        self.eave = reader.read_f64()?;
        Ok(())
    }

    fn add_state(&mut self, reader: &mut StateReader) -> egstools_ausgab::Result<()> {
        self.current_ncase += reader.read_u64()?;
        self.kerma.add_state(reader)?;
        for kerma_r in self.kerma_r.iter_mut().flatten() {
            kerma_r.add_state(reader)?;
        }
        for sum in self.scg.iter_mut() {
            *sum += reader.read_f64()?;
        }
        if let Some(fluence) = &mut self.fluence {
            for spectrum in fluence.spectra.iter_mut() {
                spectrum.add_state(reader)?;
            }
            fluence.totals.add_state(reader)?;
        }
        self.eave += reader.read_f64()?;
        Ok(())
    }

    fn report(&self, app: &dyn Application) -> String {
        crate::report::report(self, app)
    }

    fn describe(&self) -> String {
        let mut text = String::from("Volumetric track-length kerma scoring\n");
        text += &"=".repeat(37);
        text += "\n";
        text += &f!(
            " - E*muen/rho: {} entries from {} to {} MeV\n",
            self.emuen.entries(),
            self.emuen.emin(),
            self.emuen.emax()
        );
        if let Some(fluence) = &self.fluence {
            text += &f!(" - photon {}\n", fluence.grid.describe());
        }
        for (i, j) in &self.correlated {
            text += &f!(
                " - correlated ratio {} / {}\n",
                self.geometries[*i].name(),
                self.geometries[*j].name()
            );
        }
        text
    }
}

impl std::fmt::Debug for KermaScoring<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KermaScoring")
            .field("geometries", &self.geometries)
            .field("correlated", &self.correlated)
            .field("current_ncase", &self.current_ncase)
            .field("current", &self.current)
            .finish()
    }
}
