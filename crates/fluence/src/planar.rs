//! Fluence of particles crossing a scoring field

// standard library
use std::io::Write;

// crate modules
use crate::classify::Classifier;
use crate::config::PlanarInput;
use crate::error::Result;
use crate::field::{FieldShape, ScoringField};
use crate::grid::EnergyGrid;
use crate::report::{
    result_line, run_summary, source_normalization, spectrum_points, spectrum_table,
    write_grace_series, GraceHeader,
};
use crate::tally::Tally;

// external crates
use log::{info, warn};

// egstools modules
use egstools_ausgab::{Application, AusgabCall, AusgabObject, Charge, Event, Particle};
use egstools_scoring::{ScoringArray, StateReader};
use egstools_transform::Vector;
use egstools_utils::{f, StringExt};

/// Smallest `|u.n|` used as is, smaller values are raised to [MIN_COSINE_RAISED]
const MIN_COSINE: f64 = 0.08;

/// Replacement cosine for grazing crossings
const MIN_COSINE_RAISED: f64 = 0.0871557;

/// Crossing found at the start of a step
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Crossing {
    start: Vector,
    distance: f64,
    pixel: usize,
}

/// Fluence through a circle or a pixelated rectangle
///
/// A particle heading for the field when a step starts scores once the step
/// has carried it at least as far as the field plane. Each crossing adds
/// `wt/|u.n|` to the pixel it passes through.
///
/// Results are per unit area, per source fluence or history, and spectra
/// are per unit bin width.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanarFluence {
    classifier: Classifier,
    field: ScoringField,
    grid: EnergyGrid,
    rest_mass: f64,
    score_spectrum: bool,
    normalization: f64,
    verbose: bool,
    current_ncase: u64,
    crossing: Option<Crossing>,
    /// Weight of every particle that reached the field
    m_tot: f64,
    /// Weight of primaries that reached the field
    m_primary: f64,
    all: Tally,
    primary: Option<Tally>,
}

impl PlanarFluence {
    /// Set up scoring on a field in the geometry of `app`
    pub fn new(input: &PlanarInput, app: &dyn Application) -> Result<Self> {
        let options = input.validate()?;
        let nreg = app.regions();
        let field = ScoringField::from_input(input)?;

        let classifier =
            Classifier::new(&options.common, &options.regions, nreg, app.source_charge());
        if classifier.n_sensitive() == 0 {
            warn!(
                "No contributing regions, no {} will ever reach the field",
                options.common.scoring_charge
            );
        }

        let grid = EnergyGrid::new(&options.common.grid);
        let score_spectrum = options.common.score_spectrum;
        let pixels = field.pixels();
        let all = Tally::new(pixels, grid.bins(), |_| score_spectrum)?;
        let primary = if classifier.score_primaries() {
            Some(Tally::new(pixels, grid.bins(), |_| score_spectrum)?)
        } else {
            None
        };

        let fluence = Self {
            classifier,
            field,
            grid,
            rest_mass: app.rest_mass(),
            score_spectrum,
            normalization: options.common.normalization,
            verbose: options.common.verbose,
            current_ncase: 0,
            crossing: None,
            m_tot: 0.0,
            m_primary: 0.0,
            all,
            primary,
        };
        info!("{}", fluence.describe());
        Ok(fluence)
    }

    /// Particle type being scored
    pub fn scoring_charge(&self) -> Charge {
        self.classifier.scoring_charge()
    }

    /// Region and particle classification
    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// The field particles are scored on
    pub fn field(&self) -> &ScoringField {
        &self.field
    }

    /// Energy bins
    pub fn grid(&self) -> &EnergyGrid {
        &self.grid
    }

    /// Last history seen
    pub fn current_case(&self) -> u64 {
        self.current_ncase
    }

    /// Weight of all particles that reached the field
    pub fn reached(&self) -> f64 {
        self.m_tot
    }

    /// Weight of primaries that reached the field
    pub fn primaries_reached(&self) -> f64 {
        self.m_primary
    }

    /// Total fluence of every pixel, per history and not normalised
    pub fn total(&self) -> &ScoringArray {
        self.all.total()
    }

    /// Total fluence of primaries in every pixel
    pub fn primary_total(&self) -> Option<&ScoringArray> {
        self.primary.as_ref().map(|p| p.total())
    }

    /// Differential fluence of `pixel`, per history and not normalised
    pub fn spectrum(&self, pixel: usize) -> Option<&ScoringArray> {
        self.all.spectrum(pixel)
    }

    /// Differential fluence of primaries in `pixel`
    pub fn primary_spectrum(&self, pixel: usize) -> Option<&ScoringArray> {
        self.primary.as_ref().and_then(|p| p.spectrum(pixel))
    }

    fn score(&mut self, p: &Particle, pixel: usize) {
        let mut aup = p.direction.dot(self.field.normal()).abs();
        if aup < MIN_COSINE {
            aup = MIN_COSINE_RAISED;
        }
        let auxp = p.weight / aup;
        let bin = self.grid.bin_of(p.kinetic_energy(self.rest_mass));

        let primary = self.primary.as_mut().filter(|_| p.is_primary());
        for tally in std::iter::once(&mut self.all).chain(primary) {
            match bin {
                Some(bin) => tally.score(pixel, bin, auxp, auxp),
                None => tally.score_total(pixel, auxp),
            }
        }
    }

    fn fluence_table(&self, array: &ScoringArray, norm: f64) -> String {
        let mut text = String::new();
        match self.field.shape() {
            FieldShape::Circle { .. } => {
                text += "\n  pixel#    Flu/(MeV*cm2)   DFlu/(MeV*cm2)\n\
                         -----------------------------------------------------\n";
                text += &f!("  {:>6}    {}\n", 0, result_line(array, 0, norm));
            }
            FieldShape::Rectangle { nx, ny, .. } => {
                text += "\n   iy  ix  k         Flu/(MeV*cm2)   DFlu/(MeV*cm2)\n\
                         --------------------------------------------------------\n";
                for iy in 0..*ny {
                    for ix in 0..*nx {
                        let k = ix + iy * nx;
                        text += &f!(
                            "  {iy:>3} {ix:>3} {k:>3}    {}\n",
                            result_line(array, k, norm)
                        );
                    }
                }
            }
        }
        text
    }

    /// Normalisation of total fluence
    fn norm(&self, app: &dyn Application) -> f64 {
        self.normalization / source_normalization(app, self.current_ncase) / self.field.area()
    }

    /// Write the spectra of every pixel as a Grace plot
    pub fn write_spectrum(&self, writer: &mut dyn Write, app: &dyn Application) -> Result<()> {
        let charge = self.scoring_charge();
        let comment = f!("Planar {charge} fluence");
        let title = f!("{charge} fluence").capitalise();
        GraceHeader {
            comment: &comment,
            title: &title,
            per_area: source_normalization(app, self.current_ncase) == 1.0,
        }
        .write(writer)?;

        let norm = self.norm(app) * self.grid.a();
        let mut index = 0;
        for pixel in 0..self.field.pixels() {
            if let Some(spectrum) = self.spectrum(pixel) {
                let points = spectrum_points(&self.grid, spectrum, norm);
                write_grace_series(writer, index, &f!("Voxel # {pixel}"), &points)?;
                index += 1;
            }
            if let Some(spectrum) = self.primary_spectrum(pixel) {
                let points = spectrum_points(&self.grid, spectrum, norm);
                write_grace_series(writer, index, &f!("Voxel # {pixel} (primary)"), &points)?;
                index += 1;
            }
        }
        Ok(())
    }
}

impl AusgabObject for PlanarFluence {
    fn needs_call(&self, call: AusgabCall) -> bool {
        match call {
            AusgabCall::BeforeTransport | AusgabCall::AfterTransport => true,
            _ => self.classifier.score_primaries() && call.is_after_interaction(),
        }
    }

    fn process_event(&mut self, call: AusgabCall, event: &mut Event<'_>) {
        if call.is_after_interaction() {
            if self.classifier.score_primaries() {
                self.classifier.flag_secondaries(call, &mut *event.stack);
            }
            return;
        }

        let Some(p) = event.top().copied() else {
            return;
        };
        if p.charge != self.scoring_charge() {
            return;
        }

        match call {
            AusgabCall::BeforeTransport => {
                let contributing = p.region.is_some_and(|r| self.classifier.is_sensitive(r));
                self.crossing = if contributing {
                    self.field
                        .hit(&p.position, &p.direction)
                        .map(|(pixel, distance)| Crossing {
                            start: p.position,
                            distance,
                            pixel,
                        })
                } else {
                    None
                };
            }
            AusgabCall::AfterTransport => {
                let Some(crossing) = self.crossing else {
                    return;
                };
                if (p.position - crossing.start).norm() >= crossing.distance {
                    self.m_tot += p.weight;
                    if p.is_primary() {
                        self.m_primary += p.weight;
                    }
                    self.score(&p, crossing.pixel);
                    self.crossing = None;
                }
            }
            _ => (),
        }
    }

    fn set_current_case(&mut self, ncase: u64) {
        if ncase != self.current_ncase {
            self.current_ncase = ncase;
            self.all.set_history(ncase);
            if let Some(primary) = &mut self.primary {
                primary.set_history(ncase);
            }
        }
    }

    fn reset_counter(&mut self) {
        self.current_ncase = 0;
        self.crossing = None;
        self.m_tot = 0.0;
        self.m_primary = 0.0;
        self.all.reset();
        if let Some(primary) = &mut self.primary {
            primary.reset();
        }
    }

    fn store_state(&self, writer: &mut dyn Write) -> egstools_ausgab::Result<()> {
        writeln!(writer, "{}", self.current_ncase)?;
        writeln!(writer, "{:e} {:e}", self.m_tot, self.m_primary)?;
        self.all.store_state(writer)?;
        if let Some(primary) = &self.primary {
            primary.store_state(writer)?;
        }
        Ok(())
    }

    fn set_state(&mut self, reader: &mut StateReader) -> egstools_ausgab::Result<()> {
        self.current_ncase = reader.read_u64()?;
        self.m_tot = reader.read_f64()?;
        self.m_primary = reader.read_f64()?;
        self.all.set_state(reader)?;
        if let Some(primary) = &mut self.primary {
            primary.set_state(reader)?;
        }
        Ok(())
    }

    fn add_state(&mut self, reader: &mut StateReader) -> egstools_ausgab::Result<()> {
        self.current_ncase += reader.read_u64()?;
        self.m_tot += reader.read_f64()?;
        self.m_primary += reader.read_f64()?;
        self.all.add_state(reader)?;
        if let Some(primary) = &mut self.primary {
            primary.add_state(reader)?;
        }
        Ok(())
    }

    fn report(&self, app: &dyn Application) -> String {
        let charge = self.scoring_charge();
        let norm = self.norm(app);

        let mut text = run_summary(app, self.current_ncase);
        text += &f!(" particles reaching the field = {}", self.m_tot);
        if self.primary.is_some() {
            text += &f!(" ({} primaries)", self.m_primary);
        }
        text += "\n";

        text += "\n                 Integral fluence output\n\
                 \x20                =======================\n";
        text += &f!("\n                 Total {charge} fluence\n");
        text += &self.fluence_table(self.all.total(), norm);

        if let Some(primary) = &self.primary {
            text += "\n                   Primary fluence\n";
            text += &self.fluence_table(primary.total(), norm);
        }

        if self.score_spectrum && self.verbose {
            text += "\n                 Differential fluence output\n\
                     \x20                ===========================\n";
            let norm = norm * self.grid.a();
            for pixel in 0..self.field.pixels() {
                if let Some(spectrum) = self.spectrum(pixel) {
                    text += &f!("\nVoxel # {pixel}:\n");
                    text += &spectrum_table(&self.grid, spectrum, norm);
                }
                if let Some(spectrum) = self.primary_spectrum(pixel) {
                    text += &f!("\nVoxel # {pixel} (primary):\n");
                    text += &spectrum_table(&self.grid, spectrum, norm);
                }
            }
        }
        text
    }

    fn describe(&self) -> String {
        let charge = self.scoring_charge();
        let mut text = f!("Planar {charge} fluence scoring\n");
        text += &"=".repeat(30);
        text += "\n";
        text += &self.field.describe();
        text += " - scoring from region(s): ";
        text += &self.classifier.describe();

        if self.score_spectrum {
            text += &f!(" - {}\n", self.grid.describe());
        }
        if self.normalization != 1.0 {
            text += &f!(
                " - Non-unity user-requested normalization = {}\n",
                self.normalization
            );
        }
        text
    }
}
