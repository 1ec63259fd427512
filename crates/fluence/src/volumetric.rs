//! Track-length fluence in geometry regions

// standard library
use std::io::Write;

// crate modules
use crate::classify::Classifier;
use crate::config::{Method, VolumetricInput};
use crate::error::{Error, Result};
use crate::grid::{Coverage, EnergyGrid};
use crate::report::{
    result_line, run_summary, source_normalization, spectrum_points, spectrum_table,
    write_grace_series, GraceHeader,
};
use crate::stopping::StoppingPowers;
use crate::tally::Tally;

// external crates
use log::{info, warn};

// egstools modules
use egstools_ausgab::{
    Application, AusgabCall, AusgabObject, Charge, Event, Particle, StepInfo,
};
use egstools_scoring::{ScoringArray, StateReader};
use egstools_utils::{f, StringExt};

/// Counts of charged particle steps by the number of bins they cover
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Diagnostics {
    pub one_bin: u64,
    pub multi_bin: u64,
}

impl Diagnostics {
    fn count(&mut self, coverage: &Coverage) {
        if coverage.is_single_bin() {
            self.one_bin += 1;
        } else {
            self.multi_bin += 1;
        }
    }
}

impl std::fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let total = (self.one_bin + self.multi_bin).max(1) as f64;
        write!(
            f,
            "one_bin = {} [{:<7.3}%] multi_bin = {} [{:<7.3}%]",
            self.one_bin,
            100.0 * self.one_bin as f64 / total,
            self.multi_bin,
            100.0 * self.multi_bin as f64 / total
        )
    }
}

/// Fluence in geometry regions from the track length of every step
///
/// Photons score `wt*tvstep` into the bin of their energy. Charged
/// particles lose energy along a step, so their track length is spread over
/// every bin between the energies at the start and end of the step with the
/// chosen [Method].
///
/// Results are per unit volume, per source fluence or history, and spectra
/// are per unit energy.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumetricFluence {
    classifier: Classifier,
    grid: EnergyGrid,
    method: Method,
    stopping: Option<StoppingPowers>,
    volumes: Vec<f64>,
    rest_mass: f64,
    score_spectrum: bool,
    normalization: f64,
    verbose: bool,
    current_ncase: u64,
    all: Tally,
    primary: Option<Tally>,
    diagnostics: Diagnostics,
}

impl VolumetricFluence {
    /// Set up scoring in the geometry of `app`
    ///
    /// Fails for bad input, for range rejection combined with a stopping
    /// power method, or for a medium with no stopping power.
    pub fn new(input: &VolumetricInput, app: &dyn Application) -> Result<Self> {
        let options = input.validate()?;
        let nreg = app.regions();
        let charge = options.common.scoring_charge;

        let classifier =
            Classifier::new(&options.common, &options.regions, nreg, app.source_charge());
        if classifier.n_sensitive() == 0 {
            warn!("No scoring regions for volumetric {charge} fluence");
        }

        let method = options.method;
        let (grid, stopping) = if charge.is_charged() {
            if app.range_rejection() {
                if method.uses_stopping_power() {
                    return Err(Error::RangeRejection(method));
                }
                warn!("Range rejection biases the {charge} fluence in regions near rejected particles");
            }
            let grid = EnergyGrid::with_cutoff(&options.common.grid, app.ecut() - app.rest_mass());
            let stopping = if method.uses_stopping_power() {
                Some(StoppingPowers::new(
                    app,
                    charge,
                    &grid,
                    method,
                    options.inverse_stopping_power,
                )?)
            } else {
                None
            };
            (grid, stopping)
        } else {
            (EnergyGrid::new(&options.common.grid), None)
        };

        let default_volume = options.volumes.first().copied().unwrap_or(1.0);
        let mut volumes = vec![default_volume; nreg];
        for (region, volume) in options.regions.regions(nreg).iter().zip(&options.volumes) {
            if let Some(r) = usize::try_from(*region).ok().filter(|r| *r < nreg) {
                volumes[r] = *volume;
            }
        }

        let score_spectrum = options.common.score_spectrum;
        let with_spectrum = |r: usize| score_spectrum && classifier.is_sensitive(r);
        let all = Tally::new(nreg, grid.bins(), with_spectrum)?;
        let primary = if classifier.score_primaries() {
            Some(Tally::new(nreg, grid.bins(), with_spectrum)?)
        } else {
            None
        };

        let fluence = Self {
            classifier,
            grid,
            method,
            stopping,
            volumes,
            rest_mass: app.rest_mass(),
            score_spectrum,
            normalization: options.common.normalization,
            verbose: options.common.verbose,
            current_ncase: 0,
            all,
            primary,
            diagnostics: Diagnostics::default(),
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

    /// Energy bins
    pub fn grid(&self) -> &EnergyGrid {
        &self.grid
    }

    /// Volume of `region` (cm3)
    pub fn volume(&self, region: usize) -> f64 {
        self.volumes[region]
    }

    /// Last history seen
    pub fn current_case(&self) -> u64 {
        self.current_ncase
    }

    /// Step counts by bins covered
    pub fn diagnostics(&self) -> Diagnostics {
        self.diagnostics
    }

    /// Total fluence of every region, per history and not normalised
    pub fn total(&self) -> &ScoringArray {
        self.all.total()
    }

    /// Total fluence of primaries in every region
    pub fn primary_total(&self) -> Option<&ScoringArray> {
        self.primary.as_ref().map(|p| p.total())
    }

    /// Differential fluence of `region`, per history and not normalised
    pub fn spectrum(&self, region: usize) -> Option<&ScoringArray> {
        self.all.spectrum(region)
    }

    /// Differential fluence of primaries in `region`
    pub fn primary_spectrum(&self, region: usize) -> Option<&ScoringArray> {
        self.primary.as_ref().and_then(|p| p.spectrum(region))
    }

    fn score_photon(&mut self, p: &Particle, region: usize, tvstep: f64) {
        let Some(bin) = self.grid.bin_of(p.energy) else {
            return;
        };
        let wtstep = p.weight * tvstep;
        self.all.score(region, bin, wtstep, wtstep);
        if let Some(primary) = self.primary.as_mut().filter(|_| p.is_primary()) {
            primary.score(region, bin, wtstep, wtstep);
        }
    }

    fn score_charged(&mut self, p: &Particle, region: usize, step: StepInfo, medium: Option<usize>) {
        let eb = p.energy - self.rest_mass;
        let ee = eb - step.edep;
        let Some(c) = self.grid.apportion(eb, ee) else {
            return;
        };
        self.diagnostics.count(&c);

        let grid = &self.grid;
        let all = &mut self.all;
        let mut primary = self.primary.as_mut().filter(|_| p.is_primary());
        let mut score = |bin: usize, f: f64| {
            let f_total = f * grid.bin_width(bin);
            all.score(region, bin, f, f_total);
            if let Some(primary) = primary.as_mut() {
                primary.score(region, bin, f, f_total);
            }
        };

        let wt = p.weight;
        match (&self.stopping, medium) {
            (None, _) => {
                let wtstep = wt * step.tvstep / step.edep;
                if c.is_single_bin() {
                    score(c.jb, wtstep * (c.ab - c.ae));
                } else {
                    score(c.jb, wtstep * c.ab);
                    for bin in c.je + 1..c.jb {
                        score(bin, wtstep);
                    }
                    score(c.je, wtstep * (1.0 - c.ae));
                }
            }
            (Some(sp), Some(medium)) => {
                if c.is_single_bin() {
                    let f = sp.step_per_fraction(medium, c.xb, c.xe);
                    score(c.jb, wt * (c.ab - c.ae) * f);
                } else {
                    let f = sp.step_per_fraction(medium, c.xb, grid.lower_edge(c.jb));
                    score(c.jb, wt * c.ab * f);
                    for bin in c.je + 1..c.jb {
                        let f = match self.method {
                            Method::StpwrO5 => sp.step_per_fraction(
                                medium,
                                grid.lower_edge(bin + 1),
                                grid.lower_edge(bin),
                            ),
                            _ => sp.lmid(medium, bin),
                        };
                        score(bin, wt * f);
                    }
                    let f = sp.step_per_fraction(medium, grid.lower_edge(c.je + 1), c.xe);
                    score(c.je, wt * (1.0 - c.ae) * f);
                }
            }
            // no energy is lost in vacuum
            (Some(_), None) => (),
        }
    }

    fn fluence_table(&self, array: &ScoringArray, norm: f64) -> String {
        let digits = f!("{}", self.volumes.len()).len();
        let mut text = String::from(
            "\n  region#    Flu/(MeV*cm2)   DFlu/(MeV*cm2)\n\
             -----------------------------------------------------\n",
        );
        for region in self.classifier.sensitive_regions() {
            let norm = norm / self.volumes[region];
            text += &f!(
                "  {region:>digits$}       {}\n",
                result_line(array, region, norm)
            );
        }
        text
    }

    /// Normalisation of total fluence, before dividing by volume
    fn norm(&self, app: &dyn Application) -> f64 {
        self.normalization / source_normalization(app, self.current_ncase)
    }

    /// Normalisation of spectra, before dividing by volume
    fn spectrum_norm(&self, app: &dyn Application) -> f64 {
        // charged particle spectra are already per unit energy
        match self.scoring_charge() {
            Charge::Photon => self.norm(app) * self.grid.a(),
            _ => self.norm(app),
        }
    }

    /// Write the spectra of every scoring region as a Grace plot
    ///
    /// One data set per region, and another for primaries when scored.
    pub fn write_spectrum(&self, writer: &mut dyn Write, app: &dyn Application) -> Result<()> {
        let charge = self.scoring_charge();
        let comment = f!("Volumetric {charge} fluence");
        let title = f!("{charge} fluence").capitalise();
        GraceHeader {
            comment: &comment,
            title: &title,
            per_area: source_normalization(app, self.current_ncase) == 1.0,
        }
        .write(writer)?;

        let norm = self.spectrum_norm(app);
        let mut index = 0;
        for region in self.classifier.sensitive_regions() {
            let norm = norm / self.volumes[region];
            if let Some(spectrum) = self.spectrum(region) {
                let points = spectrum_points(&self.grid, spectrum, norm);
                write_grace_series(writer, index, &f!("total (ir # {region})"), &points)?;
                index += 1;
            }
            if let Some(spectrum) = self.primary_spectrum(region) {
                let points = spectrum_points(&self.grid, spectrum, norm);
                write_grace_series(writer, index, &f!("primary (ir # {region})"), &points)?;
                index += 1;
            }
        }
        Ok(())
    }
}

impl AusgabObject for VolumetricFluence {
    fn needs_call(&self, call: AusgabCall) -> bool {
        match call {
            AusgabCall::BeforeTransport => true,
            AusgabCall::UserDiscard => self.scoring_charge().is_charged(),
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
        let Some(region) = p.region.filter(|r| self.classifier.is_sensitive(*r)) else {
            return;
        };

        if p.charge.is_charged() {
            let scored_call = matches!(call, AusgabCall::BeforeTransport | AusgabCall::UserDiscard);
            if scored_call && event.step.edep > 0.0 {
                self.score_charged(&p, region, event.step, event.medium);
            }
        } else if call == AusgabCall::BeforeTransport {
            self.score_photon(&p, region, event.step.tvstep);
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
        self.all.reset();
        if let Some(primary) = &mut self.primary {
            primary.reset();
        }
        self.diagnostics = Diagnostics::default();
    }

    fn store_state(&self, writer: &mut dyn Write) -> egstools_ausgab::Result<()> {
        writeln!(writer, "{}", self.current_ncase)?;
        self.all.store_state(writer)?;
        if let Some(primary) = &self.primary {
            primary.store_state(writer)?;
        }
        Ok(())
    }

    fn set_state(&mut self, reader: &mut StateReader) -> egstools_ausgab::Result<()> {
        self.current_ncase = reader.read_u64()?;
        self.all.set_state(reader)?;
        if let Some(primary) = &mut self.primary {
            primary.set_state(reader)?;
        }
        Ok(())
    }

    fn add_state(&mut self, reader: &mut StateReader) -> egstools_ausgab::Result<()> {
        self.current_ncase += reader.read_u64()?;
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
        if self.verbose && charge.is_charged() {
            text += &f!("\n {}\n", self.diagnostics);
        }

        text += "\n                 Integral fluence output\n\
                 \x20                =======================\n";
        text += &f!("\n                 Total {charge} fluence\n");
        text += &self.fluence_table(self.all.total(), norm);

        if let Some(primary) = &self.primary {
            text += "\n                   Primary fluence\n";
            text += &self.fluence_table(primary.total(), norm);
        }

        if self.verbose {
            text += &f!("\nbw = {} nbins = {}\n", self.grid.bw(), self.grid.bins());
        }

        if self.score_spectrum && self.verbose {
            text += "\n                 Differential fluence output\n\
                     \x20                ===========================\n";
            let norm = self.spectrum_norm(app);
            for region in self.classifier.sensitive_regions() {
                let norma = norm / self.volumes[region];
                text += &f!(
                    "\nregion # {region} : Volume = {} Normalization = {norma}\n",
                    self.volumes[region]
                );
                if let Some(spectrum) = self.spectrum(region) {
                    text += "\nTotal fluence:\n";
                    text += &spectrum_table(&self.grid, spectrum, norma);
                }
                if let Some(spectrum) = self.primary_spectrum(region) {
                    text += "\nPrimary fluence:\n";
                    text += &spectrum_table(&self.grid, spectrum, norma);
                }
            }
        }
        text
    }

    fn describe(&self) -> String {
        let charge = self.scoring_charge();
        let mut text = f!("Volumetric {charge} fluence scoring\n");
        text += &"=".repeat(35);
        text += "\n - scoring in region(s): ";
        text += &self.classifier.describe();

        if self.score_spectrum {
            text += &f!(" - {}\n", self.grid.describe());
        }

        let method = match (charge.is_charged(), self.method) {
            (false, _) => None,
            (true, Method::Flurz) => {
                Some("Fluence calculated a-la-FLURZ using Lave=EDEP/TVSTEP.")
            }
            (true, Method::Stpwr) => Some(
                "O(eps^3) approach: accounts for change in stpwr\nalong the step with eps=edep/Emid",
            ),
            (true, Method::StpwrO5) => Some(
                "O(eps^5) approach: accounts for change in stpwr\nalong the step with eps=edep/Emid",
            ),
        };
        if let Some(method) = method {
            text += &method.indent(3);
            text += "\n";
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
