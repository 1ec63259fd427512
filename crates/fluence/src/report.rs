//! Result tables and Grace plot files

// standard library
use std::io::Write;

// crate modules
use crate::error::Result;
use crate::grid::EnergyGrid;

// egstools modules
use egstools_ausgab::Application;
use egstools_scoring::ScoringArray;
use egstools_utils::{f, ValueExt};

/// Source fluence per history
///
/// Results are per history when the source does not define a fluence.
pub fn source_normalization(app: &dyn Application, ncase: u64) -> f64 {
    match app.source_fluence() {
        Some(fluence) if fluence != 0.0 && ncase > 0 => fluence / ncase as f64,
        _ => 1.0,
    }
}

/// Header line with the number of histories and the source fluence
pub(crate) fn run_summary(app: &dyn Application, ncase: u64) -> String {
    let src_norm = source_normalization(app, ncase);
    f!(
        "\n last case = {ncase} source particles or fluence = {}\n normalization = {} ({} per particle)\n",
        app.source_fluence().unwrap_or(0.0),
        src_norm,
        if src_norm == 1.0 { "histories" } else { "fluence" }
    )
}

/// `r +/- dr [rel%]` for a normalised result
pub(crate) fn result_line(array: &ScoringArray, i: usize, norm: f64) -> String {
    let (r, dr) = array.current_result(i);
    f!(
        "{} +/- {} [{:<7.3}%]",
        (r * norm).sci(4, 2),
        (dr * norm).sci(4, 2),
        r.rel_percent(dr)
    )
}

/// Table of spectrum values at every bin middle
pub(crate) fn spectrum_table(grid: &EnergyGrid, spectrum: &ScoringArray, norm: f64) -> String {
    let mut text = String::from(
        "\n   Emid/MeV    Flu/(MeV-1*cm-2)   DFlu/(MeV-1*cm-2)\n\
         ---------------------------------------------------\n",
    );
    for (e, r, dr) in spectrum_points(grid, spectrum, norm) {
        text += &f!("{e:11.6} {:>17} {:>17}\n", r.sci(6, 2), dr.sci(6, 2));
    }
    text
}

/// `(energy, value, uncertainty)` at every bin middle
pub fn spectrum_points(
    grid: &EnergyGrid,
    spectrum: &ScoringArray,
    norm: f64,
) -> Vec<(f64, f64, f64)> {
    (0..grid.bins().min(spectrum.bins()))
        .map(|j| {
            let (r, dr) = spectrum.current_result(j);
            (grid.bin_mid(j), r * norm, dr * norm)
        })
        .collect()
}

/// Axis labels and titles of a spectrum plot
#[derive(Debug, Clone, PartialEq)]
pub struct GraceHeader<'a> {
    pub comment: &'a str,
    pub title: &'a str,
    pub per_area: bool,
}

impl GraceHeader<'_> {
    /// Write the plot settings
    pub fn write(&self, writer: &mut dyn Write) -> Result<()> {
        let y_label = if self.per_area {
            "fluence / MeV\\S-1\\Ncm\\S-2"
        } else {
            "fluence / MeV\\S-1"
        };

        writeln!(writer, "# {}", self.comment)?;
        writeln!(writer, "# ")?;
        writeln!(writer, "@    legend 0.2, 0.8")?;
        writeln!(writer, "@    legend box linestyle 0")?;
        writeln!(writer, "@    legend font 4")?;
        writeln!(writer, "@    xaxis  label \"energy / MeV\"")?;
        writeln!(writer, "@    xaxis  label char size 1.560000")?;
        writeln!(writer, "@    xaxis  label font 4")?;
        writeln!(writer, "@    xaxis  ticklabel font 4")?;
        writeln!(writer, "@    yaxis  label \"{y_label}\"")?;
        writeln!(writer, "@    yaxis  label char size 1.560000")?;
        writeln!(writer, "@    yaxis  label font 4")?;
        writeln!(writer, "@    yaxis  ticklabel font 4")?;
        writeln!(writer, "@    title \"{}\"", self.title)?;
        writeln!(writer, "@    title font 4")?;
        writeln!(writer, "@    title size 1.500000")?;
        writeln!(writer, "@    subtitle \"for each scoring region\"")?;
        writeln!(writer, "@    subtitle font 4")?;
        writeln!(writer, "@    subtitle size 1.000000")?;
        Ok(())
    }
}

/// Write one data set with error bars
pub fn write_grace_series(
    writer: &mut dyn Write,
    index: usize,
    legend: &str,
    points: &[(f64, f64, f64)],
) -> Result<()> {
    writeln!(writer, "@    s{index} errorbar linestyle 0")?;
    writeln!(writer, "@    s{index} legend \"{legend}\"")?;
    writeln!(writer, "@target G0.S{index}")?;
    writeln!(writer, "@type xydy")?;
    for (x, y, dy) in points {
        writeln!(writer, "{x} {y} {dy}")?;
    }
    writeln!(writer, "&")?;
    Ok(())
}
