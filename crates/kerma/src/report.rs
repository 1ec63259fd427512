//! Kerma, ratio and fluence result tables

// standard library
use std::io::Write;

// crate modules
use crate::error::Result;
use crate::kerma::KermaScoring;

// egstools modules
use egstools_ausgab::Application;
use egstools_fluence::{source_normalization, spectrum_points, write_grace_series, GraceHeader};
use egstools_scoring::ScoringArray;
use egstools_utils::{f, ValueExt};

/// Energy conversion from MeV to J
pub const MEV_TO_J: f64 = 1.6021773e-10;

/// Relative uncertainties below this are taken as 100%
const KERMA_EPSILON: f64 = 4.0 * 2.225e-308;

/// Relative uncertainty, 100% for results that are zero or negative
fn relative(r: f64, dr: f64) -> f64 {
    if r > 0.0 {
        let dr = dr / r;
        if dr < KERMA_EPSILON {
            1.0
        } else {
            dr
        }
    } else {
        1.0
    }
}

/// `Edep +/- rel% K +/- rel%` for one scoring array bin
fn kerma_columns(array: &ScoringArray, bin: usize, norm_e: f64, mass: f64) -> String {
    let (r, dr) = array.current_result(bin);
    let rel = 100.0 * relative(r, dr);
    f!(
        "{} +/- {:<8.4}% {} +/- {:<8.4}%",
        (r * norm_e).sci(6, 2),
        rel,
        (r * norm_e * MEV_TO_J / mass).sci(6, 2),
        rel
    )
}

/// Every result of a kerma calculation
pub(crate) fn report(k: &KermaScoring<'_>, app: &dyn Application) -> String {
    let mut text = f!(
        "\n\n last case = {} fluence = {}\n\n",
        k.current_case(),
        app.source_fluence().unwrap_or(k.current_case() as f64)
    );
    text += &f!(" Average sampled energy Eave = {} \n\n", k.average_energy());
    text += &kerma_tables(k, app);
    text += &ratio_table(k);
    if k.fluence().is_some() {
        text += &fluence_tables(k, app);
    }
    text
}

/// Energy deposited and kerma in every geometry
fn kerma_tables(k: &KermaScoring<'_>, app: &dyn Application) -> String {
    let norm_e = 1.0 / source_normalization(app, k.current_case());
    let per_particle = norm_e == 1.0;
    let width = k
        .geometries()
        .iter()
        .flat_map(|g| g.scoring_regions().iter())
        .max()
        .map_or(1, |r| r.to_string().len());

    let mut text = String::new();
    for (ig, g) in k.geometries().iter().enumerate() {
        let header = if per_particle {
            text += &f!("\n\n==> Calculation summary (per particle) in geometry: {}\n", g.name());
            f!("  {:>width$}      m/g        Edep/[MeV]                   K/[Gy]            ", "ir")
        } else {
            text += &f!("\n==> Calculation summary (per fluence) in geometry: {}\n", g.name());
            f!("  {:>width$}      m/g      Edep/[MeV*cm2]                 K/[Gy*cm2]         ", "ir")
        };
        let line = f!("  {}\n", "-".repeat(header.len()));
        text += &header;
        text += "\n";
        text += &line;

        if let Some(kerma_r) = k.region_kerma(ig) {
            for &region in g.scoring_regions() {
                let m = g.region_mass(region).unwrap_or(0.0);
                text += &f!(
                    "  {region:>width$}  {m:8.4} {}\n",
                    kerma_columns(kerma_r, region, norm_e, m)
                );
            }
            text += &line;
        }

        text += &f!(
            "  Total: {:8.4} {}\n",
            g.mass(),
            kerma_columns(k.kerma(), ig, norm_e, g.mass())
        );
        text += &line;
    }
    text += "\n\n";
    text
}

/// Kerma ratio of each correlated pair and its uncertainty
///
/// The uncertainty accounts for the covariance of the two kerma estimates,
/// taken from the sum over histories of their products.
fn ratio_table(k: &KermaScoring<'_>) -> String {
    if k.correlated().is_empty() {
        return String::new();
    }
    let n = k.current_case() as f64;
    let sums = k.correlation_sums();

    let mut text = f!("{:<20} {:<20}    KERMA ratio\n", "Geometry 1", "Geometry 2");
    for (&(i, j), scg) in k.correlated().iter().zip(sums) {
        let (r1, dr1) = k.kerma().current_result(i);
        let (r2, dr2) = k.kerma().current_result(j);
        if r1 <= 0.0 || r2 <= 0.0 {
            text += "zero dose\n";
            continue;
        }

        let (g1, g2) = (&k.geometries()[i], &k.geometries()[j]);
        let (ratio, dr) = correlated_ratio((r1, dr1), (r2, dr2), scg, n);
        let r = ratio * g2.mass() / g1.mass();
        text += &f!(
            "{:<20} {:<20}     {:<11.8} +/- {:<10.8} [{:<10.6}%]\n",
            g1.name(),
            g2.name(),
            r,
            r * dr,
            100.0 * dr
        );
    }
    text
}

/// Ratio `r1/r2` and its relative uncertainty
///
/// `scg` is the sum of the per history products of the two scores over `n`
/// histories.
pub(crate) fn correlated_ratio(
    (r1, dr1): (f64, f64),
    (r2, dr2): (f64, f64),
    scg: f64,
    n: f64,
) -> (f64, f64) {
    let rc = if n > 1.0 {
        (scg / (r1 * r2 * n) - 1.0) / (n - 1.0)
    } else {
        0.0
    };
    let (dr1, dr2) = (dr1 / r1, dr2 / r2);
    let var = dr1 * dr1 + dr2 * dr2 - 2.0 * rc;
    let dr = if var > 0.0 { var.sqrt() } else { 0.0 };
    (r1 / r2, dr)
}

/// Normalisation of the fluence spectrum of geometry `ig`
///
/// Per source particle or fluence, per unit volume of the scoring regions,
/// and per unit bin width.
fn fluence_norm(k: &KermaScoring<'_>, app: &dyn Application, ig: usize) -> f64 {
    let g = &k.geometries()[ig];
    let a = k.fluence().map_or(1.0, |f| f.grid().a());
    let volume = g.mass() / g.density();
    a / source_normalization(app, k.current_case()) / volume
}

/// Photon fluence in every geometry
fn fluence_tables(k: &KermaScoring<'_>, app: &dyn Application) -> String {
    let Some(fluence) = k.fluence() else {
        return String::new();
    };

    let mut text = String::from("\n\nPhoton fluence\n=============================\n");
    for (ig, g) in k.geometries().iter().enumerate() {
        let norm = fluence_norm(k, app, ig);
        let (fe, dfe) = fluence.totals().current_result(ig);
        text += &f!("\nGeometry {} : ", g.name());
        text += &f!(
            " total fluence [cm-2] = {} +/- {:<7.3}%\n\n",
            (fe * norm / fluence.grid().a()).sci(4, 2),
            fe.rel_percent(dfe)
        );
        text += "   Emid/MeV    Flu/(MeV*cm2)   DFlu/(MeV*cm2)\n\
                 ---------------------------------------------\n";
        for (e, r, dr) in spectrum_points(fluence.grid(), fluence.spectrum(ig), norm) {
            text += &f!("{e:11.6}  {:>14}  {:>14}\n", r.sci(6, 2), dr.sci(6, 2));
        }
    }
    text
}

impl KermaScoring<'_> {
    /// Write the photon fluence spectrum of every geometry as a Grace plot
    ///
    /// Does nothing if fluence is not scored.
    pub fn write_spectrum(&self, writer: &mut dyn Write, app: &dyn Application) -> Result<()> {
        let Some(fluence) = self.fluence() else {
            return Ok(());
        };
        GraceHeader {
            comment: "Photon fluence ",
            title: "Photon fluence",
            per_area: true,
        }
        .write(writer)?;

        for (ig, g) in self.geometries().iter().enumerate() {
            let norm = fluence_norm(self, app, ig);
            let points = spectrum_points(fluence.grid(), fluence.spectrum(ig), norm);
            write_grace_series(writer, ig, g.name(), &points)?;
        }
        Ok(())
    }
}
