//! Reader for `E*muen/rho` data files
//!
//! The files are plain text: the number of entries, then that many pairs of
//! photon energy (MeV) and `E*muen/rho` (MeV cm2/g). Energies are expected
//! on a grid equally spaced in `ln(E)`.

// standard library
use std::path::Path;

// crate modules
use crate::error::{Error, Result};

// external crates
use log::{debug, warn};

// nom parser combinators
use nom::character::complete::{self, multispace0};
use nom::multi::count;
use nom::number::complete::double;
use nom::sequence::{pair, preceded};
use nom::IResult;

// egstools modules
use egstools_interp::Interpolator;
use egstools_utils::f;

/// Energy times the mass energy absorption coefficient, against `ln(E)`
///
/// ```rust
/// # use egstools_kerma::EmuenTable;
/// let table = EmuenTable::parse("3\n 0.01 1.0\n 0.1 2.0\n 1.0 3.0\n").unwrap();
///
/// assert_eq!(table.entries(), 3);
/// assert!((table.at(0.1_f64.ln()) - 2.0).abs() < 1e-12);
///
/// // clamped outside the table
/// assert_eq!(table.at(10.0_f64.ln()), 3.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EmuenTable {
    entries: usize,
    emin: f64,
    emax: f64,
    table: Interpolator<'static>,
}

impl EmuenTable {
    /// Read a table from the file at `path`
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::UnreadableEmuenFile {
            path: path.display().to_string(),
            source,
        })?;
        debug!("Reading E*muen/rho data from {}", path.display());
        Self::parse(&text)
    }

    /// Read a table from text
    ///
    /// Fails for fewer than 2 entries, a short or malformed list, and
    /// energies that are not positive.
    pub fn parse(text: &str) -> Result<Self> {
        let (rest, n) =
            entry_count(text).map_err(|_| Error::MalformedEmuen("missing entry count".into()))?;
        let n = usize::try_from(n)
            .ok()
            .filter(|n| *n >= 2)
            .ok_or(Error::TooFewEmuenEntries(n.max(0) as usize))?;

        let (_, pairs) = count(entry, n)(rest)
            .map_err(|_| Error::MalformedEmuen(f!("expected {n} energy and value pairs")))?;

        if let Some((e, _)) = pairs.iter().find(|(e, _)| *e <= 0.0) {
            return Err(Error::MalformedEmuen(f!("energy {e} MeV is not positive")));
        }

        let (emin, emax) = (pairs[0].0, pairs[n - 1].0);
        let (xmin, xmax) = (emin.ln(), emax.ln());
        check_spacing(&pairs, xmin, xmax);

        let values = pairs.iter().map(|(_, v)| *v).collect::<Vec<f64>>();
        let table = Interpolator::from_values(n, xmin, xmax, &values)?;
        Ok(Self {
            entries: n,
            emin,
            emax,
            table,
        })
    }

    /// Number of entries
    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Lowest tabulated energy (MeV)
    pub fn emin(&self) -> f64 {
        self.emin
    }

    /// Highest tabulated energy (MeV)
    pub fn emax(&self) -> f64 {
        self.emax
    }

    /// `E*muen/rho` at the log of the photon energy (MeV cm2/g)
    #[inline]
    pub fn at(&self, ln_e: f64) -> f64 {
        self.table.interpolate(ln_e)
    }
}

/// Leading entry count
fn entry_count(i: &str) -> IResult<&str, i64> {
    preceded(multispace0, complete::i64)(i)
}

/// One energy and value pair
fn entry(i: &str) -> IResult<&str, (f64, f64)> {
    pair(preceded(multispace0, double), preceded(multispace0, double))(i)
}

/// Warn when energies are not equally spaced in `ln(E)`
fn check_spacing(pairs: &[(f64, f64)], xmin: f64, xmax: f64) {
    let dx = (xmax - xmin) / (pairs.len() - 1) as f64;
    let worst = pairs
        .iter()
        .enumerate()
        .map(|(j, (e, _))| (e.ln() - (xmin + j as f64 * dx)).abs())
        .fold(0.0, f64::max);
    if worst > 1e-3 * dx.abs() {
        warn!("E*muen/rho energies are not equally spaced in ln(E), interpolation will be off");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn log_interpolation() {
        let table = EmuenTable::parse("2 0.001 10.0 1.0 40.0").unwrap();
        assert_eq!((table.emin(), table.emax()), (0.001, 1.0));

        // linear in ln(E) between the two entries
        let x = 0.5 * (0.001_f64.ln() + 1.0_f64.ln());
        assert_relative_eq!(table.at(x), 25.0, max_relative = 1e-12);
        assert_eq!(table.at(-20.0), 10.0);
    }

    #[rstest]
    #[case("", "missing entry count")]
    #[case("3\n 0.1 1.0\n 1.0 2.0\n", "expected 3 energy and value pairs")]
    #[case("2\n 0.1 1.0\n one 2.0\n", "expected 2 energy and value pairs")]
    #[case("2\n 0.0 1.0\n 1.0 2.0\n", "energy 0 MeV is not positive")]
    fn malformed(#[case] text: &str, #[case] reason: &str) {
        match EmuenTable::parse(text) {
            Err(Error::MalformedEmuen(r)) => assert_eq!(r, reason),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[rstest]
    #[case("1\n 0.1 1.0\n", 1)]
    #[case("-4\n", 0)]
    fn too_few_entries(#[case] text: &str, #[case] found: usize) {
        assert!(matches!(
            EmuenTable::parse(text),
            Err(Error::TooFewEmuenEntries(n)) if n == found
        ));
    }

    #[test]
    fn missing_file() {
        let result = EmuenTable::from_file("./no/such/emuen.dat");
        assert!(matches!(result, Err(Error::UnreadableEmuenFile { .. })));
    }
}
