//! Total and differential fluence arrays

// standard library
use std::io::Write;

// egstools modules
use egstools_scoring::{Result, ScoringArray, StateReader};

/// Total fluence per scoring element, and a spectrum for some of them
///
/// Elements are regions for volumetric scoring and pixels for planar
/// scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct Tally {
    total: ScoringArray,
    spectra: Vec<Option<ScoringArray>>,
}

impl Tally {
    /// `elements` totals, and `nbin` bin spectra where `with_spectrum` holds
    pub fn new<F>(elements: usize, nbin: usize, with_spectrum: F) -> Result<Self>
    where
        F: Fn(usize) -> bool,
    {
        let spectra = (0..elements)
            .map(|i| {
                if with_spectrum(i) {
                    ScoringArray::new(nbin).map(Some)
                } else {
                    Ok(None)
                }
            })
            .collect::<Result<Vec<Option<ScoringArray>>>>()?;

        Ok(Self {
            total: ScoringArray::new(elements)?,
            spectra,
        })
    }

    /// Add `f` to the spectrum of element `i` in `bin`, and `f_total` to its total
    #[inline]
    pub fn score(&mut self, i: usize, bin: usize, f: f64, f_total: f64) {
        self.total.score(i, f_total);
        if let Some(spectrum) = &mut self.spectra[i] {
            spectrum.score(bin, f);
        }
    }

    /// Add `f` to the total of element `i` only
    #[inline]
    pub fn score_total(&mut self, i: usize, f: f64) {
        self.total.score(i, f);
    }

    /// Totals of every element
    pub fn total(&self) -> &ScoringArray {
        &self.total
    }

    /// Spectrum of element `i`, if scored
    pub fn spectrum(&self, i: usize) -> Option<&ScoringArray> {
        self.spectra.get(i).and_then(|s| s.as_ref())
    }

    /// Start history `ncase` in every array
    pub fn set_history(&mut self, ncase: u64) {
        self.total.set_history(ncase);
        for spectrum in self.spectra.iter_mut().flatten() {
            spectrum.set_history(ncase);
        }
    }

    /// Zero every array
    pub fn reset(&mut self) {
        self.total.reset();
        for spectrum in self.spectra.iter_mut().flatten() {
            spectrum.reset();
        }
    }

    /// Write the totals, then every spectrum in element order
    pub fn store_state(&self, writer: &mut dyn Write) -> Result<()> {
        self.total.store_state(writer)?;
        for spectrum in self.spectra.iter().flatten() {
            spectrum.store_state(writer)?;
        }
        Ok(())
    }

    /// Replace every array with checkpoint state
    pub fn set_state(&mut self, reader: &mut StateReader) -> Result<()> {
        self.total.set_state(reader)?;
        for spectrum in self.spectra.iter_mut().flatten() {
            spectrum.set_state(reader)?;
        }
        Ok(())
    }

    /// Add checkpoint state to every array
    pub fn add_state(&mut self, reader: &mut StateReader) -> Result<()> {
        self.total.add_state(reader)?;
        for spectrum in self.spectra.iter_mut().flatten() {
            spectrum.add_state(reader)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spectra_only_where_asked() {
        let tally = Tally::new(4, 8, |i| i % 2 == 1).unwrap();
        assert!(tally.spectrum(0).is_none());
        assert_eq!(tally.spectrum(1).map(|s| s.bins()), Some(8));
        assert!(tally.spectrum(9).is_none());
        assert_eq!(tally.total().bins(), 4);
    }

    #[test]
    fn totals_and_spectra_share_histories() {
        let mut tally = Tally::new(2, 3, |_| true).unwrap();
        tally.set_history(1);
        tally.score(1, 2, 0.5, 0.25);
        tally.score_total(0, 1.0);
        tally.set_history(2);
        tally.score(1, 2, 0.5, 0.25);

        assert_eq!(tally.total().current_result(1), (0.25, 0.0));
        assert_eq!(tally.total().current_result(0), (0.5, 0.5));
        assert_eq!(tally.spectrum(1).unwrap().current_result(2), (0.5, 0.0));
    }

    #[test]
    fn state_in_element_order() {
        let mut tally = Tally::new(3, 2, |i| i != 1).unwrap();
        tally.set_history(1);
        tally.score(2, 1, 4.0, 1.0);

        let mut buffer = Vec::new();
        tally.store_state(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        // totals, then the spectra of elements 0 and 2
        let headers = text
            .lines()
            .filter(|l| l.split_whitespace().count() == 2)
            .collect::<Vec<&str>>();
        assert_eq!(headers, vec!["3 1", "2 1", "2 1"]);

        let mut restored = Tally::new(3, 2, |i| i != 1).unwrap();
        let mut reader = StateReader::new(&text);
        restored.set_state(&mut reader).unwrap();
        assert!(reader.is_exhausted());
        assert_eq!(restored.spectrum(2).unwrap().current_score(1), (4.0, 16.0));
    }
}
