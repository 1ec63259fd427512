//! Scoring array with history-by-history statistics

// standard library
use std::io::Write;
use std::ops::AddAssign;

// crate modules
use crate::error::{Error, Result};
use crate::state::{write_float, StateReader};

/// Accumulators for one scoring bin
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Bin {
    /// Sum over completed histories
    sum: f64,
    /// Sum of squares over completed histories
    sum2: f64,
    /// Partial score of the last history that scored here
    tmp: f64,
    /// History number that `tmp` belongs to
    tag: u64,
}

impl Bin {
    #[inline]
    fn score(&mut self, history: u64, f: f64) {
        if self.tag == history {
            self.tmp += f;
        } else {
            self.sum += self.tmp;
            self.sum2 += self.tmp * self.tmp;
            self.tmp = f;
            self.tag = history;
        }
    }

    /// Sum and sum of squares including the open partial score
    #[inline]
    fn totals(&self) -> (f64, f64) {
        (self.sum + self.tmp, self.sum2 + self.tmp * self.tmp)
    }
}

/// An array of scoring bins sharing one history counter
///
/// Results are the mean per history and the uncertainty of that mean.
///
/// ```rust
/// # use egstools_scoring::ScoringArray;
/// let mut fluence = ScoringArray::new(3).unwrap();
///
/// for history in 1..=4 {
///     fluence.set_history(history);
///     fluence.score(1, 0.5);
///     fluence.score(1, 0.5);
/// }
///
/// assert_eq!(fluence.current_result(0), (0.0, 0.0));
/// assert_eq!(fluence.current_result(1), (1.0, 0.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringArray {
    bins: Vec<Bin>,
    history: u64,
}

impl ScoringArray {
    /// New zeroed array with `nbin` bins
    pub fn new(nbin: usize) -> Result<Self> {
        if nbin == 0 {
            return Err(Error::EmptyArray);
        }
        Ok(Self {
            bins: vec![Bin::default(); nbin],
            history: 0,
        })
    }

    /// Number of bins
    pub fn bins(&self) -> usize {
        self.bins.len()
    }

    /// Current history number
    pub fn history(&self) -> u64 {
        self.history
    }

    /// Set the current history number
    ///
    /// Must be called before the first score of every new independent
    /// history. Bins fold their partial scores in lazily on the next score.
    #[inline]
    pub fn set_history(&mut self, history: u64) {
        self.history = history;
    }

    /// Add `f` to `bin` for the current history
    ///
    /// Panics if `bin` is out of range, as slice indexing does.
    #[inline]
    pub fn score(&mut self, bin: usize, f: f64) {
        self.bins[bin].score(self.history, f);
    }

    /// Mean per history and its uncertainty
    ///
    /// Both are zero before any histories are run. The uncertainty is zero
    /// with a single history.
    pub fn current_result(&self, bin: usize) -> (f64, f64) {
        if self.history == 0 {
            return (0.0, 0.0);
        }

        let n = self.history as f64;
        let (sum, sum2) = self.bins[bin].totals();
        let r = sum / n;
        let mut dr = sum2 / n - r * r;

        if dr > 0.0 && self.history > 1 {
            dr = (dr / (n - 1.0)).sqrt();
        } else {
            dr = 0.0;
        }
        (r, dr)
    }

    /// Sum and sum of squares in `bin`, including the open history
    pub fn current_score(&self, bin: usize) -> (f64, f64) {
        self.bins[bin].totals()
    }

    /// Score in `bin` from the current history only
    pub fn this_history_score(&self, bin: usize) -> f64 {
        let bin = &self.bins[bin];
        if bin.tag == self.history {
            bin.tmp
        } else {
            0.0
        }
    }

    /// Zero every bin and the history counter
    pub fn reset(&mut self) {
        self.bins.fill(Bin::default());
        self.history = 0;
    }

    /// Write the array state
    ///
    /// The first line holds the number of bins and the history counter,
    /// followed by a line per bin with its tag, sum and sum of squares.
    pub fn store_state<W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        writeln!(writer, "{} {}", self.bins.len(), self.history)?;
        for bin in &self.bins {
            let (sum, sum2) = bin.totals();
            write!(writer, "{} ", bin.tag)?;
            write_float(writer, sum)?;
            write!(writer, " ")?;
            write_float(writer, sum2)?;
            writeln!(writer)?;
        }
        Ok(())
    }

    /// Replace the array with state read from a checkpoint
    ///
    /// The array is resized to the number of bins in the state.
    pub fn set_state(&mut self, reader: &mut StateReader) -> Result<()> {
        *self = Self::from_state(reader)?;
        Ok(())
    }

    /// Add state read from a checkpoint to the array
    pub fn add_state(&mut self, reader: &mut StateReader) -> Result<()> {
        let other = Self::from_state(reader)?;
        *self += &other;
        Ok(())
    }

    /// Read a new array from a checkpoint
    pub fn from_state(reader: &mut StateReader) -> Result<Self> {
        let nbin = reader.read_usize()?;
        if nbin == 0 {
            return Err(Error::InconsistentState(
                "scoring array with no bins".to_string(),
            ));
        }
        let history = reader.read_u64()?;

        let mut bins = Vec::with_capacity(nbin);
        for _ in 0..nbin {
            bins.push(Bin {
                tag: reader.read_u64()?,
                sum: reader.read_f64()?,
                sum2: reader.read_f64()?,
                tmp: 0.0,
            });
        }
        Ok(Self { bins, history })
    }
}

/// Combine two arrays, as for the results of separate runs
///
/// Partial scores are folded into the sums and the history counts add up.
/// The array grows if the other one has more bins.
impl AddAssign<&ScoringArray> for ScoringArray {
    fn add_assign(&mut self, other: &ScoringArray) {
        if other.bins.len() > self.bins.len() {
            self.bins.resize(other.bins.len(), Bin::default());
        }

        for (bin, x) in self.bins.iter_mut().zip(other.bins.iter()) {
            let (sum, sum2) = bin.totals();
            let (xsum, xsum2) = x.totals();
            *bin = Bin {
                sum: sum + xsum,
                sum2: sum2 + xsum2,
                tmp: 0.0,
                tag: 0,
            };
        }

        // remaining bins still need their partials folded in
        for bin in self.bins.iter_mut().skip(other.bins.len()) {
            let (sum, sum2) = bin.totals();
            *bin = Bin {
                sum,
                sum2,
                tmp: 0.0,
                tag: 0,
            };
        }

        self.history += other.history;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn empty_array() {
        assert!(matches!(ScoringArray::new(0), Err(Error::EmptyArray)));
    }

    #[test]
    fn lazy_flush() {
        let mut array = ScoringArray::new(1).unwrap();
        array.set_history(1);
        array.score(0, 2.0);
        array.set_history(2);

        // nothing scored in history 2 yet
        assert_eq!(array.bins[0].sum, 0.0);
        assert_eq!(array.bins[0].tmp, 2.0);
        assert_eq!(array.this_history_score(0), 0.0);

        array.score(0, 3.0);
        assert_eq!(array.bins[0].sum, 2.0);
        assert_eq!(array.bins[0].sum2, 4.0);
        assert_eq!(array.this_history_score(0), 3.0);
        assert_eq!(array.current_score(0), (5.0, 13.0));
    }

    #[test]
    fn variance_of_known_samples() {
        let samples = [1.0, 2.0, 3.0, 4.0, 10.0];
        let mut array = ScoringArray::new(1).unwrap();
        for (i, s) in samples.iter().enumerate() {
            array.set_history(i as u64 + 1);
            array.score(0, *s);
        }

        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let var = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / (n - 1.0);

        let (r, dr) = array.current_result(0);
        assert_relative_eq!(r, mean);
        assert_relative_eq!(dr, (var / n).sqrt(), max_relative = 1e-12);
    }

    #[test]
    fn histories_without_scores_count() {
        let mut array = ScoringArray::new(1).unwrap();
        array.set_history(1);
        array.score(0, 6.0);
        array.set_history(3);

        let (r, _) = array.current_result(0);
        assert_eq!(r, 2.0);
    }

    #[test]
    fn reset_everything() {
        let mut array = ScoringArray::new(4).unwrap();
        array.set_history(7);
        array.score(2, 1.0);
        array.reset();

        assert_eq!(array.history(), 0);
        for bin in 0..4 {
            assert_eq!(array.current_result(bin), (0.0, 0.0));
            assert_eq!(array.current_score(bin), (0.0, 0.0));
        }
    }

    #[test]
    fn combining_grows_the_array() {
        let mut small = ScoringArray::new(1).unwrap();
        small.set_history(2);
        small.score(0, 1.0);

        let mut large = ScoringArray::new(3).unwrap();
        large.set_history(1);
        large.score(2, 5.0);

        small += &large;
        assert_eq!(small.bins(), 3);
        assert_eq!(small.history(), 3);
        assert_eq!(small.current_score(0), (1.0, 1.0));
        assert_eq!(small.current_score(2), (5.0, 25.0));
    }
}
