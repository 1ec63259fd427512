//! Region selections from user input

// crate modules
use crate::error::{Error, Result};

// external crates
use itertools::Itertools;
use log::warn;
use serde::{Deserialize, Serialize};

// egstools modules
use egstools_utils::f;

/// Regions as written by the user
///
/// Either a keyword, where `"ALL"` selects every region and anything else is
/// read as a list of region numbers, or the list itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RegionList {
    Keyword(String),
    Regions(Vec<i64>),
}

/// A set of geometry regions
///
/// ```rust
/// # use egstools_fluence::RegionSelection;
/// let groups = RegionSelection::Groups(vec![(0, 2), (6, 6)]);
/// assert_eq!(groups.regions(10), vec![0, 1, 2, 6]);
/// assert_eq!(groups.flags(8), vec![true, true, true, false, false, false, true, false]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RegionSelection {
    /// No regions at all
    #[default]
    Empty,
    /// Every region of the geometry
    All,
    /// Region numbers in the order given
    List(Vec<i64>),
    /// Inclusive `(start, stop)` ranges
    Groups(Vec<(i64, i64)>),
}

impl RegionSelection {
    /// Selection from the list or start/stop keys of one input item
    ///
    /// An explicit list takes precedence over start/stop groups, and
    /// `default` is used when neither is given. Fails for start and stop
    /// lists of different lengths, or a group that decreases.
    pub fn from_input(
        what: &'static str,
        list: Option<&RegionList>,
        start: &[i64],
        stop: &[i64],
        default: RegionSelection,
    ) -> Result<Self> {
        match list {
            Some(RegionList::Regions(regions)) => return Ok(Self::List(regions.clone())),
            Some(RegionList::Keyword(keyword)) => return Ok(Self::from_keyword(what, keyword)),
            None => (),
        }

        if start.is_empty() && stop.is_empty() {
            return Ok(default);
        }

        if start.len() != stop.len() {
            return Err(Error::MismatchedRegionGroups {
                what,
                start: start.len(),
                stop: stop.len(),
            });
        }

        let groups = start
            .iter()
            .zip(stop.iter())
            .map(|(a, b)| {
                if a > b {
                    Err(Error::DecreasingRegionGroup {
                        what,
                        start: *a,
                        stop: *b,
                    })
                } else {
                    Ok((*a, *b))
                }
            })
            .collect::<Result<Vec<(i64, i64)>>>()?;

        Ok(Self::Groups(groups))
    }

    fn from_keyword(what: &str, keyword: &str) -> Self {
        if keyword.trim().eq_ignore_ascii_case("all") {
            return Self::All;
        }

        let regions = keyword
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .filter_map(|s| match s.parse::<i64>() {
                Ok(r) => Some(r),
                Err(_) => {
                    warn!("Unable to read \"{s}\" in {what} as a region number, ignored");
                    None
                }
            })
            .collect::<Vec<i64>>();

        if regions.is_empty() {
            Self::Empty
        } else {
            Self::List(regions)
        }
    }

    /// True for [RegionSelection::All]
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Every selected region in order, groups expanded
    ///
    /// Groups are clipped to `0..nreg` with one warning per group. Out of
    /// range numbers in a list are kept, see [RegionSelection::flags()].
    pub fn regions(&self, nreg: usize) -> Vec<i64> {
        match self {
            Self::Empty => Vec::new(),
            Self::All => (0..nreg as i64).collect(),
            Self::List(regions) => regions.clone(),
            Self::Groups(groups) => groups
                .iter()
                .flat_map(|&(start, stop)| clip_group(start, stop, nreg))
                .collect(),
        }
    }

    /// Per-region flags for a geometry with `nreg` regions
    ///
    /// Regions outside of `0..nreg` and repeated regions are ignored with a
    /// warning.
    pub fn flags(&self, nreg: usize) -> Vec<bool> {
        if self.is_all() {
            return vec![true; nreg];
        }

        let mut flags = vec![false; nreg];
        for region in self.regions(nreg) {
            match usize::try_from(region).ok().filter(|r| *r < nreg) {
                Some(r) if flags[r] => warn!("Region {r} selected more than once"),
                Some(r) => flags[r] = true,
                None => warn!(
                    "Region {region} is outside of the geometry (0-{}), ignored",
                    nreg.saturating_sub(1)
                ),
            }
        }
        flags
    }
}

/// Part of a start/stop group inside `0..nreg`
fn clip_group(start: i64, stop: i64, nreg: usize) -> std::ops::RangeInclusive<i64> {
    let last = i64::try_from(nreg).unwrap_or(i64::MAX) - 1;
    let (lo, hi) = (start.max(0), stop.min(last));
    if (lo, hi) != (start, stop) {
        warn!("Region group {start}-{stop} extends outside of the geometry (0-{last}), clipped");
    }
    lo..=hi
}

/// Text listing of flagged regions
///
/// Consecutive regions are collapsed into ranges, 25 entries to a line, and
/// the listing stops after 100 entries. A full set of flags is `ALL`.
///
/// ```rust
/// # use egstools_fluence::describe_regions;
/// let flags = [true, true, true, false, true, false, true, true];
/// assert_eq!(describe_regions(&flags), " 0-2 4 6-7");
/// assert_eq!(describe_regions(&[true; 3]), "ALL");
/// ```
pub fn describe_regions(flags: &[bool]) -> String {
    const PER_LINE: usize = 25;
    const MAX_ENTRIES: usize = 100;

    if !flags.is_empty() && flags.iter().all(|f| *f) {
        return "ALL".to_string();
    }

    let runs = flags
        .iter()
        .enumerate()
        .filter(|(_, f)| **f)
        .map(|(i, _)| i)
        .enumerate()
        .chunk_by(|(n, i)| i - n)
        .into_iter()
        .map(|(_, run)| {
            let run = run.map(|(_, i)| i).collect::<Vec<usize>>();
            (run[0], run[run.len() - 1])
        })
        .collect::<Vec<(usize, usize)>>();

    let mut text = String::new();
    for (n, (start, stop)) in runs.iter().enumerate() {
        if n == MAX_ENTRIES {
            text += &f!(" ... {}", flags.len() - 1);
            break;
        }
        if n > 0 && n % PER_LINE == 0 {
            text.push('\n');
        }
        if start == stop {
            text += &f!(" {start}");
        } else {
            text += &f!(" {start}-{stop}");
        }
    }
    text
}
