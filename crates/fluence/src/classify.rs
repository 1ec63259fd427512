//! Region and particle classification
//!
//! Decides which regions are scored, and which particles still count as
//! primaries. A particle becomes a secondary when it is created by an
//! interaction that, for the particle type being scored, produces new
//! particles rather than continuing the incident one. Interactions inside
//! source regions never reclassify anything.

// crate modules
use crate::config::FluenceOptions;
use crate::regions::{describe_regions, RegionSelection};

// external crates
use log::warn;

// egstools modules
use egstools_ausgab::{AusgabCall, Charge, ParticleStack};
use egstools_utils::f;

/// Per-region flags and the particle types involved in scoring
#[derive(Debug, Clone, PartialEq)]
pub struct Classifier {
    scoring_charge: Charge,
    source_charge: Charge,
    /// True when the source charge was not given nor known to the engine
    assumed_source: bool,
    score_primaries: bool,
    is_sensitive: Vec<bool>,
    is_source: Vec<bool>,
}

impl Classifier {
    /// Flags for a geometry with `nreg` regions
    ///
    /// The source particle is the one configured, or else the one the
    /// engine reports. Failing both, primaries are assumed to be the scored
    /// particle type.
    pub fn new(
        options: &FluenceOptions,
        sensitive: &RegionSelection,
        nreg: usize,
        app_source_charge: Option<Charge>,
    ) -> Self {
        let (source_charge, assumed_source) = match options.source_charge.or(app_source_charge) {
            Some(charge) => (charge, false),
            None => (options.scoring_charge, true),
        };

        let is_sensitive = sensitive.flags(nreg);
        let is_source = options.source_regions.flags(nreg);

        let n_source = is_source.iter().filter(|s| **s).count();
        if options.score_primaries && nreg > 0 && n_source == nreg {
            warn!("Every region is a source region, no particle will ever be a secondary");
        }

        Self {
            scoring_charge: options.scoring_charge,
            source_charge,
            assumed_source,
            score_primaries: options.score_primaries,
            is_sensitive,
            is_source,
        }
    }

    /// Particle type being scored
    #[inline]
    pub fn scoring_charge(&self) -> Charge {
        self.scoring_charge
    }

    /// Particle type emitted by the source
    pub fn source_charge(&self) -> Charge {
        self.source_charge
    }

    /// True if primaries are scored separately
    #[inline]
    pub fn score_primaries(&self) -> bool {
        self.score_primaries
    }

    /// Number of regions
    pub fn regions(&self) -> usize {
        self.is_sensitive.len()
    }

    /// True if `region` is scored
    #[inline]
    pub fn is_sensitive(&self, region: usize) -> bool {
        self.is_sensitive.get(region).copied().unwrap_or(false)
    }

    /// True if `region` is a source region
    #[inline]
    pub fn is_source(&self, region: usize) -> bool {
        self.is_source.get(region).copied().unwrap_or(false)
    }

    /// Regions that are scored, in increasing order
    pub fn sensitive_regions(&self) -> impl Iterator<Item = usize> + '_ {
        self.is_sensitive
            .iter()
            .enumerate()
            .filter(|(_, s)| **s)
            .map(|(i, _)| i)
    }

    /// Number of scored regions
    pub fn n_sensitive(&self) -> usize {
        self.is_sensitive.iter().filter(|s| **s).count()
    }

    /// Flag the products of the last interaction as secondaries
    ///
    /// Only acts on the interactions relevant to the scored particle type:
    ///
    /// | scoring         | call                                       | flagged                  |
    /// | --------------- | ------------------------------------------ | ------------------------ |
    /// | electron/positron | brems                                    | photons, unless the source is a photon |
    /// | electron/positron | Moller, annihilation in flight and at rest | every product          |
    /// | electron/positron | Bhabha                                   | the electron             |
    /// | photon          | pair, Compton, photoelectric, Rayleigh     | every product            |
    pub fn flag_secondaries(&self, call: AusgabCall, stack: &mut dyn ParticleStack) {
        let Some(region) = stack.top().and_then(|p| p.region) else {
            return;
        };
        if self.is_source(region) {
            return;
        }

        let selection: Option<fn(Charge) -> bool> = match (self.scoring_charge, call) {
            (Charge::Photon, AusgabCall::AfterPair)
            | (Charge::Photon, AusgabCall::AfterCompton)
            | (Charge::Photon, AusgabCall::AfterPhoto)
            | (Charge::Photon, AusgabCall::AfterRayleigh) => Some(|_| true),
            (Charge::Photon, _) => None,
            (_, AusgabCall::AfterBrems) if self.source_charge != Charge::Photon => {
                Some(|q| q == Charge::Photon)
            }
            (_, AusgabCall::AfterMoller)
            | (_, AusgabCall::AfterAnnihFlight)
            | (_, AusgabCall::AfterAnnihRest) => Some(|_| true),
            (_, AusgabCall::AfterBhabha) => Some(|q| q == Charge::Electron),
            _ => None,
        };

        let Some(selected) = selection else {
            return;
        };

        for i in stack.interaction_start()..stack.len() {
            if let Some(p) = stack.get_mut(i) {
                if selected(p.charge) {
                    p.mark_secondary();
                }
            }
        }
    }

    /// Scored regions, source particle and source regions as text
    pub fn describe(&self) -> String {
        let mut text = describe_regions(&self.is_sensitive);
        text += "\n";

        if self.score_primaries {
            text += &f!(" - source particle: {}", self.source_charge);
            if self.assumed_source {
                text += " (assumed, no source particle defined)";
            }
            text += "\n";
            if self.is_source.iter().any(|s| *s) {
                text += &f!(" - source regions:{}\n", describe_regions(&self.is_source));
            }
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnergyGridInput;
    use egstools_ausgab::{Particle, Stack};
    use rstest::rstest;

    fn options(scoring: Charge, source: Option<Charge>) -> FluenceOptions {
        FluenceOptions {
            scoring_charge: scoring,
            source_charge: source,
            verbose: false,
            score_primaries: true,
            score_spectrum: false,
            normalization: 1.0,
            grid: EnergyGridInput::default(),
            source_regions: RegionSelection::List(vec![0]),
        }
    }

    /// Stack after an interaction in `region` producing the given particles
    fn after_interaction(region: usize, products: &[Charge]) -> Stack {
        let mut stack = Stack::new();
        stack.push(Particle::new(Charge::Photon, 1.0).in_region(region));
        stack.interact(products.iter().map(|q| Particle::new(*q, 0.5)));
        stack
    }

    fn lineage(stack: &Stack) -> Vec<bool> {
        stack.products().iter().map(|p| p.is_primary()).collect()
    }

    #[rstest]
    #[case(Charge::Photon, AusgabCall::AfterCompton, vec![false, false])]
    #[case(Charge::Photon, AusgabCall::AfterBrems, vec![true, true])]
    #[case(Charge::Electron, AusgabCall::AfterMoller, vec![false, false])]
    #[case(Charge::Electron, AusgabCall::AfterBrems, vec![false, true])]
    #[case(Charge::Electron, AusgabCall::AfterBhabha, vec![false, true])]
    #[case(Charge::Positron, AusgabCall::AfterBhabha, vec![false, true])]
    #[case(Charge::Electron, AusgabCall::AfterCompton, vec![true, true])]
    fn flagging_rules(
        #[case] scoring: Charge,
        #[case] call: AusgabCall,
        #[case] expected: Vec<bool>,
    ) {
        let c = Classifier::new(
            &options(scoring, Some(Charge::Electron)),
            &RegionSelection::All,
            3,
            None,
        );
        let products = match call {
            AusgabCall::AfterBrems => [Charge::Photon, Charge::Electron],
            _ => [Charge::Electron, Charge::Positron],
        };
        let mut stack = after_interaction(1, &products);
        c.flag_secondaries(call, &mut stack);
        assert_eq!(lineage(&stack), expected);
    }

    #[test]
    fn source_regions_are_exempt() {
        let c = Classifier::new(&options(Charge::Photon, None), &RegionSelection::All, 3, None);
        let mut stack = after_interaction(0, &[Charge::Photon, Charge::Electron]);
        c.flag_secondaries(AusgabCall::AfterCompton, &mut stack);
        assert_eq!(lineage(&stack), vec![true, true]);
    }

    #[test]
    fn brems_from_photon_sources_stays_primary() {
        let c = Classifier::new(
            &options(Charge::Electron, None),
            &RegionSelection::All,
            3,
            Some(Charge::Photon),
        );
        assert_eq!(c.source_charge(), Charge::Photon);
        let mut stack = after_interaction(2, &[Charge::Photon, Charge::Electron]);
        c.flag_secondaries(AusgabCall::AfterBrems, &mut stack);
        assert_eq!(lineage(&stack), vec![true, true]);
    }

    #[test]
    fn secondaries_stay_secondary() {
        let c = Classifier::new(&options(Charge::Photon, None), &RegionSelection::All, 3, None);
        let mut stack = after_interaction(1, &[Charge::Photon]);
        c.flag_secondaries(AusgabCall::AfterRayleigh, &mut stack);
        // a later interaction that would not flag anything
        stack.interact([Particle::new(Charge::Photon, 0.1)]);
        c.flag_secondaries(AusgabCall::AfterBrems, &mut stack);
        assert_eq!(lineage(&stack), vec![false]);
    }

    #[test]
    fn unknown_source_is_the_scored_particle() {
        let c = Classifier::new(&options(Charge::Positron, None), &RegionSelection::All, 1, None);
        assert_eq!(c.source_charge(), Charge::Positron);
        assert!(c.describe().contains("(assumed, no source particle defined)"));
    }

    #[test]
    fn sensitivity() {
        let c = Classifier::new(
            &options(Charge::Photon, None),
            &RegionSelection::List(vec![1, 3]),
            4,
            None,
        );
        assert!(!c.is_sensitive(0) && c.is_sensitive(1) && c.is_sensitive(3));
        assert!(!c.is_sensitive(17));
        assert_eq!(c.sensitive_regions().collect::<Vec<usize>>(), vec![1, 3]);
        assert!(c.describe().starts_with(" 1 3\n"));
    }
}
