//! Shared engine stand-ins for the fluence tests
#![allow(dead_code)]

use egstools_ausgab::*;
use egstools_interp::Interpolator;

/// Three water regions with a constant stopping power of 2 MeV/cm
///
/// The rest mass is rounded to 0.5 MeV so that kinetic energies are easy to
/// follow.
#[derive(Debug, Clone, Copy)]
pub struct Slab {
    pub ecut: f64,
    pub fluence: Option<f64>,
    pub range_rejection: bool,
    pub source: Option<Charge>,
}

impl Default for Slab {
    fn default() -> Self {
        Self {
            ecut: 0.5,
            fluence: None,
            range_rejection: false,
            source: None,
        }
    }
}

impl Application for Slab {
    fn regions(&self) -> usize {
        3
    }
    fn media(&self) -> usize {
        1
    }
    fn medium(&self, region: usize) -> Option<usize> {
        (region < 3).then_some(0)
    }
    fn medium_name(&self, _medium: usize) -> Option<&str> {
        Some("H2O")
    }
    fn medium_density(&self, _medium: usize) -> f64 {
        1.0
    }
    fn source_charge(&self) -> Option<Charge> {
        self.source
    }
    fn ecut(&self) -> f64 {
        self.ecut
    }
    fn stopping_power(&self, _medium: usize, _charge: Charge) -> Option<Interpolator<'_>> {
        Interpolator::from_fn(64, 0.001_f64.ln(), 10.0_f64.ln(), |_| 2.0).ok()
    }
    fn source_fluence(&self) -> Option<f64> {
        self.fluence
    }
    fn rest_mass(&self) -> f64 {
        0.5
    }
    fn range_rejection(&self) -> bool {
        self.range_rejection
    }
}

/// Pass one event to `object` if it asked for it
pub fn send<O: AusgabObject>(
    object: &mut O,
    stack: &mut Stack,
    call: AusgabCall,
    step: StepInfo,
) {
    if object.needs_call(call) {
        let mut event = Event::new(stack, step, Some(0));
        object.process_event(call, &mut event);
    }
}

/// Checkpoint text of an object
pub fn checkpoint<O: AusgabObject>(object: &O) -> String {
    let mut buffer = Vec::new();
    object.store_state(&mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}
