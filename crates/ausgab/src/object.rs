//! Scoring objects and event dispatch

// standard library
use std::io::Write;

// crate modules
use crate::application::Application;
use crate::call::AusgabCall;
use crate::error::Result;
use crate::particle::{Particle, StepInfo};
use crate::stack::ParticleStack;

// external crates
use log::debug;

// egstools modules
use egstools_scoring::StateReader;

/// Everything a scoring object can see at one event
///
/// Borrows the engine's stack for the duration of the call, so nothing is
/// copied per step.
pub struct Event<'a> {
    /// The engine's particle stack
    pub stack: &'a mut dyn ParticleStack,
    /// Energy deposit and path length of the current step
    pub step: StepInfo,
    /// Medium of the current region, `None` for vacuum
    pub medium: Option<usize>,
}

impl<'a> Event<'a> {
    /// New event
    pub fn new(stack: &'a mut dyn ParticleStack, step: StepInfo, medium: Option<usize>) -> Self {
        Self {
            stack,
            step,
            medium,
        }
    }

    /// Particle currently being transported
    #[inline]
    pub fn top(&self) -> Option<&Particle> {
        self.stack.top()
    }
}

impl std::fmt::Debug for Event<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Event")
            .field("stack_len", &self.stack.len())
            .field("step", &self.step)
            .field("medium", &self.medium)
            .finish()
    }
}

/// An object that scores quantities from engine events
///
/// The engine only calls [AusgabObject::process_event()] for the event
/// kinds an object asks for through [AusgabObject::needs_call()], and calls
/// [AusgabObject::set_current_case()] before the first event of every new
/// history.
pub trait AusgabObject {
    /// True if the object wants to see events of this kind
    fn needs_call(&self, call: AusgabCall) -> bool;

    /// Handle one event
    fn process_event(&mut self, call: AusgabCall, event: &mut Event<'_>);

    /// Start history `ncase`
    fn set_current_case(&mut self, ncase: u64);

    /// Zero every result
    fn reset_counter(&mut self);

    /// Write the current state to a checkpoint
    fn store_state(&self, writer: &mut dyn Write) -> Result<()>;

    /// Replace the current state with a checkpoint
    fn set_state(&mut self, reader: &mut StateReader) -> Result<()>;

    /// Combine a checkpoint from another run with the current state
    fn add_state(&mut self, reader: &mut StateReader) -> Result<()>;

    /// Result tables as text
    fn report(&self, app: &dyn Application) -> String;

    /// Summary of the scoring setup
    fn describe(&self) -> String;
}

/// A set of scoring objects fed from one engine
///
/// ```rust
/// # use egstools_ausgab::{AusgabCall, AusgabList, Event, Stack, StepInfo};
/// let mut objects = AusgabList::new();
/// let mut stack = Stack::new();
///
/// objects.set_current_case(1);
/// let mut event = Event::new(&mut stack, StepInfo::default(), None);
/// objects.dispatch(AusgabCall::BeforeTransport, &mut event);
/// assert!(!objects.needs_call(AusgabCall::BeforeTransport));
/// ```
#[derive(Default)]
pub struct AusgabList<'a> {
    objects: Vec<Box<dyn AusgabObject + 'a>>,
}

impl<'a> AusgabList<'a> {
    /// New empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a scoring object
    pub fn push(&mut self, object: Box<dyn AusgabObject + 'a>) {
        debug!("Adding ausgab object:\n{}", object.describe());
        self.objects.push(object);
    }

    /// Number of objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// True if there are no objects
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// True if any object wants events of this kind
    pub fn needs_call(&self, call: AusgabCall) -> bool {
        self.objects.iter().any(|o| o.needs_call(call))
    }

    /// Pass an event to every object that asked for it
    pub fn dispatch(&mut self, call: AusgabCall, event: &mut Event<'_>) {
        for object in self.objects.iter_mut().filter(|o| o.needs_call(call)) {
            object.process_event(call, event);
        }
    }

    /// Start history `ncase` in every object
    pub fn set_current_case(&mut self, ncase: u64) {
        for object in &mut self.objects {
            object.set_current_case(ncase);
        }
    }

    /// Zero every object
    pub fn reset_counter(&mut self) {
        for object in &mut self.objects {
            object.reset_counter();
        }
    }

    /// Write every object's state in order
    pub fn store_state(&self, writer: &mut dyn Write) -> Result<()> {
        self.objects.iter().try_for_each(|o| o.store_state(writer))
    }

    /// Restore every object's state in order
    pub fn set_state(&mut self, reader: &mut StateReader) -> Result<()> {
        self.objects.iter_mut().try_for_each(|o| o.set_state(reader))
    }

    /// Combine checkpoint state into every object in order
    pub fn add_state(&mut self, reader: &mut StateReader) -> Result<()> {
        self.objects.iter_mut().try_for_each(|o| o.add_state(reader))
    }

    /// Reports of every object, one after the other
    pub fn report(&self, app: &dyn Application) -> String {
        self.objects
            .iter()
            .map(|o| o.report(app))
            .collect::<Vec<String>>()
            .join("\n")
    }
}

impl std::fmt::Debug for AusgabList<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AusgabList")
            .field("objects", &self.objects.len())
            .finish()
    }
}
