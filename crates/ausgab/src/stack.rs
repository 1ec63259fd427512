//! Particle stack access

// crate modules
use crate::particle::Particle;

/// The engine's stack of particles in flight
///
/// Index 0 is the bottom of the stack and the particle being transported is
/// on top. After an interaction the products occupy the top of the stack
/// from [ParticleStack::interaction_start()] upwards.
pub trait ParticleStack {
    /// Number of particles on the stack
    fn len(&self) -> usize;

    /// Particle at index `i`
    fn get(&self, i: usize) -> Option<&Particle>;

    /// Mutable particle at index `i`
    fn get_mut(&mut self, i: usize) -> Option<&mut Particle>;

    /// Index of the first product of the last interaction
    fn interaction_start(&self) -> usize;

    /// True if nothing is on the stack
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Particle currently being transported
    fn top(&self) -> Option<&Particle> {
        self.len().checked_sub(1).and_then(|i| self.get(i))
    }

    /// Mutable particle currently being transported
    fn top_mut(&mut self) -> Option<&mut Particle> {
        self.len().checked_sub(1).and_then(|i| self.get_mut(i))
    }
}

/// A simple vector-backed stack
///
/// Suitable for engines that do not need their own storage layout, and for
/// driving scoring objects directly.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Stack {
    particles: Vec<Particle>,
    npold: usize,
}

impl Stack {
    /// New empty stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a particle on top
    pub fn push(&mut self, particle: Particle) {
        self.particles.push(particle);
    }

    /// Remove the top particle
    pub fn pop(&mut self) -> Option<Particle> {
        let p = self.particles.pop();
        self.npold = self.npold.min(self.particles.len());
        p
    }

    /// Replace the top particle by the products of its interaction
    ///
    /// Products inherit the lineage and visit status of the interacting
    /// particle.
    pub fn interact<I>(&mut self, products: I)
    where
        I: IntoIterator<Item = Particle>,
    {
        let parent = self.particles.pop();
        self.npold = self.particles.len();
        for mut p in products {
            if let Some(parent) = parent {
                p.lineage = parent.lineage;
                p.visit = parent.visit;
                p.region = p.region.or(parent.region);
            }
            self.particles.push(p);
        }
    }

    /// Products of the last interaction still on the stack
    pub fn products(&self) -> &[Particle] {
        &self.particles[self.npold.min(self.particles.len())..]
    }

    /// All particles from the bottom of the stack
    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    /// Empty the stack
    pub fn clear(&mut self) {
        self.particles.clear();
        self.npold = 0;
    }
}

impl ParticleStack for Stack {
    fn len(&self) -> usize {
        self.particles.len()
    }

    fn get(&self, i: usize) -> Option<&Particle> {
        self.particles.get(i)
    }

    fn get_mut(&mut self, i: usize) -> Option<&mut Particle> {
        self.particles.get_mut(i)
    }

    fn interaction_start(&self) -> usize {
        self.npold
    }
}
