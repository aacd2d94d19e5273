//! Particle storage with an allocation-order view and a draw-order view.
//!
//! Particles are owned once, in allocation order; emission walks that order
//! as a ring. The draw order is a permutation of indices into the same array
//! that camera sorting rearranges. Buffer slot `k` holds the particle at
//! `draw_order[k]`, and `slot_of` is the inverse permutation so an emission
//! can repack only the slot its particle currently occupies.

use crate::particle::Particle;

#[derive(Clone, Debug, Default)]
pub struct ParticlePool {
    particles: Vec<Particle>,
    draw_order: Vec<usize>,
    slot_of: Vec<usize>,
}

impl ParticlePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pool of `len` fresh particles in identity draw order.
    pub fn with_len(len: usize, life_time: f32) -> Self {
        let mut pool = Self::new();
        pool.resize(len, life_time);
        pool
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Grow with fresh particles or drop the highest allocation indices.
    ///
    /// Removed particles disappear from both views; survivors keep their
    /// relative draw order.
    pub fn resize(&mut self, len: usize, life_time: f32) {
        let old = self.particles.len();
        if len < old {
            self.particles.truncate(len);
            self.draw_order.retain(|&index| index < len);
        } else {
            self.particles.resize(len, Particle::new(life_time));
            self.draw_order.extend(old..len);
        }
        self.rebuild_slots();
    }

    /// Drop every particle.
    pub fn clear(&mut self) {
        self.particles.clear();
        self.draw_order.clear();
        self.slot_of.clear();
    }

    /// Particles in allocation order.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn get(&self, index: usize) -> Option<&Particle> {
        self.particles.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Particle> {
        self.particles.get_mut(index)
    }

    /// Allocation indices in draw (buffer slot) order.
    pub fn draw_order(&self) -> &[usize] {
        &self.draw_order
    }

    /// Buffer slot currently holding the particle at allocation `index`.
    #[inline]
    pub fn slot_of(&self, index: usize) -> usize {
        self.slot_of[index]
    }

    /// Particle drawn in buffer `slot`.
    #[inline]
    pub fn in_slot(&self, slot: usize) -> &Particle {
        &self.particles[self.draw_order[slot]]
    }

    /// Particles in draw order.
    pub fn iter_draw_order(&self) -> impl Iterator<Item = &Particle> + '_ {
        self.draw_order.iter().map(move |&index| &self.particles[index])
    }

    /// Stable in-place insertion sort of the draw order by ascending `sort_value`.
    ///
    /// Frame-to-frame camera motion only perturbs the order slightly, which is
    /// the near-sorted input insertion sort handles in close to linear time.
    /// Returns the number of element moves.
    pub fn sort_by_value(&mut self) -> usize {
        let particles = &self.particles;
        let order = &mut self.draw_order;
        let mut moves = 0;

        for i in 1..order.len() {
            let current = order[i];
            let key = particles[current].sort_value;
            let mut j = i;
            while j > 0 && particles[order[j - 1]].sort_value > key {
                order[j] = order[j - 1];
                j -= 1;
                moves += 1;
            }
            order[j] = current;
        }

        if moves > 0 {
            self.rebuild_slots();
        }
        moves
    }

    fn rebuild_slots(&mut self) {
        self.slot_of.clear();
        self.slot_of.resize(self.particles.len(), 0);
        for (slot, &index) in self.draw_order.iter().enumerate() {
            self.slot_of[index] = slot;
        }
    }
}
