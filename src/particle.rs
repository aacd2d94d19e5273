//! Per-particle emission record.
//!
//! A [`Particle`] only stores what the vertex shader needs to reconstruct the
//! particle at any moment: where and how fast it started, when it was emitted
//! and how long it lives. Whether a particle is pending, visible or expired is
//! derived from those numbers on the GPU; the pool never tracks it per frame.

use glam::Vec3;

/// One simulated emission instance.
///
/// Particles are created in bulk when a pool is attached or resized and are
/// never destroyed individually. A new emission recycles a slot in place by
/// overwriting `emit_time`, `start_position` and `start_direction`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    /// Emission position in local space.
    pub start_position: Vec3,
    /// Emission velocity in local space.
    pub start_direction: Vec3,
    /// Seconds the particle stays visible after emission.
    pub life_time: f32,
    /// Simulation time at which the particle begins life.
    ///
    /// Negative values mean "emitted before t=0" (pre-warm); values beyond the
    /// current clock mean "not yet emitted".
    pub emit_time: f32,
    /// GPU visibility gate, `0.0` or `1.0`.
    pub active: f32,
    /// Camera-distance sort key, recomputed each sorted frame.
    pub sort_value: f32,
}

impl Particle {
    /// Create an idle particle with the given lifetime.
    pub fn new(life_time: f32) -> Self {
        Self {
            life_time,
            ..Self::default()
        }
    }

    /// Seconds since emission at simulation time `time` (negative while pending).
    #[inline]
    pub fn age_at(&self, time: f32) -> f32 {
        time - self.emit_time
    }

    /// Whether the particle is within its visible life span at `time`.
    pub fn is_alive_at(&self, time: f32) -> bool {
        let age = self.age_at(time);
        self.active > 0.0 && age >= 0.0 && age <= self.life_time
    }

    /// Local position at simulation time `time` under constant `gravity`.
    ///
    /// Matches the integration the vertex shader performs.
    pub fn position_at(&self, time: f32, gravity: Vec3) -> Vec3 {
        self.position_after(self.age_at(time), gravity)
    }

    /// Position `age` seconds after emission.
    #[inline]
    pub fn position_after(&self, age: f32, gravity: Vec3) -> Vec3 {
        self.start_position + self.start_direction * age + 0.5 * age * age * gravity
    }

    /// Age as the vertex shader computes it: gated by `active` and wrapped by
    /// the lifetime when the emitter loops.
    pub fn draw_age(&self, time: f32, looping: bool) -> f32 {
        let age = time * self.active - self.emit_time;
        if looping && self.life_time > 0.0 {
            age.rem_euclid(self.life_time)
        } else {
            age
        }
    }
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            start_position: Vec3::ZERO,
            start_direction: Vec3::ZERO,
            life_time: 0.0,
            emit_time: 0.0,
            active: 1.0,
            sort_value: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_particle_is_active() {
        let p = Particle::new(5.0);
        assert_eq!(p.life_time, 5.0);
        assert_eq!(p.active, 1.0);
        assert_eq!(p.start_position, Vec3::ZERO);
    }

    #[test]
    fn test_alive_window() {
        let p = Particle {
            emit_time: 2.0,
            life_time: 1.0,
            ..Particle::default()
        };
        assert!(!p.is_alive_at(1.5)); // pending
        assert!(p.is_alive_at(2.5));
        assert!(!p.is_alive_at(3.5)); // expired

        let hidden = Particle { active: 0.0, ..p };
        assert!(!hidden.is_alive_at(2.5));
    }

    #[test]
    fn test_position_integration() {
        let p = Particle {
            start_position: Vec3::new(1.0, 0.0, 0.0),
            start_direction: Vec3::new(0.0, 2.0, 0.0),
            emit_time: 1.0,
            life_time: 10.0,
            ..Particle::default()
        };
        let pos = p.position_at(3.0, Vec3::new(0.0, -1.0, 0.0));
        // t = 2: y = 2*2 - 0.5*4 = 2
        assert!((pos - Vec3::new(1.0, 2.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_draw_age_wraps_when_looping() {
        let p = Particle {
            emit_time: 1.0,
            life_time: 2.0,
            ..Particle::default()
        };
        assert_eq!(p.draw_age(6.0, false), 5.0);
        assert_eq!(p.draw_age(6.0, true), 1.0);
        // Pre-warmed particles wrap into their life span
        assert_eq!(p.draw_age(0.5, true), 1.5);

        let hidden = Particle { active: 0.0, ..p };
        assert_eq!(hidden.draw_age(6.0, false), -1.0);
    }
}
