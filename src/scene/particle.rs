//! Celebration particles
//!
//! Short-lived points with linear motion and age-derived opacity. No
//! pooling; expired particles are pruned each frame and the oldest are
//! evicted first when the cap is reached.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::color::Color;

/// A short-lived point particle in world coordinates
#[derive(Debug, Clone)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub color: Color,
    pub size: f32,
    /// Lifetime in ms
    pub lifetime: f32,
    pub age: f32,
}

impl Particle {
    pub fn update(&mut self, dt: f32) {
        self.age += dt;
        self.position += self.velocity * (dt / 1000.0);
    }

    pub fn is_alive(&self) -> bool {
        self.age < self.lifetime
    }

    /// Opacity fades linearly with age
    pub fn alpha(&self) -> f32 {
        (1.0 - self.age / self.lifetime).max(0.0)
    }
}

/// Particle emitter participating in the scene tree
///
/// Supports continuous emission (`is_emitting` at `emission_rate`
/// particles/second, with fractional carry-over so no emission time is
/// lost across frames) and instantaneous `burst(n)`.
#[derive(Debug, Clone)]
pub struct ParticleEmitter {
    pub particles: Vec<Particle>,
    /// Particles per second while `is_emitting`
    pub emission_rate: f32,
    /// Lifetime of each spawned particle in ms
    pub particle_lifetime: f32,
    pub particle_color: Color,
    pub particle_size: f32,
    pub particle_speed: f32,
    /// Spread around `particle_speed`
    pub particle_speed_range: f32,
    pub emission_angle: f32,
    /// Spread around `emission_angle`; TAU emits in all directions
    pub emission_angle_range: f32,
    pub is_emitting: bool,
    /// Live-particle cap; oldest are evicted to make room
    pub max_particles: usize,
    /// World position particles spawn from (synced to the owning node)
    pub origin: Vec2,
    time_since_emit: f32,
    rng: Pcg32,
}

impl ParticleEmitter {
    pub fn new(seed: u64) -> Self {
        Self {
            particles: Vec::new(),
            emission_rate: 10.0,
            particle_lifetime: 1000.0,
            particle_color: Color::WHITE,
            particle_size: 10.0,
            particle_speed: 100.0,
            particle_speed_range: 50.0,
            emission_angle: 0.0,
            emission_angle_range: std::f32::consts::TAU,
            is_emitting: false,
            max_particles: 512,
            origin: Vec2::ZERO,
            time_since_emit: 0.0,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Advance all particles and run continuous emission
    pub fn update(&mut self, dt: f32) {
        for particle in &mut self.particles {
            particle.update(dt);
        }
        self.particles.retain(Particle::is_alive);

        if self.is_emitting && self.emission_rate > 0.0 {
            self.time_since_emit += dt;
            let emit_interval = 1000.0 / self.emission_rate;
            while self.time_since_emit >= emit_interval {
                self.emit_particle();
                self.time_since_emit -= emit_interval;
            }
        }
    }

    fn emit_particle(&mut self) {
        if self.max_particles == 0 {
            return;
        }
        if self.particles.len() >= self.max_particles {
            self.particles.remove(0);
        }
        let angle =
            self.emission_angle + (self.rng.random::<f32>() - 0.5) * self.emission_angle_range;
        let speed =
            self.particle_speed + (self.rng.random::<f32>() - 0.5) * self.particle_speed_range;
        self.particles.push(Particle {
            position: self.origin,
            velocity: Vec2::new(angle.cos(), angle.sin()) * speed,
            color: self.particle_color,
            size: self.particle_size,
            lifetime: self.particle_lifetime,
            age: 0.0,
        });
    }

    /// Emit `count` particles immediately
    pub fn burst(&mut self, count: usize) {
        for _ in 0..count {
            self.emit_particle();
        }
    }

    /// Uniform sample in `[0, 1)` from the emitter's own stream, for
    /// callers that jitter per-burst parameters
    pub fn jitter(&mut self) -> f32 {
        self.rng.random::<f32>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_spawns_count() {
        let mut emitter = ParticleEmitter::new(7);
        emitter.burst(12);
        assert_eq!(emitter.particles.len(), 12);
    }

    #[test]
    fn test_particles_expire_and_prune() {
        let mut emitter = ParticleEmitter::new(7);
        emitter.particle_lifetime = 100.0;
        emitter.burst(5);
        emitter.update(50.0);
        assert_eq!(emitter.particles.len(), 5);
        assert!(emitter.particles.iter().all(|p| p.alpha() < 1.0));
        emitter.update(60.0);
        assert!(emitter.particles.is_empty());
    }

    #[test]
    fn test_emission_carry_over() {
        let mut emitter = ParticleEmitter::new(7);
        emitter.is_emitting = true;
        emitter.emission_rate = 10.0; // one per 100ms
        emitter.particle_lifetime = 60_000.0;
        // 4 frames of 250ms each: 1000ms total must yield exactly 10,
        // even though 250 is not a multiple of the emit interval
        for _ in 0..4 {
            emitter.update(250.0);
        }
        assert_eq!(emitter.particles.len(), 10);
    }

    #[test]
    fn test_cap_evicts_oldest() {
        let mut emitter = ParticleEmitter::new(7);
        emitter.max_particles = 4;
        emitter.particle_lifetime = 60_000.0;
        emitter.burst(3);
        emitter.update(10.0);
        emitter.burst(3);
        assert_eq!(emitter.particles.len(), 4);
        // Two of the three aged particles were evicted to make room
        let old = emitter.particles.iter().filter(|p| p.age > 0.0).count();
        assert_eq!(old, 1);
    }

    #[test]
    fn test_particle_moves_by_velocity() {
        let mut p = Particle {
            position: Vec2::ZERO,
            velocity: Vec2::new(400.0, 0.0),
            color: Color::YELLOW,
            size: 18.0,
            lifetime: 600.0,
            age: 0.0,
        };
        p.update(500.0);
        assert!((p.position.x - 200.0).abs() < 1e-4);
    }
}
