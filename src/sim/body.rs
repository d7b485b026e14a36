//! Circular bodies moving in the arena

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::settings::{ArenaSettings, BodySettings};

/// A moving circle. All bodies have equal (unit) mass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
}

impl Body {
    pub fn new(pos: Vec2, vel: Vec2, radius: f32) -> Self {
        Self { pos, vel, radius }
    }

    /// Spawn a body with a random radius, placement and velocity.
    ///
    /// The full circle is placed inside the arena. Radius and velocity
    /// components are whole numbers of pixels (per second).
    pub fn spawn<R: Rng + ?Sized>(
        rng: &mut R,
        arena: &ArenaSettings,
        bodies: &BodySettings,
    ) -> Self {
        let radius = rng.random_range(bodies.min_radius..=bodies.max_radius) as f32;
        let mut body = Self::new(Vec2::ZERO, Vec2::ZERO, radius);
        body.resample(rng, arena, bodies.max_speed);
        body
    }

    /// Pick a fresh position and velocity, keeping the radius
    pub fn resample<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        arena: &ArenaSettings,
        max_speed: i32,
    ) {
        self.pos = Vec2::new(
            sample_center(rng, self.radius, arena.width),
            sample_center(rng, self.radius, arena.height),
        );
        self.vel = Vec2::new(
            rng.random_range(-max_speed..=max_speed) as f32,
            rng.random_range(-max_speed..=max_speed) as f32,
        );
    }

    /// Whether the whole circle lies within [0, width] x [0, height]
    pub fn is_inside(&self, width: f32, height: f32) -> bool {
        self.pos.x - self.radius >= 0.0
            && self.pos.x + self.radius <= width
            && self.pos.y - self.radius >= 0.0
            && self.pos.y + self.radius <= height
    }

    /// Linear momentum (unit mass)
    #[inline]
    pub fn momentum(&self) -> Vec2 {
        self.vel
    }

    /// Kinetic energy (unit mass)
    #[inline]
    pub fn kinetic_energy(&self) -> f32 {
        0.5 * self.vel.length_squared()
    }
}

/// Centre coordinate keeping a circle of `radius` inside [0, extent]
fn sample_center<R: Rng + ?Sized>(rng: &mut R, radius: f32, extent: f32) -> f32 {
    let (lo, hi) = (radius, extent - radius);
    if hi <= lo {
        // Body exactly spans the axis
        return extent / 2.0;
    }
    rng.random_range(lo..=hi)
}
