//! Physics world: owns the bodies and advances them in time

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::body::Body;
use super::collision::{Contact, reflect_off_walls, resolve_pair};
use crate::settings::{ArenaSettings, BodySettings, Settings};

/// Counters describing what happened during one step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Bodies that touched a wall (counted once per pass)
    pub wall_hits: u32,
    /// Overlapping pairs that were resolved
    pub contacts: u32,
    /// Pairs with coincident centres, resolved along the fallback normal
    pub degenerate: u32,
}

impl std::ops::AddAssign for StepReport {
    fn add_assign(&mut self, other: Self) {
        self.wall_hits += other.wall_hits;
        self.contacts += other.contacts;
        self.degenerate += other.degenerate;
    }
}

/// Advance `bodies` by `dt` seconds inside a `width` x `height` arena.
///
/// Integrates positions, reflects off walls, resolves every overlapping pair
/// (O(n²), fine for the handful of bodies in the arena), then reflects off
/// walls again since separation may push a body past a wall.
pub fn step_bodies(bodies: &mut [Body], width: f32, height: f32, dt: f32) -> StepReport {
    let mut report = StepReport::default();

    for body in bodies.iter_mut() {
        body.pos += body.vel * dt;
        if reflect_off_walls(body, width, height) {
            report.wall_hits += 1;
        }
    }

    for j in 1..bodies.len() {
        let (head, tail) = bodies.split_at_mut(j);
        let b = &mut tail[0];
        for (i, a) in head.iter_mut().enumerate() {
            match resolve_pair(a, b) {
                Contact::Apart => {}
                Contact::Resolved { .. } => report.contacts += 1,
                Contact::Degenerate { overlap } => {
                    log::warn!(
                        "Bodies {} and {} share a centre (overlap {:.1}), separating along +x",
                        i,
                        j,
                        overlap
                    );
                    report.contacts += 1;
                    report.degenerate += 1;
                }
            }
        }
    }

    for body in bodies.iter_mut() {
        if reflect_off_walls(body, width, height) {
            report.wall_hits += 1;
        }
    }

    report
}

/// The arena and the bodies moving in it
#[derive(Debug, Clone)]
pub struct PhysicsWorld {
    arena: ArenaSettings,
    spawn: BodySettings,
    bodies: Vec<Body>,
    rng: Pcg32,
}

impl PhysicsWorld {
    /// Create a world and spawn `settings.bodies.count` random bodies
    pub fn new(settings: &Settings, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let bodies = (0..settings.bodies.count)
            .map(|_| Body::spawn(&mut rng, &settings.arena, &settings.bodies))
            .collect();

        log::info!(
            "Physics world {}x{} with {} bodies (seed {})",
            settings.arena.width,
            settings.arena.height,
            settings.bodies.count,
            seed
        );

        Self {
            arena: settings.arena,
            spawn: settings.bodies,
            bodies,
            rng,
        }
    }

    /// Create a world with explicit bodies
    pub fn with_bodies(arena: ArenaSettings, bodies: Vec<Body>) -> Self {
        Self {
            arena,
            spawn: BodySettings::default(),
            bodies,
            rng: Pcg32::seed_from_u64(0),
        }
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn width(&self) -> f32 {
        self.arena.width
    }

    pub fn height(&self) -> f32 {
        self.arena.height
    }

    /// Advance every body by `dt` seconds
    pub fn step(&mut self, dt: f32) -> StepReport {
        step_bodies(&mut self.bodies, self.arena.width, self.arena.height, dt)
    }

    /// Scatter all bodies to fresh positions with fresh velocities
    pub fn respawn(&mut self) {
        for body in &mut self.bodies {
            body.resample(&mut self.rng, &self.arena, self.spawn.max_speed);
        }
        log::debug!("Respawned {} bodies", self.bodies.len());
    }

    /// Sum of body momenta (unit mass)
    pub fn total_momentum(&self) -> glam::Vec2 {
        self.bodies.iter().map(Body::momentum).sum()
    }

    /// Sum of body kinetic energies (unit mass)
    pub fn total_kinetic_energy(&self) -> f32 {
        self.bodies.iter().map(Body::kinetic_energy).sum()
    }
}
