//! Collision detection and response for circular bodies
//!
//! Two kinds of contact are handled:
//! - Body vs arena wall: reflect the offending velocity component and clamp
//!   the body back inside.
//! - Body vs body: push the pair apart along the line of centres, then swap
//!   their normal velocity components (equal-mass elastic collision).

use glam::Vec2;

use super::body::Body;

/// Centre distance below which the line of centres is considered undefined
pub const COINCIDENT_EPSILON: f32 = 1.0e-4;

/// Normal used when two centres coincide
pub const FALLBACK_NORMAL: Vec2 = Vec2::X;

/// Outcome of resolving one pair of bodies
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Contact {
    /// Bodies do not overlap
    Apart,
    /// Bodies overlapped and were separated
    Resolved {
        /// Unit vector from the first body's centre toward the second's
        normal: Vec2,
        /// Penetration depth before separation
        overlap: f32,
    },
    /// Centres coincided; resolved along [`FALLBACK_NORMAL`]
    Degenerate { overlap: f32 },
}

impl Contact {
    pub fn hit(&self) -> bool {
        !matches!(self, Contact::Apart)
    }
}

/// Check and resolve overlap between two bodies.
///
/// After resolution the centre distance equals the sum of radii and the
/// normal velocity components are exchanged. Tangential components are
/// untouched, so momentum and kinetic energy are conserved.
pub fn resolve_pair(a: &mut Body, b: &mut Body) -> Contact {
    let delta = b.pos - a.pos;
    let min_dist = a.radius + b.radius;
    let dist_sq = delta.length_squared();

    if dist_sq >= min_dist * min_dist {
        return Contact::Apart;
    }

    let dist = dist_sq.sqrt();
    let overlap = min_dist - dist;
    let (normal, contact) = if dist < COINCIDENT_EPSILON {
        (FALLBACK_NORMAL, Contact::Degenerate { overlap })
    } else {
        let normal = delta / dist;
        (normal, Contact::Resolved { normal, overlap })
    };

    // Separate: each body moves half the overlap
    let push = normal * (overlap / 2.0);
    a.pos -= push;
    b.pos += push;

    exchange_normal_velocity(a, b, normal);

    contact
}

/// Swap the velocity components along `normal`, keeping tangential ones
fn exchange_normal_velocity(a: &mut Body, b: &mut Body, normal: Vec2) {
    let tangent = normal.perp();

    let (a_n, a_t) = (a.vel.dot(normal), a.vel.dot(tangent));
    let (b_n, b_t) = (b.vel.dot(normal), b.vel.dot(tangent));

    a.vel = normal * b_n + tangent * a_t;
    b.vel = normal * a_n + tangent * b_t;
}

/// Reflect a body off the arena walls.
///
/// Each axis is handled independently: if the circle touches or crosses a
/// wall, its centre is clamped so the edge lies on the wall and the velocity
/// component pointing out of the arena is negated. Returns true if any wall
/// was touched.
pub fn reflect_off_walls(body: &mut Body, width: f32, height: f32) -> bool {
    let hit_x = reflect_axis(&mut body.pos.x, &mut body.vel.x, body.radius, width);
    let hit_y = reflect_axis(&mut body.pos.y, &mut body.vel.y, body.radius, height);
    hit_x || hit_y
}

fn reflect_axis(pos: &mut f32, vel: &mut f32, radius: f32, extent: f32) -> bool {
    if *pos - radius <= 0.0 {
        *pos = radius;
        if *vel < 0.0 {
            *vel = -*vel;
        }
        true
    } else if *pos + radius >= extent {
        *pos = extent - radius;
        if *vel > 0.0 {
            *vel = -*vel;
        }
        true
    } else {
        false
    }
}
