//! Collision detection and response for circles in a rectangular arena

use glam::Vec2;

/// Result of a wall check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallHit {
    /// Inward-facing normal of the wall(s) touched (summed at corners)
    pub normal: Vec2,
}

/// Strict circle overlap: touching exactly at the rims is not contact
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    a.distance(b) < ra + rb
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Elastic bounce against the arena walls
///
/// Clamps the circle back inside `[radius, size - radius]` and points the
/// offending velocity component back into the arena. Returns the wall normal
/// if any wall was touched.
pub fn bounce_in_arena(pos: &mut Vec2, vel: &mut Vec2, radius: f32, size: Vec2) -> Option<WallHit> {
    let mut normal = Vec2::ZERO;

    if pos.x < radius {
        pos.x = radius;
        normal.x = 1.0;
    } else if pos.x > size.x - radius {
        pos.x = size.x - radius;
        normal.x = -1.0;
    }

    if pos.y < radius {
        pos.y = radius;
        normal.y = 1.0;
    } else if pos.y > size.y - radius {
        pos.y = size.y - radius;
        normal.y = -1.0;
    }

    // Reflect per axis, only if moving toward that wall
    for axis_normal in [Vec2::new(normal.x, 0.0), Vec2::new(0.0, normal.y)] {
        if axis_normal != Vec2::ZERO && vel.dot(axis_normal) < 0.0 {
            *vel = reflect_velocity(*vel, axis_normal);
        }
    }

    (normal != Vec2::ZERO).then_some(WallHit { normal })
}
