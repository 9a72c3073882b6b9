//! Shape generation for 2D primitives

use glam::Vec2;
use std::f32::consts::PI;

use super::vertex::Vertex;

/// Generate vertices for a filled circle
pub fn circle(center: Vec2, radius: f32, color: [f32; 4], segments: u32) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity((segments * 3) as usize);

    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * 2.0 * PI;
        let theta2 = ((i + 1) as f32 / segments as f32) * 2.0 * PI;

        // Triangle from center to edge
        vertices.push(Vertex::new(center.x, center.y, color));
        vertices.push(Vertex::new(
            center.x + radius * theta1.cos(),
            center.y + radius * theta1.sin(),
            color,
        ));
        vertices.push(Vertex::new(
            center.x + radius * theta2.cos(),
            center.y + radius * theta2.sin(),
            color,
        ));
    }

    vertices
}

/// Generate vertices for a ring (hollow circle)
pub fn ring(center: Vec2, inner_radius: f32, outer_radius: f32, color: [f32; 4], segments: u32) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity((segments * 6) as usize);

    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * 2.0 * PI;
        let theta2 = ((i + 1) as f32 / segments as f32) * 2.0 * PI;

        let dir1 = Vec2::new(theta1.cos(), theta1.sin());
        let dir2 = Vec2::new(theta2.cos(), theta2.sin());
        let inner1 = center + dir1 * inner_radius;
        let outer1 = center + dir1 * outer_radius;
        let inner2 = center + dir2 * inner_radius;
        let outer2 = center + dir2 * outer_radius;

        quad(&mut vertices, [inner1, outer1, inner2, outer2], [color; 4]);
    }

    vertices
}

/// Generate vertices for a straight line of the given width
pub fn line(from: Vec2, to: Vec2, width: f32, color: [f32; 4]) -> Vec<Vertex> {
    let dir = (to - from).normalize_or_zero();
    if dir == Vec2::ZERO {
        return Vec::new();
    }
    let perp = Vec2::new(-dir.y, dir.x) * (width * 0.5);

    let mut vertices = Vec::with_capacity(6);
    quad(&mut vertices, [from + perp, from - perp, to + perp, to - perp], [color; 4]);
    vertices
}

/// Generate vertices for a tapered trail, oldest point first
///
/// Alpha and width grow toward the newest point.
pub fn trail(points: &[Vec2], radius: f32, color: [f32; 4]) -> Vec<Vertex> {
    if points.len() < 2 {
        return Vec::new();
    }

    let mut vertices = Vec::with_capacity(points.len() * 6);
    let len = points.len() as f32;

    for i in 0..points.len() - 1 {
        let p1 = points[i];
        let p2 = points[i + 1];

        let t1 = i as f32 / len;
        let t2 = (i + 1) as f32 / len;

        let c1 = [color[0], color[1], color[2], color[3] * t1];
        let c2 = [color[0], color[1], color[2], color[3] * t2];

        let w1 = radius * (0.5 + 0.5 * t1);
        let w2 = radius * (0.5 + 0.5 * t2);

        let dir = (p2 - p1).normalize_or_zero();
        if dir == Vec2::ZERO {
            continue;
        }
        let perp = Vec2::new(-dir.y, dir.x);

        quad(
            &mut vertices,
            [p1 + perp * w1, p1 - perp * w1, p2 + perp * w2, p2 - perp * w2],
            [c1, c1, c2, c2],
        );
    }

    vertices
}

/// Two triangles: (a, b, c) and (c, b, d)
fn quad(out: &mut Vec<Vertex>, [a, b, c, d]: [Vec2; 4], [ca, cb, cc, cd]: [[f32; 4]; 4]) {
    out.push(Vertex::new(a.x, a.y, ca));
    out.push(Vertex::new(b.x, b.y, cb));
    out.push(Vertex::new(c.x, c.y, cc));

    out.push(Vertex::new(c.x, c.y, cc));
    out.push(Vertex::new(b.x, b.y, cb));
    out.push(Vertex::new(d.x, d.y, cd));
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: [f32; 4] = [1.0; 4];

    #[test]
    fn test_circle_vertex_count() {
        let verts = circle(Vec2::new(10.0, 10.0), 5.0, WHITE, 16);
        assert_eq!(verts.len(), 48);
        for v in &verts {
            let d = Vec2::from(v.position).distance(Vec2::new(10.0, 10.0));
            assert!(d <= 5.0 + 1e-4);
        }
    }

    #[test]
    fn test_ring_stays_in_band() {
        let verts = ring(Vec2::ZERO, 8.0, 10.0, WHITE, 12);
        assert_eq!(verts.len(), 72);
        for v in &verts {
            let d = Vec2::from(v.position).length();
            assert!((8.0 - 1e-4..=10.0 + 1e-4).contains(&d));
        }
    }

    #[test]
    fn test_degenerate_line_is_empty() {
        assert!(line(Vec2::ONE, Vec2::ONE, 2.0, WHITE).is_empty());
        assert_eq!(line(Vec2::ZERO, Vec2::X, 2.0, WHITE).len(), 6);
    }

    #[test]
    fn test_trail_fades_toward_tail() {
        let points: Vec<Vec2> = (0..5).map(|i| Vec2::new(i as f32 * 10.0, 0.0)).collect();
        let verts = trail(&points, 10.0, WHITE);
        assert_eq!(verts.len(), 4 * 6);
        assert_eq!(verts[0].color[3], 0.0);
        assert!(verts.last().unwrap().color[3] > verts[0].color[3]);
        assert!(trail(&points[..1], 10.0, WHITE).is_empty());
    }
}
