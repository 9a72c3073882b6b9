//! Rendering surface abstraction
//!
//! The scene painter only talks to this trait. Coordinates are arena pixels
//! with the origin at the top-left, y pointing down.

use glam::Vec2;

/// Straight-alpha RGBA
pub type Color = [f32; 4];

/// Something the render step can paint onto
pub trait Surface {
    fn clear(&mut self, color: Color);

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color);

    fn stroke_circle(&mut self, center: Vec2, radius: f32, width: f32, color: Color);

    fn line(&mut self, from: Vec2, to: Vec2, width: f32, color: Color);

    /// Text centered on `pos`
    fn text(&mut self, pos: Vec2, text: &str, size: f32, color: Color);

    /// Fading trail, oldest point first
    fn trail(&mut self, points: &[Vec2], radius: f32, color: Color) {
        let len = points.len() as f32;
        for (i, &p) in points.iter().enumerate() {
            let t = i as f32 / len;
            self.fill_circle(p, radius * (0.5 + 0.5 * t), with_alpha(color, color[3] * t));
        }
    }

    /// Soft halo behind a circle; surfaces without blur approximate it
    fn glow(&mut self, center: Vec2, radius: f32, intensity: f32, color: Color) {
        const LAYERS: u32 = 3;
        for i in (1..=LAYERS).rev() {
            let spread = radius + 20.0 * intensity * i as f32 / LAYERS as f32;
            let alpha = color[3] * intensity * 0.25 / i as f32;
            self.fill_circle(center, spread, [color[0], color[1], color[2], alpha]);
        }
    }
}

/// Same color with a different alpha
pub fn with_alpha(color: Color, alpha: f32) -> Color {
    [color[0], color[1], color[2], alpha.clamp(0.0, 1.0)]
}
