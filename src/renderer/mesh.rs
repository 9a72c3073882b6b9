//! CPU tessellation surface
//!
//! Collects triangles for the wgpu pipeline. Text is limited to what the
//! scene paints (countdown digits, "+1"), drawn with a seven-segment stroke
//! font; characters outside it leave a blank cell.

use glam::Vec2;

use super::shapes;
use super::surface::{Color, Surface};
use super::vertex::Vertex;

#[derive(Debug, Clone)]
pub struct MeshSurface {
    pub vertices: Vec<Vertex>,
    pub clear_color: Color,
    segments: u32,
}

impl MeshSurface {
    pub fn new(segments: u32) -> Self {
        Self {
            vertices: Vec::new(),
            clear_color: [0.0, 0.0, 0.0, 1.0],
            segments: segments.max(6),
        }
    }

    fn glyph(&mut self, ch: char, origin: Vec2, size: f32, color: Color) {
        let Some(mask) = segment_mask(ch) else {
            return;
        };
        let w = size * 0.5;
        let h = size;
        let stroke = (size * 0.12).max(1.0);
        // Segment endpoints in a w x h box, top-left origin
        let ends = [
            (Vec2::new(0.0, 0.0), Vec2::new(w, 0.0)),
            (Vec2::new(w, 0.0), Vec2::new(w, h * 0.5)),
            (Vec2::new(w, h * 0.5), Vec2::new(w, h)),
            (Vec2::new(0.0, h), Vec2::new(w, h)),
            (Vec2::new(0.0, h * 0.5), Vec2::new(0.0, h)),
            (Vec2::new(0.0, 0.0), Vec2::new(0.0, h * 0.5)),
            (Vec2::new(0.0, h * 0.5), Vec2::new(w, h * 0.5)),
            // Vertical bar of '+'
            (Vec2::new(w * 0.5, h * 0.25), Vec2::new(w * 0.5, h * 0.75)),
        ];
        for (bit, (a, b)) in ends.iter().enumerate() {
            if mask & (1 << bit) != 0 {
                self.line(origin + *a, origin + *b, stroke, color);
            }
        }
    }
}

/// Bits 0-6 are segments a-g, bit 7 the plus bar
fn segment_mask(ch: char) -> Option<u8> {
    Some(match ch {
        '0' => 0b0011_1111,
        '1' => 0b0000_0110,
        '2' => 0b0101_1011,
        '3' => 0b0100_1111,
        '4' => 0b0110_0110,
        '5' => 0b0110_1101,
        '6' => 0b0111_1101,
        '7' => 0b0000_0111,
        '8' => 0b0111_1111,
        '9' => 0b0110_1111,
        '-' => 0b0100_0000,
        '+' => 0b1100_0000,
        ' ' => 0,
        _ => return None,
    })
}

impl Surface for MeshSurface {
    fn clear(&mut self, color: Color) {
        self.vertices.clear();
        self.clear_color = color;
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        self.vertices
            .extend(shapes::circle(center, radius, color, self.segments));
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, width: f32, color: Color) {
        let half = width * 0.5;
        self.vertices.extend(shapes::ring(
            center,
            (radius - half).max(0.0),
            radius + half,
            color,
            self.segments * 2,
        ));
    }

    fn line(&mut self, from: Vec2, to: Vec2, width: f32, color: Color) {
        self.vertices.extend(shapes::line(from, to, width, color));
    }

    fn text(&mut self, pos: Vec2, text: &str, size: f32, color: Color) {
        let advance = size * 0.75;
        let width = advance * text.chars().count() as f32 - size * 0.25;
        let mut origin = pos - Vec2::new(width * 0.5, size * 0.5);
        for ch in text.chars() {
            self.glyph(ch, origin, size, color);
            origin.x += advance;
        }
    }

    fn trail(&mut self, points: &[Vec2], radius: f32, color: Color) {
        self.vertices.extend(shapes::trail(points, radius, color));
    }
}
