//! Rendering service seam
//!
//! The engine never talks to a GPU. Scenes describe what to draw through
//! [`RenderBackend`]; a platform layer turns that into pixels.

use std::sync::Arc;

use crate::animation::Quad;
use crate::geometry::{Point, Rectangle};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const RED: Color = Color::rgba(1.0, 0.0, 0.0, 1.0);
    pub const YELLOW: Color = Color::rgba(1.0, 1.0, 0.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }
}

/// One textured quad, positioned by its centre in world coordinates
#[derive(Debug, Clone)]
pub struct QuadDraw {
    pub quad: Arc<Quad>,
    pub center: Point,
    pub rotation: f32,
    pub flip_x: bool,
    pub flip_y: bool,
    pub scale_x: f32,
    pub scale_y: f32,
    pub z_order: i32,
}

pub trait RenderBackend {
    fn draw_quad(&mut self, draw: &QuadDraw);
    fn fill_rect(&mut self, rect: Rectangle, color: Color);
    fn draw_text(&mut self, text: &str, position: Point, size: f32, color: Color);
}

/// What a [`RecordingBackend`] saw during a frame
#[derive(Debug, Clone)]
pub enum DrawCommand {
    Quad(QuadDraw),
    Rect(Rectangle, Color),
    Text(String, Point),
}

/// Backend that only remembers the commands; used headless and in tests
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub commands: Vec<DrawCommand>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Names of the quads drawn, in draw order
    pub fn quad_names(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Quad(q) => Some(q.quad.name.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text(t, _) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl RenderBackend for RecordingBackend {
    fn draw_quad(&mut self, draw: &QuadDraw) {
        self.commands.push(DrawCommand::Quad(draw.clone()));
    }

    fn fill_rect(&mut self, rect: Rectangle, color: Color) {
        self.commands.push(DrawCommand::Rect(rect, color));
    }

    fn draw_text(&mut self, text: &str, position: Point, _size: f32, _color: Color) {
        self.commands.push(DrawCommand::Text(text.to_string(), position));
    }
}
