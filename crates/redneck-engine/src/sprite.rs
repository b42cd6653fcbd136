//! Sprite: a drawable showing either a static quad or an animation
//!
//! The collision bound is the quad's non-transparent area, not the full
//! frame, so trucks and obstacles only collide where they are painted.

use std::sync::Arc;

use crate::action::Action;
use crate::animation::{Animation, LoopMode, Quad};
use crate::collider::{Collidable, Collider};
use crate::drawable::{Drawable, PositionInterpretation};
use crate::geometry::{Point, Rectangle, Size};
use crate::render::{QuadDraw, RenderBackend};

/// Exactly one visual is attached at a time
#[derive(Debug, Clone)]
pub enum Visual {
    Quad(Arc<Quad>),
    Animation(Animation),
}

#[derive(Debug)]
pub struct Sprite {
    pub name: String,
    drawable: Drawable,
    visual: Visual,
    flip_x: bool,
    flip_y: bool,
    pub scale_x: f32,
    pub scale_y: f32,
    /// Hide play-once animations when they end
    pub hide_when_finished: bool,
    bound: Option<Rectangle>,
}

impl Sprite {
    pub fn with_quad(name: &str, quad: Arc<Quad>) -> Self {
        Self::build(name, Visual::Quad(quad))
    }

    pub fn with_animation(name: &str, animation: Animation) -> Self {
        Self::build(name, Visual::Animation(animation))
    }

    fn build(name: &str, visual: Visual) -> Self {
        let mut sprite = Self {
            name: name.to_string(),
            drawable: Drawable::new(),
            visual,
            flip_x: false,
            flip_y: false,
            scale_x: 1.0,
            scale_y: 1.0,
            hide_when_finished: false,
            bound: None,
        };
        sprite.update_bound();
        sprite
    }

    // -----------------------------------------------------------------------
    // Visual
    // -----------------------------------------------------------------------

    pub fn set_quad(&mut self, quad: Arc<Quad>) {
        self.visual = Visual::Quad(quad);
        self.update_bound();
    }

    /// Attach an animation, carrying over the current flip state
    pub fn set_animation(&mut self, mut animation: Animation) {
        animation.flip_x = self.flip_x;
        animation.flip_y = self.flip_y;
        self.visual = Visual::Animation(animation);
        self.update_bound();
    }

    pub fn visual(&self) -> &Visual {
        &self.visual
    }

    pub fn animation(&self) -> Option<&Animation> {
        match &self.visual {
            Visual::Animation(a) => Some(a),
            Visual::Quad(_) => None,
        }
    }

    pub fn animation_mut(&mut self) -> Option<&mut Animation> {
        match &mut self.visual {
            Visual::Animation(a) => Some(a),
            Visual::Quad(_) => None,
        }
    }

    /// Restart the attached animation if it had finished
    pub fn reset_animation(&mut self, mode: LoopMode) {
        if let Some(a) = self.animation_mut() {
            a.reset(mode);
        }
        self.drawable.visible = true;
    }

    /// Quad shown right now
    pub fn current_quad(&self) -> Option<&Arc<Quad>> {
        match &self.visual {
            Visual::Quad(q) => Some(q),
            Visual::Animation(a) => a.current_quad(),
        }
    }

    pub fn set_flip_x(&mut self, flip: bool) {
        self.flip_x = flip;
        if let Some(a) = self.animation_mut() {
            a.flip_x = flip;
        }
    }

    pub fn set_flip_y(&mut self, flip: bool) {
        self.flip_y = flip;
        if let Some(a) = self.animation_mut() {
            a.flip_y = flip;
        }
    }

    pub fn flip_x(&self) -> bool {
        self.flip_x
    }

    pub fn size(&self) -> Size {
        self.current_quad().map(|q| q.size).unwrap_or_default()
    }

    // -----------------------------------------------------------------------
    // Drawable passthrough
    // -----------------------------------------------------------------------

    pub fn drawable(&self) -> &Drawable {
        &self.drawable
    }

    pub fn drawable_mut(&mut self) -> &mut Drawable {
        &mut self.drawable
    }

    pub fn position(&self) -> Point {
        self.drawable.position()
    }

    pub fn set_position(&mut self, position: Point) {
        self.drawable.set_position(position);
        self.update_bound();
    }

    pub fn rotation(&self) -> f32 {
        self.drawable.rotation()
    }

    pub fn set_rotation(&mut self, degrees: f32) {
        self.drawable.set_rotation(degrees);
    }

    pub fn set_interpretation(&mut self, interpretation: PositionInterpretation) {
        self.drawable.interpretation = interpretation;
    }

    pub fn set_action(&mut self, action: Box<dyn Action>) {
        self.drawable.set_action(action);
    }

    pub fn add_action(&mut self, action: Box<dyn Action>) {
        self.drawable.add_action(action);
    }

    pub fn clear_actions(&mut self) {
        self.drawable.clear_actions();
    }

    pub fn is_visible(&self) -> bool {
        self.drawable.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.drawable.visible = visible;
    }

    /// Full frame rectangle centred on the position
    pub fn image_rect(&self) -> Rectangle {
        Rectangle::make_centered_on(self.position(), self.size())
    }

    // -----------------------------------------------------------------------
    // Frame
    // -----------------------------------------------------------------------

    pub fn update(&mut self, now: f32, dt: f32) {
        self.drawable.update(now, dt);
        if let Visual::Animation(a) = &mut self.visual {
            a.update(dt);
            if self.hide_when_finished && a.is_finished() && a.mode() == LoopMode::PlayOnce {
                self.drawable.visible = false;
            }
        }
        self.update_bound();
    }

    /// Draw unless hidden or entirely off `screen`
    pub fn draw(&self, screen: &Rectangle, backend: &mut dyn RenderBackend) {
        if !self.drawable.visible {
            return;
        }
        let Some(quad) = self.current_quad() else {
            return;
        };
        let center = self.drawable.resolved_position(screen);
        if !screen.intersecting(&Rectangle::make_centered_on(center, quad.size)) {
            return;
        }
        let (scale_x, scale_y) = match &self.visual {
            Visual::Animation(a) => (a.scale_x * self.scale_x, a.scale_y * self.scale_y),
            Visual::Quad(_) => (self.scale_x, self.scale_y),
        };
        backend.draw_quad(&QuadDraw {
            quad: quad.clone(),
            center,
            rotation: self.drawable.rotation(),
            flip_x: self.flip_x,
            flip_y: self.flip_y,
            scale_x,
            scale_y,
            z_order: self.drawable.z_order,
        });
    }

    fn update_bound(&mut self) {
        self.bound = self.current_quad().map(|q| {
            let image = Rectangle::make_centered_on(self.drawable.position(), q.size);
            Rectangle::make_centered_on(q.real_center, q.real_size).translated(image.left, image.bottom)
        });
    }
}

impl Collidable for Sprite {
    fn bounding_rect(&self) -> Option<Rectangle> {
        self.bound
    }
}

impl Collider for Sprite {}
