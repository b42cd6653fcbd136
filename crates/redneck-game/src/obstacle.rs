//! Roadside obstacles and the invisible track borders

use std::sync::Arc;

use redneck_engine::{Animation, Collidable, LoopMode, Point, Quad, Rectangle, SoundHandle, Sprite};

use crate::destroyer::Destroyer;
use crate::library::ObstacleType;

pub const OBSTACLE_DAMAGE: f32 = 10.0;
/// Damage left once an obstacle has been knocked over
pub const WRECKED_OBSTACLE_DAMAGE: f32 = 1.0;

#[derive(Debug)]
pub struct Obstacle {
    kind: ObstacleType,
    sprite: Sprite,
    hit: Animation,
    destroyed: bool,
    invincible: bool,
    damage: f32,
    hit_sound: Option<SoundHandle>,
}

impl Obstacle {
    pub fn new(kind: ObstacleType, undisturbed: Arc<Quad>, hit: Animation, hit_sound: Option<SoundHandle>) -> Self {
        Self {
            kind,
            sprite: Sprite::with_quad(kind.key(), undisturbed),
            hit,
            destroyed: false,
            invincible: kind.is_invincible(),
            damage: OBSTACLE_DAMAGE,
            hit_sound,
        }
    }

    pub fn kind(&self) -> ObstacleType {
        self.kind
    }

    pub fn sprite(&self) -> &Sprite {
        &self.sprite
    }

    pub fn sprite_mut(&mut self) -> &mut Sprite {
        &mut self.sprite
    }

    pub fn position(&self) -> Point {
        self.sprite.position()
    }

    pub fn set_position(&mut self, position: Point) {
        self.sprite.set_position(position);
    }

    pub fn is_invincible(&self) -> bool {
        self.invincible
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Play the knock-over animation. Invincible obstacles replay it on
    /// every hit and never count as destroyed.
    pub fn switch_to_hit_animation(&mut self) {
        let mut hit = self.hit.clone();
        hit.reset(LoopMode::PlayOnce);
        self.sprite.set_animation(hit);
        if !self.invincible {
            self.destroyed = true;
        }
    }

    pub fn play_hit_sound(&self) {
        if let Some(sound) = &self.hit_sound {
            sound.play();
        }
    }

    pub fn stop_sounds(&self) {
        if let Some(sound) = &self.hit_sound {
            sound.stop();
        }
    }
}

impl Destroyer for Obstacle {
    fn damage(&self) -> f32 {
        self.damage
    }

    fn set_damage(&mut self, damage: f32) {
        self.damage = damage;
    }
}

impl Collidable for Obstacle {
    fn bounding_rect(&self) -> Option<Rectangle> {
        self.sprite.bounding_rect()
    }
}

// ---------------------------------------------------------------------------
// Track borders
// ---------------------------------------------------------------------------

/// Width of the strip inside the screen edge that blocks trucks
const BORDER_INSET: f32 = 20.0;

/// Solid strip along one side of the track. Trucks are pushed back out of
/// it; it never reacts itself.
#[derive(Debug, Clone)]
pub struct TrackBorder {
    rect: Rectangle,
    damage: f32,
}

impl TrackBorder {
    pub fn new(rect: Rectangle) -> Self {
        tracing::debug!(
            "Creating track border {:.0},{:.0},{:.0},{:.0}",
            rect.left,
            rect.right,
            rect.top,
            rect.bottom
        );
        Self { rect, damage: 0.0 }
    }

    /// Left border for a track of `sections` screens
    pub fn left(screen_width: f32, screen_height: f32, sections: usize) -> Self {
        let half_w = screen_width / 2.0;
        let half_h = screen_height / 2.0;
        Self::new(Rectangle::new(
            -half_w - screen_width * 100.0,
            -half_w + BORDER_INSET,
            half_h + screen_height * sections as f32,
            -half_h,
        ))
    }

    pub fn right(screen_width: f32, screen_height: f32, sections: usize) -> Self {
        let half_w = screen_width / 2.0;
        let half_h = screen_height / 2.0;
        Self::new(Rectangle::new(
            half_w - BORDER_INSET,
            half_w + screen_width * 100.0,
            half_h + screen_height * sections as f32,
            -half_h,
        ))
    }
}

impl Destroyer for TrackBorder {
    fn damage(&self) -> f32 {
        self.damage
    }

    fn set_damage(&mut self, damage: f32) {
        self.damage = damage;
    }
}

impl Collidable for TrackBorder {
    fn bounding_rect(&self) -> Option<Rectangle> {
        Some(self.rect)
    }
}
