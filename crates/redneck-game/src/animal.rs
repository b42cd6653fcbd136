//! Roadside animals: wander across the road once the player gets close

use std::sync::Arc;

use redneck_engine::{Animation, Collidable, MoveAction, Point, Quad, Rectangle, SoundHandle, Sprite};

use crate::destroyer::Destroyer;
use crate::library::AnimalSpecies;

/// Horizontal speed in coordinates per second
pub const ANIMAL_SPEED: f32 = 70.0;
pub const ANIMAL_DAMAGE: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Left,
    Right,
}

#[derive(Debug)]
pub struct Animal {
    species: AnimalSpecies,
    sprite: Sprite,
    dead: Arc<Quad>,
    direction: MoveDirection,
    moving: bool,
    is_dead: bool,
    damage: f32,
    hit_sound: Option<SoundHandle>,
}

impl Animal {
    pub fn new(
        species: AnimalSpecies,
        alive: Animation,
        dead: Arc<Quad>,
        direction: MoveDirection,
        hit_sound: Option<SoundHandle>,
    ) -> Self {
        let mut sprite = Sprite::with_animation(species.key(), alive);
        // art faces right
        if direction == MoveDirection::Left {
            sprite.set_flip_x(true);
        }
        Self {
            species,
            sprite,
            dead,
            direction,
            moving: false,
            is_dead: false,
            damage: ANIMAL_DAMAGE,
            hit_sound,
        }
    }

    pub fn species(&self) -> AnimalSpecies {
        self.species
    }

    pub fn direction(&self) -> MoveDirection {
        self.direction
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

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    pub fn is_dead(&self) -> bool {
        self.is_dead
    }

    /// Start crossing. Dead animals stay put.
    pub fn start_moving(&mut self) {
        if self.moving || self.is_dead {
            return;
        }
        self.moving = true;
        let vx = match self.direction {
            MoveDirection::Right => ANIMAL_SPEED,
            MoveDirection::Left => -ANIMAL_SPEED,
        };
        self.sprite.set_action(Box::new(MoveAction::new(vx, 0.0)));
    }

    pub fn stop_moving(&mut self) {
        if !self.moving {
            return;
        }
        self.moving = false;
        self.sprite.clear_actions();
    }

    pub fn switch_to_dead(&mut self) {
        self.stop_moving();
        self.sprite.set_quad(self.dead.clone());
        self.is_dead = true;
        tracing::trace!("{} at {:?} is roadkill", self.sprite.name, self.position());
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

impl Destroyer for Animal {
    fn damage(&self) -> f32 {
        self.damage
    }

    fn set_damage(&mut self, damage: f32) {
        self.damage = damage;
    }
}

impl Collidable for Animal {
    fn bounding_rect(&self) -> Option<Rectangle> {
        self.sprite.bounding_rect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redneck_engine::{LoopMode, Size};

    fn critter(direction: MoveDirection) -> Animal {
        let frames = vec![Arc::new(Quad::solid("snake_alive_01", Size::new(40.0, 20.0)))];
        let dead = Arc::new(Quad::solid("snake_dead", Size::new(40.0, 20.0)));
        Animal::new(AnimalSpecies::Snake, Animation::new(frames, LoopMode::Loop, 15.0), dead, direction, None)
    }

    #[test]
    fn left_movers_are_mirrored() {
        assert!(critter(MoveDirection::Left).sprite().flip_x());
        assert!(!critter(MoveDirection::Right).sprite().flip_x());
    }

    #[test]
    fn moving_animal_crosses_at_constant_speed() {
        let mut a = critter(MoveDirection::Left);
        a.start_moving();
        a.sprite_mut().update(0.0, 2.0);
        assert!((a.position().x + 140.0).abs() < 0.001, "x={}", a.position().x);
        a.stop_moving();
        a.sprite_mut().update(2.0, 1.0);
        assert!((a.position().x + 140.0).abs() < 0.001);
    }

    #[test]
    fn dead_animals_never_move_again() {
        let mut a = critter(MoveDirection::Right);
        a.start_moving();
        a.switch_to_dead();
        assert!(a.is_dead());
        assert!(!a.is_moving());
        assert_eq!(a.sprite().current_quad().unwrap().name, "snake_dead");
        a.start_moving();
        assert!(!a.is_moving());
    }
}
