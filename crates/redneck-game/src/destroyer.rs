//! Damage capacity shared by everything that can hurt a truck

pub trait Destroyer {
    fn damage(&self) -> f32;
    fn set_damage(&mut self, damage: f32);
}
