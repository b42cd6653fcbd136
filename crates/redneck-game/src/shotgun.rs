//! Truck-mounted shotgun

use redneck_engine::{Point, Rectangle};

use crate::destroyer::Destroyer;

pub const SHOT_RANGE: f32 = 500.0;
/// Seconds between shots
pub const RELOAD_TIME: f32 = 1.5;
pub const SHOT_DAMAGE: f32 = 50.0;
pub const START_AMMO: u32 = 200;

#[derive(Debug, Clone)]
pub struct ShotGun {
    range: f32,
    reload_time: f32,
    /// Time since the last shot. Starts well past the reload time.
    elapsed: f32,
    ammo: u32,
    damage: f32,
}

impl Default for ShotGun {
    fn default() -> Self {
        Self::new()
    }
}

impl ShotGun {
    pub fn new() -> Self {
        Self {
            range: SHOT_RANGE,
            reload_time: RELOAD_TIME,
            elapsed: 11.0,
            ammo: START_AMMO,
            damage: SHOT_DAMAGE,
        }
    }

    /// Fire if there is ammo left; restarts the reload timer
    pub fn shoot(&mut self) {
        if self.ammo > 0 {
            self.elapsed = 0.0;
            self.ammo -= 1;
        }
    }

    pub fn is_ready_to_shoot(&self) -> bool {
        self.elapsed > self.reload_time
    }

    pub fn update(&mut self, dt: f32) {
        self.elapsed += dt;
    }

    pub fn ammo(&self) -> u32 {
        self.ammo
    }

    pub fn is_object_in_range(&self, shooter: &Rectangle, target: &Rectangle) -> bool {
        shooter.center().distance(target.center()) <= self.range
    }

    /// Full damage up to half range, then linear falloff to zero at range
    pub fn calculate_damage(&self, from: Point, to: Point) -> i32 {
        let dist = from.distance(to);
        let half = self.range / 2.0;
        let mult = if dist <= half {
            1.0
        } else if dist <= self.range {
            -dist / half + 2.0
        } else {
            0.0
        };
        (mult * self.damage) as i32
    }
}

impl Destroyer for ShotGun {
    fn damage(&self) -> f32 {
        self.damage
    }

    fn set_damage(&mut self, damage: f32) {
        self.damage = damage;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damage_falls_off_with_distance() {
        let gun = ShotGun::new();
        let origin = Point::new(0.0, 0.0);
        let cases: [(f32, i32); 5] = [
            (0.0, 50),
            (250.0, 50),
            (375.0, 25),
            (500.0, 0),
            (501.0, 0),
        ];
        for (dist, expected) in cases {
            assert_eq!(gun.calculate_damage(origin, Point::new(0.0, dist)), expected, "dist={}", dist);
        }
    }

    #[test]
    fn reload_cycle() {
        let mut gun = ShotGun::new();
        assert!(gun.is_ready_to_shoot());
        gun.shoot();
        assert_eq!(gun.ammo(), START_AMMO - 1);
        assert!(!gun.is_ready_to_shoot());
        gun.update(1.5);
        assert!(!gun.is_ready_to_shoot(), "needs strictly more than the reload time");
        gun.update(0.01);
        assert!(gun.is_ready_to_shoot());
    }

    #[test]
    fn empty_gun_does_not_reset_timer() {
        let mut gun = ShotGun::new();
        for _ in 0..START_AMMO {
            gun.shoot();
        }
        assert_eq!(gun.ammo(), 0);
        gun.update(2.0);
        gun.shoot();
        assert_eq!(gun.ammo(), 0);
        assert!(gun.is_ready_to_shoot());
    }

    #[test]
    fn range_uses_centres() {
        let gun = ShotGun::new();
        let a = Rectangle::new(-10.0, 10.0, 10.0, -10.0);
        let near = a.translated(0.0, 500.0);
        let far = a.translated(0.0, 500.5);
        assert!(gun.is_object_in_range(&a, &near));
        assert!(!gun.is_object_in_range(&a, &far));
    }
}
