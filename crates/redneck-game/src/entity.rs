//! Scene node type for a race
//!
//! The scene owns every race entity as one [`RaceEntity`]. Collision
//! dispatch matches on the variant the handler received, the same way
//! the scene only ever asks "what kind of thing is this".

use std::rc::Rc;

use redneck_engine::{Collidable, Collider, Contact, Point, Rectangle, RenderBackend, SceneNode, Sprite};

use crate::animal::Animal;
use crate::destroyer::Destroyer;
use crate::obstacle::{Obstacle, TrackBorder};
use crate::road_bound::RoadBound;
use crate::truck::Truck;

#[derive(Debug)]
pub enum RaceEntity {
    Truck(Box<Truck>),
    Animal(Animal),
    Obstacle(Obstacle),
    Border(TrackBorder),
    Road(Rc<RoadBound>),
    /// Backgrounds, finish line, exhaust flames
    Sprite(Sprite),
}

impl RaceEntity {
    pub fn truck(truck: Truck) -> Self {
        RaceEntity::Truck(Box::new(truck))
    }

    /// Damage this entity deals on contact, if it deals any
    pub fn destroyer(&self) -> Option<&dyn Destroyer> {
        match self {
            RaceEntity::Truck(t) => Some(&**t),
            RaceEntity::Animal(a) => Some(a),
            RaceEntity::Obstacle(o) => Some(o),
            RaceEntity::Border(b) => Some(b),
            RaceEntity::Road(_) | RaceEntity::Sprite(_) => None,
        }
    }

    pub fn as_truck(&self) -> Option<&Truck> {
        match self {
            RaceEntity::Truck(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_truck_mut(&mut self) -> Option<&mut Truck> {
        match self {
            RaceEntity::Truck(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_animal(&self) -> Option<&Animal> {
        match self {
            RaceEntity::Animal(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_animal_mut(&mut self) -> Option<&mut Animal> {
        match self {
            RaceEntity::Animal(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_obstacle(&self) -> Option<&Obstacle> {
        match self {
            RaceEntity::Obstacle(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_sprite(&self) -> Option<&Sprite> {
        match self {
            RaceEntity::Sprite(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sprite_mut(&mut self) -> Option<&mut Sprite> {
        match self {
            RaceEntity::Sprite(s) => Some(s),
            _ => None,
        }
    }

    /// Centre of the entity, when it has one
    pub fn position(&self) -> Option<Point> {
        match self {
            RaceEntity::Truck(t) => Some(t.position()),
            RaceEntity::Animal(a) => Some(a.position()),
            RaceEntity::Obstacle(o) => Some(o.position()),
            RaceEntity::Sprite(s) => Some(s.position()),
            RaceEntity::Border(_) | RaceEntity::Road(_) => None,
        }
    }

    /// Silence any sound the entity owns
    pub fn stop_sounds(&self) {
        match self {
            RaceEntity::Truck(t) => t.stop_sounds(),
            RaceEntity::Animal(a) => a.stop_sounds(),
            RaceEntity::Obstacle(o) => o.stop_sounds(),
            _ => {}
        }
    }
}

impl Collidable for RaceEntity {
    fn bounding_rect(&self) -> Option<Rectangle> {
        match self {
            RaceEntity::Truck(t) => t.bounding_rect(),
            RaceEntity::Animal(a) => a.bounding_rect(),
            RaceEntity::Obstacle(o) => o.bounding_rect(),
            RaceEntity::Border(b) => b.bounding_rect(),
            RaceEntity::Road(r) => r.bounding_rect(),
            RaceEntity::Sprite(s) => s.bounding_rect(),
        }
    }
}

impl Collider for RaceEntity {
    fn should_check_for_collision(&self) -> bool {
        matches!(self, RaceEntity::Truck(_) | RaceEntity::Animal(_) | RaceEntity::Obstacle(_))
    }

    /// Only trucks react. Animals and obstacles still claim the pair when
    /// they leave the sweep first, in which case nothing happens this frame.
    fn handle_collision(&mut self, other: &mut Self, contact: &mut Contact) {
        if let RaceEntity::Truck(truck) = self {
            truck.handle_collision(other, contact);
        }
    }
}

impl SceneNode for RaceEntity {
    fn update(&mut self, now: f32, dt: f32) {
        match self {
            RaceEntity::Truck(t) => t.update(now, dt),
            RaceEntity::Animal(a) => a.sprite_mut().update(now, dt),
            RaceEntity::Obstacle(o) => o.sprite_mut().update(now, dt),
            RaceEntity::Sprite(s) => s.update(now, dt),
            RaceEntity::Border(_) | RaceEntity::Road(_) => {}
        }
    }

    fn draw(&self, screen: &Rectangle, backend: &mut dyn RenderBackend) {
        match self {
            RaceEntity::Truck(t) => t.draw(screen, backend),
            RaceEntity::Animal(a) => a.sprite().draw(screen, backend),
            RaceEntity::Obstacle(o) => o.sprite().draw(screen, backend),
            RaceEntity::Sprite(s) => s.draw(screen, backend),
            RaceEntity::Border(_) | RaceEntity::Road(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::{GameLibrary, ObstacleType, TruckColor};
    use redneck_engine::{Scene, Size};

    #[test]
    fn truck_leaving_the_sweep_first_handles_the_hit() {
        let lib = GameLibrary::load_for_race().unwrap();
        let mut scene: Scene<RaceEntity> = Scene::new(Size::new(480.0, 800.0));

        let mut tree = lib.obstacle(ObstacleType::Tree).unwrap();
        tree.set_position(Point::new(0.0, 100.0));
        let tree_id = scene.add_collidable_child(RaceEntity::Obstacle(tree), 10);

        let mut truck = lib.opponent_truck(TruckColor::Black).unwrap();
        truck.set_position(Point::new(0.0, 0.0));
        let truck_id = scene.add_collidable_child(RaceEntity::truck(truck), 30);

        let report = scene.handle_collisions(0.0, 0.03);
        assert_eq!(report.handled, vec![(truck_id, tree_id)]);
        let tree = scene.get(tree_id).and_then(RaceEntity::as_obstacle).unwrap();
        assert!(tree.is_destroyed());
        let truck = scene.get(truck_id).and_then(RaceEntity::as_truck).unwrap();
        assert!(truck.params.armor < 700.0);
    }

    #[test]
    fn obstacle_leaving_first_claims_the_pair() {
        let lib = GameLibrary::load_for_race().unwrap();
        let mut scene: Scene<RaceEntity> = Scene::new(Size::new(480.0, 800.0));

        let mut truck = lib.opponent_truck(TruckColor::Black).unwrap();
        truck.set_position(Point::new(0.0, 100.0));
        let truck_id = scene.add_collidable_child(RaceEntity::truck(truck), 30);
        let mut shrub = lib.obstacle(ObstacleType::Shrub).unwrap();
        shrub.set_position(Point::new(0.0, 30.0));
        let shrub_id = scene.add_collidable_child(RaceEntity::Obstacle(shrub), 10);

        let report = scene.handle_collisions(0.0, 0.03);
        assert_eq!(report.handled, vec![(shrub_id, truck_id)]);
        let shrub = scene.get(shrub_id).and_then(RaceEntity::as_obstacle).unwrap();
        assert!(!shrub.is_destroyed());
    }

    #[test]
    fn only_living_things_check() {
        let lib = GameLibrary::load_for_race().unwrap();
        let border = RaceEntity::Border(TrackBorder::left(480.0, 800.0, 4));
        let sprite = RaceEntity::Sprite(lib.finish_line().unwrap());
        let truck = RaceEntity::truck(lib.police_truck().unwrap());
        assert!(!border.should_check_for_collision());
        assert!(!sprite.should_check_for_collision());
        assert!(truck.should_check_for_collision());
        assert!(sprite.destroyer().is_none());
        assert_eq!(border.destroyer().map(|d| d.damage()), Some(0.0));
        assert!(border.position().is_none());
    }
}
