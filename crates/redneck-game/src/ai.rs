//! Computer drivers
//!
//! Every non-player truck gets a [`DrivingAi`]. All of them keep to the
//! road; opponents additionally ram trucks beside them and shoot, and the
//! police shadow the leader and fire warning shots at it.
//!
//! The AI sees other trucks only through [`TruckSnapshot`]s taken at the
//! start of the frame. Hits on other trucks come back as [`Strike`]s for
//! the race scene to apply.

use std::rc::Rc;

use rand::Rng;

use redneck_engine::{Collidable, EntityId, Point, Rectangle, Size};

use crate::controller::{TruckController, DEFAULT_MAX_SPEED};
use crate::road_bound::RoadBound;
use crate::truck::{AttachedSlot, Truck, TruckKind};

/// Side gap (in coordinates) within which an opponent swerves into a truck
pub const HIT_RANGE: f32 = 40.0;
const TRUCK_WIDTH_FACTOR: f32 = 1.6;
const MAX_TURNING_ACCURACY: f32 = 0.3;
/// Average seconds between shots once an opponent could fire
const SHOT_CHANCE_WINDOW: f32 = 5.0;
const POLICE_CATCH_UP_DISTANCE: f32 = 200.0;
const POLICE_FALL_BACK_DISTANCE: f32 = -120.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanePreference {
    Left,
    Right,
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behaviour {
    /// Only keeps to its lane
    Lane,
    Opponent,
    Police,
}

/// Read-only view of one truck at the start of the frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TruckSnapshot {
    pub id: EntityId,
    pub kind: TruckKind,
    pub rect: Rectangle,
    pub position: Point,
    pub size: Size,
}

impl TruckSnapshot {
    pub fn of(id: EntityId, truck: &Truck) -> Option<Self> {
        Some(Self {
            id,
            kind: truck.kind(),
            rect: truck.bounding_rect()?,
            position: truck.position(),
            size: truck.sprite().size(),
        })
    }
}

/// Damage an AI dealt to another truck this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strike {
    /// Shotgun hit: take `damage` and show sparks
    Shot { target: EntityId, damage: i32 },
    /// Police warning shot: sparks only
    Warning { target: EntityId },
}

impl Strike {
    pub fn target(&self) -> EntityId {
        match *self {
            Strike::Shot { target, .. } | Strike::Warning { target } => target,
        }
    }
}

#[derive(Debug)]
pub struct DrivingAi {
    controller: usize,
    road: Rc<RoadBound>,
    cursor: usize,
    preference: LanePreference,
    truck_width: f32,
    turning_accuracy: f32,
    turning_time: f32,
    behaviour: Behaviour,
    shoot: bool,
    interacted: bool,
}

impl DrivingAi {
    pub fn new<R: Rng>(
        controller: usize,
        truck: &Truck,
        road: Rc<RoadBound>,
        behaviour: Behaviour,
        rng: &mut R,
    ) -> Self {
        let width = truck.bounding_rect().map(|r| r.width()).unwrap_or_default();
        let turning_accuracy = rng.gen_range(0.0..MAX_TURNING_ACCURACY);
        tracing::debug!("{}: turning accuracy {:.3}", truck.name(), turning_accuracy);
        Self {
            controller,
            road,
            cursor: 0,
            preference: LanePreference::Random,
            truck_width: width * TRUCK_WIDTH_FACTOR,
            turning_accuracy,
            turning_time: 0.0,
            behaviour,
            shoot: false,
            interacted: false,
        }
    }

    pub fn with_preference(mut self, preference: LanePreference) -> Self {
        self.preference = preference;
        self
    }

    /// Index of the controller this AI drives
    pub fn controller_index(&self) -> usize {
        self.controller
    }

    pub fn behaviour(&self) -> Behaviour {
        self.behaviour
    }

    pub fn turning_accuracy(&self) -> f32 {
        self.turning_accuracy
    }

    pub fn has_interacted(&self) -> bool {
        self.interacted
    }

    /// One decision step. `others` holds every truck with a controller,
    /// the player first; the AI's own truck may be among them.
    pub fn update<R: Rng>(
        &mut self,
        dt: f32,
        own_id: EntityId,
        controller: &mut TruckController,
        truck: &mut Truck,
        others: &[TruckSnapshot],
        rng: &mut R,
    ) -> Vec<Strike> {
        let Some(rect) = truck.bounding_rect() else {
            return Vec::new();
        };
        self.stay_on_road(dt, &rect, controller, truck);

        let mut strikes = Vec::new();
        match self.behaviour {
            Behaviour::Lane => {}
            Behaviour::Opponent => {
                self.process_other_trucks(dt, &rect, own_id, controller, truck, others, rng, &mut strikes);
            }
            Behaviour::Police => {
                self.process_other_trucks(dt, &rect, own_id, controller, truck, others, rng, &mut strikes);
                self.attack_first_place(&rect, controller, truck, others, &mut strikes);
            }
        }
        strikes
    }

    // -----------------------------------------------------------------------
    // Lane keeping
    // -----------------------------------------------------------------------

    fn stay_on_road(&mut self, dt: f32, rect: &Rectangle, controller: &mut TruckController, truck: &mut Truck) {
        let road = Rc::clone(&self.road);
        while road.left_bound(self.cursor).y < rect.top && road.len() > self.cursor {
            self.cursor += 1;
        }

        let next = self.cursor + 1;
        let slowdown = ((road.left_bound(next).x - road.left_bound(self.cursor).x).abs() / 15.0).max(0.1);

        let (left_border, right_border) = match self.preference {
            LanePreference::Left => {
                let left = road.left_bound(next).x;
                let right = (left + road.right_bound(next).x) / 2.0;
                (left, right.max(left + self.truck_width))
            }
            LanePreference::Right => {
                let right = road.right_bound(next).x;
                let left = (right + road.left_bound(next).x) / 2.0;
                (left.min(right - self.truck_width), right)
            }
            LanePreference::Random => (road.left_bound(next).x, road.right_bound(next).x),
        };

        if truck.params.speed > DEFAULT_MAX_SPEED / slowdown {
            if !controller.is_braking() {
                controller.brake_down(truck);
            }
        } else {
            Self::release_brake(controller, truck);
        }

        self.turning_time += dt;
        if rect.left <= left_border {
            self.turning_time = 0.0;
            truck.set_input_right(true);
        } else if rect.right >= right_border {
            self.turning_time = 0.0;
            truck.set_input_left(true);
        } else if self.turning_time > self.turning_accuracy {
            truck.set_input_left(false);
            Self::release_brake(controller, truck);
        }
    }

    fn release_brake(controller: &mut TruckController, truck: &mut Truck) {
        if controller.is_braking() {
            controller.brake_up(truck);
        }
    }

    // -----------------------------------------------------------------------
    // Opponent behaviour
    // -----------------------------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    fn process_other_trucks<R: Rng>(
        &mut self,
        dt: f32,
        rect: &Rectangle,
        own_id: EntityId,
        controller: &mut TruckController,
        truck: &mut Truck,
        others: &[TruckSnapshot],
        rng: &mut R,
        strikes: &mut Vec<Strike>,
    ) {
        self.interacted = false;
        self.shoot = false;

        for other in others {
            if other.id == own_id {
                continue;
            }
            if !other.kind.is_civilian() {
                self.interact(dt, rect, &other.rect, controller, truck, rng);
            }
            if self.interacted {
                if self.shoot {
                    let damage = controller.shotgun().calculate_damage(truck.position(), other.position);
                    if damage > 0 {
                        strikes.push(Strike::Shot { target: other.id, damage });
                    }
                }
                break;
            }
        }

        if !self.interacted {
            controller.nitro_down(truck);
        }
    }

    fn interact<R: Rng>(
        &mut self,
        dt: f32,
        rect: &Rectangle,
        other: &Rectangle,
        controller: &mut TruckController,
        truck: &mut Truck,
        rng: &mut R,
    ) {
        if controller.is_destroyed() {
            return;
        }
        // without armor the truck stops ramming and only shoots
        if truck.params.armor <= 0.0 {
            self.try_shoot(dt, rect, other, controller, truck, rng);
            return;
        }

        let beside = !is_upper(rect, other) && !is_below(rect, other);
        if is_left(rect, other) && beside {
            if rect.left - other.right < HIT_RANGE {
                truck.set_input_left(true);
                self.interacted = true;
            }
        } else if is_right(rect, other) && beside {
            if other.left - rect.right < HIT_RANGE {
                truck.set_input_right(true);
                self.interacted = true;
            }
        } else {
            self.try_shoot(dt, rect, other, controller, truck, rng);
        }
    }

    fn try_shoot<R: Rng>(
        &mut self,
        dt: f32,
        rect: &Rectangle,
        other: &Rectangle,
        controller: &mut TruckController,
        truck: &mut Truck,
        rng: &mut R,
    ) {
        let gun = controller.shotgun();
        if gun.is_object_in_range(rect, other)
            && gun.is_ready_to_shoot()
            && rng.gen_range(0.0..SHOT_CHANCE_WINDOW) < dt
        {
            self.interacted = true;
            self.shoot = true;
            controller.shotgun_mut().shoot();
            truck.activate_attached_animation(AttachedSlot::ShotgunBlast, false);
        }
    }

    // -----------------------------------------------------------------------
    // Police behaviour
    // -----------------------------------------------------------------------

    fn attack_first_place(
        &mut self,
        rect: &Rectangle,
        controller: &mut TruckController,
        truck: &mut Truck,
        others: &[TruckSnapshot],
        strikes: &mut Vec<Strike>,
    ) {
        let Some(mut leader) = others.first() else {
            return;
        };
        for other in others {
            if other.kind.is_racer() && other.position.y > leader.position.y {
                leader = other;
            }
        }

        let gap = leader.position.y - truck.position().y;
        if gap > POLICE_CATCH_UP_DISTANCE {
            Self::release_brake(controller, truck);
        } else if gap < POLICE_FALL_BACK_DISTANCE {
            if !controller.is_braking() {
                controller.brake_down(truck);
            }
        } else if controller.shotgun().is_object_in_range(rect, &leader.rect)
            && controller.shotgun().is_ready_to_shoot()
        {
            controller.shotgun_mut().shoot();
            truck.activate_attached_animation(AttachedSlot::ShotgunBlast, false);
            strikes.push(Strike::Warning { target: leader.id });
        }
    }
}

fn is_below(rect: &Rectangle, other: &Rectangle) -> bool {
    rect.bottom > other.top
}

fn is_upper(rect: &Rectangle, other: &Rectangle) -> bool {
    rect.top < other.bottom
}

fn is_left(rect: &Rectangle, other: &Rectangle) -> bool {
    rect.left > other.right
}

fn is_right(rect: &Rectangle, other: &Rectangle) -> bool {
    rect.right < other.left
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::ControllerParams;
    use crate::library::{EffectType, GameLibrary, TruckColor};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const ROAD: &str = "1.0 1.0\n0 140 340\n200 140 340\n400 140 340\n600 140 340\n800 140 340\n";

    struct Rig {
        lib: GameLibrary,
        road: Rc<RoadBound>,
        rng: StdRng,
    }

    impl Rig {
        fn new() -> Self {
            let mut road = RoadBound::new(240.0, 400.0);
            road.load_road_section_border("straight", ROAD).unwrap();
            Self {
                lib: GameLibrary::load_for_race().unwrap(),
                road: Rc::new(road),
                rng: StdRng::seed_from_u64(7),
            }
        }

        fn driver(&mut self, truck: Truck, behaviour: Behaviour) -> (DrivingAi, TruckController, Truck) {
            let blow = self.lib.effect(EffectType::FireAndSmoke).unwrap();
            let mut controller = TruckController::new(EntityId(2), ControllerParams::DEFAULT, blow);
            let mut truck = truck;
            controller.start_race(&mut truck);
            controller.update(0.01, &mut truck);
            let ai = DrivingAi::new(1, &truck, Rc::clone(&self.road), behaviour, &mut self.rng);
            (ai, controller, truck)
        }
    }

    #[test]
    fn accuracy_and_width_come_from_the_truck() {
        let mut rig = Rig::new();
        let truck = rig.lib.opponent_truck(TruckColor::Black).unwrap();
        let (ai, _, _) = rig.driver(truck, Behaviour::Lane);
        assert!((0.0..0.3).contains(&ai.turning_accuracy()));
        assert!((ai.truck_width - 70.0 * 1.6).abs() < 0.001);
        assert_eq!(ai.controller_index(), 1);
    }

    #[test]
    fn steers_back_from_the_left_edge() {
        let mut rig = Rig::new();
        let mut truck = rig.lib.civil_car(TruckColor::Blue).unwrap();
        truck.set_position(Point::new(-220.0, 0.0));
        let (mut ai, mut c, mut truck) = rig.driver(truck, Behaviour::Lane);
        let mut rng = StdRng::seed_from_u64(1);
        ai.update(0.03, EntityId(2), &mut c, &mut truck, &[], &mut rng);
        assert!(truck.input_right());

        truck.set_position(Point::new(220.0, 0.0));
        ai.update(0.03, EntityId(2), &mut c, &mut truck, &[], &mut rng);
        assert!(truck.input_left());
    }

    #[test]
    fn right_lane_keeps_to_the_right_half() {
        let mut rig = Rig::new();
        let mut truck = rig.lib.civil_car(TruckColor::Green).unwrap();
        // well inside the road, but in the left half
        truck.set_position(Point::new(-40.0, 0.0));
        let (ai, mut c, mut truck) = rig.driver(truck, Behaviour::Lane);
        let mut ai = ai.with_preference(LanePreference::Right);
        let mut rng = StdRng::seed_from_u64(1);
        ai.update(0.03, EntityId(2), &mut c, &mut truck, &[], &mut rng);
        assert!(truck.input_right());
    }

    #[test]
    fn opponent_swerves_into_a_truck_alongside() {
        let mut rig = Rig::new();
        let mut truck = rig.lib.opponent_truck(TruckColor::Brown).unwrap();
        truck.set_position(Point::new(0.0, 100.0));
        let (mut ai, mut c, mut truck) = rig.driver(truck, Behaviour::Opponent);

        let mut player = rig.lib.player_truck().unwrap();
        player.set_position(Point::new(100.0, 100.0));
        let snaps = vec![
            TruckSnapshot::of(EntityId(1), &player).unwrap(),
            TruckSnapshot::of(EntityId(2), &truck).unwrap(),
        ];
        let mut rng = StdRng::seed_from_u64(3);
        let strikes = ai.update(0.03, EntityId(2), &mut c, &mut truck, &snaps, &mut rng);
        assert!(strikes.is_empty());
        assert!(ai.has_interacted());
        assert!(truck.input_right());
    }

    #[test]
    fn civil_cars_are_left_alone() {
        let mut rig = Rig::new();
        let mut truck = rig.lib.opponent_truck(TruckColor::Brown).unwrap();
        truck.set_position(Point::new(0.0, 100.0));
        let (mut ai, mut c, mut truck) = rig.driver(truck, Behaviour::Opponent);

        let mut car = rig.lib.civil_car(TruckColor::Yellow).unwrap();
        car.set_position(Point::new(90.0, 100.0));
        let snaps = vec![TruckSnapshot::of(EntityId(5), &car).unwrap()];
        let mut rng = StdRng::seed_from_u64(3);
        ai.update(0.03, EntityId(2), &mut c, &mut truck, &snaps, &mut rng);
        assert!(!ai.has_interacted());
    }

    #[test]
    fn armorless_opponent_eventually_shoots() {
        let mut rig = Rig::new();
        let mut truck = rig.lib.opponent_truck(TruckColor::Blue).unwrap();
        truck.set_position(Point::new(0.0, 100.0));
        let (mut ai, mut c, mut truck) = rig.driver(truck, Behaviour::Opponent);
        truck.params.armor = 0.0;

        let mut player = rig.lib.player_truck().unwrap();
        player.set_position(Point::new(60.0, 300.0));
        let snaps = vec![TruckSnapshot::of(EntityId(1), &player).unwrap()];

        let mut rng = StdRng::seed_from_u64(11);
        let mut shots = Vec::new();
        for _ in 0..2000 {
            shots.extend(ai.update(0.03, EntityId(2), &mut c, &mut truck, &snaps, &mut rng));
            c.shotgun_mut().update(0.03);
        }
        assert!(!shots.is_empty());
        // about 209 apart: inside half range, full damage
        assert_eq!(shots[0], Strike::Shot { target: EntityId(1), damage: 50 });
        assert!(c.shotgun().ammo() < crate::shotgun::START_AMMO);
    }

    #[test]
    fn police_shadow_the_leader() {
        let mut rig = Rig::new();
        let truck = rig.lib.police_truck().unwrap();
        let (mut ai, mut c, mut truck) = rig.driver(truck, Behaviour::Police);
        truck.set_position(Point::new(0.0, 0.0));

        // player alongside keeps the police busy ramming instead of shooting
        let mut player = rig.lib.player_truck().unwrap();
        player.set_position(Point::new(100.0, 0.0));
        let mut leader = rig.lib.opponent_truck(TruckColor::Black).unwrap();
        leader.set_position(Point::new(150.0, 150.0));
        let snaps = vec![
            TruckSnapshot::of(EntityId(1), &player).unwrap(),
            TruckSnapshot::of(EntityId(3), &leader).unwrap(),
        ];
        let mut rng = StdRng::seed_from_u64(5);
        let strikes = ai.update(0.03, EntityId(2), &mut c, &mut truck, &snaps, &mut rng);
        assert_eq!(strikes, vec![Strike::Warning { target: EntityId(3) }]);
        assert!(!c.shotgun().is_ready_to_shoot());

        // far behind the police: brake
        truck.set_position(Point::new(0.0, 400.0));
        ai.update(0.03, EntityId(2), &mut c, &mut truck, &snaps, &mut rng);
        assert!(c.is_braking());
    }
}
