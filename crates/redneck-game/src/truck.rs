//! Trucks: turning state machine, damage and collision response
//!
//! Every vehicle in a race is a [`Truck`]. What differs between the player,
//! the opponents, the police and civilian cars is captured by [`TruckKind`]:
//! how it steers, whether it mirrors its sprite for right turns, how much it
//! hurts on impact and whether it flattens roadside objects.
//!
//! Turning states:
//!
//! ```text
//!   Straight --left--> TurningLeft --0.5s--> DrivingLeft
//!      ^                 |     ^                  |
//!      |            release   left             release
//!      |                 v     |                  |
//!      +--0.5s-- TurningLeftToStraight <----------+
//! ```
//!
//! The right side mirrors the left.

use rand::seq::SliceRandom;

use redneck_engine::{
    Animation, Collidable, Contact, LoopMode, Point, Rectangle, RenderBackend, SoundHandle, Sprite,
};

use crate::destroyer::Destroyer;
use crate::entity::RaceEntity;
use crate::library::{ExhaustKind, TruckVisuals};

pub const DEFAULT_DEFENSE: f32 = 1000.0;
pub const DEFAULT_ARMOR: f32 = 700.0;
/// Rage meter capacity
pub const MAX_RAGE: f32 = 100.0;

/// Seconds a turn animation needs before the next turning state
pub const TURN_DELAY: f32 = 0.5;
const DRIVING_TURN_DIRECTION: f32 = 45.0;
/// Roll angle (degrees) beyond which the player steers
pub const ROLL_THRESHOLD: f32 = 7.0;

// ---------------------------------------------------------------------------
// Kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TruckKind {
    Player,
    Opponent,
    Police,
    Civilian,
}

impl TruckKind {
    /// Takes part in the ranking
    pub fn is_racer(self) -> bool {
        matches!(self, TruckKind::Player | TruckKind::Opponent)
    }

    pub fn is_player(self) -> bool {
        self == TruckKind::Player
    }

    pub fn is_civilian(self) -> bool {
        self == TruckKind::Civilian
    }

    /// Damage dealt to another truck on contact
    pub fn collision_damage(self) -> f32 {
        match self {
            TruckKind::Police => 0.0,
            _ => 1.0,
        }
    }

    /// Right turns reuse the mirrored left frames
    pub fn flips(self) -> bool {
        self != TruckKind::Police
    }

    /// Knocks over obstacles and runs over animals
    pub fn hits_roadside(self) -> bool {
        self != TruckKind::Civilian
    }

    fn health(self) -> (f32, f32) {
        match self {
            TruckKind::Player => (DEFAULT_DEFENSE * 2.0, DEFAULT_ARMOR * 2.0),
            _ => (DEFAULT_DEFENSE, DEFAULT_ARMOR),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurningState {
    Straight,
    TurningLeft,
    DrivingLeft,
    TurningLeftToStraight,
    TurningRight,
    DrivingRight,
    TurningRightToStraight,
}

impl TurningState {
    pub const ALL: [TurningState; 7] = [
        TurningState::Straight,
        TurningState::TurningLeft,
        TurningState::DrivingLeft,
        TurningState::TurningLeftToStraight,
        TurningState::TurningRight,
        TurningState::DrivingRight,
        TurningState::TurningRightToStraight,
    ];

    fn is_right_side(self) -> bool {
        matches!(
            self,
            TurningState::TurningRight | TurningState::DrivingRight | TurningState::TurningRightToStraight
        )
    }

    fn animation(self) -> TruckAnimation {
        match self {
            TurningState::Straight => TruckAnimation::DrivingStraight,
            TurningState::TurningLeft => TruckAnimation::TurningLeft,
            TurningState::DrivingLeft => TruckAnimation::DrivingLeft,
            TurningState::TurningLeftToStraight => TruckAnimation::TurningLeftToStraight,
            TurningState::TurningRight => TruckAnimation::TurningRight,
            TurningState::DrivingRight => TruckAnimation::DrivingRight,
            TurningState::TurningRightToStraight => TruckAnimation::TurningRightToStraight,
        }
    }
}

/// Which of the truck's animations is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TruckAnimation {
    Accelerating,
    DrivingStraight,
    TurningLeft,
    DrivingLeft,
    TurningLeftToStraight,
    TurningRight,
    DrivingRight,
    TurningRightToStraight,
}

/// Physics, health and rage. Managed by the truck's controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TruckParameters {
    pub speed: f32,
    pub acceleration: f32,
    pub defense: f32,
    pub armor: f32,
    pub rage: f32,
    pub target_speed: f32,
}

/// Secondary animation slots drawn on top of the truck
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachedSlot {
    Sparks,
    ShotgunBlast,
    EngineBlow,
}

/// Exhaust flame requests, drained by the race scene
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExhaustEvent {
    Show(ExhaustKind),
    Hide,
}

#[derive(Debug)]
struct AttachedAnimation {
    sprite: Sprite,
    offset: Point,
}

// ---------------------------------------------------------------------------
// Truck
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Truck {
    sprite: Sprite,
    kind: TruckKind,
    pub params: TruckParameters,
    visuals: TruckVisuals,
    showing: Option<TruckAnimation>,
    state: TurningState,
    turning_direction: f32,
    turning_started: f32,
    /// Start time of the last updated frame
    clock: f32,
    damage: f32,
    damage_multiplier: f32,
    on_road: bool,
    input_left: bool,
    input_right: bool,
    roll_angle: f32,
    rage_active: bool,
    nitro_active: bool,
    exhaust: Option<ExhaustKind>,
    exhaust_events: Vec<ExhaustEvent>,
    attached: [Option<AttachedAnimation>; 3],
    hit_sound: Option<SoundHandle>,
    rage_sounds: Vec<SoundHandle>,
}

impl Truck {
    pub fn new(
        name: &str,
        kind: TruckKind,
        visuals: TruckVisuals,
        sparks: Animation,
        hit_sound: Option<SoundHandle>,
        rage_sounds: Vec<SoundHandle>,
    ) -> Self {
        let (defense, armor) = kind.health();
        let mut truck = Self {
            sprite: Sprite::with_quad(name, visuals.stopped.clone()),
            kind,
            params: TruckParameters {
                speed: 0.0,
                acceleration: 0.0,
                defense,
                armor,
                rage: 0.0,
                target_speed: 0.0,
            },
            visuals,
            showing: None,
            state: TurningState::Straight,
            turning_direction: 0.0,
            turning_started: 0.0,
            clock: 0.0,
            damage: kind.collision_damage(),
            damage_multiplier: 1.0,
            on_road: true,
            input_left: false,
            input_right: false,
            roll_angle: 0.0,
            rage_active: false,
            nitro_active: false,
            exhaust: None,
            exhaust_events: Vec::new(),
            attached: [None, None, None],
            hit_sound,
            rage_sounds,
        };
        truck.attach_animation(AttachedSlot::Sparks, sparks, Point::default());
        truck.finish_attached_animation(AttachedSlot::Sparks);
        truck
    }

    pub fn kind(&self) -> TruckKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.sprite.name
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
        self.sync_attached();
    }

    pub fn turning_state(&self) -> TurningState {
        self.state
    }

    pub fn showing(&self) -> Option<TruckAnimation> {
        self.showing
    }

    pub fn is_on_road(&self) -> bool {
        self.on_road
    }

    pub fn damage_multiplier(&self) -> f32 {
        self.damage_multiplier
    }

    pub fn set_damage_multiplier(&mut self, multiplier: f32) {
        self.damage_multiplier = multiplier;
    }

    /// A turn is in progress or held
    pub fn is_turning_animation_active(&self) -> bool {
        self.turning_direction != 0.0
    }

    // -----------------------------------------------------------------------
    // Steering input
    // -----------------------------------------------------------------------

    pub fn set_input_left(&mut self, input: bool) {
        self.input_left = input;
        self.input_right = false;
    }

    pub fn set_input_right(&mut self, input: bool) {
        self.input_right = input;
        self.input_left = false;
    }

    /// Device roll for the player truck, in degrees
    pub fn set_roll_angle(&mut self, degrees: f32) {
        self.roll_angle = degrees;
    }

    pub fn input_left(&self) -> bool {
        match self.kind {
            TruckKind::Player => self.roll_angle < -ROLL_THRESHOLD,
            _ => self.input_left,
        }
    }

    pub fn input_right(&self) -> bool {
        match self.kind {
            TruckKind::Player => self.roll_angle > ROLL_THRESHOLD,
            _ => self.input_right,
        }
    }

    /// Sideways drift angle. The player steers with the roll angle itself;
    /// everyone else uses a fixed angle per turning state.
    pub fn turn_angle(&self) -> f32 {
        if self.kind.is_player() {
            return self.roll_angle;
        }
        match self.state {
            TurningState::DrivingLeft => -17.0,
            TurningState::TurningLeft | TurningState::TurningLeftToStraight => -9.0,
            TurningState::Straight => 0.0,
            TurningState::TurningRight | TurningState::TurningRightToStraight => 9.0,
            TurningState::DrivingRight => 17.0,
        }
    }

    // -----------------------------------------------------------------------
    // Animations
    // -----------------------------------------------------------------------

    /// Switch the main animation; no-op when it is already showing
    pub fn show(&mut self, which: TruckAnimation) {
        if self.showing == Some(which) {
            return;
        }
        let v = &self.visuals;
        let animation = match which {
            TruckAnimation::Accelerating => v.accelerating.clone(),
            TruckAnimation::DrivingStraight => v.driving_straight.clone(),
            TruckAnimation::TurningLeft => v.turning_left.clone(),
            TruckAnimation::DrivingLeft => v.driving_left.clone(),
            TruckAnimation::TurningLeftToStraight => v.turning_left_to_straight.clone(),
            TruckAnimation::TurningRight => v.turning_right.clone(),
            TruckAnimation::DrivingRight => v.driving_right.clone(),
            TruckAnimation::TurningRightToStraight => v.turning_right_to_straight.clone(),
        };
        self.sprite.set_animation(animation);
        self.showing = Some(which);
    }

    fn flip_horizontal(&mut self, flip: bool) {
        if self.kind.flips() {
            self.sprite.set_flip_x(flip);
        }
    }

    /// Advance the turning state machine one step
    pub fn process_state(&mut self) {
        use TurningState::*;

        let old = self.state;
        let left = self.input_left();
        let right = self.input_right();
        let turned = self.clock - self.turning_started >= TURN_DELAY;

        match self.state {
            Straight => {
                if left {
                    self.enter(TurningLeft, -10.0, true);
                }
                if right {
                    self.enter(TurningRight, 10.0, true);
                }
            }
            TurningLeft => {
                if !left {
                    self.enter(TurningLeftToStraight, -5.0, false);
                } else if turned {
                    self.enter(DrivingLeft, -DRIVING_TURN_DIRECTION, false);
                }
            }
            DrivingLeft => {
                if !left {
                    self.enter(TurningLeftToStraight, -5.0, true);
                }
            }
            TurningLeftToStraight => {
                if left {
                    self.enter(TurningLeft, -10.0, true);
                } else if turned {
                    self.enter(Straight, 0.0, false);
                }
            }
            TurningRight => {
                if !right {
                    // same sign as the left side
                    self.enter(TurningRightToStraight, -5.0, false);
                } else if turned {
                    self.enter(DrivingRight, DRIVING_TURN_DIRECTION, false);
                }
            }
            DrivingRight => {
                if !right {
                    self.enter(TurningRightToStraight, 5.0, true);
                }
            }
            TurningRightToStraight => {
                if right {
                    // turning timer keeps running here
                    self.enter(TurningRight, 10.0, false);
                } else if turned {
                    self.enter(Straight, 0.0, false);
                }
            }
        }

        if old != self.state {
            tracing::trace!("{}: {:?} -> {:?}", self.sprite.name, old, self.state);
        }
        self.handle_exhaust(old, self.state);
    }

    fn enter(&mut self, state: TurningState, direction: f32, reset_timer: bool) {
        self.state = state;
        self.flip_horizontal(state.is_right_side());
        self.show(state.animation());
        self.turning_direction = direction;
        if reset_timer {
            self.turning_started = self.clock;
        }
    }

    // -----------------------------------------------------------------------
    // Exhaust
    // -----------------------------------------------------------------------

    fn handle_exhaust(&mut self, old: TurningState, new: TurningState) {
        if self.rage_active {
            if new != old || self.exhaust.is_none() {
                let kind = match new {
                    TurningState::Straight => Some(ExhaustKind::Straight),
                    TurningState::DrivingLeft => Some(ExhaustKind::Left),
                    TurningState::DrivingRight => Some(ExhaustKind::Right),
                    _ => None,
                };
                match kind {
                    Some(kind) => {
                        self.exhaust = Some(kind);
                        self.exhaust_events.push(ExhaustEvent::Show(kind));
                    }
                    None => self.hide_exhaust(),
                }
            }
        } else {
            self.hide_exhaust();
        }
    }

    fn hide_exhaust(&mut self) {
        if self.exhaust.take().is_some() {
            self.exhaust_events.push(ExhaustEvent::Hide);
        }
    }

    /// Exhaust handling as if the truck went straight. Used when the
    /// controller forces the straight animation without a state step.
    pub fn end_exhaust_animation(&mut self) {
        self.handle_exhaust(self.state, TurningState::Straight);
    }

    pub fn exhaust(&self) -> Option<ExhaustKind> {
        self.exhaust
    }

    pub fn take_exhaust_events(&mut self) -> Vec<ExhaustEvent> {
        std::mem::take(&mut self.exhaust_events)
    }

    pub fn is_rage_active(&self) -> bool {
        self.rage_active
    }

    /// The player truck shouts one of its rage sounds when rage kicks in
    pub fn set_rage_active(&mut self, active: bool) {
        self.rage_active = active;
        if active && self.kind.is_player() {
            if let Some(sound) = self.rage_sounds.choose(&mut rand::thread_rng()) {
                sound.play();
            }
        }
    }

    pub fn is_nitro_active(&self) -> bool {
        self.nitro_active
    }

    pub fn set_nitro_active(&mut self, active: bool) {
        self.nitro_active = active;
    }

    // -----------------------------------------------------------------------
    // Attached animations
    // -----------------------------------------------------------------------

    pub fn attach_animation(&mut self, slot: AttachedSlot, animation: Animation, offset: Point) {
        match &mut self.attached[slot as usize] {
            Some(attached) => {
                attached.sprite.set_animation(animation);
                attached.offset = offset;
            }
            empty => {
                let mut sprite = Sprite::with_animation("Attached", animation);
                sprite.hide_when_finished = true;
                *empty = Some(AttachedAnimation { sprite, offset });
            }
        }
        self.sync_attached();
    }

    /// Jump a slot's animation to its end so nothing shows until activated
    pub fn finish_attached_animation(&mut self, slot: AttachedSlot) {
        if let Some(attached) = &mut self.attached[slot as usize] {
            if let Some(a) = attached.sprite.animation_mut() {
                a.finish();
            }
            attached.sprite.set_visible(false);
        }
    }

    /// Replay a slot's animation from the start
    pub fn activate_attached_animation(&mut self, slot: AttachedSlot, looping: bool) {
        if let Some(attached) = &mut self.attached[slot as usize] {
            let mode = if looping { LoopMode::Loop } else { LoopMode::PlayOnce };
            attached.sprite.reset_animation(mode);
        }
    }

    pub fn set_attached_animation_position(&mut self, slot: AttachedSlot, offset: Point) {
        if let Some(attached) = &mut self.attached[slot as usize] {
            attached.offset = offset;
        }
        self.sync_attached();
    }

    pub fn set_attached_animation_flip(&mut self, slot: AttachedSlot, flip: bool) {
        if let Some(attached) = &mut self.attached[slot as usize] {
            attached.sprite.set_flip_x(flip);
        }
    }

    pub fn rotate_attached_animation(&mut self, slot: AttachedSlot, degrees: f32) {
        if let Some(attached) = &mut self.attached[slot as usize] {
            attached.sprite.set_rotation(degrees);
        }
    }

    pub fn attached_sprite(&self, slot: AttachedSlot) -> Option<&Sprite> {
        self.attached[slot as usize].as_ref().map(|a| &a.sprite)
    }

    pub fn attached_offset(&self, slot: AttachedSlot) -> Option<Point> {
        self.attached[slot as usize].as_ref().map(|a| a.offset)
    }

    fn sync_attached(&mut self) {
        let position = self.sprite.position();
        for attached in self.attached.iter_mut().flatten() {
            attached.sprite.set_position(position + attached.offset);
        }
    }

    // -----------------------------------------------------------------------
    // Sounds
    // -----------------------------------------------------------------------

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

    // -----------------------------------------------------------------------
    // Frame
    // -----------------------------------------------------------------------

    pub fn update(&mut self, now: f32, dt: f32) {
        self.damage_multiplier = self.params.speed / 200.0;
        self.sprite.update(now, dt);

        let angle = self.turn_angle();
        if angle != 0.0 {
            let vx = turn_velocity(angle, self.params.speed);
            let p = self.sprite.position();
            self.sprite.set_position(p.offset(vx * dt, 0.0));
        }

        for attached in self.attached.iter_mut().flatten() {
            attached.sprite.update(now, dt);
        }
        self.sync_attached();
        self.clock = now;
    }

    pub fn draw(&self, screen: &Rectangle, backend: &mut dyn RenderBackend) {
        self.sprite.draw(screen, backend);
        for attached in self.attached.iter().flatten() {
            attached.sprite.draw(screen, backend);
        }
    }

    /// Hit test against the full image, edges included
    pub fn contains_point(&self, p: Point) -> bool {
        let bound = self.sprite.image_rect();
        !(bound.left > p.x || bound.right < p.x || bound.top < p.y || bound.bottom > p.y)
    }

    // -----------------------------------------------------------------------
    // Damage
    // -----------------------------------------------------------------------

    /// Armor soaks hits it can fully absorb. A bigger hit breaks the armor
    /// and the rest goes to defense.
    pub fn decrement_health(&mut self, damage: f32) {
        let p = &mut self.params;
        if p.armor > damage {
            p.armor -= damage;
        } else {
            if p.defense > damage {
                p.defense -= damage - p.armor;
            } else {
                p.defense = 0.0;
            }
            p.armor = 0.0;
        }
    }

    /// React to a collision this truck detected
    pub fn handle_collision(&mut self, other: &mut RaceEntity, contact: &Contact) {
        let player = self.kind.is_player();
        let (mut damage, mut rage_increment) = match other.destroyer() {
            Some(d) => {
                let damage = d.damage();
                (damage, if player { damage * 2.0 } else { damage })
            }
            None => (0.0, 0.0),
        };

        let mut multiplier = 1.0;
        match other {
            RaceEntity::Road(road) => {
                if let Some(rect) = self.bounding_rect() {
                    let (left, right) = road.bound_coordinates(rect.top);
                    let mid = (rect.left + rect.right) / 2.0;
                    self.on_road = !(mid < left || mid > right);
                }
            }
            RaceEntity::Border(border) => {
                if let (Some(own), Some(wall)) = (self.bounding_rect(), border.bounding_rect()) {
                    let p = nearest_non_colliding_position(self.position(), &own, wall.center(), &wall);
                    self.set_position(p);
                }
            }
            RaceEntity::Truck(truck) => {
                if let (Some(own), Some(theirs)) = (self.bounding_rect(), truck.bounding_rect()) {
                    let (mine, yours) =
                        split_collision_movement(self.position(), &own, truck.position(), &theirs);
                    self.set_position(mine);
                    truck.set_position(yours);

                    let mid = Point::new((mine.x + yours.x) / 2.0, (mine.y + yours.y) / 2.0);
                    self.set_attached_animation_position(AttachedSlot::Sparks, mid - mine);
                    self.activate_attached_animation(AttachedSlot::Sparks, false);
                    if player {
                        truck.play_hit_sound();
                    }
                    // a faster opponent hurts more
                    multiplier = truck.damage_multiplier() * contact.dt * 5.0;
                }
            }
            RaceEntity::Obstacle(obstacle) if self.kind.hits_roadside() => {
                if obstacle.is_destroyed() {
                    rage_increment = 0.0;
                } else {
                    obstacle.switch_to_hit_animation();
                    obstacle.set_damage(1.0);
                    if player {
                        obstacle.play_hit_sound();
                    }
                }
                multiplier = self.damage_multiplier;
            }
            RaceEntity::Animal(animal) if self.kind.hits_roadside() => {
                animal.switch_to_dead();
                animal.set_damage(0.0);
                multiplier = self.damage_multiplier;
                if player {
                    animal.play_hit_sound();
                }
            }
            _ => {}
        }

        damage *= multiplier;
        self.decrement_health(damage);
        rage_increment = rage_increment.min(MAX_RAGE - self.params.rage);
        self.params.rage += rage_increment;
    }
}

impl Destroyer for Truck {
    fn damage(&self) -> f32 {
        self.damage
    }

    fn set_damage(&mut self, damage: f32) {
        self.damage = damage;
    }
}

impl Collidable for Truck {
    fn bounding_rect(&self) -> Option<Rectangle> {
        self.sprite.bounding_rect()
    }
}

// ---------------------------------------------------------------------------
// Geometry helpers
// ---------------------------------------------------------------------------

/// Sideways speed for a drift angle: the angle is sharpened by a 1.35 power
/// and capped at 90 degrees.
pub fn turn_velocity(degrees: f32, speed: f32) -> f32 {
    let sharpened = degrees.abs().powf(1.35).min(90.0).copysign(degrees);
    sharpened.to_radians().sin() * speed
}

/// Closest position for `collider` that no longer overlaps `collidee`,
/// leaving by the side the collider's centre points to.
pub fn nearest_non_colliding_position(
    collider_center: Point,
    collider: &Rectangle,
    collidee_center: Point,
    collidee: &Rectangle,
) -> Point {
    let x = (collider_center.x - collidee_center.x) / collidee.width();
    let y = (collider_center.y - collidee_center.y) / collidee.height();

    if x <= 0.0 && -x >= y {
        Point::new(collidee.left - collider.width() / 2.0 - 1.0, collider_center.y)
    } else if y > 0.0 && y > x {
        Point::new(collider_center.x, collidee.top + collider.height() / 2.0 + 1.0)
    } else if x >= 0.0 && x >= y {
        Point::new(collidee.right + collider.width() / 2.0 + 1.0, collider_center.y)
    } else if y < 0.0 && -y > x {
        Point::new(collider_center.x, collidee.bottom - collider.height() / 2.0 - 1.0)
    } else {
        collider_center
    }
}

/// Both parties move half the way apart. Returns the new centres of
/// collider and collidee.
pub fn split_collision_movement(
    collider_center: Point,
    collider: &Rectangle,
    collidee_center: Point,
    collidee: &Rectangle,
) -> (Point, Point) {
    let target = nearest_non_colliding_position(collider_center, collider, collidee_center, collidee);
    let dx = (target.x - collider_center.x) / 2.0;
    let dy = (target.y - collider_center.y) / 2.0;
    (collider_center.offset(dx, dy), collidee_center.offset(-dx, -dy))
}
