//! Speed state machine driving one truck
//!
//! A controller never owns its truck. The race scene looks the truck up by
//! [`EntityId`] every frame and lends it to [`TruckController::update`].

use redneck_engine::{AccelerateAction, Animation, EntityId, MoveAction, Point, SoundHandle};

use crate::shotgun::ShotGun;
use crate::truck::{AttachedSlot, Truck, TruckAnimation, MAX_RAGE};

pub const DEFAULT_MAX_SPEED: f32 = 470.0;
pub const DEFAULT_RAGE_MAX_SPEED: f32 = 620.0;
pub const NITRO_MAX_SPEED: f32 = 520.0;
pub const OFFROAD_MAX_SPEED: f32 = 370.0;
pub const DEFAULT_ACCELERATION: f32 = 250.0;
pub const DEFAULT_SLOWDOWN: f32 = -250.0;
/// Seconds before nitro can fire again
pub const NITRO_CHARGING_TIME: f32 = 20.0;
pub const NITRO_ACTIVITY_TIME: f32 = 3.0;
/// Rage meter points lost per second while raging
pub const RAGE_DECREMENT_SPEED: f32 = 15.0;
const SPEED_DEAD_BAND: f32 = 10.0;

const ENGINE_BLOW_OFFSET: Point = Point { x: -6.0, y: 60.0 };

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerParams {
    pub max_speed: f32,
    pub use_rage: bool,
    pub rage_max_speed: f32,
}

impl ControllerParams {
    pub const DEFAULT: ControllerParams = ControllerParams {
        max_speed: DEFAULT_MAX_SPEED,
        use_rage: true,
        rage_max_speed: DEFAULT_RAGE_MAX_SPEED,
    };

    pub fn player() -> Self {
        Self { max_speed: 490.0, use_rage: true, rage_max_speed: 630.0 }
    }

    pub fn police() -> Self {
        Self { max_speed: 650.0, use_rage: false, ..Self::DEFAULT }
    }

    pub fn civilian() -> Self {
        Self { max_speed: 235.0, use_rage: false, ..Self::DEFAULT }
    }
}

impl Default for ControllerParams {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    WaitForStart,
    Accelerating,
    Slowdown,
    FullSpeed,
    Finished,
}

#[derive(Debug)]
pub struct TruckController {
    truck_id: EntityId,
    params: ControllerParams,
    phase: Phase,
    /// Time since the phase was entered
    elapsed: f32,
    nitro_elapsed: f32,
    nitro_active: bool,
    brake_pressed: bool,
    rage_active: bool,
    destroyed: bool,
    finished: bool,
    prev_speed: f32,
    shotgun: ShotGun,
    engine_blow: Animation,
    rev_sound: Option<SoundHandle>,
    nitro_enabled: bool,
}

impl TruckController {
    pub fn new(truck_id: EntityId, params: ControllerParams, engine_blow: Animation) -> Self {
        Self {
            truck_id,
            params,
            phase: Phase::WaitForStart,
            elapsed: 0.0,
            nitro_elapsed: NITRO_CHARGING_TIME + 1.0,
            nitro_active: false,
            brake_pressed: false,
            rage_active: false,
            destroyed: false,
            finished: false,
            prev_speed: 0.0,
            shotgun: ShotGun::new(),
            engine_blow,
            rev_sound: None,
            nitro_enabled: false,
        }
    }

    pub fn with_rev_sound(mut self, sound: Option<SoundHandle>) -> Self {
        self.rev_sound = sound;
        self
    }

    pub fn with_nitro(mut self, enabled: bool) -> Self {
        self.nitro_enabled = enabled;
        self
    }

    pub fn truck_id(&self) -> EntityId {
        self.truck_id
    }

    pub fn params(&self) -> &ControllerParams {
        &self.params
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn is_braking(&self) -> bool {
        self.brake_pressed
    }

    pub fn is_rage_active(&self) -> bool {
        self.rage_active
    }

    pub fn is_nitro_active(&self) -> bool {
        self.nitro_active
    }

    pub fn shotgun(&self) -> &ShotGun {
        &self.shotgun
    }

    pub fn shotgun_mut(&mut self) -> &mut ShotGun {
        &mut self.shotgun
    }

    /// Latch the finished state; the next update winds the truck down
    pub fn set_finished(&mut self) {
        self.finished = true;
    }

    fn accepts_input(&self) -> bool {
        self.phase != Phase::WaitForStart && self.phase != Phase::Finished && !self.destroyed
    }

    // -----------------------------------------------------------------------
    // Phase entry
    // -----------------------------------------------------------------------

    fn accelerate(&mut self, truck: &mut Truck) {
        truck.params.acceleration = DEFAULT_ACCELERATION;
        if !truck.is_turning_animation_active() {
            truck.show(TruckAnimation::Accelerating);
        }
        let p = truck.params;
        let sprite = truck.sprite_mut();
        sprite.set_action(Box::new(MoveAction::new(0.0, p.speed)));
        sprite.add_action(Box::new(AccelerateAction::with_max_speed(
            0.0,
            p.acceleration,
            p.target_speed - p.speed,
        )));
        self.enter(Phase::Accelerating, p.speed);
    }

    fn slowdown(&mut self, truck: &mut Truck) {
        truck.params.acceleration = DEFAULT_SLOWDOWN;
        if !truck.is_turning_animation_active() {
            truck.show(TruckAnimation::DrivingStraight);
        }
        let p = truck.params;
        let sprite = truck.sprite_mut();
        sprite.set_action(Box::new(MoveAction::new(0.0, p.speed)));
        sprite.add_action(Box::new(AccelerateAction::new(0.0, p.acceleration)));
        self.enter(Phase::Slowdown, p.speed);
    }

    fn const_speed(&mut self, truck: &mut Truck) {
        truck.params.acceleration = 0.0;
        truck.params.speed = truck.params.target_speed;
        if !truck.is_turning_animation_active() {
            truck.show(TruckAnimation::DrivingStraight);
        }
        let speed = truck.params.speed;
        truck.sprite_mut().set_action(Box::new(MoveAction::new(0.0, speed)));
        self.enter(Phase::FullSpeed, speed);
    }

    fn enter(&mut self, phase: Phase, speed: f32) {
        self.prev_speed = speed;
        self.elapsed = 0.0;
        self.phase = phase;
    }

    // -----------------------------------------------------------------------
    // Frame
    // -----------------------------------------------------------------------

    pub fn update(&mut self, dt: f32, truck: &mut Truck) {
        self.elapsed += dt;
        self.nitro_elapsed += dt;
        self.shotgun.update(dt);

        if self.finished {
            self.wind_down(truck);
            return;
        }

        let speed = truck.params.speed;
        let target = truck.params.target_speed;
        if speed > target - SPEED_DEAD_BAND && speed < target + SPEED_DEAD_BAND {
            if self.phase != Phase::FullSpeed {
                self.const_speed(truck);
            }
        } else if speed < target {
            if self.phase != Phase::Accelerating {
                self.accelerate(truck);
            }
        } else if self.phase != Phase::Slowdown {
            self.slowdown(truck);
        }
        truck.params.speed = self.prev_speed + self.elapsed * truck.params.acceleration;

        if self.destroyed {
            if truck.params.speed == 0.0 {
                self.finished = true;
                truck.set_rage_active(false);
            }
            return;
        }

        truck.process_state();

        if !truck.is_on_road() && truck.params.target_speed > OFFROAD_MAX_SPEED {
            truck.params.target_speed = OFFROAD_MAX_SPEED;
        }

        if self.params.use_rage && truck.params.rage >= MAX_RAGE && !self.rage_active {
            tracing::debug!("{} enters rage mode", truck.name());
            self.rage_active = true;
            truck.set_rage_active(true);
            truck.params.target_speed = self.params.rage_max_speed;
        } else if self.nitro_active {
            if self.nitro_elapsed > NITRO_ACTIVITY_TIME {
                self.nitro_elapsed = 0.0;
                self.nitro_active = false;
                truck.set_nitro_active(false);
                truck.params.target_speed = self.params.max_speed;
                self.phase = Phase::FullSpeed;
            }
        } else if !self.brake_pressed {
            truck.params.target_speed = if self.rage_active {
                self.params.rage_max_speed
            } else {
                self.params.max_speed
            };
        }

        if self.rage_active {
            // still boosted off road, but slower
            truck.params.target_speed = if truck.is_on_road() {
                self.params.rage_max_speed
            } else {
                self.params.rage_max_speed / 2.0
            };
            truck.params.rage -= dt * RAGE_DECREMENT_SPEED;
            if truck.params.rage <= 0.0 {
                truck.params.rage = 0.0;
                self.rage_active = false;
                truck.set_rage_active(false);
                if truck.params.target_speed > self.params.max_speed {
                    truck.params.target_speed = if truck.is_on_road() {
                        self.params.max_speed
                    } else {
                        OFFROAD_MAX_SPEED
                    };
                }
            }
        }

        if truck.params.defense <= 0.0 && self.phase != Phase::Finished {
            tracing::debug!("{} is destroyed", truck.name());
            self.destroyed = true;
            truck.show(TruckAnimation::DrivingStraight);
            truck.attach_animation(AttachedSlot::EngineBlow, self.engine_blow.clone(), ENGINE_BLOW_OFFSET);
            truck.activate_attached_animation(AttachedSlot::EngineBlow, true);
            truck.set_rage_active(false);
            truck.end_exhaust_animation();
            truck.params.target_speed = 0.0;
            self.slowdown(truck);
        }
    }

    fn wind_down(&mut self, truck: &mut Truck) {
        truck.sprite_mut().clear_actions();
        truck.params.acceleration = 0.0;
        truck.params.speed = 0.0;
        truck.params.target_speed = 0.0;
        truck.show(TruckAnimation::DrivingStraight);
        truck.set_rage_active(false);
        truck.end_exhaust_animation();
        self.phase = Phase::Finished;
    }

    // -----------------------------------------------------------------------
    // Triggers
    // -----------------------------------------------------------------------

    pub fn start_race(&mut self, truck: &mut Truck) {
        truck.params.speed = 0.0;
        truck.params.target_speed = self.params.max_speed;
        self.brake_up(truck);
        if let Some(sound) = &self.rev_sound {
            sound.play();
        }
    }

    pub fn brake_down(&mut self, truck: &mut Truck) {
        if self.accepts_input() {
            truck.params.target_speed = 0.0;
            self.brake_pressed = true;
        }
    }

    pub fn brake_up(&mut self, truck: &mut Truck) {
        if self.accepts_input() {
            truck.params.target_speed = if !truck.is_on_road() {
                OFFROAD_MAX_SPEED
            } else if self.nitro_active {
                NITRO_MAX_SPEED
            } else if self.rage_active {
                self.params.rage_max_speed
            } else {
                self.params.max_speed
            };
            self.brake_pressed = false;
        }
    }

    /// Short boost once the charge time has passed. Disabled unless the
    /// game settings turn nitro on.
    pub fn nitro_down(&mut self, truck: &mut Truck) {
        if !self.nitro_enabled || !self.accepts_input() {
            return;
        }
        if self.nitro_elapsed > NITRO_CHARGING_TIME {
            truck.params.target_speed = NITRO_MAX_SPEED;
            self.nitro_elapsed = 0.0;
            self.nitro_active = true;
            truck.set_nitro_active(true);
            tracing::debug!("{} fires nitro", truck.name());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::{EffectType, GameLibrary, TruckColor};

    const DT: f32 = 1.0 / 30.0;

    fn setup(params: ControllerParams) -> (TruckController, Truck) {
        let lib = GameLibrary::load_for_race().unwrap();
        let truck = lib.opponent_truck(TruckColor::Black).unwrap();
        let blow = lib.effect(EffectType::FireAndSmoke).unwrap();
        (TruckController::new(EntityId(1), params, blow), truck)
    }

    /// One frame the way the race scene runs it
    fn frame(c: &mut TruckController, t: &mut Truck, now: f32) {
        t.update(now, DT);
        c.update(DT, t);
    }

    #[test]
    fn input_ignored_before_start() {
        let (mut c, mut t) = setup(ControllerParams::DEFAULT);
        c.brake_down(&mut t);
        assert!(!c.is_braking());
        assert_eq!(c.phase(), Phase::WaitForStart);
    }

    #[test]
    fn accelerates_to_max_then_holds() {
        let (mut c, mut t) = setup(ControllerParams::DEFAULT);
        c.start_race(&mut t);
        assert_eq!(t.params.target_speed, DEFAULT_MAX_SPEED);

        frame(&mut c, &mut t, 0.0);
        assert_eq!(c.phase(), Phase::Accelerating);
        assert_eq!(t.showing(), Some(TruckAnimation::Accelerating));

        let mut now = 0.0;
        for _ in 0..120 {
            now += DT;
            frame(&mut c, &mut t, now);
        }
        assert_eq!(c.phase(), Phase::FullSpeed);
        assert_eq!(t.params.speed, DEFAULT_MAX_SPEED);
        assert!(t.position().y > 400.0);
    }

    #[test]
    fn braking_slows_and_release_restores() {
        let (mut c, mut t) = setup(ControllerParams::DEFAULT);
        c.start_race(&mut t);
        let mut now = 0.0;
        for _ in 0..90 {
            frame(&mut c, &mut t, now);
            now += DT;
        }
        c.brake_down(&mut t);
        assert!(c.is_braking());
        assert_eq!(t.params.target_speed, 0.0);
        frame(&mut c, &mut t, now);
        assert_eq!(c.phase(), Phase::Slowdown);
        // held brake keeps the target at zero
        frame(&mut c, &mut t, now + DT);
        assert_eq!(t.params.target_speed, 0.0);

        c.brake_up(&mut t);
        assert_eq!(t.params.target_speed, DEFAULT_MAX_SPEED);
    }

    #[test]
    fn full_rage_boosts_and_decays() {
        let (mut c, mut t) = setup(ControllerParams::DEFAULT);
        c.start_race(&mut t);
        t.params.rage = MAX_RAGE;
        frame(&mut c, &mut t, 0.0);
        assert!(c.is_rage_active());
        assert!(t.is_rage_active());
        assert_eq!(t.params.target_speed, DEFAULT_RAGE_MAX_SPEED);
        assert!(t.params.rage < MAX_RAGE);

        let mut now = 0.0;
        while c.is_rage_active() {
            now += DT;
            frame(&mut c, &mut t, now);
            assert!(now < 10.0, "rage never ran out");
        }
        assert_eq!(t.params.rage, 0.0);
        assert_eq!(t.params.target_speed, DEFAULT_MAX_SPEED);
    }

    #[test]
    fn riders_without_rage_ignore_the_meter() {
        let (mut c, mut t) = setup(ControllerParams::police());
        c.start_race(&mut t);
        t.params.rage = MAX_RAGE;
        frame(&mut c, &mut t, 0.0);
        assert!(!c.is_rage_active());
        assert_eq!(t.params.target_speed, 650.0);
    }

    #[test]
    fn destroyed_truck_rolls_to_a_stop_and_finishes() {
        let (mut c, mut t) = setup(ControllerParams::DEFAULT);
        c.start_race(&mut t);
        let mut now = 0.0;
        for _ in 0..30 {
            frame(&mut c, &mut t, now);
            now += DT;
        }
        t.params.defense = 0.0;
        frame(&mut c, &mut t, now);
        assert!(c.is_destroyed());
        assert_eq!(c.phase(), Phase::Slowdown);
        assert!(t.attached_sprite(AttachedSlot::EngineBlow).unwrap().is_visible());

        // input is ignored from now on
        c.brake_up(&mut t);
        assert_eq!(t.params.target_speed, 0.0);

        for _ in 0..300 {
            now += DT;
            frame(&mut c, &mut t, now);
            if c.is_finished() {
                break;
            }
        }
        assert!(c.is_finished());
        frame(&mut c, &mut t, now + DT);
        assert_eq!(c.phase(), Phase::Finished);
        assert_eq!(t.params.speed, 0.0);
    }

    #[test]
    fn finished_is_terminal() {
        let (mut c, mut t) = setup(ControllerParams::DEFAULT);
        c.start_race(&mut t);
        frame(&mut c, &mut t, 0.0);
        c.set_finished();
        for i in 0..10 {
            frame(&mut c, &mut t, i as f32 * DT);
            assert_eq!(c.phase(), Phase::Finished);
            assert_eq!(t.params.speed, 0.0);
            assert_eq!(t.params.target_speed, 0.0);
        }
        let y = t.position().y;
        t.update(1.0, DT);
        assert_eq!(t.position().y, y);
    }

    #[test]
    fn nitro_needs_the_setting_and_a_charge() {
        let (mut c, mut t) = setup(ControllerParams::DEFAULT);
        c.start_race(&mut t);
        frame(&mut c, &mut t, 0.0);
        c.nitro_down(&mut t);
        assert!(!c.is_nitro_active());

        let (c2, mut t) = setup(ControllerParams::DEFAULT);
        let mut c = c2.with_nitro(true);
        c.start_race(&mut t);
        frame(&mut c, &mut t, 0.0);
        c.nitro_down(&mut t);
        assert!(c.is_nitro_active());
        assert_eq!(t.params.target_speed, NITRO_MAX_SPEED);

        let mut now = 0.0;
        for _ in 0..100 {
            now += DT;
            frame(&mut c, &mut t, now);
        }
        assert!(!c.is_nitro_active());
        assert_eq!(t.params.target_speed, DEFAULT_MAX_SPEED);
        // recharging
        c.nitro_down(&mut t);
        assert!(!c.is_nitro_active());
    }
}
