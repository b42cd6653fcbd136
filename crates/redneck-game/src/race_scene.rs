//! One race: track layout, spawning, race state machine and the HUD
//!
//! The scene owns every entity through its [`Scene`]. Controllers and AIs
//! live beside it and find their trucks by [`EntityId`]. Things the rest of
//! the game must react to (race over, back to menu, open the store page)
//! come out as [`RaceEvent`]s.

use std::collections::BTreeMap;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use redneck_common::RaceTrackId;
use redneck_engine::{Collidable, EntityId, FollowAction, Point, Rectangle, RenderBackend, Scene, Size, Sound, SweepReport};

use crate::ai::{Behaviour, DrivingAi, LanePreference, Strike, TruckSnapshot};
use crate::animal::MoveDirection;
use crate::context::GameContext;
use crate::controller::{ControllerParams, TruckController};
use crate::entity::RaceEntity;
use crate::hud::Hud;
use crate::library::{
    AnimalSpecies, ButtonType, EffectType, GameLibrary, ObstacleType, TruckColor, SOUND_COPS_COMING, SOUND_GUN_PING,
    SOUND_SHOTGUN, SOUND_TRUCK_REV_FADE, SOUND_TRUCK_STARTUP,
};
use crate::obstacle::TrackBorder;
use crate::race_pos::RacePosAction;
use crate::road_bound::RoadBound;
use crate::tracks::RaceTrack;
use crate::truck::{AttachedSlot, ExhaustEvent, Truck};
use crate::Result;

pub const BACKGROUND_Z_ORDER: i32 = -1;
pub const OBSTACLE_Z_ORDER: i32 = 10;
pub const ANIMAL_Z_ORDER: i32 = 20;
pub const TRUCK_Z_ORDER: i32 = 30;
pub const SPARKS_Z_ORDER: i32 = 40;

const SCREEN_WIDTH: f32 = 480.0;
const SCREEN_HEIGHT: f32 = 800.0;
const SCREEN_LEFT: i32 = -240;
const SCREEN_RIGHT: i32 = 240;
/// The camera sits this far ahead of the player
pub const TRUCK_CENTER_VERTICAL_OFFSET: f32 = 133.0;

const PLAYER_START: Point = Point::new(40.0, -133.0);
const POLICE_START: Point = Point::new(0.0, -500.0);
const OPPONENT_START_Y: [f32; 5] = [0.0, 133.0, 266.0, 400.0, 533.0];
const BLAST_OFFSET: Point = Point::new(-30.0, 18.0);
const FINISH_LINE_OFFSET: f32 = 350.0;
/// Seconds of "READY!" before the trucks go
pub const START_DELAY: f32 = 3.0;
/// The rating prompt replaces the finish panel on this counted finish
const FEEDBACK_FINISH_COUNT: u32 = 2;
const MIN_CIVIL_CARS: usize = 2;
const MAX_CIVIL_CARS: usize = 5;
const MAX_PLACEMENT_ATTEMPTS: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceState {
    WaitForStart,
    RaceActive,
    RaceFinished,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RaceEvent {
    RaceStarted,
    RaceFinished { position: i32, seconds: u32, destroyed: bool },
    NewBestTime { track: RaceTrackId, seconds: u32 },
    FeedbackRequested,
    OpenMarket,
    /// `paused` is true when the race was left before it ended
    ReturnToMenu { paused: bool },
}

/// Where an obstacle kind may be put down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObstaclePlacement {
    OnRoad,
    OffRoad,
    Anywhere,
}

const OBSTACLE_LAYOUT: [(ObstacleType, ObstaclePlacement); 7] = [
    (ObstacleType::Puddle, ObstaclePlacement::OnRoad),
    (ObstacleType::Pothole, ObstaclePlacement::OnRoad),
    (ObstacleType::FatGuy, ObstaclePlacement::OffRoad),
    (ObstacleType::Outhouse, ObstaclePlacement::OffRoad),
    (ObstacleType::Shrub, ObstaclePlacement::OffRoad),
    (ObstacleType::Tree, ObstaclePlacement::OffRoad),
    (ObstacleType::Tractor, ObstaclePlacement::Anywhere),
];

fn truck_mut(scene: &mut Scene<RaceEntity>, id: EntityId) -> Option<&mut Truck> {
    scene.get_mut(id).and_then(RaceEntity::as_truck_mut)
}

fn place_name(position: i32) -> String {
    match position {
        1 => "1st".to_string(),
        2 => "2nd".to_string(),
        3 => "3rd".to_string(),
        n => format!("{}th", n),
    }
}

/// X for an obstacle of `width` at `y`, or `None` when the chosen roadside
/// has no room
pub fn obstacle_x<R: Rng>(
    road: &RoadBound,
    kind: ObstacleType,
    placement: ObstaclePlacement,
    width: f32,
    y: f32,
    rng: &mut R,
) -> Option<f32> {
    match placement {
        ObstaclePlacement::OnRoad => Some(road.point_on_road(y, rng).x),
        ObstaclePlacement::OffRoad => {
            let (road_left, road_right) = road.bound_coordinates(y);
            let fat_guy = kind == ObstacleType::FatGuy;
            let mut left = SCREEN_LEFT + 50;
            let mut right = (road_left - width / 2.0) as i32;
            if fat_guy {
                left = (left as f32 + width / 4.0) as i32;
                right = (right as f32 + width / 2.0) as i32;
            }
            if rng.gen_range(0..=1) == 0 {
                left = (road_right + width / 2.0) as i32;
                right = SCREEN_RIGHT - 50;
                if fat_guy {
                    left = (left as f32 + width / 6.0) as i32;
                    right += 50;
                }
            }
            if left >= right || right > SCREEN_RIGHT {
                return None;
            }
            Some(rng.gen_range(right - 1..=right) as f32)
        }
        ObstaclePlacement::Anywhere => Some(rng.gen_range(SCREEN_LEFT + 50..=SCREEN_RIGHT - 50) as f32),
    }
}

#[derive(Debug)]
pub struct RaceScene {
    track_id: RaceTrackId,
    track: RaceTrack,
    scene: Scene<RaceEntity>,
    road: Rc<RoadBound>,
    rng: StdRng,
    nitro_enabled: bool,

    state: RaceState,
    now: f32,
    last_dt: f32,
    elapsed: f32,
    race_time: f32,
    restarted: bool,
    finish_count: u32,
    show_feedback: bool,

    race_length: f32,
    finish_line_y: f32,
    player: EntityId,
    police: EntityId,
    opponents: Vec<EntityId>,
    civil_cars: Vec<EntityId>,
    animals: Vec<EntityId>,
    obstacles: Vec<EntityId>,
    /// Index 0 is the player
    controllers: Vec<TruckController>,
    ais: Vec<DrivingAi>,
    /// Exhaust flame sprite per truck
    exhausts: BTreeMap<EntityId, EntityId>,

    race_pos: RacePosAction,
    hud: Hud,
    events: Vec<RaceEvent>,
}

impl RaceScene {
    pub fn new(ctx: &GameContext, track_id: RaceTrackId, seed: u64) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        let track = RaceTrack::new(track_id, &mut rng);
        let mut race = Self {
            track_id,
            track,
            scene: Scene::new(Size::new(SCREEN_WIDTH, SCREEN_HEIGHT)),
            road: Rc::new(RoadBound::new(SCREEN_WIDTH / 2.0, SCREEN_HEIGHT / 2.0)),
            rng,
            nitro_enabled: ctx.config.nitro_enabled,
            state: RaceState::WaitForStart,
            now: 0.0,
            last_dt: 0.0,
            elapsed: 0.0,
            race_time: 0.0,
            restarted: false,
            finish_count: 0,
            show_feedback: false,
            race_length: 0.0,
            finish_line_y: 0.0,
            player: EntityId::default(),
            police: EntityId::default(),
            opponents: Vec::new(),
            civil_cars: Vec::new(),
            animals: Vec::new(),
            obstacles: Vec::new(),
            controllers: Vec::new(),
            ais: Vec::new(),
            exhausts: BTreeMap::new(),
            race_pos: RacePosAction::new(),
            hud: Hud::new(&ctx.library)?,
            events: Vec::new(),
        };
        race.init_race_scene(ctx)?;
        Ok(race)
    }

    /// Throw the current race away and lay out a fresh one on the same track
    pub fn restart_race(&mut self, ctx: &GameContext) -> Result<()> {
        tracing::info!("Restarting race on {}", self.track_id.display_name());
        for name in [SOUND_TRUCK_STARTUP, SOUND_COPS_COMING] {
            if let Some(sound) = ctx.library.sound(name) {
                sound.stop();
            }
        }
        let ids: Vec<EntityId> = self
            .opponents
            .iter()
            .chain(&self.civil_cars)
            .chain(&self.animals)
            .chain(&self.obstacles)
            .chain(std::iter::once(&self.police))
            .copied()
            .collect();
        for id in ids {
            if let Some(entity) = self.scene.get(id) {
                entity.stop_sounds();
            }
        }

        self.scene.remove_all_children();
        self.opponents.clear();
        self.civil_cars.clear();
        self.animals.clear();
        self.obstacles.clear();
        self.controllers.clear();
        self.ais.clear();
        self.exhausts.clear();
        self.hud.hide_overlay();
        self.state = RaceState::WaitForStart;
        if self.track_id == RaceTrackId::Wijadidja {
            // the random track gets a new layout every time
            self.track = RaceTrack::new(self.track_id, &mut self.rng);
        }

        self.init_race_scene(ctx)?;
        self.elapsed = 0.0;
        self.race_time = 0.0;
        self.restarted = true;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Layout
    // -----------------------------------------------------------------------

    fn init_race_scene(&mut self, ctx: &GameContext) -> Result<()> {
        let library = &ctx.library;
        self.race_pos = RacePosAction::new();

        let road = self.add_backgrounds(library)?;
        self.road = Rc::new(road);

        let sections = self.track.background_names().len();
        self.scene
            .add_collidable_child(RaceEntity::Border(TrackBorder::left(SCREEN_WIDTH, SCREEN_HEIGHT, sections)), 0);
        self.scene
            .add_collidable_child(RaceEntity::Border(TrackBorder::right(SCREEN_WIDTH, SCREEN_HEIGHT, sections)), 0);
        self.scene.add_collidable_child(RaceEntity::Road(Rc::clone(&self.road)), 0);

        let mut player = library.player_truck()?;
        player.set_position(PLAYER_START);
        Self::attach_blast(library, &mut player)?;
        let player_top = player.bounding_rect().map(|r| r.top).unwrap_or(PLAYER_START.y);
        self.player = self.scene.add_collidable_child(RaceEntity::truck(player), TRUCK_Z_ORDER);

        for (color, y) in TruckColor::OPPONENTS.into_iter().zip(OPPONENT_START_Y) {
            let mut truck = library.opponent_truck(color)?;
            truck.set_position(self.road.point_on_road(y, &mut self.rng));
            Self::attach_blast(library, &mut truck)?;
            if let Some(rect) = truck.bounding_rect() {
                self.race_pos.update_race_position(player_top, rect.top);
            }
            self.opponents.push(self.scene.add_collidable_child(RaceEntity::truck(truck), TRUCK_Z_ORDER));
        }
        self.race_pos.set_postfix(&format!("/{}", self.opponents.len() + 1));

        self.add_civil_cars(library)?;

        let mut police = library.police_truck()?;
        police.set_position(POLICE_START);
        Self::attach_blast(library, &mut police)?;
        self.police = self.scene.add_collidable_child(RaceEntity::truck(police), TRUCK_Z_ORDER);

        for species in AnimalSpecies::ALL {
            self.add_animals(library, species)?;
        }
        for (kind, placement) in OBSTACLE_LAYOUT {
            self.add_obstacles(library, kind, placement)?;
        }

        self.add_controllers(library)?;

        self.hud.show_overlay(1, 0.0).fade_out(0.0);
        for name in [SOUND_TRUCK_STARTUP, SOUND_COPS_COMING] {
            if let Some(sound) = library.sound(name) {
                sound.play();
            }
        }
        self.restarted = true;
        self.show_feedback = !ctx.feedback.has_answered();
        self.update_camera();

        tracing::info!(
            "Race on {}: {} sections, {} animals, {} obstacles, {} civil cars",
            self.track_id.display_name(),
            sections,
            self.animals.len(),
            self.obstacles.len(),
            self.civil_cars.len()
        );
        Ok(())
    }

    /// Stack the track's backgrounds and load their road borders
    fn add_backgrounds(&mut self, library: &GameLibrary) -> Result<RoadBound> {
        let mut road = RoadBound::new(SCREEN_WIDTH / 2.0, SCREEN_HEIGHT / 2.0);
        let mut y = 0.0;
        let names = self.track.background_names();
        for name in &names {
            let mut sprite = library.background(name)?;
            road.load_road_section_border(name, library.road_section(name)?)?;
            sprite.set_position(Point::new(0.0, y));
            y += sprite.size().height;
            self.scene.add_child(RaceEntity::Sprite(sprite), BACKGROUND_Z_ORDER);
            tracing::trace!("Background {} at y {}", name, y);
        }

        let mut finish_background = library.finish_background()?;
        finish_background.set_position(Point::new(0.0, y));
        self.scene.add_child(RaceEntity::Sprite(finish_background), BACKGROUND_Z_ORDER);

        self.finish_line_y = y - FINISH_LINE_OFFSET;
        let mut finish_line = library.finish_line()?;
        finish_line.set_position(Point::new(5.0, self.finish_line_y));
        self.scene.add_child(RaceEntity::Sprite(finish_line), 0);

        self.race_length = names.len() as f32 * SCREEN_HEIGHT;
        Ok(road)
    }

    /// Shotgun blast, parked on its last frame until the first shot
    fn attach_blast(library: &GameLibrary, truck: &mut Truck) -> Result<()> {
        truck.attach_animation(AttachedSlot::ShotgunBlast, library.effect(EffectType::ShotgunBlast)?, BLAST_OFFSET);
        truck.finish_attached_animation(AttachedSlot::ShotgunBlast);
        Ok(())
    }

    fn add_civil_cars(&mut self, library: &GameLibrary) -> Result<()> {
        let count = self.rng.gen_range(MIN_CIVIL_CARS..=MAX_CIVIL_CARS);
        let low = (SCREEN_HEIGHT * 2.0) as i32;
        let high = (((self.race_length - SCREEN_HEIGHT) / 2.0) as i32).max(low);
        for color in TruckColor::OPPONENTS.into_iter().take(count) {
            let mut car = library.civil_car(color)?;
            let y = self.rng.gen_range(low..=high) as f32;
            car.set_position(self.road.point_on_road(y, &mut self.rng));
            self.civil_cars.push(self.scene.add_collidable_child(RaceEntity::truck(car), TRUCK_Z_ORDER));
        }
        Ok(())
    }

    fn spawn_y_range(&self) -> (i32, i32) {
        let low = SCREEN_HEIGHT as i32;
        let high = ((self.race_length - SCREEN_HEIGHT) as i32).max(low);
        (low, high)
    }

    fn add_animals(&mut self, library: &GameLibrary, species: AnimalSpecies) -> Result<()> {
        let count = self.rng.gen_range(self.track.min_animals..=self.track.max_animals);
        let (low, high) = self.spawn_y_range();
        for _ in 0..count {
            let direction = if self.rng.gen_range(0..=1) == 0 { MoveDirection::Left } else { MoveDirection::Right };
            let mut animal = library.animal(species, direction)?;
            // right movers start on the left half, slightly off screen at worst
            let x = match direction {
                MoveDirection::Right => self.rng.gen_range(SCREEN_LEFT - 50..=0),
                MoveDirection::Left => self.rng.gen_range(0..=SCREEN_RIGHT + 50),
            };
            let y = self.rng.gen_range(low..=high);
            animal.set_position(Point::new(x as f32, y as f32));
            self.animals.push(self.scene.add_collidable_child(RaceEntity::Animal(animal), ANIMAL_Z_ORDER));
        }
        Ok(())
    }

    fn add_obstacles(&mut self, library: &GameLibrary, kind: ObstacleType, placement: ObstaclePlacement) -> Result<()> {
        let count = self.rng.gen_range(self.track.min_obstacles..=self.track.max_obstacles);
        let (low, high) = self.spawn_y_range();
        for _ in 0..count {
            let mut obstacle = library.obstacle(kind)?;
            let width = obstacle.sprite().size().width;
            let mut spot = None;
            for _ in 0..MAX_PLACEMENT_ATTEMPTS {
                let y = self.rng.gen_range(low..=high) as f32;
                if let Some(x) = obstacle_x(&self.road, kind, placement, width, y, &mut self.rng) {
                    spot = Some(Point::new(x, y));
                    break;
                }
            }
            let Some(spot) = spot else {
                tracing::warn!("No room for {:?} after {} attempts, skipping", kind, MAX_PLACEMENT_ATTEMPTS);
                continue;
            };
            obstacle.set_position(spot);
            self.obstacles.push(self.scene.add_collidable_child(RaceEntity::Obstacle(obstacle), OBSTACLE_Z_ORDER));
        }
        Ok(())
    }

    fn add_controllers(&mut self, library: &GameLibrary) -> Result<()> {
        let rev = library.sound(SOUND_TRUCK_REV_FADE);
        let controller = |id: EntityId, params: ControllerParams| -> Result<TruckController> {
            Ok(TruckController::new(id, params, library.effect(EffectType::FireAndSmoke)?)
                .with_rev_sound(rev.clone())
                .with_nitro(self.nitro_enabled))
        };

        let mut controllers = vec![controller(self.player, ControllerParams::player())?];
        let mut drivers = Vec::new();
        for &id in &self.opponents {
            controllers.push(controller(id, ControllerParams::DEFAULT)?);
            drivers.push((controllers.len() - 1, id, Behaviour::Opponent, LanePreference::Random));
        }
        controllers.push(controller(self.police, ControllerParams::police())?);
        drivers.push((controllers.len() - 1, self.police, Behaviour::Police, LanePreference::Random));
        for &id in &self.civil_cars {
            controllers.push(controller(id, ControllerParams::civilian())?);
            drivers.push((controllers.len() - 1, id, Behaviour::Lane, LanePreference::Right));
        }

        for (index, id, behaviour, preference) in drivers {
            let Some(truck) = self.scene.get(id).and_then(RaceEntity::as_truck) else {
                continue;
            };
            let ai = DrivingAi::new(index, truck, Rc::clone(&self.road), behaviour, &mut self.rng).with_preference(preference);
            self.ais.push(ai);
        }
        self.controllers = controllers;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Frame
    // -----------------------------------------------------------------------

    pub fn update(&mut self, ctx: &mut GameContext, dt: f32) {
        let now = self.now;
        self.now += dt;
        self.last_dt = dt;
        self.scene.update(now, dt);
        self.elapsed += dt;

        match self.state {
            RaceState::WaitForStart => {
                if self.restarted {
                    // the frame that laid out the race does not count
                    self.elapsed -= dt;
                    self.restarted = false;
                } else if let Some(overlay) = &mut self.hud.overlay {
                    overlay.fade_out(dt);
                }
                if self.elapsed >= START_DELAY {
                    self.start_race();
                }
            }
            RaceState::RaceActive => {
                let player_y = self.player_position().y;
                if player_y > self.finish_line_y || self.player_controller().is_some_and(TruckController::is_finished) {
                    self.finish_race(ctx, dt);
                } else {
                    self.start_nearby_animals_moving();
                    self.run_ais(dt);
                    for controller in &mut self.controllers {
                        if let Some(truck) = truck_mut(&mut self.scene, controller.truck_id()) {
                            controller.update(dt, truck);
                        }
                    }
                    self.update_race_position();
                }
            }
            RaceState::RaceFinished => {
                if self.show_feedback {
                    self.feedback_screen(dt);
                } else {
                    self.finish_screen(ctx, dt);
                }
            }
        }

        self.handle_exhaust_events(&ctx.library);
        self.update_camera();
        self.remove_off_screen_stuff();
    }

    /// Collision pass for the frame just updated
    pub fn handle_collisions(&mut self) -> SweepReport {
        let report = self.scene.handle_collisions(self.now, self.last_dt);
        if !report.removals.is_empty() {
            let scene = &self.scene;
            self.animals.retain(|id| scene.contains(*id));
            self.obstacles.retain(|id| scene.contains(*id));
        }
        report
    }

    pub fn draw(&self, backend: &mut dyn RenderBackend) {
        self.scene.draw(backend);
        if let Some(player) = self.player_truck() {
            self.hud.draw(&self.scene.screen(), &player.params, &self.race_pos.label(), backend);
        }
    }

    fn start_race(&mut self) {
        for controller in &mut self.controllers {
            if let Some(truck) = truck_mut(&mut self.scene, controller.truck_id()) {
                controller.start_race(truck);
            }
        }
        self.hud.hide_overlay();
        self.state = RaceState::RaceActive;
        self.events.push(RaceEvent::RaceStarted);
        tracing::info!("Race started on {}", self.track_id.display_name());
    }

    fn finish_race(&mut self, ctx: &mut GameContext, dt: f32) {
        let destroyed = self.player_controller().is_some_and(TruckController::is_destroyed);
        if !destroyed {
            self.finish_count += 1;
        }
        self.race_time = self.elapsed;
        tracing::info!(
            "Race finished: position {}, {:.1}s{}",
            self.race_pos.race_position(),
            self.race_time,
            if destroyed { ", truck destroyed" } else { "" }
        );

        if self.finish_count == FEEDBACK_FINISH_COUNT && self.show_feedback {
            self.hud.show_overlay(2, 200.0);
            self.feedback_screen(0.0);
            self.events.push(RaceEvent::FeedbackRequested);
        } else {
            self.show_feedback = false;
            self.hud.show_overlay(3, 200.0);
            self.finish_screen(ctx, 0.0);
        }

        for controller in &mut self.controllers {
            controller.set_finished();
            if let Some(truck) = truck_mut(&mut self.scene, controller.truck_id()) {
                controller.update(dt, truck);
            }
        }
        self.state = RaceState::RaceFinished;
        self.events.push(RaceEvent::RaceFinished {
            position: self.race_pos.race_position(),
            seconds: self.race_time as u32,
            destroyed,
        });
    }

    fn finish_screen(&mut self, ctx: &mut GameContext, dt: f32) {
        let destroyed = self.player_controller().is_some_and(TruckController::is_destroyed);
        let position = self.race_pos.race_position();
        let Some(overlay) = &mut self.hud.overlay else {
            return;
        };
        if !overlay.fade_in(dt) {
            return;
        }

        if destroyed {
            overlay.set_line(0, "YOU LOSE...");
            overlay.set_line(1, "Your truck was destroyed");
        } else if position == 1 {
            overlay.set_line(0, "YOU WIN!");
            overlay.set_line(1, "You came in first place!");
        } else {
            overlay.set_line(0, "Race over");
            overlay.set_line(1, format!("You came in {} place", place_name(position)));
        }

        let seconds = self.race_time as u32;
        if ctx.best_times.report_time(self.track_id, seconds) {
            overlay.set_line(2, format!("Your race time of {} seconds is the new best time!", seconds));
            self.events.push(RaceEvent::NewBestTime { track: self.track_id, seconds });
        } else {
            overlay.set_line(2, format!("Your race time was {} seconds.", seconds));
        }
        self.hud.add_finish_buttons();
    }

    fn feedback_screen(&mut self, dt: f32) {
        let Some(overlay) = &mut self.hud.overlay else {
            return;
        };
        if overlay.fade_in(dt) {
            overlay.set_line(0, "IF YOU LIKE MY GAME");
            overlay.set_line(1, "PLEASE RATE IT.");
            self.hud.add_feedback_buttons();
        }
    }

    fn run_ais(&mut self, dt: f32) {
        let snapshots: Vec<TruckSnapshot> = self
            .controllers
            .iter()
            .filter_map(|c| {
                let truck = self.scene.get(c.truck_id()).and_then(RaceEntity::as_truck)?;
                TruckSnapshot::of(c.truck_id(), truck)
            })
            .collect();

        let mut strikes = Vec::new();
        for ai in &mut self.ais {
            let Some(controller) = self.controllers.get_mut(ai.controller_index()) else {
                continue;
            };
            let id = controller.truck_id();
            let Some(truck) = truck_mut(&mut self.scene, id) else {
                continue;
            };
            strikes.extend(ai.update(dt, id, controller, truck, &snapshots, &mut self.rng));
        }
        for strike in strikes {
            self.apply_strike(strike);
        }
    }

    fn apply_strike(&mut self, strike: Strike) {
        let Some(target) = truck_mut(&mut self.scene, strike.target()) else {
            return;
        };
        if let Strike::Shot { damage, .. } = strike {
            tracing::debug!("{} shot for {}", target.name(), damage);
            target.decrement_health(damage as f32);
        }
        Self::show_sparks(target);
    }

    fn show_sparks(truck: &mut Truck) {
        let height = truck.sprite().size().height;
        truck.set_attached_animation_position(AttachedSlot::Sparks, Point::new(0.0, -height / 2.0));
        truck.activate_attached_animation(AttachedSlot::Sparks, false);
    }

    fn update_race_position(&mut self) {
        self.race_pos.reset_race_position();
        let Some(player_top) = self.player_truck().and_then(|t| t.bounding_rect()).map(|r| r.top) else {
            return;
        };
        for id in &self.opponents {
            if let Some(rect) = self.scene.get(*id).and_then(|e| e.bounding_rect()) {
                self.race_pos.update_race_position(player_top, rect.top);
            }
        }
    }

    fn start_nearby_animals_moving(&mut self) {
        let reach = self.player_position().y + SCREEN_HEIGHT;
        for id in &self.animals {
            if let Some(animal) = self.scene.get_mut(*id).and_then(RaceEntity::as_animal_mut) {
                if animal.position().y <= reach && !animal.is_moving() {
                    animal.start_moving();
                }
            }
        }
    }

    /// Animals and obstacles a screen behind the player are gone for good
    fn remove_off_screen_stuff(&mut self) {
        let behind = self.player_position().y - SCREEN_HEIGHT;
        let scene = &mut self.scene;
        self.animals.retain(|id| {
            let gone = match scene.get_mut(*id).and_then(RaceEntity::as_animal_mut) {
                Some(animal) if animal.position().y <= behind => {
                    animal.stop_moving();
                    true
                }
                Some(_) => false,
                None => return false,
            };
            if gone {
                scene.remove_child(*id);
            }
            !gone
        });
        self.obstacles.retain(|id| match scene.get(*id).and_then(RaceEntity::position) {
            Some(p) if p.y <= behind => {
                scene.remove_child(*id);
                false
            }
            Some(_) => true,
            None => false,
        });
    }

    /// Flames follow their truck until the truck asks for them to go
    fn handle_exhaust_events(&mut self, library: &GameLibrary) {
        for index in 0..self.controllers.len() {
            let truck_id = self.controllers[index].truck_id();
            let Some(truck) = truck_mut(&mut self.scene, truck_id) else {
                continue;
            };
            for event in truck.take_exhaust_events() {
                if let Some(old) = self.exhausts.remove(&truck_id) {
                    self.scene.remove_child(old);
                }
                let ExhaustEvent::Show(kind) = event else {
                    continue;
                };
                let mut flames = match library.exhaust_flames(kind) {
                    Ok(flames) => flames,
                    Err(e) => {
                        tracing::warn!("No exhaust flames for {:?}: {}", kind, e);
                        continue;
                    }
                };
                let Some(truck) = truck_mut(&mut self.scene, truck_id) else {
                    break;
                };
                let offset = flames.position();
                let leader = truck.sprite_mut().drawable_mut().position_tracker();
                flames.set_position(truck.position() + offset);
                flames.set_action(Box::new(FollowAction::new(leader, offset)));
                let id = self.scene.add_child(RaceEntity::Sprite(flames), SPARKS_Z_ORDER);
                self.exhausts.insert(truck_id, id);
            }
        }
    }

    fn update_camera(&mut self) {
        let center = self.screen_to_race_point(Point::default());
        self.scene.set_screen_center(center);
    }

    // -----------------------------------------------------------------------
    // Player input
    // -----------------------------------------------------------------------

    /// Screen-relative point to race coordinates
    pub fn screen_to_race_point(&self, p: Point) -> Point {
        Point::new(p.x, p.y + self.player_position().y + TRUCK_CENTER_VERTICAL_OFFSET)
    }

    /// Device tilt in degrees
    pub fn set_roll_angle(&mut self, degrees: f32) {
        if let Some(truck) = truck_mut(&mut self.scene, self.player) {
            truck.set_roll_angle(degrees);
        }
    }

    pub fn brake_down(&mut self) {
        if self.state != RaceState::RaceFinished {
            if let (Some(c), Some(truck)) = (self.controllers.first_mut(), truck_mut(&mut self.scene, self.player)) {
                c.brake_down(truck);
            }
        }
    }

    pub fn brake_up(&mut self) {
        if self.state != RaceState::RaceFinished {
            if let (Some(c), Some(truck)) = (self.controllers.first_mut(), truck_mut(&mut self.scene, self.player)) {
                c.brake_up(truck);
            }
        }
    }

    pub fn nitro_down(&mut self) {
        if self.state != RaceState::RaceFinished {
            if let (Some(c), Some(truck)) = (self.controllers.first_mut(), truck_mut(&mut self.scene, self.player)) {
                c.nitro_down(truck);
            }
        }
    }

    /// Player fires at an opponent or the police. Returns true when a shot
    /// left the barrel.
    pub fn shoot_at(&mut self, ctx: &GameContext, target: EntityId) -> bool {
        if !self.is_shootable(target) || self.state == RaceState::RaceFinished {
            return false;
        }
        let (Some(from), Some(to)) = (
            self.scene.get(self.player).and_then(RaceEntity::position),
            self.scene.get(target).and_then(RaceEntity::position),
        ) else {
            return false;
        };
        let Some(gun_owner) = self.controllers.first_mut() else {
            return false;
        };
        if gun_owner.is_destroyed() || !gun_owner.shotgun().is_ready_to_shoot() {
            return false;
        }
        gun_owner.shotgun_mut().shoot();
        let damage = gun_owner.shotgun().calculate_damage(from, to);
        if let Some(player) = truck_mut(&mut self.scene, self.player) {
            player.activate_attached_animation(AttachedSlot::ShotgunBlast, false);
        }
        if let Some(sound) = ctx.library.sound(SOUND_SHOTGUN) {
            sound.play();
        }
        if damage > 0 {
            if let Some(sound) = ctx.library.sound(SOUND_GUN_PING) {
                sound.play();
            }
            self.apply_strike(Strike::Shot { target, damage });
        }
        tracing::debug!("Player shot {} for {}", target, damage);
        true
    }

    fn is_shootable(&self, id: EntityId) -> bool {
        id == self.police || self.opponents.contains(&id)
    }

    /// Touch at a screen-relative point: shoots a truck under it and
    /// presses a HUD button under it. Returns true when anything reacted.
    pub fn tap(&mut self, ctx: &mut GameContext, p: Point) -> bool {
        let race_point = self.screen_to_race_point(p);
        let target = self
            .opponents
            .iter()
            .chain(std::iter::once(&self.police))
            .copied()
            .find(|id| {
                self.scene
                    .get(*id)
                    .and_then(RaceEntity::as_truck)
                    .is_some_and(|t| t.contains_point(race_point))
            });
        let shot = target.is_some_and(|id| self.shoot_at(ctx, id));
        let pressed = match self.hud.button_at(p) {
            Some(button) => self.press_button(ctx, button),
            None => false,
        };
        shot || pressed
    }

    /// Release of a HUD button. Buttons not currently shown are ignored.
    pub fn press_button(&mut self, ctx: &mut GameContext, button: ButtonType) -> bool {
        if !self.hud.active_buttons().contains(&button) {
            return false;
        }
        tracing::debug!("Button {:?}", button);
        match button {
            ButtonType::Menu | ButtonType::BackToMenu => {
                ctx.library.set_sfx_gain(0.0);
                self.events.push(RaceEvent::ReturnToMenu { paused: self.state != RaceState::RaceFinished });
            }
            ButtonType::RateIt => {
                self.save_feedback(ctx);
                self.events.push(RaceEvent::OpenMarket);
            }
            ButtonType::Later => self.leave_feedback_screen(ctx),
            ButtonType::Never => {
                self.save_feedback(ctx);
                self.leave_feedback_screen(ctx);
            }
            ButtonType::Brake | ButtonType::Shot => return false,
        }
        true
    }

    fn save_feedback(&self, ctx: &mut GameContext) {
        if let Err(e) = ctx.feedback.record_answer() {
            tracing::warn!("Could not save feedback answer: {}", e);
        }
    }

    fn leave_feedback_screen(&mut self, ctx: &mut GameContext) {
        self.hud.hide_overlay();
        self.show_feedback = false;
        self.finish_count = 0;
        self.hud.show_overlay(3, 200.0);
        self.finish_screen(ctx, 0.0);
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn drain_events(&mut self) -> Vec<RaceEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn state(&self) -> RaceState {
        self.state
    }

    pub fn track(&self) -> &RaceTrack {
        &self.track
    }

    pub fn road(&self) -> &RoadBound {
        &self.road
    }

    /// Simulated seconds since the race was laid out
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Elapsed time when the player finished
    pub fn race_time(&self) -> f32 {
        self.race_time
    }

    pub fn race_position(&self) -> i32 {
        self.race_pos.race_position()
    }

    pub fn race_position_label(&self) -> String {
        self.race_pos.label()
    }

    pub fn race_length(&self) -> f32 {
        self.race_length
    }

    pub fn finish_line_y(&self) -> f32 {
        self.finish_line_y
    }

    pub fn finish_count(&self) -> u32 {
        self.finish_count
    }

    pub fn is_feedback_prompt_pending(&self) -> bool {
        self.show_feedback
    }

    pub fn player_id(&self) -> EntityId {
        self.player
    }

    pub fn police_id(&self) -> EntityId {
        self.police
    }

    pub fn opponents(&self) -> &[EntityId] {
        &self.opponents
    }

    pub fn civil_cars(&self) -> &[EntityId] {
        &self.civil_cars
    }

    pub fn animals(&self) -> &[EntityId] {
        &self.animals
    }

    pub fn obstacles(&self) -> &[EntityId] {
        &self.obstacles
    }

    pub fn exhaust_of(&self, truck: EntityId) -> Option<EntityId> {
        self.exhausts.get(&truck).copied()
    }

    pub fn entity(&self, id: EntityId) -> Option<&RaceEntity> {
        self.scene.get(id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut RaceEntity> {
        self.scene.get_mut(id)
    }

    pub fn truck(&self, id: EntityId) -> Option<&Truck> {
        self.scene.get(id).and_then(RaceEntity::as_truck)
    }

    pub fn player_truck(&self) -> Option<&Truck> {
        self.truck(self.player)
    }

    fn player_position(&self) -> Point {
        self.player_truck().map(Truck::position).unwrap_or(PLAYER_START)
    }

    /// `None` only while no race is laid out, e.g. after a failed restart
    pub fn player_controller(&self) -> Option<&TruckController> {
        self.controllers.first()
    }

    pub fn controllers(&self) -> &[TruckController] {
        &self.controllers
    }

    pub fn ais(&self) -> &[DrivingAi] {
        &self.ais
    }

    pub fn hud(&self) -> &Hud {
        &self.hud
    }

    pub fn screen(&self) -> Rectangle {
        self.scene.screen()
    }
}
