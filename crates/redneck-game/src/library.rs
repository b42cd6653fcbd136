//! Game library: atlas, sounds and entity factories
//!
//! The atlas manifest and the road border files are embedded at compile time.
//! Sounds come from a [`SoundBank`]; headless runs use silent sounds.

use std::sync::Arc;

use redneck_engine::atlas::TextureAtlas;
use redneck_engine::{Animation, EngineError, LoopMode, Point, Quad, SoundBank, SoundHandle, Sprite};

use crate::animal::{Animal, MoveDirection};
use crate::obstacle::Obstacle;
use crate::truck::{Truck, TruckKind};
use crate::{GameError, Result};

// ---------------------------------------------------------------------------
// Embedded data
// ---------------------------------------------------------------------------

const ATLAS_JSON: &str = include_str!("../data/atlas.json");

macro_rules! road_section {
    ($s:literal, $u:literal) => {
        (
            concat!("background_grassy_", $s, "_", $u),
            include_str!(concat!("../data/roads/background_grassy_", $s, "_", $u, ".road")),
        )
    };
}

const ROAD_SECTIONS: [(&str, &str); 20] = [
    road_section!(1, 1), road_section!(1, 2),
    road_section!(2, 1), road_section!(2, 2),
    road_section!(3, 1), road_section!(3, 2),
    road_section!(4, 1), road_section!(4, 2),
    road_section!(5, 1), road_section!(5, 2),
    road_section!(6, 1), road_section!(6, 2),
    road_section!(7, 1), road_section!(7, 2),
    road_section!(8, 1), road_section!(8, 2),
    road_section!(9, 1), road_section!(9, 2),
    road_section!(10, 1), road_section!(10, 2),
];

pub const RACE_GROUP: &str = "race";
pub const BACKGROUND_GROUP: &str = "background_grassy";

// ---------------------------------------------------------------------------
// Sound names
// ---------------------------------------------------------------------------

pub const SOUND_SHOTGUN: &str = "shotgun";
pub const SOUND_GUN_PING: &str = "gun_ping";
pub const SOUND_ROADKILL: &str = "roadkill_hit";
pub const SOUND_MUSIC: &str = "background_music";
pub const SOUND_COPS_COMING: &str = "cops_coming";
pub const SOUND_RACERS_CRASH: &str = "racers_crash";
pub const SOUND_TRUCK_STARTUP: &str = "truck_startup";
pub const SOUND_TRUCK_REV_FADE: &str = "truck_rev_fade";
pub const RAGE_SOUND_COUNT: usize = 6;

// ---------------------------------------------------------------------------
// Catalogue enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TruckColor {
    Red,
    Black,
    Blue,
    Brown,
    Green,
    Yellow,
}

impl TruckColor {
    /// Opponent colours in spawn order
    pub const OPPONENTS: [TruckColor; 5] = [
        TruckColor::Black,
        TruckColor::Blue,
        TruckColor::Brown,
        TruckColor::Green,
        TruckColor::Yellow,
    ];

    pub fn key(self) -> &'static str {
        match self {
            TruckColor::Red => "red",
            TruckColor::Black => "black",
            TruckColor::Blue => "blue",
            TruckColor::Brown => "brown",
            TruckColor::Green => "green",
            TruckColor::Yellow => "yellow",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimalSpecies {
    Armadillo,
    Snake,
    Possum,
    Raccoon,
    Squirrel,
}

impl AnimalSpecies {
    pub const ALL: [AnimalSpecies; 5] = [
        AnimalSpecies::Armadillo,
        AnimalSpecies::Snake,
        AnimalSpecies::Possum,
        AnimalSpecies::Raccoon,
        AnimalSpecies::Squirrel,
    ];

    pub fn key(self) -> &'static str {
        match self {
            AnimalSpecies::Armadillo => "armadillo",
            AnimalSpecies::Snake => "snake",
            AnimalSpecies::Possum => "possum",
            AnimalSpecies::Raccoon => "raccoon",
            AnimalSpecies::Squirrel => "squirrel",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObstacleType {
    Puddle,
    Pothole,
    FatGuy,
    Outhouse,
    Shrub,
    Tree,
    Tractor,
}

impl ObstacleType {
    pub fn key(self) -> &'static str {
        match self {
            ObstacleType::Puddle => "puddle",
            ObstacleType::Pothole => "pothole",
            ObstacleType::FatGuy => "fat_guy",
            ObstacleType::Outhouse => "outhouse",
            ObstacleType::Shrub => "shrub",
            ObstacleType::Tree => "tree",
            ObstacleType::Tractor => "tractor",
        }
    }

    /// Puddles and potholes survive being driven through
    pub fn is_invincible(self) -> bool {
        matches!(self, ObstacleType::Puddle | ObstacleType::Pothole)
    }

    pub fn sound_name(self) -> Option<&'static str> {
        match self {
            ObstacleType::Puddle => Some("puddle_splash"),
            ObstacleType::Pothole => None,
            ObstacleType::FatGuy => Some("fat_guy_splash"),
            ObstacleType::Outhouse => Some("outhouse_smash"),
            ObstacleType::Shrub => Some("hit_bush"),
            ObstacleType::Tree => Some("hit_tree"),
            ObstacleType::Tractor => Some("tractor_crash"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectType {
    Sparks,
    ShotgunBlast,
    FireAndSmoke,
}

impl EffectType {
    fn prefix(self) -> &'static str {
        match self {
            EffectType::Sparks => "sparks_",
            EffectType::ShotgunBlast => "blast_",
            EffectType::FireAndSmoke => "fire_and_smoke_",
        }
    }
}

/// Exhaust flame variants shown during rage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExhaustKind {
    Straight,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonType {
    Brake,
    Shot,
    Menu,
    BackToMenu,
    RateIt,
    Later,
    Never,
}

impl ButtonType {
    pub fn quad_name(self) -> &'static str {
        match self {
            ButtonType::Brake => "button_brake",
            ButtonType::Shot => "button_shotgun",
            ButtonType::Menu => "button_menu",
            ButtonType::BackToMenu => "button_back_to_menu",
            ButtonType::RateIt => "button_rate_it",
            ButtonType::Later => "button_later",
            ButtonType::Never => "button_never",
        }
    }
}

/// Which sprite family a truck is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VehicleModel {
    Truck(TruckColor),
    Car(TruckColor),
    Police,
}

/// Every animation a truck switches between
#[derive(Debug, Clone)]
pub struct TruckVisuals {
    pub stopped: Arc<Quad>,
    pub accelerating: Animation,
    pub driving_straight: Animation,
    pub turning_left: Animation,
    pub driving_left: Animation,
    pub turning_left_to_straight: Animation,
    pub turning_right: Animation,
    pub driving_right: Animation,
    pub turning_right_to_straight: Animation,
}

// ---------------------------------------------------------------------------
// Library
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct GameLibrary {
    atlas: TextureAtlas,
    sounds: SoundBank,
}

impl GameLibrary {
    /// Embedded atlas with a silent sound bank
    pub fn load() -> Result<Self> {
        Self::with_sounds(SoundBank::silent(&Self::sound_names()))
    }

    pub fn with_sounds(sounds: SoundBank) -> Result<Self> {
        let atlas = TextureAtlas::from_json(ATLAS_JSON)?;
        tracing::info!("Game library: {} quads, {} road sections", atlas.len(), ROAD_SECTIONS.len());
        Ok(Self { atlas, sounds })
    }

    /// Every sound the game triggers
    pub fn sound_names() -> Vec<String> {
        let mut names: Vec<String> = [
            SOUND_SHOTGUN,
            SOUND_GUN_PING,
            SOUND_ROADKILL,
            SOUND_MUSIC,
            SOUND_COPS_COMING,
            SOUND_RACERS_CRASH,
            SOUND_TRUCK_STARTUP,
            SOUND_TRUCK_REV_FADE,
            "puddle_splash",
            "fat_guy_splash",
            "outhouse_smash",
            "hit_bush",
            "hit_tree",
            "tractor_crash",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        names.extend((1..=RAGE_SOUND_COUNT).map(|i| format!("rage{}", i)));
        names
    }

    pub fn load_race_atlases(&mut self) -> Result<()> {
        self.atlas.load_group(RACE_GROUP)?;
        self.atlas.load_group(BACKGROUND_GROUP)?;
        Ok(())
    }

    pub fn unload_race_atlases(&mut self) -> Result<()> {
        self.atlas.unload_group(RACE_GROUP)?;
        Ok(())
    }

    /// Library ready for racing: atlas groups loaded
    pub fn load_for_race() -> Result<Self> {
        let mut library = Self::load()?;
        library.load_race_atlases()?;
        Ok(library)
    }

    pub fn atlas(&self) -> &TextureAtlas {
        &self.atlas
    }

    pub fn sounds(&self) -> &SoundBank {
        &self.sounds
    }

    pub fn sound(&self, name: &str) -> Option<SoundHandle> {
        self.sounds.get(name)
    }

    pub fn set_sfx_gain(&self, gain: f32) {
        self.sounds.set_gain_all(gain);
    }

    pub fn set_music_gain(&self, gain: f32) {
        if let Some(music) = self.sounds.get(SOUND_MUSIC) {
            music.set_gain(gain);
        }
    }

    // -----------------------------------------------------------------------
    // Road and backgrounds
    // -----------------------------------------------------------------------

    /// `.road` text for a background subsection
    pub fn road_section(&self, name: &str) -> Result<&'static str> {
        ROAD_SECTIONS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, text)| *text)
            .ok_or_else(|| GameError::MissingRoadSection(name.to_string()))
    }

    pub fn list_background_quads(&self) -> Vec<String> {
        self.atlas.list_quads("background_grassy_")
    }

    pub fn background(&self, name: &str) -> Result<Sprite> {
        Ok(Sprite::with_quad(name, self.atlas.textured_quad(name)?))
    }

    pub fn finish_background(&self) -> Result<Sprite> {
        self.background("background_finish")
    }

    pub fn finish_line(&self) -> Result<Sprite> {
        Ok(Sprite::with_quad("FinishLine", self.atlas.textured_quad("finish_line")?))
    }

    pub fn button(&self, kind: ButtonType) -> Result<Arc<Quad>> {
        Ok(self.atlas.textured_quad(kind.quad_name())?)
    }

    // -----------------------------------------------------------------------
    // Trucks
    // -----------------------------------------------------------------------

    pub fn player_truck(&self) -> Result<Truck> {
        self.build_truck("PlayerTruck", TruckKind::Player, VehicleModel::Truck(TruckColor::Red))
    }

    pub fn opponent_truck(&self, color: TruckColor) -> Result<Truck> {
        self.build_truck(&format!("Opponent{:?}", color), TruckKind::Opponent, VehicleModel::Truck(color))
    }

    pub fn police_truck(&self) -> Result<Truck> {
        self.build_truck("PoliceTruck", TruckKind::Police, VehicleModel::Police)
    }

    pub fn civil_car(&self, color: TruckColor) -> Result<Truck> {
        self.build_truck(&format!("NPC{:?}", color), TruckKind::Civilian, VehicleModel::Car(color))
    }

    fn build_truck(&self, name: &str, kind: TruckKind, model: VehicleModel) -> Result<Truck> {
        let visuals = self.truck_visuals(model)?;
        let sparks = self.effect(EffectType::Sparks)?;
        let rage_sounds = if kind == TruckKind::Player {
            (1..=RAGE_SOUND_COUNT)
                .filter_map(|i| self.sound(&format!("rage{}", i)))
                .collect()
        } else {
            Vec::new()
        };
        Ok(Truck::new(name, kind, visuals, sparks, self.sound(SOUND_RACERS_CRASH), rage_sounds))
    }

    fn truck_visuals(&self, model: VehicleModel) -> Result<TruckVisuals> {
        let (north, turn_left, left) = match model {
            VehicleModel::Truck(c) => (
                format!("truck_{}_north_", c.key()),
                format!("truck_{}_turn_left_", c.key()),
                format!("truck_{}_left_", c.key()),
            ),
            VehicleModel::Car(c) => (
                format!("car_{}_north_", c.key()),
                format!("car_{}_turn_left_", c.key()),
                format!("car_{}_left_", c.key()),
            ),
            VehicleModel::Police => (
                "police_north_".to_string(),
                "police_turn_left_".to_string(),
                "police_left_".to_string(),
            ),
        };
        let north_frames = self.atlas.list_quads(&north);
        let turn_left_frames = self.atlas.list_quads(&turn_left);
        let mut turn_left_back = turn_left_frames.clone();
        turn_left_back.reverse();
        let stopped = self.atlas.textured_quad(north_frames.first().map(String::as_str).unwrap_or(&north))?;

        // Trucks accelerate through the first five frames, then loop the rest.
        // Cars and the police loop all frames.
        let (accelerating, driving_straight) = match model {
            VehicleModel::Truck(_) => (
                self.atlas.animation_from_keys(&north_frames[..5.min(north_frames.len())], LoopMode::PlayOnce, 5.0)?,
                self.atlas.animation_from_keys(&north_frames[5.min(north_frames.len())..], LoopMode::Loop, 15.0)?,
            ),
            VehicleModel::Car(_) | VehicleModel::Police => {
                let driving = self.atlas.animation_from_keys(&north_frames, LoopMode::Loop, 15.0)?;
                (driving.clone(), driving)
            }
        };

        let turning_left = self.atlas.animation_from_keys(&turn_left_frames, LoopMode::Loop, 15.0)?;
        let driving_left = self.atlas.animation_from_keys(&self.atlas.list_quads(&left), LoopMode::Loop, 15.0)?;
        let turning_left_to_straight = self.atlas.animation_from_keys(&turn_left_back, LoopMode::Loop, 15.0)?;

        // The police car has dedicated right-hand frames; everyone else mirrors.
        let (turning_right, driving_right, turning_right_to_straight) = match model {
            VehicleModel::Police => {
                let turn_right_frames = self.atlas.list_quads("police_turn_right_");
                let mut back = turn_right_frames.clone();
                back.reverse();
                (
                    self.atlas.animation_from_keys(&turn_right_frames, LoopMode::Loop, 15.0)?,
                    self.atlas.animation_from_keys(&self.atlas.list_quads("police_right_"), LoopMode::Loop, 15.0)?,
                    self.atlas.animation_from_keys(&back, LoopMode::Loop, 15.0)?,
                )
            }
            _ => (turning_left.clone(), driving_left.clone(), turning_left_to_straight.clone()),
        };

        Ok(TruckVisuals {
            stopped,
            accelerating,
            driving_straight,
            turning_left,
            driving_left,
            turning_left_to_straight,
            turning_right,
            driving_right,
            turning_right_to_straight,
        })
    }

    // -----------------------------------------------------------------------
    // Effects
    // -----------------------------------------------------------------------

    /// Play-once effect animation at the default rate
    pub fn effect(&self, kind: EffectType) -> Result<Animation> {
        let frames = self.atlas.list_quads(kind.prefix());
        Ok(self.atlas.animation_from_keys(&frames, LoopMode::PlayOnce, redneck_engine::animation::DEFAULT_ANIMATION_SPEED)?)
    }

    /// Exhaust flame sprite. Its position is the offset from the truck.
    pub fn exhaust_flames(&self, kind: ExhaustKind) -> Result<Sprite> {
        let frames = self.atlas.list_quads("exhaust_north_");
        let mut anim = self.atlas.animation_from_keys(&frames, LoopMode::Loop, 15.0)?;
        let mut sprite = match kind {
            ExhaustKind::Straight => {
                anim.scale_y = 0.7;
                let mut s = Sprite::with_animation("ExhaustFlameStraight", anim);
                s.set_position(Point::new(0.0, -53.0));
                s
            }
            ExhaustKind::Left => {
                anim.scale_x = 0.6;
                anim.scale_y = 0.6;
                let mut s = Sprite::with_animation("ExhaustFlamesLeft", anim);
                s.set_position(Point::new(24.0, -48.0));
                s.set_rotation(-24.0);
                s
            }
            ExhaustKind::Right => {
                anim.scale_x = 0.6;
                anim.scale_y = 0.6;
                let mut s = Sprite::with_animation("ExhaustFlamesRight", anim);
                s.set_flip_x(true);
                s.set_position(Point::new(-24.0, -48.0));
                s.set_rotation(24.0);
                s
            }
        };
        sprite.set_visible(true);
        Ok(sprite)
    }

    // -----------------------------------------------------------------------
    // Roadside
    // -----------------------------------------------------------------------

    pub fn animal(&self, species: AnimalSpecies, direction: MoveDirection) -> Result<Animal> {
        let alive = self.atlas.list_quads(&format!("{}_alive_", species.key()));
        let anim = self.atlas.animation_from_keys(&alive, LoopMode::Loop, redneck_engine::animation::DEFAULT_ANIMATION_SPEED)?;
        let dead = self.atlas.textured_quad(&format!("{}_dead", species.key()))?;
        Ok(Animal::new(species, anim, dead, direction, self.sound(SOUND_ROADKILL)))
    }

    pub fn obstacle(&self, kind: ObstacleType) -> Result<Obstacle> {
        let (first, hit) = self.first_frame_and_animation(&format!("{}_", kind.key()))?;
        let sound = kind.sound_name().and_then(|n| self.sound(n));
        Ok(Obstacle::new(kind, first, hit, sound))
    }

    /// Resting frame plus the play-once animation of every quad under `prefix`
    fn first_frame_and_animation(&self, prefix: &str) -> Result<(Arc<Quad>, Animation)> {
        let frames = self.atlas.list_quads(prefix);
        let first = frames.first().ok_or(EngineError::EmptyAnimation)?;
        let first = self.atlas.textured_quad(first)?;
        let animation =
            self.atlas.animation_from_keys(&frames, LoopMode::PlayOnce, redneck_engine::animation::DEFAULT_ANIMATION_SPEED)?;
        Ok((first, animation))
    }
}
