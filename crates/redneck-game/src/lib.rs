//! Redneck Racer gameplay
//!
//! Architecture:
//!   library     : atlas, sounds and entity factories
//!   tracks      : track catalogue (piece sequences, spawn ranges)
//!   road_bound  : per-y road edges loaded from `.road` files
//!   truck       : truck entity, turning state machine, collision response
//!   controller  : speed state machine, rage and nitro
//!   ai          : lane keeping, opponent and police behaviour
//!   race_scene  : race orchestration, spawning, HUD overlays

pub mod ai;
pub mod animal;
pub mod best_times;
pub mod context;
pub mod controller;
pub mod destroyer;
pub mod entity;
pub mod feedback;
pub mod hud;
pub mod library;
pub mod obstacle;
pub mod race_pos;
pub mod race_scene;
pub mod road_bound;
pub mod shotgun;
pub mod tracks;
pub mod truck;

pub use context::GameContext;
pub use race_scene::{RaceEvent, RaceScene, RaceState};

use redneck_engine::EngineError;

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("road section '{name}' line {line}: {reason}")]
    RoadParse {
        name: String,
        line: usize,
        reason: String,
    },
    #[error("no road data for section '{0}'")]
    MissingRoadSection(String),
    #[error("feedback store: {0}")]
    Feedback(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GameError>;
