//! Redneck engine: a small 2D scene engine
//!
//!   geometry  : points, sizes, y-up rectangles, fuzzy comparisons
//!   action    : time-based mutators (move, accelerate, rotate, follow)
//!   drawable  : placement + action queue
//!   animation : atlas quads and frame animations
//!   sprite    : drawable showing a quad or an animation
//!   collider  : collision capabilities and the sweep-line pass
//!   scene     : entity ownership, update / collisions / draw
//!   atlas     : texture atlas manifest
//!   sound     : audio service seam
//!   render    : rendering service seam

pub mod action;
pub mod animation;
pub mod atlas;
pub mod collider;
pub mod drawable;
pub mod geometry;
pub mod render;
pub mod scene;
pub mod sound;
pub mod sprite;

pub use action::{AccelerateAction, Action, FollowAction, MoveAction, Placement, PositionHandle, RotateAction};
pub use animation::{Animation, LoopMode, Quad};
pub use atlas::TextureAtlas;
pub use collider::{Collidable, Collider, Contact, SweepReport};
pub use drawable::{Drawable, PositionInterpretation};
pub use geometry::{Point, Rectangle, Size};
pub use render::{Color, RecordingBackend, RenderBackend};
pub use scene::{EntityId, Scene, SceneNode};
pub use sound::{SilentSound, Sound, SoundBank, SoundHandle};
pub use sprite::Sprite;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("unknown quad '{0}'")]
    UnknownQuad(String),
    #[error("quad '{quad}' belongs to unloaded group '{group}'")]
    GroupNotLoaded { quad: String, group: String },
    #[error("unknown atlas group '{0}'")]
    UnknownGroup(String),
    #[error("animation needs at least one frame")]
    EmptyAnimation,
    #[error("invalid atlas manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
