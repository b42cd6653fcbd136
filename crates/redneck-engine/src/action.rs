//! Time-based actions applied to a drawable every frame
//!
//! Every action here is continuous: it keeps running until the owner replaces
//! or clears it. A zero `dt` never changes the target.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::geometry::Point;

/// Shared, read-mostly view of an entity's position. The owner publishes,
/// followers read.
pub type PositionHandle = Rc<Cell<Point>>;

/// The mutable part of a drawable that actions operate on
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Placement {
    pub position: Point,
    /// Degrees
    pub rotation: f32,
}

pub trait Action: fmt::Debug {
    fn apply(&mut self, target: &mut Placement, now: f32, dt: f32);

    /// Expired actions are dropped by the drawable after the update pass
    fn is_expired(&self) -> bool {
        false
    }
}

/// Constant velocity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveAction {
    pub vx: f32,
    pub vy: f32,
}

impl MoveAction {
    pub fn new(vx: f32, vy: f32) -> Self {
        Self { vx, vy }
    }
}

impl Action for MoveAction {
    fn apply(&mut self, target: &mut Placement, _now: f32, dt: f32) {
        if dt == 0.0 {
            return;
        }
        target.position.x += self.vx * dt;
        target.position.y += self.vy * dt;
    }
}

/// Constant acceleration from rest, optionally capped on the y axis.
///
/// Displacement per tick is the exact integral of `a·s` over the tick, where
/// `t` is the action's running time including this tick:
/// `Δd = -½·a·Δt·(Δt − 2t)`. Once `t·a_y` exceeds the cap the y axis moves at
/// the cap instead. The x axis is never capped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccelerateAction {
    ax: f32,
    ay: f32,
    max_speed: Option<f32>,
    elapsed: f32,
}

impl AccelerateAction {
    pub fn new(ax: f32, ay: f32) -> Self {
        Self { ax, ay, max_speed: None, elapsed: 0.0 }
    }

    pub fn with_max_speed(ax: f32, ay: f32, max_speed: f32) -> Self {
        Self { ax, ay, max_speed: Some(max_speed), elapsed: 0.0 }
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

impl Action for AccelerateAction {
    fn apply(&mut self, target: &mut Placement, _now: f32, dt: f32) {
        if dt == 0.0 {
            return;
        }
        self.elapsed += dt;
        let t = self.elapsed;

        let speed = t * self.ay;
        match self.max_speed {
            Some(max) if speed > max => target.position.y += max * dt,
            _ => target.position.y += -0.5 * self.ay * dt * (dt - 2.0 * t),
        }
        target.position.x += -0.5 * self.ax * dt * (dt - 2.0 * t);
    }
}

/// Constant angular velocity, clamped to an absolute angle range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotateAction {
    pub speed: f32,
    pub min_angle: f32,
    pub max_angle: f32,
}

impl RotateAction {
    pub fn new(speed: f32, min_angle: f32, max_angle: f32) -> Self {
        Self { speed, min_angle, max_angle }
    }
}

impl Action for RotateAction {
    fn apply(&mut self, target: &mut Placement, _now: f32, dt: f32) {
        if dt == 0.0 {
            return;
        }
        target.rotation = (target.rotation + self.speed * dt).clamp(self.min_angle, self.max_angle);
    }
}

/// Keeps the target glued to a leader's published position
pub struct FollowAction {
    leader: PositionHandle,
    pub offset: Point,
}

impl FollowAction {
    pub fn new(leader: PositionHandle, offset: Point) -> Self {
        Self { leader, offset }
    }
}

impl fmt::Debug for FollowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FollowAction")
            .field("leader", &self.leader.get())
            .field("offset", &self.offset)
            .finish()
    }
}

impl Action for FollowAction {
    fn apply(&mut self, target: &mut Placement, _now: f32, dt: f32) {
        if dt == 0.0 {
            return;
        }
        target.position = self.leader.get() + self.offset;
    }
}
