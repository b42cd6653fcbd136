//! Drawable: placement, z-order and the per-frame action queue

use std::cell::Cell;
use std::rc::Rc;

use crate::action::{Action, Placement, PositionHandle};
use crate::geometry::{Point, Rectangle};

/// How a drawable's position is read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositionInterpretation {
    /// World coordinates
    #[default]
    Origin,
    /// Relative to the centre of the screen rectangle
    Screen,
}

#[derive(Debug, Default)]
pub struct Drawable {
    placement: Placement,
    pub z_order: i32,
    pub interpretation: PositionInterpretation,
    pub visible: bool,
    actions: Vec<Box<dyn Action>>,
    tracker: Option<PositionHandle>,
}

impl Drawable {
    pub fn new() -> Self {
        Self { visible: true, ..Default::default() }
    }

    pub fn position(&self) -> Point {
        self.placement.position
    }

    pub fn set_position(&mut self, position: Point) {
        self.placement.position = position;
        self.publish();
    }

    pub fn rotation(&self) -> f32 {
        self.placement.rotation
    }

    pub fn set_rotation(&mut self, degrees: f32) {
        self.placement.rotation = degrees;
    }

    /// Resolve the position to world coordinates for the given screen
    pub fn resolved_position(&self, screen: &Rectangle) -> Point {
        let p = self.placement.position;
        match self.interpretation {
            PositionInterpretation::Origin => p,
            PositionInterpretation::Screen => Point::new(
                screen.left + screen.width() / 2.0 + p.x,
                screen.bottom + screen.height() / 2.0 + p.y,
            ),
        }
    }

    /// Replace all actions with one
    pub fn set_action(&mut self, action: Box<dyn Action>) {
        self.actions.clear();
        self.actions.push(action);
    }

    pub fn add_action(&mut self, action: Box<dyn Action>) {
        self.actions.push(action);
    }

    pub fn clear_actions(&mut self) {
        self.actions.clear();
    }

    pub fn has_actions(&self) -> bool {
        !self.actions.is_empty()
    }

    /// Apply every action in insertion order, then drop the expired ones
    pub fn update(&mut self, now: f32, dt: f32) {
        for action in self.actions.iter_mut() {
            action.apply(&mut self.placement, now, dt);
        }
        self.actions.retain(|a| !a.is_expired());
        self.publish();
    }

    /// Shared handle that always holds this drawable's latest position
    pub fn position_tracker(&mut self) -> PositionHandle {
        let position = self.placement.position;
        self.tracker
            .get_or_insert_with(|| Rc::new(Cell::new(position)))
            .clone()
    }

    fn publish(&self) {
        if let Some(tracker) = &self.tracker {
            tracker.set(self.placement.position);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{MoveAction, RotateAction};

    #[derive(Debug)]
    struct Nudge {
        left: u32,
    }

    impl Action for Nudge {
        fn apply(&mut self, target: &mut Placement, _now: f32, _dt: f32) {
            target.position.x += 1.0;
            self.left = self.left.saturating_sub(1);
        }

        fn is_expired(&self) -> bool {
            self.left == 0
        }
    }

    #[test]
    fn set_action_replaces_queue() {
        let mut d = Drawable::new();
        d.add_action(Box::new(MoveAction::new(1.0, 0.0)));
        d.add_action(Box::new(MoveAction::new(1.0, 0.0)));
        d.set_action(Box::new(MoveAction::new(0.0, 10.0)));
        d.update(0.0, 1.0);
        assert_eq!(d.position(), Point::new(0.0, 10.0));
    }

    #[test]
    fn actions_apply_in_order_and_persist() {
        let mut d = Drawable::new();
        d.set_action(Box::new(MoveAction::new(2.0, 0.0)));
        d.add_action(Box::new(RotateAction::new(10.0, 0.0, 15.0)));
        d.update(0.0, 1.0);
        d.update(1.0, 1.0);
        assert_eq!(d.position(), Point::new(4.0, 0.0));
        assert_eq!(d.rotation(), 15.0);
        assert!(d.has_actions());
        d.clear_actions();
        assert!(!d.has_actions());
    }

    #[test]
    fn expired_actions_are_dropped() {
        let mut d = Drawable::new();
        d.set_action(Box::new(Nudge { left: 2 }));
        d.update(0.0, 0.1);
        assert!(d.has_actions());
        d.update(0.1, 0.1);
        assert!(!d.has_actions());
        d.update(0.2, 0.1);
        assert_eq!(d.position().x, 2.0);
    }

    #[test]
    fn screen_interpretation_offsets_from_centre() {
        let mut d = Drawable::new();
        d.interpretation = PositionInterpretation::Screen;
        d.set_position(Point::new(10.0, -20.0));
        let screen = Rectangle::new(0.0, 480.0, 1800.0, 1000.0);
        assert_eq!(d.resolved_position(&screen), Point::new(250.0, 1380.0));
    }

    #[test]
    fn tracker_follows_updates() {
        let mut d = Drawable::new();
        let tracker = d.position_tracker();
        d.set_action(Box::new(MoveAction::new(0.0, 5.0)));
        d.update(0.0, 2.0);
        assert_eq!(tracker.get(), Point::new(0.0, 10.0));
        d.set_position(Point::new(3.0, 3.0));
        assert_eq!(tracker.get(), Point::new(3.0, 3.0));
    }
}
