//! Scene graph: owns entities, drives update, collisions and drawing
//!
//! Two collections live in one scene:
//!   - generic children: updated and drawn, never collision-tested
//!   - collidable children: updated, drawn and fed to the sweep
//!
//! Entities are addressed by [`EntityId`]; ids grow monotonically so id
//! order is insertion order.

use std::collections::BTreeMap;

use crate::collider::{do_collision_checks, Collider, SweepReport};
use crate::geometry::{Point, Rectangle, Size, DEFAULT_TOLERANCE};
use crate::render::RenderBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct EntityId(pub u64);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Per-frame behaviour every scene entity provides
pub trait SceneNode: Collider {
    fn update(&mut self, now: f32, dt: f32);
    fn draw(&self, screen: &Rectangle, backend: &mut dyn RenderBackend);
}

#[derive(Debug, Clone, Copy)]
struct ChildInfo {
    id: EntityId,
    z_order: i32,
}

#[derive(Debug)]
pub struct Scene<N: SceneNode> {
    nodes: BTreeMap<EntityId, N>,
    generic: Vec<ChildInfo>,
    collidable: Vec<ChildInfo>,
    next_id: u64,
    /// Fuzzy tolerance for the collision sort
    pub tolerance: f32,
    screen: Rectangle,
}

impl<N: SceneNode> Scene<N> {
    pub fn new(screen_size: Size) -> Self {
        Self {
            nodes: BTreeMap::new(),
            generic: Vec::new(),
            collidable: Vec::new(),
            next_id: 1,
            tolerance: DEFAULT_TOLERANCE,
            screen: Rectangle::make_centered_on(
                Point::new(0.0, screen_size.height / 2.0),
                screen_size,
            ),
        }
    }

    // -----------------------------------------------------------------------
    // Children
    // -----------------------------------------------------------------------

    pub fn add_child(&mut self, node: N, z_order: i32) -> EntityId {
        let id = self.allocate(node);
        self.generic.push(ChildInfo { id, z_order });
        id
    }

    pub fn add_collidable_child(&mut self, node: N, z_order: i32) -> EntityId {
        let id = self.allocate(node);
        self.collidable.push(ChildInfo { id, z_order });
        id
    }

    fn allocate(&mut self, node: N) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, node);
        id
    }

    /// Remove an entity from whichever collection holds it
    pub fn remove_child(&mut self, id: EntityId) -> Option<N> {
        self.generic.retain(|c| c.id != id);
        self.collidable.retain(|c| c.id != id);
        self.nodes.remove(&id)
    }

    pub fn remove_all_children(&mut self) {
        self.generic.clear();
        self.collidable.clear();
        self.nodes.clear();
    }

    pub fn get(&self, id: EntityId) -> Option<&N> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut N> {
        self.nodes.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_collidable(&self, id: EntityId) -> bool {
        self.collidable.iter().any(|c| c.id == id)
    }

    pub fn collidable_count(&self) -> usize {
        self.collidable.len()
    }

    // -----------------------------------------------------------------------
    // Camera
    // -----------------------------------------------------------------------

    pub fn screen(&self) -> Rectangle {
        self.screen
    }

    pub fn set_screen_center(&mut self, center: Point) {
        self.screen = Rectangle::make_centered_on(center, self.screen.size());
    }

    // -----------------------------------------------------------------------
    // Frame
    // -----------------------------------------------------------------------

    /// Update every entity in insertion order. No collision checks here.
    pub fn update(&mut self, now: f32, dt: f32) {
        for node in self.nodes.values_mut() {
            node.update(now, dt);
        }
    }

    /// Sweep the collidable children, then apply removals requested by
    /// the handlers.
    pub fn handle_collisions(&mut self, now: f32, dt: f32) -> SweepReport {
        let candidates: Vec<EntityId> = self.collidable.iter().map(|c| c.id).collect();
        let report = do_collision_checks(&mut self.nodes, &candidates, self.tolerance, now, dt);
        for id in &report.removals {
            tracing::debug!("Removing {} after collision", id);
            self.remove_child(*id);
        }
        report
    }

    /// Draw in ascending z-order; generic children come first on ties
    pub fn draw(&self, backend: &mut dyn RenderBackend) {
        let mut order: Vec<ChildInfo> = self.generic.iter().chain(self.collidable.iter()).copied().collect();
        order.sort_by_key(|c| c.z_order);
        for child in order {
            if let Some(node) = self.nodes.get(&child.id) {
                node.draw(&self.screen, backend);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collider::{Collidable, Contact};
    use crate::render::{Color, DrawCommand, RecordingBackend};

    #[derive(Debug)]
    struct Block {
        label: &'static str,
        rect: Rectangle,
        checks: bool,
        updates: u32,
        eat_on_hit: bool,
    }

    impl Block {
        fn new(label: &'static str, rect: Rectangle, checks: bool) -> Self {
            Self { label, rect, checks, updates: 0, eat_on_hit: false }
        }
    }

    impl Collidable for Block {
        fn bounding_rect(&self) -> Option<Rectangle> {
            Some(self.rect)
        }
    }

    impl Collider for Block {
        fn should_check_for_collision(&self) -> bool {
            self.checks
        }

        fn handle_collision(&mut self, _other: &mut Self, contact: &mut Contact) {
            if self.eat_on_hit {
                contact.remove_later(contact.other);
            }
        }
    }

    impl SceneNode for Block {
        fn update(&mut self, _now: f32, _dt: f32) {
            self.updates += 1;
        }

        fn draw(&self, _screen: &Rectangle, backend: &mut dyn RenderBackend) {
            backend.draw_text(self.label, Point::default(), 10.0, Color::WHITE);
        }
    }

    fn unit(x: f32) -> Rectangle {
        Rectangle::new(x, x + 10.0, 10.0, 0.0)
    }

    #[test]
    fn children_live_in_one_collection() {
        let mut scene = Scene::new(Size::new(480.0, 800.0));
        let a = scene.add_child(Block::new("a", unit(0.0), false), 0);
        let b = scene.add_collidable_child(Block::new("b", unit(0.0), true), 0);
        assert!(!scene.is_collidable(a));
        assert!(scene.is_collidable(b));
        assert!(scene.remove_child(b).is_some());
        assert_eq!(scene.collidable_count(), 0);
        assert!(scene.remove_child(b).is_none());
        scene.remove_all_children();
        assert!(scene.is_empty());
        assert!(!scene.contains(a));
    }

    #[test]
    fn update_reaches_both_collections() {
        let mut scene = Scene::new(Size::new(480.0, 800.0));
        let a = scene.add_child(Block::new("a", unit(0.0), false), 0);
        let b = scene.add_collidable_child(Block::new("b", unit(50.0), true), 0);
        scene.update(0.0, 0.1);
        scene.update(0.1, 0.1);
        assert_eq!(scene.get(a).unwrap().updates, 2);
        assert_eq!(scene.get(b).unwrap().updates, 2);
    }

    #[test]
    fn generic_children_never_collide() {
        let mut scene = Scene::new(Size::new(480.0, 800.0));
        scene.add_child(Block::new("ghost", unit(0.0), true), 0);
        scene.add_collidable_child(Block::new("solid", unit(5.0), true), 0);
        let report = scene.handle_collisions(0.0, 0.1);
        assert!(report.handled.is_empty());
    }

    #[test]
    fn collision_removals_apply_after_sweep() {
        let mut scene = Scene::new(Size::new(480.0, 800.0));
        let mut eater = Block::new("eater", unit(0.0), true);
        eater.eat_on_hit = true;
        let eater = scene.add_collidable_child(eater, 0);
        let food = scene.add_collidable_child(Block::new("food", unit(5.0), false), 0);
        let report = scene.handle_collisions(0.0, 0.1);
        assert_eq!(report.handled.len(), 1);
        assert!(scene.contains(eater));
        assert!(!scene.contains(food));
    }

    #[test]
    fn draw_order_is_z_then_generic_first() {
        let mut scene = Scene::new(Size::new(480.0, 800.0));
        scene.add_collidable_child(Block::new("truck", unit(0.0), true), 30);
        scene.add_child(Block::new("hud", unit(0.0), false), 100);
        scene.add_collidable_child(Block::new("obstacle", unit(0.0), true), 10);
        scene.add_child(Block::new("background", unit(0.0), false), -1);
        scene.add_child(Block::new("sparks", unit(0.0), false), 10);
        let mut backend = RecordingBackend::new();
        scene.draw(&mut backend);
        let labels: Vec<String> = backend
            .commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text(t, _) => Some(t.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(labels, vec!["background", "sparks", "obstacle", "truck", "hud"]);
    }

    #[test]
    fn camera_moves_screen() {
        let mut scene: Scene<Block> = Scene::new(Size::new(480.0, 800.0));
        assert_eq!(scene.screen(), Rectangle::new(-240.0, 240.0, 800.0, 0.0));
        scene.set_screen_center(Point::new(0.0, 1000.0));
        assert_eq!(scene.screen(), Rectangle::new(-240.0, 240.0, 1400.0, 600.0));
    }
}
