//! Collision capabilities and the sweep-line collision pass
//!
//! Every candidate contributes an entry event at its bottom edge and an exit
//! event at its top edge. Events are sorted along y and swept with an active
//! set; pairs are only tested when one of them leaves the set. Each
//! overlapping pair is dispatched at most once per sweep: the exiting entity
//! handles the collision when it checks collisions and collides with the
//! other, otherwise the other entity gets the chance.

use std::collections::{BTreeMap, BTreeSet};

use crate::geometry::{fuzzy_less, Rectangle, DEFAULT_TOLERANCE};
use crate::scene::EntityId;

/// Anything that occupies space
pub trait Collidable {
    /// `None` when the entity currently has no extent
    fn bounding_rect(&self) -> Option<Rectangle>;
}

/// Something that reacts to collisions
pub trait Collider: Collidable {
    fn should_check_for_collision(&self) -> bool {
        false
    }

    fn does_collide_with(&self, other: &dyn Collidable) -> bool {
        match (self.bounding_rect(), other.bounding_rect()) {
            (Some(a), Some(b)) => a.intersecting_with(&b, DEFAULT_TOLERANCE),
            _ => false,
        }
    }

    fn handle_collision(&mut self, _other: &mut Self, _contact: &mut Contact)
    where
        Self: Sized,
    {
    }
}

/// Context handed to a collision handler
#[derive(Debug, Clone)]
pub struct Contact {
    pub now: f32,
    pub dt: f32,
    /// The handling entity
    pub this: EntityId,
    pub other: EntityId,
    removals: Vec<EntityId>,
}

impl Contact {
    pub fn new(now: f32, dt: f32, this: EntityId, other: EntityId) -> Self {
        Self { now, dt, this, other, removals: Vec::new() }
    }

    /// Ask the scene to remove an entity once the sweep has finished
    pub fn remove_later(&mut self, id: EntityId) {
        if !self.removals.contains(&id) {
            self.removals.push(id);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventKind {
    Entry,
    Exit,
}

#[derive(Debug, Clone, Copy)]
struct SweepEvent {
    y: f32,
    kind: EventKind,
    id: EntityId,
}

/// Outcome of one sweep
#[derive(Debug, Default, Clone)]
pub struct SweepReport {
    /// (handler, other) for every dispatched collision, in dispatch order
    pub handled: Vec<(EntityId, EntityId)>,
    /// Removal requests collected from handlers
    pub removals: Vec<EntityId>,
}

/// Stable merge sort on a strict fuzzy order. Equal-within-tolerance keys
/// keep their original relative order. The fuzzy order is not total, so the
/// std sorts are off the table.
fn stable_fuzzy_sort(events: Vec<SweepEvent>, tolerance: f32) -> Vec<SweepEvent> {
    if events.len() <= 1 {
        return events;
    }
    let mut left = events;
    let right = left.split_off(left.len() / 2);
    let left = stable_fuzzy_sort(left, tolerance);
    let right = stable_fuzzy_sort(right, tolerance);

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut li = left.into_iter().peekable();
    let mut ri = right.into_iter().peekable();
    loop {
        match (li.peek(), ri.peek()) {
            (Some(l), Some(r)) => {
                if fuzzy_less(r.y, l.y, tolerance) {
                    merged.extend(ri.next());
                } else {
                    merged.extend(li.next());
                }
            }
            (Some(_), None) => merged.extend(li.next()),
            (None, Some(_)) => merged.extend(ri.next()),
            (None, None) => break,
        }
    }
    merged
}

/// Run one sweep over `candidates`, dispatching handlers on `objects`.
pub fn do_collision_checks<C: Collider>(
    objects: &mut BTreeMap<EntityId, C>,
    candidates: &[EntityId],
    tolerance: f32,
    now: f32,
    dt: f32,
) -> SweepReport {
    let mut entries = Vec::with_capacity(candidates.len());
    let mut exits = Vec::with_capacity(candidates.len());
    for &id in candidates {
        let Some(rect) = objects.get(&id).and_then(|o| o.bounding_rect()) else {
            continue;
        };
        entries.push(SweepEvent { y: rect.bottom, kind: EventKind::Entry, id });
        exits.push(SweepEvent { y: rect.top, kind: EventKind::Exit, id });
    }
    entries.extend(exits);
    let events = stable_fuzzy_sort(entries, tolerance);

    let mut report = SweepReport::default();
    let mut active: BTreeSet<EntityId> = BTreeSet::new();

    for event in events {
        match event.kind {
            EventKind::Entry => {
                active.insert(event.id);
            }
            EventKind::Exit => {
                active.remove(&event.id);
                let Some(mut this) = objects.remove(&event.id) else {
                    continue;
                };
                for &other_id in active.iter() {
                    let Some(mut other) = objects.remove(&other_id) else {
                        continue;
                    };
                    if this.should_check_for_collision() && this.does_collide_with(&other) {
                        let mut contact = Contact::new(now, dt, event.id, other_id);
                        this.handle_collision(&mut other, &mut contact);
                        report.handled.push((event.id, other_id));
                        report.removals.append(&mut contact.removals);
                    } else if other.should_check_for_collision() && other.does_collide_with(&this) {
                        let mut contact = Contact::new(now, dt, other_id, event.id);
                        other.handle_collision(&mut this, &mut contact);
                        report.handled.push((other_id, event.id));
                        report.removals.append(&mut contact.removals);
                    }
                    objects.insert(other_id, other);
                }
                objects.insert(event.id, this);
            }
        }
    }

    if !report.handled.is_empty() {
        tracing::trace!("Sweep dispatched {} collisions", report.handled.len());
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[derive(Debug)]
    struct Block {
        rect: Option<Rectangle>,
        checks: bool,
        hits: Vec<EntityId>,
        remove_other: bool,
    }

    impl Block {
        fn new(rect: Rectangle, checks: bool) -> Self {
            Self { rect: Some(rect), checks, hits: Vec::new(), remove_other: false }
        }
    }

    impl Collidable for Block {
        fn bounding_rect(&self) -> Option<Rectangle> {
            self.rect
        }
    }

    impl Collider for Block {
        fn should_check_for_collision(&self) -> bool {
            self.checks
        }

        fn handle_collision(&mut self, _other: &mut Self, contact: &mut Contact) {
            self.hits.push(contact.other);
            if self.remove_other {
                contact.remove_later(contact.other);
            }
        }
    }

    fn world(blocks: Vec<Block>) -> (BTreeMap<EntityId, Block>, Vec<EntityId>) {
        let mut map = BTreeMap::new();
        let mut ids = Vec::new();
        for (i, p) in blocks.into_iter().enumerate() {
            let id = EntityId(i as u64 + 1);
            map.insert(id, p);
            ids.push(id);
        }
        (map, ids)
    }

    fn key(a: EntityId, b: EntityId) -> (EntityId, EntityId) {
        if a < b { (a, b) } else { (b, a) }
    }

    #[test]
    fn sweep_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(42);
        for round in 0..20 {
            let blocks: Vec<Block> = (0..30)
                .map(|_| {
                    let x = rng.gen_range(-200.0..200.0);
                    let y = rng.gen_range(-200.0..200.0);
                    let w = rng.gen_range(5.0..80.0);
                    let h = rng.gen_range(5.0..80.0);
                    Block::new(Rectangle::new(x, x + w, y + h, y), true)
                })
                .collect();
            let (mut map, ids) = world(blocks);

            let mut expected = BTreeSet::new();
            for (i, a) in ids.iter().enumerate() {
                for b in &ids[i + 1..] {
                    let ra = map[a].rect.unwrap();
                    let rb = map[b].rect.unwrap();
                    if ra.intersecting(&rb) {
                        expected.insert(key(*a, *b));
                    }
                }
            }

            let report = do_collision_checks(&mut map, &ids, DEFAULT_TOLERANCE, 0.0, 0.1);
            let found: BTreeSet<_> = report.handled.iter().map(|(a, b)| key(*a, *b)).collect();
            assert_eq!(found.len(), report.handled.len(), "pair dispatched twice in round {}", round);
            assert_eq!(found, expected, "round {}", round);
        }
    }

    #[test]
    fn exiting_entity_handles_first() {
        // Lower box exits first and checks collisions: it handles.
        let (mut map, ids) = world(vec![
            Block::new(Rectangle::new(0.0, 10.0, 10.0, 0.0), true),
            Block::new(Rectangle::new(5.0, 15.0, 15.0, 5.0), true),
        ]);
        let report = do_collision_checks(&mut map, &ids, DEFAULT_TOLERANCE, 0.0, 0.1);
        assert_eq!(report.handled, vec![(ids[0], ids[1])]);
        assert_eq!(map[&ids[0]].hits, vec![ids[1]]);
        assert!(map[&ids[1]].hits.is_empty());
    }

    #[test]
    fn passive_exiting_entity_lets_other_handle() {
        let (mut map, ids) = world(vec![
            Block::new(Rectangle::new(0.0, 10.0, 10.0, 0.0), false),
            Block::new(Rectangle::new(5.0, 15.0, 15.0, 5.0), true),
        ]);
        let report = do_collision_checks(&mut map, &ids, DEFAULT_TOLERANCE, 0.0, 0.1);
        assert_eq!(report.handled, vec![(ids[1], ids[0])]);
        assert_eq!(map[&ids[1]].hits, vec![ids[0]]);
    }

    #[test]
    fn passive_pairs_are_ignored() {
        let (mut map, ids) = world(vec![
            Block::new(Rectangle::new(0.0, 10.0, 10.0, 0.0), false),
            Block::new(Rectangle::new(5.0, 15.0, 15.0, 5.0), false),
        ]);
        let report = do_collision_checks(&mut map, &ids, DEFAULT_TOLERANCE, 0.0, 0.1);
        assert!(report.handled.is_empty());
    }

    #[test]
    fn entities_without_extent_are_skipped() {
        let mut ghost = Block::new(Rectangle::new(0.0, 10.0, 10.0, 0.0), true);
        ghost.rect = None;
        let (mut map, ids) = world(vec![ghost, Block::new(Rectangle::new(0.0, 10.0, 10.0, 0.0), true)]);
        let report = do_collision_checks(&mut map, &ids, DEFAULT_TOLERANCE, 0.0, 0.1);
        assert!(report.handled.is_empty());
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn removals_are_collected_not_applied() {
        let mut remover = Block::new(Rectangle::new(0.0, 10.0, 10.0, 0.0), true);
        remover.remove_other = true;
        let (mut map, ids) = world(vec![
            remover,
            Block::new(Rectangle::new(5.0, 15.0, 15.0, 5.0), false),
            Block::new(Rectangle::new(2.0, 8.0, 12.0, 1.0), false),
        ]);
        let report = do_collision_checks(&mut map, &ids, DEFAULT_TOLERANCE, 0.0, 0.1);
        assert_eq!(map.len(), 3);
        assert_eq!(report.removals.len(), 2);
    }

    #[test]
    fn fuzzy_sort_is_stable_within_tolerance() {
        let events: Vec<SweepEvent> = [3.0, 1.0, 1.0 + f32::EPSILON, 2.0, 1.0]
            .iter()
            .enumerate()
            .map(|(i, y)| SweepEvent { y: *y, kind: EventKind::Entry, id: EntityId(i as u64) })
            .collect();
        let sorted = stable_fuzzy_sort(events, DEFAULT_TOLERANCE);
        let order: Vec<u64> = sorted.iter().map(|e| e.id.0).collect();
        assert_eq!(order, vec![1, 2, 4, 3, 0]);
    }
}
