//! Stack entity model
//!
//! Owns every dropped item and the side table that maps physics bodies back
//! to items. At most one item is ever in flight (dropped, not yet landed).

use std::collections::{HashMap, HashSet};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::physics::{BodyHandle, ContactStarted, ItemShape, PhysicsBackend, item_body};
use crate::consts::{LANDING_ANGULAR_DAMP, LANDING_LINEAR_DAMP};
use crate::difficulty::DifficultyProfile;

/// Stable item identity, never reused within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub u32);

/// One dropped unit
#[derive(Debug, Clone, PartialEq)]
pub struct StackItem {
    pub id: ItemId,
    pub body: BodyHandle,
    /// Last sampled center (y down)
    pub position: Vec2,
    /// Last sampled rotation (radians, unnormalized)
    pub angle: f32,
    pub half_extents: Vec2,
    pub size: f32,
    pub has_landed: bool,
    /// Wall time of the first contact
    pub landed_at: Option<u64>,
    pub dropped_at: u64,
}

#[derive(Debug, Default)]
pub struct StackModel {
    /// Drop order
    items: Vec<StackItem>,
    by_body: HashMap<BodyHandle, ItemId>,
    /// Items whose landing has already been announced
    landed_ids: HashSet<ItemId>,
    last_dropped: Option<ItemId>,
    next_id: u32,
}

impl StackModel {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Default::default()
        }
    }

    /// Create the body and item for a drop
    pub fn spawn<P: PhysicsBackend + ?Sized>(
        &mut self,
        world: &mut P,
        position: Vec2,
        size: f32,
        shape: &ItemShape,
        profile: &DifficultyProfile,
        now: u64,
    ) -> ItemId {
        let body = world.create_body(&item_body(position, size, shape, profile));
        let id = ItemId(self.next_id);
        self.next_id += 1;

        self.items.push(StackItem {
            id,
            body,
            position,
            angle: 0.0,
            half_extents: shape.half_extents(size),
            size,
            has_landed: false,
            landed_at: None,
            dropped_at: now,
        });
        self.by_body.insert(body, id);
        self.last_dropped = Some(id);
        id
    }

    /// Copy sampled poses from the physics world
    pub fn sync<P: PhysicsBackend + ?Sized>(&mut self, world: &P) {
        for item in &mut self.items {
            if let Some(sample) = world.sample(item.body) {
                item.position = sample.position;
                item.angle = sample.angle;
            }
        }
    }

    /// Apply first-contact reports. Marks items landed, damps their residual
    /// motion and returns each newly landed item exactly once.
    pub fn on_contacts<P: PhysicsBackend + ?Sized>(
        &mut self,
        contacts: &[ContactStarted],
        world: &mut P,
        now: u64,
    ) -> Vec<ItemId> {
        let mut newly_landed = Vec::new();
        for contact in contacts {
            for body in [contact.a, contact.b] {
                let Some(&id) = self.by_body.get(&body) else {
                    continue;
                };
                let Some(item) = self.items.iter_mut().find(|i| i.id == id) else {
                    continue;
                };
                if item.has_landed {
                    continue;
                }
                item.has_landed = true;
                item.landed_at = Some(now);

                if let Some(sample) = world.sample(body) {
                    world.set_velocity(body, Vec2::new(sample.velocity.x * LANDING_LINEAR_DAMP, 0.0));
                    world.set_angular_velocity(body, sample.angular_velocity * LANDING_ANGULAR_DAMP);
                }
                if self.landed_ids.insert(id) {
                    newly_landed.push(id);
                }
            }
        }
        newly_landed
    }

    /// Remove an item and its body
    pub fn remove<P: PhysicsBackend + ?Sized>(&mut self, world: &mut P, id: ItemId) -> Option<StackItem> {
        let index = self.items.iter().position(|i| i.id == id)?;
        let item = self.items.remove(index);
        world.remove(item.body);
        self.by_body.remove(&item.body);
        if self.last_dropped == Some(id) {
            self.last_dropped = None;
        }
        Some(item)
    }

    /// Highest landed item on screen (smallest y)
    pub fn topmost_landed(&self) -> Option<ItemId> {
        self.items
            .iter()
            .filter(|i| i.has_landed)
            .min_by(|a, b| a.position.y.total_cmp(&b.position.y))
            .map(|i| i.id)
    }

    pub fn landed_count(&self) -> usize {
        self.items.iter().filter(|i| i.has_landed).count()
    }

    /// The dropped item that has not touched anything yet
    pub fn in_flight(&self) -> Option<&StackItem> {
        self.last_dropped
            .and_then(|id| self.get(id))
            .filter(|i| !i.has_landed)
    }

    pub fn get(&self, id: ItemId) -> Option<&StackItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn items(&self) -> &[StackItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Forget everything; the caller resets the physics world
    pub fn clear(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::physics::ScriptedWorld;
    use crate::theme::ThemeKind;

    fn spawn_at(stack: &mut StackModel, world: &mut ScriptedWorld, y: f32) -> ItemId {
        let shape = ThemeKind::Pancake.theme().item_shape;
        stack.spawn(world, Vec2::new(200.0, y), 1.0, &shape, &DifficultyProfile::default(), 0)
    }

    #[test]
    fn test_landing_is_reported_once_and_damps_motion() {
        let mut world = ScriptedWorld::frozen();
        let mut stack = StackModel::new();
        let id = spawn_at(&mut stack, &mut world, 100.0);
        let body = stack.get(id).expect("item").body;
        world.set_velocity(body, Vec2::new(40.0, 300.0));
        world.set_angular_velocity(body, 2.0);

        let contacts = [ContactStarted { a: body, b: BodyHandle(999) }];
        let landed = stack.on_contacts(&contacts, &mut world, 1_000);
        assert_eq!(landed, vec![id]);
        let item = stack.get(id).expect("item");
        assert!(item.has_landed);
        assert_eq!(item.landed_at, Some(1_000));

        let sample = world.sample(body).expect("body");
        assert!((sample.velocity.x - 4.0).abs() < 1e-5);
        assert_eq!(sample.velocity.y, 0.0);
        assert!((sample.angular_velocity - 0.1).abs() < 1e-6);

        // A second report for the same body changes nothing
        assert!(stack.on_contacts(&contacts, &mut world, 2_000).is_empty());
        assert_eq!(stack.get(id).expect("item").landed_at, Some(1_000));
    }

    #[test]
    fn test_two_items_landing_on_each_other() {
        let mut world = ScriptedWorld::frozen();
        let mut stack = StackModel::new();
        let first = spawn_at(&mut stack, &mut world, 600.0);
        let first_body = stack.get(first).expect("first").body;
        stack.on_contacts(&[ContactStarted { a: first_body, b: BodyHandle(999) }], &mut world, 10);

        let second = spawn_at(&mut stack, &mut world, 100.0);
        let second_body = stack.get(second).expect("second").body;
        let landed = stack.on_contacts(&[ContactStarted { a: first_body, b: second_body }], &mut world, 20);
        assert_eq!(landed, vec![second]);
        assert_eq!(stack.landed_count(), 2);
    }

    #[test]
    fn test_topmost_landed_ignores_in_flight() {
        let mut world = ScriptedWorld::frozen();
        let mut stack = StackModel::new();
        let low = spawn_at(&mut stack, &mut world, 640.0);
        let high = spawn_at(&mut stack, &mut world, 600.0);
        for id in [low, high] {
            let body = stack.get(id).expect("item").body;
            stack.on_contacts(&[ContactStarted { a: body, b: BodyHandle(999) }], &mut world, 0);
        }
        let flying = spawn_at(&mut stack, &mut world, 90.0);
        stack.sync(&world);

        assert_eq!(stack.in_flight().map(|i| i.id), Some(flying));
        assert_eq!(stack.topmost_landed(), Some(high));

        stack.remove(&mut world, high);
        assert_eq!(stack.topmost_landed(), Some(low));
        assert_eq!(world.body_count(), 2);
    }

    #[test]
    fn test_removing_in_flight_frees_slot() {
        let mut world = ScriptedWorld::frozen();
        let mut stack = StackModel::new();
        let id = spawn_at(&mut stack, &mut world, 90.0);
        assert!(stack.in_flight().is_some());
        stack.remove(&mut world, id);
        assert!(stack.in_flight().is_none());
        assert!(stack.is_empty());
    }
}
