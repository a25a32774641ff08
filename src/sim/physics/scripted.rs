//! Deterministic kinematic backend
//!
//! Boxes fall straight down and come to rest on the first static or resting
//! body they overlap horizontally. No rotation dynamics: angles only change
//! through angular velocity or explicit posing. Used for headless replays and
//! tests that need to steer the "physics oracle" precisely.

use std::collections::{BTreeMap, HashSet};

use glam::Vec2;

use super::{BodyDesc, BodyHandle, BodyKind, BodySample, ContactStarted, PhysicsBackend};

/// Gravity multiplier 1.0 in px/s²
const GRAVITY_SCALE: f32 = 1000.0;
/// Vertical slack when deciding whether a body still rests on its support
const REST_EPSILON: f32 = 0.5;

#[derive(Debug, Clone)]
struct ScriptedBody {
    kind: BodyKind,
    half: Vec2,
    position: Vec2,
    angle: f32,
    velocity: Vec2,
    angular_velocity: f32,
    resting: bool,
}

impl ScriptedBody {
    fn top(&self) -> f32 {
        self.position.y - self.half.y
    }

    fn bottom(&self) -> f32 {
        self.position.y + self.half.y
    }

    fn supports(&self) -> bool {
        self.kind == BodyKind::Static || self.resting
    }

    fn overlaps_x(&self, other: &ScriptedBody) -> bool {
        (self.position.x - other.position.x).abs() < self.half.x + other.half.x
    }
}

/// Kinematic stand-in for a rigid-body engine
#[derive(Debug, Clone)]
pub struct ScriptedWorld {
    gravity: f32,
    bodies: BTreeMap<BodyHandle, ScriptedBody>,
    pending: Vec<ContactStarted>,
    touching: HashSet<(BodyHandle, BodyHandle)>,
    next_id: u32,
}

impl ScriptedWorld {
    pub fn new(gravity: f32) -> Self {
        Self {
            gravity,
            bodies: BTreeMap::new(),
            pending: Vec::new(),
            touching: HashSet::new(),
            next_id: 1,
        }
    }

    /// A world where nothing moves unless posed or pushed
    pub fn frozen() -> Self {
        Self::new(0.0)
    }

    /// Teleport a body; posing a dynamic body does not change its resting state
    pub fn set_pose(&mut self, handle: BodyHandle, position: Vec2, angle: f32) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            body.position = position;
            body.angle = angle;
        }
    }

    /// Report a contact as if the engine had detected it during the next step
    pub fn inject_contact(&mut self, a: BodyHandle, b: BodyHandle) {
        self.pending.push(ContactStarted { a, b });
    }

    pub fn is_resting(&self, handle: BodyHandle) -> bool {
        self.bodies.get(&handle).is_some_and(|b| b.resting)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn record_contact(&mut self, a: BodyHandle, b: BodyHandle) {
        let key = if a <= b { (a, b) } else { (b, a) };
        if self.touching.insert(key) {
            self.pending.push(ContactStarted { a, b });
        }
    }

    fn find_support(&self, handle: BodyHandle, prev_bottom: f32, bottom: f32) -> Option<(BodyHandle, f32)> {
        let body = self.bodies.get(&handle)?;
        self.bodies
            .iter()
            .filter(|(other, o)| **other != handle && o.supports() && body.overlaps_x(o))
            .map(|(other, o)| (*other, o.top()))
            .filter(|(_, top)| prev_bottom <= top + REST_EPSILON && bottom >= *top - REST_EPSILON)
            // The highest surface crossed is the one hit first
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }
}

impl Default for ScriptedWorld {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl PhysicsBackend for ScriptedWorld {
    fn reset(&mut self, gravity: f32) {
        let next_id = self.next_id;
        *self = Self::new(gravity);
        self.next_id = next_id;
    }

    fn create_body(&mut self, desc: &BodyDesc) -> BodyHandle {
        let handle = BodyHandle(self.next_id);
        self.next_id += 1;
        self.bodies.insert(
            handle,
            ScriptedBody {
                kind: desc.kind,
                half: desc.half_extents,
                position: desc.center,
                angle: 0.0,
                velocity: Vec2::ZERO,
                angular_velocity: 0.0,
                resting: false,
            },
        );
        handle
    }

    fn step(&mut self, dt_ms: f32) {
        let dt = dt_ms / 1000.0;
        let accel = self.gravity * GRAVITY_SCALE;
        let handles: Vec<BodyHandle> = self
            .bodies
            .iter()
            .filter(|(_, b)| b.kind == BodyKind::Dynamic)
            .map(|(h, _)| *h)
            .collect();

        for handle in handles {
            // Lose support when whatever was underneath disappears
            let still_supported = {
                let Some(body) = self.bodies.get(&handle) else { continue };
                !body.resting
                    || self.bodies.iter().any(|(other, o)| {
                        *other != handle
                            && o.supports()
                            && body.overlaps_x(o)
                            && (o.top() - body.bottom()).abs() <= REST_EPSILON
                    })
            };

            let Some(body) = self.bodies.get_mut(&handle) else { continue };
            if !still_supported {
                body.resting = false;
            }
            body.angle += body.angular_velocity * dt;
            if body.resting {
                continue;
            }
            let prev_bottom = body.bottom();
            body.velocity.y += accel * dt;
            body.position += body.velocity * dt;
            let bottom = body.bottom();
            if accel <= 0.0 && body.velocity.y <= 0.0 {
                continue;
            }

            if let Some((support, top)) = self.find_support(handle, prev_bottom, bottom) {
                if let Some(body) = self.bodies.get_mut(&handle) {
                    body.position.y = top - body.half.y;
                    body.velocity = Vec2::ZERO;
                    body.resting = true;
                }
                self.record_contact(handle, support);
            }
        }
    }

    fn drain_contacts(&mut self) -> Vec<ContactStarted> {
        std::mem::take(&mut self.pending)
    }

    fn remove(&mut self, handle: BodyHandle) {
        self.bodies.remove(&handle);
        self.touching.retain(|(a, b)| *a != handle && *b != handle);
    }

    fn sample(&self, handle: BodyHandle) -> Option<BodySample> {
        self.bodies.get(&handle).map(|b| BodySample {
            position: b.position,
            angle: b.angle,
            velocity: b.velocity,
            angular_velocity: b.angular_velocity,
        })
    }

    fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec2) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            body.velocity = velocity;
        }
    }

    fn set_angular_velocity(&mut self, handle: BodyHandle, angular_velocity: f32) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            body.angular_velocity = angular_velocity;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::difficulty::Difficulty;
    use crate::sim::physics::{ItemShape, build_arena, item_body};
    use crate::theme::ThemeKind;

    fn pancake() -> ItemShape {
        ThemeKind::Pancake.theme().item_shape
    }

    #[test]
    fn test_body_lands_on_floor_once() {
        let profile = Difficulty::Normal.profile();
        let mut world = ScriptedWorld::new(profile.gravity);
        let arena = build_arena(&mut world, &profile);
        let item = world.create_body(&item_body(
            Vec2::new(PLAYFIELD_WIDTH / 2.0, CARRIER_Y),
            1.0,
            &pancake(),
            &profile,
        ));

        let mut contacts = Vec::new();
        for _ in 0..120 {
            world.step(TICK_MS);
            contacts.extend(world.drain_contacts());
        }
        assert_eq!(contacts.len(), 1);
        assert!(contacts[0].involves(item) && contacts[0].involves(arena.floor));
        assert!(world.is_resting(item));
        let sample = world.sample(item).expect("item");
        assert!((sample.position.y - (PLATE_Y - pancake().half_height)).abs() < 1e-3);
    }

    #[test]
    fn test_stacked_body_falls_when_support_removed() {
        let profile = Difficulty::Normal.profile();
        let mut world = ScriptedWorld::new(profile.gravity);
        build_arena(&mut world, &profile);
        let center = Vec2::new(PLAYFIELD_WIDTH / 2.0, CARRIER_Y);
        let shape = pancake();
        let lower = world.create_body(&item_body(center, 1.0, &shape, &profile));
        for _ in 0..120 {
            world.step(TICK_MS);
        }
        let upper = world.create_body(&item_body(center, 1.0, &shape, &profile));
        for _ in 0..120 {
            world.step(TICK_MS);
        }
        let resting_y = world.sample(upper).expect("upper").position.y;
        assert!((resting_y - (PLATE_Y - 3.0 * shape.half_height)).abs() < 1e-3);

        world.remove(lower);
        for _ in 0..60 {
            world.step(TICK_MS);
        }
        let dropped_y = world.sample(upper).expect("upper").position.y;
        assert!((dropped_y - (PLATE_Y - shape.half_height)).abs() < 1e-3);
    }

    #[test]
    fn test_frozen_world_only_moves_when_posed() {
        let mut world = ScriptedWorld::frozen();
        let handle = world.create_body(&item_body(
            Vec2::new(10.0, 10.0),
            1.0,
            &pancake(),
            &Default::default(),
        ));
        world.step(TICK_MS);
        assert_eq!(world.sample(handle).expect("body").position, Vec2::new(10.0, 10.0));

        world.set_pose(handle, Vec2::new(20.0, 30.0), 0.4);
        world.inject_contact(handle, BodyHandle(99));
        let sample = world.sample(handle).expect("body");
        assert_eq!(sample.position, Vec2::new(20.0, 30.0));
        assert_eq!(world.drain_contacts().len(), 1);
        assert!(world.drain_contacts().is_empty());
    }
}
