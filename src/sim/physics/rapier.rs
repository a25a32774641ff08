//! `rapier2d` backend
//!
//! Runs in screen space with y pointing down, so gravity is a positive y
//! acceleration. Collider handles are mapped back to `BodyHandle`s through a
//! side table; nothing game-specific is stored on rapier's own objects.

use std::collections::HashMap;
use std::sync::Mutex;

use glam::Vec2;
use rapier2d::geometry::CollisionEvent;
use rapier2d::pipeline::{ActiveEvents, EventHandler};
use rapier2d::prelude::{
    CCDSolver, ColliderBuilder, ColliderHandle, ColliderSet, ContactPair, DefaultBroadPhase,
    ImpulseJointSet, IntegrationParameters, IslandManager, MultibodyJointSet, NarrowPhase,
    PhysicsPipeline, QueryPipeline, Real, RigidBodyBuilder, RigidBodyHandle, RigidBodySet, Vector,
};

use super::{BodyDesc, BodyHandle, BodyKind, BodySample, ContactStarted, PhysicsBackend};
use crate::consts::TICK_HZ;

/// Gravity multiplier 1.0 in px/s²
const GRAVITY_SCALE: f32 = 1000.0;

#[derive(Default)]
struct ContactCollector {
    started: Mutex<Vec<(ColliderHandle, ColliderHandle)>>,
}

impl ContactCollector {
    fn drain(&self) -> Vec<(ColliderHandle, ColliderHandle)> {
        if let Ok(mut events) = self.started.lock() {
            std::mem::take(&mut *events)
        } else {
            Vec::new()
        }
    }
}

impl EventHandler for ContactCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        if let CollisionEvent::Started(a, b, _) = event {
            if let Ok(mut events) = self.started.lock() {
                events.push((a, b));
            }
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

/// Physics world backed by rapier2d
pub struct RapierWorld {
    pipeline: PhysicsPipeline,
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    collector: ContactCollector,
    handles: HashMap<BodyHandle, RigidBodyHandle>,
    collider_owners: HashMap<ColliderHandle, BodyHandle>,
    next_id: u32,
}

impl RapierWorld {
    pub fn new(gravity: f32) -> Self {
        Self {
            pipeline: PhysicsPipeline::new(),
            gravity: Vector::new(0.0, gravity * GRAVITY_SCALE),
            integration_parameters: IntegrationParameters::default(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            collector: ContactCollector::default(),
            handles: HashMap::new(),
            collider_owners: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn body_count(&self) -> usize {
        self.handles.len()
    }
}

impl Default for RapierWorld {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl PhysicsBackend for RapierWorld {
    fn reset(&mut self, gravity: f32) {
        // Handle ids keep counting so stale handles never alias new bodies
        let next_id = self.next_id;
        *self = Self::new(gravity);
        self.next_id = next_id;
    }

    fn create_body(&mut self, desc: &BodyDesc) -> BodyHandle {
        let translation = Vector::new(desc.center.x, desc.center.y);
        let body = match desc.kind {
            BodyKind::Static => RigidBodyBuilder::fixed().translation(translation).build(),
            BodyKind::Dynamic => {
                let damping = desc.air_friction * TICK_HZ as f32;
                RigidBodyBuilder::dynamic()
                    .translation(translation)
                    .linear_damping(damping)
                    .angular_damping(damping)
                    .build()
            }
        };
        let body_handle = self.bodies.insert(body);

        let half = desc.half_extents;
        let builder = if desc.chamfer > 0.0 {
            let r = desc.chamfer.min(half.x).min(half.y);
            ColliderBuilder::round_cuboid(half.x - r, half.y - r, r)
        } else {
            ColliderBuilder::cuboid(half.x, half.y)
        };
        let collider = builder
            .restitution(0.0)
            .friction(desc.friction)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        let collider_handle =
            self.colliders
                .insert_with_parent(collider, body_handle, &mut self.bodies);

        let handle = BodyHandle(self.next_id);
        self.next_id += 1;
        self.handles.insert(handle, body_handle);
        self.collider_owners.insert(collider_handle, handle);
        handle
    }

    fn step(&mut self, dt_ms: f32) {
        self.integration_parameters.dt = dt_ms / 1000.0;
        let hooks = ();
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &hooks,
            &self.collector,
        );
    }

    fn drain_contacts(&mut self) -> Vec<ContactStarted> {
        self.collector
            .drain()
            .into_iter()
            .filter_map(|(a, b)| {
                let a = *self.collider_owners.get(&a)?;
                let b = *self.collider_owners.get(&b)?;
                Some(ContactStarted { a, b })
            })
            .collect()
    }

    fn remove(&mut self, handle: BodyHandle) {
        let Some(body_handle) = self.handles.remove(&handle) else {
            return;
        };
        self.collider_owners.retain(|_, owner| *owner != handle);
        let _ = self.bodies.remove(
            body_handle,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    fn sample(&self, handle: BodyHandle) -> Option<BodySample> {
        let body = self.bodies.get(*self.handles.get(&handle)?)?;
        let translation = body.translation();
        let linvel = body.linvel();
        Some(BodySample {
            position: Vec2::new(translation.x, translation.y),
            angle: body.rotation().angle(),
            velocity: Vec2::new(linvel.x, linvel.y),
            angular_velocity: body.angvel(),
        })
    }

    fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec2) {
        if let Some(body) = self
            .handles
            .get(&handle)
            .and_then(|h| self.bodies.get_mut(*h))
        {
            body.set_linvel(Vector::new(velocity.x, velocity.y), true);
        }
    }

    fn set_angular_velocity(&mut self, handle: BodyHandle, angular_velocity: f32) {
        if let Some(body) = self
            .handles
            .get(&handle)
            .and_then(|h| self.bodies.get_mut(*h))
        {
            body.set_angvel(angular_velocity, true);
        }
    }
}
