//! Physics adapter
//!
//! The rigid-body engine is authoritative for positions, angles and
//! velocities. Game code never integrates motion itself; it creates bodies,
//! steps the world, drains first-contact pairs and samples poses.

mod rapier;
mod scripted;

pub use rapier::RapierWorld;
pub use scripted::ScriptedWorld;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::difficulty::DifficultyProfile;

/// Opaque body identifier issued by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Static,
    Dynamic,
}

/// Box body description (screen space, y down)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDesc {
    pub kind: BodyKind,
    pub center: Vec2,
    pub half_extents: Vec2,
    pub friction: f32,
    pub friction_static: f32,
    /// Fraction of velocity lost per tick to air drag
    pub air_friction: f32,
    /// Corner rounding radius
    pub chamfer: f32,
}

impl BodyDesc {
    pub fn fixed(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            kind: BodyKind::Static,
            center,
            half_extents,
            friction: 0.1,
            friction_static: 0.5,
            air_friction: 0.0,
            chamfer: 0.0,
        }
    }
}

/// Pose and motion sampled after a step
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BodySample {
    pub position: Vec2,
    pub angle: f32,
    pub velocity: Vec2,
    pub angular_velocity: f32,
}

/// First contact between two bodies during a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactStarted {
    pub a: BodyHandle,
    pub b: BodyHandle,
}

impl ContactStarted {
    pub fn involves(&self, handle: BodyHandle) -> bool {
        self.a == handle || self.b == handle
    }
}

/// Contract every physics engine wrapper fulfils
pub trait PhysicsBackend {
    /// Drop every body and restart with the given gravity multiplier
    fn reset(&mut self, gravity: f32);
    fn create_body(&mut self, desc: &BodyDesc) -> BodyHandle;
    fn step(&mut self, dt_ms: f32);
    /// First-contact pairs reported since the last drain
    fn drain_contacts(&mut self) -> Vec<ContactStarted>;
    fn remove(&mut self, handle: BodyHandle);
    fn sample(&self, handle: BodyHandle) -> Option<BodySample>;
    fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec2);
    fn set_angular_velocity(&mut self, handle: BodyHandle, angular_velocity: f32);
}

/// Collision box of an item at size factor 1.0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemShape {
    pub half_width: f32,
    pub half_height: f32,
    /// Corner rounding per unit of size, capped at `max_chamfer`
    pub chamfer_per_size: f32,
    pub max_chamfer: f32,
}

impl ItemShape {
    #[inline]
    pub fn half_extents(&self, size: f32) -> Vec2 {
        Vec2::new(self.half_width * size, self.half_height * size)
    }

    #[inline]
    pub fn chamfer(&self, size: f32) -> f32 {
        (self.chamfer_per_size * size).min(self.max_chamfer)
    }
}

/// Body description for a dropped item at the given size factor
pub fn item_body(position: Vec2, size: f32, shape: &ItemShape, profile: &DifficultyProfile) -> BodyDesc {
    BodyDesc {
        kind: BodyKind::Dynamic,
        center: position,
        half_extents: shape.half_extents(size),
        friction: profile.friction,
        friction_static: profile.friction_static,
        air_friction: 0.05,
        chamfer: shape.chamfer(size),
    }
}

/// Static bodies of the playfield
#[derive(Debug, Clone, Copy)]
pub struct Arena {
    pub floor: BodyHandle,
    pub walls: [BodyHandle; 2],
}

/// Create the plate floor and the two side walls
pub fn build_arena<P: PhysicsBackend + ?Sized>(world: &mut P, profile: &DifficultyProfile) -> Arena {
    let floor_width = PLATE_BASE_WIDTH * FLOOR_WIDTH_RATIO * profile.plate_width;
    let mut floor_desc = BodyDesc::fixed(
        Vec2::new(PLAYFIELD_WIDTH / 2.0, PLATE_Y + FLOOR_THICKNESS / 2.0),
        Vec2::new(floor_width / 2.0, FLOOR_THICKNESS / 2.0),
    );
    floor_desc.friction = profile.friction;
    floor_desc.friction_static = profile.friction_static;
    let floor = world.create_body(&floor_desc);

    let wall_half = Vec2::new(WALL_THICKNESS / 2.0, PLAYFIELD_HEIGHT);
    let left = world.create_body(&BodyDesc::fixed(
        Vec2::new(-WALL_THICKNESS / 2.0, PLAYFIELD_HEIGHT / 2.0),
        wall_half,
    ));
    let right = world.create_body(&BodyDesc::fixed(
        Vec2::new(PLAYFIELD_WIDTH + WALL_THICKNESS / 2.0, PLAYFIELD_HEIGHT / 2.0),
        wall_half,
    ));

    Arena {
        floor,
        walls: [left, right],
    }
}
