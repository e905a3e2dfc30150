//! Boundary with the graphics and physics backends
//!
//! Built-in systems reach external subsystems only through these traits.
//! Backends are free to hold whatever native state they like; the core
//! sees opaque handles.

use crate::ecs::Entity;
use crate::math::{Mat4, Quat, Vec2, Vec3};
use std::cell::RefCell;
use std::rc::Rc;

/// Opaque reference to a backend-owned resource (mesh, material, texture).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RenderHandle(pub u64);

/// One mesh draw, already in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    pub entity: Entity,
    pub mesh: RenderHandle,
    pub material: RenderHandle,
    pub world: Mat4,
}

/// Receives draw items during `late_update`.
pub trait DrawSink {
    fn submit(&mut self, item: DrawItem);
}

/// One UI element in screen space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UiItem {
    pub entity: Entity,
    pub position: Vec2,
    pub size: Vec2,
    pub depth: i32,
}

pub trait UiSink {
    fn submit(&mut self, item: UiItem);
}

impl DrawSink for Vec<DrawItem> {
    fn submit(&mut self, item: DrawItem) {
        self.push(item);
    }
}

impl UiSink for Vec<UiItem> {
    fn submit(&mut self, item: UiItem) {
        self.push(item);
    }
}

// Shared sinks let the presenting side read what systems submitted.
impl<S: DrawSink + ?Sized> DrawSink for Rc<RefCell<S>> {
    fn submit(&mut self, item: DrawItem) {
        self.borrow_mut().submit(item);
    }
}

impl<S: UiSink + ?Sized> UiSink for Rc<RefCell<S>> {
    fn submit(&mut self, item: UiItem) {
        self.borrow_mut().submit(item);
    }
}

/// Handle to a body owned by the physics backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(pub u64);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BodyKind {
    #[default]
    Dynamic,
    Kinematic,
    Static,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDesc {
    pub kind: BodyKind,
    pub mass: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicsEventKind {
    Awake,
    Sleep,
    CollisionEnter,
    CollisionStay,
    CollisionExit,
}

/// Notification produced by a physics step.
///
/// `other` is [`Entity::INVALID`] for awake/sleep. Collisions are reported
/// once per pair; the physics system notifies both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicsEvent {
    pub kind: PhysicsEventKind,
    pub entity: Entity,
    pub other: Entity,
}

/// Narrow view of a rigid-body simulation.
pub trait PhysicsWorld {
    fn add_body(&mut self, entity: Entity, desc: BodyDesc, translation: Vec3, rotation: Quat)
        -> BodyHandle;

    fn remove_body(&mut self, body: BodyHandle);

    fn apply_force(&mut self, body: BodyHandle, force: Vec3);

    /// Advance the simulation by exactly `dt` seconds.
    fn step(&mut self, dt: f32);

    /// Simulated world position/rotation of a body.
    fn pose(&self, body: BodyHandle) -> Option<(Vec3, Quat)>;

    /// Events produced since the last drain.
    fn drain_events(&mut self) -> Vec<PhysicsEvent>;
}
