//! Components understood by the built-in systems

use crate::facade::{BodyDesc, BodyHandle, BodyKind, RenderHandle};
use crate::math::{Mat4, Vec2, Vec3};

/// World-space matrix computed from the [`Transform`](crate::math::Transform)
/// hierarchy. Written by the transform system, read by everything after it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldTransform {
    pub matrix: Mat4,
}

impl WorldTransform {
    pub fn translation(&self) -> Vec3 {
        self.matrix.w_axis.truncate()
    }
}

impl Default for WorldTransform {
    fn default() -> Self {
        Self {
            matrix: Mat4::IDENTITY,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeshRenderer {
    pub mesh: RenderHandle,
    pub material: RenderHandle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UiElement {
    pub position: Vec2,
    pub size: Vec2,
    /// Lower depths are submitted first.
    pub depth: i32,
    pub visible: bool,
}

impl UiElement {
    pub fn new(position: Vec2, size: Vec2) -> Self {
        Self {
            position,
            size,
            depth: 0,
            visible: true,
        }
    }
}

/// Marks an entity as simulated by the physics system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidBody {
    pub kind: BodyKind,
    pub mass: f32,
    pending_force: Vec3,
    body: Option<BodyHandle>,
}

impl RigidBody {
    pub fn new(kind: BodyKind, mass: f32) -> Self {
        Self {
            kind,
            mass,
            pending_force: Vec3::ZERO,
            body: None,
        }
    }

    pub fn dynamic(mass: f32) -> Self {
        Self::new(BodyKind::Dynamic, mass)
    }

    /// Accumulate a force applied on the next fixed step.
    pub fn apply_force(&mut self, force: Vec3) {
        self.pending_force += force;
    }

    pub fn pending_force(&self) -> Vec3 {
        self.pending_force
    }

    /// Backend handle, set once the body has been created.
    pub fn body(&self) -> Option<BodyHandle> {
        self.body
    }

    pub(crate) fn take_force(&mut self) -> Vec3 {
        std::mem::take(&mut self.pending_force)
    }

    pub(crate) fn set_body(&mut self, body: BodyHandle) {
        self.body = Some(body);
    }

    pub(crate) fn clear_body(&mut self) {
        self.body = None;
    }

    pub(crate) fn desc(&self) -> BodyDesc {
        BodyDesc {
            kind: self.kind,
            mass: self.mass,
        }
    }
}
