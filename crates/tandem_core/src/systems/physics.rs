//! Fixed-step bridge to the physics backend
//!
//! Each fixed step the system creates bodies for new [`RigidBody`]
//! components, frees bodies whose component went away or whose entity was
//! disabled, rebuilds bodies for replaced components, forwards queued
//! forces, advances the backend, copies poses back into [`Transform`] and
//! finally hands the backend's events to the scripts of the active entities
//! involved. The backend works in world space; parented bodies are converted
//! through their ancestors' transforms in both directions.

use std::collections::HashMap;

use crate::components::RigidBody;
use crate::ecs::{Entity, EntityManager};
use crate::facade::{BodyHandle, BodyKind, PhysicsEvent, PhysicsEventKind, PhysicsWorld};
use crate::math::{Mat4, Transform};
use crate::script::with_script;
use crate::system::System;

pub struct PhysicsSystem {
    world: Box<dyn PhysicsWorld>,
    scene: String,
    bodies: HashMap<Entity, BodyHandle>,
}

impl PhysicsSystem {
    pub fn new(scene: impl Into<String>, world: impl PhysicsWorld + 'static) -> Self {
        Self::from_box(scene, Box::new(world))
    }

    pub fn from_box(scene: impl Into<String>, world: Box<dyn PhysicsWorld>) -> Self {
        Self {
            world,
            scene: scene.into(),
            bodies: HashMap::new(),
        }
    }

    /// Number of bodies currently owned by the backend.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn sync_bodies(&mut self, manager: &mut EntityManager) {
        let stale: Vec<Entity> = self
            .bodies
            .keys()
            .copied()
            .filter(|e| !manager.has_component::<RigidBody>(*e) || !manager.is_active(*e))
            .collect();
        for entity in stale {
            self.release(manager, entity);
        }

        for entity in manager.active_entities::<RigidBody>() {
            let attached = manager
                .get_component::<RigidBody>(entity)
                .and_then(RigidBody::body);
            match self.bodies.get(&entity).copied() {
                Some(body) if attached == Some(body) => continue,
                // The component was swapped for a new one since the body was made.
                Some(_) => self.release(manager, entity),
                None => {}
            }

            let local = manager
                .get_component::<Transform>(entity)
                .copied()
                .unwrap_or_default();
            let (translation, rotation) = match parent_matrix(manager, entity) {
                Some(parent) => {
                    let (_, rotation, translation) =
                        (parent * local.matrix()).to_scale_rotation_translation();
                    (translation, rotation)
                }
                None => (local.translation, local.rotation),
            };
            let Some(rigid_body) = manager.get_component_mut::<RigidBody>(entity) else {
                continue;
            };
            let body = self
                .world
                .add_body(entity, rigid_body.desc(), translation, rotation);
            rigid_body.set_body(body);
            self.bodies.insert(entity, body);
            tracing::trace!(%entity, ?body, "created physics body");
        }
    }

    fn release(&mut self, manager: &mut EntityManager, entity: Entity) {
        let Some(body) = self.bodies.remove(&entity) else {
            return;
        };
        self.world.remove_body(body);
        if let Some(rigid_body) = manager.get_component_mut::<RigidBody>(entity) {
            if rigid_body.body() == Some(body) {
                rigid_body.clear_body();
            }
        }
        tracing::trace!(%entity, ?body, "removed physics body");
    }

    fn apply_forces(&mut self, manager: &mut EntityManager) {
        for entity in manager.active_entities::<RigidBody>() {
            let Some(body) = self.bodies.get(&entity).copied() else {
                continue;
            };
            let force = manager
                .get_component_mut::<RigidBody>(entity)
                .map(RigidBody::take_force)
                .unwrap_or_default();
            if force != crate::math::Vec3::ZERO {
                self.world.apply_force(body, force);
            }
        }
    }

    fn write_back(&self, manager: &mut EntityManager) {
        for entity in manager.active_entities::<RigidBody>() {
            let simulated = manager
                .get_component::<RigidBody>(entity)
                .is_some_and(|rb| rb.kind != BodyKind::Static);
            if !simulated {
                continue;
            }
            let Some((translation, rotation)) =
                self.bodies.get(&entity).and_then(|body| self.world.pose(*body))
            else {
                continue;
            };
            // Backend poses are world space; parented bodies store them relative.
            let (translation, rotation) = match parent_matrix(manager, entity) {
                Some(parent) => {
                    let local = parent.inverse() * Mat4::from_rotation_translation(rotation, translation);
                    let (_, rotation, translation) = local.to_scale_rotation_translation();
                    (translation, rotation)
                }
                None => (translation, rotation),
            };
            match manager.get_component_mut::<Transform>(entity) {
                Some(transform) => {
                    transform.translation = translation;
                    transform.rotation = rotation;
                }
                None => {
                    manager.add_component(
                        entity,
                        Transform::from_translation(translation).with_rotation(rotation),
                    );
                }
            }
        }
    }

    fn dispatch_events(&self, manager: &mut EntityManager, events: Vec<PhysicsEvent>) {
        for event in events {
            let scene = self.scene.as_str();
            match event.kind {
                PhysicsEventKind::Awake if manager.is_active(event.entity) => {
                    with_script(manager, scene, event.entity, |s, ctx| s.on_awake(ctx));
                }
                PhysicsEventKind::Sleep if manager.is_active(event.entity) => {
                    with_script(manager, scene, event.entity, |s, ctx| s.on_sleep(ctx));
                }
                PhysicsEventKind::Awake | PhysicsEventKind::Sleep => {}
                kind => {
                    for (me, other) in [(event.entity, event.other), (event.other, event.entity)] {
                        if !manager.is_active(me) {
                            continue;
                        }
                        with_script(manager, scene, me, |s, ctx| match kind {
                            PhysicsEventKind::CollisionEnter => s.on_collision_enter(ctx, other),
                            PhysicsEventKind::CollisionStay => s.on_collision_stay(ctx, other),
                            _ => s.on_collision_exit(ctx, other),
                        });
                    }
                }
            }
        }
    }
}

/// Composed `Transform` of every ancestor of `entity`, `None` for roots.
fn parent_matrix(manager: &EntityManager, entity: Entity) -> Option<Mat4> {
    let mut ancestor = manager.parent(entity)?;
    let mut matrix = Mat4::IDENTITY;
    loop {
        let local = manager
            .get_component::<Transform>(ancestor)
            .map_or(Mat4::IDENTITY, Transform::matrix);
        matrix = local * matrix;
        match manager.parent(ancestor) {
            Some(next) => ancestor = next,
            None => return Some(matrix),
        }
    }
}

impl System for PhysicsSystem {
    fn fixed_update(&mut self, manager: &mut EntityManager, dt: f32) {
        self.sync_bodies(manager);
        self.apply_forces(manager);
        self.world.step(dt);
        self.write_back(manager);
        let events = self.world.drain_events();
        self.dispatch_events(manager, events);
    }
}

impl Drop for PhysicsSystem {
    fn drop(&mut self) {
        for (_, body) in self.bodies.drain() {
            self.world.remove_body(body);
        }
    }
}
