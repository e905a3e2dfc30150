//! Headless demo content: a tiny Euler physics backend, counting sinks and
//! a gameplay layer that drops a few bodies onto the ground.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tandem_core::components::{MeshRenderer, RigidBody, UiElement};
use tandem_core::ecs::Entity;
use tandem_core::facade::{
    BodyDesc, BodyHandle, BodyKind, DrawItem, DrawSink, PhysicsEvent, PhysicsEventKind,
    PhysicsWorld, RenderHandle, UiItem, UiSink,
};
use tandem_core::math::{Quat, Transform, Vec2, Vec3};
use tandem_core::script::{Script, ScriptContext, Scripted};
use tandem_core::systems::Backends;
use tandem_core::{Layer, Scene, ShutdownSignal};
use tandem_services::SharedInput;

const GRAVITY: Vec3 = Vec3::new(0.0, -9.81, 0.0);
const REST_SPEED: f32 = 0.05;

struct Body {
    entity: Entity,
    kind: BodyKind,
    inv_mass: f32,
    position: Vec3,
    rotation: Quat,
    velocity: Vec3,
    force: Vec3,
    grounded: bool,
    asleep: bool,
}

/// Point masses under gravity with a ground plane at `y = 0`.
#[derive(Default)]
pub struct EulerWorld {
    next: u64,
    bodies: HashMap<BodyHandle, Body>,
    events: Vec<PhysicsEvent>,
}

impl PhysicsWorld for EulerWorld {
    fn add_body(&mut self, entity: Entity, desc: BodyDesc, translation: Vec3, rotation: Quat) -> BodyHandle {
        self.next += 1;
        let handle = BodyHandle(self.next);
        let inv_mass = if desc.kind == BodyKind::Dynamic && desc.mass > 0.0 {
            1.0 / desc.mass
        } else {
            0.0
        };
        self.bodies.insert(
            handle,
            Body {
                entity,
                kind: desc.kind,
                inv_mass,
                position: translation,
                rotation,
                velocity: Vec3::ZERO,
                force: Vec3::ZERO,
                grounded: false,
                asleep: false,
            },
        );
        handle
    }

    fn remove_body(&mut self, body: BodyHandle) {
        self.bodies.remove(&body);
    }

    fn apply_force(&mut self, body: BodyHandle, force: Vec3) {
        if let Some(body) = self.bodies.get_mut(&body) {
            body.force += force;
            if body.asleep {
                body.asleep = false;
                self.events.push(PhysicsEvent {
                    kind: PhysicsEventKind::Awake,
                    entity: body.entity,
                    other: Entity::INVALID,
                });
            }
        }
    }

    fn step(&mut self, dt: f32) {
        for body in self.bodies.values_mut() {
            if body.kind != BodyKind::Dynamic || body.asleep {
                continue;
            }
            body.velocity += (GRAVITY + body.force * body.inv_mass) * dt;
            body.force = Vec3::ZERO;
            body.position += body.velocity * dt;

            let touching = body.position.y <= 0.0;
            if touching {
                body.position.y = 0.0;
                body.velocity.y = -body.velocity.y * 0.5;
            }
            let kind = match (body.grounded, touching) {
                (false, true) => Some(PhysicsEventKind::CollisionEnter),
                (true, true) => Some(PhysicsEventKind::CollisionStay),
                (true, false) => Some(PhysicsEventKind::CollisionExit),
                (false, false) => None,
            };
            body.grounded = touching;
            if let Some(kind) = kind {
                self.events.push(PhysicsEvent {
                    kind,
                    entity: body.entity,
                    other: Entity::INVALID,
                });
            }
            if touching && body.velocity.length() < REST_SPEED {
                body.velocity = Vec3::ZERO;
                body.asleep = true;
                self.events.push(PhysicsEvent {
                    kind: PhysicsEventKind::Sleep,
                    entity: body.entity,
                    other: Entity::INVALID,
                });
            }
        }
    }

    fn pose(&self, body: BodyHandle) -> Option<(Vec3, Quat)> {
        self.bodies.get(&body).map(|b| (b.position, b.rotation))
    }

    fn drain_events(&mut self) -> Vec<PhysicsEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Counts submissions per frame instead of drawing.
#[derive(Debug, Default)]
pub struct CountingSink {
    pub draws: u64,
    pub ui: u64,
}

pub type SharedSink = Rc<RefCell<CountingSink>>;

impl DrawSink for CountingSink {
    fn submit(&mut self, _item: DrawItem) {
        self.draws += 1;
    }
}

impl UiSink for CountingSink {
    fn submit(&mut self, _item: UiItem) {
        self.ui += 1;
    }
}

/// Logs landings and nudges the body back up when it falls asleep.
struct Bouncer {
    landings: u32,
    max_landings: u32,
}

impl Script for Bouncer {
    fn on_create(&mut self, ctx: &mut ScriptContext<'_>) {
        tracing::debug!(entity = %ctx.entity(), scene = ctx.scene_name(), "bouncer created");
    }

    fn on_collision_enter(&mut self, ctx: &mut ScriptContext<'_>, _other: Entity) {
        self.landings += 1;
        tracing::debug!(entity = %ctx.entity(), landings = self.landings, "landed");
    }

    fn on_sleep(&mut self, ctx: &mut ScriptContext<'_>) {
        if self.landings >= self.max_landings {
            return;
        }
        let entity = ctx.entity();
        if let Some(body) = ctx.manager_mut().get_component_mut::<RigidBody>(entity) {
            body.apply_force(Vec3::new(0.0, 400.0, 0.0));
        }
    }
}

/// Owns the demo scene and stops the app after a fixed amount of
/// simulated time.
pub struct GameLayer {
    scene: Scene,
    input: SharedInput,
    shutdown: ShutdownSignal,
    steps: u64,
    stop_after: u64,
}

impl GameLayer {
    pub fn new(input: SharedInput, sink: SharedSink, shutdown: ShutdownSignal, stop_after: u64) -> Self {
        let backends = Backends {
            draw: Box::new(sink.clone()),
            ui: Box::new(sink),
            physics: Box::new(EulerWorld::default()),
        };
        Self {
            scene: Scene::with_default_pipeline("demo", backends),
            input,
            shutdown,
            steps: 0,
            stop_after,
        }
    }
}

impl Layer for GameLayer {
    fn on_attach(&mut self) {
        let manager = self.scene.manager_mut();
        let mesh = MeshRenderer {
            mesh: RenderHandle(1),
            material: RenderHandle(1),
        };

        let root = manager.create_entity();
        manager.add_component(root, Transform::IDENTITY);

        for i in 0..3 {
            let ball = manager.create_entity();
            manager.add_component(ball, Transform::from_xyz(i as f32 * 2.0, 5.0 + i as f32, 0.0));
            manager.add_component(ball, RigidBody::dynamic(1.0 + i as f32));
            manager.add_component(ball, mesh);
            manager.add_component(ball, Scripted::new(Bouncer { landings: 0, max_landings: 2 }));

            // A marker riding on each ball.
            let marker = manager.create_entity();
            manager.add_component(marker, Transform::from_xyz(0.0, 0.5, 0.0));
            manager.add_component(marker, mesh);
            if let Err(err) = manager.set_parent(marker, ball) {
                tracing::error!(%err, "failed to attach marker");
            }
        }

        let ground = manager.create_entity();
        manager.add_component(ground, Transform::from_xyz(0.0, -0.5, 0.0).with_scale(Vec3::new(20.0, 1.0, 20.0)));
        manager.add_component(ground, RigidBody::new(BodyKind::Static, 0.0));
        manager.add_component(ground, mesh);

        let hud = manager.create_entity();
        manager.add_component(hud, UiElement::new(Vec2::new(8.0, 8.0), Vec2::new(200.0, 24.0)));

        tracing::info!(entities = manager.live_count(), "demo scene populated");
    }

    fn on_detach(&mut self) {
        tracing::info!(
            scene = self.scene.name(),
            entities = self.scene.manager().live_count(),
            "demo scene detached"
        );
    }

    fn on_pre_fixed_update(&mut self, dt: f32) {
        self.scene.pre_fixed_update(dt);
    }

    fn on_fixed_update(&mut self, dt: f32) {
        self.scene.fixed_update(dt);
        self.steps += 1;
        if self.steps >= self.stop_after {
            self.shutdown.request();
        }
    }

    fn on_update(&mut self, dt: f32) {
        let look = self.input.borrow().mouse_delta();
        if look != Vec2::ZERO {
            tracing::trace!(?look, "camera look");
        }
        self.scene.update(dt);
    }

    fn on_late_update(&mut self, dt: f32) {
        self.scene.late_update(dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bodies_fall_land_and_sleep() {
        let mut world = EulerWorld::default();
        let e = Entity::INVALID;
        let body = world.add_body(
            e,
            BodyDesc {
                kind: BodyKind::Dynamic,
                mass: 1.0,
            },
            Vec3::new(0.0, 1.0, 0.0),
            Quat::IDENTITY,
        );

        let mut kinds = Vec::new();
        for _ in 0..600 {
            world.step(1.0 / 60.0);
            kinds.extend(world.drain_events().into_iter().map(|ev| ev.kind));
        }

        assert_eq!(kinds.first(), Some(&PhysicsEventKind::CollisionEnter));
        assert!(kinds.contains(&PhysicsEventKind::Sleep));
        let (pos, _) = world.pose(body).unwrap();
        assert_eq!(pos.y, 0.0);
    }
}
