//! Gameplay scripts attached to entities
//!
//! A script is a heap-owned [`Script`] stored in a [`Scripted`] component.
//! It is created lazily: the first time any system touches it, `on_create`
//! runs with a [`ScriptContext`] naming the owning entity and scene.
//!
//! While a hook runs the script is taken out of its component, so the
//! script may freely add/remove components (even destroy its own entity)
//! through the context without aliasing the store it lives in.

use crate::ecs::{Entity, EntityManager};

/// What a script can see while one of its hooks runs.
pub struct ScriptContext<'a> {
    entity: Entity,
    scene: &'a str,
    manager: &'a mut EntityManager,
}

impl<'a> ScriptContext<'a> {
    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn scene_name(&self) -> &str {
        self.scene
    }

    pub fn manager(&self) -> &EntityManager {
        self.manager
    }

    pub fn manager_mut(&mut self) -> &mut EntityManager {
        self.manager
    }
}

pub trait Script {
    fn on_create(&mut self, _ctx: &mut ScriptContext<'_>) {}
    fn on_update(&mut self, _ctx: &mut ScriptContext<'_>, _dt: f32) {}
    fn on_fixed_update(&mut self, _ctx: &mut ScriptContext<'_>, _dt: f32) {}
    fn on_late_update(&mut self, _ctx: &mut ScriptContext<'_>, _dt: f32) {}
    fn on_awake(&mut self, _ctx: &mut ScriptContext<'_>) {}
    fn on_sleep(&mut self, _ctx: &mut ScriptContext<'_>) {}
    fn on_collision_enter(&mut self, _ctx: &mut ScriptContext<'_>, _other: Entity) {}
    fn on_collision_stay(&mut self, _ctx: &mut ScriptContext<'_>, _other: Entity) {}
    fn on_collision_exit(&mut self, _ctx: &mut ScriptContext<'_>, _other: Entity) {}
}

/// Component owning an entity's script.
pub struct Scripted {
    script: Option<Box<dyn Script>>,
    created: bool,
}

impl Scripted {
    pub fn new(script: impl Script + 'static) -> Self {
        Self::from_box(Box::new(script))
    }

    pub fn from_box(script: Box<dyn Script>) -> Self {
        Self {
            script: Some(script),
            created: false,
        }
    }

    /// Whether `on_create` has run.
    pub fn is_created(&self) -> bool {
        self.created
    }
}

/// Run `hook` on the script attached to `entity`, creating it first if
/// needed. Returns `false` when the entity has no (available) script.
pub(crate) fn with_script<F>(manager: &mut EntityManager, scene: &str, entity: Entity, hook: F) -> bool
where
    F: FnOnce(&mut dyn Script, &mut ScriptContext<'_>),
{
    let (mut script, created) = match manager.get_component_mut::<Scripted>(entity) {
        Some(slot) => match slot.script.take() {
            Some(script) => (script, slot.created),
            // Re-entrant call from inside this script's own hook.
            None => return false,
        },
        None => return false,
    };

    {
        let mut ctx = ScriptContext {
            entity,
            scene,
            manager: &mut *manager,
        };
        if !created {
            script.on_create(&mut ctx);
        }
        hook(script.as_mut(), &mut ctx);
    }

    // The hook may have removed the component, destroyed the entity or
    // installed a replacement script; only an empty slot takes it back.
    if let Some(slot) = manager.get_component_mut::<Scripted>(entity) {
        if slot.script.is_none() {
            slot.script = Some(script);
            slot.created = true;
        }
    }
    true
}
