//! Drives [`Script`](crate::script::Script) hooks for every active scripted entity

use crate::ecs::EntityManager;
use crate::script::{with_script, Scripted};
use crate::system::System;

pub struct ScriptSystem {
    scene: String,
}

impl ScriptSystem {
    pub fn new(scene: impl Into<String>) -> Self {
        Self {
            scene: scene.into(),
        }
    }
}

impl System for ScriptSystem {
    fn fixed_update(&mut self, manager: &mut EntityManager, dt: f32) {
        for entity in manager.active_entities::<Scripted>() {
            with_script(manager, &self.scene, entity, |s, ctx| s.on_fixed_update(ctx, dt));
        }
    }

    fn update(&mut self, manager: &mut EntityManager, dt: f32) {
        for entity in manager.active_entities::<Scripted>() {
            with_script(manager, &self.scene, entity, |s, ctx| s.on_update(ctx, dt));
        }
    }

    fn late_update(&mut self, manager: &mut EntityManager, dt: f32) {
        for entity in manager.active_entities::<Scripted>() {
            with_script(manager, &self.scene, entity, |s, ctx| s.on_late_update(ctx, dt));
        }
    }
}
