//! Built-in systems and the default scene pipeline

mod physics;
mod render;
mod scripting;
mod transform;
mod ui;

pub use physics::PhysicsSystem;
pub use render::RenderSystem;
pub use scripting::ScriptSystem;
pub use transform::{propagate_transforms, TransformSystem};
pub use ui::UiSystem;

use crate::facade::{DrawSink, PhysicsWorld, UiSink};
use crate::system::System;

/// Backend facades the default pipeline submits to.
pub struct Backends {
    pub draw: Box<dyn DrawSink>,
    pub ui: Box<dyn UiSink>,
    pub physics: Box<dyn PhysicsWorld>,
}

/// The standard system order.
///
/// Transforms are propagated first so everything downstream reads current
/// world matrices. Rendering only submits in `late_update`, after scripts
/// and physics have moved things. Physics runs after scripts so their
/// forces land in the same step.
pub fn default_pipeline(scene: &str, backends: Backends) -> Vec<Box<dyn System>> {
    vec![
        Box::new(TransformSystem),
        Box::new(RenderSystem::from_box(backends.draw)),
        Box::new(ScriptSystem::new(scene)),
        Box::new(PhysicsSystem::from_box(scene, backends.physics)),
        Box::new(UiSystem::from_box(backends.ui)),
    ]
}
