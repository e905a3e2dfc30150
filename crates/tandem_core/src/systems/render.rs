//! Mesh submission to the draw backend

use crate::components::{MeshRenderer, WorldTransform};
use crate::ecs::EntityManager;
use crate::facade::{DrawItem, DrawSink};
use crate::math::{Mat4, Transform};
use crate::system::System;

/// Submits one [`DrawItem`] per active [`MeshRenderer`] in `late_update`.
pub struct RenderSystem {
    sink: Box<dyn DrawSink>,
}

impl RenderSystem {
    pub fn new(sink: impl DrawSink + 'static) -> Self {
        Self {
            sink: Box::new(sink),
        }
    }

    pub fn from_box(sink: Box<dyn DrawSink>) -> Self {
        Self { sink }
    }
}

impl System for RenderSystem {
    fn late_update(&mut self, manager: &mut EntityManager, _dt: f32) {
        let mut submitted = 0usize;
        for (entity, renderer) in manager.query_active::<MeshRenderer>() {
            // Entities never seen by the transform pass fall back to their
            // local transform.
            let world = manager
                .get_component::<WorldTransform>(entity)
                .map(|w| w.matrix)
                .or_else(|| manager.get_component::<Transform>(entity).map(Transform::matrix))
                .unwrap_or(Mat4::IDENTITY);
            self.sink.submit(DrawItem {
                entity,
                mesh: renderer.mesh,
                material: renderer.material,
                world,
            });
            submitted += 1;
        }
        tracing::trace!(submitted, "render submission");
    }
}
