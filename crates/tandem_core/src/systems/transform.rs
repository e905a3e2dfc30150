//! World-matrix propagation down the entity hierarchy

use std::collections::VecDeque;

use crate::components::WorldTransform;
use crate::ecs::EntityManager;
use crate::math::{Mat4, Transform};
use crate::system::System;

/// Recompute [`WorldTransform`] for every entity holding a [`Transform`].
///
/// Walks breadth-first from each root so a parent's matrix is final before
/// its children read it. Entities without a `Transform` pass their parent's
/// matrix through unchanged.
pub fn propagate_transforms(manager: &mut EntityManager) {
    let mut queue: VecDeque<_> = manager
        .entities::<Transform>()
        .iter()
        .copied()
        .filter(|e| manager.parent(*e).is_none())
        .chain(
            manager
                .hierarchy_roots()
                .into_iter()
                .filter(|e| !manager.has_component::<Transform>(*e)),
        )
        .map(|e| (e, Mat4::IDENTITY))
        .collect();

    while let Some((entity, parent_matrix)) = queue.pop_front() {
        let world = match manager.get_component::<Transform>(entity) {
            Some(local) => {
                let world = parent_matrix * local.matrix();
                manager.replace_component(entity, WorldTransform { matrix: world });
                world
            }
            None => parent_matrix,
        };
        for child in manager.children(entity) {
            queue.push_back((child, world));
        }
    }
}

/// Runs [`propagate_transforms`] before and after gameplay so both scripts
/// and renderers see current matrices.
#[derive(Debug, Default)]
pub struct TransformSystem;

impl System for TransformSystem {
    fn update(&mut self, manager: &mut EntityManager, _dt: f32) {
        propagate_transforms(manager);
    }

    fn late_update(&mut self, manager: &mut EntityManager, _dt: f32) {
        propagate_transforms(manager);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    fn world_pos(manager: &EntityManager, e: crate::ecs::Entity) -> Vec3 {
        manager
            .get_component::<WorldTransform>(e)
            .map(WorldTransform::translation)
            .unwrap_or(Vec3::NAN)
    }

    #[test]
    fn children_inherit_parent_placement() {
        let mut manager = EntityManager::new();
        let root = manager.create_entity();
        let child = manager.create_entity();
        let grandchild = manager.create_entity();
        manager.add_component(root, Transform::from_xyz(10.0, 0.0, 0.0));
        manager.add_component(child, Transform::from_xyz(0.0, 5.0, 0.0));
        manager.add_component(grandchild, Transform::from_xyz(0.0, 0.0, 1.0));
        manager.set_parent(child, root).unwrap();
        manager.set_parent(grandchild, child).unwrap();

        propagate_transforms(&mut manager);

        assert_eq!(world_pos(&manager, root), Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(world_pos(&manager, child), Vec3::new(10.0, 5.0, 0.0));
        assert_eq!(world_pos(&manager, grandchild), Vec3::new(10.0, 5.0, 1.0));
    }

    #[test]
    fn entities_without_transform_pass_matrix_through() {
        let mut manager = EntityManager::new();
        let root = manager.create_entity();
        let group = manager.create_entity();
        let leaf = manager.create_entity();
        manager.add_component(root, Transform::from_xyz(1.0, 2.0, 3.0));
        manager.add_component(leaf, Transform::from_xyz(1.0, 0.0, 0.0));
        manager.set_parent(group, root).unwrap();
        manager.set_parent(leaf, group).unwrap();

        propagate_transforms(&mut manager);

        assert!(!manager.has_component::<WorldTransform>(group));
        assert_eq!(world_pos(&manager, leaf), Vec3::new(2.0, 2.0, 3.0));
    }

    #[test]
    fn reparenting_moves_world_position() {
        let mut manager = EntityManager::new();
        let a = manager.create_entity();
        let b = manager.create_entity();
        let child = manager.create_entity();
        manager.add_component(a, Transform::from_xyz(1.0, 0.0, 0.0));
        manager.add_component(b, Transform::from_xyz(-1.0, 0.0, 0.0));
        manager.add_component(child, Transform::IDENTITY);
        manager.set_parent(child, a).unwrap();
        propagate_transforms(&mut manager);
        assert_eq!(world_pos(&manager, child), Vec3::X);

        manager.set_parent(child, b).unwrap();
        propagate_transforms(&mut manager);
        assert_eq!(world_pos(&manager, child), Vec3::NEG_X);
    }
}
