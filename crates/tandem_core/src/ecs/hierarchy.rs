//! Parent/child relationships
//!
//! Each entity that takes part in a hierarchy carries a [`Relationship`]
//! record. Children of one parent form an intrusive doubly-linked list
//! threaded through `next_sibling`/`prev_sibling`, headed by the parent's
//! `first_child`. New children are prepended.
//!
//! Invariants held by every public operation:
//! - the graph is acyclic (checked by an ancestor walk on each reparent)
//! - `first_child.prev_sibling == Entity::INVALID`
//! - sibling links agree in both directions
//! - `children_count` equals the length of the sibling chain

use crate::ecs::{Entity, EntityManager};
use thiserror::Error;

/// Hierarchy record for one entity. Read-only outside the manager.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Relationship {
    parent: Entity,
    first_child: Entity,
    next_sibling: Entity,
    prev_sibling: Entity,
    children_count: usize,
}

impl Relationship {
    pub fn parent(&self) -> Entity {
        self.parent
    }

    pub fn first_child(&self) -> Entity {
        self.first_child
    }

    pub fn next_sibling(&self) -> Entity {
        self.next_sibling
    }

    pub fn prev_sibling(&self) -> Entity {
        self.prev_sibling
    }

    pub fn children_count(&self) -> usize {
        self.children_count
    }

    fn unlink(&mut self) {
        self.parent = Entity::INVALID;
        self.next_sibling = Entity::INVALID;
        self.prev_sibling = Entity::INVALID;
    }
}

/// Reasons a reparent is refused. The tree is untouched in every case.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("entity {entity} is not alive")]
    DeadEntity { entity: Entity },

    #[error("entity {entity} cannot be its own parent")]
    SelfParent { entity: Entity },

    #[error("parenting {child} under {parent} would create a cycle")]
    Cycle { child: Entity, parent: Entity },
}

impl EntityManager {
    pub fn relationship(&self, entity: Entity) -> Option<&Relationship> {
        self.relationships.get(entity)
    }

    pub fn parent(&self, entity: Entity) -> Option<Entity> {
        self.relationships
            .get(entity)
            .map(Relationship::parent)
            .filter(Entity::is_valid)
    }

    /// Children in sibling-chain order (most recently attached first).
    pub fn children(&self, entity: Entity) -> Vec<Entity> {
        let Some(rel) = self.relationships.get(entity) else {
            return Vec::new();
        };
        let mut children = Vec::with_capacity(rel.children_count);
        let mut cursor = rel.first_child;
        while cursor.is_valid() {
            children.push(cursor);
            cursor = self
                .relationships
                .get(cursor)
                .map_or(Entity::INVALID, Relationship::next_sibling);
        }
        children
    }

    pub fn children_count(&self, entity: Entity) -> usize {
        self.relationships
            .get(entity)
            .map_or(0, Relationship::children_count)
    }

    /// Whether `ancestor` appears on the parent chain of `entity`. O(depth).
    pub fn is_descendant_of(&self, entity: Entity, ancestor: Entity) -> bool {
        let mut cursor = self.parent(entity);
        let mut steps = 0;
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.relationships.len() {
                tracing::error!(%entity, "parent chain loops; treating as descendant");
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Topmost ancestor of `entity` (itself when it has no parent).
    pub fn root_of(&self, entity: Entity) -> Entity {
        let mut root = entity;
        let mut steps = 0;
        while let Some(parent) = self.parent(root) {
            root = parent;
            steps += 1;
            if steps > self.relationships.len() {
                break;
            }
        }
        root
    }

    /// Entities with children but no parent.
    pub fn hierarchy_roots(&self) -> Vec<Entity> {
        self.relationships
            .iter()
            .filter(|(_, rel)| !rel.parent.is_valid() && rel.children_count > 0)
            .map(|(entity, _)| entity)
            .collect()
    }

    /// Make `child` the first child of `parent`, detaching it from any
    /// previous parent.
    ///
    /// Refused (and logged) when either handle is dead, when `child ==
    /// parent`, or when `parent` is a descendant of `child`.
    pub fn set_parent(&mut self, child: Entity, parent: Entity) -> Result<(), HierarchyError> {
        for entity in [child, parent] {
            if !self.is_alive(entity) {
                tracing::warn!(%child, %parent, dead = %entity, "set_parent on dead entity");
                return Err(HierarchyError::DeadEntity { entity });
            }
        }
        if child == parent {
            tracing::error!(%child, "refusing to parent an entity to itself");
            return Err(HierarchyError::SelfParent { entity: child });
        }
        if self.is_descendant_of(parent, child) {
            tracing::error!(%child, %parent, "refusing reparent that would create a cycle");
            return Err(HierarchyError::Cycle { child, parent });
        }

        self.detach(child);
        self.attach(child, parent);
        Ok(())
    }

    /// Detach `child` from its parent, making it a root.
    /// Returns `false` if it had no parent.
    pub fn remove_parent(&mut self, child: Entity) -> bool {
        self.detach(child)
    }

    fn detach(&mut self, child: Entity) -> bool {
        let Some(rel) = self.relationships.get(child).copied() else {
            return false;
        };
        if !rel.parent.is_valid() {
            return false;
        }

        if rel.prev_sibling.is_valid() {
            if let Some(prev) = self.relationships.get_mut(rel.prev_sibling) {
                prev.next_sibling = rel.next_sibling;
            }
        } else if let Some(parent) = self.relationships.get_mut(rel.parent) {
            parent.first_child = rel.next_sibling;
        }
        if rel.next_sibling.is_valid() {
            if let Some(next) = self.relationships.get_mut(rel.next_sibling) {
                next.prev_sibling = rel.prev_sibling;
            }
        }
        if let Some(parent) = self.relationships.get_mut(rel.parent) {
            parent.children_count -= 1;
        }
        if let Some(rel) = self.relationships.get_mut(child) {
            rel.unlink();
        }
        true
    }

    fn attach(&mut self, child: Entity, parent: Entity) {
        let old_first = {
            let (rel, _) = self.relationships.insert(parent, Relationship::default());
            let old_first = rel.first_child;
            rel.first_child = child;
            rel.children_count += 1;
            old_first
        };
        if old_first.is_valid() {
            if let Some(next) = self.relationships.get_mut(old_first) {
                next.prev_sibling = child;
            }
        }
        let (rel, _) = self.relationships.insert(child, Relationship::default());
        rel.parent = parent;
        rel.prev_sibling = Entity::INVALID;
        rel.next_sibling = old_first;
    }

    /// Splice `entity` out of the graph and orphan its children.
    pub(crate) fn remove_from_hierarchy(&mut self, entity: Entity) {
        if !self.relationships.contains(entity) {
            return;
        }
        self.detach(entity);
        for child in self.children(entity) {
            if let Some(rel) = self.relationships.get_mut(child) {
                rel.unlink();
            }
        }
        self.relationships.remove(entity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Walk every record and check the documented invariants.
    fn assert_hierarchy_consistent(manager: &EntityManager) {
        for (entity, rel) in manager.relationships.iter() {
            let children = manager.children(entity);
            assert_eq!(children.len(), rel.children_count, "count of {entity}");
            if let Some(first) = children.first() {
                assert_eq!(manager.relationship(*first).map(|r| r.prev_sibling), Some(Entity::INVALID));
            }
            for pair in children.windows(2) {
                let next_rel = manager.relationship(pair[1]).copied().unwrap_or_default();
                assert_eq!(next_rel.prev_sibling, pair[0]);
            }
            for child in &children {
                assert_eq!(manager.parent(*child), Some(entity));
            }
            if let Some(parent) = manager.parent(entity) {
                let siblings = manager.children(parent);
                assert_eq!(siblings.iter().filter(|c| **c == entity).count(), 1);
                assert!(!manager.is_descendant_of(parent, entity));
            }
        }
    }

    fn spawn(manager: &mut EntityManager, n: usize) -> Vec<Entity> {
        (0..n).map(|_| manager.create_entity()).collect()
    }

    #[test]
    fn children_are_prepended() {
        let mut manager = EntityManager::new();
        let e = spawn(&mut manager, 4);
        for child in &e[1..] {
            manager.set_parent(*child, e[0]).unwrap();
        }

        assert_eq!(manager.children(e[0]), vec![e[3], e[2], e[1]]);
        assert_eq!(manager.children_count(e[0]), 3);
        assert_eq!(manager.parent(e[2]), Some(e[0]));
        assert_eq!(manager.parent(e[0]), None);
        assert_hierarchy_consistent(&manager);
    }

    #[test]
    fn cycle_is_rejected_and_tree_unchanged() {
        let mut manager = EntityManager::new();
        let e = spawn(&mut manager, 3);
        let (a, b, c) = (e[0], e[1], e[2]);
        manager.set_parent(b, a).unwrap();
        manager.set_parent(c, b).unwrap();

        let before_children = manager.children(a);
        let before_parent = manager.parent(c);

        assert_eq!(
            manager.set_parent(a, c),
            Err(HierarchyError::Cycle { child: a, parent: c })
        );
        assert_eq!(
            manager.set_parent(a, b),
            Err(HierarchyError::Cycle { child: a, parent: b })
        );
        assert_eq!(manager.set_parent(a, a), Err(HierarchyError::SelfParent { entity: a }));

        assert_eq!(manager.children(a), before_children);
        assert_eq!(manager.parent(c), before_parent);
        assert_eq!(manager.parent(a), None);
        assert_hierarchy_consistent(&manager);
    }

    #[test]
    fn reparent_moves_child_between_chains() {
        let mut manager = EntityManager::new();
        let e = spawn(&mut manager, 5);
        let (a, b, c) = (e[0], e[1], e[2]);
        manager.set_parent(e[3], a).unwrap();
        manager.set_parent(c, a).unwrap();
        manager.set_parent(e[4], a).unwrap();
        manager.set_parent(e[3], b).unwrap();

        let a_before = manager.children_count(a);
        let b_before = manager.children_count(b);

        manager.set_parent(c, b).unwrap();

        assert_eq!(manager.children_count(a), a_before - 1);
        assert_eq!(manager.children_count(b), b_before + 1);
        assert_eq!(manager.children(b).iter().filter(|x| **x == c).count(), 1);
        assert!(!manager.children(a).contains(&c));
        assert_hierarchy_consistent(&manager);
    }

    #[test]
    fn reparent_to_same_parent_moves_to_front() {
        let mut manager = EntityManager::new();
        let e = spawn(&mut manager, 3);
        manager.set_parent(e[1], e[0]).unwrap();
        manager.set_parent(e[2], e[0]).unwrap();

        manager.set_parent(e[1], e[0]).unwrap();

        assert_eq!(manager.children(e[0]), vec![e[1], e[2]]);
        assert_eq!(manager.children_count(e[0]), 2);
        assert_hierarchy_consistent(&manager);
    }

    #[test]
    fn remove_parent_splices_middle_sibling() {
        let mut manager = EntityManager::new();
        let e = spawn(&mut manager, 4);
        for child in &e[1..] {
            manager.set_parent(*child, e[0]).unwrap();
        }

        assert!(manager.remove_parent(e[2]));
        assert!(!manager.remove_parent(e[2]));

        assert_eq!(manager.children(e[0]), vec![e[3], e[1]]);
        assert_eq!(manager.parent(e[2]), None);
        assert_hierarchy_consistent(&manager);
    }

    #[test]
    fn destroy_orphans_children() {
        let mut manager = EntityManager::new();
        let e = spawn(&mut manager, 4);
        let (root, mid, leaf_a, leaf_b) = (e[0], e[1], e[2], e[3]);
        manager.set_parent(mid, root).unwrap();
        manager.set_parent(leaf_a, mid).unwrap();
        manager.set_parent(leaf_b, mid).unwrap();

        manager.destroy_entity(mid);

        assert_eq!(manager.children_count(root), 0);
        assert_eq!(manager.parent(leaf_a), None);
        assert_eq!(manager.parent(leaf_b), None);
        assert!(manager.is_alive(leaf_a));
        assert!(manager.children(mid).is_empty());
        assert_hierarchy_consistent(&manager);
    }

    #[test]
    fn destroy_recursive_takes_subtree() {
        let mut manager = EntityManager::new();
        let e = spawn(&mut manager, 5);
        manager.set_parent(e[1], e[0]).unwrap();
        manager.set_parent(e[2], e[1]).unwrap();
        manager.set_parent(e[3], e[1]).unwrap();
        manager.set_parent(e[4], e[0]).unwrap();

        assert_eq!(manager.destroy_entity_recursive(e[1]), 3);

        assert!(manager.is_alive(e[0]));
        assert!(manager.is_alive(e[4]));
        assert!(!manager.is_alive(e[2]));
        assert_eq!(manager.children(e[0]), vec![e[4]]);
        assert_hierarchy_consistent(&manager);
    }

    #[test]
    fn dead_handles_are_refused() {
        let mut manager = EntityManager::new();
        let e = spawn(&mut manager, 2);
        manager.destroy_entity(e[1]);

        assert_eq!(
            manager.set_parent(e[0], e[1]),
            Err(HierarchyError::DeadEntity { entity: e[1] })
        );
        assert_eq!(manager.parent(e[1]), None);
        assert!(manager.children(e[1]).is_empty());
        assert_eq!(manager.children_count(Entity::INVALID), 0);
    }

    #[test]
    fn roots_and_ancestry() {
        let mut manager = EntityManager::new();
        let e = spawn(&mut manager, 4);
        manager.set_parent(e[1], e[0]).unwrap();
        manager.set_parent(e[2], e[1]).unwrap();

        assert_eq!(manager.root_of(e[2]), e[0]);
        assert_eq!(manager.root_of(e[3]), e[3]);
        assert!(manager.is_descendant_of(e[2], e[0]));
        assert!(!manager.is_descendant_of(e[0], e[2]));
        assert_eq!(manager.hierarchy_roots(), vec![e[0]]);
    }
}
