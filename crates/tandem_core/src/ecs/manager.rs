// manager.rs - Entity lifetimes, component access and the active flag
//
// The manager owns the handle namespace, the per-type store registry and
// the relationship graph (see hierarchy.rs). Every accessor tolerates dead
// or stale handles and answers with `None`/`false` instead of panicking.

use crate::ecs::{CommandBuffer, Component, ComponentRegistry, ComponentStore, Entity, Relationship};
use crate::ecs::entity::EntityAllocator;

/// Marker component: present while an entity is disabled.
///
/// Disabled entities keep all of their data but are skipped by
/// [`EntityManager::active_entities`] and the systems built on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Disabled;

pub struct EntityManager {
    allocator: EntityAllocator,
    registry: ComponentRegistry,
    pub(crate) relationships: ComponentStore<Relationship>,
    commands: CommandBuffer,
}

impl EntityManager {
    pub fn new() -> Self {
        Self::with_registry(ComponentRegistry::new())
    }

    /// Build a manager around an existing registry.
    ///
    /// The registry must not hold rows: handles are allocated fresh and
    /// leftover rows would alias them.
    pub fn with_registry(registry: ComponentRegistry) -> Self {
        debug_assert!(
            registry.iter().all(|store| store.len() == 0),
            "injected registry already holds component rows"
        );
        Self {
            allocator: EntityAllocator::new(),
            registry,
            relationships: ComponentStore::new(),
            commands: CommandBuffer::new(),
        }
    }

    // ── Lifetimes ────────────────────────────────────────────────────

    pub fn create_entity(&mut self) -> Entity {
        let entity = self.allocator.allocate();
        tracing::trace!(%entity, "created entity");
        entity
    }

    /// Destroy `entity`, removing it from every component store.
    ///
    /// Children are not destroyed: they are detached and become roots.
    /// Use [`destroy_entity_recursive`](Self::destroy_entity_recursive) to
    /// take the whole subtree down. Returns `false` for dead handles.
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        if !self.allocator.is_alive(entity) {
            return false;
        }
        let removed = self.registry.remove_entity(entity);
        self.remove_from_hierarchy(entity);
        self.allocator.free(entity);
        tracing::trace!(%entity, components = removed, "destroyed entity");
        true
    }

    /// Destroy `entity` and all of its descendants. Returns how many died.
    pub fn destroy_entity_recursive(&mut self, entity: Entity) -> usize {
        if !self.allocator.is_alive(entity) {
            return 0;
        }
        let mut doomed = vec![entity];
        let mut cursor = 0;
        while cursor < doomed.len() {
            let children = self.children(doomed[cursor]);
            doomed.extend(children);
            cursor += 1;
        }
        // Leaves first, so nothing in the subtree is orphaned on the way down.
        let mut destroyed = 0;
        for e in doomed.into_iter().rev() {
            if self.destroy_entity(e) {
                destroyed += 1;
            }
        }
        destroyed
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.allocator.is_alive(entity)
    }

    /// Number of live entities.
    pub fn live_count(&self) -> usize {
        self.allocator.live()
    }

    // ── Components ───────────────────────────────────────────────────

    /// Attach `value` to `entity`.
    ///
    /// If the entity already holds a `T` the call is a no-op: the existing
    /// value is kept and returned, `value` is dropped. Use
    /// [`replace_component`](Self::replace_component) to overwrite.
    /// Returns `None` for dead handles.
    pub fn add_component<T: Component>(&mut self, entity: Entity, value: T) -> Option<&mut T> {
        if !self.allocator.is_alive(entity) {
            return None;
        }
        let (slot, inserted) = self.registry.store_or_register::<T>().insert(entity, value);
        if !inserted {
            tracing::trace!(
                %entity,
                component = std::any::type_name::<T>(),
                "add_component on existing row kept the old value"
            );
        }
        Some(slot)
    }

    /// Attach or overwrite `T`, returning the previous value if there was one.
    pub fn replace_component<T: Component>(&mut self, entity: Entity, value: T) -> Option<T> {
        if !self.allocator.is_alive(entity) {
            return None;
        }
        self.registry.store_or_register::<T>().replace(entity, value)
    }

    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Option<T> {
        self.registry.store_mut::<T>()?.remove(entity)
    }

    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.registry.store::<T>()?.get(entity)
    }

    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.registry.store_mut::<T>()?.get_mut(entity)
    }

    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.registry
            .store::<T>()
            .is_some_and(|store| store.contains(entity))
    }

    pub fn store<T: Component>(&self) -> Option<&ComponentStore<T>> {
        self.registry.store::<T>()
    }

    pub fn store_mut<T: Component>(&mut self) -> Option<&mut ComponentStore<T>> {
        self.registry.store_mut::<T>()
    }

    /// Dense array of every `T`, empty if the type was never added.
    pub fn data<T: Component>(&self) -> &[T] {
        self.registry.store::<T>().map(ComponentStore::data).unwrap_or(&[])
    }

    pub fn data_mut<T: Component>(&mut self) -> &mut [T] {
        match self.registry.store_mut::<T>() {
            Some(store) => store.data_mut(),
            None => &mut [],
        }
    }

    /// Entity owning each row of [`data`](Self::data).
    pub fn entities<T: Component>(&self) -> &[Entity] {
        self.registry
            .store::<T>()
            .map(ComponentStore::entities)
            .unwrap_or(&[])
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    // ── Active flag ──────────────────────────────────────────────────

    pub fn is_active(&self, entity: Entity) -> bool {
        self.is_alive(entity) && !self.has_component::<Disabled>(entity)
    }

    pub fn set_active(&mut self, entity: Entity, active: bool) {
        if active {
            self.remove_component::<Disabled>(entity);
        } else {
            self.add_component(entity, Disabled);
        }
    }

    /// Snapshot of the active entities holding `T`, in dense order.
    ///
    /// Safe to iterate while mutating the manager: structural edits made in
    /// the loop body do not shift the snapshot.
    pub fn active_entities<T: Component>(&self) -> Vec<Entity> {
        let disabled = self.registry.store::<Disabled>();
        self.entities::<T>()
            .iter()
            .copied()
            .filter(|e| !disabled.is_some_and(|d| d.contains(*e)))
            .collect()
    }

    /// Borrowing iterator over active `(entity, &T)` pairs.
    pub fn query_active<T: Component>(&self) -> impl Iterator<Item = (Entity, &T)> + '_ {
        let disabled = self.registry.store::<Disabled>();
        self.registry
            .store::<T>()
            .into_iter()
            .flat_map(ComponentStore::iter)
            .filter(move |(e, _)| !disabled.is_some_and(|d| d.contains(*e)))
    }

    // ── Deferred commands ────────────────────────────────────────────

    /// Queue of structural edits applied by [`flush_commands`](Self::flush_commands).
    pub fn commands(&mut self) -> &mut CommandBuffer {
        &mut self.commands
    }

    /// Apply queued commands in record order, including ones queued while
    /// applying. Returns how many were applied.
    pub fn flush_commands(&mut self) -> usize {
        let mut applied = 0;
        while !self.commands.is_empty() {
            for command in self.commands.take() {
                command.apply(self);
                applied += 1;
            }
        }
        applied
    }
}

impl Default for EntityManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct X(u8);
    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Y(u8);
    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Z(u8);

    #[test]
    fn destroy_removes_every_component() {
        let mut manager = EntityManager::new();
        let keep = manager.create_entity();
        let doomed = manager.create_entity();
        for e in [keep, doomed] {
            manager.add_component(e, X(1));
            manager.add_component(e, Y(2));
            manager.add_component(e, Z(3));
        }

        assert!(manager.destroy_entity(doomed));

        assert!(!manager.has_component::<X>(doomed));
        assert!(!manager.has_component::<Y>(doomed));
        assert!(!manager.has_component::<Z>(doomed));
        assert!(manager.registry().components_of(doomed).is_empty());
        assert_eq!(manager.get_component::<Z>(keep), Some(&Z(3)));
        assert_eq!(manager.live_count(), 1);
    }

    #[test]
    fn add_on_existing_component_keeps_first_value() {
        let mut manager = EntityManager::new();
        let e = manager.create_entity();

        manager.add_component(e, X(1));
        let kept = manager.add_component(e, X(2)).copied();

        assert_eq!(kept, Some(X(1)));
        assert_eq!(manager.get_component::<X>(e), Some(&X(1)));

        assert_eq!(manager.replace_component(e, X(3)), Some(X(1)));
        assert_eq!(manager.get_component::<X>(e), Some(&X(3)));
    }

    #[test]
    fn dead_and_stale_handles_are_no_ops() {
        let mut manager = EntityManager::new();
        let stale = manager.create_entity();
        manager.add_component(stale, X(1));
        manager.destroy_entity(stale);

        let fresh = manager.create_entity();
        assert_eq!(fresh.index(), stale.index());

        assert!(manager.add_component(stale, X(9)).is_none());
        assert!(manager.get_component::<X>(stale).is_none());
        assert!(!manager.has_component::<X>(stale));
        assert!(manager.remove_component::<X>(stale).is_none());
        assert!(!manager.destroy_entity(stale));
        assert!(manager.is_alive(fresh));
        assert!(!manager.has_component::<X>(fresh));

        assert!(manager.get_component::<Y>(Entity::INVALID).is_none());
        assert!(!manager.is_active(Entity::INVALID));
    }

    #[test]
    fn disabled_entities_keep_data_but_leave_iteration() {
        let mut manager = EntityManager::new();
        let a = manager.create_entity();
        let b = manager.create_entity();
        manager.add_component(a, X(1));
        manager.add_component(b, X(2));

        manager.set_active(a, false);

        assert!(!manager.is_active(a));
        assert_eq!(manager.get_component::<X>(a), Some(&X(1)));
        assert_eq!(manager.active_entities::<X>(), vec![b]);
        assert_eq!(manager.query_active::<X>().count(), 1);

        manager.set_active(a, true);
        assert!(manager.is_active(a));
        assert_eq!(manager.active_entities::<X>().len(), 2);
    }

    #[test]
    fn bulk_arrays_are_parallel() {
        let mut manager = EntityManager::new();
        assert!(manager.data::<X>().is_empty());

        let entities: Vec<_> = (0..4).map(|_| manager.create_entity()).collect();
        for (i, e) in entities.iter().enumerate() {
            manager.add_component(*e, X(i as u8));
        }
        manager.remove_component::<X>(entities[0]);

        for x in manager.data_mut::<X>() {
            x.0 += 10;
        }
        for (e, x) in manager.entities::<X>().iter().zip(manager.data::<X>()) {
            assert_eq!(manager.get_component::<X>(*e), Some(x));
        }
        assert_eq!(manager.get_component::<X>(entities[3]), Some(&X(13)));
    }

    #[test]
    fn injected_registry_is_swept_on_destroy() {
        let mut registry = ComponentRegistry::new();
        registry.store_or_register::<X>();
        let mut manager = EntityManager::with_registry(registry);
        assert!(manager.registry().is_registered::<X>());

        let a = manager.create_entity();
        let b = manager.create_entity();
        manager.add_component(a, X(1));
        manager.add_component(b, X(2));
        manager.add_component(a, Y(3));

        assert!(manager.destroy_entity(a));

        assert!(manager.registry().is_registered::<X>());
        assert!(manager.registry().is_registered::<Y>());
        assert_eq!(manager.registry().len(), 2);
        assert!(manager.registry().components_of(a).is_empty());
        assert_eq!(manager.entities::<X>(), &[b]);
        assert_eq!(manager.get_component::<X>(b), Some(&X(2)));
    }
}
