// registry.rs - Per-type store registry
//
// Stores are created the first time a component type is added and are
// registered in the same step, so a populated type can never be missing
// from the registry. Types that were never added have nothing to clean up.

use crate::ecs::{Component, ComponentStore, Entity};
use std::any::{Any, TypeId};
use std::collections::HashMap;

/// Type-erased view of a [`ComponentStore`] used for cross-cutting sweeps.
pub trait ErasedStore: Any {
    /// Drop the row for `entity` if present.
    fn remove_entity(&mut self, entity: Entity) -> bool;
    fn contains_entity(&self, entity: Entity) -> bool;
    fn len(&self) -> usize;
    fn component_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> ErasedStore for ComponentStore<T> {
    fn remove_entity(&mut self, entity: Entity) -> bool {
        self.remove(entity).is_some()
    }

    fn contains_entity(&self, entity: Entity) -> bool {
        self.contains(entity)
    }

    fn len(&self) -> usize {
        ComponentStore::len(self)
    }

    fn component_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Owns one [`ComponentStore`] per component type that has ever been added.
#[derive(Default)]
pub struct ComponentRegistry {
    stores: HashMap<TypeId, Box<dyn ErasedStore>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self {
            stores: HashMap::new(),
        }
    }

    pub fn store<T: Component>(&self) -> Option<&ComponentStore<T>> {
        self.stores
            .get(&TypeId::of::<T>())
            .and_then(|store| store.as_any().downcast_ref())
    }

    pub fn store_mut<T: Component>(&mut self) -> Option<&mut ComponentStore<T>> {
        self.stores
            .get_mut(&TypeId::of::<T>())
            .and_then(|store| store.as_any_mut().downcast_mut())
    }

    /// Fetch the store for `T`, creating and registering it on first use.
    pub fn store_or_register<T: Component>(&mut self) -> &mut ComponentStore<T> {
        self.stores
            .entry(TypeId::of::<T>())
            .or_insert_with(|| {
                tracing::debug!(component = std::any::type_name::<T>(), "registered component store");
                Box::new(ComponentStore::<T>::new())
            })
            .as_any_mut()
            .downcast_mut()
            .expect("component store registered under a foreign TypeId")
    }

    pub fn is_registered<T: Component>(&self) -> bool {
        self.stores.contains_key(&TypeId::of::<T>())
    }

    /// Number of registered component types.
    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    /// Names of the component types `entity` currently holds.
    pub fn components_of(&self, entity: Entity) -> Vec<&'static str> {
        let mut names: Vec<_> = self
            .stores
            .values()
            .filter(|store| store.contains_entity(entity))
            .map(|store| store.component_name())
            .collect();
        names.sort_unstable();
        names
    }

    /// Remove `entity` from every registered store, returning how many rows went.
    pub fn remove_entity(&mut self, entity: Entity) -> usize {
        self.stores
            .values_mut()
            .map(|store| store.remove_entity(entity))
            .filter(|removed| *removed)
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn ErasedStore> {
        self.stores.values().map(|store| &**store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Position(f32);
    struct Velocity(f32);

    #[test]
    fn registers_on_first_use_only() {
        let mut registry = ComponentRegistry::new();
        assert!(!registry.is_registered::<Position>());
        assert!(registry.store::<Position>().is_none());

        registry.store_or_register::<Position>();
        registry.store_or_register::<Position>();

        assert!(registry.is_registered::<Position>());
        assert!(!registry.is_registered::<Velocity>());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn sweep_removes_from_every_store() {
        let mut registry = ComponentRegistry::new();
        let a = Entity::new(1, 0);
        let b = Entity::new(2, 0);
        registry.store_or_register::<Position>().insert(a, Position(1.0));
        registry.store_or_register::<Position>().insert(b, Position(2.0));
        registry.store_or_register::<Velocity>().insert(a, Velocity(3.0));

        assert_eq!(registry.components_of(a).len(), 2);
        assert!(registry.store::<Velocity>().is_some_and(|s| s.get(a).is_some_and(|v| v.0 == 3.0)));
        assert_eq!(registry.remove_entity(a), 2);
        assert_eq!(registry.remove_entity(a), 0);
        assert!(registry.components_of(a).is_empty());
        assert_eq!(registry.store::<Position>().map(|s| s.len()), Some(1));
        assert!(registry.store::<Position>().is_some_and(|s| s.get(b).is_some_and(|p| p.0 == 2.0)));
    }
}
