// store.rs - Sparse-set storage for a single component type
//
// Rows live in a dense `Vec<T>` with a parallel `Vec<Entity>`; the sparse
// map goes from entity index to dense row. Removal is swap-and-pop so every
// structural edit is O(1) and the dense arrays never have holes.

use crate::ecs::Entity;
use std::collections::HashMap;

/// Marker for anything that can be stored against an entity.
pub trait Component: 'static {}

impl<T: 'static> Component for T {}

/// Dense storage for every `T` attached to an entity.
///
/// Invariants:
/// - `data.len() == entities.len()`
/// - for every stored entity `e`, `entities[sparse[e.index()]] == e`
///
/// Adding or removing rows while iterating [`data`](Self::data) or
/// [`entities`](Self::entities) is the caller's problem; snapshot the
/// entity list first when a loop body can mutate structure.
pub struct ComponentStore<T> {
    data: Vec<T>,
    entities: Vec<Entity>,
    sparse: HashMap<u32, usize>,
}

impl<T: Component> ComponentStore<T> {
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            entities: Vec::new(),
            sparse: HashMap::new(),
        }
    }

    /// Insert `value` for `entity` unless a row already exists.
    ///
    /// An existing row is left untouched; the returned flag is `true` only
    /// when a new row was appended.
    pub fn insert(&mut self, entity: Entity, value: T) -> (&mut T, bool) {
        match self.sparse.get(&entity.index()).copied() {
            Some(row) if self.entities[row] == entity => return (&mut self.data[row], false),
            // Row left behind by an older generation of this slot.
            Some(_) => {
                self.remove_index(entity.index());
            }
            None => {}
        }

        let row = self.data.len();
        self.data.push(value);
        self.entities.push(entity);
        self.sparse.insert(entity.index(), row);
        (&mut self.data[row], true)
    }

    /// Overwrite (or insert) the value for `entity`, returning the previous one.
    pub fn replace(&mut self, entity: Entity, value: T) -> Option<T> {
        match self.dense_index(entity) {
            Some(row) => Some(std::mem::replace(&mut self.data[row], value)),
            None => {
                self.insert(entity, value);
                None
            }
        }
    }

    /// Swap-and-pop removal. No-op for entities without a row.
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        self.dense_index(entity)?;
        self.remove_index(entity.index())
    }

    fn remove_index(&mut self, index: u32) -> Option<T> {
        let row = self.sparse.remove(&index)?;
        let last = self.data.len() - 1;

        let removed = self.data.swap_remove(row);
        self.entities.swap_remove(row);

        if row != last {
            let moved = self.entities[row];
            self.sparse.insert(moved.index(), row);
        }
        Some(removed)
    }

    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.dense_index(entity).map(|row| &self.data[row])
    }

    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        let row = self.dense_index(entity)?;
        Some(&mut self.data[row])
    }

    #[inline]
    pub fn contains(&self, entity: Entity) -> bool {
        self.dense_index(entity).is_some()
    }

    /// Row of `entity` in the dense arrays.
    #[inline]
    pub fn dense_index(&self, entity: Entity) -> Option<usize> {
        let row = *self.sparse.get(&entity.index())?;
        (self.entities[row] == entity).then_some(row)
    }

    /// Dense component array, parallel to [`entities`](Self::entities).
    #[inline]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Owner of each dense row.
    #[inline]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.entities.iter().copied().zip(self.data.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.entities.iter().copied().zip(self.data.iter_mut())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<T: Component> Default for ComponentStore<T> {
    fn default() -> Self {
        Self::new()
    }
}
