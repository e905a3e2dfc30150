//! Entity handle with generational index
//!
//! Entities are lightweight handles (8 bytes). The generation counter is
//! bumped every time a slot is recycled, so a handle captured before a
//! destroy can never resolve to the entity that later reuses its index.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Entity handle (generation-indexed for safety)
///
/// Format: [32-bit index | 32-bit generation]
/// - Index: slot in the manager's allocation table, `0` is reserved
/// - Generation: incremented on destroy
///
/// Example:
/// ```ignore
/// let entity = manager.create_entity();
/// manager.destroy_entity(entity);
/// assert!(!manager.is_alive(entity)); // generation mismatch
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity {
    index: u32,
    generation: u32,
}

impl Entity {
    /// Sentinel meaning "no entity". Never returned by the allocator.
    pub const INVALID: Entity = Entity::new(0, 0);

    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// `false` only for [`Entity::INVALID`]; says nothing about liveness.
    pub fn is_valid(&self) -> bool {
        self.index != 0
    }

    /// Serialize to 64-bit integer (for networking/save files)
    pub fn to_bits(&self) -> u64 {
        ((self.generation as u64) << 32) | (self.index as u64)
    }

    /// Deserialize from 64-bit integer
    pub fn from_bits(bits: u64) -> Self {
        Self {
            index: bits as u32,
            generation: (bits >> 32) as u32,
        }
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}v{}", self.index, self.generation)
        } else {
            f.write_str("invalid")
        }
    }
}

/// Hands out entity slots and tracks which generation is live in each.
pub(crate) struct EntityAllocator {
    generations: Vec<u32>,
    alive: Vec<bool>,
    free: Vec<u32>,
    live: usize,
}

impl EntityAllocator {
    pub fn new() -> Self {
        // Slot 0 backs `Entity::INVALID` and is never handed out.
        Self {
            generations: vec![0],
            alive: vec![false],
            free: Vec::new(),
            live: 0,
        }
    }

    pub fn allocate(&mut self) -> Entity {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = index as usize;
            self.alive[slot] = true;
            return Entity::new(index, self.generations[slot]);
        }

        let index = u32::try_from(self.generations.len()).expect("entity index space exhausted");
        self.generations.push(0);
        self.alive.push(true);
        Entity::new(index, 0)
    }

    /// Release a live entity. Returns `false` for stale or invalid handles.
    pub fn free(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        let slot = entity.index as usize;
        self.alive[slot] = false;
        self.live -= 1;
        match self.generations[slot].checked_add(1) {
            Some(next) => {
                self.generations[slot] = next;
                self.free.push(entity.index);
            }
            // Out of generations: reusing the slot would revive stale handles.
            None => tracing::debug!(%entity, "retired entity slot"),
        }
        true
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        let slot = entity.index as usize;
        entity.is_valid()
            && slot < self.generations.len()
            && self.alive[slot]
            && self.generations[slot] == entity.generation
    }

    pub fn live(&self) -> usize {
        self.live
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_starts_above_invalid() {
        let mut allocator = EntityAllocator::new();
        let first = allocator.allocate();
        assert!(first.is_valid());
        assert_ne!(first, Entity::INVALID);
        assert_eq!(first.index(), 1);
        assert!(!allocator.is_alive(Entity::INVALID));
    }

    #[test]
    fn recycled_slot_rejects_stale_handle() {
        let mut allocator = EntityAllocator::new();
        let stale = allocator.allocate();
        assert!(allocator.free(stale));

        let fresh = allocator.allocate();
        assert_eq!(fresh.index(), stale.index());
        assert_ne!(fresh.generation(), stale.generation());
        assert!(allocator.is_alive(fresh));
        assert!(!allocator.is_alive(stale));
        assert!(!allocator.free(stale));
        assert_eq!(allocator.live(), 1);
    }

    #[test]
    fn bits_round_trip() {
        let entity = Entity::new(42, 7);
        assert_eq!(Entity::from_bits(entity.to_bits()), entity);
    }

    #[test]
    fn exhausted_slot_is_retired() {
        let mut allocator = EntityAllocator::new();
        let first = allocator.allocate();
        allocator.generations[first.index() as usize] = u32::MAX;
        let last = Entity::new(first.index(), u32::MAX);

        assert!(allocator.free(last));

        let next = allocator.allocate();
        assert_ne!(next.index(), first.index());
        assert!(!allocator.is_alive(last));
        assert!(!allocator.is_alive(first));
        assert_eq!(allocator.live(), 1);
    }
}
