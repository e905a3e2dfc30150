//! # Commands
//!
//! Deferred structural edits. Code that runs while a system is walking a
//! store (script callbacks in particular) records changes here instead of
//! applying them on the spot; the scene flushes the buffer after each
//! system callback returns.
//!
//! ## Invariants
//! - Commands are applied in the order they were recorded.
//! - Commands queued while flushing are applied in the same flush.
//! - A command whose target died in the meantime is a no-op.

use crate::ecs::{Component, Entity, EntityManager};

type Deferred = Box<dyn FnOnce(&mut EntityManager)>;

/// A single deferred edit.
pub enum Command {
    /// Destroy an entity, orphaning its children.
    Destroy { entity: Entity },
    /// Destroy an entity together with its subtree.
    DestroyRecursive { entity: Entity },
    /// Reparent; a refused reparent is logged by the manager and dropped.
    SetParent { child: Entity, parent: Entity },
    RemoveParent { child: Entity },
    SetActive { entity: Entity, active: bool },
    /// Typed edits (component add/remove, spawning) captured as closures.
    Apply(Deferred),
}

impl Command {
    pub(crate) fn apply(self, manager: &mut EntityManager) {
        match self {
            Command::Destroy { entity } => {
                manager.destroy_entity(entity);
            }
            Command::DestroyRecursive { entity } => {
                manager.destroy_entity_recursive(entity);
            }
            Command::SetParent { child, parent } => {
                let _ = manager.set_parent(child, parent);
            }
            Command::RemoveParent { child } => {
                manager.remove_parent(child);
            }
            Command::SetActive { entity, active } => manager.set_active(entity, active),
            Command::Apply(f) => f(manager),
        }
    }
}

/// Ordered queue of [`Command`]s owned by an [`EntityManager`].
#[derive(Default)]
pub struct CommandBuffer {
    queue: Vec<Command>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self { queue: Vec::new() }
    }

    pub fn push(&mut self, command: Command) {
        self.queue.push(command);
    }

    pub fn destroy(&mut self, entity: Entity) {
        self.push(Command::Destroy { entity });
    }

    pub fn destroy_recursive(&mut self, entity: Entity) {
        self.push(Command::DestroyRecursive { entity });
    }

    pub fn set_parent(&mut self, child: Entity, parent: Entity) {
        self.push(Command::SetParent { child, parent });
    }

    pub fn remove_parent(&mut self, child: Entity) {
        self.push(Command::RemoveParent { child });
    }

    pub fn set_active(&mut self, entity: Entity, active: bool) {
        self.push(Command::SetActive { entity, active });
    }

    pub fn add_component<T: Component>(&mut self, entity: Entity, value: T) {
        self.push(Command::Apply(Box::new(move |manager| {
            manager.add_component(entity, value);
        })));
    }

    pub fn remove_component<T: Component>(&mut self, entity: Entity) {
        self.push(Command::Apply(Box::new(move |manager| {
            manager.remove_component::<T>(entity);
        })));
    }

    /// Create an entity at flush time and hand it to `build`.
    pub fn spawn<F>(&mut self, build: F)
    where
        F: FnOnce(&mut EntityManager, Entity) + 'static,
    {
        self.push(Command::Apply(Box::new(move |manager| {
            let entity = manager.create_entity();
            build(manager, entity);
        })));
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub(crate) fn take(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.queue)
    }
}
