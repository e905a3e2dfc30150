//! Entity Component System core types.
//!
//! Components live in per-type sparse sets ([`ComponentStore`]) so add,
//! remove and lookup are O(1) and systems can walk a dense array. The
//! [`EntityManager`] ties the stores together: it allocates generational
//! [`Entity`] handles, owns the [`ComponentRegistry`] used to sweep every
//! store on destroy, and maintains the parent/child [`Relationship`] graph.

mod commands;
mod entity;
mod hierarchy;
mod manager;
mod registry;
mod store;

pub use commands::{Command, CommandBuffer};
pub use entity::Entity;
pub use hierarchy::{HierarchyError, Relationship};
pub use manager::{Disabled, EntityManager};
pub use registry::{ComponentRegistry, ErasedStore};
pub use store::{Component, ComponentStore};
