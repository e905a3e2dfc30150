//! Tandem Engine Core
//!
//! Contains the runtime substrate everything else builds on:
//! - Entity/component storage with a parent-child hierarchy
//! - Systems, scenes and the built-in system pipeline
//! - Layers and the dual-rate frame loop
//! - Background upload hand-off

pub mod app;
pub mod components;
pub mod ecs;
pub mod facade;
pub mod layer;
pub mod math;
pub mod platform;
pub mod scene;
pub mod scheduler;
pub mod script;
pub mod system;
pub mod systems;
pub mod time;
pub mod upload;

pub use glam;

pub use app::{Application, FrameStats, ShutdownSignal};
pub use ecs::{Entity, EntityManager};
pub use layer::{Layer, LayerId, LayerStack};
pub use scene::Scene;
pub use scheduler::{FramePlan, FrameScheduler, SchedulerConfig};
pub use system::{Phase, System};

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
