//! Per-frame logic units run by a [`Scene`](crate::scene::Scene)
//!
//! A system opts into any of the four lifecycle phases; the rest default
//! to no-ops. Systems run in the order the scene was built with.

use crate::ecs::EntityManager;

/// The four phases a scene dispatches, in the order a frame sees them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    PreFixedUpdate,
    FixedUpdate,
    Update,
    LateUpdate,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::PreFixedUpdate => "pre_fixed_update",
            Phase::FixedUpdate => "fixed_update",
            Phase::Update => "update",
            Phase::LateUpdate => "late_update",
        }
    }
}

pub trait System {
    /// Short name for diagnostics, the type name by default.
    fn name(&self) -> &'static str {
        short_type_name(std::any::type_name::<Self>())
    }

    fn pre_fixed_update(&mut self, _manager: &mut EntityManager, _dt: f32) {}

    fn fixed_update(&mut self, _manager: &mut EntityManager, _dt: f32) {}

    fn update(&mut self, _manager: &mut EntityManager, _dt: f32) {}

    fn late_update(&mut self, _manager: &mut EntityManager, _dt: f32) {}

    fn run(&mut self, phase: Phase, manager: &mut EntityManager, dt: f32) {
        match phase {
            Phase::PreFixedUpdate => self.pre_fixed_update(manager, dt),
            Phase::FixedUpdate => self.fixed_update(manager, dt),
            Phase::Update => self.update(manager, dt),
            Phase::LateUpdate => self.late_update(manager, dt),
        }
    }
}

/// `tandem_core::systems::physics::PhysicsSystem` → `PhysicsSystem`
fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counting {
        calls: Vec<Phase>,
    }

    impl System for Counting {
        fn update(&mut self, _manager: &mut EntityManager, _dt: f32) {
            self.calls.push(Phase::Update);
        }

        fn late_update(&mut self, _manager: &mut EntityManager, _dt: f32) {
            self.calls.push(Phase::LateUpdate);
        }
    }

    #[test]
    fn unimplemented_phases_are_no_ops() {
        let mut manager = EntityManager::new();
        let mut system = Counting { calls: Vec::new() };
        for phase in [Phase::PreFixedUpdate, Phase::FixedUpdate, Phase::Update, Phase::LateUpdate] {
            system.run(phase, &mut manager, 0.016);
        }
        assert_eq!(system.calls, vec![Phase::Update, Phase::LateUpdate]);
        assert_eq!(system.name(), "Counting");
    }
}
