//! A named world plus the ordered systems that run over it

use crate::ecs::EntityManager;
use crate::system::{Phase, System};
use crate::systems::{default_pipeline, Backends};
use tandem_metrics::SystemProfiler;

pub struct Scene {
    name: String,
    manager: EntityManager,
    systems: Vec<Box<dyn System>>,
    profiler: SystemProfiler,
}

impl Scene {
    /// A scene running `systems` in the given order.
    pub fn new(name: impl Into<String>, systems: Vec<Box<dyn System>>) -> Self {
        let name = name.into();
        tracing::debug!(scene = %name, systems = systems.len(), "created scene");
        Self {
            name,
            manager: EntityManager::new(),
            systems,
            profiler: SystemProfiler::new(),
        }
    }

    /// A scene with the standard transform/render/script/physics/ui order.
    pub fn with_default_pipeline(name: impl Into<String>, backends: Backends) -> Self {
        let name = name.into();
        let systems = default_pipeline(&name, backends);
        Self::new(name, systems)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn manager(&self) -> &EntityManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut EntityManager {
        &mut self.manager
    }

    pub fn system_names(&self) -> Vec<&'static str> {
        self.systems.iter().map(|s| s.name()).collect()
    }

    pub fn profiler(&self) -> &SystemProfiler {
        &self.profiler
    }

    /// Run every system's `phase` callback in order.
    ///
    /// Commands queued by a system are applied before the next one runs.
    pub fn run_phase(&mut self, phase: Phase, dt: f32) {
        let Self {
            manager,
            systems,
            profiler,
            ..
        } = self;
        for system in systems.iter_mut() {
            profiler.time_system(system.name(), || system.run(phase, manager, dt));
            let applied = manager.flush_commands();
            if applied > 0 {
                tracing::trace!(system = system.name(), phase = phase.as_str(), applied, "flushed commands");
            }
        }
    }

    pub fn pre_fixed_update(&mut self, dt: f32) {
        self.run_phase(Phase::PreFixedUpdate, dt);
    }

    pub fn fixed_update(&mut self, dt: f32) {
        self.run_phase(Phase::FixedUpdate, dt);
    }

    pub fn update(&mut self, dt: f32) {
        self.run_phase(Phase::Update, dt);
    }

    pub fn late_update(&mut self, dt: f32) {
        self.run_phase(Phase::LateUpdate, dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::Entity;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Tagged {
        tag: &'static str,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl System for Tagged {
        fn name(&self) -> &'static str {
            self.tag
        }

        fn update(&mut self, _manager: &mut EntityManager, _dt: f32) {
            self.log.borrow_mut().push(format!("{} update", self.tag));
        }

        fn fixed_update(&mut self, _manager: &mut EntityManager, _dt: f32) {
            self.log.borrow_mut().push(format!("{} fixed", self.tag));
        }
    }

    #[derive(Default)]
    struct Despawner;

    impl System for Despawner {
        fn update(&mut self, manager: &mut EntityManager, _dt: f32) {
            for e in manager.entities::<u32>().to_vec() {
                manager.commands().destroy(e);
            }
        }
    }

    struct Observer {
        seen: Rc<RefCell<Vec<usize>>>,
    }

    impl System for Observer {
        fn update(&mut self, manager: &mut EntityManager, _dt: f32) {
            self.seen.borrow_mut().push(manager.live_count());
        }
    }

    #[test]
    fn systems_run_in_construction_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let systems: Vec<Box<dyn System>> = ["a", "b", "c"]
            .into_iter()
            .map(|tag| Box::new(Tagged { tag, log: log.clone() }) as Box<dyn System>)
            .collect();
        let mut scene = Scene::new("ordering", systems);

        scene.fixed_update(0.016);
        scene.update(0.016);

        assert_eq!(
            *log.borrow(),
            ["a fixed", "b fixed", "c fixed", "a update", "b update", "c update"]
        );
        assert_eq!(scene.system_names(), vec!["a", "b", "c"]);
    }

    #[test]
    fn commands_apply_between_systems() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let systems: Vec<Box<dyn System>> = vec![
            Box::new(Despawner),
            Box::new(Observer { seen: seen.clone() }),
        ];
        let mut scene = Scene::new("deferred", systems);
        let manager = scene.manager_mut();
        for i in 0..3u32 {
            let e: Entity = manager.create_entity();
            manager.add_component(e, i);
        }

        scene.update(0.016);

        assert_eq!(*seen.borrow(), vec![0]);
    }

    #[cfg(feature = "metrics")]
    #[test]
    fn systems_are_profiled_by_name() {
        let mut scene = Scene::new("profiled", vec![Box::new(Despawner) as Box<dyn System>]);
        scene.update(0.016);
        scene.late_update(0.016);
        assert_eq!(scene.profiler().calls("Despawner"), 2);
    }
}
