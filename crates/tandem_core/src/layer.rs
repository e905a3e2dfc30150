//! Ordered application layers
//!
//! Layers are the unit the frame loop talks to. Each one usually owns a
//! [`Scene`](crate::scene::Scene) and forwards its callbacks; others host
//! overlays or debug tooling. Layers run in ascending priority, and layers
//! pushed with equal priority keep their push order.

use std::fmt;

pub trait Layer {
    fn on_attach(&mut self) {}
    fn on_detach(&mut self) {}
    fn on_pre_fixed_update(&mut self, _dt: f32) {}
    fn on_fixed_update(&mut self, _dt: f32) {}
    fn on_update(&mut self, _dt: f32) {}
    fn on_late_update(&mut self, _dt: f32) {}
}

/// Identifies a pushed layer for later removal or pausing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(u32);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer#{}", self.0)
    }
}

struct LayerEntry {
    id: LayerId,
    name: String,
    priority: i32,
    paused: bool,
    layer: Box<dyn Layer>,
}

#[derive(Default)]
pub struct LayerStack {
    entries: Vec<LayerEntry>,
    next_id: u32,
}

impl LayerStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `layer` after every layer with priority `<= priority` and
    /// attach it.
    pub fn push(&mut self, name: impl Into<String>, priority: i32, layer: impl Layer + 'static) -> LayerId {
        self.push_boxed(name, priority, Box::new(layer))
    }

    pub fn push_boxed(&mut self, name: impl Into<String>, priority: i32, mut layer: Box<dyn Layer>) -> LayerId {
        let id = LayerId(self.next_id);
        self.next_id += 1;
        let name = name.into();

        layer.on_attach();
        tracing::info!(%id, layer = %name, priority, "attached layer");

        let at = self.entries.partition_point(|entry| entry.priority <= priority);
        self.entries.insert(
            at,
            LayerEntry {
                id,
                name,
                priority,
                paused: false,
                layer,
            },
        );
        id
    }

    /// Detach and return the layer with `id`.
    pub fn pop(&mut self, id: LayerId) -> Option<Box<dyn Layer>> {
        let at = self.entries.iter().position(|entry| entry.id == id)?;
        Some(self.detach_at(at))
    }

    /// Detach the first layer called `name`.
    pub fn pop_by_name(&mut self, name: &str) -> Option<Box<dyn Layer>> {
        let at = self.entries.iter().position(|entry| entry.name == name)?;
        Some(self.detach_at(at))
    }

    fn detach_at(&mut self, at: usize) -> Box<dyn Layer> {
        let mut entry = self.entries.remove(at);
        entry.layer.on_detach();
        tracing::info!(id = %entry.id, layer = %entry.name, "detached layer");
        entry.layer
    }

    /// Paused layers skip the fixed-cadence callbacks only.
    pub fn set_paused(&mut self, id: LayerId, paused: bool) -> bool {
        match self.entries.iter_mut().find(|entry| entry.id == id) {
            Some(entry) => {
                entry.paused = paused;
                tracing::debug!(%id, paused, "layer pause changed");
                true
            }
            None => false,
        }
    }

    pub fn is_paused(&self, id: LayerId) -> bool {
        self.entries.iter().any(|entry| entry.id == id && entry.paused)
    }

    pub fn get(&self, id: LayerId) -> Option<&dyn Layer> {
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.layer.as_ref())
    }

    pub fn get_mut(&mut self, id: LayerId) -> Option<&mut (dyn Layer + 'static)> {
        self.entries
            .iter_mut()
            .find(|entry| entry.id == id)
            .map(|entry| entry.layer.as_mut())
    }

    /// Layer names in dispatch order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pre_fixed_update(&mut self, dt: f32) {
        for entry in self.entries.iter_mut().filter(|entry| !entry.paused) {
            entry.layer.on_pre_fixed_update(dt);
        }
    }

    pub fn fixed_update(&mut self, dt: f32) {
        for entry in self.entries.iter_mut().filter(|entry| !entry.paused) {
            entry.layer.on_fixed_update(dt);
        }
    }

    pub fn update(&mut self, dt: f32) {
        for entry in &mut self.entries {
            entry.layer.on_update(dt);
        }
    }

    pub fn late_update(&mut self, dt: f32) {
        for entry in &mut self.entries {
            entry.layer.on_late_update(dt);
        }
    }

    /// Detach every layer, topmost first.
    pub fn clear(&mut self) {
        while !self.entries.is_empty() {
            self.detach_at(self.entries.len() - 1);
        }
    }
}

impl Drop for LayerStack {
    fn drop(&mut self) {
        self.clear();
    }
}
