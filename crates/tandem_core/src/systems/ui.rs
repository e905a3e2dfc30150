//! Screen-space UI submission

use crate::components::UiElement;
use crate::ecs::EntityManager;
use crate::facade::{UiItem, UiSink};
use crate::system::System;

/// Submits visible, active [`UiElement`]s back to front by depth.
pub struct UiSystem {
    sink: Box<dyn UiSink>,
    scratch: Vec<UiItem>,
}

impl UiSystem {
    pub fn new(sink: impl UiSink + 'static) -> Self {
        Self::from_box(Box::new(sink))
    }

    pub fn from_box(sink: Box<dyn UiSink>) -> Self {
        Self {
            sink,
            scratch: Vec::new(),
        }
    }
}

impl System for UiSystem {
    fn late_update(&mut self, manager: &mut EntityManager, _dt: f32) {
        self.scratch.clear();
        self.scratch.extend(
            manager
                .query_active::<UiElement>()
                .filter(|(_, el)| el.visible)
                .map(|(entity, el)| UiItem {
                    entity,
                    position: el.position,
                    size: el.size,
                    depth: el.depth,
                }),
        );
        // Stable: equal depths keep store order.
        self.scratch.sort_by_key(|item| item.depth);
        for item in self.scratch.drain(..) {
            self.sink.submit(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec2;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn sorted_by_depth_and_hidden_skipped() {
        let sink = Rc::new(RefCell::new(Vec::<UiItem>::new()));
        let mut system = UiSystem::new(sink.clone());
        let mut manager = EntityManager::new();

        let top = manager.create_entity();
        let bottom = manager.create_entity();
        let invisible = manager.create_entity();
        manager.add_component(top, UiElement { depth: 5, ..UiElement::new(Vec2::ZERO, Vec2::ONE) });
        manager.add_component(bottom, UiElement { depth: -1, ..UiElement::new(Vec2::ZERO, Vec2::ONE) });
        manager.add_component(
            invisible,
            UiElement { visible: false, ..UiElement::new(Vec2::ZERO, Vec2::ONE) },
        );

        system.late_update(&mut manager, 0.016);

        let order: Vec<_> = sink.borrow().iter().map(|item| item.entity).collect();
        assert_eq!(order, vec![bottom, top]);
    }
}
