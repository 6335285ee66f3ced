// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tooltip correlation and the single active tooltip.

use crate::host::{Hit, ScreenPoint, ScreenProjector, TooltipEvent, TooltipService, WorldPoint};
use crate::process::ViewerTooltip;
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// The tooltip currently shown by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentTooltip {
    pub id: String,
    pub world_pos: WorldPoint,
    pub screen_pos: ScreenPoint,
    pub event: TooltipEvent,
}

pub struct TooltipHandler {
    data: FxHashMap<String, ViewerTooltip>,
    service: Rc<dyn TooltipService>,
    current: Option<CurrentTooltip>,
}

impl TooltipHandler {
    pub fn new(service: Rc<dyn TooltipService>) -> Self {
        Self {
            data: FxHashMap::default(),
            service,
            current: None,
        }
    }

    /// Replace all tooltip data. Called once per accepted update.
    pub fn setup(&mut self, data: FxHashMap<String, ViewerTooltip>) {
        self.data = data;
    }

    /// Show the tooltip of the hit object at `screen`. Objects without
    /// tooltip data show nothing.
    pub fn show(&mut self, hit: &Hit, screen: ScreenPoint) {
        let Some(tooltip) = self.data.get(&hit.object_id) else {
            tracing::debug!(object_id = %hit.object_id, "No tooltip data for object");
            return;
        };

        let event = TooltipEvent {
            coordinates: [screen.x, screen.y],
            data_items: tooltip.data.clone(),
            identities: vec![tooltip.selection_id.clone()],
            is_touch_event: false,
        };
        self.service.show(&event);
        self.current = Some(CurrentTooltip {
            id: hit.object_id.clone(),
            world_pos: hit.point,
            screen_pos: screen,
            event,
        });
    }

    pub fn hide(&mut self) {
        self.service.hide(true);
        self.current = None;
    }

    /// Reposition the active tooltip after a camera change.
    pub fn move_tooltip(&mut self, projector: &dyn ScreenProjector) {
        let Some(current) = self.current.as_mut() else {
            return;
        };
        let screen = projector.project_to_screen(&current.world_pos);
        current.screen_pos = screen;
        current.event.coordinates = [screen.x, screen.y];
        self.service.move_to(&current.event);
    }

    pub fn current(&self) -> Option<&CurrentTooltip> {
        self.current.as_ref()
    }

    pub fn has_data(&self, id: &str) -> bool {
        self.data.contains_key(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::SelectionId;
    use crate::process::TooltipItem;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct RecordingService {
        shown: RefCell<Vec<TooltipEvent>>,
        moved: RefCell<Vec<[f64; 2]>>,
        hidden: Cell<usize>,
    }

    impl TooltipService for RecordingService {
        fn show(&self, event: &TooltipEvent) {
            self.shown.borrow_mut().push(event.clone());
        }
        fn move_to(&self, event: &TooltipEvent) {
            self.moved.borrow_mut().push(event.coordinates);
        }
        fn hide(&self, _immediately: bool) {
            self.hidden.set(self.hidden.get() + 1);
        }
    }

    struct Offset(f64);

    impl ScreenProjector for Offset {
        fn project_to_screen(&self, world: &WorldPoint) -> ScreenPoint {
            ScreenPoint::new(world.x + self.0, world.y + self.0)
        }
    }

    fn handler() -> (TooltipHandler, Rc<RecordingService>) {
        let service = Rc::new(RecordingService::default());
        let mut handler = TooltipHandler::new(service.clone());
        let mut data = FxHashMap::default();
        data.insert(
            "O1".to_string(),
            ViewerTooltip {
                selection_id: SelectionId::new("s1"),
                data: vec![TooltipItem {
                    display_name: "Area".into(),
                    value: "12".into(),
                }],
            },
        );
        handler.setup(data);
        (handler, service)
    }

    #[test]
    fn show_known_object() {
        let (mut handler, service) = handler();
        handler.show(&Hit::new("O1", WorldPoint::new(1.0, 2.0, 3.0)), ScreenPoint::new(5.0, 6.0));

        let shown = service.shown.borrow();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].coordinates, [5.0, 6.0]);
        assert_eq!(shown[0].identities, vec![SelectionId::new("s1")]);
        assert_eq!(handler.current().unwrap().id, "O1");
    }

    #[test]
    fn unknown_object_shows_nothing() {
        let (mut handler, service) = handler();
        handler.show(&Hit::new("O9", WorldPoint::origin()), ScreenPoint::default());

        assert!(service.shown.borrow().is_empty());
        assert!(handler.current().is_none());
    }

    #[test]
    fn move_reprojects_remembered_world_position() {
        let (mut handler, service) = handler();
        handler.move_tooltip(&Offset(1.0));
        assert!(service.moved.borrow().is_empty());

        handler.show(&Hit::new("O1", WorldPoint::new(1.0, 2.0, 3.0)), ScreenPoint::new(5.0, 6.0));
        handler.move_tooltip(&Offset(10.0));

        assert_eq!(*service.moved.borrow(), vec![[11.0, 12.0]]);
        assert_eq!(handler.current().unwrap().screen_pos, ScreenPoint::new(11.0, 12.0));
    }

    #[test]
    fn hide_clears_current() {
        let (mut handler, service) = handler();
        handler.show(&Hit::new("O1", WorldPoint::origin()), ScreenPoint::default());
        handler.hide();

        assert!(handler.current().is_none());
        assert_eq!(service.hidden.get(), 1);
    }

    #[test]
    fn setup_replaces_data() {
        let (mut handler, _) = handler();
        handler.setup(FxHashMap::default());
        assert!(!handler.has_data("O1"));
    }
}
