// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A host that reports everything through `tracing`.
//!
//! Used when replaying recorded updates outside Power BI.

use speckle_pbi_core::{
    ColorPalette, HierarchySelectionIds, InputState, ScreenPoint, SelectionId, SelectionIdFactory,
    SelectionManager, SequentialPalette, TooltipEvent, TooltipService, VisualHost,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Default)]
pub struct LoggingSelectionManager {
    on_select: RefCell<Option<Box<dyn Fn(&[SelectionId])>>>,
}

impl LoggingSelectionManager {
    /// Simulate a selection change made elsewhere in the report.
    pub fn select_from_host(&self, ids: &[SelectionId]) {
        if let Some(callback) = self.on_select.borrow().as_ref() {
            callback(ids);
        }
    }
}

impl SelectionManager for LoggingSelectionManager {
    fn select(&self, id: &SelectionId, multi_select: bool) {
        tracing::info!(selection_id = %id, multi_select, "Host select");
    }

    fn clear(&self) {
        tracing::info!("Host selection cleared");
    }

    fn show_context_menu(&self, id: Option<&SelectionId>, position: ScreenPoint) {
        tracing::info!(
            selection_id = ?id.map(SelectionId::key),
            x = position.x,
            y = position.y,
            "Host context menu"
        );
    }

    fn register_on_select_callback(&self, callback: Box<dyn Fn(&[SelectionId])>) {
        *self.on_select.borrow_mut() = Some(callback);
    }
}

pub struct LoggingTooltipService;

impl TooltipService for LoggingTooltipService {
    fn show(&self, event: &TooltipEvent) {
        tracing::info!(
            x = event.coordinates[0],
            y = event.coordinates[1],
            items = event.data_items.len(),
            "Tooltip shown"
        );
    }

    fn move_to(&self, event: &TooltipEvent) {
        tracing::debug!(x = event.coordinates[0], y = event.coordinates[1], "Tooltip moved");
    }

    fn hide(&self, immediately: bool) {
        tracing::debug!(immediately, "Tooltip hidden");
    }
}

pub struct LoggingHost {
    selection_manager: Rc<LoggingSelectionManager>,
    tooltip_service: Rc<LoggingTooltipService>,
    warnings: Cell<usize>,
    input_state: Cell<Option<InputState>>,
}

impl Default for LoggingHost {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggingHost {
    pub fn new() -> Self {
        Self {
            selection_manager: Rc::new(LoggingSelectionManager::default()),
            tooltip_service: Rc::new(LoggingTooltipService),
            warnings: Cell::new(0),
            input_state: Cell::new(None),
        }
    }

    pub fn selection(&self) -> &LoggingSelectionManager {
        &self.selection_manager
    }

    pub fn warnings(&self) -> usize {
        self.warnings.get()
    }

    pub fn input_state(&self) -> Option<InputState> {
        self.input_state.get()
    }
}

impl VisualHost for LoggingHost {
    fn selection_manager(&self) -> Rc<dyn SelectionManager> {
        self.selection_manager.clone()
    }

    fn tooltip_service(&self) -> Rc<dyn TooltipService> {
        self.tooltip_service.clone()
    }

    fn selection_ids(&self) -> Rc<dyn SelectionIdFactory> {
        Rc::new(HierarchySelectionIds)
    }

    fn color_palette(&self) -> Box<dyn ColorPalette> {
        Box::new(SequentialPalette::default())
    }

    fn display_warning(&self, title: &str, details: &str) {
        self.warnings.set(self.warnings.get() + 1);
        tracing::warn!(title, details, "Host warning");
    }

    fn set_input_state(&self, state: InputState) {
        tracing::info!(?state, "Input state");
        self.input_state.set(Some(state));
    }
}
