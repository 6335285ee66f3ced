// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Recording host and matrix builders shared by the integration tests.

#![allow(dead_code)]

use speckle_pbi_core::matrix::DataViewMetadata;
use speckle_pbi_core::{
    ColorPalette, HierarchySelectionIds, InputState, MatrixHierarchy, MatrixLevel, MatrixNode,
    MatrixNodeValue, MatrixView, PrimitiveValue, Role, ScreenPoint, SelectionId,
    SelectionIdFactory, SelectionManager, SequentialPalette, TooltipEvent, TooltipService,
    ValueSource, VisualHost, VisualUpdateOptions,
};
use speckle_pbi_viewer::HeadlessViewer;
use speckle_pbi_visual::{Visual, VisualConfig};
use std::cell::RefCell;
use std::rc::Rc;

/// Host double that records every call as a string.
#[derive(Default)]
pub struct RecordingHost {
    pub log: Rc<RefCell<Vec<String>>>,
    pub warnings: RefCell<Vec<String>>,
    pub input_states: RefCell<Vec<InputState>>,
    pub tooltips: Rc<RefCell<Vec<TooltipEvent>>>,
    on_select: Rc<RefCell<Option<Box<dyn Fn(&[SelectionId])>>>>,
}

impl RecordingHost {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn log(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    pub fn take_log(&self) -> Vec<String> {
        std::mem::take(&mut *self.log.borrow_mut())
    }

    /// Fire the registered host selection callback.
    pub fn select_from_host(&self, ids: &[SelectionId]) {
        if let Some(callback) = self.on_select.borrow().as_ref() {
            callback(ids);
        }
    }
}

struct Manager {
    log: Rc<RefCell<Vec<String>>>,
    on_select: Rc<RefCell<Option<Box<dyn Fn(&[SelectionId])>>>>,
}

impl SelectionManager for Manager {
    fn select(&self, id: &SelectionId, multi_select: bool) {
        self.log.borrow_mut().push(format!("select:{id}:{multi_select}"));
    }

    fn clear(&self) {
        self.log.borrow_mut().push("clear".into());
    }

    fn show_context_menu(&self, id: Option<&SelectionId>, position: ScreenPoint) {
        let id = id.map(|id| id.key().to_string()).unwrap_or_default();
        self.log
            .borrow_mut()
            .push(format!("menu:{id}@{},{}", position.x, position.y));
    }

    fn register_on_select_callback(&self, callback: Box<dyn Fn(&[SelectionId])>) {
        *self.on_select.borrow_mut() = Some(callback);
    }
}

struct Tooltips {
    log: Rc<RefCell<Vec<String>>>,
    events: Rc<RefCell<Vec<TooltipEvent>>>,
}

impl TooltipService for Tooltips {
    fn show(&self, event: &TooltipEvent) {
        self.log.borrow_mut().push("tooltip:show".into());
        self.events.borrow_mut().push(event.clone());
    }

    fn move_to(&self, event: &TooltipEvent) {
        self.log.borrow_mut().push("tooltip:move".into());
        self.events.borrow_mut().push(event.clone());
    }

    fn hide(&self, _immediately: bool) {
        self.log.borrow_mut().push("tooltip:hide".into());
    }
}

impl VisualHost for RecordingHost {
    fn selection_manager(&self) -> Rc<dyn SelectionManager> {
        Rc::new(Manager {
            log: self.log.clone(),
            on_select: self.on_select.clone(),
        })
    }

    fn tooltip_service(&self) -> Rc<dyn TooltipService> {
        Rc::new(Tooltips {
            log: self.log.clone(),
            events: self.tooltips.clone(),
        })
    }

    fn selection_ids(&self) -> Rc<dyn SelectionIdFactory> {
        Rc::new(HierarchySelectionIds)
    }

    fn color_palette(&self) -> Box<dyn ColorPalette> {
        Box::new(SequentialPalette::default())
    }

    fn display_warning(&self, title: &str, _details: &str) {
        self.warnings.borrow_mut().push(title.to_string());
    }

    fn set_input_state(&self, state: InputState) {
        self.input_states.borrow_mut().push(state);
    }
}

pub fn visual(host: &Rc<RecordingHost>, viewer: HeadlessViewer) -> Visual<HeadlessViewer> {
    visual_with(host, viewer, VisualConfig::default())
}

pub fn visual_with(
    host: &Rc<RecordingHost>,
    viewer: HeadlessViewer,
    config: VisualConfig,
) -> Visual<HeadlessViewer> {
    let host: Rc<dyn VisualHost> = host.clone();
    Visual::new(host, viewer, config)
}

/// Object leaf with an `Area` measure.
pub fn object(id: &str, area: f64) -> MatrixNode {
    MatrixNode::new(id).with_values([(0, MatrixNodeValue::plain(area))])
}

/// Object leaf whose `Area` cell carries a highlight column.
pub fn highlighted(id: &str, area: f64, highlight: Option<f64>) -> MatrixNode {
    MatrixNode::new(id).with_values([(
        0,
        MatrixNodeValue::highlighted(area, highlight.map(PrimitiveValue::Number)),
    )])
}

pub fn parent(id: &str, objects: Vec<MatrixNode>) -> MatrixNode {
    MatrixNode::new(id).with_children(objects)
}

pub fn stream(id: &str, parents: Vec<MatrixNode>) -> MatrixNode {
    MatrixNode::new(id).with_children(parents)
}

pub fn matrix(streams: Vec<MatrixNode>, roles: &[Role]) -> MatrixView {
    MatrixView {
        rows: MatrixHierarchy {
            root: MatrixNode::default().with_children(streams),
            levels: roles.iter().map(|role| MatrixLevel::for_role(*role)).collect(),
        },
        value_sources: vec![ValueSource::new("Area")],
    }
}

pub const ROLES: &[Role] = &[Role::Stream, Role::ParentObject, Role::Object];
pub const COLOR_ROLES: &[Role] = &[
    Role::Stream,
    Role::ParentObject,
    Role::ObjectColorBy,
    Role::Object,
];

/// Data update for `stream/objects/parent` holding `objects`.
pub fn update(stream_id: &str, parent_id: &str, objects: &[&str]) -> VisualUpdateOptions {
    let leaves = objects.iter().map(|id| object(id, 1.0)).collect();
    VisualUpdateOptions::data(matrix(
        vec![stream(stream_id, vec![parent(parent_id, leaves)])],
        ROLES,
    ))
}

pub fn with_objects(mut options: VisualUpdateOptions, objects: serde_json::Value) -> VisualUpdateOptions {
    if let Some(view) = options.data_views.first_mut() {
        view.metadata = DataViewMetadata {
            objects: Some(objects),
        };
    }
    options
}

pub fn loads(calls: &[String]) -> Vec<&str> {
    calls
        .iter()
        .filter_map(|call| call.strip_prefix("load:"))
        .collect()
}
