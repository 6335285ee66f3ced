// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Capabilities consumed from the Power BI host.
//!
//! The host SDK is an external collaborator; these traits are the seams the
//! visual talks through. Implementations wrap the JS host in production and
//! record calls in tests.

use crate::matrix::{MatrixLevel, MatrixNode};
use crate::process::TooltipItem;
use serde::Serialize;
use std::fmt;
use std::rc::Rc;

/// Position in model space.
pub type WorldPoint = nalgebra::Point3<f64>;

/// Position in visual (CSS pixel) space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A picked object: its id and the world-space intersection point.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub object_id: String,
    pub point: WorldPoint,
}

impl Hit {
    pub fn new(object_id: impl Into<String>, point: WorldPoint) -> Self {
        Self {
            object_id: object_id.into(),
            point,
        }
    }
}

/// Opaque selection identity issued by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SelectionId(String);

impl SelectionId {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn key(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SelectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Builds selection identities for matrix nodes (`withMatrixNode`).
pub trait SelectionIdFactory {
    /// `path` is the index path of `node` below the hierarchy root.
    fn matrix_node_selection_id(
        &self,
        node: &MatrixNode,
        path: &[usize],
        levels: &[MatrixLevel],
    ) -> SelectionId;
}

/// Structural identity: the node's index path plus its value.
///
/// Stable as long as the host keeps row order between updates.
#[derive(Debug, Clone, Copy, Default)]
pub struct HierarchySelectionIds;

impl SelectionIdFactory for HierarchySelectionIds {
    fn matrix_node_selection_id(
        &self,
        node: &MatrixNode,
        path: &[usize],
        levels: &[MatrixLevel],
    ) -> SelectionId {
        let path = path
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join("/");
        let value = node.value_string().unwrap_or_default();
        SelectionId(format!("matrix[{}]:{}={}", levels.len(), path, value))
    }
}

/// Host selection manager.
pub trait SelectionManager {
    fn select(&self, id: &SelectionId, multi_select: bool);
    fn clear(&self);
    fn show_context_menu(&self, id: Option<&SelectionId>, position: ScreenPoint);
    /// Called by the host when the selection changes from outside the visual.
    fn register_on_select_callback(&self, callback: Box<dyn Fn(&[SelectionId])>);
}

/// Payload handed to the host tooltip service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TooltipEvent {
    pub coordinates: [f64; 2],
    pub data_items: Vec<TooltipItem>,
    pub identities: Vec<SelectionId>,
    pub is_touch_event: bool,
}

/// Host tooltip service.
pub trait TooltipService {
    fn show(&self, event: &TooltipEvent);
    fn move_to(&self, event: &TooltipEvent);
    fn hide(&self, immediately: bool);
}

/// Host color palette: an order-of-first-use allocator.
pub trait ColorPalette {
    fn get_color(&mut self, key: &str) -> String;
}

/// Projects world positions onto the visual's screen space.
pub trait ScreenProjector {
    fn project_to_screen(&self, world: &WorldPoint) -> ScreenPoint;
}

/// Landing page status driven by input validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputState {
    Valid,
    Incomplete,
    Invalid,
}

/// Everything the visual needs from its host.
pub trait VisualHost {
    fn selection_manager(&self) -> Rc<dyn SelectionManager>;
    fn tooltip_service(&self) -> Rc<dyn TooltipService>;
    fn selection_ids(&self) -> Rc<dyn SelectionIdFactory>;
    fn color_palette(&self) -> Box<dyn ColorPalette>;
    /// Warning icon in the visual header.
    fn display_warning(&self, title: &str, details: &str);
    fn set_input_state(&self, state: InputState);
}
