// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Matrix view processing.
//!
//! A single depth-first, order-preserving walk over a validated matrix view
//! that derives everything one update needs:
//!
//! 1. one load URL per parent-object node (`{stream}/objects/{parent}`)
//! 2. the flat list of object ids and a selection identity for each
//! 3. the ids taking part in an active cross-highlight
//! 4. color groups when the color-by role is bound
//! 5. tooltip payloads from the measure columns

use crate::host::{ColorPalette, SelectionId, SelectionIdFactory};
use crate::matrix::{Highlight, MatrixNode, MatrixView};
use crate::palette::PaletteCache;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use smallvec::SmallVec;

/// Index path of a node below the hierarchy root.
type NodePath = SmallVec<[usize; 4]>;

/// One `displayName: value` line of a tooltip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TooltipItem {
    pub display_name: String,
    pub value: String,
}

/// Tooltip payload cached per object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerTooltip {
    pub selection_id: SelectionId,
    pub data: Vec<TooltipItem>,
}

/// Objects painted with one flat color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorGroup {
    pub color: String,
    pub object_ids: Vec<String>,
}

/// Normalized input for one accepted update.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeckleDataInput {
    pub objects_to_load: Vec<String>,
    pub object_ids: Vec<String>,
    pub selected_ids: Vec<String>,
    /// `None` when the color-by role is not bound.
    pub color_by_ids: Option<Vec<ColorGroup>>,
    pub object_tooltip_data: FxHashMap<String, ViewerTooltip>,
}

/// Load URL of a parent object.
pub fn object_url(stream: &str, parent_object: &str) -> String {
    format!("{}/objects/{}", stream, parent_object)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColorDecision {
    Color,
    DoNotColor,
}

struct Traversal<'a, F> {
    view: &'a MatrixView,
    ids: &'a dyn SelectionIdFactory,
    on_selection_pair: F,
    input: SpeckleDataInput,
    seen: FxHashSet<String>,
    selected: FxHashSet<String>,
}

impl<'a, F> Traversal<'a, F>
where
    F: FnMut(&str, &SelectionId),
{
    /// Visits an object node. Returns the id when the object should be colored.
    fn visit_object(&mut self, node: &MatrixNode, path: &NodePath) -> Option<String> {
        let id = match node.value_string() {
            Some(id) => id,
            None => {
                tracing::debug!(?path, "Skipping object node without a value");
                return None;
            }
        };
        if !self.seen.insert(id.clone()) {
            tracing::debug!(object_id = %id, "Skipping duplicate object id");
            return None;
        }
        self.input.object_ids.push(id.clone());

        let selection_id =
            self.ids
                .matrix_node_selection_id(node, path, &self.view.rows.levels);
        (self.on_selection_pair)(&id, &selection_id);

        let mut decision = ColorDecision::Color;
        if let Some(values) = node.values.as_ref().filter(|v| !v.is_empty()) {
            let mut data = Vec::with_capacity(values.len());
            for (index, cell) in values {
                match cell.highlight() {
                    Highlight::Absent => {}
                    Highlight::Null => decision = ColorDecision::DoNotColor,
                    Highlight::Value(_) => {
                        if self.selected.insert(id.clone()) {
                            self.input.selected_ids.push(id.clone());
                        }
                        decision = ColorDecision::Color;
                    }
                }

                let display_name = self
                    .view
                    .value_sources
                    .get(*index)
                    .map(|source| source.display_name.clone())
                    .unwrap_or_else(|| format!("Column {}", index));
                data.push(TooltipItem {
                    display_name,
                    value: cell.value.as_ref().map(|v| v.to_string()).unwrap_or_default(),
                });
            }
            self.input
                .object_tooltip_data
                .insert(id.clone(), ViewerTooltip { selection_id, data });
        }

        (decision == ColorDecision::Color).then_some(id)
    }
}

/// Derive a [`SpeckleDataInput`] from a validated matrix view.
///
/// `on_selection_pair` receives every object id together with its selection
/// identity, before the caller touches the viewer. Colors for color-by groups
/// come from `palette`, which pins categories to the color they were given in
/// earlier runs; `host_palette` is only consulted for new categories.
pub fn process_matrix_view<F>(
    view: &MatrixView,
    ids: &dyn SelectionIdFactory,
    palette: &mut PaletteCache,
    host_palette: &mut dyn ColorPalette,
    has_color_filter: bool,
    on_selection_pair: F,
) -> SpeckleDataInput
where
    F: FnMut(&str, &SelectionId),
{
    let mut traversal = Traversal {
        view,
        ids,
        on_selection_pair,
        input: SpeckleDataInput {
            color_by_ids: has_color_filter.then(Vec::new),
            ..Default::default()
        },
        seen: FxHashSet::default(),
        selected: FxHashSet::default(),
    };

    let mut path = NodePath::new();
    for (stream_index, stream) in view.rows.root.children().iter().enumerate() {
        let stream_id = stream.value_string().unwrap_or_default();
        path.push(stream_index);

        for (parent_index, parent) in stream.children().iter().enumerate() {
            let parent_id = parent.value_string().unwrap_or_default();
            traversal
                .input
                .objects_to_load
                .push(object_url(&stream_id, &parent_id));
            path.push(parent_index);

            for (child_index, child) in parent.children().iter().enumerate() {
                path.push(child_index);
                if has_color_filter {
                    let key = child.value_string().unwrap_or_default();
                    let color = palette.resolve(host_palette, &key);
                    let mut group = ColorGroup {
                        color,
                        object_ids: Vec::new(),
                    };
                    for (object_index, object) in child.children().iter().enumerate() {
                        path.push(object_index);
                        if let Some(id) = traversal.visit_object(object, &path) {
                            group.object_ids.push(id);
                        }
                        path.pop();
                    }
                    if !group.object_ids.is_empty() {
                        if let Some(groups) = traversal.input.color_by_ids.as_mut() {
                            groups.push(group);
                        }
                    }
                } else {
                    traversal.visit_object(child, &path);
                }
                path.pop();
            }
            path.pop();
        }
        path.pop();
    }

    let input = traversal.input;
    tracing::debug!(
        urls = input.objects_to_load.len(),
        objects = input.object_ids.len(),
        selected = input.selected_ids.len(),
        groups = input.color_by_ids.as_ref().map_or(0, Vec::len),
        "Processed matrix view"
    );
    input
}
