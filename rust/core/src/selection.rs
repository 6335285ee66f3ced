// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Object id to host selection identity correlation.

use crate::host::{Hit, ScreenProjector, SelectionId, SelectionManager};
use rustc_hash::{FxHashMap, FxHashSet};
use std::rc::Rc;

/// Owns the object id → [`SelectionId`] map and forwards selections to the
/// host selection manager.
///
/// Unknown ids are absorbed silently on every path: they show up when a click
/// on stale geometry races a data update.
pub struct SelectionHandler {
    selection_id_map: FxHashMap<String, SelectionId>,
    manager: Rc<dyn SelectionManager>,
}

impl SelectionHandler {
    pub fn new(manager: Rc<dyn SelectionManager>) -> Self {
        Self {
            selection_id_map: FxHashMap::default(),
            manager,
        }
    }

    pub fn set(&mut self, id: impl Into<String>, selection_id: SelectionId) {
        self.selection_id_map.insert(id.into(), selection_id);
    }

    pub fn get(&self, id: &str) -> Option<&SelectionId> {
        self.selection_id_map.get(id)
    }

    pub fn has(&self, id: &str) -> bool {
        self.selection_id_map.contains_key(id)
    }

    /// Select `id` in the host, adding to the current selection when `multi`.
    pub fn select(&self, id: &str, multi: bool) {
        match self.selection_id_map.get(id) {
            Some(selection_id) => self.manager.select(selection_id, multi),
            None => tracing::debug!(object_id = %id, "Ignoring selection of unknown object"),
        }
    }

    /// Clear the host selection. Keeps the map.
    pub fn clear(&self) {
        self.manager.clear();
    }

    /// Clear the host selection and forget every identity.
    pub fn reset(&mut self) {
        self.clear();
        self.selection_id_map = FxHashMap::default();
    }

    /// Keys currently tracked.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.selection_id_map.keys().map(String::as_str)
    }

    /// Drop every entry whose id is not in `live`.
    pub fn retain(&mut self, live: &FxHashSet<&str>) -> usize {
        let before = self.selection_id_map.len();
        self.selection_id_map.retain(|id, _| live.contains(id.as_str()));
        before - self.selection_id_map.len()
    }

    /// Object ids for host selection identities, skipping unknown ones.
    pub fn ids_for(&self, selection_ids: &[SelectionId]) -> Vec<String> {
        let wanted: FxHashSet<&SelectionId> = selection_ids.iter().collect();
        let mut ids: Vec<String> = self
            .selection_id_map
            .iter()
            .filter(|(_, sid)| wanted.contains(sid))
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Open the host context menu at the projected hit position.
    pub fn show_context_menu(&self, hit: &Hit, projector: &dyn ScreenProjector) {
        let position = projector.project_to_screen(&hit.point);
        self.manager
            .show_context_menu(self.selection_id_map.get(&hit.object_id), position);
    }

    pub fn len(&self) -> usize {
        self.selection_id_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selection_id_map.is_empty()
    }
}
