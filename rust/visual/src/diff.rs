// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Incremental load planning between two updates.

use rustc_hash::FxHashSet;

/// What to unload and what to load to go from one object set to the next.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadPlan {
    /// Loaded before, absent now. In previous load order.
    pub to_unload: Vec<String>,
    /// Absent before. In next order, without duplicates.
    pub to_load: Vec<String>,
}

impl LoadPlan {
    pub fn diff(previous: &[String], next: &[String]) -> Self {
        let before: FxHashSet<&str> = previous.iter().map(String::as_str).collect();
        let after: FxHashSet<&str> = next.iter().map(String::as_str).collect();

        let to_unload = previous
            .iter()
            .filter(|url| !after.contains(url.as_str()))
            .cloned()
            .collect();

        let mut queued = FxHashSet::default();
        let to_load = next
            .iter()
            .filter(|url| !before.contains(url.as_str()) && queued.insert(url.as_str()))
            .cloned()
            .collect();

        Self { to_unload, to_load }
    }

    pub fn is_empty(&self) -> bool {
        self.to_unload.is_empty() && self.to_load.is_empty()
    }
}
