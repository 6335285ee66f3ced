// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hit filtering against the isolation state.

use crate::contract::FilteringState;
use rustc_hash::FxHashSet;
use speckle_pbi_core::Hit;

/// First hit the user can actually see.
///
/// While objects are isolated, ghosted geometry still intersects, so only hits
/// on isolated objects count. Otherwise the nearest hit wins.
pub fn first_viewable_hit(hits: Vec<Hit>, state: &FilteringState) -> Option<Hit> {
    match &state.isolated_objects {
        Some(isolated) => {
            let visible: FxHashSet<&str> = isolated.iter().map(String::as_str).collect();
            hits.into_iter()
                .find(|hit| visible.contains(hit.object_id.as_str()))
        }
        None => hits.into_iter().next(),
    }
}
