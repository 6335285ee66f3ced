// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Color-by palette continuity.
//!
//! Host palettes hand out colors in order of first use, so the same category
//! would drift to a different color whenever rows arrive in a different
//! order. [`PaletteCache`] pins every category to the color it got the first
//! time and only asks the host palette about categories it has not seen.

use crate::host::ColorPalette;
use rustc_hash::FxHashMap;

/// Default Power BI theme colors.
pub const DEFAULT_THEME_COLORS: [&str; 12] = [
    "#118DFF", "#12239E", "#E66C37", "#6B007B", "#E044A7", "#744EC2", "#D9B300", "#D64550",
    "#197278", "#1AAB40", "#15C6F4", "#4092FF",
];

/// Key to color assignments carried from one processing run to the next.
#[derive(Debug, Clone, Default)]
pub struct PaletteCache {
    assignments: FxHashMap<String, String>,
}

impl PaletteCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Color for `key`, allocating from `palette` only for unseen keys.
    pub fn resolve(&mut self, palette: &mut dyn ColorPalette, key: &str) -> String {
        if let Some(color) = self.assignments.get(key) {
            return color.clone();
        }
        let color = palette.get_color(key);
        self.assignments.insert(key.to_string(), color.clone());
        color
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn clear(&mut self) {
        self.assignments.clear();
    }
}

/// Order-of-first-use palette cycling through a fixed color list.
#[derive(Debug, Clone)]
pub struct SequentialPalette {
    colors: Vec<String>,
    assigned: FxHashMap<String, usize>,
}

impl SequentialPalette {
    pub fn new(colors: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let colors: Vec<String> = colors.into_iter().map(Into::into).collect();
        Self {
            colors,
            assigned: FxHashMap::default(),
        }
    }
}

impl Default for SequentialPalette {
    fn default() -> Self {
        Self::new(DEFAULT_THEME_COLORS)
    }
}

impl ColorPalette for SequentialPalette {
    fn get_color(&mut self, key: &str) -> String {
        if self.colors.is_empty() {
            return "#000000".to_string();
        }
        let next = self.assigned.len();
        let index = *self.assigned.entry(key.to_string()).or_insert(next);
        self.colors[index % self.colors.len()].clone()
    }
}
