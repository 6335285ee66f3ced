// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! World to screen projection.

use nalgebra::Matrix4;
use speckle_pbi_core::{ScreenPoint, WorldPoint};

/// Horizontal nudge so tooltips do not sit under the cursor.
const TOOLTIP_X_OFFSET: f64 = 10.0;

/// Visual size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

/// Project `world` through `view_projection` into viewport pixels
/// (origin top left, y down).
pub fn project_to_screen(
    view_projection: &Matrix4<f64>,
    world: &WorldPoint,
    viewport: Viewport,
) -> ScreenPoint {
    let ndc = view_projection.transform_point(world);
    ScreenPoint {
        x: (ndc.x * 0.5 + 0.5) * viewport.width - TOOLTIP_X_OFFSET,
        y: (ndc.y * -0.5 + 0.5) * viewport.height,
    }
}
