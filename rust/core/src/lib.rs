// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Speckle Power BI Visual Core
//!
//! Data shaping for the Speckle Power BI visual. Power BI delivers query
//! results as a hierarchical *matrix* data view; this crate turns that view
//! into the operations the embedded 3D viewer understands.
//!
//! ## Overview
//!
//! - **Validation**: [`validate_matrix_view`] gates a data view on the
//!   mandatory `stream`, `parentObject` and `object` roles
//! - **Processing**: [`process_matrix_view`] walks the hierarchy once and
//!   produces a [`SpeckleDataInput`] (load URLs, object ids, highlighted ids,
//!   color groups and tooltip payloads)
//! - **Selection**: [`SelectionHandler`] correlates object ids with host
//!   selection identities
//! - **Tooltips**: [`TooltipHandler`] keeps per-object tooltip data and the
//!   single active tooltip
//! - **Settings**: [`VisualSettings`] parses the formatting cards and diffs
//!   them between updates
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use speckle_pbi_core::{
//!     process_matrix_view, validate_matrix_view, HierarchySelectionIds, PaletteCache,
//!     SequentialPalette,
//! };
//!
//! let validated = validate_matrix_view(&options)?;
//! let mut cache = PaletteCache::new();
//! let mut palette = SequentialPalette::default();
//! let input = process_matrix_view(
//!     &validated.view,
//!     &HierarchySelectionIds,
//!     &mut cache,
//!     &mut palette,
//!     validated.has_color_filter,
//!     |id, selection_id| println!("{id} -> {selection_id}"),
//! );
//! println!("loading {} objects", input.objects_to_load.len());
//! ```

pub mod error;
pub mod host;
pub mod matrix;
pub mod palette;
pub mod process;
pub mod selection;
pub mod settings;
pub mod tooltip;
pub mod validate;

pub use error::{Error, Result};
pub use host::{
    ColorPalette, HierarchySelectionIds, Hit, InputState, ScreenPoint, ScreenProjector,
    SelectionId, SelectionIdFactory, SelectionManager, TooltipEvent, TooltipService, VisualHost,
    WorldPoint,
};
pub use matrix::{
    DataView, Highlight, MatrixHierarchy, MatrixLevel, MatrixNode, MatrixNodeValue, MatrixView,
    PrimitiveValue, Role, ValueSource, VisualUpdateOptions, VisualUpdateType,
};
pub use palette::{PaletteCache, SequentialPalette};
pub use process::{
    process_matrix_view, object_url, ColorGroup, SpeckleDataInput, TooltipItem, ViewerTooltip,
};
pub use selection::SelectionHandler;
pub use settings::{
    CameraSettings, CanonicalView, ColorSettings, LightConfiguration, LightingSettings,
    Projection, SettingsChanges, VisualSettings,
};
pub use tooltip::{CurrentTooltip, TooltipHandler};
pub use validate::{validate_matrix_view, ValidatedView};
