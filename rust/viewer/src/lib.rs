// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Speckle Viewer Adapter
//!
//! The embedded 3D viewer is an external collaborator reached through the
//! [`Viewer`] trait. [`ViewerHandler`] wraps one viewer instance and adds:
//!
//! - **Batched loads**: objects load in fixed-size concurrent windows, each
//!   window fully awaited before the next starts
//! - **Cancellation**: a [`CancellationToken`] is checked per URL, so a
//!   superseded update stops after at most one more window
//! - **Filtering**: isolation under a stable key, flat color groups, selection
//! - **Picking**: hits restricted to the currently isolated objects
//! - **Events**: raw viewer events arrive over a channel and are classified
//!   into [`InteractionEvent`]s
//!
//! [`HeadlessViewer`] implements the contract in memory for tests and the
//! replay tool.
//!
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

pub mod contract;
pub mod error;
pub mod handler;
pub mod headless;
pub mod hit;
pub mod projection;

pub use contract::{FilteringState, InteractionEvent, MouseButton, Viewer, ViewerEvent};
pub use error::{Result, ViewerError};
pub use handler::{HandlerConfig, LoadSummary, ViewerHandler, ISOLATION_KEY};
pub use headless::HeadlessViewer;
pub use hit::first_viewable_hit;
pub use projection::{project_to_screen, Viewport};
