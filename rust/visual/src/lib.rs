// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Speckle Power BI Visual
//!
//! Update orchestration for the Speckle Power BI visual. The host calls
//! [`Visual::update`] for every report change; data updates are debounced,
//! the in-flight cycle is cancelled when a newer one starts, and each cycle
//! validates, processes and applies the data view to the viewer.
//!
//! Everything runs on one thread: create the [`Visual`] inside a
//! [`tokio::task::LocalSet`] on a current-thread runtime.
//!
//! ```rust,ignore
//! use speckle_pbi_visual::{LoggingHost, Visual, VisualConfig};
//! use speckle_pbi_viewer::HeadlessViewer;
//!
//! let local = tokio::task::LocalSet::new();
//! local.run_until(async {
//!     let visual = Visual::new(Rc::new(LoggingHost::new()), HeadlessViewer::new(), VisualConfig::from_env());
//!     visual.update(options);
//!     visual.settled().await;
//! }).await;
//! ```

pub mod config;
pub mod diff;
pub mod host;
mod interaction;
pub mod scheduler;
pub mod visual;

pub use config::VisualConfig;
pub use diff::LoadPlan;
pub use host::{LoggingHost, LoggingSelectionManager, LoggingTooltipService};
pub use scheduler::UpdateScheduler;
pub use visual::{CycleOutcome, CycleReport, UpdatePhase, Visual};
