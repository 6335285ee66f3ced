// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for viewer operations.

use thiserror::Error;

/// Result type alias for viewer operations.
pub type Result<T> = std::result::Result<T, ViewerError>;

/// Failures reported by the embedded viewer. None of them is fatal: the next
/// accepted update starts from whatever state the viewer is in.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ViewerError {
    #[error("viewer is not initialized")]
    NotInitialized,

    #[error("viewer initialization failed: {0}")]
    Init(String),

    #[error("failed to load {url}: {reason}")]
    Load { url: String, reason: String },

    #[error("failed to unload {url}: {reason}")]
    Unload { url: String, reason: String },

    #[error("filter operation failed: {0}")]
    Filter(String),
}
