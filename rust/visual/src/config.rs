// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Runtime configuration loaded from environment variables.

use speckle_pbi_viewer::HandlerConfig;
use std::time::Duration;

/// Visual configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualConfig {
    /// Quiet period before a burst of updates is applied.
    pub debounce_ms: u64,
    /// Concurrent object loads per window.
    pub load_batch_size: usize,
    /// Minimum spacing of tooltip moves while the camera changes.
    pub camera_throttle_ms: u64,
    /// Token for private streams.
    pub auth_token: Option<String>,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            load_batch_size: 25,
            camera_throttle_ms: 100,
            auth_token: None,
        }
    }
}

impl VisualConfig {
    /// Load configuration from environment variables. Unparsable values fall
    /// back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            debounce_ms: std::env::var("SPECKLE_PBI_DEBOUNCE_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.debounce_ms),
            load_batch_size: std::env::var("SPECKLE_PBI_LOAD_BATCH_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|size| *size > 0)
                .unwrap_or(defaults.load_batch_size),
            camera_throttle_ms: std::env::var("SPECKLE_PBI_CAMERA_THROTTLE_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.camera_throttle_ms),
            auth_token: std::env::var("SPECKLE_PBI_AUTH_TOKEN")
                .ok()
                .filter(|token| !token.is_empty()),
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn camera_throttle(&self) -> Duration {
        Duration::from_millis(self.camera_throttle_ms)
    }

    pub fn handler_config(&self) -> HandlerConfig {
        HandlerConfig {
            batch_size: self.load_batch_size,
            auth_token: self.auth_token.clone(),
        }
    }
}
