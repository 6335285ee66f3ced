// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Formatting settings cards (camera, color, lighting).
//!
//! The host persists card values in `dataViews[0].metadata.objects`. They are
//! parsed on every update and diffed against the previous value, so the viewer
//! only hears about what actually changed.

use serde::{Deserialize, Deserializer, Serialize};
use std::f64::consts::PI;

/// Camera presets understood by the viewer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalView {
    #[default]
    #[serde(rename = "3d", alias = "3D", alias = "perspective", alias = "default")]
    ThreeD,
    Front,
    Back,
    #[serde(alias = "up")]
    Top,
    #[serde(alias = "down")]
    Bottom,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Projection {
    #[default]
    Perspective,
    #[serde(alias = "ortho")]
    Orthographic,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CameraSettings {
    pub default_view: CanonicalView,
    pub projection: Projection,
}

/// Accepts a bare color string or the host's `{ "solid": { "color": .. } }` fill.
fn fill_color<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Solid {
        color: String,
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Fill {
        Plain(String),
        Solid { solid: Solid },
    }

    Ok(match Fill::deserialize(deserializer)? {
        Fill::Plain(color) => color,
        Fill::Solid { solid } => solid.color,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColorSettings {
    /// Color-by groups are painted only when enabled.
    pub enabled: bool,
    #[serde(deserialize_with = "fill_color")]
    pub fill: String,
}

impl Default for ColorSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            fill: "#ffffff".to_string(),
        }
    }
}

/// Sun light parameters in the shape the viewer expects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LightConfiguration {
    pub enabled: bool,
    pub cast_shadow: bool,
    pub intensity: f64,
    pub elevation: f64,
    pub azimuth: f64,
    pub indirect_light_intensity: f64,
    pub shadowcatcher: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LightingSettings {
    pub enabled: bool,
    pub intensity: f64,
    pub elevation: f64,
    pub azimuth: f64,
    pub indirect: f64,
    pub shadows: bool,
    pub shadow_catcher: bool,
}

impl Default for LightingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            intensity: 5.0,
            elevation: 1.33,
            azimuth: 0.75,
            indirect: 1.2,
            shadows: true,
            shadow_catcher: true,
        }
    }
}

impl LightingSettings {
    /// Slider bounds of the lighting card.
    pub const INTENSITY: (f64, f64) = (1.0, 10.0);
    pub const ELEVATION: (f64, f64) = (0.0, PI);
    pub const AZIMUTH: (f64, f64) = (-PI * 0.5, PI * 0.5);
    pub const INDIRECT: (f64, f64) = (0.0, 5.0);

    pub fn viewer_configuration(&self) -> LightConfiguration {
        let clamp = |v: f64, (min, max): (f64, f64)| v.clamp(min, max);
        LightConfiguration {
            enabled: self.enabled,
            cast_shadow: self.shadows,
            intensity: clamp(self.intensity, Self::INTENSITY),
            elevation: clamp(self.elevation, Self::ELEVATION),
            azimuth: clamp(self.azimuth, Self::AZIMUTH),
            indirect_light_intensity: clamp(self.indirect, Self::INDIRECT),
            shadowcatcher: self.shadow_catcher,
        }
    }
}

/// All formatting cards of the visual.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualSettings {
    pub camera: CameraSettings,
    pub color: ColorSettings,
    pub lighting: LightingSettings,
}

/// What differs between two [`VisualSettings`] values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsChanges {
    pub default_view: Option<CanonicalView>,
    pub projection: Option<Projection>,
    pub lighting: Option<LightConfiguration>,
    pub color_enabled: Option<bool>,
    /// New background fill of the viewer container.
    pub background: Option<String>,
}

impl SettingsChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl VisualSettings {
    /// Parse `metadata.objects`. Missing cards and slices fall back to
    /// defaults; a malformed payload yields the defaults as a whole.
    pub fn from_objects(objects: Option<&serde_json::Value>) -> Self {
        let Some(objects) = objects else {
            return Self::default();
        };
        match Self::deserialize(objects) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(error = %e, "Invalid formatting settings, using defaults");
                Self::default()
            }
        }
    }

    pub fn diff(&self, new: &VisualSettings) -> SettingsChanges {
        let old_light = self.lighting.viewer_configuration();
        let new_light = new.lighting.viewer_configuration();
        SettingsChanges {
            default_view: (self.camera.default_view != new.camera.default_view)
                .then_some(new.camera.default_view),
            projection: (self.camera.projection != new.camera.projection)
                .then_some(new.camera.projection),
            lighting: (old_light != new_light).then_some(new_light),
            color_enabled: (self.color.enabled != new.color.enabled).then_some(new.color.enabled),
            background: (self.color.fill != new.color.fill).then(|| new.color.fill.clone()),
        }
    }
}
