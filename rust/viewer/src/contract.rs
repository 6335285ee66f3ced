// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The embedded viewer contract.

use crate::error::Result;
use speckle_pbi_core::{
    CanonicalView, ColorGroup, Hit, LightConfiguration, Projection, ScreenPoint, WorldPoint,
};
use tokio::sync::mpsc::UnboundedSender;

/// Filtering state token returned by filter operations.
///
/// Threaded through subsequent calls; only `isolated_objects` is read back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteringState {
    pub isolated_objects: Option<Vec<String>>,
    pub selected_objects: Vec<String>,
    pub highlighted_objects: Vec<String>,
    pub user_colors: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

/// Raw events pushed by the viewer. Hits are ordered nearest first.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    Click {
        hits: Vec<Hit>,
        button: MouseButton,
        ctrl: bool,
    },
    DoubleClick {
        hits: Vec<Hit>,
    },
    CameraUpdate,
}

/// Viewer events after hit filtering and button classification.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionEvent {
    Clicked { hit: Option<Hit>, multi: bool },
    RightClicked { hit: Option<Hit>, multi: bool },
    DoubleClicked { hit: Option<Hit> },
    CameraUpdated,
}

/// Operations of the embedded Speckle viewer.
///
/// Implementations are single-threaded: every method takes `&self` and the
/// futures are driven on one local task set.
#[allow(async_fn_in_trait)]
pub trait Viewer {
    async fn init(&self) -> Result<()>;

    async fn load_object_async(
        &self,
        url: &str,
        auth_token: Option<&str>,
        zoom_to_object: bool,
    ) -> Result<()>;

    /// Cancel a pending load; with `unload` the object is removed as well.
    async fn cancel_load(&self, url: &str, unload: bool) -> Result<()>;

    async fn select_objects(&self, ids: &[String]) -> Result<FilteringState>;

    async fn reset_highlight(&self) -> Result<FilteringState>;

    async fn highlight_objects(&self, ids: &[String], ghost: bool) -> Result<FilteringState>;

    async fn isolate_objects(
        &self,
        ids: &[String],
        key: &str,
        include_descendants: bool,
        ghost: bool,
    ) -> Result<FilteringState>;

    async fn un_isolate_objects(
        &self,
        ids: &[String],
        key: &str,
        include_descendants: bool,
    ) -> Result<FilteringState>;

    async fn set_user_object_colors(&self, groups: &[ColorGroup]) -> Result<FilteringState>;

    async fn remove_color_filter(&self) -> Result<FilteringState>;

    async fn unload_all(&self) -> Result<()>;

    /// Screen-space pick, nearest hit first.
    fn query(&self, point: ScreenPoint) -> Vec<Hit>;

    fn project_to_screen(&self, world: &WorldPoint) -> ScreenPoint;

    /// Route viewer events into `events`, replacing any earlier subscriber.
    fn subscribe(&self, events: UnboundedSender<ViewerEvent>);

    fn set_view(&self, view: CanonicalView);

    fn set_projection(&self, projection: Projection);

    fn set_light_configuration(&self, config: &LightConfiguration);

    /// CSS color behind the rendered scene.
    fn set_background(&self, color: &str);

    /// Drop event subscriptions and release the viewer.
    fn dispose(&self);
}
