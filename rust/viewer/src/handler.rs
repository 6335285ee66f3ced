// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lifecycle and batching wrapper around one embedded viewer.
//!
//! All state lives behind `Cell`/`RefCell` and every method takes `&self`, so
//! the handler can be shared (`Rc`) between the update cycle and the
//! interaction task. Borrows never cross an `.await`.

use crate::contract::{FilteringState, InteractionEvent, MouseButton, Viewer, ViewerEvent};
use crate::error::{Result, ViewerError};
use crate::hit::first_viewable_hit;
use futures_util::future::join_all;
use indexmap::IndexSet;
use speckle_pbi_core::{
    ColorGroup, Hit, ScreenPoint, ScreenProjector, SettingsChanges, VisualSettings, WorldPoint,
};
use std::cell::{Cell, RefCell};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

/// Isolation filter key; the viewer recognizes repeated calls as one filter.
pub const ISOLATION_KEY: &str = "powerbi";

/// Tunables of the adapter.
#[derive(Debug, Clone)]
pub struct HandlerConfig {
    /// Concurrent loads per window.
    pub batch_size: usize,
    /// Token for private streams. Public streams load without one.
    pub auth_token: Option<String>,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            batch_size: 25,
            auth_token: None,
        }
    }
}

/// Outcome of one [`ViewerHandler::load_objects`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub loaded: usize,
    pub failed: usize,
    /// Already in the loaded-objects cache.
    pub skipped: usize,
    pub cancelled: bool,
}

pub struct ViewerHandler<V> {
    viewer: V,
    config: HandlerConfig,
    initialized: Cell<bool>,
    events: UnboundedSender<ViewerEvent>,
    state: RefCell<FilteringState>,
    current_selection: RefCell<IndexSet<String>>,
    loaded_objects_cache: RefCell<IndexSet<String>>,
}

impl<V: Viewer> ViewerHandler<V> {
    /// Wrap `viewer`. The receiver yields raw viewer events once [`init`]
    /// has run.
    ///
    /// [`init`]: ViewerHandler::init
    pub fn new(viewer: V, config: HandlerConfig) -> (Self, UnboundedReceiver<ViewerEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let handler = Self {
            viewer,
            config: HandlerConfig {
                batch_size: config.batch_size.max(1),
                ..config
            },
            initialized: Cell::new(false),
            events,
            state: RefCell::new(FilteringState::default()),
            current_selection: RefCell::new(IndexSet::new()),
            loaded_objects_cache: RefCell::new(IndexSet::new()),
        };
        (handler, receiver)
    }

    pub fn viewer(&self) -> &V {
        &self.viewer
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.get()
    }

    /// Initialize the viewer once; later calls are no-ops.
    pub async fn init(&self) -> Result<()> {
        if self.initialized.get() {
            return Ok(());
        }
        tracing::info!("Initializing viewer");
        self.viewer.init().await?;
        self.viewer.subscribe(self.events.clone());
        self.initialized.set(true);
        tracing::info!("Viewer initialized");
        Ok(())
    }

    /// Apply the differences between two settings values.
    pub fn change_settings(&self, old: &VisualSettings, new: &VisualSettings) -> SettingsChanges {
        let changes = old.diff(new);
        if changes.is_empty() {
            return changes;
        }
        tracing::debug!(?changes, "Changing settings in viewer");
        if let Some(projection) = changes.projection {
            self.viewer.set_projection(projection);
        }
        if let Some(view) = changes.default_view {
            self.viewer.set_view(view);
        }
        if let Some(light) = &changes.lighting {
            self.viewer.set_light_configuration(light);
        }
        if let Some(color) = &changes.background {
            self.viewer.set_background(color);
        }
        changes
    }

    pub fn is_loaded(&self, url: &str) -> bool {
        self.loaded_objects_cache.borrow().contains(url)
    }

    /// Loaded URLs in load order.
    pub fn loaded_urls(&self) -> Vec<String> {
        self.loaded_objects_cache.borrow().iter().cloned().collect()
    }

    /// Load `urls` in concurrent windows of `batch_size`.
    ///
    /// URLs already loaded are skipped. A failing object never aborts its
    /// window or the call. Cancellation is checked before each URL; requests
    /// already issued for the current window are still awaited (and cached)
    /// but their callbacks are suppressed.
    pub async fn load_objects(
        &self,
        urls: &[String],
        mut on_load: impl FnMut(&str, usize),
        mut on_error: impl FnMut(&str, &ViewerError),
        cancel: &CancellationToken,
    ) -> LoadSummary {
        let mut summary = LoadSummary::default();
        let mut window: Vec<&str> = Vec::with_capacity(self.config.batch_size);
        tracing::debug!(count = urls.len(), "Loading objects");

        for url in urls {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }
            if self.is_loaded(url) {
                tracing::trace!(url = %url, "Object already loaded");
                summary.skipped += 1;
                continue;
            }
            window.push(url);
            if window.len() == self.config.batch_size {
                self.run_window(&mut window, cancel, &mut on_load, &mut on_error, &mut summary)
                    .await;
            }
        }
        if !window.is_empty() {
            self.run_window(&mut window, cancel, &mut on_load, &mut on_error, &mut summary)
                .await;
        }
        summary.cancelled |= cancel.is_cancelled();

        tracing::debug!(
            loaded = summary.loaded,
            failed = summary.failed,
            skipped = summary.skipped,
            cancelled = summary.cancelled,
            "Load objects finished"
        );
        summary
    }

    async fn run_window(
        &self,
        window: &mut Vec<&str>,
        cancel: &CancellationToken,
        on_load: &mut dyn FnMut(&str, usize),
        on_error: &mut dyn FnMut(&str, &ViewerError),
        summary: &mut LoadSummary,
    ) {
        let token = self.config.auth_token.as_deref();
        let results = join_all(window.drain(..).map(|url| async move {
            (url, self.viewer.load_object_async(url, token, false).await)
        }))
        .await;

        let report = !cancel.is_cancelled();
        for (url, result) in results {
            match result {
                Ok(()) => {
                    self.loaded_objects_cache.borrow_mut().insert(url.to_string());
                    if report {
                        on_load(url, summary.loaded);
                    }
                    summary.loaded += 1;
                }
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "Viewer load error");
                    summary.failed += 1;
                    if report {
                        on_error(url, &e);
                    }
                }
            }
        }
    }

    /// Unload `urls` one by one. Errors are logged, never propagated, and
    /// `on_unloaded` runs for every URL attempted.
    pub async fn unload_objects(
        &self,
        urls: &[String],
        cancel: &CancellationToken,
        mut on_unloaded: Option<&mut dyn FnMut(&str)>,
    ) -> usize {
        let mut attempted = 0;
        for url in urls {
            if cancel.is_cancelled() {
                break;
            }
            if let Err(e) = self.viewer.cancel_load(url, true).await {
                tracing::warn!(url = %url, error = %e, "Viewer unload error");
            }
            self.loaded_objects_cache.borrow_mut().shift_remove(url.as_str());
            if let Some(callback) = on_unloaded.as_mut() {
                callback(url.as_str());
            }
            attempted += 1;
        }
        tracing::debug!(attempted, requested = urls.len(), "Unloaded objects");
        attempted
    }

    /// Replace the color filter with flat colors per group, or remove it.
    ///
    /// If the viewer rejects the groups, the color filter is reset so no
    /// partial coloring stays behind.
    pub async fn color_objects_by_group(&self, groups: Option<&[ColorGroup]>) -> Result<()> {
        let applied = match self.apply_colors(groups).await {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(error = %e, "Filter failed to be applied. Filter will be reset");
                self.viewer.remove_color_filter().await?
            }
        };
        self.set_state(applied);
        Ok(())
    }

    async fn apply_colors(&self, groups: Option<&[ColorGroup]>) -> Result<FilteringState> {
        let cleared = self.viewer.remove_color_filter().await?;
        match groups {
            Some(groups) => self.viewer.set_user_object_colors(groups).await,
            None => Ok(cleared),
        }
    }

    /// Show only `ids`. The previous isolation is lifted first.
    pub async fn isolate_objects(&self, ids: &[String], ghost: bool) -> Result<()> {
        let previous = self.state.borrow().isolated_objects.clone();
        if let Some(previous) = previous.filter(|p| !p.is_empty()) {
            self.un_isolate_objects(&previous).await?;
        }
        tracing::debug!(key = ISOLATION_KEY, count = ids.len(), ghost, "Isolating objects");
        let state = self
            .viewer
            .isolate_objects(ids, ISOLATION_KEY, true, ghost)
            .await?;
        self.set_state(state);
        Ok(())
    }

    pub async fn un_isolate_objects(&self, ids: &[String]) -> Result<()> {
        tracing::debug!(key = ISOLATION_KEY, count = ids.len(), "Un-isolating objects");
        let state = self
            .viewer
            .un_isolate_objects(ids, ISOLATION_KEY, true)
            .await?;
        self.set_state(state);
        Ok(())
    }

    /// Exclusive selection of `ids`; `None` clears the selection.
    pub async fn select_objects(&self, ids: Option<&[String]>) -> Result<()> {
        let ids = ids.unwrap_or(&[]);
        {
            let mut selection = self.current_selection.borrow_mut();
            selection.clear();
            selection.extend(ids.iter().cloned());
        }
        self.viewer.reset_highlight().await?;
        let state = self.viewer.select_objects(ids).await?;
        self.set_state(state);
        Ok(())
    }

    /// Screen-space pick limited to visible geometry.
    pub fn intersect(&self, point: ScreenPoint) -> Option<Hit> {
        let hits = self.viewer.query(point);
        first_viewable_hit(hits, &self.state.borrow())
    }

    /// Classify a raw viewer event. Left clicks also update the viewer-side
    /// selection (ctrl adds to it).
    pub async fn handle_event(&self, event: ViewerEvent) -> Option<InteractionEvent> {
        match event {
            ViewerEvent::CameraUpdate => Some(InteractionEvent::CameraUpdated),
            ViewerEvent::DoubleClick { hits } => {
                let hit = self.first_viewable(hits);
                Some(InteractionEvent::DoubleClicked { hit })
            }
            ViewerEvent::Click { hits, button, ctrl } => {
                let hit = self.first_viewable(hits);
                match button {
                    MouseButton::Right => Some(InteractionEvent::RightClicked { hit, multi: ctrl }),
                    MouseButton::Middle => None,
                    MouseButton::Left => {
                        let ids: Vec<String> = {
                            let mut selection = self.current_selection.borrow_mut();
                            match (&hit, ctrl) {
                                (Some(hit), true) => {
                                    selection.insert(hit.object_id.clone());
                                }
                                (Some(hit), false) => {
                                    selection.clear();
                                    selection.insert(hit.object_id.clone());
                                }
                                (None, false) => selection.clear(),
                                (None, true) => {}
                            }
                            selection.iter().cloned().collect()
                        };
                        if let Err(e) = self.select_objects(Some(&ids)).await {
                            tracing::warn!(error = %e, "Viewer selection failed");
                        }
                        Some(InteractionEvent::Clicked { hit, multi: ctrl })
                    }
                }
            }
        }
    }

    fn first_viewable(&self, hits: Vec<Hit>) -> Option<Hit> {
        first_viewable_hit(hits, &self.state.borrow())
    }

    pub fn state(&self) -> FilteringState {
        self.state.borrow().clone()
    }

    fn set_state(&self, state: FilteringState) {
        *self.state.borrow_mut() = state;
    }

    pub fn current_selection(&self) -> Vec<String> {
        self.current_selection.borrow().iter().cloned().collect()
    }

    /// Unload everything and forget all viewer-side state.
    pub async fn clear(&self) {
        if self.initialized.get() {
            if let Err(e) = self.viewer.unload_all().await {
                tracing::warn!(error = %e, "Viewer unload all failed");
            }
        }
        self.loaded_objects_cache.borrow_mut().clear();
        self.current_selection.borrow_mut().clear();
        self.set_state(FilteringState::default());
    }

    pub fn dispose(&self) {
        if self.initialized.replace(false) {
            self.viewer.dispose();
            tracing::info!("Viewer disposed");
        }
    }
}

impl<V: Viewer> ScreenProjector for ViewerHandler<V> {
    fn project_to_screen(&self, world: &WorldPoint) -> ScreenPoint {
        self.viewer.project_to_screen(world)
    }
}
