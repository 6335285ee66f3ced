// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory viewer without rendering.
//!
//! Keeps the loaded set and filtering state the real viewer would hold,
//! records every call, and can be scripted (slow or failing loads, pick
//! results, emitted events). Used by the replay tool and by tests.

use crate::contract::{FilteringState, Viewer, ViewerEvent};
use crate::error::{Result, ViewerError};
use crate::projection::{project_to_screen, Viewport};
use indexmap::IndexSet;
use nalgebra::Matrix4;
use rustc_hash::FxHashSet;
use speckle_pbi_core::{
    CanonicalView, ColorGroup, Hit, LightConfiguration, Projection, ScreenPoint, WorldPoint,
};
use std::cell::{Cell, RefCell};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

pub struct HeadlessViewer {
    initialized: Cell<bool>,
    disposed: Cell<bool>,
    loaded: RefCell<IndexSet<String>>,
    calls: RefCell<Vec<String>>,
    load_delay: Cell<Duration>,
    failing: RefCell<FxHashSet<String>>,
    fail_colors: Cell<bool>,
    in_flight: Cell<usize>,
    max_in_flight: Cell<usize>,
    events: RefCell<Option<UnboundedSender<ViewerEvent>>>,
    pick: RefCell<Vec<Hit>>,
    view_projection: Cell<Matrix4<f64>>,
    viewport: Cell<Viewport>,
    view: Cell<Option<CanonicalView>>,
    projection: Cell<Option<Projection>>,
    light: Cell<Option<LightConfiguration>>,
    background: RefCell<Option<String>>,
    state: RefCell<FilteringState>,
}

impl Default for HeadlessViewer {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessViewer {
    pub fn new() -> Self {
        Self {
            initialized: Cell::new(false),
            disposed: Cell::new(false),
            loaded: RefCell::new(IndexSet::new()),
            calls: RefCell::new(Vec::new()),
            load_delay: Cell::new(Duration::ZERO),
            failing: RefCell::new(FxHashSet::default()),
            fail_colors: Cell::new(false),
            in_flight: Cell::new(0),
            max_in_flight: Cell::new(0),
            events: RefCell::new(None),
            pick: RefCell::new(Vec::new()),
            view_projection: Cell::new(Matrix4::identity()),
            viewport: Cell::new(Viewport::default()),
            view: Cell::new(None),
            projection: Cell::new(None),
            light: Cell::new(None),
            background: RefCell::new(None),
            state: RefCell::new(FilteringState::default()),
        }
    }

    /// Every load takes `delay` of (tokio) time.
    pub fn with_load_delay(self, delay: Duration) -> Self {
        self.load_delay.set(delay);
        self
    }

    /// Loads of `url` fail.
    pub fn fail_on(&self, url: impl Into<String>) {
        self.failing.borrow_mut().insert(url.into());
    }

    /// Every following `set_user_object_colors` is rejected.
    pub fn fail_colors(&self) {
        self.fail_colors.set(true);
    }

    /// Hits returned by every following pick.
    pub fn set_pick(&self, hits: Vec<Hit>) {
        *self.pick.borrow_mut() = hits;
    }

    pub fn set_camera(&self, view_projection: Matrix4<f64>, viewport: Viewport) {
        self.view_projection.set(view_projection);
        self.viewport.set(viewport);
    }

    /// Push an event to the subscriber. Returns false without one.
    pub fn emit(&self, event: ViewerEvent) -> bool {
        match self.events.borrow().as_ref() {
            Some(sender) => sender.send(event).is_ok(),
            None => false,
        }
    }

    pub fn loaded(&self) -> Vec<String> {
        self.loaded.borrow().iter().cloned().collect()
    }

    /// Recorded calls, e.g. `load:A/objects/P1` or `isolate:powerbi:O1,O2`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn take_calls(&self) -> Vec<String> {
        std::mem::take(&mut *self.calls.borrow_mut())
    }

    /// Highest number of loads awaited at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.get()
    }

    pub fn filtering_state(&self) -> FilteringState {
        self.state.borrow().clone()
    }

    pub fn view(&self) -> Option<CanonicalView> {
        self.view.get()
    }

    pub fn projection(&self) -> Option<Projection> {
        self.projection.get()
    }

    pub fn light(&self) -> Option<LightConfiguration> {
        self.light.get()
    }

    pub fn background(&self) -> Option<String> {
        self.background.borrow().clone()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.initialized.get() {
            Ok(())
        } else {
            Err(ViewerError::NotInitialized)
        }
    }

    fn update_state(&self, update: impl FnOnce(&mut FilteringState)) -> FilteringState {
        let mut state = self.state.borrow_mut();
        update(&mut state);
        state.clone()
    }
}

impl Viewer for HeadlessViewer {
    async fn init(&self) -> Result<()> {
        self.record("init".into());
        self.initialized.set(true);
        Ok(())
    }

    async fn load_object_async(
        &self,
        url: &str,
        _auth_token: Option<&str>,
        _zoom_to_object: bool,
    ) -> Result<()> {
        self.ensure_initialized()?;
        self.record(format!("load:{url}"));
        let in_flight = self.in_flight.get() + 1;
        self.in_flight.set(in_flight);
        self.max_in_flight.set(self.max_in_flight.get().max(in_flight));

        let delay = self.load_delay.get();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.set(self.in_flight.get() - 1);

        if self.failing.borrow().contains(url) {
            return Err(ViewerError::Load {
                url: url.to_string(),
                reason: "object not found".into(),
            });
        }
        self.loaded.borrow_mut().insert(url.to_string());
        Ok(())
    }

    async fn cancel_load(&self, url: &str, unload: bool) -> Result<()> {
        self.ensure_initialized()?;
        self.record(format!("unload:{url}"));
        if unload && !self.loaded.borrow_mut().shift_remove(url) {
            return Err(ViewerError::Unload {
                url: url.to_string(),
                reason: "not loaded".into(),
            });
        }
        Ok(())
    }

    async fn select_objects(&self, ids: &[String]) -> Result<FilteringState> {
        self.record(format!("select:{}", ids.join(",")));
        Ok(self.update_state(|s| s.selected_objects = ids.to_vec()))
    }

    async fn reset_highlight(&self) -> Result<FilteringState> {
        self.record("reset_highlight".into());
        Ok(self.update_state(|s| s.highlighted_objects.clear()))
    }

    async fn highlight_objects(&self, ids: &[String], _ghost: bool) -> Result<FilteringState> {
        self.record(format!("highlight:{}", ids.join(",")));
        Ok(self.update_state(|s| s.highlighted_objects = ids.to_vec()))
    }

    async fn isolate_objects(
        &self,
        ids: &[String],
        key: &str,
        _include_descendants: bool,
        _ghost: bool,
    ) -> Result<FilteringState> {
        self.record(format!("isolate:{key}:{}", ids.join(",")));
        Ok(self.update_state(|s| s.isolated_objects = Some(ids.to_vec())))
    }

    async fn un_isolate_objects(
        &self,
        ids: &[String],
        key: &str,
        _include_descendants: bool,
    ) -> Result<FilteringState> {
        self.record(format!("unisolate:{key}:{}", ids.join(",")));
        Ok(self.update_state(|s| {
            if let Some(isolated) = s.isolated_objects.as_mut() {
                isolated.retain(|id| !ids.contains(id));
                if isolated.is_empty() {
                    s.isolated_objects = None;
                }
            }
        }))
    }

    async fn set_user_object_colors(&self, groups: &[ColorGroup]) -> Result<FilteringState> {
        let summary: Vec<String> = groups
            .iter()
            .map(|g| format!("{}={}", g.color, g.object_ids.join("+")))
            .collect();
        self.record(format!("colors:{}", summary.join(",")));
        if self.fail_colors.get() {
            return Err(ViewerError::Filter("color groups rejected".into()));
        }
        Ok(self.update_state(|s| s.user_colors = Some(groups.len())))
    }

    async fn remove_color_filter(&self) -> Result<FilteringState> {
        self.record("remove_colors".into());
        Ok(self.update_state(|s| s.user_colors = None))
    }

    async fn unload_all(&self) -> Result<()> {
        self.ensure_initialized()?;
        self.record("unload_all".into());
        self.loaded.borrow_mut().clear();
        *self.state.borrow_mut() = FilteringState::default();
        Ok(())
    }

    fn query(&self, _point: ScreenPoint) -> Vec<Hit> {
        self.pick.borrow().clone()
    }

    fn project_to_screen(&self, world: &WorldPoint) -> ScreenPoint {
        project_to_screen(&self.view_projection.get(), world, self.viewport.get())
    }

    fn subscribe(&self, events: UnboundedSender<ViewerEvent>) {
        *self.events.borrow_mut() = Some(events);
    }

    fn set_view(&self, view: CanonicalView) {
        self.record(format!("view:{view:?}"));
        self.view.set(Some(view));
    }

    fn set_projection(&self, projection: Projection) {
        self.record(format!("projection:{projection:?}"));
        self.projection.set(Some(projection));
    }

    fn set_light_configuration(&self, config: &LightConfiguration) {
        self.record("light".into());
        self.light.set(Some(*config));
    }

    fn set_background(&self, color: &str) {
        self.record(format!("background:{color}"));
        *self.background.borrow_mut() = Some(color.to_string());
    }

    fn dispose(&self) {
        self.record("dispose".into());
        self.events.borrow_mut().take();
        self.disposed.set(true);
    }
}
