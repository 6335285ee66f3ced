// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The update orchestrator.
//!
//! A [`Visual`] owns one viewer and turns host updates into viewer
//! operations: data updates are debounced and run as single-flight cycles,
//! viewer events are routed back into host selection and tooltips.

use crate::config::VisualConfig;
use crate::diff::LoadPlan;
use crate::interaction;
use crate::scheduler::UpdateScheduler;
use rustc_hash::{FxHashMap, FxHashSet};
use speckle_pbi_core::{
    process_matrix_view, validate_matrix_view, ColorPalette, Error, InputState, PaletteCache,
    SelectionHandler, SelectionId, SelectionIdFactory, TooltipHandler, ValidatedView, VisualHost,
    VisualSettings, VisualUpdateOptions,
};
use speckle_pbi_viewer::{Viewer, ViewerHandler};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const LOAD_ERROR_TITLE: &str = "Load error";
const LOAD_ERROR_DETAILS: &str = "One or more objects could not be loaded. \
    Make sure the stream is public or that an access token is configured.";
const INCOMPLETE_INPUT_TITLE: &str = "Incomplete data input.";

/// Where the visual is in its update lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UpdatePhase {
    #[default]
    Idle,
    /// An update is waiting for the debounce period to elapse.
    DebouncePending,
    Validating,
    Applying,
}

/// How a cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Applied,
    /// The data view failed validation and the viewer was cleared.
    Invalid,
    /// A newer update superseded this cycle.
    Cancelled,
    /// The viewer could not be initialized.
    Failed,
}

/// Counters of the last finished cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub outcome: CycleOutcome,
    pub unloaded: usize,
    pub loaded: usize,
    pub failed: usize,
}

impl CycleReport {
    fn new(outcome: CycleOutcome) -> Self {
        Self {
            outcome,
            unloaded: 0,
            loaded: 0,
            failed: 0,
        }
    }
}

/// State shared by update cycles and the interaction task.
pub(crate) struct VisualState<V> {
    pub(crate) host: Rc<dyn VisualHost>,
    pub(crate) viewer: ViewerHandler<V>,
    pub(crate) selection: RefCell<SelectionHandler>,
    pub(crate) tooltip: RefCell<TooltipHandler>,
    ids: Rc<dyn SelectionIdFactory>,
    palette: RefCell<PaletteCache>,
    host_palette: RefCell<Box<dyn ColorPalette>>,
    settings: RefCell<VisualSettings>,
    phase: Cell<UpdatePhase>,
    last_report: Cell<Option<CycleReport>>,
}

pub struct Visual<V: Viewer + 'static> {
    state: Rc<VisualState<V>>,
    scheduler: UpdateScheduler<VisualUpdateOptions>,
    interaction: Option<JoinHandle<()>>,
    shutdown: CancellationToken,
}

impl<V: Viewer + 'static> Visual<V> {
    /// Build the visual around `viewer`. Must be called inside a
    /// [`tokio::task::LocalSet`]: the debounce loop and the interaction
    /// router are spawned as local tasks.
    pub fn new(host: Rc<dyn VisualHost>, viewer: V, config: VisualConfig) -> Self {
        let (viewer, viewer_events) = ViewerHandler::new(viewer, config.handler_config());
        let manager = host.selection_manager();
        let state = Rc::new(VisualState {
            selection: RefCell::new(SelectionHandler::new(manager.clone())),
            tooltip: RefCell::new(TooltipHandler::new(host.tooltip_service())),
            ids: host.selection_ids(),
            palette: RefCell::new(PaletteCache::new()),
            host_palette: RefCell::new(host.color_palette()),
            settings: RefCell::new(VisualSettings::default()),
            phase: Cell::new(UpdatePhase::Idle),
            last_report: Cell::new(None),
            viewer,
            host,
        });

        let (selections_tx, selections) = mpsc::unbounded_channel::<Vec<SelectionId>>();
        manager.register_on_select_callback(Box::new(move |ids: &[SelectionId]| {
            if selections_tx.send(ids.to_vec()).is_err() {
                tracing::debug!("Interaction router stopped, dropping host selection");
            }
        }));

        let shutdown = CancellationToken::new();
        let interaction = tokio::task::spawn_local(interaction::route(
            state.clone(),
            viewer_events,
            selections,
            config.camera_throttle(),
            shutdown.clone(),
        ));

        let cycle_state = state.clone();
        let scheduler = UpdateScheduler::spawn(config.debounce(), move |options, cancel| {
            run_cycle(cycle_state.clone(), options, cancel)
        });

        tracing::info!(
            debounce_ms = config.debounce_ms,
            batch_size = config.load_batch_size,
            "Visual created"
        );

        Self {
            state,
            scheduler,
            interaction: Some(interaction),
            shutdown,
        }
    }

    /// Entry point for host updates. Layout-only updates are ignored and
    /// return `false`; everything else is debounced.
    pub fn update(&self, options: VisualUpdateOptions) -> bool {
        if options.update_type.is_layout_only() {
            tracing::debug!(update_type = %options.update_type, "Ignoring layout update");
            return false;
        }
        tracing::debug!(update_type = %options.update_type, "Scheduling update");
        self.scheduler.schedule(options);
        true
    }

    pub fn phase(&self) -> UpdatePhase {
        if self.scheduler.is_pending() {
            UpdatePhase::DebouncePending
        } else {
            self.state.phase.get()
        }
    }

    /// Resolve once no update is pending or running.
    pub async fn settled(&self) {
        self.scheduler.settled().await;
    }

    pub fn last_report(&self) -> Option<CycleReport> {
        self.state.last_report.get()
    }

    pub fn viewer(&self) -> &ViewerHandler<V> {
        &self.state.viewer
    }

    pub fn settings(&self) -> VisualSettings {
        self.state.settings.borrow().clone()
    }

    /// Number of objects correlated with a host selection identity.
    pub fn selection_len(&self) -> usize {
        self.state.selection.borrow().len()
    }

    pub fn selection_id(&self, object_id: &str) -> Option<SelectionId> {
        self.state.selection.borrow().get(object_id).cloned()
    }

    /// Cancel the running cycle, stop both tasks and release the viewer.
    pub async fn dispose(&mut self) {
        self.scheduler.shutdown().await;
        self.shutdown.cancel();
        if let Some(task) = self.interaction.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Interaction task failed");
            }
        }
        self.state.tooltip.borrow_mut().hide();
        self.state.viewer.dispose();
        self.state.phase.set(UpdatePhase::Idle);
    }
}

impl<V: Viewer + 'static> Drop for Visual<V> {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn run_cycle<V: Viewer>(
    state: Rc<VisualState<V>>,
    options: VisualUpdateOptions,
    cancel: CancellationToken,
) {
    let report = state.cycle(&options, &cancel).await;
    tracing::info!(
        outcome = ?report.outcome,
        unloaded = report.unloaded,
        loaded = report.loaded,
        failed = report.failed,
        "Update cycle finished"
    );
    state.last_report.set(Some(report));
    state.phase.set(UpdatePhase::Idle);
}

impl<V: Viewer> VisualState<V> {
    async fn cycle(&self, options: &VisualUpdateOptions, cancel: &CancellationToken) -> CycleReport {
        self.phase.set(UpdatePhase::Validating);
        if let Err(e) = self.viewer.init().await {
            tracing::error!(error = %e, "Viewer initialization failed");
            self.host.display_warning("Viewer error", &e.to_string());
            return CycleReport::new(CycleOutcome::Failed);
        }

        self.apply_settings(options);

        let validated = match validate_matrix_view(options) {
            Ok(validated) => validated,
            Err(e) => {
                self.tear_down(&e).await;
                return CycleReport::new(CycleOutcome::Invalid);
            }
        };
        if cancel.is_cancelled() {
            return CycleReport::new(CycleOutcome::Cancelled);
        }

        self.phase.set(UpdatePhase::Applying);
        self.apply(validated, cancel).await
    }

    fn apply_settings(&self, options: &VisualUpdateOptions) {
        let new = VisualSettings::from_objects(options.objects());
        let old = self.settings.replace(new.clone());
        let changes = self.viewer.change_settings(&old, &new);
        if let Some(enabled) = changes.color_enabled {
            tracing::debug!(enabled, "Color by group toggled");
        }
    }

    async fn tear_down(&self, error: &Error) {
        tracing::warn!(error = %error, "Incomplete data input, clearing viewer");
        self.viewer.clear().await;
        self.selection.borrow_mut().reset();
        {
            let mut palette = self.palette.borrow_mut();
            if !palette.is_empty() {
                tracing::debug!(colors = palette.len(), "Dropping category colors");
                palette.clear();
            }
        }
        {
            let mut tooltip = self.tooltip.borrow_mut();
            tooltip.hide();
            tooltip.setup(FxHashMap::default());
        }
        self.host.display_warning(INCOMPLETE_INPUT_TITLE, &error.to_string());
        self.host.set_input_state(error.input_state());
    }

    async fn apply(&self, validated: ValidatedView<'_>, cancel: &CancellationToken) -> CycleReport {
        let mut report = CycleReport::new(CycleOutcome::Cancelled);

        let mut pairs = Vec::new();
        let mut input = {
            let mut palette = self.palette.borrow_mut();
            let mut host_palette = self.host_palette.borrow_mut();
            process_matrix_view(
                validated.view,
                self.ids.as_ref(),
                &mut palette,
                &mut **host_palette,
                validated.has_color_filter,
                |id, selection_id| pairs.push((id.to_string(), selection_id.clone())),
            )
        };

        if cancel.is_cancelled() {
            return report;
        }
        {
            let mut selection = self.selection.borrow_mut();
            for (id, selection_id) in pairs {
                selection.set(id, selection_id);
            }
            let live: FxHashSet<&str> = input.object_ids.iter().map(String::as_str).collect();
            let pruned = selection.retain(&live);
            tracing::debug!(tracked = selection.len(), pruned, "Selection identities updated");
        }
        self.tooltip
            .borrow_mut()
            .setup(std::mem::take(&mut input.object_tooltip_data));
        self.host.set_input_state(InputState::Valid);

        if cancel.is_cancelled() {
            return report;
        }
        let plan = LoadPlan::diff(&self.viewer.loaded_urls(), &input.objects_to_load);
        tracing::info!(
            load = plan.to_load.len(),
            unload = plan.to_unload.len(),
            "Updating viewer objects"
        );
        report.unloaded = self.viewer.unload_objects(&plan.to_unload, cancel, None).await;
        if cancel.is_cancelled() {
            return report;
        }

        let summary = self
            .viewer
            .load_objects(
                &plan.to_load,
                |url, index| tracing::trace!(url = %url, index, "Object loaded"),
                |_, _| {},
                cancel,
            )
            .await;
        report.loaded = summary.loaded;
        report.failed = summary.failed;
        if summary.cancelled {
            return report;
        }
        if summary.failed > 0 {
            self.host.display_warning(LOAD_ERROR_TITLE, LOAD_ERROR_DETAILS);
        }

        let color_enabled = self.settings.borrow().color.enabled;
        let groups = if color_enabled {
            input.color_by_ids.as_deref()
        } else {
            None
        };
        if let Err(e) = self.viewer.color_objects_by_group(groups).await {
            tracing::warn!(error = %e, "Coloring objects failed");
        }
        if cancel.is_cancelled() {
            return report;
        }

        let visible = if input.selected_ids.is_empty() {
            &input.object_ids
        } else {
            &input.selected_ids
        };
        if let Err(e) = self.viewer.isolate_objects(visible, true).await {
            tracing::warn!(error = %e, "Isolating objects failed");
        }

        report.outcome = CycleOutcome::Applied;
        report
    }
}
