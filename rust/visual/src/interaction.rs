// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Routing of viewer events and host selection changes.

use crate::visual::VisualState;
use speckle_pbi_core::{Hit, SelectionId};
use speckle_pbi_viewer::{InteractionEvent, Viewer, ViewerEvent};
use std::rc::Rc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

/// Leading and trailing edge throttle for tooltip moves.
struct Throttle {
    period: Duration,
    last: Option<Instant>,
    trailing: bool,
}

impl Throttle {
    fn new(period: Duration) -> Self {
        Self {
            period,
            last: None,
            trailing: false,
        }
    }

    /// `Ok` when the call may run now, `Err(deadline)` when it has to wait.
    fn admit(&mut self, now: Instant) -> Result<(), Instant> {
        match self.last {
            Some(last) if now < last + self.period => {
                self.trailing = true;
                Err(last + self.period)
            }
            _ => {
                self.last = Some(now);
                Ok(())
            }
        }
    }

    fn fire_trailing(&mut self, now: Instant) -> bool {
        let fire = std::mem::take(&mut self.trailing);
        if fire {
            self.last = Some(now);
        }
        fire
    }
}

pub(crate) async fn route<V: Viewer>(
    state: Rc<VisualState<V>>,
    mut viewer_events: UnboundedReceiver<ViewerEvent>,
    mut host_selections: UnboundedReceiver<Vec<SelectionId>>,
    camera_throttle: Duration,
    shutdown: CancellationToken,
) {
    let mut throttle = Throttle::new(camera_throttle);
    let trailing = sleep(Duration::ZERO);
    tokio::pin!(trailing);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            Some(event) = viewer_events.recv() => {
                match state.viewer.handle_event(event).await {
                    Some(InteractionEvent::CameraUpdated) => {
                        match throttle.admit(Instant::now()) {
                            Ok(()) => move_tooltip(&state),
                            Err(deadline) => trailing.as_mut().reset(deadline),
                        }
                    }
                    Some(event) => on_interaction(&state, event),
                    None => {}
                }
            }
            Some(ids) = host_selections.recv() => mirror_host_selection(&state, &ids).await,
            () = &mut trailing, if throttle.trailing => {
                if throttle.fire_trailing(Instant::now()) {
                    move_tooltip(&state);
                }
            }
            else => break,
        }
    }
    tracing::debug!("Interaction router stopped");
}

fn on_interaction<V: Viewer>(state: &VisualState<V>, event: InteractionEvent) {
    match event {
        InteractionEvent::Clicked {
            hit: Some(hit),
            multi,
        } => {
            state.selection.borrow().select(&hit.object_id, multi);
            show_tooltip(state, &hit);
        }
        InteractionEvent::Clicked { hit: None, .. } => {
            state.tooltip.borrow_mut().hide();
            state.selection.borrow().clear();
        }
        InteractionEvent::RightClicked { hit: Some(hit), .. }
        | InteractionEvent::DoubleClicked { hit: Some(hit) } => {
            state
                .selection
                .borrow()
                .show_context_menu(&hit, &state.viewer);
        }
        InteractionEvent::RightClicked { hit: None, .. }
        | InteractionEvent::DoubleClicked { hit: None }
        | InteractionEvent::CameraUpdated => {}
    }
}

fn show_tooltip<V: Viewer>(state: &VisualState<V>, hit: &Hit) {
    let screen = state.viewer.viewer().project_to_screen(&hit.point);
    state.tooltip.borrow_mut().show(hit, screen);
}

fn move_tooltip<V: Viewer>(state: &VisualState<V>) {
    state.tooltip.borrow_mut().move_tooltip(&state.viewer);
}

async fn mirror_host_selection<V: Viewer>(state: &VisualState<V>, selection_ids: &[SelectionId]) {
    let ids = state.selection.borrow().ids_for(selection_ids);
    tracing::debug!(count = ids.len(), "Mirroring host selection");
    if let Err(e) = state.viewer.select_objects(Some(&ids)).await {
        tracing::warn!(error = %e, "Viewer selection failed");
    }
}
