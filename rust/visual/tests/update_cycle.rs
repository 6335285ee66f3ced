// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Update cycles end to end: debounce, validation, load diffing,
//! cancellation, coloring and isolation against a headless viewer.

mod common;

use common::*;
use serde_json::json;
use speckle_pbi_core::{InputState, Projection, Role, VisualUpdateOptions, VisualUpdateType};
use speckle_pbi_viewer::HeadlessViewer;
use speckle_pbi_visual::{CycleOutcome, UpdatePhase, VisualConfig};
use std::time::Duration;
use tokio::task::LocalSet;
use tokio::time::sleep;

#[tokio::test(start_paused = true)]
async fn burst_applies_only_the_last_update() {
    LocalSet::new()
        .run_until(async {
            let host = RecordingHost::new();
            let visual = visual(&host, HeadlessViewer::new());

            for parent_id in ["P1", "P2", "P3"] {
                assert!(visual.update(update("A", parent_id, &["O1"])));
                sleep(Duration::from_millis(100)).await;
            }
            assert_eq!(visual.phase(), UpdatePhase::DebouncePending);

            visual.settled().await;

            let calls = visual.viewer().viewer().calls();
            assert_eq!(loads(&calls), vec!["A/objects/P3"]);
            assert_eq!(visual.phase(), UpdatePhase::Idle);
            assert_eq!(visual.last_report().unwrap().outcome, CycleOutcome::Applied);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn layout_updates_are_ignored() {
    LocalSet::new()
        .run_until(async {
            let host = RecordingHost::new();
            let visual = visual(&host, HeadlessViewer::new());

            for update_type in [
                VisualUpdateType::RESIZE,
                VisualUpdateType::RESIZE_END,
                VisualUpdateType::STYLE,
                VisualUpdateType::VIEW_MODE,
                VisualUpdateType(VisualUpdateType::RESIZE.0 + VisualUpdateType::RESIZE_END.0),
            ] {
                let mut options = update("A", "P1", &["O1"]);
                options.update_type = update_type;
                assert!(!visual.update(options));
            }
            sleep(Duration::from_secs(2)).await;

            assert_eq!(visual.phase(), UpdatePhase::Idle);
            assert!(visual.viewer().viewer().calls().is_empty());
            assert!(visual.last_report().is_none());
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn unloads_before_loading_the_new_parent() {
    LocalSet::new()
        .run_until(async {
            let host = RecordingHost::new();
            let visual = visual(&host, HeadlessViewer::new());

            visual.update(update("A", "P1", &["O1"]));
            visual.settled().await;
            visual.viewer().viewer().take_calls();

            visual.update(update("A", "P2", &["O2"]));
            visual.settled().await;

            let calls = visual.viewer().viewer().calls();
            let unload = calls.iter().position(|c| c == "unload:A/objects/P1").unwrap();
            let load = calls.iter().position(|c| c == "load:A/objects/P2").unwrap();
            assert!(unload < load);
            assert_eq!(visual.viewer().loaded_urls(), vec!["A/objects/P2"]);

            let report = visual.last_report().unwrap();
            assert_eq!((report.unloaded, report.loaded), (1, 1));
            // Stale identities are pruned
            assert_eq!(visual.selection_len(), 1);
            assert!(visual.selection_id("O1").is_none());
            assert!(visual.selection_id("O2").is_some());
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn unchanged_data_reloads_nothing() {
    LocalSet::new()
        .run_until(async {
            let host = RecordingHost::new();
            let visual = visual(&host, HeadlessViewer::new());

            visual.update(update("A", "P1", &["O1", "O2"]));
            visual.settled().await;
            visual.viewer().viewer().take_calls();

            visual.update(update("A", "P1", &["O1", "O2"]));
            visual.settled().await;

            let calls = visual.viewer().viewer().calls();
            assert!(loads(&calls).is_empty());
            assert!(!calls.iter().any(|c| c.starts_with("unload:")));
            assert_eq!(calls.last().unwrap(), "isolate:powerbi:O1,O2");
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn invalid_input_tears_the_viewer_down() {
    LocalSet::new()
        .run_until(async {
            let host = RecordingHost::new();
            let visual = visual(&host, HeadlessViewer::new());

            visual.update(update("A", "P1", &["O1"]));
            visual.settled().await;
            assert_eq!(visual.selection_len(), 1);

            let incomplete = VisualUpdateOptions::data(matrix(
                vec![stream("A", vec![parent("P1", Vec::new())])],
                &[Role::Stream, Role::ParentObject],
            ));
            visual.update(incomplete);
            visual.settled().await;

            assert_eq!(visual.last_report().unwrap().outcome, CycleOutcome::Invalid);
            assert!(visual.viewer().loaded_urls().is_empty());
            assert!(visual.viewer().viewer().loaded().is_empty());
            assert!(visual.viewer().viewer().calls().contains(&"unload_all".to_string()));
            assert_eq!(visual.selection_len(), 0);
            assert_eq!(*host.warnings.borrow(), vec!["Incomplete data input."]);
            assert_eq!(
                *host.input_states.borrow(),
                vec![InputState::Valid, InputState::Incomplete]
            );
            let log = host.log();
            assert!(log.contains(&"clear".to_string()));
            assert!(log.contains(&"tooltip:hide".to_string()));
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn missing_matrix_is_invalid_input() {
    LocalSet::new()
        .run_until(async {
            let host = RecordingHost::new();
            let visual = visual(&host, HeadlessViewer::new());

            visual.update(VisualUpdateOptions::default());
            visual.settled().await;

            assert_eq!(visual.last_report().unwrap().outcome, CycleOutcome::Invalid);
            assert_eq!(*host.input_states.borrow(), vec![InputState::Invalid]);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn newer_update_cancels_loading_within_one_window() {
    LocalSet::new()
        .run_until(async {
            let host = RecordingHost::new();
            let viewer = HeadlessViewer::new().with_load_delay(Duration::from_secs(1));
            let config = VisualConfig {
                load_batch_size: 2,
                ..VisualConfig::default()
            };
            let visual = visual_with(&host, viewer, config);

            let parents: Vec<_> = (0..10)
                .map(|i| parent(&format!("P{i}"), vec![object(&format!("O{i}"), 1.0)]))
                .collect();
            visual.update(VisualUpdateOptions::data(matrix(vec![stream("A", parents)], ROLES)));

            // First cycle starts at 500 ms, its first window ends at 1500 ms.
            sleep(Duration::from_millis(600)).await;
            assert_eq!(visual.phase(), UpdatePhase::Applying);
            visual.update(update("B", "P0", &["X1"]));
            visual.settled().await;

            let calls = visual.viewer().viewer().calls();
            let first_cycle: Vec<_> = loads(&calls)
                .into_iter()
                .filter(|url| url.starts_with("A/"))
                .collect();
            assert_eq!(first_cycle, vec!["A/objects/P0", "A/objects/P1"]);
            assert_eq!(visual.viewer().viewer().max_in_flight(), 2);

            let report = visual.last_report().unwrap();
            assert_eq!(report.outcome, CycleOutcome::Applied);
            assert_eq!(report.unloaded, 2);
            assert_eq!(visual.viewer().loaded_urls(), vec!["B/objects/P0"]);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn load_failures_warn_once_and_retry_next_cycle() {
    LocalSet::new()
        .run_until(async {
            let host = RecordingHost::new();
            let viewer = HeadlessViewer::new();
            viewer.fail_on("A/objects/P1");
            viewer.fail_on("A/objects/P2");
            let visual = visual(&host, viewer);

            let two_parents = || {
                VisualUpdateOptions::data(matrix(
                    vec![stream(
                        "A",
                        vec![
                            parent("P1", vec![object("O1", 1.0)]),
                            parent("P2", vec![object("O2", 1.0)]),
                        ],
                    )],
                    ROLES,
                ))
            };
            visual.update(two_parents());
            visual.settled().await;

            assert_eq!(*host.warnings.borrow(), vec!["Load error"]);
            assert_eq!(visual.last_report().unwrap().failed, 2);
            visual.viewer().viewer().take_calls();

            visual.update(two_parents());
            visual.settled().await;
            let calls = visual.viewer().viewer().calls();
            assert_eq!(loads(&calls), vec!["A/objects/P1", "A/objects/P2"]);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn colors_groups_and_isolates_the_highlighted_subset() {
    LocalSet::new()
        .run_until(async {
            let host = RecordingHost::new();
            let visual = visual(&host, HeadlessViewer::new());

            let view = matrix(
                vec![stream(
                    "A",
                    vec![parent(
                        "P1",
                        vec![
                            speckle_pbi_core::MatrixNode::new("walls").with_children(vec![
                                highlighted("O1", 1.0, Some(1.0)),
                                highlighted("O2", 2.0, None),
                            ]),
                            speckle_pbi_core::MatrixNode::new("floors")
                                .with_children(vec![object("O3", 3.0)]),
                        ],
                    )],
                )],
                COLOR_ROLES,
            );
            visual.update(VisualUpdateOptions::data(view));
            visual.settled().await;

            let calls = visual.viewer().viewer().calls();
            let colors: Vec<_> = calls.iter().filter(|c| c.starts_with("colors:")).collect();
            assert_eq!(colors.len(), 1);
            assert!(colors[0].contains("=O1,"));
            assert!(colors[0].ends_with("=O3"));
            assert!(!colors[0].contains("O2"));
            assert_eq!(calls.last().unwrap(), "isolate:powerbi:O1");
            assert_eq!(
                visual.viewer().state().isolated_objects,
                Some(vec!["O1".to_string()])
            );
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn disabled_color_card_skips_coloring() {
    LocalSet::new()
        .run_until(async {
            let host = RecordingHost::new();
            let visual = visual(&host, HeadlessViewer::new());

            let view = matrix(
                vec![stream(
                    "A",
                    vec![parent(
                        "P1",
                        vec![speckle_pbi_core::MatrixNode::new("walls")
                            .with_children(vec![object("O1", 1.0)])],
                    )],
                )],
                COLOR_ROLES,
            );
            let options = with_objects(
                VisualUpdateOptions::data(view),
                json!({ "color": { "enabled": false } }),
            );
            visual.update(options);
            visual.settled().await;

            let calls = visual.viewer().viewer().calls();
            assert!(!calls.iter().any(|c| c.starts_with("colors:")));
            assert!(calls.contains(&"remove_colors".to_string()));
            assert!(!visual.settings().color.enabled);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn settings_changes_reach_the_viewer() {
    LocalSet::new()
        .run_until(async {
            let host = RecordingHost::new();
            let visual = visual(&host, HeadlessViewer::new());

            let options = with_objects(
                update("A", "P1", &["O1"]),
                json!({ "camera": { "projection": "orthographic" } }),
            );
            visual.update(options);
            visual.settled().await;

            let viewer = visual.viewer().viewer();
            assert_eq!(viewer.projection(), Some(Projection::Orthographic));
            assert!(viewer.view().is_none());
            assert!(viewer.light().is_none());
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn dispose_releases_the_viewer() {
    LocalSet::new()
        .run_until(async {
            let host = RecordingHost::new();
            let mut visual = visual(&host, HeadlessViewer::new());

            visual.update(update("A", "P1", &["O1"]));
            visual.settled().await;
            visual.dispose().await;

            assert!(visual.viewer().viewer().is_disposed());
            assert!(!visual.update(VisualUpdateOptions {
                update_type: VisualUpdateType::RESIZE,
                ..update("A", "P2", &["O2"])
            }));
        })
        .await;
}
