// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CLI tool: replay recorded Power BI updates against a headless viewer.
//!
//! Usage:
//!   speckle-pbi-replay <update.json>... [options]

use anyhow::{bail, Context, Result};
use serde_json::json;
use speckle_pbi_core::{
    process_matrix_view, validate_matrix_view, HierarchySelectionIds, PaletteCache,
    SequentialPalette, VisualUpdateOptions,
};
use speckle_pbi_viewer::HeadlessViewer;
use speckle_pbi_visual::{LoggingHost, Visual, VisualConfig};
use std::env;
use std::fs;
use std::rc::Rc;
use std::time::Duration;
use tokio::task::LocalSet;

struct Options {
    files: Vec<String>,
    process_only: bool,
    burst: bool,
    load_delay_ms: u64,
    config: VisualConfig,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            env::var("RUST_LOG").unwrap_or_else(|_| "info,speckle_pbi_visual=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() || args[0] == "--help" || args[0] == "-h" {
        print_usage();
        return Ok(());
    }
    let options = parse_args(&args)?;

    let updates = options
        .files
        .iter()
        .map(|path| read_update(path))
        .collect::<Result<Vec<_>>>()?;

    if options.process_only {
        return process_only(&updates);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("failed to build runtime")?;
    let summary = LocalSet::new().block_on(&runtime, replay(&options, updates));
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn parse_args(args: &[String]) -> Result<Options> {
    let mut options = Options {
        files: Vec::new(),
        process_only: false,
        burst: false,
        load_delay_ms: 0,
        config: VisualConfig::from_env(),
    };

    let mut rest = args.iter();
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--process-only" => options.process_only = true,
            "--burst" => options.burst = true,
            "--batch-size" => {
                options.config.load_batch_size = next_value(&mut rest, arg)?;
            }
            "--debounce-ms" => {
                options.config.debounce_ms = next_value(&mut rest, arg)?;
            }
            "--load-delay-ms" => {
                options.load_delay_ms = next_value(&mut rest, arg)?;
            }
            other if other.starts_with("--") => bail!("unknown option: {other}"),
            file => options.files.push(file.to_string()),
        }
    }
    if options.files.is_empty() {
        bail!("no update files given");
    }
    Ok(options)
}

fn next_value<'a, T>(rest: &mut impl Iterator<Item = &'a String>, flag: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = rest.next().with_context(|| format!("{flag} needs a value"))?;
    value
        .parse()
        .with_context(|| format!("invalid value for {flag}: {value}"))
}

fn read_update(path: &str) -> Result<VisualUpdateOptions> {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?;
    serde_json::from_str(&text).with_context(|| format!("{path} is not a visual update"))
}

/// Validate and process every update, printing the derived viewer input.
fn process_only(updates: &[VisualUpdateOptions]) -> Result<()> {
    let mut cache = PaletteCache::new();
    let mut palette = SequentialPalette::default();
    for update in updates {
        let validated = validate_matrix_view(update)?;
        let input = process_matrix_view(
            validated.view,
            &HierarchySelectionIds,
            &mut cache,
            &mut palette,
            validated.has_color_filter,
            |_, _| {},
        );
        println!("{}", serde_json::to_string_pretty(&input)?);
    }
    Ok(())
}

async fn replay(options: &Options, updates: Vec<VisualUpdateOptions>) -> serde_json::Value {
    let host = Rc::new(LoggingHost::new());
    let viewer =
        HeadlessViewer::new().with_load_delay(Duration::from_millis(options.load_delay_ms));
    let mut visual = Visual::new(host.clone(), viewer, options.config.clone());

    let mut ignored = 0;
    for update in updates {
        if !visual.update(update) {
            ignored += 1;
        }
        if !options.burst {
            visual.settled().await;
        }
    }
    visual.settled().await;

    let report = visual.last_report();
    let summary = json!({
        "ignoredUpdates": ignored,
        "outcome": report.map(|r| format!("{:?}", r.outcome)),
        "unloaded": report.map_or(0, |r| r.unloaded),
        "loaded": report.map_or(0, |r| r.loaded),
        "failed": report.map_or(0, |r| r.failed),
        "loadedUrls": visual.viewer().loaded_urls(),
        "isolated": visual.viewer().state().isolated_objects,
        "warnings": host.warnings(),
        "inputState": host.input_state(),
        "viewerCalls": visual.viewer().viewer().calls(),
    });
    visual.dispose().await;
    summary
}

fn print_usage() {
    eprintln!("Replay recorded Power BI visual updates against a headless viewer");
    eprintln!();
    eprintln!("Usage: speckle-pbi-replay <update.json>... [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --process-only       Print the processed viewer input of each update and exit");
    eprintln!("  --burst              Send all updates without waiting (exercises debouncing)");
    eprintln!("  --batch-size <N>     Concurrent loads per window (default: 25)");
    eprintln!("  --debounce-ms <N>    Debounce period in milliseconds (default: 500)");
    eprintln!("  --load-delay-ms <N>  Simulated load latency in milliseconds (default: 0)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  RUST_LOG                        Log filter (default: info,speckle_pbi_visual=debug)");
    eprintln!("  SPECKLE_PBI_DEBOUNCE_MS         Debounce period");
    eprintln!("  SPECKLE_PBI_LOAD_BATCH_SIZE     Concurrent loads per window");
    eprintln!("  SPECKLE_PBI_CAMERA_THROTTLE_MS  Tooltip move throttle");
    eprintln!("  SPECKLE_PBI_AUTH_TOKEN          Token for private streams");
}
