//! Tandem Engine Runtime
//!
//! Boots the frame loop headless with the demo scene.
//!
//! Usage: `tandem [settings.json]`

mod demo;

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result};
use tandem_asset::{AssetError, AssetHandle, AssetServer, FileLoader, GpuUploader};
use tandem_core::Application;
use tandem_services::{HeadlessPlatform, InputState, Settings};

use crate::demo::{CountingSink, GameLayer};

/// Simulated seconds the demo runs for.
const DEMO_SECONDS: f64 = 3.0;

/// Stands in for a GPU upload by logging the byte count.
struct LogUploader;

impl GpuUploader for LogUploader {
    fn upload(&self, handle: AssetHandle, path: &Path, bytes: Vec<u8>) -> Result<(), AssetError> {
        tracing::info!(handle = handle.id(), path = %path.display(), bytes = bytes.len(), "uploaded asset");
        Ok(())
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    tracing::info!("Tandem Engine v{}", tandem_core::VERSION);

    let settings = match std::env::args().nth(1) {
        Some(path) => Settings::load(&path).with_context(|| format!("loading settings from {path}"))?,
        None => Settings::default(),
    };
    let config = settings.timing.to_scheduler_config();
    tracing::info!(window = %settings.window.title, width = settings.window.width, height = settings.window.height, "settings ready");

    let input = InputState::shared(settings.input.mouse_sensitivity);
    let platform = HeadlessPlatform::new(input.clone());
    let mut app = Application::new(config, platform);

    let assets = AssetServer::new(FileLoader, LogUploader, app.uploads());
    let manifest = assets.request("Cargo.toml");

    let sink = Rc::new(RefCell::new(CountingSink::default()));
    let stop_after = (DEMO_SECONDS / app.config().fixed_interval.as_secs_f64()).ceil() as u64;
    app.push_layer(
        "game",
        0,
        GameLayer::new(input, sink.clone(), app.shutdown_signal(), stop_after),
    );

    app.run();

    let stats = app.stats();
    let sink = sink.borrow();
    tracing::info!(
        frames = stats.frames,
        fixed_steps = stats.fixed_steps,
        dropped_steps = stats.dropped_steps,
        uploads = stats.uploads_drained,
        fps = stats.fps,
        frame_ms = stats.frame_time_ms,
        draws = sink.draws,
        ui = sink.ui,
        "demo finished"
    );
    tracing::info!(status = ?manifest.status(), pruned = assets.prune(), "asset cache");

    Ok(())
}
