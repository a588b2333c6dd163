/*
 *  main.rs
 *
 *  Florafade - sensor driven bloom display
 *  (c) 2020-26 Stuart Hunter
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use anyhow::Context;
use env_logger::Env;
use log::{error, info, warn};
use std::time::Instant;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;

use florafade::app::{run_frame_loop, Installation};
use florafade::assets::AssetSet;
use florafade::config::{self, Config, InputKind, Mode};
use florafade::controls::{self, Control};
use florafade::display::{DisplaySurface, HeadlessDriver};
use florafade::input;

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

/// Waits for SIGINT, SIGTERM or SIGHUP and logs which one arrived.
async fn signal_handler() -> Result<(), std::io::Error> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;

    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT received. Initiating graceful shutdown.");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received. Initiating graceful shutdown.");
        }
        _ = sighup.recv() => {
            info!("SIGHUP received. Initiating graceful shutdown.");
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal_handler().await {
        // no handlers, run until quit or window close
        error!("Signal handlers unavailable: {}", e);
        std::future::pending::<()>().await;
    }
}

fn log_summary(config: &Config) {
    let (left, bezel, right) = config.display.split();
    info!(
        "{} channels, {} mode",
        config.channel_count,
        match config.mode {
            Mode::Smooth => "smooth",
            Mode::Cascade => "cascade",
        }
    );
    info!(
        "Canvas {}x{}: left {} | bezel {} | right {}",
        config.display.physical_width(),
        config.display.height,
        left,
        bezel,
        right
    );
    info!(
        "Debounce on {}ms off {}ms, fade rise {}ms fall {}ms",
        config.timing.activation_delay_ms,
        config.timing.deactivation_delay_ms,
        config.timing.rise_tau_ms,
        config.timing.fall_tau_ms
    );
}

/// Operator keys from the terminal, unless the terminal is the sensor feed
fn spawn_terminal_controls(config: &Config) -> mpsc::Receiver<Control> {
    let (tx, rx) = mpsc::channel(16);
    if config.input.source != InputKind::Stdin {
        std::thread::spawn(move || controls::read_commands(std::io::stdin().lock(), tx));
    }
    rx
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::load().context("loading configuration")?;

    let level = config.log_level.clone().unwrap_or_else(|| "info".to_string());
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();

    info!("{} v.{} built {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"), BUILD_DATE);
    log_summary(&config);

    let assets = AssetSet::load(&config.assets, config.channel_count);
    let installation = Installation::new(&config, Box::new(assets), Instant::now());

    let (events, input_task) = input::spawn_source(&config.input, config.channel_count);
    let terminal = spawn_terminal_controls(&config);
    let fps = config.display.fps;

    #[cfg(feature = "emulator")]
    if config.display.emulated {
        use florafade::display::emulator_window::EmulatorWindow;
        use florafade::display::EmulatorDriver;

        let driver = EmulatorDriver::from_config(&config.display);
        let state = driver.state();

        tokio::spawn(async move {
            let surface: Box<dyn DisplaySurface> = Box::new(driver);
            if let Err(e) =
                run_frame_loop(installation, surface, events, terminal, fps, shutdown_signal()).await
            {
                error!("Frame loop error: {}", e);
            }
        });

        // winit wants the main thread
        info!("Close the window or press Esc to exit");
        return EmulatorWindow::new(state)
            .run()
            .map_err(|e| anyhow::anyhow!("emulator window: {}", e));
    }

    #[cfg(not(feature = "emulator"))]
    if config.display.emulated {
        anyhow::bail!("emulation requested but not compiled with --features emulator");
    }

    let driver = HeadlessDriver::from_config(&config.display);
    if config.display.snapshot_path.is_none() {
        warn!("Headless without --snapshot, frames are rendered but not saved");
    }
    let surface: Box<dyn DisplaySurface> = Box::new(driver);

    run_frame_loop(installation, surface, events, terminal, fps, shutdown_signal())
        .await
        .context("frame loop")?;

    input_task.abort();
    info!("Goodbye");
    Ok(())
}
