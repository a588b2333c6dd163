/*
 *  display/drivers/headless.rs
 *
 *  Florafade - sensor driven bloom display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Windowless surface with optional periodic PNG snapshots
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

use chrono::Local;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tiny_skia::{IntSize, Pixmap};

use crate::config::DisplayConfig;
use crate::display::error::DisplayError;
use crate::display::traits::{blit_into, DisplayCapabilities, DisplaySurface};
use crate::pacer::Pacer;
use crate::vframebuf::VarFrameBuf;

/// Runs the full pipeline without a window, e.g. on a render box or in CI
pub struct HeadlessDriver {
    canvas: VarFrameBuf<Rgb888>,
    capabilities: DisplayCapabilities,
    snapshot: Option<(PathBuf, Pacer)>,
    frames: u64,
    snapshots: u64,
}

impl HeadlessDriver {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            canvas: VarFrameBuf::new(width, height, Rgb888::BLACK),
            capabilities: DisplayCapabilities { width, height, max_fps: 240, has_controls: false },
            snapshot: None,
            frames: 0,
            snapshots: 0,
        }
    }

    pub fn from_config(config: &DisplayConfig) -> Self {
        let mut driver = Self::new(config.physical_width(), config.height);
        if let Some(path) = config.snapshot_path.as_ref() {
            driver = driver.with_snapshots(path.clone(), Duration::from_secs(config.snapshot_interval_secs));
        }
        driver
    }

    /// Write the canvas to `path` at most once per `interval`. A directory
    /// gets timestamped files, anything else is overwritten in place.
    pub fn with_snapshots(mut self, path: PathBuf, interval: Duration) -> Self {
        self.snapshot = Some((path, Pacer::new(interval, Instant::now())));
        self
    }

    pub fn canvas(&self) -> &VarFrameBuf<Rgb888> {
        &self.canvas
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn snapshots(&self) -> u64 {
        self.snapshots
    }
}

/// Timestamped file name inside a snapshot directory
fn snapshot_file(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(format!("florafade-{}.png", Local::now().format("%Y%m%d-%H%M%S")))
    } else {
        path.to_path_buf()
    }
}

/// Encode an RGB canvas as an opaque PNG
pub fn write_png(canvas: &VarFrameBuf<Rgb888>, path: &Path) -> Result<(), DisplayError> {
    let size = IntSize::from_wh(canvas.width() as u32, canvas.height() as u32)
        .ok_or_else(|| DisplayError::Other("cannot snapshot an empty canvas".to_string()))?;
    let data: Vec<u8> = canvas
        .as_slice()
        .iter()
        .flat_map(|p| [p.r(), p.g(), p.b(), 255])
        .collect();
    let (expected, actual) = (canvas.width() * canvas.height() * 4, data.len());
    let pixmap = Pixmap::from_vec(data, size)
        .ok_or(DisplayError::BufferSizeMismatch { expected, actual })?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    pixmap
        .save_png(path)
        .map_err(|e| DisplayError::Other(format!("snapshot {}: {}", path.display(), e)))
}

impl DisplaySurface for HeadlessDriver {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn init(&mut self) -> Result<(), DisplayError> {
        match &self.snapshot {
            Some((path, _)) => info!("Headless display, snapshots to {}", path.display()),
            None => info!("Headless display, no output"),
        }
        Ok(())
    }

    fn blit(
        &mut self,
        frame: &VarFrameBuf<Rgb888>,
        source: Rectangle,
        dest: Point,
    ) -> Result<(), DisplayError> {
        blit_into(&mut self.canvas, frame, source, dest)
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        self.frames += 1;
        if let Some((path, pacer)) = self.snapshot.as_mut() {
            if pacer.should_fire(Instant::now()) {
                let file = snapshot_file(path);
                write_png(&self.canvas, &file)?;
                self.snapshots += 1;
                debug!("Snapshot {} written", file.display());
            }
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.canvas.clear_color(Rgb888::BLACK);
        Ok(())
    }
}
