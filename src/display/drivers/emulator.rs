/*
 *  display/drivers/emulator.rs
 *
 *  Florafade - sensor driven bloom display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Desktop emulator surface, hands frames to the window thread
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

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::controls::Control;
use crate::config::DisplayConfig;
use crate::display::error::DisplayError;
use crate::display::traits::{blit_into, DisplayCapabilities, DisplaySurface};
use crate::vframebuf::VarFrameBuf;

use std::sync::{Arc, Mutex};

/// Shared emulator state (for window access)
#[derive(Debug)]
pub struct EmulatorState {
    /// Down-sampled RGBA of the physical canvas
    pub buffer: Vec<u8>,

    /// Window dimensions (canvas divided by `scale_down`)
    pub width: u32,
    pub height: u32,

    pub scale_down: u32,

    /// Frame counter
    pub frame_count: u64,

    /// Key presses not yet picked up by the frame loop
    pub controls: Vec<Control>,

    /// Window has been closed
    pub closed: bool,
}

/// Emulator display surface
///
/// Renders into a desktop window instead of the installation monitors.
/// The window runs on the main thread (winit requirement); frames and key
/// presses cross over through [`EmulatorState`].
pub struct EmulatorDriver {
    /// Physical canvas at full resolution
    canvas: VarFrameBuf<Rgb888>,

    /// Display capabilities
    capabilities: DisplayCapabilities,

    /// Shared state (for window rendering)
    state: Arc<Mutex<EmulatorState>>,
}

impl EmulatorDriver {
    pub fn new(width: u32, height: u32, scale_down: u32) -> Self {
        let scale_down = scale_down.max(1);
        let (ww, wh) = ((width / scale_down).max(1), (height / scale_down).max(1));

        let state = Arc::new(Mutex::new(EmulatorState {
            buffer: vec![0; (ww * wh * 4) as usize],
            width: ww,
            height: wh,
            scale_down,
            frame_count: 0,
            controls: Vec::new(),
            closed: false,
        }));

        Self {
            canvas: VarFrameBuf::new(width, height, Rgb888::BLACK),
            capabilities: DisplayCapabilities { width, height, max_fps: 60, has_controls: true },
            state,
        }
    }

    /// Create from configuration
    pub fn from_config(config: &DisplayConfig) -> Self {
        Self::new(config.physical_width(), config.height, config.window_scale_down)
    }

    /// Get shared state for window rendering
    pub fn state(&self) -> Arc<Mutex<EmulatorState>> {
        Arc::clone(&self.state)
    }

    /// Sync framebuffer to shared state, nearest-neighbour down-sampling
    fn sync_to_state(&self) -> Result<(), DisplayError> {
        let mut state = self.state.lock()?;
        let (ww, wh, step) = (state.width as usize, state.height as usize, state.scale_down as usize);

        for y in 0..wh {
            let row = self.canvas.span(0, y * step, self.canvas.width());
            for x in 0..ww {
                let i = (y * ww + x) * 4;
                if let Some(p) = row.get(x * step) {
                    state.buffer[i..i + 4].copy_from_slice(&[p.r(), p.g(), p.b(), 255]);
                }
            }
        }
        state.frame_count += 1;
        Ok(())
    }
}

impl DisplaySurface for EmulatorDriver {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn init(&mut self) -> Result<(), DisplayError> {
        // Nothing to initialize for emulator
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
        if self.is_closed() {
            return Err(DisplayError::Closed);
        }
        self.sync_to_state()
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.canvas.clear_color(Rgb888::BLACK);
        self.flush()
    }

    fn poll_controls(&mut self) -> Vec<Control> {
        match self.state.lock() {
            Ok(mut state) => std::mem::take(&mut state.controls),
            Err(_) => Vec::new(),
        }
    }

    fn is_closed(&self) -> bool {
        self.state.lock().map(|s| s.closed).unwrap_or(true)
    }
}
