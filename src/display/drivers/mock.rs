/*
 *  display/drivers/mock.rs
 *
 *  Florafade - sensor driven bloom display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Mock surface for tests
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
use crate::display::error::DisplayError;
use crate::display::traits::{blit_into, DisplayCapabilities, DisplaySurface};
use crate::vframebuf::VarFrameBuf;

use std::sync::{Arc, Mutex};

/// Mock display surface for testing
///
/// Simulates the physical canvas without a window. It records every
/// operation and keeps the presented canvas for inspection.
#[derive(Debug, Clone)]
pub struct MockDriver {
    /// Presented physical canvas
    canvas: VarFrameBuf<Rgb888>,

    /// Display capabilities
    capabilities: DisplayCapabilities,

    /// Shared state for testing
    state: Arc<Mutex<MockDriverState>>,
}

/// Internal state for the mock driver (shared for inspection in tests)
#[derive(Debug, Default)]
pub struct MockDriverState {
    /// Number of times init() was called
    pub init_count: usize,

    /// Number of times flush() was called
    pub flush_count: usize,

    /// Number of times clear() was called
    pub clear_count: usize,

    /// Every blit as (source, destination)
    pub blits: Vec<(Rectangle, Point)>,

    /// Whether the driver is initialized
    pub is_initialized: bool,

    /// Controls handed out on the next poll
    pub queued_controls: Vec<Control>,

    /// Pretend the window was closed
    pub closed: bool,

    /// Simulate failures (for error testing)
    pub simulate_flush_failure: bool,
    pub simulate_init_failure: bool,
}

impl MockDriver {
    /// Create a mock surface of the given physical size
    pub fn new(width: u32, height: u32) -> Self {
        let capabilities = DisplayCapabilities {
            width,
            height,
            max_fps: 60,
            has_controls: true,
        };

        Self {
            canvas: VarFrameBuf::new(width, height, Rgb888::BLACK),
            capabilities,
            state: Arc::new(Mutex::new(MockDriverState::default())),
        }
    }

    /// Get pixel at position for testing
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<Rgb888> {
        self.canvas.pixel(x as usize, y as usize)
    }

    pub fn canvas(&self) -> &VarFrameBuf<Rgb888> {
        &self.canvas
    }

    /// Get reference to state for inspection in tests
    pub fn state(&self) -> Arc<Mutex<MockDriverState>> {
        Arc::clone(&self.state)
    }

    /// Queue a control as if the operator pressed a key
    pub fn press(&self, control: Control) {
        if let Ok(mut state) = self.state.lock() {
            state.queued_controls.push(control);
        }
    }
}

impl DisplaySurface for MockDriver {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn init(&mut self) -> Result<(), DisplayError> {
        let mut state = self.state.lock()?;
        state.init_count += 1;

        if state.simulate_init_failure {
            return Err(DisplayError::InitializationFailed("Simulated init failure".to_string()));
        }

        state.is_initialized = true;
        Ok(())
    }

    fn blit(
        &mut self,
        frame: &VarFrameBuf<Rgb888>,
        source: Rectangle,
        dest: Point,
    ) -> Result<(), DisplayError> {
        self.state.lock()?.blits.push((source, dest));
        blit_into(&mut self.canvas, frame, source, dest)
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        let mut state = self.state.lock()?;
        state.flush_count += 1;

        if state.simulate_flush_failure {
            return Err(DisplayError::Other("Simulated flush failure".to_string()));
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.state.lock()?.clear_count += 1;
        self.canvas.clear_color(Rgb888::BLACK);
        Ok(())
    }

    fn poll_controls(&mut self) -> Vec<Control> {
        match self.state.lock() {
            Ok(mut state) => std::mem::take(&mut state.queued_controls),
            Err(_) => Vec::new(),
        }
    }

    fn is_closed(&self) -> bool {
        self.state.lock().map(|s| s.closed).unwrap_or(true)
    }
}
