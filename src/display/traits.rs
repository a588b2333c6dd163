/*
 *  display/traits.rs
 *
 *  Florafade - sensor driven bloom display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Presentation surface abstraction
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
use crate::vframebuf::VarFrameBuf;

/// Surface capabilities and metadata
#[derive(Debug, Clone)]
pub struct DisplayCapabilities {
    /// Physical canvas width in pixels (both monitors)
    pub width: u32,

    /// Physical canvas height in pixels
    pub height: u32,

    /// Maximum recommended frame rate
    pub max_fps: u32,

    /// Whether the surface delivers operator key presses
    pub has_controls: bool,
}

/// Where the composed frame ends up
///
/// A surface owns a physical-size canvas. The compositor copies the two
/// monitor regions out of its off-screen buffer with [`blit`](Self::blit)
/// and then calls [`flush`](Self::flush) once per frame.
pub trait DisplaySurface: Send {
    /// Returns the capabilities of this surface
    fn capabilities(&self) -> &DisplayCapabilities;

    /// Returns the display dimensions as (width, height)
    fn dimensions(&self) -> (u32, u32) {
        let caps = self.capabilities();
        (caps.width, caps.height)
    }

    /// Prepare the surface for rendering
    fn init(&mut self) -> Result<(), DisplayError>;

    /// Copy `source` of `frame` onto the physical canvas at `dest`
    fn blit(
        &mut self,
        frame: &VarFrameBuf<Rgb888>,
        source: Rectangle,
        dest: Point,
    ) -> Result<(), DisplayError>;

    /// Make the blitted content visible
    fn flush(&mut self) -> Result<(), DisplayError>;

    /// Clear the canvas to black
    fn clear(&mut self) -> Result<(), DisplayError>;

    /// Operator controls received since the last call
    fn poll_controls(&mut self) -> Vec<Control> {
        Vec::new()
    }

    /// True once the surface has gone away (window closed)
    fn is_closed(&self) -> bool {
        false
    }
}

/// Blit into a surface-owned canvas, reporting regions that do not fit
pub(crate) fn blit_into(
    canvas: &mut VarFrameBuf<Rgb888>,
    frame: &VarFrameBuf<Rgb888>,
    source: Rectangle,
    dest: Point,
) -> Result<(), DisplayError> {
    if source.size.width == 0 || source.size.height == 0 {
        return Ok(());
    }
    if canvas.blit_from(frame, &source, dest) {
        Ok(())
    } else {
        Err(DisplayError::RegionOutOfBounds(source))
    }
}
