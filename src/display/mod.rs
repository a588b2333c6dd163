/*
 *  display/mod.rs
 *
 *  Florafade - sensor driven bloom display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display subsystem - layout, compositor and presentation surfaces
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

// Core trait definitions
pub mod traits;
pub mod error;

// Slot geometry
pub mod layout;

// Off-screen canvas and overlays
pub mod compositor;
pub mod hud;

// Surfaces
pub mod drivers;

// Emulator window (only with emulator feature)
#[cfg(feature = "emulator")]
pub mod emulator_window;

// Re-exports for convenience
pub use traits::{DisplaySurface, DisplayCapabilities};
pub use error::DisplayError;
pub use layout::{LayoutEngine, LayoutStyle, Placement, Slot, SlotLayout};
pub use compositor::{Compositor, VirtualGeometry};
pub use hud::Hud;
pub use drivers::headless::HeadlessDriver;
pub use drivers::mock::MockDriver;

#[cfg(feature = "emulator")]
pub use drivers::emulator::EmulatorDriver;
