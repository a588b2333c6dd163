/*
 *  lib.rs
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

//! Sensor channels in, fading blooms out across two monitors.
//!
//! Raw covered/uncovered bits are debounced per channel ([`debounce`]),
//! turned into opacities ([`fade`], or [`cascade`] in cascade mode) and
//! composited into a virtual canvas that hides the bezel gutter between
//! the two physical displays ([`display::compositor`]).

pub mod app;
pub mod assets;
pub mod cascade;
pub mod channel;
pub mod config;
pub mod controls;
pub mod debounce;
pub mod display;
pub mod engine;
pub mod fade;
pub mod input;
pub mod pacer;
pub mod vframebuf;
