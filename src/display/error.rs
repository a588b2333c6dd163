/*
 *  display/error.rs
 *
 *  Florafade - sensor driven bloom display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Unified error type for display surfaces
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

use std::convert::Infallible;
use std::error::Error;
use std::fmt;

use embedded_graphics::primitives::Rectangle;

/// Unified error type for all display operations
#[derive(Debug)]
pub enum DisplayError {
    /// Surface could not be brought up
    InitializationFailed(String),

    /// Blit source or destination outside the buffers
    RegionOutOfBounds(Rectangle),

    /// Framebuffer size mismatch
    BufferSizeMismatch { expected: usize, actual: usize },

    /// Window was closed or the surface shut down
    Closed,

    /// Writing a snapshot or similar failed
    Io(std::io::Error),

    /// Generic error with message
    Other(String),
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayError::InitializationFailed(msg) =>
                write!(f, "Display initialization failed: {}", msg),
            DisplayError::RegionOutOfBounds(r) =>
                write!(f, "Region {}x{} at ({}, {}) is out of bounds",
                    r.size.width, r.size.height, r.top_left.x, r.top_left.y),
            DisplayError::BufferSizeMismatch { expected, actual } =>
                write!(f, "Buffer size mismatch: expected {} bytes, got {}", expected, actual),
            DisplayError::Closed =>
                write!(f, "Display closed"),
            DisplayError::Io(err) =>
                write!(f, "Display I/O error: {}", err),
            DisplayError::Other(msg) =>
                write!(f, "{}", msg),
        }
    }
}

impl Error for DisplayError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DisplayError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DisplayError {
    fn from(err: std::io::Error) -> Self {
        DisplayError::Io(err)
    }
}

// drawing into an in-memory framebuffer cannot fail
impl From<Infallible> for DisplayError {
    fn from(err: Infallible) -> Self {
        match err {}
    }
}

impl<T> From<std::sync::PoisonError<T>> for DisplayError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        DisplayError::Other(format!("display state lock poisoned: {}", err))
    }
}
