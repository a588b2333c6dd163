/*
 *  channel.rs
 *
 *  Florafade - sensor driven bloom display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Per-sensor channel state
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

use std::time::Instant;

/// Full opacity, images are tinted 0..=255 like the sensors' alpha
pub const OPACITY_MAX: f32 = 255.0;

/// Direction of a transition waiting out its hold time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// raw went 1 while not visible
    Rising,
    /// raw went 0 while visible
    Falling,
}

/// Pending transition, the timestamp only exists alongside an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pending {
    #[default]
    Idle,
    Waiting { edge: Edge, since: Instant },
}

impl Pending {
    /// The edge being evaluated, if any
    pub fn edge(&self) -> Option<Edge> {
        match self {
            Pending::Idle => None,
            Pending::Waiting { edge, .. } => Some(*edge),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Pending::Idle)
    }
}

/// One sensor's raw, debounced and visual state
///
/// Created once per channel index at startup and mutated every frame, by the
/// debounce engine (`raw_bit`, `visible`, `pending`) and by the fade
/// animator (`opacity`).
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub raw_bit: bool,
    pub visible: bool,
    pub pending: Pending,
    pub opacity: f32,
}

impl Default for Channel {
    fn default() -> Self {
        Self {
            raw_bit: false,
            visible: false,
            pending: Pending::Idle,
            opacity: 0.0,
        }
    }
}

impl Channel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opacity clamped into the tint range
    #[inline]
    pub fn alpha(&self) -> f32 {
        self.opacity.clamp(0.0, OPACITY_MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_starts_hidden_and_idle() {
        let ch = Channel::new();
        assert!(!ch.visible);
        assert!(!ch.raw_bit);
        assert!(ch.pending.is_idle());
        assert_eq!(ch.pending.edge(), None);
        assert_eq!(ch.opacity, 0.0);
    }

    #[test]
    fn test_alpha_clamps() {
        let mut ch = Channel::new();
        ch.opacity = 300.0;
        assert_eq!(ch.alpha(), 255.0);
        ch.opacity = -2.0;
        assert_eq!(ch.alpha(), 0.0);
    }

    #[test]
    fn test_pending_edge() {
        let p = Pending::Waiting { edge: Edge::Falling, since: Instant::now() };
        assert_eq!(p.edge(), Some(Edge::Falling));
        assert!(!p.is_idle());
    }
}
