/*
 *  debounce.rs
 *
 *  Florafade - sensor driven bloom display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Debounce (activation) + rebounce (deactivation) edge-hold filter
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

use std::time::{Duration, Instant};

use crate::channel::{Channel, Edge, Pending};

/// Edge-hold filter shared by all channels
///
/// A rising edge must persist `activation` before the channel becomes
/// visible, a falling edge must persist `deactivation` before it hides.
/// The two hold times are independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceEngine {
    pub activation: Duration,
    pub deactivation: Duration,
}

impl DebounceEngine {
    pub fn new(activation: Duration, deactivation: Duration) -> Self {
        Self { activation, deactivation }
    }

    pub fn from_millis(activation_ms: u64, deactivation_ms: u64) -> Self {
        Self::new(
            Duration::from_millis(activation_ms),
            Duration::from_millis(deactivation_ms),
        )
    }

    /// Feed one raw sample into `channel`.
    ///
    /// Returns `Some(visible)` when this sample committed a transition.
    pub fn update(&self, channel: &mut Channel, raw_bit: bool, now: Instant) -> Option<bool> {
        channel.raw_bit = raw_bit;

        if channel.visible == raw_bit {
            // reconfirms the stable state, cancels any opposite pending window
            channel.pending = Pending::Idle;
            return None;
        }

        let (edge, hold) = if raw_bit {
            (Edge::Rising, self.activation)
        } else {
            (Edge::Falling, self.deactivation)
        };

        match channel.pending {
            Pending::Waiting { edge: pending_edge, since } if pending_edge == edge => {
                if now.saturating_duration_since(since) >= hold {
                    channel.visible = raw_bit;
                    channel.pending = Pending::Idle;
                    Some(raw_bit)
                } else {
                    None
                }
            }
            _ => {
                channel.pending = Pending::Waiting { edge, since: now };
                None
            }
        }
    }
}
