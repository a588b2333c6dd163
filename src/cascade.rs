/*
 *  cascade.rs
 *
 *  Florafade - sensor driven bloom display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Cascade mode - instant bits, everything up to the first uncovered
 *  sensor goes dark and recovers on a slow linear ramp
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

use crate::channel::{Channel, OPACITY_MAX};

/// Copy `raw` and force every index up to and including the first 0 to 0
pub fn apply_cascade(raw: &[bool]) -> Vec<bool> {
    let mut shown = raw.to_vec();
    if let Some(first_zero) = raw.iter().position(|b| !b) {
        shown[..=first_zero].iter_mut().for_each(|b| *b = false);
    }
    shown
}

/// Fade-from-black history per channel
#[derive(Debug, Clone)]
pub struct CascadeFader {
    fade: Duration,
    last_dark: Vec<Instant>,
}

impl CascadeFader {
    pub fn new(channel_count: usize, fade: Duration, now: Instant) -> Self {
        Self { fade, last_dark: vec![now; channel_count] }
    }

    /// Update every channel from the raw bits, writing `visible` and `opacity`.
    pub fn step(&mut self, channels: &mut [Channel], now: Instant) {
        let raw: Vec<bool> = channels.iter().map(|c| c.raw_bit).collect();
        let shown = apply_cascade(&raw);

        for ((ch, dark_at), on) in channels.iter_mut().zip(self.last_dark.iter_mut()).zip(shown) {
            if !on {
                *dark_at = now;
            }
            ch.visible = on;
            ch.opacity = ramp(now.saturating_duration_since(*dark_at), self.fade);
        }
    }
}

/// Linear 0..=255 over `fade`, full once it has elapsed
fn ramp(elapsed: Duration, fade: Duration) -> f32 {
    if fade.is_zero() || elapsed >= fade {
        return OPACITY_MAX;
    }
    OPACITY_MAX * elapsed.as_secs_f32() / fade.as_secs_f32()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cascade_zeroes_prefix() {
        assert_eq!(
            apply_cascade(&[true, true, false, true, true]),
            vec![false, false, false, true, true]
        );
        assert_eq!(apply_cascade(&[true; 5]), vec![true; 5]);
        assert_eq!(
            apply_cascade(&[false, true, true, true, true]),
            vec![false, true, true, true, true]
        );
    }

    #[test]
    fn test_ramp_from_black() {
        let t0 = Instant::now();
        let mut fader = CascadeFader::new(2, Duration::from_secs(10), t0);
        let mut channels = vec![Channel::new(), Channel::new()];
        channels[0].raw_bit = true;
        channels[1].raw_bit = true;

        fader.step(&mut channels, t0 + Duration::from_secs(5));
        assert!((channels[0].opacity - 127.5).abs() < 0.01);

        fader.step(&mut channels, t0 + Duration::from_secs(12));
        assert_eq!(channels[1].opacity, 255.0);

        // uncovered sensor goes black at once
        channels[0].raw_bit = false;
        fader.step(&mut channels, t0 + Duration::from_secs(13));
        assert_eq!(channels[0].opacity, 0.0);
        assert!(!channels[0].visible);
        assert_eq!(channels[1].opacity, 255.0);
    }
}
