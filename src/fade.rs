/*
 *  fade.rs
 *
 *  Florafade - sensor driven bloom display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Exponential-approach opacity animator
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

use crate::channel::{Channel, OPACITY_MAX};

/// Opacity within this distance of its target counts as settled
pub const SETTLE_EPSILON: f32 = 0.5;

/// Single-pole low pass toward `target`.
///
/// `k` is recomputed from `dt_ms` every call so the decay does not depend
/// on the frame rate. A non-positive `tau_ms` snaps straight to the target.
#[inline]
pub fn approach_exp(current: f32, target: f32, dt_ms: f32, tau_ms: f32) -> f32 {
    if tau_ms <= 0.0 {
        return target;
    }
    let k = (-dt_ms.max(0.0) / tau_ms).exp();
    target + (current - target) * k
}

/// Rise/fall time constants, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeAnimator {
    pub rise_tau_ms: f32,
    pub fall_tau_ms: f32,
}

impl FadeAnimator {
    pub fn new(rise_tau_ms: f32, fall_tau_ms: f32) -> Self {
        Self { rise_tau_ms, fall_tau_ms }
    }

    /// Move the channel's opacity one step toward 255 (visible) or 0.
    pub fn step(&self, channel: &mut Channel, dt_ms: f32) {
        let target = if channel.visible { OPACITY_MAX } else { 0.0 };
        let tau = if target > channel.opacity { self.rise_tau_ms } else { self.fall_tau_ms };
        channel.opacity = approach_exp(channel.opacity, target, dt_ms, tau);
    }
}

/// True once `opacity` is indistinguishable from `target` on screen
#[inline]
pub fn is_settled(opacity: f32, target: f32) -> bool {
    (opacity - target).abs() <= SETTLE_EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_time_constant() {
        // 700 ms rise, one tau later we are at 1 - 1/e of the way
        let fade = FadeAnimator::new(700.0, 900.0);
        let mut ch = Channel::new();
        ch.visible = true;

        for _ in 0..70 {
            fade.step(&mut ch, 10.0);
        }
        let expected = 255.0 * (1.0 - (-1.0f32).exp());
        assert!((ch.opacity - expected).abs() <= 1.0, "opacity {}", ch.opacity);
    }

    #[test]
    fn test_frame_rate_independent() {
        let fade = FadeAnimator::new(700.0, 900.0);
        let mut fine = Channel::new();
        let mut coarse = Channel::new();
        fine.visible = true;
        coarse.visible = true;

        for _ in 0..60 {
            fade.step(&mut fine, 5.0);
        }
        for _ in 0..3 {
            fade.step(&mut coarse, 100.0);
        }
        assert!((fine.opacity - coarse.opacity).abs() < 0.01);
    }

    #[test]
    fn test_fall_uses_fall_tau() {
        let fade = FadeAnimator::new(15.0, 900.0);
        let mut ch = Channel::new();
        ch.opacity = 255.0;
        fade.step(&mut ch, 900.0);
        let expected = 255.0 * (-1.0f32).exp();
        assert!((ch.opacity - expected).abs() < 0.01);
    }

    #[test]
    fn test_non_positive_tau_snaps() {
        assert_eq!(approach_exp(12.0, 255.0, 1.0, 0.0), 255.0);
        assert_eq!(approach_exp(200.0, 0.0, 1.0, -5.0), 0.0);
    }

    #[test]
    fn test_never_overshoots() {
        let fade = FadeAnimator::new(90.0, 90.0);
        let mut ch = Channel::new();
        ch.visible = true;
        let mut last_gap = 255.0f32;
        for _ in 0..500 {
            fade.step(&mut ch, 16.7);
            let gap = 255.0 - ch.opacity;
            assert!(gap >= 0.0);
            assert!(gap <= last_gap);
            last_gap = gap;
        }
        assert!(is_settled(ch.opacity, 255.0));
    }
}
