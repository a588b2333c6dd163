/*
 *  pacer.rs
 *
 *  Florafade - sensor driven bloom display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Frame timing: measured deltas and periodic deadlines
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

/// Fires at most once per period
pub struct Pacer {
    next_deadline: Instant,
    period: Duration,
}

impl Pacer {
    pub fn new(period: Duration, now: Instant) -> Self {
        Self { next_deadline: now, period }
    }

    /// Returns true if the deadline passed; if true, it also schedules the next one.
    #[inline]
    pub fn should_fire(&mut self, now: Instant) -> bool {
        if now >= self.next_deadline {
            self.next_deadline = now + self.period;
            true
        } else {
            false
        }
    }
}

/// Wall-clock delta between frame ticks, plus a smoothed frame rate
pub struct FrameClock {
    last: Instant,
    ema_ms: f32, // moving avg of frame time
    alpha: f32,  // smoothing (0.1 ~ 0.3)
    frames: u64,
}

impl FrameClock {
    pub fn new(now: Instant) -> Self {
        Self { last: now, ema_ms: 0.0, alpha: 0.2, frames: 0 }
    }

    /// Time since the previous tick; the first tick measures from `new`
    pub fn tick(&mut self, now: Instant) -> Duration {
        let dt = now.saturating_duration_since(self.last);
        self.last = now;
        self.frames += 1;

        let ms = dt.as_secs_f32() * 1000.0;
        self.ema_ms = if self.ema_ms == 0.0 {
            ms
        } else {
            self.alpha * ms + (1.0 - self.alpha) * self.ema_ms
        };
        dt
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Smoothed frames per second, 0 until a non-zero delta was seen
    pub fn fps(&self) -> f32 {
        if self.ema_ms > 0.0 { 1000.0 / self.ema_ms } else { 0.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pacer_fires_once_per_period() {
        let t0 = Instant::now();
        let mut p = Pacer::new(Duration::from_secs(5), t0);
        assert!(p.should_fire(t0));
        assert!(!p.should_fire(t0 + Duration::from_secs(4)));
        assert!(p.should_fire(t0 + Duration::from_secs(5)));
        assert!(!p.should_fire(t0 + Duration::from_secs(6)));
    }

    #[test]
    fn test_frame_clock_measures_deltas() {
        let t0 = Instant::now();
        let mut clock = FrameClock::new(t0);
        assert_eq!(clock.tick(t0 + Duration::from_millis(16)), Duration::from_millis(16));
        assert_eq!(clock.tick(t0 + Duration::from_millis(50)), Duration::from_millis(34));
        assert_eq!(clock.frames(), 2);
        assert!(clock.fps() > 0.0 && clock.fps() < 62.6);
    }
}
