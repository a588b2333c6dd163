/*
 *  input/mock.rs
 *
 *  Florafade - sensor driven bloom display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Mock Arduino - synthetic analog/digital lines for bench testing
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

use std::time::Duration;

use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use super::InputEvent;

/// 10-bit ADC range of the sensor board
const ANALOG_MAX: i64 = 1024;

pub struct MockGenerator<R: Rng> {
    rng: R,
    channel_count: usize,
    covered_probability: f64,
}

impl MockGenerator<StdRng> {
    pub fn from_os_rng(channel_count: usize, covered_probability: f64) -> Self {
        Self::new(StdRng::from_os_rng(), channel_count, covered_probability)
    }

    pub fn seeded(seed: u64, channel_count: usize, covered_probability: f64) -> Self {
        Self::new(StdRng::seed_from_u64(seed), channel_count, covered_probability)
    }
}

impl<R: Rng> MockGenerator<R> {
    pub fn new(rng: R, channel_count: usize, covered_probability: f64) -> Self {
        Self {
            rng,
            channel_count,
            covered_probability: covered_probability.clamp(0.0, 1.0),
        }
    }

    /// `N` analog readings in 0..1024 followed by `N` covered bits
    pub fn next_line(&mut self) -> Vec<i64> {
        let n = self.channel_count;
        let mut line = Vec::with_capacity(n * 2);
        for _ in 0..n {
            line.push(self.rng.random_range(0..ANALOG_MAX));
        }
        for _ in 0..n {
            line.push(self.rng.random_bool(self.covered_probability) as i64);
        }
        line
    }
}

/// Emit a line every `1 / update_hz` seconds until the receiver goes away.
pub async fn run<R: Rng + Send>(mut generator: MockGenerator<R>, update_hz: f64, tx: mpsc::Sender<InputEvent>) {
    let period = Duration::from_secs_f64(1.0 / update_hz.max(0.001));
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let line = generator.next_line();
        info!("[{}]", line.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(","));
        if tx.send(InputEvent::Values(line)).await.is_err() {
            break;
        }
    }
}
