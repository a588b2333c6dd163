/*
 *  engine.rs
 *
 *  Florafade - sensor driven bloom display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Channel state engine: samples in, opacities out
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

use log::{debug, warn};
use std::time::{Duration, Instant};

use crate::cascade::CascadeFader;
use crate::channel::{Channel, OPACITY_MAX};
use crate::config::{Config, Mode};
use crate::debounce::DebounceEngine;
use crate::fade::{is_settled, FadeAnimator};
use crate::input::{InputError, InputEvent, Sample};

/// Owns every channel; the frame loop is the only writer
#[derive(Debug)]
pub struct ChannelEngine {
    channels: Box<[Channel]>,
    debounce: DebounceEngine,
    fade: FadeAnimator,
    cascade: Option<CascadeFader>,
    last_sample: Option<Sample>,
    rejected: u64,
}

impl ChannelEngine {
    pub fn new(channel_count: usize, debounce: DebounceEngine, fade: FadeAnimator) -> Self {
        Self {
            channels: vec![Channel::new(); channel_count].into_boxed_slice(),
            debounce,
            fade,
            cascade: None,
            last_sample: None,
            rejected: 0,
        }
    }

    pub fn from_config(config: &Config, now: Instant) -> Self {
        let t = &config.timing;
        let mut engine = Self::new(
            config.channel_count,
            DebounceEngine::from_millis(t.activation_delay_ms, t.deactivation_delay_ms),
            FadeAnimator::new(t.rise_tau_ms, t.fall_tau_ms),
        );
        if config.mode == Mode::Cascade {
            engine.cascade = Some(CascadeFader::new(
                config.channel_count,
                Duration::from_millis(config.cascade_fade_ms),
                now,
            ));
        }
        engine
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn debounce_engine(&self) -> &DebounceEngine {
        &self.debounce
    }

    pub fn fade_animator(&self) -> &FadeAnimator {
        &self.fade
    }

    pub fn is_cascade(&self) -> bool {
        self.cascade.is_some()
    }

    /// Last accepted sample, analog half included for the HUD
    pub fn last_sample(&self) -> Option<&Sample> {
        self.last_sample.as_ref()
    }

    /// Number of malformed updates thrown away so far
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    /// Validate an update and latch its raw bits. A bad update leaves every
    /// channel untouched.
    pub fn ingest(&mut self, event: InputEvent) -> Result<(), InputError> {
        let sample = match event.into_sample(self.channels.len()) {
            Ok(sample) => sample,
            Err(e) => {
                self.rejected += 1;
                return Err(e);
            }
        };
        for (i, ch) in self.channels.iter_mut().enumerate() {
            ch.raw_bit = sample.bit(i);
        }
        self.last_sample = Some(sample);
        Ok(())
    }

    /// Run every channel's debounce against its latched raw bit.
    /// Returns how many channels committed a new visibility.
    pub fn debounce(&mut self, now: Instant) -> usize {
        if self.cascade.is_some() {
            return 0;
        }
        let mut commits = 0;
        for (i, ch) in self.channels.iter_mut().enumerate() {
            let raw = ch.raw_bit;
            if let Some(visible) = self.debounce.update(ch, raw, now) {
                debug!("Channel {} -> {}", i, if visible { "visible" } else { "hidden" });
                commits += 1;
            }
        }
        commits
    }

    /// Advance opacities by the measured frame delta
    pub fn animate(&mut self, dt: Duration, now: Instant) {
        match self.cascade.as_mut() {
            Some(cascade) => cascade.step(&mut self.channels, now),
            None => {
                let dt_ms = dt.as_secs_f32() * 1000.0;
                for ch in self.channels.iter_mut() {
                    self.fade.step(ch, dt_ms);
                }
            }
        }
    }

    /// One frame of channel work: ingest (when there is news), debounce, fade
    pub fn tick(&mut self, event: Option<InputEvent>, now: Instant, dt: Duration) {
        if let Some(event) = event {
            if let Err(e) = self.ingest(event) {
                warn!("Discarding input update: {}", e);
            }
        }
        self.debounce(now);
        self.animate(dt, now);
    }

    pub fn opacities(&self) -> Vec<f32> {
        self.channels.iter().map(Channel::alpha).collect()
    }

    /// No channel is still fading
    pub fn is_settled(&self) -> bool {
        self.channels.iter().all(|ch| {
            let target = if ch.visible { OPACITY_MAX } else { 0.0 };
            is_settled(ch.opacity, target)
        })
    }
}
