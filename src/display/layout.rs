/*
 *  display/layout.rs
 *
 *  Florafade - sensor driven bloom display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Slot geometry for the channel images
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

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::config::LayoutConfig;

/// How channel images are arranged on the virtual canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum LayoutStyle {
    /// One bottom-aligned slot per channel, evenly spaced
    #[default]
    Slots,

    /// Every image covers the whole canvas, stacked in channel order
    FullCanvas,
}

/// Geometry of one channel slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot {
    /// Horizontal center in canvas pixels
    pub center: f32,

    /// Widest an image may be drawn
    pub max_width: f32,

    /// Preferred image height
    pub target_height: f32,
}

/// Final draw rectangle for one image, top-left origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Slots for a given canvas size and channel count
#[derive(Debug, Clone, PartialEq)]
pub struct SlotLayout {
    pub width: u32,
    pub height: u32,
    pub style: LayoutStyle,

    /// Image bottoms sit on this line
    pub baseline: f32,

    /// Width of one channel band (before the fill fraction)
    pub band_width: f32,

    pub slots: Vec<Slot>,
}

impl SlotLayout {
    /// Pure layout computation, see [`LayoutEngine::compute`] for the cached form
    pub fn compute(params: &LayoutConfig, width: u32, height: u32, channel_count: usize) -> Self {
        let (w, h) = (width as f32, height as f32);
        let usable = (w - 2.0 * params.side_margin).max(1.0);
        let band_width = usable / channel_count.max(1) as f32;

        let slots = (0..channel_count)
            .map(|i| Slot {
                center: params.side_margin + i as f32 * band_width + band_width / 2.0,
                max_width: band_width * params.slot_fill,
                target_height: h * params.target_height_fraction,
            })
            .collect();

        Self {
            width,
            height,
            style: params.style,
            baseline: h - params.bottom_margin,
            band_width,
            slots,
        }
    }

    /// Where to draw channel `index` for an asset of aspect ratio `aspect` (w/h)
    ///
    /// Height is the slot's target height unless that makes the image wider
    /// than the slot allows, then width is clamped and height follows the
    /// aspect ratio. Images are bottom-aligned on the baseline.
    pub fn place(&self, index: usize, aspect: f32) -> Option<Placement> {
        if self.style == LayoutStyle::FullCanvas {
            return (index < self.slots.len()).then(|| Placement {
                x: 0.0,
                y: 0.0,
                width: self.width as f32,
                height: self.height as f32,
            });
        }

        let slot = self.slots.get(index)?;
        if !(aspect.is_finite() && aspect > 0.0) {
            return None;
        }

        let mut height = slot.target_height;
        let mut width = height * aspect;
        if width > slot.max_width {
            width = slot.max_width;
            height = width / aspect;
        }

        Some(Placement {
            x: slot.center - width / 2.0,
            y: self.baseline - height,
            width,
            height,
        })
    }
}

/// Layout with a one-entry cache keyed on its inputs
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    params: LayoutConfig,
    cached: Option<SlotLayout>,
    recomputes: u64,
}

impl LayoutEngine {
    pub fn new(params: LayoutConfig) -> Self {
        Self { params, cached: None, recomputes: 0 }
    }

    /// Slots for the given canvas, recomputed only when the inputs changed
    pub fn compute(&mut self, width: u32, height: u32, channel_count: usize) -> &SlotLayout {
        let stale = match &self.cached {
            Some(l) => l.width != width || l.height != height || l.slots.len() != channel_count,
            None => true,
        };
        if stale {
            self.recomputes += 1;
            self.cached = Some(SlotLayout::compute(&self.params, width, height, channel_count));
        }
        self.cached.get_or_insert_with(|| SlotLayout::compute(&self.params, width, height, channel_count))
    }

    /// Last computed layout, if any
    pub fn current(&self) -> Option<&SlotLayout> {
        self.cached.as_ref()
    }

    /// Number of times the geometry was actually recomputed
    pub fn recomputes(&self) -> u64 {
        self.recomputes
    }

    pub fn params(&self) -> &LayoutConfig {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> LayoutConfig {
        LayoutConfig {
            side_margin: 40.0,
            bottom_margin: 40.0,
            slot_fill: 0.92,
            target_height_fraction: 0.9,
            style: LayoutStyle::Slots,
        }
    }

    #[test]
    fn test_slots_evenly_spaced() {
        let layout = SlotLayout::compute(&params(), 3900, 1080, 5);
        assert_eq!(layout.slots.len(), 5);
        assert!((layout.band_width - 764.0).abs() < 1e-3);
        assert!((layout.slots[0].center - 422.0).abs() < 1e-3);
        assert!((layout.slots[4].center - 3478.0).abs() < 1e-3);
        assert!((layout.baseline - 1040.0).abs() < 1e-3);
        assert!((layout.slots[2].target_height - 972.0).abs() < 1e-3);
    }

    #[test]
    fn test_tall_asset_uses_target_height() {
        let layout = SlotLayout::compute(&params(), 3900, 1080, 5);
        let p = layout.place(2, 0.5).unwrap();
        assert!((p.height - 972.0).abs() < 1e-3);
        assert!((p.width - 486.0).abs() < 1e-3);
        // bottom aligned, centered
        assert!((p.y + p.height - layout.baseline).abs() < 1e-3);
        assert!((p.x + p.width / 2.0 - layout.slots[2].center).abs() < 1e-3);
    }

    #[test]
    fn test_wide_asset_clamped_to_slot() {
        let layout = SlotLayout::compute(&params(), 3900, 1080, 5);
        let max_w = layout.slots[0].max_width;
        let p = layout.place(0, 2.0).unwrap();
        assert!((p.width - max_w).abs() < 1e-3);
        assert!((p.height - max_w / 2.0).abs() < 1e-3);
        assert!((p.y + p.height - layout.baseline).abs() < 1e-3);
    }

    #[test]
    fn test_degenerate_width_keeps_one_pixel() {
        let layout = SlotLayout::compute(&params(), 50, 100, 5);
        assert!((layout.band_width - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_full_canvas_ignores_aspect() {
        let mut p = params();
        p.style = LayoutStyle::FullCanvas;
        let layout = SlotLayout::compute(&p, 1920, 1080, 5);
        assert_eq!(
            layout.place(4, 3.0),
            Some(Placement { x: 0.0, y: 0.0, width: 1920.0, height: 1080.0 })
        );
        assert_eq!(layout.place(5, 1.0), None);
    }

    #[test]
    fn test_engine_is_idempotent_and_cached() {
        let mut engine = LayoutEngine::new(params());
        let first = engine.compute(3900, 1080, 5).clone();
        let second = engine.compute(3900, 1080, 5).clone();
        assert_eq!(first, second);
        assert_eq!(engine.recomputes(), 1);

        engine.compute(3901, 1080, 5);
        assert_eq!(engine.recomputes(), 2);
    }
}
