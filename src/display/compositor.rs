/*
 *  display/compositor.rs
 *
 *  Florafade - sensor driven bloom display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Virtual canvas spanning both monitors and the bezel gutter
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

//! The scene is drawn once per frame into an off-screen buffer that is
//! `left + bezel + right` pixels wide. The two monitor regions are then
//! copied out back to back, so whatever lands in the gutter is never shown
//! and imagery lines up across the physical bezel.
//!
//! Buffer, background layer and layout are rebuilt from scratch whenever
//! the geometry changes.

use arrayvec::ArrayString;
use core::fmt::Write;
use embedded_graphics::{
    mono_font::{ascii::FONT_10X20, MonoTextStyle},
    pixelcolor::Rgb888,
    prelude::*,
    primitives::{Line, PrimitiveStyle, Rectangle},
    text::{Alignment, Baseline, Text, TextStyleBuilder},
};
use log::{debug, info};

use crate::assets::AssetProvider;
use crate::channel::Channel;
use crate::config::{DisplayConfig, LayoutConfig};
use crate::controls::Control;
use crate::display::error::DisplayError;
use crate::display::hud::Hud;
use crate::display::layout::{LayoutEngine, LayoutStyle, Placement};
use crate::display::traits::DisplaySurface;
use crate::fade::SETTLE_EPSILON;
use crate::vframebuf::VarFrameBuf;

/// Fill when there is no background image
pub const BACKGROUND_FALLBACK: Rgb888 = Rgb888::new(40, 40, 40);

/// Stand-in for a channel image that failed to load
pub const PLACEHOLDER: Rgb888 = Rgb888::new(60, 60, 60);

const SEAM_STROKE: u32 = 2;
const TICK_SPACING: usize = 40;
const TICK_LENGTH: i32 = 20;
const LABEL_TOP: i32 = 8;

/// Split of the virtual buffer into left monitor, gutter and right monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualGeometry {
    pub left_width: u32,
    pub bezel_width: u32,
    pub right_width: u32,
    pub height: u32,
}

impl VirtualGeometry {
    pub fn new(left_width: u32, bezel_width: u32, right_width: u32, height: u32) -> Self {
        Self { left_width, bezel_width, right_width, height }
    }

    pub fn from_config(display: &DisplayConfig) -> Self {
        let (left, bezel, right) = display.split();
        Self::new(left, bezel, right, display.height)
    }

    pub fn virtual_width(&self) -> u32 {
        self.left_width + self.bezel_width + self.right_width
    }

    /// Both monitors, gutter excluded
    pub fn physical_width(&self) -> u32 {
        self.left_width + self.right_width
    }

    /// Same monitors, different gutter
    pub fn with_bezel(self, bezel_width: u32) -> Self {
        Self { bezel_width, ..self }
    }

    pub fn left_source(&self) -> Rectangle {
        Rectangle::new(Point::zero(), Size::new(self.left_width, self.height))
    }

    pub fn right_source(&self) -> Rectangle {
        Rectangle::new(
            Point::new((self.left_width + self.bezel_width) as i32, 0),
            Size::new(self.right_width, self.height),
        )
    }

    pub fn left_dest(&self) -> Point {
        Point::zero()
    }

    pub fn right_dest(&self) -> Point {
        Point::new(self.left_width as i32, 0)
    }

    /// x of the two seam lines, left and right edge of the gutter
    pub fn seams(&self) -> (i32, i32) {
        let left = self.left_width as i32;
        (left, left + self.bezel_width as i32)
    }
}

/// Opacity as drawn, fades below one step are invisible
fn tint(channel: &Channel) -> u8 {
    channel.alpha().round() as u8
}

/// Cover-fit `image_w` x `image_h` into the canvas, centered, overflow cropped
pub fn cover_fit(image_w: u32, image_h: u32, canvas_w: u32, canvas_h: u32) -> Placement {
    let (cw, ch) = (canvas_w as f32, canvas_h as f32);
    let image_ar = image_w as f32 / image_h.max(1) as f32;
    let canvas_ar = cw / ch.max(1.0);

    if image_ar > canvas_ar {
        // wider, fit height
        let width = ch * image_ar;
        Placement { x: (cw - width) / 2.0, y: 0.0, width, height: ch }
    } else {
        let height = cw / image_ar.max(f32::MIN_POSITIVE);
        Placement { x: 0.0, y: (ch - height) / 2.0, width: cw, height }
    }
}

pub struct Compositor {
    geometry: VirtualGeometry,
    layout: LayoutEngine,
    channel_count: usize,
    frame: VarFrameBuf<Rgb888>,
    background: VarFrameBuf<Rgb888>,
    background_ready: bool,
    show_calibration: bool,
    show_hud: bool,
    dirty: bool,
    /// Tints in the frame buffer, not yet on the surface
    rendered: Vec<u8>,
    /// Tints of the last frame that reached the surface
    shown: Vec<u8>,
    rebuilds: u64,
}

impl Compositor {
    pub fn new(geometry: VirtualGeometry, layout: LayoutConfig, channel_count: usize) -> Self {
        let mut compositor = Self {
            geometry,
            layout: LayoutEngine::new(layout),
            channel_count,
            frame: VarFrameBuf::new(0, 0, BACKGROUND_FALLBACK),
            background: VarFrameBuf::new(0, 0, BACKGROUND_FALLBACK),
            background_ready: false,
            show_calibration: false,
            show_hud: false,
            dirty: true,
            rendered: Vec::new(),
            shown: Vec::new(),
            rebuilds: 0,
        };
        compositor.rebuild();
        compositor
    }

    /// Fresh buffers for the current geometry; nothing survives from the old size
    fn rebuild(&mut self) {
        let (w, h) = (self.geometry.virtual_width(), self.geometry.height);
        self.frame = VarFrameBuf::new(w, h, BACKGROUND_FALLBACK);
        self.background = VarFrameBuf::new(w, h, BACKGROUND_FALLBACK);
        self.background_ready = false;
        self.layout.compute(w, h, self.channel_count);
        self.rebuilds += 1;
        self.dirty = true;
        debug!(
            "Virtual canvas {}x{} (left {}, bezel {}, right {})",
            w, h, self.geometry.left_width, self.geometry.bezel_width, self.geometry.right_width
        );
    }

    pub fn geometry(&self) -> VirtualGeometry {
        self.geometry
    }

    pub fn layout(&self) -> &LayoutEngine {
        &self.layout
    }

    pub fn frame(&self) -> &VarFrameBuf<Rgb888> {
        &self.frame
    }

    /// How often the buffers were reallocated
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    pub fn calibration_visible(&self) -> bool {
        self.show_calibration
    }

    pub fn hud_visible(&self) -> bool {
        self.show_hud
    }

    /// Replace the whole geometry, e.g. after the display size changed
    pub fn reconfigure(&mut self, geometry: VirtualGeometry) {
        if geometry != self.geometry {
            self.geometry = geometry;
            self.rebuild();
        }
    }

    pub fn set_bezel(&mut self, bezel_width: u32) {
        self.reconfigure(self.geometry.with_bezel(bezel_width));
    }

    /// Nudge the gutter, never below zero
    pub fn adjust_bezel(&mut self, delta: i32) {
        let bezel = self.geometry.bezel_width.saturating_add_signed(delta);
        self.set_bezel(bezel);
    }

    pub fn toggle_calibration(&mut self) {
        self.show_calibration = !self.show_calibration;
        self.dirty = true;
    }

    pub fn toggle_hud(&mut self) {
        self.show_hud = !self.show_hud;
        self.dirty = true;
    }

    /// Apply an operator control; `Quit` is left to the caller
    pub fn apply(&mut self, control: Control) {
        match control {
            Control::ToggleCalibration => {
                self.toggle_calibration();
                info!("Calibration overlay {}", if self.show_calibration { "on" } else { "off" });
            }
            Control::IncreaseBezel => {
                self.adjust_bezel(1);
                info!("Bezel compensation {}px", self.geometry.bezel_width);
            }
            Control::DecreaseBezel => {
                self.adjust_bezel(-1);
                info!("Bezel compensation {}px", self.geometry.bezel_width);
            }
            Control::ToggleHud => self.toggle_hud(),
            Control::Quit => {}
        }
    }

    /// Whether a new frame would differ from the last one
    pub fn needs_render(&self, channels: &[Channel]) -> bool {
        self.dirty || self.show_hud || !channels.iter().map(tint).eq(self.shown.iter().copied())
    }

    /// Pre-scale the background once per rebuild
    fn prepare_background(&mut self, assets: &dyn AssetProvider) {
        if self.background_ready {
            return;
        }
        self.background.clear_color(BACKGROUND_FALLBACK);
        if let Some(bg) = assets.background() {
            let (w, h) = (self.geometry.virtual_width(), self.geometry.height);
            let fit = cover_fit(bg.width, bg.height, w, h);
            self.background.blend_sprite(bg, &fit, 255.0);
        }
        self.background_ready = true;
    }

    /// Draw background, channel images, and the overlays into the off-screen buffer
    pub fn render(
        &mut self,
        channels: &[Channel],
        assets: &dyn AssetProvider,
        hud: Option<&Hud>,
    ) -> Result<(), DisplayError> {
        self.prepare_background(assets);
        self.frame.copy_from(&self.background);

        let (w, h) = (self.geometry.virtual_width(), self.geometry.height);
        let layout = self.layout.compute(w, h, self.channel_count);

        for (i, ch) in channels.iter().enumerate().take(self.channel_count) {
            let alpha = ch.alpha();
            if alpha <= SETTLE_EPSILON {
                continue;
            }
            match assets.image(i) {
                Some(sprite) => {
                    if let Some(p) = layout.place(i, sprite.aspect()) {
                        self.frame.blend_sprite(sprite, &p, alpha);
                    }
                }
                None => {
                    // fill the whole slot box
                    let aspect = match (layout.style, layout.slots.get(i)) {
                        (LayoutStyle::Slots, Some(slot)) if slot.target_height > 0.0 => {
                            slot.max_width / slot.target_height
                        }
                        _ => 1.0,
                    };
                    if let Some(p) = layout.place(i, aspect) {
                        self.frame.blend_fill(&p, PLACEHOLDER, alpha);
                    }
                }
            }
        }

        if self.show_calibration {
            self.draw_calibration()?;
        }
        if self.show_hud {
            if let Some(hud) = hud {
                hud.draw(&mut self.frame)?;
            }
        }
        self.rendered = channels.iter().map(tint).collect();
        Ok(())
    }

    /// Seam lines, outward ticks, and the bezel readout over the gutter
    fn draw_calibration(&mut self) -> Result<(), DisplayError> {
        let (seam_l, seam_r) = self.geometry.seams();
        let h = self.geometry.height as i32;
        let stroke = PrimitiveStyle::with_stroke(Rgb888::WHITE, SEAM_STROKE);

        Line::new(Point::new(seam_l, 0), Point::new(seam_l, h)).into_styled(stroke).draw(&mut self.frame)?;
        Line::new(Point::new(seam_r, 0), Point::new(seam_r, h)).into_styled(stroke).draw(&mut self.frame)?;

        for y in (0..h).step_by(TICK_SPACING) {
            Line::new(Point::new(seam_l - TICK_LENGTH, y), Point::new(seam_l, y))
                .into_styled(stroke)
                .draw(&mut self.frame)?;
            Line::new(Point::new(seam_r, y), Point::new(seam_r + TICK_LENGTH, y))
                .into_styled(stroke)
                .draw(&mut self.frame)?;
        }

        let label = calibration_label(self.geometry.bezel_width);
        let text_style = TextStyleBuilder::new()
            .alignment(Alignment::Center)
            .baseline(Baseline::Top)
            .build();
        Text::with_text_style(
            label.as_str(),
            Point::new((seam_l + seam_r) / 2, LABEL_TOP),
            MonoTextStyle::new(&FONT_10X20, Rgb888::WHITE),
            text_style,
        )
        .draw(&mut self.frame)?;
        Ok(())
    }

    /// Copy both monitor regions to the surface and flush. The frame only
    /// counts as shown once the flush went through.
    pub fn present(&mut self, surface: &mut dyn DisplaySurface) -> Result<(), DisplayError> {
        let g = self.geometry;
        surface.blit(&self.frame, g.left_source(), g.left_dest())?;
        if g.right_width > 0 {
            surface.blit(&self.frame, g.right_source(), g.right_dest())?;
        }
        surface.flush()?;
        self.shown.clone_from(&self.rendered);
        self.dirty = false;
        Ok(())
    }
}

/// Readout drawn over the gutter while calibrating
fn calibration_label(bezel_width: u32) -> ArrayString<80> {
    let mut label = ArrayString::new();
    let _ = write!(&mut label, "Bezel compensation: {}px  (+/- to adjust, C to toggle)", bezel_width);
    label
}
