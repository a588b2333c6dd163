/*
 *  display/hud.rs
 *
 *  Florafade - sensor driven bloom display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Diagnostic readout: raw vectors, visibility and timing
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

use arrayvec::ArrayString;
use core::fmt::Write;
use embedded_graphics::{
    mono_font::{ascii::FONT_9X15, MonoTextStyle},
    pixelcolor::Rgb888,
    prelude::*,
    primitives::{PrimitiveStyle, Rectangle},
    text::{Baseline, Text},
};

use crate::engine::ChannelEngine;

const LINE_HEIGHT: i32 = 18;
const MARGIN: i32 = 12;
const PANEL: Rgb888 = Rgb888::new(0, 0, 0);

/// Formatted HUD lines, stack allocated
pub type HudLine = ArrayString<128>;

/// Text for one frame of the HUD, captured from the engine
#[derive(Debug, Clone, Default)]
pub struct Hud {
    pub lines: Vec<HudLine>,
}

impl Hud {
    pub fn capture(engine: &ChannelEngine, fps: f32, bezel: u32) -> Self {
        let mut lines = Vec::with_capacity(5);

        let mut analog = HudLine::new();
        let mut digital = HudLine::new();
        match engine.last_sample() {
            Some(s) => {
                let _ = write!(&mut analog, "analog  {:?}", s.analog);
                let _ = write!(&mut digital, "digital {:?}", s.digital);
            }
            None => {
                let _ = write!(&mut analog, "analog  (no data)");
                let _ = write!(&mut digital, "digital (no data)");
            }
        }
        lines.push(analog);
        lines.push(digital);

        let mut visible = HudLine::new();
        let _ = write!(&mut visible, "visible ");
        for ch in engine.channels() {
            let _ = visible.try_push(if ch.visible { '1' } else { '0' });
        }
        let _ = write!(&mut visible, "  rejected {}", engine.rejected());
        lines.push(visible);

        let mut timing = HudLine::new();
        if engine.is_cascade() {
            let _ = write!(&mut timing, "cascade mode");
        } else {
            let d = engine.debounce_engine();
            let f = engine.fade_animator();
            let _ = write!(
                &mut timing,
                "on {}ms off {}ms  rise {}ms fall {}ms",
                d.activation.as_millis(),
                d.deactivation.as_millis(),
                f.rise_tau_ms,
                f.fall_tau_ms
            );
        }
        lines.push(timing);

        let mut status = HudLine::new();
        let _ = write!(&mut status, "{:.1} fps  bezel {}px", fps, bezel);
        lines.push(status);

        Self { lines }
    }

    /// Draw on a dark panel in the top-left corner
    pub fn draw<D>(&self, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        let widest = self.lines.iter().map(|l| l.len()).max().unwrap_or(0) as u32;
        let panel = Rectangle::new(
            Point::new(MARGIN / 2, MARGIN / 2),
            Size::new(widest * 9 + MARGIN as u32, self.lines.len() as u32 * LINE_HEIGHT as u32 + MARGIN as u32),
        );
        panel.into_styled(PrimitiveStyle::with_fill(PANEL)).draw(target)?;

        let style = MonoTextStyle::new(&FONT_9X15, Rgb888::WHITE);
        for (i, line) in self.lines.iter().enumerate() {
            Text::with_baseline(
                line.as_str(),
                Point::new(MARGIN, MARGIN + i as i32 * LINE_HEIGHT),
                style,
                Baseline::Top,
            )
            .draw(target)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debounce::DebounceEngine;
    use crate::fade::FadeAnimator;
    use crate::input::InputEvent;
    use crate::vframebuf::VarFrameBuf;

    #[test]
    fn test_capture_lines() {
        let mut engine =
            ChannelEngine::new(5, DebounceEngine::from_millis(120, 150), FadeAnimator::new(700.0, 900.0));
        let hud = Hud::capture(&engine, 0.0, 60);
        assert_eq!(hud.lines[0].as_str(), "analog  (no data)");

        engine.ingest(InputEvent::Line("[3,4,5,6,7,1,0,1,1,0]".into())).unwrap();
        let hud = Hud::capture(&engine, 59.94, 60);
        assert_eq!(hud.lines[0].as_str(), "analog  [3, 4, 5, 6, 7]");
        assert_eq!(hud.lines[1].as_str(), "digital [1, 0, 1, 1, 0]");
        assert!(hud.lines[2].starts_with("visible 00000"));
        assert_eq!(hud.lines[3].as_str(), "on 120ms off 150ms  rise 700ms fall 900ms");
        assert_eq!(hud.lines[4].as_str(), "59.9 fps  bezel 60px");
    }

    #[test]
    fn test_draw_marks_corner() {
        let engine = ChannelEngine::new(2, DebounceEngine::from_millis(0, 0), FadeAnimator::new(0.0, 0.0));
        let mut fb = VarFrameBuf::new(400, 200, Rgb888::new(40, 40, 40));
        Hud::capture(&engine, 60.0, 0).draw(&mut fb).unwrap();
        assert_eq!(fb.pixel(7, 7), Some(PANEL));
        assert!(fb.as_slice().iter().any(|&p| p == Rgb888::WHITE));
        assert_eq!(fb.pixel(399, 199), Some(Rgb888::new(40, 40, 40)));
    }
}
