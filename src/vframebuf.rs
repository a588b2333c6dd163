/*
 *  vframebuf.rs
 *
 *  Florafade - sensor driven bloom display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Off-screen canvas with sprite and flat-fill blending
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

use core::convert::Infallible;
use embedded_graphics::geometry::{OriginDimensions, Size};
use embedded_graphics::pixelcolor::{PixelColor, Rgb888, RgbColor};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::assets::Sprite;
use crate::display::layout::Placement;

/// A runtime-sized framebuffer for embedded-graphics.
#[derive(Debug, Clone)]
pub struct VarFrameBuf<C: PixelColor> {
    buf: Vec<C>,
    w: usize,
    h: usize,
}

impl<C: PixelColor + Clone> VarFrameBuf<C> {
    pub fn new(width: u32, height: u32, fill: C) -> Self {
        let (w, h) = (width as usize, height as usize);
        Self { buf: vec![fill; w * h], w, h }
    }

    pub fn width(&self) -> usize { self.w }
    pub fn height(&self) -> usize { self.h }

    /// Mutable raw access (useful for pushing regions to the panel)
    pub fn as_mut_slice(&mut self) -> &mut [C] { &mut self.buf }

    /// Immutable raw access
    pub fn as_slice(&self) -> &[C] { &self.buf }

    /// Clear to a color
    pub fn clear_color(&mut self, color: C) {
        self.buf.fill(color);
    }

    /// Pixel at (x, y), None when out of bounds
    pub fn pixel(&self, x: usize, y: usize) -> Option<C> {
        (x < self.w && y < self.h).then(|| self.buf[y * self.w + x])
    }

    /// `width` pixels of row `y` starting at `x`, clipped to the buffer
    pub fn span(&self, x: usize, y: usize, width: usize) -> &[C] {
        if y >= self.h || x >= self.w {
            return &[];
        }
        let start = y * self.w + x;
        let end = start + width.min(self.w - x);
        &self.buf[start..end]
    }

    /// Copy another buffer of identical size over this one
    pub fn copy_from(&mut self, other: &VarFrameBuf<C>) -> bool {
        if other.w != self.w || other.h != self.h {
            return false;
        }
        self.buf.copy_from_slice(&other.buf);
        true
    }

    /// Copy `source` of `src` so its top-left lands on `dest`.
    /// Returns false, copying nothing, unless both rectangles fit.
    pub fn blit_from(&mut self, src: &VarFrameBuf<C>, source: &Rectangle, dest: Point) -> bool {
        let Size { width, height } = source.size;
        let fits = |r: Rectangle, w: usize, h: usize| {
            r.top_left.x >= 0
                && r.top_left.y >= 0
                && r.top_left.x as usize + r.size.width as usize <= w
                && r.top_left.y as usize + r.size.height as usize <= h
        };
        if !fits(*source, src.w, src.h) || !fits(Rectangle::new(dest, source.size), self.w, self.h) {
            return false;
        }

        let (sx, sy) = (source.top_left.x as usize, source.top_left.y as usize);
        let (dx, dy) = (dest.x as usize, dest.y as usize);
        let w = width as usize;
        for row in 0..height as usize {
            let s = (sy + row) * src.w + sx;
            let d = (dy + row) * self.w + dx;
            self.buf[d..d + w].copy_from_slice(&src.buf[s..s + w]);
        }
        true
    }

    /// Map (x,y) to linear index; returns None if out of bounds
    #[inline]
    fn idx(&self, p: Point) -> Option<usize> {
        if p.x >= 0 && p.y >= 0 {
            let (x, y) = (p.x as usize, p.y as usize);
            if x < self.w && y < self.h {
                return Some(y * self.w + x);
            }
        }
        None
    }
}

/// Integer pixel bounds of a placement clipped to a `w` x `h` buffer,
/// together with the unclipped origin and size
struct Clip {
    x0: i64,
    y0: i64,
    w: i64,
    h: i64,
    cols: std::ops::Range<i64>,
    rows: std::ops::Range<i64>,
}

fn clip(p: &Placement, w: usize, h: usize) -> Option<Clip> {
    let (x0, y0) = (p.x.round() as i64, p.y.round() as i64);
    let (pw, ph) = (p.width.round() as i64, p.height.round() as i64);
    if pw <= 0 || ph <= 0 {
        return None;
    }
    let cols = x0.max(0)..(x0 + pw).min(w as i64);
    let rows = y0.max(0)..(y0 + ph).min(h as i64);
    if cols.is_empty() || rows.is_empty() {
        return None;
    }
    Some(Clip { x0, y0, w: pw, h: ph, cols, rows })
}

#[inline]
fn mix(src_premul: u8, dst: u8, tint: f32, coverage: f32) -> u8 {
    (src_premul as f32 * tint + dst as f32 * (1.0 - coverage)).round().clamp(0.0, 255.0) as u8
}

impl VarFrameBuf<Rgb888> {
    /// Scale `sprite` into `placement` (nearest neighbour) and blend it over
    /// the buffer with a uniform tint `opacity` in 0..=255.
    pub fn blend_sprite(&mut self, sprite: &Sprite, placement: &Placement, opacity: f32) {
        let tint = (opacity / 255.0).clamp(0.0, 1.0);
        if tint <= 0.0 || sprite.width == 0 || sprite.height == 0 {
            return;
        }
        let Some(c) = clip(placement, self.w, self.h) else { return };
        let (sw, sh) = (sprite.width as i64, sprite.height as i64);

        let src_cols: Vec<usize> = c
            .cols
            .clone()
            .map(|dx| (((dx - c.x0) * sw) / c.w).clamp(0, sw - 1) as usize)
            .collect();

        for dy in c.rows.clone() {
            let sy = (((dy - c.y0) * sh) / c.h).clamp(0, sh - 1) as usize;
            let base = dy as usize * self.w;
            for (dx, &sx) in c.cols.clone().zip(src_cols.iter()) {
                let [r, g, b, a] = sprite.pixel(sx, sy);
                if a == 0 {
                    continue;
                }
                let coverage = a as f32 / 255.0 * tint;
                let i = base + dx as usize;
                let dst = self.buf[i];
                self.buf[i] = Rgb888::new(
                    mix(r, dst.r(), tint, coverage),
                    mix(g, dst.g(), tint, coverage),
                    mix(b, dst.b(), tint, coverage),
                );
            }
        }
    }

    /// Blend a flat `color` rectangle at `opacity` in 0..=255
    pub fn blend_fill(&mut self, placement: &Placement, color: Rgb888, opacity: f32) {
        let tint = (opacity / 255.0).clamp(0.0, 1.0);
        if tint <= 0.0 {
            return;
        }
        let Some(c) = clip(placement, self.w, self.h) else { return };
        for dy in c.rows.clone() {
            let base = dy as usize * self.w;
            for dx in c.cols.clone() {
                let i = base + dx as usize;
                let dst = self.buf[i];
                self.buf[i] = Rgb888::new(
                    mix(color.r(), dst.r(), tint, tint),
                    mix(color.g(), dst.g(), tint, tint),
                    mix(color.b(), dst.b(), tint, tint),
                );
            }
        }
    }
}

impl<C: PixelColor> OriginDimensions for VarFrameBuf<C> {
    fn size(&self) -> Size {
        Size::new(self.w as u32, self.h as u32)
    }
}

impl<C: PixelColor + Clone> DrawTarget for VarFrameBuf<C> {
    type Color = C;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, c) in pixels {
            if let Some(i) = self.idx(p) {
                self.buf[i] = c;
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.clear_color(color);
        Ok(())
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        // colors arrive row-major for the whole area, including clipped parts
        let Size { width, height } = area.size;
        if width == 0 || height == 0 { return Ok(()); }

        let mut it = colors.into_iter();
        for row in 0..height as i32 {
            for col in 0..width as i32 {
                let Some(c) = it.next() else { return Ok(()) };
                if let Some(i) = self.idx(area.top_left + Point::new(col, row)) {
                    self.buf[i] = c;
                }
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let clipped = area.intersection(&self.bounding_box());
        let Size { width, height } = clipped.size;
        if width == 0 || height == 0 { return Ok(()); }

        let (x0, y0) = (clipped.top_left.x as usize, clipped.top_left.y as usize);
        for y in y0..y0 + height as usize {
            let start = y * self.w + x0;
            self.buf[start..start + width as usize].fill(color);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::primitives::{Line, PrimitiveStyle};

    fn solid_sprite(w: u32, h: u32, rgba: [u8; 4]) -> Sprite {
        Sprite::from_premultiplied(w, h, rgba.repeat((w * h) as usize))
    }

    #[test]
    fn test_draw_clips_out_of_bounds() {
        let mut fb = VarFrameBuf::new(10, 10, Rgb888::BLACK);
        Line::new(Point::new(-5, 5), Point::new(15, 5))
            .into_styled(PrimitiveStyle::with_stroke(Rgb888::WHITE, 1))
            .draw(&mut fb)
            .unwrap();
        assert_eq!(fb.pixel(0, 5), Some(Rgb888::WHITE));
        assert_eq!(fb.pixel(9, 5), Some(Rgb888::WHITE));
        assert_eq!(fb.pixel(9, 4), Some(Rgb888::BLACK));
    }

    #[test]
    fn test_fill_solid_clipped() {
        let mut fb = VarFrameBuf::new(8, 8, Rgb888::BLACK);
        fb.fill_solid(&Rectangle::new(Point::new(-2, -2), Size::new(4, 4)), Rgb888::RED).unwrap();
        assert_eq!(fb.pixel(0, 0), Some(Rgb888::RED));
        assert_eq!(fb.pixel(1, 1), Some(Rgb888::RED));
        assert_eq!(fb.pixel(2, 2), Some(Rgb888::BLACK));
    }

    #[test]
    fn test_span() {
        let mut fb = VarFrameBuf::new(4, 2, Rgb888::BLACK);
        fb.as_mut_slice()[5] = Rgb888::GREEN;
        assert_eq!(fb.span(1, 1, 10), &[Rgb888::GREEN, Rgb888::BLACK, Rgb888::BLACK]);
        assert!(fb.span(4, 0, 1).is_empty());
    }

    #[test]
    fn test_blit_from_region() {
        let mut src = VarFrameBuf::new(6, 2, Rgb888::BLACK);
        src.fill_solid(&Rectangle::new(Point::new(4, 0), Size::new(2, 2)), Rgb888::RED).unwrap();
        let mut dst = VarFrameBuf::new(4, 2, Rgb888::BLACK);

        assert!(dst.blit_from(&src, &Rectangle::new(Point::new(4, 0), Size::new(2, 2)), Point::new(2, 0)));
        assert_eq!(dst.span(0, 1, 4), &[Rgb888::BLACK, Rgb888::BLACK, Rgb888::RED, Rgb888::RED]);

        // source runs off the edge
        assert!(!dst.blit_from(&src, &Rectangle::new(Point::new(5, 0), Size::new(2, 2)), Point::zero()));
        // destination runs off the edge
        assert!(!dst.blit_from(&src, &Rectangle::new(Point::zero(), Size::new(2, 2)), Point::new(3, 0)));
    }

    #[test]
    fn test_blend_sprite_opaque_and_half() {
        let sprite = solid_sprite(2, 2, [200, 100, 0, 255]);
        let mut fb = VarFrameBuf::new(4, 4, Rgb888::BLACK);
        let p = Placement { x: 0.0, y: 0.0, width: 2.0, height: 2.0 };

        fb.blend_sprite(&sprite, &p, 255.0);
        assert_eq!(fb.pixel(1, 1), Some(Rgb888::new(200, 100, 0)));
        assert_eq!(fb.pixel(2, 2), Some(Rgb888::BLACK));

        let mut fb = VarFrameBuf::new(4, 4, Rgb888::new(100, 100, 100));
        fb.blend_sprite(&sprite, &p, 127.5);
        assert_eq!(fb.pixel(0, 0), Some(Rgb888::new(150, 100, 50)));
    }

    #[test]
    fn test_blend_sprite_scales_up() {
        // 1x2 sprite, top red, bottom blue, drawn 4x4
        let sprite = Sprite::from_premultiplied(1, 2, vec![255, 0, 0, 255, 0, 0, 255, 255]);
        let mut fb = VarFrameBuf::new(4, 4, Rgb888::BLACK);
        fb.blend_sprite(&sprite, &Placement { x: 0.0, y: 0.0, width: 4.0, height: 4.0 }, 255.0);
        assert_eq!(fb.pixel(3, 1), Some(Rgb888::RED));
        assert_eq!(fb.pixel(3, 2), Some(Rgb888::BLUE));
    }

    #[test]
    fn test_zero_opacity_is_noop() {
        let sprite = solid_sprite(1, 1, [255, 255, 255, 255]);
        let mut fb = VarFrameBuf::new(2, 2, Rgb888::BLACK);
        fb.blend_sprite(&sprite, &Placement { x: 0.0, y: 0.0, width: 2.0, height: 2.0 }, 0.0);
        fb.blend_fill(&Placement { x: 0.0, y: 0.0, width: 2.0, height: 2.0 }, Rgb888::WHITE, 0.0);
        assert!(fb.as_slice().iter().all(|&p| p == Rgb888::BLACK));
    }
}
