// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Premultiplied RGBA8 pixel buffers.

use bytemuck::{Pod, Zeroable};
use veneer_core::geometry::Rect;

/// A premultiplied RGBA pixel.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Rgba8 {
    /// Red, premultiplied.
    pub r: u8,
    /// Green, premultiplied.
    pub g: u8,
    /// Blue, premultiplied.
    pub b: u8,
    /// Alpha.
    pub a: u8,
}

impl Rgba8 {
    /// Fully transparent.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    /// Opaque black.
    pub const BLACK: Self = Self::new(0, 0, 0, 255);

    /// Creates a pixel from premultiplied components.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Converts a premultiplied `[0, 1]` color.
    #[must_use]
    pub fn from_f32(color: [f32; 4]) -> Self {
        let [r, g, b, a] = color.map(unit_to_u8);
        Self { r, g, b, a }
    }

    /// Multiplies every component by `alpha / 255`.
    #[must_use]
    pub fn scaled(self, alpha: u8) -> Self {
        Self {
            r: mul_div_255(self.r, alpha),
            g: mul_div_255(self.g, alpha),
            b: mul_div_255(self.b, alpha),
            a: mul_div_255(self.a, alpha),
        }
    }

    /// Source-over: `self` composited on top of `dst`.
    #[must_use]
    pub fn over(self, dst: Self) -> Self {
        let inv = 255 - self.a;
        Self {
            r: self.r.saturating_add(mul_div_255(dst.r, inv)),
            g: self.g.saturating_add(mul_div_255(dst.g, inv)),
            b: self.b.saturating_add(mul_div_255(dst.b, inv)),
            a: self.a.saturating_add(mul_div_255(dst.a, inv)),
        }
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "value is clamped to [0, 255] before the cast"
)]
pub(crate) fn unit_to_u8(v: f32) -> u8 {
    if v.is_nan() {
        return 0;
    }
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn mul_div_255(v: u8, alpha: u8) -> u8 {
    let p = u16::from(v) * u16::from(alpha) + 128;
    u8::try_from((p + (p >> 8)) >> 8).unwrap_or(u8::MAX)
}

/// A `width × height` premultiplied RGBA8 buffer, row-major.
///
/// Rectangles passed to drawing methods are clamped to the pixmap.
#[derive(Clone, PartialEq, Eq)]
pub struct Pixmap {
    width: u32,
    height: u32,
    pixels: Vec<Rgba8>,
}

impl core::fmt::Debug for Pixmap {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Pixmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl Pixmap {
    /// A transparent pixmap.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, Rgba8::TRANSPARENT)
    }

    /// A pixmap filled with `color`.
    #[must_use]
    pub fn filled(width: u32, height: u32, color: Rgba8) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width as usize * height as usize],
        }
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The whole pixmap as a rectangle at the origin.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::new(
            0,
            0,
            i32::try_from(self.width).unwrap_or(i32::MAX),
            i32::try_from(self.height).unwrap_or(i32::MAX),
        )
    }

    /// All pixels, row-major.
    #[must_use]
    pub fn pixels(&self) -> &[Rgba8] {
        &self.pixels
    }

    /// The pixels as raw bytes, `RGBA` order.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// The pixel at `(x, y)`, or `None` outside the pixmap.
    #[must_use]
    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgba8> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Overwrites the pixel at `(x, y)`. Ignored outside the pixmap.
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Rgba8) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color;
        }
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let x = u32::try_from(x).ok().filter(|x| *x < self.width)?;
        let y = u32::try_from(y).ok().filter(|y| *y < self.height)?;
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Overwrites every pixel of `rect` with `color`.
    pub fn fill_rect(&mut self, rect: Rect, color: Rgba8) {
        let rect = rect.intersect(self.bounds());
        for y in rect.y..rect.bottom() {
            for x in rect.x..rect.right() {
                self.set_pixel(x, y, color);
            }
        }
    }

    /// Copies `rect` from `src` into the same coordinates of `self`.
    pub fn copy_rect_from(&mut self, src: &Self, rect: Rect) {
        let rect = rect.intersect(self.bounds()).intersect(src.bounds());
        for y in rect.y..rect.bottom() {
            for x in rect.x..rect.right() {
                if let Some(p) = src.pixel(x, y) {
                    self.set_pixel(x, y, p);
                }
            }
        }
    }

    /// Box-blurs the pixels inside `rects` with a `(2 * radius + 1)` wide
    /// kernel, run once horizontally and once vertically.
    ///
    /// All rectangles read from the pixels as they were before the call.
    /// Samples are taken inside `bounds` only; coordinates outside it are
    /// clamped to its edge.
    pub fn box_blur(&mut self, rects: &[Rect], bounds: Rect, radius: u32) {
        let bounds = bounds.intersect(self.bounds());
        if radius == 0 || bounds.is_empty() {
            return;
        }
        let r = i32::try_from(radius).unwrap_or(i32::MAX).min(bounds.width.max(bounds.height));
        let src = self.clone();
        for rect in rects {
            let rect = rect.intersect(bounds);
            if rect.is_empty() {
                continue;
            }
            // Horizontal pass over every row the vertical pass will read.
            let rows = Rect::from_corners(
                rect.x,
                (rect.y - r).max(bounds.y),
                rect.right(),
                (rect.bottom() + r).min(bounds.bottom()),
            );
            let mut tmp = Self::new(
                u32::try_from(rows.width).unwrap_or(0),
                u32::try_from(rows.height).unwrap_or(0),
            );
            for y in rows.y..rows.bottom() {
                for x in rows.x..rows.right() {
                    let sum = window_sum(r, |d| {
                        let sx = (x + d).clamp(bounds.x, bounds.right() - 1);
                        src.pixel(sx, y).unwrap_or_default()
                    });
                    tmp.set_pixel(x - rows.x, y - rows.y, average(sum, r));
                }
            }
            for y in rect.y..rect.bottom() {
                for x in rect.x..rect.right() {
                    let sum = window_sum(r, |d| {
                        let sy = (y + d).clamp(rows.y, rows.bottom() - 1);
                        tmp.pixel(x - rows.x, sy - rows.y).unwrap_or_default()
                    });
                    self.set_pixel(x, y, average(sum, r));
                }
            }
        }
    }
}

fn window_sum(r: i32, mut sample: impl FnMut(i32) -> Rgba8) -> [u32; 4] {
    let mut acc = [0_u32; 4];
    for d in -r..=r {
        let p = sample(d);
        acc[0] += u32::from(p.r);
        acc[1] += u32::from(p.g);
        acc[2] += u32::from(p.b);
        acc[3] += u32::from(p.a);
    }
    acc
}

fn average(sum: [u32; 4], r: i32) -> Rgba8 {
    let n = u32::try_from(2 * r + 1).unwrap_or(1);
    let [r, g, b, a] = sum.map(|c| u8::try_from((c + n / 2) / n).unwrap_or(u8::MAX));
    Rgba8 { r, g, b, a }
}
