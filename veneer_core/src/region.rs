// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pixel-area algebra over sets of disjoint rectangles.
//!
//! A [`Region`] is stored in *y-x banded* form:
//!
//! - the area is cut into horizontal bands at every distinct top/bottom edge,
//! - each band holds its x-spans sorted left to right, with no two spans
//!   touching or overlapping,
//! - vertically adjacent bands with identical spans are merged.
//!
//! Every operation goes through the same band sweep, so results are always
//! normalized and the representation is canonical: two regions covering the
//! same pixels have identical rectangle lists and compare equal.
//!
//! Value-returning operations ([`union`](Region::union),
//! [`intersect`](Region::intersect), [`subtract`](Region::subtract),
//! [`xor`](Region::xor), [`expanded`](Region::expanded)) never touch their
//! inputs. The `*_with` variants and [`expand_edges`](Region::expand_edges)
//! mutate in place.

use alloc::vec::Vec;
use core::ops::{BitAnd, BitOr, BitXor, Sub};

use crate::geometry::Rect;

/// Boolean operation applied per pixel during a band sweep.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Op {
    Union,
    Intersect,
    Subtract,
    Xor,
}

impl Op {
    #[inline]
    fn keep(self, in_a: bool, in_b: bool) -> bool {
        match self {
            Self::Union => in_a || in_b,
            Self::Intersect => in_a && in_b,
            Self::Subtract => in_a && !in_b,
            Self::Xor => in_a != in_b,
        }
    }
}

/// A half-open horizontal span `[start, end)`.
type Span = (i32, i32);

/// A normalized set of disjoint rectangles.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Region {
    rects: Vec<Rect>,
}

impl Region {
    /// Creates an empty region.
    #[must_use]
    pub const fn new() -> Self {
        Self { rects: Vec::new() }
    }

    /// Creates a region covering a single rectangle.
    #[must_use]
    pub fn from_rect(rect: Rect) -> Self {
        let mut rects = Vec::new();
        if !rect.is_empty() {
            rects.push(rect);
        }
        Self { rects }
    }

    /// Creates a region covering the union of arbitrary (possibly
    /// overlapping) rectangles.
    #[must_use]
    pub fn from_rects(rects: impl IntoIterator<Item = Rect>) -> Self {
        let input: Vec<Rect> = rects.into_iter().filter(|r| !r.is_empty()).collect();
        Self {
            rects: sweep(&input, &[], Op::Union),
        }
    }

    /// Returns `true` if the region covers no pixels.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// The constituent rectangles, top to bottom then left to right.
    #[inline]
    #[must_use]
    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    /// Iterates over the constituent rectangles.
    pub fn iter(&self) -> core::slice::Iter<'_, Rect> {
        self.rects.iter()
    }

    /// Number of constituent rectangles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rects.len()
    }

    /// Total number of pixels covered.
    #[must_use]
    pub fn area(&self) -> i64 {
        self.rects.iter().map(|r| r.area()).sum()
    }

    /// Smallest rectangle containing the whole region.
    #[must_use]
    pub fn bounding_box(&self) -> Rect {
        self.rects
            .iter()
            .fold(Rect::EMPTY, |acc, r| acc.union_bounds(*r))
    }

    /// Removes everything.
    pub fn clear(&mut self) {
        self.rects.clear();
    }

    // -- Value-returning operations --

    /// Pixels in either region.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        if self.is_empty() {
            return other.clone();
        }
        if other.is_empty() {
            return self.clone();
        }
        self.combine(other, Op::Union)
    }

    /// Pixels in both regions.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        if self.is_empty() || other.is_empty() {
            return Self::new();
        }
        self.combine(other, Op::Intersect)
    }

    /// Pixels of `self` clipped to a rectangle.
    #[must_use]
    pub fn intersect_rect(&self, rect: Rect) -> Self {
        self.intersect(&Self::from_rect(rect))
    }

    /// Pixels in `self` but not in `other`.
    #[must_use]
    pub fn subtract(&self, other: &Self) -> Self {
        if self.is_empty() || other.is_empty() {
            return self.clone();
        }
        self.combine(other, Op::Subtract)
    }

    /// Pixels in exactly one of the two regions.
    #[must_use]
    pub fn xor(&self, other: &Self) -> Self {
        if self.is_empty() {
            return other.clone();
        }
        if other.is_empty() {
            return self.clone();
        }
        self.combine(other, Op::Xor)
    }

    /// Copy of `self` with every rectangle grown by `amount` (shrunk when
    /// negative). See [`expand_edges`](Self::expand_edges).
    #[must_use]
    pub fn expanded(&self, amount: i32) -> Self {
        let mut out = self.clone();
        out.expand_edges(amount);
        out
    }

    /// Copy of `self` moved by `(dx, dy)`.
    #[must_use]
    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        Self {
            rects: self.rects.iter().map(|r| r.translate(dx, dy)).collect(),
        }
    }

    // -- In-place operations --

    /// `self = self ∪ other`.
    pub fn union_with(&mut self, other: &Self) {
        *self = self.union(other);
    }

    /// `self = self ∪ rect`.
    pub fn union_rect(&mut self, rect: Rect) {
        if !rect.is_empty() {
            *self = self.union(&Self::from_rect(rect));
        }
    }

    /// `self = self ∩ other`.
    pub fn intersect_with(&mut self, other: &Self) {
        *self = self.intersect(other);
    }

    /// `self = self ∩ rect`.
    pub fn clip_to(&mut self, rect: Rect) {
        // Fast path: already inside.
        if self.rects.iter().all(|r| rect.contains_rect(*r)) {
            return;
        }
        *self = self.intersect_rect(rect);
    }

    /// `self = self ∖ other`.
    pub fn subtract_with(&mut self, other: &Self) {
        *self = self.subtract(other);
    }

    /// `self = self ⊕ other`.
    pub fn xor_with(&mut self, other: &Self) {
        *self = self.xor(other);
    }

    /// Grows every rectangle's edges outward by `amount`, then re-normalizes.
    ///
    /// A negative `amount` contracts each rectangle instead; rectangles whose
    /// width or height drops to zero or below disappear. Contraction is
    /// applied to the normalized rectangles individually, so pixels next to
    /// an internal band boundary may be removed even if the region as a
    /// whole extends past it.
    pub fn expand_edges(&mut self, amount: i32) {
        if amount == 0 || self.is_empty() {
            return;
        }
        let grown: Vec<Rect> = self
            .rects
            .iter()
            .map(|r| r.inflate(amount))
            .filter(|r| !r.is_empty())
            .collect();
        self.rects = sweep(&grown, &[], Op::Union);
    }

    /// Moves the region by `(dx, dy)`.
    pub fn translate(&mut self, dx: i32, dy: i32) {
        for r in &mut self.rects {
            *r = r.translate(dx, dy);
        }
    }

    // -- Predicates --

    /// Returns `true` if every pixel of `other` is in `self`.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        other.subtract(self).is_empty()
    }

    /// Returns `true` if every pixel of `rect` is in `self`.
    #[must_use]
    pub fn contains_rect(&self, rect: Rect) -> bool {
        self.contains(&Self::from_rect(rect))
    }

    /// Returns `true` if the regions share at least one pixel.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.rects
            .iter()
            .any(|a| other.rects.iter().any(|b| a.intersects(*b)))
    }

    fn combine(&self, other: &Self, op: Op) -> Self {
        Self {
            rects: sweep(&self.rects, &other.rects, op),
        }
    }
}

impl From<Rect> for Region {
    fn from(rect: Rect) -> Self {
        Self::from_rect(rect)
    }
}

impl FromIterator<Rect> for Region {
    fn from_iter<T: IntoIterator<Item = Rect>>(iter: T) -> Self {
        Self::from_rects(iter)
    }
}

impl<'a> IntoIterator for &'a Region {
    type Item = &'a Rect;
    type IntoIter = core::slice::Iter<'a, Rect>;

    fn into_iter(self) -> Self::IntoIter {
        self.rects.iter()
    }
}

impl BitOr for &Region {
    type Output = Region;

    fn bitor(self, rhs: Self) -> Region {
        self.union(rhs)
    }
}

impl BitAnd for &Region {
    type Output = Region;

    fn bitand(self, rhs: Self) -> Region {
        self.intersect(rhs)
    }
}

impl BitXor for &Region {
    type Output = Region;

    fn bitxor(self, rhs: Self) -> Region {
        self.xor(rhs)
    }
}

impl Sub for &Region {
    type Output = Region;

    fn sub(self, rhs: Self) -> Region {
        self.subtract(rhs)
    }
}

// ---------------------------------------------------------------------------
// Band sweep
// ---------------------------------------------------------------------------

/// Combines two rectangle lists band by band.
///
/// The inputs do not need to be normalized; spans within a band are merged
/// before the operation is applied. The output is always in canonical banded
/// form.
fn sweep(a: &[Rect], b: &[Rect], op: Op) -> Vec<Rect> {
    let mut ys: Vec<i32> = a
        .iter()
        .chain(b)
        .flat_map(|r| [r.y, r.bottom()])
        .collect();
    ys.sort_unstable();
    ys.dedup();

    let mut out: Vec<Rect> = Vec::new();
    // Band that the last emitted rectangles belong to, for vertical coalescing.
    let mut prev_spans: Vec<Span> = Vec::new();
    let mut prev_start = 0_usize;
    let mut prev_bottom = i32::MIN;

    let mut spans_a = Vec::new();
    let mut spans_b = Vec::new();
    let mut spans = Vec::new();

    for band in ys.windows(2) {
        let (y0, y1) = (band[0], band[1]);
        spans_at(a, y0, &mut spans_a);
        spans_at(b, y0, &mut spans_b);
        combine_spans(&spans_a, &spans_b, op, &mut spans);

        if spans.is_empty() {
            prev_spans.clear();
            continue;
        }

        if prev_bottom == y0 && prev_spans == spans {
            // Same shape as the band directly above: stretch it down.
            for r in &mut out[prev_start..] {
                r.height += y1 - y0;
            }
        } else {
            prev_start = out.len();
            out.extend(spans.iter().map(|&(x0, x1)| Rect::from_corners(x0, y0, x1, y1)));
            prev_spans.clear();
            prev_spans.extend_from_slice(&spans);
        }
        prev_bottom = y1;
    }

    out
}

/// Collects the merged x-spans of every rectangle crossing row `y`.
fn spans_at(rects: &[Rect], y: i32, out: &mut Vec<Span>) {
    out.clear();
    out.extend(
        rects
            .iter()
            .filter(|r| r.y <= y && y < r.bottom() && r.width > 0)
            .map(|r| (r.x, r.right())),
    );
    out.sort_unstable();

    // Merge overlapping or touching spans in place.
    let mut merged = 0;
    for i in 0..out.len() {
        let (s, e) = out[i];
        if merged > 0 && s <= out[merged - 1].1 {
            out[merged - 1].1 = out[merged - 1].1.max(e);
        } else {
            out[merged] = (s, e);
            merged += 1;
        }
    }
    out.truncate(merged);
}

/// Applies `op` to two normalized span lists.
fn combine_spans(a: &[Span], b: &[Span], op: Op, out: &mut Vec<Span>) {
    out.clear();
    let mut xs: Vec<i32> = a.iter().chain(b).flat_map(|&(s, e)| [s, e]).collect();
    xs.sort_unstable();
    xs.dedup();

    let (mut ia, mut ib) = (0_usize, 0_usize);
    for w in xs.windows(2) {
        let (x0, x1) = (w[0], w[1]);
        let in_a = covers(a, &mut ia, x0);
        let in_b = covers(b, &mut ib, x0);
        if !op.keep(in_a, in_b) {
            continue;
        }
        match out.last_mut() {
            Some(last) if last.1 == x0 => last.1 = x1,
            _ => out.push((x0, x1)),
        }
    }
}

/// Returns whether `x` lies in one of `spans`, advancing the cursor.
///
/// Successive calls must use non-decreasing `x`.
#[inline]
fn covers(spans: &[Span], cursor: &mut usize, x: i32) -> bool {
    while *cursor < spans.len() && spans[*cursor].1 <= x {
        *cursor += 1;
    }
    *cursor < spans.len() && spans[*cursor].0 <= x
}
