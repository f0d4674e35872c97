// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Effect parameter providers.
//!
//! Effects read their parameters with a *pull* model: the scene node holds a
//! shared provider and the render instance polls it every frame. Whoever
//! drives the animation (a plugin, a test, the demo) keeps another handle to
//! the same provider and updates it between frames.
//!
//! [`SharedBlurRadius`] and [`CrossfadeState`] are ready-made providers
//! backed by [`Cell`]s; any type implementing [`BlurProvider`] or
//! [`CrossfadeProvider`] works.

use core::cell::Cell;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

use crate::backend::Backend;
use crate::geometry::Rect;
use crate::region::Region;
use crate::target::RenderTarget;

/// Parameters and pixel operation of a blur effect.
pub trait BlurProvider {
    /// Current blur radius in physical pixels.
    fn blur_radius(&self) -> f64;

    /// Blurs the target's pixels inside `region`, sampling only inside
    /// `bounds`. Both are logical.
    ///
    /// The default uses the backend's built-in blur with
    /// [`blur_radius`](Self::blur_radius).
    fn apply(
        &self,
        backend: &mut dyn Backend,
        target: &RenderTarget,
        bounds: Rect,
        region: &Region,
    ) {
        backend.blur(target, bounds, region, self.blur_radius());
    }
}

/// Parameters of a crossfade effect.
pub trait CrossfadeProvider {
    /// Animation progress in `[0, 1]`.
    fn progress(&self) -> f64;

    /// Logical geometry the snapshot and the live content are currently
    /// stretched to.
    fn displayed_geometry(&self) -> kurbo::Rect;

    /// Whether the animation is still running.
    fn is_running(&self) -> bool;
}

/// A blur radius that can be changed from outside the render loop.
#[derive(Debug, Default)]
pub struct SharedBlurRadius {
    radius: Cell<f64>,
}

impl SharedBlurRadius {
    /// Creates a provider with the given radius.
    #[must_use]
    pub fn new(radius: f64) -> Self {
        Self {
            radius: Cell::new(radius),
        }
    }

    /// Replaces the radius. Negative or NaN values are stored as zero.
    pub fn set(&self, radius: f64) {
        self.radius.set(if radius > 0.0 { radius } else { 0.0 });
    }
}

impl BlurProvider for SharedBlurRadius {
    fn blur_radius(&self) -> f64 {
        self.radius.get()
    }
}

/// Crossfade parameters driven by an external animation.
#[derive(Debug)]
pub struct CrossfadeState {
    progress: Cell<f64>,
    geometry: Cell<kurbo::Rect>,
    running: Cell<bool>,
}

impl CrossfadeState {
    /// Creates a running crossfade at progress zero, displayed at `geometry`.
    #[must_use]
    pub fn new(geometry: kurbo::Rect) -> Self {
        Self {
            progress: Cell::new(0.0),
            geometry: Cell::new(geometry),
            running: Cell::new(true),
        }
    }

    /// Advances the animation. `progress` is clamped to `[0, 1]`.
    pub fn update(&self, progress: f64, geometry: kurbo::Rect) {
        let p = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };
        self.progress.set(p);
        self.geometry.set(geometry);
    }

    /// Marks the animation finished.
    pub fn finish(&self) {
        self.progress.set(1.0);
        self.running.set(false);
    }
}

impl CrossfadeProvider for CrossfadeState {
    fn progress(&self) -> f64 {
        self.progress.get()
    }

    fn displayed_geometry(&self) -> kurbo::Rect {
        self.geometry.get()
    }

    fn is_running(&self) -> bool {
        self.running.get()
    }
}

/// Blend weight of the live content for crossfade progress `p`.
///
/// `(2p)^(1/2) / 2` below one half and `(2p - 1)^2 / 2 + 0.5` above. The
/// snapshot is drawn with opacity `1 - crossfade_alpha(p)`.
#[must_use]
pub fn crossfade_alpha(p: f64) -> f64 {
    let p = if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) };
    if p < 0.5 {
        (2.0 * p).sqrt() / 2.0
    } else {
        let t = 2.0 * p - 1.0;
        t * t / 2.0 + 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpha_endpoints() {
        assert_eq!(crossfade_alpha(0.0), 0.0);
        assert_eq!(crossfade_alpha(0.5), 0.5);
        assert_eq!(crossfade_alpha(1.0), 1.0);
    }

    #[test]
    fn alpha_is_continuous_at_half() {
        let below = crossfade_alpha(0.5 - 1e-9);
        let above = crossfade_alpha(0.5);
        assert!((below - above).abs() < 1e-4, "{below} vs {above}");
    }

    #[test]
    fn alpha_is_monotonic() {
        let mut prev = -1.0;
        for i in 0..=100 {
            let a = crossfade_alpha(f64::from(i) / 100.0);
            assert!(a >= prev, "alpha decreased at step {i}");
            prev = a;
        }
    }

    #[test]
    fn alpha_clamps_input() {
        assert_eq!(crossfade_alpha(-1.0), 0.0);
        assert_eq!(crossfade_alpha(3.0), 1.0);
        assert_eq!(crossfade_alpha(f64::NAN), 0.0);
    }

    #[test]
    fn crossfade_state_lifecycle() {
        let geom = kurbo::Rect::new(0.0, 0.0, 10.0, 10.0);
        let state = CrossfadeState::new(geom);
        assert!(state.is_running());
        state.update(1.7, geom);
        assert_eq!(state.progress(), 1.0);
        state.finish();
        assert!(!state.is_running());
    }

    #[test]
    fn shared_radius_rejects_negative() {
        let r = SharedBlurRadius::new(4.0);
        assert_eq!(r.blur_radius(), 4.0);
        r.set(-2.0);
        assert_eq!(r.blur_radius(), 0.0);
    }
}
