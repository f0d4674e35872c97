// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Crossfade from a snapshot of a surface to its live content.
//!
//! The snapshot is captured once, when the instance is created. Each frame
//! the live child is drawn into an inner buffer covering its own bounding
//! box, then stretched over the provider's displayed geometry. The snapshot
//! is composited on top at the same geometry with opacity
//! `1 - alpha(progress)`, so the window scales and fades at once.
//!
//! If the inner buffer cannot be allocated the child draws straight into the
//! target at its own box and only the snapshot follows the displayed
//! geometry.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;

use veneer_core::backend::{Backend, BackendError};
use veneer_core::effect::{CrossfadeProvider, crossfade_alpha};
use veneer_core::geometry::Rect;
use veneer_core::region::Region;
use veneer_core::scene::{NodeClass, NodeId};
use veneer_core::target::RenderTarget;
use veneer_core::trace::FallbackReason;

use super::{PassContext, TRANSPARENT, execute_list, schedule_children, touches};
use crate::bounds;
use crate::instruction::RenderInstruction;
use crate::resource::OwnedFramebuffer;

pub(crate) struct CrossfadeInstance {
    provider: Rc<dyn CrossfadeProvider>,
    snapshot: OwnedFramebuffer,

    /// Live child content at target scale.
    inner: OwnedFramebuffer,
    inner_target: Option<RenderTarget>,
    child_instructions: Vec<RenderInstruction>,

    child_box: Rect,
    pub(super) last_bbox: Rect,
}

impl fmt::Debug for CrossfadeInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrossfadeInstance")
            .field("progress", &self.provider.progress())
            .field("snapshot", &self.snapshot)
            .field("inner", &self.inner)
            .field("child_box", &self.child_box)
            .field("last_bbox", &self.last_bbox)
            .finish_non_exhaustive()
    }
}

impl CrossfadeInstance {
    pub(super) fn new(
        ctx: &mut PassContext<'_, '_>,
        node: NodeId,
        provider: Rc<dyn CrossfadeProvider>,
        target: &RenderTarget,
    ) -> Self {
        let mut instance = Self {
            provider,
            snapshot: OwnedFramebuffer::empty(),
            inner: OwnedFramebuffer::empty(),
            inner_target: None,
            child_instructions: Vec::new(),
            child_box: Rect::EMPTY,
            last_bbox: Rect::EMPTY,
        };
        instance.capture(ctx, node, target);
        instance
    }

    /// Renders the first surface below `node` into the snapshot buffer.
    fn capture(&mut self, ctx: &mut PassContext<'_, '_>, node: NodeId, target: &RenderTarget) {
        let Some((surface, bbox)) = bounds::first_surface(ctx.store, node)
            .and_then(|s| Some((s, ctx.surfaces.bounding_box(s)?)))
        else {
            log::warn!("crossfade {node:?} has no content to snapshot");
            ctx.fallback(node, NodeClass::Crossfade, FallbackReason::StaleSnapshot);
            return;
        };

        let sized = target.retarget(target.framebuffer, bbox);
        match self
            .snapshot
            .ensure(ctx.backend, sized.viewport_width, sized.viewport_height)
        {
            Ok((framebuffer, _)) => {
                let snapshot_target = RenderTarget {
                    framebuffer,
                    ..sized
                };
                let full = Region::from_rect(bbox);
                ctx.backend.clear(&snapshot_target, &full, TRANSPARENT);
                ctx.backend
                    .render_surface(&snapshot_target, surface, bbox.origin(), &full);
            }
            Err(err) => {
                log::warn!("crossfade {node:?} draws no snapshot: {err}");
                ctx.fallback(node, NodeClass::Crossfade, FallbackReason::AllocationFailed);
            }
        }
    }

    pub(super) fn schedule(
        &mut self,
        ctx: &mut PassContext<'_, '_>,
        node: NodeId,
        target: &RenderTarget,
        damage: &mut Region,
        out: &mut Vec<RenderInstruction>,
    ) {
        self.child_instructions.clear();
        self.last_bbox = bounds::bounding_box(ctx.store, ctx.surfaces, node, target.scale);
        let visible = self.last_bbox.intersect(target.geometry);
        if !touches(damage, visible) {
            return;
        }

        // Any change redraws the whole box.
        let full = Region::from_rect(visible);
        damage.union_with(&full);
        out.push(RenderInstruction {
            node,
            target: *target,
            damage: full,
        });

        let child_box = bounds::children_box(ctx.store, ctx.surfaces, node, target.scale);
        self.child_box = child_box;
        if child_box.is_empty() {
            return;
        }
        match self.prepare_inner(ctx.backend, target, child_box) {
            Ok(inner_target) => {
                let mut inner_damage = Region::from_rect(child_box);
                let mut child_out = core::mem::take(&mut self.child_instructions);
                schedule_children(ctx, node, &inner_target, &mut inner_damage, &mut child_out);
                child_out.reverse();
                self.child_instructions = child_out;
            }
            Err(err) => {
                log::warn!("crossfade {node:?} draws its content unscaled: {err}");
                ctx.fallback(node, NodeClass::Crossfade, FallbackReason::AllocationFailed);
                schedule_children(ctx, node, target, damage, out);
            }
        }
    }

    /// Makes sure the inner buffer covers `child_box` at the target's scale
    /// and returns the inner target.
    fn prepare_inner(
        &mut self,
        backend: &mut dyn Backend,
        target: &RenderTarget,
        child_box: Rect,
    ) -> Result<RenderTarget, BackendError> {
        let sized = target.retarget(target.framebuffer, child_box);
        match self
            .inner
            .ensure(backend, sized.viewport_width, sized.viewport_height)
        {
            Ok((framebuffer, _)) => {
                let inner_target = RenderTarget {
                    framebuffer,
                    ..sized
                };
                self.inner_target = Some(inner_target);
                Ok(inner_target)
            }
            Err(err) => {
                self.inner_target = None;
                Err(err)
            }
        }
    }

    #[expect(clippy::cast_possible_truncation, reason = "opacity is in [0, 1]")]
    pub(super) fn render(
        &mut self,
        ctx: &mut PassContext<'_, '_>,
        instruction: &RenderInstruction,
    ) {
        let target = &instruction.target;
        let geometry = self.provider.displayed_geometry();

        if let (Some(inner_target), Some(texture)) = (self.inner_target, self.inner.texture()) {
            if !self.child_instructions.is_empty() {
                let full = Region::from_rect(self.child_box);
                ctx.backend.clear(&inner_target, &full, TRANSPARENT);
                let mut children = core::mem::take(&mut self.child_instructions);
                execute_list(ctx, &children);
                children.clear();
                self.child_instructions = children;
                for rect in &instruction.damage {
                    ctx.backend.draw_texture(target, texture, geometry, 1.0, *rect);
                }
            }
        }

        let Some(snapshot) = self.snapshot.texture() else {
            return;
        };
        let opacity = (1.0 - crossfade_alpha(self.provider.progress())) as f32;
        for rect in &instruction.damage {
            ctx.backend.draw_texture(target, snapshot, geometry, opacity, *rect);
        }
    }

    pub(super) fn release(&mut self, backend: &mut dyn Backend) {
        self.snapshot.release(backend);
        self.inner.release(backend);
        self.inner_target = None;
        self.child_instructions.clear();
    }
}
