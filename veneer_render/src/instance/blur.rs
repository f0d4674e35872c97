// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Background blur behind a single child.
//!
//! The instance grows the damage it receives by the blur padding, because a
//! blurred pixel depends on its neighbours up to that distance. Pixels in the
//! grown ring that were *not* damaged are still valid on screen, so they are
//! copied aside before the pass and restored after the blur has run.
//!
//! The child subtree is drawn into an inner buffer covering the child's
//! bounding box. At render time the background inside the damage is blurred
//! on the outer target and the inner buffer is composited on top.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;

use veneer_core::backend::{Backend, BackendError};
use veneer_core::effect::BlurProvider;
use veneer_core::geometry::Rect;
use veneer_core::region::Region;
use veneer_core::scene::{NodeClass, NodeId};
use veneer_core::target::RenderTarget;
use veneer_core::trace::FallbackReason;

use super::{PassContext, TRANSPARENT, execute_list, schedule_children};
use crate::bounds;
use crate::instruction::RenderInstruction;
use crate::resource::OwnedFramebuffer;

pub(crate) struct BlurInstance {
    provider: Rc<dyn BlurProvider>,

    /// Copy of the target's pixels in the padding ring.
    saved: OwnedFramebuffer,
    /// Physical region of `saved` holding valid pixels this frame.
    saved_region: Region,

    /// Child content at target scale.
    inner: OwnedFramebuffer,
    inner_target: Option<RenderTarget>,
    /// Child area the inner buffer still has to redraw.
    cached_damage: Region,
    /// Area of the inner buffer being redrawn this frame.
    inner_damage: Region,
    child_instructions: Vec<RenderInstruction>,

    padding: i32,
    child_box: Rect,
    pub(super) last_bbox: Rect,
}

impl fmt::Debug for BlurInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlurInstance")
            .field("radius", &self.provider.blur_radius())
            .field("saved", &self.saved)
            .field("saved_region", &self.saved_region)
            .field("inner", &self.inner)
            .field("cached_damage", &self.cached_damage)
            .field("padding", &self.padding)
            .field("last_bbox", &self.last_bbox)
            .finish_non_exhaustive()
    }
}

impl BlurInstance {
    pub(super) fn new(provider: Rc<dyn BlurProvider>) -> Self {
        Self {
            provider,
            saved: OwnedFramebuffer::empty(),
            saved_region: Region::new(),
            inner: OwnedFramebuffer::empty(),
            inner_target: None,
            cached_damage: Region::new(),
            inner_damage: Region::new(),
            child_instructions: Vec::new(),
            padding: 0,
            child_box: Rect::EMPTY,
            last_bbox: Rect::EMPTY,
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
        self.saved_region.clear();
        self.inner_damage.clear();
        self.child_instructions.clear();

        let store = ctx.store;
        let padding = target.padding_for_radius(self.provider.blur_radius());
        let child_box = bounds::children_box(store, ctx.surfaces, node, target.scale);
        let bbox = if child_box.is_empty() {
            Rect::EMPTY
        } else {
            child_box.inflate(padding)
        };
        self.padding = padding;
        self.child_box = child_box;
        self.last_bbox = bbox;

        let padded = damage.intersect_rect(bbox);
        if padded.is_empty() {
            return;
        }

        if let Some(child) = store.single_child(node) {
            let visible = padded.intersect_rect(target.geometry);
            if bounds::opaque_region(store, ctx.surfaces, child).contains(&visible) {
                // Nothing behind the child shows through.
                self.cached_damage
                    .union_with(&damage.intersect_rect(child_box));
                schedule_children(ctx, node, target, damage, out);
                return;
            }
        }

        let mut we_repaint = padded.expanded(padding);
        we_repaint.clip_to(bbox);
        we_repaint.clip_to(target.geometry);
        if we_repaint.is_empty() {
            return;
        }

        let inner_target = match self.prepare_buffers(ctx.backend, target, child_box) {
            Ok(inner_target) => inner_target,
            Err(err) => {
                log::warn!("blur {node:?} renders unblurred: {err}");
                ctx.fallback(node, NodeClass::Blur, FallbackReason::AllocationFailed);
                self.cached_damage
                    .union_with(&damage.intersect_rect(child_box));
                schedule_children(ctx, node, target, damage, out);
                return;
            }
        };

        let padding_only = we_repaint.subtract(damage);
        let saved_region = target.framebuffer_region_from_geometry_region(&padding_only);
        if let Some(saved) = self.saved.id() {
            if !saved_region.is_empty() {
                if let Err(err) = ctx.backend.blit(target.framebuffer, saved, &saved_region) {
                    log::warn!("blur {node:?} renders unblurred: {err}");
                    ctx.fallback(node, NodeClass::Blur, FallbackReason::BlitFailed);
                    self.cached_damage
                        .union_with(&damage.intersect_rect(child_box));
                    schedule_children(ctx, node, target, damage, out);
                    return;
                }
            }
        }
        self.saved_region = saved_region;

        let mut inner_damage = we_repaint.union(&self.cached_damage);
        inner_damage.clip_to(child_box);
        self.cached_damage.clear();

        let mut child_out = core::mem::take(&mut self.child_instructions);
        schedule_children(ctx, node, &inner_target, &mut inner_damage, &mut child_out);
        child_out.reverse();
        self.child_instructions = child_out;
        inner_damage.clip_to(child_box);
        self.inner_damage = inner_damage;

        damage.union_with(&we_repaint);
        out.push(RenderInstruction {
            node,
            target: *target,
            damage: we_repaint,
        });
    }

    /// Makes sure the saved-pixel and inner buffers match the target and the
    /// child, and returns the inner target.
    fn prepare_buffers(
        &mut self,
        backend: &mut dyn Backend,
        target: &RenderTarget,
        child_box: Rect,
    ) -> Result<RenderTarget, BackendError> {
        self.saved
            .ensure(backend, target.viewport_width, target.viewport_height)?;

        let sized = target.retarget(target.framebuffer, child_box);
        let (framebuffer, fresh) =
            match self
                .inner
                .ensure(backend, sized.viewport_width, sized.viewport_height)
            {
                Ok(allocated) => allocated,
                Err(err) => {
                    self.saved.release(backend);
                    self.inner_target = None;
                    return Err(err);
                }
            };
        let inner_target = RenderTarget {
            framebuffer,
            ..sized
        };
        if fresh || self.inner_target != Some(inner_target) {
            self.cached_damage = Region::from_rect(child_box);
        }
        self.inner_target = Some(inner_target);
        Ok(inner_target)
    }

    pub(super) fn render(
        &mut self,
        ctx: &mut PassContext<'_, '_>,
        instruction: &RenderInstruction,
    ) {
        let target = &instruction.target;

        if let (Some(inner_target), Some(texture)) = (self.inner_target, self.inner.texture()) {
            if !self.inner_damage.is_empty() {
                ctx.backend
                    .clear(&inner_target, &self.inner_damage, TRANSPARENT);
            }
            let mut children = core::mem::take(&mut self.child_instructions);
            execute_list(ctx, &children);
            children.clear();
            self.child_instructions = children;
            self.inner_damage.clear();

            let child_damage = instruction.damage.intersect_rect(self.child_box);
            if !child_damage.is_empty() {
                let translucent = self.translucent_damage(ctx, instruction.node, &child_damage);
                if !translucent.is_empty() {
                    let bounds = self.last_bbox.intersect(target.geometry);
                    self.provider
                        .apply(ctx.backend, target, bounds, &translucent);
                }
                let geometry = self.child_box.to_kurbo();
                for rect in &child_damage {
                    ctx.backend
                        .draw_texture(target, texture, geometry, 1.0, *rect);
                }
            }
        }

        if !self.saved_region.is_empty() {
            if let Some(saved) = self.saved.id() {
                if let Err(err) = ctx
                    .backend
                    .blit(saved, target.framebuffer, &self.saved_region)
                {
                    log::warn!("blur {:?} failed to restore padding: {err}", instruction.node);
                }
            }
        }
        self.saved_region.clear();
    }

    /// `damage` minus the child's opaque region contracted by the padding.
    fn translucent_damage(
        &self,
        ctx: &PassContext<'_, '_>,
        node: NodeId,
        damage: &Region,
    ) -> Region {
        let store = ctx.store;
        match store.single_child(node) {
            Some(child) => {
                let opaque = bounds::opaque_region(store, ctx.surfaces, child);
                damage.subtract(&opaque.expanded(-self.padding))
            }
            None => damage.clone(),
        }
    }

    pub(super) fn release(&mut self, backend: &mut dyn Backend) {
        self.saved.release(backend);
        self.inner.release(backend);
        self.inner_target = None;
        self.saved_region.clear();
        self.cached_damage.clear();
        self.child_instructions.clear();
    }
}
