// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;

use veneer_core::geometry::{Point, Rect};
use veneer_core::region::Region;
use veneer_core::scene::{NodeId, SurfaceId};
use veneer_core::target::RenderTarget;

use super::PassContext;
use crate::instruction::RenderInstruction;

/// Leaf instance drawing one client surface.
#[derive(Debug)]
pub(crate) struct SurfaceInstance {
    surface: SurfaceId,
    origin: Point,
    pub(super) last_bbox: Rect,
}

impl SurfaceInstance {
    pub(super) fn new(surface: SurfaceId) -> Self {
        Self {
            surface,
            origin: Point::ZERO,
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
        let bbox = ctx
            .surfaces
            .bounding_box(self.surface)
            .unwrap_or(Rect::EMPTY);
        self.last_bbox = bbox;
        self.origin = bbox.origin();

        let clipped = damage.intersect_rect(bbox.intersect(target.geometry));
        if !clipped.is_empty() {
            out.push(RenderInstruction {
                node,
                target: *target,
                damage: clipped,
            });
        }
    }

    pub(super) fn render(
        &mut self,
        ctx: &mut PassContext<'_, '_>,
        instruction: &RenderInstruction,
    ) {
        ctx.backend.render_surface(
            &instruction.target,
            self.surface,
            self.origin,
            &instruction.damage,
        );
    }
}
