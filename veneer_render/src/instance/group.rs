// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;

use veneer_core::geometry::Rect;
use veneer_core::region::Region;
use veneer_core::scene::NodeId;
use veneer_core::target::RenderTarget;

use super::{PassContext, schedule_children, touches};
use crate::bounds;
use crate::instruction::RenderInstruction;

/// Container instance. Draws nothing itself.
#[derive(Debug, Default)]
pub(crate) struct GroupInstance {
    pub(super) last_bbox: Rect,
}

impl GroupInstance {
    pub(super) fn schedule(
        &mut self,
        ctx: &mut PassContext<'_, '_>,
        node: NodeId,
        target: &RenderTarget,
        damage: &mut Region,
        out: &mut Vec<RenderInstruction>,
    ) {
        self.last_bbox = bounds::bounding_box(ctx.store, ctx.surfaces, node, target.scale);
        if !touches(damage, self.last_bbox.intersect(target.geometry)) {
            return;
        }
        // Children see the unclipped damage so that area added by a child
        // reaches siblings behind it.
        schedule_children(ctx, node, target, damage, out);
    }
}
