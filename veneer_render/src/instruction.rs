// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render instructions.

use veneer_core::region::Region;
use veneer_core::scene::NodeId;
use veneer_core::target::RenderTarget;

/// One step of a render pass: draw `node`'s instance into `target`,
/// restricted to `damage`.
///
/// Instructions are built by scheduling and consumed by execution. A
/// scheduled list is ordered back to front; later instructions draw on top.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderInstruction {
    /// Node whose instance renders this instruction.
    pub node: NodeId,
    /// Where to draw.
    pub target: RenderTarget,
    /// Logical area to draw, never empty.
    pub damage: Region,
}
