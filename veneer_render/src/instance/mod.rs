// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render instances and the arena that owns them.
//!
//! Every scene node that takes part in a pass gets one render instance,
//! created lazily the first time the node is scheduled and destroyed when
//! the node is removed, its kind changes, or it becomes unreachable from the
//! pass root. Instances hold per-node render state: cached geometry and,
//! for effects, off-screen framebuffers.
//!
//! Scheduling and execution are free functions over a [`PassContext`] so an
//! instance can recurse into its children while the arena is borrowed. An
//! instance is taken out of its slot for the duration of its own call and put
//! back afterwards.

mod blur;
mod crossfade;
mod group;
mod surface;

use alloc::vec::Vec;

use veneer_core::backend::Backend;
use veneer_core::geometry::Rect;
use veneer_core::region::Region;
use veneer_core::scene::{NodeClass, NodeId, NodeKind, SceneStore};
use veneer_core::surface::SurfaceSource;
use veneer_core::target::RenderTarget;
use veneer_core::trace::{
    EffectFallbackEvent, FallbackReason, InstanceEvent, InstanceLifecycle, Tracer,
};

use self::blur::BlurInstance;
use self::crossfade::CrossfadeInstance;
use self::group::GroupInstance;
use self::surface::SurfaceInstance;
use crate::instruction::RenderInstruction;

/// Fully transparent premultiplied color.
pub(crate) const TRANSPARENT: [f32; 4] = [0.0; 4];

/// Per-node render state.
#[derive(Debug)]
pub(crate) enum Instance {
    Group(GroupInstance),
    Surface(SurfaceInstance),
    Blur(BlurInstance),
    Crossfade(CrossfadeInstance),
}

impl Instance {
    fn create(ctx: &mut PassContext<'_, '_>, node: NodeId, target: &RenderTarget) -> Self {
        let store = ctx.store;
        match store.kind(node) {
            NodeKind::Group => Self::Group(GroupInstance::default()),
            NodeKind::Surface(s) => Self::Surface(SurfaceInstance::new(*s)),
            NodeKind::Blur(provider) => Self::Blur(BlurInstance::new(provider.clone())),
            NodeKind::Crossfade(provider) => Self::Crossfade(CrossfadeInstance::new(
                ctx,
                node,
                provider.clone(),
                target,
            )),
        }
    }

    pub(crate) fn class(&self) -> NodeClass {
        match self {
            Self::Group(_) => NodeClass::Group,
            Self::Surface(_) => NodeClass::Surface,
            Self::Blur(_) => NodeClass::Blur,
            Self::Crossfade(_) => NodeClass::Crossfade,
        }
    }

    /// Bounding box computed by the most recent schedule.
    pub(crate) fn last_bbox(&self) -> Rect {
        match self {
            Self::Group(i) => i.last_bbox,
            Self::Surface(i) => i.last_bbox,
            Self::Blur(i) => i.last_bbox,
            Self::Crossfade(i) => i.last_bbox,
        }
    }

    fn schedule(
        &mut self,
        ctx: &mut PassContext<'_, '_>,
        node: NodeId,
        target: &RenderTarget,
        damage: &mut Region,
        out: &mut Vec<RenderInstruction>,
    ) {
        match self {
            Self::Group(i) => i.schedule(ctx, node, target, damage, out),
            Self::Surface(i) => i.schedule(ctx, node, target, damage, out),
            Self::Blur(i) => i.schedule(ctx, node, target, damage, out),
            Self::Crossfade(i) => i.schedule(ctx, node, target, damage, out),
        }
    }

    fn render(&mut self, ctx: &mut PassContext<'_, '_>, instruction: &RenderInstruction) {
        match self {
            // Groups never emit instructions.
            Self::Group(_) => {}
            Self::Surface(i) => i.render(ctx, instruction),
            Self::Blur(i) => i.render(ctx, instruction),
            Self::Crossfade(i) => i.render(ctx, instruction),
        }
    }

    fn release(&mut self, backend: &mut dyn Backend) {
        match self {
            Self::Group(_) | Self::Surface(_) => {}
            Self::Blur(i) => i.release(backend),
            Self::Crossfade(i) => i.release(backend),
        }
    }
}

// ---------------------------------------------------------------------------
// Arena
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Slot {
    generation: u32,
    /// `None` while the instance is taken out for a call.
    instance: Option<Instance>,
}

/// Instances indexed by node slot.
#[derive(Debug, Default)]
pub(crate) struct InstanceArena {
    slots: Vec<Option<Slot>>,
}

impl InstanceArena {
    /// Returns `true` if `node` has an instance.
    pub(crate) fn contains(&self, node: NodeId) -> bool {
        matches!(
            self.slots.get(node.index() as usize),
            Some(Some(slot)) if slot.generation == node.generation()
        )
    }

    /// Number of live instances.
    pub(crate) fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Slot indices and generations of all live instances.
    pub(crate) fn live(&self) -> Vec<(u32, u32)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| {
                let slot = slot.as_ref()?;
                Some((u32::try_from(idx).ok()?, slot.generation))
            })
            .collect()
    }

    /// Bounding box of `node`'s instance from its last schedule.
    pub(crate) fn last_bbox(&self, node: NodeId) -> Option<Rect> {
        let slot = self.slots.get(node.index() as usize)?.as_ref()?;
        if slot.generation != node.generation() {
            return None;
        }
        slot.instance.as_ref().map(Instance::last_bbox)
    }

    fn take(&mut self, node: NodeId) -> Option<Instance> {
        let slot = self.slots.get_mut(node.index() as usize)?.as_mut()?;
        if slot.generation != node.generation() {
            return None;
        }
        slot.instance.take()
    }

    fn restore(&mut self, node: NodeId, instance: Instance) {
        let idx = node.index() as usize;
        if self.slots.len() <= idx {
            self.slots.resize_with(idx + 1, || None);
        }
        self.slots[idx] = Some(Slot {
            generation: node.generation(),
            instance: Some(instance),
        });
    }

    /// Removes the instance in slot `idx` (any generation) and releases its
    /// resources.
    ///
    /// Returns the class and last bounding box of the destroyed instance.
    pub(crate) fn destroy(
        &mut self,
        idx: u32,
        backend: &mut dyn Backend,
        tracer: &mut Tracer<'_>,
        frame_index: u64,
    ) -> Option<(NodeClass, Rect)> {
        let slot = self.slots.get_mut(idx as usize)?.take()?;
        let mut instance = slot.instance?;
        instance.release(backend);
        let class = instance.class();
        log::debug!("destroyed {} instance in slot {idx}", class.name());
        tracer.instance(&InstanceEvent {
            frame_index,
            node_index: idx,
            class,
            lifecycle: InstanceLifecycle::Destroyed,
        });
        Some((class, instance.last_bbox()))
    }
}

// ---------------------------------------------------------------------------
// Pass context
// ---------------------------------------------------------------------------

/// Everything an instance may touch during a pass.
pub(crate) struct PassContext<'a, 't> {
    pub(crate) store: &'a SceneStore,
    pub(crate) surfaces: &'a dyn SurfaceSource,
    pub(crate) backend: &'a mut dyn Backend,
    pub(crate) arena: &'a mut InstanceArena,
    pub(crate) tracer: Tracer<'t>,
    pub(crate) frame_index: u64,
    /// Effects that rendered without their effect this pass.
    pub(crate) fallbacks: u32,
}

impl PassContext<'_, '_> {
    /// Records that `node` degraded to rendering without its effect.
    pub(crate) fn fallback(&mut self, node: NodeId, class: NodeClass, reason: FallbackReason) {
        self.fallbacks += 1;
        self.tracer.effect_fallback(&EffectFallbackEvent {
            frame_index: self.frame_index,
            node_index: node.index(),
            class,
            reason,
        });
    }
}

/// Creates `node`'s instance now if it has none.
///
/// Crossfades capture their snapshot at creation, so this pins the snapshot
/// to the current surface content.
pub(crate) fn prepare_node(ctx: &mut PassContext<'_, '_>, node: NodeId, target: &RenderTarget) {
    let instance = take_or_create(ctx, node, target);
    ctx.arena.restore(node, instance);
}

/// Schedules `node` for `target`, creating its instance on first use.
///
/// `damage` is the damage seen by `node`'s siblings behind it; instances may
/// grow it. Instructions are appended front to back.
pub(crate) fn schedule_node(
    ctx: &mut PassContext<'_, '_>,
    node: NodeId,
    target: &RenderTarget,
    damage: &mut Region,
    out: &mut Vec<RenderInstruction>,
) {
    let mut instance = take_or_create(ctx, node, target);
    instance.schedule(ctx, node, target, damage, out);
    ctx.arena.restore(node, instance);
}

fn take_or_create(ctx: &mut PassContext<'_, '_>, node: NodeId, target: &RenderTarget) -> Instance {
    if let Some(instance) = ctx.arena.take(node) {
        return instance;
    }
    // A slot left by a previous occupant is released before reuse.
    let _ = ctx
        .arena
        .destroy(node.index(), ctx.backend, &mut ctx.tracer, ctx.frame_index);
    let instance = Instance::create(ctx, node, target);
    log::debug!("created {} instance for {node:?}", instance.class().name());
    ctx.tracer.instance(&InstanceEvent {
        frame_index: ctx.frame_index,
        node_index: node.index(),
        class: instance.class(),
        lifecycle: InstanceLifecycle::Created,
    });
    instance
}

/// Schedules the children of `node`, topmost first.
pub(crate) fn schedule_children(
    ctx: &mut PassContext<'_, '_>,
    node: NodeId,
    target: &RenderTarget,
    damage: &mut Region,
    out: &mut Vec<RenderInstruction>,
) {
    let store = ctx.store;
    for child in store.children(node).rev() {
        schedule_node(ctx, child, target, damage, out);
    }
}

/// Runs `instructions` in order.
pub(crate) fn execute_list(ctx: &mut PassContext<'_, '_>, instructions: &[RenderInstruction]) {
    for instruction in instructions {
        let Some(mut instance) = ctx.arena.take(instruction.node) else {
            log::debug!(
                "skipping instruction for {:?}: instance is gone",
                instruction.node
            );
            continue;
        };
        instance.render(ctx, instruction);
        ctx.arena.restore(instruction.node, instance);
    }
}

/// Returns `true` if any rectangle of `region` overlaps `rect`.
pub(crate) fn touches(region: &Region, rect: Rect) -> bool {
    region.iter().any(|r| r.intersects(rect))
}
