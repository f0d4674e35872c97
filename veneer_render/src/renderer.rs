// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The pass driver.
//!
//! A [`Renderer`] owns the render instances of one scene and turns scene
//! changes plus accumulated damage into backend calls. A full frame
//! ([`Renderer::render_frame`]) runs four phases:
//!
//! 1. **Retire**: unwrap crossfades that finished or lost their content.
//! 2. **Sync**: commit the scene, destroy instances of removed or changed
//!    nodes, and turn changes into damage.
//! 3. **Schedule**: expand the pass damage by the largest blur padding, then
//!    walk the tree front to back building the instruction list.
//! 4. **Execute**: clear the pass damage to the background and run the list.
//!
//! [`schedule`](Renderer::schedule) and [`execute`](Renderer::execute) are
//! also exposed on their own for callers that manage damage themselves.

use alloc::vec::Vec;

use veneer_core::backend::Backend;
use veneer_core::region::Region;
use veneer_core::scene::{NodeId, NodeKind, SceneChanges, SceneStore};
use veneer_core::surface::SurfaceSource;
use veneer_core::target::RenderTarget;
#[cfg(feature = "trace-rich")]
use veneer_core::trace::{DamageRect, InstructionRecord};
use veneer_core::trace::{
    PassBeginEvent, PassEndEvent, PhaseBeginEvent, PhaseEndEvent, PhaseKind, Tracer,
};

use crate::bounds;
use crate::instance::{InstanceArena, PassContext, execute_list, prepare_node, schedule_node};
use crate::instruction::RenderInstruction;
use crate::registry::EffectRegistry;
use crate::scanout::{self, DirectScanout};

/// Pass-level settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PassConfig {
    /// Premultiplied color the pass damage is cleared to before drawing.
    pub background: [f32; 4],
    /// Whether [`Renderer::try_scanout`] may report success.
    pub allow_direct_scanout: bool,
    /// Whether pass damage is grown by the largest blur padding.
    pub expand_pass_damage: bool,
}

impl PassConfig {
    /// Opaque black background, scanout allowed, damage expansion on.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            background: [0.0, 0.0, 0.0, 1.0],
            allow_direct_scanout: true,
            expand_pass_damage: true,
        }
    }

    /// Like [`new`](Self::new) but without pass damage expansion.
    ///
    /// Blurred edges next to undamaged areas come out wrong; useful to see
    /// exactly what each blur redraws.
    #[must_use]
    pub const fn debug_no_effects_padding() -> Self {
        Self {
            expand_pass_damage: false,
            ..Self::new()
        }
    }
}

impl Default for PassConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary of one [`Renderer::render_frame`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Pass counter of the frame.
    pub frame_index: u64,
    /// Top-level instructions executed.
    pub instructions: u32,
    /// Logical pixels redrawn, including the area effects grew the pass
    /// damage by.
    pub damage_area: i64,
    /// Effects that rendered without their effect.
    pub fallbacks: u32,
    /// Padding the pass damage was grown by.
    pub padding: i32,
}

/// Render driver for one scene.
#[derive(Debug)]
pub struct Renderer {
    config: PassConfig,
    arena: InstanceArena,
    registry: EffectRegistry,
    changes: SceneChanges,
    pending_damage: Region,
    frame_index: u64,
    fallbacks: u32,
    last_target: Option<RenderTarget>,
    last_root: Option<NodeId>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(PassConfig::default())
    }
}

impl Renderer {
    /// Creates a renderer with no instances.
    #[must_use]
    pub fn new(config: PassConfig) -> Self {
        Self {
            config,
            arena: InstanceArena::default(),
            registry: EffectRegistry::new(),
            changes: SceneChanges::default(),
            pending_damage: Region::new(),
            frame_index: 0,
            fallbacks: 0,
            last_target: None,
            last_root: None,
        }
    }

    /// The pass configuration.
    #[must_use]
    pub fn config(&self) -> &PassConfig {
        &self.config
    }

    /// Replaces the pass configuration.
    pub fn set_config(&mut self, config: PassConfig) {
        self.config = config;
    }

    /// Index of the next frame.
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Number of live render instances.
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.arena.len()
    }

    /// Returns `true` if `node` currently has a render instance.
    #[must_use]
    pub fn has_instance(&self, node: NodeId) -> bool {
        self.arena.contains(node)
    }

    /// The effect registry as of the last sync.
    #[must_use]
    pub fn registry(&self) -> &EffectRegistry {
        &self.registry
    }

    /// Damage accumulated for the next frame.
    #[must_use]
    pub fn pending_damage(&self) -> &Region {
        &self.pending_damage
    }

    /// Adds logical damage to the next frame.
    pub fn add_damage(&mut self, region: &Region) {
        self.pending_damage.union_with(region);
    }

    /// Applies committed scene changes.
    ///
    /// Instances of removed nodes and nodes whose kind changed are destroyed
    /// and their last bounding boxes damaged. Moved nodes damage their old
    /// and new boxes. When the topology changed, the effect registry is
    /// rebuilt and instances no longer reachable from `root` are destroyed.
    pub fn sync(
        &mut self,
        store: &SceneStore,
        changes: &SceneChanges,
        surfaces: &dyn SurfaceSource,
        backend: &mut dyn Backend,
        root: NodeId,
        target: &RenderTarget,
        tracer: &mut Tracer<'_>,
    ) {
        let frame_index = self.frame_index;

        for &idx in &changes.removed {
            // The slot may already hold a fresh instance for a reused index.
            if store.node_at(idx).is_some_and(|n| self.arena.contains(n)) {
                continue;
            }
            if let Some((_, bbox)) = self.arena.destroy(idx, backend, tracer, frame_index) {
                self.pending_damage.union_rect(bbox);
            }
        }

        for &idx in &changes.kind_changed {
            if let Some((_, bbox)) = self.arena.destroy(idx, backend, tracer, frame_index) {
                self.pending_damage.union_rect(bbox);
            }
            if let Some(node) = store.node_at(idx) {
                self.pending_damage
                    .union_rect(bounds::bounding_box(store, surfaces, node, target.scale));
            }
        }

        for &idx in &changes.restructured {
            let Some(node) = store.node_at(idx) else {
                continue;
            };
            if let Some(bbox) = self.arena.last_bbox(node) {
                self.pending_damage.union_rect(bbox);
            }
            self.pending_damage
                .union_rect(bounds::bounding_box(store, surfaces, node, target.scale));
        }

        for (idx, region) in &changes.damage {
            if store.node_at(*idx).is_some() {
                self.pending_damage.union_with(region);
            }
        }

        let root_changed = self.last_root != Some(root);
        if changes.topology_changed || !changes.kind_changed.is_empty() || root_changed {
            self.registry.rebuild(store, root);
            self.destroy_unreachable(store, backend, root, tracer);
            self.last_root = Some(root);
        }
    }

    fn destroy_unreachable(
        &mut self,
        store: &SceneStore,
        backend: &mut dyn Backend,
        root: NodeId,
        tracer: &mut Tracer<'_>,
    ) {
        for (idx, generation) in self.arena.live() {
            let reachable = store
                .node_at(idx)
                .is_some_and(|n| n.generation() == generation && store.is_descendant_of(n, root));
            if !reachable {
                if let Some((_, bbox)) = self.arena.destroy(idx, backend, tracer, self.frame_index)
                {
                    self.pending_damage.union_rect(bbox);
                }
            }
        }
    }

    /// Damages every crossfade for this frame and unwraps those whose
    /// animation finished or whose surface lost its content. Returns how many
    /// were removed.
    ///
    /// A crossfade's area is the union of its last drawn box and its current
    /// box, so a moving or shrinking displayed geometry leaves no trail.
    /// Unwrapped instances are destroyed by the next [`sync`](Self::sync).
    pub fn retire_finished_effects(
        &mut self,
        store: &mut SceneStore,
        surfaces: &dyn SurfaceSource,
    ) -> usize {
        let scale = self.last_target.map_or(1.0, |t| t.scale);
        let mut retired = 0;
        for node in self.registry.crossfade_nodes().to_vec() {
            if !store.is_alive(node) {
                continue;
            }
            let NodeKind::Crossfade(provider) = store.kind(node) else {
                continue;
            };
            let has_content = bounds::first_surface(store, node)
                .and_then(|s| surfaces.bounding_box(s))
                .is_some();
            let running = provider.is_running();

            let mut area = bounds::bounding_box(store, surfaces, node, scale);
            if let Some(bbox) = self.arena.last_bbox(node) {
                area = area.union_bounds(bbox);
            }
            self.pending_damage.union_rect(area);
            if running && has_content {
                continue;
            }

            log::debug!("retiring crossfade {node:?}");
            store.unwrap(node);
            retired += 1;
        }
        retired
    }

    /// Largest padding any live blur needs at `scale`.
    #[must_use]
    pub fn pass_padding(&self, store: &SceneStore, scale: f64) -> i32 {
        if self.config.expand_pass_damage {
            self.registry.max_padding(store, scale)
        } else {
            0
        }
    }

    /// Builds the instruction list for `damage` on `target`, back to front.
    ///
    /// `damage` is used as given; pass-level expansion is the caller's job
    /// (see [`render_frame`](Self::render_frame)). On return it also holds
    /// the area effects grew it by, which is everything the instructions may
    /// touch.
    pub fn schedule(
        &mut self,
        store: &SceneStore,
        surfaces: &dyn SurfaceSource,
        backend: &mut dyn Backend,
        root: NodeId,
        target: &RenderTarget,
        damage: &mut Region,
        tracer: &mut Tracer<'_>,
    ) -> Vec<RenderInstruction> {
        let mut out = Vec::new();
        if damage.is_empty() {
            return out;
        }
        let mut ctx = PassContext {
            store,
            surfaces,
            backend,
            arena: &mut self.arena,
            tracer: tracer.reborrow(),
            frame_index: self.frame_index,
            fallbacks: 0,
        };
        schedule_node(&mut ctx, root, target, damage, &mut out);
        self.fallbacks += ctx.fallbacks;
        out.reverse();
        out
    }

    /// Runs a scheduled instruction list.
    pub fn execute(
        &mut self,
        store: &SceneStore,
        surfaces: &dyn SurfaceSource,
        backend: &mut dyn Backend,
        instructions: &[RenderInstruction],
        tracer: &mut Tracer<'_>,
    ) {
        let mut ctx = PassContext {
            store,
            surfaces,
            backend,
            arena: &mut self.arena,
            tracer: tracer.reborrow(),
            frame_index: self.frame_index,
            fallbacks: 0,
        };
        execute_list(&mut ctx, instructions);
        self.fallbacks += ctx.fallbacks;
    }

    /// Renders one frame of the tree below `root` into `target`.
    ///
    /// The first frame, and any frame whose target differs from the
    /// previous one, redraws the whole target.
    pub fn render_frame(
        &mut self,
        store: &mut SceneStore,
        surfaces: &dyn SurfaceSource,
        backend: &mut dyn Backend,
        root: NodeId,
        target: &RenderTarget,
        tracer: &mut Tracer<'_>,
    ) -> FrameStats {
        let frame_index = self.frame_index;
        self.fallbacks = 0;
        if self.last_target != Some(*target) {
            self.pending_damage.union_rect(target.geometry);
            self.last_target = Some(*target);
        }

        tracer.phase_begin(&PhaseBeginEvent {
            frame_index,
            phase: PhaseKind::Retire,
        });
        self.retire_finished_effects(store, surfaces);
        tracer.phase_end(&PhaseEndEvent {
            frame_index,
            phase: PhaseKind::Retire,
        });

        tracer.phase_begin(&PhaseBeginEvent {
            frame_index,
            phase: PhaseKind::Sync,
        });
        let mut changes = core::mem::take(&mut self.changes);
        store.commit_into(&mut changes);
        self.sync(store, &changes, surfaces, backend, root, target, tracer);
        self.changes = changes;
        tracer.phase_end(&PhaseEndEvent {
            frame_index,
            phase: PhaseKind::Sync,
        });

        let padding = self.pass_padding(store, target.scale);
        let mut damage = core::mem::take(&mut self.pending_damage);
        damage.expand_edges(padding);
        damage.clip_to(target.geometry);

        tracer.pass_begin(&PassBeginEvent {
            frame_index,
            framebuffer: target.framebuffer,
            damage_rects: u32::try_from(damage.len()).unwrap_or(u32::MAX),
            damage_area: damage.area(),
            padding,
        });
        #[cfg(feature = "trace-rich")]
        {
            let rects: Vec<DamageRect> = damage.iter().map(|r| DamageRect::from(*r)).collect();
            tracer.damage_rects(frame_index, &rects);
        }

        tracer.phase_begin(&PhaseBeginEvent {
            frame_index,
            phase: PhaseKind::Schedule,
        });
        let instructions =
            self.schedule(store, surfaces, backend, root, target, &mut damage, tracer);
        damage.clip_to(target.geometry);
        tracer.phase_end(&PhaseEndEvent {
            frame_index,
            phase: PhaseKind::Schedule,
        });
        #[cfg(feature = "trace-rich")]
        {
            let records: Vec<InstructionRecord> = instructions
                .iter()
                .map(|i| InstructionRecord {
                    node_index: i.node.index(),
                    class: store.class(i.node),
                    bounds: DamageRect::from(i.damage.bounding_box()),
                    rects: u32::try_from(i.damage.len()).unwrap_or(u32::MAX),
                })
                .collect();
            tracer.instructions(frame_index, &records);
        }

        tracer.phase_begin(&PhaseBeginEvent {
            frame_index,
            phase: PhaseKind::Execute,
        });
        if !damage.is_empty() {
            backend.clear(target, &damage, self.config.background);
            self.execute(store, surfaces, backend, &instructions, tracer);
        }
        tracer.phase_end(&PhaseEndEvent {
            frame_index,
            phase: PhaseKind::Execute,
        });

        let stats = FrameStats {
            frame_index,
            instructions: u32::try_from(instructions.len()).unwrap_or(u32::MAX),
            damage_area: damage.area(),
            fallbacks: self.fallbacks,
            padding,
        };
        tracer.pass_end(&PassEndEvent {
            frame_index,
            instructions: stats.instructions,
            fallbacks: stats.fallbacks,
        });
        log::trace!("frame {frame_index}: {stats:?}");
        self.frame_index += 1;
        stats
    }

    /// Creates `node`'s render instance now instead of at its first
    /// schedule.
    pub fn prepare_instance(
        &mut self,
        store: &SceneStore,
        surfaces: &dyn SurfaceSource,
        backend: &mut dyn Backend,
        node: NodeId,
        target: &RenderTarget,
        tracer: &mut Tracer<'_>,
    ) {
        let mut ctx = PassContext {
            store,
            surfaces,
            backend,
            arena: &mut self.arena,
            tracer: tracer.reborrow(),
            frame_index: self.frame_index,
            fallbacks: 0,
        };
        prepare_node(&mut ctx, node, target);
    }

    /// Checks whether the tree below `root` can be scanned out directly.
    ///
    /// Always [`DirectScanout::Occlusion`] when scanout is disabled in the
    /// config.
    #[must_use]
    pub fn try_scanout(
        &self,
        store: &SceneStore,
        surfaces: &dyn SurfaceSource,
        root: NodeId,
        target: &RenderTarget,
    ) -> DirectScanout {
        if !self.config.allow_direct_scanout {
            return DirectScanout::Occlusion;
        }
        scanout::try_scanout(store, surfaces, root, target)
    }

    /// Destroys every instance and releases its resources.
    pub fn destroy_all(&mut self, backend: &mut dyn Backend, tracer: &mut Tracer<'_>) {
        for (idx, _) in self.arena.live() {
            let _ = self.arena.destroy(idx, backend, tracer, self.frame_index);
        }
        self.last_target = None;
        self.last_root = None;
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec;
    use alloc::vec::Vec;

    use veneer_core::backend::FramebufferId;
    use veneer_core::effect::{CrossfadeState, SharedBlurRadius, crossfade_alpha};
    use veneer_core::geometry::Rect;
    use veneer_core::scene::SurfaceId;

    use super::*;
    use crate::effects::{add_blur, remove_blur, start_crossfade};
    use crate::testing::{Call, FakeSurfaces, RecordingBackend};

    const OUTPUT: FramebufferId = RecordingBackend::OUTPUT;

    fn target(scale: f64) -> RenderTarget {
        RenderTarget::new(OUTPUT, Rect::new(0, 0, 200, 200), scale)
    }

    /// A root group holding one surface.
    fn scene(
        surfaces: &mut FakeSurfaces,
        bbox: Rect,
        opaque: Option<Region>,
    ) -> (SceneStore, NodeId, NodeId) {
        surfaces.insert(SurfaceId(1), bbox, opaque);
        let mut store = SceneStore::new();
        let root = store.create_node(NodeKind::Group);
        let surface = store.create_surface(SurfaceId(1));
        store.add_child(root, surface);
        (store, root, surface)
    }

    fn kinds(calls: &[Call]) -> Vec<&'static str> {
        calls
            .iter()
            .map(|c| match c {
                Call::Allocate { .. } => "allocate",
                Call::Release(_) => "release",
                Call::Clear { .. } => "clear",
                Call::Blit { .. } => "blit",
                Call::DrawTexture { .. } => "draw_texture",
                Call::RenderSurface { .. } => "render_surface",
                Call::Blur { .. } => "blur",
            })
            .collect()
    }

    fn schedule(
        renderer: &mut Renderer,
        store: &SceneStore,
        surfaces: &FakeSurfaces,
        backend: &mut RecordingBackend,
        root: NodeId,
        target: &RenderTarget,
        damage: Rect,
    ) -> Vec<RenderInstruction> {
        renderer.schedule(
            store,
            surfaces,
            backend,
            root,
            target,
            &mut Region::from_rect(damage),
            &mut Tracer::none(),
        )
    }

    #[test]
    fn single_surface_full_damage() {
        let mut surfaces = FakeSurfaces::default();
        let (store, root, surface) = scene(&mut surfaces, Rect::new(0, 0, 100, 100), None);
        let mut backend = RecordingBackend::new();
        let mut renderer = Renderer::default();

        let list = schedule(
            &mut renderer,
            &store,
            &surfaces,
            &mut backend,
            root,
            &target(1.0),
            Rect::new(0, 0, 100, 100),
        );
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].node, surface);
        assert_eq!(list[0].damage.rects(), &[Rect::new(0, 0, 100, 100)]);
    }

    #[test]
    fn empty_damage_schedules_nothing() {
        let mut surfaces = FakeSurfaces::default();
        let (mut store, root, surface) = scene(&mut surfaces, Rect::new(0, 0, 100, 100), None);
        let blur = store.wrap(surface, NodeKind::Blur(Rc::new(SharedBlurRadius::new(8.0))));
        let crossfade = store.wrap(
            blur,
            NodeKind::Crossfade(Rc::new(CrossfadeState::new(kurbo::Rect::new(
                0.0, 0.0, 100.0, 100.0,
            )))),
        );
        let mut backend = RecordingBackend::new();
        let mut renderer = Renderer::default();

        for node in [root, surface, blur, crossfade] {
            let list = renderer.schedule(
                &store,
                &surfaces,
                &mut backend,
                node,
                &target(1.0),
                &mut Region::new(),
                &mut Tracer::none(),
            );
            assert!(list.is_empty(), "{node:?} scheduled work for empty damage");
        }
        for node in [root, surface, blur] {
            let list = schedule(
                &mut renderer,
                &store,
                &surfaces,
                &mut backend,
                node,
                &target(1.0),
                Rect::new(150, 150, 10, 10),
            );
            assert!(list.is_empty(), "{node:?} scheduled work outside its box");
        }
    }

    #[test]
    fn blur_grows_damage_by_padding() {
        let mut surfaces = FakeSurfaces::default();
        let (mut store, root, surface) = scene(&mut surfaces, Rect::new(20, 20, 100, 100), None);
        let blur = add_blur(&mut store, surface, Rc::new(SharedBlurRadius::new(10.0)));
        let mut backend = RecordingBackend::new();
        let mut renderer = Renderer::default();

        // radius 10 at scale 2 is 5 logical pixels of padding.
        let list = schedule(
            &mut renderer,
            &store,
            &surfaces,
            &mut backend,
            root,
            &target(2.0),
            Rect::new(40, 40, 20, 20),
        );
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].node, blur);
        assert_eq!(list[0].damage.rects(), &[Rect::new(35, 35, 30, 30)]);

        let ring = Region::from_rect(Rect::new(35, 35, 30, 30))
            .subtract(&Region::from_rect(Rect::new(40, 40, 20, 20)));
        let physical = target(2.0).framebuffer_region_from_geometry_region(&ring);
        let blits = backend.blits();
        assert_eq!(blits.len(), 1);
        assert_eq!(blits[0].0, OUTPUT);
        assert_eq!(blits[0].2, physical);
    }

    #[test]
    fn blur_saves_padding_ring_outside_original_damage() {
        let mut surfaces = FakeSurfaces::default();
        let (mut store, root, surface) = scene(&mut surfaces, Rect::new(0, 0, 100, 100), None);
        add_blur(&mut store, surface, Rc::new(SharedBlurRadius::new(8.0)));
        let mut backend = RecordingBackend::new();
        let mut renderer = Renderer::default();

        let list = schedule(
            &mut renderer,
            &store,
            &surfaces,
            &mut backend,
            root,
            &target(1.0),
            Rect::new(0, 0, 100, 100),
        );
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].damage.rects(), &[Rect::new(0, 0, 108, 108)]);

        let expected = Region::from_rect(Rect::new(0, 0, 108, 108))
            .subtract(&Region::from_rect(Rect::new(0, 0, 100, 100)));
        let blits = backend.blits();
        assert_eq!(blits.len(), 1);
        assert_eq!(blits[0].2, expected);
    }

    #[test]
    fn opaque_child_skips_blur() {
        let mut surfaces = FakeSurfaces::default();
        let (mut store, root, surface) = scene(
            &mut surfaces,
            Rect::new(20, 20, 100, 100),
            Some(Region::from_rect(Rect::new(0, 0, 100, 100))),
        );
        add_blur(&mut store, surface, Rc::new(SharedBlurRadius::new(10.0)));
        let mut backend = RecordingBackend::new();
        let mut renderer = Renderer::default();

        let list = schedule(
            &mut renderer,
            &store,
            &surfaces,
            &mut backend,
            root,
            &target(1.0),
            Rect::new(40, 40, 20, 20),
        );
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].node, surface);
        assert_eq!(list[0].damage.rects(), &[Rect::new(40, 40, 20, 20)]);
        assert!(backend.calls.is_empty());
    }

    #[test]
    fn blur_execution_order() {
        let mut surfaces = FakeSurfaces::default();
        let (mut store, root, surface) = scene(&mut surfaces, Rect::new(20, 20, 100, 100), None);
        add_blur(&mut store, surface, Rc::new(SharedBlurRadius::new(10.0)));
        let mut backend = RecordingBackend::new();
        let mut renderer = Renderer::default();

        let list = schedule(
            &mut renderer,
            &store,
            &surfaces,
            &mut backend,
            root,
            &target(1.0),
            Rect::new(40, 40, 20, 20),
        );
        renderer.execute(&store, &surfaces, &mut backend, &list, &mut Tracer::none());

        assert_eq!(
            kinds(&backend.calls),
            vec![
                "allocate",
                "allocate",
                "blit",
                "clear",
                "render_surface",
                "blur",
                "draw_texture",
                "blit",
            ]
        );
        assert_eq!(backend.blurs(), vec![Region::from_rect(Rect::new(30, 30, 40, 40))]);

        // Saved pixels go back to where they came from.
        let blits = backend.blits();
        assert_eq!((blits[1].0, blits[1].1), (blits[0].1, blits[0].0));
        assert_eq!(blits[1].2, blits[0].2);
    }

    #[test]
    fn first_frame_redraws_whole_target() {
        let mut surfaces = FakeSurfaces::default();
        let (mut store, root, _) = scene(&mut surfaces, Rect::new(0, 0, 100, 100), None);
        let mut backend = RecordingBackend::new();
        let mut renderer = Renderer::default();
        let target = target(1.0);

        let stats = renderer.render_frame(

            &mut store,

            &surfaces,

            &mut backend,

            root,

            &target,

            &mut Tracer::none(),

        );
        assert_eq!(stats.frame_index, 0);
        assert_eq!(stats.damage_area, 200 * 200);
        assert_eq!(stats.instructions, 1);
        assert_eq!(
            backend.calls[0],
            Call::Clear {
                framebuffer: OUTPUT,
                region: Region::from_rect(target.geometry),
                color: PassConfig::default().background,
            }
        );

        let stats = renderer.render_frame(

            &mut store,

            &surfaces,

            &mut backend,

            root,

            &target,

            &mut Tracer::none(),

        );
        assert_eq!(stats.frame_index, 1);
        assert_eq!(stats.damage_area, 0);
        assert_eq!(stats.instructions, 0);
    }

    #[test]
    fn pass_damage_grows_by_largest_padding() {
        let mut surfaces = FakeSurfaces::default();
        let (mut store, root, surface) = scene(&mut surfaces, Rect::new(0, 0, 100, 100), None);
        add_blur(&mut store, surface, Rc::new(SharedBlurRadius::new(6.0)));
        let mut backend = RecordingBackend::new();
        let mut renderer = Renderer::default();
        let target = target(1.0);
        renderer.render_frame(
            &mut store,
            &surfaces,
            &mut backend,
            root,
            &target,
            &mut Tracer::none(),
        );

        store.damage(surface, &Region::from_rect(Rect::new(50, 50, 10, 10)));
        let stats = renderer.render_frame(
            &mut store,
            &surfaces,
            &mut backend,
            root,
            &target,
            &mut Tracer::none(),
        );
        // 10x10 grown by the pass padding to 22x22, then by the blur to
        // 34x34.
        assert_eq!(stats.padding, 6);
        assert_eq!(stats.damage_area, 34 * 34);

        renderer.set_config(PassConfig::debug_no_effects_padding());
        store.damage(surface, &Region::from_rect(Rect::new(50, 50, 10, 10)));
        let stats = renderer.render_frame(
            &mut store,
            &surfaces,
            &mut backend,
            root,
            &target,
            &mut Tracer::none(),
        );
        assert_eq!(stats.padding, 0);
        assert_eq!(stats.damage_area, 22 * 22);
    }

    #[test]
    fn allocation_failure_renders_unblurred() {
        let mut surfaces = FakeSurfaces::default();
        let (mut store, root, surface) = scene(&mut surfaces, Rect::new(0, 0, 100, 100), None);
        add_blur(&mut store, surface, Rc::new(SharedBlurRadius::new(8.0)));
        let mut backend = RecordingBackend::new();
        backend.fail_allocations = true;
        let mut renderer = Renderer::default();

        let stats = renderer.render_frame(
            &mut store,
            &surfaces,
            &mut backend,
            root,
            &target(1.0),
            &mut Tracer::none(),
        );
        assert_eq!(stats.fallbacks, 1);
        assert_eq!(stats.instructions, 1);
        assert!(backend.blurs().is_empty());
        assert!(backend.calls.iter().any(|c| matches!(
            c,
            Call::RenderSurface { framebuffer, .. } if *framebuffer == OUTPUT
        )));
    }

    #[test]
    fn failed_save_renders_unblurred() {
        let mut surfaces = FakeSurfaces::default();
        let (mut store, root, surface) = scene(&mut surfaces, Rect::new(0, 0, 100, 100), None);
        add_blur(&mut store, surface, Rc::new(SharedBlurRadius::new(8.0)));
        let mut backend = RecordingBackend::new();
        let mut renderer = Renderer::default();
        let target = target(1.0);
        renderer.render_frame(
            &mut store,
            &surfaces,
            &mut backend,
            root,
            &target,
            &mut Tracer::none(),
        );
        let blurs = backend.blurs().len();

        backend.fail_blits = true;
        store.damage(surface, &Region::from_rect(Rect::new(40, 40, 20, 20)));
        let stats = renderer.render_frame(
            &mut store,
            &surfaces,
            &mut backend,
            root,
            &target,
            &mut Tracer::none(),
        );
        assert_eq!(stats.fallbacks, 1);
        assert_eq!(backend.blurs().len(), blurs);
    }

    #[test]
    fn removing_blur_releases_buffers() {
        let mut surfaces = FakeSurfaces::default();
        let (mut store, root, surface) = scene(&mut surfaces, Rect::new(0, 0, 100, 100), None);
        let blur = add_blur(&mut store, surface, Rc::new(SharedBlurRadius::new(8.0)));
        assert_eq!(
            add_blur(&mut store, surface, Rc::new(SharedBlurRadius::new(2.0))),
            blur
        );
        let mut backend = RecordingBackend::new();
        let mut renderer = Renderer::default();
        let target = target(1.0);

        renderer.render_frame(

            &mut store,

            &surfaces,

            &mut backend,

            root,

            &target,

            &mut Tracer::none(),

        );
        assert_eq!(backend.live_framebuffers(), 2);
        assert_eq!(renderer.instance_count(), 3);

        assert!(remove_blur(&mut store, surface));
        assert!(!remove_blur(&mut store, surface));
        let stats = renderer.render_frame(
            &mut store,
            &surfaces,
            &mut backend,
            root,
            &target,
            &mut Tracer::none(),
        );
        assert_eq!(backend.live_framebuffers(), 0);
        assert_eq!(renderer.instance_count(), 2);
        assert_eq!(store.parent(surface), Some(root));
        // The area the blur covered is redrawn without it.
        assert_eq!(stats.damage_area, 108 * 108);
    }

    #[test]
    fn crossfade_lifecycle() {
        let mut surfaces = FakeSurfaces::default();
        let (mut store, root, surface) = scene(&mut surfaces, Rect::new(0, 0, 50, 50), None);
        let mut backend = RecordingBackend::new();
        let mut renderer = Renderer::default();
        let target = target(1.0);
        renderer.render_frame(
            &mut store,
            &surfaces,
            &mut backend,
            root,
            &target,
            &mut Tracer::none(),
        );
        backend.calls.clear();

        let state = Rc::new(CrossfadeState::new(kurbo::Rect::new(0.0, 0.0, 50.0, 50.0)));
        let crossfade = start_crossfade(
            &mut renderer,
            &mut store,
            &surfaces,
            &mut backend,
            &target,
            surface,
            state.clone(),
        );
        assert!(renderer.has_instance(crossfade));
        let snapshot = match backend.calls.as_slice() {
            [
                Call::Allocate {
                    framebuffer,
                    width: 50,
                    height: 50,
                },
                Call::Clear { .. },
                Call::RenderSurface {
                    framebuffer: into, ..
                },
            ] if into == framebuffer => *framebuffer,
            calls => panic!("unexpected snapshot calls: {calls:?}"),
        };
        backend.calls.clear();

        // The window grows while the snapshot fades out.
        surfaces.insert(SurfaceId(1), Rect::new(0, 0, 80, 80), None);
        state.update(0.5, kurbo::Rect::new(0.0, 0.0, 80.0, 80.0));
        store.damage(surface, &Region::from_rect(Rect::new(0, 0, 80, 80)));
        let stats = renderer.render_frame(
            &mut store,
            &surfaces,
            &mut backend,
            root,
            &target,
            &mut Tracer::none(),
        );
        // The live surface is drawn through the inner buffer inside the
        // crossfade's own instruction.
        assert_eq!(stats.instructions, 1);
        assert_eq!(
            kinds(&backend.calls),
            vec![
                "allocate",
                "clear",
                "clear",
                "render_surface",
                "draw_texture",
                "draw_texture",
            ]
        );
        let Call::Allocate {
            framebuffer: inner, ..
        } = backend.calls[0]
        else {
            panic!("expected the inner buffer allocation first");
        };
        assert!(matches!(
            backend.calls[3],
            Call::RenderSurface { framebuffer, .. } if framebuffer == inner
        ));
        assert!(matches!(
            backend.calls[4],
            Call::DrawTexture { texture, opacity, .. } if texture == inner && opacity == 1.0
        ));
        assert!(matches!(
            backend.calls[5],
            Call::DrawTexture { texture, opacity, .. } if texture == snapshot && opacity == 0.5
        ));
        assert_eq!(backend.live_framebuffers(), 2);

        state.finish();
        let stats = renderer.render_frame(
            &mut store,
            &surfaces,
            &mut backend,
            root,
            &target,
            &mut Tracer::none(),
        );
        assert!(!store.is_alive(crossfade));
        assert_eq!(store.parent(surface), Some(root));
        assert_eq!(backend.live_framebuffers(), 0);
        assert_eq!(stats.instructions, 1);
    }

    /// A crossfade over a 50x50 surface, after its first frame.
    fn running_crossfade(
        surfaces: &mut FakeSurfaces,
        backend: &mut RecordingBackend,
        renderer: &mut Renderer,
    ) -> (SceneStore, NodeId, Rc<CrossfadeState>) {
        let (mut store, root, surface) = scene(surfaces, Rect::new(0, 0, 50, 50), None);
        let target = target(1.0);
        let state = Rc::new(CrossfadeState::new(kurbo::Rect::new(0.0, 0.0, 50.0, 50.0)));
        start_crossfade(
            renderer,
            &mut store,
            surfaces,
            backend,
            &target,
            surface,
            state.clone(),
        );
        renderer.render_frame(
            &mut store,
            surfaces,
            backend,
            root,
            &target,
            &mut Tracer::none(),
        );
        backend.calls.clear();
        (store, root, state)
    }

    fn snapshot_opacities(calls: &[Call], snapshot: FramebufferId) -> Vec<f32> {
        calls
            .iter()
            .filter_map(|c| match c {
                Call::DrawTexture {
                    texture, opacity, ..
                } if *texture == snapshot => Some(*opacity),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn crossfade_progress_alone_redraws() {
        let mut surfaces = FakeSurfaces::default();
        let mut backend = RecordingBackend::new();
        let mut renderer = Renderer::default();
        let (mut store, root, state) =
            running_crossfade(&mut surfaces, &mut backend, &mut renderer);
        // The snapshot was the first buffer allocated.
        let snapshot = FramebufferId(1);

        state.update(0.25, kurbo::Rect::new(0.0, 0.0, 50.0, 50.0));
        let stats = renderer.render_frame(
            &mut store,
            &surfaces,
            &mut backend,
            root,
            &target(1.0),
            &mut Tracer::none(),
        );
        assert_eq!(stats.instructions, 1);
        assert_eq!(stats.damage_area, 50 * 50);
        let opacities = snapshot_opacities(&backend.calls, snapshot);
        assert_eq!(opacities.len(), 1, "one snapshot draw, got {opacities:?}");
        let expected = 1.0 - crossfade_alpha(0.25);
        assert!(
            (f64::from(opacities[0]) - expected).abs() < 1e-6,
            "opacity {} for progress 0.25",
            opacities[0]
        );
    }

    #[test]
    fn shrinking_crossfade_redraws_old_box() {
        let mut surfaces = FakeSurfaces::default();
        let mut backend = RecordingBackend::new();
        let mut renderer = Renderer::default();
        let (mut store, root, state) =
            running_crossfade(&mut surfaces, &mut backend, &mut renderer);
        let target = target(1.0);

        state.update(0.5, kurbo::Rect::new(0.0, 0.0, 80.0, 80.0));
        renderer.render_frame(
            &mut store,
            &surfaces,
            &mut backend,
            root,
            &target,
            &mut Tracer::none(),
        );
        backend.calls.clear();

        // Only the provider changes; the 80x80 box it covered is redrawn.
        state.update(0.7, kurbo::Rect::new(0.0, 0.0, 30.0, 30.0));
        let stats = renderer.render_frame(
            &mut store,
            &surfaces,
            &mut backend,
            root,
            &target,
            &mut Tracer::none(),
        );
        assert_eq!(stats.damage_area, 80 * 80);
        assert_eq!(
            backend.calls[0],
            Call::Clear {
                framebuffer: OUTPUT,
                region: Region::from_rect(Rect::new(0, 0, 80, 80)),
                color: PassConfig::default().background,
            }
        );
        // Both layers follow the displayed geometry.
        let geometries: Vec<kurbo::Rect> = backend
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::DrawTexture { geometry, .. } => Some(*geometry),
                _ => None,
            })
            .collect();
        assert_eq!(
            geometries,
            vec![kurbo::Rect::new(0.0, 0.0, 30.0, 30.0); 2]
        );
    }

    #[test]
    fn crossfade_without_inner_buffer_draws_child_unscaled() {
        let mut surfaces = FakeSurfaces::default();
        let (mut store, root, surface) = scene(&mut surfaces, Rect::new(0, 0, 50, 50), None);
        let mut backend = RecordingBackend::new();
        let mut renderer = Renderer::default();
        let target = target(1.0);
        let state = Rc::new(CrossfadeState::new(kurbo::Rect::new(0.0, 0.0, 50.0, 50.0)));
        start_crossfade(
            &mut renderer,
            &mut store,
            &surfaces,
            &mut backend,
            &target,
            surface,
            state,
        );
        backend.calls.clear();
        backend.fail_allocations = true;

        let stats = renderer.render_frame(
            &mut store,
            &surfaces,
            &mut backend,
            root,
            &target,
            &mut Tracer::none(),
        );
        assert_eq!(stats.fallbacks, 1);
        assert_eq!(stats.instructions, 2);
        // The child draws first, straight into the output, then the snapshot.
        assert_eq!(
            kinds(&backend.calls),
            vec!["clear", "render_surface", "draw_texture"]
        );
        assert!(matches!(
            backend.calls[1],
            Call::RenderSurface { framebuffer, .. } if framebuffer == OUTPUT
        ));
    }

    #[test]
    fn crossfade_retires_when_surface_disappears() {
        let mut surfaces = FakeSurfaces::default();
        let (mut store, root, surface) = scene(&mut surfaces, Rect::new(0, 0, 50, 50), None);
        let mut backend = RecordingBackend::new();
        let mut renderer = Renderer::default();
        let target = target(1.0);

        let state = Rc::new(CrossfadeState::new(kurbo::Rect::new(0.0, 0.0, 50.0, 50.0)));
        let crossfade = start_crossfade(
            &mut renderer,
            &mut store,
            &surfaces,
            &mut backend,
            &target,
            surface,
            state,
        );
        renderer.render_frame(
            &mut store,
            &surfaces,
            &mut backend,
            root,
            &target,
            &mut Tracer::none(),
        );
        assert!(store.is_alive(crossfade));

        surfaces.remove(SurfaceId(1));
        renderer.render_frame(
            &mut store,
            &surfaces,
            &mut backend,
            root,
            &target,
            &mut Tracer::none(),
        );
        assert!(!store.is_alive(crossfade));
        assert_eq!(backend.live_framebuffers(), 0);
    }

    #[test]
    fn replacing_crossfade_releases_old_snapshot() {
        let mut surfaces = FakeSurfaces::default();
        let (mut store, root, surface) = scene(&mut surfaces, Rect::new(0, 0, 50, 50), None);
        let mut backend = RecordingBackend::new();
        let mut renderer = Renderer::default();
        let target = target(1.0);
        let geometry = kurbo::Rect::new(0.0, 0.0, 50.0, 50.0);

        start_crossfade(
            &mut renderer,
            &mut store,
            &surfaces,
            &mut backend,
            &target,
            surface,
            Rc::new(CrossfadeState::new(geometry)),
        );
        let second = start_crossfade(
            &mut renderer,
            &mut store,
            &surfaces,
            &mut backend,
            &target,
            surface,
            Rc::new(CrossfadeState::new(geometry)),
        );
        assert_eq!(backend.live_framebuffers(), 1);

        renderer.render_frame(

            &mut store,

            &surfaces,

            &mut backend,

            root,

            &target,

            &mut Tracer::none(),

        );
        assert!(renderer.has_instance(second));
        assert_eq!(backend.live_framebuffers(), 1);
        assert_eq!(store.parent(surface), Some(second));
    }

    #[test]
    fn detached_subtree_instances_are_destroyed() {
        let mut surfaces = FakeSurfaces::default();
        let (mut store, root, surface) = scene(&mut surfaces, Rect::new(0, 0, 100, 100), None);
        add_blur(&mut store, surface, Rc::new(SharedBlurRadius::new(8.0)));
        let mut backend = RecordingBackend::new();
        let mut renderer = Renderer::default();
        let target = target(1.0);
        renderer.render_frame(
            &mut store,
            &surfaces,
            &mut backend,
            root,
            &target,
            &mut Tracer::none(),
        );

        let top = store.chain_top(surface);
        store.remove_from_parent(top);
        renderer.render_frame(
            &mut store,
            &surfaces,
            &mut backend,
            root,
            &target,
            &mut Tracer::none(),
        );
        assert_eq!(renderer.instance_count(), 1);
        assert_eq!(backend.live_framebuffers(), 0);
        assert!(renderer.registry().blur_nodes().is_empty());
    }

    #[test]
    fn scanout_respects_config() {
        let mut surfaces = FakeSurfaces::default();
        let (store, root, _) = scene(
            &mut surfaces,
            Rect::new(0, 0, 200, 200),
            Some(Region::from_rect(Rect::new(0, 0, 200, 200))),
        );
        let mut renderer = Renderer::default();
        assert_eq!(
            renderer.try_scanout(&store, &surfaces, root, &target(1.0)),
            DirectScanout::Success(SurfaceId(1))
        );
        renderer.set_config(PassConfig {
            allow_direct_scanout: false,
            ..PassConfig::default()
        });
        assert_eq!(
            renderer.try_scanout(&store, &surfaces, root, &target(1.0)),
            DirectScanout::Occlusion
        );
    }

    #[test]
    fn destroy_all_releases_everything() {
        let mut surfaces = FakeSurfaces::default();
        let (mut store, root, surface) = scene(&mut surfaces, Rect::new(0, 0, 100, 100), None);
        add_blur(&mut store, surface, Rc::new(SharedBlurRadius::new(8.0)));
        let mut backend = RecordingBackend::new();
        let mut renderer = Renderer::default();
        renderer.render_frame(
            &mut store,
            &surfaces,
            &mut backend,
            root,
            &target(1.0),
            &mut Tracer::none(),
        );

        renderer.destroy_all(&mut backend, &mut Tracer::none());
        assert_eq!(renderer.instance_count(), 0);
        assert_eq!(backend.live_framebuffers(), 0);
    }
}
