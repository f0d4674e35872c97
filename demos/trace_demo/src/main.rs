// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Software-rendered compositor loop that exercises damage tracking, effects
//! and the diagnostics pipeline.
//!
//! Renders 48 frames of a small desktop: a gradient wallpaper, a frosted
//! panel with a blur behind it and a window sliding across the screen. Halfway
//! through, the panel crossfades to a new color while growing back to its
//! full size. Events go to both a [`PrettyPrintSink`] on stdout and a
//! [`RecorderSink`], which is then exported as `trace.json`.
//!
//! Set `RUST_LOG=debug` to see instance lifecycle logging.

use std::fs::File;
use std::io::BufWriter;
use std::rc::Rc;

use veneer_core::backend::Backend;
use veneer_core::effect::{CrossfadeState, SharedBlurRadius};
use veneer_core::geometry::{Point, Rect};
use veneer_core::region::Region;
use veneer_core::scene::{NodeKind, SceneStore, SurfaceId};
use veneer_core::target::RenderTarget;
use veneer_core::trace::{
    DamageRect, EffectFallbackEvent, InstanceEvent, InstructionRecord, PassBeginEvent,
    PassEndEvent, PhaseBeginEvent, PhaseEndEvent, TraceSink, Tracer,
};
use veneer_debug::pretty::PrettyPrintSink;
use veneer_debug::recorder::RecorderSink;
use veneer_render::effects::{add_blur, start_crossfade};
use veneer_render::{DirectScanout, PassConfig, Renderer};
use veneer_soft::{Pixmap, Rgba8, SoftBackend, SoftSurfaces};

const FRAME_COUNT: u64 = 48;
const SCREEN: Rect = Rect::new(0, 0, 160, 100);
const SCALE: f64 = 2.0;
const PANEL_RECT: Rect = Rect::new(40, 20, 80, 50);

const WALLPAPER: SurfaceId = SurfaceId(1);
const PANEL: SurfaceId = SurfaceId(2);
const WINDOW: SurfaceId = SurfaceId(3);

const CROSSFADE_START: u64 = 16;
const CROSSFADE_FRAMES: u64 = 20;

/// Forwards every event to two sinks.
struct Tee<'a> {
    a: &'a mut dyn TraceSink,
    b: &'a mut dyn TraceSink,
}

impl TraceSink for Tee<'_> {
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        self.a.on_pass_begin(e);
        self.b.on_pass_begin(e);
    }

    fn on_pass_end(&mut self, e: &PassEndEvent) {
        self.a.on_pass_end(e);
        self.b.on_pass_end(e);
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.a.on_phase_begin(e);
        self.b.on_phase_begin(e);
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.a.on_phase_end(e);
        self.b.on_phase_end(e);
    }

    fn on_instance(&mut self, e: &InstanceEvent) {
        self.a.on_instance(e);
        self.b.on_instance(e);
    }

    fn on_effect_fallback(&mut self, e: &EffectFallbackEvent) {
        self.a.on_effect_fallback(e);
        self.b.on_effect_fallback(e);
    }

    fn on_instructions(&mut self, frame_index: u64, instructions: &[InstructionRecord]) {
        self.a.on_instructions(frame_index, instructions);
        self.b.on_instructions(frame_index, instructions);
    }

    fn on_damage_rects(&mut self, frame_index: u64, rects: &[DamageRect]) {
        self.a.on_damage_rects(frame_index, rects);
        self.b.on_damage_rects(frame_index, rects);
    }
}

fn wallpaper() -> Pixmap {
    let mut pixmap = Pixmap::new(160, 100);
    for y in 0..100 {
        let shade = u8::try_from(60 + y).unwrap_or(u8::MAX);
        pixmap.fill_rect(Rect::new(0, y, 160, 1), Rgba8::new(20, shade / 2, shade, 255));
    }
    for x in (0..160).step_by(20) {
        pixmap.fill_rect(Rect::new(x, 0, 2, 100), Rgba8::new(200, 200, 180, 255));
    }
    pixmap
}

fn main() {
    env_logger::init();

    // -- surfaces and backend ----------------------------------------------
    let surfaces = SoftSurfaces::new();
    surfaces.insert(WALLPAPER, Point::ZERO, wallpaper());
    surfaces.insert_solid(PANEL, PANEL_RECT, Rgba8::new(30, 30, 30, 96));
    surfaces.insert_solid(WINDOW, Rect::new(0, 70, 30, 20), Rgba8::new(180, 60, 40, 255));

    let mut backend = SoftBackend::new(surfaces.clone());
    let output = backend
        .allocate(320, 200)
        .expect("failed to allocate output framebuffer");
    let target = RenderTarget::new(output, SCREEN, SCALE);

    // -- scene -------------------------------------------------------------
    let mut store = SceneStore::new();
    let root = store.create_node(NodeKind::Group);
    let wallpaper_node = store.create_surface(WALLPAPER);
    let panel_node = store.create_surface(PANEL);
    let window_node = store.create_surface(WINDOW);
    store.add_child(root, wallpaper_node);
    store.add_child(root, panel_node);
    store.add_child(root, window_node);
    let radius = Rc::new(SharedBlurRadius::new(6.0));
    let blur_node = add_blur(&mut store, panel_node, radius.clone());

    // -- sinks -------------------------------------------------------------
    let mut pretty = PrettyPrintSink::new(Box::new(std::io::stdout()));
    let mut recorder = RecorderSink::new();

    let mut renderer = Renderer::new(PassConfig::new());
    let mut crossfade: Option<Rc<CrossfadeState>> = None;

    for frame_index in 0..FRAME_COUNT {
        // 1. Slide the window.
        let x = i32::try_from(frame_index * 3).unwrap_or(0);
        let damage = surfaces.set_position(WINDOW, Point::new(x, 70));
        store.damage(window_node, &damage);

        // 2. Breathe the blur radius.
        if frame_index % 8 == 0 {
            let r = if frame_index % 16 == 0 { 6.0 } else { 10.0 };
            radius.set(r);
            store.damage(blur_node, &Region::from_rect(PANEL_RECT));
        }

        // 3. Crossfade the panel to a new color.
        if frame_index == CROSSFADE_START {
            let state = Rc::new(CrossfadeState::new(PANEL_RECT.to_kurbo()));
            start_crossfade(
                &mut renderer,
                &mut store,
                &surfaces,
                &mut backend,
                &target,
                panel_node,
                state.clone(),
            );
            let damage = surfaces.paint(
                PANEL,
                Rect::new(0, 0, 80, 50),
                Rgba8::new(20, 50, 90, 128),
            );
            store.damage(panel_node, &damage);
            crossfade = Some(state);
        }
        let finished = crossfade.as_ref().is_some_and(|state| {
            let elapsed = frame_index - CROSSFADE_START;
            if elapsed >= CROSSFADE_FRAMES {
                state.finish();
                return true;
            }
            let progress = elapsed as f64 / CROSSFADE_FRAMES as f64;
            // The new panel content grows out of a shrunken box.
            let shrink = 12.0 * (1.0 - progress);
            state.update(progress, PANEL_RECT.to_kurbo().inset(-shrink));
            false
        });
        if finished {
            crossfade = None;
        }

        // 4. Render.
        let mut tee = Tee {
            a: &mut pretty,
            b: &mut recorder,
        };
        let stats = renderer.render_frame(
            &mut store,
            &surfaces,
            &mut backend,
            root,
            &target,
            &mut Tracer::new(&mut tee),
        );
        let counters = backend.take_stats();
        log::info!(
            "frame {frame_index}: {} instructions, {} px damage, {} blurs, {} blits",
            stats.instructions,
            stats.damage_area,
            counters.blurs,
            counters.blits,
        );
    }

    match renderer.try_scanout(&store, &surfaces, root, &target) {
        DirectScanout::Success(surface) => println!("scanout possible for {surface:?}"),
        DirectScanout::Occlusion | DirectScanout::Skip => println!("scanout not possible"),
    }

    renderer.destroy_all(&mut backend, &mut Tracer::none());
    backend.release(output);
    println!(
        "{} framebuffers left after teardown",
        backend.live_framebuffers()
    );

    // -- export Chrome trace -----------------------------------------------
    let path = "trace.json";
    let file = File::create(path).expect("failed to create trace.json");
    let mut writer = BufWriter::new(file);
    veneer_debug::chrome::export(recorder.as_bytes(), &mut writer)
        .expect("failed to write Chrome trace");

    println!("Wrote {path} ({FRAME_COUNT} frames)");
}
