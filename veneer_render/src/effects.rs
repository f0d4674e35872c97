// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Attaching and detaching effects on scene nodes.

use alloc::rc::Rc;

use veneer_core::backend::Backend;
use veneer_core::effect::{BlurProvider, CrossfadeProvider};
use veneer_core::scene::{NodeId, NodeKind, SceneStore, TransformerKind};
use veneer_core::surface::SurfaceSource;
use veneer_core::target::RenderTarget;
use veneer_core::trace::Tracer;

use crate::renderer::Renderer;

/// Blurs whatever is behind `node`. Returns the blur transformer.
///
/// If `node` already has a blur, it is kept and returned unchanged.
pub fn add_blur(store: &mut SceneStore, node: NodeId, provider: Rc<dyn BlurProvider>) -> NodeId {
    if let Some(existing) = store.find_transformer(node, TransformerKind::Blur) {
        return existing;
    }
    store.wrap(node, NodeKind::Blur(provider))
}

/// Removes the blur above `node`. Returns `false` if there was none.
pub fn remove_blur(store: &mut SceneStore, node: NodeId) -> bool {
    match store.find_transformer(node, TransformerKind::Blur) {
        Some(blur) => {
            store.unwrap(blur);
            true
        }
        None => false,
    }
}

/// Starts a crossfade from the current content of `node` to whatever it
/// shows next. Returns the crossfade transformer.
///
/// The snapshot is taken immediately, so call this before the surface
/// changes. A crossfade already running on `node` is replaced. The node is
/// unwrapped again by [`Renderer::retire_finished_effects`] once `provider`
/// stops running.
pub fn start_crossfade(
    renderer: &mut Renderer,
    store: &mut SceneStore,
    surfaces: &dyn SurfaceSource,
    backend: &mut dyn Backend,
    target: &RenderTarget,
    node: NodeId,
    provider: Rc<dyn CrossfadeProvider>,
) -> NodeId {
    if let Some(existing) = store.find_transformer(node, TransformerKind::Crossfade) {
        log::debug!("replacing crossfade {existing:?}");
        store.unwrap(existing);
    }
    let crossfade = store.wrap(node, NodeKind::Crossfade(provider));
    renderer.prepare_instance(
        store,
        surfaces,
        backend,
        crossfade,
        target,
        &mut Tracer::none(),
    );
    crossfade
}
