// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node kinds.

use alloc::rc::Rc;
use core::fmt;

use super::id::SurfaceId;
use crate::effect::{BlurProvider, CrossfadeProvider};

/// What a scene node is.
///
/// The set is closed. [`Blur`](Self::Blur) and [`Crossfade`](Self::Crossfade)
/// are *transformers*: they wrap exactly one child subtree and carry a shared
/// provider that the render instance polls every frame.
#[derive(Clone)]
pub enum NodeKind {
    /// Inner node; its children are drawn back to front.
    Group,
    /// Leaf presenting a client surface.
    Surface(SurfaceId),
    /// Blurs whatever lies behind its child.
    Blur(Rc<dyn BlurProvider>),
    /// Blends a snapshot of earlier content over its child.
    Crossfade(Rc<dyn CrossfadeProvider>),
}

impl NodeKind {
    /// The payload-free class of this kind.
    #[must_use]
    pub fn class(&self) -> NodeClass {
        match self {
            Self::Group => NodeClass::Group,
            Self::Surface(_) => NodeClass::Surface,
            Self::Blur(_) => NodeClass::Blur,
            Self::Crossfade(_) => NodeClass::Crossfade,
        }
    }

    /// Returns `true` for kinds that wrap exactly one child.
    #[must_use]
    pub fn is_transformer(&self) -> bool {
        self.class().transformer().is_some()
    }
}

impl fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Group => f.write_str("Group"),
            Self::Surface(s) => f.debug_tuple("Surface").field(s).finish(),
            Self::Blur(p) => f
                .debug_struct("Blur")
                .field("radius", &p.blur_radius())
                .finish(),
            Self::Crossfade(p) => f
                .debug_struct("Crossfade")
                .field("progress", &p.progress())
                .field("running", &p.is_running())
                .finish(),
        }
    }
}

/// A [`NodeKind`] without its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeClass {
    /// See [`NodeKind::Group`].
    Group,
    /// See [`NodeKind::Surface`].
    Surface,
    /// See [`NodeKind::Blur`].
    Blur,
    /// See [`NodeKind::Crossfade`].
    Crossfade,
}

impl NodeClass {
    /// The transformer kind, if this class is one.
    #[must_use]
    pub const fn transformer(self) -> Option<TransformerKind> {
        match self {
            Self::Blur => Some(TransformerKind::Blur),
            Self::Crossfade => Some(TransformerKind::Crossfade),
            Self::Group | Self::Surface => None,
        }
    }

    /// Short lowercase name for diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Surface => "surface",
            Self::Blur => "blur",
            Self::Crossfade => "crossfade",
        }
    }
}

/// Transformer node kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransformerKind {
    /// See [`NodeKind::Blur`].
    Blur,
    /// See [`NodeKind::Crossfade`].
    Crossfade,
}

impl TransformerKind {
    /// Position in a transformer chain; smaller values sit closer to the
    /// wrapped content.
    #[must_use]
    pub const fn z_order(self) -> u32 {
        match self {
            Self::Crossfade => 1,
            Self::Blur => 1000,
        }
    }
}
