// Copyright 2025 the Protomark Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rendering entry points.

use alloc::vec::Vec;

use crate::build::Builder;
use crate::error::Error;
use crate::mark::{MarkId, Vis};
use crate::scene::Scene;

/// Consumes finalized scenes.
///
/// Renderers receive the root scene; child scenes are reachable through
/// [`Instance::children`](crate::Instance::children). A renderer is only called after a build
/// fully succeeded.
pub trait Renderer {
    /// Draws (or redraws) from `scene`.
    fn update(&mut self, scene: &Scene);
}

impl<F: FnMut(&Scene)> Renderer for F {
    fn update(&mut self, scene: &Scene) {
        self(scene);
    }
}

impl Vis {
    /// Binds and builds every mark, then hands the new scene to `renderer`.
    ///
    /// On failure the previous scene is kept and the renderer is not called.
    pub fn render(&mut self, renderer: &mut dyn Renderer) -> Result<(), Error> {
        let scene = Builder::new(self).build_root()?;
        tracing::debug!(instances = scene.len(), "rendered root");
        self.scene = Some(scene);
        if let Some(scene) = &self.scene {
            renderer.update(scene);
        }
        Ok(())
    }

    /// Rebuilds the scenes of `mark` (and its descendants) under every visible instance of its
    /// enclosing panels, keeping the rest of the last rendered scene.
    ///
    /// Falls back to a full render for the root or when nothing was rendered yet.
    pub fn render_mark(&mut self, mark: MarkId, renderer: &mut dyn Renderer) -> Result<(), Error> {
        let Some(current) = self.scene.as_ref() else {
            return self.render(renderer);
        };
        if mark == self.root() {
            return self.render(renderer);
        }
        let lineage = self.lineage(mark)?;
        if lineage.first() != Some(&self.root()) {
            return Err(Error::MissingScene { mark });
        }
        let mut rebuilt = Vec::new();
        Builder::new(self).rebuild_under(
            current,
            &lineage[1..],
            None,
            &mut Vec::new(),
            &mut rebuilt,
        )?;

        let mut child_indices = Vec::with_capacity(lineage.len() - 1);
        for &m in &lineage[1..] {
            child_indices.push(self.mark(m)?.child_index());
        }
        let mut next = current.clone();
        for (indices, scene) in rebuilt {
            splice(&mut next, &indices, &child_indices, scene).ok_or(Error::MissingScene { mark })?;
        }
        tracing::debug!(?mark, "re-rendered mark");
        self.scene = Some(next);
        if let Some(scene) = &self.scene {
            renderer.update(scene);
        }
        Ok(())
    }
}

/// Replaces the scene reached by following `indices` (instance per level) and `child_indices`
/// (child slot per level).
fn splice(root: &mut Scene, indices: &[usize], child_indices: &[usize], scene: Scene) -> Option<()> {
    let mut current = root;
    let last = indices.len().checked_sub(1)?;
    for (level, (&i, &ci)) in indices.iter().zip(child_indices).enumerate() {
        let children = &mut current.instances.get_mut(i)?.children;
        if level == last {
            match ci.cmp(&children.len()) {
                core::cmp::Ordering::Less => children[ci] = scene,
                core::cmp::Ordering::Equal => children.push(scene),
                core::cmp::Ordering::Greater => return None,
            }
            return Some(());
        }
        current = children.get_mut(ci)?;
    }
    None
}
