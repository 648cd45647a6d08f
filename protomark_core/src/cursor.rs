// Copyright 2025 the Protomark Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Addressing built instances.

use alloc::vec::Vec;

use kurbo::Point;
use smallvec::SmallVec;

use crate::error::Error;
use crate::mark::{MarkId, Vis};
use crate::scene::{Instance, Scene};
use crate::transform::Transform;
use crate::value::Value;

/// Root-to-target list of `(mark, instance index)` pairs addressing one built instance.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct InstancePath(SmallVec<[(MarkId, usize); 4]>);

impl InstancePath {
    /// A path to instance `index` of the root panel.
    pub fn root(vis: &Vis, index: usize) -> Self {
        let mut steps = SmallVec::new();
        steps.push((vis.root(), index));
        Self(steps)
    }

    /// Extends the path to instance `index` of the child `mark`.
    #[must_use]
    pub fn child(mut self, mark: MarkId, index: usize) -> Self {
        self.0.push((mark, index));
        self
    }

    /// The path of the enclosing panel instance.
    pub fn parent(&self) -> Option<Self> {
        if self.0.len() <= 1 {
            return None;
        }
        let mut steps = self.0.clone();
        steps.pop();
        Some(Self(steps))
    }

    /// The addressed `(mark, index)`.
    pub fn last(&self) -> Option<(MarkId, usize)> {
        self.0.last().copied()
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the path is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The steps, root first.
    pub fn steps(&self) -> &[(MarkId, usize)] {
        &self.0
    }
}

impl FromIterator<(MarkId, usize)> for InstancePath {
    fn from_iter<I: IntoIterator<Item = (MarkId, usize)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Clone, Copy, Debug)]
struct Level<'a> {
    mark: MarkId,
    index: usize,
    scene: &'a Scene,
    instance: &'a Instance,
}

/// A resolved instance path: the instance, its scene and every enclosing panel instance.
#[derive(Clone, Debug)]
pub struct Cursor<'a> {
    vis: &'a Vis,
    levels: SmallVec<[Level<'a>; 4]>,
}

impl<'a> Cursor<'a> {
    fn here(&self) -> Level<'a> {
        // Resolution guarantees at least one level.
        self.levels[self.levels.len() - 1]
    }

    /// The visualization.
    pub fn vis(&self) -> &'a Vis {
        self.vis
    }

    /// The addressed mark.
    pub fn mark(&self) -> MarkId {
        self.here().mark
    }

    /// The addressed instance index.
    pub fn index(&self) -> usize {
        self.here().index
    }

    /// The scene containing the instance.
    pub fn scene(&self) -> &'a Scene {
        self.here().scene
    }

    /// The addressed instance.
    pub fn instance(&self) -> &'a Instance {
        self.here().instance
    }

    /// The instance's datum.
    pub fn datum(&self) -> &'a Value {
        &self.here().instance.data
    }

    /// The data stack, innermost first.
    pub fn stack(&self) -> impl Iterator<Item = &'a Value> + '_ {
        self.levels.iter().rev().map(|l| &l.instance.data)
    }

    /// The datum `depth` levels up the stack.
    pub fn data(&self, depth: usize) -> Value {
        self.stack().nth(depth).cloned().unwrap_or_default()
    }

    /// A computed property of the instance.
    pub fn get(&self, name: &str) -> Value {
        self.instance().get(name)
    }

    /// [`Cursor::get`] as a number.
    pub fn number(&self, name: &str) -> Option<f64> {
        self.instance().number(name)
    }

    /// The current value of a def of the instance's scene.
    pub fn def(&self, name: &str) -> Value {
        self.scene().def(name).cloned().unwrap_or_default()
    }

    /// A computed property of the enclosing panel instance.
    pub fn parent(&self, name: &str) -> Value {
        let n = self.levels.len();
        if n < 2 {
            return Value::Null;
        }
        self.levels[n - 2].instance.get(name)
    }

    /// The path of the instance.
    pub fn path(&self) -> InstancePath {
        self.levels.iter().map(|l| (l.mark, l.index)).collect()
    }

    /// Accumulated scale of the enclosing panel transforms.
    pub fn scale(&self) -> f64 {
        self.here().scene.scale
    }

    /// Maps local coordinates of the instance's panel to canvas coordinates.
    ///
    /// The panel is the instance itself for panels, else its parent. Each panel from the root
    /// down contributes its `left`/`top` offset followed by its `transform`.
    pub fn to_canvas(&self) -> Transform {
        let own_panel = self
            .vis
            .mark(self.mark())
            .is_ok_and(|m| m.ty().is_panel());
        let n = self.levels.len() - usize::from(!own_panel);
        self.levels[..n].iter().fold(Transform::IDENTITY, |t, l| {
            let s = l.instance;
            let offset = Transform::translate(
                s.number("left").unwrap_or(0.0),
                s.number("top").unwrap_or(0.0),
            );
            let own = s.get("transform").as_transform().unwrap_or_default();
            t.then_inner(offset).then_inner(own)
        })
    }

    /// Converts a canvas point into the local coordinates of the instance's panel.
    pub fn mouse(&self, canvas: Point) -> Point {
        self.to_canvas().invert().apply(canvas)
    }
}

impl Vis {
    fn resolve(&self, path: &InstancePath) -> Result<Cursor<'_>, Error> {
        let root = self.scene.as_ref().ok_or(Error::MissingScene { mark: self.root() })?;
        let mut levels: SmallVec<[Level<'_>; 4]> = SmallVec::new();
        for &(mark, index) in path.steps() {
            let scene = match levels.last().copied() {
                None if mark == self.root() => root,
                None => return Err(Error::InvalidPath),
                Some(up) => {
                    let m = self.mark(mark)?;
                    if m.parent() != Some(up.mark) {
                        return Err(Error::InvalidPath);
                    }
                    up.instance
                        .children
                        .get(m.child_index())
                        .ok_or(Error::MissingScene { mark })?
                }
            };
            let instance = scene.get(index).ok_or(Error::MissingInstance { mark, index })?;
            levels.push(Level {
                mark,
                index,
                scene,
                instance,
            });
        }
        if levels.is_empty() {
            return Err(Error::InvalidPath);
        }
        Ok(Cursor { vis: self, levels })
    }

    /// Resolves `path` against the last rendered scene and runs `f` with the resulting cursor.
    pub fn context<R>(
        &self,
        path: &InstancePath,
        f: impl FnOnce(&Cursor<'_>) -> R,
    ) -> Result<R, Error> {
        let cursor = self.resolve(path)?;
        Ok(f(&cursor))
    }

    /// The computed value of `name` for the instance at `path`.
    pub fn get(&self, path: &InstancePath, name: &str) -> Result<Value, Error> {
        self.context(path, |c| c.get(name))
    }

    /// Paths of every built instance of `mark`, in scene order.
    pub fn instances(&self, mark: MarkId) -> Result<Vec<InstancePath>, Error> {
        let lineage = self.lineage(mark)?;
        if lineage.first() != Some(&self.root()) {
            return Err(Error::MissingScene { mark });
        }
        let root = self.scene.as_ref().ok_or(Error::MissingScene { mark })?;
        let mut out = Vec::new();
        let mut prefix = InstancePath::default();
        self.collect_paths(root, &lineage, &mut prefix, &mut out)?;
        Ok(out)
    }

    fn collect_paths(
        &self,
        scene: &Scene,
        lineage: &[MarkId],
        prefix: &mut InstancePath,
        out: &mut Vec<InstancePath>,
    ) -> Result<(), Error> {
        let Some((&mark, rest)) = lineage.split_first() else {
            return Ok(());
        };
        for (i, inst) in scene.instances.iter().enumerate() {
            prefix.0.push((mark, i));
            match rest.first() {
                None => out.push(prefix.clone()),
                Some(&child) if inst.visible => {
                    if let Some(s) = inst.children.get(self.mark(child)?.child_index()) {
                        self.collect_paths(s, rest, prefix, out)?;
                    }
                }
                Some(_) => {}
            }
            prefix.0.pop();
        }
        Ok(())
    }

    /// The scene containing the instance addressed by `path`.
    pub(crate) fn scene_mut(&mut self, path: &InstancePath) -> Result<&mut Scene, Error> {
        let steps = path.steps();
        let mut child_indices: SmallVec<[usize; 4]> = SmallVec::new();
        for &(mark, _) in steps.iter().skip(1) {
            child_indices.push(self.mark(mark)?.child_index());
        }
        let (mark, _) = path.last().ok_or(Error::InvalidPath)?;
        let mut scene = self.scene.as_mut().ok_or(Error::MissingScene { mark })?;
        for (k, ci) in child_indices.into_iter().enumerate() {
            let (_, index) = steps[k];
            scene = scene
                .instances
                .get_mut(index)
                .and_then(|s| s.children.get_mut(ci))
                .ok_or(Error::MissingScene { mark })?;
        }
        Ok(scene)
    }
}
