// Copyright 2025 the Protomark Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene building.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

use hashbrown::HashMap;

use crate::bind::{Binds, Bound, bind};
use crate::context::{Ctx, Frame, Tracker};
use crate::error::Error;
use crate::mark::{MarkId, Vis};
use crate::mark_type::MarkType;
use crate::scene::{DefState, Instance, Scene};
use crate::value::{IdKey, Value};

/// One build pass. Binds are computed lazily, once per mark per pass.
#[derive(Debug)]
pub(crate) struct Builder<'v> {
    vis: &'v Vis,
    binds: HashMap<MarkId, Binds>,
}

/// Per-scene inputs shared by every instance of the scene.
#[derive(Clone, Copy)]
struct SceneCtx<'a> {
    mark: MarkId,
    ty: &'a MarkType,
    frame: Option<&'a Frame<'a>>,
    old: Option<&'a Scene>,
    by_id: &'a HashMap<IdKey, usize>,
    defs: &'a HashMap<&'static str, DefState>,
    scale: f64,
}

impl<'v> Builder<'v> {
    pub(crate) fn new(vis: &'v Vis) -> Self {
        Self {
            vis,
            binds: HashMap::new(),
        }
    }

    /// Builds the scene of the root panel, reconciled against the last rendered one.
    pub(crate) fn build_root(&mut self) -> Result<Scene, Error> {
        let vis = self.vis;
        self.build_scene(vis.root(), None, vis.scene.as_ref(), 1.0)
    }

    /// Builds the scene of `mark` under `frame`.
    pub(crate) fn build_scene(
        &mut self,
        mark: MarkId,
        frame: Option<&Frame<'_>>,
        old: Option<&Scene>,
        scale: f64,
    ) -> Result<Scene, Error> {
        // Taken out of the cache while building so children can bind their own marks.
        let mut binds = match self.binds.remove(&mark) {
            Some(binds) => binds,
            None => bind(self.vis, mark)?,
        };
        let result = self.build_with(&mut binds, mark, frame, old, scale);
        self.binds.insert(mark, binds);
        result
    }

    fn build_with(
        &mut self,
        binds: &mut Binds,
        mark: MarkId,
        frame: Option<&Frame<'_>>,
        old: Option<&Scene>,
        scale: f64,
    ) -> Result<Scene, Error> {
        let ty = self.vis.mark(mark)?.ty().clone();
        let mut scene = Scene::new(mark, ty.name());
        scene.scale = scale;
        scene.shape = ty.shape_hook();
        if let Some(old) = old {
            scene.defs = old.defs.clone();
        }

        let base = Ctx {
            vis: self.vis,
            mark,
            name: "data",
            index: frame.map_or(0, |f| f.index),
            datum: None,
            instance: None,
            siblings: &[],
            frame,
            scale,
            chain: &[],
            defs: None,
            binds: None,
            tracker: None,
        };

        for def in &binds.defs {
            let stale = scene.defs.get(def.name()).is_none_or(|d| def.head().id > d.id);
            if stale {
                let value = eval(def, Ctx { name: def.name(), ..base })?;
                scene.defs.insert(def.name(), DefState { id: 0, value });
            }
        }

        let data = match &binds.data {
            Some(bound) => eval(
                bound,
                Ctx {
                    defs: Some(&scene.defs),
                    ..base
                },
            )?,
            None => Value::list([base.data(0)]),
        };
        let data: Rc<[Value]> = match data {
            Value::List(items) => items,
            Value::Null => Rc::from([]),
            other => Rc::from([other]),
        };

        let by_id: HashMap<IdKey, usize> = old
            .map(|o| {
                o.instances
                    .iter()
                    .enumerate()
                    .filter_map(|(i, s)| s.id.id_key().map(|k| (k, i)))
                    .collect()
            })
            .unwrap_or_default();

        let sc = SceneCtx {
            mark,
            ty: &ty,
            frame,
            old,
            by_id: &by_id,
            defs: &scene.defs,
            scale,
        };
        let mut instances = Vec::with_capacity(data.len());
        for (index, datum) in data.iter().enumerate() {
            let instance = self.build_instance(binds, sc, index, datum, &instances)?;
            instances.push(instance);
        }
        scene.instances = instances;

        tracing::debug!(
            ?mark,
            ty = ty.name(),
            instances = scene.instances.len(),
            "built scene",
        );
        Ok(scene)
    }

    fn build_instance(
        &mut self,
        binds: &mut Binds,
        sc: SceneCtx<'_>,
        index: usize,
        datum: &Value,
        siblings: &[Instance],
    ) -> Result<Instance, Error> {
        let mut instance = Instance::new(index, datum.clone());
        let id = match binds.required.iter().find(|b| b.name() == "id") {
            Some(bound) => eval(bound, self.instance_ctx(sc, index, &instance, siblings, bound))?,
            None => Value::Null,
        };
        let previous = match id.id_key() {
            Some(key) => sc
                .by_id
                .get(&key)
                .and_then(|&i| sc.old.and_then(|o| o.instances.get(i))),
            None => sc.old.and_then(|o| o.instances.get(index)),
        };
        if let Some(previous) = previous {
            instance = Instance::carry(previous, index, datum.clone());
        }
        instance.id = id;

        for bound in binds.required.iter().filter(|b| b.name() != "id") {
            let value = eval(bound, self.instance_ctx(sc, index, &instance, siblings, bound))?;
            instance.set(bound.name(), value);
        }

        if !instance.visible {
            instance.children.clear();
            return Ok(instance);
        }

        let track = self.vis.options.track_dependencies && !binds.tracked;
        self.eval_optional(binds, sc, &mut instance, siblings, track)?;
        binds.tracked = true;

        sc.ty.build_implied(&mut instance, sc.frame.map(|f| f.instance));

        if sc.ty.is_panel() {
            instance.children = self.build_children(sc, index, &instance, previous)?;
        }
        Ok(instance)
    }

    fn instance_ctx<'a>(
        &'a self,
        sc: SceneCtx<'a>,
        index: usize,
        instance: &'a Instance,
        siblings: &'a [Instance],
        bound: &'a Bound,
    ) -> Ctx<'a> {
        Ctx {
            vis: self.vis,
            mark: sc.mark,
            name: bound.name(),
            index,
            datum: Some(&instance.data),
            instance: Some(instance),
            siblings,
            frame: sc.frame,
            scale: sc.scale,
            chain: &[],
            defs: Some(sc.defs),
            binds: None,
            tracker: None,
        }
    }

    /// Evaluates optional properties in rank order.
    ///
    /// With tracking, a pass that read not-yet-evaluated properties re-ranks them and runs again
    /// until no such read happens (or a cycle is detected).
    fn eval_optional(
        &self,
        binds: &mut Binds,
        sc: SceneCtx<'_>,
        instance: &mut Instance,
        siblings: &[Instance],
        track: bool,
    ) -> Result<(), Error> {
        loop {
            let mut tracker = track.then(|| Tracker {
                pending: binds.optional.iter().map(Bound::name).collect(),
                edges: RefCell::default(),
            });
            for bound in &binds.optional {
                let name = bound.name();
                let value = if bound.kind().is_def() {
                    sc.defs.get(name).map(|d| d.value.clone()).unwrap_or_default()
                } else {
                    let ctx = Ctx {
                        binds: Some(&*binds),
                        tracker: tracker.as_ref(),
                        ..self.instance_ctx(sc, instance.index, instance, siblings, bound)
                    };
                    eval(bound, ctx)?
                };
                instance.set(name, value);
                if let Some(t) = tracker.as_mut() {
                    t.pending.remove(name);
                }
            }
            let Some(tracker) = tracker else {
                return Ok(());
            };
            let edges = tracker.edges.into_inner();
            if edges.is_empty() {
                return Ok(());
            }
            tracing::trace!(mark = ?sc.mark, reads = edges.len(), "out-of-order property reads");
            binds.update_net(&edges)?;
        }
    }

    fn build_children(
        &mut self,
        sc: SceneCtx<'_>,
        index: usize,
        instance: &Instance,
        previous: Option<&Instance>,
    ) -> Result<Vec<Scene>, Error> {
        let k = instance
            .get("transform")
            .as_transform()
            .map_or(1.0, |t| t.k);
        let child_ids = self.vis.mark(sc.mark)?.children().to_vec();
        let mut children: Vec<Scene> = Vec::with_capacity(child_ids.len());
        for (ci, &child) in child_ids.iter().enumerate() {
            let frame = Frame {
                mark: sc.mark,
                index,
                instance,
                children: &children,
                up: sc.frame,
            };
            let old = previous
                .and_then(|p| p.children.get(ci))
                .filter(|s| s.mark == child);
            let scene = self.build_scene(child, Some(&frame), old, sc.scale * k)?;
            children.push(scene);
        }
        Ok(children)
    }

    /// Rebuilds the scenes of `path.last()` under every visible instance of `scene`'s
    /// descendants along `path`, leaving everything else as it is.
    pub(crate) fn rebuild_under(
        &mut self,
        scene: &Scene,
        path: &[MarkId],
        frame: Option<&Frame<'_>>,
        indices: &mut Vec<usize>,
        out: &mut Vec<(Vec<usize>, Scene)>,
    ) -> Result<(), Error> {
        let Some((&child, rest)) = path.split_first() else {
            return Ok(());
        };
        let ci = self.vis.mark(child)?.child_index();
        for (i, inst) in scene.instances.iter().enumerate() {
            if !inst.visible {
                continue;
            }
            let k = inst.get("transform").as_transform().map_or(1.0, |t| t.k);
            let frame = Frame {
                mark: scene.mark,
                index: i,
                instance: inst,
                children: inst.children.get(..ci).unwrap_or(&inst.children[..]),
                up: frame,
            };
            indices.push(i);
            if rest.is_empty() {
                let rebuilt =
                    self.build_scene(child, Some(&frame), inst.children.get(ci), scene.scale * k)?;
                out.push((indices.clone(), rebuilt));
            } else {
                let child_scene = inst
                    .children
                    .get(ci)
                    .ok_or(Error::MissingScene { mark: child })?;
                self.rebuild_under(child_scene, rest, Some(&frame), indices, out)?;
            }
            indices.pop();
        }
        Ok(())
    }
}

fn eval(bound: &Bound, ctx: Ctx<'_>) -> Result<Value, Error> {
    let (head, rest) = (bound.head(), &bound.chain()[1..]);
    head.eval(&Ctx { chain: rest, ..ctx })
        .map_err(|source| Error::Property {
            mark: ctx.mark,
            name: bound.name(),
            source,
        })
}
