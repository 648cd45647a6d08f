// Copyright 2025 the Protomark Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property evaluation context.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

use hashbrown::{HashMap, HashSet};

use crate::bind::Binds;
use crate::error::{Error, PropertyError};
use crate::mark::{MarkId, Vis};
use crate::property::Property;
use crate::scene::{DefState, Instance, Scene};
use crate::value::Value;

/// An enclosing panel instance while its children are being built.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Frame<'a> {
    pub(crate) mark: MarkId,
    pub(crate) index: usize,
    pub(crate) instance: &'a Instance,
    /// Child scenes of `instance` already built in this pass.
    pub(crate) children: &'a [Scene],
    pub(crate) up: Option<&'a Frame<'a>>,
}

/// Records reads of optional properties that have not been evaluated yet.
#[derive(Debug, Default)]
pub(crate) struct Tracker {
    pub(crate) pending: HashSet<&'static str>,
    pub(crate) edges: RefCell<Vec<(&'static str, &'static str)>>,
}

/// What a property function sees while it is evaluated.
///
/// A context is built per evaluation and threaded explicitly: there is no ambient "current mark"
/// or "current instance". While `data` and defs are evaluated there is no current datum, so the
/// data stack starts at the parent's datum.
#[derive(Clone, Copy, Debug)]
pub struct Ctx<'a> {
    pub(crate) vis: &'a Vis,
    pub(crate) mark: MarkId,
    pub(crate) name: &'static str,
    pub(crate) index: usize,
    pub(crate) datum: Option<&'a Value>,
    pub(crate) instance: Option<&'a Instance>,
    pub(crate) siblings: &'a [Instance],
    pub(crate) frame: Option<&'a Frame<'a>>,
    pub(crate) scale: f64,
    pub(crate) chain: &'a [Rc<Property>],
    pub(crate) defs: Option<&'a HashMap<&'static str, DefState>>,
    pub(crate) binds: Option<&'a Binds>,
    pub(crate) tracker: Option<&'a Tracker>,
}

impl<'a> Ctx<'a> {
    /// The visualization being built.
    pub fn vis(&self) -> &'a Vis {
        self.vis
    }

    /// The mark being built.
    pub fn mark(&self) -> MarkId {
        self.mark
    }

    /// The property being evaluated.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Index of the current instance in its scene.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Index of the enclosing panel instance (`0` at the root).
    pub fn parent_index(&self) -> usize {
        self.frame.map_or(0, |f| f.index)
    }

    /// Accumulated panel scale.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// The current datum, or `Null` while evaluating `data`.
    pub fn datum(&self) -> Value {
        self.datum.cloned().unwrap_or_default()
    }

    /// The data stack, innermost first: the current datum (if any), then each enclosing panel
    /// instance's datum.
    pub fn stack(&self) -> impl Iterator<Item = &'a Value> + use<'a> {
        let frames = core::iter::successors(self.frame, |f| f.up);
        self.datum
            .into_iter()
            .chain(frames.map(|f| &f.instance.data))
    }

    /// The datum `depth` levels up the stack (`0` is the innermost).
    pub fn data(&self, depth: usize) -> Value {
        self.stack().nth(depth).cloned().unwrap_or_default()
    }

    /// The instance being built, if any.
    pub fn instance(&self) -> Option<&'a Instance> {
        self.instance
    }

    /// The computed value of another property of the current instance.
    ///
    /// Defs read the scene's def state. Reading an optional property that has not been evaluated
    /// yet returns its previous value (`Null` on first build); during the first instance of a
    /// render such reads also reorder evaluation so the next pass sees fresh values. A property
    /// reading itself sees its previous value.
    pub fn get(&self, name: &str) -> Value {
        if let Some(state) = self.defs.and_then(|d| d.get(name)) {
            if self.binds.is_none_or(|b| b.is_def(name)) {
                return state.value.clone();
            }
        }
        if let Some(tracker) = self.tracker {
            if name != self.name {
                if let Some(dep) = tracker.pending.get(name) {
                    tracker.edges.borrow_mut().push((self.name, *dep));
                }
            }
        }
        self.instance.map(|s| s.get(name)).unwrap_or_default()
    }

    /// [`Ctx::get`] as a number.
    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).as_f64()
    }

    /// The current value of a def of this scene.
    pub fn def(&self, name: &str) -> Value {
        self.defs
            .and_then(|d| d.get(name))
            .map(|d| d.value.clone())
            .unwrap_or_default()
    }

    /// A computed property of the enclosing panel instance.
    pub fn parent(&self, name: &str) -> Value {
        self.frame.map(|f| f.instance.get(name)).unwrap_or_default()
    }

    /// A computed property of the previous instance in this scene, if there is one.
    pub fn sibling(&self, name: &str) -> Option<Value> {
        self.siblings.last().map(|s| s.get(name))
    }

    /// Evaluates the record this one overrides (on a prototype or a type default), in the same
    /// context. Returns `Null` at the end of the chain.
    pub fn delegate(&self) -> Result<Value, PropertyError> {
        let Some((next, rest)) = self.chain.split_first() else {
            return Ok(Value::Null);
        };
        let ctx = Self { chain: rest, ..*self };
        next.eval(&ctx)
    }

    /// The anchor target's scene under the same parent instance.
    ///
    /// The target must be a preceding sibling mark so that it is built first.
    pub fn target_scene(&self) -> Result<&'a Scene, Error> {
        let target = self
            .vis
            .mark(self.mark)?
            .target()
            .ok_or(Error::MissingScene { mark: self.mark })?;
        let tm = self.vis.mark(target)?;
        let missing = Error::MissingScene { mark: target };
        let Some(frame) = self.frame else {
            return Err(missing);
        };
        if tm.parent() != Some(frame.mark) {
            return Err(missing);
        }
        match frame.children.get(tm.child_index()) {
            Some(scene) if scene.mark == target => Ok(scene),
            _ => Err(missing),
        }
    }

    /// The anchor target's instance at the current index.
    pub fn target(&self) -> Result<&'a Instance, Error> {
        let scene = self.target_scene()?;
        scene.get(self.index).ok_or(Error::MissingInstance {
            mark: scene.mark,
            index: self.index,
        })
    }
}
