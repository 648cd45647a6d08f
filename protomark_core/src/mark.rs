// Copyright 2025 the Protomark Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The mark tree.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;

use crate::context::Ctx;
use crate::dispatch::{Event, EventCtx, Handler};
use crate::error::{Error, PropertyError};
use crate::mark_type::{self, MarkType};
use crate::property::{IntoPropertyResult, Property};
use crate::scene::Scene;
use crate::value::Value;

/// Identifier of a mark within its [`Vis`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkId(pub u32);

impl MarkId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A node of the mark tree.
///
/// Containment (`parent`/`children`) and property inheritance (`proto`) are independent: a mark
/// may inherit properties from any other mark, including one that is never added to the tree.
pub struct Mark {
    ty: Rc<MarkType>,
    proto: Option<MarkId>,
    parent: Option<MarkId>,
    children: Vec<MarkId>,
    child_index: usize,
    target: Option<MarkId>,
    properties: Vec<Rc<Property>>,
    pub(crate) handlers: Vec<(Event, Handler)>,
}

impl fmt::Debug for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mark")
            .field("ty", &self.ty.name())
            .field("proto", &self.proto)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("child_index", &self.child_index)
            .field("target", &self.target)
            .field("properties", &self.properties)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl Mark {
    fn new(ty: Rc<MarkType>) -> Self {
        Self {
            ty,
            proto: None,
            parent: None,
            children: Vec::new(),
            child_index: 0,
            target: None,
            properties: Vec::new(),
            handlers: Vec::new(),
        }
    }

    /// The mark's type.
    pub fn ty(&self) -> &Rc<MarkType> {
        &self.ty
    }

    /// The prototype this mark inherits properties from.
    pub fn proto(&self) -> Option<MarkId> {
        self.proto
    }

    /// The enclosing panel.
    pub fn parent(&self) -> Option<MarkId> {
        self.parent
    }

    /// Child marks, in declaration (and build) order.
    pub fn children(&self) -> &[MarkId] {
        &self.children
    }

    /// Position among the parent's children.
    pub fn child_index(&self) -> usize {
        self.child_index
    }

    /// The anchor target, if this mark (or its prototype) is an anchor.
    pub fn target(&self) -> Option<MarkId> {
        self.target
    }

    /// Own property records in authoring order.
    pub fn properties(&self) -> &[Rc<Property>] {
        &self.properties
    }
}

/// Options for building scenes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuildOptions {
    /// Reorder optional properties when a function reads one that has not been evaluated yet.
    ///
    /// When disabled, such reads see the previous (or `Null`) value.
    pub track_dependencies: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            track_dependencies: true,
        }
    }
}

/// A visualization: an arena of marks rooted at a panel, plus the last rendered scene.
#[derive(Debug)]
pub struct Vis {
    marks: Vec<Mark>,
    root: MarkId,
    pub(crate) scene: Option<Scene>,
    pub(crate) options: BuildOptions,
}

impl Default for Vis {
    fn default() -> Self {
        Self::new()
    }
}

impl Vis {
    /// Creates a visualization with an empty root panel.
    pub fn new() -> Self {
        Self::with_root(mark_type::panel())
    }

    /// Creates a visualization whose root has the given panel type.
    pub fn with_root(ty: Rc<MarkType>) -> Self {
        Self {
            marks: alloc::vec![Mark::new(ty)],
            root: MarkId(0),
            scene: None,
            options: BuildOptions::default(),
        }
    }

    /// Replaces the build options.
    pub fn set_options(&mut self, options: BuildOptions) {
        self.options = options;
    }

    /// The root panel.
    pub fn root(&self) -> MarkId {
        self.root
    }

    /// The last successfully rendered root scene.
    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    /// Looks up a mark.
    pub fn mark(&self, id: MarkId) -> Result<&Mark, Error> {
        self.marks.get(id.index()).ok_or(Error::MissingMark(id))
    }

    fn mark_mut(&mut self, id: MarkId) -> Result<&mut Mark, Error> {
        self.marks.get_mut(id.index()).ok_or(Error::MissingMark(id))
    }

    /// Number of marks, attached or not.
    pub fn len(&self) -> usize {
        self.marks.len()
    }

    /// Always false: the root panel exists from construction.
    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// Creates a detached mark, typically used as a prototype.
    pub fn create(&mut self, ty: Rc<MarkType>) -> MarkMut<'_> {
        let id = self.alloc(Mark::new(ty));
        MarkMut { vis: self, id }
    }

    fn alloc(&mut self, mark: Mark) -> MarkId {
        let id = MarkId(u32::try_from(self.marks.len()).unwrap_or(u32::MAX));
        self.marks.push(mark);
        id
    }

    /// Adds a child mark to a panel.
    pub fn add(&mut self, parent: MarkId, ty: Rc<MarkType>) -> Result<MarkMut<'_>, Error> {
        if !self.mark(parent)?.ty.is_panel() {
            return Err(Error::NotAPanel { mark: parent });
        }
        let mut mark = Mark::new(ty);
        mark.parent = Some(parent);
        mark.child_index = self.marks[parent.index()].children.len();
        let id = self.alloc(mark);
        self.marks[parent.index()].children.push(id);
        Ok(MarkMut { vis: self, id })
    }

    /// Returns a chainable handle on an existing mark.
    pub fn edit(&mut self, id: MarkId) -> Result<MarkMut<'_>, Error> {
        self.mark(id)?;
        Ok(MarkMut { vis: self, id })
    }

    /// Makes `mark` inherit properties (and an anchor target) from `proto`.
    pub fn extend(&mut self, mark: MarkId, proto: MarkId) -> Result<(), Error> {
        self.mark(mark)?;
        let mut cursor = Some(proto);
        while let Some(p) = cursor {
            if p == mark {
                return Err(Error::ProtoCycle { mark, proto });
            }
            cursor = self.mark(p)?.proto;
        }
        let target = self.marks[proto.index()].target;
        let m = &mut self.marks[mark.index()];
        m.proto = Some(proto);
        if m.target.is_none() {
            m.target = target;
        }
        Ok(())
    }

    pub(crate) fn set_target(&mut self, mark: MarkId, target: MarkId) -> Result<(), Error> {
        self.mark(target)?;
        self.mark_mut(mark)?.target = Some(target);
        Ok(())
    }

    /// Stores a record on `mark`, replacing any same-name record.
    pub fn push_property(&mut self, mark: MarkId, property: Property) -> Result<(), Error> {
        let m = self.mark_mut(mark)?;
        m.properties.retain(|p| p.name != property.name);
        tracing::trace!(?mark, name = property.name, kind = ?property.kind, "set property");
        m.properties.push(Rc::new(property));
        Ok(())
    }

    /// Sets a constant property. The type's cast applies to non-null values.
    pub fn set(
        &mut self,
        mark: MarkId,
        name: &'static str,
        value: impl Into<Value>,
    ) -> Result<(), Error> {
        let cast = self.mark(mark)?.ty.cast(name);
        self.push_property(mark, Property::constant(name, value.into(), cast, false))
    }

    /// Sets a computed property. The type's cast applies to non-null results.
    pub fn set_fn<F, R>(&mut self, mark: MarkId, name: &'static str, f: F) -> Result<(), Error>
    where
        F: Fn(&Ctx<'_>) -> R + 'static,
        R: IntoPropertyResult,
    {
        let cast = self.mark(mark)?.ty.cast(name);
        self.push_property(mark, Property::function(name, f, cast, false))
    }

    /// Declares a constant def (state variable).
    pub fn def(
        &mut self,
        mark: MarkId,
        name: &'static str,
        value: impl Into<Value>,
    ) -> Result<(), Error> {
        self.push_property(mark, Property::constant(name, value.into(), None, true))
    }

    /// Declares a def initialized by a function of the scene's data stack.
    pub fn def_fn<F, R>(&mut self, mark: MarkId, name: &'static str, f: F) -> Result<(), Error>
    where
        F: Fn(&Ctx<'_>) -> R + 'static,
        R: IntoPropertyResult,
    {
        self.push_property(mark, Property::function(name, f, None, true))
    }

    /// Registers an event handler. Handlers run in registration order.
    pub fn on<F>(&mut self, mark: MarkId, event: Event, handler: F) -> Result<(), Error>
    where
        F: Fn(&mut EventCtx<'_, '_>) -> Result<Option<MarkId>, PropertyError> + 'static,
    {
        self.mark_mut(mark)?
            .handlers
            .push((event, Rc::new(handler) as Handler));
        Ok(())
    }

    /// Prototype chain starting at `mark` itself.
    pub(crate) fn proto_chain(&self, mark: MarkId) -> impl Iterator<Item = (MarkId, &Mark)> {
        core::iter::successors(
            self.marks.get(mark.index()).map(|m| (mark, m)),
            |(_, m)| m.proto.and_then(|p| self.marks.get(p.index()).map(|pm| (p, pm))),
        )
    }

    /// Ancestors from the root down to `mark` inclusive.
    pub(crate) fn lineage(&self, mark: MarkId) -> Result<Vec<MarkId>, Error> {
        let mut out = Vec::new();
        let mut cursor = Some(mark);
        while let Some(m) = cursor {
            out.push(m);
            cursor = self.mark(m)?.parent;
        }
        out.reverse();
        Ok(out)
    }
}

/// Chainable handle on one mark.
#[derive(Debug)]
pub struct MarkMut<'v> {
    vis: &'v mut Vis,
    id: MarkId,
}

impl<'v> MarkMut<'v> {
    /// The mark's id.
    pub fn id(&self) -> MarkId {
        self.id
    }

    /// Sets a constant property.
    pub fn set(self, name: &'static str, value: impl Into<Value>) -> Self {
        // The id was validated when the handle was created.
        let _ = self.vis.set(self.id, name, value);
        self
    }

    /// Sets a computed property.
    pub fn set_fn<F, R>(self, name: &'static str, f: F) -> Self
    where
        F: Fn(&Ctx<'_>) -> R + 'static,
        R: IntoPropertyResult,
    {
        let _ = self.vis.set_fn(self.id, name, f);
        self
    }

    /// Sets the data.
    pub fn data(self, value: impl Into<Value>) -> Self {
        self.set("data", value)
    }

    /// Computes the data from the parent's data stack.
    pub fn data_fn<F, R>(self, f: F) -> Self
    where
        F: Fn(&Ctx<'_>) -> R + 'static,
        R: IntoPropertyResult,
    {
        self.set_fn("data", f)
    }

    /// Declares a constant def.
    pub fn def(self, name: &'static str, value: impl Into<Value>) -> Self {
        let _ = self.vis.def(self.id, name, value);
        self
    }

    /// Declares a computed def.
    pub fn def_fn<F, R>(self, name: &'static str, f: F) -> Self
    where
        F: Fn(&Ctx<'_>) -> R + 'static,
        R: IntoPropertyResult,
    {
        let _ = self.vis.def_fn(self.id, name, f);
        self
    }

    /// Inherits properties from `proto`.
    pub fn extend(self, proto: MarkId) -> Result<Self, Error> {
        self.vis.extend(self.id, proto)?;
        Ok(self)
    }

    /// Registers an event handler.
    pub fn on<F>(self, event: Event, handler: F) -> Self
    where
        F: Fn(&mut EventCtx<'_, '_>) -> Result<Option<MarkId>, PropertyError> + 'static,
    {
        let _ = self.vis.on(self.id, event, handler);
        self
    }

    /// Adds a child to this mark (which must be a panel), returning the child's handle.
    pub fn add(self, ty: Rc<MarkType>) -> Result<MarkMut<'v>, Error> {
        self.vis.add(self.id, ty)
    }
}
