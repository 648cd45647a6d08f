// Copyright 2025 the Protomark Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `protomark_core`: declarative marks bound to data.
//!
//! A [`Vis`] holds a tree of marks rooted at a panel. Each mark has a [`MarkType`] (bar, line,
//! dot, ...) and property records: constants or functions of a [`Ctx`]. Rendering resolves, per
//! mark, which records apply ([`bind`]), then builds one [`Scene`] per mark per enclosing panel
//! instance, with one [`Instance`] per datum.
//!
//! Property resolution follows three layers, nearest first:
//! - the mark's own records,
//! - its prototype chain ([`Vis::extend`]), which is independent from containment,
//! - the type's defaults (type before base type).
//!
//! A record can call [`Ctx::delegate`] to build on the record it overrides.
//!
//! Unset positional properties are completed with a box model against the parent panel
//! (`left + width + right == parent width`), and unset styles become transparent.
//!
//! Events are delivered through [`Vis::dispatch`] with an [`InstancePath`]; handlers read the
//! resolved instance through a [`Cursor`] and queue writes that are applied once all of them ran.
//!
//! ```
//! use protomark_core::{Vis, mark_type};
//!
//! let mut vis = Vis::new();
//! let root = vis.root();
//! vis.edit(root).unwrap().set("width", 150.0).set("height", 150.0);
//! let bar = vis
//!     .add(root, mark_type::bar())
//!     .unwrap()
//!     .data(vec![1.0, 2.0, 3.0])
//!     .set("bottom", 0.0)
//!     .set_fn("width", |ctx| ctx.datum().as_f64().unwrap_or(0.0) * 10.0)
//!     .set_fn("left", |ctx| ctx.index() as f64 * 20.0)
//!     .set("height", 10.0)
//!     .id();
//! vis.render(&mut |_: &protomark_core::Scene| {}).unwrap();
//!
//! let scene = &vis.scene().unwrap().instances[0].children[0];
//! assert_eq!(scene.mark, bar);
//! assert_eq!(scene.instances[1].number("width"), Some(20.0));
//! assert_eq!(scene.instances[2].number("left"), Some(40.0));
//! ```

#![no_std]

extern crate alloc;

mod anchor;
mod bind;
mod build;
pub mod cast;
mod context;
mod cursor;
mod dispatch;
mod error;
#[cfg(not(feature = "std"))]
mod float;
mod mark;
pub mod mark_type;
mod property;
mod render;
mod scene;
pub mod transition;
mod transform;
mod value;

pub use anchor::Anchor;
pub use bind::{Bound, Binds, REQUIRED, bind};
pub use context::Ctx;
pub use cursor::{Cursor, InstancePath};
pub use dispatch::{Event, EventCtx, Handler, Modifiers, RawEvent};
pub use error::{Error, PropertyError};
pub use mark::{BuildOptions, Mark, MarkId, MarkMut, Vis};
pub use mark_type::{Implied, ImpliedFn, MarkType, MarkTypeBuilder};
pub use property::{IntoPropertyResult, PropFn, Property, PropertyKind, PropertyValue, next_id};
pub use render::Renderer;
pub use scene::{DefState, Instance, Phase, Scene, ShapeFn};
pub use transform::Transform;
pub use transition::{Interpolation, Transition};
pub use value::{IdKey, Value};

pub use peniko::Color;
pub use protomark_geom as geom;

#[cfg(test)]
mod tests;
