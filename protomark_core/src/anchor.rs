// Copyright 2025 the Protomark Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Anchors: prototypes positioned relative to another mark's instances.

use alloc::vec::Vec;

use crate::context::Ctx;
use crate::error::{Error, PropertyError};
use crate::mark::{MarkId, Vis};
use crate::mark_type;
use crate::property::Property;
use crate::value::Value;

/// Where an anchor sits on its target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Anchor {
    /// The middle of the target.
    #[default]
    Center,
    /// The top edge, horizontally centered.
    Top,
    /// The bottom edge, horizontally centered.
    Bottom,
    /// The left edge, vertically centered.
    Left,
    /// The right edge, vertically centered.
    Right,
}

impl Anchor {
    /// The anchor name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Center => "center",
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

type AnchorFn = fn(Anchor, &Ctx<'_>) -> Result<Value, PropertyError>;

fn size(v: Option<f64>) -> f64 {
    v.unwrap_or(0.0)
}

fn left(a: Anchor, ctx: &Ctx<'_>) -> Result<Value, PropertyError> {
    let s = ctx.target()?;
    let (l, w) = (s.number("left"), size(s.number("width")));
    Ok(match a {
        Anchor::Top | Anchor::Bottom | Anchor::Center => l.map(|l| l + w / 2.0).into(),
        Anchor::Left => Value::Null,
        Anchor::Right => l.map(|l| l + w).into(),
    })
}

fn top(a: Anchor, ctx: &Ctx<'_>) -> Result<Value, PropertyError> {
    let s = ctx.target()?;
    let (t, h) = (s.number("top"), size(s.number("height")));
    Ok(match a {
        Anchor::Left | Anchor::Right | Anchor::Center => t.map(|t| t + h / 2.0).into(),
        Anchor::Top => Value::Null,
        Anchor::Bottom => t.map(|t| t + h).into(),
    })
}

fn right(a: Anchor, ctx: &Ctx<'_>) -> Result<Value, PropertyError> {
    if a != Anchor::Left {
        return Ok(Value::Null);
    }
    let s = ctx.target()?;
    Ok(s.number("right").map(|r| r + size(s.number("width"))).into())
}

fn bottom(a: Anchor, ctx: &Ctx<'_>) -> Result<Value, PropertyError> {
    if a != Anchor::Top {
        return Ok(Value::Null);
    }
    let s = ctx.target()?;
    Ok(s.number("bottom").map(|b| b + size(s.number("height"))).into())
}

fn text_align(a: Anchor, _: &Ctx<'_>) -> Result<Value, PropertyError> {
    Ok(match a {
        Anchor::Top | Anchor::Bottom | Anchor::Center => "center",
        Anchor::Right => "right",
        Anchor::Left => "left",
    }
    .into())
}

fn text_baseline(a: Anchor, _: &Ctx<'_>) -> Result<Value, PropertyError> {
    Ok(match a {
        Anchor::Left | Anchor::Right | Anchor::Center => "middle",
        Anchor::Top => "top",
        Anchor::Bottom => "bottom",
    }
    .into())
}

impl Vis {
    /// Creates a detached anchor on `target`.
    ///
    /// Marks that [`extend`](Vis::extend) the anchor repeat the target's data and visibility and
    /// are positioned on each target instance. The target must be an earlier sibling of those
    /// marks so that its scene is built first.
    pub fn anchor(&mut self, target: MarkId, anchor: Anchor) -> Result<MarkId, Error> {
        let ty = mark_type::mark();
        let id = self.create(ty.clone()).id();
        self.set_target(id, target)?;

        let data = Property::function(
            "data",
            |ctx: &Ctx<'_>| -> Result<Value, PropertyError> {
                let scene = ctx.target_scene()?;
                Ok(Value::list(
                    scene.instances.iter().map(|s| s.data.clone()).collect::<Vec<_>>(),
                ))
            },
            None,
            false,
        );
        let visible = Property::function(
            "visible",
            |ctx: &Ctx<'_>| -> Result<Value, PropertyError> { Ok(ctx.target()?.visible.into()) },
            ty.cast("visible"),
            false,
        );
        let stable_id = Property::function(
            "id",
            |ctx: &Ctx<'_>| -> Result<Value, PropertyError> { Ok(ctx.target()?.id.clone()) },
            None,
            false,
        );
        for p in [data, visible, stable_id] {
            self.push_property(id, p.with_tag("anchor"))?;
        }

        let placed: [(&'static str, AnchorFn); 6] = [
            ("left", left),
            ("top", top),
            ("right", right),
            ("bottom", bottom),
            ("textAlign", text_align),
            ("textBaseline", text_baseline),
        ];
        for (name, f) in placed {
            let p = Property::function(name, move |ctx: &Ctx<'_>| f(anchor, ctx), ty.cast(name), false);
            self.push_property(id, p.with_tag("anchor"))?;
        }
        self.push_property(
            id,
            Property::constant("anchor", anchor.name().into(), None, false).with_tag("anchor"),
        )?;
        tracing::debug!(?target, anchor = anchor.name(), ?id, "created anchor");
        Ok(id)
    }
}
