// Copyright 2025 the Protomark Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mark types: declared properties, defaults and hooks.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::f64::consts::FRAC_PI_2;
use core::fmt;

use kurbo::{Circle, Line, Point, Rect};
use peniko::Color;
use protomark_geom::{Polygon, Shape, Wedge};

use crate::cast::{self, Cast};
use crate::context::Ctx;
#[cfg(not(feature = "std"))]
use crate::float::FloatExt;
use crate::property::{IntoPropertyResult, Property};
use crate::scene::{Instance, Scene, ShapeFn};
use crate::transform::Transform;
use crate::value::Value;

/// Type-specific completion of implied properties, run before box-model completion.
pub type ImpliedFn = fn(&mut Instance, &Implied<'_>);

/// Inputs available to an implied hook.
#[derive(Debug)]
pub struct Implied<'a> {
    /// The type of the mark being built.
    pub ty: &'a MarkType,
    /// The enclosing panel instance, if any.
    pub parent: Option<&'a Instance>,
}

/// Ten categorical colors, cycled by index.
pub const CATEGORY10: [Color; 10] = [
    Color::from_rgb8(0x1f, 0x77, 0xb4),
    Color::from_rgb8(0xff, 0x7f, 0x0e),
    Color::from_rgb8(0x2c, 0xa0, 0x2c),
    Color::from_rgb8(0xd6, 0x27, 0x28),
    Color::from_rgb8(0x94, 0x67, 0xbd),
    Color::from_rgb8(0x8c, 0x56, 0x4b),
    Color::from_rgb8(0xe3, 0x77, 0xc2),
    Color::from_rgb8(0x7f, 0x7f, 0x7f),
    Color::from_rgb8(0xbc, 0xbd, 0x22),
    Color::from_rgb8(0x17, 0xbe, 0xcf),
];

/// A mark type definition.
///
/// Types form a single-inheritance chain through [`MarkType::base`]: declared properties and
/// defaults of the base apply to derived types, and the nearest hook wins.
pub struct MarkType {
    name: &'static str,
    base: Option<Rc<MarkType>>,
    properties: Vec<(&'static str, Option<Cast>)>,
    defaults: Vec<Rc<Property>>,
    panel: bool,
    implied: Option<ImpliedFn>,
    shape: Option<ShapeFn>,
}

impl fmt::Debug for MarkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkType")
            .field("name", &self.name)
            .field("base", &self.base.as_ref().map(|b| b.name))
            .field("properties", &self.properties.len())
            .field("defaults", &self.defaults.len())
            .field("panel", &self.panel)
            .field("implied", &self.implied.is_some())
            .field("shape", &self.shape.is_some())
            .finish()
    }
}

impl MarkType {
    /// Starts a new root type.
    pub fn builder(name: &'static str) -> MarkTypeBuilder {
        MarkTypeBuilder {
            ty: Self {
                name,
                base: None,
                properties: Vec::new(),
                defaults: Vec::new(),
                panel: false,
                implied: None,
                shape: None,
            },
        }
    }

    /// Starts a type deriving from `base`.
    pub fn derive(name: &'static str, base: &Rc<Self>) -> MarkTypeBuilder {
        let mut b = Self::builder(name);
        b.ty.base = Some(base.clone());
        b
    }

    /// Type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The base type.
    pub fn base(&self) -> Option<&Rc<Self>> {
        self.base.as_ref()
    }

    /// This type followed by its bases.
    pub fn chain(&self) -> impl Iterator<Item = &Self> {
        core::iter::successors(Some(self), |t| t.base.as_deref())
    }

    /// Whether instances of this type own child marks.
    pub fn is_panel(&self) -> bool {
        self.chain().any(|t| t.panel)
    }

    /// Whether `name` is declared by this type or a base.
    pub fn declares(&self, name: &str) -> bool {
        self.chain()
            .any(|t| t.properties.iter().any(|(n, _)| *n == name))
    }

    /// The cast for `name`, from the nearest declaring type.
    pub fn cast(&self, name: &str) -> Option<Cast> {
        self.chain()
            .find_map(|t| t.properties.iter().find(|(n, _)| *n == name))
            .and_then(|(_, c)| *c)
    }

    /// Declared property names, nearest type first. Names may repeat.
    pub fn declared(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.chain()
            .flat_map(|t| t.properties.iter().map(|(n, _)| *n))
    }

    /// Default records declared directly on this type, in authoring order.
    pub fn defaults(&self) -> &[Rc<Property>] {
        &self.defaults
    }

    /// The nearest implied hook.
    pub fn implied_hook(&self) -> Option<ImpliedFn> {
        self.chain().find_map(|t| t.implied)
    }

    /// The nearest shape hook.
    pub fn shape_hook(&self) -> Option<ShapeFn> {
        self.chain().find_map(|t| t.shape)
    }

    /// Completes implied properties of a visible instance.
    ///
    /// Runs the type's hook, then box-model completion against the parent's `width`/`height`,
    /// then replaces unset styles with transparent.
    pub fn build_implied(&self, instance: &mut Instance, parent: Option<&Instance>) {
        if let Some(hook) = self.implied_hook() {
            hook(instance, &Implied { ty: self, parent });
        }
        self.complete_box(instance, parent);
        for style in ["fillStyle", "strokeStyle", "textStyle"] {
            if self.declares(style) && instance.get(style).is_null() {
                instance.set(style, Value::Color(Color::TRANSPARENT));
            }
        }
    }

    fn complete_box(&self, s: &mut Instance, parent: Option<&Instance>) {
        let (l, r, w) = complete_axis(
            s.number("left"),
            s.number("right"),
            self.declares("width"),
            s.number("width"),
            parent.map(|p| p.number("width").unwrap_or(0.0)),
        );
        let (t, b, h) = complete_axis(
            s.number("top"),
            s.number("bottom"),
            self.declares("height"),
            s.number("height"),
            parent.map(|p| p.number("height").unwrap_or(0.0)),
        );
        s.set("left", l.into());
        s.set("right", r.into());
        s.set("top", t.into());
        s.set("bottom", b.into());
        if self.declares("width") {
            s.set("width", w.into());
        }
        if self.declares("height") {
            s.set("height", h.into());
        }
    }
}

/// Solves one axis of the box model.
///
/// `extent` is the parent's size along the axis; without a parent it is `size + near + far`.
/// Types that do not declare a size are treated as zero-sized.
fn complete_axis(
    near: Option<f64>,
    far: Option<f64>,
    sized: bool,
    size: Option<f64>,
    extent: Option<f64>,
) -> (Option<f64>, Option<f64>, Option<f64>) {
    let size = if sized { size } else { Some(0.0) };
    let extent = extent.unwrap_or_else(|| size.unwrap_or(0.0) + near.unwrap_or(0.0) + far.unwrap_or(0.0));
    match (size, near, far) {
        (None, near, far) => {
            let (near, far) = (near.unwrap_or(0.0), far.unwrap_or(0.0));
            (Some(near), Some(far), Some(extent - far - near))
        }
        (Some(size), None, None) => {
            let half = (extent - size) / 2.0;
            (Some(half), Some(half), Some(size))
        }
        (Some(size), near, None) => {
            let near = near.unwrap_or(0.0);
            (Some(near), Some(extent - size - near), Some(size))
        }
        (Some(size), None, Some(far)) => (Some(extent - size - far), Some(far), Some(size)),
        (Some(size), Some(near), Some(far)) => (Some(near), Some(far), Some(size)),
    }
}

/// Builder for [`MarkType`].
#[derive(Debug)]
pub struct MarkTypeBuilder {
    ty: MarkType,
}

impl MarkTypeBuilder {
    /// Declares a property with an optional cast.
    pub fn property(mut self, name: &'static str, cast: Option<Cast>) -> Self {
        self.ty.properties.retain(|(n, _)| *n != name);
        self.ty.properties.push((name, cast));
        self
    }

    /// Declares several properties sharing a cast.
    pub fn properties(mut self, names: &[&'static str], cast: Option<Cast>) -> Self {
        for &name in names {
            self = self.property(name, cast);
        }
        self
    }

    fn cast(&self, name: &str) -> Option<Cast> {
        self.ty
            .properties
            .iter()
            .find(|(n, _)| *n == name)
            .and_then(|(_, c)| *c)
            .or_else(|| self.ty.base.as_ref().and_then(|b| b.cast(name)))
    }

    /// Adds a constant default.
    pub fn default_value(mut self, name: &'static str, value: impl Into<Value>) -> Self {
        let cast = self.cast(name);
        self.ty.defaults.push(Rc::new(
            Property::constant(name, value.into(), cast, false).with_tag("default"),
        ));
        self
    }

    /// Adds a computed default.
    pub fn default_fn<F, R>(mut self, name: &'static str, f: F) -> Self
    where
        F: Fn(&Ctx<'_>) -> R + 'static,
        R: IntoPropertyResult,
    {
        let cast = self.cast(name);
        self.ty
            .defaults
            .push(Rc::new(Property::function(name, f, cast, false).with_tag("default")));
        self
    }

    /// Marks the type as a panel (its instances own child scenes).
    pub fn panel(mut self) -> Self {
        self.ty.panel = true;
        self
    }

    /// Sets the implied hook.
    pub fn implied(mut self, hook: ImpliedFn) -> Self {
        self.ty.implied = Some(hook);
        self
    }

    /// Sets the hit-test shape hook.
    pub fn shape(mut self, hook: ShapeFn) -> Self {
        self.ty.shape = Some(hook);
        self
    }

    /// Finishes the type.
    pub fn build(self) -> Rc<MarkType> {
        Rc::new(self.ty)
    }
}

fn category(index: usize) -> Color {
    CATEGORY10[index % CATEGORY10.len()]
}

/// The root of all types: data, visibility and position.
pub fn mark() -> Rc<MarkType> {
    MarkType::builder("mark")
        .property("data", None)
        .property("visible", Some(cast::boolean))
        .property("id", None)
        .property("datum", None)
        .properties(&["left", "right", "top", "bottom"], Some(cast::number))
        .properties(&["cursor", "title", "events"], Some(cast::text))
        .properties(&["reverse", "antialias"], Some(cast::boolean))
        .default_fn("data", |ctx| Value::list([ctx.data(0)]))
        .default_value("visible", true)
        .default_fn("datum", |ctx| ctx.datum())
        .default_value("antialias", true)
        .default_value("events", "painted")
        .build()
}

fn stroked_filled(b: MarkTypeBuilder) -> MarkTypeBuilder {
    b.properties(&["fillStyle", "strokeStyle"], Some(cast::color))
        .property("lineWidth", Some(cast::number))
        .default_value("lineWidth", 1.5)
}

fn rect_shape(scene: &Scene, index: usize) -> Option<Shape> {
    let s = scene.get(index)?;
    let (l, t) = (s.number("left")?, s.number("top")?);
    let (w, h) = (s.number("width").unwrap_or(0.0), s.number("height").unwrap_or(0.0));
    Some(Shape::Rect(Rect::new(l, t, l + w, t + h).abs()))
}

fn anchor_point(s: &Instance) -> Option<Point> {
    Some(Point::new(s.number("left")?, s.number("top")?))
}

/// A container whose instances own child scenes.
pub fn panel() -> Rc<MarkType> {
    stroked_filled(MarkType::derive("panel", &mark()))
        .properties(&["width", "height"], Some(cast::number))
        .property("overflow", Some(cast::text))
        .property("transform", Some(cast::transform))
        .default_value("overflow", "visible")
        .default_value("transform", Transform::IDENTITY)
        .panel()
        .implied(|s, _| {
            if s.get("transform").as_transform().is_none() {
                s.set("transform", Transform::IDENTITY.into());
            }
        })
        .shape(rect_shape)
        .build()
}

/// A rectangle.
pub fn bar() -> Rc<MarkType> {
    stroked_filled(MarkType::derive("bar", &mark()))
        .properties(&["width", "height"], Some(cast::number))
        .default_fn("fillStyle", |ctx| category(ctx.parent_index()))
        .shape(rect_shape)
        .build()
}

/// A filled band between a top line and a bottom line.
pub fn area() -> Rc<MarkType> {
    stroked_filled(MarkType::derive("area", &mark()))
        .properties(&["width", "height"], Some(cast::number))
        .property("segmented", Some(cast::boolean))
        .property("interpolate", Some(cast::text))
        .property("tension", Some(cast::number))
        .default_fn("fillStyle", |ctx| category(ctx.parent_index()))
        .default_value("interpolate", "linear")
        .default_value("tension", 0.7)
        .shape(|scene, index| {
            let s = scene.get(index)?;
            let next = scene.get(index + 1).filter(|n| n.visible).unwrap_or(s);
            let edge = |s: &Instance| -> Option<(Point, Point)> {
                let top = anchor_point(s)?;
                let w = s.number("width").unwrap_or(0.0);
                let h = s.number("height").unwrap_or(0.0);
                Some((top, Point::new(top.x + w, top.y + h)))
            };
            let (a0, a1) = edge(s)?;
            let (b0, b1) = edge(next)?;
            Some(Shape::Polygon(Polygon::new([a0, b0, b1, a1])))
        })
        .build()
}

/// A polyline through its instances.
pub fn line() -> Rc<MarkType> {
    stroked_filled(MarkType::derive("line", &mark()))
        .property("lineJoin", Some(cast::text))
        .property("segmented", Some(cast::boolean))
        .property("interpolate", Some(cast::text))
        .properties(&["eccentricity", "tension"], Some(cast::number))
        .default_fn("strokeStyle", |ctx| category(ctx.parent_index()))
        .default_value("lineJoin", "miter")
        .default_value("interpolate", "linear")
        .default_value("tension", 0.7)
        .shape(|scene, index| {
            let p0 = anchor_point(scene.get(index)?)?;
            match scene.get(index + 1).filter(|n| n.visible).and_then(anchor_point) {
                Some(p1) => Some(Shape::Line(Line::new(p0, p1))),
                None => Some(Shape::Point(p0)),
            }
        })
        .build()
}

/// A dot (circle or other symbol) centered on `left`/`top`.
pub fn dot() -> Rc<MarkType> {
    stroked_filled(MarkType::derive("dot", &mark()))
        .properties(&["shapeSize", "shapeRadius", "shapeAngle"], Some(cast::number))
        .property("shape", Some(cast::text))
        .default_value("shape", "circle")
        .default_fn("strokeStyle", |ctx| category(ctx.parent_index()))
        .implied(|s, _| match (s.number("shapeRadius"), s.number("shapeSize")) {
            (None, size) => {
                let size = size.unwrap_or(20.0);
                s.set("shapeSize", size.into());
                s.set("shapeRadius", size.sqrt().into());
            }
            (Some(r), None) => s.set("shapeSize", (r * r).into()),
            (Some(_), Some(_)) => {}
        })
        .shape(|scene, index| {
            let s = scene.get(index)?;
            let r = s.number("shapeRadius").unwrap_or(0.0);
            Some(Shape::Circle(Circle::new(anchor_point(s)?, r)))
        })
        .build()
}

/// An annular sector centered on `left`/`top`.
pub fn wedge() -> Rc<MarkType> {
    stroked_filled(MarkType::derive("wedge", &mark()))
        .properties(
            &["startAngle", "endAngle", "angle", "innerRadius", "outerRadius"],
            Some(cast::number),
        )
        .default_fn("startAngle", |ctx| {
            ctx.sibling("endAngle")
                .and_then(|v| v.as_f64())
                .unwrap_or(-FRAC_PI_2)
        })
        .default_value("innerRadius", 0.0)
        .default_fn("fillStyle", |ctx| category(ctx.index()))
        .implied(|s, _| {
            let start = s.number("startAngle").unwrap_or(0.0);
            match (s.number("angle"), s.number("endAngle")) {
                (None, end) => s.set("angle", (end.unwrap_or(start) - start).into()),
                (Some(angle), None) => s.set("endAngle", (start + angle).into()),
                (Some(_), Some(_)) => {}
            }
        })
        .shape(|scene, index| {
            let s = scene.get(index)?;
            Some(Shape::Wedge(Wedge::new(
                anchor_point(s)?,
                s.number("innerRadius").unwrap_or(0.0),
                s.number("outerRadius").unwrap_or(0.0),
                s.number("startAngle").unwrap_or(0.0),
                s.number("endAngle").unwrap_or(0.0),
            )))
        })
        .build()
}

/// A horizontal or vertical rule.
pub fn rule() -> Rc<MarkType> {
    MarkType::derive("rule", &mark())
        .properties(&["width", "height", "lineWidth"], Some(cast::number))
        .property("strokeStyle", Some(cast::color))
        .default_value("lineWidth", 1.0)
        .default_value("strokeStyle", Color::BLACK)
        .implied(|s, _| {
            let (l, r) = (s.number("left"), s.number("right"));
            // A rule spans one axis; the other collapses to zero.
            if s.number("width").is_some() || (l.is_none() && r.is_none()) || (l.is_some() && r.is_some()) {
                s.set("height", 0.0.into());
            } else {
                s.set("width", 0.0.into());
            }
        })
        .shape(|scene, index| {
            let s = scene.get(index)?;
            let p0 = anchor_point(s)?;
            let p1 = Point::new(
                p0.x + s.number("width").unwrap_or(0.0),
                p0.y + s.number("height").unwrap_or(0.0),
            );
            Some(Shape::Line(Line::new(p0, p1)))
        })
        .build()
}

/// A text label anchored at `left`/`top`.
pub fn label() -> Rc<MarkType> {
    MarkType::derive("label", &mark())
        .properties(
            &["text", "font", "textAlign", "textBaseline", "textDecoration", "textShadow"],
            Some(cast::text),
        )
        .properties(&["textAngle", "textMargin"], Some(cast::number))
        .property("textStyle", Some(cast::color))
        .default_fn("text", |ctx| ctx.datum())
        .default_value("font", "10px sans-serif")
        .default_value("textAngle", 0.0)
        .default_value("textStyle", Color::BLACK)
        .default_value("textAlign", "left")
        .default_value("textBaseline", "bottom")
        .default_value("textMargin", 3.0)
        .shape(|scene, index| Some(Shape::Point(anchor_point(scene.get(index)?)?)))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar_instance(vals: &[(&'static str, f64)]) -> Instance {
        let mut s = Instance::new(0, Value::Null);
        for &(k, v) in vals {
            s.set(k, v.into());
        }
        s
    }

    fn parent(w: f64, h: f64) -> Instance {
        bar_instance(&[("width", w), ("height", h)])
    }

    #[test]
    fn width_is_derived_from_left_and_right() {
        let mut s = bar_instance(&[("left", 10.0), ("right", 20.0), ("top", 0.0), ("height", 5.0)]);
        bar().build_implied(&mut s, Some(&parent(100.0, 50.0)));
        assert_eq!(s.number("width"), Some(70.0));
        assert_eq!(s.number("bottom"), Some(45.0));
    }

    #[test]
    fn unset_margins_center_the_box() {
        let mut s = bar_instance(&[("width", 40.0), ("height", 10.0)]);
        bar().build_implied(&mut s, Some(&parent(100.0, 50.0)));
        assert_eq!(s.number("left"), Some(30.0));
        assert_eq!(s.number("right"), Some(30.0));
        assert_eq!(s.number("top"), Some(20.0));
        assert_eq!(s.number("bottom"), Some(20.0));
    }

    #[test]
    fn right_and_left_are_completed_from_each_other() {
        let mut s = bar_instance(&[("left", 10.0), ("width", 40.0), ("bottom", 5.0), ("height", 10.0)]);
        bar().build_implied(&mut s, Some(&parent(100.0, 50.0)));
        assert_eq!(s.number("right"), Some(50.0));
        assert_eq!(s.number("top"), Some(35.0));
    }

    #[test]
    fn unsized_types_are_treated_as_points() {
        let mut s = bar_instance(&[]);
        dot().build_implied(&mut s, Some(&parent(100.0, 60.0)));
        assert_eq!(s.number("left"), Some(50.0));
        assert_eq!(s.number("top"), Some(30.0));
        assert_eq!(s.number("width"), None);
        assert_eq!(s.number("shapeSize"), Some(20.0));
    }

    #[test]
    fn unset_styles_become_transparent() {
        let mut s = bar_instance(&[("width", 1.0), ("height", 1.0)]);
        bar().build_implied(&mut s, None);
        assert_eq!(s.get("fillStyle"), Value::Color(Color::TRANSPARENT));
        assert_eq!(s.get("strokeStyle"), Value::Color(Color::TRANSPARENT));
        assert!(s.get("textStyle").is_null(), "bars do not declare textStyle");
    }

    #[test]
    fn wedge_angle_completion() {
        let mut s = bar_instance(&[("startAngle", 1.0), ("endAngle", 3.0)]);
        wedge().build_implied(&mut s, None);
        assert_eq!(s.number("angle"), Some(2.0));

        let mut s = bar_instance(&[("startAngle", 1.0), ("angle", 0.5)]);
        wedge().build_implied(&mut s, None);
        assert_eq!(s.number("endAngle"), Some(1.5));
    }

    #[test]
    fn derived_types_inherit_declarations() {
        let custom = MarkType::derive("sparkbar", &bar())
            .property("threshold", Some(cast::number))
            .build();
        assert!(custom.declares("threshold"));
        assert!(custom.declares("fillStyle"));
        assert!(!custom.is_panel());
        assert_eq!(custom.cast("width").map(|c| c(Value::from("2"))), Some(Value::Number(2.0)));
        assert!(panel().is_panel());
    }
}
