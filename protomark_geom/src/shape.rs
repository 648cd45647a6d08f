// Copyright 2025 the Protomark Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The [`Shape`] sum type and its common capability set.

extern crate alloc;

use alloc::vec;
use alloc::vec::Vec;
use core::f64::consts::PI;

use kurbo::{Circle, Line, Point, Rect, TranslateScale};

use crate::arc::{Arc, Wedge};
use crate::distance::{Distance, EPSILON, Weight, nearest_on_segment, segment_intersection};
#[cfg(not(feature = "std"))]
use crate::float::FloatExt;
use crate::polygon::{Polygon, on_segment, rect_contains, rect_edges};

/// A geometric primitive used for hit testing.
///
/// Every variant supports the same operations; behaviors (drag, select, point) rank candidate
/// marks by [`Shape::distance2`] and filter them with [`Shape::intersects_rect`].
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    /// A single point.
    Point(Point),
    /// A line segment.
    Line(Line),
    /// An axis-aligned rectangle.
    Rect(Rect),
    /// A closed polygon.
    Polygon(Polygon),
    /// A filled circle.
    Circle(Circle),
    /// A circular arc (curve only).
    Arc(Arc),
    /// An annular sector.
    Wedge(Wedge),
}

impl Shape {
    /// Whether `p` lies on or within the shape.
    pub fn contains_point(&self, p: Point) -> bool {
        match self {
            Self::Point(q) => (p - *q).hypot2() <= EPSILON * EPSILON,
            Self::Line(l) => on_segment(*l, p),
            Self::Rect(r) => rect_contains(*r, p),
            Self::Polygon(poly) => poly.contains_point(p),
            Self::Circle(c) => (p - c.center).hypot2() <= c.radius * c.radius + EPSILON,
            Self::Arc(a) => a.contains_point(p),
            Self::Wedge(w) => w.contains_point(p),
        }
    }

    /// Weighted squared distance from `p` to the shape.
    ///
    /// `cost` is zero exactly when `p` is on or within the shape.
    pub fn distance2(&self, p: Point, weight: Weight) -> Distance {
        match self {
            Self::Point(q) => Distance::between(p, *q, weight),
            Self::Line(l) => Distance::between(p, nearest_on_segment(*l, p), weight),
            Self::Rect(r) => {
                let r = r.abs();
                let nearest = Point::new(p.x.clamp(r.x0, r.x1), p.y.clamp(r.y0, r.y1));
                Distance::between(p, nearest, weight)
            }
            Self::Polygon(poly) => poly.distance2(p, weight),
            Self::Circle(c) => {
                let v = p - c.center;
                let len2 = v.hypot2();
                let len = len2.sqrt();
                if len2 <= c.radius * c.radius + EPSILON || len <= c.radius {
                    Distance::ZERO
                } else {
                    Distance::from_offset(v * ((len - c.radius) / len), weight)
                }
            }
            Self::Arc(a) => a.distance2(p, weight),
            Self::Wedge(w) => w.distance2(p, weight),
        }
    }

    /// Whether the shape overlaps `rect` (touching counts).
    pub fn intersects_rect(&self, rect: Rect) -> bool {
        let rect = rect.abs();
        match self {
            Self::Point(p) => rect_contains(rect, *p),
            Self::Line(l) => {
                rect_contains(rect, l.p0)
                    || rect_contains(rect, l.p1)
                    || rect_edges(rect)
                        .iter()
                        .any(|e| segment_intersection(*l, *e).is_some())
            }
            Self::Rect(r) => {
                let r = r.abs();
                r.x0 <= rect.x1 && r.x1 >= rect.x0 && r.y0 <= rect.y1 && r.y1 >= rect.y0
            }
            Self::Polygon(poly) => poly.intersects_rect(rect),
            Self::Circle(c) => {
                let nearest = Point::new(
                    c.center.x.clamp(rect.x0, rect.x1),
                    c.center.y.clamp(rect.y0, rect.y1),
                );
                (c.center - nearest).hypot2() <= c.radius * c.radius
            }
            Self::Arc(a) => a.intersects_rect(rect),
            Self::Wedge(w) => w.intersects_rect(rect),
        }
    }

    /// Characteristic points of the shape (vertices, endpoints or centers).
    pub fn points(&self) -> Vec<Point> {
        match self {
            Self::Point(p) => vec![*p],
            Self::Line(l) => vec![l.p0, l.p1],
            Self::Rect(r) => {
                let r = r.abs();
                vec![
                    Point::new(r.x0, r.y0),
                    Point::new(r.x1, r.y0),
                    Point::new(r.x1, r.y1),
                    Point::new(r.x0, r.y1),
                ]
            }
            Self::Polygon(poly) => poly.points.clone(),
            Self::Circle(c) => vec![c.center],
            Self::Arc(a) => a.endpoints().to_vec(),
            Self::Wedge(w) => w.corners().to_vec(),
        }
    }

    /// Boundary pieces of the shape.
    ///
    /// Rects and polygons yield [`Shape::Line`]s; wedges yield their radial lines and arcs; a
    /// circle yields a full arc. A point has no edges.
    pub fn edges(&self) -> Vec<Self> {
        match self {
            Self::Point(_) => Vec::new(),
            Self::Line(l) => vec![Self::Line(*l)],
            Self::Rect(r) => rect_edges(*r).into_iter().map(Self::Line).collect(),
            Self::Polygon(poly) => poly.edges().map(Self::Line).collect(),
            Self::Circle(c) => vec![Self::Arc(Arc::new(c.center, c.radius, 0.0, 2.0 * PI))],
            Self::Arc(a) => vec![Self::Arc(*a)],
            Self::Wedge(w) => {
                let mut out = Vec::with_capacity(4);
                let [start, end] = w.radial_edges();
                if !w.is_full() {
                    out.push(Self::Line(start));
                }
                out.push(Self::Arc(w.outer_arc()));
                if !w.is_full() {
                    out.push(Self::Line(end));
                }
                if w.inner_radius > EPSILON {
                    let inner = w.inner_arc();
                    out.push(Self::Arc(Arc::new(
                        inner.center,
                        inner.radius,
                        inner.end_angle,
                        inner.start_angle,
                    )));
                }
                out
            }
        }
    }

    /// A representative interior (or on-curve) point.
    pub fn center(&self) -> Point {
        match self {
            Self::Point(p) => *p,
            Self::Line(l) => l.p0.midpoint(l.p1),
            Self::Rect(r) => r.center(),
            Self::Polygon(poly) => poly.center(),
            Self::Circle(c) => c.center,
            Self::Arc(a) => a.midpoint(),
            Self::Wedge(w) => w.center_point(),
        }
    }

    /// Applies a translate-and-uniform-scale transform.
    ///
    /// A negative scale is a half-turn, so arcs and wedges rotate their angles by `PI`.
    #[must_use]
    pub fn apply(&self, t: TranslateScale) -> Self {
        let turn = if t.scale < 0.0 { PI } else { 0.0 };
        let k = t.scale.abs();
        match self {
            Self::Point(p) => Self::Point(t * *p),
            Self::Line(l) => Self::Line(Line::new(t * l.p0, t * l.p1)),
            Self::Rect(r) => Self::Rect(Rect::from_points(
                t * Point::new(r.x0, r.y0),
                t * Point::new(r.x1, r.y1),
            )),
            Self::Polygon(poly) => Self::Polygon(Polygon::new(poly.points.iter().map(|p| t * *p))),
            Self::Circle(c) => Self::Circle(Circle::new(t * c.center, c.radius * k)),
            Self::Arc(a) => Self::Arc(Arc::new(
                t * a.center,
                a.radius * k,
                a.start_angle + turn,
                a.end_angle + turn,
            )),
            Self::Wedge(w) => Self::Wedge(Wedge::new(
                t * w.center,
                w.inner_radius * k,
                w.outer_radius * k,
                w.start_angle + turn,
                w.end_angle + turn,
            )),
        }
    }

    /// Structural comparison within `eps`.
    ///
    /// Two shapes are equal when they are the same variant and all defining numbers (vertices,
    /// radii, angles) match.
    pub fn approx_eq(&self, other: &Self, eps: f64) -> bool {
        if core::mem::discriminant(self) != core::mem::discriminant(other) {
            return false;
        }
        let (a, b) = (self.params(), other.params());
        a.len() == b.len() && a.iter().zip(&b).all(|(x, y)| (x - y).abs() <= eps)
    }

    fn params(&self) -> Vec<f64> {
        let mut out: Vec<f64> = self.points().iter().flat_map(|p| [p.x, p.y]).collect();
        match self {
            Self::Circle(c) => out.push(c.radius),
            Self::Arc(a) => out.extend([a.radius, a.start_angle, a.end_angle]),
            Self::Wedge(w) => out.extend([
                w.center.x,
                w.center.y,
                w.inner_radius,
                w.outer_radius,
                w.start_angle,
                w.end_angle,
            ]),
            _ => {}
        }
        out
    }
}

impl From<Point> for Shape {
    fn from(p: Point) -> Self {
        Self::Point(p)
    }
}

impl From<Line> for Shape {
    fn from(l: Line) -> Self {
        Self::Line(l)
    }
}

impl From<Rect> for Shape {
    fn from(r: Rect) -> Self {
        Self::Rect(r)
    }
}

impl From<Polygon> for Shape {
    fn from(p: Polygon) -> Self {
        Self::Polygon(p)
    }
}

impl From<Circle> for Shape {
    fn from(c: Circle) -> Self {
        Self::Circle(c)
    }
}

impl From<Arc> for Shape {
    fn from(a: Arc) -> Self {
        Self::Arc(a)
    }
}

impl From<Wedge> for Shape {
    fn from(w: Wedge) -> Self {
        Self::Wedge(w)
    }
}

#[cfg(test)]
mod tests {
    use core::f64::consts::FRAC_PI_2;

    use kurbo::Vec2;

    use super::*;

    fn all_shapes() -> Vec<Shape> {
        vec![
            Shape::Point(Point::new(1.0, 2.0)),
            Shape::Line(Line::new((0.0, 0.0), (4.0, 3.0))),
            Shape::Rect(Rect::new(0.0, 0.0, 10.0, 10.0)),
            Shape::Polygon(Polygon::new([(0.0, 0.0), (10.0, 0.0), (5.0, 8.0)])),
            Shape::Circle(Circle::new((5.0, 5.0), 3.0)),
            Shape::Arc(Arc::new((0.0, 0.0), 10.0, 0.0, FRAC_PI_2)),
            Shape::Wedge(Wedge::new((0.0, 0.0), 2.0, 10.0, 0.0, FRAC_PI_2)),
        ]
    }

    #[test]
    fn rect_contains_point_with_zero_cost() {
        let rect = Shape::Rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        let inside = Point::new(5.0, 5.0);
        assert!(rect.contains_point(inside));
        assert_eq!(rect.distance2(inside, Weight::UNIT).cost, 0.0);

        let outside = Point::new(20.0, 5.0);
        assert!(!rect.contains_point(outside));
        assert_eq!(rect.distance2(outside, Weight::UNIT).dist2, 100.0);
    }

    #[test]
    fn identity_transform_round_trips() {
        for shape in all_shapes() {
            let moved = shape.apply(TranslateScale::new(Vec2::ZERO, 1.0));
            assert!(moved.approx_eq(&shape, 1e-12), "{shape:?} != {moved:?}");
        }
    }

    #[test]
    fn transforms_compose() {
        let t1 = TranslateScale::new(Vec2::new(3.0, -2.0), 2.0);
        let t2 = TranslateScale::new(Vec2::new(-1.0, 5.0), 0.5);
        // t1 after t2: x -> k1 * (k2 * x + t2) + t1
        let composed = TranslateScale::new(t1.translation + t2.translation * t1.scale, t1.scale * t2.scale);
        for shape in all_shapes() {
            let stepwise = shape.apply(t2).apply(t1);
            let direct = shape.apply(composed);
            assert!(stepwise.approx_eq(&direct, 1e-9), "{stepwise:?} != {direct:?}");
        }
    }

    #[test]
    fn containment_implies_zero_distance() {
        let areas = [
            Shape::Rect(Rect::new(0.0, 0.0, 10.0, 10.0)),
            Shape::Polygon(Polygon::new([(0.0, 0.0), (10.0, 0.0), (5.0, 8.0)])),
            Shape::Circle(Circle::new((5.0, 5.0), 3.0)),
        ];
        let weight = Weight::new(1.0, 0.25);
        for shape in &areas {
            for ix in -2..=12 {
                for iy in -2..=12 {
                    let p = Point::new(f64::from(ix), f64::from(iy));
                    let d = shape.distance2(p, weight);
                    assert!(d.cost >= 0.0);
                    if shape.contains_point(p) {
                        assert_eq!(d.dist2, 0.0, "{shape:?} at {p:?}");
                        assert_eq!(d.cost, 0.0, "{shape:?} at {p:?}");
                    } else {
                        assert!(d.cost > 0.0, "{shape:?} at {p:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn collapsed_weight_biases_cost_only() {
        let line = Shape::Line(Line::new((0.0, 0.0), (0.0, 10.0)));
        let p = Point::new(4.0, 5.0);
        let plain = line.distance2(p, Weight::UNIT);
        let collapsed = line.distance2(p, Weight::collapse_x());
        assert_eq!(plain.dist2, collapsed.dist2);
        assert!(collapsed.cost < plain.cost);
    }

    #[test]
    fn wedge_edges_include_both_arcs() {
        let w = Shape::Wedge(Wedge::new((0.0, 0.0), 2.0, 10.0, 0.0, FRAC_PI_2));
        let edges = w.edges();
        assert_eq!(edges.len(), 4);
        assert_eq!(
            edges.iter().filter(|e| matches!(e, Shape::Arc(_))).count(),
            2
        );
    }

    #[test]
    fn circle_intersects_rect_near_corner() {
        let c = Shape::Circle(Circle::new((0.0, 0.0), 5.0));
        assert!(c.intersects_rect(Rect::new(3.0, 3.0, 10.0, 10.0)));
        assert!(!c.intersects_rect(Rect::new(4.0, 4.0, 10.0, 10.0)));
    }
}
