// Copyright 2025 the Protomark Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Closed polygons.

extern crate alloc;

use alloc::vec::Vec;

use kurbo::{Line, Point, Rect};

use crate::distance::{Distance, EPSILON, Weight, nearest_on_segment, segment_intersection};

/// A closed polygon given by its vertices.
///
/// The last vertex connects back to the first. Polygons with fewer than three vertices have no
/// area; they still report distances to their edges.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Polygon {
    /// Vertices in drawing order.
    pub points: Vec<Point>,
}

impl Polygon {
    /// Creates a polygon from its vertices.
    pub fn new(points: impl IntoIterator<Item = impl Into<Point>>) -> Self {
        Self {
            points: points.into_iter().map(Into::into).collect(),
        }
    }

    /// Iterates the closing edges of the polygon.
    pub fn edges(&self) -> impl Iterator<Item = Line> + '_ {
        let n = self.points.len();
        let count = match n {
            0 | 1 => 0,
            2 => 1,
            _ => n,
        };
        (0..count).map(move |i| Line::new(self.points[i], self.points[(i + 1) % n]))
    }

    /// Axis-aligned bounding box, or `None` for an empty polygon.
    pub fn bounds(&self) -> Option<Rect> {
        let (first, rest) = self.points.split_first()?;
        let mut r = Rect::from_points(*first, *first);
        for p in rest {
            r = r.union_pt(*p);
        }
        Some(r)
    }

    /// Average of the vertices.
    pub fn center(&self) -> Point {
        if self.points.is_empty() {
            return Point::ZERO;
        }
        let mut sx = 0.0;
        let mut sy = 0.0;
        for p in &self.points {
            sx += p.x;
            sy += p.y;
        }
        let n = self.points.len() as f64;
        Point::new(sx / n, sy / n)
    }

    /// Ray-casting containment test.
    ///
    /// The ray starts slightly left of the bounding box (extended by an epsilon proportional to
    /// its width) and ends at `p`. Edge crossings are counted with a half-open rule on `y` so a
    /// ray through a vertex is counted once. Points on an edge are inside.
    pub fn contains_point(&self, p: Point) -> bool {
        if self.points.len() < 3 {
            return self.edges().any(|e| on_segment(e, p));
        }
        let Some(bbox) = self.bounds() else {
            return false;
        };
        if !rect_contains(bbox, p) {
            return false;
        }
        if self.edges().any(|e| on_segment(e, p)) {
            return true;
        }
        let ray_x0 = bbox.x0 - (bbox.width() * 0.01).max(EPSILON);
        let mut crossings = 0_usize;
        for edge in self.edges() {
            let (a, b) = (edge.p0, edge.p1);
            if (a.y > p.y) == (b.y > p.y) {
                continue;
            }
            let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if x >= ray_x0 && x < p.x {
                crossings += 1;
            }
        }
        crossings % 2 == 1
    }

    /// Weighted squared distance from `p` to the polygon (zero inside).
    pub fn distance2(&self, p: Point, weight: Weight) -> Distance {
        if self.contains_point(p) {
            return Distance::ZERO;
        }
        match self.points.as_slice() {
            [] => Distance::ZERO,
            [only] => Distance::between(p, *only, weight),
            _ => self
                .edges()
                .map(|e| Distance::between(p, nearest_on_segment(e, p), weight))
                .fold(None, |acc: Option<Distance>, d| {
                    Some(acc.map_or(d, |a| a.min(d)))
                })
                .unwrap_or(Distance::ZERO),
        }
    }

    /// Whether the polygon overlaps `rect`.
    pub fn intersects_rect(&self, rect: Rect) -> bool {
        let rect = rect.abs();
        if self.points.iter().any(|p| rect_contains(rect, *p)) {
            return true;
        }
        let corners = rect_corners(rect);
        if corners.iter().any(|c| self.contains_point(*c)) {
            return true;
        }
        let sides = rect_edges(rect);
        self.edges()
            .any(|e| sides.iter().any(|s| segment_intersection(e, *s).is_some()))
    }
}

pub(crate) fn on_segment(line: Line, p: Point) -> bool {
    (p - nearest_on_segment(line, p)).hypot2() <= EPSILON * EPSILON
}

/// Inclusive containment (kurbo's `Rect::contains` is half-open).
pub(crate) fn rect_contains(rect: Rect, p: Point) -> bool {
    let r = rect.abs();
    p.x >= r.x0 - EPSILON && p.x <= r.x1 + EPSILON && p.y >= r.y0 - EPSILON && p.y <= r.y1 + EPSILON
}

pub(crate) fn rect_corners(rect: Rect) -> [Point; 4] {
    let r = rect.abs();
    [
        Point::new(r.x0, r.y0),
        Point::new(r.x1, r.y0),
        Point::new(r.x1, r.y1),
        Point::new(r.x0, r.y1),
    ]
}

pub(crate) fn rect_edges(rect: Rect) -> [Line; 4] {
    let [a, b, c, d] = rect_corners(rect);
    [Line::new(a, b), Line::new(b, c), Line::new(c, d), Line::new(d, a)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Polygon {
        Polygon::new([(0.0, 0.0), (10.0, 0.0), (5.0, 10.0)])
    }

    #[test]
    fn ray_through_vertex_is_counted_once() {
        // The horizontal ray at y = 0 passes through two vertices.
        let diamond = Polygon::new([(5.0, -5.0), (10.0, 0.0), (5.0, 5.0), (0.0, 0.0)]);
        assert!(diamond.contains_point(Point::new(5.0, 0.0)));
        assert!(!diamond.contains_point(Point::new(11.0, 0.0)));
    }

    #[test]
    fn edge_points_are_inside_with_zero_distance() {
        let t = triangle();
        let p = Point::new(5.0, 0.0);
        assert!(t.contains_point(p));
        assert!(t.distance2(p, Weight::UNIT).is_zero());
    }

    #[test]
    fn outside_distance_is_to_nearest_edge() {
        let t = triangle();
        let d = t.distance2(Point::new(5.0, -3.0), Weight::UNIT);
        assert!((d.dist2 - 9.0).abs() < 1e-9);
        assert!(!t.contains_point(Point::new(5.0, -3.0)));
    }

    #[test]
    fn intersects_rect_detects_overlap_without_contained_vertices() {
        let t = triangle();
        // A thin rect crossing the triangle's middle, vertices all outside.
        assert!(t.intersects_rect(Rect::new(-5.0, 4.0, 15.0, 5.0)));
        assert!(!t.intersects_rect(Rect::new(20.0, 20.0, 30.0, 30.0)));
    }
}
