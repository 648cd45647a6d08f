// Copyright 2025 the Protomark Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Circular arcs and wedges (annular sectors).
//!
//! Angles are in radians and follow screen coordinates: `0` points along `+x` and positive
//! angles turn towards `+y` (clockwise on screen). A negative sweep is allowed.

use core::f64::consts::TAU;

use kurbo::{Line, Point, Rect, Vec2};
use smallvec::SmallVec;

use crate::distance::{Distance, EPSILON, Weight, nearest_on_segment};
#[cfg(not(feature = "std"))]
use crate::float::FloatExt;
use crate::polygon::{on_segment, rect_contains, rect_corners, rect_edges};

/// A circular arc (a curve, without area).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Arc {
    /// Center of the supporting circle.
    pub center: Point,
    /// Radius of the supporting circle.
    pub radius: f64,
    /// Start angle in radians.
    pub start_angle: f64,
    /// End angle in radians.
    pub end_angle: f64,
}

impl Arc {
    /// Creates an arc.
    pub fn new(center: impl Into<Point>, radius: f64, start_angle: f64, end_angle: f64) -> Self {
        Self {
            center: center.into(),
            radius: radius.abs(),
            start_angle,
            end_angle,
        }
    }

    /// Signed sweep (`end_angle - start_angle`).
    pub fn sweep(&self) -> f64 {
        self.end_angle - self.start_angle
    }

    /// Point of the supporting circle at `angle`.
    pub fn point_at(&self, angle: f64) -> Point {
        polar(self.center, self.radius, angle)
    }

    /// Start and end points.
    pub fn endpoints(&self) -> [Point; 2] {
        [self.point_at(self.start_angle), self.point_at(self.end_angle)]
    }

    /// Point halfway along the arc.
    pub fn midpoint(&self) -> Point {
        self.point_at(self.start_angle + self.sweep() / 2.0)
    }

    /// Whether `angle` lies within the arc's sweep.
    pub fn contains_angle(&self, angle: f64) -> bool {
        angle_in_sweep(angle, self.start_angle, self.end_angle)
    }

    /// The point of the arc closest to `p`.
    pub fn nearest(&self, p: Point) -> Point {
        let v = p - self.center;
        let len = v.hypot2().sqrt();
        if self.radius <= EPSILON {
            return self.center;
        }
        if len > EPSILON {
            let angle = v.y.atan2(v.x);
            if self.contains_angle(angle) {
                return self.center + v * (self.radius / len);
            }
        }
        let [a, b] = self.endpoints();
        if (p - a).hypot2() <= (p - b).hypot2() {
            a
        } else {
            b
        }
    }

    /// Weighted squared distance from `p` to the curve.
    pub fn distance2(&self, p: Point, weight: Weight) -> Distance {
        Distance::between(p, self.nearest(p), weight)
    }

    /// Whether `p` lies on the curve.
    pub fn contains_point(&self, p: Point) -> bool {
        self.distance2(p, Weight::UNIT).is_zero()
    }

    /// Intersections of a segment with this arc.
    pub fn segment_intersections(&self, line: Line) -> SmallVec<[Point; 2]> {
        circle_segment_intersections(self.center, self.radius, line)
            .into_iter()
            .filter(|p| {
                let v = *p - self.center;
                self.contains_angle(v.y.atan2(v.x))
            })
            .collect()
    }

    /// Whether the arc overlaps `rect`.
    pub fn intersects_rect(&self, rect: Rect) -> bool {
        if self.endpoints().iter().any(|p| rect_contains(rect, *p)) {
            return true;
        }
        rect_edges(rect)
            .iter()
            .any(|e| !self.segment_intersections(*e).is_empty())
    }
}

/// An annular sector: the region between two radii within an angular sweep.
///
/// A zero inner radius gives a pie slice.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Wedge {
    /// Center of the wedge.
    pub center: Point,
    /// Inner radius (`0` for a pie slice).
    pub inner_radius: f64,
    /// Outer radius.
    pub outer_radius: f64,
    /// Start angle in radians.
    pub start_angle: f64,
    /// End angle in radians.
    pub end_angle: f64,
}

impl Wedge {
    /// Creates a wedge. Radii are swapped if given out of order.
    pub fn new(
        center: impl Into<Point>,
        inner_radius: f64,
        outer_radius: f64,
        start_angle: f64,
        end_angle: f64,
    ) -> Self {
        let (a, b) = (inner_radius.abs(), outer_radius.abs());
        Self {
            center: center.into(),
            inner_radius: a.min(b),
            outer_radius: a.max(b),
            start_angle,
            end_angle,
        }
    }

    /// The outer boundary arc.
    pub fn outer_arc(&self) -> Arc {
        Arc::new(self.center, self.outer_radius, self.start_angle, self.end_angle)
    }

    /// The inner boundary arc (degenerate when `inner_radius == 0`).
    pub fn inner_arc(&self) -> Arc {
        Arc::new(self.center, self.inner_radius, self.start_angle, self.end_angle)
    }

    /// Whether this wedge covers the full circle (no radial edges).
    pub fn is_full(&self) -> bool {
        (self.end_angle - self.start_angle).abs() >= TAU - EPSILON
    }

    /// The two radial edges, start then end.
    pub fn radial_edges(&self) -> [Line; 2] {
        [
            Line::new(
                polar(self.center, self.inner_radius, self.start_angle),
                polar(self.center, self.outer_radius, self.start_angle),
            ),
            Line::new(
                polar(self.center, self.outer_radius, self.end_angle),
                polar(self.center, self.inner_radius, self.end_angle),
            ),
        ]
    }

    /// Corner points: inner start, outer start, outer end, inner end.
    pub fn corners(&self) -> [Point; 4] {
        let [a, b] = self.radial_edges();
        [a.p0, a.p1, b.p0, b.p1]
    }

    /// Point halfway along the sweep, halfway between the radii.
    pub fn center_point(&self) -> Point {
        let mid = self.start_angle + (self.end_angle - self.start_angle) / 2.0;
        polar(self.center, (self.inner_radius + self.outer_radius) / 2.0, mid)
    }

    /// Whether `p` lies within the wedge (boundary included).
    pub fn contains_point(&self, p: Point) -> bool {
        let v = p - self.center;
        let r = v.hypot2().sqrt();
        if r < self.inner_radius - EPSILON || r > self.outer_radius + EPSILON {
            return false;
        }
        if r <= EPSILON {
            // The center belongs to pie slices only.
            return self.inner_radius <= EPSILON;
        }
        if self.is_full() || angle_in_sweep(v.y.atan2(v.x), self.start_angle, self.end_angle) {
            return true;
        }
        self.radial_edges().iter().any(|e| on_segment(*e, p))
    }

    /// Weighted squared distance from `p` (zero inside).
    pub fn distance2(&self, p: Point, weight: Weight) -> Distance {
        if self.contains_point(p) {
            return Distance::ZERO;
        }
        let mut best = self.outer_arc().distance2(p, weight);
        if self.inner_radius > EPSILON {
            best = best.min(self.inner_arc().distance2(p, weight));
        }
        if !self.is_full() {
            for e in self.radial_edges() {
                best = best.min(Distance::between(p, nearest_on_segment(e, p), weight));
            }
        }
        best
    }

    /// Whether the wedge overlaps `rect`.
    pub fn intersects_rect(&self, rect: Rect) -> bool {
        if self.corners().iter().any(|p| rect_contains(rect, *p))
            || rect_contains(rect, self.center_point())
        {
            return true;
        }
        if rect_corners(rect).iter().any(|c| self.contains_point(*c)) {
            return true;
        }
        rect_edges(rect).iter().any(|side| {
            !self.outer_arc().segment_intersections(*side).is_empty()
                || (self.inner_radius > EPSILON
                    && !self.inner_arc().segment_intersections(*side).is_empty())
                || (!self.is_full()
                    && self
                        .radial_edges()
                        .iter()
                        .any(|e| crate::distance::segment_intersection(*e, *side).is_some()))
        })
    }
}

/// `center + r * (cos a, sin a)`.
pub fn polar(center: Point, radius: f64, angle: f64) -> Point {
    center + Vec2::new(angle.cos(), angle.sin()) * radius
}

/// Normalizes an angle into `[0, TAU)`.
pub fn normalize_angle(angle: f64) -> f64 {
    let r = angle % TAU;
    if r < 0.0 { r + TAU } else { r }
}

/// Whether `angle` lies in the (possibly negative) sweep from `start` to `end`.
pub fn angle_in_sweep(angle: f64, start: f64, end: f64) -> bool {
    let sweep = end - start;
    if sweep.abs() >= TAU - EPSILON {
        return true;
    }
    let (lo, len) = if sweep >= 0.0 {
        (start, sweep)
    } else {
        (end, -sweep)
    };
    let d = normalize_angle(angle - lo);
    d <= len + EPSILON || d >= TAU - EPSILON
}

fn circle_segment_intersections(center: Point, radius: f64, line: Line) -> SmallVec<[Point; 2]> {
    let mut out = SmallVec::new();
    let d = line.p1 - line.p0;
    let f = line.p0 - center;
    let a = d.dot(d);
    if a <= EPSILON * EPSILON {
        if (f.hypot2().sqrt() - radius).abs() <= EPSILON {
            out.push(line.p0);
        }
        return out;
    }
    let b = 2.0 * f.dot(d);
    let c = f.dot(f) - radius * radius;
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return out;
    }
    let sq = disc.sqrt();
    for t in [(-b - sq) / (2.0 * a), (-b + sq) / (2.0 * a)] {
        if (-EPSILON..=1.0 + EPSILON).contains(&t) {
            let p = line.p0 + d * t;
            if !out.iter().any(|q: &Point| (*q - p).hypot2() <= EPSILON * EPSILON) {
                out.push(p);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use core::f64::consts::{FRAC_PI_2, PI};

    use super::*;

    #[test]
    fn negative_sweeps_are_supported() {
        assert!(angle_in_sweep(-0.5, 0.0, -1.0));
        assert!(!angle_in_sweep(0.5, 0.0, -1.0));
        assert!(angle_in_sweep(0.5, 0.0, 1.0));
    }

    #[test]
    fn arc_distance_inside_sweep_is_radial() {
        let arc = Arc::new((0.0, 0.0), 10.0, 0.0, FRAC_PI_2);
        let d = arc.distance2(Point::new(15.0, 0.0), Weight::UNIT);
        assert!((d.dist2 - 25.0).abs() < 1e-9);
        assert!(arc.contains_point(Point::new(0.0, 10.0)));
    }

    #[test]
    fn arc_distance_outside_sweep_uses_endpoints() {
        let arc = Arc::new((0.0, 0.0), 10.0, 0.0, FRAC_PI_2);
        // Directly "above" the center (negative y) is outside the sweep.
        let d = arc.distance2(Point::new(0.0, -10.0), Weight::UNIT);
        assert!((d.dist2 - 200.0).abs() < 1e-9);
    }

    #[test]
    fn donut_wedge_excludes_hole_and_center() {
        let w = Wedge::new((0.0, 0.0), 5.0, 10.0, 0.0, PI);
        assert!(w.contains_point(Point::new(0.0, 7.0)));
        assert!(!w.contains_point(Point::new(0.0, 2.0)));
        assert!(!w.contains_point(Point::new(0.0, 0.0)));
        let d = w.distance2(Point::new(0.0, 2.0), Weight::UNIT);
        assert!((d.dist2 - 9.0).abs() < 1e-9);
    }

    #[test]
    fn pie_slice_contains_center() {
        let w = Wedge::new((0.0, 0.0), 0.0, 10.0, 0.0, FRAC_PI_2);
        assert!(w.contains_point(Point::new(0.0, 0.0)));
        assert!(w.intersects_rect(Rect::new(-1.0, -1.0, 1.0, 1.0)));
        assert!(!w.intersects_rect(Rect::new(-20.0, -20.0, -15.0, -15.0)));
    }
}
