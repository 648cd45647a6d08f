// Copyright 2025 the Protomark Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Weighted squared distances.

use kurbo::{Line, Point, Vec2};

/// Tolerance used for degenerate geometry and boundary checks.
pub const EPSILON: f64 = 1e-9;

/// Smallest weight component accepted by [`Weight::new`].
///
/// A zero weight would let `cost` vanish for points off the shape.
pub const MIN_WEIGHT: f64 = 1e-6;

/// Anisotropic weight applied to the components of an offset when computing a cost.
///
/// Behaviors restricted to one dimension (a horizontal-only drag, for example) "collapse" the
/// other axis by giving it a tiny weight. The geometry itself is unchanged; only the ranking
/// between candidate shapes is biased.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Weight {
    /// Weight of the squared horizontal offset.
    pub x: f64,
    /// Weight of the squared vertical offset.
    pub y: f64,
}

impl Weight {
    /// Isotropic weight: `cost == dist2`.
    pub const UNIT: Self = Self { x: 1.0, y: 1.0 };

    /// Creates a weight, clamping each component to at least [`MIN_WEIGHT`].
    ///
    /// Non-finite components are also replaced by [`MIN_WEIGHT`].
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: clamp_weight(x),
            y: clamp_weight(y),
        }
    }

    /// Weight that (almost) ignores horizontal offsets.
    pub fn collapse_x() -> Self {
        Self::new(MIN_WEIGHT, 1.0)
    }

    /// Weight that (almost) ignores vertical offsets.
    pub fn collapse_y() -> Self {
        Self::new(1.0, MIN_WEIGHT)
    }

    /// Weighted squared length of `v`.
    pub fn cost(self, v: Vec2) -> f64 {
        self.x * v.x * v.x + self.y * v.y * v.y
    }
}

impl Default for Weight {
    fn default() -> Self {
        Self::UNIT
    }
}

fn clamp_weight(w: f64) -> f64 {
    if w.is_finite() && w > MIN_WEIGHT {
        w
    } else {
        MIN_WEIGHT
    }
}

/// Result of [`crate::Shape::distance2`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Distance {
    /// Weighted squared distance, used for ranking hits.
    pub cost: f64,
    /// Unweighted squared euclidean distance.
    pub dist2: f64,
}

impl Distance {
    /// The point lies on or within the shape.
    pub const ZERO: Self = Self {
        cost: 0.0,
        dist2: 0.0,
    };

    /// Distance for an offset from the nearest point of a shape.
    pub fn from_offset(v: Vec2, weight: Weight) -> Self {
        let dist2 = v.hypot2();
        if !dist2.is_finite() || dist2 <= EPSILON * EPSILON {
            return Self::ZERO;
        }
        Self {
            cost: weight.cost(v),
            dist2,
        }
    }

    /// Distance between `p` and `nearest`.
    pub fn between(p: Point, nearest: Point, weight: Weight) -> Self {
        Self::from_offset(p - nearest, weight)
    }

    /// Returns the smaller of two distances, ranking by `cost` then `dist2`.
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        if (other.cost, other.dist2) < (self.cost, self.dist2) {
            other
        } else {
            self
        }
    }

    /// Whether the point was on or within the shape.
    pub fn is_zero(self) -> bool {
        self.cost == 0.0
    }
}

/// The point of `line` closest to `p`.
///
/// Zero-length segments degrade to their start point.
pub fn nearest_on_segment(line: Line, p: Point) -> Point {
    let d = line.p1 - line.p0;
    let len2 = d.hypot2();
    if len2 <= EPSILON * EPSILON {
        return line.p0;
    }
    let t = ((p - line.p0).dot(d) / len2).clamp(0.0, 1.0);
    line.p0 + d * t
}

/// Intersection point of two segments, if any.
///
/// Uses the determinant form of the parametric line equations. Parallel, collinear and
/// zero-length segments report no intersection.
pub fn segment_intersection(a: Line, b: Line) -> Option<Point> {
    let r = a.p1 - a.p0;
    let s = b.p1 - b.p0;
    let den = r.cross(s);
    if den.abs() <= EPSILON {
        return None;
    }
    let qp = b.p0 - a.p0;
    let t = qp.cross(s) / den;
    let u = qp.cross(r) / den;
    let range = -EPSILON..=1.0 + EPSILON;
    if range.contains(&t) && range.contains(&u) {
        Some(a.p0 + r * t)
    } else {
        None
    }
}
