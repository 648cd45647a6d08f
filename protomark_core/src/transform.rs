// Copyright 2025 the Protomark Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Panel transforms.

use kurbo::{Point, TranslateScale, Vec2};

/// A uniform scale followed by a translation: `p -> k * p + (x, y)`.
///
/// Panels carry one of these as their `transform` property. Children are built with the scale
/// multiplied by `k` so that renderers can keep stroke widths constant on screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// Uniform scale.
    pub k: f64,
    /// Horizontal translation.
    pub x: f64,
    /// Vertical translation.
    pub y: f64,
}

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        k: 1.0,
        x: 0.0,
        y: 0.0,
    };

    /// A pure translation.
    pub const fn translate(x: f64, y: f64) -> Self {
        Self { k: 1.0, x, y }
    }

    /// A pure scale.
    pub const fn scale(k: f64) -> Self {
        Self { k, x: 0.0, y: 0.0 }
    }

    /// Applies `self` after `inner`: `(self * inner)(p) == self(inner(p))`.
    #[must_use]
    pub fn then_inner(self, inner: Self) -> Self {
        Self {
            k: self.k * inner.k,
            x: self.x + self.k * inner.x,
            y: self.y + self.k * inner.y,
        }
    }

    /// The inverse transform. A zero scale has no inverse and yields the identity.
    #[must_use]
    pub fn invert(self) -> Self {
        if self.k == 0.0 {
            return Self::IDENTITY;
        }
        Self {
            k: 1.0 / self.k,
            x: -self.x / self.k,
            y: -self.y / self.k,
        }
    }

    /// Maps a point.
    pub fn apply(self, p: Point) -> Point {
        Point::new(self.k * p.x + self.x, self.k * p.y + self.y)
    }

    /// The equivalent kurbo transform, for use with shapes.
    pub fn to_kurbo(self) -> TranslateScale {
        TranslateScale::new(Vec2::new(self.x, self.y), self.k)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composition_matches_sequential_application() {
        let outer = Transform {
            k: 2.0,
            x: 5.0,
            y: -1.0,
        };
        let inner = Transform {
            k: 0.5,
            x: 3.0,
            y: 4.0,
        };
        let p = Point::new(7.0, 9.0);
        assert_eq!(outer.then_inner(inner).apply(p), outer.apply(inner.apply(p)));
    }

    #[test]
    fn invert_round_trips() {
        let t = Transform {
            k: 4.0,
            x: 10.0,
            y: 20.0,
        };
        let p = Point::new(3.0, -2.0);
        let back = t.invert().apply(t.apply(p));
        assert!((back - p).hypot2() < 1e-24, "round trip drifted: {back:?}");
        assert_eq!(Transform::scale(0.0).invert(), Transform::IDENTITY);
    }
}
