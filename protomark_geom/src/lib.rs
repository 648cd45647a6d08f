// Copyright 2025 the Protomark Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `protomark_geom`: hit-testing shapes for declarative marks.
//!
//! This crate provides:
//! - a [`Shape`] sum type over points, lines, rects, polygons, circles, arcs and wedges,
//! - containment, weighted distance ([`Distance`], [`Weight`]) and rect intersection tests,
//! - translate-and-scale application (matching panel transforms).
//!
//! Interactive behaviors (drag, select, point) rank candidates by [`Shape::distance2`]. The
//! [`Weight`] lets a behavior restricted to one axis bias the ranking without changing geometry.
//!
//! Degenerate inputs (zero-length segments, coincident points, parallel lines) produce sentinel
//! results (zero distance, no intersection) rather than `NaN`.

#![no_std]

extern crate alloc;

mod arc;
mod distance;
#[cfg(not(feature = "std"))]
mod float;
mod polygon;
mod shape;

pub use arc::{Arc, Wedge, angle_in_sweep, normalize_angle, polar};
pub use distance::{
    Distance, EPSILON, MIN_WEIGHT, Weight, nearest_on_segment, segment_intersection,
};
pub use polygon::Polygon;
pub use shape::Shape;

pub use kurbo::{Circle, Line, Point, Rect, TranslateScale, Vec2};
