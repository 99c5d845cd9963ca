// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![doc = r"Geometry primitives for Parallax.

This crate provides:
- Bounding volumes (`Aabb`, `BoundingSphere`).
- Pick intersections against indexed triangle/quad arrays, with vertex
  attribute interpolation (`PickIntersection`).

Design notes:
- `f64` throughout to match the view model.
- Interpolation weights outside a primitive are reported as errors, never
  clamped; see `WEIGHT_TOLERANCE`.
"]

/// Bounding volumes.
pub mod bounds;
/// Pick intersections and attribute interpolation.
pub mod pick;

pub use bounds::{Aabb, BoundingSphere};
pub use pick::{
    intersect_ray_triangle, GeometryArray, PickError, PickIntersection, PrimitiveKind,
    WEIGHT_TOLERANCE,
};
