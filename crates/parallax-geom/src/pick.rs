// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Pick intersections against indexed primitive arrays.
//!
//! A [`PickIntersection`] records where a pick shape hit one primitive of a
//! [`GeometryArray`] and interpolates per-vertex attributes at that point.
//! Interpolation weights are computed in the primitive's dominant plane; a
//! hit that lies outside the primitive by more than [`WEIGHT_TOLERANCE`] is a
//! hard error because it can only come from bad geometry or a bad hit point.

use parallax_math::{Vec3, Vec4, EPSILON};
use thiserror::Error;

use crate::bounds::Aabb;

/// Slack allowed on each interpolation weight before a point is rejected as
/// lying outside its primitive.
pub const WEIGHT_TOLERANCE: f64 = 1e-5;

/// Errors raised while interpolating a pick intersection.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum PickError {
    /// The hit point is outside the primitive beyond [`WEIGHT_TOLERANCE`].
    #[error("intersection point lies outside its primitive (weight {weight})")]
    PointOutsidePrimitive {
        /// The offending weight.
        weight: f64,
    },
    /// The primitive has (near) zero area.
    #[error("primitive {primitive} is degenerate")]
    DegeneratePrimitive {
        /// Primitive index within the geometry array.
        primitive: usize,
    },
    /// The geometry array has no data for the requested attribute.
    #[error("geometry array has no {0} data")]
    MissingAttribute(&'static str),
    /// A primitive index refers past the end of the geometry array.
    #[error("primitive {primitive} is out of range")]
    PrimitiveOutOfRange {
        /// Requested primitive index.
        primitive: usize,
    },
}

/// Primitive layout of a [`GeometryArray`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    /// Every three indices form a triangle.
    Triangles,
    /// Every four indices form a planar quad (`v0 v1 v2 v3`, wound in order).
    Quads,
}

impl PrimitiveKind {
    /// Vertices per primitive.
    pub const fn vertex_count(self) -> usize {
        match self {
            Self::Triangles => 3,
            Self::Quads => 4,
        }
    }
}

/// Indexed vertex data with optional per-vertex attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryArray {
    kind: PrimitiveKind,
    positions: Vec<Vec3>,
    indices: Vec<usize>,
    normals: Option<Vec<Vec3>>,
    colors: Option<Vec<Vec4>>,
    tex_coords: Option<Vec<[f64; 2]>>,
}

impl GeometryArray {
    /// Creates an array from positions and an index list. Trailing indices
    /// that do not fill a whole primitive are ignored.
    pub fn new(kind: PrimitiveKind, positions: Vec<Vec3>, indices: Vec<usize>) -> Self {
        Self {
            kind,
            positions,
            indices,
            normals: None,
            colors: None,
            tex_coords: None,
        }
    }

    /// Creates a non-indexed array: vertex `i` is used exactly once, in order.
    pub fn non_indexed(kind: PrimitiveKind, positions: Vec<Vec3>) -> Self {
        let indices = (0..positions.len()).collect();
        Self::new(kind, positions, indices)
    }

    /// Attaches per-vertex normals.
    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = Some(normals);
        self
    }

    /// Attaches per-vertex RGBA colors.
    pub fn with_colors(mut self, colors: Vec<Vec4>) -> Self {
        self.colors = Some(colors);
        self
    }

    /// Attaches per-vertex 2D texture coordinates.
    pub fn with_tex_coords(mut self, tex_coords: Vec<[f64; 2]>) -> Self {
        self.tex_coords = Some(tex_coords);
        self
    }

    /// Primitive layout.
    pub fn kind(&self) -> PrimitiveKind {
        self.kind
    }

    /// Number of complete primitives.
    pub fn primitive_count(&self) -> usize {
        self.indices.len() / self.kind.vertex_count()
    }

    /// Vertex indices of primitive `primitive`.
    pub fn primitive_indices(&self, primitive: usize) -> Option<&[usize]> {
        let n = self.kind.vertex_count();
        let start = primitive.checked_mul(n)?;
        let slice = self.indices.get(start..start.checked_add(n)?)?;
        if slice.iter().all(|&i| i < self.positions.len()) {
            Some(slice)
        } else {
            None
        }
    }

    /// Position of vertex `index`.
    pub fn position(&self, index: usize) -> Option<Vec3> {
        self.positions.get(index).copied()
    }

    /// Bounds of every referenced vertex.
    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(&self.positions)
    }

    /// Casts a ray against every primitive and returns the nearest hit with
    /// `t >= 0`. `dir` need not be normalized; distances are in units of
    /// `dir`'s length.
    pub fn pick_ray(&self, origin: &Vec3, dir: &Vec3) -> Option<PickIntersection<'_>> {
        if let Some(b) = self.bounds() {
            b.ray_entry(origin, dir)?;
        }
        let mut best: Option<(f64, usize)> = None;
        for primitive in 0..self.primitive_count() {
            let Some(idx) = self.primitive_indices(primitive) else {
                continue;
            };
            let v: Vec<Vec3> = idx.iter().map(|&i| self.positions[i]).collect();
            let hit = match self.kind {
                PrimitiveKind::Triangles => intersect_ray_triangle(origin, dir, &v[0], &v[1], &v[2]),
                PrimitiveKind::Quads => intersect_ray_triangle(origin, dir, &v[0], &v[1], &v[2])
                    .or_else(|| intersect_ray_triangle(origin, dir, &v[0], &v[2], &v[3])),
            };
            if let Some(t) = hit {
                if best.is_none_or(|(bt, _)| t < bt) {
                    best = Some((t, primitive));
                }
            }
        }
        let (t, primitive) = best?;
        let point = origin.add(&dir.scale(t));
        PickIntersection::new(self, primitive, point, t).ok()
    }
}

/// Möller–Trumbore ray/triangle test. Returns the ray parameter `t >= 0` of
/// the hit, or `None` for misses and rays parallel to the triangle.
pub fn intersect_ray_triangle(
    origin: &Vec3,
    dir: &Vec3,
    v0: &Vec3,
    v1: &Vec3,
    v2: &Vec3,
) -> Option<f64> {
    let e1 = v1.sub(v0);
    let e2 = v2.sub(v0);
    let p = dir.cross(&e2);
    let det = e1.dot(&p);
    if det.abs() < EPSILON {
        return None;
    }
    let inv = 1.0 / det;
    let s = origin.sub(v0);
    let u = s.dot(&p) * inv;
    if !(-WEIGHT_TOLERANCE..=1.0 + WEIGHT_TOLERANCE).contains(&u) {
        return None;
    }
    let q = s.cross(&e1);
    let v = dir.dot(&q) * inv;
    if v < -WEIGHT_TOLERANCE || u + v > 1.0 + WEIGHT_TOLERANCE {
        return None;
    }
    let t = e2.dot(&q) * inv;
    (t >= 0.0).then_some(t)
}

/// A hit on one primitive of a [`GeometryArray`].
#[derive(Debug, Clone, PartialEq)]
pub struct PickIntersection<'a> {
    geometry: &'a GeometryArray,
    primitive: usize,
    vertex_indices: Vec<usize>,
    point: Vec3,
    distance: f64,
}

impl<'a> PickIntersection<'a> {
    /// Records a hit at `point` on `primitive`, `distance` along the pick shape.
    pub fn new(
        geometry: &'a GeometryArray,
        primitive: usize,
        point: Vec3,
        distance: f64,
    ) -> Result<Self, PickError> {
        let vertex_indices = geometry
            .primitive_indices(primitive)
            .ok_or(PickError::PrimitiveOutOfRange { primitive })?
            .to_vec();
        Ok(Self {
            geometry,
            primitive,
            vertex_indices,
            point,
            distance,
        })
    }

    /// Intersection point in the geometry's local coordinates.
    pub fn point(&self) -> Vec3 {
        self.point
    }

    /// Distance from the pick shape origin.
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Primitive index within the geometry array.
    pub fn primitive_index(&self) -> usize {
        self.primitive
    }

    /// Vertex indices of the hit primitive.
    pub fn vertex_indices(&self) -> &[usize] {
        &self.vertex_indices
    }

    fn vertex_positions(&self) -> Vec<Vec3> {
        self.vertex_indices
            .iter()
            .map(|&i| self.geometry.positions[i])
            .collect()
    }

    /// Interpolation weights, one per primitive vertex, summing to 1.
    pub fn interpolation_weights(&self) -> Result<Vec<f64>, PickError> {
        let v = self.vertex_positions();
        match self.geometry.kind {
            PrimitiveKind::Triangles => {
                let w = triangle_weights(&self.point, &v[0], &v[1], &v[2])
                    .ok_or(PickError::DegeneratePrimitive { primitive: self.primitive })?;
                check_weights(&w)?;
                Ok(w.to_vec())
            }
            PrimitiveKind::Quads => self.quad_weights(&v),
        }
    }

    fn quad_weights(&self, v: &[Vec3]) -> Result<Vec<f64>, PickError> {
        let first = triangle_weights(&self.point, &v[0], &v[1], &v[2]);
        let second = triangle_weights(&self.point, &v[0], &v[2], &v[3]);
        if first.is_none() && second.is_none() {
            return Err(PickError::DegeneratePrimitive { primitive: self.primitive });
        }
        if let Some(w) = first {
            if check_weights(&w).is_ok() {
                return Ok(vec![w[0], w[1], w[2], 0.0]);
            }
        }
        match second {
            Some(w) => {
                check_weights(&w)?;
                Ok(vec![w[0], 0.0, w[1], w[2]])
            }
            None => {
                let w = first.ok_or(PickError::DegeneratePrimitive { primitive: self.primitive })?;
                check_weights(&w)?;
                Ok(vec![w[0], w[1], w[2], 0.0])
            }
        }
    }

    /// Vertex coordinates re-blended with the interpolation weights.
    pub fn point_coordinates(&self) -> Result<Vec3, PickError> {
        let w = self.interpolation_weights()?;
        Ok(blend3(&self.vertex_positions(), &w))
    }

    /// Interpolated, normalized vertex normal at the hit point.
    pub fn point_normal(&self) -> Result<Vec3, PickError> {
        let normals = self.geometry.normals.as_ref().ok_or(PickError::MissingAttribute("normal"))?;
        let values = self.gather(normals, "normal")?;
        let w = self.interpolation_weights()?;
        Ok(blend3(&values, &w).normalize())
    }

    /// Interpolated RGBA color at the hit point.
    pub fn point_color(&self) -> Result<Vec4, PickError> {
        let colors = self.geometry.colors.as_ref().ok_or(PickError::MissingAttribute("color"))?;
        let values = self.gather(colors, "color")?;
        let w = self.interpolation_weights()?;
        let mut out = [0.0; 4];
        for (c, wi) in values.iter().zip(&w) {
            for (o, v) in out.iter_mut().zip(c.to_array()) {
                *o += v * wi;
            }
        }
        Ok(Vec4::from(out))
    }

    /// Interpolated texture coordinate at the hit point.
    pub fn point_texture_coordinate(&self) -> Result<[f64; 2], PickError> {
        let tex = self
            .geometry
            .tex_coords
            .as_ref()
            .ok_or(PickError::MissingAttribute("texture coordinate"))?;
        let values = self.gather(tex, "texture coordinate")?;
        let w = self.interpolation_weights()?;
        let mut out = [0.0; 2];
        for (t, wi) in values.iter().zip(&w) {
            out[0] += t[0] * wi;
            out[1] += t[1] * wi;
        }
        Ok(out)
    }

    /// Index of the primitive vertex closest to the hit point.
    pub fn closest_vertex_index(&self) -> usize {
        let mut best = self.vertex_indices[0];
        let mut best_d = f64::INFINITY;
        for &i in &self.vertex_indices {
            let d = self.geometry.positions[i].distance(&self.point);
            if d < best_d {
                best_d = d;
                best = i;
            }
        }
        best
    }

    /// Coordinates of the primitive vertex closest to the hit point.
    pub fn closest_vertex_coordinates(&self) -> Vec3 {
        self.geometry.positions[self.closest_vertex_index()]
    }

    fn gather<T: Copy>(&self, data: &[T], what: &'static str) -> Result<Vec<T>, PickError> {
        self.vertex_indices
            .iter()
            .map(|&i| data.get(i).copied().ok_or(PickError::MissingAttribute(what)))
            .collect()
    }
}

fn blend3(values: &[Vec3], weights: &[f64]) -> Vec3 {
    values
        .iter()
        .zip(weights)
        .fold(Vec3::ZERO, |acc, (v, w)| acc.add(&v.scale(*w)))
}

fn check_weights(w: &[f64]) -> Result<(), PickError> {
    for &weight in w {
        if !(-WEIGHT_TOLERANCE..=1.0 + WEIGHT_TOLERANCE).contains(&weight) {
            return Err(PickError::PointOutsidePrimitive { weight });
        }
    }
    Ok(())
}

/// Barycentric weights of `p` in triangle `(a, b, c)`, computed from signed
/// sub-triangle areas in the plane that drops the normal's largest axis.
/// Returns `None` for degenerate triangles.
fn triangle_weights(p: &Vec3, a: &Vec3, b: &Vec3, c: &Vec3) -> Option<[f64; 3]> {
    let n = b.sub(a).cross(&c.sub(a));
    let (ax, ay, az) = (n.x.abs(), n.y.abs(), n.z.abs());
    // Keep the two axes orthogonal to the dominant normal component.
    let (i, j) = if ax >= ay && ax >= az {
        (1, 2)
    } else if ay >= az {
        (2, 0)
    } else {
        (0, 1)
    };
    let area = |p0: &Vec3, p1: &Vec3, p2: &Vec3| {
        (p1.component(i) - p0.component(i)) * (p2.component(j) - p0.component(j))
            - (p2.component(i) - p0.component(i)) * (p1.component(j) - p0.component(j))
    };
    let total = area(a, b, c);
    if total.abs() <= EPSILON {
        return None;
    }
    let w0 = area(p, b, c) / total;
    let w1 = area(a, p, c) / total;
    Some([w0, w1, 1.0 - w0 - w1])
}
