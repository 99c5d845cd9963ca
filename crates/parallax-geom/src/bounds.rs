// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use parallax_math::{Mat4, Vec3};

/// Axis-aligned bounding box.
///
/// Invariant: `min` components are less than or equal to `max` components.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    min: Vec3,
    max: Vec3,
}

impl Aabb {
    /// Constructs an AABB from two opposite corners in any order.
    #[must_use]
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: Vec3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Vec3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Returns the minimum corner.
    #[must_use]
    pub fn min(&self) -> Vec3 {
        self.min
    }

    /// Returns the maximum corner.
    #[must_use]
    pub fn max(&self) -> Vec3 {
        self.max
    }

    /// Center of the box.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        self.min.midpoint(&self.max)
    }

    fn union(&self, other: &Self) -> Self {
        Self::new(
            Vec3::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            Vec3::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        )
    }

    /// Builds the minimal AABB that contains all `points`, or `None` when
    /// `points` is empty.
    #[must_use]
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut out = Self::new(*first, *first);
        for p in rest {
            out = out.union(&Self::new(*p, *p));
        }
        Some(out)
    }

    /// Slab test against a ray. Returns the entry distance when the ray
    /// (`t >= 0`) touches the box.
    #[must_use]
    pub fn ray_entry(&self, origin: &Vec3, dir: &Vec3) -> Option<f64> {
        let mut t_min = 0.0_f64;
        let mut t_max = f64::INFINITY;
        for axis in 0..3 {
            let o = origin.component(axis);
            let d = dir.component(axis);
            let lo = self.min.component(axis);
            let hi = self.max.component(axis);
            if d.abs() < parallax_math::EPSILON {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / d;
            let (t0, t1) = {
                let a = (lo - o) * inv;
                let b = (hi - o) * inv;
                if a <= b {
                    (a, b)
                } else {
                    (b, a)
                }
            };
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }
        Some(t_min)
    }
}

/// Sphere bound. An infinite radius bounds everything.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BoundingSphere {
    /// Center point.
    pub center: Vec3,
    /// Radius in the sphere's own units; may be `f64::INFINITY`.
    pub radius: f64,
}

impl BoundingSphere {
    /// Creates a sphere from a center and radius.
    #[must_use]
    pub const fn new(center: Vec3, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Sphere at the origin with infinite radius.
    #[must_use]
    pub const fn infinite() -> Self {
        Self::new(Vec3::ZERO, f64::INFINITY)
    }

    /// Returns `true` when the radius is infinite.
    #[must_use]
    pub fn is_infinite(&self) -> bool {
        self.radius.is_infinite()
    }

    /// Returns `true` when `point` lies inside or on the sphere.
    #[must_use]
    pub fn contains(&self, point: &Vec3) -> bool {
        self.is_infinite() || self.center.distance(point) <= self.radius
    }

    /// Transforms the sphere. The radius is scaled by the matrix's uniform
    /// scale factor.
    #[must_use]
    pub fn transformed(&self, m: &Mat4) -> Self {
        Self::new(m.transform_point(&self.center), self.radius * m.scale_factor())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aabb_new_orders_corners() {
        let b = Aabb::new(Vec3::new(1.0, -1.0, 2.0), Vec3::new(-1.0, 1.0, 0.0));
        assert_eq!(b.min().to_array(), [-1.0, -1.0, 0.0]);
        assert_eq!(b.max().to_array(), [1.0, 1.0, 2.0]);
    }

    #[test]
    fn ray_entry_hits_and_misses() {
        let b = Aabb::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        let hit = b.ray_entry(&Vec3::new(0.0, 0.0, 5.0), &Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(hit, Some(4.0));
        let miss = b.ray_entry(&Vec3::new(3.0, 0.0, 5.0), &Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(miss, None);
    }

    #[test]
    fn infinite_sphere_contains_everything() {
        let s = BoundingSphere::infinite();
        assert!(s.contains(&Vec3::new(1e30, 0.0, 0.0)));
        let t = BoundingSphere::new(Vec3::ZERO, 1.0).transformed(&Mat4::uniform_scale(2.0));
        assert_eq!(t.radius, 2.0);
    }
}
