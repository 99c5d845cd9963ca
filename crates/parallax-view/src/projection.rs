// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Off-axis projection matrices.
//!
//! Eye coordinates share the image plate's axes with the eye at the origin.
//! Both projections map the canvas rectangle to `[-1, 1]` in X and Y and the
//! clip range to `+1` (near) through `-1` (far) in Z.

use parallax_math::{Mat4, Vec3};
use serde::Serialize;

use crate::policy::ProjectionPolicy;

/// Smallest physical front clip distance a perspective projection accepts.
pub const MIN_CLIP_DISTANCE: f64 = 1.0e-5;

/// Effective clip distances in meters, measured from the eye.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClipDistances {
    /// Front (near) distance.
    pub front: f64,
    /// Back (far) distance.
    pub back: f64,
}

impl ClipDistances {
    /// Clamps the pair so that a perspective frustum is well-formed: front at
    /// least [`MIN_CLIP_DISTANCE`], back strictly beyond front.
    pub fn sanitized(self, policy: ProjectionPolicy) -> Self {
        let front = match policy {
            ProjectionPolicy::Perspective => self.front.max(MIN_CLIP_DISTANCE),
            ProjectionPolicy::Parallel => self.front,
        };
        let back = if self.back > front {
            self.back
        } else {
            front + MIN_CLIP_DISTANCE.max(front.abs() * f64::EPSILON * 4.0)
        };
        Self { front, back }
    }
}

/// Viewing volume relative to the eye.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    /// Left canvas edge.
    pub left: f64,
    /// Right canvas edge.
    pub right: f64,
    /// Bottom canvas edge.
    pub bottom: f64,
    /// Top canvas edge.
    pub top: f64,
    /// Z of the image plate (negative: the plate is in front of the eye).
    pub plate_z: f64,
    /// Z of the near plane.
    pub near_z: f64,
    /// Z of the far plane.
    pub far_z: f64,
}

impl Frustum {
    /// Frustum of a canvas with lower-left `origin` and size `width`×`height`
    /// on the image plate, seen from `eye` (all in image-plate meters).
    pub fn from_canvas(origin: Vec3, width: f64, height: f64, eye: Vec3, clip: ClipDistances) -> Self {
        let left = origin.x - eye.x;
        let bottom = origin.y - eye.y;
        Self {
            left,
            right: left + width,
            bottom,
            top: bottom + height,
            plate_z: -eye.z,
            near_z: -clip.front,
            far_z: -clip.back,
        }
    }

    /// Projection matrix for `policy`.
    pub fn matrix(&self, policy: ProjectionPolicy) -> Mat4 {
        match policy {
            ProjectionPolicy::Perspective => self.perspective(),
            ProjectionPolicy::Parallel => self.parallel(),
        }
    }

    /// Perspective projection with the image plate as the projection plane.
    pub fn perspective(&self) -> Mat4 {
        let (lx, hx, ly, hy) = (self.left, self.right, self.bottom, self.top);
        let (iz, nz, fz) = (self.plate_z, self.near_z, self.far_z);
        let idx = 1.0 / (hx - lx);
        let idy = 1.0 / (hy - ly);
        let idz = 1.0 / (nz - fz);
        Mat4::from_rows([
            [-2.0 * iz * idx, 0.0, (hx + lx) * idx, 0.0],
            [0.0, -2.0 * iz * idy, (hy + ly) * idy, 0.0],
            [0.0, 0.0, -(nz + fz) * idz, 2.0 * fz * nz * idz],
            [0.0, 0.0, -1.0, 0.0],
        ])
    }

    /// Parallel projection onto the canvas rectangle.
    pub fn parallel(&self) -> Mat4 {
        let (lx, hx, ly, hy) = (self.left, self.right, self.bottom, self.top);
        let (nz, fz) = (self.near_z, self.far_z);
        let idx = 1.0 / (hx - lx);
        let idy = 1.0 / (hy - ly);
        let idz = 1.0 / (nz - fz);
        Mat4::from_rows([
            [2.0 * idx, 0.0, 0.0, -(hx + lx) * idx],
            [0.0, 2.0 * idy, 0.0, -(hy + ly) * idy],
            [0.0, 0.0, 2.0 * idz, -(nz + fz) * idz],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    fn frustum() -> Frustum {
        Frustum::from_canvas(
            Vec3::ZERO,
            0.4,
            0.3,
            Vec3::new(0.25, 0.1, 0.5),
            ClipDistances { front: 0.1, back: 10.0 },
        )
    }

    #[test]
    fn perspective_maps_canvas_corners_to_unit_square() {
        let f = frustum();
        let m = f.perspective();
        let ll = m.project_point(&Vec3::new(f.left, f.bottom, f.plate_z)).unwrap();
        let ur = m.project_point(&Vec3::new(f.right, f.top, f.plate_z)).unwrap();
        assert!(ll.approx_eq(&Vec3::new(-1.0, -1.0, ll.z), 1e-12));
        assert!(ur.approx_eq(&Vec3::new(1.0, 1.0, ur.z), 1e-12));
    }

    #[test]
    fn perspective_maps_near_to_plus_one_and_far_to_minus_one() {
        let f = frustum();
        let m = f.perspective();
        let near = m.project_point(&Vec3::new(0.0, 0.0, f.near_z)).unwrap();
        let far = m.project_point(&Vec3::new(0.0, 0.0, f.far_z)).unwrap();
        assert!((near.z - 1.0).abs() < 1e-9);
        assert!((far.z + 1.0).abs() < 1e-9);
    }

    #[test]
    fn parallel_is_affine_and_matches_ranges() {
        let f = frustum();
        let m = f.parallel();
        let p = m.project_point(&Vec3::new(f.right, f.bottom, f.far_z)).unwrap();
        assert!(p.approx_eq(&Vec3::new(1.0, -1.0, -1.0), 1e-9));
        let q = m.project_point(&Vec3::new(f.left, f.top, f.near_z)).unwrap();
        assert!(q.approx_eq(&Vec3::new(-1.0, 1.0, 1.0), 1e-9));
        assert_eq!(m.get(3, 3), 1.0);
    }

    #[test]
    fn sanitize_clamps_near_and_separates_far() {
        let clip = ClipDistances { front: 0.0, back: 0.0 }.sanitized(ProjectionPolicy::Perspective);
        assert_eq!(clip.front, MIN_CLIP_DISTANCE);
        assert!(clip.back > clip.front);

        let parallel = ClipDistances { front: -1.0, back: 2.0 }.sanitized(ProjectionPolicy::Parallel);
        assert_eq!(parallel, ClipDistances { front: -1.0, back: 2.0 });
    }
}
