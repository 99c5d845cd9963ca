// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use serde::{Deserialize, Serialize};

use crate::{Vec3, Vec4, SINGULAR_EPSILON};

/// Column‑major 4×4 homogeneous matrix.
///
/// - Stored in column‑major order; `get(row, col)` hides the layout.
/// - Composition follows the usual convention: `a * b` applies `b` first.
///   A transform named `x_to_y` maps coordinates in space `x` into space `y`,
///   so `y_to_z * x_to_y` is `x_to_z`.
///
/// # Examples
/// ```
/// use parallax_math::{Mat4, Vec3};
/// let t = Mat4::translation(5.0, -3.0, 2.0);
/// let p = Vec3::new(2.0, 4.0, -1.0);
/// assert_eq!(t.transform_point(&p).to_array(), [7.0, 1.0, 1.0]);
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mat4 {
    data: [f64; 16],
}

impl Mat4 {
    /// Returns the identity matrix.
    pub const fn identity() -> Self {
        Self {
            data: [
                1.0, 0.0, 0.0, 0.0, // col 0
                0.0, 1.0, 0.0, 0.0, // col 1
                0.0, 0.0, 1.0, 0.0, // col 2
                0.0, 0.0, 0.0, 1.0, // col 3
            ],
        }
    }

    /// Returns the all-zero matrix.
    pub const fn zero() -> Self {
        Self { data: [0.0; 16] }
    }

    /// Creates a matrix from column-major array data.
    pub const fn new(data: [f64; 16]) -> Self {
        Self { data }
    }

    /// Creates a matrix from four rows.
    pub fn from_rows(rows: [[f64; 4]; 4]) -> Self {
        let mut out = Self::zero();
        for (r, row) in rows.iter().enumerate() {
            for (c, v) in row.iter().enumerate() {
                out.set(r, c, *v);
            }
        }
        out
    }

    /// Builds a translation matrix in meters.
    pub const fn translation(tx: f64, ty: f64, tz: f64) -> Self {
        Self {
            data: [
                1.0, 0.0, 0.0, 0.0, // col 0
                0.0, 1.0, 0.0, 0.0, // col 1
                0.0, 0.0, 1.0, 0.0, // col 2
                tx, ty, tz, 1.0, // col 3 (translation)
            ],
        }
    }

    /// Builds a translation matrix from a vector.
    pub const fn from_translation(v: Vec3) -> Self {
        Self::translation(v.x, v.y, v.z)
    }

    /// Builds a non-uniform scale matrix.
    pub const fn scale(sx: f64, sy: f64, sz: f64) -> Self {
        Self {
            data: [
                sx, 0.0, 0.0, 0.0, // col 0
                0.0, sy, 0.0, 0.0, // col 1
                0.0, 0.0, sz, 0.0, // col 2
                0.0, 0.0, 0.0, 1.0, // col 3
            ],
        }
    }

    /// Builds a uniform scale matrix.
    pub const fn uniform_scale(s: f64) -> Self {
        Self::scale(s, s, s)
    }

    /// Builds a rotation matrix around the X axis by `angle` radians.
    pub fn rotation_x(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::from_rows([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, c, -s, 0.0],
            [0.0, s, c, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Builds a rotation matrix around the Y axis by `angle` radians.
    pub fn rotation_y(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::from_rows([
            [c, 0.0, s, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [-s, 0.0, c, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Builds a rotation matrix around the Z axis by `angle` radians.
    pub fn rotation_z(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::from_rows([
            [c, -s, 0.0, 0.0],
            [s, c, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Builds a rotation from Euler angles in radians, applied X first, then
    /// Y, then Z: `R = R_z(z) * R_y(y) * R_x(x)`.
    pub fn rotation_euler_xyz(x: f64, y: f64, z: f64) -> Self {
        Self::rotation_z(z)
            .multiply(&Self::rotation_y(y))
            .multiply(&Self::rotation_x(x))
    }

    /// Returns the matrix as a column‑major array.
    pub fn to_array(self) -> [f64; 16] {
        self.data
    }

    /// Returns the matrix as four rows.
    pub fn to_rows(self) -> [[f64; 4]; 4] {
        let mut rows = [[0.0; 4]; 4];
        for (r, row) in rows.iter_mut().enumerate() {
            for (c, v) in row.iter_mut().enumerate() {
                *v = self.get(r, c);
            }
        }
        rows
    }

    /// Element at `row`, `col`.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[col * 4 + row]
    }

    /// Sets the element at `row`, `col`.
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[col * 4 + row] = value;
    }

    /// Multiplies the matrix with another matrix (`self * rhs`).
    ///
    /// # Examples
    /// ```
    /// use parallax_math::Mat4;
    /// let a = Mat4::identity();
    /// let b = Mat4::scale(2.0, 3.0, 4.0);
    /// assert_eq!(a.multiply(&b).to_array(), b.to_array());
    /// ```
    pub fn multiply(&self, rhs: &Self) -> Self {
        let mut out = [0.0; 16];
        for row in 0..4 {
            for col in 0..4 {
                let mut sum = 0.0;
                for k in 0..4 {
                    sum += self.get(row, k) * rhs.get(k, col);
                }
                out[col * 4 + row] = sum;
            }
        }
        Self::new(out)
    }

    /// Returns the transpose.
    pub fn transpose(&self) -> Self {
        let mut out = Self::zero();
        for row in 0..4 {
            for col in 0..4 {
                out.set(col, row, self.get(row, col));
            }
        }
        out
    }

    /// Determinant of the full 4×4 matrix.
    pub fn determinant(&self) -> f64 {
        let m = |r, c| self.get(r, c);
        let s0 = m(0, 0) * m(1, 1) - m(1, 0) * m(0, 1);
        let s1 = m(0, 0) * m(1, 2) - m(1, 0) * m(0, 2);
        let s2 = m(0, 0) * m(1, 3) - m(1, 0) * m(0, 3);
        let s3 = m(0, 1) * m(1, 2) - m(1, 1) * m(0, 2);
        let s4 = m(0, 1) * m(1, 3) - m(1, 1) * m(0, 3);
        let s5 = m(0, 2) * m(1, 3) - m(1, 2) * m(0, 3);
        let c5 = m(2, 2) * m(3, 3) - m(3, 2) * m(2, 3);
        let c4 = m(2, 1) * m(3, 3) - m(3, 1) * m(2, 3);
        let c3 = m(2, 1) * m(3, 2) - m(3, 1) * m(2, 2);
        let c2 = m(2, 0) * m(3, 3) - m(3, 0) * m(2, 3);
        let c1 = m(2, 0) * m(3, 2) - m(3, 0) * m(2, 2);
        let c0 = m(2, 0) * m(3, 1) - m(3, 0) * m(2, 1);
        s0 * c5 - s1 * c4 + s2 * c3 + s3 * c2 - s4 * c1 + s5 * c0
    }

    /// General inverse via the 2×2 sub-determinant expansion.
    ///
    /// Returns `None` when the determinant magnitude is at or below
    /// [`SINGULAR_EPSILON`]. Works for projective matrices as well as the
    /// rigid-plus-uniform-scale transforms the view model mostly produces.
    pub fn inverse(&self) -> Option<Self> {
        let m = |r, c| self.get(r, c);
        let s0 = m(0, 0) * m(1, 1) - m(1, 0) * m(0, 1);
        let s1 = m(0, 0) * m(1, 2) - m(1, 0) * m(0, 2);
        let s2 = m(0, 0) * m(1, 3) - m(1, 0) * m(0, 3);
        let s3 = m(0, 1) * m(1, 2) - m(1, 1) * m(0, 2);
        let s4 = m(0, 1) * m(1, 3) - m(1, 1) * m(0, 3);
        let s5 = m(0, 2) * m(1, 3) - m(1, 2) * m(0, 3);
        let c5 = m(2, 2) * m(3, 3) - m(3, 2) * m(2, 3);
        let c4 = m(2, 1) * m(3, 3) - m(3, 1) * m(2, 3);
        let c3 = m(2, 1) * m(3, 2) - m(3, 1) * m(2, 2);
        let c2 = m(2, 0) * m(3, 3) - m(3, 0) * m(2, 3);
        let c1 = m(2, 0) * m(3, 2) - m(3, 0) * m(2, 2);
        let c0 = m(2, 0) * m(3, 1) - m(3, 0) * m(2, 1);

        let det = s0 * c5 - s1 * c4 + s2 * c3 + s3 * c2 - s4 * c1 + s5 * c0;
        if !det.is_finite() || det.abs() <= SINGULAR_EPSILON {
            return None;
        }
        let inv = 1.0 / det;

        let rows = [
            [
                (m(1, 1) * c5 - m(1, 2) * c4 + m(1, 3) * c3) * inv,
                (-m(0, 1) * c5 + m(0, 2) * c4 - m(0, 3) * c3) * inv,
                (m(3, 1) * s5 - m(3, 2) * s4 + m(3, 3) * s3) * inv,
                (-m(2, 1) * s5 + m(2, 2) * s4 - m(2, 3) * s3) * inv,
            ],
            [
                (-m(1, 0) * c5 + m(1, 2) * c2 - m(1, 3) * c1) * inv,
                (m(0, 0) * c5 - m(0, 2) * c2 + m(0, 3) * c1) * inv,
                (-m(3, 0) * s5 + m(3, 2) * s2 - m(3, 3) * s1) * inv,
                (m(2, 0) * s5 - m(2, 2) * s2 + m(2, 3) * s1) * inv,
            ],
            [
                (m(1, 0) * c4 - m(1, 1) * c2 + m(1, 3) * c0) * inv,
                (-m(0, 0) * c4 + m(0, 1) * c2 - m(0, 3) * c0) * inv,
                (m(3, 0) * s4 - m(3, 1) * s2 + m(3, 3) * s0) * inv,
                (-m(2, 0) * s4 + m(2, 1) * s2 - m(2, 3) * s0) * inv,
            ],
            [
                (-m(1, 0) * c3 + m(1, 1) * c1 - m(1, 2) * c0) * inv,
                (m(0, 0) * c3 - m(0, 1) * c1 + m(0, 2) * c0) * inv,
                (-m(3, 0) * s3 + m(3, 1) * s1 - m(3, 2) * s0) * inv,
                (m(2, 0) * s3 - m(2, 1) * s1 + m(2, 2) * s0) * inv,
            ],
        ];
        Some(Self::from_rows(rows))
    }

    /// Translation column as a vector.
    pub fn translation_part(&self) -> Vec3 {
        Vec3::new(self.get(0, 3), self.get(1, 3), self.get(2, 3))
    }

    /// Replaces the translation column.
    pub fn with_translation(mut self, t: Vec3) -> Self {
        self.set(0, 3, t.x);
        self.set(1, 3, t.y);
        self.set(2, 3, t.z);
        self
    }

    /// Uniform scale of the upper 3×3, taken as the Euclidean norm of its
    /// first column.
    ///
    /// Only meaningful when the upper 3×3 is a rotation times a uniform scale.
    pub fn scale_factor(&self) -> f64 {
        Vec3::new(self.get(0, 0), self.get(1, 0), self.get(2, 0)).length()
    }

    /// Transforms a point (assumes `w = 1`, no perspective divide).
    pub fn transform_point(&self, point: &Vec3) -> Vec3 {
        self.transform_vec4(&Vec4::point(*point)).xyz()
    }

    /// Transforms a direction vector (ignores translation, `w = 0`).
    pub fn transform_direction(&self, direction: &Vec3) -> Vec3 {
        self.transform_vec4(&Vec4::new(direction.x, direction.y, direction.z, 0.0))
            .xyz()
    }

    /// Full homogeneous product `self * v`.
    pub fn transform_vec4(&self, v: &Vec4) -> Vec4 {
        let c = [v.x, v.y, v.z, v.w];
        let row = |r: usize| {
            self.get(r, 0) * c[0] + self.get(r, 1) * c[1] + self.get(r, 2) * c[2] + self.get(r, 3) * c[3]
        };
        Vec4::new(row(0), row(1), row(2), row(3))
    }

    /// Transforms a point and performs the homogeneous divide.
    ///
    /// Returns `None` when the resulting `w` is zero.
    pub fn project_point(&self, point: &Vec3) -> Option<Vec3> {
        self.transform_vec4(&Vec4::point(*point)).to_point()
    }

    /// Returns `true` when every element differs by at most `eps`.
    pub fn approx_eq(&self, other: &Self, eps: f64) -> bool {
        self.data
            .iter()
            .zip(other.data.iter())
            .all(|(a, b)| (a - b).abs() <= eps)
    }

    /// Largest absolute element-wise difference to `other`.
    pub fn max_abs_diff(&self, other: &Self) -> f64 {
        self.data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<[f64; 16]> for Mat4 {
    fn from(value: [f64; 16]) -> Self {
        Self { data: value }
    }
}

impl core::ops::Mul for Mat4 {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self::Output {
        self.multiply(&rhs)
    }
}

impl core::ops::Mul<&Mat4> for Mat4 {
    type Output = Self;
    fn mul(self, rhs: &Mat4) -> Self::Output {
        self.multiply(rhs)
    }
}

impl core::ops::MulAssign for Mat4 {
    fn mul_assign(&mut self, rhs: Self) {
        *self = self.multiply(&rhs);
    }
}

impl core::ops::MulAssign<&Mat4> for Mat4 {
    fn mul_assign(&mut self, rhs: &Mat4) {
        *self = self.multiply(rhs);
    }
}
