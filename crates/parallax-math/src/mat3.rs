// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use serde::{Deserialize, Serialize};

use crate::{Mat4, Vec3};

/// 3×3 matrix, typically a rotation (possibly scaled).
///
/// Stored row-major because the only producer is the config reader, which
/// writes matrices row by row.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mat3 {
    rows: [[f64; 3]; 3],
}

impl Mat3 {
    /// Returns the identity matrix.
    pub const fn identity() -> Self {
        Self {
            rows: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    /// Builds a matrix from three rows.
    pub const fn from_rows(r0: [f64; 3], r1: [f64; 3], r2: [f64; 3]) -> Self {
        Self { rows: [r0, r1, r2] }
    }

    /// Element at `row`, `col`.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.rows[row][col]
    }

    /// Returns the rows.
    pub fn to_rows(self) -> [[f64; 3]; 3] {
        self.rows
    }

    /// Applies the matrix to a vector.
    pub fn transform(&self, v: &Vec3) -> Vec3 {
        let r = &self.rows;
        Vec3::new(
            r[0][0] * v.x + r[0][1] * v.y + r[0][2] * v.z,
            r[1][0] * v.x + r[1][1] * v.y + r[1][2] * v.z,
            r[2][0] * v.x + r[2][1] * v.y + r[2][2] * v.z,
        )
    }

    /// Embeds the matrix in the upper-left of a homogeneous transform.
    pub fn to_mat4(&self) -> Mat4 {
        let r = &self.rows;
        Mat4::from_rows([
            [r[0][0], r[0][1], r[0][2], 0.0],
            [r[1][0], r[1][1], r[1][2], 0.0],
            [r[2][0], r[2][1], r[2][2], 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }
}

impl Default for Mat3 {
    fn default() -> Self {
        Self::identity()
    }
}
