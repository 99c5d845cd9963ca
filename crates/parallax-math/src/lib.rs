// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Linear algebra helpers for the Parallax view model.
//!
//! All arithmetic is `f64`. Matrices are 4×4 homogeneous transforms stored
//! column-major; vectors are plain value types. Physical quantities are in
//! meters unless a caller documents otherwise.

mod mat3;
mod mat4;
mod vec3;
mod vec4;

pub use mat3::Mat3;
pub use mat4::Mat4;
pub use vec3::Vec3;
pub use vec4::Vec4;

/// Global epsilon used by math routines when detecting degenerate values.
pub const EPSILON: f64 = 1e-12;

/// Determinant magnitude below which a matrix is treated as singular.
pub const SINGULAR_EPSILON: f64 = 1e-300;

/// Converts degrees to radians.
pub fn deg_to_rad(value: f64) -> f64 {
    value.to_radians()
}

/// Converts radians to degrees.
pub fn rad_to_deg(value: f64) -> f64 {
    value.to_degrees()
}

/// Returns `true` when `a` and `b` differ by at most `eps`.
pub fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() <= eps
}
