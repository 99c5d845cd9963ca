// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs, clippy::unwrap_used, clippy::expect_used)]
use core::f64::consts::FRAC_PI_2;

use parallax_math::{deg_to_rad, Mat3, Mat4, Vec3};
use proptest::prelude::*;

const EPS: f64 = 1e-9;

fn approx_eq16(a: &Mat4, b: &Mat4) {
    assert!(a.approx_eq(b, EPS), "{a:?} vs {b:?}");
}

#[test]
fn mul_operator_matches_method() {
    let s = Mat4::scale(2.0, 3.0, 4.0);
    let r = Mat4::rotation_x(0.3);
    approx_eq16(&(r * s), &r.multiply(&s));
    let mut a = r;
    a *= &s;
    approx_eq16(&a, &r.multiply(&s));
}

#[test]
fn translation_applies_last_when_on_the_left() {
    let m = Mat4::translation(1.0, 0.0, 0.0) * Mat4::uniform_scale(2.0);
    let p = m.transform_point(&Vec3::new(1.0, 1.0, 1.0));
    assert_eq!(p.to_array(), [3.0, 2.0, 2.0]);
    let d = m.transform_direction(&Vec3::new(1.0, 0.0, 0.0));
    assert_eq!(d.to_array(), [2.0, 0.0, 0.0]);
}

#[test]
fn euler_rotation_applies_x_before_z() {
    // X by 90° sends +Y to +Z; Z by 90° then leaves +Z alone.
    let r = Mat4::rotation_euler_xyz(FRAC_PI_2, 0.0, FRAC_PI_2);
    let v = r.transform_direction(&Vec3::UNIT_Y);
    assert!(v.approx_eq(&Vec3::UNIT_Z, 1e-12), "{v:?}");
    // Z alone sends +X to +Y.
    let z = Mat4::rotation_euler_xyz(0.0, 0.0, deg_to_rad(90.0));
    assert!(z.transform_direction(&Vec3::UNIT_X).approx_eq(&Vec3::UNIT_Y, 1e-12));
}

#[test]
fn singular_matrix_has_no_inverse() {
    assert!(Mat4::scale(1.0, 0.0, 1.0).inverse().is_none());
    assert!(Mat4::zero().inverse().is_none());
}

#[test]
fn scale_factor_reads_uniform_scale_through_rotation() {
    let m = Mat4::rotation_y(0.7) * Mat4::uniform_scale(3.5);
    assert!((m.scale_factor() - 3.5).abs() < 1e-12);
}

#[test]
fn rows_round_trip_through_column_storage() {
    let rows = [
        [1.0, 2.0, 3.0, 4.0],
        [5.0, 6.0, 7.0, 8.0],
        [9.0, 10.0, 11.0, 12.0],
        [0.0, 0.0, 0.0, 1.0],
    ];
    let m = Mat4::from_rows(rows);
    assert_eq!(m.to_rows(), rows);
    assert_eq!(m.get(0, 3), 4.0);
    assert_eq!(m.translation_part().to_array(), [4.0, 8.0, 12.0]);
    assert_eq!(m.transpose().get(3, 0), 4.0);
}

#[test]
fn mat3_embeds_into_upper_left() {
    let m = Mat3::from_rows([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]);
    let v = m.to_mat4().transform_point(&Vec3::UNIT_X);
    assert_eq!(v, m.transform(&Vec3::UNIT_X));
    assert!(v.approx_eq(&Vec3::UNIT_Y, 1e-12));
}

#[test]
fn projective_matrix_inverts() {
    let p = Mat4::from_rows([
        [1.5, 0.0, 0.2, 0.0],
        [0.0, 2.0, -0.1, 0.0],
        [0.0, 0.0, 1.02, 0.2],
        [0.0, 0.0, -1.0, 0.0],
    ]);
    let inv = p.inverse().unwrap_or_else(Mat4::zero);
    approx_eq16(&(p * inv), &Mat4::identity());
    let q = p.project_point(&Vec3::new(0.1, 0.2, -1.0));
    assert!(q.is_some());
}

proptest! {
    #[test]
    fn rigid_uniform_scale_inverse_round_trips(
        ax in -3.0f64..3.0, ay in -3.0f64..3.0, az in -3.0f64..3.0,
        tx in -10.0f64..10.0, ty in -10.0f64..10.0, tz in -10.0f64..10.0,
        s in 0.05f64..20.0,
    ) {
        let m = Mat4::translation(tx, ty, tz)
            * Mat4::rotation_euler_xyz(ax, ay, az)
            * Mat4::uniform_scale(s);
        let inv = m.inverse();
        prop_assert!(inv.is_some());
        let inv = inv.unwrap_or_else(Mat4::identity);
        prop_assert!((m * inv).approx_eq(&Mat4::identity(), 1e-9));
        prop_assert!((inv.scale_factor() - 1.0 / s).abs() < 1e-9);
        prop_assert!((m.determinant() - s * s * s).abs() < 1e-6 * s * s * s);
    }
}
