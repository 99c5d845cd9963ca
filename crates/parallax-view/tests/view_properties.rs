// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs, clippy::unwrap_used, clippy::expect_used)]
//! Cache-wide properties of `ViewInfo`: composition, exact invalidation,
//! projection round trips, scale, stereo symmetry and idempotence.

mod common;

use common::{touch_all, Fixture, AUTO_EXCEPT_VIEW, CANVAS};
use parallax_math::{Mat4, Vec3};
use parallax_view::host::write;
use parallax_view::{
    AttachPolicy, AutoUpdate, ClipPolicy, MonoscopicViewPolicy, Node, ProjectionPolicy,
    RecomputeCounts, ViewPolicy, WindowEyepointPolicy, WindowMovementPolicy,
};
use proptest::prelude::*;
use proptest::sample::select;

fn assert_composition(fx: &mut Fixture) {
    let coe_to_plate = fx.info.coexistence_to_image_plate(CANVAS).unwrap().left;
    let vp_to_coe = fx.info.view_platform_to_coexistence(CANVAS).unwrap();
    let plate_to_vp = fx.info.image_plate_to_view_platform(CANVAS).unwrap().left;
    let product = plate_to_vp * (coe_to_plate * vp_to_coe);
    assert!(
        product.approx_eq(&Mat4::identity(), 1e-9),
        "plate->vp does not invert vp->plate: {product:?}"
    );
}

#[test]
fn composition_holds_for_default_view_and_after_a_move() {
    let mut fx = Fixture::new(AUTO_EXCEPT_VIEW);
    assert_composition(&mut fx);
    {
        let mut c = write(&fx.canvas);
        c.x = 200;
        c.width = 400;
    }
    assert_composition(&mut fx);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn composition_holds_across_policies(
        x in 0i32..600,
        y in 0i32..400,
        w in 50u32..600,
        h in 50u32..600,
        eyepoint in select(WindowEyepointPolicy::ALL.to_vec()),
        attach in select(AttachPolicy::ALL.to_vec()),
        center in select(AttachPolicy::ALL.to_vec()),
        movement in select(WindowMovementPolicy::ALL.to_vec()),
        centering in any::<bool>(),
        dx in -100i32..100,
    ) {
        let mut fx = Fixture::with(AUTO_EXCEPT_VIEW, |_, canvas, view| {
            canvas.x = x;
            canvas.y = y;
            canvas.width = w;
            canvas.height = h;
            view.policies.window_eyepoint = eyepoint;
            view.policies.view_attach = attach;
            view.policies.coexistence_center = center;
            view.policies.window_movement = movement;
            view.coexistence_centering_enable = centering;
        });
        assert_composition(&mut fx);
        write(&fx.canvas).x = (x + dx).max(0);
        assert_composition(&mut fx);
    }
}

/// Touches every node, applies `mutate`, touches every node again and checks
/// that exactly the nodes downstream of `inputs` were recomputed, once each.
fn assert_exact_recompute(mut fx: Fixture, inputs: &[Node], mutate: impl FnOnce(&Fixture)) {
    touch_all(&mut fx.info);
    let before: RecomputeCounts = fx.info.recompute_counts(CANVAS).unwrap();
    for &node in Node::ALL.iter().filter(|n| !n.is_input()) {
        assert!(before.get(node) >= 1, "{node:?} never computed");
    }
    mutate(&fx);
    touch_all(&mut fx.info);
    let after = fx.info.recompute_counts(CANVAS).unwrap();
    for &node in Node::ALL.iter().filter(|n| !n.is_input()) {
        let expected = u64::from(inputs.iter().any(|&input| node.depends_on(input)));
        assert_eq!(
            after.get(node) - before.get(node),
            expected,
            "{node:?} after changing {inputs:?}"
        );
    }
}

#[test]
fn moving_the_canvas_recomputes_exactly_its_dependents() {
    let mut fx = Fixture::new(AUTO_EXCEPT_VIEW);
    let before = fx.info.coexistence_to_image_plate(CANVAS).unwrap().left;
    let eye_before = fx.info.eye_to_image_plate(CANVAS).unwrap().left;
    write(&fx.canvas).x = 0;
    write(&fx.canvas).width = 640;
    let after = fx.info.coexistence_to_image_plate(CANVAS).unwrap().left;
    let eye_after = fx.info.eye_to_image_plate(CANVAS).unwrap().left;
    assert_ne!(before, after);
    assert_ne!(eye_before, eye_after);

    assert_exact_recompute(Fixture::new(AUTO_EXCEPT_VIEW), &[Node::CanvasGeometry], |fx| {
        write(&fx.canvas).x = 100;
    });
}

#[test]
fn screen_resize_recomputes_exactly_its_dependents() {
    assert_exact_recompute(Fixture::new(AUTO_EXCEPT_VIEW), &[Node::ScreenGeometry], |fx| {
        write(&fx.screen).physical_width = 0.5;
    });
}

#[test]
fn tracker_base_calibration_recomputes_exactly_its_dependents() {
    let fx = Fixture::with(AUTO_EXCEPT_VIEW, |_, _, view| {
        view.coexistence_centering_enable = false;
    });
    assert_exact_recompute(fx, &[Node::TrackerBaseCalibration], |fx| {
        write(&fx.screen).tracker_base_to_image_plate = Mat4::translation(0.2, 0.1, 0.0);
    });
}

#[test]
fn rig_translation_only_touches_world_values() {
    let mut fx = Fixture::new(AUTO_EXCEPT_VIEW);
    let local = fx.info.eye_to_view_platform(CANVAS).unwrap().left;
    let world = fx.info.eye_to_world(CANVAS).unwrap().left;
    write(&fx.platform).local_to_world = Mat4::translation(5.0, 0.0, -3.0);
    assert_eq!(fx.info.eye_to_view_platform(CANVAS).unwrap().left, local);
    assert_ne!(fx.info.eye_to_world(CANVAS).unwrap().left, world);

    assert_exact_recompute(Fixture::new(AUTO_EXCEPT_VIEW), &[Node::RigTransform], |fx| {
        write(&fx.platform).local_to_world = Mat4::translation(1.0, 2.0, 3.0);
    });
}

#[test]
fn rig_scale_also_touches_scale_dependents() {
    assert_exact_recompute(
        Fixture::new(AUTO_EXCEPT_VIEW),
        &[Node::RigTransform, Node::RigScale],
        |fx| write(&fx.platform).local_to_world = Mat4::uniform_scale(3.0),
    );
}

#[test]
fn head_motion_recomputes_exactly_its_dependents() {
    let fx = Fixture::with(AUTO_EXCEPT_VIEW, |_, _, view| {
        view.tracking_enable = true;
        view.coexistence_centering_enable = false;
    });
    assert_exact_recompute(fx, &[Node::HeadPose], |fx| {
        fx.sensor.set_pose(Mat4::translation(0.05, 0.02, 0.6));
    });
}

#[test]
fn canvas_eye_change_recomputes_exactly_its_dependents() {
    let auto = AutoUpdate {
        canvas: false,
        ..AUTO_EXCEPT_VIEW
    };
    let mut fx = Fixture::new(auto);
    let before = fx.info.eye_in_image_plate(CANVAS).unwrap().left;
    write(&fx.canvas).monoscopic_view_policy = MonoscopicViewPolicy::LeftEye;
    assert_eq!(fx.info.eye_in_image_plate(CANVAS).unwrap().left, before);
    fx.info.update_canvas(CANVAS);
    assert!(fx.info.eye_in_image_plate(CANVAS).unwrap().left.x < before.x);

    assert_exact_recompute(Fixture::new(auto), &[Node::CanvasEyes], |fx| {
        write(&fx.canvas).left_manual_eye_in_image_plate = Vec3::new(0.1, 0.1, 0.5);
        fx.info.update_canvas(CANVAS);
    });
}

#[test]
fn head_tracker_calibration_recomputes_exactly_its_dependents() {
    let fx = Fixture::with(AUTO_EXCEPT_VIEW, |_, _, view| {
        view.tracking_enable = true;
        view.policies.view = ViewPolicy::HeadMounted;
    });
    assert_exact_recompute(fx, &[Node::HeadTrackerCalibration], |fx| {
        write(&fx.screen).head_tracker_to_left_image_plate = Mat4::translation(0.03, 0.0, 0.05);
    });
}

fn assert_round_trip(fx: &mut Fixture) {
    let p = fx.info.projection(CANVAS).unwrap().left;
    let inv = fx.info.inverse_projection(CANVAS).unwrap().left;
    let scale = p.to_array().iter().fold(1.0_f64, |m, v| m.max(v.abs()));
    let err = (p * inv).max_abs_diff(&Mat4::identity());
    assert!(err < 1e-9 * scale, "round-trip error {err} (scale {scale})");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn projection_round_trips(
        front in 0.01f64..5.0,
        gap in prop_oneof![1e-6f64..1e-4, 0.01f64..100.0],
        w in 16u32..1280,
        h in 16u32..1024,
        projection in select(ProjectionPolicy::ALL.to_vec()),
        clip in select(ClipPolicy::ALL.to_vec()),
    ) {
        let mut fx = Fixture::with(AUTO_EXCEPT_VIEW, |_, canvas, view| {
            canvas.width = w;
            canvas.height = h;
            view.policies.projection = projection;
            view.policies.front_clip = clip;
            view.policies.back_clip = clip;
            view.front_clip_distance = front;
            view.back_clip_distance = front * (1.0 + gap);
        });
        assert_round_trip(&mut fx);
    }
}

#[test]
fn near_equal_clip_planes_still_round_trip() {
    for projection in ProjectionPolicy::ALL.iter().copied() {
        let mut fx = Fixture::with(AUTO_EXCEPT_VIEW, |_, _, view| {
            view.policies.projection = projection;
            view.front_clip_distance = 1.0;
            view.back_clip_distance = 1.0;
        });
        let front = fx.info.physical_front_clip_distance(CANVAS).unwrap().left;
        let back = fx.info.physical_back_clip_distance(CANVAS).unwrap().left;
        assert!(back > front);
        assert_round_trip(&mut fx);
    }
}

proptest! {
    #[test]
    fn world_scale_divides_physical_to_virtual_scale(k in 0.1f64..10.0) {
        let mut fx = Fixture::new(AUTO_EXCEPT_VIEW);
        let base = fx.info.physical_to_virtual_scale(CANVAS).unwrap();
        // local-to-world scaled by 1/k makes world-to-rig scale by k.
        write(&fx.platform).local_to_world = Mat4::uniform_scale(1.0 / k);
        let scaled = fx.info.physical_to_virtual_scale(CANVAS).unwrap();
        prop_assert!((scaled * k - base).abs() <= 1e-9 * base);
    }
}

#[test]
fn stereo_eyes_mirror_about_the_canvas_center() {
    let mut fx = Fixture::with(AUTO_EXCEPT_VIEW, |_, canvas, view| {
        canvas.stereo_available = true;
        view.stereo_enable = true;
    });
    let eyes = fx.info.eye_to_image_plate(CANVAS).unwrap();
    let right = eyes.right.expect("stereo canvas has a right eye");
    let left = eyes.left.translation_part();
    let right = right.translation_part();
    let (w, _) = fx.screen_size();
    let center_x = w * 0.5;
    assert!(((left.x - center_x) + (right.x - center_x)).abs() < 1e-12);
    assert!(left.x < right.x);
    assert_eq!(left.y, right.y);
    assert_eq!(left.z, right.z);
}

#[test]
fn monoscopic_canvas_has_no_right_eye() {
    let mut fx = Fixture::new(AUTO_EXCEPT_VIEW);
    assert!(fx.info.eye_to_image_plate(CANVAS).unwrap().right.is_none());
    assert!(fx.info.projection(CANVAS).unwrap().right.is_none());
}

#[test]
fn repeated_queries_recompute_nothing() {
    let mut fx = Fixture::new(AUTO_EXCEPT_VIEW);
    let first = touch_all(&mut fx.info);
    let counts = fx.info.recompute_counts(CANVAS).unwrap();
    let second = touch_all(&mut fx.info);
    assert_eq!(first, second);
    assert_eq!(fx.info.recompute_counts(CANVAS).unwrap(), counts);
}

#[test]
fn default_camera_sits_at_the_eye_looking_at_the_canvas() {
    let mut fx = Fixture::new(AUTO_EXCEPT_VIEW);
    let eye_to_vp = fx.info.eye_to_view_platform(CANVAS).unwrap().left;
    assert!(eye_to_vp.transform_point(&Vec3::ZERO).approx_eq(&Vec3::ZERO, 1e-9));
    // Canvas spans two view-platform units.
    let plate_to_vp = fx.info.image_plate_to_view_platform(CANVAS).unwrap().left;
    let (w, _) = fx.screen_size();
    let left = plate_to_vp.transform_point(&Vec3::new(0.0, 0.0, 0.0));
    let right = plate_to_vp.transform_point(&Vec3::new(w, 0.0, 0.0));
    assert!((right.x - left.x - 2.0).abs() < 1e-9);
}
