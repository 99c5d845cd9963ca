// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! View-level state captured once per camera refresh, and the head pose.

use parallax_math::{Mat4, Vec3};

use crate::error::{ViewError, ViewResult};
use crate::host::{PhysicalBody, View};
use crate::policy::ViewPolicies;

/// Snapshot of the scalar and policy state of a [`View`].
#[derive(Debug, Clone, PartialEq)]
pub struct CameraParams {
    /// Policy axes.
    pub policies: ViewPolicies,
    /// Viewer head geometry.
    pub body: PhysicalBody,
    /// Coexistence to tracker base.
    pub coexistence_to_tracker_base: Mat4,
    /// Tracker base to coexistence.
    pub tracker_base_to_coexistence: Mat4,
    /// Horizontal field of view in radians.
    pub field_of_view: f64,
    /// Nominal front clip distance.
    pub front_clip_distance: f64,
    /// Nominal back clip distance.
    pub back_clip_distance: f64,
    /// Explicit screen scale.
    pub screen_scale: f64,
    /// Stereo requested by the view.
    pub stereo_enable: bool,
    /// Head tracking enabled and a head sensor present.
    pub tracking: bool,
    /// Coexistence centering.
    pub coexistence_centering: bool,
    /// Left eye for the relative-to-coexistence eyepoint policy.
    pub left_manual_eye_in_coexistence: Vec3,
    /// Right eye for the relative-to-coexistence eyepoint policy.
    pub right_manual_eye_in_coexistence: Vec3,
}

impl CameraParams {
    /// Captures `view`.
    ///
    /// # Errors
    /// [`ViewError::SingularTransform`] when the coexistence to tracker-base
    /// calibration cannot be inverted.
    pub fn capture(view: &View) -> ViewResult<Self> {
        let coe_to_tb = view.environment.coexistence_to_tracker_base;
        let tb_to_coe = coe_to_tb
            .inverse()
            .ok_or(ViewError::SingularTransform("coexistence to tracker base"))?;
        Ok(Self {
            policies: view.policies,
            body: view.body.clone(),
            coexistence_to_tracker_base: coe_to_tb,
            tracker_base_to_coexistence: tb_to_coe,
            field_of_view: view.field_of_view,
            front_clip_distance: view.front_clip_distance,
            back_clip_distance: view.back_clip_distance,
            screen_scale: view.screen_scale,
            stereo_enable: view.stereo_enable,
            tracking: view.tracking_active(),
            coexistence_centering: view.coexistence_centering_enable,
            left_manual_eye_in_coexistence: view.left_manual_eye_in_coexistence,
            right_manual_eye_in_coexistence: view.right_manual_eye_in_coexistence,
        })
    }
}

/// Where the viewer's head is in the tracker base.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadState {
    /// Head to tracker base.
    pub head_to_tracker_base: Mat4,
    /// Head-tracker sensor to tracker base.
    pub head_tracker_to_tracker_base: Mat4,
    /// Coexistence to head-tracker sensor.
    pub coexistence_to_head_tracker: Mat4,
}

impl HeadState {
    /// Head pose from a live sensor reading (sensor to tracker base).
    ///
    /// # Errors
    /// [`ViewError::SingularTransform`] when the reading cannot be inverted.
    pub fn tracked(params: &CameraParams, sensor_to_tracker_base: Mat4) -> ViewResult<Self> {
        let tracker_base_to_sensor = sensor_to_tracker_base
            .inverse()
            .ok_or(ViewError::SingularTransform("head tracker reading"))?;
        Ok(Self {
            head_to_tracker_base: sensor_to_tracker_base * params.body.head_to_head_tracker,
            head_tracker_to_tracker_base: sensor_to_tracker_base,
            coexistence_to_head_tracker: tracker_base_to_sensor * params.coexistence_to_tracker_base,
        })
    }

    /// Nominal head pose: center eye at the nominal eye offset in front of
    /// the coexistence origin.
    ///
    /// # Errors
    /// [`ViewError::SingularTransform`] when head to head tracker cannot be
    /// inverted.
    pub fn nominal(params: &CameraParams) -> ViewResult<Self> {
        let body = &params.body;
        let head_to_tracker_base = params.coexistence_to_tracker_base
            * Mat4::translation(0.0, 0.0, body.nominal_eye_offset_from_nominal_screen)
            * Mat4::from_translation(-body.center_eye());
        let tracker_to_head = body
            .head_to_head_tracker
            .inverse()
            .ok_or(ViewError::SingularTransform("head to head tracker"))?;
        let head_tracker_to_tracker_base = head_to_tracker_base * tracker_to_head;
        let tracker_base_to_sensor = head_tracker_to_tracker_base
            .inverse()
            .ok_or(ViewError::SingularTransform("head tracker to tracker base"))?;
        Ok(Self {
            head_to_tracker_base,
            head_tracker_to_tracker_base,
            coexistence_to_head_tracker: tracker_base_to_sensor * params.coexistence_to_tracker_base,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn nominal_head_puts_center_eye_at_eye_offset() {
        let params = CameraParams::capture(&View::default()).unwrap();
        let head = HeadState::nominal(&params).unwrap();
        let eye = head
            .head_to_tracker_base
            .transform_point(&params.body.center_eye());
        assert!(eye.approx_eq(&Vec3::new(0.0, 0.0, 0.4572), 1e-12));
    }

    #[test]
    fn tracked_head_composes_sensor_and_body() {
        let mut view = View::default();
        view.body.head_to_head_tracker = Mat4::translation(0.0, -0.1, 0.0);
        let params = CameraParams::capture(&view).unwrap();
        let reading = Mat4::translation(0.2, 0.3, 0.5);
        let head = HeadState::tracked(&params, reading).unwrap();
        let origin = head.head_to_tracker_base.transform_point(&Vec3::ZERO);
        assert!(origin.approx_eq(&Vec3::new(0.2, 0.2, 0.5), 1e-12));
        let coe = (head.head_tracker_to_tracker_base * head.coexistence_to_head_tracker)
            .transform_point(&Vec3::UNIT_X);
        assert!(coe.approx_eq(&Vec3::UNIT_X, 1e-12));
    }
}
