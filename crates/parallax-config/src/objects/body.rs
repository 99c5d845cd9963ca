// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `NewPhysicalBody`.

use core::any::Any;

use parallax_math::Vec3;
use parallax_view::PhysicalBody;

use super::{no_args, number, one, positive, unknown, vec3, ConfigObject, NameLookup};
use crate::value::Value;

pub(super) const TYPE: &str = "PhysicalBody";

/// Head geometry of one viewer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BodyConfig {
    /// The body handed to views that reference this object.
    pub body: PhysicalBody,
}

impl BodyConfig {
    pub(super) fn build(_name: &str, args: &[Value]) -> Result<Box<dyn ConfigObject>, String> {
        no_args(TYPE, args)?;
        Ok(Box::new(Self::default()))
    }
}

impl ConfigObject for BodyConfig {
    fn set_property(
        &mut self,
        property: &str,
        values: &[Value],
        _names: &dyn NameLookup,
    ) -> Result<(), String> {
        let body = &mut self.body;
        match property {
            "LeftEyePosition" => body.left_eye_position = vec3(values, property)?,
            "RightEyePosition" => body.right_eye_position = vec3(values, property)?,
            "LeftEarPosition" => body.left_ear_position = vec3(values, property)?,
            "RightEarPosition" => body.right_ear_position = vec3(values, property)?,
            // Symmetric eyes on the x axis, keeping the head's eye height.
            "StereoEyeSeparation" => {
                let half = positive(values, property)? / 2.0;
                let center = body.center_eye();
                body.left_eye_position = Vec3::new(-half, center.y, center.z);
                body.right_eye_position = Vec3::new(half, center.y, center.z);
            }
            "NominalEyeHeightFromGround" => {
                body.nominal_eye_height_from_ground = number(values, property)?;
            }
            "NominalEyeOffsetFromNominalScreen" => {
                body.nominal_eye_offset_from_nominal_screen = positive(values, property)?;
            }
            "HeadToHeadTracker" => body.head_to_head_tracker = one(values, property)?.as_mat4()?,
            _ => return Err(unknown(TYPE, property)),
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
