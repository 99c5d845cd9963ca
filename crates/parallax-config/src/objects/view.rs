// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `NewView`.

use core::any::Any;

use parallax_view::{AttachPolicy, View};

use super::{
    body, environment, flag, no_args, number, one, platform, positive, reference, screen, unknown,
    vec3, ConfigObject, NameLookup, ObjectId,
};
use crate::value::Value;

pub(super) const TYPE: &str = "View";

/// A camera and the objects it is assembled from.
#[derive(Debug, Clone, Default)]
pub struct ViewConfig {
    /// Scalar parameters and policies. Canvases, rig, body and environment
    /// are filled in when host objects are built.
    pub template: View,
    /// One canvas per screen, in property order.
    pub screens: Vec<ObjectId>,
    /// Body, when set.
    pub body: Option<ObjectId>,
    /// Environment, when set.
    pub environment: Option<ObjectId>,
    /// Rig, when set.
    pub platform: Option<ObjectId>,
    /// Explicit attach policy; otherwise the rig's, otherwise the default.
    pub view_attach_policy: Option<AttachPolicy>,
}

impl ViewConfig {
    pub(super) fn build(_name: &str, args: &[Value]) -> Result<Box<dyn ConfigObject>, String> {
        no_args(TYPE, args)?;
        Ok(Box::new(Self::default()))
    }
}

impl ConfigObject for ViewConfig {
    fn set_property(
        &mut self,
        property: &str,
        values: &[Value],
        names: &dyn NameLookup,
    ) -> Result<(), String> {
        let view = &mut self.template;
        let policies = &mut view.policies;
        let policy = || one(values, property);
        match property {
            "Screen" | "Window" => {
                let id = reference(values, property, screen::TYPE, names)?;
                if self.screens.contains(&id) {
                    return Err("screen already used by this view".into());
                }
                self.screens.push(id);
            }
            "PhysicalBody" => self.body = Some(reference(values, property, body::TYPE, names)?),
            "PhysicalEnvironment" => {
                self.environment = Some(reference(values, property, environment::TYPE, names)?);
            }
            "ViewPlatform" => {
                self.platform = Some(reference(values, property, platform::TYPE, names)?);
            }
            "ViewPolicy" => policies.view = policy()?.as_policy()?,
            "ProjectionPolicy" => policies.projection = policy()?.as_policy()?,
            "FrontClipPolicy" => policies.front_clip = policy()?.as_policy()?,
            "BackClipPolicy" => policies.back_clip = policy()?.as_policy()?,
            "WindowEyepointPolicy" => policies.window_eyepoint = policy()?.as_policy()?,
            "WindowResizePolicy" => policies.window_resize = policy()?.as_policy()?,
            "WindowMovementPolicy" => policies.window_movement = policy()?.as_policy()?,
            "ScreenScalePolicy" => policies.screen_scale = policy()?.as_policy()?,
            "CoexistenceCenterInPworldPolicy" => {
                policies.coexistence_center = policy()?.as_policy()?;
            }
            "ViewAttachPolicy" => self.view_attach_policy = Some(policy()?.as_policy()?),
            "FieldOfView" => {
                let fov = positive(values, property)?;
                if fov >= core::f64::consts::PI {
                    return Err(format!("FieldOfView must be below pi radians, found {fov}"));
                }
                view.field_of_view = fov;
            }
            "FrontClipDistance" => view.front_clip_distance = number(values, property)?,
            "BackClipDistance" => view.back_clip_distance = number(values, property)?,
            "ScreenScale" => view.screen_scale = positive(values, property)?,
            "StereoEnable" => view.stereo_enable = flag(values, property)?,
            "TrackingEnable" => view.tracking_enable = flag(values, property)?,
            "CoexistenceCenteringEnable" => {
                view.coexistence_centering_enable = flag(values, property)?;
            }
            "LeftManualEyeInCoexistence" => {
                view.left_manual_eye_in_coexistence = vec3(values, property)?;
            }
            "RightManualEyeInCoexistence" => {
                view.right_manual_eye_in_coexistence = vec3(values, property)?;
            }
            _ => return Err(unknown(TYPE, property)),
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use parallax_view::{ClipPolicy, ViewPolicy};

    use super::*;

    struct OneScreen;

    impl NameLookup for OneScreen {
        fn resolve(&self, type_name: &str, name: &str) -> Option<ObjectId> {
            (type_name == "Screen" && name == "s0").then_some(ObjectId(3))
        }
    }

    #[test]
    fn policies_parse_per_axis() {
        let mut v = ViewConfig::default();
        v.set_property("ViewPolicy", &[Value::Word("HMD_VIEW".into())], &OneScreen)
            .unwrap();
        v.set_property("BackClipPolicy", &[Value::Word("VIRTUAL_EYE".into())], &OneScreen)
            .unwrap();
        assert_eq!(v.template.policies.view, ViewPolicy::HeadMounted);
        assert_eq!(v.template.policies.back_clip, ClipPolicy::VirtualEye);
        assert!(v
            .set_property("FrontClipPolicy", &[Value::Word("HMD_VIEW".into())], &OneScreen)
            .is_err());
    }

    #[test]
    fn screens_resolve_through_the_lookup() {
        let mut v = ViewConfig::default();
        v.set_property("Window", &[Value::Word("s0".into())], &OneScreen)
            .unwrap();
        assert_eq!(v.screens, vec![ObjectId(3)]);
        assert!(v
            .set_property("Screen", &[Value::Word("s0".into())], &OneScreen)
            .is_err());
        let err = v
            .set_property("Screen", &[Value::Word("s9".into())], &OneScreen)
            .unwrap_err();
        assert_eq!(err, "no Screen named `s9`");
    }

    #[test]
    fn field_of_view_must_be_a_real_angle() {
        let mut v = ViewConfig::default();
        assert!(v
            .set_property("FieldOfView", &[Value::Number(4.0)], &OneScreen)
            .is_err());
        v.set_property("FieldOfView", &[Value::Number(1.0)], &OneScreen)
            .unwrap();
        assert_eq!(v.template.field_of_view, 1.0);
    }
}
