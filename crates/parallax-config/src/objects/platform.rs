// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `NewViewPlatform`.

use core::any::Any;

use parallax_math::Mat4;
use parallax_view::AttachPolicy;

use super::{flag, no_args, one, unknown, ConfigObject, NameLookup};
use crate::value::Value;

pub(super) const TYPE: &str = "ViewPlatform";

/// A camera rig.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformConfig {
    /// Starting local-to-world transform.
    pub initial_viewing_transform: Mat4,
    /// Back the rig off along +z so that x in [-1, 1] at z = 0 fills the
    /// field of view of the first view using it.
    pub nominal_viewing_transform: bool,
    /// Whether world-space queries may read the rig transform.
    pub allow_local_to_world_read: bool,
    /// Attach policy for views that do not set their own.
    pub view_attach_policy: Option<AttachPolicy>,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            initial_viewing_transform: Mat4::identity(),
            nominal_viewing_transform: false,
            allow_local_to_world_read: true,
            view_attach_policy: None,
        }
    }
}

impl PlatformConfig {
    pub(super) fn build(_name: &str, args: &[Value]) -> Result<Box<dyn ConfigObject>, String> {
        no_args(TYPE, args)?;
        Ok(Box::new(Self::default()))
    }

    /// Local-to-world transform for a rig whose first view has
    /// `field_of_view` radians.
    pub fn local_to_world(&self, field_of_view: f64) -> Mat4 {
        if self.nominal_viewing_transform {
            let distance = 1.0 / (field_of_view / 2.0).tan();
            Mat4::translation(0.0, 0.0, distance) * self.initial_viewing_transform
        } else {
            self.initial_viewing_transform
        }
    }
}

impl ConfigObject for PlatformConfig {
    fn set_property(
        &mut self,
        property: &str,
        values: &[Value],
        _names: &dyn NameLookup,
    ) -> Result<(), String> {
        match property {
            "InitialViewingTransform" => {
                self.initial_viewing_transform = one(values, property)?.as_mat4()?;
            }
            "NominalViewingTransform" => self.nominal_viewing_transform = flag(values, property)?,
            "AllowLocalToVworldRead" => self.allow_local_to_world_read = flag(values, property)?,
            "ViewAttachPolicy" => {
                self.view_attach_policy = Some(one(values, property)?.as_policy()?);
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
    use core::f64::consts::FRAC_PI_2;

    use parallax_math::Vec3;

    use super::*;

    #[test]
    fn nominal_transform_backs_off_by_the_field_of_view() {
        let mut p = PlatformConfig::default();
        assert_eq!(p.local_to_world(FRAC_PI_2), Mat4::identity());
        p.nominal_viewing_transform = true;
        p.initial_viewing_transform = Mat4::translation(1.0, 0.0, 0.0);
        let m = p.local_to_world(FRAC_PI_2);
        assert!(m
            .translation_part()
            .approx_eq(&Vec3::new(1.0, 0.0, 1.0), 1e-12));
    }
}
