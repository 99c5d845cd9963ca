// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `NewPhysicalEnvironment`.

use core::any::Any;

use parallax_math::Mat4;

use super::{device, no_args, one, reference, sensor, unknown, ConfigObject, NameLookup, ObjectId};
use crate::value::Value;

pub(super) const TYPE: &str = "PhysicalEnvironment";

/// Room calibration shared by views.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentConfig {
    /// Coexistence to tracker-base transform.
    pub coexistence_to_tracker_base: Mat4,
    /// Sensor tracking the head.
    pub head_tracker: Option<ObjectId>,
    /// Devices attached to the environment.
    pub input_devices: Vec<ObjectId>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            coexistence_to_tracker_base: Mat4::identity(),
            head_tracker: None,
            input_devices: Vec::new(),
        }
    }
}

impl EnvironmentConfig {
    pub(super) fn build(_name: &str, args: &[Value]) -> Result<Box<dyn ConfigObject>, String> {
        no_args(TYPE, args)?;
        Ok(Box::new(Self::default()))
    }
}

impl ConfigObject for EnvironmentConfig {
    fn set_property(
        &mut self,
        property: &str,
        values: &[Value],
        names: &dyn NameLookup,
    ) -> Result<(), String> {
        match property {
            "CoexistenceToTrackerBase" => {
                self.coexistence_to_tracker_base = one(values, property)?.as_mat4()?;
            }
            "HeadTracker" => {
                self.head_tracker = Some(reference(values, property, sensor::TYPE, names)?);
            }
            "InputDevice" => {
                let id = reference(values, property, device::TYPE, names)?;
                self.input_devices.push(id);
            }
            _ => return Err(unknown(TYPE, property)),
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
