// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `NewSensor name device index`.

use core::any::Any;

use parallax_math::{Mat4, Vec3};

use super::{one, unknown, vec3, ConfigObject, NameLookup};
use crate::value::Value;

pub(super) const TYPE: &str = "Sensor";

/// One sensor of an input device.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorConfig {
    /// Device name; resolved when host objects are built.
    pub device: String,
    /// Sensor index on the device.
    pub index: u32,
    /// Hotspot in sensor coordinates.
    pub hotspot: Vec3,
    /// Pose reported until a driver updates it.
    pub pose: Mat4,
}

impl SensorConfig {
    pub(super) fn build(_name: &str, args: &[Value]) -> Result<Box<dyn ConfigObject>, String> {
        let [device, index] = args else {
            return Err("NewSensor takes a device name and a sensor index".into());
        };
        Ok(Box::new(Self {
            device: device.as_name()?.to_owned(),
            index: index.as_index()?,
            hotspot: Vec3::ZERO,
            pose: Mat4::identity(),
        }))
    }
}

impl ConfigObject for SensorConfig {
    fn set_property(
        &mut self,
        property: &str,
        values: &[Value],
        _names: &dyn NameLookup,
    ) -> Result<(), String> {
        match property {
            "Hotspot" => self.hotspot = vec3(values, property)?,
            "Pose" => self.pose = one(values, property)?.as_mat4()?,
            _ => return Err(unknown(TYPE, property)),
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
