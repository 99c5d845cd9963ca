// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `NewDevice`: input devices are recorded, not driven.

use core::any::Any;

use super::{ConfigObject, NameLookup};
use crate::value::Value;

pub(super) const TYPE: &str = "Device";

/// An input device declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceConfig {
    /// Driver class name as written.
    pub class_name: String,
    /// Extra `New` arguments.
    pub args: Vec<Value>,
    /// Every `DeviceProperty`, in order.
    pub properties: Vec<(String, Vec<Value>)>,
}

impl DeviceConfig {
    pub(super) fn build(_name: &str, args: &[Value]) -> Result<Box<dyn ConfigObject>, String> {
        let Some((class, rest)) = args.split_first() else {
            return Err("NewDevice needs a driver class name".into());
        };
        Ok(Box::new(Self {
            class_name: class.as_name()?.to_owned(),
            args: rest.to_vec(),
            properties: Vec::new(),
        }))
    }
}

impl ConfigObject for DeviceConfig {
    fn set_property(
        &mut self,
        property: &str,
        values: &[Value],
        _names: &dyn NameLookup,
    ) -> Result<(), String> {
        self.properties.push((property.to_owned(), values.to_vec()));
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
