// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Typed configuration objects and the builder registry.

mod body;
mod device;
mod environment;
mod platform;
mod screen;
mod sensor;
mod view;

use core::any::Any;
use core::fmt;
use std::collections::BTreeMap;

use parallax_math::Vec3;

use crate::value::Value;

pub use body::BodyConfig;
pub use device::DeviceConfig;
pub use environment::EnvironmentConfig;
pub use platform::PlatformConfig;
pub use screen::{ScreenConfig, WindowSize};
pub use sensor::SensorConfig;
pub use view::ViewConfig;

/// Index of an instantiated object in its container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(pub usize);

/// Resolves object names while properties are applied.
pub trait NameLookup {
    /// The object named `name` (or aliased as `name`) of canonical type
    /// `type_name`.
    fn resolve(&self, type_name: &str, name: &str) -> Option<ObjectId>;
}

/// An object created by a `New<Type>` command.
pub trait ConfigObject: fmt::Debug + Send + Sync + Any {
    /// Applies `<Type>Property name property values…`.
    ///
    /// # Errors
    /// A message for unknown properties, wrong value types or names that
    /// resolve to nothing.
    fn set_property(
        &mut self,
        property: &str,
        values: &[Value],
        names: &dyn NameLookup,
    ) -> Result<(), String>;

    /// Downcasting hook.
    fn as_any(&self) -> &dyn Any;
}

/// Creates an object from its name and the remaining `New` arguments.
pub type Builder = fn(name: &str, args: &[Value]) -> Result<Box<dyn ConfigObject>, String>;

/// Type spellings and their builders.
#[derive(Clone)]
pub struct TypeRegistry {
    builders: BTreeMap<String, (String, Builder)>,
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.builders.keys()).finish()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl TypeRegistry {
    /// A registry with no types.
    pub fn empty() -> Self {
        Self {
            builders: BTreeMap::new(),
        }
    }

    /// The built-in types. `Window` is another spelling of `Screen`.
    pub fn standard() -> Self {
        let mut types = Self::empty();
        types.register(screen::TYPE, ScreenConfig::build);
        types.register_spelling("Window", screen::TYPE);
        types.register(body::TYPE, BodyConfig::build);
        types.register(environment::TYPE, EnvironmentConfig::build);
        types.register(view::TYPE, ViewConfig::build);
        types.register(platform::TYPE, PlatformConfig::build);
        types.register(sensor::TYPE, SensorConfig::build);
        types.register(device::TYPE, DeviceConfig::build);
        types
    }

    /// Registers (or replaces) a type.
    pub fn register(&mut self, type_name: &str, builder: Builder) {
        self.builders
            .insert(type_name.to_owned(), (type_name.to_owned(), builder));
    }

    /// Makes `spelling` another name for the already registered `canonical`.
    /// Returns `false` when `canonical` is unknown.
    pub fn register_spelling(&mut self, spelling: &str, canonical: &str) -> bool {
        let Some(entry) = self.builders.get(canonical).cloned() else {
            return false;
        };
        self.builders.insert(spelling.to_owned(), entry);
        true
    }

    /// Canonical type name and builder for a spelling.
    pub fn lookup(&self, spelling: &str) -> Option<(&str, Builder)> {
        self.builders
            .get(spelling)
            .map(|(canonical, builder)| (canonical.as_str(), *builder))
    }

    /// Canonical name for a spelling.
    pub fn canonical(&self, spelling: &str) -> Option<&str> {
        self.lookup(spelling).map(|(canonical, _)| canonical)
    }
}

// Shared property helpers.

fn one<'a>(values: &'a [Value], property: &str) -> Result<&'a Value, String> {
    match values {
        [v] => Ok(v),
        _ => Err(format!("{property} takes one value, found {}", values.len())),
    }
}

fn number(values: &[Value], property: &str) -> Result<f64, String> {
    one(values, property)?.as_number()
}

fn positive(values: &[Value], property: &str) -> Result<f64, String> {
    let n = number(values, property)?;
    if n > 0.0 && n.is_finite() {
        Ok(n)
    } else {
        Err(format!("{property} must be positive, found {n}"))
    }
}

fn vec3(values: &[Value], property: &str) -> Result<Vec3, String> {
    one(values, property)?.as_vec3()
}

fn flag(values: &[Value], property: &str) -> Result<bool, String> {
    one(values, property)?.as_bool()
}

fn reference(
    values: &[Value],
    property: &str,
    type_name: &str,
    names: &dyn NameLookup,
) -> Result<ObjectId, String> {
    let name = one(values, property)?.as_name()?;
    names
        .resolve(type_name, name)
        .ok_or_else(|| format!("no {type_name} named `{name}`"))
}

fn unknown(type_name: &str, property: &str) -> String {
    format!("unknown {type_name} property `{property}`")
}

fn no_args(type_name: &str, args: &[Value]) -> Result<(), String> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(format!("unexpected arguments to New{type_name}"))
    }
}

/// Lookup that knows no names.
#[cfg(test)]
pub(crate) struct NoNames;

#[cfg(test)]
impl NameLookup for NoNames {
    fn resolve(&self, _: &str, _: &str) -> Option<ObjectId> {
        None
    }
}
