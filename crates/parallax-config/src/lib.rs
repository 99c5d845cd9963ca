// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![doc = r#"Parallax configuration files.

A configuration is a sequence of parenthesized commands:

```text
(NewScreen center 0)
(ScreenProperty center PhysicalScreenWidth 0.52)
(ScreenProperty center TrackerBaseToImagePlate (Translate 0.26 0.16 0.0))
(NewView main)
(ViewProperty main Screen center)
(ViewProperty main ViewPlatform rig)
(NewViewPlatform rig)
(Include "${SITE}/tracker.cfg")
```

Reading runs in passes (includes, then `New`, then aliases, then properties)
so properties may name objects created later. Rejected commands are kept as
diagnostics; the rest of the file still applies. [`Configured::build`] turns
the result into host objects for `parallax-view`.
"#]

/// Host object assembly.
pub mod build;
/// Top-level commands.
pub mod command;
/// Reading passes and the object container.
pub mod container;
/// Errors and source locations.
pub mod error;
/// Tokenizer.
pub mod lexer;
/// Typed objects and the builder registry.
pub mod objects;
/// Expression trees.
pub mod sexpr;
/// Literals and built-in functions.
pub mod value;

pub use build::{Configured, ConfiguredView};
pub use command::{Command, CommandKind};
pub use container::{ConfigContainer, ConfigReader, Entry};
pub use error::{ConfigError, ConfigResult, Location};
pub use objects::{
    BodyConfig, Builder, ConfigObject, DeviceConfig, EnvironmentConfig, NameLookup, ObjectId,
    PlatformConfig, ScreenConfig, SensorConfig, TypeRegistry, ViewConfig, WindowSize,
};
pub use value::Value;
