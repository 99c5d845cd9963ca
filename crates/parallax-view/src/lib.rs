// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![doc = r"View model for Parallax.

Given a view (policies, head geometry, room calibration), the canvases it
renders to and the screens those canvases sit on, this crate derives every
transform needed to draw the virtual world correctly for a physical viewer:
coexistence to image plate, eye positions, view platform to coexistence,
projections and their world-space variants.

Layers:
- `host`: the engine objects the host mutates (`Screen`, `Canvas`,
  `ViewPlatform`, `View`, sensors).
- `screen_info` / `platform_info`: caches shared by every view using a
  screen or rig, held in a caller-owned `InfoRegistry`.
- `canvas_info`: per-canvas lazy derivation over the dependency graph in
  `dirty`.
- `view_info`: the per-view façade (`ViewInfo`) that decides what to refresh
  before each query.

Physical quantities are meters; angles are radians.
"]

/// Camera parameters and head pose.
pub mod camera;
/// Per-canvas derivations.
pub mod canvas_info;
/// Dependency graph and dirty tracking.
pub mod dirty;
/// Error type.
pub mod error;
/// Host object model.
pub mod host;
/// Rig cache.
pub mod platform_info;
/// Policy enums.
pub mod policy;
/// Projection matrices.
pub mod projection;
/// Shared cache arena.
pub mod registry;
/// Screen cache.
pub mod screen_info;
/// Per-view façade.
pub mod view_info;

pub use camera::{CameraParams, HeadState};
pub use canvas_info::{CanvasInfo, CanvasState, Placement};
pub use dirty::{DirtySet, Node, RecomputeCounts};
pub use error::{ViewError, ViewResult};
pub use host::{
    shared, Canvas, CanvasId, PhysicalBody, PhysicalEnvironment, RigId, Screen, ScreenId, Sensor,
    Shared, StaticSensor, View, ViewId, ViewPlatform,
};
pub use platform_info::ViewPlatformInfo;
pub use policy::{
    AttachPolicy, ClipPolicy, MonoscopicViewPolicy, PolicyParseError, ProjectionPolicy,
    ScreenScalePolicy, ViewPolicies, ViewPolicy, WindowEyepointPolicy, WindowMovementPolicy,
    WindowResizePolicy,
};
pub use projection::{ClipDistances, Frustum, MIN_CLIP_DISTANCE};
pub use registry::{InfoRegistry, MAX_REGISTRY_IDS};
pub use screen_info::{ScreenChanges, ScreenInfo, ScreenSnapshot};
pub use view_info::{AutoUpdate, Stereo, UpdateNotifier, ViewInfo};
