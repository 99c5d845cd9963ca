// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Host object model.
//!
//! These are the rendering engine's objects as seen by the view model: plain
//! data behind shared handles that the host mutates and the caches read. The
//! view model never owns the render loop; it only reads these descriptors
//! when told (or configured) to refresh.

use core::f64::consts::FRAC_PI_4;
use core::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use parallax_math::{Mat4, Vec3};
use serde::Serialize;

use crate::policy::{MonoscopicViewPolicy, ViewPolicies};

/// Shared, host-mutable handle to an engine object.
pub type Shared<T> = Arc<RwLock<T>>;

/// Wraps a value in a [`Shared`] handle.
pub fn shared<T>(value: T) -> Shared<T> {
    Arc::new(RwLock::new(value))
}

/// Read-locks a shared handle, recovering from poisoning.
pub fn read<T>(handle: &Shared<T>) -> RwLockReadGuard<'_, T> {
    handle.read().unwrap_or_else(PoisonError::into_inner)
}

/// Write-locks a shared handle, recovering from poisoning.
pub fn write<T>(handle: &Shared<T>) -> RwLockWriteGuard<'_, T> {
    handle.write().unwrap_or_else(PoisonError::into_inner)
}

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        pub struct $name(pub u32);

        impl $name {
            /// Slot index in dense per-id arrays.
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

id_type! {
    /// Stable identity of a physical screen. Keep these small and dense:
    /// registries index arrays by them.
    ScreenId, "screen#"
}

id_type! {
    /// Stable identity of a view platform (camera rig).
    RigId, "rig#"
}

id_type! {
    /// Stable identity of a canvas (render surface).
    CanvasId, "canvas#"
}

id_type! {
    /// Identity of one view cache; assigned by the registry.
    ViewId, "view#"
}

/// Meters per pixel at 90 dpi, used when a screen's physical size is unknown.
pub const DEFAULT_METERS_PER_PIXEL: f64 = 0.0254 / 90.0;

/// Physical display surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Screen {
    /// Stable identity.
    pub id: ScreenId,
    /// Physical width in meters.
    pub physical_width: f64,
    /// Physical height in meters.
    pub physical_height: f64,
    /// Width in pixels.
    pub pixel_width: u32,
    /// Height in pixels.
    pub pixel_height: u32,
    /// Calibration from tracker base to this screen's image plate.
    pub tracker_base_to_image_plate: Mat4,
    /// Head-mounted calibration from head tracker to the left image plate.
    pub head_tracker_to_left_image_plate: Mat4,
    /// Head-mounted calibration from head tracker to the right image plate.
    pub head_tracker_to_right_image_plate: Mat4,
}

impl Screen {
    /// A screen of the given pixel size with a 90 dpi physical size and
    /// identity calibrations.
    pub fn new(id: ScreenId, pixel_width: u32, pixel_height: u32) -> Self {
        Self {
            id,
            physical_width: f64::from(pixel_width) * DEFAULT_METERS_PER_PIXEL,
            physical_height: f64::from(pixel_height) * DEFAULT_METERS_PER_PIXEL,
            pixel_width,
            pixel_height,
            tracker_base_to_image_plate: Mat4::identity(),
            head_tracker_to_left_image_plate: Mat4::identity(),
            head_tracker_to_right_image_plate: Mat4::identity(),
        }
    }

    /// Sets the physical size in meters.
    pub fn with_physical_size(mut self, width: f64, height: f64) -> Self {
        self.physical_width = width;
        self.physical_height = height;
        self
    }
}

/// Render surface placed on a screen.
///
/// Pixel coordinates follow window-system conventions: `(x, y)` is the
/// top-left corner with `y` growing downward from the top of the screen.
#[derive(Debug, Clone)]
pub struct Canvas {
    /// Stable identity.
    pub id: CanvasId,
    /// Screen the canvas is shown on.
    pub screen: Shared<Screen>,
    /// Left edge in screen pixels.
    pub x: i32,
    /// Top edge in screen pixels.
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Whether the surface can present separate left/right images.
    pub stereo_available: bool,
    /// Eye used when rendering monoscopically.
    pub monoscopic_view_policy: MonoscopicViewPolicy,
    /// Left eye position for the screen/window eyepoint policies.
    pub left_manual_eye_in_image_plate: Vec3,
    /// Right eye position for the screen/window eyepoint policies.
    pub right_manual_eye_in_image_plate: Vec3,
}

impl Canvas {
    /// A canvas covering the whole of `screen`.
    pub fn full_screen(id: CanvasId, screen: Shared<Screen>) -> Self {
        let (w, h) = {
            let s = read(&screen);
            (s.pixel_width, s.pixel_height)
        };
        Self {
            id,
            screen,
            x: 0,
            y: 0,
            width: w,
            height: h,
            stereo_available: false,
            monoscopic_view_policy: MonoscopicViewPolicy::Cyclopean,
            left_manual_eye_in_image_plate: Vec3::new(0.142, 0.135, 0.4572),
            right_manual_eye_in_image_plate: Vec3::new(0.208, 0.135, 0.4572),
        }
    }
}

/// Camera rig carrying views through the virtual world.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewPlatform {
    /// Stable identity.
    pub id: RigId,
    /// Rig-to-world transform as maintained by the scene graph.
    pub local_to_world: Mat4,
    /// Whether the scene graph grants read access to `local_to_world`.
    pub allow_local_to_world_read: bool,
}

impl ViewPlatform {
    /// A readable rig at the world origin.
    pub fn new(id: RigId) -> Self {
        Self {
            id,
            local_to_world: Mat4::identity(),
            allow_local_to_world_read: true,
        }
    }
}

/// Calibrated geometry of the viewer's head.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalBody {
    /// Left eye in head coordinates.
    pub left_eye_position: Vec3,
    /// Right eye in head coordinates.
    pub right_eye_position: Vec3,
    /// Left ear in head coordinates.
    pub left_ear_position: Vec3,
    /// Right ear in head coordinates.
    pub right_ear_position: Vec3,
    /// Height of the eyes above the ground for the nominal-feet policies.
    pub nominal_eye_height_from_ground: f64,
    /// Distance from the nominal screen to the nominal eye.
    pub nominal_eye_offset_from_nominal_screen: f64,
    /// Head to head-tracker-sensor transform.
    pub head_to_head_tracker: Mat4,
}

impl Default for PhysicalBody {
    fn default() -> Self {
        Self {
            left_eye_position: Vec3::new(-0.033, 0.0, 0.0),
            right_eye_position: Vec3::new(0.033, 0.0, 0.0),
            left_ear_position: Vec3::new(-0.080, -0.030, 0.095),
            right_ear_position: Vec3::new(0.080, -0.030, 0.095),
            nominal_eye_height_from_ground: 1.68,
            nominal_eye_offset_from_nominal_screen: 0.4572,
            head_to_head_tracker: Mat4::identity(),
        }
    }
}

impl PhysicalBody {
    /// Midpoint between the eyes in head coordinates.
    pub fn center_eye(&self) -> Vec3 {
        self.left_eye_position.midpoint(&self.right_eye_position)
    }

    /// Distance between the eyes.
    pub fn interocular_distance(&self) -> f64 {
        self.left_eye_position.distance(&self.right_eye_position)
    }
}

/// Six-degree-of-freedom tracker sensor.
pub trait Sensor: Send + Sync + fmt::Debug {
    /// Latest sensor-to-tracker-base pose.
    fn read(&self) -> Mat4;
}

/// Sensor whose pose is set by the host (or a test).
#[derive(Debug, Default)]
pub struct StaticSensor {
    pose: Mutex<Mat4>,
}

impl StaticSensor {
    /// Creates a sensor reporting `pose`.
    pub fn new(pose: Mat4) -> Self {
        Self {
            pose: Mutex::new(pose),
        }
    }

    /// Replaces the reported pose.
    pub fn set_pose(&self, pose: Mat4) {
        *self.pose.lock().unwrap_or_else(PoisonError::into_inner) = pose;
    }
}

impl Sensor for StaticSensor {
    fn read(&self) -> Mat4 {
        *self.pose.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Physical room setup shared by the views of one installation.
#[derive(Debug, Clone)]
pub struct PhysicalEnvironment {
    /// Coexistence to tracker-base transform.
    pub coexistence_to_tracker_base: Mat4,
    /// Sensor tracking the viewer's head, if any.
    pub head_sensor: Option<Arc<dyn Sensor>>,
}

impl Default for PhysicalEnvironment {
    fn default() -> Self {
        Self {
            coexistence_to_tracker_base: Mat4::identity(),
            head_sensor: None,
        }
    }
}

/// Camera: the policies and physical parameters that turn one rig into
/// images on a set of canvases.
#[derive(Debug, Clone)]
pub struct View {
    /// Canvases rendered by this view.
    pub canvases: Vec<Shared<Canvas>>,
    /// Rig this view is attached to.
    pub platform: Option<Shared<ViewPlatform>>,
    /// Viewer head geometry.
    pub body: PhysicalBody,
    /// Room setup.
    pub environment: PhysicalEnvironment,
    /// Policy axes.
    pub policies: ViewPolicies,
    /// Horizontal field of view in radians for the field-of-view eyepoint policy.
    pub field_of_view: f64,
    /// Nominal front clip distance (units per the front clip policy).
    pub front_clip_distance: f64,
    /// Nominal back clip distance (units per the back clip policy).
    pub back_clip_distance: f64,
    /// Screen scale used by the explicit screen-scale policy.
    pub screen_scale: f64,
    /// Render left/right images on stereo-capable canvases.
    pub stereo_enable: bool,
    /// Use the head sensor when one is present.
    pub tracking_enable: bool,
    /// Center coexistence on the canvas (or screen) instead of using the
    /// tracker-base calibration.
    pub coexistence_centering_enable: bool,
    /// Left eye for the relative-to-coexistence eyepoint policy.
    pub left_manual_eye_in_coexistence: Vec3,
    /// Right eye for the relative-to-coexistence eyepoint policy.
    pub right_manual_eye_in_coexistence: Vec3,
}

impl Default for View {
    fn default() -> Self {
        Self {
            canvases: Vec::new(),
            platform: None,
            body: PhysicalBody::default(),
            environment: PhysicalEnvironment::default(),
            policies: ViewPolicies::default(),
            field_of_view: FRAC_PI_4,
            front_clip_distance: 0.1,
            back_clip_distance: 10.0,
            screen_scale: 1.0,
            stereo_enable: false,
            tracking_enable: false,
            coexistence_centering_enable: true,
            left_manual_eye_in_coexistence: Vec3::new(-0.033, 0.0, 0.4572),
            right_manual_eye_in_coexistence: Vec3::new(0.033, 0.0, 0.4572),
        }
    }
}

impl View {
    /// Whether head tracking is both enabled and possible.
    pub fn tracking_active(&self) -> bool {
        self.tracking_enable && self.environment.head_sensor.is_some()
    }
}
