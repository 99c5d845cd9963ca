// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Host objects assembled from a read configuration.

use core::f64::consts::FRAC_PI_4;
use std::collections::BTreeMap;
use std::sync::Arc;

use parallax_view::{
    shared, AutoUpdate, Canvas, CanvasId, InfoRegistry, RigId, Screen, ScreenId, Sensor, Shared,
    StaticSensor, View, ViewInfo, ViewPlatform,
};
use tracing::debug;

use crate::container::{ConfigContainer, Entry};
use crate::error::{ConfigError, ConfigResult};
use crate::objects::{
    BodyConfig, ConfigObject, DeviceConfig, EnvironmentConfig, ObjectId, PlatformConfig,
    ScreenConfig, SensorConfig, ViewConfig, WindowSize,
};

/// One configured view and the canvases created for it.
#[derive(Debug, Clone)]
pub struct ConfiguredView {
    /// Config name.
    pub name: String,
    /// The view.
    pub view: Shared<View>,
    /// Canvases in `Screen` property order, keyed by the screen's config name.
    pub canvases: Vec<(String, Shared<Canvas>)>,
}

/// Screens, rigs, sensors and views built from a [`ConfigContainer`].
#[derive(Debug, Default)]
pub struct Configured {
    /// Physical screens by config name. Aliased names are not repeated.
    pub screens: BTreeMap<String, Shared<Screen>>,
    /// Rigs by config name.
    pub platforms: BTreeMap<String, Shared<ViewPlatform>>,
    /// Sensors by config name.
    pub sensors: BTreeMap<String, Arc<StaticSensor>>,
    /// Views in creation order.
    pub views: Vec<ConfiguredView>,
}

fn display_name(container: &ConfigContainer, id: ObjectId) -> String {
    container
        .entry(id)
        .map_or_else(|| format!("#{}", id.0), |e| e.name.clone())
}

fn typed<'a, T: ConfigObject>(
    container: &'a ConfigContainer,
    id: ObjectId,
    kind: &'static str,
    used_by: &Entry,
) -> ConfigResult<(&'a Entry, &'a T)> {
    container
        .entry(id)
        .and_then(|e| Some((e, e.object.as_any().downcast_ref::<T>()?)))
        .ok_or_else(|| ConfigError::Unresolved {
            at: used_by.at.clone(),
            kind,
            name: display_name(container, id),
        })
}

impl Configured {
    /// Builds host objects.
    ///
    /// Screens sharing a frame-buffer index share one [`Screen`], configured
    /// by the first of them. Screen ids follow first use of each frame
    /// buffer and rig ids follow creation order, so both stay dense. A rig with the
    /// nominal viewing transform uses the field of view of the first view
    /// attached to it.
    ///
    /// # Errors
    /// [`ConfigError::Unresolved`] when a sensor names a device that does not
    /// exist, or a referenced object is not of the expected type.
    pub fn build(container: &ConfigContainer) -> ConfigResult<Self> {
        let mut out = Self::default();

        let mut by_frame_buffer: BTreeMap<u32, Shared<Screen>> = BTreeMap::new();
        let mut screens: BTreeMap<ObjectId, Shared<Screen>> = BTreeMap::new();
        let mut next_screen = 0;
        for (id, entry, config) in container.of_type::<ScreenConfig>("Screen") {
            let screen = by_frame_buffer
                .entry(config.frame_buffer)
                .or_insert_with(|| {
                    next_screen += 1;
                    shared(host_screen(ScreenId(next_screen - 1), config))
                })
                .clone();
            out.screens.insert(entry.name.clone(), screen.clone());
            screens.insert(id, screen);
        }

        let mut sensors: BTreeMap<ObjectId, Arc<StaticSensor>> = BTreeMap::new();
        for (id, entry, config) in container.of_type::<SensorConfig>("Sensor") {
            let device = container.resolve("Device", &config.device);
            if device.and_then(|d| container.get::<DeviceConfig>(d)).is_none() {
                return Err(ConfigError::Unresolved {
                    at: entry.at.clone(),
                    kind: "Device",
                    name: config.device.clone(),
                });
            }
            let sensor = Arc::new(StaticSensor::new(config.pose));
            out.sensors.insert(entry.name.clone(), Arc::clone(&sensor));
            sensors.insert(id, sensor);
        }

        let views: Vec<_> = container.of_type::<ViewConfig>("View").collect();

        let mut platforms: BTreeMap<ObjectId, Shared<ViewPlatform>> = BTreeMap::new();
        let mut next_rig = 0;
        for (id, entry, config) in container.of_type::<PlatformConfig>("ViewPlatform") {
            let fov = views
                .iter()
                .find(|(_, _, v)| v.platform == Some(id))
                .map_or(FRAC_PI_4, |(_, _, v)| v.template.field_of_view);
            let rig = ViewPlatform {
                local_to_world: config.local_to_world(fov),
                allow_local_to_world_read: config.allow_local_to_world_read,
                ..ViewPlatform::new(RigId(next_rig))
            };
            next_rig += 1;
            let rig = shared(rig);
            out.platforms.insert(entry.name.clone(), rig.clone());
            platforms.insert(id, rig);
        }

        let mut next_canvas = 0;
        for (_, entry, config) in views {
            let mut view = config.template.clone();
            if let Some(id) = config.body {
                view.body = typed::<BodyConfig>(container, id, "PhysicalBody", entry)?
                    .1
                    .body
                    .clone();
            }
            if let Some(id) = config.environment {
                let (_, env) =
                    typed::<EnvironmentConfig>(container, id, "PhysicalEnvironment", entry)?;
                view.environment.coexistence_to_tracker_base = env.coexistence_to_tracker_base;
                if let Some(sensor) = env.head_tracker {
                    let handle = sensors.get(&sensor).ok_or_else(|| ConfigError::Unresolved {
                        at: entry.at.clone(),
                        kind: "Sensor",
                        name: display_name(container, sensor),
                    })?;
                    let head: Arc<dyn Sensor> = handle.clone();
                    view.environment.head_sensor = Some(head);
                }
            }
            let mut rig_attach = None;
            view.platform = match config.platform {
                Some(id) => {
                    rig_attach = typed::<PlatformConfig>(container, id, "ViewPlatform", entry)?
                        .1
                        .view_attach_policy;
                    platforms.get(&id).cloned()
                }
                None => None,
            };
            if let Some(policy) = config.view_attach_policy.or(rig_attach) {
                view.policies.view_attach = policy;
            }

            let mut canvases = Vec::with_capacity(config.screens.len());
            for id in &config.screens {
                let (screen_entry, screen_config) =
                    typed::<ScreenConfig>(container, *id, "Screen", entry)?;
                let Some(screen) = screens.get(id) else {
                    return Err(ConfigError::Unresolved {
                        at: entry.at.clone(),
                        kind: "Screen",
                        name: screen_entry.name.clone(),
                    });
                };
                let canvas = shared(host_canvas(
                    CanvasId(next_canvas),
                    screen.clone(),
                    screen_config,
                ));
                next_canvas += 1;
                view.canvases.push(canvas.clone());
                canvases.push((screen_entry.name.clone(), canvas));
            }
            debug!(view = %entry.name, canvases = canvases.len(), "view assembled");
            out.views.push(ConfiguredView {
                name: entry.name.clone(),
                view: shared(view),
                canvases,
            });
        }
        Ok(out)
    }

    /// A [`ViewInfo`] per configured view, sharing `registry`.
    pub fn view_infos(
        &self,
        registry: &Arc<InfoRegistry>,
        auto: AutoUpdate,
    ) -> Vec<(String, ViewInfo)> {
        self.views
            .iter()
            .map(|v| {
                (
                    v.name.clone(),
                    ViewInfo::new(v.view.clone(), auto, Arc::clone(registry)),
                )
            })
            .collect()
    }

    /// The view named `name`.
    pub fn view(&self, name: &str) -> Option<&ConfiguredView> {
        self.views.iter().find(|v| v.name == name)
    }
}

fn host_screen(id: ScreenId, config: &ScreenConfig) -> Screen {
    let (pw, ph) = config.pixel_resolution;
    let mut screen = Screen::new(id, pw, ph);
    if let Some(w) = config.physical_width {
        screen.physical_width = w;
    }
    if let Some(h) = config.physical_height {
        screen.physical_height = h;
    }
    screen.tracker_base_to_image_plate = config.tracker_base_to_image_plate;
    screen.head_tracker_to_left_image_plate = config.head_tracker_to_left_image_plate;
    screen.head_tracker_to_right_image_plate = config.head_tracker_to_right_image_plate;
    screen
}

fn host_canvas(id: CanvasId, screen: Shared<Screen>, config: &ScreenConfig) -> Canvas {
    let mut canvas = Canvas::full_screen(id, screen);
    if let WindowSize::Pixels(w, h) = config.window_size {
        canvas.width = w;
        canvas.height = h;
        (canvas.x, canvas.y) = config.window_position;
    }
    canvas.stereo_available = config.stereo_available;
    canvas.monoscopic_view_policy = config.monoscopic_view_policy;
    if let Some(eye) = config.left_manual_eye_in_image_plate {
        canvas.left_manual_eye_in_image_plate = eye;
    }
    if let Some(eye) = config.right_manual_eye_in_image_plate {
        canvas.right_manual_eye_in_image_plate = eye;
    }
    canvas
}
