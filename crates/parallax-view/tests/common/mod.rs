// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(dead_code, clippy::unwrap_used)]
//! Shared fixture: one view, one full-screen canvas, one rig.

use std::sync::Arc;

use parallax_math::Mat4;
use parallax_view::host::{read, write};
use parallax_view::{
    shared, AutoUpdate, Canvas, CanvasId, InfoRegistry, RigId, Screen, ScreenId, Sensor, Shared,
    StaticSensor, View, ViewInfo, ViewPlatform,
};

/// Everything but the view policies is re-read on every query.
pub const AUTO_EXCEPT_VIEW: AutoUpdate = AutoUpdate {
    view: false,
    ..AutoUpdate::ALL
};

pub const CANVAS: CanvasId = CanvasId(0);

pub struct Fixture {
    pub registry: Arc<InfoRegistry>,
    pub screen: Shared<Screen>,
    pub canvas: Shared<Canvas>,
    pub platform: Shared<ViewPlatform>,
    pub view: Shared<View>,
    pub sensor: Arc<StaticSensor>,
    pub info: ViewInfo,
}

impl Fixture {
    pub fn new(auto: AutoUpdate) -> Self {
        Self::with(auto, |_, _, _| {})
    }

    /// Builds the fixture after letting `setup` adjust the host objects.
    pub fn with(auto: AutoUpdate, setup: impl FnOnce(&mut Screen, &mut Canvas, &mut View)) -> Self {
        let registry = Arc::new(InfoRegistry::new());
        let screen = shared(Screen::new(ScreenId(0), 1280, 1024));
        let canvas = shared(Canvas::full_screen(CANVAS, Arc::clone(&screen)));
        let platform = shared(ViewPlatform::new(RigId(0)));
        let sensor = Arc::new(StaticSensor::new(Mat4::translation(0.0, 0.0, 0.5)));
        let mut view = View {
            platform: Some(Arc::clone(&platform)),
            canvases: vec![Arc::clone(&canvas)],
            ..View::default()
        };
        view.environment.head_sensor = Some(Arc::clone(&sensor) as Arc<dyn Sensor>);
        setup(&mut write(&screen), &mut write(&canvas), &mut view);
        let view = shared(view);
        let info = ViewInfo::new(Arc::clone(&view), auto, Arc::clone(&registry));
        Self {
            registry,
            screen,
            canvas,
            platform,
            view,
            sensor,
            info,
        }
    }

    pub fn screen_size(&self) -> (f64, f64) {
        let s = read(&self.screen);
        (s.physical_width, s.physical_height)
    }
}

/// Calls every query once; returns the left-eye values flattened.
pub fn touch_all(info: &mut ViewInfo) -> Vec<[f64; 16]> {
    let c = CANVAS;
    let scalar = |x: f64| [x; 16];
    vec![
        info.coexistence_to_image_plate(c).unwrap().left.to_array(),
        info.view_platform_to_coexistence(c).unwrap().to_array(),
        info.image_plate_to_view_platform(c).unwrap().left.to_array(),
        info.image_plate_to_world(c).unwrap().left.to_array(),
        info.eye_to_image_plate(c).unwrap().left.to_array(),
        info.eye_to_view_platform(c).unwrap().left.to_array(),
        info.eye_to_world(c).unwrap().left.to_array(),
        info.projection(c).unwrap().left.to_array(),
        info.inverse_projection(c).unwrap().left.to_array(),
        info.inverse_view_platform_projection(c).unwrap().left.to_array(),
        info.inverse_world_projection(c).unwrap().left.to_array(),
        info.coexistence_to_world(c).unwrap().to_array(),
        info.tracker_base_to_world(c).unwrap().to_array(),
        info.head_to_world(c).unwrap().to_array(),
        info.sensor_to_world(c).unwrap().to_array(),
        info.view_platform_to_world().unwrap().to_array(),
        scalar(info.physical_front_clip_distance(c).unwrap().left),
        scalar(info.physical_back_clip_distance(c).unwrap().left),
        scalar(info.physical_to_virtual_scale(c).unwrap()),
        scalar(info.physical_width(c).unwrap()),
        scalar(info.physical_height(c).unwrap()),
    ]
}
