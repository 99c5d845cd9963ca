// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `NewScreen` / `NewWindow`.

use core::any::Any;

use parallax_math::{Mat4, Vec3};
use parallax_view::{MonoscopicViewPolicy, MAX_REGISTRY_IDS};

use super::{flag, no_args, one, positive, unknown, vec3, ConfigObject, NameLookup};
use crate::value::Value;

pub(super) const TYPE: &str = "Screen";

/// Window placement on a screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowSize {
    /// Covers the whole screen.
    FullScreen,
    /// Explicit size in pixels.
    Pixels(u32, u32),
}

/// A physical screen and the window opened on it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenConfig {
    /// Frame-buffer index. Screens sharing it share one host screen.
    pub frame_buffer: u32,
    /// Meters; derived from the pixel resolution at 90 dpi when unset.
    pub physical_width: Option<f64>,
    /// Meters; derived from the pixel resolution at 90 dpi when unset.
    pub physical_height: Option<f64>,
    /// Screen resolution in pixels.
    pub pixel_resolution: (u32, u32),
    /// Window size.
    pub window_size: WindowSize,
    /// Window position in screen pixels, top-left origin.
    pub window_position: (i32, i32),
    /// Tracker base to image plate calibration.
    pub tracker_base_to_image_plate: Mat4,
    /// Head tracker to left image plate (head-mounted displays).
    pub head_tracker_to_left_image_plate: Mat4,
    /// Head tracker to right image plate (head-mounted displays).
    pub head_tracker_to_right_image_plate: Mat4,
    /// Which eye a monoscopic window renders.
    pub monoscopic_view_policy: MonoscopicViewPolicy,
    /// Manual left eye in image plate coordinates.
    pub left_manual_eye_in_image_plate: Option<Vec3>,
    /// Manual right eye in image plate coordinates.
    pub right_manual_eye_in_image_plate: Option<Vec3>,
    /// Whether the window may render in stereo.
    pub stereo_available: bool,
}

impl ScreenConfig {
    /// Defaults for frame buffer `frame_buffer`.
    pub fn new(frame_buffer: u32) -> Self {
        Self {
            frame_buffer,
            physical_width: None,
            physical_height: None,
            pixel_resolution: (1280, 1024),
            window_size: WindowSize::FullScreen,
            window_position: (0, 0),
            tracker_base_to_image_plate: Mat4::identity(),
            head_tracker_to_left_image_plate: Mat4::identity(),
            head_tracker_to_right_image_plate: Mat4::identity(),
            monoscopic_view_policy: MonoscopicViewPolicy::Cyclopean,
            left_manual_eye_in_image_plate: None,
            right_manual_eye_in_image_plate: None,
            stereo_available: false,
        }
    }

    pub(super) fn build(_name: &str, args: &[Value]) -> Result<Box<dyn ConfigObject>, String> {
        let Some((index, rest)) = args.split_first() else {
            return Err("NewScreen needs a frame-buffer index".into());
        };
        no_args(TYPE, rest)?;
        let frame_buffer = index.as_index()?;
        if frame_buffer >= MAX_REGISTRY_IDS {
            return Err(format!(
                "frame-buffer index {frame_buffer} is past the limit of {MAX_REGISTRY_IDS}"
            ));
        }
        Ok(Box::new(Self::new(frame_buffer)))
    }
}

fn whole(n: f64, min: f64, max: f64) -> bool {
    n.fract() == 0.0 && (min..=max).contains(&n)
}

fn pixels(values: &[Value], property: &str) -> Result<(u32, u32), String> {
    let [w, h] = one(values, property)?.as_vec2()?;
    let max = f64::from(u32::MAX);
    if whole(w, 1.0, max) && whole(h, 1.0, max) {
        Ok((w as u32, h as u32))
    } else {
        Err(format!("{property} needs two positive integers"))
    }
}

fn position(values: &[Value], property: &str) -> Result<(i32, i32), String> {
    let [x, y] = one(values, property)?.as_vec2()?;
    let (min, max) = (f64::from(i32::MIN), f64::from(i32::MAX));
    if whole(x, min, max) && whole(y, min, max) {
        Ok((x as i32, y as i32))
    } else {
        Err(format!("{property} needs two whole pixel offsets, found ({x} {y})"))
    }
}

impl ConfigObject for ScreenConfig {
    fn set_property(
        &mut self,
        property: &str,
        values: &[Value],
        _names: &dyn NameLookup,
    ) -> Result<(), String> {
        match property {
            "PhysicalScreenWidth" => self.physical_width = Some(positive(values, property)?),
            "PhysicalScreenHeight" => self.physical_height = Some(positive(values, property)?),
            "PixelResolution" => self.pixel_resolution = pixels(values, property)?,
            "WindowSize" => {
                self.window_size = match one(values, property)? {
                    Value::Word(w) if w == "NoBorderFullScreen" => WindowSize::FullScreen,
                    _ => {
                        let (w, h) = pixels(values, property)?;
                        WindowSize::Pixels(w, h)
                    }
                };
            }
            "WindowPosition" => self.window_position = position(values, property)?,
            "TrackerBaseToImagePlate" => {
                self.tracker_base_to_image_plate = one(values, property)?.as_mat4()?;
            }
            "HeadTrackerToLeftImagePlate" => {
                self.head_tracker_to_left_image_plate = one(values, property)?.as_mat4()?;
            }
            "HeadTrackerToRightImagePlate" => {
                self.head_tracker_to_right_image_plate = one(values, property)?.as_mat4()?;
            }
            "MonoscopicViewPolicy" => {
                self.monoscopic_view_policy = one(values, property)?.as_policy()?;
            }
            "LeftManualEyeInImagePlate" => {
                self.left_manual_eye_in_image_plate = Some(vec3(values, property)?);
            }
            "RightManualEyeInImagePlate" => {
                self.right_manual_eye_in_image_plate = Some(vec3(values, property)?);
            }
            "StereoAvailable" => self.stereo_available = flag(values, property)?,
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
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::objects::NoNames;

    #[test]
    fn frame_buffer_index_is_required_and_whole() {
        assert!(ScreenConfig::build("s", &[]).is_err());
        assert!(ScreenConfig::build("s", &[Value::Number(1.5)]).is_err());
        let built = ScreenConfig::build("s", &[Value::Number(2.0)]).unwrap();
        let screen = built.as_any().downcast_ref::<ScreenConfig>().unwrap();
        assert_eq!(screen.frame_buffer, 2);
        let err = ScreenConfig::build("s", &[Value::Number(3.0e9)]).unwrap_err();
        assert!(err.contains("past the limit"), "{err}");
    }

    #[test]
    fn window_position_takes_whole_offsets_in_range() {
        let mut s = ScreenConfig::new(0);
        s.set_property("WindowPosition", &[Value::Vec2([-20.0, 300.0])], &NoNames)
            .unwrap();
        assert_eq!(s.window_position, (-20, 300));
        for bad in [[10.5, 0.0], [0.0, 3.0e9], [-3.0e9, 0.0], [f64::NAN, 0.0]] {
            assert!(
                s.set_property("WindowPosition", &[Value::Vec2(bad)], &NoNames)
                    .is_err(),
                "{bad:?}"
            );
        }
        assert_eq!(s.window_position, (-20, 300));
        assert!(s
            .set_property("PixelResolution", &[Value::Vec2([1.0e10, 1024.0])], &NoNames)
            .is_err());
    }

    #[test]
    fn window_size_accepts_full_screen_word_and_pixels() {
        let mut s = ScreenConfig::new(0);
        s.set_property("WindowSize", &[Value::Vec2([640.0, 480.0])], &NoNames)
            .unwrap();
        assert_eq!(s.window_size, WindowSize::Pixels(640, 480));
        s.set_property("WindowSize", &[Value::Word("NoBorderFullScreen".into())], &NoNames)
            .unwrap();
        assert_eq!(s.window_size, WindowSize::FullScreen);
        assert!(s
            .set_property("WindowSize", &[Value::Vec2([0.0, 480.0])], &NoNames)
            .is_err());
    }

    #[test]
    fn rejects_bad_values() {
        let mut s = ScreenConfig::new(0);
        let err = s
            .set_property("PhysicalScreenWidth", &[Value::Number(-1.0)], &NoNames)
            .unwrap_err();
        assert!(err.contains("positive"));
        let err = s
            .set_property("MonoscopicViewPolicy", &[Value::Word("MIDDLE".into())], &NoNames)
            .unwrap_err();
        assert!(err.contains("monoscopic"));
        assert!(s.set_property("Sparkle", &[], &NoNames).is_err());
    }
}
