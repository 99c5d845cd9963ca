// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs, clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::sync::Arc;

use parallax_config::{
    ConfigError, ConfigReader, Configured, PlatformConfig, ScreenConfig, ViewConfig,
};
use parallax_math::{Mat4, Vec3};
use parallax_view::host::read;
use parallax_view::{AttachPolicy, AutoUpdate, InfoRegistry, ScreenId, ViewError};

fn read_str(src: &str) -> parallax_config::ConfigContainer {
    ConfigReader::new().read_str("inline.cfg", src).unwrap()
}

#[test]
fn screen_properties_apply_to_the_named_screen() {
    let c = read_str(
        "(NewScreen s0 0.0)\n\
         (ScreenProperty s0 PhysicalScreenWidth 0.5)\n\
         (ScreenProperty s0 PhysicalScreenHeight 0.4)",
    );
    assert!(c.diagnostics().is_empty());
    let s = c.find::<ScreenConfig>("Screen", "s0").unwrap();
    assert_eq!(s.physical_width, Some(0.5));
    assert_eq!(s.physical_height, Some(0.4));
    assert_eq!(s.frame_buffer, 0);
}

#[test]
fn variables_substitute_before_numbers_are_recognized() {
    let c = ConfigReader::new()
        .var("WIDTH", "0.75")
        .var("SCREEN", "left")
        .read_str(
            "vars.cfg",
            "(NewScreen ${SCREEN} 1)\n(ScreenProperty left PhysicalScreenWidth ${WIDTH})",
        )
        .unwrap();
    assert!(c.diagnostics().is_empty(), "{:?}", c.diagnostics());
    let s = c.find::<ScreenConfig>("Screen", "left").unwrap();
    assert_eq!(s.physical_width, Some(0.75));

    let err = ConfigReader::new()
        .read_str("vars.cfg", "(NewScreen ${NOPE} 1)")
        .unwrap_err();
    assert!(err.to_string().contains("undefined variable `NOPE`"), "{err}");
}

#[test]
fn builtins_evaluate_while_reading() {
    let c = read_str(
        "(NewScreen s 0)\n\
         (ScreenProperty s TrackerBaseToImagePlate\n\
             (Concatenate (Rotate 0 90 0) (Translate 0.2 0.1 0.0)))",
    );
    assert!(c.diagnostics().is_empty(), "{:?}", c.diagnostics());
    let s = c.find::<ScreenConfig>("Screen", "s").unwrap();
    let expected = Mat4::translation(0.2, 0.1, 0.0) * Mat4::rotation_y(90f64.to_radians());
    assert!(s.tracker_base_to_image_plate.approx_eq(&expected, 1e-12));
}

#[test]
fn includes_resolve_relative_to_the_including_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("site")).unwrap();
    fs::write(
        dir.path().join("main.cfg"),
        "(NewView v)\n(Include \"site/screens.cfg\")\n(ViewProperty v Screen wall)\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("site/screens.cfg"),
        "// wall display\n(NewScreen wall 2)\n(ScreenProperty wall Sparkle 1)\n",
    )
    .unwrap();

    let c = ConfigReader::new()
        .read_file(dir.path().join("main.cfg"))
        .unwrap();
    assert_eq!(c.files().len(), 2);
    let view = c.find::<ViewConfig>("View", "v").unwrap();
    assert_eq!(view.screens, vec![c.resolve("Screen", "wall").unwrap()]);

    // The bad property is reported against the included file.
    let [diag] = c.diagnostics() else {
        unreachable!("expected one diagnostic, got {:?}", c.diagnostics())
    };
    let at = diag.location().unwrap();
    assert!(at.file.ends_with("site/screens.cfg"), "{at}");
    assert_eq!(at.line, 3);
}

#[test]
fn include_cycles_are_rejected_and_reading_continues() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.cfg"), "(NewScreen a 0)\n(Include \"b.cfg\")\n").unwrap();
    fs::write(dir.path().join("b.cfg"), "(NewScreen b 1)\n(Include \"a.cfg\")\n").unwrap();

    let c = ConfigReader::new().read_file(dir.path().join("a.cfg")).unwrap();
    assert_eq!(c.len(), 2);
    assert!(matches!(
        c.diagnostics(),
        [ConfigError::IncludeCycle { at, .. }] if at.line == 2
    ));
}

#[test]
fn missing_files() {
    let dir = tempfile::tempdir().unwrap();
    let err = ConfigReader::new()
        .read_file(dir.path().join("absent.cfg"))
        .unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));

    fs::write(dir.path().join("main.cfg"), "(Include \"gone.cfg\")\n(NewView v)\n").unwrap();
    let c = ConfigReader::new().read_file(dir.path().join("main.cfg")).unwrap();
    assert_eq!(c.len(), 1);
    assert!(c.diagnostics()[0].to_string().contains("cannot read"));
}

const DESK: &str = "
(NewScreen desk 0)
(ScreenProperty desk PixelResolution (1280 1024))
(ScreenProperty desk PhysicalScreenWidth 0.36)
(ScreenProperty desk PhysicalScreenHeight 0.29)
(ScreenAlias monitor desk)

(NewPhysicalBody me)
(PhysicalBodyProperty me StereoEyeSeparation 0.064)

(NewView main)
(ViewProperty main Screen monitor)
(ViewProperty main PhysicalBody me)
(ViewProperty main ViewPlatform rig)
(ViewProperty main FieldOfView 1.0)

(NewViewPlatform rig)
(ViewPlatformProperty rig NominalViewingTransform true)
(ViewPlatformProperty rig ViewAttachPolicy NOMINAL_SCREEN)
";

#[test]
fn build_assembles_queryable_views() {
    let c = read_str(DESK);
    assert!(c.diagnostics().is_empty(), "{:?}", c.diagnostics());
    let built = Configured::build(&c).unwrap();

    let screen = &built.screens["desk"];
    assert_eq!(read(screen).id, ScreenId(0));
    assert_eq!(read(screen).physical_width, 0.36);

    let main = built.view("main").unwrap();
    assert_eq!(main.canvases.len(), 1);
    assert_eq!(main.canvases[0].0, "desk");
    {
        let view = read(&main.view);
        assert_eq!(view.policies.view_attach, AttachPolicy::NominalScreen);
        assert!((view.body.interocular_distance() - 0.064).abs() < 1e-12);
    }

    let rig = read(&built.platforms["rig"]).local_to_world;
    let expected = 1.0 / 0.5f64.tan();
    assert!(rig
        .translation_part()
        .approx_eq(&Vec3::new(0.0, 0.0, expected), 1e-12));
    let rig_config = c.find::<PlatformConfig>("ViewPlatform", "rig").unwrap();
    assert!(rig_config.nominal_viewing_transform);

    let registry = Arc::new(InfoRegistry::new());
    let mut infos = built.view_infos(&registry, AutoUpdate::ALL);
    let (name, info) = &mut infos[0];
    assert_eq!(name, "main");
    let canvas = read(&main.canvases[0].1).id;
    let projection = info.projection(canvas).unwrap();
    assert!(projection.right.is_none());
    assert!(info.physical_to_virtual_scale(canvas).unwrap() > 0.0);
}

#[test]
fn view_without_platform_reports_it_on_query() {
    let c = read_str("(NewScreen s 0) (NewView v) (ViewProperty v Screen s)");
    let built = Configured::build(&c).unwrap();
    let registry = Arc::new(InfoRegistry::new());
    let mut infos = built.view_infos(&registry, AutoUpdate::ALL);
    let info = &mut infos[0].1;
    let canvas = read(&built.views[0].canvases[0].1).id;
    assert_eq!(info.projection(canvas).unwrap_err(), ViewError::NoViewPlatform);
}

#[test]
fn head_trackers_become_sensors() {
    let c = read_str(
        "(NewDevice tracker LogitechTracker \"/dev/ttyS0\")
         (DeviceProperty tracker BaudRate 9600)
         (NewSensor head tracker 0)
         (SensorProperty head Pose (Translate 0 0 0.6))
         (NewPhysicalEnvironment room)
         (PhysicalEnvironmentProperty room HeadTracker head)
         (PhysicalEnvironmentProperty room InputDevice tracker)
         (NewView v)
         (ViewProperty v PhysicalEnvironment room)
         (ViewProperty v TrackingEnable true)",
    );
    assert!(c.diagnostics().is_empty(), "{:?}", c.diagnostics());
    let built = Configured::build(&c).unwrap();
    let view = read(&built.views[0].view);
    assert!(view.tracking_active());
    let sensor = view.environment.head_sensor.as_ref().unwrap();
    assert_eq!(sensor.read(), Mat4::translation(0.0, 0.0, 0.6));
    built.sensors["head"].set_pose(Mat4::identity());
    assert_eq!(sensor.read(), Mat4::identity());
}

#[test]
fn sensors_must_name_a_device() {
    let c = read_str("(NewSensor head nowhere 0)");
    let err = Configured::build(&c).unwrap_err();
    assert!(
        matches!(&err, ConfigError::Unresolved { kind: "Device", name, .. } if name == "nowhere"),
        "{err}"
    );
    assert_eq!(err.location().unwrap().line, 1);
}

#[test]
fn windows_share_the_screen_of_their_frame_buffer() {
    let c = read_str(
        "(NewScreen full 0)
         (NewWindow small 0)
         (WindowProperty small WindowSize (640 480))
         (WindowProperty small WindowPosition (100 50))
         (NewView a) (ViewProperty a Screen full)
         (NewView b) (ViewProperty b Window small)",
    );
    assert!(c.diagnostics().is_empty(), "{:?}", c.diagnostics());
    let built = Configured::build(&c).unwrap();
    assert!(Arc::ptr_eq(&built.screens["full"], &built.screens["small"]));
    let small = read(&built.view("b").unwrap().canvases[0].1).clone();
    assert_eq!((small.x, small.y, small.width, small.height), (100, 50, 640, 480));
    let full = read(&built.view("a").unwrap().canvases[0].1).clone();
    assert_eq!((full.width, full.height), (1280, 1024));
    assert_ne!(full.id, small.id);
}

#[test]
fn screen_ids_are_dense_in_first_use_order() {
    let c = read_str(
        "(NewScreen wall 4000)
         (NewScreen desk 2)
         (NewWindow side 4000)
         (NewScreen big 5000)",
    );
    assert_eq!(c.diagnostics().len(), 1, "{:?}", c.diagnostics());
    assert!(c.diagnostics()[0].to_string().contains("frame-buffer"));
    let built = Configured::build(&c).unwrap();
    assert_eq!(read(&built.screens["wall"]).id, ScreenId(0));
    assert_eq!(read(&built.screens["desk"]).id, ScreenId(1));
    assert_eq!(read(&built.screens["side"]).id, ScreenId(0));
    assert!(!built.screens.contains_key("big"));
}
