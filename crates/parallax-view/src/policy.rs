// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! View policy axes.
//!
//! Each axis is its own enum so the derivation code can `match` once per
//! transform instead of re-checking integer constants. Every variant carries
//! the spelling used in configuration files.

use core::fmt;
use core::str::FromStr;

use serde::Serialize;
use thiserror::Error;

/// A policy name that does not belong to the requested axis.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {axis} `{value}`")]
pub struct PolicyParseError {
    /// Policy axis being parsed.
    pub axis: &'static str,
    /// Rejected spelling.
    pub value: String,
}

macro_rules! policy_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $axis:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $spelling:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Spelling used in configuration files.
            pub const fn config_name(self) -> &'static str {
                match self {
                    $( Self::$variant => $spelling ),+
                }
            }
        }

        impl FromStr for $name {
            type Err = PolicyParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $spelling => Ok(Self::$variant), )+
                    _ => Err(PolicyParseError { axis: $axis, value: s.to_owned() }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.config_name())
            }
        }
    };
}

policy_enum! {
    /// Whether image plates are fixed in the room or mounted on the head.
    ViewPolicy, "view policy" {
        /// Fixed screens in the room.
        Screen => "SCREEN_VIEW",
        /// Head-mounted display; plates move with the tracked head.
        HeadMounted => "HMD_VIEW",
    }
}

policy_enum! {
    /// Projection model.
    ProjectionPolicy, "projection policy" {
        /// Off-axis perspective frustum through the canvas rectangle.
        Perspective => "PERSPECTIVE_PROJECTION",
        /// Parallel projection of the canvas rectangle.
        Parallel => "PARALLEL_PROJECTION",
    }
}

policy_enum! {
    /// Unit and reference point of a clip distance.
    ClipPolicy, "clip policy" {
        /// Physical meters from the eye.
        PhysicalEye => "PHYSICAL_EYE",
        /// Physical meters from the image plate.
        PhysicalScreen => "PHYSICAL_SCREEN",
        /// Virtual units from the eye.
        VirtualEye => "VIRTUAL_EYE",
        /// Virtual units from the image plate.
        VirtualScreen => "VIRTUAL_SCREEN",
    }
}

impl ClipPolicy {
    /// `true` for the virtual-unit policies.
    pub const fn is_virtual(self) -> bool {
        matches!(self, Self::VirtualEye | Self::VirtualScreen)
    }

    /// `true` when the distance is measured from the eye.
    pub const fn is_eye_relative(self) -> bool {
        matches!(self, Self::PhysicalEye | Self::VirtualEye)
    }
}

policy_enum! {
    /// Where the eye sits for a fixed (untracked) screen view.
    WindowEyepointPolicy, "window eyepoint policy" {
        /// Centered on the canvas at the distance implied by the field of view.
        RelativeToFieldOfView => "RELATIVE_TO_FIELD_OF_VIEW",
        /// Canvas manual eye positions, relative to the screen's plate origin.
        RelativeToScreen => "RELATIVE_TO_SCREEN",
        /// Canvas manual eye positions, relative to the canvas' lower-left corner.
        RelativeToWindow => "RELATIVE_TO_WINDOW",
        /// View manual eye positions, in coexistence coordinates.
        RelativeToCoexistence => "RELATIVE_TO_COEXISTENCE",
    }
}

policy_enum! {
    /// What happens to the image when a canvas is resized.
    WindowResizePolicy, "window resize policy" {
        /// The canvas is a physical window; resizing reveals more of the scene.
        PhysicalWorld => "PHYSICAL_WORLD",
        /// The scene scales with the canvas.
        VirtualWorld => "VIRTUAL_WORLD",
    }
}

policy_enum! {
    /// What happens to the image when a canvas is moved.
    WindowMovementPolicy, "window movement policy" {
        /// The image moves with the canvas.
        PhysicalWorld => "PHYSICAL_WORLD",
        /// The canvas slides over a fixed scene.
        VirtualWorld => "VIRTUAL_WORLD",
    }
}

policy_enum! {
    /// Source of the virtual-to-physical screen scale.
    ScreenScalePolicy, "screen scale policy" {
        /// Half the physical screen width.
        ScreenSize => "SCALE_SCREEN_SIZE",
        /// The view's explicit screen scale.
        Explicit => "SCALE_EXPLICIT",
    }
}

policy_enum! {
    /// Nominal physical location used for the view-platform origin and for
    /// the coexistence center.
    AttachPolicy, "attach policy" {
        /// At the nominal head (eye) position.
        NominalHead => "NOMINAL_HEAD",
        /// On the ground below the nominal head.
        NominalFeet => "NOMINAL_FEET",
        /// At the center of the nominal screen.
        NominalScreen => "NOMINAL_SCREEN",
    }
}

policy_enum! {
    /// Eye used by a monoscopic canvas.
    MonoscopicViewPolicy, "monoscopic view policy" {
        /// Left eye only.
        LeftEye => "LEFT_EYE_VIEW",
        /// Right eye only.
        RightEye => "RIGHT_EYE_VIEW",
        /// Midpoint of the two eyes.
        Cyclopean => "CYCLOPEAN_EYE_VIEW",
    }
}

/// All policy axes of one view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ViewPolicies {
    /// Fixed screens or head-mounted display.
    pub view: ViewPolicy,
    /// Perspective or parallel projection.
    pub projection: ProjectionPolicy,
    /// Front clip reference.
    pub front_clip: ClipPolicy,
    /// Back clip reference.
    pub back_clip: ClipPolicy,
    /// Eye placement for untracked screen views.
    pub window_eyepoint: WindowEyepointPolicy,
    /// Resize behavior.
    pub window_resize: WindowResizePolicy,
    /// Movement behavior.
    pub window_movement: WindowMovementPolicy,
    /// Screen scale source.
    pub screen_scale: ScreenScalePolicy,
    /// View-platform origin.
    pub view_attach: AttachPolicy,
    /// Coexistence origin in the physical world.
    pub coexistence_center: AttachPolicy,
}

impl Default for ViewPolicies {
    fn default() -> Self {
        Self {
            view: ViewPolicy::Screen,
            projection: ProjectionPolicy::Perspective,
            front_clip: ClipPolicy::PhysicalEye,
            back_clip: ClipPolicy::PhysicalEye,
            window_eyepoint: WindowEyepointPolicy::RelativeToFieldOfView,
            window_resize: WindowResizePolicy::PhysicalWorld,
            window_movement: WindowMovementPolicy::PhysicalWorld,
            screen_scale: ScreenScalePolicy::ScreenSize,
            view_attach: AttachPolicy::NominalHead,
            coexistence_center: AttachPolicy::NominalScreen,
        }
    }
}

impl ViewPolicies {
    /// `true` when either clip distance is expressed in virtual units.
    pub const fn has_virtual_clip(&self) -> bool {
        self.front_clip.is_virtual() || self.back_clip.is_virtual()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn every_spelling_round_trips() {
        for p in ClipPolicy::ALL {
            assert_eq!(p.config_name().parse::<ClipPolicy>(), Ok(*p));
        }
        for p in WindowEyepointPolicy::ALL {
            assert_eq!(p.to_string().parse::<WindowEyepointPolicy>(), Ok(*p));
        }
    }

    #[test]
    fn unknown_spelling_names_the_axis() {
        let err = "SIDEWAYS".parse::<ViewPolicy>().unwrap_err();
        assert_eq!(err.axis, "view policy");
        assert_eq!(err.to_string(), "unknown view policy `SIDEWAYS`");
    }

    #[test]
    fn resize_and_movement_share_spellings_but_not_types() {
        assert_eq!(
            "VIRTUAL_WORLD".parse::<WindowResizePolicy>(),
            Ok(WindowResizePolicy::VirtualWorld)
        );
        assert_eq!(
            "VIRTUAL_WORLD".parse::<WindowMovementPolicy>(),
            Ok(WindowMovementPolicy::VirtualWorld)
        );
    }
}
