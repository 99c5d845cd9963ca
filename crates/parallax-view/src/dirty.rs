// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Dependency graph of cached per-canvas values.
//!
//! Inputs are invalidated by change detection; derived nodes are invalidated
//! by walking [`Node::ALL`] (which is topologically ordered) and marking any
//! node with a dirty input. A getter then recomputes only the dirty nodes it
//! transitively needs.

use serde::Serialize;

macro_rules! nodes {
    (
        inputs { $( $(#[$imeta:meta])* $input:ident ),+ $(,)? }
        derived { $( $(#[$dmeta:meta])* $derived:ident <= [$($dep:ident),+] ),+ $(,)? }
    ) => {
        /// Input or derived value tracked per canvas.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        #[repr(u8)]
        pub enum Node {
            $( $(#[$imeta])* $input, )+
            $( $(#[$dmeta])* $derived, )+
        }

        impl Node {
            /// All nodes in topological order: inputs first, then every derived
            /// node after the nodes it reads.
            pub const ALL: &'static [Self] = &[$(Self::$input,)+ $(Self::$derived,)+];

            /// Number of nodes.
            pub const COUNT: usize = Self::ALL.len();

            /// Direct inputs of a derived node; empty for input nodes.
            pub fn inputs(self) -> &'static [Self] {
                match self {
                    $( Self::$input => &[], )+
                    $( Self::$derived => &[$(Self::$dep),+], )+
                }
            }
        }
    };
}

nodes! {
    inputs {
        /// Canvas pixel position and size.
        CanvasGeometry,
        /// Screen pixel and physical size.
        ScreenGeometry,
        /// Tracker-base to image-plate calibration.
        TrackerBaseCalibration,
        /// Head-tracker to image-plate calibrations (head-mounted displays).
        HeadTrackerCalibration,
        /// Any view policy.
        Policies,
        /// Physical body parameters.
        Body,
        /// Manual eye positions and monoscopic selection.
        CanvasEyes,
        /// Physical environment calibration and view-level scalar parameters.
        Environment,
        /// Head pose in the tracker base.
        HeadPose,
        /// Rig local-to-world transform.
        RigTransform,
        /// Uniform scale of the rig local-to-world transform.
        RigScale,
    }
    derived {
        /// Canvas size and lower-left origin in image-plate meters.
        CanvasPlacement <= [CanvasGeometry, ScreenGeometry],
        /// Screen scale factor.
        ScreenScale <= [ScreenGeometry, Policies, Environment],
        /// Window scale factor.
        WindowScale <= [CanvasPlacement, ScreenGeometry, Policies],
        /// Coexistence to image plate.
        CoeToPlate <= [
            Policies, CanvasPlacement, CanvasEyes, ScreenGeometry, TrackerBaseCalibration,
            HeadTrackerCalibration, Environment, HeadPose
        ],
        /// View platform to coexistence.
        ViewPlatformToCoe <= [ScreenScale, WindowScale, Policies, Body, CanvasPlacement, Environment],
        /// Coexistence to view platform.
        CoeToViewPlatform <= [ViewPlatformToCoe],
        /// Image plate to view platform.
        PlateToViewPlatform <= [CoeToPlate, ViewPlatformToCoe],
        /// Eye positions in image-plate coordinates.
        EyeInPlate <= [
            Policies, CanvasPlacement, Body, CanvasEyes, HeadPose, TrackerBaseCalibration,
            HeadTrackerCalibration, CoeToPlate, Environment
        ],
        /// Eye to image plate.
        EyeToPlate <= [EyeInPlate],
        /// Eye to view platform.
        EyeToViewPlatform <= [PlateToViewPlatform, EyeToPlate],
        /// Physical-to-virtual length scale.
        PhysicalToVirtualScale <= [ScreenScale, WindowScale, RigScale],
        /// Effective clip distances in eye coordinates.
        ClipDistances <= [Policies, PhysicalToVirtualScale, CanvasPlacement, ScreenGeometry, EyeInPlate, Environment],
        /// Projection matrices.
        Projection <= [EyeInPlate, CanvasPlacement, ClipDistances, Policies],
        /// Inverse projection matrices.
        InverseProjection <= [Projection],
        /// Clip space to view platform.
        InverseViewPlatformProjection <= [EyeToViewPlatform, InverseProjection],
        /// Tracker base to view platform.
        TrackerBaseToViewPlatform <= [CoeToViewPlatform, Environment],
        /// Image plate to world.
        PlateToWorld <= [RigTransform, PlateToViewPlatform],
        /// Eye to world.
        EyeToWorld <= [RigTransform, EyeToViewPlatform],
        /// Clip space to world.
        InverseWorldProjection <= [RigTransform, InverseViewPlatformProjection],
        /// Coexistence to world.
        CoeToWorld <= [RigTransform, CoeToViewPlatform],
        /// Tracker base to world.
        TrackerBaseToWorld <= [RigTransform, TrackerBaseToViewPlatform],
    }
}

impl Node {
    /// Bit index of this node.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Whether this node is set by change detection rather than derived.
    pub fn is_input(self) -> bool {
        self.inputs().is_empty()
    }

    /// Whether `self` transitively reads `other`.
    pub fn depends_on(self, other: Self) -> bool {
        self.inputs()
            .iter()
            .any(|&dep| dep == other || dep.depends_on(other))
    }
}

/// Set of dirty nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DirtySet(u64);

impl DirtySet {
    /// Every node dirty; the state of a freshly built cache.
    pub fn all() -> Self {
        let mut set = Self::default();
        set.mark_all();
        set
    }

    /// Marks one node.
    pub fn mark(&mut self, node: Node) {
        self.0 |= 1 << node.index();
    }

    /// Marks every node.
    pub fn mark_all(&mut self) {
        self.0 = if Node::COUNT == 64 {
            u64::MAX
        } else {
            (1 << Node::COUNT) - 1
        };
    }

    /// Whether `node` is marked.
    pub fn contains(&self, node: Node) -> bool {
        self.0 & (1 << node.index()) != 0
    }

    /// Clears one node.
    pub fn remove(&mut self, node: Node) {
        self.0 &= !(1 << node.index());
    }

    /// Whether nothing is marked.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Marks every derived node downstream of a marked node, then clears the
    /// input bits (inputs carry no cached value of their own).
    pub fn propagate(&mut self) {
        for &node in Node::ALL {
            if node.is_input() || self.contains(node) {
                continue;
            }
            if node.inputs().iter().any(|&dep| self.contains(dep)) {
                self.mark(node);
            }
        }
        for &node in Node::ALL.iter().filter(|n| n.is_input()) {
            self.remove(node);
        }
    }
}

/// Per-node recomputation counters, for observing cache behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecomputeCounts([u64; Node::COUNT]);

impl Default for RecomputeCounts {
    fn default() -> Self {
        Self([0; Node::COUNT])
    }
}

impl RecomputeCounts {
    /// Times `node` has been recomputed.
    pub fn get(&self, node: Node) -> u64 {
        self.0[node.index()]
    }

    pub(crate) fn bump(&mut self, node: Node) {
        self.0[node.index()] += 1;
    }

    /// Sum over all nodes.
    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }
}
