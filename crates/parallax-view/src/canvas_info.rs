// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-canvas transform cache.
//!
//! Every cached value is a [`Node`]. [`CanvasInfo::ensure`] recomputes a
//! dirty node after pulling its dirty inputs, so a query only pays for the
//! part of the graph it reads. All branching on policy lives in the
//! `derive_*` functions, one per node.

use parallax_math::{Mat4, Vec3};
use tracing::trace;

use crate::camera::{CameraParams, HeadState};
use crate::dirty::{DirtySet, Node, RecomputeCounts};
use crate::error::{ViewError, ViewResult};
use crate::host::{Canvas, CanvasId, ScreenId};
use crate::policy::{
    AttachPolicy, ClipPolicy, MonoscopicViewPolicy, ScreenScalePolicy, ViewPolicy,
    WindowEyepointPolicy, WindowMovementPolicy, WindowResizePolicy,
};
use crate::projection::{ClipDistances, Frustum};
use crate::screen_info::ScreenSnapshot;

/// Which eye a cache slot renders for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eye {
    /// Left eye.
    Left,
    /// Right eye.
    Right,
    /// Midpoint of both eyes.
    Cyclopean,
}

impl Eye {
    fn from_monoscopic(policy: MonoscopicViewPolicy) -> Self {
        match policy {
            MonoscopicViewPolicy::LeftEye => Self::Left,
            MonoscopicViewPolicy::RightEye => Self::Right,
            MonoscopicViewPolicy::Cyclopean => Self::Cyclopean,
        }
    }

    /// Image plate a head-mounted display shows this eye on.
    fn plate(self) -> Self {
        match self {
            Self::Right => Self::Right,
            Self::Left | Self::Cyclopean => Self::Left,
        }
    }

    fn pick(self, left: Vec3, right: Vec3) -> Vec3 {
        match self {
            Self::Left => left,
            Self::Right => right,
            Self::Cyclopean => left.midpoint(&right),
        }
    }
}

/// Canvas state read from the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasState {
    /// Left edge in screen pixels.
    pub x: i32,
    /// Top edge in screen pixels, measured down from the top of the screen.
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Whether the canvas renders a left/right pair.
    pub stereo: bool,
    /// Eye used for monoscopic rendering.
    pub monoscopic: MonoscopicViewPolicy,
    /// Left manual eye in image plate.
    pub left_manual_eye: Vec3,
    /// Right manual eye in image plate.
    pub right_manual_eye: Vec3,
}

impl CanvasState {
    /// Captures `canvas`; `stereo_enable` is the owning view's stereo request.
    pub fn capture(canvas: &Canvas, stereo_enable: bool) -> Self {
        Self {
            x: canvas.x,
            y: canvas.y,
            width: canvas.width,
            height: canvas.height,
            stereo: canvas.stereo_available && stereo_enable,
            monoscopic: canvas.monoscopic_view_policy,
            left_manual_eye: canvas.left_manual_eye_in_image_plate,
            right_manual_eye: canvas.right_manual_eye_in_image_plate,
        }
    }

    fn geometry_differs(&self, other: &Self) -> bool {
        (self.x, self.y, self.width, self.height) != (other.x, other.y, other.width, other.height)
    }

    fn eyes_differ(&self, other: &Self) -> bool {
        self.stereo != other.stereo
            || self.monoscopic != other.monoscopic
            || self.left_manual_eye != other.left_manual_eye
            || self.right_manual_eye != other.right_manual_eye
    }

    /// Eyes rendered into slots 0 and 1.
    fn slot_eyes(&self) -> [Eye; 2] {
        if self.stereo {
            [Eye::Left, Eye::Right]
        } else {
            [Eye::from_monoscopic(self.monoscopic), Eye::Right]
        }
    }
}

/// Canvas size and placement on the image plate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Placement {
    /// Width in meters.
    pub width: f64,
    /// Height in meters.
    pub height: f64,
    /// Lower-left corner in image-plate coordinates.
    pub origin: Vec3,
}

impl Placement {
    /// Center of the canvas in image-plate coordinates.
    pub fn center(&self) -> Vec3 {
        self.origin + Vec3::new(self.width * 0.5, self.height * 0.5, 0.0)
    }
}

/// Rig state needed by world-space nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigState {
    /// Rig to world.
    pub local_to_world: Mat4,
    /// Uniform scale of world to rig.
    pub world_scale: f64,
}

impl Default for RigState {
    fn default() -> Self {
        Self {
            local_to_world: Mat4::identity(),
            world_scale: 1.0,
        }
    }
}

/// Everything outside the canvas that derivations read.
#[derive(Debug, Clone, Copy)]
pub struct DeriveContext<'a> {
    /// View-level parameters.
    pub camera: &'a CameraParams,
    /// Current head pose.
    pub head: &'a HeadState,
    /// Current rig state.
    pub rig: &'a RigState,
}

/// Per-slot values: slot 0 is the left (or monoscopic) eye, slot 1 the right.
pub type Pair<T> = [T; 2];

#[derive(Debug, Clone)]
struct Cached {
    placement: Placement,
    screen_scale: f64,
    window_scale: f64,
    coe_to_plate: Pair<Mat4>,
    vp_to_coe: Mat4,
    coe_to_vp: Mat4,
    plate_to_vp: Pair<Mat4>,
    eye_in_plate: Pair<Vec3>,
    eye_to_plate: Pair<Mat4>,
    eye_to_vp: Pair<Mat4>,
    physical_to_virtual_scale: f64,
    clip: Pair<ClipDistances>,
    projection: Pair<Mat4>,
    inverse_projection: Pair<Mat4>,
    inverse_vp_projection: Pair<Mat4>,
    tb_to_vp: Mat4,
    plate_to_world: Pair<Mat4>,
    eye_to_world: Pair<Mat4>,
    inverse_world_projection: Pair<Mat4>,
    coe_to_world: Mat4,
    tb_to_world: Mat4,
}

impl Default for Cached {
    fn default() -> Self {
        let id = Mat4::identity();
        Self {
            placement: Placement::default(),
            screen_scale: 1.0,
            window_scale: 1.0,
            coe_to_plate: [id; 2],
            vp_to_coe: id,
            coe_to_vp: id,
            plate_to_vp: [id; 2],
            eye_in_plate: [Vec3::ZERO; 2],
            eye_to_plate: [id; 2],
            eye_to_vp: [id; 2],
            physical_to_virtual_scale: 1.0,
            clip: [ClipDistances { front: 0.0, back: 0.0 }; 2],
            projection: [id; 2],
            inverse_projection: [id; 2],
            inverse_vp_projection: [id; 2],
            tb_to_vp: id,
            plate_to_world: [id; 2],
            eye_to_world: [id; 2],
            inverse_world_projection: [id; 2],
            coe_to_world: id,
            tb_to_world: id,
        }
    }
}

/// Lazily derived transforms for one canvas of one view.
#[derive(Debug, Clone)]
pub struct CanvasInfo {
    id: CanvasId,
    screen_id: ScreenId,
    canvas: CanvasState,
    screen: Option<ScreenSnapshot>,
    dirty: DirtySet,
    counts: RecomputeCounts,
    values: Cached,
}

fn pair<T>(mut f: impl FnMut(usize) -> ViewResult<T>) -> ViewResult<Pair<T>> {
    Ok([f(0)?, f(1)?])
}

fn invert(m: &Mat4, what: &'static str) -> ViewResult<Mat4> {
    m.inverse().ok_or(ViewError::SingularTransform(what))
}

impl CanvasInfo {
    /// New cache with every node dirty.
    pub fn new(id: CanvasId, screen_id: ScreenId, canvas: CanvasState) -> Self {
        Self {
            id,
            screen_id,
            canvas,
            screen: None,
            dirty: DirtySet::all(),
            counts: RecomputeCounts::default(),
            values: Cached::default(),
        }
    }

    /// Canvas this cache derives for.
    pub fn id(&self) -> CanvasId {
        self.id
    }

    /// Screen the canvas was on at the last refresh.
    pub fn screen_id(&self) -> ScreenId {
        self.screen_id
    }

    /// Last captured canvas state.
    pub fn state(&self) -> &CanvasState {
        &self.canvas
    }

    /// Last captured screen state.
    pub fn screen(&self) -> Option<&ScreenSnapshot> {
        self.screen.as_ref()
    }

    /// Whether the canvas renders a left/right pair.
    pub fn is_stereo(&self) -> bool {
        self.canvas.stereo
    }

    /// Recompute counters.
    pub fn recompute_counts(&self) -> &RecomputeCounts {
        &self.counts
    }

    /// Whether `node` will be recomputed on its next read.
    pub fn is_dirty(&self, node: Node) -> bool {
        self.dirty.contains(node)
    }

    /// Marks an input node changed.
    pub fn mark(&mut self, node: Node) {
        self.dirty.mark(node);
    }

    /// Marks everything for recompute.
    pub fn mark_all(&mut self) {
        self.dirty.mark_all();
    }

    /// Fans pending input changes out to every derived node that reads them.
    pub fn propagate(&mut self) {
        self.dirty.propagate();
    }

    /// Replaces the canvas state, marking what changed.
    pub fn set_canvas(&mut self, next: CanvasState) {
        if next.geometry_differs(&self.canvas) {
            self.dirty.mark(Node::CanvasGeometry);
        }
        if next.eyes_differ(&self.canvas) {
            self.dirty.mark(Node::CanvasEyes);
        }
        self.canvas = next;
    }

    /// Replaces the screen snapshot. Change marking is driven by the screen
    /// cache's mailbox.
    pub fn set_screen(&mut self, screen_id: ScreenId, snapshot: ScreenSnapshot) {
        self.screen_id = screen_id;
        self.screen = Some(snapshot);
    }

    /// Recomputes `node` if dirty, pulling dirty inputs first.
    ///
    /// # Errors
    /// Propagates singular-transform failures from the derivations.
    pub fn ensure(&mut self, node: Node, ctx: &DeriveContext<'_>) -> ViewResult<()> {
        self.dirty.propagate();
        self.pull(node, ctx)
    }

    fn pull(&mut self, node: Node, ctx: &DeriveContext<'_>) -> ViewResult<()> {
        if !self.dirty.contains(node) {
            return Ok(());
        }
        for &dep in node.inputs() {
            self.pull(dep, ctx)?;
        }
        self.derive(node, ctx)?;
        self.counts.bump(node);
        trace!(canvas = %self.id, ?node, "recomputed");
        self.dirty.remove(node);
        Ok(())
    }

    fn snapshot(&self) -> ScreenSnapshot {
        self.screen.unwrap_or(ScreenSnapshot {
            physical_width: 0.0,
            physical_height: 0.0,
            pixel_width: 0,
            pixel_height: 0,
            tracker_base_to_image_plate: Mat4::identity(),
            head_tracker_to_left_image_plate: Mat4::identity(),
            head_tracker_to_right_image_plate: Mat4::identity(),
        })
    }

    fn derive(&mut self, node: Node, ctx: &DeriveContext<'_>) -> ViewResult<()> {
        let cam = ctx.camera;
        let screen = self.snapshot();
        let v = &mut self.values;
        let eyes = self.canvas.slot_eyes();
        match node {
            Node::CanvasPlacement => v.placement = derive_placement(&self.canvas, &screen),
            Node::ScreenScale => {
                v.screen_scale = match cam.policies.screen_scale {
                    ScreenScalePolicy::ScreenSize => screen.physical_width * 0.5,
                    ScreenScalePolicy::Explicit => cam.screen_scale,
                };
            }
            Node::WindowScale => {
                v.window_scale = match cam.policies.window_resize {
                    WindowResizePolicy::PhysicalWorld => 1.0,
                    WindowResizePolicy::VirtualWorld => width_ratio(&v.placement, &screen),
                };
            }
            Node::CoeToPlate => {
                v.coe_to_plate = eyes.map(|eye| derive_coe_to_plate(eye, cam, ctx.head, &v.placement, &screen));
            }
            Node::ViewPlatformToCoe => {
                v.vp_to_coe = derive_vp_to_coe(cam, &v.placement, v.screen_scale * v.window_scale);
            }
            Node::CoeToViewPlatform => v.coe_to_vp = invert(&v.vp_to_coe, "view platform to coexistence")?,
            Node::PlateToViewPlatform => {
                v.plate_to_vp = pair(|i| invert(&(v.coe_to_plate[i] * v.vp_to_coe), "view platform to image plate"))?;
            }
            Node::EyeInPlate => {
                let canvas = &self.canvas;
                v.eye_in_plate = pair(|i| {
                    derive_eye_in_plate(eyes[i], canvas, cam, ctx.head, &v.placement, &screen, &v.coe_to_plate[i])
                })?;
            }
            Node::EyeToPlate => v.eye_to_plate = v.eye_in_plate.map(Mat4::from_translation),
            Node::EyeToViewPlatform => {
                v.eye_to_vp = [v.plate_to_vp[0] * v.eye_to_plate[0], v.plate_to_vp[1] * v.eye_to_plate[1]];
            }
            Node::PhysicalToVirtualScale => {
                v.physical_to_virtual_scale = 1.0 / (v.screen_scale * v.window_scale * ctx.rig.world_scale);
            }
            Node::ClipDistances => {
                v.clip = v
                    .eye_in_plate
                    .map(|eye| derive_clip(cam, v.physical_to_virtual_scale, &v.placement, &screen, eye));
            }
            Node::Projection => {
                let policy = cam.policies.projection;
                let p = &v.placement;
                v.projection = [0, 1].map(|i| {
                    Frustum::from_canvas(p.origin, p.width, p.height, v.eye_in_plate[i], v.clip[i]).matrix(policy)
                });
            }
            Node::InverseProjection => {
                v.inverse_projection = pair(|i| invert(&v.projection[i], "projection"))?;
            }
            Node::InverseViewPlatformProjection => {
                v.inverse_vp_projection = [
                    v.eye_to_vp[0] * v.inverse_projection[0],
                    v.eye_to_vp[1] * v.inverse_projection[1],
                ];
            }
            Node::TrackerBaseToViewPlatform => v.tb_to_vp = v.coe_to_vp * cam.tracker_base_to_coexistence,
            Node::PlateToWorld => v.plate_to_world = v.plate_to_vp.map(|m| ctx.rig.local_to_world * m),
            Node::EyeToWorld => v.eye_to_world = v.eye_to_vp.map(|m| ctx.rig.local_to_world * m),
            Node::InverseWorldProjection => {
                v.inverse_world_projection = v.inverse_vp_projection.map(|m| ctx.rig.local_to_world * m);
            }
            Node::CoeToWorld => v.coe_to_world = ctx.rig.local_to_world * v.coe_to_vp,
            Node::TrackerBaseToWorld => v.tb_to_world = ctx.rig.local_to_world * v.tb_to_vp,
            Node::CanvasGeometry
            | Node::ScreenGeometry
            | Node::TrackerBaseCalibration
            | Node::HeadTrackerCalibration
            | Node::Policies
            | Node::Body
            | Node::CanvasEyes
            | Node::Environment
            | Node::HeadPose
            | Node::RigTransform
            | Node::RigScale => {}
        }
        Ok(())
    }

    // Accessors return the last derived value; callers ensure the node first.

    /// Canvas placement on the image plate.
    pub fn placement(&self) -> Placement {
        self.values.placement
    }
    /// Screen scale.
    pub fn screen_scale(&self) -> f64 {
        self.values.screen_scale
    }
    /// Window scale.
    pub fn window_scale(&self) -> f64 {
        self.values.window_scale
    }
    /// Coexistence to image plate per slot.
    pub fn coexistence_to_image_plate(&self) -> Pair<Mat4> {
        self.values.coe_to_plate
    }
    /// View platform to coexistence.
    pub fn view_platform_to_coexistence(&self) -> Mat4 {
        self.values.vp_to_coe
    }
    /// Coexistence to view platform.
    pub fn coexistence_to_view_platform(&self) -> Mat4 {
        self.values.coe_to_vp
    }
    /// Image plate to view platform per slot.
    pub fn image_plate_to_view_platform(&self) -> Pair<Mat4> {
        self.values.plate_to_vp
    }
    /// Eye positions in image-plate coordinates per slot.
    pub fn eye_in_image_plate(&self) -> Pair<Vec3> {
        self.values.eye_in_plate
    }
    /// Eye to image plate per slot.
    pub fn eye_to_image_plate(&self) -> Pair<Mat4> {
        self.values.eye_to_plate
    }
    /// Eye to view platform per slot.
    pub fn eye_to_view_platform(&self) -> Pair<Mat4> {
        self.values.eye_to_vp
    }
    /// Physical-to-virtual scale.
    pub fn physical_to_virtual_scale(&self) -> f64 {
        self.values.physical_to_virtual_scale
    }
    /// Effective clip distances from each slot's eye, in meters.
    pub fn clip_distances(&self) -> Pair<ClipDistances> {
        self.values.clip
    }
    /// Projection per slot.
    pub fn projection(&self) -> Pair<Mat4> {
        self.values.projection
    }
    /// Inverse projection per slot.
    pub fn inverse_projection(&self) -> Pair<Mat4> {
        self.values.inverse_projection
    }
    /// Clip to view platform per slot.
    pub fn inverse_view_platform_projection(&self) -> Pair<Mat4> {
        self.values.inverse_vp_projection
    }
    /// Tracker base to view platform.
    pub fn tracker_base_to_view_platform(&self) -> Mat4 {
        self.values.tb_to_vp
    }
    /// Image plate to world per slot.
    pub fn image_plate_to_world(&self) -> Pair<Mat4> {
        self.values.plate_to_world
    }
    /// Eye to world per slot.
    pub fn eye_to_world(&self) -> Pair<Mat4> {
        self.values.eye_to_world
    }
    /// Clip to world per slot.
    pub fn inverse_world_projection(&self) -> Pair<Mat4> {
        self.values.inverse_world_projection
    }
    /// Coexistence to world.
    pub fn coexistence_to_world(&self) -> Mat4 {
        self.values.coe_to_world
    }
    /// Tracker base to world.
    pub fn tracker_base_to_world(&self) -> Mat4 {
        self.values.tb_to_world
    }
}

fn width_ratio(placement: &Placement, screen: &ScreenSnapshot) -> f64 {
    if screen.physical_width > 0.0 {
        placement.width / screen.physical_width
    } else {
        1.0
    }
}

fn derive_placement(canvas: &CanvasState, screen: &ScreenSnapshot) -> Placement {
    let mpp_x = screen.meters_per_pixel_x();
    let mpp_y = screen.meters_per_pixel_y();
    let from_bottom = i64::from(screen.pixel_height) - i64::from(canvas.y) - i64::from(canvas.height);
    Placement {
        width: f64::from(canvas.width) * mpp_x,
        height: f64::from(canvas.height) * mpp_y,
        origin: Vec3::new(f64::from(canvas.x) * mpp_x, from_bottom as f64 * mpp_y, 0.0),
    }
}

fn head_tracker_to_plate(eye: Eye, screen: &ScreenSnapshot) -> Mat4 {
    match eye.plate() {
        Eye::Right => screen.head_tracker_to_right_image_plate,
        Eye::Left | Eye::Cyclopean => screen.head_tracker_to_left_image_plate,
    }
}

fn derive_coe_to_plate(
    eye: Eye,
    cam: &CameraParams,
    head: &HeadState,
    placement: &Placement,
    screen: &ScreenSnapshot,
) -> Mat4 {
    match cam.policies.view {
        ViewPolicy::HeadMounted => head_tracker_to_plate(eye, screen) * head.coexistence_to_head_tracker,
        ViewPolicy::Screen if cam.coexistence_centering => match cam.policies.window_movement {
            WindowMovementPolicy::PhysicalWorld => Mat4::from_translation(placement.center()),
            WindowMovementPolicy::VirtualWorld => Mat4::translation(
                screen.physical_width * 0.5,
                screen.physical_height * 0.5,
                0.0,
            ),
        },
        ViewPolicy::Screen => screen.tracker_base_to_image_plate * cam.coexistence_to_tracker_base,
    }
}

/// Distance from the eye to the image plate the untracked field-of-view
/// policy places the eye at.
fn field_of_view_eye_distance(width: f64, field_of_view: f64) -> f64 {
    0.5 * width / (0.5 * field_of_view).tan()
}

fn eye_offset(cam: &CameraParams, placement: &Placement) -> f64 {
    let untracked_fov = cam.policies.view == ViewPolicy::Screen
        && !cam.tracking
        && cam.policies.window_eyepoint == WindowEyepointPolicy::RelativeToFieldOfView;
    if untracked_fov {
        field_of_view_eye_distance(placement.width, cam.field_of_view)
    } else {
        cam.body.nominal_eye_offset_from_nominal_screen
    }
}

fn nominal_point(policy: AttachPolicy, cam: &CameraParams, eye_offset: f64) -> Vec3 {
    match policy {
        AttachPolicy::NominalScreen => Vec3::ZERO,
        AttachPolicy::NominalHead => Vec3::new(0.0, 0.0, eye_offset),
        AttachPolicy::NominalFeet => Vec3::new(0.0, -cam.body.nominal_eye_height_from_ground, eye_offset),
    }
}

fn derive_vp_to_coe(cam: &CameraParams, placement: &Placement, scale: f64) -> Mat4 {
    let offset = eye_offset(cam, placement);
    let attach = nominal_point(cam.policies.view_attach, cam, offset);
    let center = nominal_point(cam.policies.coexistence_center, cam, offset);
    Mat4::from_translation(attach - center) * Mat4::uniform_scale(scale)
}

fn derive_eye_in_plate(
    eye: Eye,
    canvas: &CanvasState,
    cam: &CameraParams,
    head: &HeadState,
    placement: &Placement,
    screen: &ScreenSnapshot,
    coe_to_plate: &Mat4,
) -> ViewResult<Vec3> {
    let body = &cam.body;
    let eye_in_head = eye.pick(body.left_eye_position, body.right_eye_position);
    let position = match cam.policies.view {
        ViewPolicy::HeadMounted => {
            (head_tracker_to_plate(eye, screen) * body.head_to_head_tracker).transform_point(&eye_in_head)
        }
        ViewPolicy::Screen if cam.tracking => {
            let tb_to_plate = if cam.coexistence_centering {
                *coe_to_plate * cam.tracker_base_to_coexistence
            } else {
                screen.tracker_base_to_image_plate
            };
            (tb_to_plate * head.head_to_tracker_base).transform_point(&eye_in_head)
        }
        ViewPolicy::Screen => match cam.policies.window_eyepoint {
            WindowEyepointPolicy::RelativeToFieldOfView => {
                let half_iod = 0.5 * body.interocular_distance();
                let dx = match eye {
                    Eye::Left => -half_iod,
                    Eye::Right => half_iod,
                    Eye::Cyclopean => 0.0,
                };
                let center = placement.center();
                Vec3::new(
                    center.x + dx,
                    center.y,
                    field_of_view_eye_distance(placement.width, cam.field_of_view),
                )
            }
            WindowEyepointPolicy::RelativeToScreen => eye.pick(canvas.left_manual_eye, canvas.right_manual_eye),
            WindowEyepointPolicy::RelativeToWindow => {
                placement.origin + eye.pick(canvas.left_manual_eye, canvas.right_manual_eye)
            }
            WindowEyepointPolicy::RelativeToCoexistence => coe_to_plate.transform_point(&eye.pick(
                cam.left_manual_eye_in_coexistence,
                cam.right_manual_eye_in_coexistence,
            )),
        },
    };
    if position.x.is_finite() && position.y.is_finite() && position.z.is_finite() {
        Ok(position)
    } else {
        Err(ViewError::SingularTransform("eye position"))
    }
}

fn clip_scale(policy: ClipPolicy, cam: &CameraParams, p2v: f64, ratio: f64) -> f64 {
    let mut factor = 1.0;
    if policy.is_virtual() {
        factor /= p2v;
    }
    if cam.policies.window_resize == WindowResizePolicy::PhysicalWorld {
        factor *= ratio;
    }
    factor
}

fn eye_distance(policy: ClipPolicy, distance: f64, eye: Vec3) -> f64 {
    if policy.is_eye_relative() {
        distance
    } else {
        eye.z + distance
    }
}

fn derive_clip(
    cam: &CameraParams,
    p2v: f64,
    placement: &Placement,
    screen: &ScreenSnapshot,
    eye: Vec3,
) -> ClipDistances {
    let ratio = width_ratio(placement, screen);
    let front_policy = cam.policies.front_clip;
    let back_policy = cam.policies.back_clip;
    let front = cam.front_clip_distance * clip_scale(front_policy, cam, p2v, ratio);
    let back = cam.back_clip_distance * clip_scale(back_policy, cam, p2v, ratio);
    ClipDistances {
        front: eye_distance(front_policy, front, eye),
        back: eye_distance(back_policy, back, eye),
    }
    .sanitized(cam.policies.projection)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::host::{Screen, View};

    fn canvas_state(width: u32, height: u32) -> CanvasState {
        CanvasState {
            x: 0,
            y: 0,
            width,
            height,
            stereo: false,
            monoscopic: MonoscopicViewPolicy::Cyclopean,
            left_manual_eye: Vec3::new(0.142, 0.135, 0.4572),
            right_manual_eye: Vec3::new(0.208, 0.135, 0.4572),
        }
    }

    fn cache_for(screen: &Screen, canvas: CanvasState) -> CanvasInfo {
        let mut info = CanvasInfo::new(CanvasId(0), screen.id, canvas);
        info.set_screen(screen.id, ScreenSnapshot::capture(screen));
        info
    }

    #[test]
    fn placement_flips_window_y_to_plate_y() {
        let screen = Screen::new(ScreenId(0), 1000, 800).with_physical_size(0.5, 0.4);
        let mut canvas = canvas_state(200, 100);
        canvas.x = 100;
        canvas.y = 50;
        let placement = derive_placement(&canvas, &ScreenSnapshot::capture(&screen));
        assert!((placement.width - 0.1).abs() < 1e-12);
        assert!((placement.height - 0.05).abs() < 1e-12);
        assert!(placement.origin.approx_eq(&Vec3::new(0.05, 0.325, 0.0), 1e-12));
    }

    #[test]
    fn default_view_puts_platform_origin_at_the_eye() {
        let screen = Screen::new(ScreenId(0), 1280, 1024);
        let mut info = cache_for(&screen, canvas_state(1280, 1024));
        let camera = CameraParams::capture(&View::default()).unwrap();
        let head = HeadState::nominal(&camera).unwrap();
        let rig = RigState::default();
        let ctx = DeriveContext { camera: &camera, head: &head, rig: &rig };
        info.ensure(Node::EyeToViewPlatform, &ctx).unwrap();
        let eye_in_vp = info.eye_to_view_platform()[0].transform_point(&Vec3::ZERO);
        assert!(eye_in_vp.approx_eq(&Vec3::ZERO, 1e-9), "{eye_in_vp:?}");
    }

    #[test]
    fn ensure_only_recomputes_dirty_nodes() {
        let screen = Screen::new(ScreenId(0), 640, 480);
        let mut info = cache_for(&screen, canvas_state(640, 480));
        let camera = CameraParams::capture(&View::default()).unwrap();
        let head = HeadState::nominal(&camera).unwrap();
        let rig = RigState::default();
        let ctx = DeriveContext { camera: &camera, head: &head, rig: &rig };
        info.ensure(Node::Projection, &ctx).unwrap();
        assert_eq!(info.recompute_counts().get(Node::Projection), 1);
        assert_eq!(info.recompute_counts().get(Node::CoeToWorld), 0);

        info.ensure(Node::Projection, &ctx).unwrap();
        assert_eq!(info.recompute_counts().get(Node::Projection), 1);
        assert_eq!(info.recompute_counts().get(Node::CanvasPlacement), 1);
    }

    #[test]
    fn monoscopic_policy_selects_eye() {
        let mut canvas = canvas_state(640, 480);
        for (policy, expected) in [
            (MonoscopicViewPolicy::LeftEye, -0.033),
            (MonoscopicViewPolicy::RightEye, 0.033),
            (MonoscopicViewPolicy::Cyclopean, 0.0),
        ] {
            canvas.monoscopic = policy;
            let screen = Screen::new(ScreenId(0), 640, 480);
            let mut info = cache_for(&screen, canvas);
            let camera = CameraParams::capture(&View::default()).unwrap();
            let head = HeadState::nominal(&camera).unwrap();
            let rig = RigState::default();
            let ctx = DeriveContext { camera: &camera, head: &head, rig: &rig };
            info.ensure(Node::EyeInPlate, &ctx).unwrap();
            let center = info.placement().center();
            let eye = info.eye_in_image_plate()[0];
            assert!((eye.x - center.x - expected).abs() < 1e-12, "{policy:?}");
        }
    }
}
