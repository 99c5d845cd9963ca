// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-view façade over the canvas, screen and rig caches.
//!
//! A [`ViewInfo`] answers transform queries for the canvases of one view.
//! Before every answer it brings the relevant caches up to date: the view
//! itself (only when asked to, or when its canvas list or rig changed), the
//! rig when the answer depends on world space or world scale, the head pose
//! when tracking, the queried canvas's screen, and the canvas itself. Each of
//! these can be re-read automatically on every query ([`AutoUpdate`]) or only
//! when a host thread says so through the [`UpdateNotifier`].
//!
//! # Head and eye skew
//!
//! Head pose is sampled once per update and shared by every canvas of the
//! view, while each canvas is brought up to date only when queried. Two
//! canvases queried at different times may therefore see different head
//! poses within one frame. Hosts that need both eyes or both screens from
//! one pose should query them back to back with `head` auto-update off and
//! call [`ViewInfo::update_head`] once per frame.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use parallax_math::{Mat4, Vec3};
use serde::Serialize;
use tracing::debug;

use crate::camera::{CameraParams, HeadState};
use crate::canvas_info::{CanvasInfo, CanvasState, DeriveContext, Pair, RigState};
use crate::dirty::{Node, RecomputeCounts};
use crate::error::{ViewError, ViewResult};
use crate::host::{read, Canvas, CanvasId, RigId, Screen, Shared, View, ViewId, ViewPlatform};
use crate::registry::{lock, InfoRegistry, SharedPlatformInfo, SharedScreenInfo};

/// Which sources are re-read on every query instead of only on notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AutoUpdate {
    /// Canvas position, size and eye parameters.
    pub canvas: bool,
    /// Screen size and calibrations.
    pub screen: bool,
    /// Rig transform.
    pub platform: bool,
    /// Head-tracker sensor.
    pub head: bool,
    /// View policies and parameters (full resync, flags every value).
    pub view: bool,
}

impl AutoUpdate {
    /// Re-read everything on every query.
    pub const ALL: Self = Self {
        canvas: true,
        screen: true,
        platform: true,
        head: true,
        view: true,
    };

    /// Re-read only on notification.
    pub const NONE: Self = Self {
        canvas: false,
        screen: false,
        platform: false,
        head: false,
        view: false,
    };
}

impl Default for AutoUpdate {
    fn default() -> Self {
        Self::NONE
    }
}

/// Thread-safe handle for telling a [`ViewInfo`] that host state changed.
#[derive(Debug, Default)]
pub struct UpdateNotifier {
    screen: AtomicBool,
    view: AtomicBool,
    head: AtomicBool,
    platform: AtomicBool,
    canvases: Mutex<BTreeSet<CanvasId>>,
}

impl UpdateNotifier {
    /// The screens of this view changed.
    pub fn update_screen(&self) {
        self.screen.store(true, Ordering::Release);
    }

    /// Canvas `id` moved, resized, or changed its eye parameters.
    pub fn update_canvas(&self, id: CanvasId) {
        self.canvases
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id);
    }

    /// View policies or parameters changed.
    pub fn update_view(&self) {
        self.view.store(true, Ordering::Release);
    }

    /// The head sensor has a new reading.
    pub fn update_head(&self) {
        self.head.store(true, Ordering::Release);
    }

    /// The rig moved.
    pub fn update_platform(&self) {
        self.platform.store(true, Ordering::Release);
    }

    fn take(flag: &AtomicBool) -> bool {
        flag.swap(false, Ordering::AcqRel)
    }

    fn take_canvases(&self) -> BTreeSet<CanvasId> {
        core::mem::take(&mut *self.canvases.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// A query result for the left (or only) eye and, on stereo canvases, the
/// right eye.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Stereo<T> {
    /// Left eye, or the monoscopic eye.
    pub left: T,
    /// Right eye on stereo canvases.
    pub right: Option<T>,
}

impl<T> Stereo<T> {
    /// Applies `f` to both eyes.
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Stereo<U> {
        Stereo {
            left: f(self.left),
            right: self.right.map(f),
        }
    }
}

/// How much of the outside world a query depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Need {
    Local,
    Scale,
    World,
}

#[derive(Debug)]
struct PlatformLink {
    id: RigId,
    handle: Shared<ViewPlatform>,
    info: SharedPlatformInfo,
    loaded: bool,
}

#[derive(Debug)]
struct CanvasLink {
    handle: Shared<Canvas>,
    screen: Shared<Screen>,
    screen_info: SharedScreenInfo,
    pending: bool,
    cache: CanvasInfo,
}

/// Cached view transforms for every canvas of one view.
#[derive(Debug)]
pub struct ViewInfo {
    id: ViewId,
    view: Shared<View>,
    registry: Arc<InfoRegistry>,
    auto: AutoUpdate,
    notifier: Arc<UpdateNotifier>,
    camera: Option<CameraParams>,
    head: HeadState,
    head_loaded: bool,
    rig: RigState,
    platform: Option<PlatformLink>,
    canvases: BTreeMap<CanvasId, CanvasLink>,
}

impl ViewInfo {
    /// Creates the cache for `view`. Screen and rig caches come from
    /// `registry` and are shared with every other view using it.
    pub fn new(view: Shared<View>, auto: AutoUpdate, registry: Arc<InfoRegistry>) -> Self {
        let id = registry.allocate_view_id();
        debug!(view = %id, ?auto, "view cache created");
        Self {
            id,
            view,
            registry,
            auto,
            notifier: Arc::new(UpdateNotifier::default()),
            camera: None,
            head: HeadState {
                head_to_tracker_base: Mat4::identity(),
                head_tracker_to_tracker_base: Mat4::identity(),
                coexistence_to_head_tracker: Mat4::identity(),
            },
            head_loaded: false,
            rig: RigState::default(),
            platform: None,
            canvases: BTreeMap::new(),
        }
    }

    /// Identity of this cache in the registry's subscriptions.
    pub fn id(&self) -> ViewId {
        self.id
    }

    /// Auto-update settings.
    pub fn auto_update(&self) -> AutoUpdate {
        self.auto
    }

    /// Handle host threads use to signal changes.
    pub fn notifier(&self) -> Arc<UpdateNotifier> {
        Arc::clone(&self.notifier)
    }

    /// See [`UpdateNotifier::update_screen`].
    pub fn update_screen(&self) {
        self.notifier.update_screen();
    }

    /// See [`UpdateNotifier::update_canvas`].
    pub fn update_canvas(&self, id: CanvasId) {
        self.notifier.update_canvas(id);
    }

    /// See [`UpdateNotifier::update_view`].
    pub fn update_view(&self) {
        self.notifier.update_view();
    }

    /// See [`UpdateNotifier::update_head`].
    pub fn update_head(&self) {
        self.notifier.update_head();
    }

    /// See [`UpdateNotifier::update_platform`].
    pub fn update_platform(&self) {
        self.notifier.update_platform();
    }

    /// Canvases known since the last view refresh.
    pub fn canvas_ids(&self) -> Vec<CanvasId> {
        self.canvases.keys().copied().collect()
    }

    // ---- update orchestration -------------------------------------------

    fn topology_changed(&self, view: &View) -> bool {
        let platform_changed = match (&view.platform, &self.platform) {
            (None, None) => false,
            (Some(handle), Some(link)) => !Arc::ptr_eq(handle, &link.handle) || read(handle).id != link.id,
            _ => true,
        };
        if platform_changed || view.canvases.len() != self.canvases.len() {
            return true;
        }
        view.canvases.iter().any(|handle| {
            let id = read(handle).id;
            self.canvases
                .get(&id)
                .is_none_or(|link| !Arc::ptr_eq(handle, &link.handle))
        })
    }

    fn link_screen(&self, canvas: CanvasId, screen: &Shared<Screen>) -> ViewResult<(SharedScreenInfo, Screen)> {
        let snapshot = read(screen).clone();
        let info = self.registry.screen_info(snapshot.id)?;
        lock(&info).register_canvas(self.id, canvas);
        Ok((info, snapshot))
    }

    fn unlink_canvas(&self, id: CanvasId, link: &CanvasLink) {
        lock(&link.screen_info).unregister_canvas(self.id, id);
    }

    fn unlink_all(&mut self) {
        for (id, link) in core::mem::take(&mut self.canvases) {
            self.unlink_canvas(id, &link);
        }
        if let Some(link) = self.platform.take() {
            lock(&link.info).unregister_view(self.id);
        }
    }

    /// Full resync with the view: re-reads every parameter, rebuilds the
    /// canvas map and flags every cached value.
    fn refresh_camera(&mut self, view: &View) -> ViewResult<()> {
        let camera = CameraParams::capture(view)?;

        let relink_platform = match (&view.platform, &self.platform) {
            (Some(handle), Some(link)) => !Arc::ptr_eq(handle, &link.handle) || read(handle).id != link.id,
            (None, None) => false,
            _ => true,
        };
        if relink_platform {
            if let Some(old) = self.platform.take() {
                lock(&old.info).unregister_view(self.id);
            }
            if let Some(handle) = &view.platform {
                let id = read(handle).id;
                let info = self.registry.platform_info(id)?;
                lock(&info).register_view(self.id);
                self.platform = Some(PlatformLink {
                    id,
                    handle: Arc::clone(handle),
                    info,
                    loaded: false,
                });
            }
            self.rig = RigState::default();
        }

        let mut previous = core::mem::take(&mut self.canvases);
        for handle in &view.canvases {
            let canvas = read(handle).clone();
            let reusable = previous
                .remove(&canvas.id)
                .filter(|link| Arc::ptr_eq(handle, &link.handle));
            let mut link = if let Some(link) = reusable {
                link
            } else {
                let (screen_info, screen) = match self.link_screen(canvas.id, &canvas.screen) {
                    Ok(linked) => linked,
                    Err(err) => {
                        for (id, link) in previous {
                            self.unlink_canvas(id, &link);
                        }
                        return Err(err);
                    }
                };
                CanvasLink {
                    handle: Arc::clone(handle),
                    screen: Arc::clone(&canvas.screen),
                    screen_info,
                    pending: true,
                    cache: CanvasInfo::new(canvas.id, screen.id, CanvasState::capture(&canvas, camera.stereo_enable)),
                }
            };
            link.pending = true;
            link.cache.mark_all();
            self.canvases.insert(canvas.id, link);
        }
        for (id, link) in previous {
            self.unlink_canvas(id, &link);
        }

        if camera.tracking {
            self.head_loaded = false;
        } else {
            self.head = HeadState::nominal(&camera)?;
            self.head_loaded = true;
        }
        debug!(view = %self.id, canvases = self.canvases.len(), tracking = camera.tracking, "camera refreshed");
        self.camera = Some(camera);
        Ok(())
    }

    fn mark_all_canvases(&mut self, node: Node) {
        for link in self.canvases.values_mut() {
            link.cache.mark(node);
        }
    }

    /// Brings view-level state up to date. Returns `true` when a shared cache
    /// was released and the view must be rebuilt.
    fn update_view_state(&mut self, view: &View, need: Need) -> ViewResult<bool> {
        let resync = self.camera.is_none()
            || self.auto.view
            || UpdateNotifier::take(&self.notifier.view)
            || self.topology_changed(view);
        if resync {
            self.refresh_camera(view)?;
        }

        let Some(link) = self.platform.as_mut() else {
            return Err(ViewError::NoViewPlatform);
        };
        if need >= Need::Scale
            && (self.auto.platform || !link.loaded || UpdateNotifier::take(&self.notifier.platform))
        {
            let platform = read(&link.handle).clone();
            lock(&link.info).refresh(&platform)?;
            link.loaded = true;
        }
        let (changes, local_to_world, world_scale) = {
            let mut info = lock(&link.info);
            (info.take_changes(self.id), info.local_to_world(), info.world_scale())
        };
        if changes.released {
            return Ok(true);
        }
        if changes.transform || changes.scale {
            self.rig = RigState {
                local_to_world,
                world_scale,
            };
            if changes.transform {
                self.mark_all_canvases(Node::RigTransform);
            }
            if changes.scale {
                self.mark_all_canvases(Node::RigScale);
            }
        }

        let tracked_head = match &self.camera {
            Some(camera)
                if camera.tracking
                    && (self.auto.head || !self.head_loaded || UpdateNotifier::take(&self.notifier.head)) =>
            {
                view.environment
                    .head_sensor
                    .as_ref()
                    .map(|sensor| HeadState::tracked(camera, sensor.read()))
                    .transpose()?
            }
            _ => None,
        };
        if let Some(head) = tracked_head {
            self.head_loaded = true;
            if head != self.head {
                self.head = head;
                self.mark_all_canvases(Node::HeadPose);
            }
        }

        if UpdateNotifier::take(&self.notifier.screen) {
            for link in self.canvases.values() {
                lock(&link.screen_info).mark_for_refresh();
            }
        }
        for id in self.notifier.take_canvases() {
            if let Some(link) = self.canvases.get_mut(&id) {
                link.pending = true;
            }
        }
        Ok(false)
    }

    /// Brings the caches `canvas` depends on up to date.
    fn update_canvas_state(&mut self, canvas: CanvasId) -> ViewResult<bool> {
        let stereo_enable = self.camera.as_ref().is_some_and(|c| c.stereo_enable);
        let owner = self.id;
        if !self.canvases.contains_key(&canvas) {
            return Err(ViewError::CanvasNotAttached(canvas));
        }
        let current = {
            let link = &self.canvases[&canvas];
            read(&link.handle).clone()
        };
        let moved_screen = !Arc::ptr_eq(&current.screen, &self.canvases[&canvas].screen);
        if moved_screen {
            let screen_info = self.registry.screen_info(read(&current.screen).id)?;
            let previous = Arc::clone(&self.canvases[&canvas].screen_info);
            lock(&previous).unregister_canvas(owner, canvas);
            lock(&screen_info).register_canvas(owner, canvas);
            if let Some(link) = self.canvases.get_mut(&canvas) {
                link.screen_info = screen_info;
                link.screen = Arc::clone(&current.screen);
            }
        }
        let Some(link) = self.canvases.get_mut(&canvas) else {
            return Err(ViewError::CanvasNotAttached(canvas));
        };

        {
            let mut info = lock(&link.screen_info);
            if self.auto.screen || info.needs_refresh() {
                let screen = read(&link.screen).clone();
                info.refresh(&screen);
            }
            let changes = info.take_changes(owner, canvas);
            if changes.released {
                return Ok(true);
            }
            if let Some(snapshot) = info.snapshot() {
                link.cache.set_screen(info.id(), *snapshot);
            }
            if changes.geometry {
                link.cache.mark(Node::ScreenGeometry);
            }
            if changes.tracker_base {
                link.cache.mark(Node::TrackerBaseCalibration);
            }
            if changes.head_tracker {
                link.cache.mark(Node::HeadTrackerCalibration);
            }
        }

        if self.auto.canvas || link.pending {
            link.cache.set_canvas(CanvasState::capture(&current, stereo_enable));
            link.pending = false;
        }
        link.cache.propagate();
        Ok(false)
    }

    fn rebuild(&mut self) {
        debug!(view = %self.id, "shared cache released, rebuilding");
        self.unlink_all();
        self.camera = None;
        self.head_loaded = false;
        self.rig = RigState::default();
    }

    fn update_with(&mut self, need: Need, canvas: Option<CanvasId>) -> ViewResult<()> {
        let view_handle = Arc::clone(&self.view);
        let mut retried = false;
        loop {
            let released = {
                let view = read(&view_handle);
                self.update_view_state(&view, need)?
                    || match canvas {
                        Some(id) => self.update_canvas_state(id)?,
                        None => false,
                    }
            };
            if !released || retried {
                return Ok(());
            }
            self.rebuild();
            retried = true;
        }
    }

    fn clip_need(&self) -> Need {
        if read(&self.view).policies.has_virtual_clip() {
            Need::Scale
        } else {
            Need::Local
        }
    }

    fn query<T>(
        &mut self,
        canvas: CanvasId,
        need: Need,
        node: Node,
        f: impl FnOnce(&CanvasInfo, &Self) -> T,
    ) -> ViewResult<T> {
        self.update_with(need, Some(canvas))?;
        let camera = self.camera.as_ref().ok_or(ViewError::NoViewPlatform)?;
        let link = self
            .canvases
            .get_mut(&canvas)
            .ok_or(ViewError::CanvasNotAttached(canvas))?;
        let ctx = DeriveContext {
            camera,
            head: &self.head,
            rig: &self.rig,
        };
        link.cache.ensure(node, &ctx)?;
        let link = &self.canvases[&canvas];
        Ok(f(&link.cache, self))
    }

    fn stereo<T: Copy>(cache: &CanvasInfo, pair: Pair<T>) -> Stereo<T> {
        Stereo {
            left: pair[0],
            right: cache.is_stereo().then_some(pair[1]),
        }
    }

    fn query_pair(
        &mut self,
        canvas: CanvasId,
        need: Need,
        node: Node,
        f: impl FnOnce(&CanvasInfo) -> Pair<Mat4>,
    ) -> ViewResult<Stereo<Mat4>> {
        self.query(canvas, need, node, |cache, _| Self::stereo(cache, f(cache)))
    }

    // ---- queries ---------------------------------------------------------

    /// Coexistence to image plate.
    ///
    /// # Errors
    /// [`ViewError::CanvasNotAttached`], [`ViewError::NoViewPlatform`], or a
    /// singular calibration.
    pub fn coexistence_to_image_plate(&mut self, canvas: CanvasId) -> ViewResult<Stereo<Mat4>> {
        self.query_pair(canvas, Need::Local, Node::CoeToPlate, CanvasInfo::coexistence_to_image_plate)
    }

    /// View platform to coexistence.
    ///
    /// # Errors
    /// As [`Self::coexistence_to_image_plate`].
    pub fn view_platform_to_coexistence(&mut self, canvas: CanvasId) -> ViewResult<Mat4> {
        self.query(canvas, Need::Local, Node::ViewPlatformToCoe, |c, _| {
            c.view_platform_to_coexistence()
        })
    }

    /// Image plate to view platform.
    ///
    /// # Errors
    /// As [`Self::coexistence_to_image_plate`].
    pub fn image_plate_to_view_platform(&mut self, canvas: CanvasId) -> ViewResult<Stereo<Mat4>> {
        self.query_pair(
            canvas,
            Need::Local,
            Node::PlateToViewPlatform,
            CanvasInfo::image_plate_to_view_platform,
        )
    }

    /// Image plate to world.
    ///
    /// # Errors
    /// As [`Self::coexistence_to_image_plate`], plus
    /// [`ViewError::PlatformReadDenied`].
    pub fn image_plate_to_world(&mut self, canvas: CanvasId) -> ViewResult<Stereo<Mat4>> {
        self.query_pair(canvas, Need::World, Node::PlateToWorld, CanvasInfo::image_plate_to_world)
    }

    /// Eye to image plate.
    ///
    /// # Errors
    /// As [`Self::coexistence_to_image_plate`].
    pub fn eye_to_image_plate(&mut self, canvas: CanvasId) -> ViewResult<Stereo<Mat4>> {
        self.query_pair(canvas, Need::Local, Node::EyeToPlate, CanvasInfo::eye_to_image_plate)
    }

    /// Eye position in image-plate coordinates.
    ///
    /// # Errors
    /// As [`Self::coexistence_to_image_plate`].
    pub fn eye_in_image_plate(&mut self, canvas: CanvasId) -> ViewResult<Stereo<Vec3>> {
        self.query(canvas, Need::Local, Node::EyeInPlate, |c, _| {
            Self::stereo(c, c.eye_in_image_plate())
        })
    }

    /// Eye to view platform.
    ///
    /// # Errors
    /// As [`Self::coexistence_to_image_plate`].
    pub fn eye_to_view_platform(&mut self, canvas: CanvasId) -> ViewResult<Stereo<Mat4>> {
        self.query_pair(canvas, Need::Local, Node::EyeToViewPlatform, CanvasInfo::eye_to_view_platform)
    }

    /// Eye to world.
    ///
    /// # Errors
    /// As [`Self::image_plate_to_world`].
    pub fn eye_to_world(&mut self, canvas: CanvasId) -> ViewResult<Stereo<Mat4>> {
        self.query_pair(canvas, Need::World, Node::EyeToWorld, CanvasInfo::eye_to_world)
    }

    /// Eye to clip projection.
    ///
    /// # Errors
    /// As [`Self::coexistence_to_image_plate`]; with a virtual clip policy
    /// also as [`Self::image_plate_to_world`].
    pub fn projection(&mut self, canvas: CanvasId) -> ViewResult<Stereo<Mat4>> {
        let need = self.clip_need();
        self.query_pair(canvas, need, Node::Projection, CanvasInfo::projection)
    }

    /// Clip to eye.
    ///
    /// # Errors
    /// As [`Self::projection`], or a singular projection.
    pub fn inverse_projection(&mut self, canvas: CanvasId) -> ViewResult<Stereo<Mat4>> {
        let need = self.clip_need();
        self.query_pair(canvas, need, Node::InverseProjection, CanvasInfo::inverse_projection)
    }

    /// Clip to view platform.
    ///
    /// # Errors
    /// As [`Self::inverse_projection`].
    pub fn inverse_view_platform_projection(&mut self, canvas: CanvasId) -> ViewResult<Stereo<Mat4>> {
        let need = self.clip_need();
        self.query_pair(
            canvas,
            need,
            Node::InverseViewPlatformProjection,
            CanvasInfo::inverse_view_platform_projection,
        )
    }

    /// Clip to world.
    ///
    /// # Errors
    /// As [`Self::inverse_projection`] and [`Self::image_plate_to_world`].
    pub fn inverse_world_projection(&mut self, canvas: CanvasId) -> ViewResult<Stereo<Mat4>> {
        self.query_pair(
            canvas,
            Need::World,
            Node::InverseWorldProjection,
            CanvasInfo::inverse_world_projection,
        )
    }

    /// Coexistence to world.
    ///
    /// # Errors
    /// As [`Self::image_plate_to_world`].
    pub fn coexistence_to_world(&mut self, canvas: CanvasId) -> ViewResult<Mat4> {
        self.query(canvas, Need::World, Node::CoeToWorld, |c, _| c.coexistence_to_world())
    }

    /// Tracker base to world.
    ///
    /// # Errors
    /// As [`Self::image_plate_to_world`].
    pub fn tracker_base_to_world(&mut self, canvas: CanvasId) -> ViewResult<Mat4> {
        self.query(canvas, Need::World, Node::TrackerBaseToWorld, |c, _| c.tracker_base_to_world())
    }

    /// Head to world, through the canvas's tracker-base placement.
    ///
    /// # Errors
    /// As [`Self::image_plate_to_world`].
    pub fn head_to_world(&mut self, canvas: CanvasId) -> ViewResult<Mat4> {
        self.query(canvas, Need::World, Node::TrackerBaseToWorld, |c, this| {
            c.tracker_base_to_world() * this.head.head_to_tracker_base
        })
    }

    /// Head-tracker sensor to world.
    ///
    /// # Errors
    /// As [`Self::image_plate_to_world`].
    pub fn sensor_to_world(&mut self, canvas: CanvasId) -> ViewResult<Mat4> {
        self.query(canvas, Need::World, Node::TrackerBaseToWorld, |c, this| {
            c.tracker_base_to_world() * this.head.head_tracker_to_tracker_base
        })
    }

    /// Rig to world.
    ///
    /// # Errors
    /// [`ViewError::NoViewPlatform`] or [`ViewError::PlatformReadDenied`].
    pub fn view_platform_to_world(&mut self) -> ViewResult<Mat4> {
        self.update_with(Need::World, None)?;
        Ok(self.rig.local_to_world)
    }

    /// Front clip distance from each eye, in meters.
    ///
    /// # Errors
    /// As [`Self::projection`].
    pub fn physical_front_clip_distance(&mut self, canvas: CanvasId) -> ViewResult<Stereo<f64>> {
        let need = self.clip_need();
        self.query(canvas, need, Node::ClipDistances, |c, _| {
            Self::stereo(c, c.clip_distances().map(|clip| clip.front))
        })
    }

    /// Back clip distance from each eye, in meters.
    ///
    /// # Errors
    /// As [`Self::projection`].
    pub fn physical_back_clip_distance(&mut self, canvas: CanvasId) -> ViewResult<Stereo<f64>> {
        let need = self.clip_need();
        self.query(canvas, need, Node::ClipDistances, |c, _| {
            Self::stereo(c, c.clip_distances().map(|clip| clip.back))
        })
    }

    /// World units per physical meter.
    ///
    /// # Errors
    /// As [`Self::image_plate_to_world`].
    pub fn physical_to_virtual_scale(&mut self, canvas: CanvasId) -> ViewResult<f64> {
        self.query(canvas, Need::Scale, Node::PhysicalToVirtualScale, |c, _| {
            c.physical_to_virtual_scale()
        })
    }

    /// Canvas width in meters.
    ///
    /// # Errors
    /// As [`Self::coexistence_to_image_plate`].
    pub fn physical_width(&mut self, canvas: CanvasId) -> ViewResult<f64> {
        self.query(canvas, Need::Local, Node::CanvasPlacement, |c, _| c.placement().width)
    }

    /// Canvas height in meters.
    ///
    /// # Errors
    /// As [`Self::coexistence_to_image_plate`].
    pub fn physical_height(&mut self, canvas: CanvasId) -> ViewResult<f64> {
        self.query(canvas, Need::Local, Node::CanvasPlacement, |c, _| c.placement().height)
    }

    /// Image-plate position of canvas pixel `(x, y)`, with `y` measured down
    /// from the top of the canvas.
    ///
    /// # Errors
    /// As [`Self::coexistence_to_image_plate`].
    pub fn pixel_location_in_image_plate(&mut self, canvas: CanvasId, x: f64, y: f64) -> ViewResult<Vec3> {
        self.query(canvas, Need::Local, Node::CanvasPlacement, |c, _| {
            let placement = c.placement();
            let (mpp_x, mpp_y) = c
                .screen()
                .map_or((0.0, 0.0), |s| (s.meters_per_pixel_x(), s.meters_per_pixel_y()));
            Vec3::new(
                placement.origin.x + x * mpp_x,
                placement.origin.y + placement.height - y * mpp_y,
                0.0,
            )
        })
    }

    /// Recompute counters of `canvas` without updating anything.
    ///
    /// # Errors
    /// [`ViewError::CanvasNotAttached`] when the canvas has no cache yet.
    pub fn recompute_counts(&self, canvas: CanvasId) -> ViewResult<RecomputeCounts> {
        self.canvases
            .get(&canvas)
            .map(|link| link.cache.recompute_counts().clone())
            .ok_or(ViewError::CanvasNotAttached(canvas))
    }

    /// Unsubscribes from every shared screen and rig cache. Dropping the
    /// view info does the same.
    pub fn dispose(self) {
        drop(self);
    }
}

impl Drop for ViewInfo {
    fn drop(&mut self) {
        self.unlink_all();
    }
}
