// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-screen cache shared by every view that renders to the screen.

use std::collections::BTreeMap;
use std::ops::BitOrAssign;

use parallax_math::Mat4;
use tracing::debug;

use crate::host::{CanvasId, Screen, ScreenId, ViewId};

/// Screen values the canvas caches derive from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenSnapshot {
    /// Physical width in meters.
    pub physical_width: f64,
    /// Physical height in meters.
    pub physical_height: f64,
    /// Width in pixels.
    pub pixel_width: u32,
    /// Height in pixels.
    pub pixel_height: u32,
    /// Tracker base to image plate.
    pub tracker_base_to_image_plate: Mat4,
    /// Head tracker to left image plate.
    pub head_tracker_to_left_image_plate: Mat4,
    /// Head tracker to right image plate.
    pub head_tracker_to_right_image_plate: Mat4,
}

impl ScreenSnapshot {
    /// Captures the current state of `screen`.
    pub fn capture(screen: &Screen) -> Self {
        Self {
            physical_width: screen.physical_width,
            physical_height: screen.physical_height,
            pixel_width: screen.pixel_width,
            pixel_height: screen.pixel_height,
            tracker_base_to_image_plate: screen.tracker_base_to_image_plate,
            head_tracker_to_left_image_plate: screen.head_tracker_to_left_image_plate,
            head_tracker_to_right_image_plate: screen.head_tracker_to_right_image_plate,
        }
    }

    /// Horizontal meters per pixel.
    pub fn meters_per_pixel_x(&self) -> f64 {
        self.physical_width / f64::from(self.pixel_width.max(1))
    }

    /// Vertical meters per pixel.
    pub fn meters_per_pixel_y(&self) -> f64 {
        self.physical_height / f64::from(self.pixel_height.max(1))
    }

    fn diff(&self, other: &Self) -> ScreenChanges {
        ScreenChanges {
            geometry: self.physical_width != other.physical_width
                || self.physical_height != other.physical_height
                || self.pixel_width != other.pixel_width
                || self.pixel_height != other.pixel_height,
            tracker_base: self.tracker_base_to_image_plate != other.tracker_base_to_image_plate,
            head_tracker: self.head_tracker_to_left_image_plate
                != other.head_tracker_to_left_image_plate
                || self.head_tracker_to_right_image_plate != other.head_tracker_to_right_image_plate,
            released: false,
        }
    }
}

/// Screen changes not yet consumed by one canvas cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScreenChanges {
    /// Physical or pixel size changed.
    pub geometry: bool,
    /// Tracker-base calibration changed.
    pub tracker_base: bool,
    /// Head-tracker calibrations changed.
    pub head_tracker: bool,
    /// The screen cache was released; the subscriber must rebuild.
    pub released: bool,
}

impl ScreenChanges {
    /// Everything changed; the state of a new subscription.
    pub const ALL: Self = Self {
        geometry: true,
        tracker_base: true,
        head_tracker: true,
        released: false,
    };

    /// Whether nothing changed.
    pub fn is_empty(&self) -> bool {
        !(self.geometry || self.tracker_base || self.head_tracker || self.released)
    }
}

impl BitOrAssign for ScreenChanges {
    fn bitor_assign(&mut self, rhs: Self) {
        self.geometry |= rhs.geometry;
        self.tracker_base |= rhs.tracker_base;
        self.head_tracker |= rhs.head_tracker;
        self.released |= rhs.released;
    }
}

/// Cached screen state plus a change mailbox per subscribed canvas cache.
///
/// One screen can back canvases of several views at once, so subscriptions
/// are grouped by owning view and cleared per owner.
#[derive(Debug)]
pub struct ScreenInfo {
    id: ScreenId,
    snapshot: Option<ScreenSnapshot>,
    needs_refresh: bool,
    subscribers: BTreeMap<ViewId, BTreeMap<CanvasId, ScreenChanges>>,
}

impl ScreenInfo {
    /// Empty cache for screen `id`; the first refresh loads it.
    pub fn new(id: ScreenId) -> Self {
        Self {
            id,
            snapshot: None,
            needs_refresh: true,
            subscribers: BTreeMap::new(),
        }
    }

    /// Screen this cache belongs to.
    pub fn id(&self) -> ScreenId {
        self.id
    }

    /// Last captured state, once loaded.
    pub fn snapshot(&self) -> Option<&ScreenSnapshot> {
        self.snapshot.as_ref()
    }

    /// Whether a refresh has been requested since the last one.
    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh
    }

    /// Requests a refresh on the next update.
    pub fn mark_for_refresh(&mut self) {
        self.needs_refresh = true;
    }

    /// Re-reads `screen`, notifies every subscribed canvas of what changed,
    /// and only then clears the refresh request.
    pub fn refresh(&mut self, screen: &Screen) -> ScreenChanges {
        let next = ScreenSnapshot::capture(screen);
        let changes = match &self.snapshot {
            Some(prev) => prev.diff(&next),
            None => ScreenChanges::ALL,
        };
        if !changes.is_empty() {
            debug!(screen = %self.id, ?changes, "screen changed");
            for mailbox in self.subscribers.values_mut().flat_map(BTreeMap::values_mut) {
                *mailbox |= changes;
            }
        }
        self.snapshot = Some(next);
        self.needs_refresh = false;
        changes
    }

    /// Subscribes `canvas` of view `owner`. A new subscription starts with
    /// every change pending.
    pub fn register_canvas(&mut self, owner: ViewId, canvas: CanvasId) {
        self.subscribers
            .entry(owner)
            .or_default()
            .entry(canvas)
            .or_insert(ScreenChanges::ALL);
    }

    /// Drops one canvas subscription of `owner`.
    pub fn unregister_canvas(&mut self, owner: ViewId, canvas: CanvasId) {
        if let Some(canvases) = self.subscribers.get_mut(&owner) {
            canvases.remove(&canvas);
            if canvases.is_empty() {
                self.subscribers.remove(&owner);
            }
        }
    }

    /// Drops every subscription of `owner`.
    pub fn clear(&mut self, owner: ViewId) {
        self.subscribers.remove(&owner);
    }

    /// Takes and resets the pending changes for one subscribed canvas.
    pub fn take_changes(&mut self, owner: ViewId, canvas: CanvasId) -> ScreenChanges {
        self.subscribers
            .get_mut(&owner)
            .and_then(|canvases| canvases.get_mut(&canvas))
            .map(core::mem::take)
            .unwrap_or_default()
    }

    /// Number of canvas subscriptions across all owners.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.values().map(BTreeMap::len).sum()
    }

    /// Flags every subscriber for a full rebuild. Subscribers still holding
    /// this cache see `released` on their next take and must re-resolve it.
    pub fn release(&mut self) {
        debug!(screen = %self.id, subscribers = self.subscriber_count(), "screen cache released");
        for mailbox in self.subscribers.values_mut().flat_map(BTreeMap::values_mut) {
            mailbox.released = true;
        }
        self.snapshot = None;
        self.needs_refresh = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_subscriber_sees_everything_then_only_deltas() {
        let mut screen = Screen::new(ScreenId(0), 1280, 1024);
        let mut info = ScreenInfo::new(ScreenId(0));
        let (owner, canvas) = (ViewId(1), CanvasId(7));
        info.register_canvas(owner, canvas);
        info.refresh(&screen);
        assert_eq!(info.take_changes(owner, canvas), ScreenChanges::ALL);
        assert!(info.take_changes(owner, canvas).is_empty());

        screen.tracker_base_to_image_plate = Mat4::translation(0.1, 0.0, 0.0);
        let changes = info.refresh(&screen);
        assert!(changes.tracker_base && !changes.geometry && !changes.head_tracker);
        assert_eq!(info.take_changes(owner, canvas), changes);
        assert!(!info.needs_refresh());
    }

    #[test]
    fn every_owner_is_notified() {
        let mut screen = Screen::new(ScreenId(0), 640, 480);
        let mut info = ScreenInfo::new(ScreenId(0));
        info.refresh(&screen);
        info.register_canvas(ViewId(1), CanvasId(1));
        info.register_canvas(ViewId(2), CanvasId(2));
        let _ = info.take_changes(ViewId(1), CanvasId(1));
        let _ = info.take_changes(ViewId(2), CanvasId(2));

        screen.physical_width = 0.5;
        info.refresh(&screen);
        assert!(info.take_changes(ViewId(1), CanvasId(1)).geometry);
        assert!(info.take_changes(ViewId(2), CanvasId(2)).geometry);

        info.clear(ViewId(1));
        assert_eq!(info.subscriber_count(), 1);

        info.release();
        assert!(info.take_changes(ViewId(2), CanvasId(2)).released);
        assert!(info.snapshot().is_none());
    }
}
