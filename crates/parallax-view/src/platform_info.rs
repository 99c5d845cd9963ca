// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-rig cache of the local-to-world transform.

use std::collections::BTreeMap;

use parallax_math::Mat4;
use tracing::debug;

use crate::error::{ViewError, ViewResult};
use crate::host::{RigId, ViewId, ViewPlatform};

/// Scale changes smaller than this do not invalidate scale-dependent values.
pub const SCALE_TOLERANCE: f64 = 1.0e-7;

/// Rig changes not yet consumed by one view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RigChanges {
    /// Local-to-world changed.
    pub transform: bool,
    /// The uniform world scale changed beyond [`SCALE_TOLERANCE`].
    pub scale: bool,
    /// The rig cache was released; the subscriber must rebuild.
    pub released: bool,
}

impl RigChanges {
    const ALL: Self = Self {
        transform: true,
        scale: true,
        released: false,
    };

    fn merge(&mut self, other: Self) {
        self.transform |= other.transform;
        self.scale |= other.scale;
        self.released |= other.released;
    }
}

/// Cached rig transform shared by every view attached to the rig.
#[derive(Debug)]
pub struct ViewPlatformInfo {
    id: RigId,
    loaded: bool,
    local_to_world: Mat4,
    world_to_local: Mat4,
    world_scale: f64,
    subscribers: BTreeMap<ViewId, RigChanges>,
}

impl ViewPlatformInfo {
    /// Empty cache for rig `id`.
    pub fn new(id: RigId) -> Self {
        Self {
            id,
            loaded: false,
            local_to_world: Mat4::identity(),
            world_to_local: Mat4::identity(),
            world_scale: 1.0,
            subscribers: BTreeMap::new(),
        }
    }

    /// Rig this cache belongs to.
    pub fn id(&self) -> RigId {
        self.id
    }

    /// Cached rig-to-world transform.
    pub fn local_to_world(&self) -> Mat4 {
        self.local_to_world
    }

    /// Cached world-to-rig transform.
    pub fn world_to_local(&self) -> Mat4 {
        self.world_to_local
    }

    /// Uniform scale of world-to-rig.
    pub fn world_scale(&self) -> f64 {
        self.world_scale
    }

    /// Re-reads the rig transform and notifies subscribed views.
    ///
    /// # Errors
    /// [`ViewError::PlatformReadDenied`] when the rig does not grant read
    /// access, [`ViewError::SingularTransform`] when local-to-world cannot be
    /// inverted.
    pub fn refresh(&mut self, platform: &ViewPlatform) -> ViewResult<RigChanges> {
        if !platform.allow_local_to_world_read {
            return Err(ViewError::PlatformReadDenied(self.id));
        }
        let world_to_local = platform
            .local_to_world
            .inverse()
            .ok_or(ViewError::SingularTransform("view platform local-to-world"))?;
        let scale = world_to_local.scale_factor();
        let changes = if self.loaded {
            RigChanges {
                transform: platform.local_to_world != self.local_to_world,
                scale: (scale - self.world_scale).abs() > SCALE_TOLERANCE,
                released: false,
            }
        } else {
            RigChanges::ALL
        };
        if changes.transform || changes.scale {
            debug!(rig = %self.id, scale, ?changes, "rig changed");
            for mailbox in self.subscribers.values_mut() {
                mailbox.merge(changes);
            }
        }
        self.local_to_world = platform.local_to_world;
        self.world_to_local = world_to_local;
        if changes.scale {
            self.world_scale = scale;
        }
        self.loaded = true;
        Ok(changes)
    }

    /// Subscribes view `owner`; a new subscription starts with everything pending.
    pub fn register_view(&mut self, owner: ViewId) {
        self.subscribers.entry(owner).or_insert(RigChanges::ALL);
    }

    /// Drops the subscription of `owner`.
    pub fn unregister_view(&mut self, owner: ViewId) {
        self.subscribers.remove(&owner);
    }

    /// Takes and resets the pending changes for `owner`.
    pub fn take_changes(&mut self, owner: ViewId) -> RigChanges {
        self.subscribers
            .get_mut(&owner)
            .map(core::mem::take)
            .unwrap_or_default()
    }

    /// Number of subscribed views.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Flags every subscribed view for a full rebuild.
    pub fn release(&mut self) {
        debug!(rig = %self.id, subscribers = self.subscribers.len(), "rig cache released");
        for mailbox in self.subscribers.values_mut() {
            mailbox.released = true;
        }
        self.loaded = false;
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn scale_is_taken_from_the_inverse() {
        let mut rig = ViewPlatform::new(RigId(0));
        rig.local_to_world = Mat4::translation(1.0, 2.0, 3.0) * Mat4::uniform_scale(4.0);
        let mut info = ViewPlatformInfo::new(RigId(0));
        info.refresh(&rig).unwrap();
        assert!((info.world_scale() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn tiny_scale_drift_only_flags_the_transform() {
        let mut rig = ViewPlatform::new(RigId(0));
        let mut info = ViewPlatformInfo::new(RigId(0));
        info.register_view(ViewId(3));
        info.refresh(&rig).unwrap();
        let _ = info.take_changes(ViewId(3));

        rig.local_to_world = Mat4::uniform_scale(1.0 + 1e-9);
        let changes = info.refresh(&rig).unwrap();
        assert!(changes.transform);
        assert!(!changes.scale);

        rig.local_to_world = Mat4::uniform_scale(2.0);
        assert!(info.refresh(&rig).unwrap().scale);
        let pending = info.take_changes(ViewId(3));
        assert!(pending.transform && pending.scale);
    }

    #[test]
    fn read_permission_is_enforced() {
        let mut rig = ViewPlatform::new(RigId(5));
        rig.allow_local_to_world_read = false;
        let mut info = ViewPlatformInfo::new(RigId(5));
        assert_eq!(info.refresh(&rig), Err(ViewError::PlatformReadDenied(RigId(5))));
    }

    #[test]
    fn singular_rig_is_rejected() {
        let mut rig = ViewPlatform::new(RigId(0));
        rig.local_to_world = Mat4::uniform_scale(0.0);
        let mut info = ViewPlatformInfo::new(RigId(0));
        assert!(matches!(info.refresh(&rig), Err(ViewError::SingularTransform(_))));
    }
}
