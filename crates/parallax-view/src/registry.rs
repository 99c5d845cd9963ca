// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Caller-owned arena of shared screen and rig caches.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::error::{ViewError, ViewResult};
use crate::host::{RigId, ScreenId, ViewId};
use crate::platform_info::ViewPlatformInfo;
use crate::screen_info::ScreenInfo;

/// Shared screen cache handle.
pub type SharedScreenInfo = Arc<Mutex<ScreenInfo>>;
/// Shared rig cache handle.
pub type SharedPlatformInfo = Arc<Mutex<ViewPlatformInfo>>;

/// Locks a shared cache, recovering from poisoning.
pub fn lock<T>(handle: &Mutex<T>) -> MutexGuard<'_, T> {
    handle.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Largest number of screen (or rig) slots a registry holds. Ids index a
/// dense array, so they must stay below this.
pub const MAX_REGISTRY_IDS: u32 = 4096;

/// Dense arena of screen and rig caches indexed by their ids.
///
/// Entries are created on first reference and live until released. Views
/// created against the same registry share one cache per screen and rig.
#[derive(Debug, Default)]
pub struct InfoRegistry {
    screens: Mutex<Vec<Option<SharedScreenInfo>>>,
    platforms: Mutex<Vec<Option<SharedPlatformInfo>>>,
    next_view: AtomicU32,
}

fn slot<T>(slots: &mut Vec<Option<Arc<Mutex<T>>>>, index: usize, make: impl FnOnce() -> T) -> Arc<Mutex<T>> {
    if slots.len() <= index {
        slots.resize_with(index + 1, || None);
    }
    Arc::clone(slots[index].get_or_insert_with(|| Arc::new(Mutex::new(make()))))
}

impl InfoRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache for screen `id`, created on first use.
    ///
    /// # Errors
    /// [`ViewError::ScreenIdOutOfRange`] when `id` is not below
    /// [`MAX_REGISTRY_IDS`].
    pub fn screen_info(&self, id: ScreenId) -> ViewResult<SharedScreenInfo> {
        if id.0 >= MAX_REGISTRY_IDS {
            return Err(ViewError::ScreenIdOutOfRange(id));
        }
        Ok(slot(&mut lock(&self.screens), id.index(), || {
            debug!(screen = %id, "screen cache created");
            ScreenInfo::new(id)
        }))
    }

    /// Cache for rig `id`, created on first use.
    ///
    /// # Errors
    /// [`ViewError::RigIdOutOfRange`] when `id` is not below
    /// [`MAX_REGISTRY_IDS`].
    pub fn platform_info(&self, id: RigId) -> ViewResult<SharedPlatformInfo> {
        if id.0 >= MAX_REGISTRY_IDS {
            return Err(ViewError::RigIdOutOfRange(id));
        }
        Ok(slot(&mut lock(&self.platforms), id.index(), || {
            debug!(rig = %id, "rig cache created");
            ViewPlatformInfo::new(id)
        }))
    }

    /// Whether a cache exists for screen `id`.
    pub fn has_screen_info(&self, id: ScreenId) -> bool {
        lock(&self.screens).get(id.index()).is_some_and(Option::is_some)
    }

    /// Whether a cache exists for rig `id`.
    pub fn has_platform_info(&self, id: RigId) -> bool {
        lock(&self.platforms).get(id.index()).is_some_and(Option::is_some)
    }

    /// Drops the cache for screen `id`; every view using it rebuilds on its
    /// next query.
    pub fn release_screen(&self, id: ScreenId) {
        let released = lock(&self.screens).get_mut(id.index()).and_then(Option::take);
        if let Some(info) = released {
            lock(&info).release();
        }
    }

    /// Drops the cache for rig `id`; every view using it rebuilds on its next
    /// query.
    pub fn release_platform(&self, id: RigId) {
        let released = lock(&self.platforms).get_mut(id.index()).and_then(Option::take);
        if let Some(info) = released {
            lock(&info).release();
        }
    }

    /// Requests a re-read of screen `id` by whichever view next updates it.
    pub fn mark_screen_for_refresh(&self, id: ScreenId) {
        if let Some(info) = lock(&self.screens).get(id.index()).and_then(Option::as_ref) {
            lock(info).mark_for_refresh();
        }
    }

    pub(crate) fn allocate_view_id(&self) -> ViewId {
        ViewId(self.next_view.fetch_add(1, Ordering::Relaxed))
    }
}
