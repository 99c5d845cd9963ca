// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Errors reported by view caches.

use thiserror::Error;

use crate::host::{CanvasId, RigId, ScreenId};

/// Failure to produce a view-dependent transform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    /// The canvas is not attached to the view.
    #[error("{0} is not attached to this view")]
    CanvasNotAttached(CanvasId),
    /// A world-space query was made on a view with no view platform.
    #[error("view has no view platform")]
    NoViewPlatform,
    /// The scene graph does not permit reading the rig's local-to-world transform.
    #[error("local-to-world read denied for {0}")]
    PlatformReadDenied(RigId),
    /// A transform that must be inverted was singular.
    #[error("singular transform: {0}")]
    SingularTransform(&'static str),
    /// The screen id is too large for the cache arena.
    #[error("{0} is past the cache arena limit")]
    ScreenIdOutOfRange(ScreenId),
    /// The rig id is too large for the cache arena.
    #[error("{0} is past the cache arena limit")]
    RigIdOutOfRange(RigId),
}

/// Result alias for view queries.
pub type ViewResult<T> = Result<T, ViewError>;
