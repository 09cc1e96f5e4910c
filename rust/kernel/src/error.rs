// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for kernel operations.
//!
//! Only invariant violations and invalid construction requests are errors.
//! Unknown IDs handed to getters, setters and removers are not: getters
//! return `None` and mutators skip them.

use crate::Id;

/// Result type alias for kernel operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while editing geometry.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Removal was attempted on an id/index map that holds no ids.
    #[error("cannot remove id {0}: the id/index map is empty")]
    EmptyIdIndexMap(Id),

    /// A referenced point does not exist.
    #[error("point not found: {0}")]
    PointNotFound(Id),

    /// A referenced line does not exist.
    #[error("line not found: {0}")]
    LineNotFound(Id),

    /// A referenced face does not exist.
    #[error("face not found: {0}")]
    FaceNotFound(Id),

    /// A referenced extrusion does not exist.
    #[error("extrusion not found: {0}")]
    ExtrusionNotFound(Id),

    /// A referenced offset face (wall axis) does not exist.
    #[error("offset face not found: {0}")]
    OffsetFaceNotFound(Id),

    /// A referenced polyline does not exist.
    #[error("polyline not found: {0}")]
    PolylineNotFound(Id),

    /// A face needs at least 3 outer points.
    #[error("face outer ring has {0} points, at least 3 are required")]
    DegenerateFace(usize),

    /// The ear-clipping triangulator rejected the polygon.
    #[error("triangulation failed: {0}")]
    Triangulation(String),

    /// A raycast was requested before any pointer ray was tracked.
    #[error("raycaster has no pointer ray: call `track` before casting")]
    RaycasterNotReady,

    /// Configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}
