// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pointer-driven editing gestures.
//!
//! Gestures never listen for input themselves. The embedding application
//! tracks the pointer ray on a [`Raycaster`](crate::raycast::Raycaster) and
//! feeds each [`InputEvent`] to the active gesture's `poll_input`.

pub mod planes;
pub mod polygons;

pub use planes::{Planes, TransformMode};
pub use polygons::{DrawState, Polygon, Polygons};

use crate::Id;

/// Pointer input, read against the raycaster's current ray.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    PointerMove,
    Click,
    Cancel,
}

/// What a polled event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The event did not apply to the current state.
    Ignored,
    /// A gesture began.
    Started,
    /// Speculative geometry changed.
    Updated,
    /// The gesture finished and produced or edited this entity.
    Committed(Id),
    /// The gesture was abandoned and its speculative geometry undone.
    Cancelled,
}
