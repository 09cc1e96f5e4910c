// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # BIM Editor Kernel
//!
//! Topological editing kernel for architectural elements.
//!
//! Entities are addressed by stable integer ids while their geometry lives in
//! dense, growable float buffers ready for upload to a renderer. On top of
//! the primitives (`Vertices`, `Lines`, `Faces`) sit parametric composites:
//! thick axis faces with mitered junctions (`OffsetFaces`), prisms
//! (`Extrusions`), and the architectural elements built from them (`Walls`,
//! `Slabs`). The `interaction` module holds the drawing and transform
//! gestures that drive the kernel from pointer input.

pub mod buffers;
pub mod config;
pub mod error;
pub mod extrusions;
pub mod faces;
pub mod id_index_map;
pub mod interaction;
pub mod knots;
pub mod lines;
pub mod offset_faces;
pub mod raycast;
pub mod selector;
pub mod slabs;
pub mod triangulation;
pub mod vector;
pub mod vertices;
pub mod walls;

/// Stable handle of an entity.
pub type Id = usize;

/// Position of an entity's data inside a dense buffer.
pub type Index = usize;

/// A location in 3D space.
pub type Coordinates = [f64; 3];

pub use buffers::{BufferAttribute, BufferManager};
pub use config::KernelConfig;
pub use error::{Error, Result};
pub use extrusions::{Extrusion, Extrusions};
pub use faces::{Face, FacePoint, Faces};
pub use id_index_map::IdIndexMap;
pub use lines::{Line, Lines};
pub use offset_faces::{OffsetFace, OffsetFaces};
pub use raycast::{Ray, RayHit, Raycaster, SceneRaycaster};
pub use selector::Selector;
pub use slabs::{Slab, Slabs};
pub use vertices::Vertices;
pub use walls::{Wall, Walls};

// Re-export nalgebra types used in the public API.
pub use nalgebra::{Matrix4, Point3, Vector3};
