// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Thick lines: one rectangular face swept along each axis segment.
//!
//! For an axis `A → B` with width `w` and offset `o`, the horizontal normal is
//! `n = up × normalize(B - A)` and the corners are
//!
//! ```text
//! p1 = A + n·(o - w/2)    p2 = A + n·(o + w/2)
//! p4 = B + n·(o - w/2)    p3 = B + n·(o + w/2)
//! ```
//!
//! Axis endpoints shared by several axes are knots; see [`crate::knots`].

use nalgebra::Vector3;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::KernelConfig;
use crate::error::Result;
use crate::faces::Faces;
use crate::lines::Lines;
use crate::vector::{from_vector, to_vector, up};
use crate::{Coordinates, Id};

/// A rectangle generated from one axis. Shares its id with the axis line.
#[derive(Debug, Clone, PartialEq)]
pub struct OffsetFace {
    pub id: Id,
    pub width: f64,
    pub offset: f64,
    pub face: Id,
    /// `p1, p2, p3, p4`, owned by `face` alone.
    pub points: [Id; 4],
}

#[derive(Debug, Clone)]
pub struct OffsetFaces {
    pub axes: Lines,
    pub faces: Faces,
    pub(crate) list: FxHashMap<Id, OffsetFace>,
    /// Axis point id → filler face covering the junction, if any.
    pub(crate) knots: FxHashMap<Id, Option<Id>>,
    pub(crate) precision: f64,
}

impl Default for OffsetFaces {
    fn default() -> Self {
        Self::new()
    }
}

impl OffsetFaces {
    pub fn new() -> Self {
        Self::with_config(&KernelConfig::default())
    }

    pub fn with_config(config: &KernelConfig) -> Self {
        Self {
            axes: Lines::with_config(config),
            faces: Faces::with_config(config),
            list: FxHashMap::default(),
            knots: FxHashMap::default(),
            precision: config.precision,
        }
    }

    /// Creates axis points.
    pub fn add_points(&mut self, coordinates: &[Coordinates]) -> Vec<Id> {
        self.axes.add_points(coordinates)
    }

    /// Creates one axis per consecutive pair of `point_ids`, each with its
    /// rectangle, then resolves the touched knots. Returns the new axis ids.
    pub fn add(&mut self, point_ids: &[Id], width: f64, offset: f64) -> Result<Vec<Id>> {
        let ids = self.axes.add(point_ids);
        let mut knots = FxHashSet::default();

        for &id in &ids {
            let Some(corners) = self.rectangle(id, width, offset) else {
                continue;
            };
            let points = self.faces.add_points(&corners);
            let face = self.faces.add(&points, &[])?;
            self.list.insert(
                id,
                OffsetFace {
                    id,
                    width,
                    offset,
                    face,
                    points: [points[0], points[1], points[2], points[3]],
                },
            );
            if let Some(line) = self.axes.line(id) {
                knots.insert(line.start);
                knots.insert(line.end);
            }
        }

        self.update_knots(&knots)?;
        tracing::debug!(axes = ids.len(), width, offset, "Added offset faces");
        Ok(ids)
    }

    /// Axis endpoints, direction and horizontal normal.
    pub(crate) fn axis_frame(&self, id: Id) -> Option<AxisFrame> {
        let [start, end] = self.axes.get(id)?;
        let start = to_vector(start);
        let end = to_vector(end);
        let direction = (end - start).try_normalize(1e-12).unwrap_or_else(Vector3::x);
        let normal = up().cross(&direction);
        Some(AxisFrame {
            start,
            end,
            direction,
            normal,
        })
    }

    /// Plain rectangle corners `[p1, p2, p3, p4]` of an axis.
    pub fn rectangle(&self, id: Id, width: f64, offset: f64) -> Option<[Coordinates; 4]> {
        let frame = self.axis_frame(id)?;
        let near = frame.normal * (offset - width / 2.0);
        let far = frame.normal * (offset + width / 2.0);
        Some([
            from_vector(&(frame.start + near)),
            from_vector(&(frame.start + far)),
            from_vector(&(frame.end + far)),
            from_vector(&(frame.end + near)),
        ])
    }

    pub fn set_width(&mut self, ids: &[Id], width: f64) -> Result<()> {
        for id in ids {
            if let Some(face) = self.list.get_mut(id) {
                face.width = width;
            }
        }
        self.refresh(ids)
    }

    pub fn set_offset(&mut self, ids: &[Id], offset: f64) -> Result<()> {
        for id in ids {
            if let Some(face) = self.list.get_mut(id) {
                face.offset = offset;
            }
        }
        self.refresh(ids)
    }

    /// Moves an axis point, rebuilding every incident rectangle and the knots
    /// at both ends of each.
    pub fn set_point(&mut self, id: Id, coordinates: Coordinates) -> Result<()> {
        self.axes.set_point(id, coordinates);
        let axes: Vec<Id> = self
            .axes
            .point(id)
            .map(|adjacency| adjacency.all().collect())
            .unwrap_or_default();
        self.refresh(&axes)
    }

    /// Recomputes the rectangles of `ids` and the knots at their endpoints.
    pub(crate) fn refresh(&mut self, ids: &[Id]) -> Result<()> {
        let mut knots = FxHashSet::default();
        for id in ids {
            let Some(face) = self.list.get(id).cloned() else {
                continue;
            };
            let Some(corners) = self.rectangle(face.id, face.width, face.offset) else {
                continue;
            };
            for (point, coords) in face.points.iter().zip(corners) {
                self.faces.set_point(*point, coords);
            }
            if let Some(line) = self.axes.line(face.id) {
                knots.insert(line.start);
                knots.insert(line.end);
            }
        }
        self.update_knots(&knots)
    }

    /// Removes offset faces, their axes and rectangles, then re-resolves the
    /// knots they touched.
    pub fn remove(&mut self, ids: &[Id]) -> Result<()> {
        let mut knots = FxHashSet::default();
        let mut removed = Vec::with_capacity(ids.len());
        for id in ids {
            let Some(face) = self.list.remove(id) else {
                continue;
            };
            self.faces.remove_points(&face.points)?;
            if let Some(line) = self.axes.line(face.id) {
                knots.insert(line.start);
                knots.insert(line.end);
            }
            removed.push(face.id);
        }
        self.axes.remove(Some(&removed))?;
        self.update_knots(&knots)
    }

    /// Removes axis points, every offset face touching them and their knots.
    pub fn remove_points(&mut self, ids: &[Id]) -> Result<()> {
        let mut axes: FxHashSet<Id> = FxHashSet::default();
        for id in ids {
            if let Some(adjacency) = self.axes.point(*id) {
                axes.extend(adjacency.all());
            }
        }
        let axes: Vec<Id> = axes.into_iter().collect();
        self.remove(&axes)?;
        for id in ids {
            self.remove_knot(*id)?;
        }
        self.axes.remove_points(Some(ids))
    }

    pub fn get(&self, id: Id) -> Option<&OffsetFace> {
        self.list.get(&id)
    }

    pub fn list(&self) -> &FxHashMap<Id, OffsetFace> {
        &self.list
    }

    /// Filler face of a knot. `None` when the point is not a knot, `Some(None)`
    /// when the knot needs no filler.
    pub fn knot(&self, id: Id) -> Option<Option<Id>> {
        self.knots.get(&id).copied()
    }

    pub fn knots(&self) -> &FxHashMap<Id, Option<Id>> {
        &self.knots
    }

    /// Current corner coordinates `[p1, p2, p3, p4]`.
    pub fn corners(&self, id: Id) -> Option<[Coordinates; 4]> {
        let face = self.list.get(&id)?;
        let [a, b, c, d] = face.points;
        Some([
            self.faces.get_point(a)?,
            self.faces.get_point(b)?,
            self.faces.get_point(c)?,
            self.faces.get_point(d)?,
        ])
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

/// Geometry of an axis segment.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AxisFrame {
    pub start: Vector3<f64>,
    pub end: Vector3<f64>,
    pub direction: Vector3<f64>,
    pub normal: Vector3<f64>,
}
