// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Slabs: closed polylines extruded vertically.
//!
//! Among a slab's polylines the one with the largest bounding box perimeter
//! is the outline and the others are holes.

use rustc_hash::FxHashMap;

use crate::config::KernelConfig;
use crate::error::{Error, Result};
use crate::extrusions::Extrusions;
use crate::lines::Lines;
use crate::vector::{from_vector, to_vector, up};
use crate::{Coordinates, Id};

/// A closed loop of outline lines, in traversal order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Polyline {
    pub id: Id,
    pub lines: Vec<Id>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slab {
    pub id: Id,
    /// Vertical line whose length is the slab thickness.
    pub direction: Id,
    pub polylines: Vec<Id>,
    pub extrusion: Option<Id>,
}

#[derive(Debug, Clone)]
pub struct Slabs {
    /// Outline sketch the polylines are drawn with.
    pub lines: Lines,
    pub extrusions: Extrusions,
    polylines: FxHashMap<Id, Polyline>,
    list: FxHashMap<Id, Slab>,
    extrusion_slabs: FxHashMap<Id, Id>,
    next_polyline: Id,
    next_slab: Id,
    height: f64,
}

impl Default for Slabs {
    fn default() -> Self {
        Self::new()
    }
}

impl Slabs {
    pub fn new() -> Self {
        Self::with_config(&KernelConfig::default())
    }

    pub fn with_config(config: &KernelConfig) -> Self {
        Self {
            lines: Lines::with_config(config),
            extrusions: Extrusions::with_config(config),
            polylines: FxHashMap::default(),
            list: FxHashMap::default(),
            extrusion_slabs: FxHashMap::default(),
            next_polyline: 0,
            next_slab: 0,
            height: config.slab_height,
        }
    }

    pub fn add_points(&mut self, coordinates: &[Coordinates]) -> Vec<Id> {
        self.lines.add_points(coordinates)
    }

    /// Connects `point_ids` into a closed loop.
    pub fn add_polyline(&mut self, point_ids: &[Id]) -> Result<Id> {
        if point_ids.len() < 3 {
            return Err(Error::DegenerateFace(point_ids.len()));
        }
        if let Some(missing) = point_ids.iter().find(|p| self.lines.point(**p).is_none()) {
            return Err(Error::PointNotFound(*missing));
        }

        let mut closed = point_ids.to_vec();
        closed.push(point_ids[0]);
        let lines = self.lines.add(&closed);

        let id = self.next_polyline;
        self.next_polyline += 1;
        self.polylines.insert(id, Polyline { id, lines });
        Ok(id)
    }

    /// Creates a slab from polylines, `height` thick (the configured slab
    /// height when `None`).
    pub fn add(&mut self, polylines: &[Id], height: Option<f64>) -> Result<Id> {
        if let Some(missing) = polylines.iter().find(|p| !self.polylines.contains_key(*p)) {
            return Err(Error::PolylineNotFound(*missing));
        }
        let height = height.unwrap_or(self.height);
        let points = self
            .extrusions
            .lines
            .add_points(&[[0.0, 0.0, 0.0], from_vector(&(up() * height))]);
        let direction = self
            .extrusions
            .lines
            .add(&points)
            .first()
            .copied()
            .ok_or(Error::LineNotFound(self.next_slab))?;

        let id = self.next_slab;
        self.next_slab += 1;
        self.list.insert(
            id,
            Slab {
                id,
                direction,
                polylines: polylines.to_vec(),
                extrusion: None,
            },
        );
        self.regenerate(&[id])?;
        Ok(id)
    }

    /// Rebuilds slab solids from their current polylines and direction.
    pub fn regenerate(&mut self, ids: &[Id]) -> Result<()> {
        for id in ids {
            let Some(slab) = self.list.get(id).cloned() else {
                continue;
            };
            if let Some(extrusion) = slab.extrusion {
                self.extrusion_slabs.remove(&extrusion);
                self.extrusions.remove(&[extrusion])?;
            }

            let outline = self.get_outline(*id).ok_or(Error::PolylineNotFound(*id))?;
            let outer = self.ring(outline).ok_or(Error::PolylineNotFound(outline))?;
            let holes: Vec<Vec<Coordinates>> = slab
                .polylines
                .iter()
                .filter(|p| **p != outline)
                .filter_map(|p| self.ring(*p))
                .collect();

            let faces = &mut self.extrusions.faces;
            let outer_points = faces.add_points(&outer);
            let hole_points: Vec<Vec<Id>> = holes.iter().map(|ring| faces.add_points(ring)).collect();
            let face = faces.add(&outer_points, &hole_points)?;
            let extrusion = self.extrusions.add(face, slab.direction)?;

            self.extrusion_slabs.insert(extrusion, *id);
            if let Some(slab) = self.list.get_mut(id) {
                slab.extrusion = Some(extrusion);
            }
            tracing::debug!(slab = id, holes = holes.len(), extrusion, "Regenerated slab");
        }
        Ok(())
    }

    /// Point coordinates of a polyline, following each line to the next one
    /// starting at its end.
    fn ring(&self, polyline: Id) -> Option<Vec<Coordinates>> {
        let polyline = self.polylines.get(&polyline)?;
        let by_start: FxHashMap<Id, Id> = polyline
            .lines
            .iter()
            .filter_map(|id| self.lines.line(*id))
            .map(|line| (line.start, line.end))
            .collect();

        let first = self.lines.line(*polyline.lines.first()?)?.start;
        let mut ring = Vec::with_capacity(by_start.len());
        let mut current = first;
        for _ in 0..by_start.len() {
            ring.push(self.lines.vertices.get(current)?);
            current = *by_start.get(&current)?;
            if current == first {
                break;
            }
        }
        Some(ring)
    }

    /// The polyline of a slab with the largest bounding box perimeter.
    pub fn get_outline(&self, id: Id) -> Option<Id> {
        let slab = self.list.get(&id)?;
        slab.polylines
            .iter()
            .filter_map(|p| {
                let ring = self.ring(*p)?;
                Some((*p, bounding_perimeter(&ring)))
            })
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(p, _)| p)
    }

    /// Resolves a picked triangle of the solids' index buffer to its slab.
    pub fn get_from_index(&self, face_index: usize) -> Option<Id> {
        let face = self.extrusions.faces.get_from_index(face_index)?;
        let extrusion = self.extrusions.get_from_face(face)?;
        self.extrusion_slabs.get(&extrusion).copied()
    }

    pub fn set_height(&mut self, ids: &[Id], height: f64) -> Result<()> {
        for id in ids {
            let Some(slab) = self.list.get(id) else {
                continue;
            };
            let Some(line) = self.extrusions.lines.line(slab.direction).copied() else {
                continue;
            };
            let Some(start) = self.extrusions.lines.vertices.get(line.start) else {
                continue;
            };
            let end = to_vector(start) + up() * height;
            self.extrusions.lines.set_point(line.end, from_vector(&end));
        }
        self.regenerate(ids)
    }

    /// Removes slabs with their solids and directions. Polylines stay.
    pub fn remove(&mut self, ids: &[Id]) -> Result<()> {
        for id in ids {
            let Some(slab) = self.list.remove(id) else {
                continue;
            };
            if let Some(extrusion) = slab.extrusion {
                self.extrusion_slabs.remove(&extrusion);
                self.extrusions.remove(&[extrusion])?;
            }
            if let Some(line) = self.extrusions.lines.line(slab.direction).copied() {
                self.extrusions.lines.remove_points(Some(&[line.start, line.end]))?;
            }
        }
        Ok(())
    }

    pub fn get(&self, id: Id) -> Option<&Slab> {
        self.list.get(&id)
    }

    pub fn list(&self) -> &FxHashMap<Id, Slab> {
        &self.list
    }

    pub fn polyline(&self, id: Id) -> Option<&Polyline> {
        self.polylines.get(&id)
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

/// `|Δx| + |Δy| + |Δz|` of the axis-aligned bounding box.
fn bounding_perimeter(points: &[Coordinates]) -> f64 {
    let mut min = [f64::INFINITY; 3];
    let mut max = [f64::NEG_INFINITY; 3];
    for p in points {
        for i in 0..3 {
            min[i] = min[i].min(p[i]);
            max[i] = max[i].max(p[i]);
        }
    }
    (0..3).map(|i| (max[i] - min[i]).abs()).sum()
}
