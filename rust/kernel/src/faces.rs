// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polygonal faces with holes.
//!
//! Two levels of identity are involved:
//!
//! - a [`FacePoint`] is a logical location that several faces may share;
//! - a vertex is one face's private copy of that location in the render
//!   buffer, so each face carries its own normal and color even at a shared
//!   corner.
//!
//! Points own nothing: `FacePoint::vertices`, `FacePoint::faces` and the
//! vertex → face map are plain back-references kept in step with every
//! mutation. Triangles live in one index buffer shared by all faces; it is
//! rebuilt whenever vertex removal compacts the vertex buffer.

use std::collections::BTreeMap;

use nalgebra::{Matrix4, Vector3};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::{Color, KernelConfig};
use crate::error::{Error, Result};
use crate::selector::Selector;
use crate::triangulation::{area_normal, triangulate_rings};
use crate::vector::{from_f32, to_f32, to_vector, transform_point};
use crate::vertices::Vertices;
use crate::{Coordinates, Id};

pub const NORMAL: &str = "normal";

/// A shared logical location.
#[derive(Debug, Clone, PartialEq)]
pub struct FacePoint {
    pub id: Id,
    pub coordinates: Coordinates,
    /// Private vertices of the faces using this point.
    pub vertices: FxHashSet<Id>,
    /// Faces using this point, as outer ring or hole.
    pub faces: FxHashSet<Id>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hole {
    pub id: Id,
    pub points: Vec<Id>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    pub id: Id,
    /// Outer ring in order.
    pub points: Vec<Id>,
    /// Holes by id; ids are sequential so iteration follows declaration order.
    pub holes: BTreeMap<Id, Hole>,
    /// Private vertices of this face, holes included.
    pub vertices: FxHashSet<Id>,
}

impl Face {
    /// Outer and hole point ids.
    pub fn all_points(&self) -> impl Iterator<Item = Id> + '_ {
        self.points
            .iter()
            .chain(self.holes.values().flat_map(|h| h.points.iter()))
            .copied()
    }
}

#[derive(Debug, Clone)]
pub struct Faces {
    pub vertices: Vertices,
    index: Vec<u32>,
    list: FxHashMap<Id, Face>,
    points: FxHashMap<Id, FacePoint>,
    vertex_face_map: FxHashMap<Id, Id>,
    next_face: Id,
    next_point: Id,
    next_hole: Id,
    selector: Selector,
    point_selector: Selector,
}

impl Default for Faces {
    fn default() -> Self {
        Self::new()
    }
}

impl Faces {
    pub fn new() -> Self {
        Self::with_config(&KernelConfig::default())
    }

    pub fn with_config(config: &KernelConfig) -> Self {
        let mut vertices = Vertices::with_colors(config, config.face_color, config.face_select_color);
        vertices.buffers_mut().create_attribute(NORMAL);
        Self {
            vertices,
            index: Vec::new(),
            list: FxHashMap::default(),
            points: FxHashMap::default(),
            vertex_face_map: FxHashMap::default(),
            next_face: 0,
            next_point: 0,
            next_hole: 0,
            selector: Selector::new(),
            point_selector: Selector::new(),
        }
    }

    /// Creates points faces can be built from.
    pub fn add_points(&mut self, coordinates: &[Coordinates]) -> Vec<Id> {
        coordinates
            .iter()
            .map(|coords| {
                let id = self.next_point;
                self.next_point += 1;
                self.points.insert(
                    id,
                    FacePoint {
                        id,
                        coordinates: *coords,
                        vertices: FxHashSet::default(),
                        faces: FxHashSet::default(),
                    },
                );
                id
            })
            .collect()
    }

    /// Creates a face from an outer ring of point ids and optional hole rings.
    ///
    /// Holes with fewer than 3 points are ignored.
    pub fn add(&mut self, point_ids: &[Id], holes: &[Vec<Id>]) -> Result<Id> {
        if point_ids.len() < 3 {
            return Err(Error::DegenerateFace(point_ids.len()));
        }
        let outer = self.coordinates_of(point_ids)?;
        let holes: Vec<&Vec<Id>> = holes.iter().filter(|h| h.len() >= 3).collect();
        let mut hole_coords = Vec::with_capacity(holes.len());
        for hole in &holes {
            hole_coords.push(self.coordinates_of(hole)?);
        }

        let triangles = triangulate_rings(&outer, &hole_coords).inspect_err(|err| {
            tracing::warn!(points = point_ids.len(), holes = holes.len(), %err, "Face triangulation failed");
        })?;

        let id = self.next_face;
        self.next_face += 1;

        let mut face = Face {
            id,
            points: point_ids.to_vec(),
            holes: BTreeMap::new(),
            vertices: FxHashSet::default(),
        };
        for hole in &holes {
            let hole_id = self.next_hole;
            self.next_hole += 1;
            face.holes.insert(
                hole_id,
                Hole {
                    id: hole_id,
                    points: hole.to_vec(),
                },
            );
        }

        // Vertices are appended in ring order, so local triangle indices only
        // need shifting by the buffer index of the first new vertex.
        let offset = self.vertices.len() as u32;
        let ring_points: Vec<Id> = face.all_points().collect();
        let ring_coords: Vec<Coordinates> = outer.into_iter().chain(hole_coords.into_iter().flatten()).collect();
        let vertex_ids = self.vertices.add(&ring_coords);

        for (&point_id, &vertex_id) in ring_points.iter().zip(&vertex_ids) {
            if let Some(point) = self.points.get_mut(&point_id) {
                point.vertices.insert(vertex_id);
                point.faces.insert(id);
            }
            face.vertices.insert(vertex_id);
            self.vertex_face_map.insert(vertex_id, id);
        }

        self.index.extend(triangles.iter().map(|&i| i as u32 + offset));
        self.list.insert(id, face);
        self.update_normals([id]);

        tracing::trace!(face = id, triangles = triangles.len() / 3, "Added face");
        Ok(id)
    }

    fn coordinates_of(&self, point_ids: &[Id]) -> Result<Vec<Coordinates>> {
        point_ids
            .iter()
            .map(|id| {
                self.points
                    .get(id)
                    .map(|p| p.coordinates)
                    .ok_or(Error::PointNotFound(*id))
            })
            .collect()
    }

    /// Removes faces, their private vertices and their triangles. Points stay.
    pub fn remove(&mut self, ids: &[Id]) -> Result<()> {
        let mut doomed: FxHashSet<Id> = FxHashSet::default();
        for id in ids {
            let Some(face) = self.list.remove(id) else {
                continue;
            };
            for point_id in face.all_points() {
                if let Some(point) = self.points.get_mut(&point_id) {
                    point.faces.remove(id);
                    point.vertices.retain(|v| !face.vertices.contains(v));
                }
            }
            for vertex in &face.vertices {
                self.vertex_face_map.remove(vertex);
            }
            doomed.extend(face.vertices.iter().copied());
            self.selector.forget([*id]);
        }
        if doomed.is_empty() {
            return Ok(());
        }

        // Translate triangles to stable vertex ids before the vertex buffer
        // is compacted, then back to the new indices.
        let triangles: Vec<[Id; 3]> = self
            .index
            .chunks_exact(3)
            .filter_map(|t| {
                Some([
                    self.vertices.id_at(t[0] as usize)?,
                    self.vertices.id_at(t[1] as usize)?,
                    self.vertices.id_at(t[2] as usize)?,
                ])
            })
            .filter(|t| t.iter().all(|v| !doomed.contains(v)))
            .collect();

        let doomed: Vec<Id> = doomed.into_iter().collect();
        self.vertices.remove(Some(&doomed))?;

        self.index = triangles
            .iter()
            .flat_map(|t| t.iter().filter_map(|v| self.vertices.index_of(*v)).map(|i| i as u32))
            .collect();

        tracing::trace!(faces = ids.len(), vertices = doomed.len(), "Removed faces");
        Ok(())
    }

    /// Removes points and every face that uses them.
    pub fn remove_points(&mut self, ids: &[Id]) -> Result<()> {
        let mut faces: FxHashSet<Id> = FxHashSet::default();
        for id in ids {
            if let Some(point) = self.points.get(id) {
                faces.extend(point.faces.iter().copied());
            }
        }
        let faces: Vec<Id> = faces.into_iter().collect();
        self.remove(&faces)?;

        let mut stray = Vec::new();
        for id in ids {
            if let Some(point) = self.points.remove(id) {
                stray.extend(point.vertices);
            }
        }
        self.point_selector.forget(ids.iter().copied());
        if !stray.is_empty() {
            self.vertices.remove(Some(&stray))?;
        }
        Ok(())
    }

    /// Moves a point and each of its per-face vertices.
    pub fn set_point(&mut self, id: Id, coordinates: Coordinates) {
        let Some(point) = self.points.get_mut(&id) else {
            return;
        };
        point.coordinates = coordinates;
        let vertices: Vec<Id> = point.vertices.iter().copied().collect();
        let faces: Vec<Id> = point.faces.iter().copied().collect();
        let coords = vec![coordinates; vertices.len()];
        self.vertices.set(&vertices, &coords);
        self.update_normals(faces);
    }

    /// Applies `matrix` to every selected point and its vertices.
    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        let selected: Vec<Id> = self.point_selector.selected().iter().copied().collect();
        let mut faces: FxHashSet<Id> = FxHashSet::default();
        for id in selected {
            let Some(point) = self.points.get_mut(&id) else {
                continue;
            };
            point.coordinates = transform_point(matrix, point.coordinates);
            faces.extend(point.faces.iter().copied());
            let vertices: Vec<Id> = point.vertices.iter().copied().collect();
            let coords = vec![point.coordinates; vertices.len()];
            self.vertices.set(&vertices, &coords);
        }
        self.update_normals(faces);
    }

    /// Selects faces (all when `ids` is `None`) together with their points.
    pub fn select(&mut self, active: bool, ids: Option<&[Id]>) -> Vec<Id> {
        let targets: Vec<Id> = match ids {
            Some(ids) => ids.to_vec(),
            None => self.list.keys().copied().collect(),
        };
        let changed = self.selector.select(active, targets, self.list.keys().copied());

        let mut vertices = Vec::new();
        let mut points = Vec::new();
        for id in &changed {
            if let Some(face) = self.list.get(id) {
                vertices.extend(face.vertices.iter().copied());
                points.extend(face.all_points());
            }
        }
        let color = if active {
            self.vertices.select_color()
        } else {
            self.vertices.base_color()
        };
        self.vertices.paint(&vertices, color);
        self.point_selector.select(active, points, self.points.keys().copied());
        changed
    }

    /// Selects points (all when `ids` is `None`); selected points are what
    /// [`Faces::transform`] moves.
    pub fn select_points(&mut self, active: bool, ids: Option<&[Id]>) -> Vec<Id> {
        let targets: Vec<Id> = match ids {
            Some(ids) => ids.to_vec(),
            None => self.points.keys().copied().collect(),
        };
        self.point_selector.select(active, targets, self.points.keys().copied())
    }

    /// Resolves a picked triangle back to the face that owns it.
    pub fn get_from_index(&self, face_index: usize) -> Option<Id> {
        let first = *self.index.get(face_index * 3)?;
        let vertex = self.vertices.id_at(first as usize)?;
        self.vertex_face_map.get(&vertex).copied()
    }

    /// Centroid of the outer ring points.
    pub fn get_center(&self, id: Id) -> Option<Coordinates> {
        let face = self.list.get(&id)?;
        let coords = self.coordinates_of(&face.points).ok()?;
        let sum = coords.iter().fold(Vector3::zeros(), |acc, c| acc + to_vector(*c));
        let center = sum / coords.len() as f64;
        Some([center.x, center.y, center.z])
    }

    /// Normal of a face, read from one of its private vertices.
    pub fn get_normal(&self, id: Id) -> Option<Coordinates> {
        let face = self.list.get(&id)?;
        let vertex = face.vertices.iter().next()?;
        let index = self.vertices.index_of(*vertex)?;
        self.vertices.buffers().get(NORMAL, index).map(from_f32)
    }

    /// Writes each face's ring normal to its private vertices. Faces are
    /// planar, so only the faces whose points moved need recomputing.
    fn update_normals(&mut self, ids: impl IntoIterator<Item = Id>) {
        for id in ids {
            let Some(face) = self.list.get(&id) else {
                continue;
            };
            let Ok(ring) = self.coordinates_of(&face.points) else {
                continue;
            };
            let n = area_normal(&ring).try_normalize(1e-12).unwrap_or_else(Vector3::zeros);
            let indices: Vec<usize> = face.vertices.iter().filter_map(|v| self.vertices.index_of(*v)).collect();
            let buffers = self.vertices.buffers_mut();
            for index in indices {
                buffers.set(NORMAL, index, to_f32([n.x, n.y, n.z]));
            }
        }
    }

    pub fn face(&self, id: Id) -> Option<&Face> {
        self.list.get(&id)
    }

    pub fn list(&self) -> &FxHashMap<Id, Face> {
        &self.list
    }

    pub fn point(&self, id: Id) -> Option<&FacePoint> {
        self.points.get(&id)
    }

    pub fn points(&self) -> &FxHashMap<Id, FacePoint> {
        &self.points
    }

    pub fn get_point(&self, id: Id) -> Option<Coordinates> {
        self.points.get(&id).map(|p| p.coordinates)
    }

    /// Outer ring coordinates of a face.
    pub fn face_coordinates(&self, id: Id) -> Option<Vec<Coordinates>> {
        let face = self.list.get(&id)?;
        self.coordinates_of(&face.points).ok()
    }

    /// Triangle list over the vertex buffer.
    pub fn index(&self) -> &[u32] {
        &self.index
    }

    pub fn triangle_count(&self) -> usize {
        self.index.len() / 3
    }

    pub fn is_selected(&self, id: Id) -> bool {
        self.selector.is_selected(id)
    }

    pub fn selected_points(&self) -> &FxHashSet<Id> {
        self.point_selector.selected()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn set_base_color(&mut self, color: Color) {
        // Face selection is tracked here, not per vertex, so repaint the
        // selected faces after the vertex-level recolor.
        self.vertices.set_base_color(color);
        let selected: Vec<Id> = self
            .list
            .values()
            .filter(|f| self.selector.is_selected(f.id))
            .flat_map(|f| f.vertices.iter().copied())
            .collect();
        let select_color = self.vertices.select_color();
        self.vertices.paint(&selected, select_color);
    }

    pub fn set_select_color(&mut self, color: Color) {
        self.vertices.set_select_color(color);
        let selected: Vec<Id> = self
            .list
            .values()
            .filter(|f| self.selector.is_selected(f.id))
            .flat_map(|f| f.vertices.iter().copied())
            .collect();
        self.vertices.paint(&selected, color);
    }
}
