// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Generalized prisms: a base face swept along a path line.

use std::collections::BTreeMap;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::KernelConfig;
use crate::error::{Error, Result};
use crate::faces::Faces;
use crate::lines::Lines;
use crate::vector::{from_vector, to_vector};
use crate::{Coordinates, Id};

/// A hole carried from the base face to the top face.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtrusionHole {
    /// Hole id inside the base face.
    pub base: Id,
    /// Hole id inside the top face.
    pub top: Id,
    /// Side faces lining the hole.
    pub faces: FxHashSet<Id>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extrusion {
    pub id: Id,
    pub base_face: Id,
    pub path: Id,
    pub top_face: Id,
    pub side_faces: FxHashSet<Id>,
    /// Keyed by base hole id, in declaration order.
    pub holes: BTreeMap<Id, ExtrusionHole>,
}

impl Extrusion {
    /// Base, top, side and hole side faces.
    pub fn all_faces(&self) -> impl Iterator<Item = Id> + '_ {
        [self.base_face, self.top_face]
            .into_iter()
            .chain(self.side_faces.iter().copied())
            .chain(self.holes.values().flat_map(|h| h.faces.iter().copied()))
    }
}

#[derive(Debug, Clone)]
pub struct Extrusions {
    pub faces: Faces,
    pub lines: Lines,
    list: FxHashMap<Id, Extrusion>,
    face_extrusion_map: FxHashMap<Id, Id>,
    next: Id,
}

impl Default for Extrusions {
    fn default() -> Self {
        Self::new()
    }
}

impl Extrusions {
    pub fn new() -> Self {
        Self::with_config(&KernelConfig::default())
    }

    pub fn with_config(config: &KernelConfig) -> Self {
        Self {
            faces: Faces::with_config(config),
            lines: Lines::with_config(config),
            list: FxHashMap::default(),
            face_extrusion_map: FxHashMap::default(),
            next: 0,
        }
    }

    /// Sweeps `face_id` along the `path_id` line.
    ///
    /// The top face is the base face translated by `end - start` of the path,
    /// with its holes created in the same order as the base holes. Each edge
    /// of the outer ring and of every hole ring gets one quad side face.
    pub fn add(&mut self, face_id: Id, path_id: Id) -> Result<Id> {
        let base = self.faces.face(face_id).cloned().ok_or(Error::FaceNotFound(face_id))?;
        let [start, end] = self.lines.get(path_id).ok_or(Error::LineNotFound(path_id))?;
        let vector = to_vector(end) - to_vector(start);

        let translate = |faces: &mut Faces, ring: &[Id]| -> Result<Vec<Id>> {
            let mut moved = Vec::with_capacity(ring.len());
            for id in ring {
                let coords = faces.get_point(*id).ok_or(Error::PointNotFound(*id))?;
                moved.push(from_vector(&(to_vector(coords) + vector)));
            }
            Ok(faces.add_points(&moved))
        };

        let top_points = translate(&mut self.faces, &base.points)?;
        let mut top_holes = Vec::with_capacity(base.holes.len());
        for hole in base.holes.values() {
            top_holes.push(translate(&mut self.faces, &hole.points)?);
        }
        let top_face = self.faces.add(&top_points, &top_holes)?;

        let side_faces = self.add_sides(&base.points, &top_points)?;

        let top_hole_ids: Vec<Id> = self
            .faces
            .face(top_face)
            .map(|f| f.holes.keys().copied().collect())
            .unwrap_or_default();
        let mut holes = BTreeMap::new();
        for ((base_hole, hole), (top_hole, top_ring)) in base.holes.iter().zip(top_hole_ids.iter().zip(&top_holes)) {
            let faces = self.add_sides(&hole.points, top_ring)?;
            holes.insert(
                *base_hole,
                ExtrusionHole {
                    base: *base_hole,
                    top: *top_hole,
                    faces,
                },
            );
        }

        let id = self.next;
        self.next += 1;
        let extrusion = Extrusion {
            id,
            base_face: face_id,
            path: path_id,
            top_face,
            side_faces,
            holes,
        };
        for face in extrusion.all_faces() {
            self.face_extrusion_map.insert(face, id);
        }
        tracing::debug!(
            extrusion = id,
            base_face = face_id,
            sides = extrusion.side_faces.len(),
            holes = extrusion.holes.len(),
            "Added extrusion"
        );
        self.list.insert(id, extrusion);
        Ok(id)
    }

    /// One quad per edge between two rings of equal length, wrapping around.
    fn add_sides(&mut self, base: &[Id], top: &[Id]) -> Result<FxHashSet<Id>> {
        let mut sides = FxHashSet::default();
        let n = base.len().min(top.len());
        for i in 0..n {
            let j = (i + 1) % n;
            let face = self.faces.add(&[base[i], base[j], top[j], top[i]], &[])?;
            sides.insert(face);
        }
        Ok(sides)
    }

    /// Removes extrusions with every face and point they are made of. Path
    /// lines belong to the caller and are kept.
    pub fn remove(&mut self, ids: &[Id]) -> Result<()> {
        let mut points: FxHashSet<Id> = FxHashSet::default();
        for id in ids {
            let Some(extrusion) = self.list.remove(id) else {
                continue;
            };
            for face in extrusion.all_faces() {
                self.face_extrusion_map.remove(&face);
                if let Some(face) = self.faces.face(face) {
                    points.extend(face.all_points());
                }
            }
        }
        let points: Vec<Id> = points.into_iter().collect();
        self.faces.remove_points(&points)
    }

    /// Extrusion owning a base, top or side face.
    pub fn get_from_face(&self, face_id: Id) -> Option<Id> {
        self.face_extrusion_map.get(&face_id).copied()
    }

    pub fn get(&self, id: Id) -> Option<&Extrusion> {
        self.list.get(&id)
    }

    pub fn list(&self) -> &FxHashMap<Id, Extrusion> {
        &self.list
    }

    /// Outer ring coordinates of the top face.
    pub fn top_coordinates(&self, id: Id) -> Option<Vec<Coordinates>> {
        let extrusion = self.list.get(&id)?;
        self.faces.face_coordinates(extrusion.top_face)
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(extrusions: &mut Extrusions, holes: bool) -> Id {
        let outer = extrusions
            .faces
            .add_points(&[[0.0, 0.0, 0.0], [4.0, 0.0, 0.0], [4.0, 0.0, 4.0], [0.0, 0.0, 4.0]]);
        let hole_rings = if holes {
            vec![extrusions
                .faces
                .add_points(&[[1.0, 0.0, 1.0], [2.0, 0.0, 1.0], [2.0, 0.0, 2.0], [1.0, 0.0, 2.0]])]
        } else {
            Vec::new()
        };
        extrusions.faces.add(&outer, &hole_rings).unwrap()
    }

    fn vertical(extrusions: &mut Extrusions, height: f64) -> Id {
        let p = extrusions.lines.add_points(&[[0.0, 0.0, 0.0], [0.0, height, 0.0]]);
        extrusions.lines.add(&p)[0]
    }

    #[test]
    fn prism_top_is_translated_base() {
        let mut extrusions = Extrusions::new();
        let base = square(&mut extrusions, false);
        let path = vertical(&mut extrusions, 2.5);
        let id = extrusions.add(base, path).unwrap();

        let extrusion = extrusions.get(id).unwrap().clone();
        assert_eq!(extrusion.side_faces.len(), 4);

        let base_coords = extrusions.faces.face_coordinates(base).unwrap();
        let top_coords = extrusions.top_coordinates(id).unwrap();
        for (b, t) in base_coords.iter().zip(&top_coords) {
            assert_relative_eq!(t[0], b[0]);
            assert_relative_eq!(t[1], b[1] + 2.5);
            assert_relative_eq!(t[2], b[2]);
        }
    }

    #[test]
    fn holes_are_carried_to_the_top() {
        let mut extrusions = Extrusions::new();
        let base = square(&mut extrusions, true);
        let path = vertical(&mut extrusions, 1.0);
        let id = extrusions.add(base, path).unwrap();

        let extrusion = extrusions.get(id).unwrap();
        assert_eq!(extrusion.holes.len(), 1);
        let hole = extrusion.holes.values().next().unwrap();
        assert_eq!(hole.faces.len(), 4);

        let top = extrusions.faces.face(extrusion.top_face).unwrap();
        assert!(top.holes.contains_key(&hole.top));
        let top_hole = &top.holes[&hole.top];
        let first = extrusions.faces.get_point(top_hole.points[0]).unwrap();
        assert_relative_eq!(first[1], 1.0);
        // 4 outer sides, 4 hole sides, base and top
        assert_eq!(extrusions.faces.len(), 10);
    }

    #[test]
    fn every_face_resolves_to_its_extrusion() {
        let mut extrusions = Extrusions::new();
        let base = square(&mut extrusions, true);
        let path = vertical(&mut extrusions, 1.0);
        let id = extrusions.add(base, path).unwrap();

        let faces: Vec<Id> = extrusions.get(id).unwrap().all_faces().collect();
        assert_eq!(faces.len(), 10);
        for face in faces {
            assert_eq!(extrusions.get_from_face(face), Some(id));
        }
    }

    #[test]
    fn remove_frees_faces_and_points_but_keeps_the_path() {
        let mut extrusions = Extrusions::new();
        let base = square(&mut extrusions, true);
        let path = vertical(&mut extrusions, 1.0);
        let id = extrusions.add(base, path).unwrap();

        extrusions.remove(&[id]).unwrap();
        assert!(extrusions.is_empty());
        assert!(extrusions.faces.is_empty());
        assert!(extrusions.faces.points().is_empty());
        assert_eq!(extrusions.faces.vertices.len(), 0);
        assert_eq!(extrusions.get_from_face(base), None);
        assert!(extrusions.lines.line(path).is_some());
    }

    #[test]
    fn missing_references_are_errors() {
        let mut extrusions = Extrusions::new();
        let path = vertical(&mut extrusions, 1.0);
        assert!(matches!(extrusions.add(42, path), Err(Error::FaceNotFound(42))));

        let base = square(&mut extrusions, false);
        assert!(matches!(extrusions.add(base, 42), Err(Error::LineNotFound(42))));
    }
}
