// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Walls: offset-face footprints lifted into solids.
//!
//! A wall is extruded sideways rather than upwards. Its base face is the
//! vertical rectangle standing on the `p1 → p4` edge of the footprint, and
//! the extrusion path runs from `p1` along the footprint normal for one wall
//! width. The opposite face is then pinned onto the `p2 → p3` edge so mitered
//! footprints stay closed. Holes (doors, windows) are rings in the base face
//! and ride along when the footprint moves. Knot filler faces are extruded
//! upwards along the shared vertical axis.

use std::collections::BTreeMap;

use nalgebra::Vector3;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::KernelConfig;
use crate::error::{Error, Result};
use crate::extrusions::Extrusions;
use crate::offset_faces::OffsetFaces;
use crate::vector::{from_vector, to_vector, up};
use crate::{Coordinates, Id};

/// Hole rings of one opening: points in the base face and their
/// counterparts in the opposite face.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WallHole {
    pub base_points: Vec<Id>,
    pub top_points: Vec<Id>,
}

/// A wall shares its id with its offset face (and axis line).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wall {
    pub id: Id,
    pub extrusion: Id,
    /// Horizontal extrusion path, `p1 → p1 + normal·width`.
    pub path: Id,
    pub holes: BTreeMap<Id, WallHole>,
}

/// Solid filling a knot, keyed by the knot point id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnotExtrusion {
    pub id: Id,
    pub extrusion: Id,
}

/// What a picked face belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WallElement {
    Wall(Id),
    Knot(Id),
}

#[derive(Debug, Clone)]
pub struct Walls {
    pub offset_faces: OffsetFaces,
    pub extrusions: Extrusions,
    list: FxHashMap<Id, Wall>,
    knots: FxHashMap<Id, KnotExtrusion>,
    /// Holes registered before their wall has geometry.
    pending_holes: FxHashMap<Id, BTreeMap<Id, WallHole>>,
    extrusion_walls: FxHashMap<Id, Id>,
    extrusion_knots: FxHashMap<Id, Id>,
    default_axis: Id,
    next_hole: Id,
    width: f64,
    height: f64,
}

impl Default for Walls {
    fn default() -> Self {
        Self::new()
    }
}

impl Walls {
    pub fn new() -> Self {
        Self::with_config(&KernelConfig::default())
    }

    pub fn with_config(config: &KernelConfig) -> Self {
        let mut extrusions = Extrusions::with_config(config);
        let axis = extrusions
            .lines
            .add_points(&[[0.0, 0.0, 0.0], [0.0, config.wall_height, 0.0]]);
        let default_axis = extrusions.lines.add(&axis).first().copied().unwrap_or_default();
        Self {
            offset_faces: OffsetFaces::with_config(config),
            extrusions,
            list: FxHashMap::default(),
            knots: FxHashMap::default(),
            pending_holes: FxHashMap::default(),
            extrusion_walls: FxHashMap::default(),
            extrusion_knots: FxHashMap::default(),
            default_axis,
            next_hole: 0,
            width: config.wall_width,
            height: config.wall_height,
        }
    }

    /// Creates axis points.
    pub fn add_points(&mut self, coordinates: &[Coordinates]) -> Vec<Id> {
        self.offset_faces.add_points(coordinates)
    }

    /// Creates one wall per consecutive pair of axis points. `width` falls
    /// back to the configured wall width.
    pub fn add(&mut self, point_ids: &[Id], width: Option<f64>, offset: f64) -> Result<Vec<Id>> {
        let width = width.unwrap_or(self.width);
        let ids = self.offset_faces.add(point_ids, width, offset)?;
        self.regenerate(&ids)?;
        // New miters also move the corners of walls already at the knots.
        let (walls, _) = self.neighbourhood(&ids);
        let others: Vec<Id> = walls.into_iter().filter(|w| !ids.contains(w)).collect();
        self.update_walls(&others)?;
        Ok(ids)
    }

    /// Vertical lift shared by every wall and knot.
    pub fn vertical(&self) -> Vector3<f64> {
        self.extrusions
            .lines
            .get(self.default_axis)
            .map(|[start, end]| to_vector(end) - to_vector(start))
            .unwrap_or_else(|| up() * self.height)
    }

    pub fn default_axis(&self) -> Id {
        self.default_axis
    }

    /// Creates points hole rings can be built from.
    pub fn add_hole_points(&mut self, coordinates: &[Coordinates]) -> Vec<Id> {
        self.extrusions.faces.add_points(coordinates)
    }

    /// Registers hole rings against a wall. They are punched on the next
    /// [`Walls::regenerate`].
    pub fn add_hole(&mut self, id: Id, holes: &[Vec<Id>]) -> Result<Vec<Id>> {
        if self.offset_faces.get(id).is_none() {
            return Err(Error::OffsetFaceNotFound(id));
        }
        for ring in holes {
            if ring.len() < 3 {
                return Err(Error::DegenerateFace(ring.len()));
            }
            if let Some(missing) = ring.iter().find(|p| self.extrusions.faces.point(**p).is_none()) {
                return Err(Error::PointNotFound(*missing));
            }
        }

        let mut ids = Vec::with_capacity(holes.len());
        for ring in holes {
            let hole_id = self.next_hole;
            self.next_hole += 1;
            let hole = WallHole {
                base_points: ring.clone(),
                top_points: Vec::new(),
            };
            match self.list.get_mut(&id) {
                Some(wall) => {
                    wall.holes.insert(hole_id, hole);
                }
                None => {
                    self.pending_holes.entry(id).or_default().insert(hole_id, hole);
                }
            }
            ids.push(hole_id);
        }
        Ok(ids)
    }

    /// Rebuilds walls from scratch, keeping their holes, then refreshes the
    /// knot solids at their ends.
    pub fn regenerate(&mut self, ids: &[Id]) -> Result<()> {
        for &id in ids {
            let mut holes = self.pending_holes.remove(&id).unwrap_or_default();
            if let Some(wall) = self.list.remove(&id) {
                let mut kept = self.detach(wall)?;
                kept.append(&mut holes);
                holes = kept;
            }
            self.create_geometry(id, holes)?;
        }

        let (_, knots) = self.neighbourhood(ids);
        self.update_knot_geometry(&knots)?;
        tracing::debug!(walls = ids.len(), knots = knots.len(), "Regenerated walls");
        Ok(())
    }

    /// Deletes a wall's solid and path and re-creates its hole points
    /// detached from any face, at their current coordinates.
    fn detach(&mut self, wall: Wall) -> Result<BTreeMap<Id, WallHole>> {
        let mut captured = Vec::with_capacity(wall.holes.len());
        for (hole_id, hole) in &wall.holes {
            let coords: Vec<Coordinates> = hole
                .base_points
                .iter()
                .filter_map(|p| self.extrusions.faces.get_point(*p))
                .collect();
            captured.push((*hole_id, coords));
        }

        self.extrusion_walls.remove(&wall.extrusion);
        self.extrusions.remove(&[wall.extrusion])?;
        self.remove_path(wall.path)?;

        let stale: Vec<Id> = wall.holes.values().flat_map(|h| h.base_points.iter().copied()).collect();
        self.extrusions.faces.remove_points(&stale)?;

        let mut holes = BTreeMap::new();
        for (hole_id, coords) in captured {
            if coords.len() < 3 {
                continue;
            }
            let base_points = self.extrusions.faces.add_points(&coords);
            holes.insert(
                hole_id,
                WallHole {
                    base_points,
                    top_points: Vec::new(),
                },
            );
        }
        Ok(holes)
    }

    fn remove_path(&mut self, path: Id) -> Result<()> {
        if let Some(line) = self.extrusions.lines.line(path).copied() {
            self.extrusions.lines.remove_points(Some(&[line.start, line.end]))?;
        }
        Ok(())
    }

    /// Builds the solid of one wall from its footprint and `holes`.
    pub fn create_geometry(&mut self, id: Id, mut holes: BTreeMap<Id, WallHole>) -> Result<()> {
        let face = self
            .offset_faces
            .get(id)
            .cloned()
            .ok_or(Error::OffsetFaceNotFound(id))?;
        let frame = self.offset_faces.axis_frame(id).ok_or(Error::LineNotFound(id))?;
        let [p1, p2, p3, p4] = self
            .offset_faces
            .corners(id)
            .ok_or(Error::OffsetFaceNotFound(id))?
            .map(to_vector);
        let v = self.vertical();

        let base_points = self
            .extrusions
            .faces
            .add_points(&[p1, p1 + v, p4 + v, p4].map(|c| from_vector(&c)));
        let hole_rings: Vec<Vec<Id>> = holes.values().map(|h| h.base_points.clone()).collect();
        let base_face = self.extrusions.faces.add(&base_points, &hole_rings)?;

        let path_points = self
            .extrusions
            .lines
            .add_points(&[from_vector(&p1), from_vector(&(p1 + frame.normal * face.width))]);
        let path = self
            .extrusions
            .lines
            .add(&path_points)
            .first()
            .copied()
            .ok_or(Error::LineNotFound(id))?;

        let extrusion_id = self.extrusions.add(base_face, path)?;
        let extrusion = self
            .extrusions
            .get(extrusion_id)
            .cloned()
            .ok_or(Error::ExtrusionNotFound(extrusion_id))?;

        // The translated opposite face ignores miters; pin it to p2 → p3.
        if let Some(top) = self.extrusions.faces.face(extrusion.top_face).cloned() {
            for (point, coords) in top.points.iter().zip([p2, p2 + v, p3 + v, p3]) {
                self.extrusions.faces.set_point(*point, from_vector(&coords));
            }
            for (hole, top_hole) in holes.values_mut().zip(top.holes.values()) {
                hole.top_points = top_hole.points.clone();
            }
        }

        self.extrusion_walls.insert(extrusion_id, id);
        self.list.insert(
            id,
            Wall {
                id,
                extrusion: extrusion_id,
                path,
                holes,
            },
        );
        tracing::trace!(wall = id, extrusion = extrusion_id, "Created wall geometry");
        Ok(())
    }

    /// Moves the solids of `ids` onto their current footprints in place.
    ///
    /// Hole points keep their distance from `p1` along the wall and their
    /// height above it, measured on the solid before the move.
    pub fn update_walls(&mut self, ids: &[Id]) -> Result<()> {
        let v = self.vertical();
        for id in ids {
            let Some(wall) = self.list.get(id).cloned() else {
                continue;
            };
            let (Some(face), Some(frame), Some(corners)) = (
                self.offset_faces.get(*id).cloned(),
                self.offset_faces.axis_frame(*id),
                self.offset_faces.corners(*id),
            ) else {
                continue;
            };
            let Some(extrusion) = self.extrusions.get(wall.extrusion).cloned() else {
                continue;
            };
            let faces = &self.extrusions.faces;
            let (Some(base), Some(top)) = (
                faces.face(extrusion.base_face).map(|f| f.points.clone()),
                faces.face(extrusion.top_face).map(|f| f.points.clone()),
            ) else {
                continue;
            };
            if base.len() != 4 || top.len() != 4 {
                continue;
            }
            let (Some(old_p1), Some(old_p4)) = (faces.get_point(base[0]), faces.get_point(base[3])) else {
                continue;
            };
            let old_p1 = to_vector(old_p1);
            let old_dir = (to_vector(old_p4) - old_p1)
                .try_normalize(1e-12)
                .unwrap_or(frame.direction);

            let mut placements: Vec<(Id, Option<Id>, f64, f64)> = Vec::new();
            for hole in wall.holes.values() {
                for (i, point) in hole.base_points.iter().enumerate() {
                    if let Some(coords) = faces.get_point(*point) {
                        let relative = to_vector(coords) - old_p1;
                        placements.push((*point, hole.top_points.get(i).copied(), relative.dot(&old_dir), relative.y));
                    }
                }
            }

            let [p1, p2, p3, p4] = corners.map(to_vector);
            let dir = (p4 - p1).try_normalize(1e-12).unwrap_or(frame.direction);
            let across = frame.normal * face.width;

            let faces = &mut self.extrusions.faces;
            for (point, coords) in base.iter().zip([p1, p1 + v, p4 + v, p4]) {
                faces.set_point(*point, from_vector(&coords));
            }
            for (point, coords) in top.iter().zip([p2, p2 + v, p3 + v, p3]) {
                faces.set_point(*point, from_vector(&coords));
            }
            for (base_point, top_point, distance, height) in placements {
                let placed = p1 + dir * distance + up() * height;
                faces.set_point(base_point, from_vector(&placed));
                if let Some(top_point) = top_point {
                    faces.set_point(top_point, from_vector(&(placed + across)));
                }
            }

            if let Some(line) = self.extrusions.lines.line(wall.path).copied() {
                self.extrusions.lines.set_point(line.start, from_vector(&p1));
                self.extrusions.lines.set_point(line.end, from_vector(&(p1 + across)));
            }
        }
        Ok(())
    }

    /// Extrudes the filler face of a knot, replacing any previous solid.
    pub fn create_knot_geometry(&mut self, knot: Id) -> Result<()> {
        self.remove_knot_geometry(knot)?;
        let Some(coords) = self.knot_outline(knot) else {
            return Ok(());
        };
        let points = self.extrusions.faces.add_points(&coords);
        let face = self.extrusions.faces.add(&points, &[])?;
        let extrusion = self.extrusions.add(face, self.default_axis)?;
        self.knots.insert(knot, KnotExtrusion { id: knot, extrusion });
        self.extrusion_knots.insert(extrusion, knot);
        Ok(())
    }

    /// Brings knot solids in line with the current filler faces.
    ///
    /// A filler with the same number of corners as the existing solid is
    /// repositioned in place; any other change rebuilds the solid.
    pub fn update_knot_geometry(&mut self, knots: &FxHashSet<Id>) -> Result<()> {
        let v = self.vertical();
        for &knot in knots {
            let Some(outline) = self.knot_outline(knot) else {
                self.remove_knot_geometry(knot)?;
                continue;
            };
            let rings = self.knots.get(&knot).and_then(|k| {
                let extrusion = self.extrusions.get(k.extrusion)?;
                let base = self.extrusions.faces.face(extrusion.base_face)?.points.clone();
                let top = self.extrusions.faces.face(extrusion.top_face)?.points.clone();
                Some((base, top))
            });

            match rings {
                Some((base, top)) if base.len() == outline.len() && top.len() == outline.len() => {
                    tracing::trace!(knot, corners = outline.len(), "Repositioning knot solid");
                    for ((b, t), coords) in base.iter().zip(&top).zip(&outline) {
                        self.extrusions.faces.set_point(*b, *coords);
                        self.extrusions.faces.set_point(*t, from_vector(&(to_vector(*coords) + v)));
                    }
                }
                _ => {
                    tracing::debug!(knot, corners = outline.len(), "Rebuilding knot solid");
                    self.create_knot_geometry(knot)?;
                }
            }
        }
        Ok(())
    }

    fn knot_outline(&self, knot: Id) -> Option<Vec<Coordinates>> {
        let filler = self.offset_faces.knot(knot).flatten()?;
        self.offset_faces.faces.face_coordinates(filler)
    }

    fn remove_knot_geometry(&mut self, knot: Id) -> Result<()> {
        if let Some(record) = self.knots.remove(&knot) {
            self.extrusion_knots.remove(&record.extrusion);
            self.extrusions.remove(&[record.extrusion])?;
        }
        Ok(())
    }

    /// Knots at the ends of `ids` and every wall meeting at them.
    fn neighbourhood(&self, ids: &[Id]) -> (Vec<Id>, FxHashSet<Id>) {
        let mut knots = FxHashSet::default();
        for id in ids {
            if let Some(line) = self.offset_faces.axes.line(*id) {
                knots.insert(line.start);
                knots.insert(line.end);
            }
        }
        let mut walls: FxHashSet<Id> = ids.iter().copied().collect();
        for knot in &knots {
            if let Some(adjacency) = self.offset_faces.axes.point(*knot) {
                walls.extend(adjacency.all());
            }
        }
        (walls.into_iter().collect(), knots)
    }

    pub fn set_width(&mut self, ids: &[Id], width: f64) -> Result<()> {
        let (walls, knots) = self.neighbourhood(ids);
        self.offset_faces.set_width(ids, width)?;
        self.update_walls(&walls)?;
        self.update_knot_geometry(&knots)
    }

    pub fn set_offset(&mut self, ids: &[Id], offset: f64) -> Result<()> {
        let (walls, knots) = self.neighbourhood(ids);
        self.offset_faces.set_offset(ids, offset)?;
        self.update_walls(&walls)?;
        self.update_knot_geometry(&knots)
    }

    /// Moves an axis point and everything standing on the walls around it.
    pub fn set_point(&mut self, id: Id, coordinates: Coordinates) -> Result<()> {
        let incident: Vec<Id> = self
            .offset_faces
            .axes
            .point(id)
            .map(|adjacency| adjacency.all().collect())
            .unwrap_or_default();
        let (walls, knots) = self.neighbourhood(&incident);
        self.offset_faces.set_point(id, coordinates)?;
        self.update_walls(&walls)?;
        self.update_knot_geometry(&knots)
    }

    /// Removes walls with their solids, holes, footprints and axes.
    pub fn remove(&mut self, ids: &[Id]) -> Result<()> {
        let (walls, knots) = self.neighbourhood(ids);
        for id in ids {
            self.pending_holes.remove(id);
            let Some(wall) = self.list.remove(id) else {
                continue;
            };
            self.extrusion_walls.remove(&wall.extrusion);
            self.extrusions.remove(&[wall.extrusion])?;
            self.remove_path(wall.path)?;
            let holes: Vec<Id> = wall.holes.values().flat_map(|h| h.base_points.iter().copied()).collect();
            self.extrusions.faces.remove_points(&holes)?;
        }
        self.offset_faces.remove(ids)?;

        let survivors: Vec<Id> = walls.into_iter().filter(|w| !ids.contains(w)).collect();
        self.update_walls(&survivors)?;
        self.update_knot_geometry(&knots)?;
        tracing::debug!(walls = ids.len(), "Removed walls");
        Ok(())
    }

    /// Wall or knot owning a face of [`Walls::extrusions`].
    pub fn get_from_face(&self, face_id: Id) -> Option<WallElement> {
        let extrusion = self.extrusions.get_from_face(face_id)?;
        if let Some(wall) = self.extrusion_walls.get(&extrusion) {
            return Some(WallElement::Wall(*wall));
        }
        self.extrusion_knots.get(&extrusion).map(|knot| WallElement::Knot(*knot))
    }

    /// Resolves a picked triangle of the solids' index buffer.
    pub fn get_from_index(&self, face_index: usize) -> Option<WallElement> {
        let face = self.extrusions.faces.get_from_index(face_index)?;
        self.get_from_face(face)
    }

    pub fn wall_of_extrusion(&self, extrusion: Id) -> Option<Id> {
        self.extrusion_walls.get(&extrusion).copied()
    }

    pub fn get(&self, id: Id) -> Option<&Wall> {
        self.list.get(&id)
    }

    pub fn list(&self) -> &FxHashMap<Id, Wall> {
        &self.list
    }

    pub fn knot(&self, id: Id) -> Option<&KnotExtrusion> {
        self.knots.get(&id)
    }

    pub fn knots(&self) -> &FxHashMap<Id, KnotExtrusion> {
        &self.knots
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
    use approx::assert_abs_diff_eq;

    fn assert_coords_eq(a: Coordinates, b: Coordinates) {
        for i in 0..3 {
            assert_abs_diff_eq!(a[i], b[i], epsilon = 1e-5);
        }
    }

    fn straight_wall(walls: &mut Walls) -> Id {
        let p = walls.add_points(&[[0.0, 0.0, 0.0], [4.0, 0.0, 0.0]]);
        walls.add(&p, Some(0.2), 0.0).unwrap()[0]
    }

    #[test]
    fn wall_solid_spans_the_footprint() {
        let mut walls = Walls::new();
        let id = straight_wall(&mut walls);
        let wall = walls.get(id).unwrap().clone();
        let extrusion = walls.extrusions.get(wall.extrusion).unwrap().clone();

        let base = walls.extrusions.faces.face_coordinates(extrusion.base_face).unwrap();
        assert_coords_eq(base[0], [0.0, 0.0, 0.1]);
        assert_coords_eq(base[1], [0.0, 3.0, 0.1]);
        assert_coords_eq(base[2], [4.0, 3.0, 0.1]);
        assert_coords_eq(base[3], [4.0, 0.0, 0.1]);

        let top = walls.extrusions.faces.face_coordinates(extrusion.top_face).unwrap();
        assert_coords_eq(top[0], [0.0, 0.0, -0.1]);
        assert_coords_eq(top[2], [4.0, 3.0, -0.1]);
        assert_eq!(extrusion.side_faces.len(), 4);
    }

    #[test]
    fn faces_resolve_to_their_wall() {
        let mut walls = Walls::new();
        let id = straight_wall(&mut walls);
        let extrusion = walls.extrusions.get(walls.get(id).unwrap().extrusion).unwrap().clone();
        for face in extrusion.all_faces() {
            assert_eq!(walls.get_from_face(face), Some(WallElement::Wall(id)));
        }
        assert_eq!(walls.wall_of_extrusion(extrusion.id), Some(id));
    }

    #[test]
    fn regenerate_keeps_holes() {
        let mut walls = Walls::new();
        let id = straight_wall(&mut walls);
        let ring = walls.add_hole_points(&[[1.0, 1.0, 0.1], [2.0, 1.0, 0.1], [2.0, 2.0, 0.1], [1.0, 2.0, 0.1]]);
        walls.add_hole(id, &[ring]).unwrap();
        walls.regenerate(&[id]).unwrap();
        walls.regenerate(&[id]).unwrap();

        let wall = walls.get(id).unwrap();
        assert_eq!(wall.holes.len(), 1);
        let hole = wall.holes.values().next().unwrap();
        assert_eq!(hole.top_points.len(), 4);
        let top = walls.extrusions.faces.get_point(hole.top_points[0]).unwrap();
        assert_coords_eq(top, [1.0, 1.0, -0.1]);

        let extrusion = walls.extrusions.get(wall.extrusion).unwrap();
        assert_eq!(extrusion.holes.len(), 1);
    }

    #[test]
    fn hole_validation() {
        let mut walls = Walls::new();
        let id = straight_wall(&mut walls);
        assert!(matches!(walls.add_hole(99, &[]), Err(Error::OffsetFaceNotFound(99))));
        assert!(matches!(walls.add_hole(id, &[vec![0, 1]]), Err(Error::DegenerateFace(2))));
        assert!(matches!(
            walls.add_hole(id, &[vec![1000, 1001, 1002]]),
            Err(Error::PointNotFound(1000))
        ));
    }

    #[test]
    fn width_change_moves_the_opposite_face() {
        let mut walls = Walls::new();
        let id = straight_wall(&mut walls);
        walls.set_width(&[id], 0.4).unwrap();

        let extrusion = walls.extrusions.get(walls.get(id).unwrap().extrusion).unwrap().clone();
        let base = walls.extrusions.faces.face_coordinates(extrusion.base_face).unwrap();
        let top = walls.extrusions.faces.face_coordinates(extrusion.top_face).unwrap();
        assert_coords_eq(base[0], [0.0, 0.0, 0.2]);
        assert_coords_eq(top[0], [0.0, 0.0, -0.2]);

        let [start, end] = walls.extrusions.lines.get(walls.get(id).unwrap().path).unwrap();
        assert_abs_diff_eq!(end[2] - start[2], -0.4, epsilon = 1e-6);
    }

    #[test]
    fn junction_gets_a_knot_solid() {
        let mut walls = Walls::new();
        let center = walls.add_points(&[[0.0, 0.0, 0.0]])[0];
        let tips = walls.add_points(&[[3.0, 0.0, 0.0], [-3.0, 0.0, 0.0], [0.0, 0.0, 3.0]]);
        for tip in &tips {
            walls.add(&[center, *tip], None, 0.0).unwrap();
        }

        let knot = *walls.knot(center).unwrap();
        let extrusion = walls.extrusions.get(knot.extrusion).unwrap().clone();
        assert_eq!(extrusion.side_faces.len(), 3);
        assert_eq!(walls.get_from_face(extrusion.top_face), Some(WallElement::Knot(center)));

        let top = walls.extrusions.top_coordinates(knot.extrusion).unwrap();
        for coords in top {
            assert_abs_diff_eq!(coords[1], 3.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn knot_solid_is_repositioned_when_its_shape_holds() {
        let mut walls = Walls::new();
        let center = walls.add_points(&[[0.0, 0.0, 0.0]])[0];
        let tips = walls.add_points(&[[3.0, 0.0, 0.0], [-3.0, 0.0, 0.0], [0.0, 0.0, 3.0]]);
        let mut ids = Vec::new();
        for tip in &tips {
            ids.extend(walls.add(&[center, *tip], None, 0.0).unwrap());
        }
        let before = walls.knot(center).unwrap().extrusion;

        walls.set_width(&ids[2..], 0.6).unwrap();
        let after = walls.knot(center).unwrap().extrusion;
        assert_eq!(before, after);

        let base = walls.extrusions.get(after).unwrap().base_face;
        let xs: Vec<f64> = walls
            .extrusions
            .faces
            .face_coordinates(base)
            .unwrap()
            .iter()
            .map(|c| c[0].abs())
            .collect();
        assert!(xs.iter().any(|x| (x - 0.3).abs() < 1e-6));
    }

    #[test]
    fn removing_a_wall_degrades_the_knot() {
        let mut walls = Walls::new();
        let center = walls.add_points(&[[0.0, 0.0, 0.0]])[0];
        let tips = walls.add_points(&[[3.0, 0.0, 0.0], [-3.0, 0.0, 0.0], [0.0, 0.0, 3.0]]);
        let mut ids = Vec::new();
        for tip in &tips {
            ids.extend(walls.add(&[center, *tip], None, 0.0).unwrap());
        }

        walls.remove(&ids[2..]).unwrap();
        assert_eq!(walls.len(), 2);
        assert!(walls.knot(center).is_none());
        assert_eq!(walls.extrusions.len(), 2);
    }
}
