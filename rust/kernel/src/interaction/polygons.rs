// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Click-by-click polygon drawing on a horizontal plane.

use rustc_hash::FxHashMap;

use crate::config::KernelConfig;
use crate::error::Result;
use crate::interaction::{InputEvent, Outcome};
use crate::lines::Lines;
use crate::raycast::{Raycaster, Target};
use crate::vector::{round_vector, to_vector};
use crate::{Coordinates, Id};

/// A committed closed polygon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Polygon {
    pub id: Id,
    pub points: Vec<Id>,
    pub lines: Vec<Id>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawState {
    Idle,
    Drawing {
        /// Committed corners, first one first.
        points: Vec<Id>,
        /// Committed edges between consecutive corners.
        lines: Vec<Id>,
        /// Point following the pointer.
        cursor: Id,
        /// Edge from the last corner to the cursor.
        preview: Id,
    },
}

#[derive(Debug, Clone)]
pub struct Polygons {
    pub lines: Lines,
    list: FxHashMap<Id, Polygon>,
    state: DrawState,
    edit_mode: bool,
    elevation: f64,
    precision: f64,
    next: Id,
}

impl Default for Polygons {
    fn default() -> Self {
        Self::new()
    }
}

impl Polygons {
    pub fn new() -> Self {
        Self::with_config(&KernelConfig::default())
    }

    pub fn with_config(config: &KernelConfig) -> Self {
        Self {
            lines: Lines::with_config(config),
            list: FxHashMap::default(),
            state: DrawState::Idle,
            edit_mode: false,
            elevation: 0.0,
            precision: config.precision,
            next: 0,
        }
    }

    /// Height of the drawing plane.
    pub fn set_elevation(&mut self, elevation: f64) {
        self.elevation = elevation;
    }

    /// Turning edit mode off abandons the polygon being drawn.
    pub fn set_edit_mode(&mut self, active: bool) -> Result<Outcome> {
        self.edit_mode = active;
        if active {
            Ok(Outcome::Ignored)
        } else {
            self.cancel()
        }
    }

    pub fn edit_mode(&self) -> bool {
        self.edit_mode
    }

    pub fn poll_input<R: Raycaster>(&mut self, event: InputEvent, raycaster: &R) -> Result<Outcome> {
        if !self.edit_mode {
            return Ok(Outcome::Ignored);
        }
        match event {
            InputEvent::Cancel => self.cancel(),
            InputEvent::PointerMove => self.drag(raycaster),
            InputEvent::Click => self.click(raycaster),
        }
    }

    /// Deletes every point and line of the polygon in progress.
    pub fn cancel(&mut self) -> Result<Outcome> {
        let DrawState::Drawing { mut points, cursor, .. } = std::mem::replace(&mut self.state, DrawState::Idle)
        else {
            return Ok(Outcome::Ignored);
        };
        points.push(cursor);
        self.lines.remove_points(Some(&points))?;
        tracing::debug!(points = points.len(), "Cancelled polygon drawing");
        Ok(Outcome::Cancelled)
    }

    fn drag<R: Raycaster>(&mut self, raycaster: &R) -> Result<Outcome> {
        let DrawState::Drawing { ref points, cursor, .. } = self.state else {
            return Ok(Outcome::Ignored);
        };
        let first = points.first().copied();
        let Some(target) = self.pointer_target(raycaster, cursor, first)? else {
            return Ok(Outcome::Ignored);
        };
        self.lines.set_point(cursor, target);
        Ok(Outcome::Updated)
    }

    fn click<R: Raycaster>(&mut self, raycaster: &R) -> Result<Outcome> {
        if !self.is_drawing() {
            return self.start(raycaster);
        }
        self.drag(raycaster)?;
        if self.cursor_on_first() {
            self.close()
        } else {
            self.add_corner()
        }
    }

    fn start<R: Raycaster>(&mut self, raycaster: &R) -> Result<Outcome> {
        let Some(target) = self.pointer_target(raycaster, Id::MAX, None)? else {
            return Ok(Outcome::Ignored);
        };
        let ids = self.lines.add_points(&[target, target]);
        let &[first, cursor] = ids.as_slice() else {
            return Ok(Outcome::Ignored);
        };
        let Some(preview) = self.lines.add(&ids).first().copied() else {
            return Ok(Outcome::Ignored);
        };
        self.state = DrawState::Drawing {
            points: vec![first],
            lines: Vec::new(),
            cursor,
            preview,
        };
        tracing::debug!(first, "Started polygon drawing");
        Ok(Outcome::Started)
    }

    /// The cursor becomes a corner and a new cursor takes over.
    fn add_corner(&mut self) -> Result<Outcome> {
        let DrawState::Drawing {
            points,
            lines,
            cursor,
            preview,
        } = &mut self.state
        else {
            return Ok(Outcome::Ignored);
        };
        let Some(coords) = self.lines.vertices.get(*cursor) else {
            return Ok(Outcome::Ignored);
        };
        points.push(*cursor);
        lines.push(*preview);

        let Some(next) = self.lines.add_points(&[coords]).first().copied() else {
            return Ok(Outcome::Ignored);
        };
        let Some(next_preview) = self.lines.add(&[*cursor, next]).first().copied() else {
            return Ok(Outcome::Ignored);
        };
        *cursor = next;
        *preview = next_preview;
        tracing::trace!(corners = points.len(), "Added polygon corner");
        Ok(Outcome::Updated)
    }

    /// Drops the cursor, closes the ring and commits it.
    fn close(&mut self) -> Result<Outcome> {
        let DrawState::Drawing {
            points,
            mut lines,
            cursor,
            ..
        } = std::mem::replace(&mut self.state, DrawState::Idle)
        else {
            return Ok(Outcome::Ignored);
        };
        self.lines.remove_points(Some(&[cursor]))?;
        if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
            lines.extend(self.lines.add(&[last, first]));
        }

        let id = self.next;
        self.next += 1;
        tracing::debug!(polygon = id, corners = points.len(), "Committed polygon");
        self.list.insert(id, Polygon { id, points, lines });
        Ok(Outcome::Committed(id))
    }

    /// Whether clicking now would close a ring of at least 3 corners.
    fn cursor_on_first(&self) -> bool {
        let DrawState::Drawing { points, cursor, .. } = &self.state else {
            return false;
        };
        if points.len() < 3 {
            return false;
        }
        match (self.lines.vertices.get(points[0]), self.lines.vertices.get(*cursor)) {
            (Some(first), Some(cursor)) => {
                round_vector(&to_vector(first), self.precision) == round_vector(&to_vector(cursor), self.precision)
            }
            _ => false,
        }
    }

    /// Where the pointer is: the first corner when hovering it, otherwise the
    /// drawing plane.
    fn pointer_target<R: Raycaster>(&self, raycaster: &R, cursor: Id, first: Option<Id>) -> Result<Option<Coordinates>> {
        let hits = raycaster.cast(&[
            Target::Vertices(&self.lines.vertices),
            Target::Plane {
                origin: [0.0, self.elevation, 0.0],
                normal: [0.0, 1.0, 0.0],
            },
        ])?;

        if let Some(first) = first {
            let snapped = hits
                .iter()
                .filter(|hit| hit.target == 0)
                .filter_map(|hit| self.lines.vertices.id_at(hit.index?))
                .find(|id| *id != cursor && *id == first);
            if let Some(id) = snapped {
                return Ok(self.lines.vertices.get(id));
            }
        }
        Ok(hits.iter().find(|hit| hit.target == 1).map(|hit| hit.point))
    }

    pub fn state(&self) -> &DrawState {
        &self.state
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.state, DrawState::Drawing { .. })
    }

    pub fn get(&self, id: Id) -> Option<&Polygon> {
        self.list.get(&id)
    }

    pub fn list(&self) -> &FxHashMap<Id, Polygon> {
        &self.list
    }

    /// Corner coordinates of a committed polygon.
    pub fn coordinates(&self, id: Id) -> Option<Vec<Coordinates>> {
        let polygon = self.list.get(&id)?;
        polygon.points.iter().map(|p| self.lines.vertices.get(*p)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raycast::{Ray, SceneRaycaster};

    fn at(raycaster: &mut SceneRaycaster, x: f64, z: f64) {
        raycaster.track(Ray::new([x, 10.0, z], [0.0, -1.0, 0.0]));
    }

    fn click(polygons: &mut Polygons, raycaster: &mut SceneRaycaster, x: f64, z: f64) -> Outcome {
        at(raycaster, x, z);
        polygons.poll_input(InputEvent::PointerMove, &*raycaster).unwrap();
        polygons.poll_input(InputEvent::Click, &*raycaster).unwrap()
    }

    #[test]
    fn ignores_input_outside_edit_mode() {
        let mut polygons = Polygons::new();
        let mut raycaster = SceneRaycaster::new();
        assert_eq!(click(&mut polygons, &mut raycaster, 0.0, 0.0), Outcome::Ignored);
        assert!(polygons.lines.vertices.is_empty());
    }

    #[test]
    fn draws_and_closes_a_triangle() {
        let mut polygons = Polygons::new();
        let mut raycaster = SceneRaycaster::new();
        polygons.set_edit_mode(true).unwrap();

        assert_eq!(click(&mut polygons, &mut raycaster, 0.0, 0.0), Outcome::Started);
        assert_eq!(click(&mut polygons, &mut raycaster, 2.0, 0.0), Outcome::Updated);
        assert_eq!(click(&mut polygons, &mut raycaster, 2.0, 2.0), Outcome::Updated);
        let outcome = click(&mut polygons, &mut raycaster, 0.02, 0.01);
        let Outcome::Committed(id) = outcome else {
            panic!("expected a committed polygon, got {outcome:?}");
        };

        assert!(!polygons.is_drawing());
        let polygon = polygons.get(id).unwrap();
        assert_eq!(polygon.points.len(), 3);
        assert_eq!(polygon.lines.len(), 3);
        assert_eq!(polygons.lines.len(), 3);
        assert_eq!(polygons.lines.vertices.len(), 3);
        assert_eq!(polygons.coordinates(id).unwrap()[1], [2.0, 0.0, 0.0]);
    }

    #[test]
    fn first_point_does_not_close_a_short_ring() {
        let mut polygons = Polygons::new();
        let mut raycaster = SceneRaycaster::new();
        polygons.set_edit_mode(true).unwrap();

        click(&mut polygons, &mut raycaster, 0.0, 0.0);
        click(&mut polygons, &mut raycaster, 2.0, 0.0);
        assert_eq!(click(&mut polygons, &mut raycaster, 0.0, 0.0), Outcome::Updated);
        assert!(polygons.is_drawing());
    }

    #[test]
    fn cancel_removes_speculative_geometry() {
        let mut polygons = Polygons::new();
        let mut raycaster = SceneRaycaster::new();
        polygons.set_edit_mode(true).unwrap();

        click(&mut polygons, &mut raycaster, 0.0, 0.0);
        click(&mut polygons, &mut raycaster, 2.0, 0.0);
        at(&mut raycaster, 3.0, 1.0);
        polygons.poll_input(InputEvent::PointerMove, &raycaster).unwrap();

        assert_eq!(polygons.set_edit_mode(false).unwrap(), Outcome::Cancelled);
        assert!(polygons.lines.is_empty());
        assert!(polygons.lines.vertices.is_empty());
        assert_eq!(polygons.state(), &DrawState::Idle);
    }
}
