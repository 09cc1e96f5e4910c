// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Segments between shared points.
//!
//! A line references two point ids of the owned [`Vertices`]. Its geometry is
//! mirrored into a line-list buffer (two elements per line) so it can be drawn
//! independently, and the `points` adjacency index lets point edits reach every
//! line slot that must follow.

use nalgebra::Matrix4;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::buffers::BufferManager;
use crate::config::{Color, KernelConfig};
use crate::error::Result;
use crate::id_index_map::IdIndexMap;
use crate::selector::Selector;
use crate::vector::{from_f32, to_f32};
use crate::vertices::{Vertices, COLOR, POSITION};
use crate::{Coordinates, Id, Index};

/// A segment from `start` to `end` point ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    pub id: Id,
    pub start: Id,
    pub end: Id,
}

/// Lines beginning and ending at one point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PointLines {
    pub start: FxHashSet<Id>,
    pub end: FxHashSet<Id>,
}

impl PointLines {
    /// Every line touching the point.
    pub fn all(&self) -> impl Iterator<Item = Id> + '_ {
        self.start.iter().chain(self.end.iter()).copied()
    }

    pub fn len(&self) -> usize {
        self.start.len() + self.end.len()
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_empty() && self.end.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Lines {
    pub vertices: Vertices,
    ids: IdIndexMap,
    buffers: BufferManager,
    selector: Selector,
    list: FxHashMap<Id, Line>,
    points: FxHashMap<Id, PointLines>,
    base_color: Color,
    select_color: Color,
}

impl Default for Lines {
    fn default() -> Self {
        Self::new()
    }
}

impl Lines {
    pub fn new() -> Self {
        Self::with_config(&KernelConfig::default())
    }

    pub fn with_config(config: &KernelConfig) -> Self {
        let mut buffers = BufferManager::new(config.buffer_increase);
        buffers.create_attribute(POSITION);
        buffers.create_attribute(COLOR);
        Self {
            vertices: Vertices::with_config(config),
            ids: IdIndexMap::new(),
            buffers,
            selector: Selector::new(),
            list: FxHashMap::default(),
            points: FxHashMap::default(),
            base_color: config.line_color,
            select_color: config.line_select_color,
        }
    }

    /// Adds points that lines can connect.
    pub fn add_points(&mut self, coordinates: &[Coordinates]) -> Vec<Id> {
        let ids = self.vertices.add(coordinates);
        for &id in &ids {
            self.points.insert(id, PointLines::default());
        }
        ids
    }

    /// Creates one line per consecutive pair of `point_ids`.
    ///
    /// Pairs with a missing endpoint produce no line.
    pub fn add(&mut self, point_ids: &[Id]) -> Vec<Id> {
        let pairs = point_ids.len().saturating_sub(1);
        self.buffers.resize_if_needed(pairs * 2);

        let mut new_ids = Vec::with_capacity(pairs);
        for pair in point_ids.windows(2) {
            let (start, end) = (pair[0], pair[1]);
            let (Some(start_coords), Some(end_coords)) = (self.vertices.get(start), self.vertices.get(end))
            else {
                continue;
            };

            let index = self.ids.add();
            let Some(id) = self.ids.get_id(index) else {
                continue;
            };
            self.buffers.set(POSITION, index * 2, to_f32(start_coords));
            self.buffers.set(POSITION, index * 2 + 1, to_f32(end_coords));
            self.buffers.set(COLOR, index * 2, self.base_color);
            self.buffers.set(COLOR, index * 2 + 1, self.base_color);

            self.list.insert(id, Line { id, start, end });
            self.points.entry(start).or_default().start.insert(id);
            self.points.entry(end).or_default().end.insert(id);
            new_ids.push(id);
        }

        self.buffers.update_count(self.ids.len() * 2);
        new_ids
    }

    /// Start and end coordinates of a line.
    pub fn get(&self, id: Id) -> Option<[Coordinates; 2]> {
        let line = self.list.get(&id)?;
        Some([self.vertices.get(line.start)?, self.vertices.get(line.end)?])
    }

    /// Moves a point and every line slot that references it.
    pub fn set_point(&mut self, id: Id, coordinates: Coordinates) {
        self.vertices.set(&[id], &[coordinates]);
        self.sync_point(id);
    }

    /// Copies a point's current position into the line slots that use it.
    fn sync_point(&mut self, id: Id) {
        let Some(coords) = self.vertices.get(id) else {
            return;
        };
        let Some(adjacency) = self.points.get(&id) else {
            return;
        };
        let value = to_f32(coords);
        for line in &adjacency.start {
            if let Some(index) = self.ids.get_index(*line) {
                self.buffers.set(POSITION, index * 2, value);
            }
        }
        for line in &adjacency.end {
            if let Some(index) = self.ids.get_index(*line) {
                self.buffers.set(POSITION, index * 2 + 1, value);
            }
        }
    }

    /// Transforms every selected point together with its line slots.
    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        let selected: Vec<Id> = self.vertices.selected().iter().copied().collect();
        self.vertices.transform(matrix, Some(&selected));
        for id in selected {
            self.sync_point(id);
        }
    }

    /// Selects lines (all when `ids` is `None`) along with their endpoints.
    pub fn select(&mut self, active: bool, ids: Option<&[Id]>) -> Vec<Id> {
        let targets: Vec<Id> = match ids {
            Some(ids) => ids.to_vec(),
            None => self.ids.ids().to_vec(),
        };
        let changed = self
            .selector
            .select(active, targets, self.ids.ids().iter().copied());
        let color = if active { self.select_color } else { self.base_color };
        self.paint(&changed, color);

        let endpoints: Vec<Id> = changed
            .iter()
            .filter_map(|id| self.list.get(id))
            .flat_map(|line| [line.start, line.end])
            .collect();
        self.vertices.select(active, Some(&endpoints));
        changed
    }

    /// Selects points (all when `ids` is `None`).
    ///
    /// Selecting also selects lines whose both endpoints end up selected;
    /// deselecting deselects every line touching a deselected point.
    pub fn select_points(&mut self, active: bool, ids: Option<&[Id]>) -> Vec<Id> {
        let changed = self.vertices.select(active, ids);

        let mut affected: FxHashSet<Id> = FxHashSet::default();
        for id in &changed {
            if let Some(adjacency) = self.points.get(id) {
                affected.extend(adjacency.all());
            }
        }
        let lines: Vec<Id> = affected
            .into_iter()
            .filter(|id| {
                !active
                    || self.list.get(id).is_some_and(|line| {
                        self.vertices.is_selected(line.start) && self.vertices.is_selected(line.end)
                    })
            })
            .collect();

        let flipped = self
            .selector
            .select(active, lines, self.ids.ids().iter().copied());
        let color = if active { self.select_color } else { self.base_color };
        self.paint(&flipped, color);
        changed
    }

    fn paint(&mut self, ids: &[Id], color: Color) {
        for &id in ids {
            if let Some(index) = self.ids.get_index(id) {
                self.buffers.set(COLOR, index * 2, color);
                self.buffers.set(COLOR, index * 2 + 1, color);
            }
        }
    }

    /// Removes lines (the selection when `ids` is `None`). Their endpoints are
    /// deselected but kept.
    pub fn remove(&mut self, ids: Option<&[Id]>) -> Result<()> {
        let targets: Vec<Id> = match ids {
            Some(ids) => ids.to_vec(),
            None => self.selector.selected().iter().copied().collect(),
        };

        let mut endpoints = Vec::new();
        for id in targets {
            let Some(index) = self.ids.get_index(id) else {
                continue;
            };
            if let Some(last) = self.ids.get_last_index() {
                self.buffers.copy_element(last * 2, index * 2);
                self.buffers.copy_element(last * 2 + 1, index * 2 + 1);
            }
            self.ids.remove(id)?;

            if let Some(line) = self.list.remove(&id) {
                if let Some(adjacency) = self.points.get_mut(&line.start) {
                    adjacency.start.remove(&id);
                }
                if let Some(adjacency) = self.points.get_mut(&line.end) {
                    adjacency.end.remove(&id);
                }
                endpoints.push(line.start);
                endpoints.push(line.end);
            }
            self.selector.forget([id]);
        }

        self.buffers.update_count(self.ids.len() * 2);
        self.vertices.select(false, Some(&endpoints));
        Ok(())
    }

    /// Removes points (the selected points when `ids` is `None`) and every
    /// line touching them.
    pub fn remove_points(&mut self, ids: Option<&[Id]>) -> Result<()> {
        let targets: Vec<Id> = match ids {
            Some(ids) => ids.to_vec(),
            None => self.vertices.selected().iter().copied().collect(),
        };

        let mut lines: FxHashSet<Id> = FxHashSet::default();
        for id in &targets {
            if let Some(adjacency) = self.points.get(id) {
                lines.extend(adjacency.all());
            }
        }

        self.vertices.remove(Some(&targets))?;
        let lines: Vec<Id> = lines.into_iter().collect();
        self.remove(Some(&lines))?;
        for id in &targets {
            self.points.remove(id);
        }
        Ok(())
    }

    pub fn line(&self, id: Id) -> Option<&Line> {
        self.list.get(&id)
    }

    pub fn list(&self) -> &FxHashMap<Id, Line> {
        &self.list
    }

    /// Adjacency record of a point.
    pub fn point(&self, id: Id) -> Option<&PointLines> {
        self.points.get(&id)
    }

    pub fn points(&self) -> &FxHashMap<Id, PointLines> {
        &self.points
    }

    pub fn selected(&self) -> &FxHashSet<Id> {
        self.selector.selected()
    }

    pub fn is_selected(&self, id: Id) -> bool {
        self.selector.is_selected(id)
    }

    pub fn index_of(&self, id: Id) -> Option<Index> {
        self.ids.get_index(id)
    }

    pub fn id_at(&self, index: Index) -> Option<Id> {
        self.ids.get_id(index)
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn buffers(&self) -> &BufferManager {
        &self.buffers
    }

    /// Buffer coordinates of slot `slot` (two slots per line).
    pub fn slot_position(&self, slot: Index) -> Option<Coordinates> {
        self.buffers.get(POSITION, slot).map(from_f32)
    }

    pub fn set_base_color(&mut self, color: Color) {
        self.base_color = color;
        let unselected = self.selector.get_unselected(self.ids.ids().iter().copied());
        self.paint(&unselected, color);
    }

    pub fn set_select_color(&mut self, color: Color) {
        self.select_color = color;
        let selected: Vec<Id> = self.selector.selected().iter().copied().collect();
        self.paint(&selected, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn square() -> (Lines, Vec<Id>) {
        let mut lines = Lines::new();
        let points = lines.add_points(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 0.0, 1.0],
            [0.0, 0.0, 1.0],
        ]);
        (lines, points)
    }

    fn assert_adjacency_symmetric(lines: &Lines) {
        for line in lines.list().values() {
            assert!(lines.point(line.start).unwrap().start.contains(&line.id));
            assert!(lines.point(line.end).unwrap().end.contains(&line.id));
        }
        for (point, adjacency) in lines.points() {
            for id in &adjacency.start {
                assert_eq!(lines.line(*id).unwrap().start, *point);
            }
            for id in &adjacency.end {
                assert_eq!(lines.line(*id).unwrap().end, *point);
            }
        }
    }

    #[test]
    fn one_line_per_consecutive_pair() {
        let (mut lines, p) = square();
        let ids = lines.add(&[p[0], p[1], p[2], p[3], p[0]]);
        assert_eq!(ids.len(), 4);
        assert_eq!(lines.buffers().size(), 8);
        assert_eq!(lines.get(ids[1]), Some([[1.0, 0.0, 0.0], [1.0, 0.0, 1.0]]));
        assert_adjacency_symmetric(&lines);
    }

    #[test]
    fn pairs_with_missing_points_are_skipped() {
        let (mut lines, p) = square();
        let ids = lines.add(&[p[0], 42, p[1], p[2]]);
        assert_eq!(ids.len(), 1);
        assert_eq!(lines.line(ids[0]).unwrap().start, p[1]);
    }

    #[test]
    fn remove_keeps_points() {
        let (mut lines, p) = square();
        let ids = lines.add(&[p[0], p[1]]);
        assert_eq!(ids.len(), 1);
        let line = *lines.line(ids[0]).unwrap();
        assert_eq!((line.start, line.end), (p[0], p[1]));

        lines.remove(Some(&ids)).unwrap();

        assert!(lines.is_empty());
        assert!(lines.point(p[0]).unwrap().is_empty());
        assert!(lines.point(p[1]).unwrap().is_empty());
        assert!(lines.vertices.get(p[0]).is_some());
        assert!(lines.vertices.get(p[1]).is_some());
    }

    #[test]
    fn remove_compacts_line_slots() {
        let (mut lines, p) = square();
        let ids = lines.add(&[p[0], p[1], p[2], p[3]]);
        lines.remove(Some(&ids[..1])).unwrap();

        let moved = ids[2];
        let index = lines.index_of(moved).unwrap();
        assert_eq!(index, 0);
        assert_eq!(lines.slot_position(0), Some([1.0, 0.0, 1.0]));
        assert_eq!(lines.slot_position(1), Some([0.0, 0.0, 1.0]));
        assert_adjacency_symmetric(&lines);
    }

    #[test]
    fn moving_a_point_moves_line_slots() {
        let (mut lines, p) = square();
        let ids = lines.add(&[p[0], p[1], p[2]]);
        lines.set_point(p[1], [2.0, 0.0, 0.0]);
        assert_eq!(lines.get(ids[0]).unwrap()[1], [2.0, 0.0, 0.0]);
        let index = lines.index_of(ids[0]).unwrap();
        assert_eq!(lines.slot_position(index * 2 + 1), Some([2.0, 0.0, 0.0]));
        let index = lines.index_of(ids[1]).unwrap();
        assert_eq!(lines.slot_position(index * 2), Some([2.0, 0.0, 0.0]));
    }

    #[test]
    fn remove_points_cascades_to_lines() {
        let (mut lines, p) = square();
        lines.add(&[p[0], p[1], p[2], p[3]]);
        lines.remove_points(Some(&[p[1]])).unwrap();

        assert_eq!(lines.len(), 1);
        assert!(lines.point(p[1]).is_none());
        assert!(lines.vertices.get(p[1]).is_none());
        assert_adjacency_symmetric(&lines);
    }

    #[test]
    fn selecting_lines_selects_endpoints() {
        let (mut lines, p) = square();
        let ids = lines.add(&[p[0], p[1], p[2]]);
        lines.select(true, Some(&ids[..1]));
        assert!(lines.vertices.is_selected(p[0]));
        assert!(lines.vertices.is_selected(p[1]));
        assert!(!lines.vertices.is_selected(p[2]));
    }

    #[test]
    fn selecting_points_selects_enclosed_lines() {
        let (mut lines, p) = square();
        let ids = lines.add(&[p[0], p[1], p[2]]);
        lines.select_points(true, Some(&[p[0], p[1]]));
        assert!(lines.is_selected(ids[0]));
        assert!(!lines.is_selected(ids[1]));

        lines.select_points(false, Some(&[p[1]]));
        assert!(!lines.is_selected(ids[0]));
    }

    #[test]
    fn transform_moves_selected_points_and_slots() {
        let (mut lines, p) = square();
        let ids = lines.add(&[p[0], p[1]]);
        lines.select_points(true, Some(&[p[1]]));
        lines.transform(&Matrix4::new_translation(&Vector3::new(0.0, 1.0, 0.0)));

        assert_eq!(lines.get(ids[0]).unwrap()[1], [1.0, 1.0, 0.0]);
        assert_eq!(lines.slot_position(1), Some([1.0, 1.0, 0.0]));
        assert_eq!(lines.slot_position(0), Some([0.0, 0.0, 0.0]));
    }
}
