// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Point cloud backed by a position/color buffer pair.

use nalgebra::Matrix4;
use rustc_hash::FxHashSet;

use crate::buffers::BufferManager;
use crate::config::{Color, KernelConfig};
use crate::error::Result;
use crate::id_index_map::IdIndexMap;
use crate::selector::Selector;
use crate::vector::{from_f32, to_f32, transform_point};
use crate::{Coordinates, Id, Index};

pub const POSITION: &str = "position";
pub const COLOR: &str = "color";

/// Points with stable ids, stored densely for rendering.
#[derive(Debug, Clone)]
pub struct Vertices {
    ids: IdIndexMap,
    buffers: BufferManager,
    selector: Selector,
    base_color: Color,
    select_color: Color,
}

impl Default for Vertices {
    fn default() -> Self {
        Self::new()
    }
}

impl Vertices {
    pub fn new() -> Self {
        Self::with_config(&KernelConfig::default())
    }

    pub fn with_config(config: &KernelConfig) -> Self {
        Self::with_colors(config, config.base_color, config.select_color)
    }

    pub fn with_colors(config: &KernelConfig, base_color: Color, select_color: Color) -> Self {
        let mut buffers = BufferManager::new(config.buffer_increase);
        buffers.create_attribute(POSITION);
        buffers.create_attribute(COLOR);
        Self {
            ids: IdIndexMap::new(),
            buffers,
            selector: Selector::new(),
            base_color,
            select_color,
        }
    }

    /// Adds one point per coordinate triple and returns their ids.
    pub fn add(&mut self, coordinates: &[Coordinates]) -> Vec<Id> {
        self.buffers.resize_if_needed(coordinates.len());
        let mut new_ids = Vec::with_capacity(coordinates.len());
        for coords in coordinates {
            let index = self.ids.add();
            self.buffers.set(POSITION, index, to_f32(*coords));
            self.buffers.set(COLOR, index, self.base_color);
            if let Some(id) = self.ids.get_id(index) {
                new_ids.push(id);
            }
        }
        self.buffers.update_count(self.ids.len());
        new_ids
    }

    pub fn get(&self, id: Id) -> Option<Coordinates> {
        let index = self.ids.get_index(id)?;
        self.buffers.get(POSITION, index).map(from_f32)
    }

    /// Overwrites the position of each id with the matching coordinates.
    ///
    /// Unknown ids are skipped; the rest of the batch is still written.
    pub fn set(&mut self, ids: &[Id], coordinates: &[Coordinates]) {
        for (&id, coords) in ids.iter().zip(coordinates) {
            if let Some(index) = self.ids.get_index(id) {
                self.buffers.set(POSITION, index, to_f32(*coords));
            }
        }
    }

    /// Selects or deselects points (all points when `ids` is `None`) and
    /// recolors the ones that changed. Returns the changed ids.
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
        changed
    }

    /// Applies `matrix` to the given points, or to the selection when `ids`
    /// is `None`.
    pub fn transform(&mut self, matrix: &Matrix4<f64>, ids: Option<&[Id]>) {
        let targets: Vec<Id> = match ids {
            Some(ids) => ids.to_vec(),
            None => self.selector.selected().iter().copied().collect(),
        };
        for id in targets {
            if let Some(coords) = self.get(id) {
                let moved = transform_point(matrix, coords);
                self.set(&[id], &[moved]);
            }
        }
    }

    /// Removes points (the selection when `ids` is `None`), swapping the last
    /// buffer element into each freed slot for every registered attribute.
    pub fn remove(&mut self, ids: Option<&[Id]>) -> Result<()> {
        let targets: Vec<Id> = match ids {
            Some(ids) => ids.to_vec(),
            None => self.selector.selected().iter().copied().collect(),
        };
        for id in targets {
            let Some(index) = self.ids.get_index(id) else {
                continue;
            };
            if let Some(last) = self.ids.get_last_index() {
                self.buffers.copy_element(last, index);
            }
            self.ids.remove(id)?;
            self.selector.forget([id]);
        }
        self.buffers.update_count(self.ids.len());
        Ok(())
    }

    /// Removes every point.
    pub fn clear(&mut self) {
        self.buffers.reset_attributes();
        self.ids.reset();
        self.selector.clear();
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

    /// Writes a color for specific points without touching their selection.
    pub fn paint(&mut self, ids: &[Id], color: Color) {
        for &id in ids {
            if let Some(index) = self.ids.get_index(id) {
                self.buffers.set(COLOR, index, color);
            }
        }
    }

    pub fn base_color(&self) -> Color {
        self.base_color
    }

    pub fn select_color(&self) -> Color {
        self.select_color
    }

    pub fn selected(&self) -> &FxHashSet<Id> {
        self.selector.selected()
    }

    pub fn is_selected(&self, id: Id) -> bool {
        self.selector.is_selected(id)
    }

    pub fn contains(&self, id: Id) -> bool {
        self.ids.contains(id)
    }

    pub fn index_of(&self, id: Id) -> Option<Index> {
        self.ids.get_index(id)
    }

    pub fn id_at(&self, index: Index) -> Option<Id> {
        self.ids.get_id(index)
    }

    /// Live ids in buffer order.
    pub fn ids(&self) -> &[Id] {
        self.ids.ids()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn buffers(&self) -> &BufferManager {
        &self.buffers
    }

    /// Mutable access for owners that register extra attributes.
    pub fn buffers_mut(&mut self) -> &mut BufferManager {
        &mut self.buffers
    }
}
