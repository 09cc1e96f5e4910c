// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Stable id ↔ dense buffer index mapping.
//!
//! Ids are handed out sequentially and never change. Indices are positions in
//! a dense geometric buffer: removing an id moves the last id into the freed
//! slot so the buffer stays contiguous. Any removal may therefore relocate an
//! unrelated id, and callers must re-read indices afterwards.

use crate::error::{Error, Result};
use crate::{Id, Index};

/// Bidirectional id/index table with O(1) swap-remove.
#[derive(Debug, Clone, Default)]
pub struct IdIndexMap {
    generator: Id,
    /// Position = buffer index.
    ids: Vec<Id>,
    /// Sized to the highest id ever generated + 1, `None` once removed.
    indices: Vec<Option<Index>>,
}

impl IdIndexMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates a new id at the end of the buffer and returns its index.
    pub fn add(&mut self) -> Index {
        let id = self.generator;
        self.generator += 1;
        self.ids.push(id);
        let index = self.ids.len() - 1;
        self.indices.push(Some(index));
        index
    }

    /// Removes an id, moving the last id into its slot.
    ///
    /// Unknown or already removed ids are ignored.
    pub fn remove(&mut self, id: Id) -> Result<()> {
        let Some(index) = self.get_index(id) else {
            return Ok(());
        };

        let last_id = self.ids.pop().ok_or(Error::EmptyIdIndexMap(id))?;
        self.indices[id] = None;

        if last_id != id {
            self.ids[index] = last_id;
            self.indices[last_id] = Some(index);
        }
        Ok(())
    }

    /// Clears every id and restarts the generator from zero.
    pub fn reset(&mut self) {
        self.generator = 0;
        self.ids.clear();
        self.indices.clear();
    }

    pub fn get_id(&self, index: Index) -> Option<Id> {
        self.ids.get(index).copied()
    }

    pub fn get_index(&self, id: Id) -> Option<Index> {
        self.indices.get(id).copied().flatten()
    }

    pub fn get_last_index(&self) -> Option<Index> {
        self.ids.len().checked_sub(1)
    }

    pub fn get_last_id(&self) -> Option<Id> {
        self.ids.last().copied()
    }

    pub fn contains(&self, id: Id) -> bool {
        self.get_index(id).is_some()
    }

    /// Live ids in buffer order.
    pub fn ids(&self) -> &[Id] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
