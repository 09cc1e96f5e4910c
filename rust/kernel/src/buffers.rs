// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Growable parallel float attributes backing one mesh.
//!
//! Every attribute stores 3 components per element (xyz or rgb). Elements
//! written past `count` live in the backing array but are not part of the
//! logical buffer until [`BufferManager::update_count`] is called.

use crate::Index;

/// Components per element for every attribute.
pub const ITEM_SIZE: usize = 3;

/// A named float attribute with a logical element count.
#[derive(Debug, Clone)]
pub struct BufferAttribute {
    name: String,
    array: Vec<f32>,
    count: usize,
    /// Set whenever the consumer must re-upload the data.
    pub needs_update: bool,
}

impl BufferAttribute {
    pub fn new(name: impl Into<String>, array: Vec<f32>) -> Self {
        let count = array.len() / ITEM_SIZE;
        Self {
            name: name.into(),
            array,
            count,
            needs_update: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Backing storage, including slots beyond `count`.
    pub fn array(&self) -> &[f32] {
        &self.array
    }

    #[inline]
    pub fn get_x(&self, index: Index) -> f32 {
        self.array[index * ITEM_SIZE]
    }

    #[inline]
    pub fn get_y(&self, index: Index) -> f32 {
        self.array[index * ITEM_SIZE + 1]
    }

    #[inline]
    pub fn get_z(&self, index: Index) -> f32 {
        self.array[index * ITEM_SIZE + 2]
    }

    #[inline]
    pub fn get_xyz(&self, index: Index) -> [f32; 3] {
        let i = index * ITEM_SIZE;
        [self.array[i], self.array[i + 1], self.array[i + 2]]
    }

    #[inline]
    pub fn set_xyz(&mut self, index: Index, x: f32, y: f32, z: f32) {
        let i = index * ITEM_SIZE;
        self.array[i] = x;
        self.array[i + 1] = y;
        self.array[i + 2] = z;
    }

    /// Copies the element at `from` over the element at `to`.
    #[inline]
    pub fn copy_element(&mut self, from: Index, to: Index) {
        let [x, y, z] = self.get_xyz(from);
        self.set_xyz(to, x, y, z);
    }

    /// Swaps the backing array for one of `capacity` floats, keeping the
    /// overlapping prefix and zero-filling the rest.
    fn resize(&mut self, capacity: usize) {
        self.array.resize(capacity, 0.0);
    }
}

/// Owner of the attributes of one mesh, kept at equal count and capacity.
#[derive(Debug, Clone)]
pub struct BufferManager {
    attributes: Vec<BufferAttribute>,
    /// Allocated floats per attribute.
    capacity: usize,
    buffer_increase: usize,
}

impl BufferManager {
    pub fn new(buffer_increase: usize) -> Self {
        Self {
            attributes: Vec::new(),
            capacity: 0,
            buffer_increase,
        }
    }

    /// Creates an empty attribute, replacing any attribute with the same name.
    pub fn create_attribute(&mut self, name: &str) {
        let attribute = BufferAttribute {
            name: name.to_string(),
            array: vec![0.0; self.capacity],
            count: self.size(),
            needs_update: true,
        };
        self.insert(attribute);
    }

    /// Registers an existing attribute, fitting it to the current capacity.
    pub fn add_attribute(&mut self, mut attribute: BufferAttribute) {
        attribute.resize(self.capacity);
        attribute.count = self.size();
        attribute.needs_update = true;
        self.insert(attribute);
    }

    fn insert(&mut self, attribute: BufferAttribute) {
        match self.attributes.iter_mut().find(|a| a.name == attribute.name) {
            Some(existing) => *existing = attribute,
            None => self.attributes.push(attribute),
        }
    }

    /// Drops every element of every attribute.
    pub fn reset_attributes(&mut self) {
        self.capacity = 0;
        for attribute in &mut self.attributes {
            attribute.array = Vec::new();
            attribute.count = 0;
            attribute.needs_update = true;
        }
    }

    /// Makes room for `increase` new elements past the current count.
    pub fn resize_if_needed(&mut self, increase: usize) {
        let needed = (self.size() + increase) * ITEM_SIZE;
        if needed <= self.capacity {
            return;
        }

        let growth = (needed - self.capacity).max(self.buffer_increase);
        self.capacity += growth;
        tracing::debug!(capacity = self.capacity, growth, "Growing geometry buffers");
        for attribute in &mut self.attributes {
            attribute.resize(self.capacity);
        }
    }

    /// Sets the logical element count of every attribute.
    pub fn update_count(&mut self, count: usize) {
        for attribute in &mut self.attributes {
            attribute.count = count;
            attribute.needs_update = true;
        }
    }

    /// Logical element count (the count of the first attribute).
    pub fn size(&self) -> usize {
        self.attributes.first().map_or(0, |a| a.count)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn attribute(&self, name: &str) -> Option<&BufferAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn attribute_mut(&mut self, name: &str) -> Option<&mut BufferAttribute> {
        self.attributes.iter_mut().find(|a| a.name == name)
    }

    pub fn attributes(&self) -> &[BufferAttribute] {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut [BufferAttribute] {
        &mut self.attributes
    }

    /// Writes one element into a named attribute. Unknown names are ignored.
    pub fn set(&mut self, name: &str, index: Index, value: [f32; 3]) {
        if let Some(attribute) = self.attribute_mut(name) {
            attribute.set_xyz(index, value[0], value[1], value[2]);
            attribute.needs_update = true;
        }
    }

    pub fn get(&self, name: &str, index: Index) -> Option<[f32; 3]> {
        self.attribute(name).map(|a| a.get_xyz(index))
    }

    /// Copies element `from` over element `to` in every attribute.
    pub fn copy_element(&mut self, from: Index, to: Index) {
        for attribute in &mut self.attributes {
            attribute.copy_element(from, to);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> BufferManager {
        let mut buffers = BufferManager::new(300);
        buffers.create_attribute("position");
        buffers.create_attribute("color");
        buffers
    }

    #[test]
    fn growth_is_at_least_the_buffer_increase() {
        let mut buffers = manager();
        buffers.resize_if_needed(1);
        assert_eq!(buffers.capacity(), 300);
        assert!(buffers.attributes().iter().all(|a| a.array().len() == 300));
    }

    #[test]
    fn large_requests_grow_past_the_increase() {
        let mut buffers = manager();
        buffers.resize_if_needed(250);
        assert!(buffers.capacity() >= 750);
    }

    #[test]
    fn capacity_never_decreases_and_covers_requests() {
        let mut buffers = manager();
        let mut last = 0;
        for step in 1..40 {
            let before = buffers.size();
            buffers.resize_if_needed(step * 5);
            assert!(buffers.capacity() >= last);
            assert!(buffers.capacity() >= (before + step * 5) * ITEM_SIZE);
            buffers.update_count(before + step * 5);
            last = buffers.capacity();
        }
    }

    #[test]
    fn data_survives_reallocation() {
        let mut buffers = manager();
        buffers.resize_if_needed(2);
        buffers.set("position", 0, [1.5, -2.0, 3.25]);
        buffers.set("color", 1, [0.1, 0.2, 0.3]);
        buffers.update_count(2);

        buffers.resize_if_needed(1000);

        assert_eq!(buffers.get("position", 0), Some([1.5, -2.0, 3.25]));
        assert_eq!(buffers.get("color", 1), Some([0.1, 0.2, 0.3]));
        assert_eq!(buffers.get("position", 500), Some([0.0, 0.0, 0.0]));
    }

    #[test]
    fn elements_are_invisible_until_count_is_updated() {
        let mut buffers = manager();
        buffers.resize_if_needed(3);
        buffers.set("position", 2, [1.0, 1.0, 1.0]);
        assert_eq!(buffers.size(), 0);
        buffers.update_count(3);
        assert!(buffers.attributes().iter().all(|a| a.count() == 3 && a.needs_update));
    }

    #[test]
    fn added_attributes_match_existing_capacity() {
        let mut buffers = manager();
        buffers.resize_if_needed(10);
        buffers.update_count(10);
        buffers.add_attribute(BufferAttribute::new("normal", vec![0.0, 1.0, 0.0]));

        let normal = buffers.attribute("normal").unwrap();
        assert_eq!(normal.array().len(), buffers.capacity());
        assert_eq!(normal.count(), 10);
        assert_eq!(normal.get_xyz(0), [0.0, 1.0, 0.0]);
    }

    #[test]
    fn create_attribute_replaces_by_name() {
        let mut buffers = manager();
        buffers.resize_if_needed(1);
        buffers.set("color", 0, [1.0, 1.0, 1.0]);
        buffers.create_attribute("color");
        assert_eq!(buffers.attributes().len(), 2);
        assert_eq!(buffers.get("color", 0), Some([0.0, 0.0, 0.0]));
    }

    #[test]
    fn reset_drops_everything() {
        let mut buffers = manager();
        buffers.resize_if_needed(4);
        buffers.update_count(4);
        buffers.reset_attributes();
        assert_eq!(buffers.size(), 0);
        assert_eq!(buffers.capacity(), 0);
    }
}
