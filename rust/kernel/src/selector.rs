// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Set-based selection over a universe of valid ids.

use rustc_hash::FxHashSet;

use crate::Id;

#[derive(Debug, Clone, Default)]
pub struct Selector {
    data: FxHashSet<Id>,
}

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects or deselects `ids`, ignoring any id not in `all_items`.
    ///
    /// Returns exactly the ids whose state flipped.
    pub fn select<I, A>(&mut self, active: bool, ids: I, all_items: A) -> Vec<Id>
    where
        I: IntoIterator<Item = Id>,
        A: IntoIterator<Item = Id>,
    {
        let valid: FxHashSet<Id> = all_items.into_iter().collect();
        let mut changed = Vec::new();
        for id in ids {
            if !valid.contains(&id) {
                continue;
            }
            let flipped = if active {
                self.data.insert(id)
            } else {
                self.data.remove(&id)
            };
            if flipped {
                changed.push(id);
            }
        }
        changed
    }

    /// Returns the ids of `ids` that are not selected.
    pub fn get_unselected<I: IntoIterator<Item = Id>>(&self, ids: I) -> Vec<Id> {
        ids.into_iter().filter(|id| !self.data.contains(id)).collect()
    }

    /// Forgets ids without reporting them, used when entities are deleted.
    pub fn forget<I: IntoIterator<Item = Id>>(&mut self, ids: I) {
        for id in ids {
            self.data.remove(&id);
        }
    }

    pub fn is_selected(&self, id: Id) -> bool {
        self.data.contains(&id)
    }

    pub fn selected(&self) -> &FxHashSet<Id> {
        &self.data
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_only_flipped_ids() {
        let mut selector = Selector::new();
        let all = [0, 1, 2, 3];

        let changed = selector.select(true, [0, 1], all);
        assert_eq!(changed, vec![0, 1]);

        let changed = selector.select(true, [1, 2], all);
        assert_eq!(changed, vec![2]);

        let changed = selector.select(false, [0, 3], all);
        assert_eq!(changed, vec![0]);
    }

    #[test]
    fn ignores_ids_outside_the_universe() {
        let mut selector = Selector::new();
        let changed = selector.select(true, [5, 1], [1, 2]);
        assert_eq!(changed, vec![1]);
        assert!(!selector.is_selected(5));
    }

    #[test]
    fn unselected_filters_the_selection() {
        let mut selector = Selector::new();
        selector.select(true, [1], [0, 1, 2]);
        assert_eq!(selector.get_unselected([0, 1, 2]), vec![0, 2]);
    }
}
