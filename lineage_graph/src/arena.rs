// Copyright 2025 the Lineage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Generational slot storage shared by vertices and edges.

/// Dense slots with a free list. Generations persist across frees so stale
/// `(index, generation)` pairs never resolve to a recycled slot.
#[derive(Clone, Debug)]
pub(crate) struct Slots<T> {
    items: Vec<Option<T>>,
    generations: Vec<u32>,
    free_list: Vec<usize>,
    live: usize,
}

impl<T> Default for Slots<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            live: 0,
        }
    }
}

impl<T> Slots<T> {
    pub(crate) fn insert(&mut self, item: T) -> (u32, u32) {
        self.live += 1;
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.items[idx] = Some(item);
            (idx, generation)
        } else {
            let generation = 1_u32;
            self.items.push(Some(item));
            self.generations.push(generation);
            (self.items.len() - 1, generation)
        };
        #[allow(
            clippy::cast_possible_truncation,
            reason = "Handles use 32-bit slot indices by design."
        )]
        (idx as u32, generation)
    }

    pub(crate) fn remove(&mut self, idx: usize, generation: u32) -> Option<T> {
        if self.generations.get(idx) != Some(&generation) {
            return None;
        }
        let item = self.items[idx].take()?;
        self.free_list.push(idx);
        self.live -= 1;
        Some(item)
    }

    pub(crate) fn get(&self, idx: usize, generation: u32) -> Option<&T> {
        if self.generations.get(idx) != Some(&generation) {
            return None;
        }
        self.items[idx].as_ref()
    }

    pub(crate) fn get_mut(&mut self, idx: usize, generation: u32) -> Option<&mut T> {
        if self.generations.get(idx) != Some(&generation) {
            return None;
        }
        self.items[idx].as_mut()
    }

    /// Drop every item while keeping generations, so pre-clear handles stay stale.
    pub(crate) fn clear(&mut self) {
        for item in &mut self.items {
            *item = None;
        }
        self.free_list.clear();
        self.free_list.extend((0..self.items.len()).rev());
        self.live = 0;
    }

    pub(crate) fn len(&self) -> usize {
        self.live
    }

    pub(crate) fn capacity(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn free_len(&self) -> usize {
        self.free_list.len()
    }

    /// Iterate `(index, generation, item)` over live slots in slot order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (u32, u32, &T)> + '_ {
        self.items.iter().enumerate().filter_map(|(i, item)| {
            let item = item.as_ref()?;
            #[allow(
                clippy::cast_possible_truncation,
                reason = "Slots never grow past u32::MAX entries; see `insert`."
            )]
            Some((i as u32, self.generations[i], item))
        })
    }
}
