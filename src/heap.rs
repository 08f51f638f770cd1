/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! An indexed binary heap keyed by a floating-point priority, with an
//! auxiliary data-to-heap-position map so that `update`/`erase`/`find`
//! run in O(1) plus the cost of a single sift.
//!
//! The ordering ([`MinFirst`] or [`MaxFirst`]) is a type parameter rather
//! than a closure so that both directions the engine needs — a max-heap
//! for coarsening importance, a max-heap for refinement connectivity —
//! monomorphize to the same sift code without runtime dispatch.

use crate::scalar::F;

/// Selects whether the root of the heap holds the smallest or the
/// largest priority.
pub trait HeapOrder {
    /// Returns whether `a` belongs closer to the root than `b`.
    fn before(a: F, b: F) -> bool;
}

/// Root holds the smallest priority.
#[derive(Clone, Copy, Debug, Default)]
pub struct MinFirst;

impl HeapOrder for MinFirst {
    #[inline(always)]
    fn before(a: F, b: F) -> bool {
        a < b
    }
}

/// Root holds the largest priority.
#[derive(Clone, Copy, Debug, Default)]
pub struct MaxFirst;

impl HeapOrder for MaxFirst {
    #[inline(always)]
    fn before(a: F, b: F) -> bool {
        a > b
    }
}

#[derive(Clone, Copy, Debug)]
struct Entry {
    data: u32,
    priority: F,
}

/// An indexed priority queue over `u32` data keys in `1..=capacity`
/// (index `0` is never inserted, matching the graph's reserved null
/// index).
#[derive(Clone, Debug)]
pub struct IndexedHeap<O: HeapOrder = MinFirst> {
    heap: Vec<Entry>,
    // data -> position in `heap`, or `None` if not present.
    position: Vec<Option<u32>>,
    _order: std::marker::PhantomData<O>,
}

impl<O: HeapOrder> Default for IndexedHeap<O> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<O: HeapOrder> IndexedHeap<O> {
    /// Create an empty heap whose `position` map can address data keys
    /// in `0..capacity` without reallocating.
    pub fn new(capacity: usize) -> Self {
        IndexedHeap {
            heap: Vec::with_capacity(capacity),
            position: vec![None; capacity],
            _order: std::marker::PhantomData,
        }
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    fn ensure_capacity(&mut self, data: u32) {
        let needed = data as usize + 1;
        if self.position.len() < needed {
            self.position.resize(needed, None);
        }
    }

    /// Insert `data` with `priority`, or update it if already present.
    pub fn insert(&mut self, data: u32, priority: F) {
        self.ensure_capacity(data);
        if self.position[data as usize].is_some() {
            self.update(data, priority);
            return;
        }
        let i = self.heap.len() as u32;
        self.heap.push(Entry { data, priority });
        self.ascend(i);
    }

    /// Change the priority of an already-present `data`. No-op if absent.
    pub fn update(&mut self, data: u32, priority: F) {
        if let Some(i) = self.position_of(data) {
            self.heap[i as usize].priority = priority;
            self.ascend(i);
            self.descend(i);
        }
    }

    /// Look up the current priority of `data`.
    pub fn find(&self, data: u32) -> Option<F> {
        let i = self.position_of(data)?;
        Some(self.heap[i as usize].priority)
    }

    /// Peek at the root without removing it.
    pub fn peek(&self) -> Option<(u32, F)> {
        self.heap.first().map(|e| (e.data, e.priority))
    }

    /// Remove and return the root.
    pub fn extract(&mut self) -> Option<(u32, F)> {
        if self.heap.is_empty() {
            return None;
        }
        let root = self.heap[0];
        let last = (self.heap.len() - 1) as u32;
        self.swap(0, last);
        self.position[root.data as usize] = None;
        self.heap.pop();
        if !self.heap.is_empty() {
            self.descend(0);
        }
        Some((root.data, root.priority))
    }

    /// Remove `data` from the heap, wherever it is. Returns whether it
    /// was present.
    pub fn erase(&mut self, data: u32) -> bool {
        let Some(i) = self.position_of(data) else {
            return false;
        };
        let last = (self.heap.len() - 1) as u32;
        self.swap(i, last);
        self.position[data as usize] = None;
        self.heap.pop();
        if (i as usize) < self.heap.len() {
            self.ascend(i);
            self.descend(i);
        }
        true
    }

    #[inline(always)]
    fn position_of(&self, data: u32) -> Option<u32> {
        self.position.get(data as usize).copied().flatten()
    }

    #[inline(always)]
    fn parent(i: u32) -> u32 {
        i.saturating_sub(1) / 2
    }

    #[inline(always)]
    fn left(i: u32) -> u32 {
        2 * i + 1
    }

    #[inline(always)]
    fn right(i: u32) -> u32 {
        2 * i + 2
    }

    /// Is the entry at `i` at least as well-ordered as the entry at `j`?
    #[inline(always)]
    fn ordered(&self, i: u32, j: u32) -> bool {
        !O::before(self.heap[j as usize].priority, self.heap[i as usize].priority)
    }

    fn swap(&mut self, i: u32, j: u32) {
        self.heap.swap(i as usize, j as usize);
        self.position[self.heap[i as usize].data as usize] = Some(i);
        self.position[self.heap[j as usize].data as usize] = Some(j);
    }

    fn ascend(&mut self, mut i: u32) {
        while i != 0 {
            let p = Self::parent(i);
            if self.ordered(p, i) {
                break;
            }
            self.swap(i, p);
            i = p;
        }
        self.position[self.heap[i as usize].data as usize] = Some(i);
    }

    fn descend(&mut self, mut i: u32) {
        loop {
            let l = Self::left(i);
            let r = Self::right(i);
            let mut j = i;
            if (l as usize) < self.heap.len() && !self.ordered(j, l) {
                j = l;
            }
            if (r as usize) < self.heap.len() && !self.ordered(j, r) {
                j = r;
            }
            if j == i {
                break;
            }
            self.swap(i, j);
            i = j;
        }
        self.position[self.heap[i as usize].data as usize] = Some(i);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_heap_extracts_in_order() {
        let mut h = IndexedHeap::<MinFirst>::new(8);
        for (data, p) in [(1, 5.0), (2, 1.0), (3, 3.0), (4, 2.0)] {
            h.insert(data, p);
        }
        let mut out = vec![];
        while let Some((d, _)) = h.extract() {
            out.push(d);
        }
        assert_eq!(out, vec![2, 4, 3, 1]);
    }

    #[test]
    fn max_heap_extracts_in_order() {
        let mut h = IndexedHeap::<MaxFirst>::new(8);
        for (data, p) in [(1, 5.0), (2, 1.0), (3, 3.0), (4, 2.0)] {
            h.insert(data, p);
        }
        let mut out = vec![];
        while let Some((d, _)) = h.extract() {
            out.push(d);
        }
        assert_eq!(out, vec![1, 3, 4, 2]);
    }

    #[test]
    fn update_reorders() {
        let mut h = IndexedHeap::<MinFirst>::new(4);
        h.insert(1, 10.0);
        h.insert(2, 20.0);
        h.update(2, 1.0);
        assert_eq!(h.extract(), Some((2, 1.0)));
        assert_eq!(h.extract(), Some((1, 10.0)));
    }

    #[test]
    fn erase_removes_element() {
        let mut h = IndexedHeap::<MinFirst>::new(4);
        h.insert(1, 1.0);
        h.insert(2, 2.0);
        h.insert(3, 3.0);
        assert!(h.erase(2));
        assert!(!h.erase(2));
        let mut out = vec![];
        while let Some((d, _)) = h.extract() {
            out.push(d);
        }
        assert_eq!(out, vec![1, 3]);
    }

    #[test]
    fn find_reports_current_priority() {
        let mut h = IndexedHeap::<MinFirst>::new(4);
        assert_eq!(h.find(1), None);
        h.insert(1, 7.0);
        assert_eq!(h.find(1), Some(7.0));
    }

    #[test]
    fn empty_operations_return_false_or_none() {
        let mut h = IndexedHeap::<MinFirst>::new(0);
        assert!(h.is_empty());
        assert_eq!(h.extract(), None);
        assert!(!h.erase(0));
    }

    #[test]
    fn random_sequence_matches_sorted_reference() {
        use rand::Rng;
        let mut rng = rand::rng();
        let mut h = IndexedHeap::<MinFirst>::new(256);
        let mut reference = std::collections::BTreeMap::new();
        for data in 1..200u32 {
            let p = rng.random_range(-100.0..100.0);
            h.insert(data, p);
            reference.insert(data, p);
        }
        let mut expected: Vec<_> = reference.into_iter().collect();
        expected.sort_by(|a, b| a.1.total_cmp(&b.1));
        for (data, p) in expected {
            assert_eq!(h.extract(), Some((data, p)));
        }
    }
}
