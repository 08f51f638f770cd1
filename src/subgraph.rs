/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Exhaustive small-window permutation search: the engine's strongest,
//! most expensive local move, reserved for windows of a handful of
//! consecutive nodes in the permutation.

use std::collections::HashMap;

use itertools::Itertools;

use crate::functional::{FunctionalKind, WeightedSum, WeightedValue};
use crate::graph::{ArcIndex, Graph, NodeIndex};
use crate::scalar::F;

/// Reusable scratch state for optimizing successive windows of `n`
/// consecutive nodes in a graph's permutation. One instance is built
/// per call to the engine's window-optimization phase and fed one
/// window start at a time; each call to [`Subgraph::optimize`]
/// rebuilds its internal tables for the window at that start, since a
/// different set of nodes (and external neighbors) is in view.
pub(crate) struct Subgraph {
    n: usize,
}

impl Subgraph {
    /// Prepare to optimize windows of `n` consecutive nodes (`n` is
    /// clamped by the caller to both the permutation length and
    /// [`crate::graph::WINDOW_MAX`]).
    pub fn new(_g: &Graph, _functional: &FunctionalKind, n: u32) -> Self {
        Subgraph { n: n as usize }
    }

    /// Find and apply the lowest-cost arrangement of the `n` nodes at
    /// permutation positions `k..k+n`, holding every other node fixed.
    pub fn optimize(&mut self, g: &mut Graph, functional: &FunctionalKind, k: u32) {
        let n = self.n;
        if n <= 1 {
            return;
        }

        let window: Vec<NodeIndex> = (0..n as u32).map(|s| g.permutation_at(k + s)).collect();
        let mut slot_of: HashMap<NodeIndex, usize> = HashMap::with_capacity(n);
        for (s, &i) in window.iter().enumerate() {
            slot_of.insert(i, s);
        }
        let hlen: Vec<F> = window.iter().map(|&i| g.node_hlen(i)).collect();
        let left = g.node_pos(window[0]) - hlen[0];

        // Per window node: arcs leaving to nodes outside the window
        // (external, cost depends only on this node's own new
        // position) and arcs to other window nodes (internal, cost
        // depends on both new positions). Since every edge in the
        // graph is present as a pair of opposite arcs, counting a
        // node's own out-arcs once gives internal pairs double weight
        // (each side of the pair contributes its own arc) and external
        // contributions single weight; the external weight is doubled
        // below to match, mirroring the other, unscanned half of that
        // edge at the fixed neighbor.
        let mut external: Vec<Vec<ArcIndex>> = vec![Vec::new(); n];
        let mut internal: Vec<Vec<(usize, F)>> = vec![Vec::new(); n];
        for (s, &i) in window.iter().enumerate() {
            for a in g.node_begin(i)..g.node_end(i) {
                let j = g.arc_target(a);
                if let Some(&t) = slot_of.get(&j) {
                    internal[s].push((t, g.arc_weight(a)));
                } else {
                    external[s].push(a);
                }
            }
        }

        let mut best: Vec<usize> = (0..n).collect();
        let mut min = WeightedSum::default();
        let mut found = false;

        for perm in (0..n).permutations(n) {
            // perm[new_slot] = original window slot placed there.
            let mut pos = vec![0.0; n];
            let mut p = left;
            for &orig in &perm {
                p += hlen[orig];
                pos[orig] = p;
                p += hlen[orig];
            }

            let mut c = WeightedSum::default();
            for s in 0..n {
                for &a in &external[s] {
                    let l = (g.node_pos(g.arc_target(a)) - pos[s]).abs();
                    let w = 2.0 * g.arc_weight(a);
                    functional.accumulate(&mut c, WeightedValue::new(l, w));
                }
                for &(t, w) in &internal[s] {
                    let l = (pos[s] - pos[t]).abs();
                    functional.accumulate(&mut c, WeightedValue::new(l, w));
                }
            }

            if !found || functional.less(c, min) {
                found = true;
                min = c;
                best = perm;
            }
        }

        let new_window: Vec<NodeIndex> = best.iter().map(|&orig| window[orig]).collect();
        g.apply_window(k, &new_window);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functional::FunctionalKind;

    fn path(n: u32) -> Graph {
        let mut g = Graph::new(n);
        for i in 1..n {
            g.insert_arc(i, i + 1, 1.0, 1.0);
            g.insert_arc(i + 1, i, 1.0, 1.0);
        }
        g
    }

    #[test]
    fn optimizing_an_already_optimal_window_is_a_no_op() {
        let mut g = path(8);
        g.shuffle(0);
        let f = FunctionalKind::Arithmetic;
        g.order(&f, 1, 4, 0, 0, None);
        let before = g.cost(&f);
        let mut subgraph = Subgraph::new(&g, &f, 4);
        subgraph.optimize(&mut g, &f, 0);
        let after = g.cost(&f);
        assert!(after <= before + 1e-3);
    }

    #[test]
    fn window_of_one_is_a_no_op() {
        let mut g = path(4);
        g.order(&FunctionalKind::Arithmetic, 1, 4, 0, 1, None);
        let before = g.permutation().to_vec();
        let mut subgraph = Subgraph::new(&g, &FunctionalKind::Arithmetic, 1);
        subgraph.optimize(&mut g, &FunctionalKind::Arithmetic, 0);
        assert_eq!(g.permutation(), before.as_slice());
    }
}
