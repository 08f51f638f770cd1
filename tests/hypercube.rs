/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Hypercubes Q_d order into a Hamiltonicity-preserving permutation:
//! consecutive ranks remain connected by an edge.

use gecko_order::functional::FunctionalKind;
use gecko_order::graph::Graph;

/// Build the d-dimensional hypercube: 2^d nodes labeled 0..2^d-1 (node
/// index = label + 1), edges between labels differing in exactly one
/// bit.
fn hypercube(d: u32) -> Graph {
    let n = 1u32 << d;
    let mut g = Graph::new(n);
    // One pass, ascending source order: each node's full neighbor list
    // (both directions of every edge) is inserted while that node is
    // the current source, satisfying insert_arc's monotone-source rule.
    for i in 1..=n {
        let label = i - 1;
        for bit in 0..d {
            let neighbor_label = label ^ (1 << bit);
            let j = neighbor_label + 1;
            g.insert_arc(i, j, 1.0, 1.0);
        }
    }
    g
}

#[test]
fn hypercubes_order_with_every_rank_pair_adjacent() {
    for d in 1..=5u32 {
        let mut g = hypercube(d);
        g.order(&FunctionalKind::Geometric, 4, 6, 1, 1, None);
        let n = g.nodes();
        for r in 0..n - 1 {
            let i = g.permutation_at(r);
            let j = g.permutation_at(r + 1);
            assert!(
                g.arc_index(i, j) != 0,
                "Q_{}: rank {} and {} are not adjacent",
                d,
                r,
                r + 1
            );
        }
    }
}
