/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! A path graph should order back into a Hamiltonian path: consecutive
//! ranks are always connected by an edge.

use gecko_order::functional::FunctionalKind;
use gecko_order::graph::Graph;

fn path(n: u32) -> Graph {
    let mut g = Graph::new(n);
    for i in 1..n {
        g.insert_arc(i, i + 1, 1.0, 1.0);
        g.insert_arc(i + 1, i, 1.0, 1.0);
    }
    g
}

fn assert_hamiltonian_path(g: &Graph) {
    let n = g.nodes();
    for r in 0..n - 1 {
        let i = g.permutation_at(r);
        let j = g.permutation_at(r + 1);
        assert!(
            g.arc_index(i, j) != 0,
            "rank {} ({}) and rank {} ({}) are not adjacent",
            r,
            i,
            r + 1,
            j
        );
    }
}

#[test]
fn path_1024_orders_into_hamiltonian_path() {
    let mut g = path(1024);
    g.order(&FunctionalKind::Geometric, 1, 4, 0, 1, None);
    assert_hamiltonian_path(&g);
}

#[test]
#[cfg(feature = "slow_tests")]
fn path_65536_orders_into_hamiltonian_path() {
    let mut g = path(65536);
    g.order(&FunctionalKind::Geometric, 1, 4, 0, 1, None);
    assert_hamiltonian_path(&g);
}
