/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Two disconnected path components should end up occupying contiguous,
//! non-interleaved rank ranges.

use gecko_order::functional::FunctionalKind;
use gecko_order::graph::Graph;
use std::collections::HashSet;

#[test]
fn disconnected_components_stay_contiguous() {
    let n = 16u32;
    let mut g = Graph::new(2 * n);
    for i in 1..n {
        g.insert_arc(i, i + 1, 1.0, 1.0);
        g.insert_arc(i + 1, i, 1.0, 1.0);
    }
    for i in n + 1..2 * n {
        g.insert_arc(i, i + 1, 1.0, 1.0);
        g.insert_arc(i + 1, i, 1.0, 1.0);
    }

    g.order(&FunctionalKind::Geometric, 1, 4, 0, 1, None);

    let component_a: HashSet<u32> = (1..=n).collect();
    let ranks_a: Vec<u32> = component_a.iter().map(|&i| g.rank(i)).collect();
    let min_a = *ranks_a.iter().min().unwrap();
    let max_a = *ranks_a.iter().max().unwrap();
    assert_eq!(
        (max_a - min_a + 1) as usize,
        n as usize,
        "component A's ranks are not contiguous: {:?}",
        {
            let mut v = ranks_a.clone();
            v.sort();
            v
        }
    );

    let component_b: HashSet<u32> = (n + 1..=2 * n).collect();
    let ranks_b: Vec<u32> = component_b.iter().map(|&i| g.rank(i)).collect();
    let min_b = *ranks_b.iter().min().unwrap();
    let max_b = *ranks_b.iter().max().unwrap();
    assert_eq!((max_b - min_b + 1) as usize, n as usize);

    // The two contiguous ranges must not overlap.
    assert!(max_a < min_b || max_b < min_a);
}
