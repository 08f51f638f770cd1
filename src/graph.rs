/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The multilevel graph: indexed adjacency storage, the construction
//! API, and the ordering engine (coarsen/refine, relaxation, the
//! V-cycle scheduler and the outer iteration loop).

use crate::functional::{FunctionalKind, WeightedSum, WeightedValue};
use crate::heap::{IndexedHeap, MaxFirst};
use crate::progress::{NoopProgress, Progress};
use crate::scalar::{Lcg, F};
use crate::subgraph::Subgraph;

/// Index of a node. `0` is a reserved null; valid nodes start at `1`.
pub type NodeIndex = u32;
/// Index of an arc. `0` is a reserved null; valid arcs start at `1`.
pub type ArcIndex = u32;

/// Ratio of max to min bond for a fine node's connections to be kept
/// during aggregation (§4.4 step 3).
const PART_FRAC: F = 4.0;
/// Number of compatible relaxation sweeps per V-cycle level.
const CR_SWEEPS: u32 = 1;
/// Number of Gauss-Seidel relaxation sweeps per V-cycle level.
const GS_SWEEPS: u32 = 1;
/// Upper bound on the small-window permutation search size.
pub const WINDOW_MAX: u32 = 16;

/// One vertex of the multilevel graph, plus the reserved sentinel at
/// index `0`.
#[derive(Clone, Copy, Debug)]
pub struct Node {
    /// Current 1-D position; `< 0` means "not yet placed".
    pub pos: F,
    /// Half of the node's length along the line.
    pub hlen: F,
    /// One-past-the-last arc index of this node's outgoing arcs.
    pub arc_end: ArcIndex,
    /// Index of this node's aggregate in the next coarser level, or
    /// `0` (null) if this node did not survive coarsening as a seed.
    pub parent: NodeIndex,
}

impl Node {
    fn new(length: F) -> Self {
        Node {
            pos: -1.0,
            hlen: 0.5 * length,
            arc_end: 0,
            parent: 0,
        }
    }
}

/// The multilevel graph: nodes, a CSR-style adjacency array, and the
/// current permutation.
#[derive(Clone, Debug)]
pub struct Graph {
    node: Vec<Node>,
    adj: Vec<NodeIndex>,
    weight: Vec<F>,
    bond: Vec<F>,
    perm: Vec<NodeIndex>,
    level: u32,
    last_node: NodeIndex,
    rng: Lcg,
}

impl Graph {
    /// Create a graph pre-allocating `n` nodes (indices `1..=n`) with
    /// `hlen = 0.5` each.
    pub fn new(n: u32) -> Self {
        let mut g = Graph {
            node: vec![Node {
                pos: -1.0,
                hlen: 0.0,
                arc_end: 1,
                parent: 0,
            }],
            adj: vec![0],
            weight: vec![0.0],
            bond: vec![0.0],
            perm: Vec::new(),
            level: 0,
            last_node: 0,
            rng: Lcg::default(),
        };
        for _ in 0..n {
            g.insert_node(1.0);
        }
        g
    }

    fn new_level(n: u32, level: u32) -> Self {
        let mut g = Self::new(n);
        g.level = level;
        g
    }

    /// Number of nodes (excluding the sentinel).
    pub fn nodes(&self) -> u32 {
        self.node.len() as u32 - 1
    }

    /// Number of (undirected) edges.
    pub fn edges(&self) -> u32 {
        (self.adj.len() as u32 - 1) / 2
    }

    /// Append a node with the given length and return its index.
    pub fn insert_node(&mut self, length: F) -> NodeIndex {
        assert!(length > 0.0, "node length must be positive");
        let p = self.node.len() as NodeIndex;
        self.perm.push(p);
        self.node.push(Node::new(length));
        p
    }

    /// Begin of node `i`'s outgoing arc range.
    pub fn node_begin(&self, i: NodeIndex) -> ArcIndex {
        self.node[(i - 1) as usize].arc_end
    }

    /// End (exclusive) of node `i`'s outgoing arc range.
    pub fn node_end(&self, i: NodeIndex) -> ArcIndex {
        self.node[i as usize].arc_end
    }

    pub fn node_degree(&self, i: NodeIndex) -> u32 {
        self.node_end(i) - self.node_begin(i)
    }

    pub fn node_neighbors(&self, i: NodeIndex) -> Vec<NodeIndex> {
        (self.node_begin(i)..self.node_end(i))
            .map(|a| self.adj[a as usize])
            .collect()
    }

    /// Position of node `i` in the current layout (`-1` if unplaced).
    pub fn node_pos(&self, i: NodeIndex) -> F {
        self.node[i as usize].pos
    }

    pub fn node_hlen(&self, i: NodeIndex) -> F {
        self.node[i as usize].hlen
    }

    /// Insert directed arc `(i, j)`. Requires `1 <= i, j <= nodes()`,
    /// `i != j`, and `i` not earlier in source order than the last
    /// inserted arc's source. Returns `None` without mutating on any
    /// violation.
    pub fn insert_arc(&mut self, i: NodeIndex, j: NodeIndex, w: F, b: F) -> Option<ArcIndex> {
        if i == 0 || j == 0 || i == j || !(self.last_node <= i && i <= self.nodes()) {
            return None;
        }
        self.last_node = i;
        let mut k = i - 1;
        loop {
            if self.node[k as usize].arc_end != 0 {
                break;
            }
            self.node[k as usize].arc_end = self.adj.len() as ArcIndex;
            if k == 0 {
                break;
            }
            k -= 1;
        }
        self.adj.push(j);
        self.weight.push(w);
        self.bond.push(b);
        self.node[i as usize].arc_end = self.adj.len() as ArcIndex;
        Some(self.adj.len() as ArcIndex - 1)
    }

    /// Remove arc `a`. Returns `false` if `a` is null.
    pub fn remove_arc_at(&mut self, a: ArcIndex) -> bool {
        if a == 0 {
            return false;
        }
        let i = self.arc_source(a);
        self.adj.remove(a as usize);
        self.weight.remove(a as usize);
        self.bond.remove(a as usize);
        for k in (i as usize)..self.node.len() {
            self.node[k].arc_end -= 1;
        }
        true
    }

    /// Remove directed arc `(i, j)`.
    pub fn remove_arc(&mut self, i: NodeIndex, j: NodeIndex) -> bool {
        self.remove_arc_at(self.arc_index(i, j))
    }

    /// Remove both directed arcs of edge `{i, j}`.
    pub fn remove_edge(&mut self, i: NodeIndex, j: NodeIndex) -> bool {
        self.remove_arc(i, j) && self.remove_arc(j, i)
    }

    /// Index of arc `(i, j)`, or `0` (null) if not present.
    pub fn arc_index(&self, i: NodeIndex, j: NodeIndex) -> ArcIndex {
        for a in self.node_begin(i)..self.node_end(i) {
            if self.adj[a as usize] == j {
                return a;
            }
        }
        0
    }

    pub fn arc_target(&self, a: ArcIndex) -> NodeIndex {
        self.adj[a as usize]
    }

    pub fn arc_weight(&self, a: ArcIndex) -> F {
        self.weight[a as usize]
    }

    /// Source node of arc `a`, recovered by re-traversing the target's
    /// adjacency to find the interval containing `a`. A cost/space
    /// trade-off noted in the design: an explicit source index per arc
    /// would make this O(1) at the price of one extra word per arc.
    ///
    /// # Panics
    /// Panics if no such interval exists — this indicates corrupted
    /// internal state (a bug to catch in tests, not to recover from).
    pub fn arc_source(&self, a: ArcIndex) -> NodeIndex {
        let j = self.adj[a as usize];
        for b in self.node_begin(j)..self.node_end(j) {
            let i = self.adj[b as usize];
            if self.node_begin(i) <= a && a < self.node_end(i) {
                return i;
            }
        }
        panic!("internal data structure corrupted: arc {} has no source", a);
    }

    /// Reverse arc `(j, i)` of arc `a = (i, j)`, or `0` if absent.
    pub fn reverse_arc(&self, a: ArcIndex) -> ArcIndex {
        let j = self.adj[a as usize];
        for b in self.node_begin(j)..self.node_end(j) {
            let i = self.adj[b as usize];
            if self.node_begin(i) <= a && a < self.node_end(i) {
                return b;
            }
        }
        0
    }

    /// First directed arc lacking a reverse, or `None` if the graph is
    /// fully undirected.
    pub fn directed(&self) -> Option<ArcIndex> {
        for i in 1..=self.nodes() {
            for a in self.node_begin(i)..self.node_end(i) {
                let j = self.adj[a as usize];
                if self.arc_index(j, i) == 0 {
                    return Some(a);
                }
            }
        }
        None
    }

    fn persistent(&self, i: NodeIndex) -> bool {
        self.node[i as usize].parent != 0
    }

    /// Whether node `i` is a persistent seed (survived coarsening), for
    /// the drawing backend's fill-shade convention.
    pub fn is_persistent(&self, i: NodeIndex) -> bool {
        self.persistent(i)
    }

    fn placed(&self, i: NodeIndex) -> bool {
        self.node[i as usize].pos >= 0.0
    }

    fn length_nodes(&self, i: NodeIndex, j: NodeIndex) -> F {
        (self.node[i as usize].pos - self.node[j as usize].pos).abs()
    }

    /// Distance between the current positions of `i` and `j`, for the
    /// drawing backend.
    pub fn length_between(&self, i: NodeIndex, j: NodeIndex) -> F {
        self.length_nodes(i, j)
    }

    fn length(&self, a: ArcIndex) -> F {
        let i = self.arc_source(a);
        let j = self.arc_target(a);
        self.length_nodes(i, j)
    }

    /// Ordered list of nodes: `permutation()[k]` is the node at rank `k`.
    pub fn permutation(&self) -> &[NodeIndex] {
        &self.perm
    }

    pub fn permutation_at(&self, rank: u32) -> NodeIndex {
        self.perm[rank as usize]
    }

    /// Rank (`0..nodes()`) of node `i` in the current layout.
    pub fn rank(&self, i: NodeIndex) -> u32 {
        self.node[i as usize].pos.floor() as u32
    }

    /// Cost of the current layout under `functional`.
    pub fn cost(&self, functional: &FunctionalKind) -> F {
        if self.edges() == 0 {
            return 0.0;
        }
        let mut c = WeightedSum::default();
        let mut i: NodeIndex = 1;
        for a in 1..self.adj.len() as ArcIndex {
            while self.node_end(i) <= a {
                i += 1;
            }
            let j = self.arc_target(a);
            let l = self.length_nodes(i, j);
            let w = self.weight[a as usize];
            functional.accumulate(&mut c, WeightedValue::new(l, w));
        }
        functional.mean(c)
    }

    /// Optimal 1-D position of node `i` given the current positions of
    /// its already-placed neighbors.
    fn optimal(&self, functional: &FunctionalKind, i: NodeIndex) -> F {
        let mut v = Vec::new();
        for a in self.node_begin(i)..self.node_end(i) {
            let j = self.adj[a as usize];
            if self.placed(j) {
                v.push(WeightedValue::new(self.node[j as usize].pos, self.weight[a as usize]));
            }
        }
        if v.is_empty() {
            -1.0
        } else {
            functional.optimum(&v)
        }
    }

    /// Add contribution `(w, b)` of a fine arc to coarse arc `(i, j)`,
    /// creating it if absent.
    fn update(&mut self, i: NodeIndex, j: NodeIndex, w: F, b: F) {
        let a = self.arc_index(i, j);
        if a == 0 {
            self.insert_arc(i, j, w, b);
        } else {
            self.weight[a as usize] += w;
            self.bond[a as usize] += b;
        }
    }

    /// Transfer the contribution of fine arc `a` (scaled by `f`) to
    /// coarse node `p`, distributing via `part` through non-persistent
    /// intermediates when the arc's target has no coarse image yet.
    fn transfer(&self, g: &mut Graph, part: &[F], p: NodeIndex, a: ArcIndex, f: F) {
        let w = f * self.weight[a as usize];
        let m = f * self.bond[a as usize];
        let j = self.arc_target(a);
        let q = self.node[j as usize].parent;
        if q == 0 {
            for b in self.node_begin(j)..self.node_end(j) {
                if part[b as usize] > 0.0 {
                    let q2 = self.node[self.adj[b as usize] as usize].parent;
                    if q2 != p {
                        g.update(p, q2, w * part[b as usize], m * part[b as usize]);
                    }
                }
            }
        } else {
            g.update(p, q, w, m);
        }
    }

    /// Build a coarse graph with roughly half the number of nodes.
    fn coarsen(&mut self, functional: &FunctionalKind, progress: &mut dyn Progress) -> Graph {
        progress.begin_phase(self, "coarse");
        let mut g = Graph::new_level(0, self.level.saturating_sub(1));

        // Importance of each fine node: total outgoing bond.
        let mut heap = IndexedHeap::<MaxFirst>::new(self.node.len());
        for i in 1..=self.nodes() {
            self.node[i as usize].parent = 0;
            let mut w = 0.0;
            for a in self.node_begin(i)..self.node_end(i) {
                w += self.bond[a as usize];
            }
            heap.insert(i, w);
        }

        // Select the seeds that remain in the coarse graph.
        let mut child: Vec<NodeIndex> = vec![0];
        while let Some((i, w)) = heap.extract() {
            if w < 0.0 {
                break;
            }
            child.push(i);
            let new_parent = g.insert_node(2.0 * self.node[i as usize].hlen);
            self.node[i as usize].parent = new_parent;

            for a in self.node_begin(i)..self.node_end(i) {
                let j = self.adj[a as usize];
                if let Some(w) = heap.find(j) {
                    heap.update(j, w - 2.0 * self.bond[a as usize]);
                }
            }
        }

        // Fractional assignment of remaining nodes to aggregates.
        let mut part = self.bond.clone();
        for i in 1..=self.nodes() {
            if self.persistent(i) {
                continue;
            }
            let mut w = 0.0;
            let mut max = 0.0;
            for a in self.node_begin(i)..self.node_end(i) {
                let j = self.adj[a as usize];
                if self.persistent(j) {
                    w += part[a as usize];
                    if max < part[a as usize] {
                        max = part[a as usize];
                    }
                } else {
                    part[a as usize] = -1.0;
                }
            }
            max /= PART_FRAC;

            for a in self.node_begin(i)..self.node_end(i) {
                if part[a as usize] > 0.0 && part[a as usize] < max {
                    w -= part[a as usize];
                    part[a as usize] = -1.0;
                }
            }

            for a in self.node_begin(i)..self.node_end(i) {
                if part[a as usize] > 0.0 {
                    part[a as usize] /= w;
                    let p = self.node[self.adj[a as usize] as usize].parent;
                    g.node[p as usize].hlen += part[a as usize] * self.node[i as usize].hlen;
                }
            }
        }

        // Transfer arcs to the coarse graph.
        for p in 1..g.node.len() as NodeIndex {
            let i = child[p as usize];
            for a in self.node_begin(i)..self.node_end(i) {
                self.transfer(&mut g, &part, p, a, 1.0);
                let j = self.adj[a as usize];
                if !self.persistent(j) {
                    let b = self.arc_index(j, i);
                    if part[b as usize] > 0.0 {
                        for c in self.node_begin(j)..self.node_end(j) {
                            let k = self.adj[c as usize];
                            if k != i {
                                self.transfer(&mut g, &part, p, c, part[b as usize]);
                            }
                        }
                    }
                }
            }
        }

        debug_assert!(g.directed().is_none(), "coarsening produced a directed edge");

        self.bond.shrink_to_fit();
        progress.end_phase(self, false);
        g
    }

    /// Initialize this (finer) graph's layout from the coarse graph's
    /// solved layout.
    fn refine(&mut self, coarse: &Graph, progress: &mut dyn Progress, functional: &FunctionalKind) {
        progress.begin_phase(self, "refine");

        let mut heap = IndexedHeap::<MaxFirst>::new(self.node.len());
        for i in 1..=self.nodes() {
            if self.persistent(i) {
                let p = self.node[i as usize].parent;
                self.node[i as usize].pos = coarse.node[p as usize].pos;
            } else {
                self.node[i as usize].pos = -1.0;
                let mut w = 0.0;
                for a in self.node_begin(i)..self.node_end(i) {
                    let j = self.adj[a as usize];
                    if self.persistent(j) {
                        w += self.weight[a as usize];
                    }
                }
                heap.insert(i, w);
            }
        }

        while let Some((i, _)) = heap.extract() {
            self.node[i as usize].pos = self.optimal(functional, i);
            for a in self.node_begin(i)..self.node_end(i) {
                let j = self.adj[a as usize];
                if let Some(w) = heap.find(j) {
                    heap.update(j, w + self.weight[a as usize]);
                }
            }
        }

        self.place(true, 0, self.perm.len() as u32);
        progress.end_phase(self, true);
    }

    /// Perform `m` sweeps of compatible (`compatible = true`, persistent
    /// nodes held fixed) or Gauss-Seidel (`compatible = false`, all
    /// nodes relaxed) relaxation.
    fn relax(&mut self, functional: &FunctionalKind, progress: &mut dyn Progress, compatible: bool, m: u32) {
        progress.begin_phase(self, if compatible { "crelax" } else { "frelax" });
        for _ in 0..m {
            for k in 0..self.perm.len() {
                let i = self.perm[k];
                if !compatible || !self.persistent(i) {
                    self.node[i as usize].pos = self.optimal(functional, i);
                }
            }
        }
        self.place(true, 0, self.perm.len() as u32);
        progress.end_phase(self, true);
    }

    /// Optimize successive `n`-node windows of the permutation by
    /// exhaustive search.
    fn optimize(&mut self, functional: &FunctionalKind, progress: &mut dyn Progress, n: u32) {
        let n = n.min(self.perm.len() as u32);
        progress.begin_phase(self, &format!("perm{:2}", n));
        let mut subgraph = Subgraph::new(self, functional, n);
        let last = self.perm.len() as u32 - n;
        for k in 0..=last {
            if progress.quit() {
                break;
            }
            subgraph.optimize(self, functional, k);
        }
        progress.end_phase(self, true);
    }

    /// Assign canonical positions to the whole permutation, optionally
    /// stable-sorting it by position first.
    fn place_all(&mut self, sort: bool) {
        let n = self.perm.len() as u32;
        self.place(sort, 0, n);
    }

    /// Assign canonical positions to nodes `{k, ..., k + n - 1}` of the
    /// permutation, optionally stable-sorting that range by position
    /// first.
    fn place(&mut self, sort: bool, k: u32, n: u32) {
        if sort {
            let node = &self.node;
            self.perm[k as usize..(k + n) as usize]
                .sort_by(|&a, &b| node[a as usize].pos.partial_cmp(&node[b as usize].pos).unwrap());
        }
        let mut p = if k > 0 {
            let prev = self.perm[(k - 1) as usize];
            self.node[prev as usize].pos + self.node[prev as usize].hlen
        } else {
            0.0
        };
        for idx in k..(k + n) {
            let i = self.perm[idx as usize];
            p += self.node[i as usize].hlen;
            self.node[i as usize].pos = p;
            p += self.node[i as usize].hlen;
        }
    }

    /// Overwrite the window `perm[k..k+n]` with `window` (a reordering
    /// of the same node indices) and re-canonicalize just that range.
    pub(crate) fn apply_window(&mut self, k: u32, window: &[NodeIndex]) {
        self.perm[k as usize..k as usize + window.len()].copy_from_slice(window);
        self.place(false, k, window.len() as u32);
    }

    /// Perform one V-cycle: recursively coarsen, solve, and refine, then
    /// relax and optimize at this level.
    fn vcycle(&mut self, functional: &FunctionalKind, progress: &mut dyn Progress, n: u32, work: u64) {
        if n < self.nodes() && self.nodes() < self.edges() && self.level > 0 && !progress.quit() {
            let mut g = self.coarsen(functional, progress);
            g.vcycle(functional, progress, n, work + self.edges() as u64);
            self.refine(&g, progress, functional);
        } else {
            self.place_all(false);
        }
        if self.edges() > 0 {
            self.relax(functional, progress, true, CR_SWEEPS);
            self.relax(functional, progress, false, GS_SWEEPS);
            let mut n = n;
            let mut w = self.edges() as u64;
            while w * (n as u64 + 1) < work {
                n += 1;
                w *= n as u64;
            }
            let n = n.min(WINDOW_MAX);
            if n > 0 {
                self.optimize(functional, progress, n);
            }
        }
    }

    /// Shuffle the permutation using the Graph-owned LCG, then
    /// canonicalize positions. A nonzero `seed` reseeds the generator
    /// first; `seed = 0` continues the existing rolling state.
    pub fn shuffle(&mut self, seed: u32) {
        self.rng.random(seed);
        let n = self.perm.len();
        for k in 0..n {
            let r = (self.rng.random(0) >> 8) as usize;
            let l = k + r % (n - k);
            self.perm.swap(k, l);
        }
        self.place_all(false);
    }

    /// Recompute arc bonds for the `k`'th V-cycle using the current
    /// layout.
    fn reweight(&mut self, functional: &FunctionalKind, k: u32) {
        self.bond.resize(self.weight.len(), 0.0);
        for a in 1..self.adj.len() as ArcIndex {
            self.bond[a as usize] = functional.bond(self.weight[a as usize], self.length(a), k);
        }
    }

    /// Run the multilevel ordering engine.
    ///
    /// `iterations` V-cycles are performed, each preceded by a bond
    /// reweighting step that steepens with the iteration count; `window`
    /// is the initial small-window search size, grown by one every
    /// `period` iterations (never, if `period == 0`); `seed`, if
    /// nonzero, shuffles the initial permutation before the first
    /// V-cycle. The permutation and rank queries reflect the best
    /// layout observed across all iterations once this returns.
    pub fn order(
        &mut self,
        functional: &FunctionalKind,
        iterations: u32,
        mut window: u32,
        period: u32,
        seed: u32,
        progress: Option<&mut dyn Progress>,
    ) {
        let mut default_progress = NoopProgress;
        let progress: &mut dyn Progress = match progress {
            Some(p) => p,
            None => &mut default_progress,
        };

        self.level = 0;
        while (1u32 << self.level) < self.nodes() {
            self.level += 1;
        }
        self.place_all(false);
        let mut mincost = self.cost(functional);
        let mut minperm = self.perm.clone();
        if seed != 0 {
            self.shuffle(seed);
        }

        progress.begin_order(self, mincost);
        if self.edges() > 0 {
            for k in 1..=iterations {
                if progress.quit() {
                    break;
                }
                progress.begin_iter(self, k, iterations, window);
                self.reweight(functional, k);
                self.vcycle(functional, progress, window, 0);
                let c = self.cost(functional);
                if c < mincost {
                    mincost = c;
                    minperm = self.perm.clone();
                }
                progress.end_iter(self, mincost, c);
                if period != 0 && k % period == 0 {
                    window += 1;
                }
            }
            self.perm = minperm;
            self.place_all(false);
        }
        progress.end_order(self, mincost);
    }
}
