/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

#![doc = include_str!("../README.md")]

//! A multilevel ordering engine: given an undirected weighted graph, it
//! computes a permutation of the vertices minimizing a weighted p-mean
//! of edge lengths (the distance, in the permutation, between an edge's
//! two endpoints). See the [`graph`] module for the engine itself, and
//! [`functional`] for the family of p-means it can minimize against.

pub mod chaco;
pub mod config;
pub mod functional;
pub mod graph;
pub mod heap;
pub mod postscript;
pub mod progress;
pub mod scalar;
mod subgraph;

/// Re-exports of the types most callers need, so `use gecko_order::prelude::*`
/// is enough to construct a graph and run an ordering.
pub mod prelude {
    pub use crate::config::OrderOptions;
    pub use crate::functional::{Functional, FunctionalKind, WeightedSum, WeightedValue};
    pub use crate::graph::{ArcIndex, Graph, NodeIndex};
    pub use crate::progress::{LoggingProgress, NoopProgress, Progress};
    pub use crate::scalar::{F, F_EPS, F_MAX};
}
