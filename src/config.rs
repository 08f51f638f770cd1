/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Builder bundling the tunables of [`Graph::order`](crate::graph::Graph::order)
//! plus a functional selector, for callers who would rather not thread
//! five positional arguments through their own code.

use crate::functional::FunctionalKind;
use crate::graph::Graph;
use crate::progress::Progress;

/// Ordering parameters, with the same defaults as the original
/// `order()` signature (`iterations=1, window=2, period=2, seed=0`).
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrderOptions {
    functional: FunctionalKind,
    iterations: u32,
    window: u32,
    period: u32,
    seed: u32,
}

impl Default for OrderOptions {
    fn default() -> Self {
        OrderOptions {
            functional: FunctionalKind::Rms,
            iterations: 1,
            window: 2,
            period: 2,
            seed: 0,
        }
    }
}

impl OrderOptions {
    pub fn new(functional: FunctionalKind) -> Self {
        OrderOptions {
            functional,
            ..Default::default()
        }
    }

    pub fn functional(mut self, functional: FunctionalKind) -> Self {
        self.functional = functional;
        self
    }

    pub fn iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn window(mut self, window: u32) -> Self {
        self.window = window;
        self
    }

    pub fn period(mut self, period: u32) -> Self {
        self.period = period;
        self
    }

    pub fn seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }

    /// Run [`Graph::order`] with these options.
    pub fn order(&self, graph: &mut Graph, progress: Option<&mut dyn Progress>) {
        graph.order(
            &self.functional,
            self.iterations,
            self.window,
            self.period,
            self.seed,
            progress,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_original_defaults() {
        let o = OrderOptions::default();
        assert_eq!(o.iterations, 1);
        assert_eq!(o.window, 2);
        assert_eq!(o.period, 2);
        assert_eq!(o.seed, 0);
    }

    #[test]
    fn builder_overrides_compose() {
        let o = OrderOptions::new(FunctionalKind::Arithmetic)
            .iterations(5)
            .window(6)
            .period(1)
            .seed(42);
        assert_eq!(o.iterations, 5);
        assert_eq!(o.window, 6);
        assert_eq!(o.period, 1);
        assert_eq!(o.seed, 42);
    }
}
