/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The progress-reporting collaborator. The engine never prints or logs
//! directly; every phase boundary it crosses is reported through this
//! trait, and cancellation is observed exclusively through [`Progress::quit`].

use crate::graph::Graph;
use crate::scalar::F;
use dsi_progress_logger::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};

/// Callbacks invoked at phase boundaries during [`Graph::order`]. Every
/// method has a no-op default, matching the original's all-virtual,
/// all-optional `Progress` base class.
pub trait Progress {
    fn begin_order(&mut self, _graph: &Graph, _cost: F) {}
    fn end_order(&mut self, _graph: &Graph, _cost: F) {}
    fn begin_iter(&mut self, _graph: &Graph, _iter: u32, _max_iter: u32, _window: u32) {}
    fn end_iter(&mut self, _graph: &Graph, _mincost: F, _cost: F) {}
    fn begin_phase(&mut self, _graph: &Graph, _name: &str) {}
    fn end_phase(&mut self, _graph: &Graph, _show: bool) {}

    /// Polled at the three checkpoints documented in the engine's
    /// concurrency model: between outer iterations, between V-cycle
    /// levels during recursion, and between window start indices inside
    /// the small-window optimizer. Returning `true` stops work at that
    /// granularity without any partial mutation of the permutation; the
    /// best-so-far layout is restored by the caller.
    fn quit(&self) -> bool {
        false
    }
}

/// The default, silent collaborator used when a caller passes no
/// progress object. Built as an owned local at the `order()` call site
/// rather than leaked on the heap, so it is simply dropped when `order()`
/// returns — see the fixed leak in the engine's open questions.
#[derive(Default)]
pub struct NoopProgress;

impl Progress for NoopProgress {}

/// A `log`-backed [`Progress`] implementation for CLI and library users
/// who want visibility without wiring up their own collaborator. Phase
/// boundaries are emitted at `debug`, iteration summaries at `info`,
/// matching the verbosity split the original CLI's `MyProgress` made
/// between always-on iteration lines and a `VERBOSE`-gated phase trace.
pub struct LoggingProgress {
    cancel: AtomicBool,
    iter_logger: ProgressLogger,
}

impl Default for LoggingProgress {
    fn default() -> Self {
        let mut iter_logger = ProgressLogger::default();
        iter_logger.item_name("iteration");
        LoggingProgress {
            cancel: AtomicBool::new(false),
            iter_logger,
        }
    }
}

impl LoggingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// A shareable handle that a signal handler can flip to request
    /// cancellation, mirroring the original CLI's static
    /// `MyProgress::exit()` flag driven from a `sigaction` callback.
    pub fn cancel_handle(&self) -> &AtomicBool {
        &self.cancel
    }
}

impl Progress for LoggingProgress {
    fn begin_order(&mut self, _graph: &Graph, cost: F) {
        log::info!("order: starting, cost = {:.6}", cost);
        self.iter_logger.start("ordering");
    }

    fn end_order(&mut self, _graph: &Graph, cost: F) {
        self.iter_logger.done();
        log::info!("order: finished, cost = {:.6}", cost);
    }

    fn begin_iter(&mut self, _graph: &Graph, iter: u32, max_iter: u32, window: u32) {
        log::debug!("iter {}/{} window={}", iter, max_iter, window);
    }

    fn end_iter(&mut self, _graph: &Graph, mincost: F, cost: F) {
        log::info!("cost = {:.6} (best {:.6})", cost, mincost);
        self.iter_logger.update();
    }

    fn begin_phase(&mut self, graph: &Graph, name: &str) {
        log::debug!("{} V={} E={}", name, graph.nodes(), graph.edges());
    }

    fn end_phase(&mut self, graph: &Graph, show: bool) {
        if show {
            log::debug!("  -> V={} E={}", graph.nodes(), graph.edges());
        }
    }

    fn quit(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }
}
