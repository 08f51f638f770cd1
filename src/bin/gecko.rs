/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! `gecko-order <functional> [iterations [window [period [seed [psfile]]]]]`
//!
//! Reads a Chaco-format graph on stdin, orders it, and writes the rank
//! of each node (one per line, in original node order) to stdout.
//! Progress is reported on stderr; `Ctrl-C`/`SIGTERM` requests a clean
//! early stop that still emits the best permutation found so far.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, ValueEnum};
use clap_complete::Shell;

use gecko_order::chaco;
use gecko_order::config::OrderOptions;
use gecko_order::functional::FunctionalKind;
use gecko_order::postscript;
use gecko_order::progress::{LoggingProgress, Progress};

/// One of the six p-mean ordering functionals.
#[derive(Copy, Clone, Debug, ValueEnum)]
enum FunctionalArg {
    /// Harmonic mean (p = -1).
    H,
    /// Geometric mean (p = 0).
    G,
    /// Square mean root (p = 1/2).
    S,
    /// Arithmetic mean (p = 1, minimum linear arrangement).
    A,
    /// Root mean square (p = 2).
    R,
    /// Maximum (p = infinity, bandwidth).
    M,
}

impl From<FunctionalArg> for FunctionalKind {
    fn from(a: FunctionalArg) -> Self {
        match a {
            FunctionalArg::H => FunctionalKind::Harmonic,
            FunctionalArg::G => FunctionalKind::Geometric,
            FunctionalArg::S => FunctionalKind::Smr,
            FunctionalArg::A => FunctionalKind::Arithmetic,
            FunctionalArg::R => FunctionalKind::Rms,
            FunctionalArg::M => FunctionalKind::Maximum,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "gecko-order",
    about = "Multilevel ordering of a graph to minimize a p-mean edge-length cost",
    after_help = "Reads a Chaco graph on stdin, writes one rank per line (in node order) on stdout."
)]
struct Cli {
    /// Ordering functional. Required unless `--completions` is given.
    functional: Option<FunctionalArg>,

    /// Number of V-cycle iterations.
    #[arg(default_value_t = 1)]
    iterations: u32,

    /// Initial small-window permutation search size.
    #[arg(default_value_t = 2)]
    window: u32,

    /// Iterations between window-size increments (0 disables growth).
    #[arg(default_value_t = 2)]
    period: u32,

    /// Random seed for the initial shuffle (0 leaves the input order).
    #[arg(default_value_t = 0)]
    seed: u32,

    /// Optional path to write an EPS drawing of the final layout.
    #[arg(value_name = "PSFILE")]
    psfile: Option<String>,

    /// Print a shell completion script for the given shell and exit.
    #[arg(long)]
    completions: Option<Shell>,
}

static CANCEL: AtomicBool = AtomicBool::new(false);

extern "C" fn on_signal(_sig: libc::c_int) {
    CANCEL.store(true, Ordering::SeqCst);
}

/// Bridges the process-wide signal flag into the [`Progress`] contract,
/// while still emitting log lines through a [`LoggingProgress`].
struct CliProgress {
    inner: LoggingProgress,
}

impl Progress for CliProgress {
    fn begin_order(&mut self, graph: &gecko_order::graph::Graph, cost: gecko_order::scalar::F) {
        self.inner.begin_order(graph, cost)
    }
    fn end_order(&mut self, graph: &gecko_order::graph::Graph, cost: gecko_order::scalar::F) {
        self.inner.end_order(graph, cost)
    }
    fn begin_iter(
        &mut self,
        graph: &gecko_order::graph::Graph,
        iter: u32,
        max_iter: u32,
        window: u32,
    ) {
        self.inner.begin_iter(graph, iter, max_iter, window)
    }
    fn end_iter(
        &mut self,
        graph: &gecko_order::graph::Graph,
        mincost: gecko_order::scalar::F,
        cost: gecko_order::scalar::F,
    ) {
        self.inner.end_iter(graph, mincost, cost)
    }
    fn begin_phase(&mut self, graph: &gecko_order::graph::Graph, name: &str) {
        self.inner.begin_phase(graph, name)
    }
    fn end_phase(&mut self, graph: &gecko_order::graph::Graph, show: bool) {
        self.inner.end_phase(graph, show)
    }
    fn quit(&self) -> bool {
        CANCEL.load(Ordering::SeqCst) || self.inner.quit()
    }
}

fn install_signal_handlers() {
    // SAFETY: `on_signal` only stores to an `AtomicBool`, which is
    // async-signal-safe; installing a plain C function pointer as the
    // handler for SIGINT/SIGTERM is the same contract `signal(2)` has
    // always had.
    unsafe {
        libc::signal(libc::SIGINT, on_signal as libc::sighandler_t);
        libc::signal(libc::SIGTERM, on_signal as libc::sighandler_t);
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        clap_complete::generate(shell, &mut Cli::command(), "gecko-order", &mut io::stdout());
        return Ok(());
    }
    let functional = cli
        .functional
        .context("a functional letter is required (h/g/s/a/r/m)")?;

    install_signal_handlers();

    let mut graph = chaco::read(io::stdin().lock()).context("reading Chaco graph from stdin")?;

    let seed = if cli.seed != 0 {
        cli.seed
    } else {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or(1)
    };
    log::info!("s = {}", seed);

    let options = OrderOptions::new(functional.into())
        .iterations(cli.iterations)
        .window(cli.window)
        .period(cli.period)
        .seed(seed);

    let mut progress = CliProgress {
        inner: LoggingProgress::new(),
    };
    options.order(&mut graph, Some(&mut progress));

    if let Some(path) = &cli.psfile {
        let file = File::create(path).with_context(|| format!("creating {}", path))?;
        postscript::write_eps(&graph, BufWriter::new(file), 576, 576)
            .with_context(|| format!("writing PostScript drawing to {}", path))?;
    }

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for i in 1..=graph.nodes() {
        writeln!(out, "{}", graph.rank(i))?;
    }
    out.flush()?;

    Ok(())
}
