/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Reader for the Chaco graph text format, kept only for interoperability
//! with existing test fixtures and the CLI driver. Builds a [`Graph`]
//! through its ordinary public construction API — no privileged access
//! to internal fields.

use std::io::BufRead;

use anyhow::{bail, Context, Result};

use crate::graph::Graph;

/// Parse a Chaco-format graph from `reader`.
///
/// The header line is `N M [FMT]`, where `FMT` is `0` for an unweighted
/// graph or `1` for edge-weighted. `N` node lines follow, each a
/// whitespace-separated neighbor list (each neighbor followed by its
/// weight, if `FMT == 1`). Lines starting with `%` or `#` are treated as
/// comments and skipped wherever they appear in a node's block.
pub fn read<R: BufRead>(reader: R) -> Result<Graph> {
    let mut lines = reader
        .lines()
        .map(|l| l.context("reading Chaco graph"))
        .filter(|l| match l {
            Ok(s) => !is_comment(s),
            Err(_) => true,
        });

    let header = lines
        .next()
        .context("missing Chaco header line")??;
    let mut header_fields = header.split_whitespace();
    let n: u32 = header_fields
        .next()
        .context("missing node count in header")?
        .parse()
        .context("invalid node count in header")?;
    let _m: u64 = header_fields
        .next()
        .context("missing edge count in header")?
        .parse()
        .context("invalid edge count in header")?;
    let weighted = match header_fields.next() {
        Some(fmt) => fmt.trim() == "1",
        None => false,
    };

    let mut graph = Graph::new(n);
    for i in 1..=n {
        let line = lines
            .next()
            .with_context(|| format!("missing neighbor line for node {}", i))??;
        let mut fields = line.split_whitespace();
        loop {
            let Some(tok) = fields.next() else { break };
            let j: u32 = tok
                .parse()
                .with_context(|| format!("invalid neighbor index on node {} line", i))?;
            let w = if weighted {
                let wtok = fields
                    .next()
                    .with_context(|| format!("missing weight for neighbor {} of node {}", j, i))?;
                wtok.parse()
                    .with_context(|| format!("invalid weight for neighbor {} of node {}", j, i))?
            } else {
                1.0
            };
            // Chaco lists each node's full neighbor set, not just
            // forward edges, so the reverse direction of every edge
            // appears on its own line later (or earlier) in the file.
            graph.insert_arc(i, j, w, w);
        }
    }

    if graph.directed().is_some() {
        bail!("Chaco graph is not symmetric: a listed edge is missing its reverse");
    }

    Ok(graph)
}

fn is_comment(line: &str) -> bool {
    matches!(line.trim_start().chars().next(), Some('%') | Some('#'))
}
