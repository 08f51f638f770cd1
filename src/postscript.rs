/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Drawing backend for a laid-out graph: a [`Device`] abstraction over
//! node/edge drawing primitives, a [`PostScript`] implementation of it,
//! and a [`Drawing`] helper that walks a [`Graph`]'s current layout and
//! feeds a device. The exact byte output of [`PostScript`] is not part
//! of the engine's contract — only the structural shape (one page per
//! draw, one `node` call per node, arcs routed above or below the
//! baseline) is.

use std::io::{self, Write};

use anyhow::Result;

use crate::graph::{ArcIndex, Graph, NodeIndex};
use crate::scalar::F;

/// A 2-D drawing surface that a [`Drawing`] feeds with nodes and edges
/// from a laid-out graph.
pub trait Device {
    fn begin(&mut self) -> Result<()> {
        Ok(())
    }
    fn end(&mut self) -> Result<()> {
        Ok(())
    }
    /// Draw a node centered at `x` with radius `r`, filled with
    /// grayscale `gray` in `[0, 1]`.
    fn node(&mut self, x: F, r: F, gray: F) -> Result<()>;
    /// Draw a straight edge of the given `weight` between positions
    /// `xi` and `xj` (used only for zero-length / adjacent edges).
    fn edge(&mut self, xi: F, xj: F, weight: F) -> Result<()>;
    /// Draw an arced edge of the given `weight`, routed above
    /// (`top = true`) or below the baseline.
    fn edge_arc(&mut self, xi: F, xj: F, weight: F, top: bool) -> Result<()>;
}

/// A `Device` writing Encapsulated PostScript to any [`Write`] sink.
/// Ported from the original's `PostScript` class: a fixed preamble
/// defining a handful of PostScript procedures (`n` for a node disc,
/// `a`/`A` for straight and arced edges), then one `begin`/`end` pair
/// of page commands per [`Drawing::draw`] call.
pub struct PostScript<W: Write> {
    out: W,
    origin: F,
    scale: F,
    page: u32,
}

impl<W: Write> PostScript<W> {
    /// `nodes` is the node count of the graph to be drawn, used only to
    /// scale the page width; `wx`/`wy` are the bounding box in points.
    pub fn new(out: W, nodes: u32, wx: u32, wy: u32) -> Result<Self> {
        let mut ps = PostScript {
            out,
            origin: 0.5 * wy as F,
            scale: wx as F / nodes.max(1) as F,
            page: 1,
        };
        ps.preamble(wx, wy)?;
        Ok(ps)
    }

    fn preamble(&mut self, wx: u32, wy: u32) -> Result<()> {
        writeln!(self.out, "%!PS-Adobe-3.0 EPSF-2.0")?;
        writeln!(self.out, "%%BoundingBox: 0 0 {} {}", wx, wy)?;
        writeln!(self.out, "100 dict begin")?;
        writeln!(self.out, "/Q {{ setrgbcolor rectfill }} bind def")?;
        writeln!(self.out, "% circle: x y r")?;
        writeln!(self.out, "/c {{ newpath 0 360 arc stroke }} bind def")?;
        writeln!(self.out, "% disc: x y r")?;
        writeln!(self.out, "/d {{ newpath 0 360 arc fill }} bind def")?;
        writeln!(self.out, "% node: xpos radius grayfill n")?;
        writeln!(
            self.out,
            "/n {{ 0.125 setlinewidth setgray 0 exch 3 copy d 0 setgray c }} bind def"
        )?;
        writeln!(self.out, "/a {{ newpath setlinewidth exch 0 moveto 0 lineto stroke }} bind def")?;
        writeln!(self.out, "% arc: x0 y0 x1 y1 x2 y2 r")?;
        writeln!(self.out, "/A {{ newpath setlinewidth 7 -2 roll moveto arct stroke }} bind def")?;
        Ok(())
    }

    /// Close the document. Consumes `self` so a second `finish` cannot
    /// double-write the trailer.
    pub fn finish(mut self) -> Result<()> {
        writeln!(self.out, "end")?;
        writeln!(self.out, "%%EOF")?;
        Ok(())
    }
}

impl<W: Write> Device for PostScript<W> {
    fn begin(&mut self) -> Result<()> {
        writeln!(self.out, "%%Page: {}", self.page)?;
        writeln!(self.out, "gsave")?;
        writeln!(self.out, "0 {} translate", self.origin)?;
        writeln!(self.out, "{} dup scale", self.scale)?;
        writeln!(self.out, "2 setlinejoin")?;
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        writeln!(self.out, "grestore")?;
        writeln!(self.out, "showpage")?;
        self.page += 1;
        Ok(())
    }

    fn node(&mut self, x: F, r: F, gray: F) -> Result<()> {
        writeln!(self.out, "{} {} {} n", x, r, gray)?;
        Ok(())
    }

    fn edge(&mut self, xi: F, xj: F, weight: F) -> Result<()> {
        writeln!(self.out, "{} {} {} a", xi, xj, weight / 4.0)?;
        Ok(())
    }

    fn edge_arc(&mut self, xi: F, xj: F, weight: F, top: bool) -> Result<()> {
        let x = (xi + xj) / 2.0;
        let d = (xj - xi).abs() / 2.0;
        let h = (d * d * (2.0 * d - 1.0)).min(1e5);
        let y = if h != 0.0 { d * d / h } else { 0.0 };
        let r = (d * d + y * y).sqrt();
        let w = weight / 4.0;
        if top {
            writeln!(self.out, "{} 0 {} {} {} 0 {} {} A", xj, x, h, xi, r, w)?;
        } else {
            writeln!(self.out, "{} 0 {} {} {} 0 {} {} A", xi, x, -h, xj, r, w)?;
        }
        Ok(())
    }
}

/// Where an arc attaches relative to the baseline, decided once per
/// edge so both endpoints agree on routing.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Anchor {
    Mid,
    Top,
    Bot,
}

/// Walks a graph's current layout and feeds a [`Device`] with its
/// nodes (as discs, shaded by persistence) and edges (straight when
/// adjacent in rank, arced above/below the baseline otherwise, chosen
/// to balance the number of arcs already anchored on each side).
pub struct Drawing<'a, D: Device> {
    device: &'a mut D,
}

impl<'a, D: Device> Drawing<'a, D> {
    pub fn new(device: &'a mut D) -> Self {
        Drawing { device }
    }

    pub fn draw(&mut self, g: &Graph) -> Result<()> {
        self.device.begin()?;

        let n = g.nodes();
        let mut nodes: Vec<(F, NodeIndex)> = (1..=n).map(|i| (g.node_pos(i), i)).collect();
        nodes.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());

        let mut arcs: Vec<(F, ArcIndex, NodeIndex, NodeIndex)> = Vec::new();
        for i in 1..=n {
            for a in g.node_begin(i)..g.node_end(i) {
                let j = g.arc_target(a);
                if g.node_pos(i) < g.node_pos(j) {
                    arcs.push((g.length_between(i, j), a, i, j));
                }
            }
        }
        arcs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());

        // Anchor assignment: short (length < 0.5) edges draw as a
        // straight line; longer edges route above or below, balancing
        // the running count on each side so arcs fan out rather than
        // pile onto one side.
        let mut anchor = vec![Anchor::Mid; (2 * g.edges() + 1) as usize];
        let mut top_count = 0u32;
        let mut bot_count = 0u32;
        for &(length, a, i, j) in &arcs {
            if length < 0.5 {
                continue;
            }
            let b = g.reverse_arc(a);
            if top_count <= bot_count {
                anchor[a as usize] = Anchor::Top;
                anchor[b as usize] = Anchor::Top;
                top_count += 1;
            } else {
                anchor[a as usize] = Anchor::Bot;
                anchor[b as usize] = Anchor::Bot;
                bot_count += 1;
            }
            let _ = (i, j);
        }

        for &(_, a, i, j) in arcs.iter().rev() {
            let w = g.arc_weight(a);
            match anchor[a as usize] {
                Anchor::Bot => self.device.edge_arc(g.node_pos(i), g.node_pos(j), w, false)?,
                Anchor::Top => self.device.edge_arc(g.node_pos(i), g.node_pos(j), w, true)?,
                Anchor::Mid => self.device.edge(g.node_pos(i), g.node_pos(j), w)?,
            }
        }

        for i in 1..=n {
            let gray = if g.is_persistent(i) { 0.25 } else { 0.75 };
            self.device.node(g.node_pos(i), 0.5 * g.node_hlen(i), gray)?;
        }

        self.device.end()?;
        Ok(())
    }
}

/// Convenience: draw `g` as a standalone EPS document to `out`.
pub fn write_eps<W: Write>(g: &Graph, out: W, wx: u32, wy: u32) -> Result<()> {
    let mut ps = PostScript::new(out, g.nodes(), wx, wy)?;
    Drawing::new(&mut ps).draw(g)?;
    ps.finish()
}

/// Convenience: draw `g` as a standalone EPS document to stdout.
pub fn write_eps_stdout(g: &Graph, wx: u32, wy: u32) -> Result<()> {
    write_eps(g, io::stdout().lock(), wx, wy)
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
    fn draw_produces_one_node_call_per_node() {
        struct Counter {
            nodes: u32,
            began: bool,
            ended: bool,
        }
        impl Device for Counter {
            fn begin(&mut self) -> Result<()> {
                self.began = true;
                Ok(())
            }
            fn end(&mut self) -> Result<()> {
                self.ended = true;
                Ok(())
            }
            fn node(&mut self, _x: F, _r: F, _gray: F) -> Result<()> {
                self.nodes += 1;
                Ok(())
            }
            fn edge(&mut self, _xi: F, _xj: F, _weight: F) -> Result<()> {
                Ok(())
            }
            fn edge_arc(&mut self, _xi: F, _xj: F, _weight: F, _top: bool) -> Result<()> {
                Ok(())
            }
        }

        let mut g = path(6);
        g.order(&FunctionalKind::Geometric, 1, 2, 2, 1, None);
        let mut counter = Counter { nodes: 0, began: false, ended: false };
        Drawing::new(&mut counter).draw(&g).unwrap();
        assert_eq!(counter.nodes, 6);
        assert!(counter.began && counter.ended);
    }

    #[test]
    fn eps_document_has_header_and_trailer() {
        let g = path(4);
        let mut buf = Vec::new();
        write_eps(&g, &mut buf, 100, 100).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("%!PS-Adobe-3.0"));
        assert!(text.trim_end().ends_with("%%EOF"));
        assert!(text.contains("%%BoundingBox: 0 0 100 100"));
    }
}
