//! Mirror / uniqueness detection over finished switch and connection
//! blocks.
//!
//! Two blocks are *mirrors* when they have the same per-side shape and the
//! same local connectivity: every edge between two of their member nodes
//! lands on the same (side, kind, index) pair with the same switch id,
//! tolerating the coordinate offset between the blocks. Switch blocks that
//! match only after rotating their sides by a quarter turn are *rotatable
//! mirrors*. The detector is read-only over node and edge data; it only
//! fills the `mirror`/`rotatable` back-references on the views, which
//! netlist generation uses to instantiate one module per equivalence
//! class instead of one per grid location.

use crate::graph::RrGraph;
use crate::gsb::{RrgCb, RrgSb};
use crate::ids::RrNodeId;
use std::collections::HashMap;
use tessera_common::Side;

/// A node's place within a block: (side, kind, position).
///
/// Kind 0 is a channel wire, 1 an output pin, 2 an input pin.
type LocalRef = (u8, u8, u32);

/// The structural fingerprint of a block.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Signature {
    /// Per side: channel count, per-wire dirs, opin count, ipin count.
    shape: Vec<(usize, Vec<u8>, usize, usize)>,
    /// Local edges `(from, to, switch)`, sorted.
    edges: Vec<(LocalRef, LocalRef, u32)>,
}

impl Signature {
    /// The signature with every side index advanced by `r` quarter turns.
    fn rotated(&self, r: usize) -> Signature {
        let rot = |side: u8| ((side as usize + r) % 4) as u8;
        let mut shape = vec![(0, Vec::new(), 0, 0); 4];
        for (side, entry) in self.shape.iter().enumerate() {
            shape[(side + r) % 4] = entry.clone();
        }
        let mut edges: Vec<(LocalRef, LocalRef, u32)> = self
            .edges
            .iter()
            .map(|&((fs, fk, fi), (ts, tk, ti), sw)| ((rot(fs), fk, fi), (rot(ts), tk, ti), sw))
            .collect();
        edges.sort_unstable();
        Signature { shape, edges }
    }
}

/// Computes the local connectivity signature of a switch block.
fn sb_signature(graph: &RrGraph, sb: &RrgSb) -> Signature {
    let mut locals: HashMap<RrNodeId, LocalRef> = HashMap::new();
    let mut shape = Vec::with_capacity(4);
    for side in Side::ALL {
        let view = sb.side(side);
        let s = side.index() as u8;
        for (i, &id) in view.chan_nodes.iter().enumerate() {
            locals.entry(id).or_insert((s, 0, i as u32));
        }
        for (i, &id) in view.opin_nodes.iter().enumerate() {
            locals.entry(id).or_insert((s, 1, i as u32));
        }
        for (i, &id) in view.ipin_nodes.iter().enumerate() {
            locals.entry(id).or_insert((s, 2, i as u32));
        }
        shape.push((
            view.chan_nodes.len(),
            view.chan_dirs.iter().map(|d| *d as u8).collect(),
            view.opin_nodes.len(),
            view.ipin_nodes.len(),
        ));
    }
    Signature {
        shape,
        edges: local_edges(graph, &locals),
    }
}

/// Computes the local connectivity signature of a connection block.
///
/// Connection blocks are flat (no sides); ipins and opins are tagged with
/// the tile face they sit on so a block feeding only its upper tile never
/// matches one feeding only its lower tile.
fn cb_signature(graph: &RrGraph, cb: &RrgCb) -> Signature {
    let mut locals: HashMap<RrNodeId, LocalRef> = HashMap::new();
    for (i, &id) in cb.chan_nodes.iter().enumerate() {
        locals.entry(id).or_insert((0, 0, i as u32));
    }
    for (i, &id) in cb.opin_nodes.iter().enumerate() {
        locals.entry(id).or_insert((cb.opin_sides[i].index() as u8, 1, i as u32));
    }
    for (i, &id) in cb.ipin_nodes.iter().enumerate() {
        locals.entry(id).or_insert((cb.ipin_sides[i].index() as u8, 2, i as u32));
    }
    let shape = vec![(
        cb.chan_nodes.len(),
        cb.ipin_sides.iter().map(|s| s.index() as u8).collect(),
        cb.opin_nodes.len(),
        cb.ipin_nodes.len(),
    )];
    Signature {
        shape,
        edges: local_edges(graph, &locals),
    }
}

/// All edges between member nodes, in local coordinates.
fn local_edges(graph: &RrGraph, locals: &HashMap<RrNodeId, LocalRef>) -> Vec<(LocalRef, LocalRef, u32)> {
    let mut edges = Vec::new();
    for (&id, &from) in locals.iter() {
        let node = graph.node(id);
        for (i, &dst) in node.edges.iter().enumerate() {
            if let Some(&to) = locals.get(&dst) {
                edges.push((from, to, node.switches[i].as_raw()));
            }
        }
    }
    edges.sort_unstable();
    edges
}

/// Classifies all switch blocks into mirror / rotatable-mirror classes.
///
/// Blocks are visited in storage order; the first member of each class
/// stays canonical (`mirror` and `rotatable` both `None`), later members
/// point back at it.
pub(crate) fn classify_sbs(graph: &RrGraph, sbs: &mut [RrgSb]) {
    let signatures: Vec<Signature> = sbs.iter().map(|sb| sb_signature(graph, sb)).collect();
    let mut reps: Vec<usize> = Vec::new();
    for i in 0..sbs.len() {
        let mut matched = false;
        for &rep in &reps {
            if signatures[i] == signatures[rep] {
                sbs[i].mirror = Some(sbs[rep].coord);
                matched = true;
                break;
            }
        }
        if !matched {
            'rot: for &rep in &reps {
                for r in 1..4 {
                    if signatures[i].rotated(r) == signatures[rep] {
                        sbs[i].rotatable = Some(sbs[rep].coord);
                        matched = true;
                        break 'rot;
                    }
                }
            }
        }
        if !matched {
            reps.push(i);
        }
    }
}

/// Classifies connection blocks of one orientation into mirror classes.
///
/// A block that matches a representative only after flipping its two pin
/// faces is recorded as a rotatable mirror.
pub(crate) fn classify_cbs(graph: &RrGraph, cbs: &mut [RrgCb]) {
    let signatures: Vec<Signature> = cbs.iter().map(|cb| cb_signature(graph, cb)).collect();
    let mut reps: Vec<usize> = Vec::new();
    for i in 0..cbs.len() {
        let mut matched = false;
        for &rep in &reps {
            if signatures[i] == signatures[rep] {
                cbs[i].mirror = Some(cbs[rep].coord);
                matched = true;
                break;
            }
        }
        if !matched {
            for &rep in &reps {
                if signatures[i].rotated(2) == signatures[rep] {
                    cbs[i].rotatable = Some(cbs[rep].coord);
                    matched = true;
                    break;
                }
            }
        }
        if !matched {
            reps.push(i);
        }
    }
}
