//! Configuration-bit allocation.
//!
//! Every multiplexer in the fabric needs `ceil(log2(fan_in))` select
//! bits. After topology construction, this pass walks the device in scan
//! order (CHANX connection blocks, then CHANY, then switch blocks) and
//! assigns each block a contiguous bit range covering the multiplexers it
//! realizes: the input-pin muxes for connection blocks, the start muxes of
//! the wires a switch block drives for switch blocks. The ranges are
//! pairwise disjoint and their union is contiguous from zero.

use crate::graph::RrGraph;
use crate::gsb::{RrgCb, RrgSb};
use crate::lookup::wire_start_crossing;
use crate::node::RrType;
use tessera_common::{BitRange, Side};

/// Select bits needed by a multiplexer with `fan_in` inputs.
fn mux_bits(fan_in: u32) -> u32 {
    if fan_in <= 1 {
        0
    } else {
        32 - (fan_in - 1).leading_zeros()
    }
}

/// Bits needed by one connection block: one mux per fed input pin.
fn cb_bits(graph: &RrGraph, cb: &RrgCb) -> u32 {
    cb.ipin_nodes
        .iter()
        .map(|&ipin| mux_bits(graph.node(ipin).fan_in))
        .sum()
}

/// Bits needed by one switch block: one mux per wire starting at it.
fn sb_bits(graph: &RrGraph, sb: &RrgSb) -> u32 {
    let mut bits = 0;
    for side in Side::ALL {
        for &id in &sb.side(side).chan_nodes {
            let node = graph.node(id);
            let (low, high, at) = match node.ty {
                Some(RrType::Chanx) => (node.xlow, node.xhigh, sb.coord.x),
                _ => (node.ylow, node.yhigh, sb.coord.y),
            };
            if wire_start_crossing(node.direction, low, high) == at {
                bits += mux_bits(node.fan_in);
            }
        }
    }
    bits
}

/// Assigns configuration-bit ranges to every block, returning the total
/// number of bits allocated.
pub(crate) fn allocate_conf_bits(
    graph: &RrGraph,
    cbx: &mut [RrgCb],
    cby: &mut [RrgCb],
    sbs: &mut [RrgSb],
) -> u32 {
    let mut next = 0u32;
    for cb in cbx.iter_mut().chain(cby.iter_mut()) {
        let bits = cb_bits(graph, cb);
        cb.conf_bits = BitRange::with_width(next, bits);
        next += bits;
    }
    for sb in sbs.iter_mut() {
        let bits = sb_bits(graph, sb);
        sb.conf_bits = BitRange::with_width(next, bits);
        next += bits;
    }
    next
}
