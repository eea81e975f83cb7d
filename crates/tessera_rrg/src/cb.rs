//! Connection-block topology construction.
//!
//! Connection blocks are strictly bipartite: they connect channel wires to
//! block input pins (IPINs) and block output pins (OPINs) to channel
//! wires. Which tracks a pin reaches is governed by the pin's Fc setting
//! and the segment's `cb` depopulation pattern; output pins attach at wire
//! start crossings, where the wire's single driving multiplexer lives.

use crate::builder::{io_grid_pin_side, WireMetas};
use crate::error::RrgError;
use crate::graph::RrGraph;
use crate::ids::RrNodeId;
use crate::lookup::{wire_start_crossing, RrSpatialLookup};
use crate::node::RrType;
use crate::sb::cb_pattern_pos;
use tessera_arch::{ArchTables, Directionality, PinKind, SwitchId, SwsegKind};
use tessera_common::{Coord, Side};
use std::collections::HashMap;

/// Evenly-spaced candidate selection.
///
/// Picks `n` of `m` candidates, offset by the pin index so neighbouring
/// pins spread across the channel instead of piling onto the same tracks.
fn spread_picks(pin: u32, n: u32, m: usize) -> Vec<usize> {
    if m == 0 || n == 0 {
        return Vec::new();
    }
    let n = (n as usize).min(m);
    let offset = pin as usize % m;
    (0..n).map(|k| (offset + (k * m) / n) % m).collect()
}

/// A tile face adjacent to one channel span.
pub(crate) struct FaceRef {
    /// Tile coordinate of the face.
    pub(crate) tile: Coord,
    /// Which face of the tile borders the channel.
    pub(crate) face: Side,
}

/// The two tile faces flanking a channel span, clipped to the device.
pub(crate) fn span_faces(chan: RrType, index: u32, span: u32, grid_w: u32, grid_h: u32) -> Vec<FaceRef> {
    let mut faces = Vec::new();
    match chan {
        RrType::Chanx => {
            // Row `index` runs below tile row `index`.
            if index < grid_h {
                faces.push(FaceRef {
                    tile: Coord::new(span, index),
                    face: Side::Bottom,
                });
            }
            if index >= 1 {
                faces.push(FaceRef {
                    tile: Coord::new(span, index - 1),
                    face: Side::Top,
                });
            }
        }
        RrType::Chany => {
            // Column `index` runs left of tile column `index`.
            if index < grid_w {
                faces.push(FaceRef {
                    tile: Coord::new(index, span),
                    face: Side::Left,
                });
            }
            if index >= 1 {
                faces.push(FaceRef {
                    tile: Coord::new(index - 1, span),
                    face: Side::Right,
                });
            }
        }
        _ => {}
    }
    faces
}

/// Builds every wire-to-IPIN edge of the connection blocks on one channel
/// orientation.
pub(crate) fn build_ipin_edges(
    graph: &mut RrGraph,
    lookup: &RrSpatialLookup,
    arch: &ArchTables,
    metas: &WireMetas,
    pin_nodes: &HashMap<(u32, u32, u32), RrNodeId>,
    chan: RrType,
) -> Result<(), RrgError> {
    let grid_w = arch.layout.width();
    let grid_h = arch.layout.height();
    let w = arch.policy.chan_width;
    let (num_chans, num_spans) = match chan {
        RrType::Chanx => (grid_h + 1, grid_w),
        _ => (grid_w + 1, grid_h),
    };

    for index in 0..num_chans {
        for span in 0..num_spans {
            // Candidate wires at this span, with their per-wire switch.
            let mut candidates: Vec<(u32, RrNodeId, SwitchId)> = Vec::new();
            for (slot, entry) in lookup.chan_slots(chan, index, span).iter().enumerate() {
                let Some(id) = entry else { continue };
                let node = graph.node(*id);
                let meta = &metas[id];
                let (low, high) = match chan {
                    RrType::Chanx => (node.xlow, node.xhigh),
                    _ => (node.ylow, node.yhigh),
                };
                let pos = cb_pattern_pos(node.direction, meta.phase, low, high, span);
                let seg = arch.segments.get(meta.seg);
                if !seg.cb_pattern.is_set(pos as usize) {
                    continue;
                }
                let mut switch = arch.policy.wire_to_ipin_switch;
                for pat in &arch.swseg_patterns {
                    if pat.kind == SwsegKind::UnbufCb && pat.seg_length == meta.length {
                        if pat.applies_at(pos as usize) {
                            switch = pat.unbuf_switch;
                        }
                        break;
                    }
                }
                candidates.push((slot as u32, *id, switch));
            }
            if candidates.is_empty() {
                continue;
            }

            // Edges accumulate per wire so each wire issues one batch.
            let mut per_wire: HashMap<RrNodeId, (Vec<RrNodeId>, Vec<SwitchId>)> = HashMap::new();
            for face_ref in span_faces(chan, index, span, grid_w, grid_h) {
                let tile = arch.layout.tile(face_ref.tile)?;
                if tile.block_type == arch.layout.empty_type {
                    continue;
                }
                let bt = arch.layout.block_type(tile.block_type);
                if tile.block_type == arch.layout.io_type {
                    let io_side = io_grid_pin_side(grid_w, grid_h, face_ref.tile)?;
                    if io_side != face_ref.face {
                        continue;
                    }
                }
                let root = Coord::new(face_ref.tile.x, face_ref.tile.y - tile.offset);
                for pin in bt.side_pins(PinKind::Receiver, face_ref.face, tile.offset) {
                    let Some(&ipin) = pin_nodes.get(&(root.x, root.y, pin)) else {
                        continue;
                    };
                    let fc = bt.fc_of_pin(pin).track_count(w);
                    for pick in spread_picks(pin, fc, candidates.len()) {
                        let (_, wire, switch) = candidates[pick];
                        let entry = per_wire.entry(wire).or_default();
                        entry.0.push(ipin);
                        entry.1.push(switch);
                    }
                }
            }

            let mut wires: Vec<RrNodeId> = per_wire.keys().copied().collect();
            wires.sort_unstable();
            for wire in wires {
                let (dsts, switches) = &per_wire[&wire];
                graph.add_edges(wire, dsts, switches)?;
            }
        }
    }
    Ok(())
}

/// Builds every OPIN-to-wire edge of the device.
///
/// For unidirectional channels an output pin may only drive wires whose
/// start crossing bounds the adjacent span (the wire's driving multiplexer
/// sits there); bidirectional wires accept drivers anywhere along the
/// span.
pub(crate) fn build_opin_edges(
    graph: &mut RrGraph,
    lookup: &RrSpatialLookup,
    arch: &ArchTables,
    metas: &WireMetas,
    pin_nodes: &HashMap<(u32, u32, u32), RrNodeId>,
) -> Result<(), RrgError> {
    let grid_w = arch.layout.width();
    let grid_h = arch.layout.height();
    let w = arch.policy.chan_width;
    let unidir = arch.policy.directionality == Directionality::UniDir;

    for at in arch.layout.coords().collect::<Vec<_>>() {
        let tile = arch.layout.tile(at)?;
        if tile.block_type == arch.layout.empty_type || tile.offset != 0 {
            continue;
        }
        let bt = arch.layout.block_type(tile.block_type);
        let io_side = if tile.block_type == arch.layout.io_type {
            Some(io_grid_pin_side(grid_w, grid_h, at)?)
        } else {
            None
        };

        for dy in 0..bt.height {
            let row = at.y + dy;
            for side in Side::ALL {
                if let Some(io) = io_side {
                    if side != io {
                        continue;
                    }
                }
                let opins = bt.side_pins(PinKind::Driver, side, dy);
                if opins.is_empty() {
                    continue;
                }
                let Some((chan, index, span)) = pin_channel(at.x, row, side, grid_w, grid_h)
                else {
                    continue;
                };

                // Wires an output pin may drive at this span.
                let mut candidates: Vec<(u32, RrNodeId, SwitchId)> = Vec::new();
                for (slot, entry) in lookup.chan_slots(chan, index, span).iter().enumerate() {
                    let Some(id) = entry else { continue };
                    let node = graph.node(*id);
                    let meta = &metas[id];
                    let seg = arch.segments.get(meta.seg);
                    let (low, high) = match chan {
                        RrType::Chanx => (node.xlow, node.xhigh),
                        _ => (node.ylow, node.yhigh),
                    };
                    if unidir {
                        let start = wire_start_crossing(node.direction, low, high);
                        if start != span && start != span + 1 {
                            continue;
                        }
                        if !seg.sb_pattern.is_set(meta.phase as usize) {
                            continue;
                        }
                    }
                    candidates.push((slot as u32, *id, seg.opin_switch));
                }
                if candidates.is_empty() {
                    continue;
                }

                for pin in opins {
                    let Some(&opin) = pin_nodes.get(&(at.x, at.y, pin)) else {
                        continue;
                    };
                    let fc = bt.fc_of_pin(pin).track_count(w);
                    let picks = spread_picks(pin, fc, candidates.len());
                    let mut dsts = Vec::with_capacity(picks.len());
                    let mut switches = Vec::with_capacity(picks.len());
                    for pick in picks {
                        let (_, wire, switch) = candidates[pick];
                        dsts.push(wire);
                        switches.push(switch);
                    }
                    graph.add_edges(opin, &dsts, &switches)?;
                }
            }
        }
    }
    Ok(())
}

/// The channel span adjacent to one face of the tile cell `(x, row)`.
fn pin_channel(x: u32, row: u32, side: Side, grid_w: u32, grid_h: u32) -> Option<(RrType, u32, u32)> {
    match side {
        Side::Top => Some((RrType::Chanx, row + 1, x)),
        Side::Bottom => Some((RrType::Chanx, row, x)),
        Side::Right => ((x + 1) <= grid_w).then_some((RrType::Chany, x + 1, row)),
        Side::Left => Some((RrType::Chany, x, row)),
    }
    .filter(|&(chan, index, span)| match chan {
        RrType::Chanx => index <= grid_h && span < grid_w,
        _ => index <= grid_w && span < grid_h,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spread_picks_distinct_and_in_range() {
        for m in [1usize, 3, 8] {
            for n in 1..=(m as u32) {
                for pin in 0..5 {
                    let picks = spread_picks(pin, n, m);
                    assert_eq!(picks.len(), n as usize);
                    let mut sorted = picks.clone();
                    sorted.sort_unstable();
                    sorted.dedup();
                    assert_eq!(sorted.len(), picks.len(), "picks must be distinct");
                    assert!(picks.iter().all(|&p| p < m));
                }
            }
        }
    }

    #[test]
    fn spread_picks_clamps_to_candidates() {
        assert_eq!(spread_picks(0, 10, 4).len(), 4);
        assert!(spread_picks(0, 0, 4).is_empty());
        assert!(spread_picks(3, 2, 0).is_empty());
    }

    #[test]
    fn spread_picks_full_selection_covers_all() {
        let picks = spread_picks(2, 8, 8);
        let mut sorted = picks;
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn span_faces_interior_has_two() {
        let faces = span_faces(RrType::Chanx, 1, 0, 3, 3);
        assert_eq!(faces.len(), 2);
        assert_eq!(faces[0].tile, Coord::new(0, 1));
        assert_eq!(faces[0].face, Side::Bottom);
        assert_eq!(faces[1].tile, Coord::new(0, 0));
        assert_eq!(faces[1].face, Side::Top);
    }

    #[test]
    fn span_faces_boundary_has_one() {
        let bottom = span_faces(RrType::Chanx, 0, 1, 3, 3);
        assert_eq!(bottom.len(), 1);
        assert_eq!(bottom[0].face, Side::Bottom);
        let top = span_faces(RrType::Chanx, 3, 1, 3, 3);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].face, Side::Top);
    }

    #[test]
    fn span_faces_chany_orientation() {
        let faces = span_faces(RrType::Chany, 2, 1, 3, 3);
        assert_eq!(faces.len(), 2);
        assert_eq!(faces[0].tile, Coord::new(2, 1));
        assert_eq!(faces[0].face, Side::Left);
        assert_eq!(faces[1].tile, Coord::new(1, 1));
        assert_eq!(faces[1].face, Side::Right);
    }

    #[test]
    fn pin_channel_mapping() {
        // Tile (1, 1) in a 3x3 grid.
        assert_eq!(
            pin_channel(1, 1, Side::Top, 3, 3),
            Some((RrType::Chanx, 2, 1))
        );
        assert_eq!(
            pin_channel(1, 1, Side::Bottom, 3, 3),
            Some((RrType::Chanx, 1, 1))
        );
        assert_eq!(
            pin_channel(1, 1, Side::Right, 3, 3),
            Some((RrType::Chany, 2, 1))
        );
        assert_eq!(
            pin_channel(1, 1, Side::Left, 3, 3),
            Some((RrType::Chany, 1, 1))
        );
    }

    #[test]
    fn pin_channel_top_row_still_valid() {
        // The channel above the top tile row exists (boundary channel).
        assert_eq!(
            pin_channel(0, 2, Side::Top, 3, 3),
            Some((RrType::Chanx, 3, 0))
        );
    }
}
