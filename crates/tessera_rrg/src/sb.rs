//! Switch-block topology construction.
//!
//! For every channel crossing of the device, this module decides which
//! wire-to-wire connections exist and realizes them as graph edges. The
//! track permutations follow the canonical switch-block constructions:
//! the planar subset block (track `i` to track `i`), S. Wilton's disjoint
//! permutation block, and the universal block of Chang et al. (straight
//! connections keep the track index, turns reverse it). All three are
//! permutations of the track set for every channel width, so no two
//! distinct input tracks ever map to the same output track at a side.

use crate::builder::{WireMeta, WireMetas};
use crate::error::RrgError;
use crate::graph::RrGraph;
use crate::ids::RrNodeId;
use crate::lookup::{wire_end_crossing, wire_start_crossing, RrSpatialLookup};
use crate::node::{RrDirection, RrType};
use tessera_arch::{ArchTables, Directionality, SbPattern, SwitchId, SwsegKind};
use tessera_common::{Coord, Side};

/// Applies the switch-block track permutation.
///
/// Returns the output track on `to` for a signal arriving on track
/// `track` at side `from`, for a channel of `w` tracks. Every
/// `(pattern, from, to)` combination is a permutation of `[0, w)`.
pub fn permuted_track(pattern: SbPattern, from: Side, to: Side, track: u32, w: u32) -> u32 {
    if from == to {
        // U-turns (opposite-side wiring) reverse the track index, pairing
        // each track with its opposite-direction counterpart.
        return w - 1 - track;
    }
    match pattern {
        SbPattern::Subset => track,
        SbPattern::Universal => {
            if to == from.opposite() {
                track
            } else {
                w - 1 - track
            }
        }
        SbPattern::Wilton => wilton_track(from, to, track, w),
    }
}

/// The Wilton permutation, by (from, to) side pair.
fn wilton_track(from: Side, to: Side, t: u32, w: u32) -> u32 {
    match (from, to) {
        (Side::Left, Side::Right) => t,
        (Side::Left, Side::Top) => (w - t) % w,
        (Side::Left, Side::Bottom) => (w + t - 1) % w,
        (Side::Right, Side::Left) => t,
        (Side::Right, Side::Top) => (w + t - 1) % w,
        (Side::Right, Side::Bottom) => (2 * w - 2 - t) % w,
        (Side::Bottom, Side::Top) => t,
        (Side::Bottom, Side::Left) => (t + 1) % w,
        (Side::Bottom, Side::Right) => (2 * w - 2 - t) % w,
        (Side::Top, Side::Bottom) => t,
        (Side::Top, Side::Left) => (w - t) % w,
        (Side::Top, Side::Right) => (t + 1) % w,
        _ => t,
    }
}

/// Pattern position of a wire at a switch-block crossing.
///
/// Positions count from the wire's logical start (0 at the start
/// crossing); `phase` accounts for heads cut off at the device boundary.
pub(crate) fn sb_pattern_pos(
    direction: RrDirection,
    phase: u32,
    low: u32,
    high: u32,
    crossing: u32,
) -> u32 {
    match direction {
        RrDirection::Inc | RrDirection::Bi => phase + (crossing - low),
        RrDirection::Dec => phase + (high + 1 - crossing),
    }
}

/// Pattern position of a wire at a connection-block span.
pub(crate) fn cb_pattern_pos(
    direction: RrDirection,
    phase: u32,
    low: u32,
    high: u32,
    span: u32,
) -> u32 {
    match direction {
        RrDirection::Inc | RrDirection::Bi => phase + (span - low),
        RrDirection::Dec => phase + (high - span),
    }
}

/// Picks the switch for a wire-to-wire connection, applying any
/// unbuffered switch-segment substitution declared for the source
/// segment's length.
fn sb_switch_for(arch: &ArchTables, src_meta: &WireMeta, src_pos: u32, default: SwitchId) -> SwitchId {
    for pat in &arch.swseg_patterns {
        if pat.kind == SwsegKind::UnbufSb && pat.seg_length == src_meta.length {
            if pat.applies_at(src_pos as usize) {
                return pat.unbuf_switch;
            }
            return default;
        }
    }
    default
}

/// The wires around one switch-block crossing, sorted by role.
struct CrossingWires {
    /// Per side, `slot -> wire starting at this crossing`.
    starting: [Vec<Option<RrNodeId>>; 4],
    /// Wires terminating into the block: `(side, node, end slot)`.
    ending: Vec<(Side, RrNodeId, u32)>,
    /// Unidirectional wires passing through: `(arrival side, node, slot)`.
    passing: Vec<(Side, RrNodeId, u32)>,
    /// Per side, `slot -> bidirectional wire present at the crossing`.
    present: [Vec<Option<RrNodeId>>; 4],
    /// Bidirectional wires to process: `(side, node, slot)`.
    present_list: Vec<(Side, RrNodeId, u32)>,
}

/// The channel cell adjacent to side `side` of the crossing `(x, y)`.
///
/// Returns `(chan type, chan index, span)` or `None` past the boundary.
pub(crate) fn side_channel(at: Coord, side: Side, grid_w: u32, grid_h: u32) -> Option<(RrType, u32, u32)> {
    match side {
        Side::Left => (at.x >= 1).then(|| (RrType::Chanx, at.y, at.x - 1)),
        Side::Right => (at.x < grid_w).then(|| (RrType::Chanx, at.y, at.x)),
        Side::Top => (at.y < grid_h).then(|| (RrType::Chany, at.x, at.y)),
        Side::Bottom => (at.y >= 1).then(|| (RrType::Chany, at.x, at.y - 1)),
    }
}

/// The side from which a wire on `side`'s channel arrives at the crossing.
fn arrival_side(chan: RrType, direction: RrDirection) -> Side {
    match (chan, direction) {
        (RrType::Chanx, RrDirection::Dec) => Side::Right,
        (RrType::Chanx, _) => Side::Left,
        (_, RrDirection::Dec) => Side::Top,
        (_, _) => Side::Bottom,
    }
}

fn collect_crossing(
    graph: &RrGraph,
    lookup: &RrSpatialLookup,
    at: Coord,
    grid_w: u32,
    grid_h: u32,
    w: u32,
) -> CrossingWires {
    let empty = || vec![None; w as usize];
    let mut wires = CrossingWires {
        starting: [empty(), empty(), empty(), empty()],
        ending: Vec::new(),
        passing: Vec::new(),
        present: [empty(), empty(), empty(), empty()],
        present_list: Vec::new(),
    };
    for side in Side::ALL {
        let Some((chan, index, span)) = side_channel(at, side, grid_w, grid_h) else {
            continue;
        };
        let crossing = match chan {
            RrType::Chanx => at.x,
            _ => at.y,
        };
        for (slot, entry) in lookup.chan_slots(chan, index, span).iter().enumerate() {
            let Some(id) = entry else { continue };
            let node = graph.node(*id);
            let (low, high) = match chan {
                RrType::Chanx => (node.xlow, node.xhigh),
                _ => (node.ylow, node.yhigh),
            };
            let slot = slot as u32;
            if node.direction == RrDirection::Bi {
                wires.present[side.index()][slot as usize] = Some(*id);
                wires.present_list.push((side, *id, slot));
                continue;
            }
            if wire_end_crossing(node.direction, low, high) == crossing {
                wires.ending.push((side, *id, slot));
            } else if wire_start_crossing(node.direction, low, high) == crossing {
                wires.starting[side.index()][slot as usize] = Some(*id);
            } else if arrival_side(chan, node.direction) == side {
                wires.passing.push((side, *id, slot));
            }
        }
    }
    wires
}

/// Builds every wire-to-wire edge of the switch block at crossing `at`.
pub(crate) fn build_sb_edges_at(
    graph: &mut RrGraph,
    lookup: &RrSpatialLookup,
    arch: &ArchTables,
    metas: &WireMetas,
    at: Coord,
) -> Result<(), RrgError> {
    let grid_w = arch.layout.width();
    let grid_h = arch.layout.height();
    let w = arch.policy.chan_width;
    let wires = collect_crossing(graph, lookup, at, grid_w, grid_h, w);

    if arch.policy.directionality == Directionality::BiDir {
        return build_bidir_edges(graph, arch, metas, at, &wires);
    }

    // Terminating wires: main pattern and fs, all other sides.
    let per_side = (arch.policy.fs / 3).max(1);
    for &(from_side, src, slot) in &wires.ending {
        let src_meta = &metas[&src];
        let src_pos = source_pos(graph, metas, src, at);
        let src_seg = arch.segments.get(src_meta.seg);
        if !src_seg.sb_pattern.is_set(src_pos as usize) {
            continue;
        }
        let targets: Vec<Side> = Side::ALL.iter().copied().filter(|&s| s != from_side).collect();
        connect_to_sides(
            graph,
            arch,
            metas,
            &wires,
            src,
            src_meta,
            src_pos,
            slot,
            from_side,
            &targets,
            arch.policy.sb_pattern,
            per_side,
        )?;
    }

    // Passing wires: sub-pattern and sub-fs, orthogonal turns only (plus
    // the arrival side itself under opposite-side wiring), only when the
    // graph is tileable.
    if arch.policy.tileable {
        let per_side = (arch.policy.sub_fs / 3).max(1);
        for &(from_side, src, slot) in &wires.passing {
            let src_meta = &metas[&src];
            let src_pos = source_pos(graph, metas, src, at);
            let src_seg = arch.segments.get(src_meta.seg);
            if !src_seg.sb_pattern.is_set(src_pos as usize) {
                continue;
            }
            let mut targets: Vec<Side> = match from_side {
                Side::Left | Side::Right => vec![Side::Top, Side::Bottom],
                Side::Top | Side::Bottom => vec![Side::Left, Side::Right],
            };
            if arch.policy.wire_opposite_side {
                targets.push(from_side);
            }
            connect_to_sides(
                graph,
                arch,
                metas,
                &wires,
                src,
                src_meta,
                src_pos,
                slot,
                from_side,
                &targets,
                arch.policy.sub_pattern,
                per_side,
            )?;
        }
    }
    Ok(())
}

/// Pattern position of `src` at crossing `at`.
fn source_pos(graph: &RrGraph, metas: &WireMetas, src: RrNodeId, at: Coord) -> u32 {
    let node = graph.node(src);
    let meta = &metas[&src];
    let (low, high, crossing) = match node.ty {
        Some(RrType::Chanx) => (node.xlow, node.xhigh, at.x),
        _ => (node.ylow, node.yhigh, at.y),
    };
    sb_pattern_pos(node.direction, meta.phase, low, high, crossing)
}

#[allow(clippy::too_many_arguments)]
fn connect_to_sides(
    graph: &mut RrGraph,
    arch: &ArchTables,
    metas: &WireMetas,
    wires: &CrossingWires,
    src: RrNodeId,
    src_meta: &WireMeta,
    src_pos: u32,
    slot: u32,
    from_side: Side,
    targets: &[Side],
    pattern: SbPattern,
    per_side: u32,
) -> Result<(), RrgError> {
    let w = arch.policy.chan_width;
    let mut dsts = Vec::new();
    let mut switches = Vec::new();
    for &to_side in targets {
        let base = permuted_track(pattern, from_side, to_side, slot, w);
        for k in 0..per_side {
            let tslot = (base + k) % w;
            let Some(dst) = wires.starting[to_side.index()][tslot as usize] else {
                continue;
            };
            let dst_meta = &metas[&dst];
            let dst_seg = arch.segments.get(dst_meta.seg);
            if !dst_seg.sb_pattern.is_set(dst_meta.phase as usize) {
                continue;
            }
            let switch = sb_switch_for(arch, src_meta, src_pos, dst_seg.wire_switch);
            dsts.push(dst);
            switches.push(switch);
        }
    }
    graph.add_edges(src, &dsts, &switches)
}

/// Bidirectional switch blocks: every sb-gated wire at the crossing
/// connects to the permuted track on each other side.
fn build_bidir_edges(
    graph: &mut RrGraph,
    arch: &ArchTables,
    metas: &WireMetas,
    at: Coord,
    wires: &CrossingWires,
) -> Result<(), RrgError> {
    let w = arch.policy.chan_width;
    let per_side = (arch.policy.fs / 3).max(1);
    for &(from_side, src, slot) in &wires.present_list {
        let src_meta = &metas[&src];
        let src_pos = source_pos(graph, metas, src, at);
        let src_seg = arch.segments.get(src_meta.seg);
        if !src_seg.sb_pattern.is_set(src_pos as usize) {
            continue;
        }
        let mut dsts = Vec::new();
        let mut switches = Vec::new();
        for to_side in Side::ALL {
            if to_side == from_side {
                continue;
            }
            let base = permuted_track(arch.policy.sb_pattern, from_side, to_side, slot, w);
            for k in 0..per_side {
                let tslot = (base + k) % w;
                let Some(dst) = wires.present[to_side.index()][tslot as usize] else {
                    continue;
                };
                if dst == src {
                    continue;
                }
                let dst_meta = &metas[&dst];
                let dst_seg = arch.segments.get(dst_meta.seg);
                let dst_pos = source_pos(graph, metas, dst, at);
                if !dst_seg.sb_pattern.is_set(dst_pos as usize) {
                    continue;
                }
                let switch = sb_switch_for(arch, src_meta, src_pos, dst_seg.wire_switch);
                dsts.push(dst);
                switches.push(switch);
            }
        }
        graph.add_edges(src, &dsts, &switches)?;
    }
    Ok(())
}
