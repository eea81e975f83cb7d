//! The device-wide node indexer.
//!
//! [`RrSpatialLookup`] is built once over the finished node store and maps
//! `(type, x, y, ptc)` to a node id in O(1) by direct array indexing. Every
//! node is registered under exactly one canonical key: pins and class
//! nodes at their root tile, channel wires at their start coordinate. A
//! separate per-crossing view ([`RrSpatialLookup::chan_slots`]) lists the
//! wires occupying each track slot at each channel span, which is what the
//! switch-block and connection-block builders iterate.

use crate::error::RrgError;
use crate::graph::RrGraph;
use crate::ids::RrNodeId;
use crate::node::{RrDirection, RrType};
use serde::{Deserialize, Serialize};
use tessera_common::InternalError;

/// One per-type grid of `ptc -> node` cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct TypeGrid {
    width: u32,
    height: u32,
    /// `cells[x * height + y][ptc]`.
    cells: Vec<Vec<Option<RrNodeId>>>,
}

impl TypeGrid {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![Vec::new(); (width * height) as usize],
        }
    }

    fn cell(&self, x: u32, y: u32) -> Option<&Vec<Option<RrNodeId>>> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(&self.cells[(x * self.height + y) as usize])
    }

    fn cell_mut(&mut self, x: u32, y: u32) -> Option<&mut Vec<Option<RrNodeId>>> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(&mut self.cells[(x * self.height + y) as usize])
    }
}

/// The O(1) device-wide node index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RrSpatialLookup {
    grid_width: u32,
    grid_height: u32,
    chan_width: u32,
    /// Canonical key grids, ordered as [`RrType::ALL`].
    grids: Vec<TypeGrid>,
    /// `chanx_slots[row y][span x][slot]`.
    chanx_slots: Vec<Vec<Vec<Option<RrNodeId>>>>,
    /// `chany_slots[col x][span y][slot]`.
    chany_slots: Vec<Vec<Vec<Option<RrNodeId>>>>,
}

impl RrSpatialLookup {
    /// Builds the index over a finished node store.
    ///
    /// Fails if any node has no type, if two nodes claim the same
    /// canonical key, or if two wires claim the same track slot at the
    /// same crossing. Must be rebuilt from scratch if the layout changes.
    pub fn build(
        graph: &RrGraph,
        grid_width: u32,
        grid_height: u32,
        chan_width: u32,
    ) -> Result<Self, RrgError> {
        let mut grids = Vec::with_capacity(RrType::COUNT);
        for ty in RrType::ALL {
            let (w, h) = Self::grid_dims_for(ty, grid_width, grid_height);
            grids.push(TypeGrid::new(w, h));
        }
        let slot_cell = || vec![None; chan_width as usize];
        let mut chanx_slots =
            vec![vec![slot_cell(); grid_width as usize]; (grid_height + 1) as usize];
        let mut chany_slots =
            vec![vec![slot_cell(); grid_height as usize]; (grid_width + 1) as usize];

        let mut registered = 0usize;
        for (id, node) in graph.iter() {
            let ty = node.ty.ok_or(RrgError::UnsetNodeType(id))?;
            let (key_x, key_y) = if ty.is_chan() {
                let start = node.start_coord()?;
                match ty {
                    RrType::Chanx => (start.x, node.ylow),
                    _ => (node.xlow, start.y),
                }
            } else {
                (node.xlow, node.ylow)
            };
            let ptc = node.ptc;

            let grid = &mut grids[ty.index()];
            let cell = grid.cell_mut(key_x, key_y).ok_or_else(|| {
                InternalError::new(format!(
                    "node {id} at ({key_x}, {key_y}) lies outside the {} grid",
                    ty.name()
                ))
            })?;
            if cell.len() <= ptc as usize {
                cell.resize(ptc as usize + 1, None);
            }
            if let Some(first) = cell[ptc as usize] {
                return Err(RrgError::DuplicateLookupKey {
                    first,
                    second: id,
                    ty: ty.name(),
                    x: key_x,
                    y: key_y,
                    ptc,
                });
            }
            cell[ptc as usize] = Some(id);
            registered += 1;

            // Per-crossing channel occupancy.
            if ty.is_chan() {
                let (row, low) = match ty {
                    RrType::Chanx => (node.ylow, node.xlow),
                    _ => (node.xlow, node.ylow),
                };
                for (i, &slot) in node.track_ids.iter().enumerate() {
                    let span = low + i as u32;
                    if slot >= chan_width {
                        return Err(InternalError::new(format!(
                            "wire {id} claims slot {slot} beyond channel width {chan_width}"
                        ))
                        .into());
                    }
                    let cell = match ty {
                        RrType::Chanx => &mut chanx_slots[row as usize][span as usize],
                        _ => &mut chany_slots[row as usize][span as usize],
                    };
                    if let Some(first) = cell[slot as usize] {
                        return Err(RrgError::DuplicateTrackSlot {
                            first,
                            second: id,
                            ty: ty.name(),
                            x: row,
                            y: span,
                            slot,
                        });
                    }
                    cell[slot as usize] = Some(id);
                }
            }
        }

        if registered != graph.len() {
            return Err(RrgError::NodeCountMismatch {
                expected: graph.len(),
                created: registered,
            });
        }

        Ok(Self {
            grid_width,
            grid_height,
            chan_width,
            grids,
            chanx_slots,
            chany_slots,
        })
    }

    fn grid_dims_for(ty: RrType, grid_width: u32, grid_height: u32) -> (u32, u32) {
        match ty {
            // Channel keys: chanx is keyed (start span, row), rows run
            // 0..=height; chany is keyed (col, start span), cols 0..=width.
            RrType::Chanx => (grid_width, grid_height + 1),
            RrType::Chany => (grid_width + 1, grid_height),
            _ => (grid_width, grid_height),
        }
    }

    /// Returns the node registered under `(ty, x, y, ptc)`, if any.
    pub fn find(&self, ty: RrType, x: u32, y: u32, ptc: u32) -> Option<RrNodeId> {
        self.grids[ty.index()]
            .cell(x, y)?
            .get(ptc as usize)
            .copied()
            .flatten()
    }

    /// Returns the node registered under `(ty, x, y, ptc)` or an error.
    pub fn expect(&self, ty: RrType, x: u32, y: u32, ptc: u32) -> Result<RrNodeId, RrgError> {
        self.find(ty, x, y, ptc).ok_or(RrgError::MissingLookupKey {
            ty: ty.name(),
            x,
            y,
            ptc,
        })
    }

    /// Returns the slot-indexed wire list at one channel crossing.
    ///
    /// For [`RrType::Chanx`], `chan_index` is the row and `span` the x
    /// position; for [`RrType::Chany`], `chan_index` is the column and
    /// `span` the y position. Returns an empty slice off-device.
    pub fn chan_slots(&self, ty: RrType, chan_index: u32, span: u32) -> &[Option<RrNodeId>] {
        let slots = match ty {
            RrType::Chanx => &self.chanx_slots,
            RrType::Chany => &self.chany_slots,
            _ => return &[],
        };
        slots
            .get(chan_index as usize)
            .and_then(|row| row.get(span as usize))
            .map(|cell| cell.as_slice())
            .unwrap_or(&[])
    }

    /// The grid width the index was built for.
    pub fn grid_width(&self) -> u32 {
        self.grid_width
    }

    /// The grid height the index was built for.
    pub fn grid_height(&self) -> u32 {
        self.grid_height
    }

    /// The channel width the index was built for.
    pub fn chan_width(&self) -> u32 {
        self.chan_width
    }

    /// Returns every `(key, node)` registration, for totality checks.
    pub fn keys(&self) -> Vec<((RrType, u32, u32, u32), RrNodeId)> {
        let mut out = Vec::new();
        for ty in RrType::ALL {
            let grid = &self.grids[ty.index()];
            for x in 0..grid.width {
                for y in 0..grid.height {
                    if let Some(cell) = grid.cell(x, y) {
                        for (ptc, slot) in cell.iter().enumerate() {
                            if let Some(id) = slot {
                                out.push(((ty, x, y, ptc as u32), *id));
                            }
                        }
                    }
                }
            }
        }
        out
    }
}

/// Returns the crossing at which a wire's signal starts (where its
/// driving multiplexer lives), given its covered span range.
pub fn wire_start_crossing(direction: RrDirection, low: u32, high: u32) -> u32 {
    match direction {
        RrDirection::Inc | RrDirection::Bi => low,
        RrDirection::Dec => high + 1,
    }
}

/// Returns the crossing at which the wire's signal ends.
pub fn wire_end_crossing(direction: RrDirection, low: u32, high: u32) -> u32 {
    match direction {
        RrDirection::Inc | RrDirection::Bi => high + 1,
        RrDirection::Dec => low,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::RrNode;

    fn id(raw: u32) -> RrNodeId {
        RrNodeId::from_raw(raw)
    }

    fn pin_node(ty: RrType, x: u32, y: u32, ptc: u32) -> RrNode {
        let mut n = RrNode::unset();
        n.ty = Some(ty);
        n.xlow = x;
        n.xhigh = x;
        n.ylow = y;
        n.yhigh = y;
        n.ptc = ptc;
        n
    }

    fn chanx_node(dir: RrDirection, y: u32, low: u32, high: u32, track_ids: Vec<u32>) -> RrNode {
        let mut n = RrNode::unset();
        n.ty = Some(RrType::Chanx);
        n.direction = dir;
        n.xlow = low;
        n.xhigh = high;
        n.ylow = y;
        n.yhigh = y;
        n.ptc = match dir {
            RrDirection::Dec => *track_ids.last().unwrap(),
            _ => track_ids[0],
        };
        n.track_ids = track_ids;
        n
    }

    #[test]
    fn pin_lookup_roundtrip() {
        let mut g = RrGraph::allocate(2);
        *g.node_mut(id(0)) = pin_node(RrType::Opin, 1, 1, 3);
        *g.node_mut(id(1)) = pin_node(RrType::Ipin, 1, 1, 0);
        let lookup = RrSpatialLookup::build(&g, 2, 2, 4).unwrap();
        assert_eq!(lookup.find(RrType::Opin, 1, 1, 3), Some(id(0)));
        assert_eq!(lookup.find(RrType::Ipin, 1, 1, 0), Some(id(1)));
        assert_eq!(lookup.find(RrType::Opin, 1, 1, 0), None);
        assert_eq!(lookup.find(RrType::Opin, 9, 9, 0), None);
    }

    #[test]
    fn unset_type_rejected() {
        let g = RrGraph::allocate(1);
        let err = RrSpatialLookup::build(&g, 1, 1, 1).unwrap_err();
        assert!(matches!(err, RrgError::UnsetNodeType(_)));
    }

    #[test]
    fn duplicate_key_rejected() {
        let mut g = RrGraph::allocate(2);
        *g.node_mut(id(0)) = pin_node(RrType::Opin, 0, 0, 2);
        *g.node_mut(id(1)) = pin_node(RrType::Opin, 0, 0, 2);
        let err = RrSpatialLookup::build(&g, 1, 1, 1).unwrap_err();
        assert!(matches!(err, RrgError::DuplicateLookupKey { .. }));
    }

    #[test]
    fn chan_keyed_at_start() {
        let mut g = RrGraph::allocate(2);
        // Inc wire spans 0..=1 of row 0, slots 0 then 1 (tileable rotation).
        *g.node_mut(id(0)) = chanx_node(RrDirection::Inc, 0, 0, 1, vec![0, 1]);
        // Dec wire over the same spans, slots 3 then 2.
        *g.node_mut(id(1)) = chanx_node(RrDirection::Dec, 0, 0, 1, vec![3, 2]);
        let lookup = RrSpatialLookup::build(&g, 2, 2, 4).unwrap();
        // Inc keyed at its low end, Dec at its high end.
        assert_eq!(lookup.find(RrType::Chanx, 0, 0, 0), Some(id(0)));
        assert_eq!(lookup.find(RrType::Chanx, 1, 0, 2), Some(id(1)));
    }

    #[test]
    fn chan_slots_views_every_crossing() {
        let mut g = RrGraph::allocate(1);
        *g.node_mut(id(0)) = chanx_node(RrDirection::Inc, 1, 0, 1, vec![0, 1]);
        let lookup = RrSpatialLookup::build(&g, 2, 2, 2).unwrap();
        let at0 = lookup.chan_slots(RrType::Chanx, 1, 0);
        let at1 = lookup.chan_slots(RrType::Chanx, 1, 1);
        assert_eq!(at0[0], Some(id(0)));
        assert_eq!(at0[1], None);
        assert_eq!(at1[1], Some(id(0)));
        assert_eq!(at1[0], None);
    }

    #[test]
    fn duplicate_slot_rejected() {
        let mut g = RrGraph::allocate(2);
        *g.node_mut(id(0)) = chanx_node(RrDirection::Inc, 0, 0, 0, vec![1]);
        let mut other = chanx_node(RrDirection::Inc, 0, 0, 0, vec![1]);
        other.ptc = 3; // avoid the canonical-key collision
        *g.node_mut(id(1)) = other;
        let err = RrSpatialLookup::build(&g, 1, 1, 4).unwrap_err();
        assert!(matches!(err, RrgError::DuplicateTrackSlot { .. }));
    }

    #[test]
    fn expect_reports_missing_key() {
        let g = RrGraph::allocate(0);
        let lookup = RrSpatialLookup::build(&g, 1, 1, 1).unwrap();
        let err = lookup.expect(RrType::Sink, 0, 0, 0).unwrap_err();
        assert!(matches!(err, RrgError::MissingLookupKey { .. }));
    }

    #[test]
    fn keys_cover_every_node_exactly_once() {
        let mut g = RrGraph::allocate(3);
        *g.node_mut(id(0)) = pin_node(RrType::Source, 0, 0, 0);
        *g.node_mut(id(1)) = pin_node(RrType::Sink, 0, 0, 0);
        *g.node_mut(id(2)) = chanx_node(RrDirection::Inc, 0, 0, 0, vec![0]);
        let lookup = RrSpatialLookup::build(&g, 1, 1, 1).unwrap();
        let keys = lookup.keys();
        assert_eq!(keys.len(), 3);
        let mut nodes: Vec<u32> = keys.iter().map(|(_, n)| n.as_raw()).collect();
        nodes.sort_unstable();
        assert_eq!(nodes, vec![0, 1, 2]);
    }

    #[test]
    fn crossing_helpers() {
        assert_eq!(wire_start_crossing(RrDirection::Inc, 2, 4), 2);
        assert_eq!(wire_end_crossing(RrDirection::Inc, 2, 4), 5);
        assert_eq!(wire_start_crossing(RrDirection::Dec, 2, 4), 5);
        assert_eq!(wire_end_crossing(RrDirection::Dec, 2, 4), 2);
    }

    #[test]
    fn serde_roundtrip() {
        let mut g = RrGraph::allocate(1);
        *g.node_mut(id(0)) = pin_node(RrType::Opin, 0, 0, 0);
        let lookup = RrSpatialLookup::build(&g, 1, 1, 2).unwrap();
        let json = serde_json::to_string(&lookup).unwrap();
        let restored: RrSpatialLookup = serde_json::from_str(&json).unwrap();
        assert_eq!(lookup, restored);
    }
}
