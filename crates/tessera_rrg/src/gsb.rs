//! Per-coordinate switch-block and connection-block views.
//!
//! After the graph is built, every switch-block crossing and every
//! connection block gets a structural view: which channel wires touch
//! each side (and in which direction relative to the block), which
//! adjacent-tile output and input pins it reaches, its configuration-bit
//! range, and — once the uniqueness detector has run — an optional
//! back-reference to a structurally identical block elsewhere on the
//! device. Views hold node ids only; they never own node or edge data.

use crate::builder::io_grid_pin_side;
use crate::cb::span_faces;
use crate::error::RrgError;
use crate::graph::RrGraph;
use crate::ids::RrNodeId;
use crate::lookup::RrSpatialLookup;
use crate::node::{RrDirection, RrType};
use crate::sb::side_channel;
use serde::{Deserialize, Serialize};
use tessera_arch::{ArchTables, PinKind};
use tessera_common::{BitRange, Coord, Side};

/// Direction of a channel wire relative to a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortDir {
    /// The wire carries signals into the block.
    In,
    /// The wire carries signals out of the block.
    Out,
    /// Bidirectional wire.
    Both,
}

/// One side of a switch block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockSide {
    /// Channel wires on this side, in track-slot order.
    pub chan_nodes: Vec<RrNodeId>,
    /// Direction of each channel wire relative to the block.
    pub chan_dirs: Vec<PortDir>,
    /// Output pins of the flanking tiles reachable from this side.
    pub opin_nodes: Vec<RrNodeId>,
    /// The tile face each output pin sits on.
    pub opin_sides: Vec<Side>,
    /// Input pins of the flanking tiles fed through this side.
    pub ipin_nodes: Vec<RrNodeId>,
    /// The tile face each input pin sits on.
    pub ipin_sides: Vec<Side>,
}

impl BlockSide {
    /// Number of channel wires on the side.
    pub fn chan_width(&self) -> usize {
        self.chan_nodes.len()
    }
}

/// The structural view of one switch block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RrgSb {
    /// The crossing coordinate of the block.
    pub coord: Coord,
    /// The four sides, indexed by [`Side::index`].
    pub sides: Vec<BlockSide>,
    /// Configuration bits assigned to the block's multiplexers.
    pub conf_bits: Option<BitRange>,
    /// Reserved configuration bits (shared-bit organizations).
    pub reserved_conf_bits: Option<BitRange>,
    /// Coordinate of an identical block this one mirrors, if any.
    pub mirror: Option<Coord>,
    /// Coordinate of a block this one matches after side rotation.
    pub rotatable: Option<Coord>,
}

impl RrgSb {
    /// Number of sides (always 4).
    pub fn num_sides(&self) -> usize {
        self.sides.len()
    }

    /// The view of one side.
    pub fn side(&self, side: Side) -> &BlockSide {
        &self.sides[side.index()]
    }

    /// Returns whether this block is its class's canonical representative.
    pub fn is_canonical(&self) -> bool {
        self.mirror.is_none() && self.rotatable.is_none()
    }
}

/// The structural view of one connection block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RrgCb {
    /// Channel orientation ([`RrType::Chanx`] or [`RrType::Chany`]).
    pub chan: RrType,
    /// Coordinate `(span, row)` for CHANX blocks, `(col, span)` for CHANY.
    pub coord: Coord,
    /// Channel wires crossing the block, in track-slot order.
    pub chan_nodes: Vec<RrNodeId>,
    /// Input pins fed by the block.
    pub ipin_nodes: Vec<RrNodeId>,
    /// The tile face of each input pin.
    pub ipin_sides: Vec<Side>,
    /// Output pins driving into the channel at this block.
    pub opin_nodes: Vec<RrNodeId>,
    /// The tile face of each output pin.
    pub opin_sides: Vec<Side>,
    /// Configuration bits assigned to the block's multiplexers.
    pub conf_bits: Option<BitRange>,
    /// Reserved configuration bits (shared-bit organizations).
    pub reserved_conf_bits: Option<BitRange>,
    /// Coordinate of an identical block this one mirrors, if any.
    pub mirror: Option<Coord>,
    /// Coordinate of a block this one matches after flipping its pin
    /// sides.
    pub rotatable: Option<Coord>,
}

impl RrgCb {
    /// Number of channel wires crossing the block.
    pub fn chan_width(&self) -> usize {
        self.chan_nodes.len()
    }

    /// Returns whether this block is its class's canonical representative.
    pub fn is_canonical(&self) -> bool {
        self.mirror.is_none() && self.rotatable.is_none()
    }
}

/// Direction of a wire relative to a switch block, per side.
fn chan_port_dir(side: Side, direction: RrDirection) -> PortDir {
    match direction {
        RrDirection::Bi => PortDir::Both,
        RrDirection::Inc => match side {
            Side::Top | Side::Right => PortDir::Out,
            Side::Bottom | Side::Left => PortDir::In,
        },
        RrDirection::Dec => match side {
            Side::Top | Side::Right => PortDir::In,
            Side::Bottom | Side::Left => PortDir::Out,
        },
    }
}

/// Collects the pins of the tiles flanking one channel span.
fn collect_face_pins(
    arch: &ArchTables,
    lookup: &RrSpatialLookup,
    chan: RrType,
    index: u32,
    span: u32,
    kind: PinKind,
) -> Result<(Vec<RrNodeId>, Vec<Side>), RrgError> {
    let grid_w = arch.layout.width();
    let grid_h = arch.layout.height();
    let mut nodes = Vec::new();
    let mut sides = Vec::new();
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
        let root_y = face_ref.tile.y - tile.offset;
        let pin_ty = match kind {
            PinKind::Driver => RrType::Opin,
            PinKind::Receiver => RrType::Ipin,
        };
        for pin in bt.side_pins(kind, face_ref.face, tile.offset) {
            let id = lookup.expect(pin_ty, face_ref.tile.x, root_y, pin)?;
            nodes.push(id);
            sides.push(face_ref.face);
        }
    }
    Ok((nodes, sides))
}

/// Builds the structural view of the switch block at crossing `at`.
pub(crate) fn build_sb_view(
    graph: &RrGraph,
    lookup: &RrSpatialLookup,
    arch: &ArchTables,
    at: Coord,
) -> Result<RrgSb, RrgError> {
    let grid_w = arch.layout.width();
    let grid_h = arch.layout.height();
    let mut sides = Vec::with_capacity(4);
    for side in Side::ALL {
        let mut view = BlockSide::default();
        if let Some((chan, index, span)) = side_channel(at, side, grid_w, grid_h) {
            for entry in lookup.chan_slots(chan, index, span) {
                let Some(id) = entry else { continue };
                let node = graph.node(*id);
                view.chan_nodes.push(*id);
                view.chan_dirs.push(chan_port_dir(side, node.direction));
            }
            let (opins, opin_sides) =
                collect_face_pins(arch, lookup, chan, index, span, PinKind::Driver)?;
            let (ipins, ipin_sides) =
                collect_face_pins(arch, lookup, chan, index, span, PinKind::Receiver)?;
            view.opin_nodes = opins;
            view.opin_sides = opin_sides;
            view.ipin_nodes = ipins;
            view.ipin_sides = ipin_sides;
        }
        sides.push(view);
    }
    Ok(RrgSb {
        coord: at,
        sides,
        conf_bits: None,
        reserved_conf_bits: None,
        mirror: None,
        rotatable: None,
    })
}

/// Builds the structural view of one connection block.
pub(crate) fn build_cb_view(
    lookup: &RrSpatialLookup,
    arch: &ArchTables,
    chan: RrType,
    index: u32,
    span: u32,
) -> Result<RrgCb, RrgError> {
    let mut chan_nodes = Vec::new();
    for entry in lookup.chan_slots(chan, index, span) {
        if let Some(id) = entry {
            chan_nodes.push(*id);
        }
    }
    let (ipin_nodes, ipin_sides) =
        collect_face_pins(arch, lookup, chan, index, span, PinKind::Receiver)?;
    let (opin_nodes, opin_sides) =
        collect_face_pins(arch, lookup, chan, index, span, PinKind::Driver)?;
    let coord = match chan {
        RrType::Chanx => Coord::new(span, index),
        _ => Coord::new(index, span),
    };
    Ok(RrgCb {
        chan,
        coord,
        chan_nodes,
        ipin_nodes,
        ipin_sides,
        opin_nodes,
        opin_sides,
        conf_bits: None,
        reserved_conf_bits: None,
        mirror: None,
        rotatable: None,
    })
}
