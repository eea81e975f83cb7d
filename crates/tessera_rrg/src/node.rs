//! Routing-resource-graph nodes.
//!
//! Every routing resource of the device is one [`RrNode`]: the dummy
//! per-class SOURCE/SINK nodes, the physical block pins (OPIN/IPIN), and
//! the channel wires (CHANX/CHANY). Nodes are allocated in one batch with
//! every field at a defined sentinel value and filled in during
//! construction.

use crate::ids::RrNodeId;
use serde::{Deserialize, Serialize};
use tessera_arch::SwitchId;
use tessera_common::{Coord, InternalError, TesseraResult};

/// The type of a routing-resource node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RrType {
    /// A dummy node sourcing the signals of one output pin class.
    Source,
    /// A dummy node sinking the signals of one input pin class.
    Sink,
    /// A block input pin.
    Ipin,
    /// A block output pin.
    Opin,
    /// A horizontal channel wire.
    Chanx,
    /// A vertical channel wire.
    Chany,
}

impl RrType {
    /// Number of node types.
    pub const COUNT: usize = 6;

    /// All node types, in ptc-table order.
    pub const ALL: [RrType; RrType::COUNT] = [
        RrType::Source,
        RrType::Sink,
        RrType::Ipin,
        RrType::Opin,
        RrType::Chanx,
        RrType::Chany,
    ];

    /// Returns this type's position in [`RrType::ALL`].
    pub fn index(self) -> usize {
        match self {
            RrType::Source => 0,
            RrType::Sink => 1,
            RrType::Ipin => 2,
            RrType::Opin => 3,
            RrType::Chanx => 4,
            RrType::Chany => 5,
        }
    }

    /// Returns the upper-case conventional name of this type.
    pub fn name(self) -> &'static str {
        match self {
            RrType::Source => "SOURCE",
            RrType::Sink => "SINK",
            RrType::Ipin => "IPIN",
            RrType::Opin => "OPIN",
            RrType::Chanx => "CHANX",
            RrType::Chany => "CHANY",
        }
    }

    /// Returns whether this is a channel-wire type.
    pub fn is_chan(self) -> bool {
        matches!(self, RrType::Chanx | RrType::Chany)
    }
}

impl std::fmt::Display for RrType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Signal direction of a channel wire.
///
/// Only meaningful for CHANX/CHANY nodes. [`RrDirection::Bi`] doubles as
/// the sentinel for freshly-allocated nodes, making uninitialized
/// direction fields easy to spot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RrDirection {
    /// Signals travel toward increasing x (CHANX) or y (CHANY).
    Inc,
    /// Signals travel toward decreasing x (CHANX) or y (CHANY).
    Dec,
    /// Bidirectional wire (also the unset sentinel).
    Bi,
}

/// A node in the routing-resource graph.
///
/// `edges[i]` is the target of the node's `i`-th outgoing edge and
/// `switches[i]` the switch type realizing it; the two lists always have
/// equal length and grow monotonically during construction. `fan_in` is
/// maintained exclusively by the edge builder, `occ` exclusively by the
/// router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RrNode {
    /// Node type; `None` until construction assigns it.
    pub ty: Option<RrType>,
    /// Low x of the node's extent.
    pub xlow: u32,
    /// High x of the node's extent.
    pub xhigh: u32,
    /// Low y of the node's extent.
    pub ylow: u32,
    /// High y of the node's extent.
    pub yhigh: u32,
    /// Pin/track/class number disambiguating nodes of one type at one tile.
    pub ptc: u32,
    /// Track slot at each covered channel span (channel nodes only; one
    /// entry per span, more than one distinct value in tileable layouts).
    pub track_ids: Vec<u32>,
    /// Signal direction (channel nodes only).
    pub direction: RrDirection,
    /// Number of signals the node can carry.
    pub capacity: u32,
    /// Present usage; owned by the router, always 0 after construction.
    pub occ: u32,
    /// Number of edges terminating at this node.
    pub fan_in: u32,
    /// Targets of the outgoing edges.
    pub edges: Vec<RrNodeId>,
    /// Switch type of each outgoing edge.
    pub switches: Vec<SwitchId>,
}

impl RrNode {
    /// Creates a node with every field at its sentinel value.
    pub fn unset() -> Self {
        Self {
            ty: None,
            xlow: 0,
            xhigh: 0,
            ylow: 0,
            yhigh: 0,
            ptc: 0,
            track_ids: Vec::new(),
            direction: RrDirection::Bi,
            capacity: 0,
            occ: 0,
            fan_in: 0,
            edges: Vec::new(),
            switches: Vec::new(),
        }
    }

    /// Returns the number of outgoing edges.
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Returns whether this is a channel wire.
    pub fn is_track(&self) -> bool {
        matches!(self.ty, Some(t) if t.is_chan())
    }

    /// Returns the coordinate where this wire's signal originates.
    ///
    /// `(xlow, ylow)` for [`RrDirection::Inc`] wires, `(xhigh, yhigh)` for
    /// [`RrDirection::Dec`]. Only valid for channel nodes.
    pub fn start_coord(&self) -> TesseraResult<Coord> {
        self.require_track("start_coord")?;
        match self.direction {
            RrDirection::Inc | RrDirection::Bi => Ok(Coord::new(self.xlow, self.ylow)),
            RrDirection::Dec => Ok(Coord::new(self.xhigh, self.yhigh)),
        }
    }

    /// Returns the coordinate where this wire's signal terminates.
    ///
    /// The mirror image of [`RrNode::start_coord`].
    pub fn end_coord(&self) -> TesseraResult<Coord> {
        self.require_track("end_coord")?;
        match self.direction {
            RrDirection::Inc | RrDirection::Bi => Ok(Coord::new(self.xhigh, self.yhigh)),
            RrDirection::Dec => Ok(Coord::new(self.xlow, self.ylow)),
        }
    }

    /// Returns the track slot of this wire in the channel where it
    /// terminates.
    ///
    /// The last entry of `track_ids` for [`RrDirection::Inc`] wires, the
    /// first for [`RrDirection::Dec`]. This asymmetry stitches multi-tile
    /// wires through intermediate switch blocks.
    pub fn end_track_id(&self) -> TesseraResult<u32> {
        self.require_track("end_track_id")?;
        let picked = match self.direction {
            RrDirection::Inc => self.track_ids.last(),
            RrDirection::Dec => self.track_ids.first(),
            RrDirection::Bi => {
                return Err(InternalError::new(
                    "end_track_id called on a bidirectional wire",
                ))
            }
        };
        picked.copied().ok_or_else(|| {
            InternalError::new("channel node has an empty track_ids list")
        })
    }

    fn require_track(&self, what: &str) -> TesseraResult<()> {
        if self.is_track() {
            Ok(())
        } else {
            Err(InternalError::new(format!(
                "{what} called on a non-channel node"
            )))
        }
    }
}

impl Default for RrNode {
    fn default() -> Self {
        Self::unset()
    }
}
