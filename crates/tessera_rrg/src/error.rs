//! Error types for routing-resource-graph construction.

use crate::ids::RrNodeId;
use tessera_arch::ArchError;
use tessera_common::InternalError;

/// Errors raised while building or validating a routing-resource graph.
///
/// Any of these aborts the whole build: no partially-valid graph is ever
/// returned, since a corrupt device model would silently degrade every
/// downstream placement and routing result.
#[derive(Debug, thiserror::Error)]
pub enum RrgError {
    /// A node id outside `[0, num_nodes)` was passed to the edge builder.
    #[error("node index {index} is out of range (graph has {num_nodes} nodes)")]
    InvalidNodeIndex {
        /// The offending index.
        index: u32,
        /// Number of nodes in the graph.
        num_nodes: usize,
    },

    /// `add_edges` was called with destination and switch lists of
    /// different lengths.
    #[error("destination list has {dsts} entries but switch list has {switches}")]
    EdgeListMismatch {
        /// Length of the destination list.
        dsts: usize,
        /// Length of the switch list.
        switches: usize,
    },

    /// An I/O tile sits in the center of the grid, where no single facing
    /// side exists.
    #[error("I/O tile at ({x}, {y}) is in the center of the device, which is unsupported")]
    InteriorIoTile {
        /// Tile column.
        x: u32,
        /// Tile row.
        y: u32,
    },

    /// Tileable graph construction requires unidirectional segments.
    #[error("tileable routing requires unidirectional segments")]
    TileableRequiresUnidir,

    /// The channel width cannot be divided among the segment types.
    #[error("segment '{segment}' was allocated {tracks} tracks, but {required}")]
    TrackAllocation {
        /// The segment whose allocation failed.
        segment: String,
        /// The number of tracks allocated to it.
        tracks: u32,
        /// What the allocation needed to satisfy.
        required: String,
    },

    /// A node was never assigned a type before the indexer ran.
    #[error("node {0} has no type; construction left it uninitialized")]
    UnsetNodeType(RrNodeId),

    /// Two nodes claimed the same canonical lookup key.
    #[error("nodes {first} and {second} share the lookup key ({ty}, {x}, {y}, ptc {ptc})")]
    DuplicateLookupKey {
        /// The node registered first.
        first: RrNodeId,
        /// The node that collided with it.
        second: RrNodeId,
        /// Node-type name of the key.
        ty: &'static str,
        /// Key column.
        x: u32,
        /// Key row.
        y: u32,
        /// Key pin/track/class number.
        ptc: u32,
    },

    /// Two wires claimed the same track slot at the same channel crossing.
    #[error("wires {first} and {second} both occupy slot {slot} of {ty} ({x}, {y})")]
    DuplicateTrackSlot {
        /// The wire registered first.
        first: RrNodeId,
        /// The wire that collided with it.
        second: RrNodeId,
        /// Channel orientation name.
        ty: &'static str,
        /// Channel row or column.
        x: u32,
        /// Span within the channel.
        y: u32,
        /// The contested track slot.
        slot: u32,
    },

    /// A lookup key pointed outside the graph or at nothing.
    #[error("no node registered for ({ty}, {x}, {y}, ptc {ptc})")]
    MissingLookupKey {
        /// Node-type name of the key.
        ty: &'static str,
        /// Key column.
        x: u32,
        /// Key row.
        y: u32,
        /// Key pin/track/class number.
        ptc: u32,
    },

    /// A node's stored fan-in disagreed with a recount over all edges.
    #[error("node {node} records fan_in {stored} but {recomputed} edges target it")]
    FanInMismatch {
        /// The node with inconsistent bookkeeping.
        node: RrNodeId,
        /// The fan-in stored on the node.
        stored: u32,
        /// The fan-in recomputed from edge lists.
        recomputed: u32,
    },

    /// The number of created nodes did not match the pre-sized store.
    #[error("node store was sized for {expected} nodes but construction produced {created}")]
    NodeCountMismatch {
        /// Size the store was allocated with.
        expected: usize,
        /// Number of nodes actually created.
        created: usize,
    },

    /// An I/O error while saving or loading a device model.
    #[error("device-model file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// A device model could not be serialized.
    #[error("failed to encode device model: {0}")]
    Encode(String),

    /// A device-model file was corrupt or in an unknown format.
    #[error("failed to decode device model: {0}")]
    Decode(String),

    /// An architecture-table error surfaced during construction.
    #[error(transparent)]
    Arch(#[from] ArchError),

    /// A programming invariant was violated.
    #[error(transparent)]
    Internal(#[from] InternalError),
}
