//! Architecture tables for the Tessera routing-resource-graph builder.
//!
//! This crate defines the read-only tables that describe an FPGA
//! architecture to the graph builder: the switch table ([`SwitchTable`]),
//! the wire-segment table ([`SegmentTable`]), block-type descriptors with
//! pin classes and Fc settings ([`BlockType`]), the device layout grid
//! ([`DeviceLayout`]), the global routing policy ([`RoutingPolicy`]), and
//! the connectivity bit-patterns used for switch-block and connection-block
//! depopulation ([`ConnectivityPattern`], [`SwsegPattern`]).
//!
//! Everything here is validated at construction time and immutable
//! afterwards; the graph builder never sees a string-valued type tag or an
//! unresolved name. All validation failures are reported as [`ArchError`]
//! values, never as process exits.

#![warn(missing_docs)]

pub mod block;
pub mod error;
pub mod ids;
pub mod layout;
pub mod pattern;
pub mod policy;
pub mod segment;
pub mod switch;
pub mod tables;

pub use block::{BlockType, Fc, FcKind, FcOverride, PinClass, PinKind, Port, PortDirection};
pub use error::ArchError;
pub use ids::{BlockTypeId, SegmentId, SwitchId};
pub use layout::{DeviceLayout, GridTile};
pub use pattern::{ConnectivityPattern, SwsegKind, SwsegPattern};
pub use policy::{RoutingPolicy, SbPattern};
pub use segment::{Directionality, Segment, SegmentLength, SegmentTable};
pub use switch::{Switch, SwitchStructure, SwitchTable};
pub use tables::ArchTables;
