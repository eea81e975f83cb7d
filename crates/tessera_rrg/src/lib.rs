//! Routing-resource-graph construction for the Tessera FPGA toolkit.
//!
//! This crate builds the directed graph of wires, switches, and pins that
//! models how signals travel through an FPGA fabric. Given the read-only
//! architecture tables of [`tessera_arch`], [`build_device_model`]
//! produces a [`DeviceModel`]: the flat node store ([`RrGraph`]), an O(1)
//! device-wide index ([`RrSpatialLookup`]), per-coordinate switch-block
//! and connection-block views ([`RrgSb`], [`RrgCb`]) with their
//! configuration-bit ranges and mirror classification, and summary
//! statistics ([`RrgStats`]).
//!
//! # Pipeline
//!
//! 1. **Plan** — divide the channel tracks among segment types and lay
//!    out every wire (stagger, rotation, boundary truncation)
//! 2. **Allocate** — size the node store once from the layout
//! 3. **Materialize** — create SOURCE/SINK/OPIN/IPIN and channel nodes
//! 4. **Connect** — switch-block permutations, Fc-governed pin
//!    connections, intra-tile class edges
//! 5. **Verify** — fan-in reconstruction over the finished topology
//! 6. **Analyze** — block views, configuration bits, mirror detection,
//!    statistics
//!
//! Construction is atomic-or-fatal: any inconsistency returns an
//! [`RrgError`] and no partially-valid model is produced. The finished
//! model is immutable and safe to share read-only across threads.
//!
//! # Usage
//!
//! ```ignore
//! use tessera_rrg::build_device_model;
//!
//! let model = build_device_model(&arch_tables)?;
//! assert_eq!(model.lookup.keys().len(), model.graph.len());
//! println!("{}", model.stats);
//! ```

#![warn(missing_docs)]

pub mod builder;
pub mod cb;
pub mod chan;
pub mod confbits;
pub mod device;
pub mod error;
pub mod graph;
pub mod gsb;
pub mod ids;
pub mod io;
pub mod lookup;
pub mod mirror;
pub mod node;
pub mod sb;
pub mod stats;

pub use builder::{build_device_model, io_grid_pin_side};
pub use chan::{ChanPlan, TrackProfile, WireSpec};
pub use device::DeviceModel;
pub use error::RrgError;
pub use graph::RrGraph;
pub use gsb::{BlockSide, PortDir, RrgCb, RrgSb};
pub use ids::RrNodeId;
pub use io::{load_model, save_model};
pub use lookup::RrSpatialLookup;
pub use node::{RrDirection, RrNode, RrType};
pub use sb::permuted_track;
pub use stats::{MuxStats, RrgStats, TypeStats};
