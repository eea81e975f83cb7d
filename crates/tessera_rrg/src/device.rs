//! The device model: everything the builder produces, in one owned value.

use crate::graph::RrGraph;
use crate::gsb::{RrgCb, RrgSb};
use crate::lookup::RrSpatialLookup;
use crate::stats::RrgStats;
use serde::{Deserialize, Serialize};

/// The finished routing-resource model of one device.
///
/// Owns the node store, the spatial lookup, the per-coordinate switch- and
/// connection-block views, and the graph statistics. After construction
/// the model is immutable (the router mutates only the `occ` counters it
/// owns) and safe to share read-only across threads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceModel {
    /// Grid width in tiles.
    pub grid_width: u32,
    /// Grid height in tiles.
    pub grid_height: u32,
    /// Channel width in tracks.
    pub chan_width: u32,
    /// The node store.
    pub graph: RrGraph,
    /// The device-wide O(1) node index.
    pub lookup: RrSpatialLookup,
    /// Switch-block views, `(grid_width + 1) * (grid_height + 1)`, stored
    /// column-major (`x * (grid_height + 1) + y`).
    pub sbs: Vec<RrgSb>,
    /// CHANX connection blocks, stored row-major (`row * grid_width + span`).
    pub cbx: Vec<RrgCb>,
    /// CHANY connection blocks, stored column-major (`col * grid_height + span`).
    pub cby: Vec<RrgCb>,
    /// Graph statistics.
    pub stats: RrgStats,
    /// Total configuration bits allocated across all blocks.
    pub total_conf_bits: u32,
}

impl DeviceModel {
    /// The switch block at crossing `(x, y)`.
    pub fn sb(&self, x: u32, y: u32) -> &RrgSb {
        &self.sbs[(x * (self.grid_height + 1) + y) as usize]
    }

    /// The CHANX connection block at span `x` of row `y`.
    pub fn cbx(&self, x: u32, y: u32) -> &RrgCb {
        &self.cbx[(y * self.grid_width + x) as usize]
    }

    /// The CHANY connection block at span `y` of column `x`.
    pub fn cby(&self, x: u32, y: u32) -> &RrgCb {
        &self.cby[(x * self.grid_height + y) as usize]
    }

    /// Number of switch-block modules netlist generation must emit.
    pub fn num_unique_sbs(&self) -> usize {
        self.sbs.iter().filter(|sb| sb.is_canonical()).count()
    }

    /// Number of unique CHANX connection-block modules.
    pub fn num_unique_cbx(&self) -> usize {
        self.cbx.iter().filter(|cb| cb.is_canonical()).count()
    }

    /// Number of unique CHANY connection-block modules.
    pub fn num_unique_cby(&self) -> usize {
        self.cby.iter().filter(|cb| cb.is_canonical()).count()
    }
}
