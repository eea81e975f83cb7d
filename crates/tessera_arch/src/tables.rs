//! The aggregate of all architecture tables consumed by the graph builder.

use crate::error::ArchError;
use crate::layout::DeviceLayout;
use crate::pattern::SwsegPattern;
use crate::policy::RoutingPolicy;
use crate::segment::{Directionality, SegmentTable};
use crate::switch::SwitchTable;
use serde::{Deserialize, Serialize};

/// Everything the routing-resource-graph builder needs, in one place.
///
/// This aggregate replaces the module-level globals of older toolchains:
/// construction is a pure function of an `ArchTables` value. The tables are
/// validated as a whole by [`ArchTables::validate`] before any graph
/// construction begins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchTables {
    /// The switch table.
    pub switches: SwitchTable,
    /// The wire-segment table.
    pub segments: SegmentTable,
    /// The device layout (tiles and block types).
    pub layout: DeviceLayout,
    /// The global routing policy.
    pub policy: RoutingPolicy,
    /// Unbuffered switch-segment substitution patterns.
    pub swseg_patterns: Vec<SwsegPattern>,
}

impl ArchTables {
    /// Validates cross-table consistency.
    ///
    /// Checks that every switch id referenced by the policy, the segments,
    /// and the swseg patterns indexes the switch table; that at least one
    /// segment exists; and that every unidirectional segment shares one
    /// switch for wires and opins.
    pub fn validate(&self) -> Result<(), ArchError> {
        for id in [self.policy.wire_to_ipin_switch, self.policy.delayless_switch] {
            if !self.switches.contains(id) {
                return Err(ArchError::UnknownSwitch(format!("#{id}")));
            }
        }
        if self.segments.is_empty() {
            return Err(ArchError::UnknownSegment("<none declared>".to_string()));
        }
        for (_, seg) in self.segments.iter() {
            for id in [seg.wire_switch, seg.opin_switch] {
                if !self.switches.contains(id) {
                    return Err(ArchError::UnknownSwitch(format!("#{id}")));
                }
            }
            if seg.directionality == Directionality::UniDir && seg.wire_switch != seg.opin_switch {
                return Err(ArchError::UnidirSwitchMismatch(seg.name.clone()));
            }
        }
        for pat in &self.swseg_patterns {
            if !self.switches.contains(pat.unbuf_switch) {
                return Err(ArchError::UnknownSwitch(format!("#{}", pat.unbuf_switch)));
            }
        }
        Ok(())
    }

    /// Rebuilds the auxiliary name indexes after deserialization.
    pub fn rebuild_indices(&mut self) {
        self.switches.rebuild_index();
        self.segments.rebuild_index();
    }
}
