//! The global routing policy.
//!
//! The policy gathers the device-wide routing parameters: channel width,
//! directionality, the switch-block pattern and its `fs` fan-out, the
//! separate sub-pattern applied to passing tracks in tileable mode, and the
//! globally-used switch ids.

use crate::error::ArchError;
use crate::ids::SwitchId;
use crate::segment::Directionality;
use serde::{Deserialize, Serialize};

/// The switch-block connection pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SbPattern {
    /// Track `i` connects only to track `i` (Xilinx-style planar block).
    Subset,
    /// The disjoint permutation block of S. Wilton's 1997 construction.
    Wilton,
    /// The universal block of Chang et al. (1996): straight connections
    /// keep the track index, turns reverse it.
    Universal,
}

/// Device-wide routing-architecture parameters.
///
/// `sub_pattern`/`sub_fs` default to the main pattern and `fs`; they apply
/// to tracks passing through a switch block (rather than terminating at
/// it) when tileable routing is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingPolicy {
    /// Channel directionality.
    pub directionality: Directionality,
    /// Pattern for tracks terminating at a switch block.
    pub sb_pattern: SbPattern,
    /// Fan-out of a terminating track (odd, >= 3).
    pub fs: u32,
    /// Pattern for tracks passing through a switch block.
    pub sub_pattern: SbPattern,
    /// Fan-out of a passing track (odd, >= 3).
    pub sub_fs: u32,
    /// Allow passing tracks to drive wires starting back into the channel
    /// they arrived on.
    pub wire_opposite_side: bool,
    /// Build a tileable graph (identical channel profile at every tile).
    pub tileable: bool,
    /// Number of tracks per channel.
    pub chan_width: u32,
    /// Switch connecting channel wires to block input pins.
    pub wire_to_ipin_switch: SwitchId,
    /// Zero-delay switch for SOURCE→OPIN and IPIN→SINK edges.
    pub delayless_switch: SwitchId,
}

impl RoutingPolicy {
    /// Creates a policy with the sub-pattern defaulted to the main pattern.
    ///
    /// `fs` must be an odd integer >= 3 and `chan_width` at least 1.
    pub fn new(
        directionality: Directionality,
        sb_pattern: SbPattern,
        fs: u32,
        chan_width: u32,
        wire_to_ipin_switch: SwitchId,
        delayless_switch: SwitchId,
    ) -> Result<Self, ArchError> {
        check_fs(fs)?;
        if chan_width == 0 {
            return Err(ArchError::ZeroChannelWidth);
        }
        Ok(Self {
            directionality,
            sb_pattern,
            fs,
            sub_pattern: sb_pattern,
            sub_fs: fs,
            wire_opposite_side: false,
            tileable: false,
            chan_width,
            wire_to_ipin_switch,
            delayless_switch,
        })
    }

    /// Overrides the pattern and fan-out applied to passing tracks.
    pub fn with_sub_pattern(mut self, pattern: SbPattern, sub_fs: u32) -> Result<Self, ArchError> {
        check_fs(sub_fs)?;
        self.sub_pattern = pattern;
        self.sub_fs = sub_fs;
        Ok(self)
    }

    /// Enables or disables tileable graph construction.
    pub fn with_tileable(mut self, tileable: bool) -> Self {
        self.tileable = tileable;
        self
    }

    /// Enables or disables opposite-side wiring for passing tracks.
    pub fn with_wire_opposite_side(mut self, enabled: bool) -> Self {
        self.wire_opposite_side = enabled;
        self
    }
}

fn check_fs(fs: u32) -> Result<(), ArchError> {
    if fs < 3 || fs % 2 == 0 {
        return Err(ArchError::InvalidFs(fs));
    }
    Ok(())
}
