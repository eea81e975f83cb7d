//! Channel planning: track allocation and wire emission.
//!
//! A [`ChanPlan`] decides, for one channel orientation, which segment type
//! and direction each of the W tracks carries, then emits the concrete
//! wire list of a channel instance as [`WireSpec`]s: spans, per-span track
//! slots, ptc numbers, and the pattern phase used to index depopulation
//! patterns on truncated wires.
//!
//! Two layouts are supported:
//!
//! - **Classic**: every wire keeps one track slot for its whole length;
//!   wires of a slot are staggered by the slot's position within its
//!   group and truncated at the device boundary.
//! - **Tileable**: wires rotate through the L slots of their group (slot
//!   0 of the group always hosts a wire start), so every tile sees an
//!   identical channel profile. A length-L wire then carries L distinct
//!   track ids, one per crossing, and boundary tiles get the truncated
//!   head/tail wires needed to keep every span at full width.

use crate::error::RrgError;
use crate::node::RrDirection;
use serde::{Deserialize, Serialize};
use tessera_arch::{Directionality, RoutingPolicy, SegmentId, SegmentTable};

/// The per-track assignment of one channel orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackProfile {
    /// Segment type carried by the track.
    pub seg: SegmentId,
    /// Resolved wire length in tiles (clamped to the channel span).
    pub length: u32,
    /// Signal direction of the track.
    pub direction: RrDirection,
    /// First track slot of the stagger/rotation group this track is in.
    pub group_start: u32,
}

/// One channel wire to be materialized as a CHANX/CHANY node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireSpec {
    /// Segment type of the wire.
    pub seg: SegmentId,
    /// Signal direction.
    pub direction: RrDirection,
    /// Lowest covered span.
    pub low: u32,
    /// Highest covered span.
    pub high: u32,
    /// Track slot at each covered span (`track_ids[i]` is the slot at span
    /// `low + i`).
    pub track_ids: Vec<u32>,
    /// Pin/track/class number: the wire's slot at its start crossing.
    pub ptc: u32,
    /// Number of head crossings cut off by the device boundary; offsets
    /// every depopulation-pattern index on this wire.
    pub phase: u32,
}

impl WireSpec {
    /// Returns the track slot at the given span.
    pub fn slot_at(&self, span: u32) -> Option<u32> {
        if span < self.low || span > self.high {
            return None;
        }
        Some(self.track_ids[(span - self.low) as usize])
    }
}

/// The track plan of one channel orientation (all rows or all columns).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChanPlan {
    tileable: bool,
    span_count: u32,
    profiles: Vec<TrackProfile>,
}

impl ChanPlan {
    /// Builds the track plan for channels with `span_count` tile spans.
    ///
    /// The W tracks are divided among the segment types proportionally to
    /// their declared frequencies. Unidirectional channels need an even
    /// per-segment track count (Inc/Dec pairs); tileable channels
    /// additionally need each per-direction count to be a multiple of the
    /// segment length, so the rotation groups tile exactly.
    pub fn new(
        policy: &RoutingPolicy,
        segments: &SegmentTable,
        span_count: u32,
    ) -> Result<Self, RrgError> {
        if policy.tileable && policy.directionality != Directionality::UniDir {
            return Err(RrgError::TileableRequiresUnidir);
        }
        let w = policy.chan_width;

        let total_freq: u64 = segments.iter().map(|(_, s)| u64::from(s.frequency)).sum();
        if total_freq == 0 {
            return Err(RrgError::TrackAllocation {
                segment: "<all>".to_string(),
                tracks: 0,
                required: "segment frequencies must sum to a positive value".to_string(),
            });
        }

        // Proportional allocation, remainder to the earliest segments.
        let mut counts: Vec<u32> = segments
            .iter()
            .map(|(_, s)| ((u64::from(w) * u64::from(s.frequency)) / total_freq) as u32)
            .collect();
        let mut leftover = w - counts.iter().sum::<u32>();
        while leftover > 0 {
            for (i, (_, s)) in segments.iter().enumerate() {
                if leftover == 0 {
                    break;
                }
                if s.frequency > 0 {
                    counts[i] += 1;
                    leftover -= 1;
                }
            }
        }

        let unidir = policy.directionality == Directionality::UniDir;
        let mut profiles = Vec::with_capacity(w as usize);
        for (i, (seg_id, seg)) in segments.iter().enumerate() {
            let n = counts[i];
            if n == 0 {
                continue;
            }
            let length = seg.length.tiles(span_count);
            if unidir {
                if n % 2 != 0 {
                    return Err(RrgError::TrackAllocation {
                        segment: seg.name.clone(),
                        tracks: n,
                        required: "unidirectional channels need an even track count per segment"
                            .to_string(),
                    });
                }
                let per_dir = n / 2;
                if policy.tileable && per_dir % length != 0 {
                    return Err(RrgError::TrackAllocation {
                        segment: seg.name.clone(),
                        tracks: n,
                        required: format!(
                            "tileable channels need the per-direction track count to be a multiple of the segment length {length}"
                        ),
                    });
                }
                for direction in [RrDirection::Inc, RrDirection::Dec] {
                    let dir_base = profiles.len() as u32;
                    for t in 0..per_dir {
                        profiles.push(TrackProfile {
                            seg: seg_id,
                            length,
                            direction,
                            group_start: dir_base + (t / length) * length,
                        });
                    }
                }
            } else {
                let base = profiles.len() as u32;
                for t in 0..n {
                    profiles.push(TrackProfile {
                        seg: seg_id,
                        length,
                        direction: RrDirection::Bi,
                        group_start: base + (t / length) * length,
                    });
                }
            }
        }
        debug_assert_eq!(profiles.len(), w as usize);

        Ok(Self {
            tileable: policy.tileable,
            span_count,
            profiles,
        })
    }

    /// The channel width in tracks.
    pub fn chan_width(&self) -> u32 {
        self.profiles.len() as u32
    }

    /// The number of tile spans per channel instance.
    pub fn span_count(&self) -> u32 {
        self.span_count
    }

    /// The per-track profiles.
    pub fn profiles(&self) -> &[TrackProfile] {
        &self.profiles
    }

    /// Emits the wire list of one channel instance.
    pub fn wires(&self) -> Vec<WireSpec> {
        if self.tileable {
            self.tileable_wires()
        } else {
            self.classic_wires()
        }
    }

    /// Classic layout: constant slot per wire, staggered starts, boundary
    /// truncation.
    fn classic_wires(&self) -> Vec<WireSpec> {
        let s_count = self.span_count;
        let mut wires = Vec::new();
        for (slot, profile) in self.profiles.iter().enumerate() {
            let slot = slot as u32;
            let l = profile.length;
            let ph = slot - profile.group_start;
            let dec = profile.direction == RrDirection::Dec;
            // Wire truncated by the low boundary. The cut spans are the
            // head of an Inc wire but the tail of a Dec wire, whose
            // logical start (its high end) is intact.
            if ph > 0 && s_count > 0 {
                let high = (ph - 1).min(s_count - 1);
                wires.push(WireSpec {
                    seg: profile.seg,
                    direction: profile.direction,
                    low: 0,
                    high,
                    track_ids: vec![slot; (high + 1) as usize],
                    ptc: slot,
                    phase: if dec { 0 } else { l - ph },
                });
            }
            let mut p = ph;
            while p < s_count {
                let high = (p + l - 1).min(s_count - 1);
                let cut = (p + l - 1) - high;
                wires.push(WireSpec {
                    seg: profile.seg,
                    direction: profile.direction,
                    low: p,
                    high,
                    track_ids: vec![slot; (high - p + 1) as usize],
                    ptc: slot,
                    phase: if dec { cut } else { 0 },
                });
                p += l;
            }
        }
        wires
    }

    /// Tileable layout: rotation groups, every span at full width.
    fn tileable_wires(&self) -> Vec<WireSpec> {
        let s_count = self.span_count;
        let mut wires = Vec::new();
        let mut slot = 0u32;
        while (slot as usize) < self.profiles.len() {
            let profile = self.profiles[slot as usize];
            let b = profile.group_start;
            debug_assert_eq!(slot, b);
            let l = profile.length;
            match profile.direction {
                RrDirection::Inc => {
                    for s in 0..s_count {
                        let high = (s + l - 1).min(s_count - 1);
                        let track_ids: Vec<u32> = (0..=(high - s)).map(|i| b + i).collect();
                        wires.push(WireSpec {
                            seg: profile.seg,
                            direction: profile.direction,
                            low: s,
                            high,
                            ptc: track_ids[0],
                            track_ids,
                            phase: 0,
                        });
                    }
                    for k in 1..l {
                        let high = (l - 1 - k).min(s_count - 1);
                        let track_ids: Vec<u32> = (0..=high).map(|i| b + k + i).collect();
                        wires.push(WireSpec {
                            seg: profile.seg,
                            direction: profile.direction,
                            low: 0,
                            high,
                            ptc: track_ids[0],
                            track_ids,
                            phase: k,
                        });
                    }
                }
                RrDirection::Dec => {
                    for s in 0..s_count {
                        let low = (s + 1).saturating_sub(l);
                        let track_ids: Vec<u32> =
                            (0..=(s - low)).map(|i| b + (s - low) - i).collect();
                        wires.push(WireSpec {
                            seg: profile.seg,
                            direction: profile.direction,
                            low,
                            high: s,
                            track_ids,
                            ptc: b,
                            phase: 0,
                        });
                    }
                    for k in 1..l {
                        let high = s_count - 1;
                        let low = high.saturating_sub(l - 1 - k);
                        let track_ids: Vec<u32> =
                            (0..=(high - low)).map(|i| b + k + (high - low) - i).collect();
                        wires.push(WireSpec {
                            seg: profile.seg,
                            direction: profile.direction,
                            low,
                            high,
                            track_ids,
                            ptc: b + k,
                            phase: k,
                        });
                    }
                }
                RrDirection::Bi => unreachable!("tileable plans are unidirectional"),
            }
            slot += l;
        }
        wires
    }
}
