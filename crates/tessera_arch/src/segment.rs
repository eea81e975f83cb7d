//! Wire-segment types: the routing wires of the channel.
//!
//! A segment type describes a class of channel wires: how many tiles each
//! wire spans, whether it is unidirectional or bidirectional, which
//! switches drive it, what share of the channel it occupies, and where
//! along its span it attaches to switch blocks and connection blocks.

use crate::error::ArchError;
use crate::ids::{SegmentId, SwitchId};
use crate::pattern::ConnectivityPattern;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Whether a channel wire carries signals one way or both ways.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Directionality {
    /// Single-driver wires; each wire has one multiplexer at its start.
    UniDir,
    /// Multi-driver wires; tristate drivers attach along the span.
    BiDir,
}

/// The span of a wire segment in tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SegmentLength {
    /// The wire spans the given number of tiles (>= 1).
    Tiles(u32),
    /// The wire spans the entire channel.
    LongLine,
}

impl SegmentLength {
    /// Returns the span in tiles, resolving [`SegmentLength::LongLine`]
    /// against the actual channel span.
    pub fn tiles(self, chan_span: u32) -> u32 {
        match self {
            SegmentLength::Tiles(n) => n.min(chan_span).max(1),
            SegmentLength::LongLine => chan_span.max(1),
        }
    }

    /// Returns whether the segment spans the full channel.
    pub fn is_longline(self) -> bool {
        matches!(self, SegmentLength::LongLine)
    }
}

/// A wire-segment type.
///
/// For unidirectional segments a single mux switch realizes both
/// wire-to-wire and pin-to-wire fan-in, so `wire_switch == opin_switch`
/// always holds; the [`Segment::unidir`] constructor enforces this by
/// taking one switch. Bidirectional segments name the two independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// The segment name, unique within the table.
    pub name: String,
    /// Span of each wire of this type.
    pub length: SegmentLength,
    /// Uni- or bidirectional wiring.
    pub directionality: Directionality,
    /// Switch driving this segment from other wires.
    pub wire_switch: SwitchId,
    /// Switch driving this segment from block output pins.
    pub opin_switch: SwitchId,
    /// Relative share of channel tracks allocated to this type.
    pub frequency: u32,
    /// Connection-block attachment pattern, one entry per tile along the
    /// wire. Fully populated unless depopulated explicitly.
    pub cb_pattern: ConnectivityPattern,
    /// Switch-block attachment pattern, one entry per crossing (length+1).
    /// Fully populated unless depopulated explicitly.
    pub sb_pattern: ConnectivityPattern,
}

impl Segment {
    /// Creates a unidirectional segment driven by a single mux switch.
    pub fn unidir(
        name: impl Into<String>,
        length: SegmentLength,
        mux_switch: SwitchId,
        frequency: u32,
    ) -> Self {
        let (cb_len, sb_len) = Self::pattern_lens(length);
        Self {
            name: name.into(),
            length,
            directionality: Directionality::UniDir,
            wire_switch: mux_switch,
            opin_switch: mux_switch,
            frequency,
            cb_pattern: ConnectivityPattern::full(cb_len),
            sb_pattern: ConnectivityPattern::full(sb_len),
        }
    }

    /// Creates a bidirectional segment with independent wire and opin
    /// switches.
    pub fn bidir(
        name: impl Into<String>,
        length: SegmentLength,
        wire_switch: SwitchId,
        opin_switch: SwitchId,
        frequency: u32,
    ) -> Self {
        let (cb_len, sb_len) = Self::pattern_lens(length);
        Self {
            name: name.into(),
            length,
            directionality: Directionality::BiDir,
            wire_switch,
            opin_switch,
            frequency,
            cb_pattern: ConnectivityPattern::full(cb_len),
            sb_pattern: ConnectivityPattern::full(sb_len),
        }
    }

    /// Attaches a parsed connection-block depopulation pattern.
    ///
    /// The string must have exactly `length` symbols. Full-channel
    /// segments cannot be depopulated.
    pub fn with_cb_pattern(mut self, text: &str) -> Result<Self, ArchError> {
        let (cb_len, _) = self.checked_pattern_lens()?;
        self.cb_pattern = ConnectivityPattern::parse(text, cb_len)?;
        Ok(self)
    }

    /// Attaches a parsed switch-block depopulation pattern.
    ///
    /// The string must have exactly `length + 1` symbols. Full-channel
    /// segments cannot be depopulated.
    pub fn with_sb_pattern(mut self, text: &str) -> Result<Self, ArchError> {
        let (_, sb_len) = self.checked_pattern_lens()?;
        self.sb_pattern = ConnectivityPattern::parse(text, sb_len)?;
        Ok(self)
    }

    fn pattern_lens(length: SegmentLength) -> (usize, usize) {
        match length {
            SegmentLength::Tiles(n) => {
                let n = n.max(1) as usize;
                (n, n + 1)
            }
            // LongLine patterns are resolved per channel; keep a
            // placeholder single-position fully-populated pattern.
            SegmentLength::LongLine => (1, 2),
        }
    }

    fn checked_pattern_lens(&self) -> Result<(usize, usize), ArchError> {
        match self.length {
            SegmentLength::Tiles(n) => {
                let n = n.max(1) as usize;
                Ok((n, n + 1))
            }
            SegmentLength::LongLine => Err(ArchError::LongLinePattern(self.name.clone())),
        }
    }
}

/// The read-only table of segment types, indexed by [`SegmentId`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SegmentTable {
    segments: Vec<Segment>,
    /// Auxiliary index: segment name to ID (rebuilt on deserialization).
    #[serde(skip)]
    by_name: HashMap<String, SegmentId>,
}

impl SegmentTable {
    /// Creates an empty segment table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a segment and returns its ID.
    pub fn add(&mut self, segment: Segment) -> SegmentId {
        let id = SegmentId::from_raw(self.segments.len() as u32);
        self.by_name.insert(segment.name.clone(), id);
        self.segments.push(segment);
        id
    }

    /// Returns the segment with the given ID.
    pub fn get(&self, id: SegmentId) -> &Segment {
        &self.segments[id.as_raw() as usize]
    }

    /// Resolves a segment name to its ID.
    pub fn lookup(&self, name: &str) -> Result<SegmentId, ArchError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| ArchError::UnknownSegment(name.to_string()))
    }

    /// Returns the number of segment types.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns an iterator over `(id, segment)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (SegmentId, &Segment)> {
        self.segments
            .iter()
            .enumerate()
            .map(|(i, s)| (SegmentId::from_raw(i as u32), s))
    }

    /// Rebuilds the name index after deserialization.
    pub fn rebuild_index(&mut self) {
        self.by_name.clear();
        for (i, s) in self.segments.iter().enumerate() {
            self.by_name
                .insert(s.name.clone(), SegmentId::from_raw(i as u32));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sw(raw: u32) -> SwitchId {
        SwitchId::from_raw(raw)
    }

    #[test]
    fn unidir_shares_switch() {
        let s = Segment::unidir("l4", SegmentLength::Tiles(4), sw(2), 1);
        assert_eq!(s.wire_switch, s.opin_switch);
        assert_eq!(s.directionality, Directionality::UniDir);
    }

    #[test]
    fn bidir_keeps_switches_independent() {
        let s = Segment::bidir("l1", SegmentLength::Tiles(1), sw(0), sw(1), 1);
        assert_ne!(s.wire_switch, s.opin_switch);
        assert_eq!(s.directionality, Directionality::BiDir);
    }

    #[test]
    fn default_patterns_fully_populated() {
        let s = Segment::unidir("l2", SegmentLength::Tiles(2), sw(0), 1);
        assert_eq!(s.cb_pattern.len(), 2);
        assert_eq!(s.sb_pattern.len(), 3);
        assert!(s.cb_pattern.as_slice().iter().all(|&b| b));
        assert!(s.sb_pattern.as_slice().iter().all(|&b| b));
    }

    #[test]
    fn cb_pattern_exact_length() {
        let s = Segment::unidir("l2", SegmentLength::Tiles(2), sw(0), 1)
            .with_cb_pattern("TF")
            .unwrap();
        assert_eq!(s.cb_pattern.as_slice(), &[true, false]);
    }

    #[test]
    fn sb_pattern_exact_length() {
        let s = Segment::unidir("l2", SegmentLength::Tiles(2), sw(0), 1)
            .with_sb_pattern("T0T")
            .unwrap();
        assert_eq!(s.sb_pattern.as_slice(), &[true, false, true]);
    }

    #[test]
    fn wrong_length_pattern_rejected() {
        let err = Segment::unidir("l2", SegmentLength::Tiles(2), sw(0), 1)
            .with_cb_pattern("TFT")
            .unwrap_err();
        assert!(matches!(err, ArchError::PatternLength { .. }));
    }

    #[test]
    fn longline_pattern_rejected() {
        let err = Segment::unidir("span", SegmentLength::LongLine, sw(0), 1)
            .with_sb_pattern("TT")
            .unwrap_err();
        assert!(matches!(err, ArchError::LongLinePattern(_)));
    }

    #[test]
    fn length_resolution() {
        assert_eq!(SegmentLength::Tiles(4).tiles(10), 4);
        assert_eq!(SegmentLength::Tiles(20).tiles(10), 10);
        assert_eq!(SegmentLength::LongLine.tiles(10), 10);
        assert!(SegmentLength::LongLine.is_longline());
    }

    #[test]
    fn table_lookup() {
        let mut table = SegmentTable::new();
        let id = table.add(Segment::unidir("l1", SegmentLength::Tiles(1), sw(0), 1));
        assert_eq!(table.lookup("l1").unwrap(), id);
        assert!(matches!(
            table.lookup("l9"),
            Err(ArchError::UnknownSegment(_))
        ));
    }

    #[test]
    fn serde_roundtrip_rebuilds_index() {
        let mut table = SegmentTable::new();
        table.add(Segment::unidir("l1", SegmentLength::Tiles(1), sw(0), 1));
        let json = serde_json::to_string(&table).unwrap();
        let mut restored: SegmentTable = serde_json::from_str(&json).unwrap();
        restored.rebuild_index();
        assert!(restored.lookup("l1").is_ok());
        assert_eq!(restored.len(), 1);
    }
}
