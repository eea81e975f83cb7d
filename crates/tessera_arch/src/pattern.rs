//! Connectivity bit-patterns for switch-block and connection-block
//! depopulation.
//!
//! A [`ConnectivityPattern`] is parsed from a `T`/`F` (or `1`/`0`) string
//! and records, position by position, whether a wire segment attaches to
//! the routing structure at that crossing. A [`SwsegPattern`] overrides the
//! buffered switch normally used at selected crossings of a segment with a
//! pass-transistor style switch.

use crate::error::ArchError;
use crate::ids::SwitchId;
use crate::segment::Directionality;
use serde::{Deserialize, Serialize};

/// A boolean attachment pattern along a wire segment.
///
/// For a segment of length `L`, connection-block patterns have `L` entries
/// (one per tile along the wire) and switch-block patterns have `L + 1`
/// entries (one per switch-block crossing, including both endpoints).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectivityPattern {
    bits: Vec<bool>,
}

impl ConnectivityPattern {
    /// Creates a fully-populated pattern of the given length.
    pub fn full(len: usize) -> Self {
        Self {
            bits: vec![true; len],
        }
    }

    /// Parses a pattern string of exactly `expected_len` symbols.
    ///
    /// `T` and `1` mean connected, `F` and `0` mean not connected;
    /// whitespace is ignored. Any other character, or a symbol count other
    /// than `expected_len`, is rejected.
    pub fn parse(text: &str, expected_len: usize) -> Result<Self, ArchError> {
        let mut bits = Vec::with_capacity(expected_len);
        for ch in text.chars() {
            match ch {
                ' ' | '\t' | '\n' | '\r' => {}
                'T' | '1' => bits.push(true),
                'F' | '0' => bits.push(false),
                other => return Err(ArchError::PatternChar(other)),
            }
        }
        if bits.len() != expected_len {
            return Err(ArchError::PatternLength {
                expected: expected_len,
                found: bits.len(),
            });
        }
        Ok(Self { bits })
    }

    /// Returns the number of positions in the pattern.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Returns whether the pattern has no positions.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Returns whether position `index` is connected.
    ///
    /// Out-of-range positions read as not connected.
    pub fn is_set(&self, index: usize) -> bool {
        self.bits.get(index).copied().unwrap_or(false)
    }

    /// Returns the pattern as a boolean slice.
    pub fn as_slice(&self) -> &[bool] {
        &self.bits
    }
}

/// Which routing structure an unbuffered switch-segment pattern applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwsegKind {
    /// Substitute the switch used at switch-block crossings.
    UnbufSb,
    /// Substitute the switch used at connection-block attachments.
    UnbufCb,
}

/// An unbuffered switch-segment pattern.
///
/// For segments of the matching length, crossings whose pattern position is
/// set use `unbuf_switch` (a pass-transistor style switch) instead of the
/// segment's default buffered switch. The pattern repeats along the wire
/// (`position mod pattern_length`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwsegPattern {
    /// Which structure the substitution applies to.
    pub kind: SwsegKind,
    /// The segment length (in tiles) the pattern targets.
    pub seg_length: u32,
    /// The pass-transistor switch substituted at set positions.
    pub unbuf_switch: SwitchId,
    /// The repeating substitution pattern.
    pub pattern: ConnectivityPattern,
}

impl SwsegPattern {
    /// Creates a switch-segment pattern.
    ///
    /// `pattern` may be `None` for the default fully-connected pattern of
    /// `pattern_length` positions. Only unidirectional segments are
    /// supported; `seg_length` must be at least 1 and `pattern_length` at
    /// least 2.
    pub fn new(
        kind: SwsegKind,
        seg_length: u32,
        directionality: Directionality,
        unbuf_switch: SwitchId,
        pattern: Option<ConnectivityPattern>,
        pattern_length: usize,
    ) -> Result<Self, ArchError> {
        if directionality != Directionality::UniDir {
            return Err(ArchError::SwsegNotUnidirectional);
        }
        if seg_length < 1 {
            return Err(ArchError::SwsegLengthTooShort(seg_length));
        }
        if pattern_length < 2 {
            return Err(ArchError::SwsegPatternTooShort(pattern_length));
        }
        let pattern = match pattern {
            Some(p) => {
                if p.len() != pattern_length {
                    return Err(ArchError::PatternLength {
                        expected: pattern_length,
                        found: p.len(),
                    });
                }
                p
            }
            None => ConnectivityPattern::full(pattern_length),
        };
        Ok(Self {
            kind,
            seg_length,
            unbuf_switch,
            pattern,
        })
    }

    /// Returns whether the substitution applies at the given crossing
    /// position along the wire.
    pub fn applies_at(&self, position: usize) -> bool {
        self.pattern.is_set(position % self.pattern.len())
    }
}
