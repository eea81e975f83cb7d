//! Physical block-type descriptors.
//!
//! A block type describes one kind of grid tile: its ports and pins, the
//! grouping of pins into equivalence classes, which tile faces each pin is
//! physically available on, and the per-pin Fc settings that govern how
//! many channel tracks each pin may connect to.

use crate::error::ArchError;
use serde::{Deserialize, Serialize};
use tessera_common::Side;

/// Direction of a port relative to the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortDirection {
    /// Signals flow into the block (IPINs).
    Input,
    /// Signals flow out of the block (OPINs).
    Output,
}

/// The role of a pin class in the routing fabric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinKind {
    /// Output pins; the class sources signals (one SOURCE node per class).
    Driver,
    /// Input pins; the class sinks signals (one SINK node per class).
    Receiver,
}

/// A port on a block type: a named, contiguous group of pins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    /// Port name, unique within the block type.
    pub name: String,
    /// Number of pins in the port.
    pub num_pins: u32,
    /// Direction of every pin in the port.
    pub direction: PortDirection,
}

impl Port {
    /// Creates an input port.
    pub fn input(name: impl Into<String>, num_pins: u32) -> Self {
        Self {
            name: name.into(),
            num_pins,
            direction: PortDirection::Input,
        }
    }

    /// Creates an output port.
    pub fn output(name: impl Into<String>, num_pins: u32) -> Self {
        Self {
            name: name.into(),
            num_pins,
            direction: PortDirection::Output,
        }
    }
}

/// A group of logically-equivalent pins.
///
/// The graph builder creates one SOURCE node per driver class and one SINK
/// node per receiver class; the class index is the node's ptc number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinClass {
    /// Whether the class drives or receives signals.
    pub kind: PinKind,
    /// Flat pin indices belonging to the class.
    pub pins: Vec<u32>,
}

/// How a pin's Fc value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FcKind {
    /// Absolute number of tracks.
    Abs,
    /// Fraction of the channel width.
    Frac,
    /// Connect to every track.
    Full,
}

/// The fraction (or absolute count) of channel tracks a pin connects to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fc {
    /// Interpretation of `value`.
    pub kind: FcKind,
    /// The Fc value; ignored for [`FcKind::Full`].
    pub value: f64,
}

impl Fc {
    /// An Fc connecting the pin to every track.
    pub fn full() -> Self {
        Self {
            kind: FcKind::Full,
            value: 0.0,
        }
    }

    /// A fractional Fc.
    pub fn frac(value: f64) -> Self {
        Self {
            kind: FcKind::Frac,
            value,
        }
    }

    /// An absolute Fc.
    pub fn abs(tracks: u32) -> Self {
        Self {
            kind: FcKind::Abs,
            value: f64::from(tracks),
        }
    }

    /// Resolves the Fc to a track count for a channel of `chan_width`
    /// tracks. The result is clamped to `[0, chan_width]`.
    pub fn track_count(&self, chan_width: u32) -> u32 {
        let n = match self.kind {
            FcKind::Full => f64::from(chan_width),
            FcKind::Abs => self.value,
            FcKind::Frac => self.value * f64::from(chan_width),
        };
        let n = n.round();
        if n <= 0.0 {
            0
        } else if n >= f64::from(chan_width) {
            chan_width
        } else {
            n as u32
        }
    }
}

/// A per-pin or per-pin-range Fc override.
///
/// The pin specification is either a bare port name (`"in"`, overriding
/// the whole port) or a range (`"in[3:1]"`, overriding pins 1 through 3
/// inclusive).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FcOverride {
    /// The `"port"` or `"port[hi:lo]"` pin specification.
    pub pin_spec: String,
    /// The Fc applied to the selected pins.
    pub fc: Fc,
}

/// A physical block type: ports, pin classes, pin locations, and Fc.
///
/// Pins are numbered flat across ports in declaration order. One pin class
/// is created per port; all pins of a port are considered logically
/// equivalent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockType {
    /// Block type name.
    pub name: String,
    /// Height of the block in grid tiles (>= 1).
    pub height: u32,
    /// Number of block instances per tile.
    pub capacity: u32,
    /// The ports of the block, in pin-numbering order.
    pub ports: Vec<Port>,
    /// Total number of pins across all ports.
    pub num_pins: u32,
    /// Pin equivalence classes (one per port).
    pub pin_classes: Vec<PinClass>,
    /// Class index of each flat pin.
    pub class_of_pin: Vec<u32>,
    /// Physical pin availability: `pinloc[height][side][pin]`.
    pub pinloc: Vec<Vec<Vec<bool>>>,
    /// Per-pin Fc setting.
    pub fc: Vec<Fc>,
    /// Which pins have already received an Fc override.
    fc_overridden: Vec<bool>,
}

impl BlockType {
    /// Creates a block type from its ports.
    ///
    /// All pins default to being available on every side of every height
    /// row, with a [`Fc::full`] setting.
    pub fn new(name: impl Into<String>, height: u32, capacity: u32, ports: Vec<Port>) -> Self {
        let num_pins: u32 = ports.iter().map(|p| p.num_pins).sum();
        let mut pin_classes = Vec::with_capacity(ports.len());
        let mut class_of_pin = vec![0u32; num_pins as usize];
        let mut next_pin = 0u32;
        for (class_idx, port) in ports.iter().enumerate() {
            let kind = match port.direction {
                PortDirection::Input => PinKind::Receiver,
                PortDirection::Output => PinKind::Driver,
            };
            let pins: Vec<u32> = (next_pin..next_pin + port.num_pins).collect();
            for &p in &pins {
                class_of_pin[p as usize] = class_idx as u32;
            }
            next_pin += port.num_pins;
            pin_classes.push(PinClass { kind, pins });
        }
        let height = height.max(1);
        let pinloc = vec![vec![vec![true; num_pins as usize]; 4]; height as usize];
        Self {
            name: name.into(),
            height,
            capacity: capacity.max(1),
            ports,
            num_pins,
            pin_classes,
            class_of_pin,
            pinloc,
            fc: vec![Fc::full(); num_pins as usize],
            fc_overridden: vec![false; num_pins as usize],
        }
    }

    /// Creates a block type with no pins (an empty tile).
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, 1, 1, Vec::new())
    }

    /// Returns the kind of the given flat pin.
    pub fn pin_kind(&self, pin: u32) -> Option<PinKind> {
        let class = *self.class_of_pin.get(pin as usize)?;
        Some(self.pin_classes[class as usize].kind)
    }

    /// Returns the Fc setting of the given flat pin.
    pub fn fc_of_pin(&self, pin: u32) -> Fc {
        self.fc[pin as usize]
    }

    /// Sets the default Fc for all input and output pins.
    ///
    /// Pins that already received an explicit override keep their value.
    pub fn set_fc_defaults(&mut self, fc_in: Fc, fc_out: Fc) {
        for pin in 0..self.num_pins {
            if self.fc_overridden[pin as usize] {
                continue;
            }
            match self.pin_kind(pin) {
                Some(PinKind::Receiver) => self.fc[pin as usize] = fc_in,
                Some(PinKind::Driver) => self.fc[pin as usize] = fc_out,
                None => {}
            }
        }
    }

    /// Applies a per-pin Fc override.
    ///
    /// The pin specification is `"port"` (whole port) or `"port[hi:lo]"`
    /// (inclusive range). A malformed specification, an unknown port, a
    /// reversed or out-of-range pin range, or a second override touching an
    /// already-overridden pin is an error.
    pub fn apply_fc_override(&mut self, ov: &FcOverride) -> Result<(), ArchError> {
        let (port_name, range) = parse_pin_spec(&ov.pin_spec)?;
        let (offset, port) = self.port_offset(port_name)?;
        let (hi, lo) = match range {
            Some((hi, lo)) => {
                if hi < lo {
                    return Err(ArchError::PinRangeReversed { hi, lo });
                }
                if hi >= port.num_pins {
                    return Err(ArchError::PinRangeOutOfBounds {
                        port: port.name.clone(),
                        hi,
                        lo,
                        num_pins: port.num_pins,
                    });
                }
                (hi, lo)
            }
            None => (port.num_pins - 1, 0),
        };
        let port_name = port.name.clone();
        for pin in lo..=hi {
            let flat = (offset + pin) as usize;
            if self.fc_overridden[flat] {
                return Err(ArchError::ConflictingFcOverride {
                    port: port_name.clone(),
                    pin,
                });
            }
            self.fc[flat] = ov.fc;
            self.fc_overridden[flat] = true;
        }
        Ok(())
    }

    /// Returns the flat-pin offset and descriptor of the named port.
    pub fn port_offset(&self, name: &str) -> Result<(u32, &Port), ArchError> {
        let mut offset = 0u32;
        for port in &self.ports {
            if port.name == name {
                return Ok((offset, port));
            }
            offset += port.num_pins;
        }
        Err(ArchError::UnknownPort(name.to_string()))
    }

    /// Marks a pin as present or absent on a tile face.
    pub fn set_pin_side(&mut self, height: u32, side: Side, pin: u32, present: bool) {
        self.pinloc[height as usize][side.index()][pin as usize] = present;
    }

    /// Restricts every pin of the block to a single tile face.
    pub fn restrict_pins_to_side(&mut self, side: Side) {
        for row in &mut self.pinloc {
            for (side_idx, pins) in row.iter_mut().enumerate() {
                let keep = side_idx == side.index();
                for p in pins.iter_mut() {
                    *p = keep;
                }
            }
        }
    }

    /// Returns whether a pin is present on the given face and height row.
    pub fn pin_on_side(&self, height: u32, side: Side, pin: u32) -> bool {
        self.pinloc[height as usize][side.index()][pin as usize]
    }

    /// Returns the flat pin indices of the given kind present on one face
    /// and height row, in pin order.
    pub fn side_pins(&self, kind: PinKind, side: Side, height: u32) -> Vec<u32> {
        let mut pins = Vec::new();
        for pin in 0..self.num_pins {
            if self.pin_on_side(height, side, pin) && self.pin_kind(pin) == Some(kind) {
                pins.push(pin);
            }
        }
        pins
    }

    /// Returns the total number of pin placements of the given kind.
    ///
    /// When `io_side` is given (I/O tiles), only that face counts;
    /// otherwise all four faces across all height rows are counted.
    pub fn num_pins_of_kind(&self, kind: PinKind, io_side: Option<Side>) -> usize {
        let mut count = 0;
        for side in Side::ALL {
            if let Some(io) = io_side {
                if side != io {
                    continue;
                }
            }
            for height in 0..self.height {
                count += self.side_pins(kind, side, height).len();
            }
        }
        count
    }

    /// Returns the number of pin classes of the given kind.
    pub fn num_classes_of_kind(&self, kind: PinKind) -> usize {
        self.pin_classes.iter().filter(|c| c.kind == kind).count()
    }
}

/// Parses `"port"` or `"port[hi:lo]"` into a port name and optional range.
fn parse_pin_spec(spec: &str) -> Result<(&str, Option<(u32, u32)>), ArchError> {
    match spec.find('[') {
        None => {
            if spec.is_empty() {
                return Err(ArchError::InvalidPinSpec(spec.to_string()));
            }
            Ok((spec.trim(), None))
        }
        Some(open) => {
            let name = spec[..open].trim();
            let rest = &spec[open + 1..];
            let close = rest
                .find(']')
                .ok_or_else(|| ArchError::InvalidPinSpec(spec.to_string()))?;
            if name.is_empty() || !rest[close + 1..].trim().is_empty() {
                return Err(ArchError::InvalidPinSpec(spec.to_string()));
            }
            let inner = &rest[..close];
            let (hi_str, lo_str) = inner
                .split_once(':')
                .ok_or_else(|| ArchError::InvalidPinSpec(spec.to_string()))?;
            let hi: u32 = hi_str
                .trim()
                .parse()
                .map_err(|_| ArchError::InvalidPinSpec(spec.to_string()))?;
            let lo: u32 = lo_str
                .trim()
                .parse()
                .map_err(|_| ArchError::InvalidPinSpec(spec.to_string()))?;
            Ok((name, Some((hi, lo))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clb() -> BlockType {
        BlockType::new(
            "clb",
            1,
            1,
            vec![Port::input("in", 4), Port::output("out", 2)],
        )
    }

    #[test]
    fn pin_numbering_is_flat() {
        let b = clb();
        assert_eq!(b.num_pins, 6);
        assert_eq!(b.pin_kind(0), Some(PinKind::Receiver));
        assert_eq!(b.pin_kind(3), Some(PinKind::Receiver));
        assert_eq!(b.pin_kind(4), Some(PinKind::Driver));
        assert_eq!(b.pin_kind(5), Some(PinKind::Driver));
        assert_eq!(b.pin_kind(6), None);
    }

    #[test]
    fn one_class_per_port() {
        let b = clb();
        assert_eq!(b.pin_classes.len(), 2);
        assert_eq!(b.pin_classes[0].pins, vec![0, 1, 2, 3]);
        assert_eq!(b.pin_classes[1].pins, vec![4, 5]);
        assert_eq!(b.num_classes_of_kind(PinKind::Receiver), 1);
        assert_eq!(b.num_classes_of_kind(PinKind::Driver), 1);
    }

    #[test]
    fn empty_block_has_no_pins() {
        let b = BlockType::empty("void");
        assert_eq!(b.num_pins, 0);
        assert!(b.pin_classes.is_empty());
        assert_eq!(b.num_pins_of_kind(PinKind::Driver, None), 0);
    }

    #[test]
    fn default_pins_on_all_sides() {
        let b = clb();
        for side in Side::ALL {
            assert_eq!(b.side_pins(PinKind::Receiver, side, 0), vec![0, 1, 2, 3]);
            assert_eq!(b.side_pins(PinKind::Driver, side, 0), vec![4, 5]);
        }
        assert_eq!(b.num_pins_of_kind(PinKind::Receiver, None), 16);
    }

    #[test]
    fn restrict_to_one_side() {
        let mut b = clb();
        b.restrict_pins_to_side(Side::Bottom);
        assert_eq!(b.side_pins(PinKind::Receiver, Side::Top, 0), Vec::<u32>::new());
        assert_eq!(b.side_pins(PinKind::Receiver, Side::Bottom, 0), vec![0, 1, 2, 3]);
        assert_eq!(
            b.num_pins_of_kind(PinKind::Receiver, Some(Side::Bottom)),
            4
        );
    }

    #[test]
    fn fc_defaults_by_direction() {
        let mut b = clb();
        b.set_fc_defaults(Fc::frac(0.5), Fc::abs(3));
        assert_eq!(b.fc_of_pin(0).kind, FcKind::Frac);
        assert_eq!(b.fc_of_pin(4).kind, FcKind::Abs);
    }

    #[test]
    fn fc_track_counts() {
        assert_eq!(Fc::full().track_count(8), 8);
        assert_eq!(Fc::frac(0.5).track_count(8), 4);
        assert_eq!(Fc::frac(0.3).track_count(8), 2);
        assert_eq!(Fc::abs(3).track_count(8), 3);
        assert_eq!(Fc::abs(20).track_count(8), 8);
        assert_eq!(Fc::frac(0.0).track_count(8), 0);
    }

    #[test]
    fn fc_override_whole_port() {
        let mut b = clb();
        b.apply_fc_override(&FcOverride {
            pin_spec: "in".to_string(),
            fc: Fc::abs(2),
        })
        .unwrap();
        for pin in 0..4 {
            assert_eq!(b.fc_of_pin(pin).kind, FcKind::Abs);
        }
        assert_eq!(b.fc_of_pin(4).kind, FcKind::Full);
    }

    #[test]
    fn fc_override_pin_range() {
        let mut b = clb();
        b.apply_fc_override(&FcOverride {
            pin_spec: "in[2:1]".to_string(),
            fc: Fc::frac(0.25),
        })
        .unwrap();
        assert_eq!(b.fc_of_pin(0).kind, FcKind::Full);
        assert_eq!(b.fc_of_pin(1).kind, FcKind::Frac);
        assert_eq!(b.fc_of_pin(2).kind, FcKind::Frac);
        assert_eq!(b.fc_of_pin(3).kind, FcKind::Full);
    }

    #[test]
    fn fc_override_reversed_range_rejected() {
        let mut b = clb();
        let err = b
            .apply_fc_override(&FcOverride {
                pin_spec: "in[1:3]".to_string(),
                fc: Fc::full(),
            })
            .unwrap_err();
        assert!(matches!(err, ArchError::PinRangeReversed { hi: 1, lo: 3 }));
    }

    #[test]
    fn fc_override_out_of_range_rejected() {
        let mut b = clb();
        let err = b
            .apply_fc_override(&FcOverride {
                pin_spec: "in[4:0]".to_string(),
                fc: Fc::full(),
            })
            .unwrap_err();
        assert!(matches!(err, ArchError::PinRangeOutOfBounds { .. }));
    }

    #[test]
    fn fc_override_unknown_port_rejected() {
        let mut b = clb();
        let err = b
            .apply_fc_override(&FcOverride {
                pin_spec: "bogus".to_string(),
                fc: Fc::full(),
            })
            .unwrap_err();
        assert!(matches!(err, ArchError::UnknownPort(_)));
    }

    #[test]
    fn fc_override_conflict_rejected() {
        let mut b = clb();
        b.apply_fc_override(&FcOverride {
            pin_spec: "in[3:2]".to_string(),
            fc: Fc::abs(1),
        })
        .unwrap();
        let err = b
            .apply_fc_override(&FcOverride {
                pin_spec: "in[2:0]".to_string(),
                fc: Fc::abs(2),
            })
            .unwrap_err();
        assert!(matches!(
            err,
            ArchError::ConflictingFcOverride { pin: 2, .. }
        ));
    }

    #[test]
    fn fc_override_survives_defaults() {
        let mut b = clb();
        b.apply_fc_override(&FcOverride {
            pin_spec: "in[0:0]".to_string(),
            fc: Fc::abs(1),
        })
        .unwrap();
        b.set_fc_defaults(Fc::frac(0.5), Fc::frac(0.5));
        assert_eq!(b.fc_of_pin(0).kind, FcKind::Abs);
        assert_eq!(b.fc_of_pin(1).kind, FcKind::Frac);
    }

    #[test]
    fn malformed_pin_specs_rejected() {
        for spec in ["in[", "in[2]", "in[a:b]", "[2:0]", "in[2:0]x", ""] {
            let mut b = clb();
            let err = b
                .apply_fc_override(&FcOverride {
                    pin_spec: spec.to_string(),
                    fc: Fc::full(),
                })
                .unwrap_err();
            assert!(
                matches!(err, ArchError::InvalidPinSpec(_)),
                "spec {spec:?} should be rejected as malformed, got {err}"
            );
        }
    }

    #[test]
    fn multi_height_pinloc() {
        let b = BlockType::new("bram", 2, 1, vec![Port::input("addr", 3)]);
        assert_eq!(b.height, 2);
        assert!(b.pin_on_side(1, Side::Left, 2));
        assert_eq!(b.num_pins_of_kind(PinKind::Receiver, None), 24);
    }

    #[test]
    fn serde_roundtrip() {
        let b = clb();
        let json = serde_json::to_string(&b).unwrap();
        let restored: BlockType = serde_json::from_str(&json).unwrap();
        assert_eq!(b, restored);
    }
}
