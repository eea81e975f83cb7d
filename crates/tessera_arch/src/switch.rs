//! Switch types: the connection primitives of the routing fabric.
//!
//! A switch is a buffer, pass transistor, or multiplexer stage used to
//! connect one routing resource to another. The graph builder references
//! switches by [`SwitchId`]; the table is built once from the architecture
//! description and read-only afterwards.

use crate::error::ArchError;
use crate::ids::SwitchId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How a multiplexer built from a switch is internally organized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwitchStructure {
    /// A single-level flat multiplexer.
    OneLevel,
    /// A tree multiplexer with the given number of levels.
    MultiLevel {
        /// Number of tree levels.
        levels: u32,
    },
    /// A user-defined structure resolved outside this library.
    Custom,
}

/// A named connection-primitive descriptor.
///
/// The electrical parameters are opaque to the graph builder; they are
/// carried through for the timing and area models downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Switch {
    /// The switch name, unique within the table.
    pub name: String,
    /// Whether the switch contains an active restoring element (buffer or
    /// mux) rather than a passive pass transistor or short.
    pub buffered: bool,
    /// Equivalent series resistance in ohms.
    pub resistance: f64,
    /// Input capacitance in farads.
    pub cap_in: f64,
    /// Output capacitance in farads.
    pub cap_out: f64,
    /// Intrinsic delay in seconds.
    pub intrinsic_delay: f64,
    /// Internal multiplexer organization.
    pub structure: SwitchStructure,
}

impl Switch {
    /// Creates a buffered one-level switch with the given name and timing.
    pub fn buffered(name: impl Into<String>, resistance: f64, intrinsic_delay: f64) -> Self {
        Self {
            name: name.into(),
            buffered: true,
            resistance,
            cap_in: 0.0,
            cap_out: 0.0,
            intrinsic_delay,
            structure: SwitchStructure::OneLevel,
        }
    }

    /// Creates an unbuffered (pass-transistor) switch.
    pub fn pass_gate(name: impl Into<String>, resistance: f64) -> Self {
        Self {
            name: name.into(),
            buffered: false,
            resistance,
            cap_in: 0.0,
            cap_out: 0.0,
            intrinsic_delay: 0.0,
            structure: SwitchStructure::OneLevel,
        }
    }
}

/// The read-only table of switch types, indexed by [`SwitchId`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SwitchTable {
    switches: Vec<Switch>,
    /// Auxiliary index: switch name to ID (rebuilt on deserialization).
    #[serde(skip)]
    by_name: HashMap<String, SwitchId>,
}

impl SwitchTable {
    /// Creates an empty switch table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a switch and returns its ID.
    pub fn add(&mut self, switch: Switch) -> SwitchId {
        let id = SwitchId::from_raw(self.switches.len() as u32);
        self.by_name.insert(switch.name.clone(), id);
        self.switches.push(switch);
        id
    }

    /// Returns the switch with the given ID.
    pub fn get(&self, id: SwitchId) -> &Switch {
        &self.switches[id.as_raw() as usize]
    }

    /// Resolves a switch name to its ID.
    ///
    /// An unresolved name is a configuration error.
    pub fn lookup(&self, name: &str) -> Result<SwitchId, ArchError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| ArchError::UnknownSwitch(name.to_string()))
    }

    /// Returns whether `id` indexes a switch in this table.
    pub fn contains(&self, id: SwitchId) -> bool {
        (id.as_raw() as usize) < self.switches.len()
    }

    /// Returns the number of switch types.
    pub fn len(&self) -> usize {
        self.switches.len()
    }

    /// Returns whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.switches.is_empty()
    }

    /// Returns an iterator over `(id, switch)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (SwitchId, &Switch)> {
        self.switches
            .iter()
            .enumerate()
            .map(|(i, s)| (SwitchId::from_raw(i as u32), s))
    }

    /// Rebuilds the name index after deserialization.
    pub fn rebuild_index(&mut self) {
        self.by_name.clear();
        for (i, s) in self.switches.iter().enumerate() {
            self.by_name
                .insert(s.name.clone(), SwitchId::from_raw(i as u32));
        }
    }
}
