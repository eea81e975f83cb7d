//! Error types for architecture-table construction and validation.

/// Errors raised while building or validating architecture tables.
///
/// Every variant corresponds to a user-input problem (a bad architecture
/// description), not an internal bug. The graph builder refuses to start
/// from tables that failed validation, so none of these can surface after
/// construction has begun.
#[derive(Debug, thiserror::Error)]
pub enum ArchError {
    /// A switch name did not resolve against the switch table.
    #[error("'{0}' is not a valid switch name")]
    UnknownSwitch(String),

    /// A segment name did not resolve against the segment table.
    #[error("'{0}' is not a valid segment name")]
    UnknownSegment(String),

    /// A connectivity pattern string had the wrong number of symbols.
    ///
    /// Depopulation patterns must have exactly `length` symbols for
    /// connection blocks and `length + 1` symbols for switch blocks.
    #[error("connectivity pattern has {found} symbols, expected {expected}")]
    PatternLength {
        /// The number of symbols required.
        expected: usize,
        /// The number of symbols found in the string.
        found: usize,
    },

    /// A connectivity pattern string contained a symbol other than
    /// `T`/`1`/`F`/`0` or whitespace.
    #[error("invalid character '{0}' in connectivity pattern")]
    PatternChar(char),

    /// The switch-block `fs` parameter was not an odd integer >= 3.
    #[error("switch-block fs must be an odd integer >= 3, got {0}")]
    InvalidFs(u32),

    /// The channel width was zero.
    #[error("channel width must be at least 1")]
    ZeroChannelWidth,

    /// A pin specification referenced a port that does not exist.
    #[error("port '{0}' cannot be found")]
    UnknownPort(String),

    /// A pin specification could not be parsed as `port` or `port[hi:lo]`.
    #[error("invalid pin specification '{0}', expected \"port\" or \"port[hi:lo]\"")]
    InvalidPinSpec(String),

    /// A pin range had its end index below its start index.
    #[error("invalid pin range [{hi}:{lo}]: the end index must not be less than the start index")]
    PinRangeReversed {
        /// The end (high) pin index.
        hi: u32,
        /// The start (low) pin index.
        lo: u32,
    },

    /// A pin range extended past the end of its port.
    #[error("pin range [{hi}:{lo}] exceeds the {num_pins} pins of port '{port}'")]
    PinRangeOutOfBounds {
        /// The port the range was applied to.
        port: String,
        /// The end (high) pin index.
        hi: u32,
        /// The start (low) pin index.
        lo: u32,
        /// The number of pins in the port.
        num_pins: u32,
    },

    /// Two Fc overrides touched the same pin.
    #[error("multiple Fc overrides touch pin {pin} of port '{port}'")]
    ConflictingFcOverride {
        /// The port containing the doubly-overridden pin.
        port: String,
        /// The pin index within the port.
        pin: u32,
    },

    /// A bidirectional segment was declared with different wire and opin
    /// switches while the architecture requires them to match, or a
    /// unidirectional constructor was given mismatched switches.
    #[error("unidirectional segment '{0}' must use a single mux switch for wires and opins")]
    UnidirSwitchMismatch(String),

    /// A switch-segment pattern was declared for bidirectional segments.
    #[error("switch-segment patterns support unidirectional segments only")]
    SwsegNotUnidirectional,

    /// A switch-segment pattern had `seg_length` below 1.
    #[error("switch-segment seg_length must be at least 1, got {0}")]
    SwsegLengthTooShort(u32),

    /// A switch-segment pattern had `pattern_length` below 2.
    #[error("switch-segment pattern_length must be at least 2, got {0}")]
    SwsegPatternTooShort(usize),

    /// A depopulation pattern was attached to a full-channel segment.
    #[error("segment '{0}' spans the full channel and cannot carry a depopulation pattern")]
    LongLinePattern(String),

    /// A device dimension was zero.
    #[error("device layout dimensions must be at least 1x1, got {width}x{height}")]
    ZeroDimension {
        /// Requested grid width.
        width: u32,
        /// Requested grid height.
        height: u32,
    },

    /// A grid access was outside the device.
    #[error("grid coordinate ({x}, {y}) is outside the {width}x{height} device")]
    CoordOutOfBounds {
        /// Requested column.
        x: u32,
        /// Requested row.
        y: u32,
        /// Grid width.
        width: u32,
        /// Grid height.
        height: u32,
    },
}
