//! Shared primitives for the Tessera FPGA fabric toolkit.
//!
//! This crate provides the small value types used across the workspace:
//! device-grid geometry ([`Coord`], [`Side`]), configuration-bit ranges
//! ([`BitRange`]), and the internal-error plumbing ([`TesseraResult`],
//! [`InternalError`]).

#![warn(missing_docs)]

pub mod geometry;
pub mod result;

pub use geometry::{BitRange, Coord, Side};
pub use result::{InternalError, TesseraResult};
