//! The device layout grid.
//!
//! A [`DeviceLayout`] assigns a block type to every tile of a
//! `width x height` grid. Blocks taller than one tile occupy several rows;
//! only the root tile (offset 0) owns the block's pins and nodes.

use crate::block::BlockType;
use crate::error::ArchError;
use crate::ids::BlockTypeId;
use serde::{Deserialize, Serialize};
use tessera_common::Coord;

/// One tile of the device grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridTile {
    /// The block type occupying this tile.
    pub block_type: BlockTypeId,
    /// Number of tiles above the root tile of the block (0 for the root).
    pub offset: u32,
}

/// The device layout: a grid of typed tiles plus the block-type table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceLayout {
    width: u32,
    height: u32,
    tiles: Vec<GridTile>,
    /// The block-type table, indexed by [`BlockTypeId`].
    pub block_types: Vec<BlockType>,
    /// The I/O block type.
    pub io_type: BlockTypeId,
    /// The empty (resource-free) block type.
    pub empty_type: BlockTypeId,
}

impl DeviceLayout {
    /// Creates a layout with every tile set to the empty type.
    ///
    /// `block_types` must contain the entries referenced by `io_type` and
    /// `empty_type`. Zero dimensions are rejected.
    pub fn new(
        width: u32,
        height: u32,
        block_types: Vec<BlockType>,
        io_type: BlockTypeId,
        empty_type: BlockTypeId,
    ) -> Result<Self, ArchError> {
        if width == 0 || height == 0 {
            return Err(ArchError::ZeroDimension { width, height });
        }
        let tiles = vec![
            GridTile {
                block_type: empty_type,
                offset: 0,
            };
            (width * height) as usize
        ];
        Ok(Self {
            width,
            height,
            tiles,
            block_types,
            io_type,
            empty_type,
        })
    }

    /// Creates the conventional layout: a core filled with `core_type`,
    /// an I/O ring on the four edges, and empty corners.
    pub fn with_io_ring(
        width: u32,
        height: u32,
        block_types: Vec<BlockType>,
        core_type: BlockTypeId,
        io_type: BlockTypeId,
        empty_type: BlockTypeId,
    ) -> Result<Self, ArchError> {
        let mut layout = Self::new(width, height, block_types, io_type, empty_type)?;
        for x in 0..width {
            for y in 0..height {
                let on_x_edge = x == 0 || x == width - 1;
                let on_y_edge = y == 0 || y == height - 1;
                let ty = if on_x_edge && on_y_edge {
                    empty_type
                } else if on_x_edge || on_y_edge {
                    io_type
                } else {
                    core_type
                };
                layout.set_tile(Coord::new(x, y), ty)?;
            }
        }
        Ok(layout)
    }

    /// Grid width in tiles.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in tiles.
    pub fn height(&self) -> u32 {
        self.height
    }

    fn index(&self, at: Coord) -> Result<usize, ArchError> {
        if at.x >= self.width || at.y >= self.height {
            return Err(ArchError::CoordOutOfBounds {
                x: at.x,
                y: at.y,
                width: self.width,
                height: self.height,
            });
        }
        Ok((at.x * self.height + at.y) as usize)
    }

    /// Assigns a block type to a tile (and marks follow-on rows for
    /// multi-height blocks).
    pub fn set_tile(&mut self, at: Coord, block_type: BlockTypeId) -> Result<(), ArchError> {
        let height = self.block_type(block_type).height;
        for dy in 0..height {
            let idx = self.index(Coord::new(at.x, at.y + dy))?;
            self.tiles[idx] = GridTile {
                block_type,
                offset: dy,
            };
        }
        Ok(())
    }

    /// Returns the tile at the given coordinate.
    pub fn tile(&self, at: Coord) -> Result<GridTile, ArchError> {
        Ok(self.tiles[self.index(at)?])
    }

    /// Returns a block-type descriptor.
    pub fn block_type(&self, id: BlockTypeId) -> &BlockType {
        &self.block_types[id.as_raw() as usize]
    }

    /// Returns a mutable block-type descriptor.
    pub fn block_type_mut(&mut self, id: BlockTypeId) -> &mut BlockType {
        &mut self.block_types[id.as_raw() as usize]
    }

    /// Returns the block type occupying a tile.
    pub fn tile_type(&self, at: Coord) -> Result<&BlockType, ArchError> {
        let tile = self.tile(at)?;
        Ok(self.block_type(tile.block_type))
    }

    /// Returns whether the tile holds an I/O block.
    pub fn is_io(&self, at: Coord) -> Result<bool, ArchError> {
        Ok(self.tile(at)?.block_type == self.io_type)
    }

    /// Returns whether the tile is empty.
    pub fn is_empty_tile(&self, at: Coord) -> Result<bool, ArchError> {
        Ok(self.tile(at)?.block_type == self.empty_type)
    }

    /// Returns whether the tile is the root (offset-0) tile of its block.
    pub fn is_root_tile(&self, at: Coord) -> Result<bool, ArchError> {
        Ok(self.tile(at)?.offset == 0)
    }

    /// Iterates over all tile coordinates in column-major scan order.
    pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.width).flat_map(move |x| (0..self.height).map(move |y| Coord::new(x, y)))
    }
}
