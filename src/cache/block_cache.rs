use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::band::contract::{BandInfo, BlockIo};
use crate::foundation::buffer::try_alloc;
use crate::foundation::core::{BlockSize, RasterSize, Window};
use crate::foundation::data_type::DataType;
use crate::foundation::error::{RasterError, RasterResult};

/// A resident tile: one full block of pixels plus its write-back state.
#[derive(Debug)]
pub struct Tile {
    x: u32,
    y: u32,
    data: Vec<u8>,
    dirty: bool,
    locks: u32,
}

impl Tile {
    fn new(x: u32, y: u32, data: Vec<u8>) -> Self {
        Self {
            x,
            y,
            data,
            dirty: false,
            locks: 0,
        }
    }

    pub fn coords(&self) -> (u32, u32) {
        (self.x, self.y)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable contents. Callers that modify them must also [`Tile::mark_dirty`].
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Pin the tile so a flush keeps it resident.
    pub fn add_lock(&mut self) {
        self.locks = self.locks.saturating_add(1);
    }

    pub fn drop_lock(&mut self) {
        self.locks = self.locks.saturating_sub(1);
    }

    pub fn lock_count(&self) -> u32 {
        self.locks
    }
}

/// Tile layout of one band: `ceil(size / block)` tiles per axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileGrid {
    raster: RasterSize,
    block: BlockSize,
    blocks_per_row: u32,
    blocks_per_column: u32,
}

impl TileGrid {
    pub fn new(raster: RasterSize, block: BlockSize) -> Self {
        Self {
            raster,
            block,
            blocks_per_row: raster.width.div_ceil(block.width()),
            blocks_per_column: raster.height.div_ceil(block.height()),
        }
    }

    pub fn raster(&self) -> RasterSize {
        self.raster
    }

    pub fn block(&self) -> BlockSize {
        self.block
    }

    pub fn blocks_per_row(&self) -> u32 {
        self.blocks_per_row
    }

    pub fn blocks_per_column(&self) -> u32 {
        self.blocks_per_column
    }

    pub fn check(&self, x: u32, y: u32) -> RasterResult<()> {
        if x >= self.blocks_per_row || y >= self.blocks_per_column {
            return Err(RasterError::range(format!(
                "tile ({x}, {y}) outside {}x{} grid",
                self.blocks_per_row, self.blocks_per_column
            )));
        }
        Ok(())
    }

    /// Raster pixels covered by tile `(x, y)`, clipped at the right and bottom edges.
    pub fn tile_window(&self, x: u32, y: u32) -> Window {
        let x_off = u64::from(x) * u64::from(self.block.width());
        let y_off = u64::from(y) * u64::from(self.block.height());
        let x_size = u64::from(self.block.width()).min(u64::from(self.raster.width).saturating_sub(x_off));
        let y_size =
            u64::from(self.block.height()).min(u64::from(self.raster.height).saturating_sub(y_off));
        Window::new(x_off as i64, y_off as i64, x_size as i64, y_size as i64)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// `fill_block` invocations.
    pub fills: u64,
    /// `drain_block` invocations.
    pub drains: u64,
    /// Tiles materialized directly through [`BlockCache::store`].
    pub stores: u64,
    pub resident_tiles: usize,
    pub resident_bytes: usize,
}

/// Sparse, unbounded write-back cache of one band's tiles.
///
/// Tiles appear on the first [`BlockCache::acquire`] of their coordinate and leave only through
/// [`BlockCache::flush`] / [`BlockCache::flush_tile`] or when the cache is dropped. There is no
/// eviction.
#[derive(Debug)]
pub struct BlockCache {
    grid: TileGrid,
    data_type: DataType,
    tile_bytes: usize,
    tiles: HashMap<(u32, u32), Tile>,
    stats: CacheStats,
}

impl BlockCache {
    pub fn new(grid: TileGrid, data_type: DataType) -> Self {
        Self {
            grid,
            data_type,
            tile_bytes: grid.block().pixel_count().saturating_mul(data_type.size_bytes()),
            tiles: HashMap::new(),
            stats: CacheStats::default(),
        }
    }

    pub fn for_band(info: &BandInfo) -> Self {
        Self::new(TileGrid::new(info.size, info.block), info.data_type)
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn tile_bytes(&self) -> usize {
        self.tile_bytes
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }

    pub fn resident_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_resident(&self, x: u32, y: u32) -> bool {
        self.tiles.contains_key(&(x, y))
    }

    pub fn get(&self, x: u32, y: u32) -> Option<&Tile> {
        self.tiles.get(&(x, y))
    }

    pub fn get_mut(&mut self, x: u32, y: u32) -> Option<&mut Tile> {
        self.tiles.get_mut(&(x, y))
    }

    /// Return tile `(x, y)`, filling it through `io` on a miss.
    ///
    /// A resident tile is returned as-is; `fill_block` is never called twice for the same
    /// coordinate while it stays resident. A failed fill leaves nothing behind.
    pub fn acquire<I: BlockIo + ?Sized>(
        &mut self,
        x: u32,
        y: u32,
        io: &mut I,
    ) -> RasterResult<&mut Tile> {
        self.grid.check(x, y)?;
        match self.tiles.entry((x, y)) {
            Entry::Occupied(e) => Ok(e.into_mut()),
            Entry::Vacant(e) => {
                let mut data = try_alloc::<u8>(self.tile_bytes, "tile buffer")?;
                tracing::trace!(x, y, "block cache miss");
                self.stats.fills = self.stats.fills.saturating_add(1);
                io.fill_block(x, y, &mut data)?;
                self.stats.resident_tiles = self.stats.resident_tiles.saturating_add(1);
                self.stats.resident_bytes = self.stats.resident_bytes.saturating_add(data.len());
                Ok(e.insert(Tile::new(x, y, data)))
            }
        }
    }

    /// Materialize tile `(x, y)` from `data` without calling `fill_block`.
    ///
    /// A resident tile keeps its dirty flag and lock count; only its contents are replaced.
    pub fn store(&mut self, x: u32, y: u32, data: Vec<u8>) -> RasterResult<&mut Tile> {
        self.grid.check(x, y)?;
        if data.len() != self.tile_bytes {
            return Err(RasterError::validation(format!(
                "tile ({x}, {y}) needs {} bytes, got {}",
                self.tile_bytes,
                data.len()
            )));
        }
        self.stats.stores = self.stats.stores.saturating_add(1);
        match self.tiles.entry((x, y)) {
            Entry::Occupied(e) => {
                let tile = e.into_mut();
                tile.data = data;
                Ok(tile)
            }
            Entry::Vacant(e) => {
                self.stats.resident_tiles = self.stats.resident_tiles.saturating_add(1);
                self.stats.resident_bytes = self.stats.resident_bytes.saturating_add(data.len());
                Ok(e.insert(Tile::new(x, y, data)))
            }
        }
    }

    pub fn mark_dirty(&mut self, x: u32, y: u32) -> RasterResult<()> {
        self.grid.check(x, y)?;
        let tile = self
            .tiles
            .get_mut(&(x, y))
            .ok_or_else(|| RasterError::validation(format!("tile ({x}, {y}) is not resident")))?;
        tile.mark_dirty();
        Ok(())
    }

    /// Write back (if dirty) and release tile `(x, y)`. Absent tiles are a no-op.
    ///
    /// A pinned tile is written back but stays resident. When `drain_block` fails the tile
    /// stays resident and dirty so the flush can be retried.
    pub fn flush_tile<I: BlockIo + ?Sized>(&mut self, x: u32, y: u32, io: &mut I) -> RasterResult<()> {
        let Some(tile) = self.tiles.get_mut(&(x, y)) else {
            return Ok(());
        };
        if tile.dirty {
            self.stats.drains = self.stats.drains.saturating_add(1);
            io.drain_block(x, y, &tile.data)?;
            tile.dirty = false;
        }
        if tile.locks > 0 {
            tracing::trace!(x, y, locks = tile.locks, "pinned tile kept across flush");
            return Ok(());
        }
        if let Some(tile) = self.tiles.remove(&(x, y)) {
            self.stats.resident_tiles = self.stats.resident_tiles.saturating_sub(1);
            self.stats.resident_bytes = self.stats.resident_bytes.saturating_sub(tile.data.len());
        }
        Ok(())
    }

    /// Flush every resident tile in row-major order, stopping at the first drain failure.
    pub fn flush<I: BlockIo + ?Sized>(&mut self, io: &mut I) -> RasterResult<()> {
        let mut coords: Vec<(u32, u32)> = self.tiles.keys().copied().collect();
        coords.sort_unstable_by_key(|&(x, y)| (y, x));
        tracing::debug!(tiles = coords.len(), "flushing block cache");
        for (x, y) in coords {
            self.flush_tile(x, y, io)?;
        }
        Ok(())
    }

    pub(crate) fn has_dirty_tiles(&self) -> bool {
        self.tiles.values().any(|t| t.dirty)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cache/block_cache.rs"]
mod tests;
