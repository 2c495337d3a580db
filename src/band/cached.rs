use crate::band::contract::{BandInfo, RasterBand};
use crate::cache::block_cache::{BlockCache, CacheStats, Tile};
use crate::cache::window_io::{self, BlockAccess, BlockAccessMut};
use crate::foundation::buffer::{RasterBuf, RasterBufMut, try_alloc};
use crate::foundation::core::Window;
use crate::foundation::error::{RasterError, RasterResult};

/// Type-erased band as stored by datasets.
pub type DynBand = Box<dyn RasterBand + Send>;

/// A band together with its tile cache.
///
/// All pixel access goes through the cache; writes are held as dirty tiles until
/// [`CachedBand::flush`] (or drop) drains them back into the band.
pub struct CachedBand<B: RasterBand = DynBand> {
    band: B,
    info: BandInfo,
    cache: BlockCache,
}

impl<B: RasterBand> CachedBand<B> {
    pub fn new(band: B) -> Self {
        let info = band.info();
        Self {
            cache: BlockCache::for_band(&info),
            info,
            band,
        }
    }

    pub fn info(&self) -> BandInfo {
        self.info
    }

    pub fn inner(&self) -> &B {
        &self.band
    }

    pub fn cache(&self) -> &BlockCache {
        &self.cache
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Resident tile `(x, y)`, filled from the band on first use.
    pub fn block(&mut self, x: u32, y: u32) -> RasterResult<&mut Tile> {
        self.cache.acquire(x, y, &mut self.band)
    }

    pub fn read_block(&mut self, x: u32, y: u32, out: &mut [u8]) -> RasterResult<()> {
        let expected = self.cache.tile_bytes();
        if out.len() != expected {
            return Err(RasterError::validation(format!(
                "block buffer must be {expected} bytes, got {}",
                out.len()
            )));
        }
        out.copy_from_slice(self.block(x, y)?.data());
        Ok(())
    }

    /// Replace tile `(x, y)` wholesale. The band is not read.
    pub fn write_block(&mut self, x: u32, y: u32, data: &[u8]) -> RasterResult<()> {
        self.ensure_writable()?;
        let mut owned = try_alloc::<u8>(data.len(), "tile buffer")?;
        owned.copy_from_slice(data);
        self.cache.store(x, y, owned)?.mark_dirty();
        Ok(())
    }

    pub fn read_window(&mut self, window: Window, buf: &mut RasterBufMut<'_>) -> RasterResult<()> {
        window_io::read_window(self, window, buf)
    }

    pub fn write_window(&mut self, window: Window, buf: &RasterBuf<'_>) -> RasterResult<()> {
        self.ensure_writable()?;
        window_io::write_window(self, window, buf)
    }

    /// Keep tile `(x, y)` resident across flushes until [`CachedBand::unpin_block`].
    pub fn pin_block(&mut self, x: u32, y: u32) -> RasterResult<()> {
        self.block(x, y)?.add_lock();
        Ok(())
    }

    pub fn unpin_block(&mut self, x: u32, y: u32) {
        if let Some(tile) = self.cache.get_mut(x, y) {
            tile.drop_lock();
        }
    }

    #[tracing::instrument(skip(self), fields(resident = self.cache.resident_count()))]
    pub fn flush(&mut self) -> RasterResult<()> {
        self.cache.flush(&mut self.band)
    }

    pub fn flush_block(&mut self, x: u32, y: u32) -> RasterResult<()> {
        self.cache.flush_tile(x, y, &mut self.band)
    }

    fn ensure_writable(&self) -> RasterResult<()> {
        if !self.info.is_writable() {
            return Err(RasterError::access("band is read-only"));
        }
        Ok(())
    }
}

impl<B: RasterBand> BlockAccess for CachedBand<B> {
    fn band_info(&self) -> BandInfo {
        self.info
    }

    fn block_data(&mut self, x: u32, y: u32) -> RasterResult<&[u8]> {
        Ok(self.block(x, y)?.data())
    }
}

impl<B: RasterBand> BlockAccessMut for CachedBand<B> {
    fn block_data_mut(&mut self, x: u32, y: u32) -> RasterResult<&mut [u8]> {
        let tile = self.block(x, y)?;
        tile.mark_dirty();
        Ok(tile.data_mut())
    }
}

impl<B: RasterBand> Drop for CachedBand<B> {
    fn drop(&mut self) {
        if !self.cache.has_dirty_tiles() {
            return;
        }
        if let Err(err) = self.flush() {
            tracing::warn!(error = %err, "flush on drop failed, dirty tiles discarded");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/band/cached.rs"]
mod tests;
