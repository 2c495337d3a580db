use crate::band::contract::{Access, BandInfo, BlockIo, ColorInterp, RasterBand};
use crate::cache::block_cache::TileGrid;
use crate::foundation::buffer::try_alloc;
use crate::foundation::core::{BlockSize, RasterSize};
use crate::foundation::data_type::{DataType, fill_words};
use crate::foundation::error::{RasterError, RasterResult};

/// Band backed by one contiguous in-memory raster (row-major, native byte order).
///
/// Edge tiles are zero padded on fill; only the in-raster part is written back on drain.
#[derive(Debug, Clone)]
pub struct MemBand {
    info: BandInfo,
    grid: TileGrid,
    data: Vec<u8>,
}

impl MemBand {
    pub fn new(size: RasterSize, block: BlockSize, data_type: DataType) -> RasterResult<Self> {
        let len = size.pixel_count().saturating_mul(data_type.size_bytes());
        let data = try_alloc::<u8>(len, "memory band")?;
        Self::from_vec(size, block, data_type, data)
    }

    pub fn from_vec(
        size: RasterSize,
        block: BlockSize,
        data_type: DataType,
        data: Vec<u8>,
    ) -> RasterResult<Self> {
        let expected = size.pixel_count().saturating_mul(data_type.size_bytes());
        if data.len() != expected {
            return Err(RasterError::validation(format!(
                "memory band {}x{} {data_type:?} needs {expected} bytes, got {}",
                size.width,
                size.height,
                data.len()
            )));
        }
        Ok(Self {
            info: BandInfo::new(size, block, data_type).with_access(Access::Update),
            grid: TileGrid::new(size, block),
            data,
        })
    }

    /// Band with every pixel set to `value`.
    pub fn filled(
        size: RasterSize,
        block: BlockSize,
        data_type: DataType,
        value: f64,
    ) -> RasterResult<Self> {
        let mut band = Self::new(size, block, data_type)?;
        fill_words(&mut band.data, data_type, value);
        Ok(band)
    }

    pub fn with_nodata(mut self, nodata: Option<f64>) -> Self {
        self.info.nodata = nodata;
        self
    }

    pub fn with_color_interp(mut self, color_interp: ColorInterp) -> Self {
        self.info.color_interp = color_interp;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.info.access = Access::ReadOnly;
        self
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Pixel `(x, y)` as `f64`, `None` outside the raster.
    pub fn pixel(&self, x: u32, y: u32) -> Option<f64> {
        let at = self.offset(x, y)?;
        Some(self.info.data_type.read_f64(&self.data[at..]))
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, value: f64) -> RasterResult<()> {
        let Some(at) = self.offset(x, y) else {
            return Err(RasterError::range(format!(
                "pixel ({x}, {y}) outside {}x{} band",
                self.info.size.width, self.info.size.height
            )));
        };
        self.info.data_type.write_f64(value, &mut self.data[at..]);
        Ok(())
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        let size = self.info.size;
        (x < size.width && y < size.height).then(|| {
            (y as usize * size.width as usize + x as usize) * self.info.data_type.size_bytes()
        })
    }

    /// Byte ranges `(raster_offset, tile_offset, len)` of each in-raster row of tile `(x, y)`.
    fn tile_rows(&self, x: u32, y: u32) -> RasterResult<Vec<(usize, usize, usize)>> {
        self.grid.check(x, y)?;
        let win = self.grid.tile_window(x, y);
        let elem = self.info.data_type.size_bytes();
        let raster_stride = self.info.size.width as usize * elem;
        let tile_stride = self.info.block.width() as usize * elem;
        Ok((0..win.y_size as usize)
            .map(|r| {
                let raster_at = (win.y_off as usize + r) * raster_stride + win.x_off as usize * elem;
                (raster_at, r * tile_stride, win.x_size as usize * elem)
            })
            .collect())
    }
}

impl BlockIo for MemBand {
    fn fill_block(&mut self, x: u32, y: u32, buf: &mut [u8]) -> RasterResult<()> {
        buf.fill(0);
        for (raster_at, tile_at, len) in self.tile_rows(x, y)? {
            buf[tile_at..tile_at + len].copy_from_slice(&self.data[raster_at..raster_at + len]);
        }
        Ok(())
    }

    fn drain_block(&mut self, x: u32, y: u32, buf: &[u8]) -> RasterResult<()> {
        if !self.info.is_writable() {
            return Err(RasterError::access(format!(
                "memory band is read-only, cannot write tile ({x}, {y})"
            )));
        }
        for (raster_at, tile_at, len) in self.tile_rows(x, y)? {
            self.data[raster_at..raster_at + len].copy_from_slice(&buf[tile_at..tile_at + len]);
        }
        Ok(())
    }
}

impl RasterBand for MemBand {
    fn info(&self) -> BandInfo {
        self.info
    }
}

#[cfg(test)]
#[path = "../../tests/unit/band/mem.rs"]
mod tests;
