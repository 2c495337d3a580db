use crate::band::contract::{BandInfo, BlockIo};
use crate::cache::block_cache::{BlockCache, TileGrid, Tile};
use crate::cache::window_io::{self, BlockAccess};
use crate::dataset::handle::{Dataset, DatasetHandle, check_band_index};
use crate::foundation::buffer::{RasterBufMut, try_alloc};
use crate::foundation::core::{BlockSize, RasterSize, Window};
use crate::foundation::data_type::{DataType, copy_words};
use crate::foundation::error::{RasterError, RasterResult};
use crate::dataset::registry::DatasetRegistry;
use crate::warp::desc::WarpedDatasetDesc;
use crate::warp::warper::{AffineTransformer, TransformWarper, Warper};

/// Configuration of a warped dataset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct WarpOptions {
    pub block_width: u32,
    pub block_height: u32,
    /// Element type the warper works in. Defaults to the widest source band type.
    pub working_type: Option<DataType>,
}

impl Default for WarpOptions {
    fn default() -> Self {
        Self {
            block_width: 512,
            block_height: 128,
            working_type: None,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WarpStats {
    /// Successful `warp_region` calls.
    pub blocks_warped: u64,
    pub warp_failures: u64,
}

/// Everything block processing needs besides the band caches.
struct WarpEngine {
    source: DatasetHandle,
    warper: Box<dyn Warper>,
    grid: TileGrid,
    working_type: DataType,
    band_count: usize,
    stats: WarpStats,
}

impl WarpEngine {
    /// Run the warper over tile `(x, y)` and return the band-sequential result.
    fn warp_block(&mut self, x: u32, y: u32) -> RasterResult<Vec<u8>> {
        self.grid.check(x, y)?;
        let block = self.grid.block();
        let region = Window::new(
            i64::from(x) * i64::from(block.width()),
            i64::from(y) * i64::from(block.height()),
            i64::from(block.width()),
            i64::from(block.height()),
        );
        let len = block
            .pixel_count()
            .saturating_mul(self.band_count)
            .saturating_mul(self.working_type.size_bytes());
        let mut scratch = try_alloc::<u8>(len, "warp block")?;

        let mut source = self.source.lock();
        let result = self.warper.warp_region(
            &mut **source,
            region,
            &mut scratch,
            self.band_count,
            self.working_type,
        );
        drop(source);

        match result {
            Ok(()) => {
                self.stats.blocks_warped = self.stats.blocks_warped.saturating_add(1);
                tracing::trace!(x, y, "block warped");
                Ok(scratch)
            }
            Err(err) => {
                self.stats.warp_failures = self.stats.warp_failures.saturating_add(1);
                tracing::debug!(x, y, error = %err, "warp failed");
                Err(err)
            }
        }
    }

    fn plane<'a>(&self, scratch: &'a [u8], band: usize) -> &'a [u8] {
        let plane_bytes = self.grid.block().pixel_count() * self.working_type.size_bytes();
        &scratch[band * plane_bytes..(band + 1) * plane_bytes]
    }

    /// Band `band`'s slice of `scratch` converted into `out` (one tile of `data_type`).
    fn copy_plane(&self, scratch: &[u8], band: usize, data_type: DataType, out: &mut [u8]) {
        copy_words(
            self.plane(scratch, band),
            self.working_type,
            out,
            data_type,
            self.grid.block().pixel_count(),
        );
    }

    fn plane_tile(&self, scratch: &[u8], band: usize, data_type: DataType) -> RasterResult<Vec<u8>> {
        let len = self.grid.block().pixel_count() * data_type.size_bytes();
        let mut tile = try_alloc::<u8>(len, "tile buffer")?;
        self.copy_plane(scratch, band, data_type, &mut tile);
        Ok(tile)
    }
}

struct WarpedBand {
    info: BandInfo,
    cache: BlockCache,
}

/// Cache-miss path of one warped band: warps the whole block and hands every sibling band its
/// tile along the way.
struct WarpFill<'a> {
    engine: &'a mut WarpEngine,
    band: usize,
    data_type: DataType,
    before: &'a mut [WarpedBand],
    after: &'a mut [WarpedBand],
}

impl BlockIo for WarpFill<'_> {
    fn fill_block(&mut self, x: u32, y: u32, buf: &mut [u8]) -> RasterResult<()> {
        let scratch = self.engine.warp_block(x, y)?;
        let after_start = self.band + 1;
        let siblings = self
            .before
            .iter_mut()
            .enumerate()
            .chain(self.after.iter_mut().enumerate().map(|(i, b)| (after_start + i, b)));
        for (index, sibling) in siblings {
            let tile = self.engine.plane_tile(&scratch, index, sibling.info.data_type)?;
            sibling.cache.store(x, y, tile)?;
        }
        self.engine.copy_plane(&scratch, self.band, self.data_type, buf);
        Ok(())
    }
}

/// Read-only dataset whose pixels are produced block by block by a [`Warper`].
///
/// Each output band mirrors a source band (type and nodata) and has its own tile cache. Any
/// cache miss warps the whole block for all bands at once; [`WarpedDataset::process_block`]
/// does the same on demand and always re-runs the warper.
pub struct WarpedDataset {
    size: RasterSize,
    options: WarpOptions,
    engine: WarpEngine,
    bands: Vec<WarpedBand>,
}

impl WarpedDataset {
    pub fn new(
        source: DatasetHandle,
        size: RasterSize,
        warper: impl Warper + 'static,
        options: WarpOptions,
    ) -> RasterResult<Self> {
        Self::from_boxed(source, size, Box::new(warper), options)
    }

    pub fn from_boxed(
        source: DatasetHandle,
        size: RasterSize,
        warper: Box<dyn Warper>,
        options: WarpOptions,
    ) -> RasterResult<Self> {
        if size.width == 0 || size.height == 0 {
            return Err(RasterError::config("warped dataset must be at least 1x1"));
        }
        let block = BlockSize::new(options.block_width, options.block_height)
            .map_err(|e| RasterError::config(e.to_string()))?;

        let band_count = source.band_count();
        if band_count == 0 {
            return Err(RasterError::config(format!(
                "source dataset '{}' has no bands to warp",
                source.name()
            )));
        }
        let mut bands = Vec::with_capacity(band_count);
        for band in 0..band_count {
            let src = source.band_info(band)?;
            let info = BandInfo::new(size, block, src.data_type)
                .with_nodata(src.nodata)
                .with_color_interp(src.color_interp);
            bands.push(WarpedBand {
                cache: BlockCache::for_band(&info),
                info,
            });
        }
        let working_type = options.working_type.unwrap_or_else(|| {
            bands
                .iter()
                .map(|b: &WarpedBand| b.info.data_type)
                .reduce(DataType::union)
                .unwrap_or(DataType::Float64)
        });

        tracing::debug!(
            source = source.name(),
            width = size.width,
            height = size.height,
            bands = band_count,
            ?working_type,
            "warped dataset created"
        );
        Ok(Self {
            size,
            options,
            engine: WarpEngine {
                source,
                warper,
                grid: TileGrid::new(size, block),
                working_type,
                band_count,
                stats: WarpStats::default(),
            },
            bands,
        })
    }

    /// Build a nearest-neighbour affine warp from a description.
    pub fn from_desc(desc: &WarpedDatasetDesc, registry: &DatasetRegistry) -> RasterResult<Self> {
        desc.validate()?;
        let source = registry.resolve(&desc.source)?;
        let warper = TransformWarper::new(AffineTransformer::new(desc.dst_to_src));
        Self::new(
            source,
            RasterSize::new(desc.width, desc.height),
            warper,
            desc.options,
        )
    }

    /// Describe this dataset. Fails when the warper has no affine description.
    pub fn to_desc(&self) -> RasterResult<WarpedDatasetDesc> {
        let Some(dst_to_src) = self.engine.warper.as_affine() else {
            return Err(RasterError::config(format!(
                "warp of '{}' is not an affine mapping and cannot be described",
                self.engine.source.name()
            )));
        };
        Ok(WarpedDatasetDesc {
            source: self.engine.source.name().to_owned(),
            width: self.size.width,
            height: self.size.height,
            options: self.options,
            dst_to_src,
        })
    }

    pub fn options(&self) -> WarpOptions {
        self.options
    }

    pub fn block_size(&self) -> BlockSize {
        self.engine.grid.block()
    }

    pub fn working_type(&self) -> DataType {
        self.engine.working_type
    }

    pub fn source(&self) -> &DatasetHandle {
        &self.engine.source
    }

    pub fn stats(&self) -> WarpStats {
        self.engine.stats.clone()
    }

    pub fn band_cache(&self, band: usize) -> Option<&BlockCache> {
        self.bands.get(band).map(|b| &b.cache)
    }

    /// Warp tile `(x, y)` and store the result as every band's resident tile.
    ///
    /// Resident tiles are overwritten in place. On failure no band is modified.
    #[tracing::instrument(skip(self))]
    pub fn process_block(&mut self, x: u32, y: u32) -> RasterResult<()> {
        let scratch = self.engine.warp_block(x, y)?;
        let mut tiles = Vec::with_capacity(self.bands.len());
        for (index, band) in self.bands.iter().enumerate() {
            tiles.push(self.engine.plane_tile(&scratch, index, band.info.data_type)?);
        }
        for (band, tile) in self.bands.iter_mut().zip(tiles) {
            band.cache.store(x, y, tile)?;
        }
        Ok(())
    }

    /// Copy tile `(x, y)` of `band` into `out`, warping it first on a miss.
    pub fn read_block(&mut self, band: usize, x: u32, y: u32, out: &mut [u8]) -> RasterResult<()> {
        check_band_index(band, self.bands.len())?;
        let expected = self.bands[band].cache.tile_bytes();
        if out.len() != expected {
            return Err(RasterError::validation(format!(
                "block buffer must be {expected} bytes, got {}",
                out.len()
            )));
        }
        let tile = self.block(band, x, y)?;
        tile.add_lock();
        out.copy_from_slice(tile.data());
        tile.drop_lock();
        Ok(())
    }

    fn block(&mut self, band: usize, x: u32, y: u32) -> RasterResult<&mut Tile> {
        check_band_index(band, self.bands.len())?;
        let (before, rest) = self.bands.split_at_mut(band);
        let Some((target, after)) = rest.split_first_mut() else {
            return Err(RasterError::range(format!("band {band} out of range")));
        };
        let mut fill = WarpFill {
            engine: &mut self.engine,
            band,
            data_type: target.info.data_type,
            before,
            after,
        };
        target.cache.acquire(x, y, &mut fill)
    }

    /// Release every cached tile. Warped tiles are never dirty, so nothing is written.
    pub fn flush(&mut self) -> RasterResult<()> {
        for index in 0..self.bands.len() {
            let (before, rest) = self.bands.split_at_mut(index);
            let Some((target, after)) = rest.split_first_mut() else {
                continue;
            };
            let mut io = WarpFill {
                engine: &mut self.engine,
                band: index,
                data_type: target.info.data_type,
                before,
                after,
            };
            target.cache.flush(&mut io)?;
        }
        Ok(())
    }
}

struct WarpedBandAccess<'a> {
    dataset: &'a mut WarpedDataset,
    band: usize,
}

impl BlockAccess for WarpedBandAccess<'_> {
    fn band_info(&self) -> BandInfo {
        self.dataset.bands[self.band].info
    }

    fn block_data(&mut self, x: u32, y: u32) -> RasterResult<&[u8]> {
        Ok(self.dataset.block(self.band, x, y)?.data())
    }
}

impl Dataset for WarpedDataset {
    fn size(&self) -> RasterSize {
        self.size
    }

    fn band_count(&self) -> usize {
        self.bands.len()
    }

    fn band_info(&self, band: usize) -> RasterResult<BandInfo> {
        check_band_index(band, self.bands.len())?;
        Ok(self.bands[band].info)
    }

    fn read_window(
        &mut self,
        band: usize,
        window: Window,
        buf: &mut RasterBufMut<'_>,
    ) -> RasterResult<()> {
        check_band_index(band, self.bands.len())?;
        let mut access = WarpedBandAccess {
            dataset: self,
            band,
        };
        window_io::read_window(&mut access, window, buf)
    }

    fn flush(&mut self) -> RasterResult<()> {
        WarpedDataset::flush(self)
    }
}

impl Drop for WarpedDataset {
    fn drop(&mut self) {
        if let Err(err) = self.flush() {
            tracing::warn!(error = %err, "flush of warped dataset failed on drop");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/warp/dataset.rs"]
mod tests;
