use crate::band::cached::{CachedBand, DynBand};
use crate::band::contract::{BandInfo, RasterBand};
use crate::dataset::handle::{Dataset, check_band_index};
use crate::foundation::buffer::{RasterBuf, RasterBufMut};
use crate::foundation::core::{RasterSize, Window};
use crate::foundation::error::{RasterError, RasterResult};

/// Dataset made of concrete bands, each behind its own block cache.
pub struct BlockDataset {
    size: RasterSize,
    bands: Vec<CachedBand>,
}

impl BlockDataset {
    pub fn new(bands: Vec<DynBand>) -> RasterResult<Self> {
        let Some(first) = bands.first() else {
            return Err(RasterError::config("dataset needs at least one band"));
        };
        let size = first.info().size;
        if let Some(i) = bands.iter().position(|b| b.info().size != size) {
            return Err(RasterError::config(format!(
                "band {i} is {:?}, expected {size:?}",
                bands[i].info().size
            )));
        }
        Ok(Self {
            size,
            bands: bands.into_iter().map(CachedBand::new).collect(),
        })
    }

    pub fn single(band: impl RasterBand + Send + 'static) -> RasterResult<Self> {
        let band: DynBand = Box::new(band);
        Self::new(vec![band])
    }

    pub fn band(&self, band: usize) -> Option<&CachedBand> {
        self.bands.get(band)
    }

    pub fn band_mut(&mut self, band: usize) -> RasterResult<&mut CachedBand> {
        check_band_index(band, self.bands.len())?;
        Ok(&mut self.bands[band])
    }
}

impl Dataset for BlockDataset {
    fn size(&self) -> RasterSize {
        self.size
    }

    fn band_count(&self) -> usize {
        self.bands.len()
    }

    fn band_info(&self, band: usize) -> RasterResult<BandInfo> {
        check_band_index(band, self.bands.len())?;
        Ok(self.bands[band].info())
    }

    fn read_window(
        &mut self,
        band: usize,
        window: Window,
        buf: &mut RasterBufMut<'_>,
    ) -> RasterResult<()> {
        self.band_mut(band)?.read_window(window, buf)
    }

    fn write_window(&mut self, band: usize, window: Window, buf: &RasterBuf<'_>) -> RasterResult<()> {
        self.band_mut(band)?.write_window(window, buf)
    }

    fn flush(&mut self) -> RasterResult<()> {
        let mut first_err = None;
        for band in &mut self.bands {
            if let Err(err) = band.flush() {
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}
