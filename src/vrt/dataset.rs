use crate::band::contract::BandInfo;
use crate::dataset::handle::{Dataset, check_band_index};
use crate::dataset::registry::DatasetRegistry;
use crate::foundation::buffer::RasterBufMut;
use crate::foundation::core::{RasterSize, Window};
use crate::foundation::error::{RasterError, RasterResult};
use crate::vrt::band::VirtualBand;
use crate::vrt::desc::{SourceDesc, VirtualBandDesc, VirtualDatasetDesc};

/// Dataset whose bands are all virtual.
///
/// Reads are composited on every call; there is no cache of its own. Wrap a [`VirtualBand`] in
/// a `CachedBand` when repeated reads of the same area are expected.
#[derive(Debug)]
pub struct VirtualDataset {
    size: RasterSize,
    bands: Vec<VirtualBand>,
}

impl VirtualDataset {
    pub fn new(size: RasterSize) -> Self {
        Self {
            size,
            bands: Vec::new(),
        }
    }

    pub fn add_band(&mut self, band: VirtualBand) -> RasterResult<()> {
        if band.info().size != self.size {
            return Err(RasterError::config(format!(
                "virtual band is {:?}, dataset is {:?}",
                band.info().size,
                self.size
            )));
        }
        self.bands.push(band);
        Ok(())
    }

    pub fn with_band(mut self, band: VirtualBand) -> RasterResult<Self> {
        self.add_band(band)?;
        Ok(self)
    }

    pub fn band(&self, band: usize) -> Option<&VirtualBand> {
        self.bands.get(band)
    }

    /// Build from a description, resolving dataset names through `registry`.
    pub fn from_desc(desc: &VirtualDatasetDesc, registry: &DatasetRegistry) -> RasterResult<Self> {
        desc.validate()?;
        let size = RasterSize::new(desc.width, desc.height);
        let mut dataset = Self::new(size);
        for band_desc in &desc.bands {
            dataset.add_band(band_desc.build(size, registry)?)?;
        }
        tracing::debug!(
            width = desc.width,
            height = desc.height,
            bands = dataset.bands.len(),
            "virtual dataset built from description"
        );
        Ok(dataset)
    }

    pub fn from_json(json: &str, registry: &DatasetRegistry) -> RasterResult<Self> {
        let desc: VirtualDatasetDesc = serde_json::from_str(json)
            .map_err(|e| RasterError::config(format!("invalid virtual dataset description: {e}")))?;
        Self::from_desc(&desc, registry)
    }

    /// Describe the current configuration, with every source window made explicit.
    pub fn to_desc(&self) -> VirtualDatasetDesc {
        VirtualDatasetDesc {
            width: self.size.width,
            height: self.size.height,
            bands: self
                .bands
                .iter()
                .map(|band| {
                    let info = band.info();
                    VirtualBandDesc {
                        data_type: info.data_type,
                        nodata: info.nodata,
                        block: Some(info.block),
                        color_interp: info.color_interp,
                        color_table: band.color_table().map(<[_]>::to_vec),
                        sources: band.sources().iter().map(SourceDesc::from_source).collect(),
                    }
                })
                .collect(),
        }
    }
}

impl Dataset for VirtualDataset {
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
        check_band_index(band, self.bands.len())?;
        self.bands[band].composite_read(window, buf)
    }

    fn flush(&mut self) -> RasterResult<()> {
        Ok(())
    }
}
