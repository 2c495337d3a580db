use crate::band::contract::{BandInfo, BlockIo, ColorInterp, RasterBand};
use crate::cache::block_cache::TileGrid;
use crate::foundation::buffer::RasterBufMut;
use crate::foundation::core::{BlockSize, RasterSize, Window};
use crate::foundation::data_type::DataType;
use crate::foundation::error::{RasterError, RasterResult};
use crate::vrt::source::{Source, SourceSpec};

/// One colour table entry. For RGB tables the fields are red, green, blue and alpha.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ColorEntry {
    pub c1: i16,
    pub c2: i16,
    pub c3: i16,
    #[serde(default = "opaque")]
    pub c4: i16,
}

fn opaque() -> i16 {
    255
}

impl ColorEntry {
    pub fn rgb(r: i16, g: i16, b: i16) -> Self {
        Self {
            c1: r,
            c2: g,
            c3: b,
            c4: opaque(),
        }
    }
}

/// A band with no storage of its own, composited on demand from ordered sources.
///
/// Later sources paint over earlier ones. Virtual bands are read-only.
#[derive(Debug)]
pub struct VirtualBand {
    info: BandInfo,
    color_table: Option<Vec<ColorEntry>>,
    sources: Vec<Source>,
}

/// Collects the band's configuration; sources are resolved and frozen by [`build`].
///
/// [`build`]: VirtualBandBuilder::build
#[derive(Debug)]
pub struct VirtualBandBuilder {
    size: RasterSize,
    data_type: DataType,
    nodata: Option<f64>,
    block: Option<BlockSize>,
    color_interp: ColorInterp,
    color_table: Option<Vec<ColorEntry>>,
    sources: Vec<SourceSpec>,
}

impl VirtualBandBuilder {
    pub fn nodata(mut self, nodata: f64) -> Self {
        self.nodata = Some(nodata);
        self
    }

    pub fn block_size(mut self, block: BlockSize) -> Self {
        self.block = Some(block);
        self
    }

    pub fn color_interp(mut self, color_interp: ColorInterp) -> Self {
        self.color_interp = color_interp;
        self
    }

    /// Attach a colour table; the band is then interpreted as palette indices.
    pub fn color_table(mut self, entries: Vec<ColorEntry>) -> Self {
        self.color_table = Some(entries);
        self.color_interp = ColorInterp::Palette;
        self
    }

    /// Append a source; insertion order is paint order.
    pub fn source(mut self, spec: SourceSpec) -> Self {
        self.sources.push(spec);
        self
    }

    pub fn build(self) -> RasterResult<VirtualBand> {
        if self.size.width == 0 || self.size.height == 0 {
            return Err(RasterError::config("virtual band must be at least 1x1"));
        }
        let block = self
            .block
            .unwrap_or_else(|| BlockSize::default_for(self.size));
        let sources = self
            .sources
            .into_iter()
            .map(|spec| Source::attach(spec, self.size))
            .collect::<RasterResult<Vec<_>>>()?;
        Ok(VirtualBand {
            info: BandInfo::new(self.size, block, self.data_type)
                .with_nodata(self.nodata)
                .with_color_interp(self.color_interp),
            color_table: self.color_table,
            sources,
        })
    }
}

impl VirtualBand {
    pub fn builder(size: RasterSize, data_type: DataType) -> VirtualBandBuilder {
        VirtualBandBuilder {
            size,
            data_type,
            nodata: None,
            block: None,
            color_interp: ColorInterp::Undefined,
            color_table: None,
            sources: Vec::new(),
        }
    }

    pub fn info(&self) -> BandInfo {
        self.info
    }

    pub fn color_table(&self) -> Option<&[ColorEntry]> {
        self.color_table.as_deref()
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// Composite `window` of this band into `buf`.
    ///
    /// The buffer is first set to the band's nodata (zero if unset), then every source renders
    /// its overlap in order. The first failing source aborts the read.
    #[tracing::instrument(skip(self, buf), fields(sources = self.sources.len()))]
    pub fn composite_read(&self, window: Window, buf: &mut RasterBufMut<'_>) -> RasterResult<()> {
        self.info.size.check_window(window)?;
        if window.is_empty() || buf.width() == 0 || buf.height() == 0 {
            return Ok(());
        }

        buf.fill(self.info.nodata.unwrap_or(0.0));
        for source in &self.sources {
            source.render(window, buf)?;
        }
        Ok(())
    }
}

impl BlockIo for VirtualBand {
    fn fill_block(&mut self, x: u32, y: u32, buf: &mut [u8]) -> RasterResult<()> {
        let grid = TileGrid::new(self.info.size, self.info.block);
        grid.check(x, y)?;
        let window = grid.tile_window(x, y);
        let stride = self.info.block.width() as usize * self.info.data_type.size_bytes();
        let mut view = RasterBufMut::with_stride(
            buf,
            window.x_size as usize,
            window.y_size as usize,
            stride,
            self.info.data_type,
        )?;
        self.composite_read(window, &mut view)
    }
}

impl RasterBand for VirtualBand {
    fn info(&self) -> BandInfo {
        self.info
    }
}

#[cfg(test)]
#[path = "../../tests/unit/vrt/band.rs"]
mod tests;
