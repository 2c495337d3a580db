use crate::foundation::core::{BlockSize, RasterSize};
use crate::foundation::data_type::DataType;
use crate::foundation::error::{RasterError, RasterResult};

/// Whether a band accepts writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    #[default]
    ReadOnly,
    Update,
}

/// What a band's values stand for when displayed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorInterp {
    #[default]
    Undefined,
    Gray,
    /// Values index a colour table.
    Palette,
    Red,
    Green,
    Blue,
    Alpha,
}

impl ColorInterp {
    pub fn is_undefined(&self) -> bool {
        *self == ColorInterp::Undefined
    }
}

/// Static metadata of a band.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BandInfo {
    pub size: RasterSize,
    pub block: BlockSize,
    pub data_type: DataType,
    pub nodata: Option<f64>,
    pub access: Access,
    pub color_interp: ColorInterp,
}

impl BandInfo {
    pub fn new(size: RasterSize, block: BlockSize, data_type: DataType) -> Self {
        Self {
            size,
            block,
            data_type,
            nodata: None,
            access: Access::ReadOnly,
            color_interp: ColorInterp::Undefined,
        }
    }

    pub fn with_nodata(mut self, nodata: Option<f64>) -> Self {
        self.nodata = nodata;
        self
    }

    pub fn with_access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    pub fn with_color_interp(mut self, color_interp: ColorInterp) -> Self {
        self.color_interp = color_interp;
        self
    }

    /// Bytes held by one full tile.
    pub fn tile_bytes(&self) -> usize {
        self.block
            .pixel_count()
            .saturating_mul(self.data_type.size_bytes())
    }

    pub fn is_writable(&self) -> bool {
        self.access == Access::Update
    }
}

/// Tile transfer between a band's backing store and cache buffers.
///
/// Buffers always span a full tile, edge tiles included; the part outside the raster is
/// unspecified.
pub trait BlockIo {
    /// Populate `buf` with tile `(x, y)`.
    fn fill_block(&mut self, x: u32, y: u32, buf: &mut [u8]) -> RasterResult<()>;

    /// Persist tile `(x, y)`. Read-only bands keep the default.
    fn drain_block(&mut self, x: u32, y: u32, _buf: &[u8]) -> RasterResult<()> {
        Err(RasterError::access(format!(
            "band is read-only, cannot write tile ({x}, {y})"
        )))
    }
}

/// A concrete band: tile transfer plus static metadata.
pub trait RasterBand: BlockIo {
    fn info(&self) -> BandInfo;
}

impl<T: BlockIo + ?Sized> BlockIo for Box<T> {
    fn fill_block(&mut self, x: u32, y: u32, buf: &mut [u8]) -> RasterResult<()> {
        (**self).fill_block(x, y, buf)
    }

    fn drain_block(&mut self, x: u32, y: u32, buf: &[u8]) -> RasterResult<()> {
        (**self).drain_block(x, y, buf)
    }
}

impl<T: RasterBand + ?Sized> RasterBand for Box<T> {
    fn info(&self) -> BandInfo {
        (**self).info()
    }
}
