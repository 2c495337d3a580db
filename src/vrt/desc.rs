//! Serializable description of a virtual dataset.
//!
//! Sources name their dataset; names are resolved through a [`DatasetRegistry`] when the
//! description is built.

use crate::band::contract::ColorInterp;
use crate::dataset::registry::DatasetRegistry;
use crate::foundation::core::{BlockSize, RasterSize, Window};
use crate::foundation::data_type::DataType;
use crate::foundation::error::{RasterError, RasterResult};
use crate::vrt::band::{ColorEntry, VirtualBand};
use crate::vrt::source::{BandRef, LinearScale, Source, SourceKind, SourceSpec};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VirtualDatasetDesc {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub bands: Vec<VirtualBandDesc>,
}

impl VirtualDatasetDesc {
    pub fn validate(&self) -> RasterResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RasterError::config("virtual dataset must be at least 1x1"));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VirtualBandDesc {
    pub data_type: DataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodata: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<BlockSize>,
    #[serde(default, skip_serializing_if = "ColorInterp::is_undefined")]
    pub color_interp: ColorInterp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_table: Option<Vec<ColorEntry>>,
    #[serde(default)]
    pub sources: Vec<SourceDesc>,
}

impl VirtualBandDesc {
    pub(crate) fn build(&self, size: RasterSize, registry: &DatasetRegistry) -> RasterResult<VirtualBand> {
        let mut builder = VirtualBand::builder(size, self.data_type);
        if let Some(nodata) = self.nodata {
            builder = builder.nodata(nodata);
        }
        if let Some(block) = self.block {
            builder = builder.block_size(block);
        }
        if let Some(table) = &self.color_table {
            builder = builder.color_table(table.clone());
        }
        if !self.color_interp.is_undefined() {
            builder = builder.color_interp(self.color_interp);
        }
        for source in &self.sources {
            builder = builder.source(source.resolve(registry)?);
        }
        builder.build()
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SourceDesc {
    pub kind: SourceKind,
    pub dataset: String,
    #[serde(default)]
    pub band: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src_window: Option<Window>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dst_window: Option<Window>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodata: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_offset: Option<f64>,
}

impl SourceDesc {
    pub fn resolve(&self, registry: &DatasetRegistry) -> RasterResult<SourceSpec> {
        let band = BandRef::new(registry.resolve(&self.dataset)?, self.band)?;
        let scale = match (self.scale_ratio, self.scale_offset) {
            (None, None) => None,
            (ratio, offset) => Some(LinearScale::new(ratio.unwrap_or(1.0), offset.unwrap_or(0.0))),
        };
        Ok(SourceSpec {
            kind: self.kind,
            band,
            src_window: self.src_window,
            dst_window: self.dst_window,
            nodata: self.nodata,
            scale,
        })
    }

    pub(crate) fn from_source(source: &Source) -> Self {
        let windows = source.windows();
        let scale = source.scale();
        Self {
            kind: source.kind(),
            dataset: source.band().dataset().name().to_owned(),
            band: source.band().band(),
            src_window: Some(windows.src),
            dst_window: Some(windows.dst),
            nodata: source.nodata(),
            scale_ratio: scale.map(|s| s.ratio),
            scale_offset: scale.map(|s| s.offset),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/vrt/desc.rs"]
mod tests;
