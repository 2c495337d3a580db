//! Serializable description of a warped dataset.
//!
//! Only warps driven by an affine pixel mapping can be described; the source dataset is named
//! and resolved through a [`DatasetRegistry`] on build.

use kurbo::Affine;

use crate::dataset::registry::DatasetRegistry;
use crate::foundation::error::{RasterError, RasterResult};
use crate::warp::dataset::{WarpOptions, WarpedDataset};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WarpedDatasetDesc {
    /// Registry name of the source dataset.
    pub source: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub options: WarpOptions,
    /// Output pixel to source pixel mapping.
    pub dst_to_src: Affine,
}

impl WarpedDatasetDesc {
    pub fn validate(&self) -> RasterResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RasterError::config("warped dataset must be at least 1x1"));
        }
        if !self.dst_to_src.as_coeffs().iter().all(|c| c.is_finite()) {
            return Err(RasterError::config(format!(
                "warp transform {:?} has non-finite coefficients",
                self.dst_to_src
            )));
        }
        Ok(())
    }

    pub fn build(&self, registry: &DatasetRegistry) -> RasterResult<WarpedDataset> {
        WarpedDataset::from_desc(self, registry)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/warp/desc.rs"]
mod tests;
