//! vraster is a raster virtualization layer: tiled block caching, virtual bands composited
//! from other bands, and block-granular warping.
//!
//! # Pipeline overview
//!
//! 1. **Bands**: a concrete band implements [`RasterBand`] (fill/drain one tile) and is wrapped
//!    in a [`CachedBand`], which keeps tiles in a [`BlockCache`] until they are flushed.
//! 2. **Datasets**: bands are grouped into a [`Dataset`] and shared through a
//!    reference-counted [`DatasetHandle`].
//! 3. **Compositing**: a [`VirtualBand`] has no storage; each read pre-fills the caller's
//!    buffer with nodata and lets every [`Source`] (simple, averaged or complex) paint its
//!    overlap in order.
//! 4. **Warping**: a [`WarpedDataset`] produces output tiles by running a [`Warper`] over whole
//!    blocks, populating every band's cache from one warp.
//!
//! Design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Single-threaded operations**: datasets are shareable, but every operation runs on the
//!   caller's thread and blocks.
//! - **Unbounded caches**: tiles stay resident until an explicit flush or drop.
#![forbid(unsafe_code)]

mod band;
mod cache;
mod dataset;
mod foundation;
mod vrt;
mod warp;

pub use band::cached::{CachedBand, DynBand};
pub use band::contract::{Access, BandInfo, BlockIo, ColorInterp, RasterBand};
pub use band::mem::MemBand;
pub use cache::block_cache::{BlockCache, CacheStats, Tile, TileGrid};
pub use dataset::block::BlockDataset;
pub use dataset::handle::{Dataset, DatasetHandle};
pub use dataset::registry::DatasetRegistry;
pub use foundation::buffer::{RasterBuf, RasterBufMut};
pub use foundation::core::{BlockSize, RasterSize, Window};
pub use foundation::data_type::{DataType, convert_element, copy_words, fill_words};
pub use foundation::error::{RasterError, RasterResult};
pub use vrt::band::{ColorEntry, VirtualBand, VirtualBandBuilder};
pub use vrt::dataset::VirtualDataset;
pub use vrt::desc::{SourceDesc, VirtualBandDesc, VirtualDatasetDesc};
pub use vrt::mapping::{SourceWindows, WindowMapping};
pub use vrt::source::{BandRef, LinearScale, Source, SourceKind, SourceSpec};
pub use warp::dataset::{WarpOptions, WarpStats, WarpedDataset};
pub use warp::desc::WarpedDatasetDesc;
pub use warp::warper::{AffineTransformer, TransformWarper, Transformer, Warper};
