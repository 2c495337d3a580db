use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::band::contract::BandInfo;
use crate::foundation::buffer::{RasterBuf, RasterBufMut};
use crate::foundation::core::{RasterSize, Window};
use crate::foundation::error::{RasterError, RasterResult};

/// A set of equally sized bands readable by window.
///
/// Bands are addressed by zero-based index.
pub trait Dataset: Send {
    fn size(&self) -> RasterSize;

    fn band_count(&self) -> usize;

    fn band_info(&self, band: usize) -> RasterResult<BandInfo>;

    /// Read `window` of `band` into `buf`, resampling to the buffer's size and type.
    fn read_window(
        &mut self,
        band: usize,
        window: Window,
        buf: &mut RasterBufMut<'_>,
    ) -> RasterResult<()>;

    fn write_window(&mut self, band: usize, _window: Window, _buf: &RasterBuf<'_>) -> RasterResult<()> {
        Err(RasterError::access(format!("band {band} of this dataset is read-only")))
    }

    /// Write back and release cached state.
    fn flush(&mut self) -> RasterResult<()>;
}

pub(crate) fn check_band_index(band: usize, count: usize) -> RasterResult<()> {
    if band >= count {
        return Err(RasterError::range(format!(
            "band {band} out of range (dataset has {count} bands)"
        )));
    }
    Ok(())
}

/// Shared, reference-counted handle to a dataset.
///
/// Every clone holds one reference. The dataset is dropped (and its bands flushed) when the
/// last clone goes away, whichever holder that is.
#[derive(Clone)]
pub struct DatasetHandle {
    name: Arc<str>,
    inner: Arc<Mutex<Box<dyn Dataset>>>,
}

impl DatasetHandle {
    pub fn new(name: impl Into<String>, dataset: impl Dataset + 'static) -> Self {
        Self::from_boxed(name, Box::new(dataset))
    }

    pub fn from_boxed(name: impl Into<String>, dataset: Box<dyn Dataset>) -> Self {
        let name: String = name.into();
        Self {
            name: Arc::from(name),
            inner: Arc::new(Mutex::new(dataset)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Exclusive access to the dataset for one operation.
    pub fn lock(&self) -> MutexGuard<'_, Box<dyn Dataset>> {
        self.inner.lock()
    }

    /// Number of live handles to this dataset.
    pub fn reference_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    pub fn same_dataset(&self, other: &DatasetHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn size(&self) -> RasterSize {
        self.lock().size()
    }

    pub fn band_count(&self) -> usize {
        self.lock().band_count()
    }

    pub fn band_info(&self, band: usize) -> RasterResult<BandInfo> {
        self.lock().band_info(band)
    }

    pub fn read_window(
        &self,
        band: usize,
        window: Window,
        buf: &mut RasterBufMut<'_>,
    ) -> RasterResult<()> {
        self.lock().read_window(band, window, buf)
    }

    pub fn flush(&self) -> RasterResult<()> {
        self.lock().flush()
    }
}

impl fmt::Debug for DatasetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatasetHandle")
            .field("name", &self.name)
            .field("references", &self.reference_count())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/dataset/handle.rs"]
mod tests;
