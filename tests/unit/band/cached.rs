use std::sync::Arc;

use parking_lot::Mutex;

use super::*;
use crate::band::contract::BlockIo;
use crate::band::mem::MemBand;
use crate::foundation::core::{BlockSize, RasterSize};
use crate::foundation::data_type::DataType;

fn ramp_band(width: u32, height: u32, block: (u32, u32)) -> MemBand {
    let size = RasterSize::new(width, height);
    let data = (0..size.pixel_count()).map(|i| i as u8).collect();
    MemBand::from_vec(
        size,
        BlockSize::new(block.0, block.1).unwrap(),
        DataType::Byte,
        data,
    )
    .unwrap()
}

/// Records drained tiles into a log that outlives the band.
struct LoggedBand {
    inner: MemBand,
    drained: Arc<Mutex<Vec<(u32, u32)>>>,
}

impl BlockIo for LoggedBand {
    fn fill_block(&mut self, x: u32, y: u32, buf: &mut [u8]) -> RasterResult<()> {
        self.inner.fill_block(x, y, buf)
    }

    fn drain_block(&mut self, x: u32, y: u32, buf: &[u8]) -> RasterResult<()> {
        self.drained.lock().push((x, y));
        self.inner.drain_block(x, y, buf)
    }
}

impl RasterBand for LoggedBand {
    fn info(&self) -> BandInfo {
        self.inner.info()
    }
}

#[test]
fn read_window_spans_tiles() {
    let mut band = CachedBand::new(ramp_band(6, 4, (4, 3)));
    let mut out = vec![0u8; 4 * 2];
    let mut buf = RasterBufMut::new(&mut out, 4, 2, DataType::Byte).unwrap();
    band.read_window(Window::new(2, 2, 4, 2), &mut buf).unwrap();
    assert_eq!(out, vec![14, 15, 16, 17, 20, 21, 22, 23]);
    // Four tiles touched, each filled once.
    assert_eq!(band.stats().fills, 4);
}

#[test]
fn read_window_resamples_nearest_and_converts() {
    let mut band = CachedBand::new(ramp_band(4, 4, (2, 2)));
    let mut out = vec![0u8; 2 * 2 * 4];
    let mut buf = RasterBufMut::new(&mut out, 2, 2, DataType::Float32).unwrap();
    band.read_window(Window::new(0, 0, 4, 4), &mut buf).unwrap();
    // Buffer pixel centres land on raster columns/rows 1 and 3.
    assert_eq!(buf.get_f64(0, 0), Some(5.0));
    assert_eq!(buf.get_f64(1, 0), Some(7.0));
    assert_eq!(buf.get_f64(0, 1), Some(13.0));
    assert_eq!(buf.get_f64(1, 1), Some(15.0));
}

#[test]
fn read_window_upsamples_by_replication() {
    let mut band = CachedBand::new(ramp_band(2, 1, (2, 1)));
    let mut out = vec![0u8; 4];
    let mut buf = RasterBufMut::new(&mut out, 4, 1, DataType::Byte).unwrap();
    band.read_window(Window::new(0, 0, 2, 1), &mut buf).unwrap();
    assert_eq!(out, vec![0, 0, 1, 1]);
}

#[test]
fn out_of_range_window_is_rejected() {
    let mut band = CachedBand::new(ramp_band(4, 4, (2, 2)));
    let mut out = vec![0u8; 4];
    let mut buf = RasterBufMut::new(&mut out, 2, 2, DataType::Byte).unwrap();
    assert!(matches!(
        band.read_window(Window::new(3, 3, 2, 2), &mut buf),
        Err(RasterError::Range(_))
    ));
}

#[test]
fn writes_stay_cached_until_flush() {
    let drained = Arc::new(Mutex::new(Vec::new()));
    let mut band = CachedBand::new(LoggedBand {
        inner: ramp_band(4, 4, (2, 2)),
        drained: drained.clone(),
    });

    let src = [100u8, 101, 102, 103];
    let buf = RasterBuf::new(&src, 2, 2, DataType::Byte).unwrap();
    band.write_window(Window::new(1, 1, 2, 2), &buf).unwrap();
    assert!(drained.lock().is_empty());
    assert_eq!(band.inner().inner.pixel(1, 1), Some(5.0));

    // Reads observe the cached write before it is persisted.
    let mut out = vec![0u8; 1];
    let mut one = RasterBufMut::new(&mut out, 1, 1, DataType::Byte).unwrap();
    band.read_window(Window::new(2, 2, 1, 1), &mut one).unwrap();
    assert_eq!(out[0], 103);

    band.flush().unwrap();
    let mut tiles = drained.lock().clone();
    tiles.sort_unstable();
    assert_eq!(tiles, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
    assert_eq!(band.inner().inner.pixel(2, 1), Some(101.0));
    assert_eq!(band.cache().resident_count(), 0);
}

#[test]
fn drop_flushes_dirty_tiles() {
    let drained = Arc::new(Mutex::new(Vec::new()));
    {
        let mut band = CachedBand::new(LoggedBand {
            inner: ramp_band(4, 4, (2, 2)),
            drained: drained.clone(),
        });
        band.write_block(1, 1, &[9, 9, 9, 9]).unwrap();
    }
    assert_eq!(*drained.lock(), vec![(1, 1)]);
}

#[test]
fn read_only_bands_reject_writes() {
    let mut band = CachedBand::new(ramp_band(4, 4, (2, 2)).read_only());
    let src = [0u8; 4];
    let buf = RasterBuf::new(&src, 2, 2, DataType::Byte).unwrap();
    assert!(matches!(
        band.write_window(Window::new(0, 0, 2, 2), &buf),
        Err(RasterError::Access(_))
    ));
    assert!(matches!(
        band.write_block(0, 0, &src),
        Err(RasterError::Access(_))
    ));
}

#[test]
fn read_block_copies_a_full_tile() {
    let mut band = CachedBand::new(ramp_band(3, 3, (2, 2)));
    let mut out = [0u8; 4];
    band.read_block(1, 1, &mut out).unwrap();
    assert_eq!(out, [8, 0, 0, 0]);
    assert!(band.read_block(0, 0, &mut [0u8; 3]).is_err());
}

#[test]
fn pinned_block_survives_flush() {
    let mut band = CachedBand::new(ramp_band(4, 4, (2, 2)));
    band.pin_block(0, 0).unwrap();
    band.block(1, 0).unwrap();
    band.flush().unwrap();
    assert!(band.cache().is_resident(0, 0));
    assert!(!band.cache().is_resident(1, 0));
    band.unpin_block(0, 0);
    band.flush_block(0, 0).unwrap();
    assert_eq!(band.cache().resident_count(), 0);
}
