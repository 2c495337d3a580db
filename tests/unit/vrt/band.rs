use super::*;
use crate::band::cached::CachedBand;
use crate::band::mem::MemBand;
use crate::dataset::block::BlockDataset;
use crate::dataset::handle::{Dataset, DatasetHandle};
use crate::vrt::source::BandRef;

fn const_dataset(name: &str, width: u32, height: u32, value: f64) -> DatasetHandle {
    let band = MemBand::filled(
        RasterSize::new(width, height),
        BlockSize::new(4, 4).unwrap(),
        DataType::Byte,
        value,
    )
    .unwrap();
    DatasetHandle::new(name, BlockDataset::single(band).unwrap())
}

struct FailingDataset;

impl Dataset for FailingDataset {
    fn size(&self) -> RasterSize {
        RasterSize::new(4, 4)
    }

    fn band_count(&self) -> usize {
        1
    }

    fn band_info(&self, _band: usize) -> RasterResult<BandInfo> {
        Ok(BandInfo::new(
            self.size(),
            BlockSize::new(4, 4)?,
            DataType::Byte,
        ))
    }

    fn read_window(
        &mut self,
        _band: usize,
        _window: Window,
        _buf: &mut RasterBufMut<'_>,
    ) -> RasterResult<()> {
        Err(RasterError::io("backing store unavailable"))
    }

    fn flush(&mut self) -> RasterResult<()> {
        Ok(())
    }
}

fn read_all(band: &VirtualBand) -> Vec<u8> {
    let size = band.info().size;
    let (w, h) = (size.width as usize, size.height as usize);
    let mut out = vec![0xEE; w * h];
    let mut buf = RasterBufMut::new(&mut out, w, h, DataType::Byte).unwrap();
    band.composite_read(size.full_window(), &mut buf).unwrap();
    out
}

#[test]
fn empty_band_reads_as_nodata() {
    let band = VirtualBand::builder(RasterSize::new(3, 2), DataType::Byte)
        .nodata(9.0)
        .build()
        .unwrap();
    assert_eq!(read_all(&band), vec![9; 6]);

    let band = VirtualBand::builder(RasterSize::new(3, 2), DataType::Byte)
        .build()
        .unwrap();
    assert_eq!(read_all(&band), vec![0; 6]);
}

#[test]
fn later_sources_paint_over_earlier_ones() {
    let a = const_dataset("a", 4, 4, 1.0);
    let b = const_dataset("b", 2, 2, 2.0);
    let band = VirtualBand::builder(RasterSize::new(4, 4), DataType::Byte)
        .source(SourceSpec::simple(BandRef::new(a, 0).unwrap()))
        .source(
            SourceSpec::simple(BandRef::new(b, 0).unwrap()).dst_window(Window::new(1, 1, 2, 2)),
        )
        .build()
        .unwrap();
    #[rustfmt::skip]
    let expected = vec![
        1, 1, 1, 1,
        1, 2, 2, 1,
        1, 2, 2, 1,
        1, 1, 1, 1,
    ];
    assert_eq!(read_all(&band), expected);
}

#[test]
fn source_failure_aborts_the_read() {
    let bad = DatasetHandle::new("bad", FailingDataset);
    let band = VirtualBand::builder(RasterSize::new(4, 4), DataType::Byte)
        .source(SourceSpec::simple(BandRef::new(bad, 0).unwrap()))
        .build()
        .unwrap();
    let mut out = vec![0u8; 16];
    let mut buf = RasterBufMut::new(&mut out, 4, 4, DataType::Byte).unwrap();
    assert!(matches!(
        band.composite_read(Window::new(0, 0, 4, 4), &mut buf),
        Err(RasterError::Io(_))
    ));
}

#[test]
fn window_outside_band_is_rejected() {
    let band = VirtualBand::builder(RasterSize::new(4, 4), DataType::Byte)
        .build()
        .unwrap();
    let mut out = vec![0u8; 4];
    let mut buf = RasterBufMut::new(&mut out, 2, 2, DataType::Byte).unwrap();
    assert!(matches!(
        band.composite_read(Window::new(3, 0, 2, 2), &mut buf),
        Err(RasterError::Range(_))
    ));
}

#[test]
fn default_block_is_min_of_128_and_size() {
    let band = VirtualBand::builder(RasterSize::new(300, 20), DataType::Byte)
        .build()
        .unwrap();
    assert_eq!(band.info().block, BlockSize::new(128, 20).unwrap());
    assert!(
        VirtualBand::builder(RasterSize::new(0, 20), DataType::Byte)
            .build()
            .is_err()
    );
}

#[test]
fn cached_virtual_band_fills_edge_tiles() {
    let a = const_dataset("a", 5, 3, 4.0);
    let band = VirtualBand::builder(RasterSize::new(5, 3), DataType::UInt16)
        .block_size(BlockSize::new(4, 2).unwrap())
        .source(SourceSpec::simple(BandRef::new(a, 0).unwrap()))
        .build()
        .unwrap();
    let mut cached = CachedBand::new(band);

    let tile = cached.block(1, 1).unwrap();
    let first = u16::from_ne_bytes([tile.data()[0], tile.data()[1]]);
    assert_eq!(first, 4);
    assert_eq!(tile.data().len(), 4 * 2 * 2);

    let mut out = vec![0u8; 5 * 3 * 2];
    let mut buf = RasterBufMut::new(&mut out, 5, 3, DataType::UInt16).unwrap();
    cached.read_window(Window::new(0, 0, 5, 3), &mut buf).unwrap();
    assert!((0..3).all(|y| (0..5).all(|x| buf.get_f64(x, y) == Some(4.0))));
    assert_eq!(cached.stats().fills, 4);
}

#[test]
fn colour_table_marks_the_band_as_paletted() {
    let band = VirtualBand::builder(RasterSize::new(2, 2), DataType::Byte)
        .color_table(vec![ColorEntry::rgb(1, 2, 3)])
        .build()
        .unwrap();
    assert_eq!(band.info().color_interp, ColorInterp::Palette);
    assert_eq!(band.color_table(), Some(&[ColorEntry::rgb(1, 2, 3)][..]));

    let plain = VirtualBand::builder(RasterSize::new(2, 2), DataType::Byte)
        .color_interp(ColorInterp::Red)
        .build()
        .unwrap();
    assert_eq!(plain.info().color_interp, ColorInterp::Red);
    assert_eq!(plain.color_table(), None);
}
