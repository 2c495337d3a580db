use crate::band::contract::BandInfo;
use crate::foundation::buffer::{RasterBuf, RasterBufMut};
use crate::foundation::core::Window;
use crate::foundation::data_type::{convert_element, copy_words};
use crate::foundation::error::RasterResult;

/// Tile-level access used by the window transfer loops.
pub(crate) trait BlockAccess {
    fn band_info(&self) -> BandInfo;

    /// Contents of resident tile `(x, y)`, loading it first if needed.
    fn block_data(&mut self, x: u32, y: u32) -> RasterResult<&[u8]>;
}

pub(crate) trait BlockAccessMut: BlockAccess {
    /// Like [`BlockAccess::block_data`], but the tile is marked dirty.
    fn block_data_mut(&mut self, x: u32, y: u32) -> RasterResult<&mut [u8]>;
}

/// Raster coordinate sampled for buffer index `i` (nearest neighbour, pixel centres).
fn nearest(i: usize, ratio: f64, off: i64, size: i64) -> usize {
    let v = ((i as f64 + 0.5) * ratio) as i64 + off;
    v.clamp(off, off + size - 1) as usize
}

fn sample_columns(window: Window, buf_width: usize) -> Vec<usize> {
    let ratio = window.x_size as f64 / buf_width as f64;
    (0..buf_width)
        .map(|i| nearest(i, ratio, window.x_off, window.x_size))
        .collect()
}

/// Read `window` into `buf`, resampling to the buffer size and converting to its type.
pub(crate) fn read_window<A: BlockAccess + ?Sized>(
    access: &mut A,
    window: Window,
    buf: &mut RasterBufMut<'_>,
) -> RasterResult<()> {
    let info = access.band_info();
    info.size.check_window(window)?;
    if window.is_empty() || buf.width() == 0 || buf.height() == 0 {
        return Ok(());
    }

    let block_w = info.block.width() as usize;
    let block_h = info.block.height() as usize;
    let elem = info.data_type.size_bytes();
    let buf_type = buf.data_type();
    let buf_elem = buf_type.size_bytes();
    let unscaled_x = window.x_size as usize == buf.width();
    let cols = sample_columns(window, buf.width());
    let y_ratio = window.y_size as f64 / buf.height() as f64;

    for row in 0..buf.height() {
        let src_y = nearest(row, y_ratio, window.y_off, window.y_size);
        let (tile_y, line) = (src_y / block_h, src_y % block_h);
        let mut i = 0;
        while i < cols.len() {
            let tile_x = cols[i] / block_w;
            let block = access.block_data(tile_x as u32, tile_y as u32)?;
            let tile_row = &block[line * block_w * elem..(line + 1) * block_w * elem];
            let out_row = buf.row_mut(row);
            if unscaled_x {
                let col = cols[i] % block_w;
                let run = (block_w - col).min(cols.len() - i);
                copy_words(
                    &tile_row[col * elem..],
                    info.data_type,
                    &mut out_row[i * buf_elem..],
                    buf_type,
                    run,
                );
                i += run;
                continue;
            }
            while i < cols.len() && cols[i] / block_w == tile_x {
                let col = cols[i] % block_w;
                convert_element(
                    &tile_row[col * elem..],
                    info.data_type,
                    &mut out_row[i * buf_elem..],
                    buf_type,
                );
                i += 1;
            }
        }
    }
    Ok(())
}

/// Write `buf` into `window`; every touched tile is marked dirty.
pub(crate) fn write_window<A: BlockAccessMut + ?Sized>(
    access: &mut A,
    window: Window,
    buf: &RasterBuf<'_>,
) -> RasterResult<()> {
    let info = access.band_info();
    info.size.check_window(window)?;
    if window.is_empty() || buf.width() == 0 || buf.height() == 0 {
        return Ok(());
    }

    let block_w = info.block.width() as usize;
    let block_h = info.block.height() as usize;
    let elem = info.data_type.size_bytes();
    let buf_type = buf.data_type();
    let buf_elem = buf_type.size_bytes();
    let cols = sample_columns(window, buf.width());
    let y_ratio = window.y_size as f64 / buf.height() as f64;

    for row in 0..buf.height() {
        let src_y = nearest(row, y_ratio, window.y_off, window.y_size);
        let (tile_y, line) = (src_y / block_h, src_y % block_h);
        let in_row = buf.row(row);
        let mut i = 0;
        while i < cols.len() {
            let tile_x = cols[i] / block_w;
            let block = access.block_data_mut(tile_x as u32, tile_y as u32)?;
            let tile_row = &mut block[line * block_w * elem..(line + 1) * block_w * elem];
            while i < cols.len() && cols[i] / block_w == tile_x {
                let col = cols[i] % block_w;
                convert_element(
                    &in_row[i * buf_elem..],
                    buf_type,
                    &mut tile_row[col * elem..],
                    info.data_type,
                );
                i += 1;
            }
        }
    }
    Ok(())
}
