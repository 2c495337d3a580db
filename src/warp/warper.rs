use kurbo::{Affine, Point};

use crate::dataset::handle::Dataset;
use crate::foundation::buffer::{RasterBufMut, try_alloc};
use crate::foundation::core::Window;
use crate::foundation::data_type::{DataType, fill_words};
use crate::foundation::error::{RasterError, RasterResult};

/// Produces warped pixels for a rectangle of the output grid.
pub trait Warper: Send {
    /// Fill `buf` with `region` of every output band.
    ///
    /// `buf` is zeroed and band-sequential: band `b` starts at byte
    /// `b * region.x_size * region.y_size * working_type.size_bytes()`.
    fn warp_region(
        &mut self,
        source: &mut dyn Dataset,
        region: Window,
        buf: &mut [u8],
        band_count: usize,
        working_type: DataType,
    ) -> RasterResult<()>;

    /// The output-to-source mapping, when it is a plain affine one that can be described.
    fn as_affine(&self) -> Option<Affine> {
        None
    }
}

/// Maps output pixel positions to source pixel positions.
pub trait Transformer: Send {
    /// `None` when the position has no source counterpart.
    fn dst_to_src(&self, x: f64, y: f64) -> Option<(f64, f64)>;

    fn as_affine(&self) -> Option<Affine> {
        None
    }
}

/// Pixel-to-pixel affine mapping from output to source.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AffineTransformer {
    dst_to_src: Affine,
}

impl AffineTransformer {
    pub fn new(dst_to_src: Affine) -> Self {
        Self { dst_to_src }
    }

    /// Build from the forward (source to output) mapping.
    pub fn from_src_to_dst(src_to_dst: Affine) -> RasterResult<Self> {
        let det = src_to_dst.determinant();
        if det == 0.0 || !det.is_finite() {
            return Err(RasterError::config("source-to-output affine is not invertible"));
        }
        Ok(Self::new(src_to_dst.inverse()))
    }

    /// `src = dst * scale + offset` per axis.
    pub fn scale_offset(scale_x: f64, scale_y: f64, offset_x: f64, offset_y: f64) -> Self {
        Self::new(Affine::new([scale_x, 0.0, 0.0, scale_y, offset_x, offset_y]))
    }

    pub fn affine(&self) -> Affine {
        self.dst_to_src
    }
}

impl Transformer for AffineTransformer {
    fn dst_to_src(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let p = self.dst_to_src * Point::new(x, y);
        (p.x.is_finite() && p.y.is_finite()).then_some((p.x, p.y))
    }

    fn as_affine(&self) -> Option<Affine> {
        Some(self.dst_to_src)
    }
}

/// Nearest-neighbour warper driven by a [`Transformer`].
///
/// Output pixels start at the source band's nodata (zero if unset); source samples equal to
/// that nodata are not copied.
#[derive(Debug)]
pub struct TransformWarper<T> {
    transformer: T,
}

impl<T: Transformer> TransformWarper<T> {
    pub fn new(transformer: T) -> Self {
        Self { transformer }
    }

    pub fn transformer(&self) -> &T {
        &self.transformer
    }

    /// Source pixel hit by the centre of every region pixel, row-major.
    fn taps(&self, region: Window, src_w: i64, src_h: i64) -> RasterResult<Vec<Option<(i64, i64)>>> {
        let (w, h) = (region.x_size as usize, region.y_size as usize);
        let mut taps = try_alloc::<Option<(i64, i64)>>(w.saturating_mul(h), "warp taps")?;
        for row in 0..h {
            for col in 0..w {
                let x = (region.x_off + col as i64) as f64 + 0.5;
                let y = (region.y_off + row as i64) as f64 + 0.5;
                taps[row * w + col] = self
                    .transformer
                    .dst_to_src(x, y)
                    .map(|(sx, sy)| (sx.floor() as i64, sy.floor() as i64))
                    .filter(|&(sx, sy)| sx >= 0 && sy >= 0 && sx < src_w && sy < src_h);
            }
        }
        Ok(taps)
    }
}

impl<T: Transformer> Warper for TransformWarper<T> {
    fn warp_region(
        &mut self,
        source: &mut dyn Dataset,
        region: Window,
        buf: &mut [u8],
        band_count: usize,
        working_type: DataType,
    ) -> RasterResult<()> {
        let pixels = (region.x_size.max(0) as usize).saturating_mul(region.y_size.max(0) as usize);
        let plane_bytes = pixels.saturating_mul(working_type.size_bytes());
        if buf.len() != plane_bytes.saturating_mul(band_count) {
            return Err(RasterError::validation(format!(
                "warp buffer is {} bytes, expected {}",
                buf.len(),
                plane_bytes.saturating_mul(band_count)
            )));
        }
        if pixels == 0 || band_count == 0 {
            return Ok(());
        }

        let src_size = source.size();
        let taps = self.taps(region, i64::from(src_size.width), i64::from(src_size.height))?;
        let bounds = taps.iter().flatten().fold(None, |acc: Option<Window>, &(x, y)| {
            let px = Window::new(x, y, 1, 1);
            Some(match acc {
                None => px,
                Some(w) => {
                    let x0 = w.x_off.min(x);
                    let y0 = w.y_off.min(y);
                    Window::new(x0, y0, w.right().max(x + 1) - x0, w.bottom().max(y + 1) - y0)
                }
            })
        });

        let elem = working_type.size_bytes();
        for (band, plane) in buf.chunks_exact_mut(plane_bytes).take(band_count).enumerate() {
            let nodata = source.band_info(band)?.nodata;
            fill_words(plane, working_type, nodata.unwrap_or(0.0));
            let Some(bounds) = bounds else {
                continue;
            };

            let (bw, bh) = (bounds.x_size as usize, bounds.y_size as usize);
            let mut samples = try_alloc::<f64>(bw * bh, "warp source window")?;
            {
                let bytes: &mut [u8] = bytemuck::cast_slice_mut(&mut samples);
                let mut view = RasterBufMut::new(bytes, bw, bh, DataType::Float64)?;
                source.read_window(band, bounds, &mut view)?;
            }

            for (i, tap) in taps.iter().enumerate() {
                let Some((sx, sy)) = *tap else {
                    continue;
                };
                let v = samples[(sy - bounds.y_off) as usize * bw + (sx - bounds.x_off) as usize];
                if nodata == Some(v) {
                    continue;
                }
                working_type.write_f64(v, &mut plane[i * elem..(i + 1) * elem]);
            }
        }
        Ok(())
    }

    fn as_affine(&self) -> Option<Affine> {
        self.transformer.as_affine()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/warp/warper.rs"]
mod tests;
