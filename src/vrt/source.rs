use crate::band::contract::BandInfo;
use crate::dataset::handle::DatasetHandle;
use crate::foundation::buffer::{RasterBufMut, try_alloc};
use crate::foundation::core::{RasterSize, Window};
use crate::foundation::data_type::DataType;
use crate::foundation::error::{RasterError, RasterResult};
use crate::vrt::mapping::{SourceWindows, WindowMapping};

/// How a source's pixels are brought into the virtual band.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Nearest-neighbour copy, no masking.
    Simple,
    /// Box-filter average of the covered source pixels, skipping nodata.
    Averaged,
    /// Nearest-neighbour copy with nodata masking and linear scaling.
    Complex,
}

/// `value * ratio + offset`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearScale {
    pub ratio: f64,
    pub offset: f64,
}

impl LinearScale {
    pub fn new(ratio: f64, offset: f64) -> Self {
        Self { ratio, offset }
    }

    pub fn is_identity(&self) -> bool {
        self.ratio == 1.0 && self.offset == 0.0
    }

    pub fn apply(&self, value: f64) -> f64 {
        value * self.ratio + self.offset
    }
}

/// One band of a shared dataset. Holding a `BandRef` keeps the dataset open.
#[derive(Clone, Debug)]
pub struct BandRef {
    dataset: DatasetHandle,
    band: usize,
    info: BandInfo,
}

impl BandRef {
    /// Resolve band `band` of `dataset`; a missing band is a configuration error.
    pub fn new(dataset: DatasetHandle, band: usize) -> RasterResult<Self> {
        let info = dataset.band_info(band).map_err(|e| {
            RasterError::config(format!(
                "dataset '{}' has no band {band}: {e}",
                dataset.name()
            ))
        })?;
        Ok(Self {
            dataset,
            band,
            info,
        })
    }

    pub fn dataset(&self) -> &DatasetHandle {
        &self.dataset
    }

    pub fn band(&self) -> usize {
        self.band
    }

    pub fn info(&self) -> BandInfo {
        self.info
    }

    fn read(&self, window: Window, buf: &mut RasterBufMut<'_>) -> RasterResult<()> {
        self.dataset.read_window(self.band, window, buf)
    }
}

/// Unresolved source: the band plus optional windows and kind parameters.
///
/// Missing windows default to the whole source band and the whole virtual band.
#[derive(Clone, Debug)]
pub struct SourceSpec {
    pub kind: SourceKind,
    pub band: BandRef,
    pub src_window: Option<Window>,
    pub dst_window: Option<Window>,
    pub nodata: Option<f64>,
    pub scale: Option<LinearScale>,
}

impl SourceSpec {
    pub fn new(kind: SourceKind, band: BandRef) -> Self {
        Self {
            kind,
            band,
            src_window: None,
            dst_window: None,
            nodata: None,
            scale: None,
        }
    }

    pub fn simple(band: BandRef) -> Self {
        Self::new(SourceKind::Simple, band)
    }

    pub fn averaged(band: BandRef) -> Self {
        Self::new(SourceKind::Averaged, band)
    }

    pub fn complex(band: BandRef) -> Self {
        Self::new(SourceKind::Complex, band)
    }

    pub fn src_window(mut self, window: Window) -> Self {
        self.src_window = Some(window);
        self
    }

    pub fn dst_window(mut self, window: Window) -> Self {
        self.dst_window = Some(window);
        self
    }

    pub fn nodata(mut self, nodata: f64) -> Self {
        self.nodata = Some(nodata);
        self
    }

    pub fn scale(mut self, ratio: f64, offset: f64) -> Self {
        self.scale = Some(LinearScale::new(ratio, offset));
        self
    }
}

/// A source attached to a virtual band. Immutable once attached.
#[derive(Clone, Debug)]
pub struct Source {
    kind: SourceKind,
    band: BandRef,
    windows: SourceWindows,
    nodata: Option<f64>,
    scale: Option<LinearScale>,
}

impl Source {
    /// Resolve `spec` against a virtual band of extent `band_size`.
    pub(crate) fn attach(spec: SourceSpec, band_size: RasterSize) -> RasterResult<Self> {
        let SourceSpec {
            kind,
            band,
            src_window,
            dst_window,
            mut nodata,
            mut scale,
        } = spec;

        let src = src_window.unwrap_or_else(|| band.info().size.full_window());
        let dst = dst_window.unwrap_or_else(|| band_size.full_window());

        if kind == SourceKind::Simple && nodata.is_some() {
            tracing::warn!(
                dataset = band.dataset().name(),
                band = band.band(),
                "nodata is not supported on simple sources, ignoring it"
            );
            nodata = None;
        }
        if kind != SourceKind::Complex && scale.is_some() {
            tracing::warn!(
                dataset = band.dataset().name(),
                band = band.band(),
                ?kind,
                "scaling only applies to complex sources, ignoring it"
            );
            scale = None;
        }
        if let Some(s) = scale
            && !(s.ratio.is_finite() && s.offset.is_finite())
        {
            return Err(RasterError::config(format!(
                "non-finite scale {s:?} on source of '{}'",
                band.dataset().name()
            )));
        }

        Ok(Self {
            kind,
            band,
            windows: SourceWindows::new(src, dst),
            nodata,
            scale: scale.filter(|s| !s.is_identity()),
        })
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn band(&self) -> &BandRef {
        &self.band
    }

    pub fn windows(&self) -> SourceWindows {
        self.windows
    }

    pub fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    pub fn scale(&self) -> Option<LinearScale> {
        self.scale
    }

    /// Paint this source's contribution to `request` into `buf`.
    ///
    /// A source that does not overlap the request leaves `buf` untouched.
    pub fn render(&self, request: Window, buf: &mut RasterBufMut<'_>) -> RasterResult<()> {
        let Some(mapping) = self.windows.map_window(
            request,
            buf.width(),
            buf.height(),
            self.band.info().size,
        ) else {
            tracing::trace!(?request, "source does not overlap request");
            return Ok(());
        };

        match self.kind {
            SourceKind::Simple => {
                let mut view = buf.sub_view(mapping.output)?;
                self.band.read(mapping.request, &mut view)
            }
            SourceKind::Averaged => self.render_averaged(request, mapping, buf),
            SourceKind::Complex => self.render_complex(mapping, buf),
        }
    }

    fn render_averaged(
        &self,
        request: Window,
        mapping: WindowMapping,
        buf: &mut RasterBufMut<'_>,
    ) -> RasterResult<()> {
        let req = mapping.request;
        let (req_w, req_h) = (req.x_size as usize, req.y_size as usize);
        let samples = read_f32(&self.band, req, req_w, req_h)?;

        let nodata = self.nodata.map(|v| v as f32);
        let (buf_w, buf_h) = (buf.width() as f64, buf.height() as f64);
        let out = mapping.output;

        for line in out.y_off..out.bottom() {
            let dst_y0 = line as f64 / buf_h * request.y_size as f64 + request.y_off as f64;
            let dst_y1 = (line + 1) as f64 / buf_h * request.y_size as f64 + request.y_off as f64;
            for pixel in out.x_off..out.right() {
                let dst_x0 = pixel as f64 / buf_w * request.x_size as f64 + request.x_off as f64;
                let dst_x1 =
                    (pixel + 1) as f64 / buf_w * request.x_size as f64 + request.x_off as f64;

                let (sx0, sy0) = self.windows.dst_to_src(dst_x0, dst_y0);
                let (sx1, sy1) = self.windows.dst_to_src(dst_x1, dst_y1);
                let x0 = (sx0 + 0.5).floor() as i64 - req.x_off;
                let y0 = (sy0 + 0.5).floor() as i64 - req.y_off;
                let x1 = (sx1 + 0.5).floor() as i64 - req.x_off;
                let y1 = (sy1 + 0.5).floor() as i64 - req.y_off;

                let mut sum = 0.0f64;
                let mut count = 0u32;
                for sy in y0.max(0)..y1.min(req_h as i64) {
                    for sx in x0.max(0)..x1.min(req_w as i64) {
                        let v = samples[sy as usize * req_w + sx as usize];
                        if nodata.is_some_and(|nd| (v - nd).abs() < 0.0001) {
                            continue;
                        }
                        sum += f64::from(v);
                        count += 1;
                    }
                }
                if count > 0 {
                    put_sample(buf, pixel as usize, line as usize, sum / f64::from(count))?;
                }
            }
        }
        Ok(())
    }

    fn render_complex(&self, mapping: WindowMapping, buf: &mut RasterBufMut<'_>) -> RasterResult<()> {
        let out = mapping.output;
        let (out_w, out_h) = (out.x_size as usize, out.y_size as usize);
        let samples = read_f32(&self.band, mapping.request, out_w, out_h)?;
        let nodata = self.nodata.map(|v| v as f32);

        for (row, line) in samples.chunks_exact(out_w).enumerate() {
            for (col, &v) in line.iter().enumerate() {
                if nodata == Some(v) {
                    continue;
                }
                let value = match self.scale {
                    Some(s) => s.apply(f64::from(v)),
                    None => f64::from(v),
                };
                put_sample(buf, out.x_off as usize + col, out.y_off as usize + row, value)?;
            }
        }
        Ok(())
    }
}

/// Store a computed sample. Byte targets clamp to 0..=255 and truncate toward zero; other
/// types use the regular conversion.
fn put_sample(buf: &mut RasterBufMut<'_>, x: usize, y: usize, value: f64) -> RasterResult<()> {
    let value = match buf.data_type() {
        DataType::Byte => value.clamp(0.0, 255.0).trunc(),
        _ => value,
    };
    buf.set_f64(x, y, value)
}

/// Read `window` of `band` resampled to `width x height` as `f32` samples.
fn read_f32(band: &BandRef, window: Window, width: usize, height: usize) -> RasterResult<Vec<f32>> {
    let mut samples = try_alloc::<f32>(width.saturating_mul(height), "source scratch")?;
    let bytes: &mut [u8] = bytemuck::cast_slice_mut(&mut samples);
    let mut scratch = RasterBufMut::new(bytes, width, height, DataType::Float32)?;
    band.read(window, &mut scratch)?;
    Ok(samples)
}

#[cfg(test)]
#[path = "../../tests/unit/vrt/source.rs"]
mod tests;
