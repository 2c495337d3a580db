use crate::foundation::core::Window;
use crate::foundation::data_type::{DataType, fill_words};
use crate::foundation::error::{RasterError, RasterResult};

/// Mutable view of a caller pixel buffer: `width * height` elements of `data_type`,
/// rows `line_stride` bytes apart.
///
/// Sub-views share the parent's stride, which lets a source render into a rectangle of the
/// destination buffer without copying.
#[derive(Debug)]
pub struct RasterBufMut<'a> {
    data: &'a mut [u8],
    width: usize,
    height: usize,
    line_stride: usize,
    data_type: DataType,
}

impl<'a> RasterBufMut<'a> {
    /// Packed buffer (`line_stride == width * element size`).
    pub fn new(
        data: &'a mut [u8],
        width: usize,
        height: usize,
        data_type: DataType,
    ) -> RasterResult<Self> {
        let stride = width.saturating_mul(data_type.size_bytes());
        Self::with_stride(data, width, height, stride, data_type)
    }

    pub fn with_stride(
        data: &'a mut [u8],
        width: usize,
        height: usize,
        line_stride: usize,
        data_type: DataType,
    ) -> RasterResult<Self> {
        let needed = required_len(width, height, line_stride, data_type)?;
        if data.len() < needed {
            return Err(RasterError::validation(format!(
                "buffer of {} bytes is too small for {width}x{height} {data_type:?} (needs {needed})",
                data.len()
            )));
        }
        Ok(Self {
            data,
            width,
            height,
            line_stride,
            data_type,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn line_stride(&self) -> usize {
        self.line_stride
    }

    pub fn reborrow(&mut self) -> RasterBufMut<'_> {
        RasterBufMut {
            data: &mut *self.data,
            width: self.width,
            height: self.height,
            line_stride: self.line_stride,
            data_type: self.data_type,
        }
    }

    /// View onto `rect` (buffer pixel coordinates).
    pub fn sub_view(&mut self, rect: Window) -> RasterResult<RasterBufMut<'_>> {
        let bounds = Window::new(0, 0, self.width as i64, self.height as i64);
        if rect.is_empty() || rect.intersect(bounds) != Some(rect) {
            return Err(RasterError::validation(format!(
                "sub-view {rect:?} outside {}x{} buffer",
                self.width, self.height
            )));
        }
        let elem = self.data_type.size_bytes();
        let (x, y) = (rect.x_off as usize, rect.y_off as usize);
        let (w, h) = (rect.x_size as usize, rect.y_size as usize);
        let start = y * self.line_stride + x * elem;
        let end = start + (h - 1) * self.line_stride + w * elem;
        Ok(RasterBufMut {
            data: &mut self.data[start..end],
            width: w,
            height: h,
            line_stride: self.line_stride,
            data_type: self.data_type,
        })
    }

    /// Packed bytes of row `y`.
    pub fn row(&self, y: usize) -> &[u8] {
        let start = y * self.line_stride;
        &self.data[start..start + self.width * self.data_type.size_bytes()]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        let start = y * self.line_stride;
        let len = self.width * self.data_type.size_bytes();
        &mut self.data[start..start + len]
    }

    /// Element `(x, y)` as `f64`, `None` outside the view.
    pub fn get_f64(&self, x: usize, y: usize) -> Option<f64> {
        let at = self.offset(x, y)?;
        Some(self.data_type.read_f64(&self.data[at..]))
    }

    /// Store `value` converted to the buffer type; range error outside the view.
    pub fn set_f64(&mut self, x: usize, y: usize, value: f64) -> RasterResult<()> {
        let Some(at) = self.offset(x, y) else {
            return Err(RasterError::range(format!(
                "pixel ({x}, {y}) outside {}x{} buffer",
                self.width, self.height
            )));
        };
        self.data_type.write_f64(value, &mut self.data[at..]);
        Ok(())
    }

    fn offset(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| y * self.line_stride + x * self.data_type.size_bytes())
    }

    /// Set every element of the view to `value` converted to the buffer type.
    pub fn fill(&mut self, value: f64) {
        let data_type = self.data_type;
        for y in 0..self.height {
            fill_words(self.row_mut(y), data_type, value);
        }
    }
}

/// Read-only counterpart of [`RasterBufMut`], used for writes into bands.
#[derive(Debug, Clone, Copy)]
pub struct RasterBuf<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
    line_stride: usize,
    data_type: DataType,
}

impl<'a> RasterBuf<'a> {
    pub fn new(data: &'a [u8], width: usize, height: usize, data_type: DataType) -> RasterResult<Self> {
        let line_stride = width.saturating_mul(data_type.size_bytes());
        let needed = required_len(width, height, line_stride, data_type)?;
        if data.len() < needed {
            return Err(RasterError::validation(format!(
                "buffer of {} bytes is too small for {width}x{height} {data_type:?} (needs {needed})",
                data.len()
            )));
        }
        Ok(Self {
            data,
            width,
            height,
            line_stride,
            data_type,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn row(&self, y: usize) -> &'a [u8] {
        let start = y * self.line_stride;
        &self.data[start..start + self.width * self.data_type.size_bytes()]
    }
}

/// Zero-initialised buffer of `len` elements; allocation failure is reported, not aborted on.
pub(crate) fn try_alloc<T: Clone + Default>(len: usize, what: &str) -> RasterResult<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|e| RasterError::out_of_memory(format!("{what} ({len} elements): {e}")))?;
    v.resize(len, T::default());
    Ok(v)
}

fn required_len(
    width: usize,
    height: usize,
    line_stride: usize,
    data_type: DataType,
) -> RasterResult<usize> {
    let row = width
        .checked_mul(data_type.size_bytes())
        .ok_or_else(|| RasterError::validation("buffer row size overflows"))?;
    if line_stride < row {
        return Err(RasterError::validation(format!(
            "line stride {line_stride} shorter than a {width}-element row"
        )));
    }
    if width == 0 || height == 0 {
        return Ok(0);
    }
    (height - 1)
        .checked_mul(line_stride)
        .and_then(|v| v.checked_add(row))
        .ok_or_else(|| RasterError::validation("buffer size overflows"))
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/buffer.rs"]
mod tests;
