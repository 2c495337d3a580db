use crate::foundation::core::{RasterSize, Window};

/// Where a request lands once mapped through a source's windows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowMapping {
    /// Rectangle to read from the source band (source pixels).
    pub request: Window,
    /// Rectangle of the caller's buffer it fills (buffer pixels).
    pub output: Window,
}

/// Linear correspondence between a source-band rectangle and a virtual-band rectangle.
///
/// Both windows have sizes >= 1; unequal sizes give independent X and Y scale factors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourceWindows {
    pub src: Window,
    pub dst: Window,
}

impl SourceWindows {
    pub fn new(src: Window, dst: Window) -> Self {
        Self {
            src: src.at_least_one_pixel(),
            dst: dst.at_least_one_pixel(),
        }
    }

    pub fn dst_to_src(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.dst.x_off as f64) / self.dst.x_size as f64 * self.src.x_size as f64
                + self.src.x_off as f64,
            (y - self.dst.y_off as f64) / self.dst.y_size as f64 * self.src.y_size as f64
                + self.src.y_off as f64,
        )
    }

    pub fn src_to_dst(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.src.x_off as f64) / self.src.x_size as f64 * self.dst.x_size as f64
                + self.dst.x_off as f64,
            (y - self.src.y_off as f64) / self.src.y_size as f64 * self.dst.y_size as f64
                + self.dst.y_off as f64,
        )
    }

    /// Map a virtual-band request, delivered into a `buf_width x buf_height` buffer, to the
    /// source rectangle to read and the buffer rectangle it covers.
    ///
    /// `None` means the source does not overlap the request.
    pub fn map_window(
        &self,
        request: Window,
        buf_width: usize,
        buf_height: usize,
        src_size: RasterSize,
    ) -> Option<WindowMapping> {
        if request.is_empty() || buf_width == 0 || buf_height == 0 {
            return None;
        }
        let scale_x = self.src.x_size as f64 / self.dst.x_size as f64;
        let scale_y = self.src.y_size as f64 / self.dst.y_size as f64;

        let mut req = Window::new(
            ((request.x_off - self.dst.x_off) as f64 * scale_x + self.src.x_off as f64).floor()
                as i64,
            ((request.y_off - self.dst.y_off) as f64 * scale_y + self.src.y_off as f64).floor()
                as i64,
            (request.x_size as f64 * scale_x + 0.5).floor() as i64,
            (request.y_size as f64 * scale_y + 0.5).floor() as i64,
        );

        let mut clipped = false;
        if req.x_off < 0 {
            req.x_size += req.x_off;
            req.x_off = 0;
            clipped = true;
        }
        if req.y_off < 0 {
            req.y_size += req.y_off;
            req.y_off = 0;
            clipped = true;
        }
        if req.x_size == 0 {
            req.x_size = 1;
        }
        if req.y_size == 0 {
            req.y_size = 1;
        }

        let (src_w, src_h) = (i64::from(src_size.width), i64::from(src_size.height));
        if req.right() > src_w {
            req.x_size = src_w - req.x_off;
            clipped = true;
        }
        if req.bottom() > src_h {
            req.y_size = src_h - req.y_off;
            clipped = true;
        }
        if req.x_off >= src_w || req.y_off >= src_h || req.x_size <= 0 || req.y_size <= 0 {
            return None;
        }

        let whole = Window::new(0, 0, buf_width as i64, buf_height as i64);
        if !clipped {
            return Some(WindowMapping {
                request: req,
                output: whole,
            });
        }

        // Bring the clipped source rectangle back into buffer pixels.
        let (ul_x, ul_y) = self.src_to_dst(req.x_off as f64, req.y_off as f64);
        let (lr_x, lr_y) = self.src_to_dst(req.right() as f64, req.bottom() as f64);
        let to_buf_x = buf_width as f64 / request.x_size as f64;
        let to_buf_y = buf_height as f64 / request.y_size as f64;

        let mut out_x = ((ul_x - request.x_off as f64) * to_buf_x) as i64;
        let mut out_y = ((ul_y - request.y_off as f64) * to_buf_y) as i64;
        let mut out_w = ((lr_x - request.x_off as f64) * to_buf_x) as i64 - out_x;
        let mut out_h = ((lr_y - request.y_off as f64) * to_buf_y) as i64 - out_y;

        out_x = out_x.max(0);
        out_y = out_y.max(0);
        if out_x + out_w > whole.x_size {
            out_w = whole.x_size - out_x;
        }
        if out_y + out_h > whole.y_size {
            out_h = whole.y_size - out_y;
        }
        if out_w < 1 || out_h < 1 {
            return None;
        }

        Some(WindowMapping {
            request: req,
            output: Window::new(out_x, out_y, out_w, out_h),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/vrt/mapping.rs"]
mod tests;
