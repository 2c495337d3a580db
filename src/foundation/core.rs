use crate::foundation::error::{RasterError, RasterResult};

/// Pixel extent of a raster band or dataset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct RasterSize {
    pub width: u32,
    pub height: u32,
}

impl RasterSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixel_count(self) -> usize {
        (self.width as usize).saturating_mul(self.height as usize)
    }

    /// Window covering the whole raster.
    pub fn full_window(self) -> Window {
        Window::new(0, 0, i64::from(self.width), i64::from(self.height))
    }

    /// Fails with a range error unless `window` lies entirely inside the raster.
    pub fn check_window(self, window: Window) -> RasterResult<()> {
        if window.x_off < 0
            || window.y_off < 0
            || window.x_size < 0
            || window.y_size < 0
            || window.right() > i64::from(self.width)
            || window.bottom() > i64::from(self.height)
        {
            return Err(RasterError::range(format!(
                "access window {window:?} out of range for raster {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

/// Tile dimensions. Both sides are always > 0, including after deserialization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "RawBlockSize")]
pub struct BlockSize {
    width: u32,
    height: u32,
}

#[derive(serde::Deserialize)]
struct RawBlockSize {
    width: u32,
    height: u32,
}

impl TryFrom<RawBlockSize> for BlockSize {
    type Error = RasterError;

    fn try_from(raw: RawBlockSize) -> RasterResult<Self> {
        Self::new(raw.width, raw.height)
    }
}

impl BlockSize {
    pub fn new(width: u32, height: u32) -> RasterResult<Self> {
        if width == 0 || height == 0 {
            return Err(RasterError::validation("BlockSize width and height must be > 0"));
        }
        Ok(Self { width, height })
    }

    /// Default block shape for bands that have no natural tiling: `min(128, size)` per axis.
    pub fn default_for(size: RasterSize) -> Self {
        Self {
            width: size.width.clamp(1, 128),
            height: size.height.clamp(1, 128),
        }
    }

    pub fn width(self) -> u32 {
        self.width
    }

    pub fn height(self) -> u32 {
        self.height
    }

    pub fn pixel_count(self) -> usize {
        (self.width as usize).saturating_mul(self.height as usize)
    }
}

/// Rectangle in pixel space. Offsets may be negative while a request is being mapped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Window {
    pub x_off: i64,
    pub y_off: i64,
    pub x_size: i64,
    pub y_size: i64,
}

impl Window {
    pub fn new(x_off: i64, y_off: i64, x_size: i64, y_size: i64) -> Self {
        Self {
            x_off,
            y_off,
            x_size,
            y_size,
        }
    }

    pub fn is_empty(self) -> bool {
        self.x_size <= 0 || self.y_size <= 0
    }

    pub fn right(self) -> i64 {
        self.x_off.saturating_add(self.x_size)
    }

    pub fn bottom(self) -> i64 {
        self.y_off.saturating_add(self.y_size)
    }

    /// Same offsets with every size below 1 raised to 1.
    pub fn at_least_one_pixel(self) -> Self {
        Self {
            x_size: self.x_size.max(1),
            y_size: self.y_size.max(1),
            ..self
        }
    }

    pub fn intersect(self, other: Window) -> Option<Window> {
        let x0 = self.x_off.max(other.x_off);
        let y0 = self.y_off.max(other.y_off);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Window::new(x0, y0, x1 - x0, y1 - y0))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
