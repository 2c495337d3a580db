//! Pixel element types and conversions between them.
//!
//! Tiles and caller buffers hold elements in native byte order. Every conversion goes through
//! `f64`: integer targets round half up and saturate to the type range, `NaN` becomes zero.

/// Element type of a band or buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Byte,
    UInt16,
    Int16,
    UInt32,
    Int32,
    Float32,
    Float64,
}

impl DataType {
    pub fn size_bytes(self) -> usize {
        match self {
            DataType::Byte => 1,
            DataType::UInt16 | DataType::Int16 => 2,
            DataType::UInt32 | DataType::Int32 | DataType::Float32 => 4,
            DataType::Float64 => 8,
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, DataType::Float32 | DataType::Float64)
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            DataType::Int16 | DataType::Int32 | DataType::Float32 | DataType::Float64
        )
    }

    /// Inclusive value range representable by the type.
    pub fn range(self) -> (f64, f64) {
        match self {
            DataType::Byte => (0.0, f64::from(u8::MAX)),
            DataType::UInt16 => (0.0, f64::from(u16::MAX)),
            DataType::Int16 => (f64::from(i16::MIN), f64::from(i16::MAX)),
            DataType::UInt32 => (0.0, f64::from(u32::MAX)),
            DataType::Int32 => (f64::from(i32::MIN), f64::from(i32::MAX)),
            DataType::Float32 => (f64::from(f32::MIN), f64::from(f32::MAX)),
            DataType::Float64 => (f64::MIN, f64::MAX),
        }
    }

    /// Smallest type able to hold values of both `self` and `other`.
    pub fn union(self, other: DataType) -> DataType {
        if self == other {
            return self;
        }
        if self.is_float() || other.is_float() {
            let wide = matches!(self, DataType::Float64 | DataType::UInt32 | DataType::Int32)
                || matches!(other, DataType::Float64 | DataType::UInt32 | DataType::Int32);
            return if wide {
                DataType::Float64
            } else {
                DataType::Float32
            };
        }

        let size = self.size_bytes().max(other.size_bytes());
        let signed = self.is_signed() || other.is_signed();
        // A signed type must grow when the unsigned side is as wide as it is.
        let unsigned_size = [self, other]
            .into_iter()
            .filter(|t| !t.is_signed())
            .map(DataType::size_bytes)
            .max()
            .unwrap_or(0);
        match (signed, size) {
            (false, 1) => DataType::Byte,
            (false, 2) => DataType::UInt16,
            (false, _) => DataType::UInt32,
            (true, s) if unsigned_size >= s => match s {
                1 | 2 => DataType::Int32,
                _ => DataType::Float64,
            },
            (true, 2) | (true, 1) => DataType::Int16,
            (true, _) => DataType::Int32,
        }
    }

    /// Decode one element from the start of `bytes`.
    pub fn read_f64(self, bytes: &[u8]) -> f64 {
        match self {
            DataType::Byte => f64::from(bytes[0]),
            DataType::UInt16 => f64::from(u16::from_ne_bytes([bytes[0], bytes[1]])),
            DataType::Int16 => f64::from(i16::from_ne_bytes([bytes[0], bytes[1]])),
            DataType::UInt32 => f64::from(u32::from_ne_bytes(word4(bytes))),
            DataType::Int32 => f64::from(i32::from_ne_bytes(word4(bytes))),
            DataType::Float32 => f64::from(f32::from_ne_bytes(word4(bytes))),
            DataType::Float64 => f64::from_ne_bytes(word8(bytes)),
        }
    }

    /// Encode `value` into the start of `out`, rounding and saturating for integer types.
    pub fn write_f64(self, value: f64, out: &mut [u8]) {
        let v = to_integer(value, self);
        match self {
            DataType::Byte => out[0] = v as u8,
            DataType::UInt16 => out[..2].copy_from_slice(&(v as u16).to_ne_bytes()),
            DataType::Int16 => out[..2].copy_from_slice(&(v as i16).to_ne_bytes()),
            DataType::UInt32 => out[..4].copy_from_slice(&(v as u32).to_ne_bytes()),
            DataType::Int32 => out[..4].copy_from_slice(&(v as i32).to_ne_bytes()),
            DataType::Float32 => out[..4].copy_from_slice(&(value as f32).to_ne_bytes()),
            DataType::Float64 => out[..8].copy_from_slice(&value.to_ne_bytes()),
        }
    }

    /// Encode `value` once; used to pre-fill buffers with a constant.
    pub fn encode(self, value: f64) -> [u8; 8] {
        let mut word = [0u8; 8];
        self.write_f64(value, &mut word);
        word
    }
}

fn word4(bytes: &[u8]) -> [u8; 4] {
    [bytes[0], bytes[1], bytes[2], bytes[3]]
}

fn word8(bytes: &[u8]) -> [u8; 8] {
    [
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
    ]
}

fn to_integer(value: f64, ty: DataType) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    let (lo, hi) = ty.range();
    (value + 0.5).floor().clamp(lo, hi)
}

/// Convert one element between types.
pub fn convert_element(src: &[u8], src_type: DataType, dst: &mut [u8], dst_type: DataType) {
    if src_type == dst_type {
        let n = src_type.size_bytes();
        dst[..n].copy_from_slice(&src[..n]);
        return;
    }
    dst_type.write_f64(src_type.read_f64(src), dst);
}

/// Convert `count` packed elements from `src` into `dst`.
pub fn copy_words(src: &[u8], src_type: DataType, dst: &mut [u8], dst_type: DataType, count: usize) {
    let s = src_type.size_bytes();
    let d = dst_type.size_bytes();
    if src_type == dst_type {
        dst[..count * d].copy_from_slice(&src[..count * s]);
        return;
    }
    for (src_word, dst_word) in src[..count * s]
        .chunks_exact(s)
        .zip(dst[..count * d].chunks_exact_mut(d))
    {
        dst_type.write_f64(src_type.read_f64(src_word), dst_word);
    }
}

/// Fill `dst` (packed elements of `data_type`) with `value`.
pub fn fill_words(dst: &mut [u8], data_type: DataType, value: f64) {
    let n = data_type.size_bytes();
    let word = data_type.encode(value);
    for chunk in dst.chunks_exact_mut(n) {
        chunk.copy_from_slice(&word[..n]);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/data_type.rs"]
mod tests;
