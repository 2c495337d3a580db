//! Shared value types: errors, extents and windows, element types, pixel buffer views.

pub(crate) mod buffer;
pub(crate) mod core;
pub(crate) mod data_type;
pub(crate) mod error;
