//! Virtual bands composited from sources on other datasets.

pub(crate) mod band;
pub(crate) mod dataset;
pub(crate) mod desc;
pub(crate) mod mapping;
pub(crate) mod source;
