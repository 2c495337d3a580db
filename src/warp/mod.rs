//! Block-granular warping into cached output bands.

pub(crate) mod dataset;
pub(crate) mod desc;
pub(crate) mod warper;
