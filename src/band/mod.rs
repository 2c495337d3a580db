//! The band contract and the band types built on it.

pub(crate) mod cached;
pub(crate) mod contract;
pub(crate) mod mem;
