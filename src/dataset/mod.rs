//! Datasets: the window-level contract, shared handles and name resolution.

pub(crate) mod block;
pub(crate) mod handle;
pub(crate) mod registry;
