//! Per-band tile caching and block-granular window transfer.

pub(crate) mod block_cache;
pub(crate) mod window_io;
