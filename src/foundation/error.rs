/// Convenience result type used across vraster.
pub type RasterResult<T> = Result<T, RasterError>;

/// Top-level error taxonomy used by cache, compositing and warp APIs.
#[derive(thiserror::Error, Debug)]
pub enum RasterError {
    /// Malformed or unresolvable source/dataset configuration, reported at attach time.
    #[error("config error: {0}")]
    Config(String),

    /// A band's fill or drain (or a warper) failed.
    #[error("io error: {0}")]
    Io(String),

    /// A tile or scratch buffer could not be allocated.
    #[error("out of memory: {0}")]
    OutOfMemory(String),

    /// Tile coordinates outside the grid, or a window outside the raster.
    #[error("range error: {0}")]
    Range(String),

    /// Attempt to write through a read-only band.
    #[error("access error: {0}")]
    Access(String),

    /// Caller-provided buffers or values that do not fit the operation.
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies or integrations.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RasterError {
    /// Build a [`RasterError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`RasterError::Io`] value.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Build a [`RasterError::OutOfMemory`] value.
    pub fn out_of_memory(msg: impl Into<String>) -> Self {
        Self::OutOfMemory(msg.into())
    }

    /// Build a [`RasterError::Range`] value.
    pub fn range(msg: impl Into<String>) -> Self {
        Self::Range(msg.into())
    }

    /// Build a [`RasterError::Access`] value.
    pub fn access(msg: impl Into<String>) -> Self {
        Self::Access(msg.into())
    }

    /// Build a [`RasterError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<std::io::Error> for RasterError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
