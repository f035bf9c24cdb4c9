//! Error types for spray path planning.

use spraypath_kernel_geom::KernelError;
use thiserror::Error;

/// Errors that can occur while planning a spray path.
#[derive(Error, Debug)]
pub enum SprayPathError {
    /// Invalid planner settings.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// A required input list was empty.
    #[error("{0} is empty")]
    EmptyInput(&'static str),

    /// The geometry kernel failed.
    #[error("geometry kernel: {0}")]
    Kernel(#[from] KernelError),

    /// The geometry left nothing to work with.
    #[error("degenerate geometry: {0}")]
    Degenerate(String),
}

/// Result type for spray path operations.
pub type Result<T> = std::result::Result<T, SprayPathError>;
