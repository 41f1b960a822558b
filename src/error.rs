use thiserror::Error;

use crate::dot::DotId;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DotsError {
    #[error("dot count must be positive")]
    InvalidDotCount,
    #[error("area dimensions must be positive and finite, got {width}x{height}")]
    InvalidArea { width: f32, height: f32 },
    #[error("area {width}x{height} cannot hold a dot of radius {max_radius}")]
    AreaTooSmall {
        width: f32,
        height: f32,
        max_radius: f32,
    },
    #[error("sector size must be positive and finite, got {0}")]
    InvalidSectorSize(f32),
    #[error("sector table of {cols}x{rows} cells is too large")]
    TooManySectors { cols: usize, rows: usize },
    #[error("invalid spawn range: {0}")]
    InvalidSpawnRange(&'static str),
    #[error("invalid dot: {0}")]
    InvalidDot(&'static str),
    #[error("no dot with id {0}")]
    UnknownDot(DotId),
}
