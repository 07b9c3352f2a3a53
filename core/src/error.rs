use thiserror::Error;

use crate::CellCount;

/// Rejection of a battlefield configuration by `Battlefield::generate`.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Battlefield needs at least one row and one column")]
    EmptyGrid,
    #[error("Mines count must be at most half of total cells count ({mines} requested, {total} cells)")]
    TooManyMines { mines: CellCount, total: CellCount },
    #[error("Mine layout has {actual} mines but {expected} were configured")]
    LayoutMismatch {
        expected: CellCount,
        actual: CellCount,
    },
}

pub type Result<T> = core::result::Result<T, ConfigError>;
