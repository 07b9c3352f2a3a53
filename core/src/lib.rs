#![cfg_attr(not(test), no_std)]

extern crate alloc;

use alloc::string::{String, ToString};
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use battlefield::*;
pub use cell::*;
pub use error::*;
pub use events::*;
pub use generator::*;
pub use session::*;
pub use types::*;

mod battlefield;
mod cell;
mod error;
mod events;
mod generator;
mod session;
mod types;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattlefieldConfig {
    pub rows: Coord,
    pub columns: Coord,
    pub mines: CellCount,
}

impl BattlefieldConfig {
    pub const fn new(rows: Coord, columns: Coord, mines: CellCount) -> Self {
        Self {
            rows,
            columns,
            mines,
        }
    }

    pub const fn size(&self) -> Coord2 {
        (self.rows, self.columns)
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.rows, self.columns)
    }

    /// Accepts non-empty grids holding at most half of their cells as mines.
    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.columns == 0 {
            return Err(ConfigError::EmptyGrid);
        }
        let total = self.total_cells();
        if u32::from(self.mines) * 2 > u32::from(total) {
            return Err(ConfigError::TooManyMines {
                mines: self.mines,
                total,
            });
        }
        Ok(())
    }
}

impl Default for BattlefieldConfig {
    fn default() -> Self {
        Difficulty::default().config()
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Self::Easy, Self::Medium, Self::Hard];

    pub const fn config(self) -> BattlefieldConfig {
        match self {
            Self::Easy => BattlefieldConfig::new(10, 10, 10),
            Self::Medium => BattlefieldConfig::new(20, 20, 40),
            Self::Hard => BattlefieldConfig::new(20, 40, 100),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown difficulty {0:?}, expected easy, medium or hard")]
pub struct UnknownDifficulty(pub String);

impl FromStr for Difficulty {
    type Err = UnknownDifficulty;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|difficulty| difficulty.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownDifficulty(s.to_string()))
    }
}
