use alloc::vec::Vec;
use core::fmt;
use ndarray::Array2;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::*;

/// Strategy choosing where the mines of a battlefield go.
pub trait MinePlacer: fmt::Debug {
    /// Positions for `config.mines` mines. The battlefield rejects layouts whose distinct in-bounds
    /// positions do not add up to the configured count.
    fn place_mines(&mut self, config: &BattlefieldConfig) -> Vec<Coord2>;
}

/// Uniform placement with rejection of already mined positions.
#[derive(Clone, Debug)]
pub struct RandomMinePlacer<R = SmallRng> {
    rng: R,
}

impl<R: Rng + fmt::Debug> RandomMinePlacer<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomMinePlacer<SmallRng> {
    pub fn from_seed(seed: u64) -> Self {
        Self::new(SmallRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(SmallRng::from_os_rng())
    }
}

impl<R: Rng + fmt::Debug> MinePlacer for RandomMinePlacer<R> {
    fn place_mines(&mut self, config: &BattlefieldConfig) -> Vec<Coord2> {
        let total_cells = config.total_cells();
        let mut wanted = config.mines;
        if wanted > total_cells {
            log::warn!(
                "Requested {} mines but only {} cells fit, filling the board",
                wanted,
                total_cells
            );
            wanted = total_cells;
        }

        let mut mined: Array2<bool> = Array2::default(config.size().to_nd_index());
        let mut placed = Vec::with_capacity(wanted.into());
        let mut rerolls = 0u32;
        while placed.len() < usize::from(wanted) {
            let coords = (
                self.rng.random_range(0..config.rows),
                self.rng.random_range(0..config.columns),
            );
            let slot = &mut mined[coords.to_nd_index()];
            if *slot {
                rerolls += 1;
                continue;
            }
            *slot = true;
            placed.push(coords);
        }
        log::trace!("Placed {} mines with {} rerolls", placed.len(), rerolls);
        placed
    }
}

/// Hand-built layout, placed as given.
#[derive(Clone, Debug, PartialEq)]
pub struct FixedMinePlacer {
    mines: Vec<Coord2>,
}

impl FixedMinePlacer {
    pub fn new(mines: impl Into<Vec<Coord2>>) -> Self {
        Self {
            mines: mines.into(),
        }
    }
}

impl MinePlacer for FixedMinePlacer {
    fn place_mines(&mut self, _config: &BattlefieldConfig) -> Vec<Coord2> {
        self.mines.clone()
    }
}
