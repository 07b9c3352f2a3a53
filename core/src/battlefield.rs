use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::ops::BitOr;
use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BattlefieldEvent {
    /// A mine was opened, the game is lost.
    MineTriggered,
    /// Every safe cell is open, the game is won.
    NoSecureCellsLeft,
}

impl Event for BattlefieldEvent {
    type Kind = Self;

    fn kind(&self) -> Self {
        *self
    }
}

/// Valid transitions:
/// - Empty -> Ready (generate)
/// - Ready -> Lost
/// - Ready -> Won
/// - any -> Ready (generate)
/// - any -> Empty (clear, or rejected generate)
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldState {
    #[default]
    Empty,
    Ready,
    Lost,
    Won,
}

impl FieldState {
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Lost | Self::Won)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NeighborFilter {
    All,
    Closed,
}

/// Outcome of a primary-open command.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OpenOutcome {
    NoChange,
    Opened,
    HitMine,
    Won,
}

impl OpenOutcome {
    pub const fn has_update(self) -> bool {
        !matches!(self, Self::NoChange)
    }
}

/// Merges outcomes of several openings, the most severe one wins.
impl BitOr for OpenOutcome {
    type Output = OpenOutcome;

    fn bitor(self, rhs: Self) -> Self::Output {
        use OpenOutcome::*;
        match (self, rhs) {
            (HitMine, _) | (_, HitMine) => HitMine,
            (Won, _) | (_, Won) => Won,
            (Opened, _) | (_, Opened) => Opened,
            (NoChange, NoChange) => NoChange,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MarkOutcome {
    NoChange,
    Changed,
}

impl MarkOutcome {
    pub const fn has_update(self) -> bool {
        matches!(self, Self::Changed)
    }
}

/// Positions reported by the cells' `Opened` notifications, waiting for the reveal handler.
type OpenedInbox = Rc<RefCell<VecDeque<Coord2>>>;

/// Owns the grid of cells and drives generation and reveal.
#[derive(Debug)]
pub struct Battlefield {
    config: BattlefieldConfig,
    grid: Array2<Cell>,
    state: FieldState,
    placer: Box<dyn MinePlacer>,
    opened: OpenedInbox,
    listeners: Listeners<BattlefieldEvent>,
}

fn empty_grid() -> Array2<Cell> {
    Array2::from_shape_simple_fn((0, 0), || Cell::new((0, 0)))
}

impl Battlefield {
    /// Battlefield placing mines from OS entropy.
    pub fn new(config: BattlefieldConfig) -> Self {
        Self::with_placer(config, RandomMinePlacer::from_entropy())
    }

    pub fn with_placer(config: BattlefieldConfig, placer: impl MinePlacer + 'static) -> Self {
        Self {
            config,
            grid: empty_grid(),
            state: FieldState::Empty,
            placer: Box::new(placer),
            opened: Rc::default(),
            listeners: Listeners::new(),
        }
    }

    pub fn config(&self) -> BattlefieldConfig {
        self.config
    }

    /// Takes effect on the next [`Battlefield::generate`].
    pub fn set_config(&mut self, config: BattlefieldConfig) {
        self.config = config;
    }

    pub fn state(&self) -> FieldState {
        self.state
    }

    /// Size of the current grid, `(0, 0)` when empty.
    pub fn size(&self) -> Coord2 {
        let (rows, columns) = self.grid.dim();
        (rows as Coord, columns as Coord)
    }

    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    pub fn cell(&self, coords: Coord2) -> Option<&Cell> {
        self.grid.get(coords.to_nd_index())
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.grid.iter()
    }

    pub fn snapshot(&self) -> Vec<Vec<CellSnapshot>> {
        self.grid
            .outer_iter()
            .map(|row| row.iter().map(Cell::snapshot).collect())
            .collect()
    }

    pub fn mine_count(&self) -> CellCount {
        self.grid.iter().filter(|cell| cell.is_mine()).count() as CellCount
    }

    pub fn subscribe(
        &mut self,
        kind: BattlefieldEvent,
        handler: impl FnMut(&BattlefieldEvent) + 'static,
    ) -> ListenerId {
        self.listeners.subscribe(kind, handler)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Subscribes to one cell of the current grid. Subscriptions end when the grid is cleared.
    pub fn subscribe_cell(
        &mut self,
        coords: Coord2,
        kind: CellEventKind,
        handler: impl FnMut(&CellEvent) + 'static,
    ) -> Option<ListenerId> {
        self.grid
            .get_mut(coords.to_nd_index())
            .map(|cell| cell.subscribe(kind, handler))
    }

    pub fn unsubscribe_cell(&mut self, coords: Coord2, id: ListenerId) -> bool {
        self.grid
            .get_mut(coords.to_nd_index())
            .is_some_and(|cell| cell.unsubscribe(id))
    }

    /// Rebuilds the grid from the current configuration.
    ///
    /// The previous grid is always cleared. On error the battlefield is left empty.
    pub fn generate(&mut self) -> Result<()> {
        self.clear();
        self.config.validate()?;

        let mines = self.placer.place_mines(&self.config);
        let mine_mask = self.mine_mask(&mines);
        let actual = mine_mask.iter().filter(|&&mined| mined).count() as CellCount;
        if actual != self.config.mines {
            return Err(ConfigError::LayoutMismatch {
                expected: self.config.mines,
                actual,
            });
        }

        self.grid = self.generate_cells();
        Zip::from(&mut self.grid)
            .and(&mine_mask)
            .for_each(|cell, &mined| {
                if mined {
                    cell.arm();
                }
            });
        self.update_danger_rates();

        self.state = FieldState::Ready;
        log::debug!(
            "Generated {}x{} battlefield with {} mines",
            self.config.rows,
            self.config.columns,
            self.config.mines
        );
        Ok(())
    }

    /// Destroys every cell, leaving the battlefield as it was before the first generate.
    ///
    /// Battlefield-level subscriptions are kept.
    pub fn clear(&mut self) {
        for cell in self.grid.iter_mut() {
            cell.destroy();
        }
        self.grid = empty_grid();
        self.opened.borrow_mut().clear();
        self.state = FieldState::Empty;
    }

    /// Bounds-clipped 8-neighborhood of `coords`.
    pub fn neighbors(&self, coords: Coord2, filter: NeighborFilter) -> Neighbors {
        NeighborIter::new(coords, self.size())
            .filter(|&pos| match filter {
                NeighborFilter::All => true,
                NeighborFilter::Closed => self.grid[pos.to_nd_index()].is_closed(),
            })
            .collect()
    }

    /// Primary interaction: opens a closed, unmarked cell.
    pub fn open(&mut self, coords: Coord2) -> OpenOutcome {
        if self.state != FieldState::Ready {
            return OpenOutcome::NoChange;
        }
        let Some(cell) = self.grid.get_mut(coords.to_nd_index()) else {
            return OpenOutcome::NoChange;
        };
        if cell.is_marked() {
            log::debug!("Ignoring open of marked cell {:?}", coords);
            return OpenOutcome::NoChange;
        }
        if !cell.open() {
            return OpenOutcome::NoChange;
        }
        self.dispatch_opened()
    }

    /// Secondary interaction: toggles the mark of a closed cell.
    pub fn toggle_mark(&mut self, coords: Coord2) -> MarkOutcome {
        if self.state != FieldState::Ready {
            return MarkOutcome::NoChange;
        }
        match self.grid.get_mut(coords.to_nd_index()) {
            Some(cell) if cell.is_closed() => {
                cell.toggle_mark();
                MarkOutcome::Changed
            }
            _ => MarkOutcome::NoChange,
        }
    }

    /// Opens every mine without notifying the reveal handler.
    pub fn show_all_mines(&mut self) {
        for cell in self.grid.iter_mut().filter(|cell| cell.is_mine()) {
            cell.force_open();
        }
    }

    fn mine_mask(&self, mines: &[Coord2]) -> Array2<bool> {
        let mut mask: Array2<bool> = Array2::default(self.config.size().to_nd_index());
        for &coords in mines {
            match mask.get_mut(coords.to_nd_index()) {
                Some(slot) => *slot = true,
                None => log::warn!("Ignoring mine outside of the battlefield at {:?}", coords),
            }
        }
        mask
    }

    fn generate_cells(&self) -> Array2<Cell> {
        let shape = self.config.size().to_nd_index();
        Array2::from_shape_fn(shape, |(row, column)| {
            let mut cell = Cell::new((row as Coord, column as Coord));
            let inbox = Rc::clone(&self.opened);
            cell.subscribe(CellEventKind::Opened, move |event| {
                if let CellEvent::Opened(coords) = *event {
                    inbox.borrow_mut().push_back(coords);
                }
            });
            cell
        })
    }

    fn update_danger_rates(&mut self) {
        let danger_rates = Array2::from_shape_fn(self.grid.dim(), |(row, column)| {
            self.adjacent_mine_count((row as Coord, column as Coord))
        });
        Zip::from(&mut self.grid)
            .and(&danger_rates)
            .for_each(|cell, &danger_rate| cell.set_danger_rate(danger_rate));
    }

    fn adjacent_mine_count(&self, coords: Coord2) -> u8 {
        NeighborIter::new(coords, self.size())
            .filter(|&pos| self.grid[pos.to_nd_index()].is_mine())
            .count() as u8
    }

    fn dispatch_opened(&mut self) -> OpenOutcome {
        let mut outcome = OpenOutcome::NoChange;
        loop {
            let next = self.opened.borrow_mut().pop_front();
            let Some(coords) = next else {
                break;
            };
            outcome = outcome | self.on_cell_opened(coords);
        }
        outcome
    }

    fn on_cell_opened(&mut self, coords: Coord2) -> OpenOutcome {
        if self.state.is_finished() {
            return OpenOutcome::NoChange;
        }

        let cell = &self.grid[coords.to_nd_index()];
        if cell.is_mine() {
            log::debug!("Mine triggered at {:?}", coords);
            self.state = FieldState::Lost;
            self.listeners.publish(&BattlefieldEvent::MineTriggered);
            return OpenOutcome::HitMine;
        }

        log::debug!(
            "Opened cell at {:?}, danger rate: {}",
            coords,
            cell.danger_rate()
        );
        if cell.danger_rate() == 0 {
            self.open_safe_zone(coords);
        }

        self.evaluate_win()
    }

    /// Opens the zero-danger region around `start` and its border, marked cells included.
    fn open_safe_zone(&mut self, start: Coord2) {
        let mut to_visit = self.neighbors(start, NeighborFilter::Closed).into_vec();
        log::trace!(
            "Starting flood-fill from {:?}, initial neighbors: {:?}",
            start,
            to_visit
        );

        while let Some(coords) = to_visit.pop() {
            let cell = &mut self.grid[coords.to_nd_index()];
            if !cell.reveal() {
                continue;
            }
            let danger_rate = cell.danger_rate();
            log::trace!(
                "Flood opened cell at {:?}, danger rate: {}",
                coords,
                danger_rate
            );

            if danger_rate == 0 {
                to_visit.extend(self.neighbors(coords, NeighborFilter::Closed));
            }
        }
    }

    fn has_closed_safe_cells(&self) -> bool {
        self.grid
            .iter()
            .any(|cell| !cell.is_mine() && cell.is_closed())
    }

    fn evaluate_win(&mut self) -> OpenOutcome {
        if self.has_closed_safe_cells() {
            return OpenOutcome::Opened;
        }
        log::debug!("No safe cells left");
        self.state = FieldState::Won;
        self.listeners.publish(&BattlefieldEvent::NoSecureCellsLeft);
        OpenOutcome::Won
    }
}
