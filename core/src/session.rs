use alloc::rc::Rc;
use alloc::string::{String, ToString};
use core::cell::RefCell;
use core::fmt;
use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeKind {
    Regular,
    Success,
    Danger,
}

/// Banner message shown to the player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
    /// Sticky notices stay until replaced, others may be dismissed by the front end.
    pub sticky: bool,
}

impl Notice {
    fn new(kind: NoticeKind, text: impl Into<String>, sticky: bool) -> Self {
        Self {
            kind,
            text: text.into(),
            sticky,
        }
    }
}

/// Valid transitions:
/// - Idle -> Playing
/// - Playing -> Over
/// - any -> Playing (restart)
/// - any -> Idle (rejected configuration)
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    #[default]
    Idle,
    Playing,
    Over,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    Lost,
    Won,
}

/// Game-level collaborator: configures the battlefield, reacts to its events and keeps the notice.
#[derive(Debug)]
pub struct Game {
    battlefield: Battlefield,
    notice: Option<Notice>,
    phase: GamePhase,
    result: Option<GameResult>,
    finished: Rc<RefCell<Option<GameResult>>>,
}

impl Game {
    pub fn new() -> Self {
        Self::with_placer(RandomMinePlacer::from_entropy())
    }

    pub fn with_placer(placer: impl MinePlacer + 'static) -> Self {
        let mut battlefield = Battlefield::with_placer(BattlefieldConfig::default(), placer);
        let finished = Rc::new(RefCell::new(None));

        let sink = Rc::clone(&finished);
        battlefield.subscribe(BattlefieldEvent::MineTriggered, move |_| {
            *sink.borrow_mut() = Some(GameResult::Lost);
        });
        let sink = Rc::clone(&finished);
        battlefield.subscribe(BattlefieldEvent::NoSecureCellsLeft, move |_| {
            *sink.borrow_mut() = Some(GameResult::Won);
        });

        Self {
            battlefield,
            notice: Some(Notice::new(NoticeKind::Regular, "Hello!", false)),
            phase: GamePhase::Idle,
            result: None,
            finished,
        }
    }

    pub fn battlefield(&self) -> &Battlefield {
        &self.battlefield
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn result(&self) -> Option<GameResult> {
        self.result
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Removes a non-sticky notice, returns whether one was removed.
    pub fn dismiss_notice(&mut self) -> bool {
        if self.notice.as_ref().is_some_and(|notice| !notice.sticky) {
            self.notice = None;
            true
        } else {
            false
        }
    }

    pub fn start_difficulty(&mut self, difficulty: Difficulty) -> Result<()> {
        log::debug!("Starting {} game", difficulty);
        self.start(difficulty.config())
    }

    /// Starts a new game, also used to restart a running or finished one.
    pub fn start(&mut self, config: BattlefieldConfig) -> Result<()> {
        self.battlefield.set_config(config);
        self.finished.borrow_mut().take();
        self.result = None;

        if let Err(err) = self.battlefield.generate() {
            log::warn!("Could not start game: {}", err);
            self.phase = GamePhase::Idle;
            self.handle_error(&err);
            return Err(err);
        }

        self.phase = GamePhase::Playing;
        self.notice = Some(Notice::new(
            NoticeKind::Regular,
            "Game started. Good luck!",
            true,
        ));
        Ok(())
    }

    pub fn open(&mut self, coords: Coord2) -> OpenOutcome {
        if self.phase != GamePhase::Playing {
            return OpenOutcome::NoChange;
        }
        let outcome = self.battlefield.open(coords);
        self.settle();
        outcome
    }

    pub fn toggle_mark(&mut self, coords: Coord2) -> MarkOutcome {
        if self.phase != GamePhase::Playing {
            return MarkOutcome::NoChange;
        }
        self.battlefield.toggle_mark(coords)
    }

    /// Shows `err` as a danger notice.
    pub fn handle_error(&mut self, err: &dyn fmt::Display) {
        self.notice = Some(Notice::new(NoticeKind::Danger, err.to_string(), false));
    }

    fn settle(&mut self) {
        let finished = self.finished.borrow_mut().take();
        match finished {
            Some(GameResult::Lost) => self.lose(),
            Some(GameResult::Won) => self.win(),
            None => {}
        }
    }

    fn lose(&mut self) {
        self.notice = Some(Notice::new(NoticeKind::Danger, "You lost!", true));
        self.end_game(GameResult::Lost);
    }

    fn win(&mut self) {
        self.notice = Some(Notice::new(
            NoticeKind::Success,
            "Congrats! You win! :)",
            true,
        ));
        self.end_game(GameResult::Won);
    }

    fn end_game(&mut self, result: GameResult) {
        log::debug!("Game over: {:?}", result);
        self.battlefield.show_all_mines();
        self.phase = GamePhase::Over;
        self.result = Some(result);
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(mines: &[Coord2]) -> Game {
        Game::with_placer(FixedMinePlacer::new(mines))
    }

    #[test]
    fn new_game_greets_and_waits() {
        let game = Game::with_placer(RandomMinePlacer::from_seed(0));

        assert_eq!(game.phase(), GamePhase::Idle);
        let notice = game.notice().unwrap();
        assert_eq!(notice.kind, NoticeKind::Regular);
        assert_eq!(notice.text, "Hello!");
        assert!(game.battlefield().is_empty());
    }

    #[test]
    fn start_difficulty_generates_preset() {
        let mut game = Game::with_placer(RandomMinePlacer::from_seed(5));

        game.start_difficulty(Difficulty::Hard).unwrap();

        assert_eq!(game.phase(), GamePhase::Playing);
        assert_eq!(game.battlefield().size(), (20, 40));
        assert_eq!(game.battlefield().mine_count(), 100);
        assert_eq!(game.notice().unwrap().text, "Game started. Good luck!");
        assert!(game.notice().unwrap().sticky);
    }

    #[test]
    fn rejected_config_shows_danger_notice() {
        let mut game = Game::with_placer(RandomMinePlacer::from_seed(0));
        game.start_difficulty(Difficulty::Easy).unwrap();

        let err = game.start(BattlefieldConfig::new(2, 2, 3)).unwrap_err();

        assert_eq!(err, ConfigError::TooManyMines { mines: 3, total: 4 });
        assert_eq!(game.phase(), GamePhase::Idle);
        assert!(game.battlefield().is_empty());
        let notice = game.notice().unwrap();
        assert_eq!(notice.kind, NoticeKind::Danger);
        assert_eq!(notice.text, err.to_string());
    }

    #[test]
    fn opening_mine_loses_and_reveals_mines() {
        let mut game = game(&[(0, 0), (1, 1)]);
        game.start(BattlefieldConfig::new(3, 3, 2)).unwrap();

        assert_eq!(game.open((0, 0)), OpenOutcome::HitMine);

        assert_eq!(game.phase(), GamePhase::Over);
        assert_eq!(game.result(), Some(GameResult::Lost));
        assert_eq!(game.notice().unwrap().text, "You lost!");
        assert!(!game.battlefield().cell((1, 1)).unwrap().is_closed());
        assert!(game.battlefield().cell((2, 2)).unwrap().is_closed());
    }

    #[test]
    fn opening_last_safe_cell_wins() {
        let mut game = game(&[(0, 0)]);
        game.start(BattlefieldConfig::new(2, 2, 1)).unwrap();

        assert_eq!(game.open((0, 1)), OpenOutcome::Opened);
        assert_eq!(game.phase(), GamePhase::Playing);
        game.open((1, 0));
        assert_eq!(game.open((1, 1)), OpenOutcome::Won);

        assert_eq!(game.result(), Some(GameResult::Won));
        let notice = game.notice().unwrap();
        assert_eq!(notice.kind, NoticeKind::Success);
        assert_eq!(notice.text, "Congrats! You win! :)");
        assert!(!game.battlefield().cell((0, 0)).unwrap().is_closed());
    }

    #[test]
    fn commands_are_ignored_outside_of_play() {
        let mut game = game(&[(0, 0)]);
        assert_eq!(game.open((0, 0)), OpenOutcome::NoChange);
        assert_eq!(game.toggle_mark((0, 0)), MarkOutcome::NoChange);

        game.start(BattlefieldConfig::new(2, 2, 1)).unwrap();
        game.open((0, 0));

        assert_eq!(game.toggle_mark((1, 1)), MarkOutcome::NoChange);
        assert_eq!(game.open((1, 1)), OpenOutcome::NoChange);
    }

    #[test]
    fn restart_after_game_over() {
        let mut game = game(&[(0, 0)]);
        game.start(BattlefieldConfig::new(2, 2, 1)).unwrap();
        game.open((0, 0));

        game.start(BattlefieldConfig::new(2, 2, 1)).unwrap();

        assert_eq!(game.phase(), GamePhase::Playing);
        assert_eq!(game.result(), None);
        assert!(game.battlefield().cells().all(Cell::is_closed));
        assert_eq!(game.toggle_mark((0, 0)), MarkOutcome::Changed);
    }

    #[test]
    fn only_plain_notices_can_be_dismissed() {
        let mut game = game(&[(0, 0)]);
        assert!(game.dismiss_notice());
        assert!(game.notice().is_none());

        game.start(BattlefieldConfig::new(2, 2, 1)).unwrap();
        assert!(!game.dismiss_notice());
        assert!(game.notice().is_some());
    }
}
