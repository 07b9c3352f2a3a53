use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellKind {
    #[default]
    Regular,
    Mine,
}

/// Plain copy of a cell's data, handed to views.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellSnapshot {
    pub position: Coord2,
    pub kind: CellKind,
    pub closed: bool,
    pub marked: bool,
    pub danger_rate: u8,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CellEvent {
    /// The cell was opened by a command, carries its position.
    Opened(Coord2),
    /// The mark was toggled.
    Marked(CellSnapshot),
    /// Any state change, the view should re-render the cell.
    Refreshed(CellSnapshot),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CellEventKind {
    Opened,
    Marked,
    Refreshed,
}

impl Event for CellEvent {
    type Kind = CellEventKind;

    fn kind(&self) -> CellEventKind {
        match self {
            Self::Opened(_) => CellEventKind::Opened,
            Self::Marked(_) => CellEventKind::Marked,
            Self::Refreshed(_) => CellEventKind::Refreshed,
        }
    }
}

/// One grid position of a battlefield.
#[derive(Debug)]
pub struct Cell {
    position: Coord2,
    kind: CellKind,
    closed: bool,
    marked: bool,
    danger_rate: u8,
    listeners: Listeners<CellEvent>,
}

impl Cell {
    pub fn new(position: Coord2) -> Self {
        Self {
            position,
            kind: CellKind::Regular,
            closed: true,
            marked: false,
            danger_rate: 0,
            listeners: Listeners::new(),
        }
    }

    pub fn position(&self) -> Coord2 {
        self.position
    }

    pub fn kind(&self) -> CellKind {
        self.kind
    }

    pub fn is_mine(&self) -> bool {
        matches!(self.kind, CellKind::Mine)
    }

    pub fn is_marked(&self) -> bool {
        self.marked
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Number of mines around this cell, always 0 for mines.
    pub fn danger_rate(&self) -> u8 {
        self.danger_rate
    }

    pub fn snapshot(&self) -> CellSnapshot {
        CellSnapshot {
            position: self.position,
            kind: self.kind,
            closed: self.closed,
            marked: self.marked,
            danger_rate: self.danger_rate,
        }
    }

    pub fn subscribe(
        &mut self,
        kind: CellEventKind,
        handler: impl FnMut(&CellEvent) + 'static,
    ) -> ListenerId {
        self.listeners.subscribe(kind, handler)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Opens a closed cell and emits [`CellEvent::Opened`], returns whether anything changed.
    ///
    /// Does not look at the mark, callers decide whether a marked cell may be opened.
    pub fn open(&mut self) -> bool {
        if !self.reveal() {
            return false;
        }
        self.listeners.publish(&CellEvent::Opened(self.position));
        true
    }

    /// Flips the mark and returns the new value.
    pub fn toggle_mark(&mut self) -> bool {
        self.marked = !self.marked;
        self.listeners.publish(&CellEvent::Marked(self.snapshot()));
        self.refresh();
        self.marked
    }

    /// Drops every listener, logical state is untouched.
    pub fn destroy(&mut self) {
        self.listeners.clear();
    }

    /// Opens without emitting [`CellEvent::Opened`].
    pub(crate) fn reveal(&mut self) -> bool {
        if !self.closed {
            return false;
        }
        self.closed = false;
        self.refresh();
        true
    }

    /// Opens regardless of the current state, emitting only a refresh.
    pub(crate) fn force_open(&mut self) {
        self.closed = false;
        self.refresh();
    }

    pub(crate) fn arm(&mut self) {
        self.kind = CellKind::Mine;
        self.danger_rate = 0;
        self.refresh();
    }

    pub(crate) fn set_danger_rate(&mut self, danger_rate: u8) {
        self.danger_rate = if self.is_mine() { 0 } else { danger_rate };
        self.refresh();
    }

    fn refresh(&mut self) {
        let snapshot = self.snapshot();
        self.listeners.publish(&CellEvent::Refreshed(snapshot));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn record(cell: &mut Cell, kind: CellEventKind) -> Rc<RefCell<Vec<CellEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        cell.subscribe(kind, move |event| sink.borrow_mut().push(*event));
        events
    }

    #[test]
    fn new_cell_is_closed_regular_and_unmarked() {
        let cell = Cell::new((2, 3));

        assert_eq!(cell.position(), (2, 3));
        assert_eq!(cell.kind(), CellKind::Regular);
        assert!(cell.is_closed());
        assert!(!cell.is_marked());
        assert_eq!(cell.danger_rate(), 0);
    }

    #[test]
    fn open_emits_opened_once() {
        let mut cell = Cell::new((1, 1));
        let opened = record(&mut cell, CellEventKind::Opened);

        assert!(cell.open());
        assert!(!cell.is_closed());
        assert!(!cell.open());

        assert_eq!(*opened.borrow(), vec![CellEvent::Opened((1, 1))]);
    }

    #[test]
    fn unsubscribed_handler_misses_open() {
        let mut cell = Cell::new((0, 1));
        let kept = record(&mut cell, CellEventKind::Opened);
        let dropped = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&dropped);
        let id = cell.subscribe(CellEventKind::Opened, move |_| *sink.borrow_mut() += 1);

        assert!(cell.unsubscribe(id));
        assert!(cell.open());

        assert_eq!(*dropped.borrow(), 0);
        assert_eq!(*kept.borrow(), vec![CellEvent::Opened((0, 1))]);
    }

    #[test]
    fn open_refreshes_view_with_open_snapshot() {
        let mut cell = Cell::new((0, 0));
        let refreshed = record(&mut cell, CellEventKind::Refreshed);

        cell.open();

        let events = refreshed.borrow();
        assert_eq!(events.len(), 1);
        let CellEvent::Refreshed(snapshot) = events[0] else {
            panic!("unexpected event {:?}", events[0]);
        };
        assert!(!snapshot.closed);
    }

    #[test]
    fn toggle_mark_twice_restores_unmarked() {
        let mut cell = Cell::new((0, 0));
        let marked = record(&mut cell, CellEventKind::Marked);

        assert!(cell.toggle_mark());
        assert!(cell.is_marked());
        assert!(!cell.toggle_mark());
        assert!(!cell.is_marked());
        assert!(cell.is_closed());

        let events = marked.borrow();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], CellEvent::Marked(s) if s.marked));
        assert!(matches!(events[1], CellEvent::Marked(s) if !s.marked));
    }

    #[test]
    fn reveal_is_silent() {
        let mut cell = Cell::new((0, 0));
        let opened = record(&mut cell, CellEventKind::Opened);

        assert!(cell.reveal());
        assert!(!cell.is_closed());
        assert!(opened.borrow().is_empty());
    }

    #[test]
    fn mines_keep_zero_danger_rate() {
        let mut cell = Cell::new((0, 0));
        cell.arm();
        cell.set_danger_rate(3);

        assert!(cell.is_mine());
        assert_eq!(cell.danger_rate(), 0);
    }

    #[test]
    fn destroy_drops_listeners_but_keeps_state() {
        let mut cell = Cell::new((0, 0));
        let opened = record(&mut cell, CellEventKind::Opened);
        cell.toggle_mark();

        cell.destroy();
        cell.open();

        assert!(opened.borrow().is_empty());
        assert!(cell.is_marked());
        assert!(!cell.is_closed());
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let mut cell = Cell::new((4, 2));
        cell.set_danger_rate(2);

        let json = serde_json::to_value(cell.snapshot()).unwrap();

        assert_eq!(json["position"], serde_json::json!([4, 2]));
        assert_eq!(json["kind"], "Regular");
        assert_eq!(json["danger_rate"], 2);
        assert_eq!(json["closed"], true);
    }
}
