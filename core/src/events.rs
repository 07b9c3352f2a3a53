use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

/// Notification that can be routed to listeners by its kind.
pub trait Event {
    type Kind: Copy + PartialEq + fmt::Debug;

    fn kind(&self) -> Self::Kind;
}

/// Handle returned by [`Listeners::subscribe`], used to unsubscribe later.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u32);

struct Listener<E: Event> {
    id: ListenerId,
    kind: E::Kind,
    handler: Box<dyn FnMut(&E)>,
}

/// Listener list owned by a single publishing entity.
///
/// Handlers run synchronously in registration order. Removal compacts the
/// list so iteration never sees holes, and ids are never reused.
pub struct Listeners<E: Event> {
    next_id: u32,
    entries: Vec<Listener<E>>,
}

impl<E: Event> Listeners<E> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, kind: E::Kind, handler: impl FnMut(&E) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push(Listener {
            id,
            kind,
            handler: Box::new(handler),
        });
        id
    }

    /// Removes one listener, returns whether it was registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|listener| listener.id != id);
        self.entries.len() != before
    }

    /// Removes every listener of `kind`, returns how many were removed.
    pub fn unsubscribe_kind(&mut self, kind: E::Kind) -> usize {
        let before = self.entries.len();
        self.entries.retain(|listener| listener.kind != kind);
        before - self.entries.len()
    }

    /// Calls every handler registered for the event's kind, returns how many ran.
    pub fn publish(&mut self, event: &E) -> usize {
        let kind = event.kind();
        let mut called = 0;
        for listener in self.entries.iter_mut().filter(|l| l.kind == kind) {
            (listener.handler)(event);
            called += 1;
        }
        called
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<E: Event> Default for Listeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> fmt::Debug for Listeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|l| (l.id, l.kind)))
            .finish()
    }
}
