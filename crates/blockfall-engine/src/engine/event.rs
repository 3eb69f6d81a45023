use std::fmt;

/// Something the playfield reports to the outside world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum WellEvent {
    /// The active piece was merged into the board.
    PieceLocked,
    /// Previously detected full rows were removed.
    LineClear { count: usize },
    /// The playfield is empty and waits for the next piece.
    NextRequested,
    /// The player pressed hold.
    HoldRequested,
}

/// Tag of a [`WellEvent`], used to pick observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WellEventType {
    PieceLocked = 0,
    LineClear = 1,
    NextRequested = 2,
    HoldRequested = 3,
}

impl WellEventType {
    pub const LEN: usize = 4;
}

impl WellEvent {
    #[must_use]
    pub const fn event_type(&self) -> WellEventType {
        match self {
            WellEvent::PieceLocked => WellEventType::PieceLocked,
            WellEvent::LineClear { .. } => WellEventType::LineClear,
            WellEvent::NextRequested => WellEventType::NextRequested,
            WellEvent::HoldRequested => WellEventType::HoldRequested,
        }
    }
}

pub type Observer = Box<dyn FnMut(&WellEvent)>;

/// Dispatch table from event type to subscribers.
///
/// Subscribers of a type are called synchronously, in the order they were
/// registered, and only for events of that type.
///
/// # Example
///
/// ```
/// use std::{cell::Cell, rc::Rc};
///
/// use blockfall_engine::{Observers, WellEvent, WellEventType};
///
/// let cleared = Rc::new(Cell::new(0));
/// let mut observers = Observers::default();
/// let sink = Rc::clone(&cleared);
/// observers.subscribe(WellEventType::LineClear, move |event| {
///     if let WellEvent::LineClear { count } = event {
///         sink.set(sink.get() + count);
///     }
/// });
///
/// observers.notify(&WellEvent::LineClear { count: 2 });
/// observers.notify(&WellEvent::PieceLocked);
/// assert_eq!(cleared.get(), 2);
/// ```
#[derive(Default)]
pub struct Observers {
    table: [Vec<Observer>; WellEventType::LEN],
}

impl Observers {
    pub fn subscribe<F>(&mut self, event_type: WellEventType, observer: F)
    where
        F: FnMut(&WellEvent) + 'static,
    {
        self.table[event_type as usize].push(Box::new(observer));
    }

    pub fn notify(&mut self, event: &WellEvent) {
        for observer in &mut self.table[event.event_type() as usize] {
            observer(event);
        }
    }

    #[must_use]
    pub fn subscriber_count(&self, event_type: WellEventType) -> usize {
        self.table[event_type as usize].len()
    }
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("subscribers", &self.table.each_ref().map(Vec::len))
            .finish()
    }
}
