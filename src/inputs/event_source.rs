use anyhow::{Result, anyhow};
pub use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind,
};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Trait for abstracting event sources to enable testing
pub trait EventSource {
    /// Wait up to `timeout` for an event. `true` as soon as one is
    /// available, `false` once the timeout elapses first.
    fn poll(&mut self, timeout: Duration) -> Result<bool>;

    /// Read the next event, blocking until one is available
    fn read(&mut self) -> Result<Event>;

    /// Push an event back so it is returned by the very next `read`
    fn unread(&mut self, event: Event);

    /// Drop typeahead that has already arrived but was not read yet
    fn discard_pending(&mut self) -> Result<()>;

    /// Current time on this source's clock
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Real keyboard event source using crossterm
#[derive(Default)]
pub struct KeyboardEventSource {
    unread: VecDeque<Event>,
}

impl KeyboardEventSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSource for KeyboardEventSource {
    fn poll(&mut self, timeout: Duration) -> Result<bool> {
        if !self.unread.is_empty() {
            return Ok(true);
        }
        Ok(crossterm::event::poll(timeout)?)
    }

    fn read(&mut self) -> Result<Event> {
        match self.unread.pop_front() {
            Some(event) => Ok(event),
            None => Ok(crossterm::event::read()?),
        }
    }

    fn unread(&mut self, event: Event) {
        self.unread.push_front(event);
    }

    fn discard_pending(&mut self) -> Result<()> {
        self.unread.clear();
        while crossterm::event::poll(Duration::ZERO)? {
            crossterm::event::read()?;
        }
        Ok(())
    }
}

/// Simulated event source for testing
///
/// Every scripted event carries the delay after which it arrives, measured
/// from the moment the previous event was consumed. `poll` advances a
/// simulated clock instead of sleeping.
pub struct SimulatedEventSource {
    pub(crate) events: VecDeque<(Duration, Event)>,
    unread: VecDeque<Event>,
    origin: Instant,
    elapsed: Duration,
    discards: usize,
}

impl SimulatedEventSource {
    /// Events that are all immediately available
    pub fn new(events: Vec<Event>) -> Self {
        Self::with_delays(events.into_iter().map(|e| (Duration::ZERO, e)).collect())
    }

    pub fn with_delays(events: Vec<(Duration, Event)>) -> Self {
        Self {
            events: events.into(),
            unread: VecDeque::new(),
            origin: Instant::now(),
            elapsed: Duration::ZERO,
            discards: 0,
        }
    }

    /// Helper method to create a key event
    pub fn key_event(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent::new(code, modifiers))
    }

    /// Helper method to create a simple character key event
    pub fn char_key(c: char) -> Event {
        Self::key_event(KeyCode::Char(c), KeyModifiers::empty())
    }

    /// Helper method to create a Ctrl+char key event
    pub fn ctrl_char_key(c: char) -> Event {
        Self::key_event(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    /// Helper method to create the release of a character key
    pub fn char_release(c: char) -> Event {
        Event::Key(KeyEvent::new_with_kind(
            KeyCode::Char(c),
            KeyModifiers::empty(),
            KeyEventKind::Release,
        ))
    }

    /// Helper method to create a mouse scroll down event
    pub fn mouse_scroll_down(column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind: MouseEventKind::ScrollDown,
            column,
            row,
            modifiers: KeyModifiers::empty(),
        })
    }

    /// Whether anything is left to read, scripted or pushed back
    pub fn has_pending(&self) -> bool {
        !self.unread.is_empty() || !self.events.is_empty()
    }

    /// Simulated time spent waiting so far
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// How many times pending input was discarded
    pub fn discard_count(&self) -> usize {
        self.discards
    }
}

impl EventSource for SimulatedEventSource {
    fn poll(&mut self, timeout: Duration) -> Result<bool> {
        if !self.unread.is_empty() {
            return Ok(true);
        }
        match self.events.front_mut() {
            Some((delay, _)) if *delay <= timeout => {
                self.elapsed += *delay;
                *delay = Duration::ZERO;
                Ok(true)
            }
            Some((delay, _)) => {
                *delay -= timeout;
                self.elapsed += timeout;
                Ok(false)
            }
            None => {
                self.elapsed += timeout;
                Ok(false)
            }
        }
    }

    fn read(&mut self) -> Result<Event> {
        if let Some(event) = self.unread.pop_front() {
            return Ok(event);
        }
        let (delay, event) = self
            .events
            .pop_front()
            .ok_or_else(|| anyhow!("simulated input exhausted"))?;
        self.elapsed += delay;
        Ok(event)
    }

    fn unread(&mut self, event: Event) {
        self.unread.push_front(event);
    }

    fn now(&self) -> Instant {
        self.origin + self.elapsed
    }

    fn discard_pending(&mut self) -> Result<()> {
        self.discards += 1;
        self.unread.clear();
        while matches!(self.events.front(), Some((delay, _)) if delay.is_zero()) {
            self.events.pop_front();
        }
        Ok(())
    }
}
