//! The dispatcher installed in place of a key's original binding.
//!
//! Each activation races the record's interval against the next input
//! event. A timeout, or an event that is not a second press of the trigger,
//! fires the single press fallback; a matching event fires the double
//! action. The event that wins the race is either consumed as the second
//! press or pushed back for the host, never both and never dropped.

use anyhow::Result;
use crossterm::event::{Event, KeyEventKind};
use log::debug;
use std::time::Duration;

use super::metadata::{SingleAction, TrampolineRecord};
use super::registrar::Registrar;
use crate::command::CommandInvoker;
use crate::inputs::EventSource;
use crate::keymap::{Action, BindingTables};
use crate::keys::{CanonicalKey, KeyStroke, is_bindable, is_repeat};

/// Host services a trampoline needs while it runs.
pub struct DispatchContext<'a> {
    pub tables: &'a dyn BindingTables,
    pub events: &'a mut dyn EventSource,
    pub commands: &'a mut dyn CommandInvoker,
}

/// How one activation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A second press arrived in time and the double action ran.
    Double,
    /// Nothing arrived within the interval; pending input was discarded.
    TimedOut { fired_single: bool },
    /// Some other event arrived first and was pushed back for the host.
    Interrupted { fired_single: bool },
}

enum Race {
    TimedOut,
    Arrived(Event),
}

/// Wait for the first event that can settle the race. Key releases and
/// lone modifier or media keys are dropped without restarting the clock.
fn race(events: &mut dyn EventSource, interval: Duration) -> Result<Race> {
    let deadline = events.now() + interval;
    loop {
        let remaining = deadline.saturating_duration_since(events.now());
        if !events.poll(remaining)? {
            return Ok(Race::TimedOut);
        }
        match events.read()? {
            Event::Key(key) if key.kind == KeyEventKind::Release || !is_bindable(key.code) => {
                debug!("Skipping {key:?} while waiting for a second press");
            }
            event => return Ok(Race::Arrived(event)),
        }
    }
}

fn observed_key(event: &Event) -> Option<CanonicalKey> {
    match event {
        Event::Key(key) => Some(CanonicalKey::single(KeyStroke::from(*key))),
        _ => None,
    }
}

pub struct Trampoline<'r> {
    record: &'r TrampolineRecord,
}

impl<'r> Trampoline<'r> {
    pub fn new(record: &'r TrampolineRecord) -> Self {
        Self { record }
    }

    /// Run one activation. `trigger` is the full key sequence the host
    /// resolved to this trampoline.
    pub fn fire(
        &self,
        trigger: &CanonicalKey,
        registrar: &Registrar,
        ctx: &mut DispatchContext<'_>,
    ) -> Result<Outcome> {
        let record = self.record;
        debug!(
            "{}: waiting {:?} for a second `{trigger}`",
            record.id, record.interval
        );

        match race(ctx.events, record.interval)? {
            Race::TimedOut => {
                debug!("{}: timed out", record.id);
                ctx.events.discard_pending()?;
                let fired_single = self.fire_single(trigger, registrar, ctx)?;
                Ok(Outcome::TimedOut { fired_single })
            }
            Race::Arrived(event) => {
                let repeated = observed_key(&event)
                    .map(|observed| is_repeat(trigger, &observed))
                    .unwrap_or(false);

                if repeated {
                    debug!("{}: second press, running {}", record.id, record.double_action);
                    ctx.commands.invoke(&record.double_action, trigger)?;
                    return Ok(Outcome::Double);
                }

                debug!("{}: interrupted by {event:?}", record.id);
                let fired = self.fire_single(trigger, registrar, ctx);
                ctx.events.unread(event);
                Ok(Outcome::Interrupted {
                    fired_single: fired?,
                })
            }
        }
    }

    fn fire_single(
        &self,
        trigger: &CanonicalKey,
        registrar: &Registrar,
        ctx: &mut DispatchContext<'_>,
    ) -> Result<bool> {
        match &self.record.single_action {
            None => Ok(false),
            Some(SingleAction::Fixed(action)) => {
                self.invoke_action(action.clone(), trigger, registrar, ctx)
            }
            Some(SingleAction::DeferredLookup { table, .. }) => {
                let action = ctx.tables.resolve(trigger, Some(*table));
                debug!("{}: `{trigger}` resolved to {action:?}", self.record.id);
                self.invoke_action(action, trigger, registrar, ctx)
            }
        }
    }

    fn invoke_action(
        &self,
        action: Action,
        trigger: &CanonicalKey,
        registrar: &Registrar,
        ctx: &mut DispatchContext<'_>,
    ) -> Result<bool> {
        match action {
            Action::Command(command) => {
                ctx.commands.invoke(&command, trigger)?;
                Ok(true)
            }
            Action::Dispatch(id) if id != self.record.id => {
                registrar.dispatch(&id, trigger, ctx)?;
                Ok(true)
            }
            Action::Dispatch(_) | Action::Table(_) | Action::Unbound => Ok(false),
        }
    }
}
