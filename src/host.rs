//! A minimal host input loop: reads events, walks prefix tables, runs
//! commands and hands trampolines their trigger.

use anyhow::Result;
use crossterm::event::{Event, KeyEventKind};
use log::debug;

use crate::dispatch::{DispatchContext, Outcome, Registrar, TrampolineId};
use crate::inputs::KeySeq;
use crate::keymap::{Action, Command};
use crate::keys::{CanonicalKey, KeyStroke, is_bindable};

/// What one call to [`KeyDispatcher::process_next`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// The sequence so far is a prefix; waiting for more keys.
    Prefix(CanonicalKey),
    Command(Command),
    Dispatched(TrampolineId, Outcome),
    Unbound(CanonicalKey),
    /// Mouse, resize, focus, paste, key release and lone modifier events.
    Ignored,
}

#[derive(Default)]
pub struct KeyDispatcher {
    pending: KeySeq,
}

impl KeyDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Strokes collected so far on the way through prefix tables.
    pub fn pending(&self) -> Option<&CanonicalKey> {
        self.pending.current_sequence()
    }

    /// Read one event and act on it. Blocks until an event is available.
    pub fn process_next(
        &mut self,
        registrar: &Registrar,
        ctx: &mut DispatchContext<'_>,
    ) -> Result<Step> {
        let key_event = match ctx.events.read()? {
            Event::Key(key) if key.kind != KeyEventKind::Release && is_bindable(key.code) => key,
            _ => return Ok(Step::Ignored),
        };

        let keys = self.pending.handle_key(KeyStroke::from(key_event));
        match ctx.tables.resolve(&keys, None) {
            Action::Table(_) => Ok(Step::Prefix(keys)),
            Action::Command(command) => {
                self.pending.clear();
                ctx.commands.invoke(&command, &keys)?;
                Ok(Step::Command(command))
            }
            Action::Dispatch(id) => {
                self.pending.clear();
                let outcome = registrar.dispatch(&id, &keys, ctx)?;
                Ok(Step::Dispatched(id, outcome))
            }
            Action::Unbound => {
                self.pending.clear();
                debug!("`{keys}` is undefined");
                Ok(Step::Unbound(keys))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::RecordingInvoker;
    use crate::inputs::SimulatedEventSource;
    use crate::keymap::{BindingTables, Keymaps};

    #[test]
    fn test_prefix_then_command() {
        let mut keymaps = Keymaps::new();
        let root = keymaps.root();
        keymaps.define(root, "C-x C-s", Command::new("save")).unwrap();
        let registrar = Registrar::new();
        let mut events = SimulatedEventSource::new(vec![
            SimulatedEventSource::ctrl_char_key('x'),
            SimulatedEventSource::mouse_scroll_down(0, 0),
            SimulatedEventSource::ctrl_char_key('s'),
            SimulatedEventSource::char_key('z'),
        ]);
        let mut commands = RecordingInvoker::new();
        let mut dispatcher = KeyDispatcher::new();
        let mut ctx = DispatchContext {
            tables: &keymaps,
            events: &mut events,
            commands: &mut commands,
        };

        assert!(matches!(
            dispatcher.process_next(&registrar, &mut ctx).unwrap(),
            Step::Prefix(_)
        ));
        assert_eq!(
            dispatcher.process_next(&registrar, &mut ctx).unwrap(),
            Step::Ignored
        );
        assert_eq!(dispatcher.pending().unwrap().to_string(), "C-x");
        assert_eq!(
            dispatcher.process_next(&registrar, &mut ctx).unwrap(),
            Step::Command(Command::new("save"))
        );
        assert!(matches!(
            dispatcher.process_next(&registrar, &mut ctx).unwrap(),
            Step::Unbound(_)
        ));
        assert!(dispatcher.pending().is_none());
        assert_eq!(commands.get_invoked(), vec!["save@C-x C-s"]);
    }
}
