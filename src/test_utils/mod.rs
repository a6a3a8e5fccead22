pub mod test_helpers {
    use crate::command::RecordingInvoker;
    use crate::dispatch::{DispatchContext, Registrar};
    use crate::event_source::{Event, KeyCode, KeyEvent, KeyModifiers, SimulatedEventSource};
    use crate::host::{KeyDispatcher, Step};
    use crate::keymap::Keymaps;
    use crate::keys::parse_key_text;
    use std::time::Duration;

    /// Builder for creating test scenarios with simulated user input
    pub struct TestScenarioBuilder {
        events: Vec<(Duration, Event)>,
        next_delay: Duration,
    }

    impl Default for TestScenarioBuilder {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TestScenarioBuilder {
        pub fn new() -> Self {
            Self {
                events: Vec::new(),
                next_delay: Duration::ZERO,
            }
        }

        fn push(mut self, event: Event) -> Self {
            let delay = std::mem::take(&mut self.next_delay);
            self.events.push((delay, event));
            self
        }

        /// The next event arrives `millis` after the previous one was read
        pub fn wait_ms(mut self, millis: u64) -> Self {
            self.next_delay += Duration::from_millis(millis);
            self
        }

        /// Add a character key press
        pub fn press_char(self, c: char) -> Self {
            self.push(SimulatedEventSource::char_key(c))
        }

        /// Release a character key, as terminals with key release reporting do
        pub fn release_char(self, c: char) -> Self {
            self.push(SimulatedEventSource::char_release(c))
        }

        /// Add a Ctrl+character key press
        pub fn press_ctrl_char(self, c: char) -> Self {
            self.push(SimulatedEventSource::ctrl_char_key(c))
        }

        /// Press a function key
        pub fn press_f(self, n: u8) -> Self {
            self.push(SimulatedEventSource::key_event(
                KeyCode::F(n),
                KeyModifiers::empty(),
            ))
        }

        /// Press every stroke of a key description such as `"C-x 4 ."`
        pub fn press(mut self, keys: &str) -> Self {
            let keys = parse_key_text(keys).expect("valid key description in test scenario");
            for stroke in keys.strokes() {
                self = self.push(Event::Key(KeyEvent::new(
                    stroke.code(),
                    stroke.modifiers(),
                )));
            }
            self
        }

        /// Scroll the mouse wheel
        pub fn scroll(self) -> Self {
            self.push(SimulatedEventSource::mouse_scroll_down(0, 0))
        }

        /// Build the simulated event source
        pub fn build(self) -> SimulatedEventSource {
            SimulatedEventSource::with_delays(self.events)
        }
    }

    /// Tables, registrar and a recording invoker wired to one dispatcher
    #[derive(Default)]
    pub struct TestHost {
        pub keymaps: Keymaps,
        pub registrar: Registrar,
        pub commands: RecordingInvoker,
        pub dispatcher: KeyDispatcher,
    }

    impl TestHost {
        pub fn new() -> Self {
            Self::default()
        }

        /// Feed events through the dispatcher until the source runs dry
        pub fn run(&mut self, events: &mut SimulatedEventSource) -> anyhow::Result<Vec<Step>> {
            let mut steps = Vec::new();
            while events.has_pending() {
                let mut ctx = DispatchContext {
                    tables: &self.keymaps,
                    events: &mut *events,
                    commands: &mut self.commands,
                };
                steps.push(self.dispatcher.process_next(&self.registrar, &mut ctx)?);
            }
            Ok(steps)
        }

        /// Commands run so far, as `command@keys`
        pub fn invoked(&self) -> Vec<String> {
            self.commands.get_invoked()
        }
    }
}
