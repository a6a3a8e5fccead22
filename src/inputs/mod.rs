pub mod event_source;
pub mod key_seq;

pub use event_source::{EventSource, KeyboardEventSource, SimulatedEventSource};
pub use key_seq::KeySeq;
