pub mod command;
pub mod dispatch;
pub mod error;
pub mod host;
pub mod inputs;
pub mod keymap;
pub mod keys;
pub mod settings;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use inputs::event_source;

pub use command::{CommandInvoker, CommandRegistry};
pub use dispatch::{
    DispatchContext, InstallOptions, Outcome, Registrar, SingleAction, TrampolineId,
    TrampolineRecord,
};
pub use error::DispatchError;
pub use host::{KeyDispatcher, Step};
pub use keymap::{Action, BindingTables, Command, Keymaps, TableId};
pub use keys::{CanonicalKey, KeyStroke, RawKey, canonicalize, is_repeat};
pub use settings::Settings;
